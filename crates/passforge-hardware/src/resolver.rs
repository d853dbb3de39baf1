use std::collections::BTreeSet;
use std::str::FromStr;
use tracing::{info, warn};

use passforge_utils::error::ConfigError;

use crate::{AcceleratorLookup, AcceleratorSpec, CPU_EXECUTION_PROVIDER, Device};

/// Flatten a target's declared devices and the configured execution
/// providers into the ordered list of accelerator specs to run on.
///
/// Devices are visited in declared order; providers in declared order within
/// each device. Each provider is paired with at most one device: once it is
/// paired or rejected it is not reconsidered for later devices.
/// `CPUExecutionProvider` is dropped for non-CPU devices whenever a CPU
/// device is also declared, so the CPU run does not get duplicated onto
/// every accelerator. Providers no declared device supports are collected
/// and reported in a single warning.
///
/// # Errors
///
/// `ConfigError::UnknownDevice` for an unparseable device name and
/// `ConfigError::NoValidAccelerator` when nothing survives pairing.
pub fn resolve_accelerator_specs(
    devices: &[String],
    execution_providers: &[String],
) -> Result<Vec<AcceleratorSpec>, ConfigError> {
    let cpu_available = devices.iter().any(|d| d.eq_ignore_ascii_case("cpu"));

    let mut specs = Vec::new();
    let mut processed: BTreeSet<&str> = BTreeSet::new();
    let mut not_supported: BTreeSet<&str> = BTreeSet::new();

    for device_name in devices {
        let device = Device::from_str(device_name).map_err(|_| ConfigError::UnknownDevice {
            device: device_name.clone(),
        })?;

        for ep in execution_providers {
            if processed.contains(ep.as_str()) {
                continue;
            }
            if !AcceleratorLookup::supports(device, ep) {
                not_supported.insert(ep.as_str());
                processed.insert(ep.as_str());
            } else if ep == CPU_EXECUTION_PROVIDER && device != Device::Cpu && cpu_available {
                info!("ignoring {CPU_EXECUTION_PROVIDER} for non-CPU device {device}");
            } else {
                specs.push(AcceleratorSpec::new(device, ep.clone()));
                processed.insert(ep.as_str());
            }
        }
    }

    if !not_supported.is_empty() {
        let names: Vec<&str> = not_supported.into_iter().collect();
        warn!(
            "the following execution providers are not supported by any declared device: {}",
            names.join(",")
        );
    }

    if specs.is_empty() {
        return Err(ConfigError::NoValidAccelerator);
    }

    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn pairs_providers_with_declared_devices_in_order() {
        let specs = resolve_accelerator_specs(
            &strings(&["gpu", "cpu"]),
            &strings(&["CUDAExecutionProvider", "CPUExecutionProvider"]),
        )
        .unwrap();

        assert_eq!(
            specs,
            vec![
                AcceleratorSpec::new(Device::Gpu, "CUDAExecutionProvider"),
                AcceleratorSpec::new(Device::Cpu, "CPUExecutionProvider"),
            ]
        );
    }

    #[test]
    fn drops_cpu_provider_for_gpu_when_cpu_device_present() {
        let specs = resolve_accelerator_specs(
            &strings(&["gpu", "cpu"]),
            &strings(&["CPUExecutionProvider"]),
        )
        .unwrap();

        // The CPU provider skips the GPU device and lands on the CPU device.
        assert_eq!(
            specs,
            vec![AcceleratorSpec::new(Device::Cpu, "CPUExecutionProvider")]
        );
    }

    #[test]
    fn keeps_cpu_provider_on_gpu_when_no_cpu_device_declared() {
        let specs =
            resolve_accelerator_specs(&strings(&["gpu"]), &strings(&["CPUExecutionProvider"]))
                .unwrap();

        assert_eq!(
            specs,
            vec![AcceleratorSpec::new(Device::Gpu, "CPUExecutionProvider")]
        );
    }

    #[test]
    fn provider_is_paired_with_at_most_one_device() {
        let specs = resolve_accelerator_specs(
            &strings(&["cpu", "gpu"]),
            &strings(&["CPUExecutionProvider"]),
        )
        .unwrap();

        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].device, Device::Cpu);
    }

    #[test]
    fn unsupported_provider_is_skipped_not_fatal() {
        let specs = resolve_accelerator_specs(
            &strings(&["cpu"]),
            &strings(&["MadeUpExecutionProvider", "CPUExecutionProvider"]),
        )
        .unwrap();

        assert_eq!(
            specs,
            vec![AcceleratorSpec::new(Device::Cpu, "CPUExecutionProvider")]
        );
    }

    #[test]
    fn rejected_provider_is_not_reconsidered_for_later_devices() {
        // CUDA is rejected on the CPU device and must not resurface for GPU.
        let specs = resolve_accelerator_specs(
            &strings(&["cpu", "gpu"]),
            &strings(&["CUDAExecutionProvider", "CPUExecutionProvider"]),
        )
        .unwrap();

        assert_eq!(
            specs,
            vec![AcceleratorSpec::new(Device::Cpu, "CPUExecutionProvider")]
        );
    }

    #[test]
    fn empty_result_is_a_configuration_error() {
        let err = resolve_accelerator_specs(
            &strings(&["cpu"]),
            &strings(&["CUDAExecutionProvider"]),
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::NoValidAccelerator));
    }

    #[test]
    fn unknown_device_is_a_configuration_error() {
        let err = resolve_accelerator_specs(
            &strings(&["quantum"]),
            &strings(&["CPUExecutionProvider"]),
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::UnknownDevice { .. }));
    }
}
