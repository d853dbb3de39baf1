use crate::Device;

/// Static table of execution providers each device class can host.
///
/// Providers are listed in preference order. The table is intentionally
/// closed: an execution provider missing here for every declared device is
/// reported as unsupported by the resolver rather than guessed at.
pub struct AcceleratorLookup;

impl AcceleratorLookup {
    #[must_use]
    pub const fn execution_providers_for_device(device: Device) -> &'static [&'static str] {
        match device {
            Device::Cpu => &["CPUExecutionProvider", "OpenVINOExecutionProvider"],
            Device::Gpu => &[
                "CUDAExecutionProvider",
                "TensorrtExecutionProvider",
                "DmlExecutionProvider",
                "ROCMExecutionProvider",
                "CPUExecutionProvider",
            ],
            Device::Npu => &["QNNExecutionProvider", "CPUExecutionProvider"],
        }
    }

    #[must_use]
    pub fn supports(device: Device, execution_provider: &str) -> bool {
        Self::execution_providers_for_device(device)
            .iter()
            .any(|ep| *ep == execution_provider)
    }
}
