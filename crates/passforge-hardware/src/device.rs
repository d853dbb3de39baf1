use serde::{Deserialize, Serialize};

/// Target device class for an accelerator spec.
///
/// Renders uppercase (`CPU`, `GPU`, `NPU`) — the rendered form appears
/// verbatim in model ids, cache filenames, and output prefixes — and parses
/// case-insensitively so config files may declare `"cpu"` or `"CPU"`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Device {
    Cpu,
    Gpu,
    Npu,
}
