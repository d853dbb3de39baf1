//! Hardware targets for passforge
//!
//! A run is scoped by an [`AcceleratorSpec`]: a `(device, execution
//! provider)` pair. The resolver turns a target system's declared device
//! list and the configured provider list into the ordered set of specs the
//! engine iterates.

mod device;
mod lookup;
mod resolver;
mod spec;

pub use device::Device;
pub use lookup::AcceleratorLookup;
pub use resolver::resolve_accelerator_specs;
pub use spec::AcceleratorSpec;

/// Execution provider name given to CPU fallbacks across devices.
pub const CPU_EXECUTION_PROVIDER: &str = "CPUExecutionProvider";
