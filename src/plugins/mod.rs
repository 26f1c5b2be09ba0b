//! Plugin contract, registry, lifecycle and sandboxed execution.

pub mod contract;
pub mod descriptor;
pub mod executor;
pub mod registry;

pub use contract::{Plugin, ProbeReport};
pub use descriptor::PluginDescriptor;
pub use executor::SandboxedExecutor;
pub use registry::PluginRegistry;
