//! Fallback cascade and its reasoning backends.

pub mod cascade;
pub mod local;
pub mod remote;

pub use cascade::FallbackCascade;
pub use local::GenerativeModel;
#[cfg(feature = "llm")]
pub use local::LocalLlamaModel;
pub use remote::RemoteReasoningClient;
