#[macro_use]
mod log_macros;

pub mod error;
pub mod service;
pub mod tracing_init;

#[doc(hidden)]
pub use tracing as __tracing;

pub use error::{RuntimeError, RuntimeReason, RuntimeResult};
pub use service::{Generated, check, generate, load_config, routes};
