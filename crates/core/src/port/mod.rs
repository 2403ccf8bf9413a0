// Port Layer - interfaces for external dependencies

pub mod process_control;
pub mod server_driver;
pub mod time_provider;

// Re-exports
pub use process_control::{ProcessControl, SpawnSpec, SuperviseError};
pub use server_driver::{ServerDriver, NO_PID};
pub use time_provider::TimeProvider;
