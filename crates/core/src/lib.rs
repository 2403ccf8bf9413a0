// Testbed Core - Domain Model, Ports, and Harness Logic
// NO infrastructure dependencies

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{HarnessError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
