// Testbed Infrastructure - Server Drivers
// Per-binary adapters implementing the ServerDriver port

pub mod control;
pub mod gearmand;
pub mod memcached;

pub use control::{ControlClient, PidCapture, ProbeError, ResponseSink};
pub use gearmand::GearmandDriver;
pub use memcached::MemcachedDriver;

#[cfg(test)]
pub(crate) mod test_fixture;
