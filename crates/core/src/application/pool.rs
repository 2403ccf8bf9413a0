// Server pool - every server instance started for one harness run
//
// Teardown runs in reverse start order, and always runs: the pool
// shuts its servers down when dropped.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::application::supervise::{launch, LaunchOptions, RunningServer};
use crate::domain::error::DomainError;
use crate::port::process_control::ProcessControl;
use crate::port::server_driver::ServerDriver;

/// Builds a fresh driver for one instance. Ownership of the returned
/// driver transfers to the pool, which manages its lifetime alongside
/// the process it supervises.
pub type DriverFactory = fn(host: &str, port: u16) -> Box<dyn ServerDriver>;

/// Running servers plus the driver factories that can create more.
pub struct ServerPool {
    control: Arc<dyn ProcessControl>,
    options: LaunchOptions,
    factories: BTreeMap<String, DriverFactory>,
    servers: Vec<RunningServer>,
    host: String,
}

impl ServerPool {
    pub fn new(control: Arc<dyn ProcessControl>, options: LaunchOptions) -> Self {
        Self {
            control,
            options,
            factories: BTreeMap::new(),
            servers: Vec::new(),
            host: "127.0.0.1".to_string(),
        }
    }

    /// Register a driver factory under its server kind.
    pub fn register(&mut self, kind: impl Into<String>, factory: DriverFactory) {
        self.factories.insert(kind.into(), factory);
    }

    fn driver_for(&self, kind: &str, port: u16) -> Result<Box<dyn ServerDriver>, DomainError> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| DomainError::UnknownServerKind(kind.to_string()))?;
        Ok(factory(&self.host, port))
    }

    /// Start one server instance.
    ///
    /// `args` is argv-style: the first element is a synthetic label
    /// naming the instance (it never reaches the server's command
    /// line), the rest are extra arguments passed through verbatim.
    ///
    /// Success is defined purely as "startup succeeded"; failures are
    /// logged and reported as false.
    pub fn startup(&mut self, kind: &str, port: u16, args: &[String]) -> bool {
        let (label, extra) = match args.split_first() {
            Some((label, extra)) => (label.as_str(), extra),
            None => ("", &[][..]),
        };

        info!(
            server = %kind,
            port = %port,
            label = %label,
            "Starting server instance"
        );

        let driver = match self.driver_for(kind, port) {
            Ok(driver) => driver,
            Err(e) => {
                error!(error = %e, "Startup refused");
                return false;
            }
        };

        match launch(driver, self.control.clone(), &self.options, extra) {
            Ok(server) => {
                self.servers.push(server);
                true
            }
            Err(e) => {
                error!(server = %kind, port = %port, error = %e, "Startup failed");
                false
            }
        }
    }

    pub fn count(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Stop every running server, most recently started first.
    pub fn shutdown_all(&mut self) {
        while let Some(mut server) = self.servers.pop() {
            if let Err(e) = server.shutdown() {
                warn!(server = %server.name(), error = %e, "Shutdown failed");
            }
        }
    }
}

impl Drop for ServerPool {
    fn drop(&mut self) {
        self.shutdown_all();
    }
}
