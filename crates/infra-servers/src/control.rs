// Control-channel client
// Blocking line-based TCP round-trips used by the drivers for pid and
// liveness queries.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use testbed_core::application::constants::PROBE_IO_TIMEOUT;
use testbed_core::domain::Pid;
use testbed_core::port::server_driver::NO_PID;

/// Probe failure classification
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Connect to {addr} failed: {message}")]
    Connect { addr: String, message: String },

    #[error("IO failure talking to {addr}: {message}")]
    Io { addr: String, message: String },

    #[error("Unexpected response from {addr}: {response}")]
    Protocol { addr: String, response: String },
}

/// Receives control-command responses.
///
/// Return `true` to keep waiting for more responses (no usable answer
/// yet), `false` to stop.
pub trait ResponseSink {
    fn on_response(&mut self, success: bool, response: &str) -> bool;
}

/// Collects a process id from a control response.
///
/// A failed command, an empty response, or anything that does not
/// parse as a positive integer leaves the sentinel in place and keeps
/// the caller waiting.
#[derive(Debug)]
pub struct PidCapture {
    pid: Pid,
}

impl PidCapture {
    pub fn new() -> Self {
        Self { pid: NO_PID }
    }

    /// Captured pid, [`NO_PID`] when nothing valid arrived.
    pub fn pid(&self) -> Pid {
        self.pid
    }
}

impl Default for PidCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink for PidCapture {
    fn on_response(&mut self, success: bool, response: &str) -> bool {
        self.pid = NO_PID;

        if success && !response.is_empty() {
            self.pid = response.trim().parse().unwrap_or(NO_PID);
        }

        if self.pid < 1 {
            self.pid = NO_PID;
            return true;
        }

        false
    }
}

/// Line-based control client for server admin commands.
pub struct ControlClient {
    host: String,
    port: u16,
    timeout: Duration,
}

impl ControlClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: PROBE_IO_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn connect(&self) -> Result<TcpStream, ProbeError> {
        let addr = self.addr();
        let resolved = addr.to_socket_addrs().map_err(|e| ProbeError::Connect {
            addr: addr.clone(),
            message: e.to_string(),
        })?;

        let mut last_error = None;
        for socket_addr in resolved {
            match TcpStream::connect_timeout(&socket_addr, self.timeout) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(self.timeout))
                        .and_then(|_| stream.set_write_timeout(Some(self.timeout)))
                        .map_err(|e| ProbeError::Io {
                            addr: addr.clone(),
                            message: e.to_string(),
                        })?;
                    return Ok(stream);
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(ProbeError::Connect {
            addr,
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no addresses resolved".to_string()),
        })
    }

    fn send(&self, stream: &mut TcpStream, command: &str) -> Result<(), ProbeError> {
        debug!(addr = %self.addr(), command = %command, "Control round-trip");
        stream
            .write_all(format!("{}\r\n", command).as_bytes())
            .map_err(|e| ProbeError::Io {
                addr: self.addr(),
                message: e.to_string(),
            })
    }

    /// Send an admin command and feed each response line through the
    /// sink until it signals stop or the stream ends.
    ///
    /// Status framing is handled here: a leading `OK` token is
    /// stripped before delivery, a leading `ERR` is delivered as a
    /// failure. Connection and IO failures are delivered as a failed
    /// response before the error returns.
    pub fn roundtrip(
        &self,
        command: &str,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), ProbeError> {
        let mut stream = match self.connect() {
            Ok(stream) => stream,
            Err(e) => {
                sink.on_response(false, "");
                return Err(e);
            }
        };
        if let Err(e) = self.send(&mut stream, command) {
            sink.on_response(false, "");
            return Err(e);
        }

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    let trimmed = line.trim();
                    let (success, payload) = if let Some(rest) = trimmed.strip_prefix("ERR") {
                        (false, rest.trim())
                    } else if let Some(rest) = trimmed.strip_prefix("OK") {
                        (true, rest.trim())
                    } else {
                        (true, trimmed)
                    };

                    if !sink.on_response(success, payload) {
                        break;
                    }
                }
                Err(e) => {
                    sink.on_response(false, "");
                    return Err(ProbeError::Io {
                        addr: self.addr(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Send a command and return the first response line, raw.
    pub fn query_line(&self, command: &str) -> Result<String, ProbeError> {
        let mut stream = self.connect()?;
        self.send(&mut stream, command)?;

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader.read_line(&mut line).map_err(|e| ProbeError::Io {
            addr: self.addr(),
            message: e.to_string(),
        })?;

        Ok(line.trim().to_string())
    }

    /// Send a command and collect raw response lines until the
    /// terminator line arrives (exclusive) or the stream ends.
    pub fn query_until(&self, command: &str, terminator: &str) -> Result<Vec<String>, ProbeError> {
        let mut stream = self.connect()?;
        self.send(&mut stream, command)?;

        let mut reader = BufReader::new(stream);
        let mut lines = Vec::new();
        let mut line = String::new();
        loop {
            line.clear();
            let read = reader.read_line(&mut line).map_err(|e| ProbeError::Io {
                addr: self.addr(),
                message: e.to_string(),
            })?;
            if read == 0 {
                break;
            }

            let trimmed = line.trim();
            if trimmed == terminator {
                break;
            }
            lines.push(trimmed.to_string());
        }

        Ok(lines)
    }
}
