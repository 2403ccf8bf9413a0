// Unused-port picking for one-off cycle smoke checks

use std::net::TcpListener;

use rand::Rng;

/// Ephemeral range scanned when picking a port
const PORT_RANGE: std::ops::Range<u16> = 32768..61000;

/// Bind attempts before giving up
const PICK_ATTEMPTS: u32 = 64;

/// Pick a TCP port that is currently unbound on localhost.
///
/// Best-effort: the port is free at probe time, not reserved. Good
/// enough for a harness that starts its server immediately afterwards.
pub fn pick_unused_port() -> Option<u16> {
    let mut rng = rand::thread_rng();

    for _ in 0..PICK_ATTEMPTS {
        let candidate = rng.gen_range(PORT_RANGE);
        if TcpListener::bind(("127.0.0.1", candidate)).is_ok() {
            return Some(candidate);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picked_ports_are_in_range_and_bindable() {
        let port = pick_unused_port().expect("no free port on localhost");
        assert!(PORT_RANGE.contains(&port));
        assert!(TcpListener::bind(("127.0.0.1", port)).is_ok());
    }
}
