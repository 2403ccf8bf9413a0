// In-process TCP fixture for driver and control-client tests.
// One scripted response per accepted connection.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;

/// Serve `connections` one-shot connections on an ephemeral localhost
/// port. Each connection reads one command line and answers with
/// whatever `respond` maps it to, then closes.
pub(crate) fn serve(
    connections: usize,
    respond: impl Fn(&str) -> String + Send + 'static,
) -> (u16, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        for _ in 0..connections {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            if reader.read_line(&mut line).is_ok() {
                let reply = respond(line.trim());
                stream.write_all(reply.as_bytes()).unwrap();
            }
        }
    });

    (port, handle)
}
