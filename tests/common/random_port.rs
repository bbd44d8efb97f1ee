use std::net::TcpListener;

/// Asks the OS for a currently free port. The listener is dropped right
/// away, so the port stays free for the server about to be spawned.
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("no free port available");
    listener.local_addr().unwrap().port()
}
