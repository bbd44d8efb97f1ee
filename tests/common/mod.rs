use rand::Rng;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

mod multi_thread_server;
mod params_builder;
mod random_port;

pub use multi_thread_server::spawn_server;
pub use params_builder::MemtextdServerParamsBuilder;

#[allow(dead_code)]
pub fn create_value_with_size(size: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut value = String::with_capacity(size);
    for _ in 0..size {
        let random_char = rng.gen_range(b'a'..=b'z') as char;
        value.push(random_char);
    }
    value
}

/// Connects to the test server, retrying until the listener is up.
#[allow(dead_code)]
pub fn connect(port: u16) -> TcpStream {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        match TcpStream::connect(("127.0.0.1", port)) {
            Ok(stream) => {
                stream
                    .set_read_timeout(Some(Duration::from_secs(2)))
                    .unwrap();
                stream.set_nodelay(true).unwrap();
                return stream;
            }
            Err(err) => {
                if Instant::now() > deadline {
                    panic!("could not connect to test server: {}", err);
                }
                std::thread::sleep(Duration::from_millis(20));
            }
        }
    }
}

#[allow(dead_code)]
pub fn send(stream: &mut TcpStream, bytes: &[u8]) {
    stream.write_all(bytes).unwrap();
    stream.flush().unwrap();
}

/// Reads exactly as many bytes as `expected` and asserts they match.
#[allow(dead_code)]
pub fn expect_response(stream: &mut TcpStream, expected: &[u8]) {
    let mut received = vec![0u8; expected.len()];
    if let Err(err) = stream.read_exact(&mut received) {
        panic!(
            "expected response {:?}, read failed: {}",
            String::from_utf8_lossy(expected),
            err
        );
    }
    assert_eq!(
        received,
        expected,
        "expected response {:?}, received {:?}",
        String::from_utf8_lossy(expected),
        String::from_utf8_lossy(&received)
    );
}

/// Asserts the server closed the connection without sending anything more.
#[allow(dead_code)]
pub fn expect_eof(stream: &mut TcpStream) {
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut buf = [0u8; 1];
    match stream.read(&mut buf) {
        Ok(0) => {}
        Ok(_) => panic!("expected connection close, received data"),
        Err(err) => panic!("expected connection close, read failed: {}", err),
    }
}
