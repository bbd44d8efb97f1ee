mod common;

// Capacity 32 holds exactly two 15-byte bindings (4-byte key, 1-byte value,
// 10 bytes of per-entry overhead). The third insert evicts the least
// recently used key.
#[test]
fn lru_eviction_check() {
    let mut params = common::MemtextdServerParamsBuilder::new();
    params.with_memory_limit("32");
    let server = common::spawn_server(params);
    let mut stream = common::connect(server.port());

    common::send(&mut stream, b"set key1 3 0 1\r\n1\r\n");
    common::expect_response(&mut stream, b"STORED\r\n");
    common::send(&mut stream, b"set key2 3 0 1\r\n2\r\n");
    common::expect_response(&mut stream, b"STORED\r\n");
    common::send(&mut stream, b"set key3 3 0 1\r\n3\r\n");
    common::expect_response(&mut stream, b"STORED\r\n");

    // key1 was least recent and is gone; the two newer keys remain
    common::send(&mut stream, b"get key1\r\n");
    common::expect_response(&mut stream, b"END\r\n");
    common::send(&mut stream, b"get key2\r\n");
    common::expect_response(&mut stream, b"VALUE key2 3 1\r\n2\r\nEND\r\n");
    common::send(&mut stream, b"get key3\r\n");
    common::expect_response(&mut stream, b"VALUE key3 3 1\r\n3\r\nEND\r\n");
}

#[test]
fn reads_protect_keys_from_eviction() {
    let mut params = common::MemtextdServerParamsBuilder::new();
    params.with_memory_limit("32");
    let server = common::spawn_server(params);
    let mut stream = common::connect(server.port());

    common::send(&mut stream, b"set key1 0 0 1\r\n1\r\n");
    common::expect_response(&mut stream, b"STORED\r\n");
    common::send(&mut stream, b"set key2 0 0 1\r\n2\r\n");
    common::expect_response(&mut stream, b"STORED\r\n");

    // touching key1 makes key2 the victim of the next insert
    common::send(&mut stream, b"get key1\r\n");
    common::expect_response(&mut stream, b"VALUE key1 0 1\r\n1\r\nEND\r\n");

    common::send(&mut stream, b"set key3 0 0 1\r\n3\r\n");
    common::expect_response(&mut stream, b"STORED\r\n");

    common::send(&mut stream, b"get key1\r\n");
    common::expect_response(&mut stream, b"VALUE key1 0 1\r\n1\r\nEND\r\n");
    common::send(&mut stream, b"get key2\r\n");
    common::expect_response(&mut stream, b"END\r\n");
}

#[test]
fn value_over_total_capacity_is_not_stored() {
    let mut params = common::MemtextdServerParamsBuilder::new();
    params.with_memory_limit("32");
    let server = common::spawn_server(params);
    let mut stream = common::connect(server.port());

    let value = common::create_value_with_size(64);
    let command = format!("set huge 0 0 {}\r\n{}\r\n", value.len(), value);
    common::send(&mut stream, command.as_bytes());
    common::expect_response(&mut stream, b"NOT_STORED\r\n");

    common::send(&mut stream, b"get huge\r\n");
    common::expect_response(&mut stream, b"END\r\n");
}
