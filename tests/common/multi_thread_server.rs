use memtext::memcache::builder::MemcacheStoreConfig;
use memtext::memcache::cli::parser;
use memtext::server::runtime_builder::start_memtext_server_with_ctxt;
use memtext::server::server_context::ServerContext;
use tokio_util::sync::CancellationToken;

use super::params_builder::MemtextdServerParamsBuilder;
use super::random_port;

pub struct MemtextdTestServer {
    thread_join_handle: Option<std::thread::JoinHandle<()>>,
    cancellation_token: CancellationToken,
    port: u16,
}

impl MemtextdTestServer {
    fn new(
        thread_join_handle: std::thread::JoinHandle<()>,
        cancellation_token: CancellationToken,
        port: u16,
    ) -> MemtextdTestServer {
        MemtextdTestServer {
            thread_join_handle: Some(thread_join_handle),
            cancellation_token,
            port,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn kill(&mut self) {
        self.cancellation_token.cancel();
        if let Some(thread_join_handle) = self.thread_join_handle.take() {
            if thread_join_handle.join().is_err() {
                eprintln!("Problem when shutting down test server");
            }
        }
    }
}

impl Drop for MemtextdTestServer {
    fn drop(&mut self) {
        self.kill();
    }
}

fn spawn_server_args(args: Vec<String>) -> MemtextdTestServer {
    let config = parser::parse(args).expect("test server arguments must parse");
    let store_config = MemcacheStoreConfig::new(config.memory_limit);
    let ctxt = ServerContext::get_default_server_context(store_config);
    let cancellation_token = ctxt.cancellation_token();
    let port = config.port;
    let handle = std::thread::spawn(move || start_memtext_server_with_ctxt(config, ctxt));
    MemtextdTestServer::new(handle, cancellation_token, port)
}

pub fn spawn_server(mut params: MemtextdServerParamsBuilder) -> MemtextdTestServer {
    let port = random_port::free_port();
    params.with_port(port);
    spawn_server_args(params.build())
}
