use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::memcache::builder::MemcacheStoreConfig;
use crate::memcache::cli::parser::MemtextdConfig;
use crate::server::memc_tcp;
use crate::server::server_context::ServerContext;

fn get_worker_thread_name() -> String {
    static ATOMIC_ID: AtomicUsize = AtomicUsize::new(0);
    let id = ATOMIC_ID.fetch_add(1, Ordering::SeqCst);
    format!("memtextd-wrk-{}", id)
}

fn create_multi_thread_runtime(worker_threads: usize) -> tokio::runtime::Runtime {
    Builder::new_multi_thread()
        .thread_name_fn(get_worker_thread_name)
        .worker_threads(worker_threads)
        .enable_all()
        .build()
        .unwrap()
}

fn register_ctrlc_handler(
    runtime: &tokio::runtime::Runtime,
    cancellation_token: CancellationToken,
) {
    runtime.handle().spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl-c signal");
        info!("Ctrl-C received, shutting down...");
        cancellation_token.cancel();
    });
}

pub fn start_memtext_server(config: MemtextdConfig) {
    let store_config = MemcacheStoreConfig::new(config.memory_limit);
    let ctxt = ServerContext::get_default_server_context(store_config);
    start_memtext_server_with_ctxt(config, ctxt)
}

pub fn start_memtext_server_with_ctxt(config: MemtextdConfig, ctxt: ServerContext) {
    let cancellation_token = ctxt.cancellation_token();

    let addr = SocketAddr::new(config.listen_address, config.port);
    let memc_config = memc_tcp::MemcacheServerConfig::new(
        config.timeout_secs,
        config.connection_limit,
        config.item_size_limit as u32,
    );

    let runtime = create_multi_thread_runtime(config.threads);
    let mut tcp_server =
        memc_tcp::MemcacheTcpServer::new(memc_config, ctxt.store(), cancellation_token.clone());
    register_ctrlc_handler(&runtime, cancellation_token);
    if let Err(err) = runtime.block_on(tcp_server.run(addr)) {
        error!("Server error: {}", err);
    }
}
