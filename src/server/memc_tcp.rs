use std::sync::Arc;
use tokio::io;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::client_handler::{Client, ClientConfig};
use crate::cache::engine::StorageEngine;

#[derive(Clone, Copy)]
pub struct MemcacheServerConfig {
    timeout_secs: u32,
    connection_limit: u32,
    item_size_limit: u32,
}

impl MemcacheServerConfig {
    pub fn new(
        timeout_secs: u32,
        connection_limit: u32,
        item_size_limit: u32,
    ) -> MemcacheServerConfig {
        MemcacheServerConfig {
            timeout_secs,
            connection_limit,
            item_size_limit,
        }
    }
}

pub struct MemcacheTcpServer {
    config: MemcacheServerConfig,
    storage: Arc<StorageEngine>,
    cancellation_token: CancellationToken,
    limit_connections: Arc<Semaphore>,
}

impl MemcacheTcpServer {
    pub fn new(
        config: MemcacheServerConfig,
        storage: Arc<StorageEngine>,
        cancellation_token: CancellationToken,
    ) -> MemcacheTcpServer {
        MemcacheTcpServer {
            config,
            storage,
            cancellation_token,
            limit_connections: Arc::new(Semaphore::new(config.connection_limit as usize)),
        }
    }

    /// Accepts connections until the cancellation token fires. Returning
    /// drops the listener; sessions already spawned keep running until they
    /// finish on their own.
    pub async fn run<A: ToSocketAddrs>(&mut self, addr: A) -> io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!("Listening on: {}", listener.local_addr()?);
        loop {
            tokio::select! {
                _ = self.cancellation_token.cancelled() => {
                    info!("Shutdown requested, closing listener");
                    return Ok(());
                },
                connection = listener.accept() => {
                    match connection {
                        Ok((socket, addr)) => {
                            socket.set_nodelay(true)?;
                            let client = Client::new(
                                self.storage.clone(),
                                socket,
                                addr,
                                ClientConfig {
                                    item_size_limit: self.config.item_size_limit,
                                    rx_timeout_secs: self.config.timeout_secs,
                                },
                                self.limit_connections.clone(),
                            );

                            self.limit_connections.acquire().await.unwrap().forget();
                            // Like with other small servers, we'll `spawn` this client to
                            // ensure it runs concurrently with all other clients. The `move`
                            // keyword is used here to move ownership of our store handle
                            // into the async closure.
                            tokio::spawn(async move { client.handle().await });
                            debug!("Connection accepted");
                        },
                        Err(err) => {
                            error!("{}", err);
                        }
                    }
                },
            }
        }
    }
}
