use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use futures::sink::SinkExt;
use futures::StreamExt;
use tokio_util::codec::{FramedRead, FramedWrite};

use super::handler;
use crate::cache::engine::StorageEngine;
use crate::protocol::text::Response;
use crate::protocol::text_codec::{MemcacheTextCodec, TextFrame};

pub struct ClientConfig {
    pub(crate) item_size_limit: u32,
    pub(crate) rx_timeout_secs: u32,
}

pub struct Client {
    store: Arc<StorageEngine>,
    socket: TcpStream,
    addr: SocketAddr,
    config: ClientConfig,
    /// Max connection semaphore.
    ///
    /// When the handler is dropped, a permit is returned to this semaphore. If
    /// the listener is waiting for connections to close, it will be notified of
    /// the newly available permit and resume accepting connections.
    limit_connections: Arc<Semaphore>,
}

impl Client {
    pub fn new(
        store: Arc<StorageEngine>,
        socket: TcpStream,
        addr: SocketAddr,
        config: ClientConfig,
        limit_connections: Arc<Semaphore>,
    ) -> Self {
        Client {
            store,
            socket,
            addr,
            config,
            limit_connections,
        }
    }

    pub async fn handle(mut self) {
        debug!("New client connected: {}", self.addr);
        let handler = handler::TextCommandHandler::new(self.store.clone());
        let (rx, tx) = self.socket.split();

        let mut reader = FramedRead::new(rx, MemcacheTextCodec::new(self.config.item_size_limit));
        let mut writer = FramedWrite::new(tx, MemcacheTextCodec::new(self.config.item_size_limit));

        // For every frame the decoder hands back we dispatch one command and
        // write at most one response. The idle timer re-arms per complete
        // frame, so trickling half a command does not count as activity.
        loop {
            match timeout(
                Duration::from_secs(self.config.rx_timeout_secs as u64),
                reader.next(),
            )
            .await
            {
                Ok(Some(Ok(frame))) => {
                    let response = match frame {
                        TextFrame::Command(command) => handler.handle_command(command),
                        TextFrame::Error(err) => {
                            // recoverable: report on the wire, keep serving
                            warn!("protocol error from {}: {}", self.addr, err);
                            Some(Response::Error(err))
                        }
                    };
                    if let Some(response) = response {
                        if let Err(e) = writer.send(response).await {
                            error!("error on sending response; error = {:?}", e);
                            return;
                        }
                    }
                }
                Ok(Some(Err(e))) => {
                    error!("Error decoding msg from socket; error = {:?}", e);
                    return;
                }
                Ok(None) => {
                    debug!("Connection closed: {}", self.addr);
                    return;
                }
                Err(err) => {
                    debug!(
                        "Timeout {}s elapsed, disconecting client: {}, error: {}",
                        self.config.rx_timeout_secs, self.addr, err
                    );
                    return;
                }
            }
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        // Add a permit back to the semaphore.
        //
        // Doing so unblocks the listener if the max number of
        // connections has been reached.
        //
        // This is done in a `Drop` implementation in order to guarantee that
        // the permit is added even if the task handling the connection panics.
        // If `add_permit` was called at the end of the `run` function and some
        // bug causes a panic. The permit would never be returned to the
        // semaphore.
        self.limit_connections.add_permits(1);
    }
}
