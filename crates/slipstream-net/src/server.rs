//! TCP message server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::NetError;
use crate::protocol::Message;
use crate::queue::MessageQueue;

/// How often queued outbound messages are pushed to clients
const FLUSH_INTERVAL: Duration = Duration::from_millis(10);

/// Outbound lines buffered per client before a slow client starts losing messages
const BROADCAST_CAPACITY: usize = 1024;

/// Message server handle - keep this alive to keep the server running.
///
/// Every line a client sends is decoded and pushed onto the queue's inbound
/// side. Everything sent through the queue's outbound side is broadcast to all
/// connected clients.
pub struct MessageServer {
    local_addr: SocketAddr,
    accept_handle: JoinHandle<()>,
    flush_handle: JoinHandle<()>,
}

impl MessageServer {
    /// Bind the listener and start the accept and flush tasks.
    /// Must be called from within a tokio runtime.
    pub async fn bind(addr: impl ToSocketAddrs, queue: Arc<MessageQueue>) -> Result<Self, NetError> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        log::info!("Message server listening on {}", local_addr);

        let (tx, _) = broadcast::channel::<String>(BROADCAST_CAPACITY);

        let accept_queue = queue.clone();
        let accept_tx = tx.clone();
        let accept_handle = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, peer)) => {
                        log::info!("Client connected from {}", peer);
                        let queue = accept_queue.clone();
                        let rx = accept_tx.subscribe();
                        tokio::spawn(async move {
                            handle_connection(stream, queue, rx).await;
                            log::info!("Client disconnected: {}", peer);
                        });
                    }
                    Err(e) => {
                        log::error!("Message server accept error: {}", e);
                    }
                }
            }
        });

        let flush_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(FLUSH_INTERVAL);
            loop {
                interval.tick().await;
                let pending = queue.drain_outbound();
                // Nobody is listening; late clients resync through CLIENT_INIT
                if tx.receiver_count() == 0 {
                    if !pending.is_empty() {
                        log::debug!("No clients connected, dropping {} messages", pending.len());
                    }
                    continue;
                }
                for msg in pending {
                    match msg.encode() {
                        Ok(line) => {
                            let _ = tx.send(line);
                        }
                        Err(e) => log::error!("Failed to encode {:?}: {}", msg, e),
                    }
                }
            }
        });

        Ok(Self {
            local_addr,
            accept_handle,
            flush_handle,
        })
    }

    /// Address the listener is actually bound to (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Drop for MessageServer {
    fn drop(&mut self) {
        self.accept_handle.abort();
        self.flush_handle.abort();
    }
}

async fn handle_connection(
    stream: TcpStream,
    queue: Arc<MessageQueue>,
    mut outbound: broadcast::Receiver<String>,
) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match Message::decode(&line) {
                        Ok(msg) => {
                            log::debug!("Received {:?}", msg);
                            queue.push_inbound(msg);
                        }
                        Err(e) => log::warn!("Dropping invalid message: {}", e),
                    }
                }
                Ok(None) => break, // Connection closed
                Err(e) => {
                    log::error!("Message server read error: {}", e);
                    break;
                }
            },
            line = outbound.recv() => match line {
                Ok(mut line) => {
                    line.push('\n');
                    if let Err(e) = writer.write_all(line.as_bytes()).await {
                        log::error!("Message server write error: {}", e);
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("Client fell behind, skipped {} messages", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}
