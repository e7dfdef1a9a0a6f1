//! Per-connection session lifecycle.
//!
//! Each accepted connection runs two tasks sharing one client record: a
//! reader that feeds inbound lines through the pairing protocol, and a
//! writer that drains the client's mailbox back onto the socket in strict
//! enqueue order.

use crate::protocol::{self, Disposition};
use crate::server::PairRelay;
use pairline_types::Command;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

/// A per-connection session.
pub struct Session {
    relay: Arc<PairRelay>,
    stream: TcpStream,
    peer_addr: SocketAddr,
}

impl Session {
    /// Create a new session for an accepted connection.
    pub fn new(relay: Arc<PairRelay>, stream: TcpStream, peer_addr: SocketAddr) -> Self {
        Self {
            relay,
            stream,
            peer_addr,
        }
    }

    /// Run the session until the client quits or the connection drops.
    pub async fn run(self) {
        let (client, mailbox) = self.relay.registry().register().await;
        let id = client.id;
        tracing::info!("new client registered - {} ({})", id, self.peer_addr);

        client.send(protocol::welcome(id));

        let (read_half, write_half) = self.stream.into_split();
        let writer = tokio::spawn(drain_mailbox(mailbox, write_half));

        let mut lines = BufReader::new(read_half).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    // Graceful disconnect is never rate limited.
                    let quitting = matches!(Command::parse(&line), Some(Command::Quit));
                    if !quitting && self.relay.rate_limits().check_line(&id).is_err() {
                        self.relay
                            .metrics()
                            .rate_limit_hits
                            .fetch_add(1, Ordering::Relaxed);
                        client.send("Rate limit exceeded, message ignored");
                        continue;
                    }

                    match protocol::dispatch(&self.relay, &client, &line).await {
                        Disposition::Quit => break,
                        Disposition::Handled | Disposition::Relayed | Disposition::Dropped => {}
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!("read error from {}: {}", id, e);
                    self.relay
                        .metrics()
                        .errors_total
                        .fetch_add(1, Ordering::Relaxed);
                    break;
                }
            }
        }

        // Teardown: removing the registry entry and dropping our handle
        // drops the last mailbox senders; the writer drains what is left
        // and exits when the channel closes.
        self.relay.registry().unregister(id).await;
        drop(client);
        let _ = writer.await;

        tracing::info!("client disconnected - {}", id);
    }
}

/// Drain a mailbox onto the socket, one newline-terminated line per
/// message, until the mailbox closes or the socket dies.
async fn drain_mailbox(mut mailbox: mpsc::Receiver<String>, mut write_half: OwnedWriteHalf) {
    while let Some(mut message) = mailbox.recv().await {
        message.push('\n');
        if let Err(e) = write_half.write_all(message.as_bytes()).await {
            tracing::debug!("write failed, stopping writer: {}", e);
            break;
        }
    }
    let _ = write_half.shutdown().await;
}
