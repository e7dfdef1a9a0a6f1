//! Command dispatch for the pairing protocol.
//!
//! Maps classified inbound lines onto registry operations. Every side
//! effect is a mailbox enqueue - the protocol never writes to a connection
//! directly, which preserves the single-writer-per-connection discipline.

use crate::error::PairingError;
use crate::registry::ClientHandle;
use crate::server::PairRelay;
use pairline_types::{ClientId, Command};
use std::sync::atomic::Ordering;

/// Welcome banner enqueued when a session starts, naming the assigned id
/// and summarizing the command surface.
pub fn welcome(id: ClientId) -> String {
    format!(
        "Welcome! Your ID is {id}\n\
         Commands:\n\
         /list - Show all clients\n\
         /connect <client-id> - Request to connect\n\
         /accept - Accept pending request\n\
         /quit - Disconnect"
    )
}

/// Outcome of feeding one inbound line through the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The line was a command and has been handled.
    Handled,
    /// The line was not a command and was relayed to the paired peer.
    Relayed,
    /// The line was not a command and the sender is unpaired; it was
    /// silently dropped.
    Dropped,
    /// The line was `/quit`; the session should terminate.
    Quit,
}

/// Feed one inbound line through the protocol.
///
/// Pairing failures are delivered as a text line on the sender's own
/// mailbox; they are never fatal and never reach the peer.
pub async fn dispatch(relay: &PairRelay, client: &ClientHandle, line: &str) -> Disposition {
    match Command::parse(line) {
        Some(Command::Quit) => Disposition::Quit,
        Some(Command::List) => {
            let ids = relay.registry().list().await;
            let names: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
            client.send(format!("Connected clients: [{}]", names.join(", ")));
            Disposition::Handled
        }
        Some(Command::Connect(token)) => {
            let result = match token.parse::<ClientId>() {
                Ok(target) => relay.registry().request_connection(client.id, target).await,
                // A malformed token can never name a connected client.
                Err(_) => Err(PairingError::TargetNotFound),
            };
            if let Err(e) = result {
                client.send(e.to_string());
            }
            Disposition::Handled
        }
        Some(Command::Accept) => {
            match relay.registry().accept_connection(client.id).await {
                Ok(()) => {
                    relay.metrics().pairs_total.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => client.send(e.to_string()),
            }
            Disposition::Handled
        }
        None => {
            if relay.registry().relay(client.id, line).await {
                relay.metrics().relayed_total.fetch_add(1, Ordering::Relaxed);
                Disposition::Relayed
            } else {
                Disposition::Dropped
            }
        }
    }
}
