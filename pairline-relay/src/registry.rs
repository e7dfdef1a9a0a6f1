//! Shared client registry and pairing state.
//!
//! The registry is the process-wide store of connected clients and pending
//! connection requests. One reader/writer lock guards both maps and every
//! `paired` field; mutations take the exclusive mode, snapshots the shared
//! mode. No I/O happens under the lock: every notification is a bounded
//! mailbox enqueue, so the exclusion window stays short.

use crate::error::{PairingError, PairingResult};
use crate::ident::{IdentitySource, RandomIds};
use pairline_types::ClientId;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::sync::RwLock;

/// Capacity of each client's outbound mailbox.
pub const MAILBOX_CAPACITY: usize = 10;

/// Registry-side record of one connected client.
///
/// Pairing is id-based: `paired` names the peer, and every use resolves it
/// through the registry under the lock. The record never holds a reference
/// to another record, so concurrent removal cannot dangle.
#[derive(Debug)]
struct Client {
    outbound: mpsc::Sender<String>,
    paired: Option<ClientId>,
}

/// Handle held by the session that owns the connection.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    /// Identifier assigned at registration, immutable for the connection.
    pub id: ClientId,
    outbound: mpsc::Sender<String>,
}

impl ClientHandle {
    /// Enqueue a message onto this client's own mailbox.
    ///
    /// Non-blocking: a full or already-closed mailbox drops the message.
    pub fn send(&self, message: impl Into<String>) {
        enqueue(&self.outbound, message);
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    clients: HashMap<ClientId, Client>,
    /// Pending connection requests, keyed by target id. At most one per
    /// target; a newer request silently replaces the old one.
    requests: HashMap<ClientId, ClientId>,
}

/// The shared store of connected clients and pending pairing requests.
pub struct Registry {
    ids: Box<dyn IdentitySource>,
    inner: RwLock<RegistryInner>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").finish_non_exhaustive()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry backed by the production identity source.
    pub fn new() -> Self {
        Self::with_identity_source(Box::new(RandomIds))
    }

    /// Create an empty registry with a custom identity source.
    pub fn with_identity_source(ids: Box<dyn IdentitySource>) -> Self {
        Self {
            ids,
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Register a new client, returning its handle and the receiving half
    /// of its mailbox.
    ///
    /// Identifier generation retries until the token is not already in use;
    /// blind insertion could silently replace a connected client's entry.
    pub async fn register(&self) -> (ClientHandle, mpsc::Receiver<String>) {
        let mut inner = self.inner.write().await;

        let id = loop {
            let candidate = self.ids.generate();
            if !inner.clients.contains_key(&candidate) {
                break candidate;
            }
            tracing::debug!("id collision on {}, regenerating", candidate);
        };

        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        inner.clients.insert(
            id,
            Client {
                outbound: tx.clone(),
                paired: None,
            },
        );

        tracing::debug!("registered client {} (total: {})", id, inner.clients.len());

        (ClientHandle { id, outbound: tx }, rx)
    }

    /// Remove a client.
    ///
    /// Clears the peer's pairing back-reference and enqueues exactly one
    /// disconnection notice onto the peer's mailbox, then drops the
    /// client's registry entry and any pending request addressed to it.
    /// Idempotent: a second call for the same id is a no-op.
    pub async fn unregister(&self, id: ClientId) {
        let mut inner = self.inner.write().await;

        let Some(client) = inner.clients.remove(&id) else {
            return;
        };

        if let Some(peer_id) = client.paired {
            if let Some(peer) = inner.clients.get_mut(&peer_id) {
                peer.paired = None;
                enqueue(&peer.outbound, "Your chat partner has disconnected.");
            }
        }

        inner.requests.remove(&id);

        tracing::debug!(
            "unregistered client {} (remaining: {})",
            id,
            inner.clients.len()
        );
    }

    /// Snapshot of currently registered ids, sorted for stable output.
    pub async fn list(&self) -> Vec<ClientId> {
        let inner = self.inner.read().await;
        let mut ids: Vec<ClientId> = inner.clients.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of currently registered clients.
    pub async fn total_clients(&self) -> usize {
        self.inner.read().await.clients.len()
    }

    /// Number of established pairings.
    pub async fn total_pairs(&self) -> usize {
        let inner = self.inner.read().await;
        inner
            .clients
            .values()
            .filter(|c| c.paired.is_some())
            .count()
            / 2
    }

    /// The peer a client is currently paired with, if any.
    pub async fn paired_with(&self, id: ClientId) -> Option<ClientId> {
        self.inner.read().await.clients.get(&id).and_then(|c| c.paired)
    }

    /// The requestor recorded against a target, if any.
    pub async fn pending_request(&self, target: ClientId) -> Option<ClientId> {
        self.inner.read().await.requests.get(&target).copied()
    }

    /// Record a connection request from `requestor` to `target` and notify
    /// both sides.
    ///
    /// A target holds at most one pending request; a newer request silently
    /// replaces it. Nothing bounds how many targets a single requestor has
    /// outstanding requests with.
    pub async fn request_connection(
        &self,
        requestor: ClientId,
        target: ClientId,
    ) -> PairingResult<()> {
        let mut inner = self.inner.write().await;

        let (requestor_tx, target_tx) = {
            let target_client = inner
                .clients
                .get(&target)
                .ok_or(PairingError::TargetNotFound)?;
            if target_client.paired.is_some() {
                return Err(PairingError::TargetBusy);
            }

            let requestor_client = inner
                .clients
                .get(&requestor)
                .ok_or(PairingError::RequestorGone)?;
            if requestor_client.paired.is_some() {
                return Err(PairingError::RequestorBusy);
            }

            (
                requestor_client.outbound.clone(),
                target_client.outbound.clone(),
            )
        };

        inner.requests.insert(target, requestor);

        enqueue(
            &requestor_tx,
            format!("Connection request sent to {}", target),
        );
        enqueue(
            &target_tx,
            format!("{} wants to chat with you. Type /accept to accept.", requestor),
        );

        Ok(())
    }

    /// Accept the request pending for `acceptor`, establishing a symmetric
    /// pairing, and notify both sides.
    ///
    /// A stale request entry - the requestor disconnected, or either side
    /// paired elsewhere since the request was recorded - is rejected, and
    /// where the entry can never become valid again it is also cleared.
    pub async fn accept_connection(&self, acceptor: ClientId) -> PairingResult<()> {
        let mut inner = self.inner.write().await;

        let Some(&requestor) = inner.requests.get(&acceptor) else {
            return Err(PairingError::NoPendingRequest);
        };

        let acceptor_tx = match inner.clients.get(&acceptor) {
            Some(c) if c.paired.is_some() => return Err(PairingError::RequestorBusy),
            Some(c) => c.outbound.clone(),
            // Unreachable for a live session; treat like a missing request.
            None => return Err(PairingError::NoPendingRequest),
        };

        let requestor_tx = match inner.clients.get(&requestor) {
            Some(c) if c.paired.is_some() => {
                inner.requests.remove(&acceptor);
                return Err(PairingError::TargetBusy);
            }
            Some(c) => c.outbound.clone(),
            None => {
                inner.requests.remove(&acceptor);
                return Err(PairingError::RequestorGone);
            }
        };

        if let Some(c) = inner.clients.get_mut(&acceptor) {
            c.paired = Some(requestor);
        }
        if let Some(c) = inner.clients.get_mut(&requestor) {
            c.paired = Some(acceptor);
        }
        inner.requests.remove(&acceptor);

        enqueue(
            &acceptor_tx,
            format!("You are now chatting with {}", requestor),
        );
        enqueue(
            &requestor_tx,
            format!("You are now chatting with {}", acceptor),
        );

        Ok(())
    }

    /// Relay a text line from a client to its paired peer.
    ///
    /// The peer is resolved through the registry on every call. Returns
    /// whether a peer existed to relay to; an unpaired sender's line is
    /// silently dropped.
    pub async fn relay(&self, from: ClientId, line: &str) -> bool {
        let inner = self.inner.read().await;

        let Some(peer_id) = inner.clients.get(&from).and_then(|c| c.paired) else {
            return false;
        };

        match inner.clients.get(&peer_id) {
            Some(peer) => {
                enqueue(&peer.outbound, format!("{}: {}", from, line));
                true
            }
            None => false,
        }
    }
}

/// Non-blocking mailbox enqueue.
///
/// A full mailbox or one whose writer already exited drops the message;
/// a producer must never block on a queue nobody is draining.
fn enqueue(outbound: &mpsc::Sender<String>, message: impl Into<String>) {
    if let Err(e) = outbound.try_send(message.into()) {
        tracing::debug!("mailbox enqueue dropped: {}", e);
    }
}
