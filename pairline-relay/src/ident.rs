//! Identifier allocation for connecting clients.

use pairline_types::ClientId;

/// Source of candidate client identifiers.
///
/// The registry draws a token from this source at registration and retries
/// until the token is unused, so a source only has to be unique *enough*.
/// Pluggable so tests can script collisions.
pub trait IdentitySource: Send + Sync {
    /// Produce one candidate identifier.
    fn generate(&self) -> ClientId;
}

/// CSPRNG-backed identity source used in production.
///
/// Entropy-source failure aborts the process (see [`ClientId::random`]);
/// predictable identifiers would let peers hijack connection requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdentitySource for RandomIds {
    fn generate(&self) -> ClientId {
        ClientId::random()
    }
}
