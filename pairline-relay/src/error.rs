//! Error types for pairline-relay.

/// Main error type for relay operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pairing-protocol failures.
///
/// The `Display` text is exactly the line delivered to the requesting
/// client's own mailbox. A pairing failure never reaches the peer and
/// never terminates the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PairingError {
    /// Connect named an id that is not registered.
    #[error("Client not found")]
    TargetNotFound,

    /// Connect named a target that is already paired.
    #[error("Client is already in a chat")]
    TargetBusy,

    /// The requesting client is already paired.
    #[error("You are already in a chat")]
    RequestorBusy,

    /// Accept with no request pending for this client.
    #[error("No pending chat requests")]
    NoPendingRequest,

    /// Accept where the recorded requestor has disconnected.
    #[error("Requesting client no longer connected")]
    RequestorGone,
}

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Result type alias for pairing operations.
pub type PairingResult<T> = std::result::Result<T, PairingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairing_error_text_is_client_facing() {
        assert_eq!(PairingError::TargetNotFound.to_string(), "Client not found");
        assert_eq!(
            PairingError::TargetBusy.to_string(),
            "Client is already in a chat"
        );
        assert_eq!(
            PairingError::RequestorBusy.to_string(),
            "You are already in a chat"
        );
        assert_eq!(
            PairingError::NoPendingRequest.to_string(),
            "No pending chat requests"
        );
        assert_eq!(
            PairingError::RequestorGone.to_string(),
            "Requesting client no longer connected"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RelayError>();
        assert_send_sync::<PairingError>();
    }
}
