//! Identifier types for pairline.

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of a client identifier in characters.
pub const ID_LEN: usize = 6;

/// A short identifier assigned to a connected client.
///
/// Six ASCII characters from `[a-zA-Z0-9]`, unique among currently
/// connected clients and immutable for the lifetime of the connection.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientId([u8; ID_LEN]);

impl ClientId {
    /// Create a new random ClientId.
    ///
    /// Tokens are drawn from the OS CSPRNG so they cannot be guessed by
    /// other peers. Entropy-source failure aborts the process: handing out
    /// predictable identifiers is worse than not starting.
    pub fn random() -> Self {
        let mut bytes = [0u8; ID_LEN];
        for b in &mut bytes {
            *b = OsRng.sample(Alphanumeric);
        }
        Self(bytes)
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        // Constructors only admit ASCII alphanumerics.
        std::str::from_utf8(&self.0).expect("client id is ASCII")
    }

    /// Get the raw bytes of this ClientId.
    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }
}

impl FromStr for ClientId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ID_LEN {
            return Err(ParseIdError::Length(s.len()));
        }
        let mut bytes = [0u8; ID_LEN];
        for (slot, c) in bytes.iter_mut().zip(s.chars()) {
            if !c.is_ascii_alphanumeric() {
                return Err(ParseIdError::Charset(c));
            }
            *slot = c as u8;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientId({})", self.as_str())
    }
}

/// Error returned when a string is not a well-formed client identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseIdError {
    /// The token has the wrong length.
    #[error("client id must be {ID_LEN} characters, got {0}")]
    Length(usize),

    /// The token contains a character outside `[a-zA-Z0-9]`.
    #[error("client id contains invalid character {0:?}")]
    Charset(char),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_id_is_ascii_alphanumeric() {
        let id = ClientId::random();
        assert_eq!(id.as_str().len(), ID_LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn random_ids_differ() {
        // 62^6 tokens; a same-pair draw here means the source is broken.
        let a = ClientId::random();
        let b = ClientId::random();
        assert_ne!(a, b);
    }

    #[test]
    fn roundtrip_through_string() {
        let original = ClientId::random();
        let restored: ClientId = original.as_str().parse().unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!("abc".parse::<ClientId>(), Err(ParseIdError::Length(3)));
        assert_eq!(
            "abcdefg".parse::<ClientId>(),
            Err(ParseIdError::Length(7))
        );
        assert_eq!("".parse::<ClientId>(), Err(ParseIdError::Length(0)));
    }

    #[test]
    fn rejects_non_alphanumeric() {
        assert_eq!(
            "ab-cde".parse::<ClientId>(),
            Err(ParseIdError::Charset('-'))
        );
        assert!("ab cde".parse::<ClientId>().is_err());
    }

    #[test]
    fn display_matches_as_str() {
        let id: ClientId = "a1B2c3".parse().unwrap();
        assert_eq!(id.to_string(), "a1B2c3");
        assert_eq!(format!("{:?}", id), "ClientId(a1B2c3)");
    }
}
