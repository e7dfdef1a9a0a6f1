//! # pairline-types
//!
//! Shared types for the pairline relay.
//!
//! This crate provides the types that describe the relay's external surface:
//! - [`ClientId`] - Short random identifier assigned to each connected peer
//! - [`Command`] - Classification of inbound text lines
//! - [`ParseIdError`] - Rejection of malformed identifier tokens

#![warn(missing_docs)]
#![warn(clippy::all)]

mod command;
mod ids;

pub use command::Command;
pub use ids::{ClientId, ParseIdError, ID_LEN};
