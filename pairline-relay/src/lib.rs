//! # pairline-relay
//!
//! Line-oriented TCP pairing relay.
//!
//! This crate implements a relay server that:
//! - Assigns every connecting peer a short random identifier
//! - Arbitrates exclusive, symmetric pairings between peers
//! - Relays raw text lines between paired peers
//! - Holds all state in memory (nothing survives a restart)
//!
//! ## Architecture
//!
//! ```text
//! Client A ──┐                    ┌── Client B
//!            │   TCP text lines   │
//!            ├───────────────────►│
//!            │                    │
//!        ┌───┴────────────────────┴───┐
//!        │       pairline-relay       │
//!        │  ┌─────────────────────┐   │
//!        │  │ Registry (clients,  │   │
//!        │  │  pending requests)  │   │
//!        │  └─────────────────────┘   │
//!        └────────────────────────────┘
//! ```
//!
//! ## Protocol
//!
//! Newline-delimited text. Recognized commands:
//! - `/list` - show connected client ids
//! - `/connect <id>` - request pairing with a client
//! - `/accept` - accept the pending request addressed to you
//! - `/quit` - disconnect
//!
//! Any other line is relayed to the paired peer, or silently dropped
//! when unpaired.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod http;
pub mod ident;
pub mod limits;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
