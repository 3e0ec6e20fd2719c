//! Per-connection client state, sitting between the wire-level service
//! loop and the invitation/game domain crates.
//!
//! ```text
//! Service loop (above)  ← dispatches packets, owns the socket read loop
//!     ↕
//! Client / ClientRegistry (this crate)  ← login state, slot table, notifications
//!     ↕
//! Invitation / Game (below)
//! ```

mod client;
mod error;
mod registry;

pub use client::Client;
pub use error::ClientError;
pub use registry::{ClientRegistry, MAX_CLIENTS};
