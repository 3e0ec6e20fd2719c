//! # oxo
//!
//! Networked tic-tac-toe match server: a TCP listener that pairs logged-in
//! players into games over a small binary protocol and tracks an Elo-style
//! rating per player.
//!
//! ```text
//! OxoServer (accept loop)
//!     ↓ one task per connection
//! service_loop (dispatch by packet type)
//!     ↓
//! oxo-client (Client, ClientRegistry)
//!     ↓
//! oxo-match (Invitation)  oxo-player (Player, PlayerRegistry)
//!     ↓
//! oxo-game (Game)
//! ```

mod error;
mod server;
mod service_loop;

pub use error::ServerError;
pub use server::OxoServer;
