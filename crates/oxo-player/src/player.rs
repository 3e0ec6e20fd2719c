//! A named, rated player identity.
//!
//! A `Player` outlives any single connection — it is looked up (or
//! created) by name at login and kept around in the [`PlayerRegistry`]
//! so a rating survives logout/login cycles. It is shared by reference
//! (`Arc<Player>`): a Client holds one while its owner is logged in, the
//! registry holds one for as long as the process runs.
//!
//! [`PlayerRegistry`]: crate::PlayerRegistry

use std::fmt;
use std::sync::Mutex;

/// A stable integer identity, assigned in registration order. Used only
/// to put a total order on rating-lock acquisition (ascending Player id)
/// so updating two players' ratings can never deadlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The rating every newly registered player starts with.
pub const INITIAL_RATING: f64 = 1500.0;

/// A named player and their Elo-style rating.
///
/// The name is immutable for the player's lifetime — it's the registry
/// key. The rating is mutable and is read far more often than it's
/// written, but a plain `Mutex` is enough here: the critical section is
/// a handful of floating-point operations, never an `.await`.
#[derive(Debug)]
pub struct Player {
    id: PlayerId,
    name: String,
    rating: Mutex<f64>,
}

impl Player {
    pub(crate) fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            rating: Mutex::new(INITIAL_RATING),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The nearest integer to the internal real-valued rating — every
    /// public read of a rating is rounded, only the update arithmetic
    /// works on the real value.
    pub fn rating(&self) -> i64 {
        self.rating.lock().unwrap().round() as i64
    }

    /// Direct access to the rating lock, for the rating-update protocol
    /// in [`crate::post_result`] — the two-player update must hold both
    /// players' locks at once, in ascending id order, so it cannot go
    /// through a lock-and-immediately-release accessor.
    pub(crate) fn rating_lock(&self) -> &Mutex<f64> {
        &self.rating
    }
}
