//! The player registry: canonicalizes names to unique `Player` entities.
//!
//! A name identifies at most one `Player` for the lifetime of the
//! process. Logging in and back out does not lose a rating — the
//! registry hands back the same `Player` (and so the same rating) every
//! time the same name is presented.
//!
//! # Concurrency note
//!
//! The registry's table is a plain `Mutex<HashMap<..>>` — a "pure data"
//! lock with no `.await` under it, held only long enough to look up or
//! insert an entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::PlayerError;
use crate::player::{Player, PlayerId};

/// Outcome of a completed game, as fed into [`post_result`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Draw,
    FirstWins,
    SecondWins,
}

/// A set of Players keyed by name. Invariant: at most one `Player` per
/// name, for the lifetime of the process.
pub struct PlayerRegistry {
    by_name: Mutex<HashMap<String, Arc<Player>>>,
    next_id: Mutex<u64>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self {
            by_name: Mutex::new(HashMap::new()),
            next_id: Mutex::new(0),
        }
    }

    /// Looks up the Player for `name`, registering a fresh one (rating
    /// 1500, next id in sequence) if this is the first time the name
    /// has been seen.
    pub fn login_or_create(&self, name: &str) -> Result<Arc<Player>, PlayerError> {
        if name.is_empty() {
            return Err(PlayerError::EmptyName);
        }

        let mut table = self.by_name.lock().unwrap();
        if let Some(existing) = table.get(name) {
            return Ok(Arc::clone(existing));
        }

        let mut next_id = self.next_id.lock().unwrap();
        let id = PlayerId(*next_id);
        *next_id += 1;
        drop(next_id);

        let player = Arc::new(Player::new(id, name.to_string()));
        table.insert(name.to_string(), Arc::clone(&player));
        tracing::info!(player_id = %id, %name, "player registered");
        Ok(player)
    }

    /// Snapshot of every Player ever registered, in registration order.
    pub fn all(&self) -> Vec<Arc<Player>> {
        let table = self.by_name.lock().unwrap();
        let mut players: Vec<_> = table.values().cloned().collect();
        players.sort_by_key(|p| p.id());
        players
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies an Elo-style rating update for a finished game between
/// `first` (the FIRST_PLAYER side) and `second`.
///
/// Acquires both players' rating locks in ascending Player-id order and
/// releases in descending order — a global total order that makes the
/// A-then-B / B-then-A deadlock impossible regardless of which side of
/// the game called `post_result` first.
pub fn post_result(first: &Player, second: &Player, outcome: Outcome) {
    if first.id() < second.id() {
        let mut r1 = first.rating_lock().lock().unwrap();
        let mut r2 = second.rating_lock().lock().unwrap();
        apply(&mut r1, &mut r2, outcome);
    } else {
        let mut r2 = second.rating_lock().lock().unwrap();
        let mut r1 = first.rating_lock().lock().unwrap();
        apply(&mut r1, &mut r2, outcome);
    }
}

fn apply(r1: &mut f64, r2: &mut f64, outcome: Outcome) {
    let s1 = match outcome {
        Outcome::FirstWins => 1.0,
        Outcome::SecondWins => 0.0,
        Outcome::Draw => 0.5,
    };
    let s2 = 1.0 - s1;

    let e1 = 1.0 / (1.0 + 10f64.powf((*r2 - *r1) / 400.0));
    let e2 = 1.0 - e1;

    *r1 += 32.0 * (s1 - e1);
    *r2 += 32.0 * (s2 - e2);
}
