use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Movie;

/// A saved movie: the full movie snapshot plus the time it was saved.
///
/// Stored as one document keyed by the movie id under the owning user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WishlistEntry {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(rename = "addedAt")]
    pub added_at: DateTime<Utc>,
}

impl WishlistEntry {
    /// Captures `movie` with the current time
    pub fn new(movie: Movie) -> Self {
        Self {
            movie,
            added_at: Utc::now(),
        }
    }

    /// Document key within the user's collection
    pub fn document_id(&self) -> String {
        self.movie.id.to_string()
    }
}

/// Lifecycle phase of the wishlist subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WishlistPhase {
    /// No user known; nothing subscribed
    Unbound,
    /// User known, subscription requested, no snapshot yet
    Bound,
    /// At least one snapshot delivered
    Live,
}

/// Read-only view of the wishlist as last delivered by the store
#[derive(Debug, Clone, Serialize)]
pub struct WishlistSnapshot {
    pub phase: WishlistPhase,
    pub entries: Vec<WishlistEntry>,
    pub loading: bool,
}

impl WishlistSnapshot {
    pub fn unbound() -> Self {
        Self {
            phase: WishlistPhase::Unbound,
            entries: Vec::new(),
            loading: true,
        }
    }

    pub fn contains(&self, movie_id: u64) -> bool {
        self.entries.iter().any(|entry| entry.movie.id == movie_id)
    }
}
