//! Core primitives.
//!
//! Hashing, identities and the injected clock. Nothing in here knows about
//! games or balances.

pub mod hash;
pub mod ids;
pub mod clock;

// Re-export core types
pub use hash::{StateHash, StateHasher};
pub use ids::{PlayerId, GameId, Amount};
pub use clock::{Clock, ManualClock, BlockClock, SystemClock};
