//! Wagering Engine
//!
//! Commit-reveal Rock-Paper-Scissors with escrowed stakes.
//!
//! ## Module Structure
//!
//! - `commitment`: Move encoding, commit/verify
//! - `ledger`: Free balances per identity
//! - `escrow`: Stakes held per game
//! - `game`: Game record, states, snapshots
//! - `settlement`: Outcome rule and payouts
//! - `timeout`: Deadline enforcement
//! - `events`: Audit log and payout notices
//! - `config`: Engine configuration
//! - `table`: The `Engine` aggregate and its operations

pub mod commitment;
pub mod config;
pub mod error;
pub mod escrow;
pub mod events;
pub mod game;
pub mod ledger;
pub mod settlement;
pub mod table;
pub mod timeout;


// Re-export key types
pub use commitment::{commit, verify, generate_secret, Commitment, Move};
pub use config::{ConfigError, EngineConfig, TimeUnit, UnitClock};
pub use error::{EngineError, Result};
pub use events::{EngineEvent, EventRecord, Payout, PayoutReason};
pub use game::{GameSnapshot, GameState, Outcome};
pub use settlement::{decide, RoundResult};
pub use table::{Engine, PayoutHook};
pub use timeout::Resolution;
