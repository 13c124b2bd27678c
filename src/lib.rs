//! # RPS Escrow
//!
//! Commit-reveal Rock-Paper-Scissors wagering with escrowed stakes and
//! timeout forfeiture.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       RPS ESCROW                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── hash.rs     - Domain-separated SHA-256                  │
//! │  ├── ids.rs      - Player ids, game ids, amounts             │
//! │  └── clock.rs    - Injected clock (manual, block, system)    │
//! │                                                              │
//! │  engine/         - Wagering logic (single-threaded)          │
//! │  ├── commitment.rs - Move commit / verify                    │
//! │  ├── ledger.rs   - Free balances                             │
//! │  ├── escrow.rs   - Per-game stakes                           │
//! │  ├── game.rs     - Game records and snapshots                │
//! │  ├── settlement.rs - Outcome rule and payouts                │
//! │  ├── timeout.rs  - Deadline enforcement                      │
//! │  └── table.rs    - Engine aggregate and operations           │
//! │                                                              │
//! │  service/        - Shared async handle                       │
//! │  └── shared.rs   - One lock around the engine                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Fund Safety
//!
//! - Every operation validates before it mutates; errors change nothing
//! - `balances + escrow == deposited - withdrawn` after every call
//! - Payout notices go out only after the state transition is committed
//! - Deadlines are evaluated against an injected clock, never ambient time

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod engine;
pub mod service;

// Re-export commonly used types
pub use crate::core::ids::{Amount, GameId, PlayerId};
pub use crate::core::clock::{Clock, ManualClock, BlockClock, SystemClock};
pub use engine::{
    commit, verify, Commitment, Move,
    Engine, EngineConfig, EngineError, GameSnapshot, GameState, Outcome,
    Payout, PayoutHook, Resolution, UnitClock,
};
pub use service::SharedEngine;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
