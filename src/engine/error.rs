//! Engine Errors

use thiserror::Error;

use crate::core::ids::{Amount, GameId, PlayerId};

/// Errors returned by engine operations.
///
/// Every variant is local and recoverable: a failed call leaves the ledger,
/// escrow and game table exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Free balance is lower than the requested debit.
    #[error("insufficient balance for {player}: have {available}, need {required}")]
    InsufficientBalance {
        /// Debited party.
        player: PlayerId,
        /// Free balance.
        available: Amount,
        /// Requested amount.
        required: Amount,
    },

    /// Second player's stake differs from the first.
    #[error("stake mismatch in game {game_id}: expected {expected}, got {got}")]
    StakeMismatch {
        /// Game.
        game_id: GameId,
        /// Stake set by player 1.
        expected: Amount,
        /// Stake offered.
        got: Amount,
    },

    /// Both player slots are taken.
    #[error("game {0} already has two players")]
    GameFull(GameId),

    /// Player 1 tried to join their own game.
    #[error("player {player} already joined game {game_id}")]
    DuplicateJoin {
        /// Game.
        game_id: GameId,
        /// Caller.
        player: PlayerId,
    },

    /// No game was ever created under this id.
    #[error("unknown game {0}")]
    UnknownGame(GameId),

    /// Caller is not a participant allowed to perform the call.
    #[error("player {player} is not a participant of game {game_id}")]
    UnknownPlayer {
        /// Game.
        game_id: GameId,
        /// Caller.
        player: PlayerId,
    },

    /// Game is not in the reveal phase.
    #[error("game {0} is not accepting reveals")]
    NotRevealable(GameId),

    /// Caller's move is already revealed.
    #[error("player {player} already revealed in game {game_id}")]
    AlreadyRevealed {
        /// Game.
        game_id: GameId,
        /// Caller.
        player: PlayerId,
    },

    /// Move and key do not open the stored commitment.
    #[error("reveal does not match commitment in game {0}")]
    CommitmentMismatch(GameId),

    /// Second player arrived after the commit deadline.
    #[error("commit window of game {game_id} closed at tick {deadline}")]
    CommitWindowExpired {
        /// Game.
        game_id: GameId,
        /// Commit deadline.
        deadline: u64,
    },

    /// Reveal arrived after the reveal deadline; use `claim_timeout`.
    #[error("reveal window of game {game_id} closed at tick {deadline}")]
    RevealWindowExpired {
        /// Game.
        game_id: GameId,
        /// Reveal deadline.
        deadline: u64,
    },

    /// Game is terminal and its id cannot be reused.
    #[error("game {0} is closed")]
    GameClosed(GameId),

    /// Only a lone committer may cancel, and only before anyone joins.
    #[error("game {0} cannot be cancelled in its current state")]
    NotCancellable(GameId),

    /// Timeout claimed while the active window is still open.
    #[error("deadline of game {game_id} not reached: now {now}, deadline {deadline}")]
    DeadlineNotReached {
        /// Game.
        game_id: GameId,
        /// Current tick.
        now: u64,
        /// Active deadline.
        deadline: u64,
    },

    /// Balance arithmetic would overflow.
    #[error("amount overflow")]
    AmountOverflow,

    /// Payout does not match the escrowed amount. Indicates a defect.
    #[error("escrow imbalance in game {game_id}: held {held}, paying {paying}")]
    EscrowImbalance {
        /// Game.
        game_id: GameId,
        /// Amount in escrow.
        held: Amount,
        /// Amount requested for release.
        paying: Amount,
    },
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
