//! Timeout Monitor
//!
//! Pull-based deadline handling. Nothing runs in the background: a deadline
//! only takes effect when someone calls `claim_timeout` or reads the game
//! through `get_game_state`.

use serde::{Serialize, Deserialize};

use crate::core::ids::{Amount, PlayerId};
use super::error::{EngineError, Result};
use super::escrow::Escrow;
use super::game::{Game, GameState, Outcome, Seat};
use super::ledger::Ledger;
use super::settlement::settle;

/// What a deadline check decided for one game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeoutAction {
    /// Game already terminal; nothing to do.
    AlreadyTerminal,
    /// Active window still open.
    NotDue {
        /// Deadline of the open window.
        deadline: u64,
    },
    /// Nobody joined in time; refund player 1.
    RefundLoneCommitter,
    /// Exactly one player revealed; they take the pot.
    Forfeit {
        /// Revealing seat.
        winner: Seat,
    },
    /// Neither revealed; refund both.
    RefundBoth,
    /// Both moves are on record; settle normally.
    Settle,
}

/// Result of a successful `claim_timeout`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Game was already terminal.
    AlreadyTerminal,
    /// Revealer took the silent player's stake.
    Forfeited {
        /// Revealing player.
        winner: PlayerId,
    },
    /// Stakes were returned.
    Voided,
    /// Both reveals were on record and the game settled.
    Settled,
}

/// Decide what the deadline rules require for `game` at `now`.
pub fn assess(game: &Game, now: u64) -> TimeoutAction {
    match game.state {
        GameState::Settled | GameState::Forfeited | GameState::Void => TimeoutAction::AlreadyTerminal,
        GameState::AwaitingPlayers => {
            if now > game.commit_deadline {
                TimeoutAction::RefundLoneCommitter
            } else {
                TimeoutAction::NotDue { deadline: game.commit_deadline }
            }
        }
        GameState::AwaitingReveals => {
            let deadline = game.reveal_deadline.unwrap_or(game.commit_deadline);
            if now <= deadline {
                return TimeoutAction::NotDue { deadline };
            }
            match (game.revealed_move1.is_some(), game.revealed_move2.is_some()) {
                (true, true) => TimeoutAction::Settle,
                (true, false) => TimeoutAction::Forfeit { winner: Seat::First },
                (false, true) => TimeoutAction::Forfeit { winner: Seat::Second },
                (false, false) => TimeoutAction::RefundBoth,
            }
        }
    }
}

/// Apply a due action. Returns the credits made.
///
/// `NotDue` is reported as [`EngineError::DeadlineNotReached`].
pub fn apply(
    game: &mut Game,
    escrow: &mut Escrow,
    ledger: &mut Ledger,
    action: TimeoutAction,
    now: u64,
) -> Result<(Resolution, Vec<(PlayerId, Amount)>)> {
    let game_id = game.game_id;
    match action {
        TimeoutAction::AlreadyTerminal => Ok((Resolution::AlreadyTerminal, Vec::new())),

        TimeoutAction::NotDue { deadline } => {
            Err(EngineError::DeadlineNotReached { game_id, now, deadline })
        }

        TimeoutAction::RefundLoneCommitter => {
            let credits = vec![(game.player1, game.stake)];
            escrow.release(ledger, game_id, &credits)?;
            game.finish(GameState::Void, Outcome::Refunded);
            Ok((Resolution::Voided, nonzero(credits)))
        }

        TimeoutAction::RefundBoth => {
            let player2 = game.player2.ok_or(EngineError::NotRevealable(game_id))?;
            let credits = vec![(game.player1, game.stake), (player2, game.stake)];
            escrow.release(ledger, game_id, &credits)?;
            game.finish(GameState::Void, Outcome::Refunded);
            Ok((Resolution::Voided, nonzero(credits)))
        }

        TimeoutAction::Forfeit { winner } => {
            let player2 = game.player2.ok_or(EngineError::NotRevealable(game_id))?;
            let (winner, silent) = match winner {
                Seat::First => (game.player1, player2),
                Seat::Second => (player2, game.player1),
            };
            let pot = game.stake.checked_mul(2).ok_or(EngineError::AmountOverflow)?;
            let credits = vec![(winner, pot)];
            escrow.release(ledger, game_id, &credits)?;
            game.finish(GameState::Forfeited, Outcome::Forfeited { winner, silent });
            Ok((Resolution::Forfeited { winner }, nonzero(credits)))
        }

        TimeoutAction::Settle => {
            let credits = settle(game, escrow, ledger)?;
            Ok((Resolution::Settled, credits))
        }
    }
}

fn nonzero(credits: Vec<(PlayerId, Amount)>) -> Vec<(PlayerId, Amount)> {
    credits.into_iter().filter(|(_, amount)| *amount > 0).collect()
}
