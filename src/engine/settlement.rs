//! Settlement
//!
//! Outcome rule and payout arithmetic. [`decide`] and [`payouts`] are pure;
//! [`settle`] applies them to escrow and the game record in one step.

use serde::{Serialize, Deserialize};

use crate::core::ids::{Amount, PlayerId};
use super::commitment::Move;
use super::error::{EngineError, Result};
use super::escrow::Escrow;
use super::game::{Game, GameState, Outcome};
use super::ledger::Ledger;

/// Result of one round, by seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundResult {
    /// Player 1's move beats player 2's.
    FirstWins,
    /// Player 2's move beats player 1's.
    SecondWins,
    /// Identical moves.
    Draw,
}

/// Rock beats Scissors, Scissors beats Paper, Paper beats Rock.
pub fn decide(m1: Move, m2: Move) -> RoundResult {
    if m1 == m2 {
        RoundResult::Draw
    } else if m1.beats() == Some(m2) {
        RoundResult::FirstWins
    } else {
        RoundResult::SecondWins
    }
}

/// Credits owed to (player 1, player 2) for a round at per-player `stake`.
pub fn payouts(result: RoundResult, stake: Amount) -> Result<(Amount, Amount)> {
    let pot = stake.checked_mul(2).ok_or(EngineError::AmountOverflow)?;
    Ok(match result {
        RoundResult::FirstWins => (pot, 0),
        RoundResult::SecondWins => (0, pot),
        RoundResult::Draw => (stake, stake),
    })
}

/// Settle a game whose moves are both revealed.
///
/// Releases the escrow to the players and marks the game `Settled` in the
/// same call. Returns the credits applied, for notification.
pub fn settle(
    game: &mut Game,
    escrow: &mut Escrow,
    ledger: &mut Ledger,
) -> Result<Vec<(PlayerId, Amount)>> {
    let (m1, m2) = game.both_moves().ok_or(EngineError::NotRevealable(game.game_id))?;
    let player2 = game.player2.ok_or(EngineError::NotRevealable(game.game_id))?;
    let player1 = game.player1;

    let result = decide(m1, m2);
    let (pay1, pay2) = payouts(result, game.stake)?;
    let credits = vec![(player1, pay1), (player2, pay2)];

    escrow.release(ledger, game.game_id, &credits)?;

    let outcome = match result {
        RoundResult::FirstWins => Outcome::Won { winner: player1, loser: player2 },
        RoundResult::SecondWins => Outcome::Won { winner: player2, loser: player1 },
        RoundResult::Draw => Outcome::Draw,
    };
    game.finish(GameState::Settled, outcome);

    Ok(credits.into_iter().filter(|(_, amount)| *amount > 0).collect())
}
