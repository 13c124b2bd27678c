//! Per-Game Escrow
//!
//! Stakes move from the ledger into escrow on `make_move` and leave it only
//! through [`Escrow::release`], which must pay out exactly what is held.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::ids::{Amount, GameId, PlayerId};
use super::error::{EngineError, Result};
use super::ledger::Ledger;

/// Game → escrowed amount.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Escrow {
    held: BTreeMap<GameId, Amount>,
}

impl Escrow {
    /// Create an empty escrow.
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount held for `game_id`.
    pub fn held(&self, game_id: GameId) -> Amount {
        self.held.get(&game_id).copied().unwrap_or(0)
    }

    /// Sum held across all live games.
    pub fn total(&self) -> Amount {
        self.held.values().fold(0, |acc, v| acc.saturating_add(*v))
    }

    /// Debit `amount` from `player` and hold it for `game_id`.
    ///
    /// Either both sides change or neither does.
    pub fn lock(
        &mut self,
        ledger: &mut Ledger,
        game_id: GameId,
        player: PlayerId,
        amount: Amount,
    ) -> Result<()> {
        ledger.ensure_available(&player, amount)?;
        let new_held = self.held(game_id)
            .checked_add(amount)
            .ok_or(EngineError::AmountOverflow)?;

        ledger.debit(player, amount)?;
        self.held.insert(game_id, new_held);
        Ok(())
    }

    /// Pay out everything held for `game_id`.
    ///
    /// The payouts must sum to the held amount exactly; afterwards the game
    /// holds nothing.
    pub fn release(
        &mut self,
        ledger: &mut Ledger,
        game_id: GameId,
        payouts: &[(PlayerId, Amount)],
    ) -> Result<()> {
        let held = self.held(game_id);
        let paying = payouts.iter()
            .try_fold(0 as Amount, |acc, (_, amount)| acc.checked_add(*amount))
            .ok_or(EngineError::AmountOverflow)?;

        if paying != held {
            return Err(EngineError::EscrowImbalance { game_id, held, paying });
        }

        for (player, amount) in payouts {
            ledger.ensure_creditable(player, *amount)?;
        }
        for (player, amount) in payouts {
            ledger.credit(*player, *amount)?;
        }
        self.held.remove(&game_id);
        Ok(())
    }

    /// Hash escrow contents for the state digest.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u64(self.held.len() as u64);
        for (game_id, amount) in &self.held {
            hasher.update_u64(*game_id);
            hasher.update_u128(*amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funded(player: PlayerId, amount: Amount) -> Ledger {
        let mut ledger = Ledger::new();
        ledger.credit(player, amount).unwrap();
        ledger
    }

    #[test]
    fn test_lock_moves_value() {
        let alice = PlayerId::new([1; 16]);
        let mut ledger = funded(alice, 10);
        let mut escrow = Escrow::new();

        escrow.lock(&mut ledger, 7, alice, 4).unwrap();
        assert_eq!(ledger.balance_of(&alice), 6);
        assert_eq!(escrow.held(7), 4);
        assert_eq!(ledger.total() + escrow.total(), 10);
    }

    #[test]
    fn test_lock_insufficient_changes_nothing() {
        let alice = PlayerId::new([1; 16]);
        let mut ledger = funded(alice, 3);
        let mut escrow = Escrow::new();

        assert!(matches!(
            escrow.lock(&mut ledger, 7, alice, 4),
            Err(EngineError::InsufficientBalance { .. })
        ));
        assert_eq!(ledger.balance_of(&alice), 3);
        assert_eq!(escrow.held(7), 0);
    }

    #[test]
    fn test_release_exact() {
        let alice = PlayerId::new([1; 16]);
        let bob = PlayerId::new([2; 16]);
        let mut ledger = funded(alice, 5);
        ledger.credit(bob, 5).unwrap();
        let mut escrow = Escrow::new();

        escrow.lock(&mut ledger, 1, alice, 2).unwrap();
        escrow.lock(&mut ledger, 1, bob, 2).unwrap();
        escrow.release(&mut ledger, 1, &[(alice, 4), (bob, 0)]).unwrap();

        assert_eq!(escrow.held(1), 0);
        assert_eq!(ledger.balance_of(&alice), 7);
        assert_eq!(ledger.balance_of(&bob), 3);
    }

    #[test]
    fn test_release_imbalance_rejected() {
        let alice = PlayerId::new([1; 16]);
        let mut ledger = funded(alice, 5);
        let mut escrow = Escrow::new();

        escrow.lock(&mut ledger, 1, alice, 2).unwrap();
        let err = escrow.release(&mut ledger, 1, &[(alice, 3)]).unwrap_err();

        assert_eq!(err, EngineError::EscrowImbalance { game_id: 1, held: 2, paying: 3 });
        assert_eq!(escrow.held(1), 2);
        assert_eq!(ledger.balance_of(&alice), 3);
    }
}
