//! Balance Ledger
//!
//! Free (unstaked) balance per identity. Entries are created on first
//! credit and never removed, only drained to zero.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::ids::{Amount, PlayerId};
use super::error::{EngineError, Result};

/// Identity → free balance.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Ledger {
    balances: BTreeMap<PlayerId, Amount>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Free balance of `player`, zero if never seen.
    pub fn balance_of(&self, player: &PlayerId) -> Amount {
        self.balances.get(player).copied().unwrap_or(0)
    }

    /// Fail unless `player` can be debited `amount`.
    pub fn ensure_available(&self, player: &PlayerId, amount: Amount) -> Result<()> {
        let available = self.balance_of(player);
        if available < amount {
            return Err(EngineError::InsufficientBalance {
                player: *player,
                available,
                required: amount,
            });
        }
        Ok(())
    }

    /// Fail unless crediting `amount` to `player` fits.
    pub fn ensure_creditable(&self, player: &PlayerId, amount: Amount) -> Result<()> {
        self.balance_of(player)
            .checked_add(amount)
            .map(|_| ())
            .ok_or(EngineError::AmountOverflow)
    }

    /// Add `amount` to `player`.
    pub fn credit(&mut self, player: PlayerId, amount: Amount) -> Result<()> {
        let entry = self.balances.entry(player).or_insert(0);
        *entry = entry.checked_add(amount).ok_or(EngineError::AmountOverflow)?;
        Ok(())
    }

    /// Remove `amount` from `player`.
    pub fn debit(&mut self, player: PlayerId, amount: Amount) -> Result<()> {
        self.ensure_available(&player, amount)?;
        if let Some(entry) = self.balances.get_mut(&player) {
            *entry -= amount;
        }
        Ok(())
    }

    /// Sum of all free balances.
    pub fn total(&self) -> Amount {
        self.balances.values().fold(0, |acc, v| acc.saturating_add(*v))
    }

    /// Number of entries ever created.
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// True if nobody was ever credited.
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Hash ledger contents for the state digest.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u64(self.balances.len() as u64);
        for (id, amount) in &self.balances {
            hasher.update_uuid(&id.0);
            hasher.update_u128(*amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_is_zero() {
        let ledger = Ledger::new();
        assert_eq!(ledger.balance_of(&PlayerId::new([1; 16])), 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_credit_debit() {
        let mut ledger = Ledger::new();
        let alice = PlayerId::new([1; 16]);

        ledger.credit(alice, 10).unwrap();
        ledger.debit(alice, 4).unwrap();
        assert_eq!(ledger.balance_of(&alice), 6);
        assert_eq!(ledger.total(), 6);
    }

    #[test]
    fn test_overdraft_rejected_without_change() {
        let mut ledger = Ledger::new();
        let alice = PlayerId::new([1; 16]);
        ledger.credit(alice, 3).unwrap();

        let err = ledger.debit(alice, 4).unwrap_err();
        assert_eq!(err, EngineError::InsufficientBalance { player: alice, available: 3, required: 4 });
        assert_eq!(ledger.balance_of(&alice), 3);
    }

    #[test]
    fn test_entries_persist_at_zero() {
        let mut ledger = Ledger::new();
        let alice = PlayerId::new([1; 16]);
        ledger.credit(alice, 5).unwrap();
        ledger.debit(alice, 5).unwrap();

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.balance_of(&alice), 0);
    }

    #[test]
    fn test_overflow() {
        let mut ledger = Ledger::new();
        let alice = PlayerId::new([1; 16]);
        ledger.credit(alice, Amount::MAX).unwrap();

        assert_eq!(ledger.credit(alice, 1), Err(EngineError::AmountOverflow));
        assert_eq!(ledger.ensure_creditable(&alice, 1), Err(EngineError::AmountOverflow));
        assert_eq!(ledger.balance_of(&alice), Amount::MAX);
    }
}
