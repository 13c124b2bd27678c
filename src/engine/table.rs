//! Game Table and Engine Aggregate
//!
//! [`Engine`] owns the ledger, escrow, game table and audit log. Every
//! state-changing operation takes `&mut self` and is all-or-nothing: all
//! checks run before the first mutation, so a returned error means nothing
//! changed.
//!
//! ## Payout ordering
//!
//! Credits are applied to the ledger together with the state transition.
//! Only after that transition is committed is the optional [`PayoutHook`]
//! told about them. A hook may call straight back into the engine; it will
//! see the post-transition state, and any payouts its own calls produce are
//! queued behind the current ones rather than delivered recursively.

use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info, warn};

use crate::core::clock::Clock;
use crate::core::hash::{StateHash, StateHasher};
use crate::core::ids::{Amount, GameId, PlayerId};
use super::commitment::{verify, Commitment, Move};
use super::config::{EngineConfig, UnitClock};
use super::error::{EngineError, Result};
use super::escrow::Escrow;
use super::events::{EngineEvent, EventRecord, Payout, PayoutReason};
use super::game::{Game, GameSnapshot, GameState, Outcome};
use super::ledger::Ledger;
use super::settlement::settle;
use super::timeout::{self, Resolution, TimeoutAction};

/// Receiver for value leaving escrow or the ledger.
///
/// Called once per [`Payout`], after the transition that produced it has been
/// committed. The engine is passed back in so that the hook can act on it.
pub trait PayoutHook: Send + Sync {
    /// Handle one payout.
    fn on_payout(&mut self, engine: &mut Engine, payout: &Payout);
}

/// The wagering engine.
pub struct Engine {
    config: EngineConfig,
    clock: Box<dyn Clock>,
    ledger: Ledger,
    escrow: Escrow,
    games: BTreeMap<GameId, Game>,
    total_deposited: Amount,
    total_withdrawn: Amount,
    events: Vec<EventRecord>,
    hook: Option<Box<dyn PayoutHook>>,
    pending: VecDeque<Payout>,
    dispatching: bool,
}

impl Engine {
    /// Create an engine with an explicit clock.
    pub fn new(config: EngineConfig, clock: impl Clock + 'static) -> Self {
        Self {
            config,
            clock: Box::new(clock),
            ledger: Ledger::new(),
            escrow: Escrow::new(),
            games: BTreeMap::new(),
            total_deposited: 0,
            total_withdrawn: 0,
            events: Vec::new(),
            hook: None,
            pending: VecDeque::new(),
            dispatching: false,
        }
    }

    /// Create an engine whose clock matches `config.time_unit`.
    ///
    /// Returns a handle to the same clock, which in `Blocks` mode can be used
    /// to mine empty blocks.
    pub fn from_config(config: EngineConfig) -> (Self, UnitClock) {
        let clock = config.clock();
        (Self::new(config, clock.clone()), clock)
    }

    /// Install the payout hook, replacing any previous one.
    pub fn set_payout_hook(&mut self, hook: impl PayoutHook + 'static) {
        self.hook = Some(Box::new(hook));
    }

    /// Remove the payout hook.
    pub fn clear_payout_hook(&mut self) {
        self.hook = None;
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current clock tick.
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    // =========================================================================
    // Funding
    // =========================================================================

    /// Credit externally received value to `player`.
    pub fn deposit(&mut self, player: PlayerId, amount: Amount) -> Result<()> {
        let new_total = self.total_deposited
            .checked_add(amount)
            .ok_or(EngineError::AmountOverflow)?;
        self.ledger.ensure_creditable(&player, amount)?;

        self.ledger.credit(player, amount)?;
        self.total_deposited = new_total;

        debug!(player = %player, amount, "deposit");
        self.record(EngineEvent::Deposited { player, amount });
        self.commit(Vec::new());
        Ok(())
    }

    /// Send `amount` of `player`'s free balance out of the engine.
    ///
    /// The ledger is debited before the hook hears about the transfer.
    pub fn withdraw(&mut self, player: PlayerId, amount: Amount) -> Result<()> {
        self.ledger.ensure_available(&player, amount)?;
        let new_total = self.total_withdrawn
            .checked_add(amount)
            .ok_or(EngineError::AmountOverflow)?;

        self.ledger.debit(player, amount)?;
        self.total_withdrawn = new_total;

        info!(player = %player, amount, "withdrawal");
        self.record(EngineEvent::Withdrawn { player, amount });
        self.commit(to_payouts(vec![(player, amount)], PayoutReason::Withdrawal));
        Ok(())
    }

    /// Free balance of `player`. Never fails.
    pub fn balance_of(&self, player: &PlayerId) -> Amount {
        self.ledger.balance_of(player)
    }

    // =========================================================================
    // Commit phase
    // =========================================================================

    /// Stake `stake` on `game_id` with a commitment to a hidden move.
    ///
    /// The first caller for a fresh id creates the game; the second distinct
    /// caller with a matching stake joins it and opens the reveal window.
    pub fn make_move(
        &mut self,
        caller: PlayerId,
        game_id: GameId,
        stake: Amount,
        commitment: Commitment,
    ) -> Result<()> {
        let now = self.clock.now();
        let window = self.config.timeout_window;

        let event = match self.games.get_mut(&game_id) {
            None => {
                self.escrow.lock(&mut self.ledger, game_id, caller, stake)?;
                let commit_deadline = now.saturating_add(window);
                self.games.insert(game_id, Game::new(game_id, caller, stake, commitment, commit_deadline));

                info!(game_id, player = %caller, stake, commit_deadline, "game opened");
                EngineEvent::GameOpened { game_id, player: caller, stake, commit_deadline }
            }
            Some(game) => {
                if game.is_terminal() {
                    return Err(EngineError::GameClosed(game_id));
                }
                if game.player2.is_some() {
                    return Err(EngineError::GameFull(game_id));
                }
                if game.player1 == caller {
                    return Err(EngineError::DuplicateJoin { game_id, player: caller });
                }
                if now > game.commit_deadline {
                    return Err(EngineError::CommitWindowExpired {
                        game_id,
                        deadline: game.commit_deadline,
                    });
                }
                if stake != game.stake {
                    return Err(EngineError::StakeMismatch {
                        game_id,
                        expected: game.stake,
                        got: stake,
                    });
                }

                self.escrow.lock(&mut self.ledger, game_id, caller, stake)?;
                let reveal_deadline = now.saturating_add(window);
                game.seat_second(caller, commitment, reveal_deadline);

                info!(game_id, player = %caller, reveal_deadline, "player joined");
                EngineEvent::PlayerJoined { game_id, player: caller, reveal_deadline }
            }
        };

        self.record(event);
        self.commit(Vec::new());
        Ok(())
    }

    /// Withdraw from a game nobody has joined yet and take the stake back.
    pub fn cancel_game(&mut self, caller: PlayerId, game_id: GameId) -> Result<()> {
        let game = self.games.get_mut(&game_id).ok_or(EngineError::UnknownGame(game_id))?;
        if game.seat_of(&caller).is_none() {
            return Err(EngineError::UnknownPlayer { game_id, player: caller });
        }
        if game.state != GameState::AwaitingPlayers {
            return Err(EngineError::NotCancellable(game_id));
        }

        let credits = vec![(game.player1, game.stake)];
        self.escrow.release(&mut self.ledger, game_id, &credits)?;
        game.finish(GameState::Void, Outcome::Refunded);

        info!(game_id, player = %caller, "game cancelled");
        self.record(EngineEvent::GameCancelled { game_id, player: caller });
        self.record(EngineEvent::GameResolved { game_id, outcome: Outcome::Refunded });
        self.commit(to_payouts(credits, PayoutReason::Refund(game_id)));
        Ok(())
    }

    // =========================================================================
    // Reveal phase
    // =========================================================================

    /// Open the caller's commitment. Settles the game once both are open.
    ///
    /// A mismatching reveal changes nothing and may be retried before the
    /// deadline.
    pub fn reveal_move(
        &mut self,
        caller: PlayerId,
        game_id: GameId,
        mv: Move,
        secret_key: &[u8],
    ) -> Result<()> {
        let now = self.clock.now();
        let game = self.games.get_mut(&game_id).ok_or(EngineError::UnknownGame(game_id))?;

        if game.state != GameState::AwaitingReveals {
            return Err(EngineError::NotRevealable(game_id));
        }
        let deadline = game.reveal_deadline.unwrap_or(game.commit_deadline);
        if now > deadline {
            return Err(EngineError::RevealWindowExpired { game_id, deadline });
        }
        let seat = game.seat_of(&caller)
            .ok_or(EngineError::UnknownPlayer { game_id, player: caller })?;
        if game.revealed(seat).is_some() {
            return Err(EngineError::AlreadyRevealed { game_id, player: caller });
        }
        let commitment = game.commitment(seat).ok_or(EngineError::NotRevealable(game_id))?;
        if !verify(commitment, mv, secret_key) {
            warn!(game_id, player = %caller, "reveal does not open commitment");
            return Err(EngineError::CommitmentMismatch(game_id));
        }

        // Work on a copy so a settlement failure leaves the reveal unrecorded.
        let mut next = game.clone();
        next.record_reveal(seat, mv);
        let credits = if next.both_moves().is_some() {
            settle(&mut next, &mut self.escrow, &mut self.ledger)?
        } else {
            Vec::new()
        };
        let outcome = next.outcome.clone();
        *game = next;

        debug!(game_id, player = %caller, ?mv, "move revealed");
        self.record(EngineEvent::MoveRevealed { game_id, player: caller, mv });
        if let Some(outcome) = outcome {
            info!(game_id, ?outcome, "game settled");
            self.record(EngineEvent::GameResolved { game_id, outcome });
        }
        self.commit(to_payouts(credits, PayoutReason::Settlement(game_id)));
        Ok(())
    }

    // =========================================================================
    // Timeouts
    // =========================================================================

    /// Enforce a lapsed deadline. Callable by anyone.
    ///
    /// Succeeds without effect on a terminal game.
    pub fn claim_timeout(&mut self, game_id: GameId) -> Result<Resolution> {
        let now = self.clock.now();
        let game = self.games.get_mut(&game_id).ok_or(EngineError::UnknownGame(game_id))?;

        let action = timeout::assess(game, now);
        if action == TimeoutAction::AlreadyTerminal {
            debug!(game_id, "timeout claim on terminal game");
            return Ok(Resolution::AlreadyTerminal);
        }

        let (resolution, credits) = timeout::apply(game, &mut self.escrow, &mut self.ledger, action, now)?;
        let outcome = game.outcome.clone();

        let reason = match resolution {
            Resolution::Forfeited { .. } => PayoutReason::Forfeit(game_id),
            Resolution::Settled => PayoutReason::Settlement(game_id),
            Resolution::Voided | Resolution::AlreadyTerminal => PayoutReason::Refund(game_id),
        };

        info!(game_id, ?resolution, now, "timeout enforced");
        if let Some(outcome) = outcome {
            self.record(EngineEvent::GameResolved { game_id, outcome });
        }
        self.commit(to_payouts(credits, reason));
        Ok(resolution)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Snapshot of `game_id`, enforcing any lapsed deadline first.
    pub fn get_game_state(&mut self, game_id: GameId) -> Result<GameSnapshot> {
        let now = self.clock.now();
        let game = self.games.get(&game_id).ok_or(EngineError::UnknownGame(game_id))?;

        match timeout::assess(game, now) {
            TimeoutAction::AlreadyTerminal | TimeoutAction::NotDue { .. } => {}
            _ => {
                self.claim_timeout(game_id)?;
            }
        }
        self.snapshot(game_id)
    }

    /// Snapshot of `game_id` exactly as stored.
    pub fn snapshot(&self, game_id: GameId) -> Result<GameSnapshot> {
        let game = self.games.get(&game_id).ok_or(EngineError::UnknownGame(game_id))?;
        Ok(game.snapshot(self.escrow.held(game_id)))
    }

    /// Smallest id above every id in use.
    pub fn next_free_game_id(&self) -> GameId {
        match self.games.keys().next_back() {
            Some(&last) if last < GameId::MAX => last + 1,
            Some(_) => (1..).find(|id| !self.games.contains_key(id)).unwrap_or(0),
            None => 1,
        }
    }

    /// Number of games ever created.
    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    /// Committed transitions, oldest first.
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Total ever deposited.
    pub fn total_deposited(&self) -> Amount {
        self.total_deposited
    }

    /// Total ever withdrawn.
    pub fn total_withdrawn(&self) -> Amount {
        self.total_withdrawn
    }

    /// Sum of all free balances.
    pub fn total_balances(&self) -> Amount {
        self.ledger.total()
    }

    /// Sum held in escrow across live games.
    pub fn total_escrowed(&self) -> Amount {
        self.escrow.total()
    }

    /// Check the conservation law and per-game escrow accounting.
    ///
    /// `balances + escrow == deposited - withdrawn`, and every game holds
    /// exactly its stakes until it is terminal.
    pub fn is_conserved(&self) -> bool {
        let inside = self.ledger.total().checked_add(self.escrow.total());
        let net = self.total_deposited.checked_sub(self.total_withdrawn);
        let totals_match = matches!((inside, net), (Some(a), Some(b)) if a == b);

        totals_match && self.games.values().all(|g| g.expected_escrow() == self.escrow.held(g.game_id))
    }

    /// Digest of the whole engine state.
    pub fn state_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_engine_state();
        hasher.update_u128(self.total_deposited);
        hasher.update_u128(self.total_withdrawn);
        self.ledger.hash_into(&mut hasher);
        self.escrow.hash_into(&mut hasher);
        hasher.update_u64(self.games.len() as u64);
        for game in self.games.values() {
            game.hash_into(&mut hasher);
        }
        hasher.finalize()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn record(&mut self, event: EngineEvent) {
        let seq = self.events.len() as u64;
        self.events.push(EventRecord { seq, tick: self.clock.now(), event });
    }

    /// Close a transaction: advance the clock and deliver its payouts.
    fn commit(&mut self, payouts: Vec<Payout>) {
        debug_assert!(self.is_conserved(), "conservation violated");
        self.clock.on_commit();
        self.pending.extend(payouts);
        self.dispatch();
    }

    fn dispatch(&mut self) {
        if self.dispatching {
            return;
        }
        let Some(mut hook) = self.hook.take() else {
            self.pending.clear();
            return;
        };

        self.dispatching = true;
        while let Some(payout) = self.pending.pop_front() {
            hook.on_payout(self, &payout);
        }
        self.dispatching = false;

        if self.hook.is_none() {
            self.hook = Some(hook);
        }
    }
}

/// Zero amounts produce no notice.
fn to_payouts(credits: Vec<(PlayerId, Amount)>, reason: PayoutReason) -> Vec<Payout> {
    credits.into_iter()
        .filter(|(_, amount)| *amount > 0)
        .map(|(player, amount)| Payout { player, amount, reason })
        .collect()
}
