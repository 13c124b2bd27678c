//! Shared Engine Handle
//!
//! Puts the whole engine (ledger + escrow + game table) behind one lock.
//! Each call holds the write lock for exactly one engine operation, so no
//! caller can observe another's partial effects. Committed events are
//! broadcast to subscribers after each call.

use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::core::ids::{Amount, GameId, PlayerId};
use crate::engine::{
    Commitment, Engine, EngineError, EventRecord, GameSnapshot, Move, Resolution,
};

/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Cloneable handle to a single engine.
#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<RwLock<Engine>>,
    event_tx: broadcast::Sender<EventRecord>,
}

impl SharedEngine {
    /// Wrap an engine.
    pub fn new(engine: Engine) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(engine)),
            event_tx,
        }
    }

    /// Subscribe to committed events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<EventRecord> {
        self.event_tx.subscribe()
    }

    /// Run one operation under the write lock and publish its events.
    pub async fn transact<T, F>(&self, op: F) -> Result<T, EngineError>
    where
        F: FnOnce(&mut Engine) -> Result<T, EngineError>,
    {
        let mut engine = self.inner.write().await;
        let before = engine.events().len();
        let result = op(&mut engine);

        for record in &engine.events()[before..] {
            // No subscribers is fine.
            let _ = self.event_tx.send(record.clone());
        }
        result
    }

    /// See [`Engine::deposit`].
    pub async fn deposit(&self, player: PlayerId, amount: Amount) -> Result<(), EngineError> {
        self.transact(|e| e.deposit(player, amount)).await
    }

    /// See [`Engine::withdraw`].
    pub async fn withdraw(&self, player: PlayerId, amount: Amount) -> Result<(), EngineError> {
        self.transact(|e| e.withdraw(player, amount)).await
    }

    /// See [`Engine::make_move`].
    pub async fn make_move(
        &self,
        caller: PlayerId,
        game_id: GameId,
        stake: Amount,
        commitment: Commitment,
    ) -> Result<(), EngineError> {
        self.transact(|e| e.make_move(caller, game_id, stake, commitment)).await
    }

    /// See [`Engine::reveal_move`].
    pub async fn reveal_move(
        &self,
        caller: PlayerId,
        game_id: GameId,
        mv: Move,
        secret_key: &[u8],
    ) -> Result<(), EngineError> {
        self.transact(|e| e.reveal_move(caller, game_id, mv, secret_key)).await
    }

    /// See [`Engine::cancel_game`].
    pub async fn cancel_game(&self, caller: PlayerId, game_id: GameId) -> Result<(), EngineError> {
        self.transact(|e| e.cancel_game(caller, game_id)).await
    }

    /// See [`Engine::claim_timeout`].
    pub async fn claim_timeout(&self, game_id: GameId) -> Result<Resolution, EngineError> {
        self.transact(|e| e.claim_timeout(game_id)).await
    }

    /// See [`Engine::get_game_state`]. Takes the write lock because lapsed
    /// deadlines are enforced on read.
    pub async fn get_game_state(&self, game_id: GameId) -> Result<GameSnapshot, EngineError> {
        self.transact(|e| e.get_game_state(game_id)).await
    }

    /// See [`Engine::balance_of`].
    pub async fn balance_of(&self, player: &PlayerId) -> Amount {
        self.inner.read().await.balance_of(player)
    }

    /// See [`Engine::is_conserved`].
    pub async fn is_conserved(&self) -> bool {
        self.inner.read().await.is_conserved()
    }
}
