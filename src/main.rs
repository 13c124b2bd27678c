//! RPS Escrow Demo
//!
//! Plays one settled game and one forfeited game against a shared engine
//! and logs the resulting state.

use std::time::Duration;

use anyhow::{ensure, Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rps_escrow::{
    VERSION,
    engine::{commit, generate_secret, Engine, EngineConfig, EngineEvent, Move, UnitClock},
    service::SharedEngine,
    PlayerId,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let config = match std::env::var("RPS_CONFIG") {
        Ok(path) => EngineConfig::from_file(&path).with_context(|| format!("loading {}", path))?,
        Err(_) => EngineConfig::from_env().context("reading engine config from environment")?,
    };

    info!("RPS Escrow v{}", VERSION);
    info!("Timeout window: {} {:?}", config.timeout_window, config.time_unit);

    let window = config.timeout_window;
    let (engine, clock) = Engine::from_config(config);
    let engine = SharedEngine::new(engine);

    let mut events = engine.subscribe_events();
    let printer = tokio::spawn(async move {
        while let Ok(record) = events.recv().await {
            if let EngineEvent::GameResolved { game_id, outcome } = &record.event {
                info!("[seq {} @ {}] game {} resolved: {:?}", record.seq, record.tick, game_id, outcome);
            }
        }
    });

    let alice = PlayerId::from_name("alice");
    let bob = PlayerId::from_name("bob");
    engine.deposit(alice, 10).await?;
    engine.deposit(bob, 10).await?;

    demo_settled_game(&engine, alice, bob).await?;
    demo_forfeit_game(&engine, &clock, window, alice, bob).await?;

    info!("Final balances: alice={} bob={}", engine.balance_of(&alice).await, engine.balance_of(&bob).await);
    ensure!(engine.is_conserved().await, "conservation check failed");

    let state_hash = engine.transact(|e| Ok(e.state_hash())).await?;
    info!("State hash: {}", hex::encode(state_hash));

    drop(engine);
    printer.await?;
    Ok(())
}

/// Alice plays Rock, Bob plays Scissors, both reveal.
async fn demo_settled_game(engine: &SharedEngine, alice: PlayerId, bob: PlayerId) -> Result<()> {
    info!("=== Settled Game ===");
    let game_id = 1;
    let alice_key = generate_secret();
    let bob_key = generate_secret();

    engine.make_move(alice, game_id, 1, commit(Move::Rock, &alice_key)).await?;
    engine.make_move(bob, game_id, 1, commit(Move::Scissors, &bob_key)).await?;
    engine.reveal_move(alice, game_id, Move::Rock, &alice_key).await?;
    engine.reveal_move(bob, game_id, Move::Scissors, &bob_key).await?;

    let snapshot = engine.get_game_state(game_id).await?;
    info!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Bob never reveals; Alice claims the pot after the window.
async fn demo_forfeit_game(
    engine: &SharedEngine,
    clock: &UnitClock,
    window: u64,
    alice: PlayerId,
    bob: PlayerId,
) -> Result<()> {
    info!("=== Forfeit Game ===");
    let game_id = 2;
    let alice_key = generate_secret();

    engine.make_move(alice, game_id, 2, commit(Move::Paper, &alice_key)).await?;
    engine.make_move(bob, game_id, 2, commit(Move::Rock, &generate_secret())).await?;
    engine.reveal_move(alice, game_id, Move::Paper, &alice_key).await?;

    if let Err(e) = engine.claim_timeout(game_id).await {
        info!("Early claim rejected: {}", e);
    }

    match clock {
        UnitClock::Blocks(blocks) => {
            info!("Mining {} empty blocks", window + 1);
            blocks.mine(window + 1);
        }
        UnitClock::Seconds(_) => {
            info!("Waiting {}s for the reveal window to close", window + 1);
            tokio::time::sleep(Duration::from_secs(window + 1)).await;
        }
    }
    let resolution = engine.claim_timeout(game_id).await?;
    info!("Resolution: {:?}", resolution);

    let snapshot = engine.get_game_state(game_id).await?;
    info!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
