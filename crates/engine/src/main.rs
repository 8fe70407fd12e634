//! KidQuest Engine - headless runner.
//!
//! Loads config, wires the backend, and drives one play session at a fixed tick
//! rate with the scripted autopilot, logging world events as they happen.

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kidquest_engine::autopilot::Autopilot;
use kidquest_engine::infrastructure::config::EngineConfig;
use kidquest_engine::simulation::{FixedTimestep, NpcData, PortalData, WorldEventHandler, WorldState};
use kidquest_engine::App;

/// Quests the autopilot plays before stopping.
const AUTOPILOT_QUESTS: u32 = 4;

/// Logs every world event.
struct EventLogger;

impl WorldEventHandler for EventLogger {
    fn on_portal_proximity(&mut self, portal: Option<&PortalData>) {
        match portal {
            Some(p) => tracing::info!(portal = %p.name, "Near portal"),
            None => tracing::info!("Left portal range"),
        }
    }

    fn on_portal_enter_requested(&mut self, portal: &PortalData) {
        tracing::info!(portal = %portal.name, "Enter {}?", portal.name);
    }

    fn on_portal_enter_cancelled(&mut self, portal: &PortalData) {
        tracing::info!(portal = %portal.name, "Portal prompt closed");
    }

    fn on_npc_interact(&mut self, npc: &NpcData, greeting: &str) {
        tracing::info!(npc = %npc.name, "{}", greeting);
    }

    fn on_state_changed(&mut self, from: WorldState, to: WorldState) {
        tracing::info!(%from, %to, "World state");
    }
}

/// Cancels the token on Ctrl+C.
fn setup_shutdown_signal(cancel_token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, stopping"),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
                return;
            }
        }
        cancel_token.cancel();
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kidquest_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting KidQuest Engine");

    let config = EngineConfig::from_env();
    let tick_hz = config.tick_hz;
    let demo_ticks = config.demo_ticks;
    let app = App::from_config(config)?;

    let (mut session, mut events) = app.new_session();
    session.start()?;

    let cancel_token = CancellationToken::new();
    setup_shutdown_signal(cancel_token.clone());

    let mut autopilot = Autopilot::new(AUTOPILOT_QUESTS);
    let mut logger = EventLogger;
    let mut timestep = FixedTimestep::from_hz(tick_hz);
    let mut interval = tokio::time::interval(timestep.dt());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_frame = Instant::now();
    let mut ticks: u64 = 0;

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = interval.tick() => {}
        }

        let now = Instant::now();
        let frame = now - last_frame;
        last_frame = now;

        autopilot.drive(&mut session);
        for _ in 0..timestep.accumulate(frame) {
            session.tick();
            ticks += 1;
        }
        events.dispatch(&mut logger);

        if autopilot.is_done() {
            tracing::info!(ticks, quests = autopilot.completed(), "Autopilot finished");
            break;
        }
        if ticks >= demo_ticks {
            tracing::info!(ticks, quests = autopilot.completed(), "Demo tick budget used up");
            break;
        }
    }

    if let Some(child) = session.child() {
        tracing::info!(
            child = %child.username,
            level = child.level,
            xp = child.total_xp,
            coins = child.coins,
            "Final profile"
        );
    }
    session.dispose();
    events.dispatch(&mut logger);

    Ok(())
}
