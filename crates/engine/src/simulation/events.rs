//! Events the hub world emits toward presentation and the session.
//!
//! The world never calls back into listeners while it is mid-tick; events are
//! queued on an unbounded channel and drained by the owner afterwards.

use serde::Serialize;
use tokio::sync::mpsc;

use kidquest_domain::QuestId;

use super::hub::{NpcData, PortalData};

/// Coarse world state, mirrored in `StateChanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorldState {
    Hub,
    QuestActive { quest_id: QuestId },
    QuestComplete,
}

impl WorldState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hub => "hub",
            Self::QuestActive { .. } => "quest_active",
            Self::QuestComplete => "quest_complete",
        }
    }
}

impl std::fmt::Display for WorldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorldEvent {
    /// The nearest proximate portal changed. `None` means no portal is near.
    PortalProximityChanged { portal: Option<PortalData> },
    /// The player asked to go through a portal; waiting for confirmation.
    PortalEnterRequested { portal: PortalData },
    /// A pending request was dropped (walked away, cancelled, or nothing to play).
    PortalEnterCancelled { portal: PortalData },
    NpcInteracted { npc: NpcData, greeting: String },
    StateChanged { from: WorldState, to: WorldState },
}

/// Hooks for consumers that prefer callbacks over matching on events.
pub trait WorldEventHandler {
    fn on_portal_proximity(&mut self, _portal: Option<&PortalData>) {}
    fn on_portal_enter_requested(&mut self, _portal: &PortalData) {}
    fn on_portal_enter_cancelled(&mut self, _portal: &PortalData) {}
    fn on_npc_interact(&mut self, _npc: &NpcData, _greeting: &str) {}
    fn on_state_changed(&mut self, _from: WorldState, _to: WorldState) {}
}

/// Sending half, held by the world.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<WorldEvent>,
}

impl EventSink {
    /// Emit an event. A dropped receiver is not an error for the world.
    pub fn emit(&self, event: WorldEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("world event dropped, no receiver");
        }
    }
}

/// Receiving half, held by whoever drives the world.
#[derive(Debug)]
pub struct WorldEvents {
    rx: mpsc::UnboundedReceiver<WorldEvent>,
}

impl WorldEvents {
    /// Everything emitted since the last drain, in order.
    pub fn drain(&mut self) -> Vec<WorldEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Drain and forward to a handler. Returns the drained events as well.
    pub fn dispatch(&mut self, handler: &mut dyn WorldEventHandler) -> Vec<WorldEvent> {
        let events = self.drain();
        for event in &events {
            match event {
                WorldEvent::PortalProximityChanged { portal } => {
                    handler.on_portal_proximity(portal.as_ref())
                }
                WorldEvent::PortalEnterRequested { portal } => {
                    handler.on_portal_enter_requested(portal)
                }
                WorldEvent::PortalEnterCancelled { portal } => {
                    handler.on_portal_enter_cancelled(portal)
                }
                WorldEvent::NpcInteracted { npc, greeting } => {
                    handler.on_npc_interact(npc, greeting)
                }
                WorldEvent::StateChanged { from, to } => handler.on_state_changed(*from, *to),
            }
        }
        events
    }
}

pub fn event_channel() -> (EventSink, WorldEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx }, WorldEvents { rx })
}
