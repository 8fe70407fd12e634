//! The hub world: avatar, portals, NPCs and the three-state world lifecycle.

use serde::Serialize;

use kidquest_domain::{first_available_for_world, ChildProfile, DomainError, QuestId, QuestWithProgress};

use super::events::{EventSink, WorldEvent, WorldState};
use super::hub::{hub_npcs, hub_portals, NpcData, PortalData};
use super::input::InputFrame;
use super::kinematics::{AvatarKinematics, AvatarPose, CameraRig, KinematicsConfig};
use super::proximity::ProximityDetector;

/// What the owner has to act on after a tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// The player confirmed the pending portal this tick.
    pub confirmed: Option<PortalData>,
    /// Whether the simulation actually advanced.
    pub simulated: bool,
}

/// Read-only view for presentation and logging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub state: WorldState,
    pub tick: u64,
    pub pose: AvatarPose,
    pub near_portal: Option<String>,
    pub dwell_ticks: u32,
    pub pending_portal: Option<String>,
}

pub struct WorldController {
    state: WorldState,
    avatar: AvatarKinematics,
    camera: CameraRig,
    proximity: ProximityDetector,
    npcs: Vec<NpcData>,
    pending: Option<PortalData>,
    sink: EventSink,
    tick: u64,
    disposed: bool,
}

impl WorldController {
    /// A world with the standard hub layout.
    pub fn new(sink: EventSink) -> Self {
        Self::with_layout(sink, KinematicsConfig::default(), hub_portals(), hub_npcs())
    }

    pub fn with_layout(
        sink: EventSink,
        kinematics: KinematicsConfig,
        portals: Vec<PortalData>,
        npcs: Vec<NpcData>,
    ) -> Self {
        Self {
            state: WorldState::Hub,
            avatar: AvatarKinematics::new(kinematics),
            camera: CameraRig::default(),
            proximity: ProximityDetector::new(portals),
            npcs,
            pending: None,
            sink,
            tick: 0,
            disposed: false,
        }
    }

    pub fn state(&self) -> WorldState {
        self.state
    }

    pub fn pose(&self) -> AvatarPose {
        self.avatar.pose()
    }

    pub fn portals(&self) -> &[PortalData] {
        self.proximity.portals()
    }

    pub fn npcs(&self) -> &[NpcData] {
        &self.npcs
    }

    pub fn near_portal(&self) -> Option<&PortalData> {
        self.proximity.current_portal()
    }

    pub fn pending_portal(&self) -> Option<&PortalData> {
        self.pending.as_ref()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Advance one fixed tick. Outside the hub the frame is discarded.
    pub fn tick(&mut self, frame: &InputFrame, child: &ChildProfile) -> TickReport {
        let mut report = TickReport::default();
        if self.disposed || self.state != WorldState::Hub {
            return report;
        }
        self.tick += 1;
        report.simulated = true;

        if let Some(yaw) = frame.camera_yaw {
            self.camera.yaw = yaw;
        }
        if frame.jump {
            self.avatar.jump();
        }
        self.avatar.step(frame.intent, &self.camera);

        let update = self.proximity.update(self.avatar.position());
        if let Some(released) = update.released {
            let pending_released = self
                .pending
                .as_ref()
                .is_some_and(|p| self.proximity.portals().get(released) == Some(p));
            if pending_released {
                self.cancel_pending();
            }
        }
        if let Some(changed) = update.changed {
            let portal = changed.and_then(|i| self.proximity.portals().get(i).cloned());
            tracing::debug!(portal = ?portal.as_ref().map(|p| &p.name), "Portal proximity changed");
            self.sink.emit(WorldEvent::PortalProximityChanged { portal });
        }

        let entered = if let Some(index) = frame.clicked_portal {
            self.proximity.enter_clicked(index)
        } else if frame.interact {
            self.proximity.enter()
        } else {
            None
        };
        if let Some(portal) = entered {
            tracing::info!(portal = %portal.name, world = %portal.world_key, "Portal entry requested");
            // A new request replaces the prompt; close the old one first
            self.cancel_pending();
            self.pending = Some(portal.clone());
            self.sink.emit(WorldEvent::PortalEnterRequested { portal });
        }

        if let Some(npc) = frame.clicked_npc.and_then(|i| self.npcs.get(i)) {
            let greeting = npc.greeting(child);
            self.sink.emit(WorldEvent::NpcInteracted {
                npc: npc.clone(),
                greeting,
            });
        }

        if frame.cancel {
            self.cancel_pending();
        } else if frame.confirm {
            report.confirmed = self.pending.take();
        }

        report
    }

    /// Take the pending portal for confirmation outside the input stream.
    pub fn take_pending_portal(&mut self) -> Option<PortalData> {
        self.pending.take()
    }

    /// Drop the pending portal prompt, if any.
    pub fn cancel_pending(&mut self) {
        if let Some(portal) = self.pending.take() {
            self.sink.emit(WorldEvent::PortalEnterCancelled { portal });
        }
    }

    /// Pick the quest a confirmed portal leads to.
    ///
    /// No eligible quest is not an error: the request is dropped and the world
    /// stays in the hub.
    pub fn resolve_portal_entry(
        &mut self,
        portal: &PortalData,
        quests: &[QuestWithProgress],
    ) -> Option<QuestId> {
        match first_available_for_world(quests, portal.world_key) {
            Some(listed) => Some(listed.quest.id),
            None => {
                tracing::info!(world = %portal.world_key, "No available quest behind portal");
                self.sink.emit(WorldEvent::PortalEnterCancelled {
                    portal: portal.clone(),
                });
                None
            }
        }
    }

    pub fn begin_quest(&mut self, quest_id: QuestId) -> Result<(), DomainError> {
        self.expect_state(WorldState::Hub, "begin_quest")?;
        self.pending = None;
        self.transition(WorldState::QuestActive { quest_id });
        Ok(())
    }

    pub fn complete_quest(&mut self) -> Result<(), DomainError> {
        if self.disposed || !matches!(self.state, WorldState::QuestActive { .. }) {
            return Err(self.invalid("complete_quest"));
        }
        self.transition(WorldState::QuestComplete);
        Ok(())
    }

    pub fn acknowledge_reward(&mut self) -> Result<(), DomainError> {
        self.expect_state(WorldState::QuestComplete, "acknowledge_reward")?;
        self.transition(WorldState::Hub);
        Ok(())
    }

    /// Leave an active quest early. Progress stays wherever it was persisted.
    pub fn exit_quest(&mut self) -> Result<(), DomainError> {
        if self.disposed || !matches!(self.state, WorldState::QuestActive { .. }) {
            return Err(self.invalid("exit_quest"));
        }
        self.transition(WorldState::Hub);
        Ok(())
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            state: self.state,
            tick: self.tick,
            pose: self.avatar.pose(),
            near_portal: self.proximity.current_portal().map(|p| p.name.clone()),
            dwell_ticks: self.proximity.dwell_ticks(),
            pending_portal: self.pending.as_ref().map(|p| p.name.clone()),
        }
    }

    /// Stop simulating. Later ticks and transitions are no-ops or errors.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.pending = None;
        self.proximity.reset();
    }

    fn expect_state(&self, expected: WorldState, action: &str) -> Result<(), DomainError> {
        if !self.disposed && self.state == expected {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &str) -> DomainError {
        if self.disposed {
            return DomainError::invalid_state_transition(format!("{} on a disposed world", action));
        }
        DomainError::invalid_state_transition(format!("{} not allowed in {}", action, self.state))
    }

    fn transition(&mut self, to: WorldState) {
        let from = self.state;
        self.state = to;
        tracing::info!(from = %from, to = %to, "World state changed");
        self.sink.emit(WorldEvent::StateChanged { from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::events::{event_channel, WorldEvents};
    use crate::simulation::input::{InputEvent, InputSampler, MoveKey};
    use glam::Vec3;
    use kidquest_domain::{Quest, WorldKey};

    fn world() -> (WorldController, WorldEvents) {
        let (sink, events) = event_channel();
        (WorldController::new(sink), events)
    }

    fn child() -> ChildProfile {
        ChildProfile::new("Explorer")
    }

    /// Hold "left" until the Math Jungle portal is proximate.
    fn walk_to_math_jungle(world: &mut WorldController, input: &mut InputSampler) {
        input.push(InputEvent::KeyDown(MoveKey::Left));
        for _ in 0..200 {
            world.tick(&input.sample(), &child());
            if world.near_portal().is_some() {
                break;
            }
        }
        input.push(InputEvent::KeyUp(MoveKey::Left));
        world.tick(&input.sample(), &child());
    }

    fn listed(quest: Quest) -> QuestWithProgress {
        QuestWithProgress {
            quest,
            progress: None,
            is_completed: false,
            is_locked: false,
        }
    }

    #[test]
    fn walking_left_reaches_math_jungle_once() {
        let (mut world, mut events) = world();
        let mut input = InputSampler::new();
        walk_to_math_jungle(&mut world, &mut input);

        let proximity: Vec<_> = events
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                WorldEvent::PortalProximityChanged { portal } => Some(portal.map(|p| p.world_key)),
                _ => None,
            })
            .collect();
        assert_eq!(proximity, vec![Some(WorldKey::MathJungle)]);
    }

    #[test]
    fn interact_then_confirm_hands_over_the_portal() {
        let (mut world, mut events) = world();
        let mut input = InputSampler::new();
        walk_to_math_jungle(&mut world, &mut input);
        events.drain();

        input.push(InputEvent::Interact);
        world.tick(&input.sample(), &child());
        assert!(matches!(
            events.drain().as_slice(),
            [WorldEvent::PortalEnterRequested { .. }]
        ));
        assert_eq!(world.near_portal(), None);

        input.push(InputEvent::Confirm);
        let report = world.tick(&input.sample(), &child());
        assert_eq!(
            report.confirmed.map(|p| p.world_key),
            Some(WorldKey::MathJungle)
        );
    }

    #[test]
    fn walking_away_cancels_the_prompt() {
        let (mut world, mut events) = world();
        let mut input = InputSampler::new();
        walk_to_math_jungle(&mut world, &mut input);
        input.push(InputEvent::Interact);
        world.tick(&input.sample(), &child());
        events.drain();

        input.push(InputEvent::KeyDown(MoveKey::Right));
        for _ in 0..60 {
            world.tick(&input.sample(), &child());
        }
        assert!(world.pending_portal().is_none());
        assert!(events
            .drain()
            .iter()
            .any(|e| matches!(e, WorldEvent::PortalEnterCancelled { .. })));
    }

    #[test]
    fn second_request_closes_the_first_prompt() {
        let (sink, mut events) = event_channel();
        let portals = vec![
            PortalData::new("West", WorldKey::MathJungle, Vec3::new(-3.0, 0.0, 0.0), Vec3::ONE),
            PortalData::new("East", WorldKey::CodeCity, Vec3::new(3.0, 0.0, 0.0), Vec3::ONE),
        ];
        let mut world =
            WorldController::with_layout(sink, KinematicsConfig::default(), portals, vec![]);
        let mut input = InputSampler::new();

        // Spawn sits inside both radii; West wins the tie
        world.tick(&input.sample(), &child());
        input.push(InputEvent::Interact);
        world.tick(&input.sample(), &child());
        assert_eq!(world.pending_portal().map(|p| p.name.as_str()), Some("West"));

        // West is latched, so East becomes nearest
        world.tick(&input.sample(), &child());
        events.drain();
        input.push(InputEvent::Interact);
        world.tick(&input.sample(), &child());

        let names: Vec<_> = events
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                WorldEvent::PortalEnterCancelled { portal } => {
                    Some(format!("cancel {}", portal.name))
                }
                WorldEvent::PortalEnterRequested { portal } => {
                    Some(format!("request {}", portal.name))
                }
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["cancel West", "request East"]);
        assert_eq!(world.pending_portal().map(|p| p.name.as_str()), Some("East"));
    }

    #[test]
    fn interact_away_from_portals_does_nothing() {
        let (mut world, mut events) = world();
        let mut input = InputSampler::new();
        input.push(InputEvent::Interact);
        input.push(InputEvent::ClickPortal(0));
        world.tick(&input.sample(), &child());
        assert!(events.drain().is_empty());
        assert!(world.pending_portal().is_none());
    }

    #[test]
    fn npc_click_emits_greeting() {
        let (mut world, mut events) = world();
        let mut input = InputSampler::new();
        input.push(InputEvent::ClickNpc(0));
        world.tick(&input.sample(), &child());
        match events.drain().as_slice() {
            [WorldEvent::NpcInteracted { npc, greeting }] => {
                assert_eq!(npc.name, "Guide");
                assert!(greeting.contains("Explorer"));
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }

    #[test]
    fn portal_without_available_quest_is_dropped() {
        let (mut world, _events) = world();
        let portal = world.portals()[2].clone();
        let math_only = vec![listed(Quest::new("Counting", WorldKey::MathJungle))];
        assert_eq!(world.resolve_portal_entry(&portal, &math_only), None);
        assert_eq!(world.state(), WorldState::Hub);
    }

    #[test]
    fn lifecycle_transitions() {
        let (mut world, mut events) = world();
        let quest_id = QuestId::new();

        world.begin_quest(quest_id).expect("hub -> active");
        assert!(world.acknowledge_reward().is_err());
        world.complete_quest().expect("active -> complete");
        assert!(world.exit_quest().is_err());
        world.acknowledge_reward().expect("complete -> hub");
        world.begin_quest(quest_id).expect("hub -> active");
        world.exit_quest().expect("active -> hub");

        let states: Vec<_> = events
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                WorldEvent::StateChanged { to, .. } => Some(to.name()),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec!["quest_active", "quest_complete", "hub", "quest_active", "hub"]
        );
    }

    #[test]
    fn simulation_pauses_outside_hub() {
        let (mut world, _events) = world();
        world.begin_quest(QuestId::new()).expect("begin");
        let mut input = InputSampler::new();
        input.push(InputEvent::KeyDown(MoveKey::Forward));
        let report = world.tick(&input.sample(), &child());
        assert!(!report.simulated);
        assert_eq!(world.pose().position, Vec3::ZERO);
    }

    #[test]
    fn disposed_world_stops() {
        let (mut world, _events) = world();
        world.dispose();
        let report = world.tick(&InputFrame::default(), &child());
        assert!(!report.simulated);
        let err = world.begin_quest(QuestId::new()).unwrap_err();
        assert!(err.to_string().contains("disposed"));
    }
}
