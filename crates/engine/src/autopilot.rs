//! Scripted player for the headless runner.
//!
//! Walks to the portal of the first available quest, enters it, answers every
//! step from its config (asking for one hint on puzzles), waits for the reward
//! reveal and goes back for the next quest.

use glam::Vec3;
use serde_json::Value;

use kidquest_domain::{first_available_for_world, CodeBlock, StepAnswer, StepType};

use crate::simulation::{InputEvent, MoveKey, WorldState};
use crate::use_cases::quest::{RunnerPhase, StepView};
use crate::use_cases::session::{AdventureSession, SetupState};

/// Distance under which an axis counts as reached.
const ARRIVE_EPSILON: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    WaitSetup,
    /// Back to spawn so the last portal's latch is released
    WalkHome,
    WalkToPortal { portal: usize },
    AwaitPrompt,
    Playing { hinted: bool, step: usize },
    Done,
}

#[derive(Debug, Default, Clone, Copy)]
struct Held {
    forward: bool,
    back: bool,
    left: bool,
    right: bool,
}

#[derive(Debug)]
pub struct Autopilot {
    phase: Phase,
    held: Held,
    completed: u32,
    max_quests: u32,
}

impl Autopilot {
    pub fn new(max_quests: u32) -> Self {
        Self {
            phase: Phase::WaitSetup,
            held: Held::default(),
            completed: 0,
            max_quests,
        }
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn completed(&self) -> u32 {
        self.completed
    }

    /// Push this frame's input and issue commands. Call once before each tick.
    pub fn drive(&mut self, session: &mut AdventureSession) {
        if session.is_disposed() {
            self.phase = Phase::Done;
            return;
        }
        match self.phase {
            Phase::WaitSetup => match session.setup_state() {
                SetupState::Ready => self.phase = Phase::WalkHome,
                SetupState::Error(message) => {
                    tracing::warn!(%message, "Setup failed, autopilot stopping");
                    self.phase = Phase::Done;
                }
                SetupState::Loading => {}
            },
            Phase::WalkHome => {
                if self.steer(session, Vec3::ZERO) {
                    self.phase = match self.next_portal(session) {
                        Some(portal) => Phase::WalkToPortal { portal },
                        None => {
                            tracing::info!(completed = self.completed, "Nothing left to play");
                            Phase::Done
                        }
                    };
                }
            }
            Phase::WalkToPortal { portal } => {
                let near_target = session
                    .world()
                    .near_portal()
                    .zip(session.world().portals().get(portal))
                    .is_some_and(|(near, target)| near == target);
                if near_target {
                    self.release_all(session);
                    session.push_input(InputEvent::Interact);
                    self.phase = Phase::AwaitPrompt;
                    return;
                }
                let Some(target) = session.world().portals().get(portal).map(|p| p.position) else {
                    self.phase = Phase::Done;
                    return;
                };
                self.steer(session, target);
            }
            Phase::AwaitPrompt => {
                if session.world().pending_portal().is_some() {
                    session.push_input(InputEvent::Confirm);
                } else if matches!(session.world_state(), WorldState::QuestActive { .. }) {
                    self.phase = Phase::Playing {
                        hinted: false,
                        step: usize::MAX,
                    };
                } else if session.world().near_portal().is_none() {
                    // Prompt dropped (no quest behind it); start over
                    self.phase = Phase::WalkHome;
                }
            }
            Phase::Playing { hinted, step } => self.play(session, hinted, step),
            Phase::Done => {}
        }
    }

    fn play(&mut self, session: &mut AdventureSession, hinted: bool, step: usize) {
        if session.is_busy() {
            return;
        }
        let view = session.view();
        if let Some(reward) = view.reward {
            if reward.can_continue {
                match session.continue_after_reward() {
                    Ok(()) => {
                        self.completed += 1;
                        self.phase = if self.completed >= self.max_quests {
                            Phase::Done
                        } else {
                            Phase::WalkHome
                        };
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Could not leave reward screen");
                        self.phase = Phase::Done;
                    }
                }
            }
            return;
        }
        let Some(quest) = view.quest else {
            return;
        };
        match quest.phase {
            RunnerPhase::Loading | RunnerPhase::Reward => {}
            RunnerPhase::Error => {
                tracing::warn!(failure = ?quest.failure, "Quest failed, leaving");
                if let Err(e) = session.exit_quest() {
                    tracing::warn!(error = %e, "Could not exit quest");
                }
                self.phase = Phase::Done;
            }
            RunnerPhase::Running => {
                let Some(current) = quest.step.as_ref() else {
                    return;
                };
                let hinted = hinted && step == quest.step_index;
                if !hinted && !current.step_type.is_narrative() && quest.hints_available > 0 {
                    if let Ok(Some(hint)) = session.request_hint() {
                        tracing::info!(step = %current.title, %hint, "Hint");
                    }
                    self.phase = Phase::Playing {
                        hinted: true,
                        step: quest.step_index,
                    };
                    return;
                }
                let Some(answer) = scripted_answer(current) else {
                    tracing::warn!(step = %current.title, "No scripted answer, leaving quest");
                    if let Err(e) = session.exit_quest() {
                        tracing::warn!(error = %e, "Could not exit quest");
                    }
                    self.phase = Phase::Done;
                    return;
                };
                tracing::info!(step = %current.title, answer = ?answer, "Answering");
                if let Err(e) = session.submit_answer(&answer) {
                    tracing::warn!(error = %e, "Answer rejected");
                }
                self.phase = Phase::Playing {
                    hinted: false,
                    step: quest.step_index,
                };
            }
        }
    }

    fn next_portal(&self, session: &AdventureSession) -> Option<usize> {
        let portals = session.world().portals();
        portals
            .iter()
            .position(|p| first_available_for_world(session.quests(), p.world_key).is_some())
    }

    /// Hold the keys that move toward `target`. Returns true once there.
    fn steer(&mut self, session: &mut AdventureSession, target: Vec3) -> bool {
        let position = session.world().pose().position;
        let dx = target.x - position.x;
        let dz = target.z - position.z;
        // Default camera: "right" walks +X, "forward" walks +Z
        let wanted = Held {
            right: dx > ARRIVE_EPSILON,
            left: dx < -ARRIVE_EPSILON,
            forward: dz > ARRIVE_EPSILON,
            back: dz < -ARRIVE_EPSILON,
        };
        self.hold(session, wanted);
        !(wanted.right || wanted.left || wanted.forward || wanted.back)
    }

    fn release_all(&mut self, session: &mut AdventureSession) {
        self.hold(session, Held::default());
    }

    fn hold(&mut self, session: &mut AdventureSession, wanted: Held) {
        for (key, now, before) in [
            (MoveKey::Forward, wanted.forward, self.held.forward),
            (MoveKey::Back, wanted.back, self.held.back),
            (MoveKey::Left, wanted.left, self.held.left),
            (MoveKey::Right, wanted.right, self.held.right),
        ] {
            if now && !before {
                session.push_input(InputEvent::KeyDown(key));
            } else if !now && before {
                session.push_input(InputEvent::KeyUp(key));
            }
        }
        self.held = wanted;
    }
}

/// The right answer for a step, read from its config.
pub fn scripted_answer(step: &StepView) -> Option<StepAnswer> {
    let config = &step.config;
    match step.step_type {
        StepType::Dialogue | StepType::Collect => Some(StepAnswer::Acknowledge),
        StepType::MathPuzzle => match config.get("correct_answer")? {
            Value::Number(n) => n.as_i64().map(StepAnswer::Number),
            Value::String(s) => Some(StepAnswer::Choice(s.clone())),
            _ => None,
        },
        StepType::CodePuzzle => {
            let blocks = config
                .get("solution")?
                .as_array()?
                .iter()
                .map(|v| v.as_str()?.parse::<CodeBlock>().ok())
                .collect::<Option<Vec<_>>>()?;
            Some(StepAnswer::Sequence(blocks))
        }
        StepType::ScienceSim => config
            .get("correct_answer")?
            .as_str()
            .map(|s| StepAnswer::Choice(s.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn view(step_type: StepType, config: Value) -> StepView {
        StepView {
            title: "step".to_string(),
            description: String::new(),
            step_type,
            config,
            revealed_hints: vec![],
        }
    }

    #[test]
    fn answers_come_from_config() {
        assert_eq!(
            scripted_answer(&view(StepType::MathPuzzle, json!({"correct_answer": 8}))),
            Some(StepAnswer::Number(8))
        );
        assert_eq!(
            scripted_answer(&view(StepType::MathPuzzle, json!({"correct_answer": "1/2"}))),
            Some(StepAnswer::Choice("1/2".to_string()))
        );
        assert_eq!(
            scripted_answer(&view(
                StepType::CodePuzzle,
                json!({"solution": ["move_forward", "turn_left"]})
            )),
            Some(StepAnswer::Sequence(vec![CodeBlock::MoveForward, CodeBlock::TurnLeft]))
        );
        assert_eq!(
            scripted_answer(&view(StepType::Dialogue, Value::Null)),
            Some(StepAnswer::Acknowledge)
        );
    }

    #[test]
    fn unknown_blocks_give_no_answer() {
        assert_eq!(
            scripted_answer(&view(StepType::CodePuzzle, json!({"solution": ["jump"]}))),
            None
        );
    }
}
