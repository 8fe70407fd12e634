//! Session read models and the messages tasks send back.

use serde::Serialize;

use kidquest_domain::{ChildProfile, QuestWithProgress};

use crate::infrastructure::ports::ApiError;
use crate::simulation::WorldSnapshot;
use crate::use_cases::quest::{QuestRunner, RunnerSnapshot, SubmitOutcome};
use crate::use_cases::reward::RevealView;

pub const SETUP_FAILED_MESSAGE: &str = "Failed to load your adventure. Please try again.";

/// Loading the profile and quest list the hub needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum SetupState {
    Loading,
    Ready,
    /// Offer retry or exit
    Error(String),
}

/// Everything presentation needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub setup: SetupState,
    pub child: Option<ChildProfile>,
    pub world: WorldSnapshot,
    pub quest: Option<RunnerSnapshot>,
    /// A quest operation is in flight
    pub busy: bool,
    pub reward: Option<RevealView>,
}

pub(crate) type SetupData = (ChildProfile, Vec<QuestWithProgress>);

/// What a runner task did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunnerOutcome {
    Loaded,
    Submitted(SubmitOutcome),
}

/// Results from spawned I/O, applied on the next tick.
pub(crate) enum TaskResult {
    Setup {
        generation: u64,
        result: Result<SetupData, ApiError>,
    },
    /// Profile and quest list reloaded after a completion
    Refresh(Result<SetupData, ApiError>),
    Runner {
        epoch: u64,
        runner: Box<QuestRunner>,
        outcome: RunnerOutcome,
    },
}
