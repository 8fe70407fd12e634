//! Runner state and read models.

use serde::Serialize;

use kidquest_domain::{QuestId, RewardCeremony, StepType};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load quest. Please try again.";
pub const COMPLETE_FAILED_MESSAGE: &str = "Failed to complete quest. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Quest or progress could not be fetched, or the content is unusable
    ContentLoad,
    /// The completion call failed; no reward was granted
    Completion,
}

/// Terminal failure shown to the child with a retry/exit choice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunnerFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl RunnerFailure {
    pub fn content_load() -> Self {
        Self {
            kind: FailureKind::ContentLoad,
            message: LOAD_FAILED_MESSAGE.to_string(),
        }
    }

    pub fn completion() -> Self {
        Self {
            kind: FailureKind::Completion,
            message: COMPLETE_FAILED_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunnerState {
    Loading,
    Running,
    Reward(RewardCeremony),
    Error(RunnerFailure),
}

impl RunnerState {
    pub fn phase(&self) -> RunnerPhase {
        match self {
            Self::Loading => RunnerPhase::Loading,
            Self::Running => RunnerPhase::Running,
            Self::Reward(_) => RunnerPhase::Reward,
            Self::Error(_) => RunnerPhase::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerPhase {
    Loading,
    Running,
    Reward,
    Error,
}

/// Result of one answer submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Wrong answer; attempts on this step so far
    Incorrect { attempts: u32 },
    /// Progress saved, now on `step_index`
    Advanced { step_index: usize },
    /// Saving failed; still on the same step with counters intact
    PersistFailed,
    Completed,
    CompletionFailed,
    /// Not running, nothing happened
    Ignored,
}

/// The step currently on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepView {
    pub title: String,
    pub description: String,
    pub step_type: StepType,
    pub config: serde_json::Value,
    pub revealed_hints: Vec<String>,
}

/// Read-only view of a runner for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunnerSnapshot {
    pub quest_id: QuestId,
    pub phase: RunnerPhase,
    pub quest_title: Option<String>,
    pub step_index: usize,
    pub step_count: usize,
    /// Failed attempts on the current step
    pub attempts: u32,
    pub hints_used: u32,
    pub hints_available: u32,
    /// 0..=100, from the step index
    pub percentage: u8,
    pub step: Option<StepView>,
    pub failure: Option<RunnerFailure>,
}
