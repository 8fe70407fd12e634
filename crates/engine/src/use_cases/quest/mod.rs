//! Quest use cases.
//!
//! Runs a single quest from load to reward against the progress backend.

mod runner;
mod types;

pub use runner::QuestRunner;
pub use types::{
    FailureKind, RunnerFailure, RunnerPhase, RunnerSnapshot, RunnerState, StepView, SubmitOutcome,
    COMPLETE_FAILED_MESSAGE, LOAD_FAILED_MESSAGE,
};
