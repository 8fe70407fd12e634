//! Reward reveal after a completed quest.

mod scheduler;
mod sequencer;

pub use scheduler::TimerScheduler;
pub use sequencer::{RevealProgress, RevealStage, RevealTimeline, RevealView, RewardSequencer};
