//! Use cases - user story orchestration.
//!
//! - `quest`: one quest from load to reward
//! - `reward`: the timed reward reveal
//! - `session`: a child's whole play session on top of the hub simulation

pub mod quest;
pub mod reward;
pub mod session;

pub use quest::QuestRunner;
pub use reward::RewardSequencer;
pub use session::AdventureSession;
