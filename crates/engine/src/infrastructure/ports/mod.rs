//! Port traits for infrastructure boundaries.
//!
//! Ports exist for:
//! - The progress/content backend (HTTP in production, in-memory for demos and tests)
//! - Clock (for testing)

mod error;
mod repos;
mod testing;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{ProfileRepo, ProgressRepo, QuestRepo};

// =============================================================================
// Testability Ports
// =============================================================================
pub use testing::ClockPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::ApiError;

// =============================================================================
// Mocks (test only)
// =============================================================================
#[cfg(test)]
pub use repos::{MockProfileRepo, MockProgressRepo, MockQuestRepo};
#[cfg(test)]
pub use testing::MockClockPort;
