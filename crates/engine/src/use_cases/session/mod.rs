//! Session use cases.
//!
//! Ties the hub simulation, quest runner and reward reveal into one play session.

mod adventure;
mod error;
mod types;

pub use adventure::AdventureSession;
pub use error::SessionError;
pub use types::{SessionView, SetupState, SETUP_FAILED_MESSAGE};
