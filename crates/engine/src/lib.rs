//! KidQuest Engine library.
//!
//! Hub world simulation, quest progression and reward sequencing for the
//! KidQuest learning adventure.
//!
//! ## Structure
//!
//! - `simulation/` - Real-time hub: input, kinematics, proximity, world lifecycle
//! - `use_cases/` - Quest runner, reward reveal and the play session
//! - `infrastructure/` - Ports plus HTTP and in-memory backends, config, clock
//! - `app` - Application composition
//! - `autopilot` - Scripted player used by the headless binary

pub mod app;
pub mod autopilot;
pub mod infrastructure;
pub mod simulation;
pub mod use_cases;

pub use app::App;
