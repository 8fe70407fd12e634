//! Real-time hub simulation
//!
//! Everything here is synchronous and deterministic: the owner feeds input and
//! calls `tick()` at a fixed rate, then drains `WorldEvent`s.

pub mod events;
pub mod hub;
pub mod input;
pub mod kinematics;
pub mod proximity;
pub mod timestep;
pub mod world;

pub use events::{event_channel, EventSink, WorldEvent, WorldEventHandler, WorldEvents, WorldState};
pub use hub::{hub_npcs, hub_portals, NpcData, NpcRole, PortalData, PORTAL_RADIUS};
pub use input::{InputEvent, InputFrame, InputSampler, MoveKey};
pub use kinematics::{AvatarKinematics, AvatarPose, CameraRig, KinematicsConfig};
pub use proximity::{ProximityDetector, ProximityUpdate};
pub use timestep::FixedTimestep;
pub use world::{TickReport, WorldController, WorldSnapshot};
