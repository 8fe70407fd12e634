//! Avatar kinematics: per-tick integration of the player pose.
//!
//! Units are world units per tick. Movement is camera-relative on the ground
//! plane; vertical motion is a simple ballistic jump with no double-jump.

use glam::{Vec2, Vec3};
use serde::Serialize;

/// Tunables for avatar motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicsConfig {
    /// Horizontal speed per tick
    pub speed: f32,
    /// Upward velocity applied on jump
    pub jump_velocity: f32,
    /// Added to vertical velocity every airborne tick (negative pulls down)
    pub gravity: f32,
    pub ground_level: f32,
    /// Half-extent of the walkable square on x and z
    pub bounds: f32,
    /// Movement shorter than this leaves facing unchanged
    pub facing_epsilon: f32,
    /// Walk animation phase advance per moving tick
    pub walk_cycle_step: f32,
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self {
            speed: 0.15,
            jump_velocity: 0.25,
            gravity: -0.015,
            ground_level: 0.0,
            bounds: 28.0,
            facing_epsilon: 0.001,
            walk_cycle_step: 0.15,
        }
    }
}

/// Camera orientation on the ground plane. Yaw 0 looks down +Z.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraRig {
    pub yaw: f32,
}

impl CameraRig {
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y)
    }

    /// World-space movement for a raw intent, before scaling.
    pub fn movement(&self, intent: Vec2) -> Vec3 {
        self.forward() * intent.y + self.right() * -intent.x
    }
}

/// Read-only pose for renderers and snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AvatarPose {
    pub position: Vec3,
    /// Radians about +Y, `atan2(x, z)` of the last movement
    pub facing: f32,
    pub is_moving: bool,
    pub is_airborne: bool,
    pub walk_phase: f32,
}

#[derive(Debug, Clone)]
pub struct AvatarKinematics {
    config: KinematicsConfig,
    position: Vec3,
    facing: f32,
    vertical_velocity: f32,
    airborne: bool,
    moving: bool,
    walk_phase: f32,
}

impl AvatarKinematics {
    pub fn new(config: KinematicsConfig) -> Self {
        Self::at(config, Vec3::new(0.0, config.ground_level, 0.0))
    }

    pub fn at(config: KinematicsConfig, position: Vec3) -> Self {
        Self {
            config,
            position,
            facing: 0.0,
            vertical_velocity: 0.0,
            airborne: false,
            moving: false,
            walk_phase: 0.0,
        }
    }

    pub fn config(&self) -> &KinematicsConfig {
        &self.config
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn pose(&self) -> AvatarPose {
        AvatarPose {
            position: self.position,
            facing: self.facing,
            is_moving: self.moving,
            is_airborne: self.airborne,
            walk_phase: self.walk_phase,
        }
    }

    /// Start a jump if grounded. Returns whether a jump began.
    pub fn jump(&mut self) -> bool {
        if self.airborne {
            return false;
        }
        self.airborne = true;
        self.vertical_velocity = self.config.jump_velocity;
        true
    }

    /// Advance one tick.
    pub fn step(&mut self, intent: Vec2, camera: &CameraRig) {
        let movement = camera.movement(intent);
        let length = movement.length();
        self.moving = length > 0.0;

        if self.moving {
            let delta = movement / length * self.config.speed;
            self.position += delta;
            if delta.length() > self.config.facing_epsilon {
                self.facing = delta.x.atan2(delta.z);
            }
            self.walk_phase += self.config.walk_cycle_step;
        }

        if self.airborne {
            self.position.y += self.vertical_velocity;
            self.vertical_velocity += self.config.gravity;
            if self.position.y <= self.config.ground_level {
                self.position.y = self.config.ground_level;
                self.vertical_velocity = 0.0;
                self.airborne = false;
            }
        }

        let bounds = self.config.bounds;
        self.position.x = self.position.x.clamp(-bounds, bounds);
        self.position.z = self.position.z.clamp(-bounds, bounds);
    }
}

impl Default for AvatarKinematics {
    fn default() -> Self {
        Self::new(KinematicsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORWARD: Vec2 = Vec2::new(0.0, 1.0);
    const RIGHT: Vec2 = Vec2::new(1.0, 0.0);

    fn ticks_until_landed(kin: &mut AvatarKinematics, limit: u32) -> Option<u32> {
        let camera = CameraRig::default();
        for tick in 1..=limit {
            kin.step(Vec2::ZERO, &camera);
            if !kin.pose().is_airborne {
                return Some(tick);
            }
        }
        None
    }

    #[test]
    fn default_camera_maps_intent_to_world_axes() {
        let camera = CameraRig::default();
        assert_eq!(camera.forward(), Vec3::Z);
        assert_eq!(camera.right(), Vec3::new(-1.0, 0.0, 0.0));
        // "Right" intent walks toward +X
        assert_eq!(camera.movement(RIGHT), Vec3::X);
    }

    #[test]
    fn moves_at_fixed_speed_and_faces_travel() {
        let mut kin = AvatarKinematics::default();
        kin.step(FORWARD, &CameraRig::default());
        let pose = kin.pose();
        assert!((pose.position.z - 0.15).abs() < 1e-6);
        assert!(pose.is_moving);
        assert!(pose.facing.abs() < 1e-6);

        kin.step(RIGHT, &CameraRig::default());
        assert!((kin.pose().facing - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn diagonal_is_normalized() {
        let mut kin = AvatarKinematics::default();
        kin.step(Vec2::new(1.0, 1.0), &CameraRig::default());
        let horizontal = Vec2::new(kin.position().x, kin.position().z).length();
        assert!((horizontal - 0.15).abs() < 1e-6);
    }

    #[test]
    fn idle_keeps_facing() {
        let mut kin = AvatarKinematics::default();
        kin.step(RIGHT, &CameraRig::default());
        let facing = kin.pose().facing;
        kin.step(Vec2::ZERO, &CameraRig::default());
        assert_eq!(kin.pose().facing, facing);
        assert!(!kin.pose().is_moving);
    }

    #[test]
    fn jump_lands_deterministically() {
        let mut kin = AvatarKinematics::default();
        assert!(kin.jump());
        assert_eq!(ticks_until_landed(&mut kin, 100), Some(35));
        assert_eq!(kin.position().y, 0.0);
    }

    #[test]
    fn no_double_jump() {
        let mut kin = AvatarKinematics::default();
        assert!(kin.jump());
        kin.step(Vec2::ZERO, &CameraRig::default());
        assert!(!kin.jump());
    }

    #[test]
    fn zero_gravity_never_lands() {
        let config = KinematicsConfig {
            gravity: 0.0,
            ..KinematicsConfig::default()
        };
        let mut kin = AvatarKinematics::new(config);
        kin.jump();
        assert_eq!(ticks_until_landed(&mut kin, 1_000), None);
    }

    #[test]
    fn position_is_clamped_to_bounds() {
        let mut kin = AvatarKinematics::at(KinematicsConfig::default(), Vec3::new(27.95, 0.0, 0.0));
        for _ in 0..10 {
            kin.step(RIGHT, &CameraRig::default());
        }
        assert_eq!(kin.position().x, 28.0);
        assert!(kin.pose().is_moving);
    }
}
