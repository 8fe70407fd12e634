//! Fixed layout of the hub world: portals to each subject world and the NPCs.

use glam::Vec3;
use serde::Serialize;

use kidquest_domain::{ChildProfile, WorldKey};

/// Default portal trigger radius.
pub const PORTAL_RADIUS: f32 = 4.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortalData {
    pub name: String,
    pub world_key: WorldKey,
    pub position: Vec3,
    /// Accent color, linear RGB
    pub color: Vec3,
    pub radius: f32,
}

impl PortalData {
    pub fn new(name: impl Into<String>, world_key: WorldKey, position: Vec3, color: Vec3) -> Self {
        Self {
            name: name.into(),
            world_key,
            position,
            color,
            radius: PORTAL_RADIUS,
        }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcRole {
    Guide,
    ShopKeeper,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NpcData {
    pub name: String,
    pub role: NpcRole,
    pub position: Vec3,
    pub color: Vec3,
}

impl NpcData {
    /// What the NPC says when clicked.
    pub fn greeting(&self, child: &ChildProfile) -> String {
        match self.role {
            NpcRole::Guide => format!(
                "Welcome to KidQuest Academy, {}! Walk up to the glowing portals to start your \
                 learning adventures. Use WASD keys to move around, and press E when near a portal!",
                child.username
            ),
            NpcRole::ShopKeeper => format!(
                "Hey there! You have {} coins. Come back when we open the shop to buy cool \
                 cosmetics for your avatar!",
                child.coins
            ),
        }
    }
}

/// The three subject portals, in proximity tie-break order.
pub fn hub_portals() -> Vec<PortalData> {
    vec![
        PortalData::new(
            "Math Jungle",
            WorldKey::MathJungle,
            Vec3::new(-15.0, 0.0, 0.0),
            Vec3::new(0.2, 0.9, 0.3),
        ),
        PortalData::new(
            "Code City",
            WorldKey::CodeCity,
            Vec3::new(0.0, 0.0, -15.0),
            Vec3::new(0.2, 0.6, 1.0),
        ),
        PortalData::new(
            "Science Spaceport",
            WorldKey::ScienceSpaceport,
            Vec3::new(15.0, 0.0, 0.0),
            Vec3::new(0.7, 0.3, 1.0),
        ),
    ]
}

pub fn hub_npcs() -> Vec<NpcData> {
    vec![
        NpcData {
            name: "Guide".to_string(),
            role: NpcRole::Guide,
            position: Vec3::new(3.0, 0.0, 5.0),
            color: Vec3::new(1.0, 0.8, 0.0),
        },
        NpcData {
            name: "Shop Keeper".to_string(),
            role: NpcRole::ShopKeeper,
            position: Vec3::new(-3.0, 0.0, 5.0),
            color: Vec3::new(0.9, 0.5, 0.2),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portals_do_not_overlap_spawn() {
        for portal in hub_portals() {
            assert!(portal.position.distance(Vec3::ZERO) >= portal.radius);
        }
    }

    #[test]
    fn greetings_use_profile() {
        let mut child = ChildProfile::new("Maya");
        child.coins = 42;
        let npcs = hub_npcs();
        assert!(npcs[0].greeting(&child).contains("Maya"));
        assert!(npcs[1].greeting(&child).contains("42 coins"));
    }
}
