//! Rewards granted when a quest is completed

use serde::{Deserialize, Serialize};

use crate::entities::Subject;
use crate::{BadgeId, CosmeticId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Badge grouping. Quest badges take their quest's subject; `Special` covers
/// awards not tied to one subject (streaks, milestones).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    Math,
    Coding,
    Science,
    Special,
}

impl From<Subject> for BadgeCategory {
    fn from(subject: Subject) -> Self {
        match subject {
            Subject::Math => Self::Math,
            Subject::Coding => Self::Coding,
            Subject::Science => Self::Science,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub id: BadgeId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Emoji or asset key
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default)]
    pub category: Option<BadgeCategory>,
}

impl Badge {
    /// The badge awarded for finishing a quest that names one.
    pub fn for_quest(id: BadgeId, quest_title: &str, subject: Subject) -> Self {
        Self {
            id,
            name: format!("{} Master", quest_title),
            description: format!("Completed {}", quest_title),
            icon: "🏆".to_string(),
            rarity: Rarity::Common,
            category: Some(subject.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cosmetic {
    pub id: CosmeticId,
    pub name: String,
    /// Avatar slot the item fits (`hair_style`, `outfit`, `accessory`, ...)
    pub category: String,
    /// Slot value, e.g. `superhero_cape`
    pub value: String,
    #[serde(default)]
    pub coin_cost: u32,
}

/// Everything the reward screen reveals after a quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardCeremony {
    pub quest_title: String,
    pub xp_earned: u32,
    pub coins_earned: u32,
    #[serde(default, rename = "badges")]
    pub badges_unlocked: Vec<Badge>,
    #[serde(default, rename = "cosmetics")]
    pub cosmetics_unlocked: Vec<Cosmetic>,
    /// Set only when the level went up
    #[serde(default)]
    pub new_level: Option<u32>,
    pub total_xp: u32,
    pub total_coins: u32,
}
