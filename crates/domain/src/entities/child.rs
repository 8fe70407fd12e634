//! Child profile - the learner's read model for a play session
//!
//! The profile is fetched once when the hub loads and replaced wholesale after a
//! quest completes. Nothing in the engine mutates it in place.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ChildId;

/// XP required per level.
pub const XP_PER_LEVEL: u32 = 100;

/// Level for a total XP value. Level 1 starts at 0 XP.
pub fn level_for_xp(total_xp: u32) -> u32 {
    (total_xp / XP_PER_LEVEL + 1).max(1)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildProfile {
    pub id: ChildId,
    pub username: String,
    pub avatar: AvatarCustomization,
    pub total_xp: u32,
    pub level: u32,
    pub coins: u32,
}

impl ChildProfile {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: ChildId::new(),
            username: username.into(),
            avatar: AvatarCustomization::default(),
            total_xp: 0,
            level: 1,
            coins: 0,
        }
    }

    pub fn with_avatar(mut self, avatar: AvatarCustomization) -> Self {
        self.avatar = avatar;
        self
    }

    /// Apply a quest reward and return the new level if it went up.
    pub fn award(&mut self, xp: u32, coins: u32) -> Option<u32> {
        let old_level = self.level;
        self.total_xp = self.total_xp.saturating_add(xp);
        self.coins = self.coins.saturating_add(coins);
        self.level = level_for_xp(self.total_xp);
        (self.level > old_level).then_some(self.level)
    }
}

/// Avatar look. Every field is a closed set; the renderer maps each to a mesh or color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AvatarCustomization {
    pub skin_tone: SkinTone,
    pub hair_style: HairStyle,
    pub hair_color: HairColor,
    pub outfit: Outfit,
}

macro_rules! closed_enum {
    ($name:ident, $label:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err(DomainError::parse(format!("Unknown {}: {}", $label, s))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkinTone {
    Light,
    #[default]
    Medium,
    Tan,
    Dark,
}

closed_enum!(SkinTone, "skin tone", {
    Light => "light",
    Medium => "medium",
    Tan => "tan",
    Dark => "dark",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HairStyle {
    #[default]
    Short,
    Spiky,
    Long,
    Curly,
}

closed_enum!(HairStyle, "hair style", {
    Short => "short",
    Spiky => "spiky",
    Long => "long",
    Curly => "curly",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HairColor {
    Black,
    #[default]
    Brown,
    Blonde,
    Red,
}

closed_enum!(HairColor, "hair color", {
    Black => "black",
    Brown => "brown",
    Blonde => "blonde",
    Red => "red",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outfit {
    #[default]
    CasualBlue,
    CasualRed,
    SuperheroCape,
}

closed_enum!(Outfit, "outfit", {
    CasualBlue => "casual_blue",
    CasualRed => "casual_red",
    SuperheroCape => "superhero_cape",
});
