pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

// Re-export all entities (explicit list in entities/mod.rs)
pub use entities::{
    first_available_for_world, level_for_xp, record_completion, AvatarCustomization, Badge,
    BadgeCategory, ChildProfile, Cosmetic, Difficulty, HairColor, HairStyle, Outfit,
    ProgressUpdate, Quest, QuestProgress, QuestStep, QuestWithProgress, Rarity, RewardCeremony,
    SkinTone, StepProgress, StepType, Subject, WorldKey, XP_PER_LEVEL,
};

pub use error::DomainError;

// Re-export ID types
pub use ids::{BadgeId, ChildId, CosmeticId, ProgressId, QuestId, StepId};

pub use value_objects::{CodeBlock, StepAnswer};
