//! Domain entities - Core business objects with identity

mod child;
mod progress;
mod quest;
mod reward;

pub use child::{
    level_for_xp, AvatarCustomization, ChildProfile, HairColor, HairStyle, Outfit, SkinTone,
    XP_PER_LEVEL,
};
pub use progress::{ProgressUpdate, QuestProgress, StepProgress};
pub use quest::{
    first_available_for_world, record_completion, Difficulty, Quest, QuestStep,
    QuestWithProgress, StepType, Subject, WorldKey,
};
pub use reward::{Badge, BadgeCategory, Cosmetic, Rarity, RewardCeremony};
