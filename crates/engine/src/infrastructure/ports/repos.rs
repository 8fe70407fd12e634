//! Repository port traits for the progress/content backend.

use async_trait::async_trait;
use kidquest_domain::*;

use super::error::ApiError;

// =============================================================================
// Content
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestRepo: Send + Sync {
    async fn get_quest(&self, quest_id: QuestId) -> Result<Quest, ApiError>;
    /// Every quest with this child's completion and lock state, in display order.
    async fn list_for_child(&self, child_id: ChildId) -> Result<Vec<QuestWithProgress>, ApiError>;
}

// =============================================================================
// Progress
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressRepo: Send + Sync {
    /// Start or resume. Returns the existing record if the child already began this quest.
    async fn start_quest(
        &self,
        child_id: ChildId,
        quest_id: QuestId,
    ) -> Result<QuestProgress, ApiError>;
    async fn update_progress(
        &self,
        progress_id: ProgressId,
        update: ProgressUpdate,
    ) -> Result<QuestProgress, ApiError>;
    /// Close the record and award the quest's rewards.
    async fn complete_quest(&self, progress_id: ProgressId) -> Result<RewardCeremony, ApiError>;
}

// =============================================================================
// Profiles
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn get_child(&self, child_id: ChildId) -> Result<ChildProfile, ApiError>;
}
