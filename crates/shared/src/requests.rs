use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kidquest_domain::{ChildId, ProgressUpdate, QuestId};

/// Body of `POST /api/progress/start-quest`. Idempotent per (child, quest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartQuestRequest {
    pub child_id: Uuid,
    pub quest_id: Uuid,
}

impl StartQuestRequest {
    pub fn new(child_id: ChildId, quest_id: QuestId) -> Self {
        Self {
            child_id: child_id.to_uuid(),
            quest_id: quest_id.to_uuid(),
        }
    }
}

/// Body of `PATCH /api/progress/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProgressRequest {
    pub current_step_index: usize,
    pub total_attempts: u32,
    pub hints_used: u32,
}

impl From<ProgressUpdate> for UpdateProgressRequest {
    fn from(update: ProgressUpdate) -> Self {
        Self {
            current_step_index: update.current_step_index,
            total_attempts: update.total_attempts,
            hints_used: update.hints_used,
        }
    }
}

impl From<UpdateProgressRequest> for ProgressUpdate {
    fn from(request: UpdateProgressRequest) -> Self {
        Self {
            current_step_index: request.current_step_index,
            total_attempts: request.total_attempts,
            hints_used: request.hints_used,
        }
    }
}
