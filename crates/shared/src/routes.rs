//! Paths of the backend endpoints, relative to the API base URL

use kidquest_domain::{ChildId, ProgressId, QuestId};

pub const START_QUEST: &str = "/api/progress/start-quest";

pub fn update_progress(progress_id: ProgressId) -> String {
    format!("/api/progress/{}", progress_id)
}

pub fn complete_quest(progress_id: ProgressId) -> String {
    format!("/api/progress/complete-quest/{}", progress_id)
}

pub fn quest(quest_id: QuestId) -> String {
    format!("/api/quests/{}", quest_id)
}

pub fn quests_for_child(child_id: ChildId) -> String {
    format!("/api/quests/child/{}", child_id)
}

pub fn child(child_id: ChildId) -> String {
    format!("/api/children/{}", child_id)
}
