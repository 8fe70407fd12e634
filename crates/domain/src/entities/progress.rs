//! Quest progress - the persisted, resumable record of one child on one quest
//!
//! ## Invariants
//! - `current_step_index` is within `0..=steps.len()` of its quest
//! - `current_step_index` never decreases
//! - complete means `current_step_index == steps.len()` with `completed_at` set

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::Quest;
use crate::error::DomainError;
use crate::{ChildId, ProgressId, QuestId, StepId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepProgress {
    pub step_id: StepId,
    pub completed: bool,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub score: Option<u32>,
}

/// Fields a client may write back while a quest is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub current_step_index: usize,
    pub total_attempts: u32,
    pub hints_used: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestProgress {
    id: ProgressId,
    child_id: ChildId,
    quest_id: QuestId,
    started_at: DateTime<Utc>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    current_step_index: usize,
    #[serde(default, rename = "steps_progress")]
    step_progress: Vec<StepProgress>,
    #[serde(default)]
    total_attempts: u32,
    #[serde(default)]
    hints_used: u32,
}

impl QuestProgress {
    /// A fresh record at step 0.
    pub fn start(child_id: ChildId, quest_id: QuestId, started_at: DateTime<Utc>) -> Self {
        Self {
            id: ProgressId::new(),
            child_id,
            quest_id,
            started_at,
            completed_at: None,
            current_step_index: 0,
            step_progress: Vec::new(),
            total_attempts: 0,
            hints_used: 0,
        }
    }

    /// A fresh record with an open entry for every step of `quest`.
    pub fn begin(child_id: ChildId, quest: &Quest, started_at: DateTime<Utc>) -> Self {
        let mut progress = Self::start(child_id, quest.id, started_at);
        progress.step_progress = quest
            .steps
            .iter()
            .map(|step| StepProgress {
                step_id: step.id,
                completed: false,
                attempts: 0,
                completed_at: None,
                score: None,
            })
            .collect();
        progress
    }

    /// Resume at a known position. Used when rehydrating records.
    pub fn with_position(mut self, current_step_index: usize, total_attempts: u32, hints_used: u32) -> Self {
        self.current_step_index = current_step_index;
        self.total_attempts = total_attempts;
        self.hints_used = hints_used;
        self
    }

    // Accessors

    pub fn id(&self) -> ProgressId {
        self.id
    }

    pub fn child_id(&self) -> ChildId {
        self.child_id
    }

    pub fn quest_id(&self) -> QuestId {
        self.quest_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    pub fn step_progress(&self) -> &[StepProgress] {
        &self.step_progress
    }

    pub fn total_attempts(&self) -> u32 {
        self.total_attempts
    }

    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Check this record is consistent with the quest it belongs to.
    pub fn validate_against(&self, quest: &Quest) -> Result<(), DomainError> {
        if self.quest_id != quest.id {
            return Err(DomainError::validation(format!(
                "progress {} belongs to quest {}, not {}",
                self.id, self.quest_id, quest.id
            )));
        }
        if self.current_step_index > quest.step_count() {
            return Err(DomainError::step_index_out_of_bounds(
                self.current_step_index,
                quest.step_count(),
            ));
        }
        Ok(())
    }

    /// Apply a client update. Steps skipped over are recorded as completed at `now`.
    pub fn apply_update(
        &mut self,
        update: &ProgressUpdate,
        quest: &Quest,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.is_complete() {
            return Err(DomainError::invalid_state_transition(format!(
                "progress {} is already complete",
                self.id
            )));
        }
        if update.current_step_index > quest.step_count() {
            return Err(DomainError::step_index_out_of_bounds(
                update.current_step_index,
                quest.step_count(),
            ));
        }
        if update.current_step_index < self.current_step_index {
            return Err(DomainError::validation(format!(
                "step index cannot move backwards ({} -> {})",
                self.current_step_index, update.current_step_index
            )));
        }

        for index in self.current_step_index..update.current_step_index {
            if let Some(step) = quest.step(index) {
                self.record_step_done(step.id, now);
            }
        }
        self.current_step_index = update.current_step_index;
        self.total_attempts = update.total_attempts;
        self.hints_used = update.hints_used;
        Ok(())
    }

    /// Close the record: every step done, completion time set.
    pub fn mark_completed(&mut self, quest: &Quest, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.is_complete() {
            return Err(DomainError::invalid_state_transition(format!(
                "progress {} is already complete",
                self.id
            )));
        }
        for index in self.current_step_index..quest.step_count() {
            if let Some(step) = quest.step(index) {
                self.record_step_done(step.id, now);
            }
        }
        self.current_step_index = quest.step_count();
        self.completed_at = Some(now);
        Ok(())
    }

    fn record_step_done(&mut self, step_id: StepId, now: DateTime<Utc>) {
        match self.step_progress.iter_mut().find(|s| s.step_id == step_id) {
            Some(existing) => {
                existing.completed = true;
                existing.completed_at.get_or_insert(now);
            }
            None => self.step_progress.push(StepProgress {
                step_id,
                completed: true,
                attempts: 0,
                completed_at: Some(now),
                score: None,
            }),
        }
    }
}
