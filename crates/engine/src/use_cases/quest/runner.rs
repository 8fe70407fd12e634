//! Quest runner: one child playing one quest, step by step.
//!
//! The runner owns no tasks. Each async method runs to completion against the
//! ports and leaves the runner in a well-defined state, so a session can move it
//! into a task and take it back with the result.

use std::sync::Arc;

use kidquest_domain::{
    ChildId, DomainError, ProgressId, ProgressUpdate, Quest, QuestId, QuestProgress, QuestStep,
    RewardCeremony, StepAnswer,
};

use crate::infrastructure::ports::{ProgressRepo, QuestRepo};

use super::types::{
    RunnerFailure, RunnerPhase, RunnerSnapshot, RunnerState, StepView, SubmitOutcome,
};

pub struct QuestRunner {
    quest_repo: Arc<dyn QuestRepo>,
    progress_repo: Arc<dyn ProgressRepo>,
    child_id: ChildId,
    quest_id: QuestId,
    state: RunnerState,
    quest: Option<Quest>,
    progress_id: Option<ProgressId>,
    step_index: usize,
    /// `total_attempts` as last written to the backend
    persisted_attempts: u32,
    /// Failed attempts on the current step
    step_attempts: u32,
    /// Hints revealed on the current step
    step_hints: u32,
}

impl QuestRunner {
    pub fn new(
        quest_repo: Arc<dyn QuestRepo>,
        progress_repo: Arc<dyn ProgressRepo>,
        child_id: ChildId,
        quest_id: QuestId,
    ) -> Self {
        Self {
            quest_repo,
            progress_repo,
            child_id,
            quest_id,
            state: RunnerState::Loading,
            quest: None,
            progress_id: None,
            step_index: 0,
            persisted_attempts: 0,
            step_attempts: 0,
            step_hints: 0,
        }
    }

    pub fn quest_id(&self) -> QuestId {
        self.quest_id
    }

    pub fn state(&self) -> &RunnerState {
        &self.state
    }

    pub fn phase(&self) -> RunnerPhase {
        self.state.phase()
    }

    pub fn quest(&self) -> Option<&Quest> {
        self.quest.as_ref()
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn current_step(&self) -> Option<&QuestStep> {
        match self.state {
            RunnerState::Running => self.quest.as_ref()?.step(self.step_index),
            _ => None,
        }
    }

    pub fn reward(&self) -> Option<&RewardCeremony> {
        match &self.state {
            RunnerState::Reward(ceremony) => Some(ceremony),
            _ => None,
        }
    }

    /// Fetch the quest and start or resume progress.
    ///
    /// Only acts in `Loading`. Failures end in `Error`; nothing retries on its own.
    pub async fn load(&mut self) -> RunnerPhase {
        if self.state != RunnerState::Loading {
            return self.phase();
        }

        let quest = match self.quest_repo.get_quest(self.quest_id).await {
            Ok(quest) => quest,
            Err(e) => {
                tracing::warn!(quest_id = %self.quest_id, error = %e, "Failed to fetch quest");
                return self.fail(RunnerFailure::content_load());
            }
        };
        if let Err(e) = quest.ensure_playable() {
            tracing::warn!(quest_id = %self.quest_id, error = %e, "Quest content unusable");
            return self.fail(RunnerFailure::content_load());
        }

        let progress = match self.progress_repo.start_quest(self.child_id, self.quest_id).await {
            Ok(progress) => progress,
            Err(e) => {
                tracing::warn!(quest_id = %self.quest_id, error = %e, "Failed to start quest");
                return self.fail(RunnerFailure::content_load());
            }
        };
        if let Err(e) = validate_resume(&progress, &quest) {
            tracing::warn!(
                quest_id = %self.quest_id,
                progress_id = %progress.id(),
                error = %e,
                "Progress record does not fit quest"
            );
            return self.fail(RunnerFailure::content_load());
        }

        self.progress_id = Some(progress.id());
        self.step_index = progress.current_step_index();
        self.persisted_attempts = progress.total_attempts();
        self.step_attempts = 0;
        // Resumed hint count carries the record's cumulative `hints_used`.
        self.step_hints = progress.hints_used();
        let resumed_at_end = self.step_index == quest.step_count();
        tracing::info!(
            quest_id = %self.quest_id,
            progress_id = %progress.id(),
            step_index = self.step_index,
            step_count = quest.step_count(),
            "Quest loaded"
        );
        self.quest = Some(quest);
        self.state = RunnerState::Running;

        if resumed_at_end {
            // Every step was saved but completion never landed
            tracing::info!(quest_id = %self.quest_id, "Resuming at completion");
            self.complete().await;
        }
        self.phase()
    }

    /// Report whether the child answered the current step correctly.
    pub async fn submit(&mut self, correct: bool) -> SubmitOutcome {
        if self.state != RunnerState::Running {
            return SubmitOutcome::Ignored;
        }
        let (progress_id, is_final) = match (&self.quest, self.progress_id) {
            (Some(quest), Some(progress_id)) => (progress_id, quest.is_final_step(self.step_index)),
            _ => return SubmitOutcome::Ignored,
        };

        if !correct {
            self.step_attempts += 1;
            return SubmitOutcome::Incorrect {
                attempts: self.step_attempts,
            };
        }

        if is_final {
            return self.complete().await;
        }

        let update = ProgressUpdate {
            current_step_index: self.step_index + 1,
            total_attempts: self.persisted_attempts + self.step_attempts + 1,
            hints_used: self.step_hints,
        };
        match self.progress_repo.update_progress(progress_id, update).await {
            Ok(_) => {
                self.step_index = update.current_step_index;
                self.persisted_attempts = update.total_attempts;
                self.step_attempts = 0;
                self.step_hints = 0;
                tracing::debug!(
                    quest_id = %self.quest_id,
                    step_index = self.step_index,
                    total_attempts = update.total_attempts,
                    "Step completed"
                );
                SubmitOutcome::Advanced {
                    step_index: self.step_index,
                }
            }
            Err(e) => {
                tracing::warn!(
                    quest_id = %self.quest_id,
                    step_index = self.step_index,
                    error = %e,
                    "Failed to save progress, staying on step"
                );
                SubmitOutcome::PersistFailed
            }
        }
    }

    /// Evaluate a structured answer and submit the result.
    ///
    /// An answer that does not fit the step is rejected without counting an attempt.
    pub async fn submit_answer(&mut self, answer: &StepAnswer) -> Result<SubmitOutcome, DomainError> {
        let correct = match self.current_step() {
            Some(step) => answer.evaluate(step)?,
            None => return Ok(SubmitOutcome::Ignored),
        };
        Ok(self.submit(correct).await)
    }

    /// Reveal the next hint for the current step, if one is left.
    pub fn request_hint(&mut self) -> Option<String> {
        let step = self.current_step()?;
        let hint = step.hints.get(self.step_hints as usize)?.clone();
        self.step_hints += 1;
        Some(hint)
    }

    pub fn revealed_hints(&self) -> Vec<String> {
        self.current_step()
            .map(|step| {
                step.hints
                    .iter()
                    .take(self.step_hints as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Go back to `Loading` after an error so `load()` can run again.
    pub fn reset(&mut self) {
        self.state = RunnerState::Loading;
        self.quest = None;
        self.progress_id = None;
        self.step_index = 0;
        self.persisted_attempts = 0;
        self.step_attempts = 0;
        self.step_hints = 0;
    }

    pub fn snapshot(&self) -> RunnerSnapshot {
        let step_count = self.quest.as_ref().map_or(0, Quest::step_count);
        let percentage = if step_count == 0 {
            0
        } else {
            let pct = (self.step_index.min(step_count) * 100) / step_count;
            u8::try_from(pct).unwrap_or(100)
        };
        let step = self.current_step().map(|step| StepView {
            title: step.title.clone(),
            description: step.description.clone(),
            step_type: step.step_type,
            config: step.config.clone(),
            revealed_hints: self.revealed_hints(),
        });
        let hints_available = self
            .current_step()
            .map_or(0, |s| u32::try_from(s.hints.len()).unwrap_or(u32::MAX));

        RunnerSnapshot {
            quest_id: self.quest_id,
            phase: self.phase(),
            quest_title: self.quest.as_ref().map(|q| q.title.clone()),
            step_index: self.step_index,
            step_count,
            attempts: self.step_attempts,
            hints_used: self.step_hints,
            hints_available,
            percentage,
            step,
            failure: match &self.state {
                RunnerState::Error(failure) => Some(failure.clone()),
                _ => None,
            },
        }
    }

    async fn complete(&mut self) -> SubmitOutcome {
        let Some(progress_id) = self.progress_id else {
            return SubmitOutcome::Ignored;
        };
        match self.progress_repo.complete_quest(progress_id).await {
            Ok(ceremony) => {
                tracing::info!(
                    quest_id = %self.quest_id,
                    xp = ceremony.xp_earned,
                    coins = ceremony.coins_earned,
                    new_level = ?ceremony.new_level,
                    "Quest completed"
                );
                if let Some(quest) = &self.quest {
                    self.step_index = quest.step_count();
                }
                self.state = RunnerState::Reward(ceremony);
                SubmitOutcome::Completed
            }
            Err(e) => {
                tracing::error!(quest_id = %self.quest_id, error = %e, "Failed to complete quest");
                self.fail(RunnerFailure::completion());
                SubmitOutcome::CompletionFailed
            }
        }
    }

    fn fail(&mut self, failure: RunnerFailure) -> RunnerPhase {
        self.state = RunnerState::Error(failure);
        self.phase()
    }
}

/// A resumable record must belong to the quest, be open and stay in bounds.
fn validate_resume(progress: &QuestProgress, quest: &Quest) -> Result<(), DomainError> {
    progress.validate_against(quest)?;
    if progress.is_complete() {
        return Err(DomainError::invalid_state_transition(format!(
            "progress {} is already complete",
            progress.id()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{ApiError, MockProgressRepo, MockQuestRepo};
    use crate::use_cases::quest::types::{FailureKind, COMPLETE_FAILED_MESSAGE, LOAD_FAILED_MESSAGE};
    use chrono::Utc;
    use kidquest_domain::{StepType, WorldKey};
    use mockall::predicate::eq;
    use serde_json::json;

    fn three_step_quest() -> Quest {
        Quest::new("Number Adventure", WorldKey::MathJungle)
            .with_rewards(50, 20)
            .with_step(QuestStep::new(1, StepType::Dialogue, "Meet Professor Hoot"))
            .with_step(
                QuestStep::new(2, StepType::MathPuzzle, "Count the bananas")
                    .with_config(json!({"correct_answer": 8}))
                    .with_hint("Count them one by one")
                    .with_hint("It is more than 7"),
            )
            .with_step(QuestStep::new(3, StepType::Collect, "Grab the treasure"))
    }

    fn ceremony(title: &str) -> RewardCeremony {
        RewardCeremony {
            quest_title: title.to_string(),
            xp_earned: 50,
            coins_earned: 20,
            badges_unlocked: vec![],
            cosmetics_unlocked: vec![],
            new_level: None,
            total_xp: 50,
            total_coins: 20,
        }
    }

    fn quest_repo_with(quest: Quest) -> MockQuestRepo {
        let mut repo = MockQuestRepo::new();
        let quest_id = quest.id;
        repo.expect_get_quest()
            .with(eq(quest_id))
            .returning(move |_| Ok(quest.clone()));
        repo
    }

    fn start_returning(repo: &mut MockProgressRepo, progress: QuestProgress) {
        repo.expect_start_quest()
            .times(1)
            .returning(move |_, _| Ok(progress.clone()));
    }

    fn runner(quest_repo: MockQuestRepo, progress_repo: MockProgressRepo, quest_id: QuestId) -> QuestRunner {
        QuestRunner::new(
            Arc::new(quest_repo),
            Arc::new(progress_repo),
            ChildId::new(),
            quest_id,
        )
    }

    #[tokio::test]
    async fn all_correct_runs_two_updates_and_one_completion() {
        let quest = three_step_quest();
        let quest_id = quest.id;
        let progress = QuestProgress::begin(ChildId::new(), &quest, Utc::now());

        let mut progress_repo = MockProgressRepo::new();
        start_returning(&mut progress_repo, progress.clone());
        let returned = progress.clone();
        progress_repo
            .expect_update_progress()
            .times(2)
            .returning(move |_, _| Ok(returned.clone()));
        let title = quest.title.clone();
        progress_repo
            .expect_complete_quest()
            .with(eq(progress.id()))
            .times(1)
            .returning(move |_| Ok(ceremony(&title)));

        let mut runner = runner(quest_repo_with(quest), progress_repo, quest_id);
        let mut phases = vec![runner.phase()];

        phases.push(runner.load().await);
        for _ in 0..3 {
            runner.submit(true).await;
            phases.push(runner.phase());
        }

        assert_eq!(
            phases,
            vec![
                RunnerPhase::Loading,
                RunnerPhase::Running,
                RunnerPhase::Running,
                RunnerPhase::Running,
                RunnerPhase::Reward,
            ]
        );
        assert_eq!(runner.reward().map(|r| r.xp_earned), Some(50));
        assert_eq!(runner.snapshot().percentage, 100);
    }

    #[tokio::test]
    async fn attempts_and_hints_are_persisted_on_success() {
        let quest = three_step_quest();
        let quest_id = quest.id;
        // Resumed on the math step with 4 attempts already saved
        let progress = QuestProgress::begin(ChildId::new(), &quest, Utc::now()).with_position(1, 4, 0);

        let mut progress_repo = MockProgressRepo::new();
        start_returning(&mut progress_repo, progress.clone());
        let returned = progress.clone();
        progress_repo
            .expect_update_progress()
            .with(
                eq(progress.id()),
                eq(ProgressUpdate {
                    current_step_index: 2,
                    total_attempts: 7,
                    hints_used: 1,
                }),
            )
            .times(1)
            .returning(move |_, _| Ok(returned.clone()));

        let mut runner = runner(quest_repo_with(quest), progress_repo, quest_id);
        runner.load().await;

        assert_eq!(runner.submit(false).await, SubmitOutcome::Incorrect { attempts: 1 });
        assert_eq!(runner.submit(false).await, SubmitOutcome::Incorrect { attempts: 2 });
        assert_eq!(runner.request_hint().as_deref(), Some("Count them one by one"));
        assert_eq!(
            runner.submit_answer(&StepAnswer::Number(8)).await,
            Ok(SubmitOutcome::Advanced { step_index: 2 })
        );

        let snapshot = runner.snapshot();
        assert_eq!(snapshot.attempts, 0);
        assert_eq!(snapshot.hints_used, 0);
    }

    #[tokio::test]
    async fn failed_save_keeps_step_and_counters() {
        let quest = three_step_quest();
        let quest_id = quest.id;
        let progress = QuestProgress::begin(ChildId::new(), &quest, Utc::now()).with_position(1, 0, 0);

        let mut progress_repo = MockProgressRepo::new();
        start_returning(&mut progress_repo, progress.clone());
        progress_repo
            .expect_update_progress()
            .times(1)
            .returning(|_, _| Err(ApiError::network("update_progress", "connection reset")));

        let mut runner = runner(quest_repo_with(quest), progress_repo, quest_id);
        runner.load().await;
        runner.submit(false).await;
        runner.request_hint();

        assert_eq!(runner.submit(true).await, SubmitOutcome::PersistFailed);
        assert_eq!(runner.phase(), RunnerPhase::Running);
        let snapshot = runner.snapshot();
        assert_eq!(snapshot.step_index, 1);
        assert_eq!(snapshot.attempts, 1);
        assert_eq!(snapshot.hints_used, 1);
    }

    #[tokio::test]
    async fn fetch_failure_is_a_content_load_error() {
        let quest_id = QuestId::new();
        let mut quest_repo = MockQuestRepo::new();
        quest_repo
            .expect_get_quest()
            .returning(|id| Err(ApiError::not_found("Quest", id)));
        let mut progress_repo = MockProgressRepo::new();
        progress_repo.expect_start_quest().never();

        let mut runner = runner(quest_repo, progress_repo, quest_id);

        assert_eq!(runner.load().await, RunnerPhase::Error);
        let failure = runner.snapshot().failure.expect("failure");
        assert_eq!(failure.kind, FailureKind::ContentLoad);
        assert_eq!(failure.message, LOAD_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn quest_without_steps_fails_to_load() {
        let quest = Quest::new("Empty", WorldKey::CodeCity);
        let quest_id = quest.id;
        let mut progress_repo = MockProgressRepo::new();
        progress_repo.expect_start_quest().never();

        let mut runner = runner(quest_repo_with(quest), progress_repo, quest_id);
        assert_eq!(runner.load().await, RunnerPhase::Error);
    }

    #[tokio::test]
    async fn completion_failure_does_not_advance() {
        let quest = three_step_quest();
        let quest_id = quest.id;
        let progress = QuestProgress::begin(ChildId::new(), &quest, Utc::now()).with_position(2, 3, 0);

        let mut progress_repo = MockProgressRepo::new();
        start_returning(&mut progress_repo, progress);
        progress_repo.expect_update_progress().never();
        progress_repo
            .expect_complete_quest()
            .times(1)
            .returning(|_| Err(ApiError::http("complete_quest", 500, "boom")));

        let mut runner = runner(quest_repo_with(quest), progress_repo, quest_id);
        runner.load().await;

        assert_eq!(runner.submit(true).await, SubmitOutcome::CompletionFailed);
        let snapshot = runner.snapshot();
        assert_eq!(snapshot.phase, RunnerPhase::Error);
        assert_eq!(snapshot.step_index, 2);
        assert_eq!(snapshot.failure.map(|f| f.message).as_deref(), Some(COMPLETE_FAILED_MESSAGE));
        assert!(runner.reward().is_none());
    }

    #[tokio::test]
    async fn resume_at_end_goes_straight_to_completion() {
        let quest = three_step_quest();
        let quest_id = quest.id;
        let progress = QuestProgress::begin(ChildId::new(), &quest, Utc::now()).with_position(3, 5, 0);

        let mut progress_repo = MockProgressRepo::new();
        start_returning(&mut progress_repo, progress);
        let title = quest.title.clone();
        progress_repo
            .expect_complete_quest()
            .times(1)
            .returning(move |_| Ok(ceremony(&title)));

        let mut runner = runner(quest_repo_with(quest), progress_repo, quest_id);
        assert_eq!(runner.load().await, RunnerPhase::Reward);
    }

    #[tokio::test]
    async fn hints_stop_at_the_end_of_the_list() {
        let quest = three_step_quest();
        let quest_id = quest.id;
        let progress = QuestProgress::begin(ChildId::new(), &quest, Utc::now()).with_position(1, 0, 0);
        let mut progress_repo = MockProgressRepo::new();
        start_returning(&mut progress_repo, progress);

        let mut runner = runner(quest_repo_with(quest), progress_repo, quest_id);
        runner.load().await;

        assert!(runner.request_hint().is_some());
        assert!(runner.request_hint().is_some());
        assert!(runner.request_hint().is_none());
        assert_eq!(runner.revealed_hints().len(), 2);
        assert_eq!(runner.snapshot().hints_available, 2);
    }

    #[tokio::test]
    async fn resumed_hints_continue_the_ladder() {
        let quest = three_step_quest();
        let quest_id = quest.id;
        let progress = QuestProgress::begin(ChildId::new(), &quest, Utc::now()).with_position(1, 2, 1);
        let mut progress_repo = MockProgressRepo::new();
        start_returning(&mut progress_repo, progress);

        let mut runner = runner(quest_repo_with(quest), progress_repo, quest_id);
        runner.load().await;

        assert_eq!(runner.snapshot().hints_used, 1);
        assert_eq!(runner.revealed_hints(), vec!["Count them one by one".to_string()]);
        assert_eq!(runner.request_hint().as_deref(), Some("It is more than 7"));
        assert!(runner.request_hint().is_none());
    }

    #[tokio::test]
    async fn mismatched_answer_counts_nothing() {
        let quest = three_step_quest();
        let quest_id = quest.id;
        let progress = QuestProgress::begin(ChildId::new(), &quest, Utc::now()).with_position(1, 0, 0);
        let mut progress_repo = MockProgressRepo::new();
        start_returning(&mut progress_repo, progress);

        let mut runner = runner(quest_repo_with(quest), progress_repo, quest_id);
        runner.load().await;

        let result = runner.submit_answer(&StepAnswer::Choice("rock".into())).await;
        assert!(result.is_err());
        assert_eq!(runner.snapshot().attempts, 0);
    }

    #[tokio::test]
    async fn reset_allows_a_fresh_load() {
        let quest = three_step_quest();
        let quest_id = quest.id;
        let progress = QuestProgress::begin(ChildId::new(), &quest, Utc::now());

        let mut quest_repo = MockQuestRepo::new();
        let mut seq = mockall::Sequence::new();
        quest_repo
            .expect_get_quest()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(ApiError::network("get_quest", "timed out")));
        quest_repo
            .expect_get_quest()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(quest.clone()));
        let mut progress_repo = MockProgressRepo::new();
        start_returning(&mut progress_repo, progress);

        let mut runner = runner(quest_repo, progress_repo, quest_id);
        assert_eq!(runner.load().await, RunnerPhase::Error);
        // Loading again without a reset is a no-op
        assert_eq!(runner.load().await, RunnerPhase::Error);
        runner.reset();
        assert_eq!(runner.load().await, RunnerPhase::Running);
    }
}
