//! In-process backend with the same rules as the progress/content API.
//!
//! Used by the headless runner and integration tests. Start is idempotent per
//! (child, quest), locks come from prerequisites, completion awards XP, coins and
//! the quest badge once.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use kidquest_domain::{
    Badge, BadgeId, ChildId, ChildProfile, ProgressId, ProgressUpdate, Quest, QuestId,
    QuestProgress, QuestWithProgress, RewardCeremony,
};

use crate::infrastructure::ports::{ApiError, ClockPort, ProfileRepo, ProgressRepo, QuestRepo};

const SEED_JSON: &str = include_str!("fixtures/seed.json");

#[derive(Debug, Deserialize)]
struct SeedData {
    children: Vec<ChildProfile>,
    quests: Vec<Quest>,
}

#[derive(Default)]
struct BackendState {
    children: HashMap<ChildId, ChildProfile>,
    /// Display order
    quests: Vec<Quest>,
    progress: HashMap<ProgressId, QuestProgress>,
    badges: HashMap<ChildId, Vec<BadgeId>>,
}

impl BackendState {
    fn quest(&self, quest_id: QuestId) -> Result<&Quest, ApiError> {
        self.quests
            .iter()
            .find(|q| q.id == quest_id)
            .ok_or_else(|| ApiError::not_found("Quest", quest_id))
    }

    fn progress_for(&self, child_id: ChildId, quest_id: QuestId) -> Option<&QuestProgress> {
        self.progress
            .values()
            .find(|p| p.child_id() == child_id && p.quest_id() == quest_id)
    }

    fn has_completed(&self, child_id: ChildId, quest_id: QuestId) -> bool {
        self.progress_for(child_id, quest_id)
            .is_some_and(QuestProgress::is_complete)
    }
}

pub struct InMemoryBackend {
    state: RwLock<BackendState>,
    clock: Arc<dyn ClockPort>,
    seed_child: Option<ChildId>,
    latency: Duration,
}

impl InMemoryBackend {
    /// Empty backend.
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        Self {
            state: RwLock::new(BackendState::default()),
            clock,
            seed_child: None,
            latency: Duration::ZERO,
        }
    }

    /// Backend loaded with the bundled quests and one starter child.
    pub fn seeded(clock: Arc<dyn ClockPort>) -> Result<Self, ApiError> {
        let seed: SeedData =
            serde_json::from_str(SEED_JSON).map_err(ApiError::serialization)?;

        let mut backend = Self::new(clock);
        backend.seed_child = seed.children.first().map(|c| c.id);
        for child in seed.children {
            backend = backend.with_child(child);
        }
        for quest in seed.quests {
            backend = backend.with_quest(quest);
        }

        tracing::debug!(
            quests = backend.state.get_mut().quests.len(),
            "Seeded in-memory backend"
        );
        Ok(backend)
    }

    pub fn with_child(mut self, child: ChildProfile) -> Self {
        self.state.get_mut().children.insert(child.id, child);
        self
    }

    pub fn with_quest(mut self, quest: Quest) -> Self {
        self.state.get_mut().quests.push(quest);
        self
    }

    /// Delay every call by `latency` (in tokio time).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The starter child from the seed data, if any.
    pub fn seed_child(&self) -> Option<ChildId> {
        self.seed_child
    }

    /// Badges a child holds, in the order earned.
    pub async fn badges_for(&self, child_id: ChildId) -> Vec<BadgeId> {
        self.state
            .read()
            .await
            .badges
            .get(&child_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl QuestRepo for InMemoryBackend {
    async fn get_quest(&self, quest_id: QuestId) -> Result<Quest, ApiError> {
        self.simulate_latency().await;
        let state = self.state.read().await;
        state.quest(quest_id).cloned()
    }

    async fn list_for_child(&self, child_id: ChildId) -> Result<Vec<QuestWithProgress>, ApiError> {
        self.simulate_latency().await;
        let state = self.state.read().await;
        if !state.children.contains_key(&child_id) {
            return Err(ApiError::not_found("Child", child_id));
        }

        Ok(state
            .quests
            .iter()
            .map(|quest| {
                let progress = state.progress_for(child_id, quest.id).cloned();
                let is_completed = progress.as_ref().is_some_and(QuestProgress::is_complete);
                let is_locked = !quest
                    .prerequisites
                    .iter()
                    .all(|pre| state.has_completed(child_id, *pre));
                QuestWithProgress {
                    quest: quest.clone(),
                    progress,
                    is_completed,
                    is_locked,
                }
            })
            .collect())
    }
}

#[async_trait]
impl ProgressRepo for InMemoryBackend {
    async fn start_quest(
        &self,
        child_id: ChildId,
        quest_id: QuestId,
    ) -> Result<QuestProgress, ApiError> {
        self.simulate_latency().await;
        let mut state = self.state.write().await;
        if !state.children.contains_key(&child_id) {
            return Err(ApiError::not_found("Child", child_id));
        }
        if let Some(existing) = state.progress_for(child_id, quest_id) {
            if existing.is_complete() {
                return Err(ApiError::constraint(format!(
                    "quest {} is already completed",
                    quest_id
                )));
            }
            tracing::debug!(progress_id = %existing.id(), "Resuming existing progress");
            return Ok(existing.clone());
        }

        let progress = QuestProgress::begin(child_id, state.quest(quest_id)?, self.clock.now());
        tracing::debug!(progress_id = %progress.id(), quest_id = %quest_id, "Started quest");
        state.progress.insert(progress.id(), progress.clone());
        Ok(progress)
    }

    async fn update_progress(
        &self,
        progress_id: ProgressId,
        update: ProgressUpdate,
    ) -> Result<QuestProgress, ApiError> {
        self.simulate_latency().await;
        let mut state = self.state.write().await;
        let state = &mut *state;
        let progress = state
            .progress
            .get_mut(&progress_id)
            .ok_or_else(|| ApiError::not_found("QuestProgress", progress_id))?;
        let quest = state
            .quests
            .iter()
            .find(|q| q.id == progress.quest_id())
            .ok_or_else(|| ApiError::not_found("Quest", progress.quest_id()))?;

        progress.apply_update(&update, quest, self.clock.now())?;
        Ok(progress.clone())
    }

    async fn complete_quest(&self, progress_id: ProgressId) -> Result<RewardCeremony, ApiError> {
        self.simulate_latency().await;
        let mut state = self.state.write().await;
        let state = &mut *state;
        let progress = state
            .progress
            .get_mut(&progress_id)
            .ok_or_else(|| ApiError::not_found("QuestProgress", progress_id))?;
        let quest = state
            .quests
            .iter()
            .find(|q| q.id == progress.quest_id())
            .ok_or_else(|| ApiError::not_found("Quest", progress.quest_id()))?;
        let child = state
            .children
            .get_mut(&progress.child_id())
            .ok_or_else(|| ApiError::not_found("Child", progress.child_id()))?;

        progress.mark_completed(quest, self.clock.now())?;
        let new_level = child.award(quest.xp_reward, quest.coin_reward);

        let mut badges = Vec::new();
        if let Some(badge_id) = &quest.badge_id {
            state
                .badges
                .entry(child.id)
                .or_default()
                .push(badge_id.clone());
            badges.push(Badge::for_quest(badge_id.clone(), &quest.title, quest.subject));
        }

        tracing::info!(
            child_id = %child.id,
            quest = %quest.title,
            xp = quest.xp_reward,
            coins = quest.coin_reward,
            "Quest completed"
        );

        Ok(RewardCeremony {
            quest_title: quest.title.clone(),
            xp_earned: quest.xp_reward,
            coins_earned: quest.coin_reward,
            badges_unlocked: badges,
            cosmetics_unlocked: Vec::new(),
            new_level,
            total_xp: child.total_xp,
            total_coins: child.coins,
        })
    }
}

#[async_trait]
impl ProfileRepo for InMemoryBackend {
    async fn get_child(&self, child_id: ChildId) -> Result<ChildProfile, ApiError> {
        self.simulate_latency().await;
        self.state
            .read()
            .await
            .children
            .get(&child_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Child", child_id))
    }
}
