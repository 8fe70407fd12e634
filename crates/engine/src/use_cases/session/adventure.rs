//! One child's play session: hub world, active quest and reward reveal.
//!
//! `tick()` is synchronous and never waits on I/O. Backend calls run on tokio
//! tasks that report back over a channel drained at the start of each tick.
//! Quest results carry the epoch they were started in; leaving the quest bumps
//! the epoch, so answers for a torn-down quest are dropped on arrival.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinHandle};

use kidquest_domain::{
    record_completion, ChildId, ChildProfile, DomainError, QuestId, QuestWithProgress, StepAnswer,
};

use crate::infrastructure::ports::{ApiError, ProfileRepo, ProgressRepo, QuestRepo};
use crate::simulation::{event_channel, InputEvent, InputSampler, PortalData, WorldController, WorldEvents, WorldState};
use crate::use_cases::quest::{QuestRunner, RunnerPhase, RunnerSnapshot};
use crate::use_cases::reward::{RevealProgress, RevealTimeline, RewardSequencer};

use super::error::SessionError;
use super::types::{RunnerOutcome, SessionView, SetupData, SetupState, TaskResult, SETUP_FAILED_MESSAGE};

enum RunnerOp {
    Load,
    Submit(bool),
}

struct ActiveQuest {
    quest_id: QuestId,
    /// `None` while the runner is out on a task
    runner: Option<Box<QuestRunner>>,
    snapshot: RunnerSnapshot,
    task: Option<AbortHandle>,
}

pub struct AdventureSession {
    quest_repo: Arc<dyn QuestRepo>,
    progress_repo: Arc<dyn ProgressRepo>,
    profile_repo: Arc<dyn ProfileRepo>,
    child_id: ChildId,
    timeline: RevealTimeline,
    setup: SetupState,
    setup_generation: u64,
    child: Option<Arc<ChildProfile>>,
    quests: Vec<QuestWithProgress>,
    world: WorldController,
    input: InputSampler,
    epoch: u64,
    active: Option<ActiveQuest>,
    reward: Option<RewardSequencer>,
    results_tx: mpsc::UnboundedSender<TaskResult>,
    results_rx: mpsc::UnboundedReceiver<TaskResult>,
    tasks: Vec<JoinHandle<()>>,
    disposed: bool,
}

impl AdventureSession {
    /// Build a session for `child_id`. World events go to the returned receiver.
    pub fn new(
        quest_repo: Arc<dyn QuestRepo>,
        progress_repo: Arc<dyn ProgressRepo>,
        profile_repo: Arc<dyn ProfileRepo>,
        child_id: ChildId,
    ) -> (Self, WorldEvents) {
        let (sink, events) = event_channel();
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let session = Self {
            quest_repo,
            progress_repo,
            profile_repo,
            child_id,
            timeline: RevealTimeline::default(),
            setup: SetupState::Loading,
            setup_generation: 0,
            child: None,
            quests: Vec::new(),
            world: WorldController::new(sink),
            input: InputSampler::new(),
            epoch: 0,
            active: None,
            reward: None,
            results_tx,
            results_rx,
            tasks: Vec::new(),
            disposed: false,
        };
        (session, events)
    }

    pub fn with_timeline(mut self, timeline: RevealTimeline) -> Self {
        self.timeline = timeline;
        self
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Begin loading the profile and quest list. Needs a tokio runtime.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.disposed {
            return Err(SessionError::Disposed);
        }
        self.setup = SetupState::Loading;
        self.setup_generation += 1;
        let generation = self.setup_generation;
        let profile_repo = self.profile_repo.clone();
        let quest_repo = self.quest_repo.clone();
        let child_id = self.child_id;
        let tx = self.results_tx.clone();
        tracing::debug!(child_id = %child_id, generation, "Loading session setup");
        self.spawn(async move {
            let result = load_setup(profile_repo.as_ref(), quest_repo.as_ref(), child_id).await;
            report(&tx, TaskResult::Setup { generation, result });
        });
        Ok(())
    }

    /// Try setup again after it failed.
    pub fn retry_setup(&mut self) -> Result<(), SessionError> {
        match self.setup {
            SetupState::Error(_) => self.start(),
            SetupState::Loading => Err(SessionError::Busy),
            SetupState::Ready => Ok(()),
        }
    }

    /// Leave from the setup error screen.
    pub fn exit(&mut self) {
        self.dispose();
    }

    // =========================================================================
    // Tick
    // =========================================================================

    pub fn push_input(&mut self, event: InputEvent) {
        if !self.disposed {
            self.input.push(event);
        }
    }

    /// Apply finished I/O, then advance the hub by one fixed step.
    pub fn tick(&mut self) {
        if self.disposed {
            return;
        }
        self.apply_results();

        let frame = self.input.sample();
        let Some(child) = self.child.clone() else {
            return;
        };
        let report = self.world.tick(&frame, &child);
        if let Some(portal) = report.confirmed {
            if let Err(e) = self.enter_portal(&portal) {
                tracing::warn!(portal = %portal.name, error = %e, "Portal entry failed");
            }
        }
    }

    /// Wait for every in-flight task and apply the results, including any
    /// follow-up work they trigger.
    pub async fn settle(&mut self) {
        loop {
            let tasks: Vec<_> = self.tasks.drain(..).collect();
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                if let Err(e) = task.await {
                    if e.is_panic() {
                        tracing::error!(error = %e, "Session task panicked");
                    }
                }
            }
            self.apply_results();
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Accept the pending portal prompt.
    ///
    /// Returns the quest that was started, or `None` when nothing was pending or
    /// the portal has nothing left to play.
    pub fn confirm_portal(&mut self) -> Result<Option<QuestId>, SessionError> {
        self.ensure_ready()?;
        match self.world.take_pending_portal() {
            Some(portal) => self.enter_portal(&portal),
            None => Ok(None),
        }
    }

    pub fn cancel_portal(&mut self) -> Result<(), SessionError> {
        self.ensure_ready()?;
        self.world.cancel_pending();
        Ok(())
    }

    /// Start a quest directly, bypassing portals.
    pub fn select_quest(&mut self, quest_id: QuestId) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let listed = self
            .quests
            .iter()
            .find(|q| q.quest.id == quest_id)
            .ok_or_else(|| DomainError::not_found("Quest", quest_id.to_string()))?;
        if !listed.is_available() {
            return Err(DomainError::validation(format!(
                "quest '{}' is not available",
                listed.quest.title
            ))
            .into());
        }
        self.begin(quest_id)
    }

    /// Report a correctness verdict for the current step.
    pub fn submit_result(&mut self, correct: bool) -> Result<(), SessionError> {
        let runner = self.take_running_runner()?;
        self.spawn_runner(runner, RunnerOp::Submit(correct));
        Ok(())
    }

    /// Evaluate a structured answer against the current step, then submit it.
    pub fn submit_answer(&mut self, answer: &StepAnswer) -> Result<(), SessionError> {
        let correct = {
            let runner = self.runner_ref()?;
            let step = runner.current_step().ok_or_else(|| {
                DomainError::invalid_state_transition(format!(
                    "no step to answer while {:?}",
                    runner.phase()
                ))
            })?;
            answer.evaluate(step)?
        };
        self.submit_result(correct)
    }

    pub fn request_hint(&mut self) -> Result<Option<String>, SessionError> {
        self.ensure_ready()?;
        let active = self.active.as_mut().ok_or(SessionError::NoActiveQuest)?;
        let runner = active.runner.as_mut().ok_or(SessionError::Busy)?;
        let hint = runner.request_hint();
        active.snapshot = runner.snapshot();
        Ok(hint)
    }

    /// Reload the quest after a load or completion failure.
    pub fn retry_quest(&mut self) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let active = self.active.as_mut().ok_or(SessionError::NoActiveQuest)?;
        let mut runner = active.runner.take().ok_or(SessionError::Busy)?;
        if runner.phase() != RunnerPhase::Error {
            let phase = runner.phase();
            active.runner = Some(runner);
            return Err(DomainError::invalid_state_transition(format!(
                "retry not allowed while {:?}",
                phase
            ))
            .into());
        }
        tracing::info!(quest_id = %runner.quest_id(), "Retrying quest");
        runner.reset();
        active.snapshot = runner.snapshot();
        self.spawn_runner(runner, RunnerOp::Load);
        Ok(())
    }

    /// Leave the active quest and return to the hub.
    pub fn exit_quest(&mut self) -> Result<(), SessionError> {
        self.ensure_ready()?;
        self.world.exit_quest()?;
        self.drop_active();
        Ok(())
    }

    /// Close the reward screen and return to the hub. Only offered once the
    /// reveal has reached its summary.
    pub fn continue_after_reward(&mut self) -> Result<(), SessionError> {
        self.ensure_ready()?;
        if let Some(reward) = self.reward.as_ref().filter(|r| !r.is_finished()) {
            return Err(DomainError::invalid_state_transition(format!(
                "reward reveal still at {:?}",
                reward.stage()
            ))
            .into());
        }
        self.world.acknowledge_reward()?;
        self.reward = None;
        self.drop_active();
        Ok(())
    }

    /// Stop everything. In-flight work is aborted and late results are ignored.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.drop_active();
        self.reward = None;
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.world.dispose();
        self.input.reset();
        tracing::info!(child_id = %self.child_id, "Session disposed");
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn setup_state(&self) -> &SetupState {
        &self.setup
    }

    pub fn child(&self) -> Option<&Arc<ChildProfile>> {
        self.child.as_ref()
    }

    pub fn quests(&self) -> &[QuestWithProgress] {
        &self.quests
    }

    pub fn world(&self) -> &WorldController {
        &self.world
    }

    pub fn world_state(&self) -> WorldState {
        self.world.state()
    }

    /// Follow the reward reveal stage by stage. `None` outside the reward screen.
    pub fn subscribe_reward(&self) -> Option<watch::Receiver<RevealProgress>> {
        self.reward.as_ref().map(RewardSequencer::subscribe)
    }

    pub fn is_busy(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.runner.is_none())
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            setup: self.setup.clone(),
            child: self.child.as_deref().cloned(),
            world: self.world.snapshot(),
            quest: self.active.as_ref().map(|a| a.snapshot.clone()),
            busy: self.is_busy(),
            reward: self.reward.as_ref().map(RewardSequencer::view),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn ensure_ready(&self) -> Result<(), SessionError> {
        if self.disposed {
            return Err(SessionError::Disposed);
        }
        if self.setup != SetupState::Ready {
            return Err(SessionError::NotReady);
        }
        Ok(())
    }

    fn runner_ref(&self) -> Result<&QuestRunner, SessionError> {
        self.ensure_ready()?;
        let active = self.active.as_ref().ok_or(SessionError::NoActiveQuest)?;
        active.runner.as_deref().ok_or(SessionError::Busy)
    }

    fn take_running_runner(&mut self) -> Result<Box<QuestRunner>, SessionError> {
        self.ensure_ready()?;
        let active = self.active.as_mut().ok_or(SessionError::NoActiveQuest)?;
        let runner = active.runner.take().ok_or(SessionError::Busy)?;
        if runner.phase() != RunnerPhase::Running {
            let phase = runner.phase();
            active.runner = Some(runner);
            return Err(DomainError::invalid_state_transition(format!(
                "cannot submit while {:?}",
                phase
            ))
            .into());
        }
        Ok(runner)
    }

    fn enter_portal(&mut self, portal: &PortalData) -> Result<Option<QuestId>, SessionError> {
        let Some(quest_id) = self.world.resolve_portal_entry(portal, &self.quests) else {
            return Ok(None);
        };
        self.begin(quest_id)?;
        Ok(Some(quest_id))
    }

    fn begin(&mut self, quest_id: QuestId) -> Result<(), SessionError> {
        self.world.begin_quest(quest_id)?;
        self.epoch += 1;
        let runner = Box::new(QuestRunner::new(
            self.quest_repo.clone(),
            self.progress_repo.clone(),
            self.child_id,
            quest_id,
        ));
        tracing::info!(quest_id = %quest_id, epoch = self.epoch, "Quest started");
        self.active = Some(ActiveQuest {
            quest_id,
            runner: None,
            snapshot: runner.snapshot(),
            task: None,
        });
        self.spawn_runner(runner, RunnerOp::Load);
        Ok(())
    }

    fn spawn_runner(&mut self, mut runner: Box<QuestRunner>, op: RunnerOp) {
        let epoch = self.epoch;
        let tx = self.results_tx.clone();
        let abort = self.spawn(async move {
            let outcome = match op {
                RunnerOp::Load => {
                    runner.load().await;
                    RunnerOutcome::Loaded
                }
                RunnerOp::Submit(correct) => RunnerOutcome::Submitted(runner.submit(correct).await),
            };
            report(&tx, TaskResult::Runner { epoch, runner, outcome });
        });
        if let Some(active) = self.active.as_mut() {
            active.task = Some(abort);
        }
    }

    fn spawn_refresh(&mut self) {
        let profile_repo = self.profile_repo.clone();
        let quest_repo = self.quest_repo.clone();
        let child_id = self.child_id;
        let tx = self.results_tx.clone();
        self.spawn(async move {
            let result = load_setup(profile_repo.as_ref(), quest_repo.as_ref(), child_id).await;
            report(&tx, TaskResult::Refresh(result));
        });
    }

    fn spawn<F>(&mut self, future: F) -> AbortHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        let abort = handle.abort_handle();
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(handle);
        abort
    }

    /// Bump the epoch and forget the active quest.
    fn drop_active(&mut self) {
        self.epoch += 1;
        if let Some(active) = self.active.take() {
            if let Some(task) = active.task {
                task.abort();
            }
            tracing::debug!(quest_id = %active.quest_id, epoch = self.epoch, "Quest torn down");
        }
    }

    fn apply_results(&mut self) {
        while let Ok(result) = self.results_rx.try_recv() {
            self.apply(result);
        }
    }

    fn apply(&mut self, result: TaskResult) {
        if self.disposed {
            return;
        }
        match result {
            TaskResult::Setup { generation, result } => {
                if generation != self.setup_generation {
                    return;
                }
                match result {
                    Ok((child, quests)) => {
                        tracing::info!(
                            child = %child.username,
                            quests = quests.len(),
                            "Session ready"
                        );
                        self.child = Some(Arc::new(child));
                        self.quests = quests;
                        self.setup = SetupState::Ready;
                    }
                    Err(e) => {
                        tracing::warn!(child_id = %self.child_id, error = %e, "Session setup failed");
                        self.setup = SetupState::Error(SETUP_FAILED_MESSAGE.to_string());
                    }
                }
            }
            TaskResult::Refresh(result) => match result {
                Ok((child, quests)) => {
                    self.child = Some(Arc::new(child));
                    self.quests = quests;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to refresh profile after completion");
                }
            },
            TaskResult::Runner { epoch, runner, outcome } => {
                if epoch != self.epoch {
                    tracing::debug!(epoch, current = self.epoch, "Dropping stale quest result");
                    return;
                }
                self.apply_runner(runner, outcome);
            }
        }
    }

    fn apply_runner(&mut self, runner: Box<QuestRunner>, outcome: RunnerOutcome) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let quest_id = active.quest_id;
        active.task = None;
        active.snapshot = runner.snapshot();
        tracing::debug!(
            quest_id = %active.quest_id,
            phase = ?runner.phase(),
            outcome = ?outcome,
            "Quest operation finished"
        );

        let ceremony = runner.reward().cloned();
        active.runner = Some(runner);

        let Some(ceremony) = ceremony else {
            return;
        };
        if self.reward.is_some() {
            return;
        }
        if let Err(e) = self.world.complete_quest() {
            tracing::warn!(error = %e, "World refused quest completion");
        }
        // The listing must not offer the quest again, even if the refresh fails
        if !record_completion(&mut self.quests, quest_id) {
            tracing::warn!(quest_id = %quest_id, "Completed quest missing from listing");
        }
        self.reward = Some(RewardSequencer::start(ceremony, self.timeline));
        self.spawn_refresh();
    }
}

impl Drop for AdventureSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn load_setup(
    profile_repo: &dyn ProfileRepo,
    quest_repo: &dyn QuestRepo,
    child_id: ChildId,
) -> Result<SetupData, ApiError> {
    futures_util::future::try_join(
        profile_repo.get_child(child_id),
        quest_repo.list_for_child(child_id),
    )
    .await
}

fn report(tx: &mpsc::UnboundedSender<TaskResult>, result: TaskResult) {
    if tx.send(result).is_err() {
        tracing::trace!("Session gone, dropping task result");
    }
}
