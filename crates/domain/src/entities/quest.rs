//! Quest content - authored, ordered learning steps inside one world
//!
//! Quests are read-only to the engine. Availability (completed / locked) is
//! computed by the backend per child and delivered as [`QuestWithProgress`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entities::QuestProgress;
use crate::error::DomainError;
use crate::{BadgeId, QuestId, StepId};

/// The hub worlds a portal can lead to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldKey {
    MathJungle,
    CodeCity,
    ScienceSpaceport,
}

impl WorldKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MathJungle => "math_jungle",
            Self::CodeCity => "code_city",
            Self::ScienceSpaceport => "science_spaceport",
        }
    }

    /// The subject each world teaches.
    pub fn subject(&self) -> Subject {
        match self {
            Self::MathJungle => Subject::Math,
            Self::CodeCity => Subject::Coding,
            Self::ScienceSpaceport => Subject::Science,
        }
    }
}

impl fmt::Display for WorldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorldKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "math_jungle" => Ok(Self::MathJungle),
            "code_city" => Ok(Self::CodeCity),
            "science_spaceport" => Ok(Self::ScienceSpaceport),
            _ => Err(DomainError::parse(format!("Unknown world key: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Math,
    Coding,
    Science,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Math => "math",
            Self::Coding => "coding",
            Self::Science => "science",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

/// Kind of interaction a step asks for. Decides how answers are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    MathPuzzle,
    CodePuzzle,
    ScienceSim,
    Dialogue,
    Collect,
}

impl StepType {
    /// Steps that are acknowledged rather than answered.
    pub fn is_narrative(&self) -> bool {
        matches!(self, Self::Dialogue | Self::Collect)
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MathPuzzle => "math_puzzle",
            Self::CodePuzzle => "code_puzzle",
            Self::ScienceSim => "science_sim",
            Self::Dialogue => "dialogue",
            Self::Collect => "collect",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestStep {
    pub id: StepId,
    pub step_order: u32,
    pub step_type: StepType,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Step-type specific payload (`correct_answer`, `solution`, `options`, ...)
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub xp_reward: u32,
}

impl QuestStep {
    pub fn new(step_order: u32, step_type: StepType, title: impl Into<String>) -> Self {
        Self {
            id: StepId::new(),
            step_order,
            step_type,
            title: title.into(),
            description: String::new(),
            config: serde_json::Value::Null,
            hints: Vec::new(),
            xp_reward: 0,
        }
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub world: WorldKey,
    pub subject: Subject,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub estimated_minutes: u32,
    pub xp_reward: u32,
    pub coin_reward: u32,
    #[serde(default)]
    pub badge_id: Option<BadgeId>,
    #[serde(default)]
    pub prerequisites: Vec<QuestId>,
    /// Ordered by `step_order`
    #[serde(default)]
    pub steps: Vec<QuestStep>,
}

impl Quest {
    pub fn new(title: impl Into<String>, world: WorldKey) -> Self {
        Self {
            id: QuestId::new(),
            title: title.into(),
            description: String::new(),
            world,
            subject: world.subject(),
            difficulty: Difficulty::default(),
            estimated_minutes: 0,
            xp_reward: 0,
            coin_reward: 0,
            badge_id: None,
            prerequisites: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn with_rewards(mut self, xp: u32, coins: u32) -> Self {
        self.xp_reward = xp;
        self.coin_reward = coins;
        self
    }

    pub fn with_badge(mut self, badge_id: impl Into<BadgeId>) -> Self {
        self.badge_id = Some(badge_id.into());
        self
    }

    pub fn with_prerequisite(mut self, quest_id: QuestId) -> Self {
        self.prerequisites.push(quest_id);
        self
    }

    pub fn with_step(mut self, step: QuestStep) -> Self {
        self.steps.push(step);
        self.steps.sort_by_key(|s| s.step_order);
        self
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step(&self, index: usize) -> Option<&QuestStep> {
        self.steps.get(index)
    }

    /// Whether `index` names the last step.
    pub fn is_final_step(&self, index: usize) -> bool {
        index + 1 == self.steps.len()
    }

    /// Quests must have at least one step to be playable.
    pub fn ensure_playable(&self) -> Result<(), DomainError> {
        if self.steps.is_empty() {
            return Err(DomainError::validation(format!(
                "quest '{}' has no steps",
                self.title
            )));
        }
        Ok(())
    }
}

/// A quest as listed for one child: content plus that child's standing on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestWithProgress {
    #[serde(flatten)]
    pub quest: Quest,
    #[serde(default)]
    pub progress: Option<QuestProgress>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_locked: bool,
}

impl QuestWithProgress {
    /// Playable from a portal: neither finished nor gated behind prerequisites.
    pub fn is_available(&self) -> bool {
        !self.is_completed && !self.is_locked
    }
}

/// Mark `quest_id` completed in a child's listing and recompute which quests
/// are locked. Returns false when the quest is not listed.
pub fn record_completion(quests: &mut [QuestWithProgress], quest_id: QuestId) -> bool {
    let Some(listed) = quests.iter_mut().find(|q| q.quest.id == quest_id) else {
        return false;
    };
    listed.is_completed = true;

    let completed: Vec<QuestId> = quests
        .iter()
        .filter(|q| q.is_completed)
        .map(|q| q.quest.id)
        .collect();
    for listed in quests.iter_mut() {
        listed.is_locked = !listed
            .quest
            .prerequisites
            .iter()
            .all(|pre| completed.contains(pre));
    }
    true
}

/// First available quest for a world, in list order.
pub fn first_available_for_world(
    quests: &[QuestWithProgress],
    world: WorldKey,
) -> Option<&QuestWithProgress> {
    quests
        .iter()
        .find(|q| q.quest.world == world && q.is_available())
}
