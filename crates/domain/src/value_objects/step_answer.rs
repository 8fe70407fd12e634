//! Answers a child submits for a quest step, and how they are checked
//!
//! Each step type carries its answer key in `QuestStep::config`:
//! - `math_puzzle`: `{"correct_answer": 8, "puzzle_type": "counting"}`, or a
//!   string key such as `"1/2"` for fractions
//! - `code_puzzle`: `{"solution": ["move_forward", "turn_left", ...]}`
//! - `science_sim`: `{"correct_answer": "rock", "options": [...]}`
//! - `dialogue` / `collect`: no key, acknowledging completes the step

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entities::{QuestStep, StepType};
use crate::error::DomainError;

/// One instruction in a code puzzle program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeBlock {
    MoveForward,
    TurnLeft,
    TurnRight,
}

impl fmt::Display for CodeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MoveForward => "move_forward",
            Self::TurnLeft => "turn_left",
            Self::TurnRight => "turn_right",
        })
    }
}

impl FromStr for CodeBlock {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "move_forward" => Ok(Self::MoveForward),
            "turn_left" => Ok(Self::TurnLeft),
            "turn_right" => Ok(Self::TurnRight),
            _ => Err(DomainError::parse(format!("Unknown code block: {}", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StepAnswer {
    Number(i64),
    Sequence(Vec<CodeBlock>),
    Choice(String),
    Acknowledge,
}

impl StepAnswer {
    /// Check the answer against the step's answer key.
    ///
    /// A wrong answer is `Ok(false)`. An answer of the wrong kind for the step,
    /// or a step whose config lacks its key, is an error.
    pub fn evaluate(&self, step: &QuestStep) -> Result<bool, DomainError> {
        match (step.step_type, self) {
            (StepType::Dialogue | StepType::Collect, _) => Ok(true),
            (StepType::MathPuzzle, Self::Number(n)) => math_matches(step, &n.to_string()),
            (StepType::MathPuzzle, Self::Choice(text)) => math_matches(step, text.trim()),
            (StepType::CodePuzzle, Self::Sequence(given)) => {
                let solution = step
                    .config
                    .get("solution")
                    .and_then(serde_json::Value::as_array)
                    .ok_or_else(|| missing_key(step, "solution"))?;
                let expected = solution
                    .iter()
                    .map(|v| {
                        v.as_str()
                            .ok_or_else(|| missing_key(step, "solution"))
                            .and_then(CodeBlock::from_str)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(*given == expected)
            }
            (StepType::ScienceSim, Self::Choice(given)) => {
                let expected = step
                    .config
                    .get("correct_answer")
                    .and_then(serde_json::Value::as_str)
                    .ok_or_else(|| missing_key(step, "correct_answer"))?;
                Ok(given == expected)
            }
            (step_type, answer) => Err(DomainError::validation(format!(
                "{} answer does not fit a {} step",
                answer.kind(),
                step_type
            ))),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Sequence(_) => "sequence",
            Self::Choice(_) => "choice",
            Self::Acknowledge => "acknowledge",
        }
    }
}

/// Integer keys and fraction strings both compare on their text form.
fn math_matches(step: &QuestStep, given: &str) -> Result<bool, DomainError> {
    match step.config.get("correct_answer") {
        Some(serde_json::Value::Number(n)) => Ok(n.to_string() == given),
        Some(serde_json::Value::String(s)) => Ok(s.trim() == given),
        _ => Err(missing_key(step, "correct_answer")),
    }
}

fn missing_key(step: &QuestStep, key: &str) -> DomainError {
    DomainError::validation(format!(
        "step '{}' ({}) config has no usable '{}'",
        step.title, step.step_type, key
    ))
}
