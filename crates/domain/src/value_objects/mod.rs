//! Value objects - Immutable objects defined by their attributes

mod step_answer;

// Step answers and their evaluation
pub use step_answer::{CodeBlock, StepAnswer};
