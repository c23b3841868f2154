//! Plan generation and structured extraction

pub mod compiler;
pub mod step;

pub use compiler::{CompiledPlan, PlanCompiler};
pub use step::PlanStep;
