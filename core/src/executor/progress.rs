//! Execution progress bookkeeping
//!
//! Single-writer state: only the executor mutates it, between ticks it is
//! safe to read. Counters never decrease and `current_step` never exceeds
//! `total_steps`.

use crate::executor::report::ExecutionReport;
use crate::plan::PlanStep;

/// Callback invoked as execution advances: message, current step, total
pub type ProgressObserver = dyn Fn(&str, usize, usize) + Send + Sync;

/// Mutable state of a plan run
pub struct ProgressState {
    steps: Vec<PlanStep>,
    reports: Vec<ExecutionReport>,
    current_step: usize,
    completed_steps: usize,
}

impl ProgressState {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self {
            reports: Vec::with_capacity(steps.len()),
            steps,
            current_step: 0,
            completed_steps: 0,
        }
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    /// Index of the next step to run
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Number of steps that have finished, successfully or not
    pub fn completed_steps(&self) -> usize {
        self.completed_steps
    }

    pub fn is_finished(&self) -> bool {
        self.current_step >= self.steps.len()
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&PlanStep> {
        self.steps.get(index)
    }

    /// Replace a step in place, keeping its position in the sequence.
    ///
    /// Used when a step is adjusted during execution; the replacement
    /// carries the same identity with new content.
    pub fn replace_step(&mut self, index: usize, step: PlanStep) {
        if let Some(slot) = self.steps.get_mut(index) {
            *slot = step;
        }
    }

    /// Finalized reports in execution order
    pub fn reports(&self) -> &[ExecutionReport] {
        &self.reports
    }

    /// Record the report for the step at `index` and advance the counters.
    ///
    /// Re-recording the current step overwrites its slot instead of
    /// appending a duplicate.
    pub fn finalize_step(&mut self, index: usize, report: ExecutionReport) {
        if index < self.reports.len() {
            self.reports[index] = report;
        } else {
            self.reports.push(report);
        }
        if index >= self.current_step {
            self.current_step = index + 1;
            self.completed_steps += 1;
        }
    }
}
