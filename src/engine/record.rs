//! Capability traits the engine is generic over.
//!
//! Ownership is strictly top-down: a session owns ordered cases, a case owns
//! ordered steps. Steps never point back at their case; the sequencer maps a
//! flat index back to its owning case instead.

use crate::models::{
    CaseResult, ExecutionSession, SessionAggregates, SessionKind, SessionStatus, StepResult,
    Verdict,
};

pub trait StepRecord {
    fn ordinal(&self) -> Option<u32>;
    fn verdict(&self) -> Verdict;
    fn set_verdict(&mut self, verdict: Verdict);
    fn actual_result(&self) -> &str;
    fn set_actual_result(&mut self, text: String);
    fn notes(&self) -> &str;
    fn set_notes(&mut self, text: String);
    fn action(&self) -> &str;
    fn expected_result(&self) -> &str;
}

pub trait CaseRecord {
    type Step: StepRecord;

    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn execution_order(&self) -> Option<u32>;
    fn steps(&self) -> &[Self::Step];
    fn steps_mut(&mut self) -> &mut [Self::Step];
    fn set_rollup(&mut self, verdict: Verdict);
}

pub trait SessionRecord {
    type Case: CaseRecord;

    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn kind(&self) -> SessionKind;
    fn target_name(&self) -> Option<&str>;
    fn operator(&self) -> Option<&str>;
    fn status(&self) -> SessionStatus;
    fn overall(&self) -> Verdict;
    fn cases(&self) -> &[Self::Case];
    fn cases_mut(&mut self) -> &mut [Self::Case];
    fn mark_started(&mut self);
    fn apply_completion(&mut self, aggregates: SessionAggregates, overall: Verdict);
}

/// Step type owned by a session's cases.
pub type StepOf<S> = <<S as SessionRecord>::Case as CaseRecord>::Step;

impl StepRecord for StepResult {
    fn ordinal(&self) -> Option<u32> {
        StepResult::ordinal(self)
    }

    fn verdict(&self) -> Verdict {
        self.verdict
    }

    fn set_verdict(&mut self, verdict: Verdict) {
        self.verdict = verdict;
    }

    fn actual_result(&self) -> &str {
        &self.actual_result
    }

    fn set_actual_result(&mut self, text: String) {
        self.actual_result = text;
    }

    fn notes(&self) -> &str {
        &self.notes
    }

    fn set_notes(&mut self, text: String) {
        self.notes = text;
    }

    fn action(&self) -> &str {
        &self.action
    }

    fn expected_result(&self) -> &str {
        &self.expected_result
    }
}

impl CaseRecord for CaseResult {
    type Step = StepResult;

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn execution_order(&self) -> Option<u32> {
        self.execution_order
    }

    fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    fn steps_mut(&mut self) -> &mut [StepResult] {
        &mut self.steps
    }

    fn set_rollup(&mut self, verdict: Verdict) {
        self.result = Some(verdict);
    }
}

impl SessionRecord for ExecutionSession {
    type Case = CaseResult;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SessionKind {
        self.kind
    }

    fn target_name(&self) -> Option<&str> {
        self.target.as_deref()
    }

    fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    fn status(&self) -> SessionStatus {
        self.status
    }

    fn overall(&self) -> Verdict {
        self.result
    }

    fn cases(&self) -> &[CaseResult] {
        &self.cases
    }

    fn cases_mut(&mut self) -> &mut [CaseResult] {
        &mut self.cases
    }

    fn mark_started(&mut self) {
        ExecutionSession::mark_started(self)
    }

    fn apply_completion(&mut self, aggregates: SessionAggregates, overall: Verdict) {
        ExecutionSession::apply_completion(self, aggregates, overall)
    }
}
