use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CaseResult, SessionKind, Verdict};

const MAX_NOTES_LEN: usize = 5000;
const MAX_LABEL_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

/// Counters written at completion. Not live while the session is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SessionAggregates {
    pub total_cases: u32,
    pub passed_cases: u32,
    pub failed_cases: u32,
    pub total_steps: u32,
    pub passed_steps: u32,
    pub failed_steps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionSession {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: SessionKind,
    /// Scenario (test run) or suite (validation) being executed.
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub status: SessionStatus,
    #[serde(default)]
    pub result: Verdict,
    #[serde(default)]
    pub cases: Vec<CaseResult>,
    #[serde(default)]
    pub aggregates: SessionAggregates,
    #[serde(default)]
    pub build_number: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub execution_notes: Option<String>,
    #[serde(default)]
    pub execution_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub execution_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_ms: Option<i64>,
}

impl ExecutionSession {
    pub fn new(name: impl Into<String>, kind: SessionKind) -> Self {
        let prefix = match kind {
            SessionKind::TestRun => "run",
            SessionKind::ValidationSession => "validation",
        };
        Self {
            id: format!("{}-{}", prefix, Utc::now().format("%Y%m%d-%H%M%S")),
            name: name.into(),
            kind,
            target: None,
            operator: None,
            status: SessionStatus::NotStarted,
            result: Verdict::NotExecuted,
            cases: Vec::new(),
            aggregates: SessionAggregates::default(),
            build_number: None,
            environment: None,
            execution_notes: None,
            execution_start: None,
            execution_end: None,
            duration_ms: None,
        }
    }

    #[allow(dead_code)]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[allow(dead_code)]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    #[allow(dead_code)]
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    #[allow(dead_code)]
    pub fn with_case(mut self, case: CaseResult) -> Self {
        self.cases.push(case);
        self
    }

    pub fn step_count(&self) -> usize {
        self.cases.iter().map(|c| c.steps.len()).sum()
    }

    pub fn resolved_step_count(&self) -> usize {
        self.cases
            .iter()
            .flat_map(|c| c.steps.iter())
            .filter(|s| s.verdict.is_resolved())
            .count()
    }

    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    /// Moves NOT STARTED to IN PROGRESS and stamps the start time once.
    pub fn mark_started(&mut self) {
        if self.status == SessionStatus::NotStarted {
            self.status = SessionStatus::InProgress;
        }
        if self.execution_start.is_none() {
            self.execution_start = Some(Utc::now());
        }
    }

    /// Stores the rollup and marks the session completed. The end time is
    /// stamped on the first completion only.
    pub fn apply_completion(&mut self, aggregates: SessionAggregates, overall: Verdict) {
        let end = *self.execution_end.get_or_insert_with(Utc::now);
        self.duration_ms = self
            .execution_start
            .map(|start| (end - start).num_milliseconds());
        self.aggregates = aggregates;
        self.result = overall;
        self.status = SessionStatus::Completed;
    }

    /// Percentage of steps passed, from the stored aggregates.
    pub fn pass_rate(&self) -> f64 {
        rate(self.aggregates.passed_steps, self.aggregates.total_steps)
    }

    pub fn failure_rate(&self) -> f64 {
        rate(self.aggregates.failed_steps, self.aggregates.total_steps)
    }

    /// Status badge text: NOT STARTED / IN PROGRESS, or the overall verdict once completed.
    pub fn badge(&self) -> String {
        match self.status {
            SessionStatus::NotStarted => "NOT STARTED".to_string(),
            SessionStatus::InProgress => "IN PROGRESS".to_string(),
            SessionStatus::Completed => self.result.label().to_string(),
        }
    }

    /// Returns Ok(()) if valid, or Err with a list of validation error messages.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Name is required".to_string());
        }
        if self
            .execution_notes
            .as_ref()
            .is_some_and(|n| n.chars().count() > MAX_NOTES_LEN)
        {
            errors.push(format!(
                "Execution Notes cannot exceed {} characters",
                MAX_NOTES_LEN
            ));
        }
        if self
            .build_number
            .as_ref()
            .is_some_and(|b| b.chars().count() > MAX_LABEL_LEN)
        {
            errors.push(format!(
                "Build Number cannot exceed {} characters",
                MAX_LABEL_LEN
            ));
        }
        if self
            .environment
            .as_ref()
            .is_some_and(|e| e.chars().count() > MAX_LABEL_LEN)
        {
            errors.push(format!(
                "Environment cannot exceed {} characters",
                MAX_LABEL_LEN
            ));
        }
        if let (Some(start), Some(end)) = (self.execution_start, self.execution_end) {
            if end < start {
                errors.push("Execution End cannot be before Execution Start".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn rate(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(part) * 100.0 / f64::from(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StepResult;

    fn two_step_session() -> ExecutionSession {
        ExecutionSession::new("Nightly", SessionKind::TestRun).with_case(
            CaseResult::new("Login", Some(1))
                .with_step(StepResult::new(Some(1), "open"))
                .with_step(StepResult::new(Some(2), "submit")),
        )
    }

    #[test]
    fn new_session_is_not_started() {
        let session = ExecutionSession::new("Nightly", SessionKind::ValidationSession);

        assert!(session.id.starts_with("validation-"));
        assert_eq!(session.status, SessionStatus::NotStarted);
        assert_eq!(session.result, Verdict::NotExecuted);
        assert_eq!(session.badge(), "NOT STARTED");
    }

    #[test]
    fn mark_started_only_stamps_once() {
        let mut session = two_step_session();
        session.mark_started();
        let first = session.execution_start;
        session.mark_started();

        assert_eq!(session.status, SessionStatus::InProgress);
        assert_eq!(session.execution_start, first);
        assert_eq!(session.badge(), "IN PROGRESS");
    }

    #[test]
    fn apply_completion_sets_terminal_state() {
        let mut session = two_step_session();
        session.mark_started();
        let aggregates = SessionAggregates {
            total_cases: 1,
            passed_cases: 1,
            failed_cases: 0,
            total_steps: 2,
            passed_steps: 2,
            failed_steps: 0,
        };
        session.apply_completion(aggregates, Verdict::Passed);

        assert!(session.is_completed());
        assert_eq!(session.badge(), "PASSED");
        assert!(session.duration_ms.is_some_and(|d| d >= 0));
        assert_eq!(session.pass_rate(), 100.0);
        assert_eq!(session.failure_rate(), 0.0);
    }

    #[test]
    fn repeated_completion_keeps_first_end_time() {
        let mut session = two_step_session();
        session.mark_started();
        session.apply_completion(SessionAggregates::default(), Verdict::Skipped);
        let end = session.execution_end;
        let duration = session.duration_ms;

        session.apply_completion(SessionAggregates::default(), Verdict::Skipped);

        assert_eq!(session.execution_end, end);
        assert_eq!(session.duration_ms, duration);
    }

    #[test]
    fn rates_are_zero_without_steps() {
        let session = ExecutionSession::new("Empty", SessionKind::TestRun);
        assert_eq!(session.pass_rate(), 0.0);
        assert_eq!(session.failure_rate(), 0.0);
    }

    #[test]
    fn step_counts_cover_all_cases() {
        let mut session = two_step_session()
            .with_case(CaseResult::new("Logout", Some(2)).with_step(StepResult::new(Some(1), "x")));
        session.cases[0].steps[0].verdict = Verdict::Passed;

        assert_eq!(session.step_count(), 3);
        assert_eq!(session.resolved_step_count(), 1);
    }

    #[test]
    fn validate_rejects_blank_name() {
        let session = ExecutionSession::new("   ", SessionKind::TestRun);
        let errors = session.validate().unwrap_err();
        assert_eq!(errors, vec!["Name is required".to_string()]);
    }

    #[test]
    fn validate_collects_multiple_errors() {
        let mut session = ExecutionSession::new("Nightly", SessionKind::TestRun);
        session.build_number = Some("b".repeat(101));
        session.environment = Some("e".repeat(101));
        session.execution_notes = Some("n".repeat(5001));
        session.execution_start = Some(Utc::now());
        session.execution_end = session
            .execution_start
            .map(|s| s - chrono::Duration::seconds(5));

        let errors = session.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.contains("Execution End")));
    }

    #[test]
    fn session_deserializes_from_yaml() {
        let yaml = r#"
id: "run-001"
name: "Release smoke"
kind: test_run
target: "Checkout flow"
cases:
  - name: "Add to cart"
    execution_order: 1
    steps:
      - ordinal: 1
        action: "Open product"
        expected_result: "Product page visible"
      - ordinal: 2
        action: "Click add"
"#;
        let session: ExecutionSession = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(session.id, "run-001");
        assert_eq!(session.status, SessionStatus::NotStarted);
        assert_eq!(session.cases[0].steps.len(), 2);
        assert_eq!(session.aggregates, SessionAggregates::default());
        assert!(session.validate().is_ok());
    }
}
