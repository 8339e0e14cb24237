use tracing::debug;

use super::record::{CaseRecord, SessionRecord, StepRecord};
use super::EngineError;
use crate::models::{SessionAggregates, SessionKind, Verdict};

/// Rolls child verdicts up into one.
///
/// PASSED only when every child passed; otherwise FAILED > BLOCKED > SKIPPED
/// (all skipped) > PARTIAL. `None` when there is nothing to roll up.
pub fn rollup<I>(verdicts: I) -> Option<Verdict>
where
    I: IntoIterator<Item = Verdict>,
{
    let verdicts: Vec<Verdict> = verdicts.into_iter().collect();
    if verdicts.is_empty() {
        return None;
    }

    let rolled = if verdicts.iter().all(|v| *v == Verdict::Passed) {
        Verdict::Passed
    } else if verdicts.contains(&Verdict::Failed) {
        Verdict::Failed
    } else if verdicts.contains(&Verdict::Blocked) {
        Verdict::Blocked
    } else if verdicts.iter().all(|v| *v == Verdict::Skipped) {
        Verdict::Skipped
    } else {
        Verdict::Partial
    };
    Some(rolled)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseOutcome {
    pub name: String,
    pub verdict: Verdict,
}

/// Result of a completion pass, as shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSummary {
    pub session_name: String,
    pub kind: SessionKind,
    pub aggregates: SessionAggregates,
    pub overall: Verdict,
    pub cases: Vec<CaseOutcome>,
}

impl CompletionSummary {
    pub fn render(&self) -> String {
        let a = &self.aggregates;
        format!(
            "{} Complete!\n\n\
             Total Cases: {}\nPassed: {}\nFailed: {}\n\n\
             Total Steps: {}\nPassed: {}\nFailed: {}\n\n\
             Overall Result: {}",
            self.kind.execution_title(),
            a.total_cases,
            a.passed_cases,
            a.failed_cases,
            a.total_steps,
            a.passed_steps,
            a.failed_steps,
            self.overall
        )
    }
}

/// Checks that a session may be completed: it has steps and none is NOT_EXECUTED.
pub fn check_completable<S: SessionRecord>(session: &S) -> Result<(), EngineError> {
    let mut total = 0usize;
    let mut remaining = 0usize;
    for case in session.cases() {
        for step in case.steps() {
            total += 1;
            if !step.verdict().is_resolved() {
                remaining += 1;
            }
        }
    }

    if total == 0 {
        return Err(EngineError::EmptySession);
    }
    if remaining > 0 {
        return Err(EngineError::UnresolvedSteps { remaining });
    }
    Ok(())
}

/// Computes case rollups, counters and the overall verdict without touching the session.
pub fn compute<S: SessionRecord>(session: &S) -> Result<CompletionSummary, EngineError> {
    check_completable(session)?;

    let mut aggregates = SessionAggregates::default();
    let mut cases = Vec::with_capacity(session.cases().len());

    for case in session.cases() {
        let step_verdicts: Vec<Verdict> = case.steps().iter().map(|s| s.verdict()).collect();

        aggregates.total_steps += step_verdicts.len() as u32;
        aggregates.passed_steps += step_verdicts
            .iter()
            .filter(|v| **v == Verdict::Passed)
            .count() as u32;
        aggregates.failed_steps += step_verdicts
            .iter()
            .filter(|v| **v == Verdict::Failed)
            .count() as u32;

        // A case without steps has nothing to pass or fail.
        let verdict = rollup(step_verdicts).unwrap_or(Verdict::Skipped);
        aggregates.total_cases += 1;
        match verdict {
            Verdict::Passed => aggregates.passed_cases += 1,
            Verdict::Failed => aggregates.failed_cases += 1,
            _ => {}
        }
        cases.push(CaseOutcome {
            name: case.name().to_string(),
            verdict,
        });
    }

    let overall = rollup(cases.iter().map(|c| c.verdict)).unwrap_or(Verdict::Skipped);

    Ok(CompletionSummary {
        session_name: session.name().to_string(),
        kind: session.kind(),
        aggregates,
        overall,
        cases,
    })
}

/// Recomputes everything from the step verdicts and writes it onto the session.
pub fn finalize<S: SessionRecord>(session: &mut S) -> Result<CompletionSummary, EngineError> {
    let summary = compute(session)?;

    for (case, outcome) in session.cases_mut().iter_mut().zip(&summary.cases) {
        case.set_rollup(outcome.verdict);
    }
    session.apply_completion(summary.aggregates, summary.overall);

    let a = &summary.aggregates;
    debug!(
        "Session statistics - Cases: {}/{}/{}, Steps: {}/{}/{}",
        a.total_cases, a.passed_cases, a.failed_cases, a.total_steps, a.passed_steps, a.failed_steps
    );
    debug!("Session overall result: {}", summary.overall);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CaseResult, ExecutionSession, SessionStatus, StepResult};

    fn case_with(name: &str, order: u32, verdicts: &[Verdict]) -> CaseResult {
        let mut case = CaseResult::new(name, Some(order));
        for (i, v) in verdicts.iter().enumerate() {
            let mut step = StepResult::new(Some(i as u32 + 1), format!("{}-{}", name, i));
            step.verdict = *v;
            case.steps.push(step);
        }
        case
    }

    fn session_with(cases: Vec<CaseResult>) -> ExecutionSession {
        let mut session = ExecutionSession::new("Release", SessionKind::ValidationSession);
        session.cases = cases;
        session
    }

    #[test]
    fn rollup_of_nothing_is_none() {
        assert_eq!(rollup(Vec::new()), None);
    }

    #[test]
    fn rollup_follows_precedence() {
        use Verdict::*;
        assert_eq!(rollup([Passed, Passed]), Some(Passed));
        assert_eq!(rollup([Passed, Blocked, Failed, Skipped]), Some(Failed));
        assert_eq!(rollup([Passed, Blocked, Skipped]), Some(Blocked));
        assert_eq!(rollup([Skipped, Skipped]), Some(Skipped));
        assert_eq!(rollup([Passed, Skipped]), Some(Partial));
        assert_eq!(rollup([Passed, Partial]), Some(Partial));
    }

    #[test]
    fn all_passed_completes_as_passed() {
        use Verdict::*;
        let mut session = session_with(vec![
            case_with("a", 1, &[Passed, Passed]),
            case_with("b", 2, &[Passed, Passed]),
        ]);

        let summary = finalize(&mut session).unwrap();

        assert_eq!(summary.overall, Passed);
        assert_eq!(session.result, Passed);
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.aggregates.passed_steps, 4);
        assert_eq!(session.aggregates.failed_steps, 0);
        assert_eq!(session.aggregates.passed_cases, 2);
        assert!(session.cases.iter().all(|c| c.result == Some(Passed)));
    }

    #[test]
    fn one_failed_step_fails_case_and_session() {
        use Verdict::*;
        let mut session = session_with(vec![
            case_with("a", 1, &[Passed, Failed]),
            case_with("b", 2, &[Passed, Passed]),
        ]);

        let summary = finalize(&mut session).unwrap();

        assert_eq!(session.cases[0].result, Some(Failed));
        assert_eq!(session.cases[1].result, Some(Passed));
        assert_eq!(summary.overall, Failed);
        assert_eq!(summary.aggregates.failed_cases, 1);
        assert_eq!(summary.aggregates.passed_cases, 1);
        assert_eq!(summary.aggregates.failed_steps, 1);
        assert_eq!(summary.aggregates.passed_steps, 3);
    }

    #[test]
    fn steps_are_counted_independently_of_case_rollup() {
        use Verdict::*;
        let session = session_with(vec![case_with("a", 1, &[Passed, Blocked, Skipped])]);

        let summary = compute(&session).unwrap();
        assert_eq!(summary.cases[0].verdict, Blocked);
        assert_eq!(summary.aggregates.total_steps, 3);
        assert_eq!(summary.aggregates.passed_steps, 1);
        assert_eq!(summary.aggregates.passed_cases, 0);
        assert_eq!(summary.aggregates.failed_cases, 0);
    }

    #[test]
    fn unresolved_steps_reject_without_mutation() {
        use Verdict::*;
        let mut session = session_with(vec![case_with("a", 1, &[Passed, NotExecuted])]);
        let before = session.clone();

        let err = finalize(&mut session).unwrap_err();

        assert!(matches!(err, EngineError::UnresolvedSteps { remaining: 1 }));
        assert_eq!(session, before);
    }

    #[test]
    fn empty_session_is_not_completable() {
        let session = session_with(vec![CaseResult::new("empty", Some(1))]);
        assert!(matches!(
            compute(&session).unwrap_err(),
            EngineError::EmptySession
        ));
    }

    #[test]
    fn stepless_case_rolls_up_as_skipped() {
        use Verdict::*;
        let session = session_with(vec![
            case_with("a", 1, &[Passed]),
            CaseResult::new("placeholder", Some(2)),
        ]);

        let summary = compute(&session).unwrap();
        assert_eq!(summary.cases[1].verdict, Skipped);
        assert_eq!(summary.overall, Partial);
    }

    #[test]
    fn summary_renders_counts_and_result() {
        use Verdict::*;
        let session = session_with(vec![case_with("a", 1, &[Passed, Failed])]);
        let text = compute(&session).unwrap().render();

        assert!(text.starts_with("Validation Execution Complete!"));
        assert!(text.contains("Total Steps: 2"));
        assert!(text.contains("Overall Result: FAILED"));
    }
}
