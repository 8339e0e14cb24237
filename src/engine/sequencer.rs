use std::cmp::Ordering;

use super::record::{CaseRecord, SessionRecord, StepOf, StepRecord};

/// Location of one step inside the session's owned collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPosition {
    pub case_index: usize,
    pub step_index: usize,
}

/// Flat, globally ordered navigation view over a session's cases and steps.
///
/// Derived on every bind and never persisted. Cases are ordered by execution
/// order (nulls last, ties broken by name), steps by ordinal (nulls last).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepSequence {
    positions: Vec<StepPosition>,
}

fn nulls_last(a: Option<u32>, b: Option<u32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl StepSequence {
    pub fn build<S: SessionRecord>(session: &S) -> Self {
        let cases = session.cases();
        let mut case_order: Vec<usize> = (0..cases.len()).collect();
        case_order.sort_by(|&a, &b| {
            nulls_last(cases[a].execution_order(), cases[b].execution_order())
                .then_with(|| cases[a].name().cmp(cases[b].name()))
        });

        let mut positions = Vec::new();
        for case_index in case_order {
            let steps = cases[case_index].steps();
            let mut step_order: Vec<usize> = (0..steps.len()).collect();
            step_order.sort_by(|&a, &b| nulls_last(steps[a].ordinal(), steps[b].ordinal()));
            positions.extend(step_order.into_iter().map(|step_index| StepPosition {
                case_index,
                step_index,
            }));
        }

        Self { positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<StepPosition> {
        self.positions.get(index).copied()
    }

    #[cfg(test)]
    pub fn positions(&self) -> &[StepPosition] {
        &self.positions
    }

    pub fn step<'a, S: SessionRecord>(&self, session: &'a S, index: usize) -> Option<&'a StepOf<S>> {
        let pos = self.get(index)?;
        session
            .cases()
            .get(pos.case_index)?
            .steps()
            .get(pos.step_index)
    }

    pub fn step_mut<'a, S: SessionRecord>(
        &self,
        session: &'a mut S,
        index: usize,
    ) -> Option<&'a mut StepOf<S>> {
        let pos = self.get(index)?;
        session
            .cases_mut()
            .get_mut(pos.case_index)?
            .steps_mut()
            .get_mut(pos.step_index)
    }

    /// The case owning the step at `index`.
    pub fn case_of<'a, S: SessionRecord>(&self, session: &'a S, index: usize) -> Option<&'a S::Case> {
        let pos = self.get(index)?;
        session.cases().get(pos.case_index)
    }

    /// Index of the first NOT_EXECUTED step; the last index when everything is
    /// resolved; 0 for an empty sequence.
    pub fn first_unresolved<S: SessionRecord>(&self, session: &S) -> usize {
        (0..self.len())
            .find(|&i| {
                self.step(session, i)
                    .is_some_and(|s| !s.verdict().is_resolved())
            })
            .unwrap_or_else(|| self.len().saturating_sub(1))
    }

    pub fn resolved_count<S: SessionRecord>(&self, session: &S) -> usize {
        (0..self.len())
            .filter(|&i| {
                self.step(session, i)
                    .is_some_and(|s| s.verdict().is_resolved())
            })
            .count()
    }

    #[cfg(test)]
    pub fn all_resolved<S: SessionRecord>(&self, session: &S) -> bool {
        self.resolved_count(session) == self.len()
    }
}
