use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{debug, error, warn};

use super::completion::{self, CompletionSummary};
use super::record::{CaseRecord, SessionRecord, StepRecord};
use super::sequencer::StepSequence;
use super::EngineError;
use crate::evidence::{EvidenceCapture, EvidenceKind, EvidenceTarget, UnsupportedEvidence};
use crate::models::{SessionStatus, Verdict};
use crate::notify::{Advisory, Notifier};
use crate::store::SessionRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveIndicator {
    Loaded,
    Saving,
    Saved,
    Unsaved,
    Error,
}

impl SaveIndicator {
    pub fn label(self) -> &'static str {
        match self {
            SaveIndicator::Loaded => "Loaded",
            SaveIndicator::Saving => "Saving...",
            SaveIndicator::Saved => "Saved",
            SaveIndicator::Unsaved => "Unsaved",
            SaveIndicator::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveOutcome {
    /// Nothing dirty or nothing bound.
    Idle,
    Saved,
    /// Save failed; edits stay in memory and the session stays dirty.
    Failed,
}

/// Display context for the step under the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    pub index: usize,
    pub total: usize,
    pub case_name: String,
    pub case_description: String,
    pub action: String,
    pub expected_result: String,
    pub actual_result: String,
    pub notes: String,
    pub verdict: Verdict,
}

impl StepView {
    pub fn navigator_label(&self) -> String {
        format!("Step {} of {}", self.index + 1, self.total)
    }
}

/// Everything an operator surface needs to redraw after a command.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSnapshot {
    pub session_info: String,
    pub progress: f64,
    pub progress_text: String,
    pub badge: String,
    pub indicator: SaveIndicator,
    pub dirty: bool,
    pub cursor: usize,
    pub len: usize,
    pub view: Option<StepView>,
    pub can_go_previous: bool,
    pub can_go_next: bool,
    pub can_complete: bool,
}

/// Text-field contents for the current step that have not been copied onto it yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct StepDraft {
    actual_result: String,
    notes: String,
}

/// Interactive core of an execution session.
///
/// Owns the bound session, the flattened step sequence, the cursor and the
/// dirty flag. Not safe for concurrent callers; the runtime serializes all
/// operator commands and autosave ticks onto one task.
pub struct SessionController<S, R, N>
where
    S: SessionRecord + Send + Sync,
    R: SessionRepository<S>,
    N: Notifier,
{
    repository: R,
    notifier: N,
    evidence: Arc<dyn EvidenceCapture>,
    session: Option<S>,
    sequence: StepSequence,
    cursor: usize,
    draft: StepDraft,
    dirty: bool,
    indicator: SaveIndicator,
}

impl<S, R, N> SessionController<S, R, N>
where
    S: SessionRecord + Send + Sync,
    R: SessionRepository<S>,
    N: Notifier,
{
    pub fn new(repository: R, notifier: N) -> Self {
        Self {
            repository,
            notifier,
            evidence: Arc::new(UnsupportedEvidence),
            session: None,
            sequence: StepSequence::default(),
            cursor: 0,
            draft: StepDraft::default(),
            dirty: false,
            indicator: SaveIndicator::Loaded,
        }
    }

    pub fn with_evidence(mut self, evidence: Arc<dyn EvidenceCapture>) -> Self {
        self.evidence = evidence;
        self
    }

    /// Replaces the working session and resumes at its first unresolved step.
    pub fn bind(&mut self, session: S) {
        debug!("Loading session {} for execution", session.id());
        self.sequence = StepSequence::build(&session);
        self.cursor = self.sequence.first_unresolved(&session);
        self.session = Some(session);
        self.load_draft();
        self.dirty = false;
        self.indicator = SaveIndicator::Loaded;
        debug!(
            "Session loaded with {} steps, starting at index {}",
            self.sequence.len(),
            self.cursor
        );
        self.notifier.notify(Advisory::Loaded {
            steps: self.sequence.len(),
            cursor: self.cursor,
        });
    }

    /// `bind` for callers holding a possibly absent session.
    pub fn try_bind(&mut self, session: Option<S>) -> Result<(), EngineError> {
        let session = session.ok_or(EngineError::NoSession)?;
        self.bind(session);
        Ok(())
    }

    pub fn session(&self) -> Option<&S> {
        self.session.as_ref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn save_indicator(&self) -> SaveIndicator {
        self.indicator
    }

    pub fn edit_actual_result(&mut self, text: impl Into<String>) -> Result<(), EngineError> {
        self.require_editable_step()?;
        self.draft.actual_result = text.into();
        self.mark_dirty();
        Ok(())
    }

    pub fn edit_notes(&mut self, text: impl Into<String>) -> Result<(), EngineError> {
        self.require_editable_step()?;
        self.draft.notes = text.into();
        self.mark_dirty();
        Ok(())
    }

    /// Records a verdict with the current draft text.
    pub async fn record(&mut self, verdict: Verdict) -> Result<usize, EngineError> {
        let draft = self.draft.clone();
        self.record_verdict(verdict, draft.actual_result, draft.notes)
            .await
    }

    /// Writes the verdict onto the current step, saves the whole session, then
    /// advances unless already on the last step. Returns the new cursor.
    pub async fn record_verdict(
        &mut self,
        verdict: Verdict,
        actual_result: String,
        notes: String,
    ) -> Result<usize, EngineError> {
        let session = self.session.as_mut().ok_or(EngineError::NoSession)?;
        if session.status() == SessionStatus::Completed {
            return Err(EngineError::SessionCompleted);
        }
        if !verdict.is_manually_recordable() {
            return Err(EngineError::VerdictNotRecordable(verdict));
        }
        if self.sequence.is_empty() {
            return Err(EngineError::NoCurrentStep);
        }
        let step = self
            .sequence
            .step_mut(session, self.cursor)
            .ok_or(EngineError::IndexOutOfRange {
                index: self.cursor,
                len: self.sequence.len(),
            })?;

        step.set_verdict(verdict);
        step.set_actual_result(actual_result.clone());
        step.set_notes(notes.clone());
        session.mark_started();
        self.draft = StepDraft {
            actual_result,
            notes,
        };
        self.dirty = true;
        debug!("Step {} marked as {}", self.cursor + 1, verdict);

        self.persist().await?;

        if verdict == Verdict::Failed {
            if let Some(session) = self.session.as_ref() {
                self.notifier.notify(Advisory::StepFailed {
                    kind: session.kind(),
                    index: self.cursor,
                });
            }
        }

        if self.cursor + 1 < self.sequence.len() {
            self.go_next();
        }
        Ok(self.cursor)
    }

    pub fn go_next(&mut self) -> bool {
        if self.cursor + 1 >= self.sequence.len() {
            return false;
        }
        self.flush_draft();
        self.cursor += 1;
        self.load_draft();
        debug!("Navigated to step {}", self.cursor + 1);
        true
    }

    pub fn go_previous(&mut self) -> bool {
        if self.cursor == 0 || self.sequence.is_empty() {
            return false;
        }
        self.flush_draft();
        self.cursor -= 1;
        self.load_draft();
        debug!("Navigated to step {}", self.cursor + 1);
        true
    }

    /// Moves to `index` when it is in range and differs from the cursor.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index >= self.sequence.len() || index == self.cursor {
            return false;
        }
        self.flush_draft();
        self.cursor = index;
        self.load_draft();
        debug!("Jumped to step {}", self.cursor + 1);
        true
    }

    /// Jumps using a label from [`Self::jump_targets`] (`"Step N: ..."`, 1-based).
    pub fn jump_to_selection(&mut self, selection: &str) -> Result<bool, EngineError> {
        match parse_jump_selection(selection) {
            Some(index) => Ok(self.jump_to(index)),
            None => {
                warn!("Invalid jump selection format: {}", selection);
                self.notifier
                    .notify(Advisory::InvalidJump(selection.to_string()));
                Err(EngineError::InvalidJumpTarget(selection.to_string()))
            }
        }
    }

    pub async fn save_and_exit(&mut self) -> Result<(), EngineError> {
        if self.session.is_none() {
            return Err(EngineError::NoSession);
        }
        self.flush_draft();
        self.persist().await?;
        self.notifier.notify(Advisory::Saved);
        debug!("Session saved and exiting");
        Ok(())
    }

    /// Finalizes the session once every step is resolved.
    ///
    /// On an already completed session this returns the recomputed summary
    /// and leaves the stored session alone, retrying only a save that failed.
    pub async fn complete(&mut self) -> Result<CompletionSummary, EngineError> {
        let session = self.session.as_ref().ok_or(EngineError::NoSession)?;
        if session.status() == SessionStatus::Completed {
            let summary = completion::compute(session)?;
            if self.dirty {
                self.persist().await?;
            }
            debug!("Session already completed: {}", summary.overall);
            return Ok(summary);
        }
        if let Err(rejection) = completion::check_completable(session) {
            warn!("Completion rejected: {}", rejection);
            self.notifier
                .notify(Advisory::CannotComplete(rejection.to_string()));
            return Err(rejection);
        }

        self.flush_draft();
        let session = self.session.as_mut().ok_or(EngineError::NoSession)?;
        let summary = completion::finalize(session)?;
        self.dirty = true;
        self.persist().await?;

        debug!("Session completed: {}", summary.overall);
        self.notifier.notify(Advisory::Completed(summary.render()));
        Ok(summary)
    }

    /// One autosave pass: persists only when something is dirty.
    pub async fn autosave_tick(&mut self) -> AutosaveOutcome {
        if !self.dirty || self.session.is_none() {
            return AutosaveOutcome::Idle;
        }
        self.flush_draft();
        match self.persist().await {
            Ok(()) => {
                debug!("Auto-save executed");
                AutosaveOutcome::Saved
            }
            Err(e) => {
                warn!("Auto-save failed, will retry on next tick: {}", e);
                AutosaveOutcome::Failed
            }
        }
    }

    pub async fn capture_evidence(&mut self, kind: EvidenceKind) -> Result<(), EngineError> {
        self.require_current_step()?;
        let session = self.session.as_ref().ok_or(EngineError::NoSession)?;
        let target = EvidenceTarget {
            session_id: session.id().to_string(),
            index: self.cursor,
            case_name: self
                .sequence
                .case_of(session, self.cursor)
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
        };
        self.evidence
            .capture(&target, &kind)
            .await
            .map_err(EngineError::Evidence)
    }

    pub fn resolved_count(&self) -> usize {
        self.session
            .as_ref()
            .map(|s| self.sequence.resolved_count(s))
            .unwrap_or(0)
    }

    pub fn total_count(&self) -> usize {
        self.sequence.len()
    }

    pub fn progress(&self) -> f64 {
        let total = self.total_count();
        if total == 0 {
            0.0
        } else {
            self.resolved_count() as f64 / total as f64
        }
    }

    pub fn progress_text(&self) -> String {
        format_progress(self.resolved_count(), self.total_count())
    }

    pub fn session_info(&self) -> String {
        match &self.session {
            None => "No session loaded".to_string(),
            Some(session) => format!(
                "Session: {} | {}: {} | Tester: {}",
                session.name(),
                session.kind().target_noun(),
                session.target_name().unwrap_or("N/A"),
                session.operator().unwrap_or("Unassigned")
            ),
        }
    }

    pub fn status_badge(&self) -> String {
        match &self.session {
            None => "NOT STARTED".to_string(),
            Some(session) => match session.status() {
                SessionStatus::NotStarted => "NOT STARTED".to_string(),
                SessionStatus::InProgress => "IN PROGRESS".to_string(),
                SessionStatus::Completed => session.overall().label().to_string(),
            },
        }
    }

    pub fn can_go_previous(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_next(&self) -> bool {
        self.cursor + 1 < self.sequence.len()
    }

    /// True when completion would be accepted: steps exist and all are resolved.
    pub fn can_complete(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| completion::check_completable(s).is_ok())
    }

    pub fn current_view(&self) -> Option<StepView> {
        let session = self.session.as_ref()?;
        let step = self.sequence.step(session, self.cursor)?;
        let case = self.sequence.case_of(session, self.cursor)?;
        Some(StepView {
            index: self.cursor,
            total: self.sequence.len(),
            case_name: case.name().to_string(),
            case_description: case.description().to_string(),
            action: step.action().to_string(),
            expected_result: step.expected_result().to_string(),
            actual_result: self.draft.actual_result.clone(),
            notes: self.draft.notes.clone(),
            verdict: step.verdict(),
        })
    }

    /// Labels for every step: `"Step 3: Login - Step 1 [PASSED]"`.
    pub fn jump_targets(&self) -> Vec<String> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        (0..self.sequence.len())
            .filter_map(|i| {
                let step = self.sequence.step(session, i)?;
                let case_name = self
                    .sequence
                    .case_of(session, i)
                    .map(|c| c.name())
                    .unwrap_or("Unknown");
                let ordinal = step.ordinal().map(|o| o as usize).unwrap_or(i + 1);
                let status = if step.verdict().is_resolved() {
                    format!(" [{}]", step.verdict())
                } else {
                    String::new()
                };
                Some(format!(
                    "Step {}: {} - Step {}{}",
                    i + 1,
                    case_name,
                    ordinal,
                    status
                ))
            })
            .collect()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            session_info: self.session_info(),
            progress: self.progress(),
            progress_text: self.progress_text(),
            badge: self.status_badge(),
            indicator: self.indicator,
            dirty: self.dirty,
            cursor: self.cursor,
            len: self.sequence.len(),
            view: self.current_view(),
            can_go_previous: self.can_go_previous(),
            can_go_next: self.can_go_next(),
            can_complete: self.can_complete(),
        }
    }

    fn require_current_step(&self) -> Result<(), EngineError> {
        let session = self.session.as_ref().ok_or(EngineError::NoSession)?;
        if self.sequence.step(session, self.cursor).is_none() {
            return Err(EngineError::NoCurrentStep);
        }
        Ok(())
    }

    fn require_editable_step(&self) -> Result<(), EngineError> {
        self.require_current_step()?;
        if self.is_completed() {
            return Err(EngineError::SessionCompleted);
        }
        Ok(())
    }

    fn is_completed(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.status() == SessionStatus::Completed)
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        if self.indicator != SaveIndicator::Unsaved {
            self.indicator = SaveIndicator::Unsaved;
            self.notifier.notify(Advisory::Unsaved);
        }
    }

    /// Copies the draft onto the current step. Does not persist or clear dirty.
    /// Completed sessions are read-only and are never written to.
    fn flush_draft(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.status() == SessionStatus::Completed {
            return;
        }
        if let Some(step) = self.sequence.step_mut(session, self.cursor) {
            step.set_actual_result(self.draft.actual_result.clone());
            step.set_notes(self.draft.notes.clone());
        }
    }

    fn load_draft(&mut self) {
        self.draft = self
            .session
            .as_ref()
            .and_then(|s| self.sequence.step(s, self.cursor))
            .map(|step| StepDraft {
                actual_result: step.actual_result().to_string(),
                notes: step.notes().to_string(),
            })
            .unwrap_or_default();
    }

    async fn persist(&mut self) -> Result<(), EngineError> {
        let session = self.session.as_ref().ok_or(EngineError::NoSession)?;
        self.indicator = SaveIndicator::Saving;
        let result = self.repository.save(session).await;
        match result {
            Ok(()) => {
                self.dirty = false;
                self.indicator = SaveIndicator::Saved;
                debug!("Session saved: {}", session.id());
                Ok(())
            }
            Err(e) => {
                error!("Failed to save session {}: {:#}", session.id(), e);
                self.indicator = SaveIndicator::Error;
                self.notifier.notify(Advisory::SaveFailed(e.to_string()));
                Err(EngineError::Persistence(e))
            }
        }
    }
}

/// `"3 of 8 steps (37%)"`; the percentage is truncated, never rounded up.
pub fn format_progress(resolved: usize, total: usize) -> String {
    let percentage = if total == 0 {
        0
    } else {
        resolved * 100 / total
    };
    format!("{} of {} steps ({}%)", resolved, total, percentage)
}

fn jump_label_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\s*Step\s+(\d+)\s*:").ok())
        .as_ref()
}

fn parse_jump_selection(selection: &str) -> Option<usize> {
    let number: usize = jump_label_pattern()?
        .captures(selection)?
        .get(1)?
        .as_str()
        .parse()
        .ok()?;
    number.checked_sub(1)
}
