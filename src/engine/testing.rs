//! Test doubles shared by the engine's unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::models::{CaseResult, ExecutionSession, SessionKind, StepResult};
use crate::notify::{Advisory, Notifier};
use crate::store::SessionRepository;

/// Records every saved snapshot; can be switched into a failing or slow mode.
#[derive(Clone, Default)]
pub struct MockRepository {
    saved: Arc<Mutex<Vec<ExecutionSession>>>,
    fail: Arc<AtomicBool>,
    attempts: Arc<AtomicUsize>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl MockRepository {
    pub fn saves(&self) -> Vec<ExecutionSession> {
        self.saved.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// Every save sleeps this long; failure is decided when the save starts.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Save calls, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionRepository<ExecutionSession> for MockRepository {
    async fn save(&self, session: &ExecutionSession) -> anyhow::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self.fail.load(Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if failing {
            anyhow::bail!("database unavailable");
        }
        self.saved.lock().unwrap().push(session.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    advisories: Arc<Mutex<Vec<Advisory>>>,
}

impl RecordingNotifier {
    pub fn advisories(&self) -> Vec<Advisory> {
        self.advisories.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, advisory: Advisory) {
        self.advisories.lock().unwrap().push(advisory);
    }
}

/// Two cases with two steps each.
pub fn four_step_session() -> ExecutionSession {
    ExecutionSession::new("Release smoke", SessionKind::TestRun)
        .with_id("run-001")
        .with_target("Checkout")
        .with_operator("dana")
        .with_case(
            CaseResult::new("Cart", Some(1))
                .with_description("Cart operations")
                .with_step(StepResult::new(Some(1), "Open cart").with_expected("Cart shown"))
                .with_step(StepResult::new(Some(2), "Add item").with_expected("Item listed")),
        )
        .with_case(
            CaseResult::new("Payment", Some(2))
                .with_step(StepResult::new(Some(1), "Enter card"))
                .with_step(StepResult::new(Some(2), "Confirm")),
        )
}
