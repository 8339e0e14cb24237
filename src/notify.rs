use tokio::sync::mpsc;

use crate::models::SessionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Fire-and-forget events for the operator-facing status surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    Loaded { steps: usize, cursor: usize },
    Saved,
    Unsaved,
    SaveFailed(String),
    StepFailed { kind: SessionKind, index: usize },
    CannotComplete(String),
    InvalidJump(String),
    Completed(String),
}

impl Advisory {
    pub fn severity(&self) -> Severity {
        match self {
            Advisory::Loaded { .. } => Severity::Info,
            Advisory::Saved | Advisory::Completed(_) => Severity::Success,
            Advisory::Unsaved
            | Advisory::StepFailed { .. }
            | Advisory::CannotComplete(_)
            | Advisory::InvalidJump(_) => Severity::Warning,
            Advisory::SaveFailed(_) => Severity::Error,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Advisory::Loaded { steps, cursor } => {
                format!("Session loaded with {} steps, starting at step {}", steps, cursor + 1)
            }
            Advisory::Saved => "Session saved".to_string(),
            Advisory::Unsaved => "Unsaved changes".to_string(),
            Advisory::SaveFailed(reason) => format!("Failed to save: {}", reason),
            Advisory::StepFailed { kind, .. } => {
                format!("{} failed - consider attaching evidence", kind.step_noun())
            }
            Advisory::CannotComplete(reason) => reason.clone(),
            Advisory::InvalidJump(selection) => format!("Failed to jump to step: '{}'", selection),
            Advisory::Completed(summary) => summary.clone(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, advisory: Advisory);
}

/// Forwards advisories to whoever holds the receiver. Dropped receivers are ignored.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Advisory>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Advisory>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, advisory: Advisory) {
        let _ = self.tx.send(advisory);
    }
}
