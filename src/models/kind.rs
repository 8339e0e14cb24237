use serde::{Deserialize, Serialize};

/// The two execution domains sharing one engine. Only vocabulary differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    #[default]
    TestRun,
    ValidationSession,
}

impl SessionKind {
    pub fn title(self) -> &'static str {
        match self {
            SessionKind::TestRun => "Test Run",
            SessionKind::ValidationSession => "Validation Session",
        }
    }

    pub fn case_noun(self) -> &'static str {
        match self {
            SessionKind::TestRun => "test case",
            SessionKind::ValidationSession => "validation case",
        }
    }

    pub fn step_noun(self) -> &'static str {
        match self {
            SessionKind::TestRun => "Test step",
            SessionKind::ValidationSession => "Validation step",
        }
    }

    /// What the session executes: a scenario for test runs, a suite for validation.
    pub fn target_noun(self) -> &'static str {
        match self {
            SessionKind::TestRun => "Scenario",
            SessionKind::ValidationSession => "Suite",
        }
    }

    pub fn execution_title(self) -> &'static str {
        match self {
            SessionKind::TestRun => "Test Execution",
            SessionKind::ValidationSession => "Validation Execution",
        }
    }
}
