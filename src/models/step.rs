use serde::{Deserialize, Serialize};

use super::Verdict;

/// Verdict record for one checklist step inside a case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepResult {
    ordinal: Option<u32>,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub expected_result: String,
    #[serde(default)]
    pub verdict: Verdict,
    #[serde(default)]
    pub actual_result: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl StepResult {
    pub fn new(ordinal: Option<u32>, action: impl Into<String>) -> Self {
        Self {
            ordinal,
            action: action.into(),
            expected_result: String::new(),
            verdict: Verdict::NotExecuted,
            actual_result: String::new(),
            notes: String::new(),
            duration_ms: None,
        }
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected_result = expected.into();
        self
    }

    /// Position within the owning case. Fixed at creation.
    pub fn ordinal(&self) -> Option<u32> {
        self.ordinal
    }
}
