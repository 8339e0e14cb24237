use serde::{Deserialize, Serialize};

use super::{StepResult, Verdict};

/// Execution record for one case, owning its step results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseResult {
    /// Name of the case template this result executes.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub execution_order: Option<u32>,
    #[serde(default)]
    pub steps: Vec<StepResult>,
    #[serde(default)]
    pub result: Option<Verdict>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl CaseResult {
    pub fn new(name: impl Into<String>, execution_order: Option<u32>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            execution_order,
            steps: Vec::new(),
            result: None,
            duration_ms: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_step(mut self, step: StepResult) -> Self {
        self.steps.push(step);
        self
    }
}
