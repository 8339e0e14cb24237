use serde::{Deserialize, Serialize};

/// Outcome of executing a step, or the rollup of a case or session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    #[default]
    NotExecuted,
    InProgress,
    Passed,
    Failed,
    Blocked,
    Skipped,
    Partial,
}

impl Verdict {
    /// Verdicts an operator may record on a single step.
    pub const RECORDABLE: [Verdict; 4] = [
        Verdict::Passed,
        Verdict::Failed,
        Verdict::Skipped,
        Verdict::Blocked,
    ];

    pub fn is_resolved(self) -> bool {
        self != Verdict::NotExecuted
    }

    pub fn is_manually_recordable(self) -> bool {
        Self::RECORDABLE.contains(&self)
    }

    pub fn label(self) -> &'static str {
        match self {
            Verdict::NotExecuted => "NOT_EXECUTED",
            Verdict::InProgress => "IN_PROGRESS",
            Verdict::Passed => "PASSED",
            Verdict::Failed => "FAILED",
            Verdict::Blocked => "BLOCKED",
            Verdict::Skipped => "SKIPPED",
            Verdict::Partial => "PARTIAL",
        }
    }

    /// Single-key shortcuts: P=Pass F=Fail S=Skip B=Block.
    pub fn from_shortcut(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'p' => Some(Verdict::Passed),
            'f' => Some(Verdict::Failed),
            's' => Some(Verdict::Skipped),
            'b' => Some(Verdict::Blocked),
            _ => None,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_defaults_to_not_executed() {
        assert_eq!(Verdict::default(), Verdict::NotExecuted);
        assert!(!Verdict::default().is_resolved());
    }

    #[test]
    fn only_four_verdicts_are_recordable() {
        assert!(Verdict::Passed.is_manually_recordable());
        assert!(Verdict::Failed.is_manually_recordable());
        assert!(Verdict::Skipped.is_manually_recordable());
        assert!(Verdict::Blocked.is_manually_recordable());
        assert!(!Verdict::Partial.is_manually_recordable());
        assert!(!Verdict::InProgress.is_manually_recordable());
        assert!(!Verdict::NotExecuted.is_manually_recordable());
    }

    #[test]
    fn shortcuts_map_to_recordable_verdicts() {
        assert_eq!(Verdict::from_shortcut('p'), Some(Verdict::Passed));
        assert_eq!(Verdict::from_shortcut('F'), Some(Verdict::Failed));
        assert_eq!(Verdict::from_shortcut('s'), Some(Verdict::Skipped));
        assert_eq!(Verdict::from_shortcut('b'), Some(Verdict::Blocked));
        assert_eq!(Verdict::from_shortcut('x'), None);
    }

    #[test]
    fn verdict_serializes_in_upper_snake_case() {
        let yaml = serde_yaml::to_string(&Verdict::NotExecuted).unwrap();
        assert_eq!(yaml.trim(), "NOT_EXECUTED");

        let parsed: Verdict = serde_yaml::from_str("PARTIAL").unwrap();
        assert_eq!(parsed, Verdict::Partial);
    }

    #[test]
    fn display_uses_label() {
        assert_eq!(Verdict::Blocked.to_string(), "BLOCKED");
    }
}
