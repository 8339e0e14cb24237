use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvidenceKind {
    Screenshot,
    File(PathBuf),
}

/// Identifies the step evidence is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceTarget {
    pub session_id: String,
    pub index: usize,
    pub case_name: String,
}

#[async_trait]
pub trait EvidenceCapture: Send + Sync {
    async fn capture(&self, target: &EvidenceTarget, kind: &EvidenceKind) -> Result<()>;
}

/// Placeholder until attachment storage exists; logs the request and succeeds.
#[derive(Debug, Clone, Default)]
pub struct UnsupportedEvidence;

#[async_trait]
impl EvidenceCapture for UnsupportedEvidence {
    async fn capture(&self, target: &EvidenceTarget, kind: &EvidenceKind) -> Result<()> {
        match kind {
            EvidenceKind::Screenshot => tracing::info!(
                "Screenshot capture not available for {} step {}",
                target.session_id,
                target.index + 1
            ),
            EvidenceKind::File(path) => tracing::info!(
                "File attachment not available for {} step {}: {}",
                target.session_id,
                target.index + 1,
                path.display()
            ),
        }
        Ok(())
    }
}
