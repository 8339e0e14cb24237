use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

use super::SessionRepository;
use crate::models::ExecutionSession;
use crate::utils::sanitize_file_stem;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session {id} is invalid: {}", .errors.join("; "))]
    Invalid { id: String, errors: Vec<String> },

    #[error("Session {id} maps to the same file as stored session {existing}")]
    Conflict { id: String, existing: String },
}

/// One YAML file per session under `<base>/sessions/`.
#[derive(Debug, Clone)]
pub struct YamlSessionStore {
    base_path: PathBuf,
}

impl YamlSessionStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn sessions_path(&self) -> PathBuf {
        self.base_path.join("sessions")
    }

    fn session_file(&self, id: &str) -> PathBuf {
        self.sessions_path()
            .join(format!("{}.yaml", sanitize_file_stem(id)))
    }

    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(self.sessions_path()).await?;
        Ok(())
    }

    pub async fn write(&self, session: &ExecutionSession) -> Result<()> {
        if let Err(errors) = session.validate() {
            return Err(StoreError::Invalid {
                id: session.id.clone(),
                errors,
            }
            .into());
        }

        self.init().await?;
        let path = self.session_file(&session.id);
        if path.exists() {
            if let Ok(existing) = Self::read_file(&path).await {
                if existing.id != session.id {
                    return Err(StoreError::Conflict {
                        id: session.id.clone(),
                        existing: existing.id,
                    }
                    .into());
                }
            }
        }
        let tmp = path.with_extension("yaml.tmp");
        let content = serde_yaml::to_string(session)?;
        fs::write(&tmp, content)
            .await
            .context("Failed to write session file")?;
        fs::rename(&tmp, &path)
            .await
            .context("Failed to replace session file")?;
        tracing::debug!("Session saved: {} ({})", session.id, path.display());
        Ok(())
    }

    pub async fn load(&self, id: &str) -> Result<ExecutionSession> {
        let path = self.session_file(id);

        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()).into());
        }

        let session = Self::read_file(&path).await?;
        // Distinct ids can share a sanitized file name.
        if session.id != id {
            return Err(StoreError::NotFound(id.to_string()).into());
        }
        Ok(session)
    }

    async fn read_file(path: &Path) -> Result<ExecutionSession> {
        let content = fs::read_to_string(path)
            .await
            .context("Failed to read session file")?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse session file: {}", path.display()))
    }

    pub async fn list(&self) -> Result<Vec<ExecutionSession>> {
        let mut sessions = Vec::new();
        let sessions_path = self.sessions_path();

        if !sessions_path.exists() {
            return Ok(sessions);
        }

        let mut entries = fs::read_dir(&sessions_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "yaml") {
                match fs::read_to_string(&path).await {
                    Ok(content) => match serde_yaml::from_str::<ExecutionSession>(&content) {
                        Ok(session) => sessions.push(session),
                        Err(e) => {
                            tracing::error!(
                                "Failed to parse session file {}: {}",
                                path.display(),
                                e
                            );
                        }
                    },
                    Err(e) => {
                        tracing::error!(
                            "Failed to read session file {}: {}",
                            path.display(),
                            e
                        );
                    }
                }
            }
        }

        sessions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(sessions)
    }
}

#[async_trait]
impl SessionRepository<ExecutionSession> for YamlSessionStore {
    async fn save(&self, session: &ExecutionSession) -> Result<()> {
        self.write(session).await
    }
}
