use anyhow::{bail, Context, Result};
use clap::Args as ClapArgs;
use std::path::{Path, PathBuf};

use crate::commands::common;
use crate::config::Config;
use crate::models::ExecutionSession;
use crate::store::StoreError;

#[derive(ClapArgs)]
pub struct Args {
    /// Session YAML file with cases and steps already expanded
    pub file: PathBuf,

    /// Operator executing the session (overrides the file and config)
    #[arg(short, long)]
    pub operator: Option<String>,

    /// Replace an existing session with the same id
    #[arg(long)]
    pub force: bool,
}

pub async fn execute(args: Args, config: Config) -> Result<()> {
    let mut session = read_session_file(&args.file).await?;

    common::assign_operator(&mut session, args.operator, &config);

    if let Err(errors) = session.validate() {
        bail!(StoreError::Invalid {
            id: session.id.clone(),
            errors,
        });
    }

    let store = common::open_store(&config).await?;
    if !args.force && store.load(&session.id).await.is_ok() {
        bail!(
            "Session {} already exists. Use --force to replace it.",
            session.id
        );
    }

    store.write(&session).await?;
    tracing::info!("Imported session {} from {}", session.id, args.file.display());

    println!(
        "Imported {}: {} ({} cases, {} steps)",
        session.id,
        session.name,
        session.cases.len(),
        session.step_count()
    );
    Ok(())
}

async fn read_session_file(path: &Path) -> Result<ExecutionSession> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read session file: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse session file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionKind;
    use crate::store::YamlSessionStore;
    use tempfile::TempDir;

    const SESSION_YAML: &str = r#"
id: run-login
name: Login regression
kind: test_run
target: Login
cases:
  - name: Valid login
    execution_order: 1
    steps:
      - ordinal: 1
        action: Open login page
        expected_result: Form shown
      - ordinal: 2
        action: Submit valid credentials
        expected_result: Dashboard shown
"#;

    fn config_in(temp: &TempDir) -> Config {
        Config::default().with_store_path(temp.path().join("store"))
    }

    fn write_file(temp: &TempDir, content: &str) -> PathBuf {
        let path = temp.path().join("session.yaml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn args(file: PathBuf) -> Args {
        Args {
            file,
            operator: None,
            force: false,
        }
    }

    #[tokio::test]
    async fn import_stores_session() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp).with_operator("dana");
        let file = write_file(&temp, SESSION_YAML);

        execute(args(file), config.clone()).await.unwrap();

        let stored = YamlSessionStore::new(config.store_path)
            .load("run-login")
            .await
            .unwrap();
        assert_eq!(stored.kind, SessionKind::TestRun);
        assert_eq!(stored.step_count(), 2);
        assert_eq!(stored.operator.as_deref(), Some("dana"));
    }

    #[tokio::test]
    async fn import_refuses_duplicate_without_force() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        let file = write_file(&temp, SESSION_YAML);

        execute(args(file.clone()), config.clone()).await.unwrap();
        assert!(execute(args(file.clone()), config.clone()).await.is_err());

        let mut forced = args(file);
        forced.force = true;
        forced.operator = Some("lee".into());
        execute(forced, config.clone()).await.unwrap();
        let stored = YamlSessionStore::new(config.store_path)
            .load("run-login")
            .await
            .unwrap();
        assert_eq!(stored.operator.as_deref(), Some("lee"));
    }

    #[tokio::test]
    async fn import_rejects_invalid_session() {
        let temp = TempDir::new().unwrap();
        let file = write_file(&temp, "id: bad\nname: \"  \"\n");

        let err = execute(args(file), config_in(&temp)).await.unwrap_err();
        assert!(err.to_string().contains("Name is required"));
    }

    #[tokio::test]
    async fn import_reports_unparseable_file() {
        let temp = TempDir::new().unwrap();
        let file = write_file(&temp, "cases: {");

        let err = execute(args(file), config_in(&temp)).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse session file"));
    }
}
