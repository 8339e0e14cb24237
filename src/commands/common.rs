use anyhow::Result;

use crate::config::Config;
use crate::models::ExecutionSession;
use crate::store::YamlSessionStore;

pub async fn open_store(config: &Config) -> Result<YamlSessionStore> {
    let store = YamlSessionStore::new(config.store_path.clone());
    store.init().await?;
    Ok(store)
}

/// An explicit operator always wins; the configured one only fills a gap.
pub fn assign_operator(session: &mut ExecutionSession, explicit: Option<String>, config: &Config) {
    match (explicit, &config.operator) {
        (Some(operator), _) => session.operator = Some(operator),
        (None, Some(operator)) if session.operator.is_none() => {
            session.operator = Some(operator.clone())
        }
        _ => {}
    }
}
