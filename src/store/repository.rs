use anyhow::Result;
use async_trait::async_trait;

/// Whole-aggregate persistence for a session: session, cases and steps in one write.
///
/// Saves are idempotent upserts. The engine calls this from manual saves,
/// verdict recording, autosave ticks and completion.
#[async_trait]
pub trait SessionRepository<S>: Send + Sync
where
    S: Send + Sync,
{
    async fn save(&self, session: &S) -> Result<()>;
}
