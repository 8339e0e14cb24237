use anyhow::Result;
use clap::Args as ClapArgs;

use crate::commands::common;
use crate::config::Config;
use crate::engine::controller::format_progress;
use crate::models::ExecutionSession;
use crate::utils::truncate_str;

#[derive(ClapArgs)]
pub struct Args {
    /// Print sessions as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: Args, config: Config) -> Result<()> {
    let store = common::open_store(&config).await?;
    let sessions = store.list().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No sessions in {}.", config.store_path.display());
        return Ok(());
    }

    println!("{}", header());
    println!("{}", "-".repeat(96));
    for session in &sessions {
        println!("{}", row(session));
    }

    Ok(())
}

fn header() -> String {
    format!(
        "{:<28} {:<30} {:<18} {:<12} {}",
        "ID", "NAME", "KIND", "STATUS", "PROGRESS"
    )
}

fn row(session: &ExecutionSession) -> String {
    format!(
        "{:<28} {:<30} {:<18} {:<12} {}",
        truncate_str(&session.id, 28),
        truncate_str(&session.name, 30),
        session.kind.title(),
        session.badge(),
        format_progress(session.resolved_step_count(), session.step_count())
    )
}
