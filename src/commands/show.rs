use anyhow::Result;
use clap::Args as ClapArgs;
use std::fmt::Write as _;

use crate::commands::common;
use crate::config::Config;
use crate::engine::completion;
use crate::engine::controller::format_progress;
use crate::models::ExecutionSession;

#[derive(ClapArgs)]
pub struct Args {
    /// Session id
    pub session_id: String,

    /// Print the stored session as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: Args, config: Config) -> Result<()> {
    let store = common::open_store(&config).await?;
    let session = store.load(&args.session_id).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        print!("{}", render(&session));
    }
    Ok(())
}

fn render(session: &ExecutionSession) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}: {} ({})", session.kind.title(), session.name, session.id);
    let _ = writeln!(
        out,
        "{}: {} | Tester: {}",
        session.kind.target_noun(),
        session.target.as_deref().unwrap_or("N/A"),
        session.operator.as_deref().unwrap_or("Unassigned")
    );
    if let Some(build) = &session.build_number {
        let _ = writeln!(out, "Build: {}", build);
    }
    if let Some(environment) = &session.environment {
        let _ = writeln!(out, "Environment: {}", environment);
    }
    let _ = writeln!(
        out,
        "Contents: {} {}(s), {} step(s)",
        session.cases.len(),
        session.kind.case_noun(),
        session.step_count()
    );
    let _ = writeln!(out, "Status: {}", session.badge());
    let _ = writeln!(
        out,
        "Progress: {}",
        format_progress(session.resolved_step_count(), session.step_count())
    );
    if let Some(start) = session.execution_start {
        let _ = writeln!(out, "Started: {}", start.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(end) = session.execution_end {
        let _ = writeln!(out, "Ended: {}", end.format("%Y-%m-%d %H:%M:%S"));
    }

    for case in &session.cases {
        let verdict = case
            .result
            .map(|v| format!(" [{}]", v))
            .unwrap_or_default();
        let _ = writeln!(out, "\n{}{}", case.name, verdict);
        for (i, step) in case.steps.iter().enumerate() {
            let ordinal = step.ordinal().map(|o| o as usize).unwrap_or(i + 1);
            let _ = writeln!(out, "  {:>2}. {:<14} {}", ordinal, step.verdict.label(), step.action);
        }
    }

    if session.is_completed() {
        if let Ok(summary) = completion::compute(session) {
            let _ = writeln!(out, "\n{}", summary.render());
            let _ = writeln!(
                out,
                "Pass rate: {:.1}% | Failure rate: {:.1}%",
                session.pass_rate(),
                session.failure_rate()
            );
        }
    }
    out
}
