use anyhow::Result;
use clap::Args as ClapArgs;
use std::fmt::Write as _;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::commands::common;
use crate::config::Config;
use crate::engine::{
    AutosavePolicy, ControllerSnapshot, EngineError, ErrorKind, SessionController, SessionHandle,
    SessionRuntime,
};
use crate::evidence::{EvidenceKind, UnsupportedEvidence};
use crate::models::Verdict;
use crate::notify::{Advisory, ChannelNotifier, Severity};

const HELP: &str = "\
Commands:
  p|f|s|b [text]   record PASSED/FAILED/SKIPPED/BLOCKED (optional actual result)
  a <text>         set actual result
  o <text>         set notes
  n | prev         next / previous step
  j <N>            jump to step N
  list             list all steps
  shot             capture a screenshot
  attach <path>    attach a file
  show             redraw the current step
  save             save and exit
  complete         complete the session
  q                quit without saving";

#[derive(ClapArgs)]
pub struct Args {
    /// Session id
    pub session_id: String,

    /// Operator executing the session (overrides config)
    #[arg(short, long)]
    pub operator: Option<String>,

    /// Autosave interval in seconds (overrides config)
    #[arg(long)]
    pub autosave_secs: Option<u64>,

    /// Disable periodic autosave
    #[arg(long)]
    pub no_autosave: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Record {
        verdict: Verdict,
        actual_result: Option<String>,
    },
    Actual(String),
    Notes(String),
    Next,
    Previous,
    Jump(String),
    List,
    Screenshot,
    Attach(PathBuf),
    Show,
    Save,
    Complete,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Redraw,
    Quiet,
    Exit,
}

pub async fn execute(args: Args, config: Config) -> Result<()> {
    let policy = autosave_policy(&args, &config)?;

    let store = common::open_store(&config).await?;
    let mut session = store.load(&args.session_id).await?;
    common::assign_operator(&mut session, args.operator, &config);

    let (notifier, mut advisories) = ChannelNotifier::new();
    let mut controller =
        SessionController::new(store, notifier).with_evidence(Arc::new(UnsupportedEvidence));
    controller.bind(session);
    tracing::info!("Running session {}", args.session_id);

    let runtime = SessionRuntime::spawn(controller, policy);
    let handle = runtime.handle();
    let interactive = std::io::stdin().is_terminal();

    drain(&mut advisories);
    println!("{}", render_snapshot(&handle.snapshot().await?));
    if interactive {
        println!("Type 'help' for commands.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            print!("> ");
            std::io::stdout().flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        if command == ReplCommand::Complete
            && interactive
            && !confirm_completion(&mut lines).await?
        {
            println!("Completion cancelled.");
            continue;
        }

        let flow = apply(&handle, command).await;
        drain(&mut advisories);
        match flow {
            Ok(Flow::Redraw) => println!("{}", render_snapshot(&handle.snapshot().await?)),
            Ok(Flow::Quiet) => {}
            Ok(Flow::Exit) => break,
            Err(EngineError::Detached) => break,
            Err(e) => report(&e),
        }
    }

    let controller = runtime.detach().await?;
    drain(&mut advisories);
    if controller.is_dirty() {
        tracing::warn!("Exiting with unsaved changes in {}", args.session_id);
        println!("Unsaved changes were discarded.");
    }
    Ok(())
}

/// Applies the command-line autosave overrides on top of the config.
fn autosave_policy(args: &Args, config: &Config) -> Result<AutosavePolicy> {
    let mut autosave = match args.autosave_secs {
        Some(secs) => config.clone().with_autosave_interval(secs).autosave,
        None => config.autosave.clone(),
    };
    if args.no_autosave {
        autosave.enabled = false;
    }
    autosave.validate()?;
    Ok(autosave.policy())
}

async fn apply(handle: &SessionHandle, command: ReplCommand) -> Result<Flow, EngineError> {
    match command {
        ReplCommand::Record {
            verdict,
            actual_result,
        } => {
            handle.record_verdict(verdict, actual_result, None).await?;
        }
        ReplCommand::Actual(text) => handle.edit_actual_result(text).await?,
        ReplCommand::Notes(text) => handle.edit_notes(text).await?,
        ReplCommand::Next => {
            if !handle.go_next().await? {
                println!("Already at the last step.");
                return Ok(Flow::Quiet);
            }
        }
        ReplCommand::Previous => {
            if !handle.go_previous().await? {
                println!("Already at the first step.");
                return Ok(Flow::Quiet);
            }
        }
        ReplCommand::Jump(target) => {
            let moved = match target.parse::<usize>() {
                Ok(n) if n >= 1 => handle.jump_to(n - 1).await?,
                _ => handle.jump_to_selection(target.clone()).await?,
            };
            if !moved {
                println!("No move: '{}' is out of range or already current.", target);
                return Ok(Flow::Quiet);
            }
        }
        ReplCommand::List => {
            for target in handle.jump_targets().await? {
                println!("  {}", target);
            }
            return Ok(Flow::Quiet);
        }
        ReplCommand::Screenshot => handle.capture_evidence(EvidenceKind::Screenshot).await?,
        ReplCommand::Attach(path) => handle.capture_evidence(EvidenceKind::File(path)).await?,
        ReplCommand::Show => {}
        ReplCommand::Save => {
            handle.save_and_exit().await?;
            return Ok(Flow::Exit);
        }
        ReplCommand::Complete => {
            handle.complete().await?;
            return Ok(Flow::Exit);
        }
        ReplCommand::Help => {
            println!("{}", HELP);
            return Ok(Flow::Quiet);
        }
        ReplCommand::Quit => return Ok(Flow::Exit),
    }
    Ok(Flow::Redraw)
}

/// Asks before finalizing. Only `y` or `yes` confirms; end of input declines.
async fn confirm_completion<R>(lines: &mut Lines<R>) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    print!(
        "Are you sure you want to complete this session? \
         This will finalize all results. [y/N] "
    );
    std::io::stdout().flush()?;
    let answer = lines.next_line().await?.unwrap_or_default();
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn parse_line(line: &str) -> Result<Option<ReplCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        key @ ("p" | "f" | "s" | "b") => {
            let verdict = key
                .chars()
                .next()
                .and_then(Verdict::from_shortcut)
                .ok_or_else(|| format!("Unknown verdict key '{}'", key))?;
            ReplCommand::Record {
                verdict,
                actual_result: (!rest.is_empty()).then(|| rest.to_string()),
            }
        }
        "a" => ReplCommand::Actual(rest.to_string()),
        "o" => ReplCommand::Notes(rest.to_string()),
        "n" | "next" => ReplCommand::Next,
        "prev" => ReplCommand::Previous,
        "j" | "jump" => {
            if rest.is_empty() {
                return Err("Usage: j <step number>".to_string());
            }
            ReplCommand::Jump(rest.to_string())
        }
        "list" => ReplCommand::List,
        "shot" => ReplCommand::Screenshot,
        "attach" => {
            if rest.is_empty() {
                return Err("Usage: attach <path>".to_string());
            }
            ReplCommand::Attach(PathBuf::from(rest))
        }
        "show" => ReplCommand::Show,
        "save" => ReplCommand::Save,
        "complete" => ReplCommand::Complete,
        "help" | "?" => ReplCommand::Help,
        "q" | "quit" => ReplCommand::Quit,
        other => {
            return Err(format!(
                "Unknown command '{}'. Type 'help' for commands.",
                other
            ))
        }
    };
    Ok(Some(command))
}

fn render_snapshot(snapshot: &ControllerSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", snapshot.session_info);
    let _ = write!(
        out,
        "[{}] {} | {}",
        snapshot.badge,
        snapshot.progress_text,
        snapshot.indicator.label()
    );

    match &snapshot.view {
        None => {
            let _ = write!(out, "\n\nNo steps in this session.");
        }
        Some(view) => {
            let _ = write!(out, "\n\n{} | {}", view.case_name, view.navigator_label());
            if !view.case_description.is_empty() {
                let _ = write!(out, "\n{}", view.case_description);
            }
            let _ = write!(
                out,
                "\n  Action:   {}\n  Expected: {}\n  Actual:   {}\n  Notes:    {}\n  Verdict:  {}",
                view.action, view.expected_result, view.actual_result, view.notes, view.verdict
            );
        }
    }

    if snapshot.can_complete {
        let _ = write!(out, "\n\nAll steps resolved. Type 'complete' to finish.");
    }
    out
}

fn report(error: &EngineError) {
    // These already arrived as advisories.
    if matches!(
        error.kind(),
        ErrorKind::Rejected | ErrorKind::Persistence | ErrorKind::Navigation
    ) {
        return;
    }
    println!("Error: {}", error);
}

fn drain(advisories: &mut UnboundedReceiver<Advisory>) {
    while let Ok(advisory) = advisories.try_recv() {
        tracing::debug!(severity = ?advisory.severity(), "{}", advisory.message());
        let tag = match advisory.severity() {
            Severity::Info => "info",
            Severity::Success => "ok",
            Severity::Warning => "warn",
            Severity::Error => "error",
        };
        println!("[{}] {}", tag, advisory.message());
    }
}
