//! Single-consumer command loop around a [`SessionController`].
//!
//! The spawned task owns the controller. Operator calls made through a
//! [`SessionHandle`] and autosave ticks from the [`AutosaveScheduler`] all land
//! on the same queue, so they are applied strictly one at a time in arrival
//! order and a save triggered by a tick can never interleave with an operator
//! mutation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::autosave::{AutosavePolicy, AutosaveScheduler};
use super::completion::CompletionSummary;
use super::controller::{ControllerSnapshot, SessionController};
use super::record::SessionRecord;
use super::EngineError;
use crate::evidence::EvidenceKind;
use crate::models::Verdict;
use crate::notify::Notifier;
use crate::store::SessionRepository;

const COMMAND_QUEUE_CAPACITY: usize = 32;

type Reply<T> = oneshot::Sender<T>;

#[derive(Debug)]
enum Command {
    EditActualResult(String, Reply<Result<(), EngineError>>),
    EditNotes(String, Reply<Result<(), EngineError>>),
    Record {
        verdict: Verdict,
        actual_result: Option<String>,
        notes: Option<String>,
        reply: Reply<Result<usize, EngineError>>,
    },
    Next(Reply<bool>),
    Previous(Reply<bool>),
    JumpTo(usize, Reply<bool>),
    JumpToSelection(String, Reply<Result<bool, EngineError>>),
    JumpTargets(Reply<Vec<String>>),
    SaveAndExit(Reply<Result<(), EngineError>>),
    Complete(Reply<Result<CompletionSummary, EngineError>>),
    CaptureEvidence(EvidenceKind, Reply<Result<(), EngineError>>),
    Snapshot(Reply<ControllerSnapshot>),
    AutosaveTick,
    Detach,
}

/// Cloneable, async front door to a running session.
///
/// Every method fails with [`EngineError::Detached`] once the runtime is gone.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
}

impl SessionHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| EngineError::Detached)?;
        rx.await.map_err(|_| EngineError::Detached)
    }

    pub async fn edit_actual_result(&self, text: impl Into<String>) -> Result<(), EngineError> {
        let text = text.into();
        self.request(|r| Command::EditActualResult(text, r)).await?
    }

    pub async fn edit_notes(&self, text: impl Into<String>) -> Result<(), EngineError> {
        let text = text.into();
        self.request(|r| Command::EditNotes(text, r)).await?
    }

    /// Records a verdict; `None` text keeps whatever is currently drafted.
    pub async fn record_verdict(
        &self,
        verdict: Verdict,
        actual_result: Option<String>,
        notes: Option<String>,
    ) -> Result<usize, EngineError> {
        self.request(|reply| Command::Record {
            verdict,
            actual_result,
            notes,
            reply,
        })
        .await?
    }

    pub async fn record(&self, verdict: Verdict) -> Result<usize, EngineError> {
        self.record_verdict(verdict, None, None).await
    }

    pub async fn go_next(&self) -> Result<bool, EngineError> {
        self.request(Command::Next).await
    }

    pub async fn go_previous(&self) -> Result<bool, EngineError> {
        self.request(Command::Previous).await
    }

    pub async fn jump_to(&self, index: usize) -> Result<bool, EngineError> {
        self.request(|r| Command::JumpTo(index, r)).await
    }

    pub async fn jump_to_selection(&self, selection: impl Into<String>) -> Result<bool, EngineError> {
        let selection = selection.into();
        self.request(|r| Command::JumpToSelection(selection, r))
            .await?
    }

    pub async fn jump_targets(&self) -> Result<Vec<String>, EngineError> {
        self.request(Command::JumpTargets).await
    }

    pub async fn save_and_exit(&self) -> Result<(), EngineError> {
        self.request(Command::SaveAndExit).await?
    }

    pub async fn complete(&self) -> Result<CompletionSummary, EngineError> {
        self.request(Command::Complete).await?
    }

    pub async fn capture_evidence(&self, kind: EvidenceKind) -> Result<(), EngineError> {
        self.request(|r| Command::CaptureEvidence(kind, r)).await?
    }

    pub async fn snapshot(&self) -> Result<ControllerSnapshot, EngineError> {
        self.request(Command::Snapshot).await
    }
}

/// A controller running on its own task, optionally with periodic autosave.
pub struct SessionRuntime<S, R, N>
where
    S: SessionRecord + Send + Sync + 'static,
    R: SessionRepository<S> + 'static,
    N: Notifier + 'static,
{
    handle: SessionHandle,
    task: JoinHandle<SessionController<S, R, N>>,
    scheduler: Option<AutosaveScheduler>,
    /// Set once detaching starts; queued autosave ticks are dropped from then on.
    stopping: Arc<AtomicBool>,
}

impl<S, R, N> SessionRuntime<S, R, N>
where
    S: SessionRecord + Send + Sync + 'static,
    R: SessionRepository<S> + 'static,
    N: Notifier + 'static,
{
    pub fn spawn(controller: SessionController<S, R, N>, policy: AutosavePolicy) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);

        let scheduler = policy
            .enabled
            .then(|| AutosaveScheduler::start(policy.interval, &tx, || Command::AutosaveTick));
        if scheduler.is_none() {
            tracing::debug!("Auto-save disabled");
        }

        let stopping = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(run(controller, rx, Arc::clone(&stopping)));
        Self {
            handle: SessionHandle { tx },
            task,
            scheduler,
            stopping,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Stops the scheduler without flushing and hands the controller back.
    ///
    /// Operator commands already queued ahead of the detach are still applied;
    /// pending autosave ticks are discarded.
    pub async fn detach(self) -> Result<SessionController<S, R, N>, EngineError> {
        let Self {
            handle,
            task,
            scheduler,
            stopping,
        } = self;

        stopping.store(true, Ordering::SeqCst);
        if let Some(scheduler) = scheduler {
            scheduler.cancel();
        }
        // A closed queue means the loop is already gone; the join below reports it.
        let _ = handle.tx.send(Command::Detach).await;
        task.await.map_err(|e| {
            tracing::error!("Session task ended abnormally: {}", e);
            EngineError::Detached
        })
    }
}

async fn run<S, R, N>(
    mut controller: SessionController<S, R, N>,
    mut rx: mpsc::Receiver<Command>,
    stopping: Arc<AtomicBool>,
) -> SessionController<S, R, N>
where
    S: SessionRecord + Send + Sync + 'static,
    R: SessionRepository<S> + 'static,
    N: Notifier + 'static,
{
    while let Some(command) = rx.recv().await {
        match command {
            Command::Detach => {
                tracing::debug!("Session runtime detaching");
                break;
            }
            Command::AutosaveTick if stopping.load(Ordering::SeqCst) => {
                tracing::debug!("Auto-save tick discarded (detaching)");
            }
            command => dispatch(&mut controller, command).await,
        }
    }
    controller
}

async fn dispatch<S, R, N>(controller: &mut SessionController<S, R, N>, command: Command)
where
    S: SessionRecord + Send + Sync,
    R: SessionRepository<S>,
    N: Notifier,
{
    // Reply send errors mean the caller stopped waiting; the command still ran.
    match command {
        Command::EditActualResult(text, reply) => {
            let _ = reply.send(controller.edit_actual_result(text));
        }
        Command::EditNotes(text, reply) => {
            let _ = reply.send(controller.edit_notes(text));
        }
        Command::Record {
            verdict,
            actual_result,
            notes,
            reply,
        } => {
            let result = match (actual_result, notes) {
                (None, None) => controller.record(verdict).await,
                (actual_result, notes) => {
                    let view = controller.current_view();
                    let actual_result = actual_result
                        .or_else(|| view.as_ref().map(|v| v.actual_result.clone()))
                        .unwrap_or_default();
                    let notes = notes
                        .or_else(|| view.as_ref().map(|v| v.notes.clone()))
                        .unwrap_or_default();
                    controller.record_verdict(verdict, actual_result, notes).await
                }
            };
            let _ = reply.send(result);
        }
        Command::Next(reply) => {
            let _ = reply.send(controller.go_next());
        }
        Command::Previous(reply) => {
            let _ = reply.send(controller.go_previous());
        }
        Command::JumpTo(index, reply) => {
            let _ = reply.send(controller.jump_to(index));
        }
        Command::JumpToSelection(selection, reply) => {
            let _ = reply.send(controller.jump_to_selection(&selection));
        }
        Command::JumpTargets(reply) => {
            let _ = reply.send(controller.jump_targets());
        }
        Command::SaveAndExit(reply) => {
            let _ = reply.send(controller.save_and_exit().await);
        }
        Command::Complete(reply) => {
            let _ = reply.send(controller.complete().await);
        }
        Command::CaptureEvidence(kind, reply) => {
            let _ = reply.send(controller.capture_evidence(kind).await);
        }
        Command::Snapshot(reply) => {
            let _ = reply.send(controller.snapshot());
        }
        Command::AutosaveTick => {
            let outcome = controller.autosave_tick().await;
            tracing::trace!("Auto-save tick: {:?}", outcome);
        }
        Command::Detach => {}
    }
}
