pub mod autosave;
pub mod completion;
pub mod controller;
mod error;
pub mod record;
pub mod runtime;
pub mod sequencer;

#[cfg(test)]
mod testing;

pub use autosave::AutosavePolicy;
pub use controller::{ControllerSnapshot, SessionController};
pub use error::{EngineError, ErrorKind};
pub use runtime::{SessionHandle, SessionRuntime};
