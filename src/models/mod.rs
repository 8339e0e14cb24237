mod case;
mod kind;
mod session;
mod step;
mod verdict;

pub use case::CaseResult;
pub use kind::SessionKind;
#[allow(unused_imports)]
pub use session::{ExecutionSession, SessionAggregates, SessionStatus};
pub use step::StepResult;
pub use verdict::Verdict;
