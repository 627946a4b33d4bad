//! genie-domain: neutral data model shared by every layer of GenieFlow.
//!
//! Mirrors the role `chem-domain` played for chem-gl-chemflow: the types here
//! carry no orchestration logic, only the shape of a session and its
//! progress record. `genie-core` owns the behaviour that operates on them.

pub mod dialogue;
pub mod progress;
pub mod session;

pub use dialogue::{Actor, DialogueElement};
pub use progress::GenieTaskProgress;
pub use session::SessionModel;
