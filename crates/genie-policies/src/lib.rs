//! genie-policies: guards and hooks for flow definitions (spec §4.2).
//! Plays the role `chem-policies` played for property selection — named,
//! pure, independently testable decision logic — but here the decisions are
//! "which transition fires" and "what does this hook do to the model"
//! rather than "which property candidate wins".

pub mod guards;
pub mod hooks;
pub mod registry;

pub use registry::{GuardRegistry, HookRegistry};
