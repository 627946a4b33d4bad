//! genie-infra: wiring (component C5's runtime half, C7). Plays the role
//! `chem-infra` was left as a stub for in the teacher: the crate that turns
//! the pure contracts of `genie-core` into a runnable engine — an async
//! worker pool pulling compiled DAGs off a shared queue, a `SessionManager`
//! driving the Session Manager operations of spec §4.1, and the `Engine`
//! handle that bundles both for a binary (`genie-cli`, or the root demo) to
//! hold onto.

pub mod ctx;
pub mod engine;
pub mod executor;
pub mod launcher;
pub mod queue;
pub mod session_manager;
pub mod task_registry;
pub mod wire;

pub use ctx::WorkerCtx;
pub use engine::Engine;
pub use launcher::QueueDagLauncher;
pub use queue::{InMemoryTaskQueue, TaskQueue};
pub use session_manager::SessionManager;
pub use task_registry::{OpaqueTask, TaskRegistry};
pub use wire::{EventInput, ProgressDto, Response, Status};
