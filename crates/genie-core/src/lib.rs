//! genie-core: the session/state-machine/task-DAG engine at the heart of
//! GenieFlow (spec §1 "THE CORE").
//!
//! Layout mirrors the teacher's `chem-core` split between pure orchestration
//! logic and the contracts its neighbours implement:
//! - `template`: the composite `Template`/`Content` data model (§3).
//! - `sm`: flow definitions, guards/hooks, the `StateMachine` dispatch loop (§4.2).
//! - `compiler`: pure `Template -> TaskSignature` DAG compilation (§4.4).
//! - `worker`: the closed task-kind set and their pure (I/O-free) semantics (§4.5).
//! - `listener`: the `TransitionListener` bridging the SM to the compiler/worker runtime (§4.8).
//! - `store`, `invoker`, `template_env`: the contracts `genie-persistence`,
//!   `genie-providers`/`genie-adapters` implement (§4.6, §4.7, §4.3).
//! - `errors`: the error taxonomy of §7.

pub mod compiler;
pub mod errors;
pub mod invoker;
pub mod listener;
pub mod render;
pub mod sm;
pub mod store;
pub mod template;
pub mod template_env;
pub mod worker;

pub use errors::CoreError;
pub use template::{Content, Template};
