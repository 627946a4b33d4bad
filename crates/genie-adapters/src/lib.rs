//! genie-adapters: the concrete `TemplateEnvironment` (spec §4.3) that backs
//! `genie-core`'s trait with real files on disk — `meta.yaml` ancestor-merge
//! inheritance, minijinja rendering, and fixed-size invoker pools built from
//! `genie-providers`' factory. Mirrors the role `GenieEnvironment` plays in
//! `examples/original_source/genie_flow/environment.py`.

pub mod environment;
pub mod errors;
pub mod meta;
pub mod pool;
pub mod registry;

pub use environment::GenieTemplateEnvironment;
pub use errors::AdapterError;
