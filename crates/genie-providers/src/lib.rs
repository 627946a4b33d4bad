//! Concrete `Invoker` implementations for GenieFlow's closed provider set
//! (spec §4.7): `verbatim`, `openai.chat`, `openai.json`, `weaviate`,
//! `neo4j`, `http`. Each module holds one provider's connection parameters
//! and its `Invoker::invoke` body; `factory` registers them by string type
//! the way the teacher's `chem-providers` registers property calculators by
//! string name.
//!
//! None of these wire a real network client (no `reqwest`, no vendor SDKs):
//! bodies here are the minimal adapter shape the engine needs to exercise
//! its dispatch, DAG and polling machinery end to end without a live
//! OpenAI/Weaviate/Neo4j deployment. A deployment wires its own client in by
//! implementing `genie_core::invoker::Invoker` and registering it in a
//! custom factory.

pub mod factory;
pub mod http;
pub mod neo4j;
pub mod openai_chat;
pub mod openai_json;
pub mod verbatim;
pub mod weaviate;

pub use factory::build_invoker;
pub use http::HttpInvoker;
pub use neo4j::Neo4jInvoker;
pub use openai_chat::OpenAiChatInvoker;
pub use openai_json::OpenAiJsonInvoker;
pub use verbatim::VerbatimInvoker;
pub use weaviate::WeaviateInvoker;
