#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Review orchestration: ties git, RAG context assembly, the model
//! client, and session persistence together behind a handful of
//! top-level operations (`start`, `run`, `rerun`, `finish`, `cleanup`,
//! `dismiss`, `status`, `list`).
//!
//! Everything that coordinates across subsystems lives in
//! [`Orchestrator`]; its collaborators (`GitOps`, `LlmClient`, the symbol
//! resolver registry, the event sink) are passed in explicitly rather
//! than reached for through global state, so tests substitute fakes at
//! exactly one seam.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod prompts;
pub mod sink;
pub mod testing;

pub use config::ReviewConfig;
pub use error::CoreError;
pub use orchestrator::Orchestrator;
pub use sink::{EventSink, NdjsonSink, RunStats, TtyProgressSink};
pub use testing::DryRunLlmClient;
