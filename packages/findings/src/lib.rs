#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Parse, validate, filter, and merge findings produced by the model.
//!
//! This crate is a pure value transformer: in, a raw model response
//! string and the session's existing findings; out, a filtered
//! [`Finding`](stet_findings_models::Finding) list. It never touches disk
//! or the network, and never knows about sessions, history logs, or git —
//! those are the Orchestrator's job to wire together.

pub mod kill_list;
pub mod merge;
pub mod parser;
pub mod pipeline;
pub mod strictness;
pub mod suppression;
pub mod validate;

pub use kill_list::is_low_signal;
pub use merge::{MergeMode, merge};
pub use parser::{ParseError, parse_findings};
pub use pipeline::{PipelineOutcome, run_pipeline};
pub use strictness::{StrictnessParams, StrictnessPreset};
pub use suppression::suppress;
pub use validate::validate;
