#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! HTTP client for the local generation endpoint stet reviews against.
//!
//! Talks to two endpoints: a tags/list endpoint to confirm a model is
//! present, and a generation endpoint that accepts a prompt and returns
//! either a single JSON document or a stream of JSON-per-line deltas.

mod client;

pub use client::{LlmClient, LlmError, OllamaClient};
pub use stet_llm_models as models;
