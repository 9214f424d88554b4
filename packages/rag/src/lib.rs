#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Retrieval-augmented context assembly: per-language symbol resolution,
//! call-graph traversal, and token-budgeted prompt composition.

pub mod callgraph;
pub mod context;
pub mod profile;
pub mod registry;
pub mod resolver;
pub mod tokens;

pub use callgraph::{CallGraph, resolve_call_graph};
pub use context::{BuiltContext, ContextBudget, build_context};
pub use profile::LanguageProfile;
pub use registry::SymbolResolverRegistry;
pub use resolver::{Definition, ResolveOptions, resolve_symbols};
