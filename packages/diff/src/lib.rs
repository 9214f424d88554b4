#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Splits a unified diff blob into [`Hunk`](stet_diff_models::Hunk)s and
//! minifies them for prompting.

pub mod minifier;
pub mod parser;

pub use minifier::minify_hunk;
pub use parser::parse_hunks;
