#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Atomic on-disk persistence for a review [`Session`](stet_session_models::Session),
//! an advisory cross-process lock guarding mutation, and an append-only
//! dismissal history log.
//!
//! Layout under a state directory (`<repo>/.review` by default):
//!
//! ```text
//! session.json            one serialized Session document (atomic)
//! session.lock            advisory lock file
//! history.jsonl           append-only dismissal log (rotated)
//! ```

mod store;

pub use store::{
    HISTORY_ROTATION_CEILING, HistoryLog, SessionLockGuard, SessionStore, SessionStoreError,
};
pub use stet_session_models as models;
