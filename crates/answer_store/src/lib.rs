//! # answer_store
//!
//! Persistence layer for learner answers.
//!
//! - [`DurableStore`]: the key/value facility that survives reloads (browser storage, files)
//! - [`AnswerStore`]: adapter that probes the durable store once, demotes to an in-process map
//!   whenever the durable store fails, and never surfaces storage errors to callers
//! - [`PersistedAnswerRecord`]: the JSON snapshot stored per exercise
//!
//! ## Design Principles
//!
//! Storage problems are never fatal. Every failing call degrades to the in-memory fallback and
//! is reported only through the `log` facade, so the rest of the page keeps working with a
//! session-scoped store.

mod durable;
mod fallback;
mod record;

pub use durable::{DisabledStore, DurableStore, FileStore, LocalStorage, StoreError};
pub use fallback::{AnswerStore, StoreStats};
pub use record::{PersistedAnswerRecord, RecordError};
