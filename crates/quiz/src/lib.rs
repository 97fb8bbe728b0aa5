//! # quiz
//!
//! Interactive exercise blocks inside generated documentation pages.
//!
//! A [`QuizSession`] owns one displayed document and runs the initialization pipeline over it
//! whenever a trigger fires:
//! - [`classify`]: decides the kind of an exercise container from its structure or hints
//! - [`materialize`]: builds the interactive form for blocks the content pipeline left raw
//! - [`identity`]: assigns stable, page-scoped identities used as persistence keys
//! - [`numbering`]: titles blocks "Question N" / "Exercise N"
//! - [`controller`]: binds handlers once per block, restores persisted answers and drives the
//!   Unanswered → Draft → Submitted → Editing lifecycle
//! - [`trigger`]: maps host triggers to passes, behind a [`ContentChangeObserver`]
//!
//! ## Idempotency
//!
//! Every pass may run over a document that earlier passes already touched. The controller's
//! registry (processed, labeled and bound containers) is the only record of that; it is
//! dropped when a new document instance is swapped in.

pub mod classify;
pub mod config;
pub mod controller;
pub mod error;
pub mod identity;
pub mod markup;
pub mod materialize;
pub mod numbering;
pub mod session;
pub mod timers;
pub mod trigger;

pub use classify::{Classification, classify};
pub use config::{Labels, QuizConfig};
pub use controller::{BlockState, Controller, DomEvent, Handler, HandlerTable};
pub use error::{ConfigError, InteractionError, MaterializeError};
pub use session::{PassReport, QuizSession};
pub use timers::{TimerId, TimerQueue, TimerTask};
pub use trigger::{ContentChangeObserver, ContentSnapshot, PollingObserver};
