//! # quizdoc
//!
//! Interactive quiz widgets for statically generated documentation pages.
//!
//! Exercise blocks emitted by the content pipeline are turned into forms, given stable
//! page-scoped identities, restored from persisted answers and driven through their
//! lifecycle. The whole pipeline can be re-run at any time (document ready, single-page
//! navigation, link activation, polling) without duplicating structure or handlers.
//!
//! ## Crates
//!
//! - [`quiz`]: classification, materialization, identity, lifecycle and the session
//! - [`answer_store`]: durable storage with an in-memory fallback
//! - [`bus`]: trigger events in, notices out
//! - [`core_types`]: shared vocabulary (kinds, lifecycle states, page paths, clocks)
//!
//! ```
//! use quizdoc::{LocalStorage, QuizConfig, QuizSession, SystemClock, TriggerEvent};
//!
//! let page = r#"<html><body>
//! <div class="admonition exercise text short"><p class="admonition-title">Exercise</p></div>
//! </body></html>"#;
//! let mut session = QuizSession::new(
//!     QuizConfig::default(),
//!     LocalStorage::new(),
//!     SystemClock,
//!     "/guide/intro/",
//!     page,
//! );
//! session.handle(TriggerEvent::DocumentReady);
//! session.input_text("short_1", "42").unwrap();
//! session.submit("short_1").unwrap();
//! assert_eq!(session.record("short_1").unwrap().answer_text.as_deref(), Some("42"));
//! ```

pub use answer_store::{
    AnswerStore, DisabledStore, DurableStore, FileStore, LocalStorage, PersistedAnswerRecord,
};
pub use bus::{Notice, TriggerEvent};
pub use core_types::{Clock, ExerciseKind, LifecycleState, PagePath, SystemClock};
pub use quiz::{DomEvent, InteractionError, Labels, PassReport, QuizConfig, QuizSession};

pub use answer_store;
pub use bus;
pub use core_types;
pub use quiz;
