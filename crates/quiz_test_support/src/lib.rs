//! Shared fixtures for quiz tests and benches: sample pages, a hand-driven clock and a
//! durable store that fails every call.

use answer_store::{DurableStore, StoreError};
use core_types::{Clock, TimestampMs};
use std::cell::Cell;
use std::rc::Rc;

/// Location the sample pages are served from. Keys are scoped to `/guide/loops`.
pub const LOCATION: &str = "https://docs.example.org/guide/loops/index.html";

pub const PAGE_PATH: &str = "/guide/loops";

/// One block of every kind, as the content pipeline emits them before materialization.
///
/// Identities after the first pass: `choice_1`, `short_1`, `long_1`, `self_progress_1`.
/// The correct alternative of the choice block is index 2.
pub const MIXED_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Loops</title></head><body><article>
<h1>Loops</h1>

<div class="admonition exercise choice"><p class="admonition-title">Exercise</p><p>Which loop runs its body at least once?</p><ul><li>[ ] for</li><li>[ ] while</li><li>[x] do-while</li></ul><div class="admonition answer"><p class="admonition-title">Answer</p><p>do-while checks its condition after the body.</p></div></div>

<div class="admonition exercise text short"><p class="admonition-title">Exercise</p><p>Name the keyword that leaves a loop early.</p><div class="admonition answer"><p class="admonition-title">Answer</p><p>break</p></div></div>

<div class="admonition exercise text long"><p class="admonition-title">Exercise</p><p>Explain when an infinite loop is useful.</p><div class="admonition answer"><p class="admonition-title">Answer</p><p>Event loops and servers.</p></div></div>

<div class="admonition exercise"><p class="admonition-title">Exercise</p><p>Rewrite the summation with a while loop.</p></div>

</article></body></html>
"#;

pub const CHOICE_ID: &str = "choice_1";
pub const SHORT_ID: &str = "short_1";
pub const LONG_ID: &str = "long_1";
pub const SELF_PROGRESS_ID: &str = "self_progress_1";

/// A second page with its own choice block, for navigation tests.
pub const OTHER_LOCATION: &str = "https://docs.example.org/guide/functions/";

pub const OTHER_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Functions</title></head><body><article>
<div class="admonition exercise choice"><p class="admonition-title">Exercise</p><p>Which keyword returns a value?</p><ul><li>[x] return</li><li>[ ] yield</li></ul></div>
</article></body></html>
"#;

/// A choice form already rendered by the pipeline, carrying its identity as an `id_` class.
///
/// Bound as `capital` without rebuilding; the correct alternative is index 1.
pub const PRERENDERED_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Geography</title></head><body>
<div class="admonition exercise id_capital" data-answer-idx="1"><p class="admonition-title">Exercise</p><p>Capital of France?</p><form class="quiz-form"><div class="quiz-alternative-set"><label class="quiz-alternative" data-alt-index="0"><div class="content"><span class="choice-text">Lyon</span></div><input type="hidden" name="data" value=""></label><label class="quiz-alternative" data-alt-index="1"><div class="content"><span class="choice-text">Paris</span></div><input type="hidden" name="data" value=""></label></div><button class="quiz-submit-button" type="submit">Submit</button></form><div class="admonition answer"><p>Paris</p></div></div>
</body></html>
"#;

/// Two containers claiming the same `id`. They resolve to `recap` and `recap-2`.
pub const DUPLICATE_ID_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Recap</title></head><body>
<div class="admonition exercise" id="recap"><p class="admonition-title">Exercise</p><p>Review the chapter.</p></div>
<div class="admonition exercise" id="recap"><p class="admonition-title">Exercise</p><p>Review the appendix.</p></div>
</body></html>
"#;

/// A choice block without its list, followed by a valid short-text block (`short_1`).
pub const MISSING_LIST_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Broken</title></head><body>
<div class="admonition exercise choice"><p class="admonition-title">Exercise</p><p>The list went missing.</p></div>
<div class="admonition exercise text short"><p class="admonition-title">Exercise</p><p>Still answerable.</p></div>
</body></html>
"#;

/// A block appended after the first pass (lazy-loaded content). Resolves to `choice_2` on
/// [`MIXED_PAGE`].
pub const APPENDED_BLOCK: &str = r#"<div class="admonition exercise choice"><p class="admonition-title">Exercise</p><p>Which loop iterates a range?</p><ul><li>[x] for</li><li>[ ] loop</li></ul></div>"#;

/// Persistence key of `identity` on [`MIXED_PAGE`].
pub fn key(identity: &str) -> String {
    format!("{PAGE_PATH}::{identity}")
}

/// Raw JSON of a choice record.
pub fn choice_record(submitted: bool, index: i64) -> String {
    serde_json::json!({
        "submitted": submitted,
        "selectedAlternativeIndex": index,
        "timestamp": 1,
    })
    .to_string()
}

/// Raw JSON of a text record.
pub fn text_record(submitted: bool, text: &str) -> String {
    serde_json::json!({
        "submitted": submitted,
        "answerText": text,
        "timestamp": 1,
    })
    .to_string()
}

/// Clock advanced by hand. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<TimestampMs>>,
}

impl ManualClock {
    pub fn new(start: TimestampMs) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance(&self, ms: TimestampMs) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, now: TimestampMs) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> TimestampMs {
        self.now.get()
    }
}

/// Durable store that rejects every call, like storage blocked by browser policy.
/// Clones share the call counter.
#[derive(Clone, Debug, Default)]
pub struct FailingStore {
    calls: Rc<Cell<usize>>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls attempted so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn fail<T>(&self) -> Result<T, StoreError> {
        self.calls.set(self.calls.get() + 1);
        Err(StoreError::Unavailable("blocked by policy".to_string()))
    }
}

impl DurableStore for FailingStore {
    fn set_item(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
        self.fail()
    }

    fn get_item(&self, _key: &str) -> Result<Option<String>, StoreError> {
        self.fail()
    }

    fn remove_item(&mut self, _key: &str) -> Result<(), StoreError> {
        self.fail()
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.fail()
    }
}
