use crate::config::QuizConfig;
use crate::controller::{BlockOutcome, BlockState, Controller, DomEvent, Env, exercise_containers};
use crate::error::InteractionError;
use crate::identity::page_prefix;
use crate::timers::{TimerQueue, TimerTask};
use crate::trigger::{ContentChangeObserver, ContentSnapshot, PollingObserver, TriggerAction, action_for};
use answer_store::{AnswerStore, DurableStore, PersistedAnswerRecord};
use bus::{Bus, Notice, TriggerEvent};
use core_types::{Clock, LifecycleState, PagePath, TimestampMs, resolve_location};
use html::dom_utils::to_html;
use html::traverse::{IdAllocator, assign_node_ids, find_descendant, find_node_by_id_mut};
use html::{Node, parse_document, parse_fragment};
use log::{debug, info};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::mpsc::Sender;

/// Summary of one initialization pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    pub blocks: usize,
    pub materialized: usize,
    pub newly_bound: usize,
    pub abandoned: usize,
}

#[derive(Debug, Serialize)]
struct StorageDiagnostics<'a> {
    page: &'a str,
    durable_available: bool,
    page_keys: usize,
    fallback_keys: usize,
    durable_writes: usize,
    fallback_writes: usize,
}

/// Quiz widgets of one displayed page, with their store, timers and triggers.
///
/// The host owns the session, feeds it trigger events and DOM events, advances time through
/// its [`Clock`] and calls [`run_due_timers`](Self::run_due_timers). Every entry point can be
/// called any number of times; re-running a pass never rebuilds or rebinds a block.
pub struct QuizSession<D: DurableStore, C: Clock> {
    config: QuizConfig,
    store: AnswerStore<D>,
    clock: C,
    document: Node,
    location: String,
    page: PagePath,
    controller: Controller,
    timers: TimerQueue,
    observer: Box<dyn ContentChangeObserver>,
    bus: Bus,
    cleaned_pages: HashSet<PagePath>,
}

impl<D: DurableStore, C: Clock> QuizSession<D, C> {
    /// Mounts `html` as the document shown at `location`. No pass runs until
    /// [`TriggerEvent::DocumentReady`] (or [`reinitialize`](Self::reinitialize)).
    pub fn new(config: QuizConfig, durable: D, clock: C, location: &str, html: &str) -> Self {
        let mut store = AnswerStore::new(durable).with_fallback(config.fallback_storage);
        store.init();

        let mut document = parse_document(html);
        assign_node_ids(&mut document);

        let mut timers = TimerQueue::new();
        timers.schedule(clock.now_ms() + config.poll_interval_ms, TimerTask::Poll);

        Self {
            store,
            document,
            location: location.to_string(),
            page: PagePath::from_location(location),
            controller: Controller::new(),
            timers,
            observer: Box::new(PollingObserver::new()),
            bus: Bus::new(),
            cleaned_pages: HashSet::new(),
            clock,
            config,
        }
    }

    /// Replaces the content-change observer (e.g. with a native mutation observer).
    pub fn with_observer(mut self, observer: Box<dyn ContentChangeObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    pub fn document(&self) -> &Node {
        &self.document
    }

    /// Mutable access for hosts that edit the displayed content in place.
    pub fn document_mut(&mut self) -> &mut Node {
        &mut self.document
    }

    pub fn html(&self) -> String {
        to_html(&self.document)
    }

    pub fn page(&self) -> &PagePath {
        &self.page
    }

    pub fn store(&self) -> &AnswerStore<D> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AnswerStore<D> {
        &mut self.store
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn block(&self, identity: &str) -> Option<&BlockState> {
        self.controller.block(identity)
    }

    pub fn lifecycle(&self, identity: &str) -> Option<LifecycleState> {
        self.block(identity).map(|b| b.lifecycle)
    }

    pub fn identities(&self) -> Vec<&str> {
        self.controller
            .blocks()
            .iter()
            .map(|b| b.identity.as_str())
            .collect()
    }

    /// Persisted record of a bound block, if any.
    pub fn record(&mut self, identity: &str) -> Option<PersistedAnswerRecord> {
        let key = self.block(identity)?.key.clone();
        self.store.load_record(&key).ok().flatten()
    }

    /// Handle for delivering trigger events from host callbacks; see
    /// [`process_triggers`](Self::process_triggers).
    pub fn trigger_sender(&self) -> Sender<TriggerEvent> {
        self.bus.trigger_sender()
    }

    pub fn drain_notices(&self) -> Vec<Notice> {
        self.bus.drain_notices()
    }

    /// Handles every trigger event queued on the bus.
    pub fn process_triggers(&mut self) {
        for event in self.bus.pending_triggers() {
            self.handle(event);
        }
    }

    pub fn handle(&mut self, event: TriggerEvent) {
        if let TriggerEvent::ContentSwapped { location } = &event {
            // New document instance: nothing bound so far carries over.
            self.controller = Controller::new();
            self.location = location.clone();
            self.page = PagePath::from_location(location);
        }
        match action_for(&event, &self.config) {
            TriggerAction::ReinitializeNow => {
                self.reinitialize();
            }
            TriggerAction::ReinitializeAfter { delay_ms } => {
                let location = match &event {
                    TriggerEvent::LinkActivated { href } => resolve_location(&self.location, href),
                    _ => self.location.clone(),
                };
                let due = self.clock.now_ms() + delay_ms;
                self.timers.schedule(due, TimerTask::LinkReinit { location });
                debug!("reinitialization scheduled in {delay_ms}ms");
            }
            TriggerAction::CheckForChanges => {
                let snapshot = self.snapshot();
                if self.observer.observe(&snapshot) {
                    debug!("content changed: {snapshot:?}");
                    self.reinitialize();
                }
            }
        }
    }

    /// Fires every due timer. Returns how many fired.
    pub fn run_due_timers(&mut self) -> usize {
        let now = self.clock.now_ms();
        let due = self.timers.take_due(now);
        let fired = due.len();
        for (id, task) in due {
            match task {
                TimerTask::Autosave { key, text } => {
                    let (controller, mut env) = self.parts(now);
                    controller.flush_autosave(&mut env, id, &key, text);
                }
                TimerTask::LinkReinit { location } => {
                    self.report_location(&location);
                    self.reinitialize();
                }
                TimerTask::Poll => {
                    self.timers
                        .schedule(now + self.config.poll_interval_ms, TimerTask::Poll);
                    self.handle(TriggerEvent::PollTick);
                }
            }
        }
        fired
    }

    /// Records the location the host currently displays (history navigation, hash changes).
    /// The next pass, explicit or detected by polling, keys its blocks under that page.
    pub fn report_location(&mut self, location: &str) {
        self.location = location.to_string();
    }

    /// Runs the initialization pipeline over the current document. Safe to call at any time
    /// and any number of times.
    pub fn reinitialize(&mut self) -> PassReport {
        let now = self.clock.now_ms();
        self.sync_page();
        assign_node_ids(&mut self.document);
        self.cleanup_page_once();

        let containers = exercise_containers(&self.document);
        let mut report = PassReport {
            blocks: containers.len(),
            ..PassReport::default()
        };
        let mut ids = IdAllocator::for_tree(&self.document);
        let mut resolver = self.controller.begin_pass(&self.document);
        let (controller, mut env) = self.parts(now);

        for (i, container) in containers.into_iter().enumerate() {
            match controller.process_block(&mut env, &mut ids, &mut resolver, container, i + 1) {
                BlockOutcome::AlreadyBound => {}
                BlockOutcome::Bound { materialized } => {
                    report.newly_bound += 1;
                    report.materialized += usize::from(materialized);
                }
                BlockOutcome::Abandoned => report.abandoned += 1,
            }
        }

        let snapshot = self.snapshot();
        self.observer.observe(&snapshot);
        info!(
            "quiz pass on {}: {} blocks, {} newly bound, {} abandoned",
            self.page, report.blocks, report.newly_bound, report.abandoned
        );
        if self.config.debug_mode {
            self.log_diagnostics();
        }
        self.bus.notify(Notice::Reinitialized {
            at: now,
            blocks: report.blocks,
            newly_bound: report.newly_bound,
        });
        report
    }

    /// Mounts additional content at the end of the document body. The next pass (explicit or
    /// detected by polling) picks up new exercise blocks.
    pub fn append_content(&mut self, html: &str) {
        let nodes = parse_fragment(html);
        let parent = find_descendant(&self.document, &|n| n.is_element("body"))
            .map_or(self.document.id(), Node::id);
        if let Some(children) =
            find_node_by_id_mut(&mut self.document, parent).and_then(Node::children_mut)
        {
            children.extend(nodes);
        }
        assign_node_ids(&mut self.document);
    }

    /// Replaces the displayed content with a new document instance (single-page navigation)
    /// and initializes it. Pending autosaves of the old content still write their captured
    /// text to their captured keys.
    pub fn swap_content(&mut self, location: &str, html: &str) {
        self.document = parse_document(html);
        assign_node_ids(&mut self.document);
        self.handle(TriggerEvent::ContentSwapped {
            location: location.to_string(),
        });
    }

    /// Delivers a DOM event from the host.
    pub fn dispatch(&mut self, event: DomEvent) -> Result<(), InteractionError> {
        let now = self.clock.now_ms();
        let (controller, mut env) = self.parts(now);
        controller.dispatch(&mut env, event)
    }

    pub fn select_alternative(&mut self, identity: &str, index: usize) -> Result<(), InteractionError> {
        let target = self
            .bound(identity)?
            .alternatives
            .get(index)
            .copied()
            .ok_or_else(|| no_control(identity, "alternative"))?;
        self.dispatch(DomEvent::Click { target })
    }

    pub fn input_text(&mut self, identity: &str, value: &str) -> Result<(), InteractionError> {
        let target = self
            .bound(identity)?
            .text_input
            .ok_or_else(|| no_control(identity, "text input"))?;
        self.dispatch(DomEvent::Input {
            target,
            value: value.to_string(),
        })
    }

    pub fn submit(&mut self, identity: &str) -> Result<(), InteractionError> {
        let target = self.bound(identity)?.form;
        self.dispatch(DomEvent::Submit { target })
    }

    pub fn edit(&mut self, identity: &str) -> Result<(), InteractionError> {
        let target = self.bound(identity)?.edit_button;
        self.dispatch(DomEvent::Click { target })
    }

    fn parts(&mut self, now: TimestampMs) -> (&mut Controller, Env<'_, D>) {
        let env = Env {
            doc: &mut self.document,
            store: &mut self.store,
            timers: &mut self.timers,
            bus: &self.bus,
            config: &self.config,
            page: &self.page,
            now,
        };
        (&mut self.controller, env)
    }

    fn bound(&self, identity: &str) -> Result<&BlockState, InteractionError> {
        self.controller
            .block(identity)
            .ok_or_else(|| InteractionError::UnknownExercise(identity.to_string()))
    }

    /// Content shown under another logical page is a new document instance for the engine,
    /// even when the host mounted it in place.
    fn sync_page(&mut self) {
        let page = PagePath::from_location(&self.location);
        if page != self.page {
            info!("page changed from {} to {page}", self.page);
            self.controller = Controller::new();
            self.page = page;
        }
    }

    fn snapshot(&self) -> ContentSnapshot {
        ContentSnapshot {
            location: self.location.clone(),
            block_count: exercise_containers(&self.document).len(),
        }
    }

    /// Purges unparseable records under the current page, once per page path.
    fn cleanup_page_once(&mut self) {
        if !self.cleaned_pages.insert(self.page.clone()) {
            return;
        }
        let prefix = page_prefix(&self.page, &self.config.key_separator);
        let mut removed = 0;
        for key in self.store.keys_with_prefix(&prefix) {
            if self.store.load_record(&key).is_err() {
                self.store.remove(&key);
                removed += 1;
            }
        }
        if removed > 0 {
            info!("removed {removed} unreadable stored answers under {prefix}");
        }
    }

    fn log_diagnostics(&mut self) {
        let prefix = page_prefix(&self.page, &self.config.key_separator);
        let stats = self.store.stats();
        let diagnostics = StorageDiagnostics {
            page: self.page.as_str(),
            durable_available: self.store.is_available(),
            page_keys: self.store.keys_with_prefix(&prefix).len(),
            fallback_keys: self.store.fallback_len(),
            durable_writes: stats.durable_writes,
            fallback_writes: stats.fallback_writes,
        };
        match serde_json::to_string(&diagnostics) {
            Ok(json) => info!("quiz storage diagnostics: {json}"),
            Err(err) => debug!("could not encode storage diagnostics: {err}"),
        }
    }
}

fn no_control(identity: &str, control: &'static str) -> InteractionError {
    InteractionError::NoSuchControl {
        exercise: identity.to_string(),
        control,
    }
}
