//! Per-block state machine, handler binding and the idempotent initialization pass.

mod handlers;
mod render;
mod restore;

pub use handlers::{Binding, EventKind, Handler, HandlerTable};

use crate::classify::{Classification, classify};
use crate::config::QuizConfig;
use crate::error::{InteractionError, MaterializeError};
use crate::identity::{IdentityResolver, adopt_pipeline_id, storage_key};
use crate::markup;
use crate::materialize::{mark_answer_block, materialize};
use crate::numbering::Numbering;
use crate::timers::{TimerId, TimerQueue, TimerTask};
use answer_store::{AnswerStore, DurableStore, PersistedAnswerRecord};
use bus::{Bus, Notice};
use core_types::{ExerciseKind, LifecycleState, PagePath, TimestampMs};
use html::traverse::{
    IdAllocator, collect_descendant_ids, find_descendant, find_node_by_id, find_node_by_id_mut,
    path_to,
};
use html::{Id, Node};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

/// A bound exercise block. Node ids point into the current document instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockState {
    pub identity: String,
    /// Page-scoped persistence key.
    pub key: String,
    pub classification: Classification,
    /// Interaction rules in effect (ambiguous blocks behave as self-progress).
    pub kind: ExerciseKind,
    pub container: Id,
    pub form: Id,
    /// Alternative labels in document order (choice only).
    pub alternatives: Vec<Id>,
    pub text_input: Option<Id>,
    pub answer: Option<Id>,
    pub edit_button: Id,
    /// Read once at bind time; `-1` when no alternative is marked correct.
    pub correct_index: i64,
    pub lifecycle: LifecycleState,
    pub pending_autosave: Option<TimerId>,
}

/// Host DOM events, addressed by the node they happened on. They bubble to ancestors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomEvent {
    Click { target: Id },
    Input { target: Id, value: String },
    Submit { target: Id },
}

impl DomEvent {
    pub fn target(&self) -> Id {
        match self {
            DomEvent::Click { target }
            | DomEvent::Input { target, .. }
            | DomEvent::Submit { target } => *target,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            DomEvent::Click { .. } => EventKind::Click,
            DomEvent::Input { .. } => EventKind::Input,
            DomEvent::Submit { .. } => EventKind::Submit,
        }
    }
}

/// Borrowed session state a controller operation works against.
pub struct Env<'a, D: DurableStore> {
    pub doc: &'a mut Node,
    pub store: &'a mut AnswerStore<D>,
    pub timers: &'a mut TimerQueue,
    pub bus: &'a Bus,
    pub config: &'a QuizConfig,
    pub page: &'a PagePath,
    pub now: TimestampMs,
}

/// What one pass did with one exercise container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockOutcome {
    AlreadyBound,
    Bound { materialized: bool },
    Abandoned,
}

/// Containers already handled in the current document instance.
#[derive(Debug, Default)]
struct Registry {
    processed: HashSet<Id>,
    abandoned: HashSet<Id>,
    labeled: HashSet<Id>,
    bound: HashSet<Id>,
    /// Identity last written onto each processed container.
    names: HashMap<Id, String>,
}

impl Registry {
    fn forget(&mut self, container: Id) {
        self.processed.remove(&container);
        self.abandoned.remove(&container);
        self.labeled.remove(&container);
        self.bound.remove(&container);
        self.names.remove(&container);
    }
}

#[derive(Debug, Default)]
pub struct Controller {
    blocks: Vec<BlockState>,
    by_identity: HashMap<String, usize>,
    by_container: HashMap<Id, usize>,
    registry: Registry,
    handlers: HandlerTable,
    numbering: Numbering,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> &[BlockState] {
        &self.blocks
    }

    pub fn block(&self, identity: &str) -> Option<&BlockState> {
        self.by_identity.get(identity).map(|&i| &self.blocks[i])
    }

    pub fn handlers(&self) -> &HandlerTable {
        &self.handlers
    }

    pub fn numbering(&self) -> &Numbering {
        &self.numbering
    }

    /// Prepares a pass over `doc`: forgets blocks whose container left the document and
    /// returns a resolver with the identities of the remaining bound blocks reserved.
    pub fn begin_pass(&mut self, doc: &Node) -> IdentityResolver {
        self.prune(doc);
        let mut resolver = IdentityResolver::new();
        for block in &self.blocks {
            resolver.reserve(&block.identity);
        }
        resolver
    }

    /// A container is still ours while it is an exercise container carrying the identity we
    /// wrote, and, once bound, still holds the bound form.
    fn prune(&mut self, doc: &Node) {
        let stale: HashSet<Id> = self
            .registry
            .processed
            .iter()
            .copied()
            .filter(|&container| {
                let form = self.by_container.get(&container).map(|&i| self.blocks[i].form);
                let live = find_node_by_id(doc, container).is_some_and(|node| {
                    markup::is_exercise_container(node)
                        && node.attr("id") == self.registry.names.get(&container).map(String::as_str)
                        && form.is_none_or(|form| {
                            find_node_by_id(node, form).is_some_and(markup::is_quiz_form)
                        })
                });
                !live
            })
            .collect();
        if stale.is_empty() {
            return;
        }

        for &container in &stale {
            self.registry.forget(container);
        }
        let mut remap = HashMap::new();
        let mut kept = Vec::with_capacity(self.blocks.len());
        for (old, block) in std::mem::take(&mut self.blocks).into_iter().enumerate() {
            if stale.contains(&block.container) {
                debug!("dropping {}: its container left the document", block.identity);
                continue;
            }
            remap.insert(old, kept.len());
            kept.push(block);
        }
        self.blocks = kept;
        self.handlers.remap(|old| remap.get(&old).copied());
        self.by_identity = self
            .blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.identity.clone(), i))
            .collect();
        self.by_container = self
            .blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.container, i))
            .collect();
    }

    /// Runs one pass over the exercise container `container` at 1-based `position`:
    /// materialize once, resolve its identity, number it once, bind it once. `resolver` must
    /// come from [`begin_pass`](Self::begin_pass).
    pub fn process_block<D: DurableStore>(
        &mut self,
        env: &mut Env<'_, D>,
        ids: &mut IdAllocator,
        resolver: &mut IdentityResolver,
        container: Id,
        position: usize,
    ) -> BlockOutcome {
        let bound = self.by_container.get(&container).copied();
        let Some(node) = find_node_by_id_mut(env.doc, container) else {
            return BlockOutcome::Abandoned;
        };

        let existing = match bound {
            Some(_) => None,
            None => adopt_pipeline_id(node),
        };
        let classification = match bound {
            Some(i) => self.blocks[i].classification,
            None => classify(node),
        };

        let mut materialized = false;
        if self.registry.processed.insert(container) {
            match materialize(node, classification.behavior(), &env.config.labels) {
                Ok(built) => materialized = built,
                Err(err) => {
                    warn!("abandoning exercise block: {err}");
                    self.registry.abandoned.insert(container);
                }
            }
            ids.assign(node);
        }

        let identity = match bound {
            Some(i) => resolver.keep(&self.blocks[i].identity, classification),
            None => resolver.resolve(existing.as_deref(), classification, position),
        };
        node.set_attr("id", Some(&identity));
        self.registry.names.insert(container, identity.clone());

        if self.registry.labeled.insert(container)
            && let Some(title) = self.numbering.label(node, classification.kind(), &env.config.labels)
        {
            debug!("{identity}: titled {title:?}");
        }

        if self.registry.abandoned.contains(&container) {
            return BlockOutcome::Abandoned;
        }
        if self.registry.bound.contains(&container) {
            return BlockOutcome::AlreadyBound;
        }

        match self.bind(env, ids, container, identity, classification) {
            Ok(()) => BlockOutcome::Bound { materialized },
            Err(err) => {
                warn!("abandoning exercise block: {err}");
                self.registry.abandoned.insert(container);
                BlockOutcome::Abandoned
            }
        }
    }

    fn bind<D: DurableStore>(
        &mut self,
        env: &mut Env<'_, D>,
        ids: &mut IdAllocator,
        container: Id,
        identity: String,
        classification: Classification,
    ) -> Result<(), MaterializeError> {
        let missing = |what| MaterializeError::MissingStructure { container, what };
        let kind = classification.behavior();
        let node = find_node_by_id_mut(env.doc, container).ok_or_else(|| missing("container"))?;

        let form = find_descendant(node, &markup::is_quiz_form).ok_or_else(|| missing("form"))?;
        let form_id = form.id();
        let mut alternatives = Vec::new();
        collect_descendant_ids(form, &|n| n.has_class(markup::ALTERNATIVE), &mut alternatives);
        let text_input = find_descendant(form, &is_text_field).map(Node::id);
        match kind {
            ExerciseKind::Choice if alternatives.is_empty() => return Err(missing("alternatives")),
            ExerciseKind::ShortText | ExerciseKind::LongText if text_input.is_none() => {
                return Err(missing("text input"));
            }
            _ => {}
        }

        let correct_index = node
            .attr(markup::ANSWER_IDX_ATTR)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(-1);
        mark_answer_block(node);
        let answer = find_descendant(node, &markup::is_answer_block).map(Node::id);
        let edit_button = match find_descendant(node, &|n| n.has_class(markup::EDIT_BUTTON)) {
            Some(button) => button.id(),
            None => append_edit_button(node, ids, env.config),
        };

        let index = self.blocks.len();
        for (i, &alt) in alternatives.iter().enumerate() {
            self.handlers.attach(alt, index, Handler::SelectAlternative { index: i });
        }
        if let Some(field) = text_input {
            self.handlers.attach(field, index, Handler::Autosave);
        }
        self.handlers.attach(form_id, index, Handler::Submit);
        self.handlers.attach(edit_button, index, Handler::Edit);
        self.registry.bound.insert(container);

        let key = storage_key(env.page, &env.config.key_separator, &identity);
        debug!("binding {identity} ({kind}) as {key}");
        self.blocks.push(BlockState {
            identity: identity.clone(),
            key,
            classification,
            kind,
            container,
            form: form_id,
            alternatives,
            text_input,
            answer,
            edit_button,
            correct_index,
            lifecycle: LifecycleState::Unanswered,
            pending_autosave: None,
        });
        self.by_identity.insert(identity, index);
        self.by_container.insert(container, index);

        restore::restore(env.doc, &mut self.blocks[index], env.store);
        Ok(())
    }

    /// Routes a host event through the handler table, starting at the target and bubbling up.
    pub fn dispatch<D: DurableStore>(
        &mut self,
        env: &mut Env<'_, D>,
        event: DomEvent,
    ) -> Result<(), InteractionError> {
        let target = event.target();
        let path = path_to(env.doc, target).ok_or(InteractionError::UnknownTarget(target))?;
        // Activating a submit button submits its form.
        let event = match event {
            DomEvent::Click { target }
                if find_node_by_id(env.doc, target).is_some_and(is_submit_button) =>
            {
                DomEvent::Submit { target }
            }
            other => other,
        };
        let binding = path
            .iter()
            .rev()
            .find_map(|id| self.handlers.find(*id, event.kind()))
            .ok_or(InteractionError::UnknownTarget(target))?;

        match (binding.handler, event) {
            (Handler::SelectAlternative { index }, _) => {
                self.select_alternative(env, binding.block, index)
            }
            (Handler::Autosave, DomEvent::Input { value, .. }) => {
                self.input_text(env, binding.block, value)
            }
            (Handler::Submit, _) => self.submit(env, binding.block),
            (Handler::Edit, _) => self.edit(env, binding.block),
            (Handler::Autosave, _) => Err(InteractionError::UnknownTarget(target)),
        }
    }

    fn select_alternative<D: DurableStore>(
        &mut self,
        env: &mut Env<'_, D>,
        block: usize,
        index: usize,
    ) -> Result<(), InteractionError> {
        let block = &self.blocks[block];
        let disabled = block
            .alternatives
            .get(index)
            .is_none_or(|alt| render::is_alternative_disabled(env.doc, *alt));
        if !block.lifecycle.is_enabled() || disabled {
            debug!("{}: alternative click ignored, form is disabled", block.identity);
            return Err(InteractionError::Disabled {
                exercise: block.identity.clone(),
            });
        }
        render::set_selection(env.doc, block, Some(index));
        Ok(())
    }

    fn input_text<D: DurableStore>(
        &mut self,
        env: &mut Env<'_, D>,
        block: usize,
        value: String,
    ) -> Result<(), InteractionError> {
        let block = &mut self.blocks[block];
        if !block.lifecycle.is_enabled() {
            return Err(InteractionError::Disabled {
                exercise: block.identity.clone(),
            });
        }
        render::set_text(env.doc, block, &value);
        if block.lifecycle == LifecycleState::Unanswered {
            block.lifecycle = LifecycleState::Draft;
        }

        if env.config.auto_save {
            if let Some(pending) = block.pending_autosave.take() {
                env.timers.cancel(pending);
            }
            let due = env.now + env.config.autosave_delay_ms;
            let task = TimerTask::Autosave {
                key: block.key.clone(),
                text: value,
            };
            block.pending_autosave = Some(env.timers.schedule(due, task));
        }
        Ok(())
    }

    fn submit<D: DurableStore>(
        &mut self,
        env: &mut Env<'_, D>,
        block: usize,
    ) -> Result<(), InteractionError> {
        let block = &mut self.blocks[block];
        if !block.lifecycle.is_enabled() {
            return Err(InteractionError::Disabled {
                exercise: block.identity.clone(),
            });
        }

        let record = match block.kind {
            ExerciseKind::Choice => {
                let Some(selected) = render::read_selection(env.doc, block) else {
                    env.bus.notify(Notice::Prompt {
                        exercise: block.identity.clone(),
                        message: env.config.labels.select_option_prompt.clone(),
                    });
                    return Err(InteractionError::NoSelection {
                        exercise: block.identity.clone(),
                    });
                };
                render::set_selection(env.doc, block, Some(selected));
                PersistedAnswerRecord::submitted_choice(selected, env.now)
            }
            ExerciseKind::ShortText | ExerciseKind::LongText => {
                let text = render::read_text(env.doc, block).trim().to_string();
                render::set_text(env.doc, block, &text);
                PersistedAnswerRecord::submitted_text(text, env.now)
            }
            ExerciseKind::SelfProgress => PersistedAnswerRecord {
                submitted: true,
                timestamp: env.now,
                ..PersistedAnswerRecord::default()
            },
        };

        if let Some(pending) = block.pending_autosave.take() {
            env.timers.cancel(pending);
        }
        block.lifecycle = LifecycleState::Submitted;
        render::apply_lifecycle(env.doc, block);
        persist(env, &block.key, &record);
        debug!("{} submitted", block.identity);
        Ok(())
    }

    fn edit<D: DurableStore>(
        &mut self,
        env: &mut Env<'_, D>,
        block: usize,
    ) -> Result<(), InteractionError> {
        let block = &mut self.blocks[block];
        if block.lifecycle != LifecycleState::Submitted {
            debug!("{}: edit ignored in {:?}", block.identity, block.lifecycle);
            return Ok(());
        }

        block.lifecycle = LifecycleState::Editing;
        render::apply_lifecycle(env.doc, block);
        let record = PersistedAnswerRecord {
            submitted: false,
            selected_alternative_index: match block.kind {
                ExerciseKind::Choice => {
                    render::read_selection(env.doc, block).map(|i| i as i64)
                }
                _ => None,
            },
            answer_text: block
                .kind
                .is_text()
                .then(|| render::read_text(env.doc, block)),
            timestamp: env.now,
        };
        persist(env, &block.key, &record);
        Ok(())
    }

    /// Fires a debounced save: merges the captured text into whatever record is stored under
    /// the captured key, keeping its submitted flag.
    pub fn flush_autosave<D: DurableStore>(
        &mut self,
        env: &mut Env<'_, D>,
        timer: TimerId,
        key: &str,
        text: String,
    ) {
        for block in &mut self.blocks {
            if block.pending_autosave == Some(timer) {
                block.pending_autosave = None;
            }
        }

        let mut record = match env.store.load_record(key) {
            Ok(record) => record.unwrap_or_default(),
            Err(err) => {
                debug!("autosave replaces unreadable record {key}: {err}");
                PersistedAnswerRecord::default()
            }
        };
        record.answer_text = Some(text);
        record.timestamp = env.now;
        persist(env, key, &record);
    }
}

fn persist<D: DurableStore>(env: &mut Env<'_, D>, key: &str, record: &PersistedAnswerRecord) {
    let durable = env.store.save_record(key, record);
    debug!("saved {key} (durable: {durable})");
    env.bus.notify(Notice::Persisted {
        key: key.to_string(),
        submitted: record.submitted,
    });
}

fn is_submit_button(node: &Node) -> bool {
    node.is_element("button")
        && node
            .attr("type")
            .is_none_or(|t| t.eq_ignore_ascii_case("submit"))
}

fn is_text_field(node: &Node) -> bool {
    node.has_class(markup::TEXT_INPUT)
        || node.is_element("textarea")
        || (node.is_element("input")
            && node
                .attr("type")
                .is_none_or(|t| t.eq_ignore_ascii_case("text")))
}

/// Appends a new edit button to the container's title (or the container itself).
fn append_edit_button(container: &mut Node, ids: &mut IdAllocator, config: &QuizConfig) -> Id {
    let mut button = markup::edit_button(&config.labels);
    ids.assign(&mut button);
    let id = button.id();

    let Some(children) = container.children_mut() else {
        return id;
    };
    match children.iter_mut().find(|c| markup::is_title(c)) {
        Some(title) => {
            if let Some(title_children) = title.children_mut() {
                title_children.push(button);
            }
        }
        None => children.push(button),
    }
    id
}

/// Exercise containers of `doc` in document order.
pub fn exercise_containers(doc: &Node) -> Vec<Id> {
    let mut out = Vec::new();
    collect_descendant_ids(doc, &markup::is_exercise_container, &mut out);
    out
}
