use super::BlockState;
use super::render;
use answer_store::{AnswerStore, DurableStore, PersistedAnswerRecord};
use core_types::{ExerciseKind, LifecycleState};
use html::Node;
use log::{debug, warn};

/// Restores a freshly bound block from its persisted record and renders the result.
///
/// Records that cannot be surfaced (unparseable, or a submitted choice without a valid
/// selection) are removed and the block starts over as `Unanswered`.
pub(crate) fn restore<D: DurableStore>(
    doc: &mut Node,
    block: &mut BlockState,
    store: &mut AnswerStore<D>,
) -> LifecycleState {
    block.lifecycle = match load_valid(block, store) {
        Some(record) => apply_record(doc, block, &record),
        None => LifecycleState::Unanswered,
    };
    render::apply_lifecycle(doc, block);
    debug!("restored {} as {:?}", block.identity, block.lifecycle);
    block.lifecycle
}

fn load_valid<D: DurableStore>(
    block: &BlockState,
    store: &mut AnswerStore<D>,
) -> Option<PersistedAnswerRecord> {
    let checked = store.load_record(&block.key).and_then(|record| match record {
        Some(record) if block.kind == ExerciseKind::Choice => record
            .validate_choice(block.alternatives.len())
            .map(|()| Some(record)),
        other => Ok(other),
    });

    match checked {
        Ok(record) => record,
        Err(err) => {
            warn!("discarding stored answer {}: {err}", block.key);
            store.remove(&block.key);
            None
        }
    }
}

fn apply_record(doc: &mut Node, block: &BlockState, record: &PersistedAnswerRecord) -> LifecycleState {
    let text = record.answer_text.as_deref().unwrap_or("");
    let has_payload = match block.kind {
        ExerciseKind::Choice => {
            let selected = record.selection_in_range(block.alternatives.len());
            render::set_selection(doc, block, selected);
            selected.is_some()
        }
        ExerciseKind::ShortText | ExerciseKind::LongText => {
            render::set_text(doc, block, text);
            !text.is_empty()
        }
        ExerciseKind::SelfProgress => false,
    };

    if record.submitted {
        LifecycleState::Submitted
    } else if has_payload {
        // A reopened answer and a draft read back the same after a reload.
        LifecycleState::Draft
    } else {
        LifecycleState::Unanswered
    }
}
