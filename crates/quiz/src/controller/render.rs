//! DOM side of the lifecycle: enabled state, selection, feedback and answer visibility.

use super::BlockState;
use crate::markup;
use core_types::{ExerciseKind, LifecycleState};
use html::dom_utils::{collect_text, normalize_textarea_newlines};
use html::traverse::{collect_descendant_ids, find_descendant, find_node_by_id, find_node_by_id_mut};
use html::{Id, Node};

/// Brings the block's markup in line with its lifecycle state.
pub(crate) fn apply_lifecycle(doc: &mut Node, block: &BlockState) {
    match block.lifecycle {
        LifecycleState::Submitted => {
            set_enabled(doc, block, false);
            set_answer_visible(doc, block, true);
            if block.kind == ExerciseKind::Choice
                && let Some(selected) = read_selection(doc, block)
            {
                apply_feedback(doc, block, selected);
            }
        }
        LifecycleState::Unanswered | LifecycleState::Draft | LifecycleState::Editing => {
            set_enabled(doc, block, true);
            set_answer_visible(doc, block, false);
            clear_feedback(doc, block);
        }
    }
}

pub(crate) fn set_enabled(doc: &mut Node, block: &BlockState, enabled: bool) {
    let Some(form) = find_node_by_id_mut(doc, block.form) else {
        return;
    };
    let mut controls = Vec::new();
    collect_descendant_ids(form, &markup::is_form_control, &mut controls);
    for id in controls {
        let Some(control) = find_node_by_id_mut(form, id) else {
            continue;
        };
        if control.has_class(markup::EDIT_BUTTON) {
            continue;
        }
        if enabled {
            control.remove_attr("disabled");
        } else {
            control.set_attr("disabled", None);
        }
    }

    for &alt in &block.alternatives {
        if let Some(label) = find_node_by_id_mut(form, alt) {
            if enabled {
                label.remove_class(markup::DISABLED);
            } else {
                label.add_class(markup::DISABLED);
            }
        }
    }
}

pub(crate) fn is_alternative_disabled(doc: &Node, alt: Id) -> bool {
    find_node_by_id(doc, alt).is_some_and(|n| n.has_class(markup::DISABLED))
}

pub(crate) fn set_answer_visible(doc: &mut Node, block: &BlockState, visible: bool) {
    let Some(answer) = block.answer.and_then(|id| find_node_by_id_mut(doc, id)) else {
        return;
    };
    if visible {
        answer.add_class(markup::SHOW);
    } else {
        answer.remove_class(markup::SHOW);
    }
}

fn data_input_mut(label: &mut Node) -> Option<&mut Node> {
    let id = find_descendant(label, &markup::is_data_input)?.id();
    find_node_by_id_mut(label, id)
}

/// Exclusive selection: the chosen label gets `selected` and its hidden input carries the
/// index, every other hidden input is cleared.
pub(crate) fn set_selection(doc: &mut Node, block: &BlockState, selected: Option<usize>) {
    for (i, &alt) in block.alternatives.iter().enumerate() {
        let Some(label) = find_node_by_id_mut(doc, alt) else {
            continue;
        };
        let is_selected = selected == Some(i);
        if is_selected {
            label.add_class(markup::SELECTED);
        } else {
            label.remove_class(markup::SELECTED);
        }
        if let Some(input) = data_input_mut(label) {
            let value = if is_selected { i.to_string() } else { String::new() };
            input.set_attr("value", Some(&value));
        }
    }
}

/// Index of the selected alternative: the first whose hidden input holds a value, else the
/// first carrying the `selected` class.
pub(crate) fn read_selection(doc: &Node, block: &BlockState) -> Option<usize> {
    let labels: Vec<&Node> = block
        .alternatives
        .iter()
        .filter_map(|id| find_node_by_id(doc, *id))
        .collect();

    let by_value = labels.iter().position(|label| {
        find_descendant(label, &markup::is_data_input)
            .and_then(|input| input.attr("value"))
            .is_some_and(|v| !v.trim().is_empty())
    });
    by_value.or_else(|| labels.iter().position(|l| l.has_class(markup::SELECTED)))
}

/// Correctness feedback for `selected`. With no valid correct index the selection is marked
/// incorrect and nothing is marked correct.
pub(crate) fn apply_feedback(doc: &mut Node, block: &BlockState, selected: usize) {
    clear_feedback(doc, block);
    let correct = usize::try_from(block.correct_index)
        .ok()
        .filter(|i| *i < block.alternatives.len());

    let mut mark = |index: usize, class: &str| {
        if let Some(label) = block
            .alternatives
            .get(index)
            .and_then(|id| find_node_by_id_mut(doc, *id))
        {
            label.add_class(class);
        }
    };

    if correct == Some(selected) {
        mark(selected, markup::CORRECT);
    } else {
        mark(selected, markup::INCORRECT);
        if let Some(correct) = correct {
            mark(correct, markup::CORRECT);
        }
    }
}

pub(crate) fn clear_feedback(doc: &mut Node, block: &BlockState) {
    for &alt in &block.alternatives {
        if let Some(label) = find_node_by_id_mut(doc, alt) {
            label.remove_class(markup::CORRECT);
            label.remove_class(markup::INCORRECT);
        }
    }
}

pub(crate) fn set_text(doc: &mut Node, block: &BlockState, text: &str) {
    let Some(field) = block.text_input.and_then(|id| find_node_by_id_mut(doc, id)) else {
        return;
    };
    if field.is_element("textarea") {
        if let Some(children) = field.children_mut() {
            children.clear();
            if !text.is_empty() {
                children.push(Node::text(normalize_textarea_newlines(text)));
            }
        }
    } else {
        field.set_attr("value", Some(text));
    }
}

pub(crate) fn read_text(doc: &Node, block: &BlockState) -> String {
    let Some(field) = block.text_input.and_then(|id| find_node_by_id(doc, id)) else {
        return String::new();
    };
    if field.is_element("textarea") {
        let mut out = String::new();
        collect_text(field.children(), &mut out);
        out
    } else {
        field.attr("value").unwrap_or("").to_string()
    }
}
