//! Turns declarative exercise markup into interactive forms.

use crate::config::Labels;
use crate::error::MaterializeError;
use crate::markup;
use core_types::ExerciseKind;
use html::dom_utils::text_content;
use html::Node;
use html::traverse::{collect_descendant_ids, find_descendant, find_node_by_id_mut, replace_node};

/// One alternative of a choice exercise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alternative {
    pub text: String,
    pub marked_correct: bool,
}

/// Parses an authoring line such as `[x] Paris` into its display text and marker.
pub fn parse_alternative(raw: &str) -> Alternative {
    let raw = raw.trim();
    for (marker, marked_correct) in [("[x]", true), ("[X]", true), ("[ ]", false)] {
        if let Some(rest) = raw.strip_prefix(marker) {
            return Alternative {
                text: rest.trim().to_string(),
                marked_correct,
            };
        }
    }
    Alternative {
        text: raw.to_string(),
        marked_correct: false,
    }
}

/// Index of the first alternative marked correct, or `-1`.
pub fn correct_index(alternatives: &[Alternative]) -> i64 {
    alternatives
        .iter()
        .position(|a| a.marked_correct)
        .map_or(-1, |i| i as i64)
}

/// Builds the quiz form for `container` (whose node ids must be assigned) when it has none.
///
/// Returns `Ok(false)` when a form already exists, e.g. rendered by the content pipeline.
pub fn materialize(
    container: &mut Node,
    kind: ExerciseKind,
    labels: &Labels,
) -> Result<bool, MaterializeError> {
    mark_answer_block(container);
    if find_descendant(container, &markup::is_quiz_form).is_some() {
        return Ok(false);
    }

    match kind {
        ExerciseKind::Choice => materialize_choice(container, labels)?,
        ExerciseKind::ShortText | ExerciseKind::LongText => {
            append_child(container, markup::text_form(kind, labels));
        }
        ExerciseKind::SelfProgress => {
            append_child(container, markup::self_progress_form(labels));
        }
    }

    let kind_class = if kind == ExerciseKind::LongText
        && container.has_class("text")
        && !container.has_class("long")
    {
        markup::TEXT_KIND_CLASS
    } else {
        kind.container_class()
    };
    container.add_class(kind_class);
    Ok(true)
}

fn materialize_choice(container: &mut Node, labels: &Labels) -> Result<(), MaterializeError> {
    let missing = |what| MaterializeError::MissingStructure {
        container: container.id(),
        what,
    };

    let list = find_descendant(container, &|n| n.is_element("ul")).ok_or_else(|| missing("list"))?;
    let list_id = list.id();
    let alternatives: Vec<Alternative> = list
        .children()
        .iter()
        .filter(|c| c.is_element("li"))
        .map(read_list_item)
        .collect();
    if alternatives.is_empty() {
        return Err(missing("alternatives"));
    }

    let texts: Vec<String> = alternatives.iter().map(|a| a.text.clone()).collect();
    let form = markup::choice_form(&texts, labels);
    let container_id = container.id();
    if replace_node(container, list_id, form).is_none() {
        return Err(MaterializeError::MissingStructure {
            container: container_id,
            what: "list",
        });
    }
    let answer_idx = correct_index(&alternatives).to_string();
    container.set_attr(markup::ANSWER_IDX_ATTR, Some(&answer_idx));
    Ok(())
}

fn read_list_item(item: &Node) -> Alternative {
    let mut alternative = parse_alternative(&text_content(item));
    let checked_box = find_descendant(item, &|n| {
        n.is_element("input")
            && n.attr("type").is_some_and(|t| t.eq_ignore_ascii_case("checkbox"))
            && n.has_attr("checked")
    });
    if checked_box.is_some() {
        alternative.marked_correct = true;
    }
    alternative
}

fn append_child(container: &mut Node, child: Node) {
    if let Some(children) = container.children_mut() {
        children.push(child);
    }
}

/// Tags the answer block inside `container` so it can be shown and hidden.
pub fn mark_answer_block(container: &mut Node) {
    let mut ids = Vec::new();
    collect_descendant_ids(container, &markup::is_answer_block, &mut ids);
    for id in ids {
        if let Some(answer) = find_node_by_id_mut(container, id) {
            answer.add_class(markup::ANSWER);
        }
    }
}
