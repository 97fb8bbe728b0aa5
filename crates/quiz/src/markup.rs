//! Class names, attributes and element builders of the interactive quiz markup.

use crate::config::Labels;
use core_types::ExerciseKind;
use html::Node;

pub const ADMONITION: &str = "admonition";
pub const EXERCISE: &str = "exercise";
pub const TITLE: &str = "admonition-title";
pub const ANSWER_ADMONITION: &str = "answer";

pub const FORM: &str = "quiz-form";
pub const ALTERNATIVE_SET: &str = "quiz-alternative-set";
pub const ALTERNATIVE: &str = "quiz-alternative";
pub const CHOICE_TEXT: &str = "choice-text";
pub const TEXT_CONTAINER: &str = "quiz-text-container";
pub const TEXT_INPUT: &str = "quiz-text-input";
pub const SELF_PROGRESS: &str = "quiz-self-progress";
pub const SUBMIT_BUTTON: &str = "quiz-submit-button";
pub const EDIT_BUTTON: &str = "quiz-edit-button";
pub const ANSWER: &str = "quiz-answer";
/// Container class for blocks hinted as plain `text`.
pub const TEXT_KIND_CLASS: &str = "exercise-text";

pub const SELECTED: &str = "selected";
pub const CORRECT: &str = "correct";
pub const INCORRECT: &str = "incorrect";
pub const DISABLED: &str = "disabled";
pub const SHOW: &str = "show";

pub const ALT_INDEX_ATTR: &str = "data-alt-index";
pub const ANSWER_IDX_ATTR: &str = "data-answer-idx";
/// Class prefix through which the content pipeline assigns explicit identities.
pub const ID_CLASS_PREFIX: &str = "id_";

const PENCIL: &str = "\u{270E}";

pub fn is_exercise_container(node: &Node) -> bool {
    node.is_element("div") && node.has_class(ADMONITION) && node.has_class(EXERCISE)
}

pub fn is_quiz_form(node: &Node) -> bool {
    node.is_element("form") && node.has_class(FORM)
}

pub fn is_answer_block(node: &Node) -> bool {
    node.has_class(ANSWER) || (node.has_class(ADMONITION) && node.has_class(ANSWER_ADMONITION))
}

pub fn is_title(node: &Node) -> bool {
    node.has_class(TITLE)
}

/// Value-carrying input of an alternative.
pub fn is_data_input(node: &Node) -> bool {
    node.is_element("input") && node.attr("name") == Some("data")
}

/// Input, button or textarea, the elements a disabled form switches off.
pub fn is_form_control(node: &Node) -> bool {
    node.is_element("input") || node.is_element("button") || node.is_element("textarea")
}

fn submit_button(label: &str) -> Node {
    Node::element(
        "button",
        &[("class", Some(SUBMIT_BUTTON)), ("type", Some("submit"))],
        vec![Node::text(label)],
    )
}

pub fn choice_form(alternatives: &[String], labels: &Labels) -> Node {
    let items = alternatives
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let index = i.to_string();
            Node::element(
                "label",
                &[("class", Some(ALTERNATIVE)), (ALT_INDEX_ATTR, Some(index.as_str()))],
                vec![
                    Node::element(
                        "div",
                        &[("class", Some("content"))],
                        vec![Node::element(
                            "span",
                            &[("class", Some(CHOICE_TEXT))],
                            vec![Node::text(text.as_str())],
                        )],
                    ),
                    Node::element(
                        "input",
                        &[("type", Some("hidden")), ("name", Some("data")), ("value", Some(""))],
                        vec![],
                    ),
                ],
            )
        })
        .collect();

    Node::element(
        "form",
        &[("class", Some(FORM))],
        vec![
            Node::element("div", &[("class", Some(ALTERNATIVE_SET))], items),
            submit_button(&labels.submit),
        ],
    )
}

pub fn text_form(kind: ExerciseKind, labels: &Labels) -> Node {
    let field = match kind {
        ExerciseKind::LongText => Node::element(
            "textarea",
            &[
                ("class", Some(TEXT_INPUT)),
                ("name", Some("data")),
                ("rows", Some("4")),
                ("placeholder", Some(labels.long_placeholder.as_str())),
            ],
            vec![],
        ),
        _ => Node::element(
            "input",
            &[
                ("class", Some(TEXT_INPUT)),
                ("type", Some("text")),
                ("name", Some("data")),
                ("value", Some("")),
                ("placeholder", Some(labels.short_placeholder.as_str())),
                ("autocomplete", Some("off")),
            ],
            vec![],
        ),
    };

    Node::element(
        "form",
        &[("class", Some(FORM))],
        vec![
            Node::element("div", &[("class", Some(TEXT_CONTAINER))], vec![field]),
            submit_button(&labels.submit),
        ],
    )
}

pub fn self_progress_form(labels: &Labels) -> Node {
    Node::element(
        "form",
        &[("class", Some(FORM))],
        vec![Node::element(
            "div",
            &[("class", Some(SELF_PROGRESS))],
            vec![
                Node::element(
                    "input",
                    &[("type", Some("hidden")), ("name", Some("data")), ("value", Some("done"))],
                    vec![],
                ),
                submit_button(&labels.mark_done),
            ],
        )],
    )
}

pub fn edit_button(labels: &Labels) -> Node {
    Node::element(
        "button",
        &[
            ("class", Some(EDIT_BUTTON)),
            ("type", Some("button")),
            ("title", Some(labels.edit_title.as_str())),
        ],
        vec![Node::text(PENCIL)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use html::dom_utils::to_html;

    #[test]
    fn choice_form_layout() {
        let form = choice_form(&["A".to_string(), "B".to_string()], &Labels::default());
        assert_eq!(
            to_html(&form),
            concat!(
                r#"<form class="quiz-form"><div class="quiz-alternative-set">"#,
                r#"<label class="quiz-alternative" data-alt-index="0"><div class="content"><span class="choice-text">A</span></div><input type="hidden" name="data" value=""></label>"#,
                r#"<label class="quiz-alternative" data-alt-index="1"><div class="content"><span class="choice-text">B</span></div><input type="hidden" name="data" value=""></label>"#,
                r#"</div><button class="quiz-submit-button" type="submit">Submit</button></form>"#,
            )
        );
    }

    #[test]
    fn long_text_uses_textarea() {
        let form = text_form(ExerciseKind::LongText, &Labels::default());
        let html = to_html(&form);
        assert!(html.contains(r#"<textarea class="quiz-text-input" name="data" rows="4""#));
        assert!(!html.contains("<input"));
    }

    #[test]
    fn answer_block_predicates() {
        let answer = Node::element("div", &[("class", Some("admonition answer"))], vec![]);
        let marked = Node::element("div", &[("class", Some("quiz-answer"))], vec![]);
        let other = Node::element("div", &[("class", Some("admonition note"))], vec![]);
        assert!(is_answer_block(&answer));
        assert!(is_answer_block(&marked));
        assert!(!is_answer_block(&other));
    }
}
