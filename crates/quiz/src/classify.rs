use crate::markup;
use core_types::ExerciseKind;
use html::Node;
use html::traverse::find_descendant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Known(ExerciseKind),
    /// A form without any recognizable answer control.
    Ambiguous,
}

impl Classification {
    pub fn kind(self) -> Option<ExerciseKind> {
        match self {
            Classification::Known(kind) => Some(kind),
            Classification::Ambiguous => None,
        }
    }

    /// Kind whose interaction rules apply. Ambiguous forms only support submitting.
    pub fn behavior(self) -> ExerciseKind {
        self.kind().unwrap_or(ExerciseKind::SelfProgress)
    }
}

/// Determines the kind of an exercise container.
///
/// An existing quiz form decides by structure alone: alternatives, a textarea, a single-line
/// input, or a self-progress control, in that order. Without a form the container's hint
/// classes decide (`choice`, `short`, `long`, `text`); a bare exercise is self-progress.
pub fn classify(container: &Node) -> Classification {
    if let Some(form) = find_descendant(container, &markup::is_quiz_form) {
        return classify_form(form);
    }

    if container.has_class("choice") {
        Classification::Known(ExerciseKind::Choice)
    } else if container.has_class("short") {
        Classification::Known(ExerciseKind::ShortText)
    } else if container.has_class("long") || container.has_class("text") {
        Classification::Known(ExerciseKind::LongText)
    } else {
        Classification::Known(ExerciseKind::SelfProgress)
    }
}

fn classify_form(form: &Node) -> Classification {
    let has = |pred: &dyn Fn(&Node) -> bool| find_descendant(form, pred).is_some();

    if has(&|n| n.has_class(markup::ALTERNATIVE_SET) || n.has_class(markup::ALTERNATIVE)) {
        Classification::Known(ExerciseKind::Choice)
    } else if has(&|n| n.is_element("textarea")) {
        Classification::Known(ExerciseKind::LongText)
    } else if has(&|n| {
        n.has_class(markup::TEXT_INPUT)
            || (n.is_element("input") && n.attr("type").is_none_or(|t| t.eq_ignore_ascii_case("text")))
    }) {
        Classification::Known(ExerciseKind::ShortText)
    } else if has(&|n| n.has_class(markup::SELF_PROGRESS)) {
        Classification::Known(ExerciseKind::SelfProgress)
    } else {
        Classification::Ambiguous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use html::parse_fragment;

    fn classify_html(html: &str) -> Classification {
        let nodes = parse_fragment(html);
        classify(&nodes[0])
    }

    #[test]
    fn hint_classes_decide_without_form() {
        let cases = [
            ("admonition exercise choice", ExerciseKind::Choice),
            ("admonition exercise text short", ExerciseKind::ShortText),
            ("admonition exercise long", ExerciseKind::LongText),
            ("admonition exercise text", ExerciseKind::LongText),
            ("admonition exercise", ExerciseKind::SelfProgress),
        ];
        for (class, kind) in cases {
            let html = format!(r#"<div class="{class}"><p>body</p></div>"#);
            assert_eq!(classify_html(&html), Classification::Known(kind), "{class}");
        }
    }

    #[test]
    fn form_structure_beats_hints() {
        let html = r#"<div class="admonition exercise choice"><form class="quiz-form"><div class="quiz-text-container"><textarea class="quiz-text-input"></textarea></div></form></div>"#;
        assert_eq!(
            classify_html(html),
            Classification::Known(ExerciseKind::LongText)
        );

        let html = r#"<div class="admonition exercise long"><form class="quiz-form"><input type="text" name="data"></form></div>"#;
        assert_eq!(
            classify_html(html),
            Classification::Known(ExerciseKind::ShortText)
        );
    }

    #[test]
    fn hidden_inputs_are_not_text_fields() {
        let html = r#"<div class="admonition exercise"><form class="quiz-form"><div class="quiz-self-progress"><input type="hidden" name="data" value="done"></div></form></div>"#;
        assert_eq!(
            classify_html(html),
            Classification::Known(ExerciseKind::SelfProgress)
        );
    }

    #[test]
    fn empty_form_is_ambiguous() {
        let html = r#"<div class="admonition exercise short"><form class="quiz-form"><button type="submit">Go</button></form></div>"#;
        let class = classify_html(html);
        assert_eq!(class, Classification::Ambiguous);
        assert_eq!(class.kind(), None);
        assert_eq!(class.behavior(), ExerciseKind::SelfProgress);
    }
}
