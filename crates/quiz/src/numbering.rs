use crate::config::Labels;
use crate::markup;
use core_types::ExerciseKind;
use html::Node;

/// Sequential "Question N" / "Exercise N" titles for one document instance.
#[derive(Debug, Default)]
pub struct Numbering {
    counter: usize,
}

impl Numbering {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assigned(&self) -> usize {
        self.counter
    }

    /// Advances the counter and retitles `container`. `kind` is `None` for ambiguous blocks.
    ///
    /// Returns the new title, or `None` when the container has no title element.
    pub fn label(
        &mut self,
        container: &mut Node,
        kind: Option<ExerciseKind>,
        labels: &Labels,
    ) -> Option<String> {
        self.counter += 1;
        let word = match kind {
            Some(kind) if kind.is_question() => &labels.question,
            _ => &labels.exercise,
        };
        let title = format!("{word} {}", self.counter);

        let title_node = container.children_mut()?.iter_mut().find(|c| markup::is_title(c))?;
        set_title_text(title_node, &title);
        Some(title)
    }
}

/// Replaces the title's text, keeping element children such as the edit button.
fn set_title_text(title: &mut Node, text: &str) {
    let Some(children) = title.children_mut() else {
        return;
    };
    children.retain(|c| c.element_name().is_some());
    children.insert(0, Node::text(text));
}

#[cfg(test)]
mod tests {
    use super::*;
    use html::dom_utils::{text_content, to_html};
    use html::parse_fragment;

    fn block(html: &str) -> Node {
        parse_fragment(html).remove(0)
    }

    #[test]
    fn numbers_across_kinds() {
        let labels = Labels::default();
        let mut numbering = Numbering::new();
        let mut a = block(r#"<div><p class="admonition-title">Exercise</p></div>"#);
        let mut b = block(r#"<div><p class="admonition-title">Exercise</p></div>"#);
        assert_eq!(
            numbering.label(&mut a, Some(ExerciseKind::Choice), &labels).as_deref(),
            Some("Question 1")
        );
        assert_eq!(
            numbering.label(&mut b, Some(ExerciseKind::SelfProgress), &labels).as_deref(),
            Some("Exercise 2")
        );
        assert_eq!(text_content(&a), "Question 1");
    }

    #[test]
    fn untitled_blocks_still_advance() {
        let labels = Labels::default();
        let mut numbering = Numbering::new();
        let mut untitled = block("<div><p>body</p></div>");
        assert_eq!(numbering.label(&mut untitled, None, &labels), None);
        assert_eq!(numbering.assigned(), 1);
    }

    #[test]
    fn keeps_element_children_of_title() {
        let labels = Labels::default();
        let mut numbering = Numbering::new();
        let mut b = block(
            r#"<div><p class="admonition-title">Old <button class="quiz-edit-button">x</button></p></div>"#,
        );
        numbering.label(&mut b, Some(ExerciseKind::ShortText), &labels);
        assert_eq!(
            to_html(&b),
            r#"<div><p class="admonition-title">Question 1<button class="quiz-edit-button">x</button></p></div>"#
        );
    }
}
