use crate::types::{Id, Node, Token};

/// Elements whose start tag implicitly closes an open element of the same name.
fn closes_same_open_element(name: &str) -> bool {
    matches!(name, "li" | "p" | "option" | "dt" | "dd" | "tr" | "td" | "th")
}

/// Builds a document tree from a token stream. Node ids are left unset.
pub fn build_dom(tokens: &[Token]) -> Node {
    let mut builder = OpenElements::new();

    for token in tokens {
        match token {
            Token::Doctype(s) => builder.set_doctype(s.clone()),
            Token::Comment(c) => builder.append(Node::Comment {
                id: Id::UNSET,
                text: c.clone(),
            }),
            Token::Text(txt) => {
                if !txt.is_empty() {
                    builder.append_text(txt);
                }
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                if closes_same_open_element(name) && builder.top_is(name) {
                    builder.close_top();
                }
                let element = Node::Element {
                    id: Id::UNSET,
                    name: name.clone(),
                    attributes: attributes.clone(),
                    children: Vec::new(),
                };
                if *self_closing {
                    builder.append(element);
                } else {
                    builder.open(element);
                }
            }
            Token::EndTag(name) => builder.close(name),
        }
    }

    builder.finish()
}

/// Parses a fragment into its top-level nodes (no document wrapper).
pub fn build_fragment(tokens: &[Token]) -> Vec<Node> {
    match build_dom(tokens) {
        Node::Document { children, .. } => children,
        other => vec![other],
    }
}

/// Stack of open nodes; index 0 is always the document.
struct OpenElements {
    stack: Vec<Node>,
}

impl OpenElements {
    fn new() -> Self {
        Self {
            stack: vec![Node::document(Vec::new())],
        }
    }

    fn current(&mut self) -> &mut Vec<Node> {
        let top = self.stack.len() - 1;
        match self.stack[top].children_mut() {
            Some(children) => children,
            None => unreachable!("open element stack only holds container nodes"),
        }
    }

    fn set_doctype(&mut self, value: String) {
        if let Node::Document { doctype, .. } = &mut self.stack[0] {
            *doctype = Some(value);
        }
    }

    fn append(&mut self, node: Node) {
        self.current().push(node);
    }

    fn append_text(&mut self, txt: &str) {
        // Adjacent text tokens (e.g. around a stray '<') merge into one node.
        if let Some(Node::Text { text, .. }) = self.current().last_mut() {
            text.push_str(txt);
            return;
        }
        self.append(Node::text(txt));
    }

    fn open(&mut self, element: Node) {
        self.stack.push(element);
    }

    fn top_is(&self, name: &str) -> bool {
        self.stack.len() > 1 && self.stack[self.stack.len() - 1].is_element(name)
    }

    fn close_top(&mut self) {
        if self.stack.len() > 1
            && let Some(node) = self.stack.pop()
        {
            self.append(node);
        }
    }

    /// Pops up to and including the nearest open element named `name`. Unmatched end tags are
    /// ignored.
    fn close(&mut self, name: &str) {
        let Some(pos) = self.stack.iter().skip(1).rposition(|n| n.is_element(name)) else {
            return;
        };
        let target = pos + 1;
        while self.stack.len() > target {
            self.close_top();
        }
    }

    fn finish(mut self) -> Node {
        while self.stack.len() > 1 {
            self.close_top();
        }
        self.stack.swap_remove(0)
    }
}
