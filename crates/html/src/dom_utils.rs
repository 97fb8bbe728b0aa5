use crate::Node;
use crate::entities::{escape_attr, escape_text};
use crate::tokenizer::is_void_element;

pub fn collect_text(nodes: &[Node], out: &mut String) {
    for n in nodes {
        match n {
            Node::Text { text, .. } => out.push_str(text),
            Node::Element { children, .. } | Node::Document { children, .. } => {
                collect_text(children, out);
            }
            Node::Comment { .. } => {}
        }
    }
}

/// Concatenated descendant text, trimmed.
pub fn text_content(node: &Node) -> String {
    let mut out = String::new();
    match node {
        Node::Text { text, .. } => out.push_str(text),
        _ => collect_text(node.children(), &mut out),
    }
    out.trim().to_string()
}

pub fn normalize_textarea_newlines(s: &str) -> String {
    if !s.contains('\r') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut it = s.chars().peekable();
    while let Some(ch) = it.next() {
        match ch {
            '\r' => {
                if it.peek() == Some(&'\n') {
                    let _ = it.next();
                }
                out.push('\n');
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Serializes a node (outer HTML). Deterministic: attribute order is preserved and ids are
/// not part of the output, so two passes over the same tree serialize byte-identically.
pub fn to_html(node: &Node) -> String {
    let mut out = String::new();
    write_html(node, &mut out);
    out
}

fn write_html(node: &Node, out: &mut String) {
    match node {
        Node::Document {
            doctype, children, ..
        } => {
            if let Some(dt) = doctype {
                out.push_str("<!");
                out.push_str(dt);
                out.push('>');
            }
            for c in children {
                write_html(c, out);
            }
        }
        Node::Element {
            name,
            attributes,
            children,
            ..
        } => {
            out.push('<');
            out.push_str(name);
            for (k, v) in attributes {
                out.push(' ');
                out.push_str(k);
                if let Some(v) = v {
                    out.push_str("=\"");
                    escape_attr(v, out);
                    out.push('"');
                }
            }
            out.push('>');
            if is_void_element(name) {
                return;
            }
            let raw = name == "script" || name == "style";
            for c in children {
                match c {
                    Node::Text { text, .. } if raw => out.push_str(text),
                    _ => write_html(c, out),
                }
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        Node::Text { text, .. } => escape_text(text, out),
        Node::Comment { text, .. } => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_document;

    #[test]
    fn serialization_round_trips_generator_markup() {
        let html = r#"<div class="admonition exercise short" id="q1"><p class="admonition-title">Q &amp; A</p><input type="text" value="" disabled></div>"#;
        let dom = parse_document(html);
        assert_eq!(to_html(&dom), html);
        assert_eq!(to_html(&parse_document(&to_html(&dom))), html);
    }

    #[test]
    fn text_content_is_trimmed_and_skips_comments() {
        let dom = parse_document("<li>  [x] <b>bold</b><!-- c --> tail  </li>");
        assert_eq!(text_content(&dom.children()[0]), "[x] bold tail");
    }

    #[test]
    fn normalizes_crlf() {
        assert_eq!(normalize_textarea_newlines("a\r\nb\rc"), "a\nb\nc");
    }
}
