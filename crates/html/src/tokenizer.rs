//! Tokenizer for the HTML emitted by documentation generators.
//!
//! This is not an HTML5 state machine. Tag and attribute names are restricted to ASCII
//! `[A-Za-z0-9:_-]`, `<script>`/`<style>` contents are treated as raw text, and void elements
//! are reported as self-closing. That is enough for well-formed generator output.
use crate::entities::decode_entities;
use crate::types::Token;
use memchr::memchr;

const HTML_COMMENT_START: &str = "<!--";
const HTML_COMMENT_END: &str = "-->";

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

pub(crate) fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_rawtext_element(name: &str) -> bool {
    matches!(name, "script" | "style")
}

/// Finds `</name` followed by optional whitespace and `>`; returns (start, end_after_gt).
fn find_rawtext_close_tag(haystack: &str, name: &str) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        i += memchr(b'<', &bytes[i..])?;
        if bytes.get(i + 1) == Some(&b'/')
            && starts_with_ignore_ascii_case_at(bytes, i + 2, name.as_bytes())
        {
            let mut k = i + 2 + name.len();
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if bytes.get(k) == Some(&b'>') {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;

    // Slices are only cut at ASCII structural bytes, so every endpoint is a char boundary.
    while i < bytes.len() {
        if bytes[i] != b'<' {
            let end = memchr(b'<', &bytes[i..]).map_or(bytes.len(), |rel| i + rel);
            let decoded = decode_entities(&input[i..end]);
            if !decoded.is_empty() {
                out.push(Token::Text(decoded));
            }
            i = end;
            continue;
        }

        if input[i..].starts_with(HTML_COMMENT_START) {
            let body_start = i + HTML_COMMENT_START.len();
            match input[body_start..].find(HTML_COMMENT_END) {
                Some(end) => {
                    out.push(Token::Comment(input[body_start..body_start + end].to_string()));
                    i = body_start + end + HTML_COMMENT_END.len();
                    continue;
                }
                None => {
                    out.push(Token::Comment(input[body_start..].to_string()));
                    break;
                }
            }
        }

        if starts_with_ignore_ascii_case_at(bytes, i, b"<!doctype") {
            let rest = &input[i + 2..];
            let Some(end) = rest.find('>') else {
                break;
            };
            out.push(Token::Doctype(rest[..end].trim().to_string()));
            i += 2 + end + 1;
            continue;
        }

        if bytes.get(i + 1) == Some(&b'/') {
            let start = i + 2;
            let mut j = start;
            while j < bytes.len() && is_name_byte(bytes[j]) {
                j += 1;
            }
            let name = input[start..j].to_ascii_lowercase();
            j = memchr(b'>', &bytes[j..]).map_or(bytes.len(), |rel| j + rel + 1);
            if !name.is_empty() {
                out.push(Token::EndTag(name));
            }
            i = j;
            continue;
        }

        let start = i + 1;
        let mut j = start;
        while j < bytes.len() && is_name_byte(bytes[j]) {
            j += 1;
        }
        if j == start {
            // A stray '<' that does not open a tag is text.
            out.push(Token::Text("<".to_string()));
            i += 1;
            continue;
        }
        let name = input[start..j].to_ascii_lowercase();
        let (attributes, self_closing, next) = read_attributes(input, j);
        i = next;

        let self_closing = self_closing || is_void_element(&name);
        let rawtext = !self_closing && is_rawtext_element(&name);
        out.push(Token::StartTag {
            name: name.clone(),
            attributes,
            self_closing,
        });

        if rawtext {
            match find_rawtext_close_tag(&input[i..], &name) {
                Some((close_start, close_end)) => {
                    if close_start > 0 {
                        out.push(Token::Text(input[i..i + close_start].to_string()));
                    }
                    out.push(Token::EndTag(name));
                    i += close_end;
                }
                None => {
                    if i < input.len() {
                        out.push(Token::Text(input[i..].to_string()));
                    }
                    out.push(Token::EndTag(name));
                    i = input.len();
                }
            }
        }
    }

    out
}

type Attributes = Vec<(String, Option<String>)>;

/// Reads attributes starting right after the tag name; returns them, the self-closing flag
/// and the index just past the closing `>`.
fn read_attributes(input: &str, mut k: usize) -> (Attributes, bool, usize) {
    let bytes = input.as_bytes();
    let mut attributes: Attributes = Vec::new();
    let mut self_closing = false;

    let skip_whitespace = |k: &mut usize| {
        while *k < bytes.len() && bytes[*k].is_ascii_whitespace() {
            *k += 1;
        }
    };

    loop {
        skip_whitespace(&mut k);
        if k >= bytes.len() {
            return (attributes, self_closing, k);
        }
        match bytes[k] {
            b'>' => return (attributes, self_closing, k + 1),
            b'/' => {
                self_closing = true;
                k += 1;
                continue;
            }
            _ => {}
        }

        let name_start = k;
        while k < bytes.len() && is_name_byte(bytes[k]) {
            k += 1;
        }
        if k == name_start {
            // Unsupported byte in attribute position; skip it.
            k += 1;
            continue;
        }
        self_closing = false;
        let name = input[name_start..k].to_ascii_lowercase();

        skip_whitespace(&mut k);
        if bytes.get(k) != Some(&b'=') {
            attributes.push((name, None));
            continue;
        }
        k += 1;
        skip_whitespace(&mut k);

        let value = match bytes.get(k) {
            Some(&quote) if quote == b'"' || quote == b'\'' => {
                let value_start = k + 1;
                let end = memchr(quote, &bytes[value_start..])
                    .map_or(bytes.len(), |rel| value_start + rel);
                k = (end + 1).min(bytes.len());
                &input[value_start..end]
            }
            _ => {
                let value_start = k;
                while k < bytes.len() && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                    k += 1;
                }
                &input[value_start..k]
            }
        };
        attributes.push((name, Some(decode_entities(value))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(name: &str, attrs: &[(&str, Option<&str>)], self_closing: bool) -> Token {
        Token::StartTag {
            name: name.to_string(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
                .collect(),
            self_closing,
        }
    }

    #[test]
    fn tokenizes_admonition_markup() {
        let tokens =
            tokenize(r#"<div class="admonition exercise choice"><p class=admonition-title>Q</p></div>"#);
        assert_eq!(
            tokens,
            vec![
                start("div", &[("class", Some("admonition exercise choice"))], false),
                start("p", &[("class", Some("admonition-title"))], false),
                Token::Text("Q".to_string()),
                Token::EndTag("p".to_string()),
                Token::EndTag("div".to_string()),
            ]
        );
    }

    #[test]
    fn void_and_boolean_attributes() {
        let tokens = tokenize(r#"<input type="checkbox" checked disabled><br/>"#);
        assert_eq!(
            tokens,
            vec![
                start(
                    "input",
                    &[
                        ("type", Some("checkbox")),
                        ("checked", None),
                        ("disabled", None)
                    ],
                    true
                ),
                start("br", &[], true),
            ]
        );
    }

    #[test]
    fn decodes_entities_in_text_and_attributes() {
        let tokens = tokenize(r#"<span title="a &amp; b">[x] 1 &lt; 2</span>"#);
        assert_eq!(
            tokens,
            vec![
                start("span", &[("title", Some("a & b"))], false),
                Token::Text("[x] 1 < 2".to_string()),
                Token::EndTag("span".to_string()),
            ]
        );
    }

    #[test]
    fn script_contents_are_raw_text() {
        let tokens = tokenize("<script>if (a < b) { x(); }</script><p>after</p>");
        assert_eq!(tokens[1], Token::Text("if (a < b) { x(); }".to_string()));
        assert_eq!(tokens[2], Token::EndTag("script".to_string()));
        assert_eq!(tokens[3], start("p", &[], false));
    }

    #[test]
    fn comments_doctype_and_stray_angle_bracket() {
        let tokens = tokenize("<!DOCTYPE html><!-- note -->a < b");
        assert_eq!(
            tokens,
            vec![
                Token::Doctype("DOCTYPE html".to_string()),
                Token::Comment(" note ".to_string()),
                Token::Text("a ".to_string()),
                Token::Text("<".to_string()),
                Token::Text(" b".to_string()),
            ]
        );
    }
}
