//! Entity decoding for generator output and escaping for serialization.
//!
//! Only the entities a documentation generator actually emits are decoded: the five XML
//! entities, `&nbsp;`, and well-formed semicolon-terminated numeric references. Anything else
//! passes through unchanged so that decoding is idempotent on already-decoded text.

const NAMED: &[(&[u8], char)] = &[
    (b"&amp;", '&'),
    (b"&lt;", '<'),
    (b"&gt;", '>'),
    (b"&quot;", '"'),
    (b"&apos;", '\''),
    (b"&#39;", '\''),
    (b"&nbsp;", '\u{00A0}'),
];

const MAX_HEX_DIGITS: usize = 6;
const MAX_DEC_DIGITS: usize = 7;

pub(crate) fn decode_entities(s: &str) -> String {
    let bytes = s.as_bytes();
    if memchr::memchr(b'&', bytes).is_none() {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    let mut copy_start = 0;

    while i < bytes.len() {
        if bytes[i] != b'&' {
            i += 1;
            continue;
        }
        out.push_str(&s[copy_start..i]);

        if let Some((pat, ch)) = NAMED
            .iter()
            .find(|(pat, _)| bytes.get(i..i + pat.len()) == Some(*pat))
        {
            out.push(*ch);
            i += pat.len();
            copy_start = i;
            continue;
        }

        if let Some((ch, consumed)) = decode_numeric(&bytes[i..], s.get(i..).unwrap_or("")) {
            out.push(ch);
            i += consumed;
            copy_start = i;
            continue;
        }

        out.push('&');
        i += 1;
        copy_start = i;
    }

    out.push_str(&s[copy_start..]);
    out
}

/// Decodes `&#123;` / `&#x7B;` at the start of `bytes`, returning the char and bytes consumed.
fn decode_numeric(bytes: &[u8], s: &str) -> Option<(char, usize)> {
    let (digits_start, is_hex) = match bytes {
        [b'&', b'#', b'x' | b'X', ..] => (3, true),
        [b'&', b'#', ..] => (2, false),
        _ => return None,
    };
    let max = if is_hex { MAX_HEX_DIGITS } else { MAX_DEC_DIGITS };

    let mut end = digits_start;
    while end < bytes.len() && end - digits_start <= max {
        let b = bytes[end];
        if b == b';' {
            break;
        }
        let ok = if is_hex {
            b.is_ascii_hexdigit()
        } else {
            b.is_ascii_digit()
        };
        if !ok {
            return None;
        }
        end += 1;
    }
    if end == digits_start || end - digits_start > max || bytes.get(end) != Some(&b';') {
        return None;
    }

    let digits = &s[digits_start..end];
    let value = if is_hex {
        u32::from_str_radix(digits, 16).ok()?
    } else {
        digits.parse::<u32>().ok()?
    };
    char::from_u32(value).map(|ch| (ch, end + 1))
}

pub(crate) fn escape_text(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

pub(crate) fn escape_attr(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(ch),
        }
    }
}
