//! YAML stream rendering for the plugin's stdout.
//!
//! Argo CD reads the generated manifests from stdout, so the whole stream is
//! rendered into memory first and written in one go. A failed run never
//! leaves a partial stream behind.
//!
//! # Scalar quoting
//!
//! Kubernetes and Argo CD resolve plain scalars with YAML 1.1 rules, where
//! `yes`, `on`, `y` and friends are booleans and `0755` is an octal int.
//! `serde_yaml` only quotes strings that are ambiguous under YAML 1.2, so
//! documents are emitted here from their [`Value`] tree instead: a string is
//! written plain only when neither rule set would read it as anything else.
//!
//! Layout is block style with two-space indentation; sequences under a
//! mapping key sit at the key's column, as `kubectl` and `kustomize` print
//! them. Multi-line strings become literal blocks where that is lossless.

use std::io::{self, Write};

use depwave_core::Document;
use serde_yaml::{Mapping, Value};

/// Document separator between entries of the stream.
pub const DOCUMENT_SEPARATOR: &str = "---\n";

const INDENT: usize = 2;

/// Plain scalars that YAML 1.1 or 1.2 resolves to null, a boolean, or a
/// merge/value key.
const RESERVED_WORDS: [&str; 27] = [
    "~", "null", "Null", "NULL", "y", "Y", "yes", "Yes", "YES", "n", "N", "no", "No", "NO",
    "true", "True", "TRUE", "false", "False", "FALSE", "on", "On", "ON", "off", "Off", "OFF",
    "<<",
];

/// Render `documents` as one multi-document YAML stream.
///
/// Documents are separated by `---`; an empty list renders as an empty string.
#[must_use]
pub fn render_stream(documents: &[Document]) -> String {
    let mut out = String::new();
    for (index, doc) in documents.iter().enumerate() {
        if index > 0 {
            out.push_str(DOCUMENT_SEPARATOR);
        }
        render_document(&mut out, doc.as_mapping());
    }
    out
}

/// Write an already rendered stream to `w` and flush it.
pub fn write_stream(w: &mut dyn Write, rendered: &str) -> io::Result<()> {
    w.write_all(rendered.as_bytes())?;
    w.flush()
}

fn render_document(out: &mut String, root: &Mapping) {
    if root.is_empty() {
        out.push_str("{}\n");
    } else {
        write_mapping(out, root, 0, false);
    }
}

// ---------------------------------------------------------------------------
// Block collections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parent {
    Mapping,
    Sequence,
}

/// Entries at column `indent`. With `inline_first` the first entry continues
/// the current line (after a `- `).
fn write_mapping(out: &mut String, map: &Mapping, indent: usize, inline_first: bool) {
    for (index, (key, value)) in map.iter().enumerate() {
        if index > 0 || !inline_first {
            pad(out, indent);
        }
        write_inline(out, key);
        out.push(':');
        write_child(out, value, indent, Parent::Mapping);
    }
}

fn write_sequence(out: &mut String, items: &[Value], indent: usize, inline_first: bool) {
    for (index, item) in items.iter().enumerate() {
        if index > 0 || !inline_first {
            pad(out, indent);
        }
        out.push('-');
        write_child(out, item, indent, Parent::Sequence);
    }
}

/// Everything after a `key:` or `-` written at column `indent`, through the
/// end of the value.
fn write_child(out: &mut String, value: &Value, indent: usize, parent: Parent) {
    match value {
        Value::Mapping(map) if !map.is_empty() => match parent {
            Parent::Mapping => {
                out.push('\n');
                write_mapping(out, map, indent + INDENT, false);
            }
            Parent::Sequence => {
                out.push(' ');
                write_mapping(out, map, indent + INDENT, true);
            }
        },
        Value::Sequence(items) if !items.is_empty() => match parent {
            Parent::Mapping => {
                out.push('\n');
                write_sequence(out, items, indent, false);
            }
            Parent::Sequence => {
                out.push(' ');
                write_sequence(out, items, indent + INDENT, true);
            }
        },
        Value::Tagged(tagged) => {
            out.push(' ');
            out.push_str(&tagged.tag.to_string());
            match &tagged.value {
                Value::Mapping(map) if !map.is_empty() => {
                    out.push('\n');
                    write_mapping(out, map, indent + INDENT, false);
                }
                Value::Sequence(items) if !items.is_empty() => {
                    out.push('\n');
                    write_sequence(out, items, indent + INDENT, false);
                }
                inner => {
                    out.push(' ');
                    write_inline(out, inner);
                    out.push('\n');
                }
            }
        }
        Value::String(s) if literal_block_ok(s) => write_literal(out, s, indent + INDENT),
        scalar => {
            out.push(' ');
            write_inline(out, scalar);
            out.push('\n');
        }
    }
}

/// A scalar, empty collection, or key on the current line.
fn write_inline(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => write_str(out, s, false),
        other => write_flow(out, other),
    }
}

// ---------------------------------------------------------------------------
// Flow collections (empty collections and non-scalar keys)
// ---------------------------------------------------------------------------

fn write_flow(out: &mut String, value: &Value) {
    match value {
        Value::Mapping(map) => {
            out.push('{');
            for (index, (key, item)) in map.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                write_flow(out, key);
                out.push_str(": ");
                write_flow(out, item);
            }
            out.push('}');
        }
        Value::Sequence(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                write_flow(out, item);
            }
            out.push(']');
        }
        Value::Tagged(tagged) => {
            out.push_str(&tagged.tag.to_string());
            out.push(' ');
            write_flow(out, &tagged.value);
        }
        Value::String(s) => write_str(out, s, true),
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

fn write_str(out: &mut String, s: &str, flow: bool) {
    if is_plain_safe(s, flow) {
        out.push_str(s);
    } else {
        write_double_quoted(out, s);
    }
}

/// Whether `s` reads back as the same string when written without quotes.
fn is_plain_safe(s: &str, flow: bool) -> bool {
    let Some(first) = s.chars().next() else {
        return false;
    };
    if s.trim() != s || resolves_to_non_string(s) {
        return false;
    }
    if s.chars().any(needs_escape) || s.contains('\t') {
        return false;
    }
    if s.starts_with("---") || s.starts_with("...") {
        return false;
    }
    if s.contains(": ") || s.contains(" #") || s.ends_with(':') {
        return false;
    }
    if flow && s.contains([',', '[', ']', '{', '}']) {
        return false;
    }
    match first {
        '-' | '?' | ':' => s.chars().nth(1).is_some_and(|c| !c.is_whitespace()),
        ',' | '[' | ']' | '{' | '}' | '#' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%'
        | '@' | '`' => false,
        _ => true,
    }
}

/// YAML 1.1 or 1.2 would resolve the plain scalar `s` to null, bool, int,
/// float, or timestamp.
fn resolves_to_non_string(s: &str) -> bool {
    RESERVED_WORDS.contains(&s) || s == "=" || looks_numeric(s)
}

/// Anything built only from digits, hex letters, radix prefixes, separators,
/// and exponent or timestamp markers. Over-quoting is harmless.
fn looks_numeric(s: &str) -> bool {
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    if matches!(body.to_ascii_lowercase().as_str(), ".inf" | ".nan") {
        return true;
    }
    body.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && body
            .chars()
            .all(|c| c.is_ascii_hexdigit() || "xXoO_.:+- tTzZ".contains(c))
}

fn needs_escape(c: char) -> bool {
    (c.is_control() && c != '\t') || matches!(c, '\u{feff}' | '\u{2028}' | '\u{2029}')
}

fn write_double_quoted(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c if needs_escape(c) => out.push_str(&format!("\\u{:04X}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Multi-line text that a `|` block reproduces exactly.
fn literal_block_ok(s: &str) -> bool {
    let body = s.trim_end_matches('\n');
    s.contains('\n')
        && !body.is_empty()
        && !body.starts_with([' ', '\t', '\n'])
        && !body.chars().any(|c| c != '\n' && c != '\t' && needs_escape(c))
}

fn write_literal(out: &mut String, s: &str, content_indent: usize) {
    let body = s.trim_end_matches('\n');
    let trailing = s.len() - body.len();
    out.push_str(match trailing {
        0 => " |-\n",
        1 => " |\n",
        _ => " |+\n",
    });
    for line in body.split('\n') {
        if !line.is_empty() {
            pad(out, content_indent);
            out.push_str(line);
        }
        out.push('\n');
    }
    for _ in 1..trailing {
        out.push('\n');
    }
}

fn pad(out: &mut String, indent: usize) {
    out.extend(std::iter::repeat_n(' ', indent));
}
