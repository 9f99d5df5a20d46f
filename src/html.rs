//! HTML element classification and escaping rules.

use serde::Serialize;

/// Void elements: cannot have children or a closing tag.
/// https://html.spec.whatwg.org/multipage/syntax.html#void-elements
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
];

/// Doctype emitted before a rendered `html` element
pub const DOCTYPE: &str = "<!DOCTYPE html>\n";

pub fn is_void_element(tag: &str, void_elements: &[String]) -> bool {
    void_elements.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

const ENT_COMPAT: i64 = 2;
const ENT_QUOTES: i64 = 3;
const ENT_NOQUOTES: i64 = 0;
const ENT_HTML5: i64 = 48;

/// Escaping context, selecting a `htmlspecialchars` ruleset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EscapeMode {
    Content,
    AttributeKey,
    AttributeValue,
}

impl EscapeMode {
    /// `htmlspecialchars` flags passed by generated code
    pub fn flags(self) -> i64 {
        match self {
            EscapeMode::Content => ENT_NOQUOTES | ENT_HTML5,
            EscapeMode::AttributeKey => ENT_QUOTES | ENT_HTML5,
            EscapeMode::AttributeValue => ENT_COMPAT | ENT_HTML5,
        }
    }
}

/// Compile-time equivalent of `htmlspecialchars($text, $mode->flags())`.
pub fn escape(text: &str, mode: EscapeMode) -> String {
    let flags = mode.flags();
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if flags & ENT_COMPAT != 0 => out.push_str("&quot;"),
            '\'' if flags & ENT_QUOTES == ENT_QUOTES => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
