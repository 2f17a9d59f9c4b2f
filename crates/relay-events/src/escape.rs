//! Backslash escaping for Telegram's Markdown flavours.
//!
//! Escaping runs one pass per configured character, in configured order, and
//! each pass sees the output of the previous one. If `\` is listed after
//! another character it re-escapes the backslashes inserted for that
//! character. Keep the pass order intact; do not collapse it into a single
//! scan.

use std::fmt::Display;

#[derive(Debug, Clone, Default)]
pub struct Escaper {
    chars: Vec<char>,
}

impl Escaper {
    pub fn new(chars: Vec<char>) -> Self {
        Self { chars }
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn escape(&self, text: &str) -> String {
        let mut out = text.to_string();
        for &c in &self.chars {
            if out.contains(c) {
                out = out.replace(c, &format!("\\{c}"));
            }
        }
        out
    }

    /// Escape the `Display` form of a non-string value.
    pub fn escape_display(&self, value: impl Display) -> String {
        self.escape(&value.to_string())
    }
}
