//! Message sanitizing applied once at intake.

use minijinja::HtmlEscape;

/// Escapes caller-supplied text before it is stored or compared.
pub trait Sanitizer: Send + Sync {
    fn escape(&self, text: &str) -> String;
}

/// Escapes `& < > " ' /` to HTML entities with minijinja's HTML escaper.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEscaper;

impl Sanitizer for HtmlEscaper {
    fn escape(&self, text: &str) -> String {
        HtmlEscape(text).to_string()
    }
}
