//! Diagnostic collection and printing.
//!
//! Grounded on `original_source/pork/src/error.c`'s `error_at_token`/`error_on_line`:
//! a one-line `Line <n>: <message>` header, optionally followed by a source excerpt
//! with a caret under the offending token. The original prints immediately; this
//! port collects into a [`DiagnosticBag`] instead, since spec.md §4.D requires
//! semantic analysis to keep finding errors after the first one rather than abort.

use std::fmt;

use crate::token::Token;

/// One reported problem, anchored either to a specific token (for a caret), just
/// a source line (for `Unreachable code`, which points at a whole block), or
/// nothing at all (`Not all control paths return.`, which the original prints
/// bare with no `Line N:` prefix — spec.md §8 Scenario 7).
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub line: Option<u32>,
    pub message: String,
    /// Byte offset and length of the anchoring token within the source, if any.
    pub token_span: Option<(usize, usize)>,
}

impl Diagnostic {
    pub fn at_token(token: &Token, message: impl Into<String>) -> Self {
        Diagnostic {
            line: Some(token.line),
            message: message.into(),
            token_span: Some((token.start, token.text.len())),
        }
    }

    pub fn at_line(line: u32, message: impl Into<String>) -> Self {
        Diagnostic {
            line: Some(line),
            message: message.into(),
            token_span: None,
        }
    }

    /// A diagnostic with no source position at all.
    pub fn bare(message: impl Into<String>) -> Self {
        Diagnostic {
            line: None,
            message: message.into(),
            token_span: None,
        }
    }

    /// Renders this diagnostic the way `error_at_token`/`error_on_line` do: a
    /// header line, then (when source text is available) the excerpt and caret.
    pub fn render(&self, source: &str) -> String {
        let Some(line) = self.line else {
            return self.message.clone();
        };

        let mut out = format!("Line {line}: {}", self.message);

        if let Some((start, len)) = self.token_span {
            if let Some((excerpt, caret_offset)) = line_excerpt(source, start) {
                out.push('\n');
                out.push_str(&excerpt);
                out.push('\n');
                out.push_str(&" ".repeat(caret_offset));
                out.push('^');
                let _ = len; // caret marks the start of the token only, like the original
            }
        }

        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "Line {line}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Finds the line containing byte offset `start`, trimmed of leading whitespace,
/// and the caret column within that trimmed line.
fn line_excerpt(source: &str, start: usize) -> Option<(String, usize)> {
    let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[start..].find('\n').map_or(source.len(), |i| start + i);
    let raw_line = &source[line_start..line_end];

    let trimmed = raw_line.trim_start();
    let trimmed_start = line_start + (raw_line.len() - trimmed.len());
    if start < trimmed_start {
        return None;
    }

    Some((trimmed.to_string(), start - trimmed_start))
}

/// Accumulates diagnostics across a pass that keeps going after the first error,
/// per spec.md §4.D / §7.
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(line = ?diagnostic.line, message = %diagnostic.message, "diagnostic reported");
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_trimmed_excerpt_and_caret() {
        let source = "{\n    return 1 + ;\n}\n";
        let start = source.find('+').unwrap() + 2; // the ';'
        let diag = Diagnostic {
            line: Some(2),
            message: "expected an expression".to_string(),
            token_span: Some((start, 1)),
        };

        let rendered = diag.render(source);
        let mut lines = rendered.lines();
        assert_eq!(lines.next().unwrap(), "Line 2: expected an expression");
        assert_eq!(lines.next().unwrap(), "return 1 + ;");
        let caret_line = lines.next().unwrap();
        assert_eq!(caret_line.trim_start(), "^");
    }
}
