use crate::parser::token::Span;
use std::fmt;

/// A single parse diagnostic.
///
/// `Display` renders the plain message; the span is kept separately for
/// drivers that want to point at the source.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: String, span: Span) -> Self {
        Self { message, span }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Every diagnostic from one parse, in the order they were found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrors(pub Vec<ParseError>);

impl ParseErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Plain text lines, one per diagnostic
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|e| e.message.clone()).collect()
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.len() {
            1 => write!(f, "parse error: {}", self.0[0]),
            n => {
                write!(f, "{} parse errors:", n)?;
                for err in &self.0 {
                    write!(f, "\n\t{} at {}", err, err.span)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ParseErrors {}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Render diagnostics for a terminal, one per line, with their positions.
#[cfg(feature = "colored")]
pub fn render_diagnostics(errors: &[ParseError]) -> String {
    use colored::*;

    errors
        .iter()
        .map(|e| {
            format!(
                "{} {} {}",
                "parse error:".bright_red().bold(),
                e.message.red(),
                format!("({})", e.span).dimmed()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plain rendering for builds without terminal colors
#[cfg(not(feature = "colored"))]
pub fn render_diagnostics(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| format!("parse error: {} ({})", e.message, e.span))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_error_display() {
        let errors = ParseErrors(vec![ParseError::new(
            "no prefix parse function for ) found".to_string(),
            Span::new(3, 1, 1, 4),
        )]);
        assert_eq!(
            errors.to_string(),
            "parse error: no prefix parse function for ) found"
        );
    }

    #[test]
    fn test_multiple_errors_display() {
        let errors = ParseErrors(vec![
            ParseError::new("first".to_string(), Span::new(0, 1, 1, 1)),
            ParseError::new("second".to_string(), Span::new(5, 1, 2, 2)),
        ]);
        assert_eq!(
            errors.to_string(),
            "2 parse errors:\n\tfirst at 1:1\n\tsecond at 2:2"
        );
        assert_eq!(errors.messages(), vec!["first", "second"]);
    }

    #[test]
    fn test_render_mentions_position() {
        colored_off();
        let rendered = render_diagnostics(&[ParseError::new(
            "oops".to_string(),
            Span::new(0, 1, 3, 7),
        )]);
        assert!(rendered.contains("oops"));
        assert!(rendered.contains("3:7"));
    }

    #[cfg(feature = "colored")]
    fn colored_off() {
        colored::control::set_override(false);
    }

    #[cfg(not(feature = "colored"))]
    fn colored_off() {}
}
