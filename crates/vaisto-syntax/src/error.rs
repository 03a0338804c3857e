//! Parse error types for the vaisto reader and lowering passes.

use std::fmt;

use vaisto_common::Loc;

/// A parse error with location information and optional related span.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub loc: Loc,
    /// Optional related location with context message (e.g. "opened here").
    pub related: Option<(String, Loc)>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, loc: Loc) -> Self {
        Self { message: message.into(), loc, related: None }
    }

    pub fn with_related(
        message: impl Into<String>,
        loc: Loc,
        related_message: impl Into<String>,
        related_loc: Loc,
    ) -> Self {
        Self {
            message: message.into(),
            loc,
            related: Some((related_message.into(), related_loc)),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = ParseError::new("unexpected token", Loc::new(0, 1));
        assert_eq!(err.to_string(), "unexpected token");
    }

    #[test]
    fn parse_error_with_related() {
        let err = ParseError::with_related(
            "unclosed `(`",
            Loc::new(50, 51),
            "opened here",
            Loc::new(10, 11),
        );
        let (msg, loc) = err.related.unwrap();
        assert_eq!(msg, "opened here");
        assert_eq!(loc, Loc::new(10, 11));
    }
}
