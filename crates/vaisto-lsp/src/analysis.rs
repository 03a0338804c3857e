//! Parse, elaborate and convert diagnostics for a single in-memory document.
//!
//! The LSP server has no incremental analysis: every `didOpen`/`didChange`
//! re-parses and re-elaborates the whole document. Fine for the module
//! sizes this language targets.

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Position, Range};
use vaisto_common::{Loc, LineIndex};
use vaisto_syntax::ast::Module;
use vaisto_syntax::error::ParseError;
use vaisto_typeck::{TypeError, TypeckResult};

pub struct AnalysisResult {
    pub module: Module,
    pub parse_errors: Vec<ParseError>,
    pub typeck: TypeckResult,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse and elaborate `source`, producing both the raw results (for
/// hover/definition queries) and LSP diagnostics (for `publishDiagnostics`).
pub fn analyze_document(module_name: &str, source: &str) -> AnalysisResult {
    let (module, parse_errors) = vaisto_syntax::parse(source);
    let index = LineIndex::new(source);

    let mut diagnostics: Vec<Diagnostic> = parse_errors
        .iter()
        .map(|e| parse_error_to_diagnostic(e, &index))
        .collect();

    let typeck = if parse_errors.is_empty() {
        vaisto_typeck::check(module_name, &module)
    } else {
        TypeckResult { errors: Vec::new(), warnings: Vec::new(), result_type: None, interface: None }
    };

    for err in &typeck.errors {
        diagnostics.push(type_error_to_diagnostic(err, &index, DiagnosticSeverity::ERROR));
    }
    for warn in &typeck.warnings {
        diagnostics.push(type_error_to_diagnostic(warn, &index, DiagnosticSeverity::WARNING));
    }

    AnalysisResult { module, parse_errors, typeck, diagnostics }
}

fn loc_to_range(loc: Loc, index: &LineIndex) -> Range {
    let (start_line, start_col) = index.line_col(loc.start);
    let (end_line, end_col) = index.line_col(loc.end.max(loc.start));
    Range::new(
        Position::new(start_line - 1, start_col - 1),
        Position::new(end_line - 1, end_col - 1),
    )
}

fn parse_error_to_diagnostic(err: &ParseError, index: &LineIndex) -> Diagnostic {
    Diagnostic {
        range: loc_to_range(err.loc, index),
        severity: Some(DiagnosticSeverity::ERROR),
        source: Some("vaisto".to_string()),
        message: err.message.clone(),
        ..Default::default()
    }
}

fn type_error_to_diagnostic(err: &TypeError, index: &LineIndex, severity: DiagnosticSeverity) -> Diagnostic {
    let range = err.loc().map(|l| loc_to_range(l, index)).unwrap_or_else(|| Range::new(Position::new(0, 0), Position::new(0, 0)));
    Diagnostic {
        range,
        severity: Some(severity),
        code: Some(tower_lsp::lsp_types::NumberOrString::String(err.code().to_string())),
        source: Some("vaisto".to_string()),
        message: err.to_string(),
        ..Default::default()
    }
}

/// Convert an LSP position (0-based line/col, treated as byte columns -- the
/// surface syntax is ASCII-identifier S-expressions, so UTF-16 and byte
/// counts coincide in practice) to a byte offset into `source`.
pub fn position_to_offset(source: &str, position: &Position) -> Option<u32> {
    let mut offset = 0usize;
    for (i, line) in source.split('\n').enumerate() {
        if i as u32 == position.line {
            return Some((offset + position.character as usize).min(offset + line.len()) as u32);
        }
        offset += line.len() + 1;
    }
    None
}

pub fn offset_to_position(source: &str, offset: u32) -> Position {
    let index = LineIndex::new(source);
    let (line, col) = index.line_col(offset);
    Position::new(line - 1, col - 1)
}

/// Find the word (identifier characters) under `offset`, for hover and
/// go-to-definition -- both resolve against the module's top-level names,
/// not arbitrary sub-expressions.
pub fn word_at_offset(source: &str, offset: u32) -> Option<String> {
    let bytes = source.as_bytes();
    let offset = offset as usize;
    if offset > bytes.len() {
        return None;
    }
    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'?' || b == b'!';
    let mut start = offset;
    while start > 0 && is_ident(bytes[start - 1]) {
        start -= 1;
    }
    let mut end = offset;
    while end < bytes.len() && is_ident(bytes[end]) {
        end += 1;
    }
    if start == end {
        None
    } else {
        Some(source[start..end].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_clean_module_has_no_diagnostics() {
        let result = analyze_document("Main", "(defn main [] 0)");
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn analyze_type_error_produces_diagnostic() {
        let result = analyze_document("Main", "(defn main [] (+ 1 \"x\"))");
        assert!(!result.diagnostics.is_empty());
        assert_eq!(result.diagnostics[0].severity, Some(DiagnosticSeverity::ERROR));
    }

    #[test]
    fn word_at_offset_finds_identifier() {
        let src = "(defn double [x] (* x 2))";
        let offset = src.find("double").unwrap() as u32 + 1;
        assert_eq!(word_at_offset(src, offset).as_deref(), Some("double"));
    }

    #[test]
    fn position_offset_roundtrip() {
        let src = "line one\nline two\n";
        let offset = position_to_offset(src, &Position::new(1, 2)).unwrap();
        assert_eq!(offset, 11);
        let pos = offset_to_position(src, offset);
        assert_eq!(pos, Position::new(1, 2));
    }
}
