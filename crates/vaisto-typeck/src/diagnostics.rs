//! Ariadne-based diagnostic rendering for type errors (§7).
//!
//! Turns a [`TypeError`] into a formatted, labeled report. Error codes,
//! messages, and hints all come from `error.rs`; this module only owns
//! span plumbing and report layout. Colorless output keeps rendering
//! stable across test runs.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use vaisto_common::Loc;

use crate::error::{ConstraintOrigin, TypeError};

fn to_range(loc: Loc) -> Range<usize> {
    loc.start as usize..loc.end as usize
}

fn clamp(r: Range<usize>, source_len: usize) -> Range<usize> {
    let s = r.start.min(source_len);
    let e = r.end.min(source_len).max(s);
    if s == e {
        s..e.saturating_add(1).min(source_len.max(1))
    } else {
        s..e
    }
}

/// Secondary labels for errors whose origin carries more than one span
/// (e.g. both branches of an `if` that disagree in type).
fn extra_labels(origin: &ConstraintOrigin, source_len: usize) -> Vec<(Range<usize>, String, Color)> {
    match origin {
        ConstraintOrigin::IfBranches { then_loc, else_loc, .. } => vec![
            (clamp(to_range(*then_loc), source_len), "then branch".to_string(), Color::Red),
            (clamp(to_range(*else_loc), source_len), "else branch".to_string(), Color::Blue),
        ],
        ConstraintOrigin::RowAccess { field, loc } => {
            vec![(clamp(to_range(*loc), source_len), format!("accessing field `{field}`"), Color::Blue)]
        }
        _ => vec![],
    }
}

/// Render a single type error into a formatted diagnostic string.
///
/// `filename` is folded into the message rather than used as ariadne's
/// source id, since every call site here has exactly one source file.
pub fn render_diagnostic(error: &TypeError, source: &str, filename: &str) -> String {
    let config = Config::default().with_color(false);
    let source_len = source.len();
    let span = error
        .loc()
        .map(to_range)
        .map(|r| clamp(r, source_len))
        .unwrap_or(0..source_len.min(1));

    let is_warning = matches!(error, TypeError::RedundantMatchArm { .. });
    let report_kind = if is_warning { ReportKind::Warning } else { ReportKind::Error };
    let label_color = if is_warning { Color::Yellow } else { Color::Red };

    let mut builder = Report::build(report_kind, span.clone())
        .with_code(error.code())
        .with_message(format!("{filename}: {error}"))
        .with_config(config);

    builder.add_label(Label::new(span.clone()).with_message(error.to_string()).with_color(label_color));

    if let Some(origin) = mismatch_origin(error) {
        for (range, msg, color) in extra_labels(origin, source_len) {
            builder.add_label(Label::new(range).with_message(msg).with_color(color));
        }
    }

    if let Some(hint) = error.hint() {
        builder.set_help(hint);
    }

    let mut buf = Vec::new();
    builder
        .finish()
        .write(Source::from(source), &mut buf)
        .expect("failed to write diagnostic");
    String::from_utf8(buf).expect("diagnostic output should be valid UTF-8")
}

/// Extract the `ConstraintOrigin` from error variants that carry one, so
/// dual-span labels can be added for `if`-branch mismatches and row access.
fn mismatch_origin(error: &TypeError) -> Option<&ConstraintOrigin> {
    match error {
        TypeError::Mismatch { origin, .. }
        | TypeError::InfiniteType { origin, .. }
        | TypeError::ArityMismatch { origin, .. } => Some(origin),
        _ => None,
    }
}

/// Render every error and warning in a `TypeckResult`-shaped pair of slices,
/// errors first, in source order.
pub fn render_all(errors: &[TypeError], warnings: &[TypeError], source: &str, filename: &str) -> String {
    let mut out = String::new();
    for err in errors {
        out.push_str(&render_diagnostic(err, source, filename));
        out.push('\n');
    }
    for warn in warnings {
        out.push_str(&render_diagnostic(warn, source, filename));
        out.push('\n');
    }
    out
}
