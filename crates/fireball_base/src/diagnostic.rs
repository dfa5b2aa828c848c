//! The structured error record produced by the parser and checker.
//!
//! Diagnostics are always values on the result path: the parser returns at
//! most one per parse frame, the checker appends to a list, and the driver
//! sorts and prints them. Nothing in the pipeline throws diagnostics out of
//! band.
//!
//! # Ordering
//!
//! Diagnostics are totally ordered by `(start, end)` byte offsets, so a
//! collected batch can be sorted into source order before presentation.
//!
//! # Example
//!
//! ```
//! use fireball_base::{Diagnostic, Position, Range, Severity};
//!
//! let range = Range::new(Position::new(3, 0, 40), Position::new(3, 5, 45));
//! let diag = Diagnostic::error(range, "Expected ')' after call arguments.");
//!
//! assert_eq!(diag.severity, Severity::Error);
//! assert!(diag.to_string().contains("Expected ')'"));
//! ```

use crate::span::Range;
use std::cmp::Ordering;
use std::fmt;

/// How serious a diagnostic is.
///
/// Variants are ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Editor-only nudge, not shown in batch output.
    Hint,
    /// Informational note.
    Info,
    /// Suspicious but compilable.
    Warning,
    /// Prevents code generation.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Hint => "hint",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}

/// A single error, warning, or note, anchored to a source range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// How serious the problem is.
    pub severity: Severity,
    /// The source region the message points at.
    pub range: Range,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic with the given severity.
    pub fn new(severity: Severity, range: Range, message: impl Into<String>) -> Self {
        Self {
            severity,
            range,
            message: message.into(),
        }
    }

    /// Creates an [`Severity::Error`] diagnostic.
    pub fn error(range: Range, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, range, message)
    }

    /// Creates a [`Severity::Warning`] diagnostic.
    pub fn warning(range: Range, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, range, message)
    }

    /// Returns `true` if this diagnostic prevents code generation.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.range.start.line, self.range.start.column, self.severity, self.message
        )
    }
}

impl PartialOrd for Diagnostic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Diagnostic {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.range.start.offset, self.range.end.offset)
            .cmp(&(other.range.start.offset, other.range.end.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Position;

    fn range_at(start: usize, end: usize) -> Range {
        Range::new(
            Position::new(1, start as u32, start),
            Position::new(1, end as u32, end),
        )
    }

    #[test]
    fn display_includes_location_and_severity() {
        let diag = Diagnostic::error(range_at(4, 8), "Expected expression.");
        let text = diag.to_string();
        assert!(text.contains("error"));
        assert!(text.contains("Expected expression."));
    }

    #[test]
    fn severity_orders_error_above_warning() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert!(Severity::Info > Severity::Hint);
    }

    #[test]
    fn diagnostics_sort_by_source_position() {
        let mut diags = vec![
            Diagnostic::error(range_at(20, 25), "second"),
            Diagnostic::error(range_at(3, 9), "first"),
        ];
        diags.sort();
        assert_eq!(diags[0].message, "first");
        assert_eq!(diags[1].message, "second");
    }

    #[test]
    fn same_start_sorts_by_end() {
        let short = Diagnostic::error(range_at(5, 6), "short");
        let long = Diagnostic::error(range_at(5, 12), "long");
        assert!(short < long);
    }

    #[test]
    fn is_error_only_for_error_severity() {
        assert!(Diagnostic::error(range_at(0, 1), "x").is_error());
        assert!(!Diagnostic::warning(range_at(0, 1), "x").is_error());
    }
}
