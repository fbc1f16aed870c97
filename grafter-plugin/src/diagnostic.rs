//! Diagnostics channel shared by the engine and its generators.
//!
//! Generators and the merger report structured diagnostics through a
//! one-way [`DiagnosticSink`] without knowing how they will be surfaced.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;

/// Severity level for a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A failure in generation; error diagnostics make a pass fail.
    Error,
    /// A problem that doesn't prevent generation but should be addressed.
    Warning,
    /// Informational message about the generation process.
    Info,
}

impl Severity {
    /// Returns true if this is an error severity.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Returns true if this is a warning severity.
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A byte span within a source document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// The zero-length span at the very start of a document.
    pub const ZERO: Span = Span { start: 0, end: 0 };

    /// Create a span from byte offsets.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A source location: document path plus span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub path: PathBuf,
    pub span: Span,
}

impl Location {
    /// Create a location for the given path and span.
    pub fn new(path: impl Into<PathBuf>, span: Span) -> Self {
        Self {
            path: path.into(),
            span,
        }
    }

    /// The zero-length location at the very start of a document. Generator
    /// invocation failures are anchored here.
    pub fn document_start(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Span::ZERO)
    }
}

/// A diagnostic message from generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The diagnostic message.
    pub message: String,
    /// Optional source location.
    pub location: Option<Location>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            location: None,
        }
    }

    /// Create a new info diagnostic.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            location: None,
        }
    }

    /// Add a location to this diagnostic.
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Add a document-start location to this diagnostic.
    pub fn at_document_start(self, path: impl AsRef<Path>) -> Self {
        self.at(Location::document_start(path.as_ref()))
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(location) = &self.location {
            write!(
                f,
                " ({}:{}..{})",
                location.path.display(),
                location.span.start,
                location.span.end
            )?;
        }
        Ok(())
    }
}

/// One-way sink for diagnostics.
///
/// Sinks may be shared across threads; implementations must be internally
/// synchronized.
pub trait DiagnosticSink: Send + Sync {
    /// Report a diagnostic.
    fn report(&self, diagnostic: Diagnostic);
}

/// A sink that collects diagnostics into a vector.
#[derive(Debug, Default)]
pub struct CollectingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all collected diagnostics, leaving the sink empty.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.lock().expect("sink lock poisoned"))
    }

    /// Clone out the collected diagnostics.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.lock().expect("sink lock poisoned").clone()
    }

    /// True if any error diagnostic has been reported.
    pub fn has_errors(&self) -> bool {
        self.entries
            .lock()
            .expect("sink lock poisoned")
            .iter()
            .any(|d| d.severity.is_error())
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.entries
            .lock()
            .expect("sink lock poisoned")
            .push(diagnostic);
    }
}

/// A sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: Diagnostic) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error("generator blew up").at_document_start("/src/a.toml");
        assert_eq!(diag.to_string(), "error: generator blew up (/src/a.toml:0..0)");
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingSink::new();
        sink.report(Diagnostic::info("hashed"));
        sink.report(Diagnostic::warning("odd shape"));

        assert!(!sink.has_errors());
        sink.report(Diagnostic::error("boom"));
        assert!(sink.has_errors());

        let taken = sink.take();
        assert_eq!(taken.len(), 3);
        assert!(sink.snapshot().is_empty());
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Error.to_string(), "error");
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(Severity::Info.to_string(), "info");
    }

    #[test]
    fn test_document_start_location() {
        let location = Location::document_start("/src/a.toml");
        assert_eq!(location.span, Span::ZERO);
    }
}
