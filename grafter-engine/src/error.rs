//! Engine error taxonomy.
//!
//! Per-file problems are collected, not thrown, so a pass completes as much
//! work as possible; the pass itself fails only for configuration problems
//! or cancellation.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to resolve a generator module to a loaded handle.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The logical name matched nothing in the reference paths or search
    /// directories. Scoped to the one declaration that required the module.
    #[error("generator module '{module}' was not found in any reference path or search directory")]
    NotFound { module: String },

    #[error("failed to load generator module '{}'", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("'{}' does not export a grafter module declaration", path.display())]
    MissingDecl {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error(
        "'{}' was built against engine version {module_version}, host is {host_version}",
        path.display()
    )]
    VersionMismatch {
        path: PathBuf,
        module_version: String,
        host_version: String,
    },
}

/// Failure of one document's transformation.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A generator could not be constructed or raised during generation.
    /// Coarse by design: the whole document's generation is abandoned.
    #[error("generation failed for '{}': {message}", path.display())]
    Invocation { path: PathBuf, message: String },

    #[error("generation was cancelled")]
    Cancelled,
}

/// What went wrong for a single input file.
#[derive(Debug, Error)]
pub enum FileError {
    /// The front-end could not parse the document.
    #[error(transparent)]
    FrontEnd(Box<grafter_model::Error>),

    /// The document's transformation failed.
    #[error(transparent)]
    Transform(TransformError),

    /// One or more declarations could not generate (e.g. their generator
    /// module was not found); the rest of the document was still written.
    #[error("{} declaration(s) failed to generate", messages.len())]
    Declarations { messages: Vec<String> },

    /// The output could not be written, after exhausting retries for
    /// transient contention.
    #[error("failed to write '{}'", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A per-file failure collected by the orchestrator.
#[derive(Debug)]
pub struct FileFailure {
    /// The input file the failure belongs to.
    pub path: PathBuf,
    pub error: FileError,
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

/// Failure of the pass as a whole.
#[derive(Debug, Error)]
pub enum PassError {
    /// Cancellation was requested. Distinct from failure; no partial output
    /// is written for the in-flight file and no fingerprint is persisted.
    #[error("generation pass was cancelled")]
    Cancelled,

    /// The pass was misconfigured.
    #[error("invalid pass configuration: {0}")]
    Config(String),

    /// The output directory or fingerprint file could not be prepared.
    #[error("i/o failure on '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
