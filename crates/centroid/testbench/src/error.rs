//! Testbench error types.
//!
//! Covers configuration, template rendering, toolchain discovery,
//! synthesis and tool invocation failures.

use std::path::PathBuf;

use centroid_selector::SelectorError;
use thiserror::Error;

/// Errors that can occur while preparing or running the testbench.
#[derive(Debug, Error)]
pub enum TestbenchError {
    /// Configuration file could not be parsed or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required input file does not exist.
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// Template references a key with no value.
    #[error("Template placeholder ${0} has no value")]
    MissingPlaceholder(String),

    /// Template contains a `$` that is neither an escape nor a placeholder.
    #[error("Invalid template placeholder at line {line}, column {column}")]
    InvalidPlaceholder { line: usize, column: usize },

    /// Toolchain support files could not be located.
    #[error("Toolchain files not found under {}: {}", root.display(), missing.join(", "))]
    ToolchainNotFound { root: PathBuf, missing: Vec<String> },

    /// Synthesis reported errors.
    #[error("Synthesis failed with {0} error(s)")]
    SynthesisFailed(usize),

    /// An external command could not be started.
    #[error("Failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reference model rejected its input.
    #[error(transparent)]
    Selector(#[from] SelectorError),

    /// Directory walk failed.
    #[error("Search error: {0}")]
    Walk(#[from] walkdir::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for testbench operations.
pub type TestbenchResult<T> = Result<T, TestbenchError>;
