//! Error types for strata
//!
//! Most load failures are deliberately not errors: a missing or broken
//! configuration file degrades to an empty layer and a log entry. The
//! `Error` type covers what remains, with layer and file context plus
//! an actionable help message where one exists.

use std::fmt;

/// Result type alias for strata operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for strata operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Configuration layer involved, if any (e.g., "specific_file")
    pub layer: Option<String>,
    /// File path involved, if any
    pub path: Option<String>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Error parsing or serializing a configuration document
    Parse,
    /// I/O error reading a configuration file
    Io,
    /// The caller violated the API contract
    InvalidUsage,
}

impl Error {
    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Parse,
            layer: None,
            path: None,
            help: None,
            cause: Some(message.into()),
        }
    }

    /// Create a new I/O error
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Io,
            layer: None,
            path: None,
            help: None,
            cause: Some(message.into()),
        }
    }

    /// Create an invalid usage error
    ///
    /// Raised when the caller breaks the API contract, for example by
    /// registering the same command-line option twice. These are the only
    /// errors that abort the calling operation.
    pub fn invalid_usage(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidUsage,
            layer: None,
            path: None,
            help: None,
            cause: Some(message.into()),
        }
    }

    /// Add layer context to the error
    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    /// Add file path context to the error
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::Parse => write!(f, "Parse error")?,
            ErrorKind::Io => write!(f, "I/O error")?,
            ErrorKind::InvalidUsage => write!(f, "Invalid usage")?,
        }

        if let Some(layer) = &self.layer {
            write!(f, "\n  Layer: {}", layer)?;
        }

        if let Some(path) = &self.path {
            write!(f, "\n  File: {}", path)?;
        }

        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
