//! Structured error types shared across the FFS crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`FfsError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (indices, thresholds, paths).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

/// Canonical error type for the FFS engine.
///
/// Rare-event outcomes (a shot failing or being pruned) are never reported
/// through this type; they are ordinary values of the shot result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum FfsError {
    /// Invalid run parameters detected before sampling starts.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Malformed interface ladder or target interface.
    #[error("ladder error: {0}")]
    Ladder(ErrorInfo),
    /// Inconsistent box, positions or particle indices.
    #[error("geometry error: {0}")]
    Geometry(ErrorInfo),
    /// Failure raised by an external collaborator (classifier, cycle runner).
    #[error("collaborator error: {0}")]
    Collaborator(ErrorInfo),
    /// Serialization, parsing and filesystem errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl FfsError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            FfsError::Config(info)
            | FfsError::Ladder(info)
            | FfsError::Geometry(info)
            | FfsError::Collaborator(info)
            | FfsError::Serde(info) => info,
        }
    }

    /// Shorthand for a configuration error.
    pub fn config(code: impl Into<String>, message: impl Into<String>) -> Self {
        FfsError::Config(ErrorInfo::new(code, message))
    }

    /// Shorthand for a ladder error.
    pub fn ladder(code: impl Into<String>, message: impl Into<String>) -> Self {
        FfsError::Ladder(ErrorInfo::new(code, message))
    }

    /// Shorthand for a geometry error.
    pub fn geometry(code: impl Into<String>, message: impl Into<String>) -> Self {
        FfsError::Geometry(ErrorInfo::new(code, message))
    }

    /// Wraps an I/O or encoding failure together with the offending path.
    pub fn io(code: impl Into<String>, err: impl ToString, path: &std::path::Path) -> Self {
        FfsError::Serde(
            ErrorInfo::new(code, err.to_string()).with_context("path", path.display()),
        )
    }
}
