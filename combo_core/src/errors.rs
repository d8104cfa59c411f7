//! # Error Types
//!
//! Structured error types for combo_core. Every public operation returns
//! a `ComboResult` instead of panicking or printing; callers get a variant
//! they can match on plus a displayable message.
//!
//! ## Example
//!
//! ```rust
//! use combo_core::errors::{ComboError, ComboResult};
//!
//! fn validate_name(name: &str) -> ComboResult<()> {
//!     if name.trim().is_empty() {
//!         return Err(ComboError::invalid_input("name", "Name must not be blank"));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for combo_core operations
pub type ComboResult<T> = Result<T, ComboError>;

/// Category of formula validation failure.
///
/// Callers that only want a displayable message can use the `Display`
/// impl of [`ComboError`]; the kind is for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormulaErrorKind {
    /// Empty or whitespace-only formula
    Empty,
    /// Formula ends or begins with a dangling operator
    Incomplete,
    /// Two load terms with no `+`/`-` between them
    MissingOperator,
    /// Three or more consecutive sign characters
    RepeatedOperator,
    /// Negative load factor where negatives are not allowed
    NegativeFactor,
    /// Load factor above the configured maximum
    FactorTooLarge,
    /// Load code not in the configured valid set
    UnknownLoadCode,
    /// No recognizable factor/load-code term at all
    NoTerms,
    /// Stray characters or tokens outside the grammar
    InvalidSyntax,
}

/// Structured error type for load-combination operations.
///
/// Each variant provides specific context about what went wrong. No
/// internal fault escapes the public API as a panic; everything is
/// translated into one of these variants at the operation boundary.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum ComboError {
    /// An input value is invalid (blank name, empty formula, etc.)
    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    /// Formula failed syntax or engineering-sanity validation
    #[error("Invalid formula '{formula}': {reason}")]
    InvalidFormula {
        formula: String,
        kind: FormulaErrorKind,
        reason: String,
    },

    /// A combination with this name already exists in the registry
    #[error("Combination '{name}' already exists")]
    DuplicateName { name: String },

    /// Lookup by name failed
    #[error("{what} not found: '{name}'")]
    NotFound { what: String, name: String },

    /// Import target exists but is not parseable or has the wrong shape
    #[error("Malformed data in '{path}': {reason}")]
    MalformedData { path: String, reason: String },

    /// Filesystem failure on export/import
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Failure signaled by the external structural solver
    #[error("Solver error during {stage}: {reason}")]
    SolverError { stage: String, reason: String },

    /// Critical-selection called with an empty candidate list
    #[error("No combinations provided")]
    NoCombinations,

    /// No candidate produced a governing value above zero
    #[error("No critical combination found")]
    NoCriticalFound,
}

impl ComboError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ComboError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidFormula error
    pub fn formula(
        formula: impl Into<String>,
        kind: FormulaErrorKind,
        reason: impl Into<String>,
    ) -> Self {
        ComboError::InvalidFormula {
            formula: formula.into(),
            kind,
            reason: reason.into(),
        }
    }

    /// Create a DuplicateName error
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        ComboError::DuplicateName { name: name.into() }
    }

    /// Create a NotFound error
    pub fn not_found(what: impl Into<String>, name: impl Into<String>) -> Self {
        ComboError::NotFound {
            what: what.into(),
            name: name.into(),
        }
    }

    /// Create a MalformedData error
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ComboError::MalformedData {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ComboError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a SolverError
    pub fn solver(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        ComboError::SolverError {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ComboError::InvalidInput { .. } => "INVALID_INPUT",
            ComboError::InvalidFormula { .. } => "INVALID_FORMULA",
            ComboError::DuplicateName { .. } => "DUPLICATE_NAME",
            ComboError::NotFound { .. } => "NOT_FOUND",
            ComboError::MalformedData { .. } => "MALFORMED_DATA",
            ComboError::FileError { .. } => "FILE_ERROR",
            ComboError::SerializationError { .. } => "SERIALIZATION_ERROR",
            ComboError::SolverError { .. } => "SOLVER_ERROR",
            ComboError::NoCombinations => "NO_COMBINATIONS",
            ComboError::NoCriticalFound => "NO_CRITICAL_FOUND",
        }
    }

    /// The formula error kind, if this is an InvalidFormula
    pub fn formula_kind(&self) -> Option<FormulaErrorKind> {
        match self {
            ComboError::InvalidFormula { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
