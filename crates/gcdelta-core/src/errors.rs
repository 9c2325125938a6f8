//! Error facility
//!
//! [`DeltaError`] is what engine functions return. [`ExError`] is its
//! classified view (kind, stable code, operation, key, line) used by the
//! logging macros and the CLI.

use thiserror::Error;

/// Result type alias using DeltaError
pub type Result<T> = std::result::Result<T, DeltaError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code usable for programmatic handling,
/// tests and CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input
    /// Unbalanced record delimiters, unparsable schema block, ambiguous grouping
    MalformedInput,
    /// A reference-child names a type-class key that is never defined
    UnresolvedReference,

    // Engine correctness
    /// Replaying a diff did not reproduce the target text
    RoundTripMismatch,

    // Configuration
    InvalidLayout,

    // Integration/IO
    Io,
    Serialization,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::MalformedInput => "ERR_MALFORMED_INPUT",
            ExErrorKind::UnresolvedReference => "ERR_UNRESOLVED_REFERENCE",
            ExErrorKind::RoundTripMismatch => "ERR_ROUND_TRIP_MISMATCH",
            ExErrorKind::InvalidLayout => "ERR_INVALID_LAYOUT",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
        }
    }
}

/// Canonical structured error type
///
/// Carries classification fields for programmatic handling and enough
/// context (operation, aggregate key, line) to locate the problem.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    key: Option<String>,
    line: Option<usize>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            key: None,
            line: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add aggregate key context
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add 1-based line context
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the aggregate key context, if any
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Get the line context, if any
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {:?}", self.code(), self.kind)?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {})", key)?;
        }
        if let Some(line) = self.line {
            write!(f, " (line: {})", line)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for gcdelta operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeltaError {
    // ===== Malformed input =====
    /// Record open/close delimiters do not pair up
    #[error("Unbalanced record delimiter at line {line}: {reason}")]
    UnbalancedDelimiter { line: usize, reason: String },

    /// Column definition area cannot be read
    #[error("Malformed schema block at line {line}: {reason}")]
    MalformedSchema { line: usize, reason: String },

    /// Parent record carries no type-class key
    #[error("Parent record at line {line} has no type-class key")]
    MissingTypeClassKey { line: usize },

    /// Two parent records share one type-class key
    #[error("Duplicate aggregate '{key}' at line {line}")]
    DuplicateAggregate { key: String, line: usize },

    /// Unclassified rows appear in more than one run
    #[error("Unclassified rows resume at line {line} after aggregate rows")]
    SplitUnclassifiedGroup { line: usize },

    /// A child row resumes an aggregate after unclassified rows cut it off
    #[error("Child row at line {line} resumes aggregate '{owner}' after unclassified rows")]
    DetachedChild { owner: String, line: usize },

    // ===== References =====
    /// Reference-child points at a type-class key that no aggregate defines
    #[error("Aggregate '{from}' references undefined '{target}' (line {line})")]
    UnresolvedReference {
        from: String,
        target: String,
        line: usize,
    },

    // ===== Engine correctness =====
    /// Replayed text differs from the expected target
    #[error(
        "Round-trip mismatch at line {line}: expected {expected:?}, got {actual:?} \
         ({expected_lines} expected lines, {actual_lines} actual lines)"
    )]
    RoundTripMismatch {
        line: usize,
        expected: String,
        actual: String,
        expected_lines: usize,
        actual_lines: usize,
    },

    // ===== Configuration =====
    #[error("Invalid record layout: {reason}")]
    InvalidLayout { reason: String },

    // ===== IO =====
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl DeltaError {
    /// The offending 1-based line, where the error has one
    pub fn line(&self) -> Option<usize> {
        match self {
            DeltaError::UnbalancedDelimiter { line, .. }
            | DeltaError::MalformedSchema { line, .. }
            | DeltaError::MissingTypeClassKey { line }
            | DeltaError::DuplicateAggregate { line, .. }
            | DeltaError::SplitUnclassifiedGroup { line }
            | DeltaError::DetachedChild { line, .. }
            | DeltaError::UnresolvedReference { line, .. }
            | DeltaError::RoundTripMismatch { line, .. } => Some(*line),
            DeltaError::InvalidLayout { .. }
            | DeltaError::Io { .. }
            | DeltaError::Serialization { .. } => None,
        }
    }

    /// Shorthand for the error kind this maps to
    pub fn kind(&self) -> ExErrorKind {
        ExError::from(self.clone()).kind()
    }
}

impl From<serde_json::Error> for DeltaError {
    fn from(err: serde_json::Error) -> Self {
        DeltaError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for DeltaError {
    fn from(err: toml::de::Error) -> Self {
        DeltaError::InvalidLayout {
            reason: err.to_string(),
        }
    }
}

impl From<DeltaError> for ExError {
    fn from(err: DeltaError) -> Self {
        let message = err.to_string();
        let line = err.line();
        let ex = match err {
            DeltaError::UnbalancedDelimiter { .. }
            | DeltaError::MalformedSchema { .. }
            | DeltaError::MissingTypeClassKey { .. }
            | DeltaError::SplitUnclassifiedGroup { .. } => {
                ExError::new(ExErrorKind::MalformedInput)
            }
            DeltaError::DuplicateAggregate { key, .. }
            | DeltaError::DetachedChild { owner: key, .. } => {
                ExError::new(ExErrorKind::MalformedInput).with_key(key)
            }
            DeltaError::UnresolvedReference { from, .. } => {
                ExError::new(ExErrorKind::UnresolvedReference).with_key(from)
            }
            DeltaError::RoundTripMismatch { .. } => ExError::new(ExErrorKind::RoundTripMismatch),
            DeltaError::InvalidLayout { .. } => ExError::new(ExErrorKind::InvalidLayout),
            DeltaError::Io { .. } => ExError::new(ExErrorKind::Io),
            DeltaError::Serialization { .. } => ExError::new(ExErrorKind::Serialization),
        };
        let ex = ex.with_message(message);
        match line {
            Some(line) => ex.with_line(line),
            None => ex,
        }
    }
}
