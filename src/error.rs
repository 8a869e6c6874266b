use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A single raw token that could not be turned into a `key=value` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentError {
    /// The token exactly as supplied by the caller
    pub token: String,
    pub reason: ArgumentErrorReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentErrorReason {
    /// Zero or more than one `=` separator
    NotKeyValue,
    /// Nothing in front of the `=`
    EmptyKey,
    /// The lower-cased key was already supplied by an earlier token
    DuplicateKey(String),
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            ArgumentErrorReason::NotKeyValue | ArgumentErrorReason::EmptyKey => {
                write!(f, "Argument {} is invalid.", self.token)
            }
            ArgumentErrorReason::DuplicateKey(key) => {
                write!(f, "Argument {} duplicates key '{}'.", self.token, key)
            }
        }
    }
}

/// Main library error type covering every hard failure the toolkit reports
///
/// Schema violations are deliberately absent: they are collected as
/// [`crate::validator::SchemaIssue`] values and returned to the caller.
#[derive(Error, Debug)]
pub enum ToolkitError {
    #[error("Invalid argument: {param}{}", suffix(.message))]
    InvalidArgument { param: String, message: String },

    #[error("Argument out of range: {param}{}", suffix(.message))]
    OutOfRange { param: String, message: String },

    #[error("Malformed arguments:\n{}", join_lines(.errors))]
    MalformedArguments { errors: Vec<ArgumentError> },

    #[error("Argument name {name} does not have a value.")]
    MissingValue { name: String },

    #[error("Invalid validation mode: {0}")]
    InvalidMode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Schema parsing error: {source_name} - {details}")]
    SchemaParsing { source_name: String, details: String },

    #[error("Malformed XML document: {source_name} - {details}")]
    MalformedDocument { source_name: String, details: String },

    #[error("Schema namespace mismatch: expected '{expected}', schema declares '{actual}'")]
    NamespaceMismatch { expected: String, actual: String },

    #[error("LibXML2 internal error: {details}")]
    LibXml2Internal { details: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("Could not find {kind}: {name}")]
    XmlNodeNotFound { kind: &'static str, name: String },
}

impl ToolkitError {
    /// Per-token errors carried by [`ToolkitError::MalformedArguments`], if any
    pub fn argument_errors(&self) -> Option<&[ArgumentError]> {
        match self {
            ToolkitError::MalformedArguments { errors } => Some(errors),
            _ => None,
        }
    }
}

fn suffix(message: &str) -> String {
    if message.trim().is_empty() {
        String::new()
    } else {
        format!(" - {}", message)
    }
}

fn join_lines(errors: &[ArgumentError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// LibXML2-specific error types
#[derive(Error, Debug)]
pub enum LibXml2Error {
    #[error("Schema parsing failed: {details}")]
    SchemaParseFailed { details: String },

    #[error("Validation context creation failed")]
    ValidationContextCreationFailed,

    #[error("Memory allocation failed in libxml2")]
    MemoryAllocation,

    #[error("Document is not well-formed: {details}")]
    NotWellFormed { details: String },

    #[error("Input contains an interior NUL byte: {input}")]
    InteriorNul { input: String },

    #[error("Input too large for libxml2: {size} bytes")]
    InputTooLarge { size: usize },

    #[error("Validation internal error with code {code}")]
    InternalError { code: i32 },
}

impl From<LibXml2Error> for ToolkitError {
    fn from(err: LibXml2Error) -> Self {
        ToolkitError::LibXml2Internal {
            details: err.to_string(),
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ToolkitError>;

/// LibXML2 result type alias
pub type LibXml2Result<T> = std::result::Result<T, LibXml2Error>;
