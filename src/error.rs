//! Error types for store-schema-compiler

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while compiling a store schema
#[derive(Error, Debug)]
pub enum SchemaCompilerError {
    #[error("{message}")]
    CommandLine { message: String },

    #[error("Failed to read schema file: {path}")]
    SchemaReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("Failed to write output file: {path}")]
    OutputWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A state the schema model should have ruled out. The code identifies
    /// the check that failed.
    #[error("Internal error {code}")]
    Internal { code: &'static str },
}

impl SchemaCompilerError {
    pub fn command_line(message: impl Into<String>) -> Self {
        SchemaCompilerError::CommandLine {
            message: message.into(),
        }
    }

    /// Validation errors carried by this error, if it is a validation failure
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            SchemaCompilerError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Position of a diagnostic inside a schema file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({},{})", self.file, self.line, self.column)
    }
}

/// One problem found in a schema file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub location: Option<SourceLocation>,
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            location: None,
            message: message.into(),
        }
    }

    pub fn at(location: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            location: Some(location),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: error: {}", location, self.message),
            None => write!(f, "error: {}", self.message),
        }
    }
}

/// Every validation problem found in one pass over the schema.
///
/// Never empty: a pass that finds nothing produces `Ok` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Wrap a list of errors, returning `None` when the list is empty
    pub fn from_vec(errors: Vec<ValidationError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub fn single(error: ValidationError) -> Self {
        Self(vec![error])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if any message contains `needle`
    pub fn mentions(&self, needle: &str) -> bool {
        self.0.iter().any(|e| e.message.contains(needle))
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
