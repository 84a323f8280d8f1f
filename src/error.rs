//! Error types raised at the boundaries of the core: generator exhaustion,
//! malformed configuration strings, and malformed reproduce tokens.
//!
//! None of these is raised by a property failing — that is reported through
//! [`crate::property::CaseResult`], never through `Result`.

use core::{error, fmt};

/// A generator could not produce a value (a `such_that`/`filter` ran out of
/// attempts, `element_of` was handed an empty container, a unique container
/// exhausted its retry budget, ...). The driver converts this into a
/// [`crate::property::CaseResult::Discard`].
#[derive(Clone, Debug)]
pub struct GenerationFailure {
    pub reason: String,
}

impl GenerationFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "generation failure: {}", self.reason)
    }
}

impl error::Error for GenerationFailure {}

/// A configuration string could not be parsed.
#[derive(Clone, Debug)]
pub struct ConfigurationError {
    pub message: String,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration: {}", self.message)
    }
}

impl error::Error for ConfigurationError {}

/// A reproduce token was truncated or malformed during decoding.
#[derive(Clone, Debug)]
pub struct SerializationError {
    pub message: String,
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid reproduce token: {}", self.message)
    }
}

impl error::Error for SerializationError {}
