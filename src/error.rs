// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for HL7 v2 parsing, addressing and encoding
//!
//! This module defines the error types used throughout the codec.

use thiserror::Error;

/// Result type alias for HL7 operations
pub type Result<T> = std::result::Result<T, Hl7Error>;

/// Comprehensive error type for HL7 operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Hl7Error {
    /// The MSH segment is too short or declares degenerate encoding characters
    #[error("Malformed header: {message}")]
    MalformedHeader {
        /// Human-readable description of the header problem
        message: String,
    },

    /// The message text could not be split into segments
    #[error("Parse failure{}: {message}", line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    ParseFailure {
        /// 1-based line number of the offending segment, if known
        line: Option<usize>,
        /// Human-readable error message
        message: String,
    },

    /// A path addressed a segment or segment occurrence that does not exist
    #[error("Path not found: {path}")]
    PathNotFound {
        /// The path that failed to resolve
        path: String,
    },

    /// A path string does not follow the addressing grammar
    #[error("Invalid path '{path}': {message}")]
    InvalidPath {
        /// The offending path string
        path: String,
        /// Human-readable error message
        message: String,
    },

    /// A write targeted an index that cannot hold a value
    #[error("Invalid index {index}: {message}")]
    InvalidIndex {
        /// The rejected index
        index: usize,
        /// Human-readable error message
        message: String,
    },

    /// A timestamp does not follow the HL7 TS grammar
    #[error("Invalid timestamp '{input}'")]
    InvalidTimestamp {
        /// The rejected input
        input: String,
    },
}

impl Hl7Error {
    /// Create a malformed header error
    pub fn malformed_header(message: impl Into<String>) -> Self {
        Self::MalformedHeader {
            message: message.into(),
        }
    }

    /// Create a parse failure without line information
    pub fn parse_failure(message: impl Into<String>) -> Self {
        Self::ParseFailure {
            line: None,
            message: message.into(),
        }
    }

    /// Create a parse failure pointing at a 1-based line
    pub fn parse_failure_at(line: usize, message: impl Into<String>) -> Self {
        Self::ParseFailure {
            line: Some(line),
            message: message.into(),
        }
    }

    /// Create a path not found error
    pub fn path_not_found(path: impl Into<String>) -> Self {
        Self::PathNotFound { path: path.into() }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid index error
    pub fn invalid_index(index: usize, message: impl Into<String>) -> Self {
        Self::InvalidIndex {
            index,
            message: message.into(),
        }
    }

    /// Create an invalid timestamp error
    pub fn invalid_timestamp(input: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            input: input.into(),
        }
    }

    /// Whether this error came from reading the wire text rather than from a caller request
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::MalformedHeader { .. } | Self::ParseFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Hl7Error::parse_failure_at(3, "segment name shorter than 3 characters");
        assert_eq!(
            err.to_string(),
            "Parse failure at line 3: segment name shorter than 3 characters"
        );

        let err = Hl7Error::parse_failure("no segments found");
        assert_eq!(err.to_string(), "Parse failure: no segments found");

        let err = Hl7Error::path_not_found("NK1(3).2");
        assert_eq!(err.to_string(), "Path not found: NK1(3).2");
    }

    #[test]
    fn test_parse_error_classification() {
        assert!(Hl7Error::malformed_header("too short").is_parse_error());
        assert!(!Hl7Error::invalid_timestamp("201").is_parse_error());
    }
}
