// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
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

//! Engine error types
//!
//! All fallible operations in the crate return [`Result<T>`], an alias for
//! `Result<T, EngineError>`.
//!
//! # Error Policy
//!
//! Configuration problems (malformed coefficient vectors, non-positive
//! dimensions, a region of interest outside its view, zero precision) are
//! reported at construction time or by the mutator call that made the
//! configuration invalid. The transform driver itself never fails
//! mid-stream: out-of-frame source samples are replaced with the configured
//! null value and are not errors.

use thiserror::Error;

/// Errors that can occur in the correction engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// A model, view or transform was configured with invalid parameters
    ///
    /// Raised at construction or at the mutator call that made the
    /// configuration invalid, never from inside `do_transform`.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A raster was described with an unsupported storage layout
    #[error("unsupported storage layout: {0}")]
    LayoutMismatch(String),

    /// An I/O error from the raster codec collaborator
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The raster codec failed to decode an input image
    #[error("image decode error: {0}")]
    Decode(String),

    /// The raster codec failed to encode an output image
    #[error("image encode error: {0}")]
    Encode(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Create an invalid-configuration error from anything printable
    pub fn config(msg: impl Into<String>) -> Self {
        EngineError::InvalidConfig(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::config("oversampling must be >= 1");
        assert_eq!(
            err.to_string(),
            "invalid configuration: oversampling must be >= 1"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: EngineError = io.into();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
