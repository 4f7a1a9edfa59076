//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Conversion error types.

use thiserror::Error;

/// Errors raised by a converter that was selected but failed.
///
/// This is distinct from resolution failing to find a converter at all, which
/// surfaces as [`RpcError::UnsupportedContentType`](crate::RpcError).
///
/// # Examples
///
/// ```rust
/// use crirpc::converter::ConversionError;
///
/// let error = ConversionError::Arity {
///     method: "add".to_string(),
///     expected: 2,
///     actual: 1,
/// };
/// assert_eq!(error.to_string(), "method 'add' expects 2 argument(s), got 1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// A value could not be encoded.
    #[error("failed to encode {content_type}: {message}")]
    Encode {
        /// Content type the converter produces
        content_type: String,
        /// Description of the failure
        message: String,
    },

    /// A payload could not be decoded.
    #[error("failed to decode {content_type}: {message}")]
    Decode {
        /// Content type the converter reads
        content_type: String,
        /// Description of the failure
        message: String,
    },

    /// The decoded argument list does not fit the method.
    #[error("method '{method}' expects {expected} argument(s), got {actual}")]
    Arity {
        /// Method being called
        method: String,
        /// Declared parameter count
        expected: usize,
        /// Arguments present in the payload
        actual: usize,
    },

    /// The argument values do not fit the method's parameter types.
    #[error("invalid arguments for '{method}': {message}")]
    Argument {
        /// Method being called
        method: String,
        /// Description of the mismatch
        message: String,
    },

    /// A returned value does not fit the type the caller expects.
    #[error("unexpected result from '{method}': {message}")]
    ReturnValue {
        /// Method that was called
        method: String,
        /// Description of the mismatch
        message: String,
    },
}

impl ConversionError {
    /// Creates an [`Encode`](Self::Encode) error.
    pub fn encode(content_type: &str, message: impl ToString) -> Self {
        Self::Encode {
            content_type: content_type.to_string(),
            message: message.to_string(),
        }
    }

    /// Creates a [`Decode`](Self::Decode) error.
    pub fn decode(content_type: &str, message: impl ToString) -> Self {
        Self::Decode {
            content_type: content_type.to_string(),
            message: message.to_string(),
        }
    }

    /// Returns the content type involved, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::Encode { content_type, .. } | Self::Decode { content_type, .. } => {
                Some(content_type)
            }
            Self::Arity { .. } | Self::Argument { .. } | Self::ReturnValue { .. } => None,
        }
    }
}
