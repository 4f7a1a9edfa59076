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

//! Top-level error types for crirpc.
//!
//! Errors are layered the same way calls are:
//!
//! 1. **Transport**: the bus could not deliver the call ([`BusError`]), no
//!    service is listening, or the call timed out.
//! 2. **Framework**: the call reached a supervisor but could not be
//!    dispatched (missing method, unsupported content type, conversion).
//! 3. **Application**: the service body itself failed ([`RpcError::Remote`]).
//!
//! Every variant has a stable *class name* which travels in the
//! [`ErrorDescriptor`] payload of an error response, so a caller on the other
//! side of the bus can map it back to the same variant.
//!
//! # Examples
//!
//! ```rust
//! use crirpc::bus::BusError;
//! use crirpc::RpcError;
//!
//! let error: RpcError = BusError::Closed.into();
//! assert!(error.is_transport_error());
//! assert!(!error.is_application_error());
//!
//! let error = RpcError::missing_method("a.b.Foo", "baz");
//! assert_eq!(error.class_name(), "RpcMissingMethodException");
//! ```

use crate::address::AddressError;
use crate::bus::BusError;
use crate::converter::ConversionError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Class name reported when a service method panics.
pub const PANIC_EXCEPTION: &str = "PanicException";
/// Class name for [`RpcError::MissingService`].
pub const MISSING_SERVICE_EXCEPTION: &str = "RpcMissingServiceException";
/// Class name for [`RpcError::MissingMethod`].
pub const MISSING_METHOD_EXCEPTION: &str = "RpcMissingMethodException";
/// Class name for [`RpcError::UnsupportedContentType`].
pub const UNSUPPORTED_CONTENT_TYPE_EXCEPTION: &str = "UnsupportedContentTypeException";
/// Class name for [`RpcError::Conversion`].
pub const CONVERSION_EXCEPTION: &str = "ConversionException";
/// Class name for [`RpcError::Transport`].
pub const TRANSPORT_EXCEPTION: &str = "TransportException";
/// Class name for [`RpcError::Canceled`].
pub const CANCELLATION_EXCEPTION: &str = "CancellationException";
/// Class name for [`RpcError::Timeout`].
pub const TIMEOUT_EXCEPTION: &str = "TimeoutException";
/// Class name for [`RpcError::Address`].
pub const ADDRESS_EXCEPTION: &str = "AddressFormatException";
/// Class name used for service failures that do not name their own.
pub const SERVICE_EXCEPTION: &str = "ServiceException";

/// Errors surfaced to RPC callers.
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    /// Nothing is registered at the target address.
    #[error("{message}")]
    MissingService {
        /// Human-readable description
        message: String,
    },

    /// The service exists but has no such method.
    #[error("{message}")]
    MissingMethod {
        /// Human-readable description
        message: String,
    },

    /// No converter supports the requested content type.
    #[error("{message}")]
    UnsupportedContentType {
        /// Human-readable description
        message: String,
    },

    /// A converter was found but failed.
    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    /// The service body failed.
    #[error("{class_name}: {message}")]
    Remote {
        /// Class name reported by the service
        class_name: String,
        /// Message reported by the service
        message: String,
        /// Frames reported by the service, possibly empty
        stack_trace: Vec<StackFrame>,
    },

    /// The bus rejected or failed to deliver an event.
    #[error("transport failure: {0}")]
    Transport(#[from] BusError),

    /// The call was canceled before it produced an outcome.
    #[error("{reason}")]
    Canceled {
        /// Reason given to `cancel`
        reason: String,
    },

    /// No response arrived in time.
    #[error("call timed out after {timeout:?}")]
    Timeout {
        /// The configured limit
        timeout: Duration,
    },

    /// An address in a header or descriptor did not parse.
    #[error("invalid address: {0}")]
    Address(#[from] AddressError),
}

impl RpcError {
    /// Creates a [`MissingService`](Self::MissingService) error for `address`.
    pub fn missing_service(address: impl std::fmt::Display) -> Self {
        Self::MissingService {
            message: format!("no service is registered at '{address}'"),
        }
    }

    /// Creates a [`MissingMethod`](Self::MissingMethod) error.
    pub fn missing_method(interface: &str, method: &str) -> Self {
        Self::MissingMethod {
            message: format!("service '{interface}' has no method '{method}'"),
        }
    }

    /// Creates an [`UnsupportedContentType`](Self::UnsupportedContentType) error.
    pub fn unsupported_content_type(content_type: &str) -> Self {
        Self::UnsupportedContentType {
            message: format!("no converter supports content type '{content_type}'"),
        }
    }

    /// Creates a [`Canceled`](Self::Canceled) error.
    pub fn canceled(reason: impl Into<String>) -> Self {
        Self::Canceled {
            reason: reason.into(),
        }
    }

    /// Returns the stable class name carried in error payloads.
    #[must_use]
    pub fn class_name(&self) -> &str {
        match self {
            Self::MissingService { .. } => MISSING_SERVICE_EXCEPTION,
            Self::MissingMethod { .. } => MISSING_METHOD_EXCEPTION,
            Self::UnsupportedContentType { .. } => UNSUPPORTED_CONTENT_TYPE_EXCEPTION,
            Self::Conversion(_) => CONVERSION_EXCEPTION,
            Self::Remote { class_name, .. } => class_name,
            Self::Transport(_) => TRANSPORT_EXCEPTION,
            Self::Canceled { .. } => CANCELLATION_EXCEPTION,
            Self::Timeout { .. } => TIMEOUT_EXCEPTION,
            Self::Address(_) => ADDRESS_EXCEPTION,
        }
    }

    /// Returns the message without the class name.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Returns `true` if the call never reached a working service.
    ///
    /// This covers bus failures, a missing service and timeouts.
    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::MissingService { .. } | Self::Timeout { .. }
        )
    }

    /// Returns `true` if the service body reported the failure.
    #[must_use]
    pub const fn is_application_error(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Returns `true` if the call was canceled.
    #[must_use]
    pub const fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled { .. })
    }

    /// Returns `true` if retrying the call may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(error) => error.is_recoverable(),
            Self::MissingService { .. } | Self::Timeout { .. } => true,
            _ => false,
        }
    }
}

/// One frame of a remote stack trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    /// Type or module the frame belongs to.
    pub declaring_class: String,
    /// Function or method name.
    pub method_name: String,
    /// Source file, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Source line, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
}

impl StackFrame {
    /// Creates a frame with no source location.
    pub fn new(declaring_class: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            declaring_class: declaring_class.into(),
            method_name: method_name.into(),
            file_name: None,
            line_number: None,
        }
    }

    /// Adds a source location.
    #[must_use]
    pub fn at(mut self, file_name: impl Into<String>, line_number: u32) -> Self {
        self.file_name = Some(file_name.into());
        self.line_number = Some(line_number);
        self
    }
}

/// Serializable payload of an error response.
///
/// ```rust
/// use crirpc::{ErrorDescriptor, RpcError};
///
/// let descriptor = ErrorDescriptor::from(&RpcError::missing_method("a.b.Foo", "baz"));
/// let json = serde_json::to_string(&descriptor)?;
/// assert!(json.contains(r#""exceptionClassName":"RpcMissingMethodException""#));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDescriptor {
    /// Human-readable message.
    pub error_message: String,
    /// Stable class name of the failure.
    pub exception_class_name: String,
    /// Frames describing where the failure happened.
    #[serde(default)]
    pub stack_trace: Vec<StackFrame>,
}

impl ErrorDescriptor {
    /// Creates a descriptor with an empty stack trace.
    pub fn new(exception_class_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            error_message: error_message.into(),
            exception_class_name: exception_class_name.into(),
            stack_trace: Vec::new(),
        }
    }
}

impl From<&RpcError> for ErrorDescriptor {
    fn from(error: &RpcError) -> Self {
        let stack_trace = match error {
            RpcError::Remote { stack_trace, .. } => stack_trace.clone(),
            _ => Vec::new(),
        };
        Self {
            error_message: error.message(),
            exception_class_name: error.class_name().to_string(),
            stack_trace,
        }
    }
}

impl From<ErrorDescriptor> for RpcError {
    /// Builds the application-class error for a descriptor.
    ///
    /// Framework class names are mapped back to typed variants by the
    /// client's error translators, not here.
    fn from(descriptor: ErrorDescriptor) -> Self {
        Self::Remote {
            class_name: descriptor.exception_class_name,
            message: descriptor.error_message,
            stack_trace: descriptor.stack_trace,
        }
    }
}
