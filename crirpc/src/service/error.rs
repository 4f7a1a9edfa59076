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

//! Service and registry errors.

use crate::bus::BusError;
use crate::error::{ErrorDescriptor, RpcError, SERVICE_EXCEPTION, StackFrame};
use std::io;
use thiserror::Error;

/// A failure returned by a service method body.
///
/// The supervisor turns it into an [`ErrorDescriptor`] and sends it to the
/// caller, where it surfaces as [`RpcError::Remote`].
///
/// # Examples
///
/// ```rust
/// use crirpc::service::ServiceError;
///
/// let error = ServiceError::with_class("DivideByZero", "cannot divide 1 by 0");
/// assert_eq!(error.class_name(), "DivideByZero");
///
/// let error: ServiceError = "plain failure".into();
/// assert_eq!(error.class_name(), "ServiceException");
/// ```
#[derive(Debug, Clone, Error)]
#[error("{class_name}: {message}")]
pub struct ServiceError {
    class_name: String,
    message: String,
    stack_trace: Vec<StackFrame>,
}

impl ServiceError {
    /// Creates an error with the generic service class name.
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_class(SERVICE_EXCEPTION, message)
    }

    /// Creates an error with an explicit class name.
    pub fn with_class(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            message: message.into(),
            stack_trace: Vec::new(),
        }
    }

    /// Appends a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: StackFrame) -> Self {
        self.stack_trace.push(frame);
        self
    }

    /// Class name reported to the caller.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Message reported to the caller.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Frames reported to the caller.
    #[must_use]
    pub fn stack_trace(&self) -> &[StackFrame] {
        &self.stack_trace
    }
}

impl From<ServiceError> for ErrorDescriptor {
    fn from(error: ServiceError) -> Self {
        Self {
            error_message: error.message,
            exception_class_name: error.class_name,
            stack_trace: error.stack_trace,
        }
    }
}

impl From<String> for ServiceError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ServiceError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<io::Error> for ServiceError {
    fn from(error: io::Error) -> Self {
        Self::with_class("std::io::Error", error.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(error: serde_json::Error) -> Self {
        Self::with_class("serde_json::Error", error.to_string())
    }
}

impl From<RpcError> for ServiceError {
    fn from(error: RpcError) -> Self {
        let descriptor = ErrorDescriptor::from(&error);
        Self {
            class_name: descriptor.exception_class_name,
            message: descriptor.error_message,
            stack_trace: descriptor.stack_trace,
        }
    }
}

/// Errors raised by [`ServiceRegistry`](super::ServiceRegistry).
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Another supervisor is already bound to the address.
    #[error("a service is already registered at {address}")]
    AlreadyRegistered {
        /// The contested address
        address: String,
    },

    /// Nothing is bound to the address.
    #[error("no service is registered at {address}")]
    NotRegistered {
        /// The requested address
        address: String,
    },

    /// The supervisor could not open its subscription.
    #[error("failed to start service at {address}: {source}")]
    Start {
        /// The address being registered
        address: String,
        /// The bus failure
        #[source]
        source: BusError,
    },

    /// The registration was removed while its supervisor was starting.
    #[error("registration at {address} was withdrawn before it started")]
    StartAborted {
        /// The address being registered
        address: String,
    },
}

impl RegistryError {
    /// Returns `true` for [`AlreadyRegistered`](Self::AlreadyRegistered).
    #[must_use]
    pub const fn is_already_registered(&self) -> bool {
        matches!(self, Self::AlreadyRegistered { .. })
    }

    /// Returns `true` for [`NotRegistered`](Self::NotRegistered).
    #[must_use]
    pub const fn is_not_registered(&self) -> bool {
        matches!(self, Self::NotRegistered { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_conversions() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "gone");
        let error = ServiceError::from(io_error);
        assert_eq!(error.class_name(), "std::io::Error");
        assert_eq!(error.message(), "gone");

        let error = ServiceError::from(RpcError::missing_method("a.b.C", "m"));
        assert_eq!(error.class_name(), "RpcMissingMethodException");

        let error = ServiceError::from(String::from("x")).with_frame(StackFrame::new("calc", "add"));
        let descriptor = ErrorDescriptor::from(error);
        assert_eq!(descriptor.exception_class_name, SERVICE_EXCEPTION);
        assert_eq!(descriptor.stack_trace.len(), 1);
    }

    #[test]
    fn test_registry_error_predicates() {
        let error = RegistryError::AlreadyRegistered {
            address: "srv://x".to_string(),
        };
        assert!(error.is_already_registered());
        assert!(!error.is_not_registered());
        assert_eq!(error.to_string(), "a service is already registered at srv://x");
    }
}
