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

//! Error payload translation.

use crate::converter::chain::Supports;
use crate::converter::traits::ErrorTranslator;
use crate::error::{
    CANCELLATION_EXCEPTION, ErrorDescriptor, MISSING_METHOD_EXCEPTION, MISSING_SERVICE_EXCEPTION,
    RpcError, UNSUPPORTED_CONTENT_TYPE_EXCEPTION,
};

/// Maps framework class names back to their typed [`RpcError`] variants.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameworkErrorTranslator;

impl Supports<ErrorDescriptor> for FrameworkErrorTranslator {
    fn supports(&self, descriptor: &ErrorDescriptor) -> bool {
        matches!(
            descriptor.exception_class_name.as_str(),
            MISSING_SERVICE_EXCEPTION
                | MISSING_METHOD_EXCEPTION
                | UNSUPPORTED_CONTENT_TYPE_EXCEPTION
                | CANCELLATION_EXCEPTION
        )
    }
}

impl ErrorTranslator for FrameworkErrorTranslator {
    fn translate(&self, descriptor: &ErrorDescriptor) -> RpcError {
        let message = descriptor.error_message.clone();
        match descriptor.exception_class_name.as_str() {
            MISSING_SERVICE_EXCEPTION => RpcError::MissingService { message },
            MISSING_METHOD_EXCEPTION => RpcError::MissingMethod { message },
            UNSUPPORTED_CONTENT_TYPE_EXCEPTION => RpcError::UnsupportedContentType { message },
            CANCELLATION_EXCEPTION => RpcError::Canceled { reason: message },
            _ => RpcError::from(descriptor.clone()),
        }
    }
}

/// Maps any descriptor to [`RpcError::Remote`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RemoteErrorTranslator;

impl Supports<ErrorDescriptor> for RemoteErrorTranslator {
    fn supports(&self, _descriptor: &ErrorDescriptor) -> bool {
        true
    }
}

impl ErrorTranslator for RemoteErrorTranslator {
    fn translate(&self, descriptor: &ErrorDescriptor) -> RpcError {
        RpcError::from(descriptor.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_classes_are_typed() {
        let translator = FrameworkErrorTranslator;
        let descriptor = ErrorDescriptor::new(MISSING_METHOD_EXCEPTION, "service 'x' has no method 'y'");
        assert!(translator.supports(&descriptor));

        let error = translator.translate(&descriptor);
        assert!(matches!(error, RpcError::MissingMethod { .. }));
        assert_eq!(error.to_string(), "service 'x' has no method 'y'");

        assert!(!translator.supports(&ErrorDescriptor::new("Boom", "x")));

        let stopped = translator.translate(&ErrorDescriptor::new(CANCELLATION_EXCEPTION, "service stopped"));
        assert!(matches!(stopped, RpcError::Canceled { ref reason } if reason == "service stopped"));
    }

    #[test]
    fn test_remote_fallback() {
        let error = RemoteErrorTranslator.translate(&ErrorDescriptor::new("Boom", "x"));
        assert!(error.is_application_error());
        assert_eq!(error.class_name(), "Boom");
    }
}
