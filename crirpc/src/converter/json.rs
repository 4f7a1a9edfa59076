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

//! JSON converter implementation.
//!
//! Arguments travel as a JSON array with one element per parameter, results
//! as a single JSON value and errors as an [`ErrorDescriptor`] object.

use crate::converter::chain::Supports;
use crate::converter::error::ConversionError;
use crate::converter::media_type_matches;
use crate::converter::traits::{
    ArgumentResolver, RequestArgumentConverter, ResponseConverter, ReturnValueConverter,
};
use crate::error::ErrorDescriptor;
use crate::event::Event;
use crate::service::MethodDescriptor;
use serde::Serialize;
use serde_json::Value;

/// The `application/json` content type.
pub const APPLICATION_JSON: &str = "application/json";

/// JSON converter for every converter role.
///
/// # Examples
///
/// ```rust
/// use crirpc::converter::{JsonConverter, RequestArgumentConverter};
/// use crirpc::service::{MethodDescriptor, ReturnKind};
/// use serde_json::json;
///
/// let method = MethodDescriptor::new("add", &["a", "b"], "(i64, i64)", ReturnKind::Single);
/// let bytes = JsonConverter::new().encode_arguments(&[json!(1), json!(2)], &method)?;
/// assert_eq!(bytes, b"[1,2]");
/// # Ok::<(), crirpc::converter::ConversionError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct JsonConverter {
    pretty: bool,
}

impl JsonConverter {
    /// Creates a converter producing compact JSON.
    #[must_use]
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Produces indented JSON.
    #[must_use]
    pub fn with_pretty_print(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Produces compact JSON. This is the default.
    #[must_use]
    pub fn with_compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    fn to_bytes<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, ConversionError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };
        bytes.map_err(|e| ConversionError::encode(APPLICATION_JSON, e))
    }
}

impl Supports<Event> for JsonConverter {
    fn supports(&self, event: &Event) -> bool {
        event
            .content_type()
            .is_some_and(|ct| media_type_matches(ct, APPLICATION_JSON))
    }
}

impl Supports<str> for JsonConverter {
    fn supports(&self, content_type: &str) -> bool {
        media_type_matches(content_type, APPLICATION_JSON)
    }
}

impl ArgumentResolver for JsonConverter {
    fn resolve_arguments(
        &self,
        event: &Event,
        method: &MethodDescriptor,
    ) -> Result<Vec<Value>, ConversionError> {
        let args = if event.data().is_empty() {
            Vec::new()
        } else {
            match serde_json::from_slice::<Value>(event.data()) {
                Ok(Value::Array(args)) => args,
                Ok(_) => {
                    return Err(ConversionError::decode(
                        APPLICATION_JSON,
                        "arguments must be a JSON array",
                    ));
                }
                Err(e) => return Err(ConversionError::decode(APPLICATION_JSON, e)),
            }
        };
        if args.len() != method.arity() {
            return Err(ConversionError::Arity {
                method: method.name().to_string(),
                expected: method.arity(),
                actual: args.len(),
            });
        }
        Ok(args)
    }
}

impl ReturnValueConverter for JsonConverter {
    fn content_type(&self) -> &str {
        APPLICATION_JSON
    }

    fn encode_value(&self, value: &Value, _method: &MethodDescriptor) -> Result<Vec<u8>, ConversionError> {
        self.to_bytes(value)
    }

    fn encode_error(&self, error: &ErrorDescriptor) -> Result<Vec<u8>, ConversionError> {
        self.to_bytes(error)
    }
}

impl RequestArgumentConverter for JsonConverter {
    fn content_type(&self) -> &str {
        APPLICATION_JSON
    }

    fn encode_arguments(&self, args: &[Value], _method: &MethodDescriptor) -> Result<Vec<u8>, ConversionError> {
        self.to_bytes(args)
    }
}

impl ResponseConverter for JsonConverter {
    fn decode_value(&self, event: &Event, _method: &MethodDescriptor) -> Result<Value, ConversionError> {
        if event.is_void() || event.data().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(event.data()).map_err(|e| ConversionError::decode(APPLICATION_JSON, e))
    }

    fn decode_error(&self, event: &Event) -> Result<ErrorDescriptor, ConversionError> {
        serde_json::from_slice(event.data()).map_err(|e| ConversionError::decode(APPLICATION_JSON, e))
    }
}
