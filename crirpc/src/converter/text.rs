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

//! Plain text converter implementation.
//!
//! Supports methods taking at most one argument. The payload is the UTF-8
//! text of that argument or result; numbers and booleans are written in
//! their JSON notation. Error payloads are written as `class: message`.

use crate::converter::chain::Supports;
use crate::converter::error::ConversionError;
use crate::converter::media_type_matches;
use crate::converter::traits::{
    ArgumentResolver, RequestArgumentConverter, ResponseConverter, ReturnValueConverter,
};
use crate::error::ErrorDescriptor;
use crate::event::Event;
use crate::service::MethodDescriptor;
use serde_json::Value;

/// The `text/plain` content type.
pub const TEXT_PLAIN: &str = "text/plain";

/// Plain text converter for every converter role.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextConverter;

impl TextConverter {
    /// Creates the converter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn to_text(value: &Value) -> Result<String, ConversionError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        Value::Bool(_) | Value::Number(_) => Ok(value.to_string()),
        Value::Array(_) | Value::Object(_) => Err(ConversionError::encode(
            TEXT_PLAIN,
            "only scalar values can be written as text",
        )),
    }
}

fn from_utf8(data: &[u8]) -> Result<String, ConversionError> {
    String::from_utf8(data.to_vec()).map_err(|e| ConversionError::decode(TEXT_PLAIN, e))
}

impl Supports<Event> for TextConverter {
    fn supports(&self, event: &Event) -> bool {
        event
            .content_type()
            .is_some_and(|ct| media_type_matches(ct, TEXT_PLAIN))
    }
}

impl Supports<str> for TextConverter {
    fn supports(&self, content_type: &str) -> bool {
        media_type_matches(content_type, TEXT_PLAIN)
    }
}

impl ArgumentResolver for TextConverter {
    fn resolve_arguments(
        &self,
        event: &Event,
        method: &MethodDescriptor,
    ) -> Result<Vec<Value>, ConversionError> {
        match method.arity() {
            0 if event.data().is_empty() => Ok(Vec::new()),
            1 => Ok(vec![Value::String(from_utf8(event.data())?)]),
            expected => Err(ConversionError::Arity {
                method: method.name().to_string(),
                expected,
                actual: 1,
            }),
        }
    }
}

impl ReturnValueConverter for TextConverter {
    fn content_type(&self) -> &str {
        TEXT_PLAIN
    }

    fn encode_value(&self, value: &Value, _method: &MethodDescriptor) -> Result<Vec<u8>, ConversionError> {
        to_text(value).map(String::into_bytes)
    }

    fn encode_error(&self, error: &ErrorDescriptor) -> Result<Vec<u8>, ConversionError> {
        Ok(format!("{}: {}", error.exception_class_name, error.error_message).into_bytes())
    }
}

impl RequestArgumentConverter for TextConverter {
    fn content_type(&self) -> &str {
        TEXT_PLAIN
    }

    fn encode_arguments(&self, args: &[Value], method: &MethodDescriptor) -> Result<Vec<u8>, ConversionError> {
        match args {
            [] => Ok(Vec::new()),
            [arg] => to_text(arg).map(String::into_bytes),
            _ => Err(ConversionError::Arity {
                method: method.name().to_string(),
                expected: 1,
                actual: args.len(),
            }),
        }
    }
}

impl ResponseConverter for TextConverter {
    fn decode_value(&self, event: &Event, _method: &MethodDescriptor) -> Result<Value, ConversionError> {
        if event.is_void() {
            return Ok(Value::Null);
        }
        from_utf8(event.data()).map(Value::String)
    }

    fn decode_error(&self, event: &Event) -> Result<ErrorDescriptor, ConversionError> {
        let text = from_utf8(event.data())?;
        Ok(match text.split_once(": ") {
            Some((class_name, message)) => ErrorDescriptor::new(class_name, message),
            None => ErrorDescriptor::new(crate::error::SERVICE_EXCEPTION, text),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Metadata, headers};
    use crate::service::ReturnKind;
    use serde_json::json;

    fn event(data: &[u8]) -> Event {
        Event::parse(
            "srv://a.b.Echo/echo",
            Metadata::new().with(headers::CONTENT_TYPE, TEXT_PLAIN),
            data.to_vec(),
        )
        .unwrap()
    }

    fn echo() -> MethodDescriptor {
        MethodDescriptor::new("echo", &["text"], "(String,)", ReturnKind::Single)
    }

    #[test]
    fn test_single_string_argument() {
        let text = TextConverter::new();
        assert!(text.supports(&event(b"hi")));
        let args = text.resolve_arguments(&event("héllo".as_bytes()), &echo()).unwrap();
        assert_eq!(args, vec![json!("héllo")]);
    }

    #[test]
    fn test_rejects_multiple_arguments() {
        let text = TextConverter::new();
        let pair = MethodDescriptor::new("add", &["a", "b"], "(i64, i64)", ReturnKind::Single);
        assert!(matches!(
            text.resolve_arguments(&event(b"1"), &pair),
            Err(ConversionError::Arity { expected: 2, .. })
        ));
        assert!(text.encode_arguments(&[json!(1), json!(2)], &pair).is_err());
        assert!(text.resolve_arguments(&event(&[0xff, 0xfe]), &echo()).is_err());
    }

    #[test]
    fn test_encode_scalars() {
        let text = TextConverter::new();
        assert_eq!(text.encode_value(&json!("x"), &echo()).unwrap(), b"x");
        assert_eq!(text.encode_value(&json!(42), &echo()).unwrap(), b"42");
        assert!(text.encode_value(&json!([1]), &echo()).is_err());
    }

    #[test]
    fn test_error_payload() {
        let text = TextConverter::new();
        let bytes = text.encode_error(&ErrorDescriptor::new("Boom", "it: broke")).unwrap();
        let descriptor = text.decode_error(&event(&bytes)).unwrap();
        assert_eq!(descriptor.exception_class_name, "Boom");
        assert_eq!(descriptor.error_message, "it: broke");
    }
}
