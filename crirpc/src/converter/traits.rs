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

//! The five converter roles.
//!
//! Each role is an independent chain: the server decodes arguments and
//! encodes results, the client encodes arguments, decodes results and
//! translates error payloads. Converters are stateless; the method being
//! called is passed in on every call.

use crate::converter::chain::Supports;
use crate::converter::error::ConversionError;
use crate::error::{ErrorDescriptor, RpcError};
use crate::event::Event;
use crate::service::MethodDescriptor;
use serde_json::Value;

/// Server side: decodes the argument list of an inbound call.
///
/// Selected by the inbound event, normally by its `content-type` header.
pub trait ArgumentResolver: Supports<Event> + Send + Sync {
    /// Decodes the payload into exactly `method.arity()` positional values.
    fn resolve_arguments(
        &self,
        event: &Event,
        method: &MethodDescriptor,
    ) -> Result<Vec<Value>, ConversionError>;
}

/// Server side: encodes results and error payloads.
///
/// Selected by the content type the caller asked for.
pub trait ReturnValueConverter: Supports<str> + Send + Sync {
    /// Content type written into the response.
    fn content_type(&self) -> &str;

    /// Encodes one result value.
    fn encode_value(&self, value: &Value, method: &MethodDescriptor) -> Result<Vec<u8>, ConversionError>;

    /// Encodes an error payload.
    fn encode_error(&self, error: &ErrorDescriptor) -> Result<Vec<u8>, ConversionError>;
}

/// Client side: encodes the argument list of an outbound call.
///
/// Selected by the configured request content type.
pub trait RequestArgumentConverter: Supports<str> + Send + Sync {
    /// Content type written into the request.
    fn content_type(&self) -> &str;

    /// Encodes the positional values for `method`.
    fn encode_arguments(&self, args: &[Value], method: &MethodDescriptor) -> Result<Vec<u8>, ConversionError>;
}

/// Client side: decodes response events.
///
/// Selected by the response event, normally by its `content-type` header.
pub trait ResponseConverter: Supports<Event> + Send + Sync {
    /// Decodes one result value.
    fn decode_value(&self, event: &Event, method: &MethodDescriptor) -> Result<Value, ConversionError>;

    /// Decodes an error payload.
    fn decode_error(&self, event: &Event) -> Result<ErrorDescriptor, ConversionError>;
}

/// Client side: maps an error payload to the error the caller sees.
pub trait ErrorTranslator: Supports<ErrorDescriptor> + Send + Sync {
    /// Builds the caller-visible error.
    fn translate(&self, descriptor: &ErrorDescriptor) -> RpcError;
}
