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

//! Return-value handler contracts.

use crate::converter::{ClientConverters, ConversionError};
use crate::error::RpcError;
use crate::event::{Event, headers};
use crate::rpc::request::RpcRequest;
use crate::service::MethodDescriptor;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// The response side of an in-flight call, as seen by the client's router.
///
/// Object safe so the router can hold handlers of either kind.
pub trait ResponseHandler: Send + Sync {
    /// Returns `true` if the call produces a stream of values.
    fn is_multi_value(&self) -> bool;

    /// Consumes one response event.
    ///
    /// Returns `true` once the call has reached its terminal outcome and the
    /// handler can be forgotten.
    fn process_response(&self, event: &Event) -> bool;

    /// Fails the call with a locally raised error.
    fn process_error(&self, error: RpcError);

    /// Cancels the call.
    ///
    /// Before the value is first polled this only records the reason: the
    /// value then resolves to [`RpcError::Canceled`] and the request is never
    /// sent.
    fn cancel(&self, reason: &str);
}

/// Adapts responses into the caller-facing return value of one call kind.
pub trait ReturnValueHandler: ResponseHandler {
    /// What the caller receives.
    type ReturnValue;

    /// Builds the return value.
    ///
    /// Called once per call. The request is sent when the returned value is
    /// first polled, never before.
    fn get_return_value(self: Arc<Self>, request: RpcRequest) -> Self::ReturnValue;
}

/// A decoded response event.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Response {
    Value(Value),
    Complete,
}

/// Turns response events into values or errors for one method.
#[derive(Clone)]
pub(crate) struct ResponseDecoder {
    converters: Arc<ClientConverters>,
    method: MethodDescriptor,
}

impl ResponseDecoder {
    pub(crate) fn new(converters: Arc<ClientConverters>, method: MethodDescriptor) -> Self {
        Self { converters, method }
    }

    pub(crate) fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    pub(crate) fn decode(&self, event: &Event) -> Result<Response, RpcError> {
        if !event.is_error() && event.control() == Some(headers::CONTROL_COMPLETE) {
            return Ok(Response::Complete);
        }

        let converter = self
            .converters
            .response_converters
            .resolve(event)
            .ok_or_else(|| RpcError::unsupported_content_type(event.content_type().unwrap_or("")))?;

        if event.is_error() {
            let descriptor = converter.decode_error(event)?;
            return Err(match self.converters.error_translators.resolve(&descriptor) {
                Some(translator) => translator.translate(&descriptor),
                None => RpcError::from(descriptor),
            });
        }

        Ok(Response::Value(converter.decode_value(event, &self.method)?))
    }
}

/// Decodes a returned value into the caller's type.
pub(crate) fn from_return_value<R: DeserializeOwned>(method: &str, value: Value) -> Result<R, RpcError> {
    serde_json::from_value(value).map_err(|e| {
        RpcError::Conversion(ConversionError::ReturnValue {
            method: method.to_string(),
            message: e.to_string(),
        })
    })
}
