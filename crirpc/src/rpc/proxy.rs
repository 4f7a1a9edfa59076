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

//! Client-side service handles.

use crate::address::Address;
use crate::converter::ConversionError;
use crate::error::RpcError;
use crate::event::{Event, Metadata, headers};
use crate::rpc::client::ClientShared;
use crate::rpc::handler::ResponseDecoder;
use crate::rpc::multi::{CancelNotice, MultiValue, MultiValueHandler};
use crate::rpc::request::RpcRequest;
use crate::rpc::single::{SingleValue, SingleValueHandler};
use crate::service::{InterfaceDescriptor, MethodDescriptor, to_arguments};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The return value of a dynamically invoked method.
#[derive(Debug)]
pub enum ReturnValue {
    /// The method returns one value (or none).
    Single(SingleValue<Value>),
    /// The method returns a stream of values.
    Multi(MultiValue<Value>),
}

impl ReturnValue {
    /// Returns `true` for [`Multi`](Self::Multi).
    #[must_use]
    pub const fn is_multi_value(&self) -> bool {
        matches!(self, Self::Multi(_))
    }
}

/// A call with its handler not yet chosen.
struct PreparedCall {
    method: MethodDescriptor,
    correlation_id: String,
    reply_to: Address,
    target: Address,
    request: RpcRequest,
}

/// A handle for calling one remote service.
///
/// The proxy selects single- or multi-value handling from the interface
/// descriptor, so the same descriptor the service was published with can be
/// shared with its callers.
///
/// # Examples
///
/// ```rust,ignore
/// let calculator = client.proxy(address, interface.descriptor().clone());
///
/// let sum: i64 = calculator.call("add", (2, 3)).await?;
///
/// let mut ticks = calculator.stream::<_, u32>("count", (3,));
/// while let Some(tick) = ticks.next().await {
///     println!("{}", tick?);
/// }
/// ```
#[derive(Clone)]
pub struct ServiceProxy {
    shared: Arc<ClientShared>,
    address: Address,
    interface: Arc<InterfaceDescriptor>,
}

impl ServiceProxy {
    pub(crate) fn new(
        shared: Arc<ClientShared>,
        address: Address,
        interface: Arc<InterfaceDescriptor>,
    ) -> Self {
        Self {
            shared,
            address,
            interface,
        }
    }

    /// The service address.
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The interface calls are checked against.
    #[must_use]
    pub fn interface(&self) -> &Arc<InterfaceDescriptor> {
        &self.interface
    }

    /// Calls `method` with a positional argument list.
    ///
    /// # Errors
    ///
    /// Fails without sending anything if the method is not in the interface,
    /// the arguments cannot be encoded or the client has shut down.
    pub fn invoke(&self, method: &str, args: Vec<Value>) -> Result<ReturnValue, RpcError> {
        let prepared = self.prepare(method, &args)?;
        Ok(if prepared.method.returns().is_multi_value() {
            ReturnValue::Multi(self.multi(prepared))
        } else {
            ReturnValue::Single(self.single(prepared))
        })
    }

    /// Calls a unit or single-value method.
    ///
    /// `args` is a tuple: `()`, `(a,)`, `(a, b)` and so on. Failures to build
    /// the call are reported when the value is awaited.
    pub fn call<A, R>(&self, method: &str, args: A) -> SingleValue<R>
    where
        A: Serialize,
        R: DeserializeOwned + Send + 'static,
    {
        let prepared = self.prepare_typed(method, &args).and_then(|prepared| {
            if prepared.method.returns().is_multi_value() {
                Err(shape_mismatch(method, "method returns a stream"))
            } else {
                Ok(prepared)
            }
        });
        match prepared {
            Ok(prepared) => self.single(prepared),
            Err(e) => SingleValue::failed(e),
        }
    }

    /// Calls a streaming method.
    ///
    /// `args` is a tuple as for [`call`](Self::call). Failures to build the
    /// call are yielded as the only item.
    pub fn stream<A, R>(&self, method: &str, args: A) -> MultiValue<R>
    where
        A: Serialize,
        R: DeserializeOwned + Send + 'static,
    {
        let prepared = self.prepare_typed(method, &args).and_then(|prepared| {
            if prepared.method.returns().is_multi_value() {
                Ok(prepared)
            } else {
                Err(shape_mismatch(method, "method returns a single value"))
            }
        });
        match prepared {
            Ok(prepared) => self.multi(prepared),
            Err(e) => MultiValue::failed(e),
        }
    }

    fn prepare_typed<A: Serialize>(&self, method: &str, args: &A) -> Result<PreparedCall, RpcError> {
        let args = to_arguments(method, args)?;
        self.prepare(method, &args)
    }

    fn prepare(&self, method: &str, args: &[Value]) -> Result<PreparedCall, RpcError> {
        let shared = &self.shared;
        if shared.shutdown.is_cancelled() {
            return Err(RpcError::canceled("client shut down"));
        }

        let descriptor = self
            .interface
            .method(method)
            .ok_or_else(|| RpcError::missing_method(self.interface.name(), method))?
            .clone();

        let content_type = shared.config.content_type.as_str();
        let converter = shared
            .converters
            .request_argument_converters
            .resolve(content_type)
            .ok_or_else(|| RpcError::unsupported_content_type(content_type))?;
        let payload = converter.encode_arguments(args, &descriptor)?;

        let correlation_id = shared.correlation.next();
        let reply_to = shared.reply_base.with_path(&correlation_id)?;
        let target = self.address.with_path(method)?;
        let metadata = Metadata::new()
            .with(headers::REPLY_TO, reply_to.raw())
            .with(headers::CORRELATION_ID, correlation_id.as_str())
            .with(headers::CONTENT_TYPE, converter.content_type())
            .with(headers::ACCEPT, shared.config.accept_type())
            .with(headers::SENDER, shared.node_id.as_str());

        debug!(address = %target, correlation_id = %correlation_id, returns = ?descriptor.returns(), "call prepared");
        let request = RpcRequest::new(
            shared.bus.clone(),
            Event::with_metadata(target.clone(), metadata, payload),
            shared.config.use_ack,
        );
        Ok(PreparedCall {
            method: descriptor,
            correlation_id,
            reply_to,
            target,
            request,
        })
    }

    fn single<R: DeserializeOwned + Send + 'static>(&self, prepared: PreparedCall) -> SingleValue<R> {
        let shared = &self.shared;
        let handler = Arc::new(SingleValueHandler::new(ResponseDecoder::new(
            shared.converters.clone(),
            prepared.method,
        )));
        let entry = shared.pending.register(prepared.correlation_id, handler.clone());
        SingleValue::new(
            handler,
            prepared.request,
            entry,
            shared.config.request_timeout,
            shared.metrics.clone(),
        )
    }

    fn multi<R: DeserializeOwned + Send + 'static>(&self, prepared: PreparedCall) -> MultiValue<R> {
        let shared = &self.shared;
        let handler = Arc::new(MultiValueHandler::new(ResponseDecoder::new(
            shared.converters.clone(),
            prepared.method,
        )));
        let notice = CancelNotice::new(
            shared.bus.clone(),
            prepared.target,
            &prepared.reply_to,
            &prepared.correlation_id,
            &shared.node_id,
        );
        let entry = shared.pending.register(prepared.correlation_id, handler.clone());
        MultiValue::new(handler, prepared.request, entry, notice, shared.metrics.clone())
    }
}

fn shape_mismatch(method: &str, message: &str) -> RpcError {
    RpcError::Conversion(ConversionError::ReturnValue {
        method: method.to_string(),
        message: message.to_string(),
    })
}

impl fmt::Debug for ServiceProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProxy")
            .field("address", &self.address)
            .field("interface", &self.interface.name())
            .finish_non_exhaustive()
    }
}
