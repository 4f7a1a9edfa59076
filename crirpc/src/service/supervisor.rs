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

//! Per-registration invocation supervisor.
//!
//! A supervisor owns the bus subscription for one registered address and
//! turns every inbound call event into exactly one terminal response on the
//! caller's reply address.

use crate::address::Address;
use crate::bus::{EventBus, EventStream};
use crate::converter::{APPLICATION_JSON, JsonConverter, ReturnValueConverter, ServerConverters};
use crate::error::{ErrorDescriptor, PANIC_EXCEPTION, RpcError};
use crate::event::{Event, Metadata, headers};
use crate::observability::{RpcMetrics, log_error};
use crate::service::descriptor::{InterfaceDescriptor, MethodDescriptor};
use crate::service::error::{RegistryError, ServiceError};
use crate::service::interface::{Reply, ReplyFuture, ServiceInterface};
use futures_util::stream::BoxStream;
use futures_util::{FutureExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
#[cfg(feature = "observability")]
use tracing::instrument;
use tracing::{debug, error, info, trace, warn};

/// A service instance bound to its interface, with the type erased.
trait Dispatcher: Send + Sync {
    fn descriptor(&self) -> &InterfaceDescriptor;

    fn dispatch(&self, method: &str, args: Vec<Value>) -> Result<ReplyFuture, RpcError>;
}

struct BoundService<S> {
    interface: Arc<ServiceInterface<S>>,
    instance: Arc<S>,
}

impl<S: Send + Sync + 'static> Dispatcher for BoundService<S> {
    fn descriptor(&self) -> &InterfaceDescriptor {
        self.interface.descriptor()
    }

    fn dispatch(&self, method: &str, args: Vec<Value>) -> Result<ReplyFuture, RpcError> {
        self.interface.invoke(self.instance.clone(), method, args)
    }
}

enum Lifecycle {
    Idle,
    Running(JoinHandle<()>),
    Stopped,
}

/// Identifies a streaming call: the caller's reply address and correlation id.
type StreamKey = (String, String);

/// Shared by the receive loop and every call task.
struct Context {
    address: Address,
    service: Arc<dyn Dispatcher>,
    bus: Arc<dyn EventBus>,
    converters: Arc<ServerConverters>,
    metrics: Arc<RpcMetrics>,
    shutdown: CancellationToken,
    streams: Mutex<HashMap<StreamKey, CancellationToken>>,
}

/// Runs one registered service.
///
/// Created by [`ServiceRegistry::register`](super::ServiceRegistry::register).
/// A supervisor starts at most once and cannot be restarted after it stops.
pub struct ServiceSupervisor {
    context: Arc<Context>,
    lifecycle: Mutex<Lifecycle>,
}

impl ServiceSupervisor {
    pub(crate) fn new<S: Send + Sync + 'static>(
        address: Address,
        interface: Arc<ServiceInterface<S>>,
        instance: Arc<S>,
        bus: Arc<dyn EventBus>,
        converters: Arc<ServerConverters>,
        metrics: Arc<RpcMetrics>,
    ) -> Self {
        Self {
            context: Arc::new(Context {
                address,
                service: Arc::new(BoundService { interface, instance }),
                bus,
                converters,
                metrics,
                shutdown: CancellationToken::new(),
                streams: Mutex::new(HashMap::new()),
            }),
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    /// The address this supervisor serves.
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.context.address
    }

    /// The interface this supervisor dispatches to.
    #[must_use]
    pub fn interface(&self) -> &InterfaceDescriptor {
        self.context.service.descriptor()
    }

    /// Returns `true` while the receive loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(*self.lifecycle.lock(), Lifecycle::Running(_))
    }

    /// Number of multi-value calls currently streaming.
    #[must_use]
    pub fn active_streams(&self) -> usize {
        self.context.streams.lock().len()
    }

    /// Opens the subscription and spawns the receive loop.
    ///
    /// Resolves only once the subscription is visible to senders.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Start`] if the bus refuses the subscription
    /// and [`RegistryError::StartAborted`] if a stop was requested first.
    #[cfg_attr(feature = "observability", instrument(skip(self), fields(address = %self.context.address)))]
    pub async fn start(&self) -> Result<(), RegistryError> {
        let address = &self.context.address;
        let events = self
            .context
            .bus
            .listen_with_ack(address)
            .await
            .map_err(|source| RegistryError::Start {
                address: address.to_string(),
                source,
            })?;

        let mut lifecycle = self.lifecycle.lock();
        if self.context.shutdown.is_cancelled() || !matches!(*lifecycle, Lifecycle::Idle) {
            return Err(RegistryError::StartAborted {
                address: address.to_string(),
            });
        }
        let handle = tokio::spawn(receive_loop(self.context.clone(), events));
        *lifecycle = Lifecycle::Running(handle);
        info!(address = %address, interface = self.interface().name(), "service started");
        Ok(())
    }

    /// Requests a stop and returns the receive loop to await, if it was
    /// running.
    ///
    /// The subscription is released, streaming calls are canceled and
    /// single-value calls already dispatched run to completion.
    pub fn begin_stop(&self) -> Option<JoinHandle<()>> {
        let mut lifecycle = self.lifecycle.lock();
        self.context.shutdown.cancel();
        match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Running(handle) => Some(handle),
            Lifecycle::Idle | Lifecycle::Stopped => None,
        }
    }

    /// Stops the supervisor and waits for the receive loop to exit.
    pub async fn stop(&self) {
        if let Some(handle) = self.begin_stop() {
            if let Err(e) = handle.await {
                warn!(address = %self.context.address, error = %e, "receive loop panicked");
            }
        }
    }
}

impl std::fmt::Debug for ServiceSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceSupervisor")
            .field("address", &self.context.address)
            .field("interface", &self.interface().name())
            .field("running", &self.is_running())
            .finish()
    }
}

async fn receive_loop(context: Arc<Context>, mut events: EventStream) {
    loop {
        tokio::select! {
            () = context.shutdown.cancelled() => break,
            next = events.next() => match next {
                Some(event) => {
                    let context = context.clone();
                    tokio::spawn(async move { context.handle(event).await });
                }
                None => {
                    debug!(address = %context.address, "subscription ended");
                    break;
                }
            },
        }
    }
    info!(address = %context.address, "service stopped");
}

impl Context {
    #[cfg_attr(feature = "observability", instrument(skip(self, event), fields(address = %self.address, method = event.cri().path())))]
    async fn handle(&self, event: Event) {
        if event.control() == Some(headers::CONTROL_CANCEL) {
            self.cancel_stream(&event);
            return;
        }

        let reply_to = match event.reply_to() {
            Some(Ok(reply_to)) => reply_to,
            Some(Err(e)) => {
                warn!(address = %event.cri(), error = %e, "call with invalid reply-to dropped");
                return;
            }
            None => {
                warn!(address = %event.cri(), "call without reply-to dropped");
                return;
            }
        };

        self.metrics.record_call_dispatched();
        let responder = Responder {
            context: self,
            reply_to,
            correlation_id: event.correlation_id().map(str::to_string),
            requested_type: event
                .header(headers::ACCEPT)
                .or_else(|| event.content_type())
                .unwrap_or(APPLICATION_JSON)
                .to_string(),
        };

        let (method, reply) = match std::panic::catch_unwind(AssertUnwindSafe(|| self.prepare(&event))) {
            Ok(Ok(prepared)) => prepared,
            Ok(Err(e)) => {
                log_error(&e);
                responder.send_error(ErrorDescriptor::from(&e));
                return;
            }
            Err(panic) => {
                responder.send_panic(event.cri().path().unwrap_or(""), panic.as_ref());
                return;
            }
        };

        match AssertUnwindSafe(reply).catch_unwind().await {
            Ok(Ok(Reply::Unit)) => responder.send_void(),
            Ok(Ok(Reply::Single(value))) => {
                responder.send_value(&value, &method);
            }
            Ok(Ok(Reply::Stream(items))) => self.drain(&responder, &method, items).await,
            Ok(Err(e)) => {
                debug!(method = method.name(), error = %e, "service returned an error");
                responder.send_error(e.into());
            }
            Err(panic) => responder.send_panic(method.name(), panic.as_ref()),
        }
    }

    fn prepare(&self, event: &Event) -> Result<(MethodDescriptor, ReplyFuture), RpcError> {
        let resolver = self
            .converters
            .argument_resolvers
            .resolve(event)
            .ok_or_else(|| RpcError::unsupported_content_type(event.content_type().unwrap_or("")))?;

        let interface = self.service.descriptor();
        let name = event.cri().path().unwrap_or("");
        let method = interface
            .method(name)
            .ok_or_else(|| RpcError::missing_method(interface.name(), name))?;

        let args = resolver.resolve_arguments(event, method)?;
        let reply = self.service.dispatch(name, args)?;
        Ok((method.clone(), reply))
    }

    async fn drain(
        &self,
        responder: &Responder<'_>,
        method: &MethodDescriptor,
        mut items: BoxStream<'static, Result<Value, ServiceError>>,
    ) {
        let token = self.shutdown.child_token();
        let key = responder
            .correlation_id
            .clone()
            .map(|id| (responder.reply_to.raw().to_string(), id));
        if let Some(key) = &key {
            self.streams.lock().insert(key.clone(), token.clone());
        }

        loop {
            tokio::select! {
                () = token.cancelled() => {
                    if self.shutdown.is_cancelled() {
                        responder.send_error(ErrorDescriptor::from(&RpcError::canceled("service stopped")));
                    } else {
                        debug!(method = method.name(), "stream canceled by caller");
                        self.metrics.record_cancellation();
                    }
                    break;
                }
                next = AssertUnwindSafe(items.next()).catch_unwind() => match next {
                    Ok(Some(Ok(value))) => {
                        if !responder.send_value(&value, method) {
                            break;
                        }
                    }
                    Ok(Some(Err(e))) => {
                        responder.send_error(e.into());
                        break;
                    }
                    Ok(None) => {
                        responder.send_complete();
                        break;
                    }
                    Err(panic) => {
                        responder.send_panic(method.name(), panic.as_ref());
                        break;
                    }
                },
            }
        }

        if let Some(key) = key {
            self.streams.lock().remove(&key);
        }
    }

    fn cancel_stream(&self, event: &Event) {
        let (Some(reply_to), Some(correlation_id)) = (event.header(headers::REPLY_TO), event.correlation_id()) else {
            trace!("cancel without reply-to or correlation id ignored");
            return;
        };
        let key = (reply_to.to_string(), correlation_id.to_string());
        match self.streams.lock().remove(&key) {
            Some(token) => token.cancel(),
            None => trace!(reply_to, correlation_id, "cancel for unknown stream ignored"),
        }
    }
}

/// Sends the responses for one call.
struct Responder<'a> {
    context: &'a Context,
    reply_to: Address,
    correlation_id: Option<String>,
    requested_type: String,
}

impl Responder<'_> {
    fn encoder(&self) -> Result<&Arc<dyn ReturnValueConverter>, RpcError> {
        self.context
            .converters
            .return_value_converters
            .resolve(self.requested_type.as_str())
            .ok_or_else(|| RpcError::unsupported_content_type(&self.requested_type))
    }

    fn metadata(&self, content_type: &str) -> Metadata {
        let mut metadata = Metadata::new().with(headers::CONTENT_TYPE, content_type);
        if let Some(correlation_id) = &self.correlation_id {
            metadata.put(headers::CORRELATION_ID, correlation_id.clone());
        }
        metadata
    }

    /// Sends one value; returns `false` if the call is over.
    fn send_value(&self, value: &Value, method: &MethodDescriptor) -> bool {
        let encoded = self.encoder().and_then(|encoder| {
            let payload = encoder.encode_value(value, method)?;
            Ok((encoder.content_type().to_string(), payload))
        });
        match encoded {
            Ok((content_type, payload)) => {
                let sent = self.send(self.metadata(&content_type), payload);
                if sent {
                    self.context.metrics.record_response_sent();
                }
                sent
            }
            Err(e) => {
                log_error(&e);
                self.send_error(ErrorDescriptor::from(&e));
                false
            }
        }
    }

    fn send_void(&self) {
        match self.encoder() {
            Ok(encoder) => {
                let metadata = self.metadata(encoder.content_type()).with(headers::VOID, headers::TRUE);
                if self.send(metadata, Vec::new()) {
                    self.context.metrics.record_response_sent();
                }
            }
            Err(e) => self.send_error(ErrorDescriptor::from(&e)),
        }
    }

    fn send_complete(&self) {
        let content_type = self
            .encoder()
            .map_or(APPLICATION_JSON, |encoder| encoder.content_type())
            .to_string();
        let metadata = self
            .metadata(&content_type)
            .with(headers::CONTROL, headers::CONTROL_COMPLETE);
        if self.send(metadata, Vec::new()) {
            self.context.metrics.record_response_sent();
        }
    }

    fn send_error(&self, descriptor: ErrorDescriptor) {
        let encoded = self.encoder().ok().and_then(|encoder| {
            encoder
                .encode_error(&descriptor)
                .ok()
                .map(|payload| (encoder.content_type().to_string(), payload))
        });
        let (content_type, payload) = match encoded {
            Some(encoded) => encoded,
            None => match JsonConverter::new().encode_error(&descriptor) {
                Ok(payload) => (APPLICATION_JSON.to_string(), payload),
                Err(e) => {
                    warn!(reply_to = %self.reply_to, error = %e, "error payload could not be encoded");
                    return;
                }
            },
        };
        let metadata = self.metadata(&content_type).with(headers::ERROR, headers::TRUE);
        if self.send(metadata, payload) {
            self.context.metrics.record_error_sent();
        }
    }

    /// Answers a call whose method panicked.
    fn send_panic(&self, method: &str, panic: &(dyn Any + Send)) {
        let message = panic
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| format!("method '{method}' panicked"));
        error!(reply_to = %self.reply_to, method, message = %message, "service method panicked");
        self.send_error(ErrorDescriptor::new(PANIC_EXCEPTION, message));
    }

    fn send(&self, metadata: Metadata, payload: Vec<u8>) -> bool {
        let event = Event::with_metadata(self.reply_to.clone(), metadata, payload);
        match self.context.bus.send(event) {
            Ok(()) => true,
            Err(e) => {
                warn!(reply_to = %self.reply_to, error = %e, "response could not be sent");
                false
            }
        }
    }
}
