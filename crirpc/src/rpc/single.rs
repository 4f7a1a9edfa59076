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

//! Single-value return handling.

use crate::error::RpcError;
use crate::event::Event;
use crate::observability::RpcMetrics;
use crate::rpc::handler::{
    ResponseDecoder, ResponseHandler, ReturnValueHandler, Response, from_return_value,
};
use crate::rpc::pending::PendingEntry;
use crate::rpc::request::RpcRequest;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::trace;

type Sink = oneshot::Sender<Result<Value, RpcError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Subscribed,
    Done,
}

/// The two write-once cells and the phase, always read and written together.
struct State {
    phase: Phase,
    sink: Option<Sink>,
    pending_failure: Option<RpcError>,
}

/// Handler for calls that produce exactly one value.
///
/// A failure raised before the value is first polled (typically a cancel) is
/// parked in the pending cell and returned on first poll without sending the
/// request. A failure raised after that goes straight to the waiting caller.
/// Whichever outcome lands first is the only one delivered.
pub struct SingleValueHandler {
    decoder: ResponseDecoder,
    state: Mutex<State>,
}

impl SingleValueHandler {
    pub(crate) fn new(decoder: ResponseDecoder) -> Self {
        Self {
            decoder,
            state: Mutex::new(State {
                phase: Phase::Created,
                sink: None,
                pending_failure: None,
            }),
        }
    }

    fn complete(&self, result: Result<Value, RpcError>) {
        let mut state = self.state.lock();
        match state.phase {
            Phase::Created => {
                if let Err(error) = result {
                    state.pending_failure.get_or_insert(error);
                }
            }
            Phase::Subscribed => {
                state.phase = Phase::Done;
                if let Some(sink) = state.sink.take() {
                    let _ = sink.send(result);
                }
            }
            Phase::Done => {
                trace!(method = self.decoder.method().name(), "outcome after completion ignored");
            }
        }
    }
}

impl ResponseHandler for SingleValueHandler {
    fn is_multi_value(&self) -> bool {
        false
    }

    fn process_response(&self, event: &Event) -> bool {
        let result = self.decoder.decode(event).map(|response| match response {
            Response::Value(value) => value,
            Response::Complete => Value::Null,
        });
        self.complete(result);
        true
    }

    fn process_error(&self, error: RpcError) {
        self.complete(Err(error));
    }

    fn cancel(&self, reason: &str) {
        self.complete(Err(RpcError::canceled(reason)));
    }
}

impl ReturnValueHandler for SingleValueHandler {
    type ReturnValue = BoxFuture<'static, Result<Value, RpcError>>;

    fn get_return_value(self: Arc<Self>, request: RpcRequest) -> Self::ReturnValue {
        async move {
            let receiver = {
                let mut state = self.state.lock();
                if state.phase != Phase::Created {
                    return Err(RpcError::canceled("return value already taken"));
                }
                if let Some(error) = state.pending_failure.take() {
                    state.phase = Phase::Done;
                    return Err(error);
                }
                let (sink, receiver) = oneshot::channel();
                state.sink = Some(sink);
                state.phase = Phase::Subscribed;
                receiver
            };

            if let Err(error) = request.send().await {
                self.process_error(error);
            }

            receiver
                .await
                .unwrap_or_else(|_| Err(RpcError::canceled("call abandoned")))
        }
        .boxed()
    }
}

impl fmt::Debug for SingleValueHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleValueHandler")
            .field("method", &self.decoder.method().name())
            .field("phase", &self.state.lock().phase)
            .finish()
    }
}

/// The pending result of a single-value call.
///
/// Nothing is sent until the value is first polled. Dropping it before then
/// (or before the response arrives) abandons the call.
///
/// # Examples
///
/// ```rust,ignore
/// let sum: SingleValue<i64> = proxy.call("add", (2, 3));
/// assert_eq!(sum.await?, 5);
/// ```
#[must_use = "a call is not sent until its value is awaited"]
pub struct SingleValue<R> {
    handler: Option<Arc<SingleValueHandler>>,
    future: BoxFuture<'static, Result<R, RpcError>>,
    entry: Option<PendingEntry>,
}

impl<R: DeserializeOwned + Send + 'static> SingleValue<R> {
    pub(crate) fn new(
        handler: Arc<SingleValueHandler>,
        request: RpcRequest,
        entry: PendingEntry,
        timeout: Option<Duration>,
        metrics: Arc<RpcMetrics>,
    ) -> Self {
        let method = handler.decoder.method().name().to_string();
        let value = handler.clone().get_return_value(request);
        let future = async move {
            metrics.record_call_issued();
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, value)
                    .await
                    .unwrap_or(Err(RpcError::Timeout { timeout: limit })),
                None => value.await,
            };
            match &result {
                Ok(_) => metrics.record_response_received(),
                Err(e) if e.is_canceled() => metrics.record_cancellation(),
                Err(_) => metrics.record_call_failed(),
            }
            from_return_value(&method, result?)
        }
        .boxed();

        Self {
            handler: Some(handler),
            future,
            entry: Some(entry),
        }
    }

    pub(crate) fn failed(error: RpcError) -> Self {
        Self {
            handler: None,
            future: futures_util::future::ready(Err(error)).boxed(),
            entry: None,
        }
    }
}

impl<R> SingleValue<R> {
    /// Cancels the call.
    ///
    /// If the value has not been polled yet the request is never sent and
    /// the value resolves to [`RpcError::Canceled`] with `reason`.
    pub fn cancel(&self, reason: &str) {
        if let Some(handler) = &self.handler {
            handler.cancel(reason);
        }
    }

    /// The call's correlation id, if the call was built.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        self.entry.as_ref().map(PendingEntry::correlation_id)
    }
}

impl<R> Future for SingleValue<R> {
    type Output = Result<R, RpcError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.future.as_mut().poll(cx)
    }
}

impl<R> fmt::Debug for SingleValue<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleValue")
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}
