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

//! Multi-value (streaming) return handling.

use crate::address::Address;
use crate::bus::EventBus;
use crate::error::RpcError;
use crate::event::{Event, Metadata, headers};
use crate::observability::RpcMetrics;
use crate::rpc::handler::{
    ResponseDecoder, ResponseHandler, ReturnValueHandler, Response, from_return_value,
};
use crate::rpc::pending::PendingEntry;
use crate::rpc::request::RpcRequest;
use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;

type Item = Result<Value, RpcError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Subscribed,
    Done,
}

struct State {
    phase: Phase,
    sink: Option<mpsc::UnboundedSender<Item>>,
    pending_failure: Option<RpcError>,
}

/// Handler for calls that produce a stream of values.
///
/// Items are forwarded as they arrive; `control: complete` ends the stream
/// and an error response ends it after yielding the error. Cancel follows
/// the same parked-failure rule as
/// [`SingleValueHandler`](super::SingleValueHandler).
pub struct MultiValueHandler {
    decoder: ResponseDecoder,
    state: Mutex<State>,
}

impl MultiValueHandler {
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

    /// Ends the stream with `error`. Returns `true` if the stream was live,
    /// meaning the service may still be producing.
    fn fail(&self, error: RpcError) -> bool {
        let mut state = self.state.lock();
        match state.phase {
            Phase::Created => {
                state.pending_failure.get_or_insert(error);
                false
            }
            Phase::Subscribed => {
                state.phase = Phase::Done;
                if let Some(sink) = state.sink.take() {
                    let _ = sink.send(Err(error));
                }
                true
            }
            Phase::Done => false,
        }
    }

    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<Item>, RpcError> {
        let mut state = self.state.lock();
        if state.phase != Phase::Created {
            return Err(RpcError::canceled("return value already taken"));
        }
        if let Some(error) = state.pending_failure.take() {
            state.phase = Phase::Done;
            return Err(error);
        }
        let (sink, receiver) = mpsc::unbounded_channel();
        state.sink = Some(sink);
        state.phase = Phase::Subscribed;
        Ok(receiver)
    }
}

impl ResponseHandler for MultiValueHandler {
    fn is_multi_value(&self) -> bool {
        true
    }

    fn process_response(&self, event: &Event) -> bool {
        let decoded = self.decoder.decode(event);
        let mut state = self.state.lock();
        if state.phase != Phase::Subscribed {
            return state.phase == Phase::Done;
        }
        match decoded {
            Ok(Response::Value(value)) => {
                if let Some(sink) = &state.sink {
                    let _ = sink.send(Ok(value));
                }
                false
            }
            Ok(Response::Complete) => {
                state.phase = Phase::Done;
                state.sink = None;
                true
            }
            Err(error) => {
                state.phase = Phase::Done;
                if let Some(sink) = state.sink.take() {
                    let _ = sink.send(Err(error));
                }
                true
            }
        }
    }

    fn process_error(&self, error: RpcError) {
        self.fail(error);
    }

    fn cancel(&self, reason: &str) {
        self.fail(RpcError::canceled(reason));
    }
}

enum Step {
    Start(Arc<MultiValueHandler>, RpcRequest),
    Receiving(mpsc::UnboundedReceiver<Item>),
    Finished,
}

async fn next_item(mut receiver: mpsc::UnboundedReceiver<Item>) -> Option<(Item, Step)> {
    match receiver.recv().await? {
        Ok(value) => Some((Ok(value), Step::Receiving(receiver))),
        Err(error) => Some((Err(error), Step::Finished)),
    }
}

impl ReturnValueHandler for MultiValueHandler {
    type ReturnValue = BoxStream<'static, Item>;

    fn get_return_value(self: Arc<Self>, request: RpcRequest) -> Self::ReturnValue {
        stream::unfold(Step::Start(self, request), |step| async move {
            match step {
                Step::Start(handler, request) => {
                    let receiver = match handler.subscribe() {
                        Ok(receiver) => receiver,
                        Err(error) => return Some((Err(error), Step::Finished)),
                    };
                    if let Err(error) = request.send().await {
                        handler.process_error(error);
                    }
                    next_item(receiver).await
                }
                Step::Receiving(receiver) => next_item(receiver).await,
                Step::Finished => None,
            }
        })
        .boxed()
    }
}

impl fmt::Debug for MultiValueHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiValueHandler")
            .field("method", &self.decoder.method().name())
            .field("phase", &self.state.lock().phase)
            .finish()
    }
}

/// The `control: cancel` event telling a service to stop streaming.
pub(crate) struct CancelNotice {
    bus: Arc<dyn EventBus>,
    address: Address,
    metadata: Metadata,
}

impl CancelNotice {
    pub(crate) fn new(
        bus: Arc<dyn EventBus>,
        address: Address,
        reply_to: &Address,
        correlation_id: &str,
        sender: &str,
    ) -> Self {
        let metadata = Metadata::new()
            .with(headers::CONTROL, headers::CONTROL_CANCEL)
            .with(headers::REPLY_TO, reply_to.raw())
            .with(headers::CORRELATION_ID, correlation_id)
            .with(headers::SENDER, sender);
        Self { bus, address, metadata }
    }

    fn send(&self) {
        let event = Event::with_metadata(self.address.clone(), self.metadata.clone(), Vec::new());
        if let Err(e) = self.bus.send(event) {
            debug!(address = %self.address, error = %e, "stream cancel could not be sent");
        }
    }
}

/// The values of a multi-value call.
///
/// Nothing is sent until the stream is first polled. The stream ends after
/// the service completes it; a failure is yielded as the last item.
/// Dropping a live stream tells the service to stop producing.
///
/// # Examples
///
/// ```rust,ignore
/// let mut ticks: MultiValue<u32> = proxy.stream("ticks", (3,));
/// while let Some(tick) = ticks.next().await {
///     println!("{}", tick?);
/// }
/// ```
#[must_use = "a call is not sent until its stream is polled"]
pub struct MultiValue<R> {
    handler: Option<Arc<MultiValueHandler>>,
    stream: BoxStream<'static, Result<R, RpcError>>,
    notice: Option<CancelNotice>,
    metrics: Option<Arc<RpcMetrics>>,
    entry: Option<PendingEntry>,
    started: bool,
    finished: bool,
}

impl<R: DeserializeOwned + Send + 'static> MultiValue<R> {
    pub(crate) fn new(
        handler: Arc<MultiValueHandler>,
        request: RpcRequest,
        entry: PendingEntry,
        notice: CancelNotice,
        metrics: Arc<RpcMetrics>,
    ) -> Self {
        let method = handler.decoder.method().name().to_string();
        let stream = handler
            .clone()
            .get_return_value(request)
            .map(move |item| item.and_then(|value| from_return_value(&method, value)))
            .boxed();
        Self {
            handler: Some(handler),
            stream,
            notice: Some(notice),
            metrics: Some(metrics),
            entry: Some(entry),
            started: false,
            finished: false,
        }
    }

    pub(crate) fn failed(error: RpcError) -> Self {
        Self {
            handler: None,
            stream: stream::once(futures_util::future::ready(Err(error))).boxed(),
            notice: None,
            metrics: None,
            entry: None,
            started: false,
            finished: false,
        }
    }
}

impl<R> MultiValue<R> {
    /// Cancels the call.
    ///
    /// Before the first poll the request is never sent; afterwards the
    /// service is told to stop. Either way the stream yields
    /// [`RpcError::Canceled`] and ends.
    pub fn cancel(&self, reason: &str) {
        self.stop(RpcError::canceled(reason));
    }

    /// The call's correlation id, if the call was built.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        self.entry.as_ref().map(PendingEntry::correlation_id)
    }

    fn stop(&self, error: RpcError) {
        let Some(handler) = &self.handler else {
            return;
        };
        if handler.fail(error) {
            if let Some(notice) = &self.notice {
                notice.send();
            }
        }
    }

    fn record(&mut self, item: &Poll<Option<Result<R, RpcError>>>) {
        if self.finished {
            return;
        }
        let Some(metrics) = &self.metrics else {
            return;
        };
        match item {
            Poll::Ready(None) => {
                self.finished = true;
                metrics.record_response_received();
            }
            Poll::Ready(Some(Err(error))) => {
                self.finished = true;
                if error.is_canceled() {
                    metrics.record_cancellation();
                } else {
                    metrics.record_call_failed();
                }
            }
            Poll::Ready(Some(Ok(_))) | Poll::Pending => {}
        }
    }
}

impl<R> Stream for MultiValue<R> {
    type Item = Result<R, RpcError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if !this.started {
            this.started = true;
            if let Some(metrics) = &this.metrics {
                metrics.record_call_issued();
            }
        }
        let polled = this.stream.poll_next_unpin(cx);
        this.record(&polled);
        polled
    }
}

impl<R> Drop for MultiValue<R> {
    fn drop(&mut self) {
        self.stop(RpcError::canceled("stream dropped"));
        if self.started && !self.finished {
            if let Some(metrics) = &self.metrics {
                metrics.record_cancellation();
            }
        }
    }
}

impl<R> fmt::Debug for MultiValue<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiValue")
            .field("handler", &self.handler)
            .field("started", &self.started)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MemoryEventBus;
    use crate::converter::{APPLICATION_JSON, ClientConverters};
    use crate::rpc::pending::PendingCalls;
    use crate::service::{MethodDescriptor, ReturnKind};
    use serde_json::json;
    use std::time::Duration;

    fn handler() -> Arc<MultiValueHandler> {
        Arc::new(MultiValueHandler::new(ResponseDecoder::new(
            Arc::new(ClientConverters::default()),
            MethodDescriptor::new("ticks", &["n"], "(u32,)", ReturnKind::Multi),
        )))
    }

    fn service() -> Address {
        Address::parse("srv://clock.Api").unwrap()
    }

    fn request(bus: &Arc<MemoryEventBus>) -> RpcRequest {
        let event = Event::new(service().with_path("ticks").unwrap(), b"[3]".to_vec());
        RpcRequest::new(bus.clone(), event, true)
    }

    fn response(metadata: Metadata, data: &[u8]) -> Event {
        Event::with_metadata(
            Address::parse("srv://n@replies/1").unwrap(),
            metadata.with(headers::CONTENT_TYPE, APPLICATION_JSON),
            data.to_vec(),
        )
    }

    #[tokio::test]
    async fn test_items_then_complete() {
        let bus = Arc::new(MemoryEventBus::new());
        let mut calls = bus.listen_with_ack(&service()).await.unwrap();

        let handler = handler();
        let values = tokio::spawn(handler.clone().get_return_value(request(&bus)).collect::<Vec<_>>());
        calls.next().await.unwrap();

        assert!(!handler.process_response(&response(Metadata::new(), b"1")));
        assert!(!handler.process_response(&response(Metadata::new(), b"2")));
        assert!(handler.process_response(&response(
            Metadata::new().with(headers::CONTROL, headers::CONTROL_COMPLETE),
            b""
        )));

        let values: Vec<Value> = values.await.unwrap().into_iter().map(Result::unwrap).collect();
        assert_eq!(values, vec![json!(1), json!(2)]);
    }

    #[tokio::test]
    async fn test_cancel_before_poll_never_sends() {
        let bus = Arc::new(MemoryEventBus::new());
        let mut calls = bus.listen_with_ack(&service()).await.unwrap();

        let handler = handler();
        handler.cancel("x");
        let items: Vec<_> = handler.get_return_value(request(&bus)).collect().await;
        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], Err(RpcError::Canceled { reason }) if reason == "x"));

        let nothing = tokio::time::timeout(Duration::from_millis(20), calls.next()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test]
    async fn test_drop_live_stream_notifies_service() {
        let bus = Arc::new(MemoryEventBus::new());
        let mut calls = bus.listen_with_ack(&service()).await.unwrap();
        let pending = Arc::new(PendingCalls::new());
        let metrics = Arc::new(RpcMetrics::new());

        let handler = handler();
        let entry = pending.register("1".to_string(), handler.clone());
        let reply_to = Address::parse("srv://node@crirpc.rpc.reply/1").unwrap();
        let notice = CancelNotice::new(
            bus.clone(),
            service().with_path("ticks").unwrap(),
            &reply_to,
            "1",
            "node",
        );
        let mut ticks: MultiValue<u32> =
            MultiValue::new(handler.clone(), request(&bus), entry, notice, metrics.clone());

        let first = tokio::spawn(async move {
            let first = ticks.next().await;
            (ticks, first)
        });
        calls.next().await.unwrap();
        handler.process_response(&response(Metadata::new(), b"0"));
        let (ticks, first) = first.await.unwrap();
        assert_eq!(first.unwrap().unwrap(), 0);

        drop(ticks);
        let cancel = calls.next().await.unwrap();
        assert_eq!(cancel.control(), Some(headers::CONTROL_CANCEL));
        assert_eq!(cancel.correlation_id(), Some("1"));
        assert_eq!(cancel.header(headers::REPLY_TO), Some("srv://node@crirpc.rpc.reply/1"));
        assert!(pending.is_empty());
        assert_eq!(metrics.cancellations(), 1);
    }

    #[tokio::test]
    async fn test_error_ends_stream() {
        let bus = Arc::new(MemoryEventBus::new());
        let mut calls = bus.listen_with_ack(&service()).await.unwrap();

        let handler = handler();
        let values = tokio::spawn(handler.clone().get_return_value(request(&bus)).collect::<Vec<_>>());
        calls.next().await.unwrap();

        let payload = serde_json::to_vec(&crate::ErrorDescriptor::new("Boom", "bad")).unwrap();
        handler.process_response(&response(Metadata::new(), b"1"));
        assert!(handler.process_response(&response(
            Metadata::new().with(headers::ERROR, headers::TRUE),
            &payload
        )));

        let values = values.await.unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[1].as_ref().unwrap_err().class_name(), "Boom");
    }
}
