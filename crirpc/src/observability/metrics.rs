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

//! Call counters for supervisors and clients.
//!
//! Counters are atomics so they can be shared by every task of a supervisor
//! or client. With the `observability` feature they are also exported
//! through the `metrics` facade.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one side of the RPC path.
///
/// A supervisor records the `dispatched`/`sent` counters, a client records
/// the `issued`/`received` counters; both record cancellations.
///
/// # Examples
///
/// ```rust
/// use crirpc::observability::RpcMetrics;
///
/// let metrics = RpcMetrics::new();
/// metrics.record_call_issued();
/// metrics.record_response_received();
/// assert_eq!(metrics.calls_issued(), 1);
/// assert_eq!(metrics.in_flight_calls(), 0);
/// ```
#[derive(Debug, Default)]
pub struct RpcMetrics {
    calls_dispatched: AtomicU64,
    responses_sent: AtomicU64,
    errors_sent: AtomicU64,
    calls_issued: AtomicU64,
    responses_received: AtomicU64,
    calls_failed: AtomicU64,
    cancellations: AtomicU64,
}

impl RpcMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an inbound call handed to a service.
    pub fn record_call_dispatched(&self) {
        self.calls_dispatched.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        ::metrics::counter!("crirpc.server.calls.dispatched").increment(1);
    }

    /// Records a success response event.
    pub fn record_response_sent(&self) {
        self.responses_sent.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        ::metrics::counter!("crirpc.server.responses.sent").increment(1);
    }

    /// Records an error response event.
    pub fn record_error_sent(&self) {
        self.errors_sent.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        ::metrics::counter!("crirpc.server.errors.sent").increment(1);
    }

    /// Records an outbound call.
    pub fn record_call_issued(&self) {
        self.calls_issued.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        ::metrics::counter!("crirpc.client.calls.issued").increment(1);
    }

    /// Records a call that reached its terminal response.
    pub fn record_response_received(&self) {
        self.responses_received.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        ::metrics::counter!("crirpc.client.responses.received").increment(1);
    }

    /// Records a call that failed before a response arrived.
    pub fn record_call_failed(&self) {
        self.calls_failed.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        ::metrics::counter!("crirpc.client.calls.failed").increment(1);
    }

    /// Records a canceled call or stream.
    pub fn record_cancellation(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        ::metrics::counter!("crirpc.cancellations").increment(1);
    }

    /// Inbound calls handed to a service.
    #[must_use]
    pub fn calls_dispatched(&self) -> u64 {
        self.calls_dispatched.load(Ordering::Relaxed)
    }

    /// Success responses sent.
    #[must_use]
    pub fn responses_sent(&self) -> u64 {
        self.responses_sent.load(Ordering::Relaxed)
    }

    /// Error responses sent.
    #[must_use]
    pub fn errors_sent(&self) -> u64 {
        self.errors_sent.load(Ordering::Relaxed)
    }

    /// Outbound calls issued.
    #[must_use]
    pub fn calls_issued(&self) -> u64 {
        self.calls_issued.load(Ordering::Relaxed)
    }

    /// Calls that reached their terminal response.
    #[must_use]
    pub fn responses_received(&self) -> u64 {
        self.responses_received.load(Ordering::Relaxed)
    }

    /// Calls that failed before a response arrived.
    #[must_use]
    pub fn calls_failed(&self) -> u64 {
        self.calls_failed.load(Ordering::Relaxed)
    }

    /// Canceled calls and streams.
    #[must_use]
    pub fn cancellations(&self) -> u64 {
        self.cancellations.load(Ordering::Relaxed)
    }

    /// Issued calls without a terminal outcome yet.
    #[must_use]
    pub fn in_flight_calls(&self) -> u64 {
        self.calls_issued()
            .saturating_sub(self.responses_received() + self.calls_failed() + self.cancellations())
    }
}
