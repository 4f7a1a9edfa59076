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

//! Event bus error types.

use thiserror::Error;

/// Errors raised by an [`EventBus`](super::EventBus).
///
/// These are transport-class failures: they say nothing about whether the
/// remote service would have succeeded.
///
/// # Examples
///
/// ```rust
/// use crirpc::bus::BusError;
///
/// let error = BusError::NoListener {
///     address: "srv://a.b.C/m".to_string(),
/// };
/// assert!(error.is_recoverable());
/// assert!(!BusError::Closed.is_recoverable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// No listener accepted an acknowledged send.
    #[error("no listener for {address}")]
    NoListener {
        /// Destination of the rejected event
        address: String,
    },

    /// The bus gave up waiting for an acknowledgement.
    ///
    /// Only networked buses produce this; the in-process bus knows
    /// synchronously whether anybody received the event.
    #[error("acknowledgement for {address} timed out")]
    AckTimeout {
        /// Destination of the unacknowledged event
        address: String,
    },

    /// The session is not allowed to send to or listen on the address.
    #[error("{operation} on {address} is not permitted")]
    Unauthorized {
        /// `send` or `subscribe`
        operation: &'static str,
        /// The rejected address
        address: String,
    },

    /// The bus has been shut down.
    #[error("event bus is closed")]
    Closed,
}

impl BusError {
    /// Returns `true` if retrying the same operation later may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoListener { .. } | Self::AckTimeout { .. })
    }

    /// Returns `true` if the error is an access-control rejection.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
