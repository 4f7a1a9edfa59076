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

//! Tracking of calls awaiting responses.

use crate::event::Event;
use crate::rpc::handler::ResponseHandler;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::trace;

/// Routes response events to the handler of the call they answer.
///
/// Handlers are keyed by correlation id. A handler stays registered until it
/// reports a terminal outcome or its [`PendingEntry`] is dropped, whichever
/// comes first.
///
/// # Thread Safety
///
/// Shared between the client's router task and every return value. Handlers
/// are always invoked outside the map lock.
pub struct PendingCalls {
    handlers: Mutex<HashMap<String, Arc<dyn ResponseHandler>>>,
}

impl PendingCalls {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
        }
    }

    /// Registers `handler` under `correlation_id`.
    ///
    /// The returned entry removes the registration when dropped.
    pub fn register(
        self: &Arc<Self>,
        correlation_id: String,
        handler: Arc<dyn ResponseHandler>,
    ) -> PendingEntry {
        self.handlers.lock().insert(correlation_id.clone(), handler);
        PendingEntry {
            pending: Arc::downgrade(self),
            correlation_id,
        }
    }

    /// Hands `event` to the handler it answers.
    ///
    /// The correlation id is taken from the `correlation-id` header, falling
    /// back to the path of the event's address. Returns `false` if no handler
    /// is registered, which is the case for late or duplicate responses.
    pub fn route(&self, event: &Event) -> bool {
        let Some(correlation_id) = event.correlation_id().or_else(|| event.cri().path()) else {
            trace!(address = %event.cri(), "response without correlation id ignored");
            return false;
        };
        let Some(handler) = self.handlers.lock().get(correlation_id).cloned() else {
            trace!(correlation_id, "response for unknown call ignored");
            return false;
        };
        if handler.process_response(event) {
            self.remove(correlation_id);
        }
        true
    }

    /// Forgets the call with `correlation_id`.
    ///
    /// Returns `true` if it was registered.
    pub fn remove(&self, correlation_id: &str) -> bool {
        self.handlers.lock().remove(correlation_id).is_some()
    }

    /// Cancels and forgets every registered call.
    ///
    /// Returns the number of calls canceled.
    pub fn cancel_all(&self, reason: &str) -> usize {
        let handlers: Vec<_> = self.handlers.lock().drain().map(|(_, h)| h).collect();
        for handler in &handlers {
            handler.cancel(reason);
        }
        handlers.len()
    }

    /// Number of registered calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Returns `true` if no call is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }
}

impl Default for PendingCalls {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PendingCalls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCalls").field("len", &self.len()).finish()
    }
}

/// A call's registration in [`PendingCalls`].
///
/// Dropping it removes the registration.
#[derive(Debug)]
pub struct PendingEntry {
    pending: Weak<PendingCalls>,
    correlation_id: String,
}

impl PendingEntry {
    /// The call's correlation id.
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

impl Drop for PendingEntry {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.upgrade() {
            pending.remove(&self.correlation_id);
        }
    }
}
