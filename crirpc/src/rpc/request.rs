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

//! A prepared, not yet sent, call.

use crate::bus::{BusError, EventBus};
use crate::error::RpcError;
use crate::event::Event;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// A fully built call event and the bus to send it on.
///
/// Sending consumes the request, so a call is sent at most once.
pub struct RpcRequest {
    bus: Arc<dyn EventBus>,
    event: Event,
    use_ack: bool,
}

impl RpcRequest {
    /// Wraps `event` for sending on `bus`.
    pub fn new(bus: Arc<dyn EventBus>, event: Event, use_ack: bool) -> Self {
        Self { bus, event, use_ack }
    }

    /// The call event.
    #[must_use]
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Sends the call.
    ///
    /// # Errors
    ///
    /// With acknowledgement enabled a call nobody receives fails with
    /// [`RpcError::MissingService`]; other bus failures surface as
    /// [`RpcError::Transport`].
    pub async fn send(self) -> Result<(), RpcError> {
        trace!(address = %self.event.cri(), correlation_id = self.event.correlation_id(), "sending call");
        let result = if self.use_ack {
            self.bus.send_with_ack(self.event).await
        } else {
            self.bus.send(self.event)
        };
        result.map_err(|e| match e {
            BusError::NoListener { address } => RpcError::missing_service(address),
            other => RpcError::Transport(other),
        })
    }
}

impl fmt::Debug for RpcRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcRequest")
            .field("address", self.event.cri())
            .field("use_ack", &self.use_ack)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::bus::MemoryEventBus;

    fn call() -> Event {
        Event::new(Address::parse("srv://nobody.Home/ping").unwrap(), Vec::new())
    }

    #[tokio::test]
    async fn test_missing_listener_with_ack() {
        let request = RpcRequest::new(Arc::new(MemoryEventBus::new()), call(), true);
        let error = request.send().await.unwrap_err();
        assert!(matches!(error, RpcError::MissingService { .. }));
        assert!(error.is_transport_error());
    }

    #[tokio::test]
    async fn test_missing_listener_without_ack() {
        let request = RpcRequest::new(Arc::new(MemoryEventBus::new()), call(), false);
        assert!(request.send().await.is_ok());
    }

    #[tokio::test]
    async fn test_closed_bus() {
        let bus = MemoryEventBus::new();
        bus.close();
        let error = RpcRequest::new(Arc::new(bus), call(), true).send().await.unwrap_err();
        assert!(matches!(error, RpcError::Transport(BusError::Closed)));
    }
}
