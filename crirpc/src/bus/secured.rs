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

//! Session-gated event bus decorator.

use crate::address::Address;
use crate::bus::{BusError, EventBus, EventStream, ListenerStatus};
use crate::event::Event;
use crate::security::Session;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use std::sync::Arc;
use tracing::warn;

/// Wraps a bus and checks every send and listen against a [`Session`].
///
/// Rejected operations fail with [`BusError::Unauthorized`] before the inner
/// bus sees them.
///
/// # Examples
///
/// ```rust
/// use crirpc::address::Address;
/// use crirpc::bus::{BusError, EventBus, MemoryEventBus, SessionEventBus};
/// use crirpc::event::Event;
/// use crirpc::security::{Participant, Permissions, Session};
/// use std::sync::Arc;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::new(
///     Participant::new("alice"),
///     Permissions::new().allow_send("srv://calc.**")?,
/// );
/// let bus = SessionEventBus::new(Arc::new(MemoryEventBus::new()), Arc::new(session));
///
/// bus.send(Event::new(Address::parse("srv://calc.Api/add")?, Vec::new()))?;
/// let denied = bus.send(Event::new(Address::parse("srv://mail.Api")?, Vec::new()));
/// assert!(matches!(denied, Err(BusError::Unauthorized { .. })));
/// # Ok(())
/// # }
/// ```
pub struct SessionEventBus<B: ?Sized> {
    inner: Arc<B>,
    session: Arc<Session>,
}

impl<B: EventBus + ?Sized> SessionEventBus<B> {
    /// Wraps `inner` with the checks of `session`.
    pub fn new(inner: Arc<B>, session: Arc<Session>) -> Self {
        Self { inner, session }
    }

    /// The session in force.
    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// The wrapped bus.
    #[must_use]
    pub fn inner(&self) -> &Arc<B> {
        &self.inner
    }

    fn check_send(&self, address: &Address) -> Result<(), BusError> {
        if self.session.send_allowed(address) {
            Ok(())
        } else {
            warn!(participant = %self.session.participant().id, address = %address, "send rejected");
            Err(BusError::Unauthorized {
                operation: "send",
                address: address.to_string(),
            })
        }
    }

    fn check_subscribe(&self, address: &Address) -> Result<(), BusError> {
        if self.session.subscribe_allowed(address) {
            Ok(())
        } else {
            warn!(participant = %self.session.participant().id, address = %address, "subscribe rejected");
            Err(BusError::Unauthorized {
                operation: "subscribe",
                address: address.to_string(),
            })
        }
    }
}

impl<B: ?Sized> std::fmt::Debug for SessionEventBus<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEventBus")
            .field("session", &self.session.id())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<B: EventBus + ?Sized> EventBus for SessionEventBus<B> {
    fn send(&self, event: Event) -> Result<(), BusError> {
        self.check_send(event.cri())?;
        self.inner.send(event)
    }

    async fn send_with_ack(&self, event: Event) -> Result<(), BusError> {
        self.check_send(event.cri())?;
        self.inner.send_with_ack(event).await
    }

    fn listen(&self, address: &Address) -> Result<EventStream, BusError> {
        self.check_subscribe(address)?;
        self.inner.listen(address)
    }

    async fn listen_with_ack(&self, address: &Address) -> Result<EventStream, BusError> {
        self.check_subscribe(address)?;
        self.inner.listen_with_ack(address).await
    }

    fn is_anybody_listening(&self, address: &Address) -> bool {
        self.inner.is_anybody_listening(address)
    }

    fn monitor_listener_status(&self, address: &Address) -> BoxStream<'static, ListenerStatus> {
        self.inner.monitor_listener_status(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MemoryEventBus;
    use crate::security::{Participant, Permissions};
    use futures_util::StreamExt;

    fn addr(raw: &str) -> Address {
        Address::parse(raw).unwrap()
    }

    fn secured() -> (Arc<MemoryEventBus>, SessionEventBus<MemoryEventBus>) {
        let inner = Arc::new(MemoryEventBus::new());
        let permissions = Permissions::new()
            .allow_send("srv://calc.**")
            .unwrap()
            .allow_subscribe("stream://news.**")
            .unwrap();
        let session = Arc::new(Session::new(Participant::new("alice"), permissions));
        (inner.clone(), SessionEventBus::new(inner, session))
    }

    #[tokio::test]
    async fn test_rejected_send_never_reaches_listener() {
        let (inner, bus) = secured();
        let mut events = inner.listen_with_ack(&addr("srv://mail.Api")).await.unwrap();

        let result = bus.send_with_ack(Event::new(addr("srv://mail.Api/send"), Vec::new())).await;
        assert!(matches!(result, Err(BusError::Unauthorized { operation: "send", .. })));

        let nothing =
            tokio::time::timeout(std::time::Duration::from_millis(20), events.next()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test]
    async fn test_subscribe_gate() {
        let (_inner, bus) = secured();
        assert!(bus.listen_with_ack(&addr("stream://news.Sports")).await.is_ok());
        assert!(matches!(
            bus.listen_with_ack(&addr("stream://calc.Api")).await,
            Err(BusError::Unauthorized { operation: "subscribe", .. })
        ));
        assert!(bus.listen(&addr("srv://calc.Api")).is_err());
    }

    #[tokio::test]
    async fn test_temporary_grant_through_bus() {
        let (inner, bus) = secured();
        let _events = inner.listen_with_ack(&addr("srv://mail.Api")).await.unwrap();
        bus.session().add_temporary_send_allowed("srv://mail.Api/*").unwrap();

        let send = || Event::new(addr("srv://mail.Api/send"), Vec::new());
        assert!(bus.send_with_ack(send()).await.is_ok());
        assert!(bus.send_with_ack(send()).await.is_err());
    }
}
