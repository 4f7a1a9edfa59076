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

//! In-process event bus.
//!
//! Listeners are kept in a table behind a `parking_lot` read-write lock and
//! fed through unbounded tokio channels. Registration is synchronous, so a
//! listener is visible to senders as soon as it is inserted.

use crate::address::Address;
use crate::bus::{BusError, EventBus, EventStream, ListenerStatus};
use crate::event::Event;
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::task::{Context, Poll};
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace};

struct Listener {
    id: u64,
    address: Address,
    tx: mpsc::UnboundedSender<Event>,
}

struct StatusWatcher {
    address: Address,
    tx: watch::Sender<ListenerStatus>,
}

#[derive(Default)]
struct Shared {
    listeners: RwLock<Vec<Listener>>,
    watchers: Mutex<Vec<StatusWatcher>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl Shared {
    fn deliver(&self, event: &Event) -> usize {
        let listeners = self.listeners.read();
        listeners
            .iter()
            .filter(|l| l.address.matches(event.cri()))
            .filter(|l| l.tx.send(event.clone()).is_ok())
            .count()
    }

    fn is_listening(&self, address: &Address) -> bool {
        self.listeners
            .read()
            .iter()
            .any(|l| l.address.matches(address))
    }

    fn register(self: &Arc<Self>, address: Address) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut listeners = self.listeners.write();
            // a closed bus drops the sender, ending the stream immediately
            if !self.closed.load(Ordering::Acquire) {
                listeners.push(Listener {
                    id,
                    address: address.clone(),
                    tx,
                });
            }
        }
        debug!(address = %address, listener_id = id, "listener registered");
        self.refresh_watchers();
        Subscription {
            rx,
            _registration: Registration {
                shared: Arc::clone(self),
                id,
            },
        }
    }

    fn deregister(&self, id: u64) {
        let removed = {
            let mut listeners = self.listeners.write();
            let before = listeners.len();
            listeners.retain(|l| l.id != id);
            before != listeners.len()
        };
        if removed {
            debug!(listener_id = id, "listener removed");
            self.refresh_watchers();
        }
    }

    fn refresh_watchers(&self) {
        let mut watchers = self.watchers.lock();
        watchers.retain(|w| !w.tx.is_closed());
        for watcher in watchers.iter() {
            let status = ListenerStatus::from_active(self.is_listening(&watcher.address));
            watcher.tx.send_if_modified(|current| {
                let changed = *current != status;
                *current = status;
                changed
            });
        }
    }
}

/// Removes its listener from the table when dropped.
struct Registration {
    shared: Arc<Shared>,
    id: u64,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.shared.deregister(self.id);
    }
}

struct Subscription {
    rx: mpsc::UnboundedReceiver<Event>,
    _registration: Registration,
}

impl Stream for Subscription {
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

/// An [`EventBus`] that delivers within the current process.
///
/// Clones share the same listener table.
///
/// # Examples
///
/// ```rust
/// use crirpc::address::Address;
/// use crirpc::bus::{BusError, EventBus, MemoryEventBus};
/// use crirpc::event::Event;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bus = MemoryEventBus::new();
/// let address = Address::parse("srv://a.b.Missing/call")?;
///
/// // Plain sends are fire-and-forget.
/// bus.send(Event::new(address.clone(), Vec::new()))?;
///
/// // Acknowledged sends report that nobody is listening.
/// let result = bus.send_with_ack(Event::new(address, Vec::new())).await;
/// assert!(matches!(result, Err(BusError::NoListener { .. })));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct MemoryEventBus {
    shared: Arc<Shared>,
}

impl MemoryEventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Closes the bus.
    ///
    /// Every open listener stream ends and further sends fail with
    /// [`BusError::Closed`].
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
        self.shared.listeners.write().clear();
        self.shared.refresh_watchers();
        debug!("memory event bus closed");
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.read().len()
    }

    fn ensure_open(&self) -> Result<(), BusError> {
        if self.is_closed() {
            Err(BusError::Closed)
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for MemoryEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEventBus")
            .field("listeners", &self.listener_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    fn send(&self, event: Event) -> Result<(), BusError> {
        self.ensure_open()?;
        let delivered = self.shared.deliver(&event);
        trace!(address = %event.cri(), delivered, "event sent");
        Ok(())
    }

    async fn send_with_ack(&self, event: Event) -> Result<(), BusError> {
        self.ensure_open()?;
        let delivered = self.shared.deliver(&event);
        trace!(address = %event.cri(), delivered, "event sent with ack");
        if delivered == 0 {
            return Err(BusError::NoListener {
                address: event.cri().to_string(),
            });
        }
        Ok(())
    }

    fn listen(&self, address: &Address) -> Result<EventStream, BusError> {
        let shared = Arc::clone(&self.shared);
        let address = address.clone();
        Ok(stream::once(async move { shared.register(address) })
            .flatten()
            .boxed())
    }

    async fn listen_with_ack(&self, address: &Address) -> Result<EventStream, BusError> {
        self.ensure_open()?;
        Ok(self.shared.register(address.clone()).boxed())
    }

    fn is_anybody_listening(&self, address: &Address) -> bool {
        self.shared.is_listening(address)
    }

    fn monitor_listener_status(&self, address: &Address) -> BoxStream<'static, ListenerStatus> {
        let rx = {
            // hold the watcher lock so a concurrent change cannot slip in
            // between reading the status and publishing the watcher
            let mut watchers = self.shared.watchers.lock();
            let status = ListenerStatus::from_active(self.shared.is_listening(address));
            let (tx, rx) = watch::channel(status);
            watchers.push(StatusWatcher {
                address: address.clone(),
                tx,
            });
            rx
        };
        stream::unfold((rx, true), |(mut rx, first)| async move {
            if !first {
                rx.changed().await.ok()?;
            }
            let status = *rx.borrow_and_update();
            Some((status, (rx, false)))
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Metadata;
    use std::time::Duration;

    fn addr(raw: &str) -> Address {
        Address::parse(raw).unwrap()
    }

    fn event(raw: &str, data: &[u8]) -> Event {
        Event::with_metadata(addr(raw), Metadata::new(), data.to_vec())
    }

    #[tokio::test]
    async fn test_delivery_by_match() {
        let bus = MemoryEventBus::new();
        let mut service = bus.listen_with_ack(&addr("srv://a.b.C")).await.unwrap();
        let mut other = bus.listen_with_ack(&addr("srv://a.b.D")).await.unwrap();

        bus.send_with_ack(event("srv://a.b.C/m", b"1")).await.unwrap();
        assert_eq!(service.next().await.unwrap().data(), b"1");

        let nothing = tokio::time::timeout(Duration::from_millis(20), other.next()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test]
    async fn test_fan_out() {
        let bus = MemoryEventBus::new();
        let mut first = bus.listen_with_ack(&addr("stream://t")).await.unwrap();
        let mut second = bus.listen_with_ack(&addr("stream://t")).await.unwrap();

        bus.send(event("stream://t", b"x")).unwrap();
        assert_eq!(first.next().await.unwrap().data(), b"x");
        assert_eq!(second.next().await.unwrap().data(), b"x");
    }

    #[tokio::test]
    async fn test_listen_is_cold() {
        let bus = MemoryEventBus::new();
        let target = addr("srv://a.b.C");
        let mut events = bus.listen(&target).unwrap();

        assert!(!bus.is_anybody_listening(&target));
        bus.send(event("srv://a.b.C/early", b"lost")).unwrap();

        // first poll registers the listener
        let pending = tokio::time::timeout(Duration::from_millis(10), events.next()).await;
        assert!(pending.is_err());
        assert!(bus.is_anybody_listening(&target));

        bus.send(event("srv://a.b.C/late", b"seen")).unwrap();
        assert_eq!(events.next().await.unwrap().data(), b"seen");
    }

    #[tokio::test]
    async fn test_drop_deregisters() {
        let bus = MemoryEventBus::new();
        let target = addr("srv://a.b.C");
        let events = bus.listen_with_ack(&target).await.unwrap();
        assert_eq!(bus.listener_count(), 1);

        drop(events);
        assert_eq!(bus.listener_count(), 0);
        let result = bus.send_with_ack(event("srv://a.b.C/m", b"")).await;
        assert!(matches!(result, Err(BusError::NoListener { .. })));
    }

    #[tokio::test]
    async fn test_monitor_listener_status() {
        let bus = MemoryEventBus::new();
        let target = addr("srv://a.b.C");
        let mut status = bus.monitor_listener_status(&target);
        assert_eq!(status.next().await, Some(ListenerStatus::Inactive));

        let events = bus.listen_with_ack(&target).await.unwrap();
        assert_eq!(status.next().await, Some(ListenerStatus::Active));

        drop(events);
        assert_eq!(status.next().await, Some(ListenerStatus::Inactive));
    }

    #[tokio::test]
    async fn test_close_ends_streams() {
        let bus = MemoryEventBus::new();
        let mut events = bus.listen_with_ack(&addr("srv://a")).await.unwrap();
        bus.close();

        assert!(events.next().await.is_none());
        assert!(matches!(bus.send(event("srv://a", b"")), Err(BusError::Closed)));
        assert!(matches!(
            bus.listen_with_ack(&addr("srv://a")).await,
            Err(BusError::Closed)
        ));
    }
}
