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

//! The event bus contract.
//!
//! The RPC layers never talk to a network directly. They send and listen
//! through an [`EventBus`], keyed by [`Address`]. A listener receives every
//! event whose address it [matches](Address::matches), so a service listening
//! on `srv://a.b.Calculator` receives calls to `srv://a.b.Calculator/add`.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryEventBus`]: in-process delivery over tokio channels
//! - [`SessionEventBus`]: wraps another bus and gates every send and listen
//!   through a [`Session`](crate::security::Session)
//!
//! # Examples
//!
//! ```rust
//! use crirpc::address::Address;
//! use crirpc::bus::{EventBus, MemoryEventBus};
//! use crirpc::event::Event;
//! use futures_util::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bus = MemoryEventBus::new();
//! let address = Address::parse("stream://sensor.Temperature")?;
//!
//! let mut events = bus.listen_with_ack(&address).await?;
//! bus.send_with_ack(Event::new(address.clone(), b"21.5".to_vec())).await?;
//!
//! let event = events.next().await.unwrap();
//! assert_eq!(event.data(), b"21.5");
//! # Ok(())
//! # }
//! ```

mod error;
mod memory;
mod secured;

pub use error::BusError;
pub use memory::MemoryEventBus;
pub use secured::SessionEventBus;

use crate::address::Address;
use crate::event::Event;
use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// A long-lived sequence of delivered events.
///
/// Dropping the stream removes the listener.
pub type EventStream = BoxStream<'static, Event>;

/// Whether anybody is listening on an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerStatus {
    /// At least one listener would receive an event sent to the address.
    Active,
    /// No listener would receive an event sent to the address.
    Inactive,
}

impl ListenerStatus {
    pub(crate) const fn from_active(active: bool) -> Self {
        if active { Self::Active } else { Self::Inactive }
    }
}

/// Send and listen primitives keyed by [`Address`].
///
/// Implementations decide how events travel; the contract only fixes what
/// callers can rely on.
#[async_trait]
pub trait EventBus: Send + Sync + 'static {
    /// Delivers `event` to every current listener whose address matches.
    ///
    /// Fire-and-forget: having no listener is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] if the bus is closed or the send is not permitted.
    fn send(&self, event: Event) -> Result<(), BusError>;

    /// Like [`send`](Self::send), but fails unless at least one listener
    /// accepted the event.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NoListener`] or [`BusError::AckTimeout`] if nobody
    /// acknowledged the event.
    async fn send_with_ack(&self, event: Event) -> Result<(), BusError>;

    /// Returns a cold stream of events for `address`.
    ///
    /// Nothing is registered until the stream is first polled, so events sent
    /// before that are not seen. Each call yields an independent subscription.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] if listening is not permitted.
    fn listen(&self, address: &Address) -> Result<EventStream, BusError>;

    /// Registers a listener and resolves once it is visible to senders.
    ///
    /// A [`send_with_ack`](Self::send_with_ack) issued after this completes
    /// is guaranteed to reach the returned stream.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] if the bus is closed or listening is not permitted.
    async fn listen_with_ack(&self, address: &Address) -> Result<EventStream, BusError>;

    /// Returns `true` if an event sent to `address` would be delivered.
    fn is_anybody_listening(&self, address: &Address) -> bool;

    /// Streams [`ListenerStatus`] changes for `address`, starting with the
    /// current status.
    fn monitor_listener_status(&self, address: &Address) -> BoxStream<'static, ListenerStatus>;
}
