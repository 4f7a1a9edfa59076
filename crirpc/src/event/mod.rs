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

//! The envelope carried over the event bus.
//!
//! An [`Event`] is an address, an ordered [`Metadata`] header map and an
//! opaque payload. Routing and dispatch only look at the address and the
//! headers; the payload is interpreted by the converters.

pub mod headers;
mod metadata;

pub use metadata::Metadata;

use crate::address::{Address, AddressError};

/// An immutable routed message.
///
/// The payload type defaults to raw bytes, which is what crosses the bus.
///
/// # Examples
///
/// ```rust
/// use crirpc::event::{headers, Event, Metadata};
///
/// let event = Event::parse(
///     "srv://a.b.Calculator/add",
///     Metadata::new().with(headers::CONTENT_TYPE, "application/json"),
///     b"[1,2]".to_vec(),
/// )?;
/// assert_eq!(event.cri().path(), Some("add"));
/// assert_eq!(event.content_type(), Some("application/json"));
/// # Ok::<(), crirpc::address::AddressError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event<T = Vec<u8>> {
    cri: Address,
    metadata: Metadata,
    data: T,
}

impl<T> Event<T> {
    /// Creates an event with empty metadata.
    pub fn new(cri: Address, data: T) -> Self {
        Self {
            cri,
            metadata: Metadata::new(),
            data,
        }
    }

    /// Creates an event with the given metadata.
    pub fn with_metadata(cri: Address, metadata: Metadata, data: T) -> Self {
        Self {
            cri,
            metadata,
            data,
        }
    }

    /// Creates an event from a raw address string.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] if `raw` is not a valid address.
    pub fn parse(raw: &str, metadata: Metadata, data: T) -> Result<Self, AddressError> {
        Ok(Self::with_metadata(Address::parse(raw)?, metadata, data))
    }

    /// The destination address.
    pub fn cri(&self) -> &Address {
        &self.cri
    }

    /// The header map.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The payload.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Decomposes the event.
    pub fn into_parts(self) -> (Address, Metadata, T) {
        (self.cri, self.metadata, self.data)
    }

    /// Replaces the payload, keeping address and headers.
    pub fn map_data<U>(self, f: impl FnOnce(T) -> U) -> Event<U> {
        Event {
            cri: self.cri,
            metadata: self.metadata,
            data: f(self.data),
        }
    }

    /// Shorthand for `metadata().get(key)`.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.metadata.get(key)
    }

    /// The `content-type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.header(headers::CONTENT_TYPE)
    }

    /// The `correlation-id` header.
    pub fn correlation_id(&self) -> Option<&str> {
        self.header(headers::CORRELATION_ID)
    }

    /// The `control` header.
    pub fn control(&self) -> Option<&str> {
        self.header(headers::CONTROL)
    }

    /// Returns `true` if the payload is an error descriptor.
    pub fn is_error(&self) -> bool {
        self.metadata.contains(headers::ERROR)
    }

    /// Returns `true` if the event marks a call that completed without a value.
    pub fn is_void(&self) -> bool {
        self.metadata.contains(headers::VOID)
    }

    /// Parses the `reply-to` header.
    ///
    /// Returns `None` when the header is absent.
    pub fn reply_to(&self) -> Option<Result<Address, AddressError>> {
        self.header(headers::REPLY_TO).map(Address::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_accessors() {
        let metadata = Metadata::new()
            .with(headers::REPLY_TO, "srv://n@reply/7")
            .with(headers::CORRELATION_ID, "7")
            .with(headers::ERROR, headers::TRUE);
        let event = Event::parse("srv://a.b.C/m", metadata, vec![1u8]).unwrap();

        assert_eq!(event.correlation_id(), Some("7"));
        assert!(event.is_error());
        assert!(!event.is_void());
        assert_eq!(event.control(), None);
        assert_eq!(event.reply_to().unwrap().unwrap().path(), Some("7"));
    }

    #[test]
    fn test_event_reply_to_invalid() {
        let metadata = Metadata::new().with(headers::REPLY_TO, "nowhere");
        let event = Event::parse("srv://a", metadata, ()).unwrap();
        assert!(event.reply_to().unwrap().is_err());
        assert!(Event::parse("srv://a", Metadata::new(), ()).unwrap().reply_to().is_none());
    }

    #[test]
    fn test_event_map_data() {
        let event = Event::new(Address::parse("srv://a").unwrap(), "7".to_string());
        let mapped = event.map_data(|s| s.len());
        assert_eq!(*mapped.data(), 1);

        let (cri, metadata, data) = mapped.into_parts();
        assert_eq!(cri.raw(), "srv://a");
        assert!(metadata.is_empty());
        assert_eq!(data, 1);
    }
}
