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

#![doc = include_str!("../../README.md")]
#![allow(clippy::module_inception)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! ## Architecture
//!
//! crirpc is organized into layers, each usable on its own:
//!
//! - **[`address`]**: the CRI resource identifier and its matching rules
//! - **[`event`]**: the event envelope, ordered metadata and header names
//! - **[`bus`]**: the [`EventBus`](bus::EventBus) contract, an in-process
//!   bus and a session-gated decorator
//! - **[`converter`]**: first-match converter chains for payload encoding
//! - **[`service`]**: publishing services and dispatching calls
//! - **[`rpc`]**: calling services through proxies
//! - **[`security`]**: permission patterns, participants and sessions
//! - **[`observability`]**: call counters and error logging
//!
//! ## Error Handling
//!
//! Each layer has its own error type. Everything a caller can observe from
//! a call is an [`RpcError`], which separates transport failures
//! ([`RpcError::is_transport_error`]) from errors raised by the service
//! itself ([`RpcError::is_application_error`]). On the wire, errors travel
//! as an [`ErrorDescriptor`].

pub mod address;
pub mod bus;
pub mod config;
pub mod converter;
pub mod error;
pub mod event;
pub mod observability;
pub mod rpc;
pub mod security;
pub mod service;

pub use address::{Address, AddressError};
pub use bus::{BusError, EventBus, MemoryEventBus};
pub use config::RpcConfig;
pub use error::{ErrorDescriptor, RpcError, StackFrame};
pub use event::{Event, Metadata};
pub use rpc::{MultiValue, RpcClient, ServiceProxy, SingleValue};
pub use service::{ServiceError, ServiceInterface, ServiceRegistry};
