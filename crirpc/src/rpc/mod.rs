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

//! Client side: calling services through proxies.
//!
//! An [`RpcClient`] owns a reply address and a response router. Each call
//! made through a [`ServiceProxy`] gets a fresh correlation id, is sent to
//! `{service address}/{method}` and is answered on
//! `{reply address}/{correlation id}`.
//!
//! Return values come in two shapes chosen from the method descriptor:
//!
//! - [`SingleValue`]: a future resolving to one value or an error
//! - [`MultiValue`]: a stream of values ended by the service's
//!   `control: complete` response or by an error
//!
//! Both are lazy. The call event is sent on first poll, and a call canceled
//! before then is never sent.
//!
//! # Examples
//!
//! ```rust
//! use crirpc::RpcConfig;
//! use crirpc::address::Address;
//! use crirpc::bus::MemoryEventBus;
//! use crirpc::rpc::RpcClient;
//! use crirpc::service::{ServiceInterface, ServiceRegistry};
//! use std::sync::Arc;
//!
//! struct Calculator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bus = Arc::new(MemoryEventBus::new());
//! let interface = Arc::new(
//!     ServiceInterface::<Calculator>::builder("demo.Calculator")
//!         .single("add", &["a", "b"], |_c, (a, b): (i64, i64)| async move { Ok(a + b) })
//!         .build(),
//! );
//! let address = Address::parse("srv://demo.Calculator")?;
//!
//! let registry = ServiceRegistry::new(bus.clone());
//! registry.register(address.clone(), interface.clone(), Arc::new(Calculator)).await?;
//!
//! let client = RpcClient::connect(bus, RpcConfig::default()).await?;
//! let calculator = client.proxy(address, interface.descriptor().clone());
//! let sum: i64 = calculator.call("add", (2, 3)).await?;
//! assert_eq!(sum, 5);
//! # Ok(())
//! # }
//! ```

mod client;
mod correlation;
mod handler;
mod multi;
mod pending;
mod proxy;
mod request;
mod single;

pub use client::RpcClient;
pub use correlation::CorrelationIdGenerator;
pub use handler::{ResponseHandler, ReturnValueHandler};
pub use multi::{MultiValue, MultiValueHandler};
pub use pending::{PendingCalls, PendingEntry};
pub use proxy::{ReturnValue, ServiceProxy};
pub use request::RpcRequest;
pub use single::{SingleValue, SingleValueHandler};
