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

//! Server side: publishing services and dispatching calls.
//!
//! A service is an instance of some type `S` exposed through a
//! [`ServiceInterface<S>`], which pairs a method table
//! ([`InterfaceDescriptor`]) with typed invokers. The [`ServiceRegistry`]
//! binds an interface and instance to an [`Address`](crate::address::Address)
//! and starts a [`ServiceSupervisor`] that listens there.
//!
//! For each call the supervisor resolves an argument converter from the
//! event's content type, selects the method from the address path, invokes
//! it and answers on the caller's `reply-to` address:
//!
//! - unit methods answer once with an empty `void` response
//! - single-value methods answer once with the encoded value
//! - streaming methods answer once per item, then with `control: complete`
//! - failures answer once with an encoded [`ErrorDescriptor`](crate::ErrorDescriptor)
//!   and `error: true`

mod descriptor;
mod error;
mod interface;
mod registry;
mod supervisor;

pub use descriptor::{InterfaceDescriptor, MethodDescriptor, ParamDescriptor, ReturnKind};
pub use error::{RegistryError, ServiceError};
pub use interface::{
    Reply, ReplyFuture, ServiceInterface, ServiceInterfaceBuilder, from_arguments, to_arguments,
};
pub use registry::ServiceRegistry;
pub use supervisor::ServiceSupervisor;
