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

//! Access control for sends and subscriptions.
//!
//! A [`Session`] binds a [`Participant`] to [`Permissions`]: two allow lists
//! of [`PathPattern`]s consulted before an event is sent or a listener is
//! opened. [`SessionEventBus`](crate::bus::SessionEventBus) applies these
//! checks in front of any other bus.

mod pattern;
mod permissions;
mod session;

pub use pattern::{PathPattern, PatternError};
pub use permissions::Permissions;
pub use session::{Participant, Session};
