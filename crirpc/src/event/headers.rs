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

//! Conventional header names.
//!
//! These keys are understood by the supervisor and the client. [`Metadata`]
//! itself does not enforce them.
//!
//! [`Metadata`]: super::Metadata

/// Identity of the participant that sent the event.
pub const SENDER: &str = "sender";

/// Address the response must be sent to.
pub const REPLY_TO: &str = "reply-to";

/// Content type of the payload.
pub const CONTENT_TYPE: &str = "content-type";

/// Content type the caller wants the response encoded with.
pub const ACCEPT: &str = "accept";

/// Present when the payload is an error descriptor rather than a result.
pub const ERROR: &str = "error";

/// Identifies the call a request or response belongs to.
pub const CORRELATION_ID: &str = "correlation-id";

/// Stream control signal, one of [`CONTROL_COMPLETE`] or [`CONTROL_CANCEL`].
pub const CONTROL: &str = "control";

/// Server to client: the stream produced its last item.
pub const CONTROL_COMPLETE: &str = "complete";

/// Client to server: stop producing items for this call.
pub const CONTROL_CANCEL: &str = "cancel";

/// Present when a call completed without a value.
pub const VOID: &str = "void";

/// Value used for flag headers such as [`ERROR`] and [`VOID`].
pub const TRUE: &str = "true";
