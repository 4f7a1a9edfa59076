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

//! Client configuration.

use crate::converter::APPLICATION_JSON;
use std::time::Duration;

/// Configuration for an [`RpcClient`](crate::rpc::RpcClient).
///
/// # Examples
///
/// ```rust
/// use crirpc::RpcConfig;
/// use std::time::Duration;
///
/// // Use default configuration
/// let config = RpcConfig::default();
/// assert_eq!(config.content_type, "application/json");
///
/// // Customize configuration
/// let config = RpcConfig::new()
///     .with_node_id("worker-7")
///     .with_request_timeout(Some(Duration::from_secs(5)))
///     .with_content_type("text/plain");
/// assert_eq!(config.accept_type(), "text/plain");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcConfig {
    /// Content type used to encode call arguments.
    ///
    /// Default: `application/json`
    pub content_type: String,

    /// Content type requested for responses.
    ///
    /// `None` requests the same type as [`content_type`](Self::content_type).
    ///
    /// Default: None
    pub accept: Option<String>,

    /// How long a single-value call waits for its response.
    ///
    /// `None` waits forever. Streams are never timed out.
    ///
    /// Default: 30 seconds
    pub request_timeout: Option<Duration>,

    /// Send calls with acknowledgement.
    ///
    /// When enabled a call to an address nobody listens on fails immediately
    /// with `RpcMissingServiceException` instead of timing out.
    ///
    /// Default: true
    pub use_ack: bool,

    /// Scope of the client's reply address and value of the `sender` header.
    ///
    /// Default: None (a random UUID)
    pub node_id: Option<String>,

    /// Resource name of the client's reply address.
    ///
    /// Default: `crirpc.rpc.reply`
    pub reply_resource: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            content_type: APPLICATION_JSON.to_string(),
            accept: None,
            request_timeout: Some(Duration::from_secs(30)),
            use_ack: true,
            node_id: None,
            reply_resource: "crirpc.rpc.reply".to_string(),
        }
    }
}

impl RpcConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the argument content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Sets the requested response content type.
    #[must_use]
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Sets the single-value call timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Enables or disables acknowledged sends.
    #[must_use]
    pub fn with_ack(mut self, use_ack: bool) -> Self {
        self.use_ack = use_ack;
        self
    }

    /// Sets the node id.
    #[must_use]
    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Sets the reply resource name.
    #[must_use]
    pub fn with_reply_resource(mut self, reply_resource: impl Into<String>) -> Self {
        self.reply_resource = reply_resource.into();
        self
    }

    /// The content type requested for responses.
    #[must_use]
    pub fn accept_type(&self) -> &str {
        self.accept.as_deref().unwrap_or(&self.content_type)
    }
}
