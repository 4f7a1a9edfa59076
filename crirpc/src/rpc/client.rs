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

//! The RPC client and its response router.

use crate::address::{Address, SERVICE_SCHEME};
use crate::bus::{EventBus, EventStream};
use crate::config::RpcConfig;
use crate::converter::ClientConverters;
use crate::error::RpcError;
use crate::observability::RpcMetrics;
use crate::rpc::correlation::CorrelationIdGenerator;
use crate::rpc::pending::PendingCalls;
use crate::rpc::proxy::ServiceProxy;
use crate::service::InterfaceDescriptor;
use futures_util::StreamExt;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
#[cfg(feature = "observability")]
use tracing::instrument;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// State shared by a client and all of its proxies.
pub(crate) struct ClientShared {
    pub(crate) bus: Arc<dyn EventBus>,
    pub(crate) config: RpcConfig,
    pub(crate) converters: Arc<ClientConverters>,
    pub(crate) node_id: String,
    pub(crate) reply_base: Address,
    pub(crate) pending: Arc<PendingCalls>,
    pub(crate) correlation: CorrelationIdGenerator,
    pub(crate) metrics: Arc<RpcMetrics>,
    pub(crate) shutdown: CancellationToken,
}

/// Issues calls to services over an [`EventBus`].
///
/// A client listens on its own reply address,
/// `srv://{node_id}@{reply_resource}`, and routes every response arriving
/// there to the call it answers. Calls are made through
/// [`ServiceProxy`] handles obtained from [`proxy`](Self::proxy).
///
/// # Examples
///
/// ```rust
/// use crirpc::RpcConfig;
/// use crirpc::bus::MemoryEventBus;
/// use crirpc::rpc::RpcClient;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), crirpc::RpcError> {
/// let bus = Arc::new(MemoryEventBus::new());
/// let client = RpcClient::connect(bus, RpcConfig::new().with_node_id("node-1")).await?;
/// assert_eq!(client.reply_address().raw(), "srv://node-1@crirpc.rpc.reply");
/// client.shutdown("done").await;
/// # Ok(())
/// # }
/// ```
pub struct RpcClient {
    shared: Arc<ClientShared>,
    router: Mutex<Option<JoinHandle<()>>>,
}

impl RpcClient {
    /// Connects with the default converters.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Address`] if the node id or reply resource do not
    /// form a valid address and [`RpcError::Transport`] if the reply address
    /// cannot be listened on.
    pub async fn connect(bus: Arc<dyn EventBus>, config: RpcConfig) -> Result<Self, RpcError> {
        Self::connect_with_converters(bus, config, ClientConverters::default()).await
    }

    /// Connects with custom converters.
    ///
    /// # Errors
    ///
    /// As [`connect`](Self::connect).
    #[cfg_attr(feature = "observability", instrument(skip(bus, converters), fields(node_id = config.node_id.as_deref())))]
    pub async fn connect_with_converters(
        bus: Arc<dyn EventBus>,
        config: RpcConfig,
        converters: ClientConverters,
    ) -> Result<Self, RpcError> {
        let node_id = config
            .node_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let reply_base = Address::with_scope(SERVICE_SCHEME, &node_id, &config.reply_resource)?;
        let responses = bus.listen_with_ack(&reply_base).await?;

        let shared = Arc::new(ClientShared {
            bus,
            config,
            converters: Arc::new(converters),
            node_id,
            reply_base,
            pending: Arc::new(PendingCalls::new()),
            correlation: CorrelationIdGenerator::new(),
            metrics: Arc::new(RpcMetrics::new()),
            shutdown: CancellationToken::new(),
        });
        let router = tokio::spawn(route_responses(
            shared.pending.clone(),
            responses,
            shared.shutdown.clone(),
        ));
        info!(reply_address = %shared.reply_base, "rpc client connected");

        Ok(Self {
            shared,
            router: Mutex::new(Some(router)),
        })
    }

    /// Returns a proxy for the service at `address` implementing `interface`.
    #[must_use]
    pub fn proxy(&self, address: Address, interface: Arc<InterfaceDescriptor>) -> ServiceProxy {
        ServiceProxy::new(self.shared.clone(), address, interface)
    }

    /// The id used as reply scope and `sender` header.
    #[must_use]
    pub fn node_id(&self) -> &str {
        &self.shared.node_id
    }

    /// The address responses are routed from.
    #[must_use]
    pub fn reply_address(&self) -> &Address {
        &self.shared.reply_base
    }

    /// The configuration in force.
    #[must_use]
    pub fn config(&self) -> &RpcConfig {
        &self.shared.config
    }

    /// Client-side call counters.
    #[must_use]
    pub fn metrics(&self) -> &Arc<RpcMetrics> {
        &self.shared.metrics
    }

    /// Number of calls awaiting responses.
    #[must_use]
    pub fn pending_calls(&self) -> usize {
        self.shared.pending.len()
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shared.shutdown.is_cancelled()
    }

    /// Cancels every pending call with `reason` and stops routing responses.
    ///
    /// Calls made through existing proxies afterwards fail immediately.
    pub async fn shutdown(&self, reason: &str) {
        self.shared.shutdown.cancel();
        let canceled = self.shared.pending.cancel_all(reason);
        let router = self.router.lock().take();
        if let Some(router) = router {
            if let Err(e) = router.await {
                warn!(error = %e, "response router panicked");
            }
        }
        info!(canceled, reason, "rpc client shut down");
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        self.shared.shutdown.cancel();
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("reply_address", &self.shared.reply_base)
            .field("pending_calls", &self.pending_calls())
            .finish_non_exhaustive()
    }
}

async fn route_responses(
    pending: Arc<PendingCalls>,
    mut responses: EventStream,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            next = responses.next() => match next {
                Some(event) => {
                    pending.route(&event);
                }
                None => {
                    let canceled = pending.cancel_all("reply subscription closed");
                    warn!(canceled, "reply subscription closed");
                    break;
                }
            },
        }
    }
    debug!("response router stopped");
}
