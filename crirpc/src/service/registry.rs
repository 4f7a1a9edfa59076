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

//! Address-keyed service registrations.

use crate::address::Address;
use crate::bus::EventBus;
use crate::converter::ServerConverters;
use crate::observability::RpcMetrics;
use crate::service::error::RegistryError;
use crate::service::interface::ServiceInterface;
use crate::service::supervisor::ServiceSupervisor;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Publishes service instances on the bus.
///
/// Each registration owns a [`ServiceSupervisor`] listening on the exact
/// registered address. At most one registration exists per address; a second
/// [`register`](Self::register) for the same address fails without touching
/// the first.
///
/// # Examples
///
/// ```rust
/// use crirpc::address::Address;
/// use crirpc::bus::MemoryEventBus;
/// use crirpc::service::{ServiceInterface, ServiceRegistry};
/// use std::sync::Arc;
///
/// struct Greeter;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = ServiceRegistry::new(Arc::new(MemoryEventBus::new()));
/// let interface = ServiceInterface::<Greeter>::builder("demo.Greeter")
///     .single("greet", &["name"], |_g, (name,): (String,)| async move {
///         Ok(format!("hello {name}"))
///     })
///     .build();
///
/// let address = Address::parse("srv://demo.Greeter")?;
/// registry.register(address.clone(), Arc::new(interface), Arc::new(Greeter)).await?;
/// assert!(registry.is_registered(&address));
///
/// registry.unregister(&address).await?;
/// assert!(registry.is_empty());
/// # Ok(())
/// # }
/// ```
pub struct ServiceRegistry {
    bus: Arc<dyn EventBus>,
    converters: Arc<ServerConverters>,
    metrics: Arc<RpcMetrics>,
    services: Mutex<HashMap<Address, Arc<ServiceSupervisor>>>,
}

impl ServiceRegistry {
    /// Creates a registry with the default converters.
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self::with_converters(bus, ServerConverters::default())
    }

    /// Creates a registry with custom converters.
    pub fn with_converters(bus: Arc<dyn EventBus>, converters: ServerConverters) -> Self {
        Self {
            bus,
            converters: Arc::new(converters),
            metrics: Arc::new(RpcMetrics::new()),
            services: Mutex::new(HashMap::new()),
        }
    }

    /// Counters shared by every supervisor of this registry.
    #[must_use]
    pub fn metrics(&self) -> &Arc<RpcMetrics> {
        &self.metrics
    }

    /// Publishes `instance` through `interface` at `address`.
    ///
    /// Returns once the supervisor is listening, so a call sent afterwards is
    /// guaranteed to be received.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::AlreadyRegistered`] if the address is taken
    /// - [`RegistryError::Start`] if the bus refused the subscription
    /// - [`RegistryError::StartAborted`] if the address was unregistered
    ///   while starting
    pub async fn register<S: Send + Sync + 'static>(
        &self,
        address: Address,
        interface: Arc<ServiceInterface<S>>,
        instance: Arc<S>,
    ) -> Result<Arc<ServiceSupervisor>, RegistryError> {
        let supervisor = match self.services.lock().entry(address.clone()) {
            Entry::Occupied(_) => {
                return Err(RegistryError::AlreadyRegistered {
                    address: address.to_string(),
                });
            }
            Entry::Vacant(slot) => slot
                .insert(Arc::new(ServiceSupervisor::new(
                    address.clone(),
                    interface,
                    instance,
                    self.bus.clone(),
                    self.converters.clone(),
                    self.metrics.clone(),
                )))
                .clone(),
        };

        if let Err(e) = supervisor.start().await {
            let mut services = self.services.lock();
            if services
                .get(&address)
                .is_some_and(|current| Arc::ptr_eq(current, &supervisor))
            {
                services.remove(&address);
            }
            debug!(address = %address, error = %e, "registration failed");
            return Err(e);
        }

        info!(address = %address, "service registered");
        Ok(supervisor)
    }

    /// Removes the registration at `address` and waits for its supervisor to
    /// stop.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] if nothing is registered there.
    pub async fn unregister(&self, address: &Address) -> Result<(), RegistryError> {
        let stopping = {
            let mut services = self.services.lock();
            let supervisor = services
                .remove(address)
                .ok_or_else(|| RegistryError::NotRegistered {
                    address: address.to_string(),
                })?;
            supervisor.begin_stop()
        };
        if let Some(handle) = stopping {
            if let Err(e) = handle.await {
                warn!(address = %address, error = %e, "receive loop panicked");
            }
        }
        info!(address = %address, "service unregistered");
        Ok(())
    }

    /// Returns `true` if a service is registered at exactly `address`.
    #[must_use]
    pub fn is_registered(&self, address: &Address) -> bool {
        self.services.lock().contains_key(address)
    }

    /// The supervisor registered at `address`.
    #[must_use]
    pub fn get(&self, address: &Address) -> Option<Arc<ServiceSupervisor>> {
        self.services.lock().get(address).cloned()
    }

    /// Registered addresses in sorted order.
    #[must_use]
    pub fn addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<_> = self.services.lock().keys().cloned().collect();
        addresses.sort();
        addresses
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.lock().len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.lock().is_empty()
    }

    /// Stops and removes every registration.
    pub async fn shutdown(&self) {
        let stopping: Vec<_> = self
            .services
            .lock()
            .drain()
            .filter_map(|(address, supervisor)| supervisor.begin_stop().map(|handle| (address, handle)))
            .collect();
        let count = stopping.len();
        for (address, handle) in stopping {
            if let Err(e) = handle.await {
                warn!(address = %address, error = %e, "receive loop panicked");
            }
        }
        info!(stopped = count, "service registry shut down");
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.addresses())
            .finish_non_exhaustive()
    }
}
