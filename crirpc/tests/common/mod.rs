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

//! Shared fixtures for integration tests.

#![allow(dead_code)]

use crirpc::address::Address;
use crirpc::bus::MemoryEventBus;
use crirpc::rpc::{RpcClient, ServiceProxy};
use crirpc::service::{ServiceError, ServiceInterface, ServiceRegistry};
use crirpc::RpcConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use futures_util::StreamExt;
use std::time::Duration;

pub const CALCULATOR: &str = "srv://demo.Calculator";

/// A service with one method of every shape.
#[derive(Debug, Default)]
pub struct Calculator {
    pub resets: AtomicUsize,
}

impl Calculator {
    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

pub fn calculator_interface() -> Arc<ServiceInterface<Calculator>> {
    Arc::new(
        ServiceInterface::<Calculator>::builder("demo.Calculator")
            .single("add", &["a", "b"], |_c, (a, b): (i64, i64)| async move { Ok(a + b) })
            .single("divide", &["a", "b"], |_c, (a, b): (i64, i64)| async move {
                if b == 0 {
                    Err(ServiceError::with_class("ArithmeticException", "division by zero"))
                } else {
                    Ok(a / b)
                }
            })
            .single("greet", &["name"], |_c, (name,): (String,)| async move {
                Ok(format!("hello {name}"))
            })
            .single("slow", &["millis"], |_c, (millis,): (u64,)| async move {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                Ok(millis)
            })
            .single("digit", &["index"], |_c, (index,): (usize,)| async move {
                let digits: Vec<i64> = Vec::new();
                Ok(digits[index])
            })
            .unit("reset", &[], |c: Arc<Calculator>, (): ()| async move {
                c.resets.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .stream("count", &["to"], |_c, (to,): (u32,)| {
                futures_util::stream::iter((0..to).map(Ok::<_, ServiceError>))
            })
            .stream("count_then_fail", &["to"], |_c, (to,): (u32,)| {
                futures_util::stream::iter(
                    (0..to)
                        .map(Ok)
                        .chain(std::iter::once(Err(ServiceError::with_class("Overflow", "too far")))),
                )
            })
            .stream("count_then_panic", &["to"], |_c, (to,): (u32,)| {
                futures_util::stream::iter(0..=to).map(move |i| {
                    assert!(i < to, "counted past {to}");
                    Ok::<_, ServiceError>(i)
                })
            })
            .stream("ticks", &[], |_c, (): ()| {
                futures_util::stream::unfold(0u64, |n| async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Some((Ok::<_, ServiceError>(n), n + 1))
                })
            })
            .build(),
    )
}

pub struct Fixture {
    pub bus: Arc<MemoryEventBus>,
    pub registry: ServiceRegistry,
    pub client: RpcClient,
    pub address: Address,
    pub interface: Arc<ServiceInterface<Calculator>>,
    pub calculator: Arc<Calculator>,
}

impl Fixture {
    pub fn proxy(&self) -> ServiceProxy {
        self.client
            .proxy(self.address.clone(), self.interface.descriptor().clone())
    }
}

pub async fn fixture() -> Fixture {
    fixture_with(RpcConfig::default()).await
}

pub async fn fixture_with(config: RpcConfig) -> Fixture {
    let bus = Arc::new(MemoryEventBus::new());
    let registry = ServiceRegistry::new(bus.clone());
    let address = Address::parse(CALCULATOR).unwrap();
    let interface = calculator_interface();
    let calculator = Arc::new(Calculator::default());
    registry
        .register(address.clone(), interface.clone(), calculator.clone())
        .await
        .unwrap();
    let client = RpcClient::connect(bus.clone(), config).await.unwrap();
    Fixture {
        bus,
        registry,
        client,
        address,
        interface,
        calculator,
    }
}

/// Polls `condition` until it holds or a second has passed.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
