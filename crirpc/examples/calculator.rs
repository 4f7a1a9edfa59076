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

//! # Calculator Example
//!
//! Publishes a calculator service on an in-process bus and calls it:
//!
//! - single-value and unit calls through a typed proxy
//! - a streaming call, canceled part way through
//! - an application error raised by the service
//! - a client on a session-gated bus that may only reach the calculator
//!
//! Run with `RUST_LOG=crirpc=debug` to see calls moving through the bus.
//!
//! ```text
//! cargo run --example calculator
//! ```

use crirpc::address::Address;
use crirpc::bus::{MemoryEventBus, SessionEventBus};
use crirpc::rpc::RpcClient;
use crirpc::security::{Participant, Permissions, Session};
use crirpc::service::{ServiceError, ServiceInterface, ServiceRegistry};
use crirpc::{RpcConfig, RpcError};
use futures_util::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Calculator with a memory register.
#[derive(Default)]
struct Calculator {
    memory: AtomicI64,
}

fn interface() -> ServiceInterface<Calculator> {
    ServiceInterface::<Calculator>::builder("demo.Calculator")
        .single("add", &["a", "b"], |_c, (a, b): (i64, i64)| async move { Ok(a + b) })
        .single("divide", &["a", "b"], |_c, (a, b): (i64, i64)| async move {
            if b == 0 {
                Err(ServiceError::with_class("ArithmeticException", "division by zero"))
            } else {
                Ok(a / b)
            }
        })
        .unit("store", &["value"], |c: Arc<Calculator>, (value,): (i64,)| async move {
            c.memory.store(value, Ordering::SeqCst);
            Ok(())
        })
        .single("recall", &[], |c: Arc<Calculator>, (): ()| async move {
            Ok(c.memory.load(Ordering::SeqCst))
        })
        .stream("fibonacci", &[], |_c, (): ()| {
            futures_util::stream::unfold((0u64, 1u64), |(a, b)| async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Some((Ok::<_, ServiceError>(a), (b, a.saturating_add(b))))
            })
        })
        .build()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let bus = Arc::new(MemoryEventBus::new());
    let interface = Arc::new(interface());
    let address = Address::parse("srv://demo.Calculator")?;

    let registry = ServiceRegistry::new(bus.clone());
    registry
        .register(address.clone(), interface.clone(), Arc::new(Calculator::default()))
        .await?;
    println!("📡 calculator published at {address}");

    let client = RpcClient::connect(bus.clone(), RpcConfig::default()).await?;
    let calculator = client.proxy(address.clone(), interface.descriptor().clone());

    let sum: i64 = calculator.call("add", (40, 2)).await?;
    println!("➕ 40 + 2 = {sum}");

    calculator.call::<_, ()>("store", (sum,)).await?;
    let recalled: i64 = calculator.call("recall", ()).await?;
    println!("💾 memory holds {recalled}");

    match calculator.call::<_, i64>("divide", (1, 0)).await {
        Err(RpcError::Remote {
            class_name, message, ..
        }) => println!("❌ divide failed remotely: {class_name}: {message}"),
        other => println!("unexpected divide result: {other:?}"),
    }

    let mut fibonacci = calculator.stream::<_, u64>("fibonacci", ());
    let mut terms = Vec::new();
    while let Some(term) = fibonacci.next().await {
        terms.push(term?);
        if terms.len() == 10 {
            break;
        }
    }
    drop(fibonacci);
    println!("🌀 first fibonacci terms: {terms:?}");

    // a participant allowed to call the calculator and nothing else
    let permissions = Permissions::new()
        .allow_send("srv://demo.Calculator/*")?
        .allow_subscribe("srv://guest-node@crirpc.rpc.reply")?;
    let session = Arc::new(Session::new(Participant::new("guest").with_role("viewer"), permissions));
    let guest_bus = Arc::new(SessionEventBus::new(bus.clone(), session));
    let guest = RpcClient::connect(guest_bus, RpcConfig::new().with_node_id("guest-node")).await?;

    let guest_sum: i64 = guest
        .proxy(address.clone(), interface.descriptor().clone())
        .call("add", (1, 1))
        .await?;
    println!("🔐 guest computed 1 + 1 = {guest_sum}");

    let elsewhere = guest.proxy(Address::parse("srv://demo.Ledger")?, interface.descriptor().clone());
    if let Err(e) = elsewhere.call::<_, i64>("add", (1, 1)).await {
        println!("🚫 guest call to the ledger rejected: {e}");
    }

    guest.shutdown("example finished").await;
    client.shutdown("example finished").await;
    registry.shutdown().await;
    println!("✅ done");
    Ok(())
}
