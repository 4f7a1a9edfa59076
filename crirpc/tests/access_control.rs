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

//! Session-gated buses reject unauthorized traffic before delivery.

mod common;

use common::{CALCULATOR, Calculator, calculator_interface};
use crirpc::address::Address;
use crirpc::bus::{BusError, MemoryEventBus, SessionEventBus};
use crirpc::rpc::RpcClient;
use crirpc::security::{Participant, Permissions, Session};
use crirpc::service::ServiceRegistry;
use crirpc::{RpcConfig, RpcError};
use std::sync::Arc;

const MAILER: &str = "srv://demo.Mailer";

struct World {
    registry: ServiceRegistry,
    session: Arc<Session>,
    client: RpcClient,
}

async fn world(permissions: Permissions) -> World {
    let bus = Arc::new(MemoryEventBus::new());
    let registry = ServiceRegistry::new(bus.clone());
    for raw in [CALCULATOR, MAILER] {
        registry
            .register(Address::parse(raw).unwrap(), calculator_interface(), Arc::new(Calculator::default()))
            .await
            .unwrap();
    }

    let session = Arc::new(Session::new(Participant::new("alice"), permissions));
    let secured = Arc::new(SessionEventBus::new(bus, session.clone()));
    let client = RpcClient::connect(secured, RpcConfig::new().with_node_id("node-1"))
        .await
        .unwrap();
    World {
        registry,
        session,
        client,
    }
}

fn permissions() -> Permissions {
    Permissions::new()
        .allow_send("srv://demo.Calculator/*")
        .unwrap()
        .allow_subscribe("srv://node-1@crirpc.rpc.reply")
        .unwrap()
}

#[tokio::test]
async fn test_unauthorized_send_never_arrives() {
    let world = world(permissions()).await;
    let interface = calculator_interface();

    let calculator = world
        .client
        .proxy(Address::parse(CALCULATOR).unwrap(), interface.descriptor().clone());
    let sum: i64 = calculator.call("add", (1, 2)).await.unwrap();
    assert_eq!(sum, 3, "allowed calls should go through");

    let mailer = world
        .client
        .proxy(Address::parse(MAILER).unwrap(), interface.descriptor().clone());
    let error = mailer.call::<_, i64>("add", (1, 2)).await.unwrap_err();
    assert!(
        matches!(error, RpcError::Transport(BusError::Unauthorized { .. })),
        "got {error:?}"
    );
    assert_eq!(
        world.registry.metrics().calls_dispatched(),
        1,
        "only the allowed call should be dispatched"
    );
}

#[tokio::test]
async fn test_reply_address_needs_subscribe_permission() {
    let bus = Arc::new(MemoryEventBus::new());
    let permissions = Permissions::new().allow_send("srv://*.**").unwrap();
    let session = Arc::new(Session::new(Participant::new("bob"), permissions));
    let secured = Arc::new(SessionEventBus::new(bus, session));

    let error = RpcClient::connect(secured, RpcConfig::new().with_node_id("node-2"))
        .await
        .unwrap_err();
    assert!(
        matches!(error, RpcError::Transport(BusError::Unauthorized { .. })),
        "got {error:?}"
    );
}

#[tokio::test]
async fn test_temporary_grant_is_consumed_once() {
    let world = world(permissions()).await;
    let interface = calculator_interface();
    let mailer = world
        .client
        .proxy(Address::parse(MAILER).unwrap(), interface.descriptor().clone());

    world.session.add_temporary_send_allowed("srv://demo.Mailer/*").unwrap();
    let sum: i64 = mailer.call("add", (2, 2)).await.unwrap();
    assert_eq!(sum, 4, "the grant should admit one call");

    let error = mailer.call::<_, i64>("add", (2, 2)).await.unwrap_err();
    assert!(matches!(error, RpcError::Transport(ref e) if e.is_unauthorized()), "got {error:?}");
}
