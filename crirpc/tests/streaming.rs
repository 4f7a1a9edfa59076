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

//! Streaming calls: completion, errors and cancellation.

mod common;

use common::{eventually, fixture};
use crirpc::rpc::RpcClient;
use crirpc::{RpcConfig, RpcError};
use futures_util::StreamExt;
use std::time::Duration;

#[tokio::test]
async fn test_stream_ends_with_complete() {
    let fixture = fixture().await;
    let proxy = fixture.proxy();

    let items: Vec<u32> = proxy
        .stream::<_, u32>("count", (4,))
        .map(|item| item.unwrap())
        .collect()
        .await;
    assert_eq!(items, vec![0, 1, 2, 3], "items should arrive in order");
    assert_eq!(fixture.client.pending_calls(), 0, "a completed stream should be released");
}

#[tokio::test]
async fn test_empty_stream() {
    let fixture = fixture().await;
    let proxy = fixture.proxy();

    let mut stream = proxy.stream::<_, u32>("count", (0,));
    assert!(stream.next().await.is_none(), "an empty stream should end at once");
}

#[tokio::test]
async fn test_stream_error_ends_the_stream() {
    let fixture = fixture().await;
    let proxy = fixture.proxy();

    let mut stream = proxy.stream::<_, u32>("count_then_fail", (2,));
    assert_eq!(stream.next().await.unwrap().unwrap(), 0);
    assert_eq!(stream.next().await.unwrap().unwrap(), 1);

    let error = stream.next().await.unwrap().unwrap_err();
    assert!(
        matches!(&error, RpcError::Remote { class_name, .. } if class_name == "Overflow"),
        "got {error:?}"
    );
    assert!(stream.next().await.is_none(), "nothing follows an error");
}

#[tokio::test]
async fn test_dropping_a_stream_stops_the_service_side() {
    let fixture = fixture().await;
    let proxy = fixture.proxy();
    let supervisor = fixture.registry.get(&fixture.address).unwrap();

    let mut ticks = proxy.stream::<_, u64>("ticks", ());
    assert_eq!(ticks.next().await.unwrap().unwrap(), 0);
    assert_eq!(ticks.next().await.unwrap().unwrap(), 1);
    assert_eq!(supervisor.active_streams(), 1);

    drop(ticks);
    assert!(
        eventually(|| supervisor.active_streams() == 0).await,
        "the service should stop producing once the caller is gone"
    );
    assert_eq!(fixture.client.pending_calls(), 0);
    assert_eq!(fixture.client.metrics().cancellations(), 1);
}

#[tokio::test]
async fn test_explicit_cancel_mid_stream() {
    let fixture = fixture().await;
    let proxy = fixture.proxy();
    let supervisor = fixture.registry.get(&fixture.address).unwrap();

    let mut ticks = proxy.stream::<_, u64>("ticks", ());
    ticks.next().await.unwrap().unwrap();
    ticks.cancel("enough");

    // ticks already in flight may still be delivered ahead of the cancellation
    let error = loop {
        match ticks.next().await {
            Some(Ok(_)) => continue,
            Some(Err(e)) => break e,
            None => panic!("stream ended without an error"),
        }
    };
    assert!(matches!(error, RpcError::Canceled { ref reason } if reason == "enough"));
    assert!(ticks.next().await.is_none());
    assert!(eventually(|| supervisor.active_streams() == 0).await);
}

#[tokio::test]
async fn test_cancel_before_poll_sends_nothing() {
    let fixture = fixture().await;
    let proxy = fixture.proxy();

    let mut ticks = proxy.stream::<_, u64>("ticks", ());
    ticks.cancel("never mind");
    let error = ticks.next().await.unwrap().unwrap_err();
    assert!(error.is_canceled());

    proxy.call::<_, i64>("add", (1, 1)).await.unwrap();
    assert_eq!(fixture.registry.metrics().calls_dispatched(), 1, "only the add call should arrive");
}

#[tokio::test]
async fn test_unregister_fails_live_streams() {
    let fixture = fixture().await;
    let proxy = fixture.proxy();

    let mut ticks = proxy.stream::<_, u64>("ticks", ());
    ticks.next().await.unwrap().unwrap();

    fixture.registry.unregister(&fixture.address).await.unwrap();
    let error = loop {
        match ticks.next().await {
            Some(Ok(_)) => continue,
            Some(Err(e)) => break e,
            None => panic!("stream ended without an error"),
        }
    };
    assert!(error.is_canceled(), "got {error:?}");
}

#[tokio::test]
async fn test_cancel_only_stops_the_callers_own_stream() {
    let fixture = fixture().await;
    let other = RpcClient::connect(fixture.bus.clone(), RpcConfig::default())
        .await
        .unwrap();
    let supervisor = fixture.registry.get(&fixture.address).unwrap();

    let mut mine = fixture.proxy().stream::<_, u64>("ticks", ());
    let mut theirs = other
        .proxy(fixture.address.clone(), fixture.interface.descriptor().clone())
        .stream::<_, u64>("ticks", ());
    mine.next().await.unwrap().unwrap();
    theirs.next().await.unwrap().unwrap();
    assert_eq!(
        mine.correlation_id(),
        theirs.correlation_id(),
        "each client numbers its own calls"
    );
    assert_eq!(supervisor.active_streams(), 2);

    drop(mine);
    assert!(eventually(|| supervisor.active_streams() == 1).await);

    let next = tokio::time::timeout(Duration::from_secs(1), theirs.next())
        .await
        .expect("the other client's stream should keep producing");
    assert!(next.unwrap().is_ok());

    drop(theirs);
    assert!(eventually(|| supervisor.active_streams() == 0).await);
}
