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

//! Failures reach the caller as the right kind of `RpcError`.

mod common;

use common::{fixture, fixture_with};
use crirpc::service::{MethodDescriptor, ReturnKind};
use crirpc::{RpcConfig, RpcError};
use futures_util::StreamExt;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_application_error_keeps_class_name() {
    let fixture = fixture().await;
    let proxy = fixture.proxy();

    let error = proxy.call::<_, i64>("divide", (1, 0)).await.unwrap_err();
    match &error {
        RpcError::Remote {
            class_name, message, ..
        } => {
            assert_eq!(class_name, "ArithmeticException");
            assert_eq!(message, "division by zero");
        }
        other => panic!("expected a remote error, got {other:?}"),
    }
    assert!(error.is_application_error(), "service errors are application errors");
    assert!(!error.is_transport_error());
}

#[tokio::test]
async fn test_method_missing_on_service() {
    let fixture = fixture().await;
    let descriptor = (**fixture.interface.descriptor())
        .clone()
        .with_method(MethodDescriptor::new("sqrt", &["x"], "(f64,)", ReturnKind::Single));
    let proxy = fixture.client.proxy(fixture.address.clone(), Arc::new(descriptor));

    let error = proxy.call::<_, f64>("sqrt", (2.0,)).await.unwrap_err();
    assert!(matches!(error, RpcError::MissingMethod { .. }), "got {error:?}");
    assert!(error.message().contains("sqrt"));
}

#[tokio::test]
async fn test_unsupported_accept_type_answered_in_json() {
    let fixture = fixture_with(RpcConfig::new().with_accept("application/xml")).await;
    let proxy = fixture.proxy();

    let error = proxy.call::<_, i64>("add", (1, 2)).await.unwrap_err();
    assert!(matches!(error, RpcError::UnsupportedContentType { .. }), "got {error:?}");
}

#[tokio::test]
async fn test_bad_arguments_are_conversion_errors() {
    let fixture = fixture().await;
    let proxy = fixture.proxy();

    let wrong_type = proxy
        .invoke("add", vec![json!("two"), json!(3)])
        .unwrap();
    let crirpc::rpc::ReturnValue::Single(wrong_type) = wrong_type else {
        panic!("add should be a single-value method");
    };
    let error = wrong_type.await.unwrap_err();
    assert_eq!(error.class_name(), "ConversionException", "got {error:?}");

    let crirpc::rpc::ReturnValue::Single(too_few) = proxy.invoke("add", vec![json!(1)]).unwrap() else {
        panic!("add should be a single-value method");
    };
    let error = too_few.await.unwrap_err();
    assert_eq!(error.class_name(), "ConversionException", "got {error:?}");
}

#[tokio::test]
async fn test_timeout_is_a_transport_error() {
    let fixture = fixture_with(
        RpcConfig::new().with_request_timeout(Some(Duration::from_millis(50))),
    )
    .await;
    let proxy = fixture.proxy();

    let error = proxy.call::<_, u64>("slow", (5_000u64,)).await.unwrap_err();
    assert!(matches!(error, RpcError::Timeout { .. }), "got {error:?}");
    assert!(error.is_transport_error());
    assert_eq!(fixture.client.pending_calls(), 0, "timed out calls should be released");
    assert_eq!(fixture.client.metrics().calls_failed(), 1);
}

#[tokio::test]
async fn test_missing_service_without_ack_times_out() {
    let fixture = fixture_with(
        RpcConfig::new()
            .with_ack(false)
            .with_request_timeout(Some(Duration::from_millis(50))),
    )
    .await;
    let absent = crirpc::Address::parse("srv://demo.Absent").unwrap();
    let proxy = fixture
        .client
        .proxy(absent, fixture.interface.descriptor().clone());

    // without an acknowledgement an unheard call only ends by timing out
    let error = proxy.call::<_, i64>("add", (1, 2)).await.unwrap_err();
    assert!(matches!(error, RpcError::Timeout { .. }), "got {error:?}");
}

#[tokio::test]
async fn test_panicking_method_is_answered() {
    let fixture = fixture_with(RpcConfig::new().with_request_timeout(Some(Duration::from_secs(5)))).await;
    let proxy = fixture.proxy();

    let error = proxy.call::<_, i64>("digit", (0usize,)).await.unwrap_err();
    match &error {
        RpcError::Remote {
            class_name, message, ..
        } => {
            assert_eq!(class_name, "PanicException");
            assert!(message.contains("index out of bounds"), "got {message}");
        }
        other => panic!("expected a remote error, got {other:?}"),
    }
    assert!(error.is_application_error());

    let sum: i64 = proxy.call("add", (1, 0)).await.unwrap();
    assert_eq!(sum, 1, "later calls should still be served");
}

#[tokio::test]
async fn test_panicking_stream_ends_with_error() {
    let fixture = fixture().await;
    let proxy = fixture.proxy();

    let items: Vec<_> = tokio::time::timeout(
        Duration::from_secs(5),
        proxy.stream::<_, u32>("count_then_panic", (2,)).collect::<Vec<_>>(),
    )
    .await
    .expect("a panicking stream should still be terminated");

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].as_ref().unwrap(), &0);
    assert_eq!(items[1].as_ref().unwrap(), &1);
    let error = items[2].as_ref().unwrap_err();
    assert_eq!(error.class_name(), "PanicException");
    assert!(error.message().contains("counted past 2"), "got {error:?}");
    assert_eq!(fixture.client.pending_calls(), 0);
}
