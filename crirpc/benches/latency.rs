//! Latency benchmarks for crirpc
//!
//! Measures call latency over the in-process bus:
//! - Single-value round trip
//! - Unit round trip without acknowledgement
//! - Streaming call of varying length

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use crirpc::address::Address;
use crirpc::bus::MemoryEventBus;
use crirpc::rpc::{RpcClient, ServiceProxy};
use crirpc::service::{ServiceError, ServiceInterface, ServiceRegistry};
use crirpc::RpcConfig;
use futures_util::StreamExt;
use std::sync::Arc;

struct Echo;

/// Registry, client and proxy kept alive for the whole benchmark.
struct Setup {
    _registry: ServiceRegistry,
    _client: RpcClient,
    proxy: ServiceProxy,
}

async fn setup(config: RpcConfig) -> Setup {
    let bus = Arc::new(MemoryEventBus::new());
    let interface = Arc::new(
        ServiceInterface::<Echo>::builder("bench.Echo")
            .single("echo", &["text"], |_e, (text,): (String,)| async move { Ok(text) })
            .unit("ping", &[], |_e, (): ()| async move { Ok(()) })
            .stream("count", &["to"], |_e, (to,): (u32,)| {
                futures_util::stream::iter((0..to).map(Ok::<_, ServiceError>))
            })
            .build(),
    );
    let address = Address::parse("srv://bench.Echo").unwrap();

    let registry = ServiceRegistry::new(bus.clone());
    registry
        .register(address.clone(), interface.clone(), Arc::new(Echo))
        .await
        .unwrap();
    let client = RpcClient::connect(bus, config).await.unwrap();
    let proxy = client.proxy(address, interface.descriptor().clone());
    Setup {
        _registry: registry,
        _client: client,
        proxy,
    }
}

/// Benchmark single-value round trips with payloads of different sizes
fn bench_round_trip(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let setup = rt.block_on(setup(RpcConfig::default()));
    let mut group = c.benchmark_group("latency_round_trip");

    for size in [16usize, 1024, 16 * 1024] {
        let text = "x".repeat(size);
        group.bench_with_input(BenchmarkId::from_parameter(format!("{size}bytes")), &text, |b, text| {
            b.to_async(&rt).iter(|| async {
                let echoed: String = setup.proxy.call("echo", (text.as_str(),)).await.unwrap();
                echoed
            });
        });
    }

    group.finish();
}

/// Benchmark unit calls sent without acknowledgement
fn bench_unit_without_ack(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let setup = rt.block_on(setup(RpcConfig::new().with_ack(false)));

    c.bench_function("latency_unit_no_ack", |b| {
        b.to_async(&rt)
            .iter(|| async { setup.proxy.call::<_, ()>("ping", ()).await.unwrap() });
    });
}

/// Benchmark streams from first request to completion
fn bench_stream(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let setup = rt.block_on(setup(RpcConfig::default()));
    let mut group = c.benchmark_group("latency_stream");

    let proxy = &setup.proxy;
    for items in [1u32, 10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(items), &items, |b, &items| {
            b.to_async(&rt)
                .iter(|| async move { proxy.stream::<_, u32>("count", (items,)).count().await });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_round_trip, bench_unit_without_ack, bench_stream);
criterion_main!(benches);
