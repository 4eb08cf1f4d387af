use criterion::{black_box, BatchSize, BenchmarkId, Criterion};
use criterion::{criterion_group, criterion_main};
use tempfile::tempdir;

use meterlog::core::{Tick, TICK_SECS};
use meterlog::table::{PartitionKey, PartitionStore, WriteDriver};

fn bench_tick_insert(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");
    let key = PartitionKey::new(2023, 1).expect("key");
    let driver = WriteDriver::default();

    let mut group = c.benchmark_group("tick_insert");
    for &ticks in &[24_u64, 744] {
        group.bench_with_input(BenchmarkId::from_parameter(ticks), &ticks, |b, &ticks| {
            b.iter_batched(
                || {
                    let dir = tempdir().expect("tempdir");
                    let handle = runtime
                        .block_on(PartitionStore::new(dir.path()).open_partition(key))
                        .expect("open");
                    (dir, handle)
                },
                |(_dir, handle)| {
                    runtime.block_on(async {
                        for index in 0..ticks {
                            let tick = Tick {
                                index,
                                unix_secs: 1_672_560_000 + index as i64 * TICK_SECS,
                            };
                            black_box(driver.write_tick(&handle, tick).await);
                        }
                        handle.finalize().await.expect("finalize");
                    });
                },
                BatchSize::PerIteration,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_tick_insert);
criterion_main!(benches);
