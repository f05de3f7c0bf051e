//! Benchmarks for the scheduler's bounded-resource primitives.
//!
//! Benchmarks cover:
//! - CappedQueue add/update with eviction
//! - BoundedCache hit and miss paths
//! - Semaphore uncontended and hand-off paths
//! - End-to-end registration and execution of catch-up tasks

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;

use cadence_scheduler::infra::BoundedCache;
use cadence_scheduler::{CappedQueue, ScheduleOptions, Scheduler, Semaphore};
use chrono::{Duration, Utc};
use tokio::runtime::Runtime;

// ============================================================================
// CappedQueue Benchmarks
// ============================================================================

fn bench_capped_queue_add_evict(c: &mut Criterion) {
    let mut group = c.benchmark_group("capped_queue_add_evict");

    for capacity in [100_u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(capacity * 2));
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &capacity| {
            b.iter(|| {
                let mut queue = CappedQueue::new(capacity as usize);
                for i in 0..capacity * 2 {
                    black_box(queue.add(i));
                }
                black_box(queue.front().copied());
            });
        });
    }
    group.finish();
}

fn bench_capped_queue_touch(c: &mut Criterion) {
    let mut group = c.benchmark_group("capped_queue_touch");

    for capacity in [100_u64, 1_000, 10_000] {
        let mut queue = CappedQueue::new(capacity as usize);
        for i in 0..capacity {
            queue.add(i);
        }
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &capacity| {
            let mut next = 0;
            b.iter(|| {
                black_box(queue.update(&next));
                next = (next + 7) % capacity;
            });
        });
    }
    group.finish();
}

// ============================================================================
// Cache Benchmarks
// ============================================================================

fn bench_cache_hit_and_miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("bounded_cache");
    let cache = BoundedCache::new(1_000);
    for i in 0..1_000_u64 {
        cache.insert(i, format!("user-{i}"));
    }

    group.bench_function("hit", |b| {
        let mut key = 0;
        b.iter(|| {
            black_box(cache.get(&key));
            key = (key + 1) % 1_000;
        });
    });
    group.bench_function("miss_insert_evict", |b| {
        let mut key = 1_000;
        b.iter(|| {
            if cache.get(&key).is_none() {
                black_box(cache.insert(key, format!("user-{key}")));
            }
            key += 1;
        });
    });
    group.finish();
}

// ============================================================================
// Semaphore Benchmarks
// ============================================================================

fn bench_semaphore(c: &mut Criterion) {
    let mut group = c.benchmark_group("semaphore");
    let rt = Runtime::new().unwrap();

    group.bench_function("uncontended_acquire_release", |b| {
        let semaphore = Semaphore::new(4).unwrap();
        let semaphore = &semaphore;
        b.to_async(&rt).iter(|| async move {
            semaphore.acquire().await;
            semaphore.release();
        });
    });

    for waiters in [1_usize, 16, 128] {
        group.throughput(Throughput::Elements(waiters as u64));
        group.bench_with_input(BenchmarkId::new("handoff", waiters), &waiters, |b, &waiters| {
            b.to_async(&rt).iter(|| async move {
                let semaphore = Arc::new(Semaphore::default());
                semaphore.acquire().await;
                let handles: Vec<_> = (0..waiters)
                    .map(|_| {
                        let semaphore = Arc::clone(&semaphore);
                        tokio::spawn(async move {
                            semaphore.acquire().await;
                            semaphore.release();
                        })
                    })
                    .collect();
                tokio::task::yield_now().await;
                semaphore.release();
                for handle in handles {
                    handle.await.unwrap();
                }
            });
        });
    }
    group.finish();
}

// ============================================================================
// End-to-End Scheduling
// ============================================================================

fn bench_schedule_catch_up(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule_catch_up");
    let rt = Runtime::new().unwrap();

    for task_count in [10_u64, 100] {
        group.throughput(Throughput::Elements(task_count));
        group.bench_with_input(
            BenchmarkId::from_parameter(task_count),
            &task_count,
            |b, &task_count| {
                b.to_async(&rt).iter(|| async move {
                    let scheduler = Scheduler::new().unwrap();
                    scheduler.set_group_concurrency("bench", Some(4)).unwrap();
                    let last_run = Utc::now() - Duration::days(1);
                    let ids: Vec<_> = (0..task_count)
                        .map(|_| {
                            scheduler
                                .schedule_task_once(
                                    || async { Ok(()) },
                                    "* * * * *",
                                    ScheduleOptions::new()
                                        .with_last_run(last_run)
                                        .with_group("bench"),
                                )
                                .unwrap()
                        })
                        .collect();
                    for id in ids {
                        black_box(scheduler.get_promise(id).unwrap().await);
                    }
                });
            },
        );
    }
    group.finish();
}

// ============================================================================
// Benchmark Groups
// ============================================================================

criterion_group!(
    queue_benches,
    bench_capped_queue_add_evict,
    bench_capped_queue_touch,
    bench_cache_hit_and_miss
);

criterion_group!(semaphore_benches, bench_semaphore);

criterion_group!(scenario_benches, bench_schedule_catch_up);

criterion_main!(queue_benches, semaphore_benches, scenario_benches);
