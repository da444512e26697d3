//! Performance benchmarks for the task simulator.
//!
//! Run with: `cargo bench`
//! Or for a specific bench: `cargo bench --bench simulation_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use tasksim::{ExperimentConfig, Simulator, Task};

/// A chain of tasks where each depends on the previous one.
fn chain_tasks(len: usize) -> Vec<Task> {
    let mut tasks = vec![Task::new("T0", "H").run_for(1).with_ram(10)];
    for i in 1..len {
        tasks.push(
            Task::new(format!("T{i}"), "H")
                .run_for(1)
                .with_ram(10)
                .after(format!("T{}", i - 1)),
        );
    }
    tasks
}

/// Independent tasks all contending for the same host.
fn contention_tasks(count: usize) -> Vec<Task> {
    (0..count)
        .map(|i| Task::new(format!("T{i}"), "H").run_for(5).with_ram(100))
        .collect()
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain");
    let config = ExperimentConfig::new().with_host("H", 1, 1000);

    for len in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*len as u64));
        group.bench_with_input(BenchmarkId::new("tasks", len), len, |b, &len| {
            b.iter(|| {
                let mut sim = Simulator::new(&config, chain_tasks(len)).unwrap();
                black_box(sim.run(false).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_cpu_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_contention");
    let config = ExperimentConfig::new().with_host("H", 4, 100_000);

    for count in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("tasks", count), count, |b, &count| {
            b.iter(|| {
                let mut sim = Simulator::new(&config, contention_tasks(count)).unwrap();
                black_box(sim.run(false).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_cross_host_transfers(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_host");

    for host_count in [2, 4, 8].iter() {
        group.bench_with_input(
            BenchmarkId::new("hosts", host_count),
            host_count,
            |b, &host_count| {
                let mut config = ExperimentConfig::new();
                for h in 0..host_count {
                    config = config.with_host(format!("H{h}"), 2, 10_000);
                }

                // One producer per host, one consumer pulling from every
                // producer on another host.
                let mut tasks = Vec::new();
                for h in 0..host_count {
                    tasks.push(
                        Task::new(format!("produce{h}"), format!("H{h}"))
                            .run_for(3)
                            .with_ram(100)
                            .with_network_time(2),
                    );
                }
                for h in 0..host_count {
                    let mut consumer = Task::new(format!("consume{h}"), format!("H{h}"))
                        .run_for(2)
                        .with_ram(100);
                    for other in 0..host_count {
                        if other != h {
                            consumer = consumer.after(format!("produce{other}"));
                        }
                    }
                    tasks.push(consumer);
                }

                b.iter(|| {
                    let mut sim = Simulator::new(&config, tasks.clone()).unwrap();
                    black_box(sim.run(false).unwrap());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_chain,
    bench_cpu_contention,
    bench_cross_host_transfers,
);

criterion_main!(benches);
