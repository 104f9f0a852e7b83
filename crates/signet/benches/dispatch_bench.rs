//! Benchmarks for dispatch and binding churn.
//!
//! Run with: cargo bench -p signet --bench dispatch_bench

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use signet::{Listener, Scope, Signal};
use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;

fn signal_with(listeners: usize) -> (Signal<u64>, Rc<Cell<u64>>) {
    let signal = Signal::new();
    let sum = Rc::new(Cell::new(0));
    for _ in 0..listeners {
        let s = Rc::clone(&sum);
        signal
            .add(Listener::unscoped(move |n: u64| s.set(s.get().wrapping_add(n))), Scope::none())
            .expect("fresh signal accepts listeners");
    }
    (signal, sum)
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("signal/dispatch");

    for n in [1usize, 8, 64, 512] {
        group.throughput(Throughput::Elements(n as u64));
        let (signal, sum) = signal_with(n);
        group.bench_with_input(BenchmarkId::new("listeners", n), &(), |b, _| {
            b.iter(|| {
                signal.dispatch(black_box(1)).expect("live signal");
                black_box(sum.get())
            })
        });
    }

    group.finish();
}

fn bench_add_once_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("signal/add_once");

    for n in [1usize, 8, 64] {
        group.throughput(Throughput::Elements(n as u64));
        let signal: Signal<u64> = Signal::new();
        let listeners: Vec<Listener<u64>> = (0..n)
            .map(|_| Listener::unscoped(|n: u64| drop(black_box(n))))
            .collect();
        group.bench_with_input(BenchmarkId::new("listeners", n), &(), |b, _| {
            b.iter(|| {
                for l in &listeners {
                    signal.add_once(l.clone(), Scope::none()).expect("live signal");
                }
                signal.dispatch(black_box(1)).expect("live signal");
            })
        });
    }

    group.finish();
}

fn bench_binding_churn(c: &mut Criterion) {
    let (signal, _) = signal_with(32);
    let listener: Listener<u64> = Listener::unscoped(|_| {});
    c.bench_function("binding/add_dispose", |b| {
        b.iter(|| {
            let binding = signal
                .add(listener.clone(), Scope::none())
                .expect("live signal");
            binding.dispose().expect("first dispose");
        })
    });
}

criterion_group!(
    benches,
    bench_dispatch,
    bench_add_once_dispatch,
    bench_binding_churn
);
criterion_main!(benches);
