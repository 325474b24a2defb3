use std::{collections::BTreeMap, sync::Arc};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use core_sim::{MarketData, MarketDataset, MarketEvent, SimConfig};
use runtime::{
    InMemoryRunLogWriter, PeriodicTask, RunId, SeriesSink, SharedSeries, SimulationRun,
    TickOutcome,
};
use strategy::Allocation;

const BENCH_STEPS: usize = 10_000;
const BENCH_TICKERS: usize = 8;

fn synthetic_dataset() -> MarketDataset {
    let timestamps: Vec<String> = (0..BENCH_STEPS).map(|step| format!("t{step}")).collect();
    let prices = (0..BENCH_TICKERS)
        .map(|ticker| {
            let drift = 1.0 + (ticker as f64) * 0.0001;
            let series = (0..BENCH_STEPS)
                .map(|step| 100.0 * drift.powi(step as i32))
                .collect();
            (format!("T{ticker}"), series)
        })
        .collect();
    let events = (0..BENCH_STEPS)
        .step_by(100)
        .map(|step| MarketEvent {
            date: format!("t{step}"),
            title: "checkpoint".to_string(),
            description: format!("step {step}"),
        })
        .collect();

    MarketDataset::new(MarketData { timestamps, prices }, events)
        .expect("synthetic dataset should validate")
}

fn bench_run_throughput(c: &mut Criterion) {
    let dataset = Arc::new(synthetic_dataset());
    let weights: BTreeMap<String, f64> = (0..BENCH_TICKERS)
        .map(|ticker| (format!("T{ticker}"), 1.0 / BENCH_TICKERS as f64))
        .collect();
    let allocation = Allocation::new(weights).expect("allocation should validate");

    let mut group = c.benchmark_group("run_throughput");
    group.throughput(Throughput::Elements(BENCH_STEPS as u64));

    group.bench_function(BenchmarkId::new("on_tick", BENCH_STEPS), |b| {
        b.iter(|| {
            let mut series = SharedSeries::new();
            series.begin_run(RunId(1));
            let mut run = SimulationRun::new(
                RunId(1),
                Arc::clone(&dataset),
                allocation.clone(),
                SimConfig::default(),
                InMemoryRunLogWriter::new(),
                series,
            );
            while run.on_tick() == TickOutcome::Continue {}
            run.on_complete();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_run_throughput);
criterion_main!(benches);
