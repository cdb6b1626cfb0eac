use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use racepace::{
    BestTimes, DispersionSelector, RaceRunParams, RaceRunSelector, RawLap, SessionId,
    SessionReport, TeamTiers, filter_accurate_laps,
};
use std::time::Duration;

const TEAMS: [&str; 10] = [
    "Red Bull Racing",
    "Ferrari",
    "Mercedes",
    "McLaren",
    "Alpine",
    "Alfa Romeo",
    "AlphaTauri",
    "Haas F1 Team",
    "Aston Martin",
    "Williams",
];

/// Twenty drivers, each with a short qualifying-style stint followed by long runs
fn create_session(laps_per_stint: u32, stints: u32) -> Vec<RawLap> {
    let mut laps = Vec::new();
    for driver in 0..20u32 {
        let team = TEAMS[(driver / 2) as usize];
        let mut lap_number = 1;
        for stint in 1..=stints {
            for tyre_life in 1..=laps_per_stint {
                // first stint alternates push laps and cool-down laps
                let lap_time_s = if stint == 1 {
                    if tyre_life % 2 == 0 { 120.0 } else { 85.0 + driver as f64 * 0.05 }
                } else {
                    89.0 + driver as f64 * 0.05 + tyre_life as f64 * 0.04
                };
                laps.push(RawLap {
                    driver: format!("D{:02}", driver),
                    team: team.to_string(),
                    stint: Some(stint),
                    lap_time: Some(Duration::from_secs_f64(lap_time_s)),
                    tyre_life: Some(tyre_life as f64),
                    compound: "MEDIUM".to_string(),
                    lap_number,
                    is_accurate: lap_number % 7 != 0,
                    ..RawLap::default()
                });
                lap_number += 1;
            }
        }
    }
    laps
}

fn bench_race_run_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("race_run_selection");
    let selector = DispersionSelector::new(RaceRunParams::default()).unwrap();

    for laps_per_stint in [5, 15, 30] {
        let laps = filter_accurate_laps(&create_session(laps_per_stint, 3));
        group.bench_with_input(
            BenchmarkId::new("dispersion", laps.len()),
            &laps,
            |b, laps| {
                b.iter(|| black_box(selector.select(black_box(laps)).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_best_times(c: &mut Criterion) {
    let mut group = c.benchmark_group("best_times");
    let selector = DispersionSelector::new(RaceRunParams::default()).unwrap();
    let laps = filter_accurate_laps(&create_session(20, 3));
    let race_runs = selector.select(&laps).unwrap();

    group.bench_function("aggregate", |b| {
        b.iter(|| black_box(BestTimes::from_laps(black_box(&laps), black_box(&race_runs))));
    });

    group.finish();
}

fn bench_session_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_report");
    let selector = DispersionSelector::new(RaceRunParams::default()).unwrap();
    let tiers = TeamTiers::default();
    let raw_laps = create_session(20, 4);

    group.bench_function("build", |b| {
        b.iter(|| {
            black_box(
                SessionReport::build(SessionId::default(), black_box(&raw_laps), &selector, &tiers)
                    .unwrap(),
            )
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_race_run_selection,
    bench_best_times,
    bench_session_report
);
criterion_main!(benches);
