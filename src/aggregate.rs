// Best lap per driver, overall and within race runs

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::laps::Lap;
use crate::race_runs::RaceRunLap;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct BestTimeRow {
    pub driver: String,
    /// Fastest lap of the session, typically a low-fuel qualifying simulation
    pub best_q_s: f64,
    /// Fastest race-run lap, missing when the driver has no race-run stint
    pub best_rr_s: Option<f64>,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct BestTimes {
    pub rows: Vec<BestTimeRow>,
}

impl BestTimes {
    /// Left join of the per-driver overall best onto the per-driver race-run best,
    /// sorted by overall best (stable, so equal times stay in driver order)
    pub fn from_laps(laps: &[Lap], race_runs: &[RaceRunLap]) -> Self {
        let best_q = min_by_driver(laps.iter().map(|lap| (&lap.driver, lap.lap_time_s)));
        let best_rr: HashMap<&String, f64> =
            min_by_driver(race_runs.iter().map(|lap| (&lap.driver, lap.lap_time_s)))
                .into_iter()
                .collect();

        let mut rows = best_q
            .into_iter()
            .map(|(driver, best_q_s)| BestTimeRow {
                driver: driver.clone(),
                best_q_s,
                best_rr_s: best_rr.get(driver).copied(),
            })
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| a.best_q_s.total_cmp(&b.best_q_s));

        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn fastest_q(&self) -> Option<f64> {
        self.rows.first().map(|row| row.best_q_s)
    }

    pub fn slowest_q(&self) -> Option<f64> {
        self.rows.last().map(|row| row.best_q_s)
    }

    pub fn slowest_rr(&self) -> Option<f64> {
        self.rows
            .iter()
            .filter_map(|row| row.best_rr_s)
            .max_by(|a, b| a.total_cmp(b))
    }
}

fn min_by_driver<'a>(times: impl Iterator<Item = (&'a String, f64)>) -> BTreeMap<&'a String, f64> {
    let mut best: BTreeMap<&String, f64> = BTreeMap::new();
    for (driver, time) in times {
        best.entry(driver)
            .and_modify(|cur| *cur = cur.min(time))
            .or_insert(time);
    }
    best
}
