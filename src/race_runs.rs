// Race-run selection: full-fuel stints told apart from qualifying simulations by lap-time
// dispersion alone, since no fuel load signal is available

use std::collections::BTreeMap;

use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::errors::RacePaceError;
use crate::laps::Lap;

/// Stints with a lap-time standard deviation at or above this are not race runs (seconds)
pub const DEFAULT_MAX_STINT_STD_S: f64 = 17.;
/// Laps slower than the pooled mean by more than this many pooled standard deviations
/// are dropped
pub const DEFAULT_OUTLIER_STD_FACTOR: f64 = 0.5;

/// A stint is identified by driver and stint number
pub type StintKey = (String, u32);

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct RaceRunParams {
    pub max_stint_std_s: f64,
    pub outlier_std_factor: f64,
}

impl Default for RaceRunParams {
    fn default() -> Self {
        Self {
            max_stint_std_s: DEFAULT_MAX_STINT_STD_S,
            outlier_std_factor: DEFAULT_OUTLIER_STD_FACTOR,
        }
    }
}

impl RaceRunParams {
    pub fn validate(&self) -> Result<(), RacePaceError> {
        let check = |field: &str, value: f64| {
            if value.is_finite() && value > 0. {
                Ok(())
            } else {
                Err(RacePaceError::InvalidParameter {
                    field: field.to_string(),
                    reason: format!("must be a positive number, got {}", value),
                })
            }
        };
        check("max_stint_std_s", self.max_stint_std_s)?;
        check("outlier_std_factor", self.outlier_std_factor)
    }
}

/// A lap belonging to a stint classified as a race run
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct RaceRunLap {
    pub driver: String,
    pub team: String,
    pub stint: u32,
    pub lap_time_s: f64,
    pub tyre_life: Option<f64>,
    pub compound: String,
    /// Lap-time standard deviation of the whole stint
    pub stint_std_s: f64,
}

impl RaceRunLap {
    fn new(lap: &Lap, stint: u32, stint_std_s: f64) -> Self {
        Self {
            driver: lap.driver.clone(),
            team: lap.team.clone(),
            stint,
            lap_time_s: lap.lap_time_s,
            tyre_life: lap.tyre_life,
            compound: lap.compound.clone(),
            stint_std_s,
        }
    }

    pub fn stint_key(&self) -> StintKey {
        (self.driver.clone(), self.stint)
    }
}

/// Strategy for picking race-run laps out of a session
pub trait RaceRunSelector {
    fn name(&self) -> &'static str;

    fn select(&self, laps: &[Lap]) -> Result<Vec<RaceRunLap>, RacePaceError>;
}

/// Classifies stints by lap-time standard deviation, then trims slow outliers
pub struct DispersionSelector {
    params: RaceRunParams,
}

impl DispersionSelector {
    pub fn new(params: RaceRunParams) -> Result<Self, RacePaceError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Stints whose lap-time standard deviation is strictly below the threshold,
    /// with that deviation
    pub fn race_run_stints(&self, laps: &[Lap]) -> BTreeMap<StintKey, f64> {
        group_stints(laps)
            .into_iter()
            .filter_map(|(key, stint_laps)| {
                let times = stint_laps.iter().map(|lap| lap.lap_time_s).collect_vec();
                let std = sample_std(&times)?;
                (std < self.params.max_stint_std_s).then_some((key, std))
            })
            .collect()
    }
}

impl RaceRunSelector for DispersionSelector {
    fn name(&self) -> &'static str {
        "dispersion"
    }

    fn select(&self, laps: &[Lap]) -> Result<Vec<RaceRunLap>, RacePaceError> {
        let race_run_stints = self.race_run_stints(laps);

        // join the surviving stints back to their laps, ordered by driver then stint
        let stints = group_stints(laps);
        let joined = race_run_stints
            .iter()
            .flat_map(|(key, std)| {
                stints
                    .get(key)
                    .into_iter()
                    .flatten()
                    .map(move |lap| RaceRunLap::new(lap, key.1, *std))
            })
            .collect_vec();

        let joined_count = joined.len();
        let kept = remove_outliers(joined, self.params.outlier_std_factor);
        debug!(
            "Outlier filter removed {} of {} race-run laps",
            joined_count - kept.len(),
            joined_count
        );

        if kept.is_empty() {
            warn!(
                "No stint qualifies as a race run (std < {}s)",
                self.params.max_stint_std_s
            );
        } else {
            info!(
                "Found {} race-run stints with {} laps",
                race_run_stints.len(),
                kept.len()
            );
        }
        Ok(kept)
    }
}

/// Placeholder for a learned classifier that would label race-run laps directly.
/// Selecting with it always fails.
pub struct ClassifierSelector;

impl RaceRunSelector for ClassifierSelector {
    fn name(&self) -> &'static str {
        "classifier"
    }

    fn select(&self, _laps: &[Lap]) -> Result<Vec<RaceRunLap>, RacePaceError> {
        Err(RacePaceError::SelectorNotImplemented {
            name: self.name().to_string(),
        })
    }
}

/// Drop laps slower than the pooled mean by more than `factor` pooled standard deviations.
///
/// The comparison is signed: laps faster than the mean are always kept. The pooled
/// statistics move once laps are removed, so applying the filter again can remove more.
pub fn remove_outliers(laps: Vec<RaceRunLap>, factor: f64) -> Vec<RaceRunLap> {
    let times = laps.iter().map(|lap| lap.lap_time_s).collect_vec();
    let (Some(mean), Some(std)) = (mean(&times), sample_std(&times)) else {
        return laps;
    };
    laps.into_iter()
        .filter(|lap| lap.lap_time_s - mean <= factor * std)
        .collect()
}

fn group_stints(laps: &[Lap]) -> BTreeMap<StintKey, Vec<&Lap>> {
    laps.iter()
        .filter_map(|lap| lap.stint.map(|stint| ((lap.driver.clone(), stint), lap)))
        .into_group_map()
        .into_iter()
        .collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator), undefined below two values
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}
