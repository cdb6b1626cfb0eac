// Lap filter: accurate laps projected to the columns the analysis works with

use log::{debug, info};
use serde::Serialize;

use crate::session::RawLap;

/// A filtered lap with its lap time converted to seconds
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Lap {
    #[serde(rename = "Driver")]
    pub driver: String,
    #[serde(rename = "Team")]
    pub team: String,
    #[serde(rename = "Stint")]
    pub stint: Option<u32>,
    #[serde(rename = "LapTime")]
    pub lap_time_s: f64,
    #[serde(rename = "TyreLife")]
    pub tyre_life: Option<f64>,
    #[serde(rename = "Compound")]
    pub compound: String,
    #[serde(rename = "SpeedI1")]
    pub speed_i1: Option<f64>,
    #[serde(rename = "SpeedI2")]
    pub speed_i2: Option<f64>,
    #[serde(rename = "SpeedFL")]
    pub speed_fl: Option<f64>,
    #[serde(rename = "SpeedST")]
    pub speed_st: Option<f64>,
    #[serde(rename = "LapNumber")]
    pub lap_number: u32,
}

impl Lap {
    /// The projected column set, in output order
    pub const COLUMNS: [&'static str; 11] = [
        "Driver",
        "Team",
        "Stint",
        "LapTime",
        "TyreLife",
        "Compound",
        "SpeedI1",
        "SpeedI2",
        "SpeedFL",
        "SpeedST",
        "LapNumber",
    ];

    fn from_raw(raw: &RawLap) -> Option<Self> {
        let lap_time = raw.lap_time?;
        Some(Self {
            driver: raw.driver.clone(),
            team: raw.team.clone(),
            stint: raw.stint,
            lap_time_s: lap_time.as_secs_f64(),
            tyre_life: raw.tyre_life,
            compound: raw.compound.clone(),
            speed_i1: raw.speed_i1,
            speed_i2: raw.speed_i2,
            speed_fl: raw.speed_fl,
            speed_st: raw.speed_st,
            lap_number: raw.lap_number,
        })
    }
}

/// Keep the laps the provider flagged accurate and project them to [`Lap`]
pub fn filter_accurate_laps(raw_laps: &[RawLap]) -> Vec<Lap> {
    let laps = raw_laps
        .iter()
        .filter(|raw| raw.is_accurate)
        .filter_map(|raw| {
            let lap = Lap::from_raw(raw);
            if lap.is_none() {
                debug!(
                    "Skipping accurate lap {} of {} without a lap time",
                    raw.lap_number, raw.driver
                );
            }
            lap
        })
        .collect::<Vec<_>>();
    info!(
        "Kept {} accurate laps out of {}",
        laps.len(),
        raw_laps.len()
    );
    laps
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    fn raw_lap(driver: &str, lap_number: u32, lap_time_s: Option<f64>, accurate: bool) -> RawLap {
        RawLap {
            driver: driver.to_string(),
            team: "McLaren".to_string(),
            stint: Some(1),
            lap_time: lap_time_s.map(Duration::from_secs_f64),
            tyre_life: Some(lap_number as f64),
            compound: "MEDIUM".to_string(),
            lap_number,
            is_accurate: accurate,
            ..RawLap::default()
        }
    }

    #[test]
    fn test_inaccurate_laps_dropped() {
        let raw = vec![
            raw_lap("NOR", 1, Some(95.0), false),
            raw_lap("NOR", 2, Some(88.4), true),
            raw_lap("NOR", 3, Some(88.9), true),
        ];

        let laps = filter_accurate_laps(&raw);
        assert_eq!(laps.len(), 2);
        assert_eq!(laps[0].lap_number, 2);
        assert!((laps[0].lap_time_s - 88.4).abs() < 1e-9);
    }

    #[test]
    fn test_accurate_lap_without_time_skipped() {
        let raw = vec![raw_lap("NOR", 1, None, true)];
        assert!(filter_accurate_laps(&raw).is_empty());
    }

    #[test]
    fn test_projected_columns() {
        let laps = filter_accurate_laps(&[raw_lap("RIC", 4, Some(89.0), true)]);

        let mut writer = csv::Writer::from_writer(Vec::new());
        for lap in &laps {
            writer.serialize(lap).unwrap();
        }
        let output = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let header = output.lines().next().unwrap();

        assert_eq!(header, Lap::COLUMNS.join(","));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_filter_keeps_only_accurate_non_negative_laps(
            rows in prop::collection::vec((0.0f64..200.0, any::<bool>()), 0..50),
        ) {
            let raw = rows
                .iter()
                .enumerate()
                .map(|(idx, (time, accurate))| raw_lap("ALO", idx as u32 + 1, Some(*time), *accurate))
                .collect::<Vec<_>>();

            let laps = filter_accurate_laps(&raw);

            // Property: exactly the accurate rows survive, each with a non-negative time in seconds
            prop_assert_eq!(laps.len(), rows.iter().filter(|(_, accurate)| *accurate).count());
            for lap in &laps {
                prop_assert!(lap.lap_time_s >= 0.);
                prop_assert!(lap.lap_time_s.is_finite());
            }
        }
    }
}
