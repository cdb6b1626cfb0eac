// Session report: the whole analysis of one session and the files it produces

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::{debug, info, warn};

use crate::RacePaceError;
use crate::aggregate::BestTimes;
use crate::laps::{Lap, filter_accurate_laps};
use crate::race_runs::{RaceRunLap, RaceRunSelector, StintKey};
use crate::render::{
    BestTimesChart, ChartKind, ChartStyle, DegradationChart, format_lap_time, render_chart,
};
use crate::session::{RawLap, SessionId};
use crate::tiers::{TeamTiers, Tier};

/// Race-run laps of one stint, as tyre life against lap time
#[derive(Clone, Debug, PartialEq)]
pub struct StintSeries {
    pub driver: String,
    pub stint: u32,
    pub team: String,
    pub compound: String,
    pub points: Vec<(f64, f64)>,
}

impl StintSeries {
    pub fn label(&self) -> String {
        format!("{}, {}", self.driver, self.compound)
    }
}

/// Group race-run laps into one series per stint, in order of first appearance.
/// Team and compound come from the first lap of the stint; laps without tyre life
/// have no x position and are left out of the points.
pub fn stint_series(race_runs: &[RaceRunLap]) -> Vec<StintSeries> {
    let mut order: Vec<StintKey> = Vec::new();
    let mut series: BTreeMap<StintKey, StintSeries> = BTreeMap::new();

    for lap in race_runs {
        let key = lap.stint_key();
        let entry = series.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            StintSeries {
                driver: lap.driver.clone(),
                stint: lap.stint,
                team: lap.team.clone(),
                compound: lap.compound.clone(),
                points: Vec::new(),
            }
        });
        if let Some(tyre_life) = lap.tyre_life {
            entry.points.push((tyre_life, lap.lap_time_s));
        }
    }

    order
        .into_iter()
        .filter_map(|key| series.remove(&key))
        .collect()
}

/// Split stint series by team tier. Series of teams missing from the roster are
/// dropped without error.
pub fn partition_by_tier(
    series: Vec<StintSeries>,
    tiers: &TeamTiers,
) -> BTreeMap<Tier, Vec<StintSeries>> {
    let mut partition: BTreeMap<Tier, Vec<StintSeries>> = BTreeMap::new();
    for stint in series {
        match tiers.tier_of(&stint.team) {
            Some(tier) => partition.entry(tier).or_default().push(stint),
            None => debug!(
                "Team {:?} of {} stint {} has no tier, leaving it out of the degradation charts",
                stint.team, stint.driver, stint.stint
            ),
        }
    }
    partition
}

/// `<root>/<year>/<event>/<session>`
pub fn output_dir(root: &Path, session: &SessionId) -> PathBuf {
    root.join(session.relative_path())
}

pub struct SessionReport {
    pub session: SessionId,
    pub laps: Vec<Lap>,
    pub race_runs: Vec<RaceRunLap>,
    pub best_times: BestTimes,
    pub tiers: BTreeMap<Tier, Vec<StintSeries>>,
}

impl SessionReport {
    pub fn build(
        session: SessionId,
        raw_laps: &[RawLap],
        selector: &dyn RaceRunSelector,
        tiers: &TeamTiers,
    ) -> Result<Self, RacePaceError> {
        let laps = filter_accurate_laps(raw_laps);
        debug!("Selecting race runs with the {} selector", selector.name());
        let race_runs = selector.select(&laps)?;
        let best_times = BestTimes::from_laps(&laps, &race_runs);
        let tiers = partition_by_tier(stint_series(&race_runs), tiers);

        Ok(Self {
            session,
            laps,
            race_runs,
            best_times,
            tiers,
        })
    }

    /// Charts this report would write: best times whenever any driver set a lap, then
    /// one degradation chart per tier holding at least one plottable race-run stint
    pub fn planned_charts(&self) -> Vec<ChartKind> {
        let mut charts = Vec::new();
        if !self.best_times.is_empty() {
            charts.push(ChartKind::BestTimes);
        }
        charts.extend(
            Tier::ALL
                .iter()
                .filter(|tier| {
                    self.tiers
                        .get(*tier)
                        .is_some_and(|series| series.iter().any(|s| !s.points.is_empty()))
                })
                .map(|tier| ChartKind::Degradation(*tier)),
        );
        charts
    }

    /// Render every planned chart into `dir`, creating it if needed
    pub fn write_charts(&self, dir: &Path, style: &ChartStyle) -> Result<Vec<PathBuf>, RacePaceError> {
        let charts = self.planned_charts();
        if charts.is_empty() {
            warn!("No laps to chart for {}", self.session);
            return Ok(Vec::new());
        }
        fs::create_dir_all(dir).map_err(|e| RacePaceError::OutputIOError { source: e })?;

        let mut written = Vec::new();
        for kind in charts {
            let path = dir.join(kind.file_name(style.format));
            match kind {
                ChartKind::BestTimes => {
                    render_chart(&path, style, &BestTimesChart {
                        best: &self.best_times,
                    })?;
                }
                ChartKind::Degradation(tier) => {
                    let series = self.tiers.get(&tier).map(Vec::as_slice).unwrap_or_default();
                    render_chart(&path, style, &DegradationChart { tier, series })?;
                }
            }
            info!("Wrote {:?}", path);
            written.push(path);
        }
        Ok(written)
    }

    /// Best-times table as CSV, times formatted `MM:SS.mmm`
    pub fn write_best_times<W: Write>(&self, writer: W) -> Result<(), RacePaceError> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(["driver", "best_q", "best_rr"])?;
        for row in &self.best_times.rows {
            writer.write_record([
                row.driver.clone(),
                format_lap_time(row.best_q_s),
                row.best_rr_s.map(format_lap_time).unwrap_or_default(),
            ])?;
        }
        writer
            .flush()
            .map_err(|e| RacePaceError::OutputIOError { source: e })
    }

    pub fn write_best_times_csv(&self, path: &Path) -> Result<(), RacePaceError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| RacePaceError::OutputIOError { source: e })?;
        }
        let file = File::create(path).map_err(|e| RacePaceError::OutputIOError { source: e })?;
        self.write_best_times(file)
    }

    /// Race-run laps as CSV, one row per lap
    pub fn write_race_runs<W: Write>(&self, writer: W) -> Result<(), RacePaceError> {
        let mut writer = csv::Writer::from_writer(writer);
        for lap in &self.race_runs {
            writer.serialize(lap)?;
        }
        writer
            .flush()
            .map_err(|e| RacePaceError::OutputIOError { source: e })
    }

    /// Filtered laps as CSV, one row per lap with the projected columns
    pub fn write_laps<W: Write>(&self, writer: W) -> Result<(), RacePaceError> {
        let mut writer = csv::Writer::from_writer(writer);
        for lap in &self.laps {
            writer.serialize(lap)?;
        }
        writer
            .flush()
            .map_err(|e| RacePaceError::OutputIOError { source: e })
    }

    pub fn race_run_stint_count(&self) -> usize {
        self.race_runs.iter().map(RaceRunLap::stint_key).unique().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race_runs::{ClassifierSelector, DispersionSelector, RaceRunParams};
    use std::time::Duration;

    fn race_run(driver: &str, team: &str, stint: u32, tyre_life: f64, lap_time_s: f64) -> RaceRunLap {
        RaceRunLap {
            driver: driver.to_string(),
            team: team.to_string(),
            stint,
            lap_time_s,
            tyre_life: Some(tyre_life),
            compound: "MEDIUM".to_string(),
            stint_std_s: 0.3,
        }
    }

    fn raw(driver: &str, team: &str, stint: u32, lap_number: u32, lap_time_s: f64) -> RawLap {
        RawLap {
            driver: driver.to_string(),
            team: team.to_string(),
            stint: Some(stint),
            lap_time: Some(Duration::from_secs_f64(lap_time_s)),
            tyre_life: Some(lap_number as f64),
            compound: "SOFT".to_string(),
            lap_number,
            is_accurate: true,
            ..RawLap::default()
        }
    }

    #[test]
    fn test_stint_series_first_appearance_order() {
        let laps = vec![
            race_run("SAI", "Ferrari", 2, 1., 90.1),
            race_run("LEC", "Ferrari", 1, 1., 90.0),
            race_run("SAI", "Ferrari", 2, 2., 90.3),
            race_run("LEC", "Ferrari", 1, 2., 90.2),
        ];

        let series = stint_series(&laps);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].driver, "SAI");
        assert_eq!(series[0].points, vec![(1., 90.1), (2., 90.3)]);
        assert_eq!(series[1].label(), "LEC, MEDIUM");
    }

    #[test]
    fn test_unknown_team_excluded_from_all_tiers() {
        let laps = vec![
            race_run("VER", "Red Bull Racing", 1, 1., 89.0),
            race_run("XXX", "Andretti", 1, 1., 90.0),
        ];

        let partition = partition_by_tier(stint_series(&laps), &TeamTiers::default());
        assert_eq!(partition.len(), 1);
        assert!(
            partition
                .values()
                .flatten()
                .all(|series| series.team != "Andretti")
        );
    }

    #[test]
    fn test_planned_charts_skip_empty_tiers() {
        let raw_laps = vec![
            raw("VER", "Red Bull Racing", 1, 1, 90.0),
            raw("VER", "Red Bull Racing", 1, 2, 90.1),
            raw("VER", "Red Bull Racing", 1, 3, 90.2),
            raw("TSU", "AlphaTauri", 1, 1, 90.05),
            raw("TSU", "AlphaTauri", 1, 2, 90.15),
        ];
        let selector = DispersionSelector::new(RaceRunParams::default()).unwrap();

        let report = SessionReport::build(
            SessionId::default(),
            &raw_laps,
            &selector,
            &TeamTiers::default(),
        )
        .unwrap();

        assert_eq!(
            report.planned_charts(),
            vec![
                ChartKind::BestTimes,
                ChartKind::Degradation(Tier::Top),
                ChartKind::Degradation(Tier::Bottom),
            ]
        );
    }

    #[test]
    fn test_empty_race_runs_tolerated() {
        // a single lap per stint never qualifies
        let raw_laps = vec![
            raw("NOR", "McLaren", 1, 1, 88.0),
            raw("NOR", "McLaren", 2, 1, 87.5),
        ];
        let selector = DispersionSelector::new(RaceRunParams::default()).unwrap();

        let report = SessionReport::build(
            SessionId::default(),
            &raw_laps,
            &selector,
            &TeamTiers::default(),
        )
        .unwrap();

        assert!(report.race_runs.is_empty());
        assert_eq!(report.best_times.len(), 1);
        assert_eq!(report.best_times.rows[0].best_rr_s, None);
        assert_eq!(report.planned_charts(), vec![ChartKind::BestTimes]);
    }

    #[test]
    fn test_classifier_selector_fails_build() {
        let raw_laps = vec![raw("NOR", "McLaren", 1, 1, 88.0)];
        let result = SessionReport::build(
            SessionId::default(),
            &raw_laps,
            &ClassifierSelector,
            &TeamTiers::default(),
        );
        assert!(matches!(
            result,
            Err(RacePaceError::SelectorNotImplemented { .. })
        ));
    }

    #[test]
    fn test_best_times_csv() {
        let raw_laps = vec![
            raw("HAM", "Mercedes", 1, 1, 87.25),
            raw("RUS", "Mercedes", 1, 1, 87.5),
            raw("RUS", "Mercedes", 1, 2, 88.0),
            raw("RUS", "Mercedes", 1, 3, 88.1),
        ];
        let selector = DispersionSelector::new(RaceRunParams::default()).unwrap();
        let report = SessionReport::build(
            SessionId::default(),
            &raw_laps,
            &selector,
            &TeamTiers::default(),
        )
        .unwrap();

        let mut output = Vec::new();
        report.write_best_times(&mut output).unwrap();
        let output = String::from_utf8(output).unwrap();
        let lines = output.lines().collect::<Vec<_>>();

        assert_eq!(lines[0], "driver,best_q,best_rr");
        assert_eq!(lines[1], "HAM,01:27.250,");
        assert_eq!(lines[2], "RUS,01:27.500,01:27.500");
    }

    #[test]
    fn test_output_dir() {
        let session = SessionId::new(2023, "Monza", "FP3");
        assert_eq!(
            output_dir(Path::new("data"), &session),
            PathBuf::from("data").join("2023").join("Monza").join("FP3")
        );
    }
}
