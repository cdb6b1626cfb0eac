// Library interface for racepace
// This allows integration tests and benches to access internal modules

pub mod aggregate;
pub mod config;
pub mod errors;
pub mod laps;
pub mod race_runs;
pub mod render;
pub mod report;
pub mod session;
pub mod tiers;

// Re-export commonly used types
pub use aggregate::{BestTimeRow, BestTimes};
pub use config::ReportConfig;
pub use errors::RacePaceError;
pub use laps::{Lap, filter_accurate_laps};
pub use race_runs::{
    ClassifierSelector, DispersionSelector, RaceRunLap, RaceRunParams, RaceRunSelector,
};
pub use report::{SessionReport, StintSeries, output_dir};
pub use session::{FileCacheSource, LapFileSource, LapSource, RawLap, SessionId};
pub use tiers::{TeamTiers, Tier};
