// Error types for racepace

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum RacePaceError {
    // Errors while loading the lap table
    #[snafu(display("Lap table does not match the expected schema: {reason}"))]
    SchemaMismatch { reason: String },
    #[snafu(display("Error reading lap table"))]
    LapTableIOError { source: io::Error },
    #[snafu(display("Error parsing CSV lap table"))]
    LapTableParseError { source: csv::Error },
    #[snafu(display("Error parsing JSON lap table"))]
    LapTableJsonError { source: serde_json::Error },
    #[snafu(display("Invalid lap time: {value}"))]
    InvalidLapTime { value: String },
    #[snafu(display("No cached lap table for session at {path}"))]
    SessionNotCached { path: String },

    // Config management errors
    #[snafu(display("Could not find application config directory"))]
    NoConfigDir,
    #[snafu(display("Could not find application cache directory"))]
    NoCacheDir,
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },
    #[snafu(display("Invalid parameter: {field} - {reason}"))]
    InvalidParameter { field: String, reason: String },

    // Race-run selection errors
    #[snafu(display("Race-run selector '{name}' is not implemented"))]
    SelectorNotImplemented { name: String },

    // Output errors
    #[snafu(display("Error writing report output"))]
    OutputIOError { source: io::Error },
    #[snafu(display("Chart rendering failed: {reason}"))]
    ChartRenderError { reason: String },
}

impl From<csv::Error> for RacePaceError {
    fn from(value: csv::Error) -> Self {
        RacePaceError::LapTableParseError { source: value }
    }
}
