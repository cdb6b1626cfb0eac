// Raw lap rows and the session identifiers they are cached under

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::RacePaceError;

/// Columns every cached lap table must provide, named the way the telemetry provider
/// exports them
pub const REQUIRED_COLUMNS: [&str; 12] = [
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
    "IsAccurate",
];

/// Identifies one session of one event, e.g. 2022 / Abu Dhabi / FP2
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId {
    pub year: u32,
    pub event: String,
    pub session: String,
}

impl SessionId {
    pub fn new(year: u32, event: impl Into<String>, session: impl Into<String>) -> Self {
        Self {
            year,
            event: event.into(),
            session: session.into(),
        }
    }

    /// `<year>/<event>/<session>`, used both for the lap cache and the report output
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.year.to_string())
            .join(&self.event)
            .join(&self.session)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new(2022, "Abu Dhabi", "FP2")
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.year, self.event, self.session)
    }
}

/// One lap exactly as the lap cache delivers it
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawLap {
    pub driver: String,
    pub team: String,
    /// Stint number, missing for laps the provider could not attribute
    pub stint: Option<u32>,
    pub lap_time: Option<Duration>,
    /// Laps completed on the current tyre set
    pub tyre_life: Option<f64>,
    pub compound: String,
    /// Speed trap at intermediate 1 (km/h)
    pub speed_i1: Option<f64>,
    /// Speed trap at intermediate 2 (km/h)
    pub speed_i2: Option<f64>,
    /// Speed at the finish line (km/h)
    pub speed_fl: Option<f64>,
    /// Speed on the longest straight (km/h)
    pub speed_st: Option<f64>,
    pub lap_number: u32,
    /// Set by the provider for laps that are not in/out laps, not under a safety car
    /// and have consistent timing data
    pub is_accurate: bool,
}

/// A single field of a lap table, independent of the file format it was read from
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Flag(bool),
    Text(String),
    Missing,
}

impl Cell {
    pub fn from_text(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            Cell::Missing
        } else {
            Cell::Text(text.to_string())
        }
    }

    fn is_missing_marker(text: &str) -> bool {
        matches!(text.trim(), "" | "NaN" | "nan" | "NaT" | "None" | "null")
    }
}

impl RawLap {
    /// Build a lap from a row accessor. `field` returns `None` when the column does not
    /// exist at all, which is reported as a schema mismatch.
    pub fn from_cells<'a, F>(field: F) -> Result<Self, RacePaceError>
    where
        F: Fn(&str) -> Option<&'a Cell>,
    {
        let get = |name: &str| -> Result<&'a Cell, RacePaceError> {
            field(name).ok_or_else(|| RacePaceError::SchemaMismatch {
                reason: format!("missing column {}", name),
            })
        };

        Ok(Self {
            driver: cell_text(get("Driver")?),
            team: cell_text(get("Team")?),
            stint: cell_count("Stint", get("Stint")?)?,
            lap_time: parse_lap_time(get("LapTime")?)?,
            tyre_life: cell_float("TyreLife", get("TyreLife")?)?,
            compound: cell_text(get("Compound")?),
            speed_i1: cell_float("SpeedI1", get("SpeedI1")?)?,
            speed_i2: cell_float("SpeedI2", get("SpeedI2")?)?,
            speed_fl: cell_float("SpeedFL", get("SpeedFL")?)?,
            speed_st: cell_float("SpeedST", get("SpeedST")?)?,
            lap_number: cell_count("LapNumber", get("LapNumber")?)?.unwrap_or(0),
            is_accurate: cell_flag("IsAccurate", get("IsAccurate")?)?,
        })
    }
}

fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Text(text) if !Cell::is_missing_marker(text) => text.clone(),
        Cell::Number(n) => n.to_string(),
        Cell::Flag(b) => b.to_string(),
        _ => String::new(),
    }
}

fn cell_float(column: &str, cell: &Cell) -> Result<Option<f64>, RacePaceError> {
    let value = match cell {
        Cell::Number(n) => *n,
        Cell::Text(text) if Cell::is_missing_marker(text) => return Ok(None),
        Cell::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| RacePaceError::SchemaMismatch {
                reason: format!("column {} holds non-numeric value '{}'", column, text),
            })?,
        Cell::Missing => return Ok(None),
        Cell::Flag(_) => {
            return Err(RacePaceError::SchemaMismatch {
                reason: format!("column {} holds a boolean", column),
            });
        }
    };
    Ok(value.is_finite().then_some(value))
}

// The provider stores counters as floats so they can carry NaN, accept "3.0" as 3
fn cell_count(column: &str, cell: &Cell) -> Result<Option<u32>, RacePaceError> {
    match cell_float(column, cell)? {
        Some(value) if value >= 0. && value.fract() == 0. && value <= u32::MAX as f64 => {
            Ok(Some(value as u32))
        }
        Some(value) => Err(RacePaceError::SchemaMismatch {
            reason: format!("column {} holds non-integer value {}", column, value),
        }),
        None => Ok(None),
    }
}

fn cell_flag(column: &str, cell: &Cell) -> Result<bool, RacePaceError> {
    match cell {
        Cell::Flag(b) => Ok(*b),
        Cell::Number(n) => Ok(*n != 0.),
        Cell::Missing => Ok(false),
        Cell::Text(text) => match text.trim() {
            "True" | "true" | "TRUE" | "1" => Ok(true),
            "False" | "false" | "FALSE" | "0" => Ok(false),
            other if Cell::is_missing_marker(other) => Ok(false),
            other => Err(RacePaceError::SchemaMismatch {
                reason: format!("column {} holds non-boolean value '{}'", column, other),
            }),
        },
    }
}

/// Parse a lap time cell into a duration.
///
/// Accepts the provider's timedelta text (`0 days 00:01:27.123000`), clock notation
/// (`1:27.123` or `0:01:27.123`) and plain seconds, either as text or as a number.
/// Empty cells and `NaT` yield `None`.
pub fn parse_lap_time(cell: &Cell) -> Result<Option<Duration>, RacePaceError> {
    let invalid = |value: &str| RacePaceError::InvalidLapTime {
        value: value.to_string(),
    };

    let seconds = match cell {
        Cell::Missing => return Ok(None),
        Cell::Number(n) if n.is_nan() => return Ok(None),
        Cell::Number(n) => *n,
        Cell::Flag(b) => return Err(invalid(&b.to_string())),
        Cell::Text(text) => {
            let text = text.trim();
            if Cell::is_missing_marker(text) {
                return Ok(None);
            }
            parse_lap_time_text(text).ok_or_else(|| invalid(text))?
        }
    };

    if seconds < 0. {
        return Err(invalid(&seconds.to_string()));
    }
    Duration::try_from_secs_f64(seconds)
        .map(Some)
        .map_err(|_| invalid(&seconds.to_string()))
}

fn parse_lap_time_text(text: &str) -> Option<f64> {
    let (days, clock) = match text.split_once("days") {
        Some((days, clock)) => (days.trim().parse::<f64>().ok()?, clock.trim()),
        None => (0., text),
    };

    if clock.split(':').count() > 3 {
        return None;
    }
    let mut seconds = 0.;
    for (idx, part) in clock.split(':').enumerate() {
        let value = part.trim().parse::<f64>().ok()?;
        // only the leading field may exceed its unit
        if value < 0. || (idx > 0 && value >= 60.) {
            return None;
        }
        seconds = seconds * 60. + value;
    }
    Some(days * 86_400. + seconds)
}
