// Lap table sources backed by files on disk

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::errors::RacePaceError;
use crate::session::types::{Cell, REQUIRED_COLUMNS, RawLap, SessionId};

const CSV_FILE_NAME: &str = "laps.csv";
const JSONL_FILE_NAME: &str = "laps.jsonl";

/// Trait defining how a session's lap table is obtained
pub trait LapSource {
    /// Load every lap of a session, accurate or not
    fn load_laps(&self, session: &SessionId) -> Result<Vec<RawLap>, RacePaceError>;
}

/// Lap cache laid out as `<cache_dir>/<year>/<event>/<session>/laps.{csv,jsonl}`
pub struct FileCacheSource {
    cache_dir: PathBuf,
}

impl FileCacheSource {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Create a source reading from the default application cache directory
    pub fn new_default() -> Result<Self, RacePaceError> {
        Ok(Self::new(Self::default_cache_path()?))
    }

    pub fn default_cache_path() -> Result<PathBuf, RacePaceError> {
        let cache_dir = dirs::cache_dir().ok_or(RacePaceError::NoCacheDir)?;
        Ok(cache_dir.join("racepace"))
    }

    /// Directory holding the cached tables of one session
    pub fn session_dir(&self, session: &SessionId) -> PathBuf {
        self.cache_dir.join(session.relative_path())
    }

    /// Cached lap table for a session, preferring CSV over JSON lines
    pub fn session_file(&self, session: &SessionId) -> Option<PathBuf> {
        let dir = self.session_dir(session);
        [CSV_FILE_NAME, JSONL_FILE_NAME]
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }
}

impl LapSource for FileCacheSource {
    fn load_laps(&self, session: &SessionId) -> Result<Vec<RawLap>, RacePaceError> {
        let path =
            self.session_file(session)
                .ok_or_else(|| RacePaceError::SessionNotCached {
                    path: format!("{:?}", self.session_dir(session)),
                })?;
        debug!("Using cached lap table {:?} for {}", path, session);
        load_lap_file(&path)
    }
}

/// A single lap table file, used regardless of the requested session
pub struct LapFileSource {
    path: PathBuf,
}

impl LapFileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl LapSource for LapFileSource {
    fn load_laps(&self, _session: &SessionId) -> Result<Vec<RawLap>, RacePaceError> {
        load_lap_file(&self.path)
    }
}

/// Load a lap table, picking the format from the file extension
pub fn load_lap_file(path: &Path) -> Result<Vec<RawLap>, RacePaceError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let laps = match extension.as_deref() {
        Some("jsonl") | Some("json") => load_jsonl(path)?,
        _ => load_csv(path)?,
    };
    info!("Loaded {:?}, found {} laps", path, laps.len());
    Ok(laps)
}

fn load_csv(path: &Path) -> Result<Vec<RawLap>, RacePaceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    // Column positions of the required set, extra columns are ignored
    let index: HashMap<&str, usize> = REQUIRED_COLUMNS
        .iter()
        .filter_map(|column| {
            headers
                .iter()
                .position(|header| header == *column)
                .map(|idx| (*column, idx))
        })
        .collect();

    let missing = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !index.contains_key(*column))
        .copied()
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(RacePaceError::SchemaMismatch {
            reason: format!("missing columns {}", missing.join(", ")),
        });
    }

    let mut laps = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells: HashMap<&str, Cell> = index
            .iter()
            .map(|(column, idx)| (*column, Cell::from_text(record.get(*idx).unwrap_or(""))))
            .collect();
        laps.push(RawLap::from_cells(|name| cells.get(name))?);
    }
    Ok(laps)
}

fn load_jsonl(path: &Path) -> Result<Vec<RawLap>, RacePaceError> {
    let rows = serde_jsonlines::json_lines(path)
        .map_err(|e| RacePaceError::LapTableIOError { source: e })?
        .collect::<Result<Vec<HashMap<String, Cell>>, io::Error>>()
        .map_err(jsonl_error)?;

    rows.iter()
        .map(|row| RawLap::from_cells(|name| row.get(name)))
        .collect()
}

// Malformed lines surface as io::Error wrapping the serde_json error
fn jsonl_error(e: io::Error) -> RacePaceError {
    if !e
        .get_ref()
        .is_some_and(|inner| inner.is::<serde_json::Error>())
    {
        return RacePaceError::LapTableIOError { source: e };
    }
    let kind = e.kind();
    match e.into_inner().map(|inner| inner.downcast::<serde_json::Error>()) {
        Some(Ok(source)) => RacePaceError::LapTableJsonError { source: *source },
        Some(Err(inner)) => RacePaceError::LapTableIOError {
            source: io::Error::new(kind, inner),
        },
        None => RacePaceError::LapTableIOError {
            source: io::Error::from(kind),
        },
    }
}
