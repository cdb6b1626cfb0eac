// Session lap tables: identifiers, raw rows and the cache they are read from

pub mod storage;
pub mod types;

// Re-export commonly used types
pub use storage::{FileCacheSource, LapFileSource, LapSource, load_lap_file};
pub use types::{Cell, REQUIRED_COLUMNS, RawLap, SessionId, parse_lap_time};
