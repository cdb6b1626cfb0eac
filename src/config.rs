use std::fs::File;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::RacePaceError;
use crate::race_runs::RaceRunParams;
use crate::render::ChartStyle;
use crate::tiers::TeamTiers;

const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_OUTPUT_DIR: &str = "data";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub team_tiers: TeamTiers,
    pub race_runs: RaceRunParams,
    /// Lap cache root, the platform cache directory when unset
    pub cache_dir: Option<PathBuf>,
    /// Charts are written below `<output_dir>/<year>/<event>/<session>`
    pub output_dir: PathBuf,
    pub chart: ChartStyle,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            team_tiers: TeamTiers::default(),
            race_runs: RaceRunParams::default(),
            cache_dir: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            chart: ChartStyle::default(),
        }
    }
}

impl ReportConfig {
    pub fn default_path() -> Result<PathBuf, RacePaceError> {
        Ok(dirs::config_dir()
            .ok_or(RacePaceError::NoConfigDir)?
            .join("racepace")
            .join(CONFIG_FILE_NAME))
    }

    pub fn from_file(path: &Path) -> Result<Self, RacePaceError> {
        let file = File::open(path).map_err(|e| RacePaceError::ConfigIOError { source: e })?;
        let config: Self = serde_json::from_reader(file)
            .map_err(|e| RacePaceError::ConfigSerializeError { source: e })?;
        config.race_runs.validate()?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Config from the user's config directory, if one was saved there
    pub fn from_local_file() -> Result<Option<Self>, RacePaceError> {
        let config_path = match dirs::config_dir() {
            Some(dir) => dir.join("racepace").join(CONFIG_FILE_NAME),
            None => return Ok(None),
        };

        if config_path.exists() {
            Self::from_file(&config_path).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn save(&self) -> Result<(), RacePaceError> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), RacePaceError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RacePaceError::ConfigIOError { source: e })?;
        }

        let file = File::create(config_path)
            .map_err(|e| RacePaceError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| RacePaceError::ConfigSerializeError { source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiers::Tier;
    use tempfile::TempDir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"race_runs": {"max_stint_std_s": 12.5}, "team_tiers": {"Sauber": "mid"}}"#,
        )
        .unwrap();

        let config = ReportConfig::from_file(&path).unwrap();
        assert_eq!(config.race_runs.max_stint_std_s, 12.5);
        assert_eq!(config.race_runs.outlier_std_factor, 0.5);
        assert_eq!(config.team_tiers.tier_of("Sauber"), Some(Tier::Mid));
        assert_eq!(config.team_tiers.tier_of("Ferrari"), None);
        assert_eq!(config.output_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        let config = ReportConfig {
            cache_dir: Some(temp_dir.path().join("cache")),
            ..ReportConfig::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(ReportConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"race_runs": {"max_stint_std_s": -1}}"#).unwrap();

        assert!(matches!(
            ReportConfig::from_file(&path),
            Err(RacePaceError::InvalidParameter { .. })
        ));
    }
}
