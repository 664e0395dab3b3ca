use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::Error;
use crate::lock::{ShortSubmitPolicy, DEFAULT_CODE};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub code: String,
    pub short_submit: ShortSubmitPolicy,
    pub track_attempts: bool,
    pub min_scale: f64,
    pub max_scale: f64,
    pub snap_offsets_at_unit_scale: bool,
    pub reveal_delay_ms: u64,
    pub summary_delay_ms: u64,
    pub failure_modal: bool,
    pub notify_url: Option<String>,
    pub hint_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            code: DEFAULT_CODE.to_string(),
            short_submit: ShortSubmitPolicy::Ignore,
            track_attempts: true,
            min_scale: 0.5,
            max_scale: 3.0,
            snap_offsets_at_unit_scale: false,
            reveal_delay_ms: 500,
            summary_delay_ms: 1000,
            failure_modal: true,
            notify_url: None,
            hint_path: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> crate::Result<()> {
        if self.code.is_empty() || !self.code.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::Config(format!(
                "code must be a non-empty string of digits, got {:?}",
                self.code
            )));
        }
        if !(self.min_scale > 0.0 && self.min_scale <= 1.0 && self.max_scale >= 1.0) {
            return Err(Error::Config(format!(
                "zoom bounds must satisfy 0 < min <= 1 <= max, got [{}, {}]",
                self.min_scale, self.max_scale
            )));
        }
        Ok(())
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), %err, "ignoring unreadable config")
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => tracing::warn!(path = %self.path.display(), %err, "config not readable"),
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            code: "12345".into(),
            short_submit: ShortSubmitPolicy::Fail,
            track_attempts: false,
            min_scale: 0.5,
            max_scale: 5.0,
            snap_offsets_at_unit_scale: true,
            reveal_delay_ms: 250,
            summary_delay_ms: 750,
            failure_modal: false,
            notify_url: Some("http://localhost:3000/game-end".into()),
            hint_path: Some(PathBuf::from("/tmp/hint.txt")),
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"max_scale": 5.0, "short_submit": "fail"}"#).unwrap();

        let loaded = FileConfigStore::with_path(&path).load();

        assert_eq!(loaded.max_scale, 5.0);
        assert_eq!(loaded.short_submit, ShortSubmitPolicy::Fail);
        assert_eq!(loaded.code, DEFAULT_CODE);
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{not json").unwrap();

        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn validate_rejects_bad_codes() {
        let mut cfg = Config::default();
        assert!(cfg.validate().is_ok());

        cfg.code = String::new();
        assert!(cfg.validate().is_err());

        cfg.code = "12a4".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_zoom_bounds() {
        let cfg = Config {
            min_scale: 2.0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = Config {
            max_scale: 0.8,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }
}
