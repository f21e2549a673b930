//! On-disk configuration file.
//!
//! The current format is YAML:
//!
//! ```yaml
//! api:
//!   key: YOUR_KEY
//! search:
//!   sub_radius: 3000
//!   max_workers: 4
//! ```
//!
//! Older installs stored a flat JSON object (`{"api_key": ..., "sub_radius": ...}`);
//! files ending in `.json` are read in that layout and converted on load.
//! Keys this crate does not know about are carried through a load/save cycle.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchSection>,
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Deserialize)]
struct LegacyJsonConfig {
    api_key: Option<String>,
    sub_radius: Option<f64>,
    max_workers: Option<usize>,
    #[serde(flatten)]
    other: BTreeMap<String, serde_json::Value>,
}

impl FileConfig {
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api
            .as_ref()
            .and_then(|a| a.key.as_deref())
            .filter(|k| !k.trim().is_empty())
    }

    #[must_use]
    pub fn sub_radius(&self) -> Option<f64> {
        self.search.as_ref().and_then(|s| s.sub_radius)
    }

    #[must_use]
    pub fn max_workers(&self) -> Option<usize> {
        self.search.as_ref().and_then(|s| s.max_workers)
    }

    pub fn set_api_key(&mut self, key: impl Into<String>) {
        self.api.get_or_insert_with(ApiSection::default).key = Some(key.into());
    }

    pub fn set_sub_radius(&mut self, sub_radius: f64) {
        self.search
            .get_or_insert_with(SearchSection::default)
            .sub_radius = Some(sub_radius);
    }

    pub fn set_max_workers(&mut self, max_workers: usize) {
        self.search
            .get_or_insert_with(SearchSection::default)
            .max_workers = Some(max_workers);
    }
}

impl From<LegacyJsonConfig> for FileConfig {
    fn from(legacy: LegacyJsonConfig) -> Self {
        let other = legacy
            .other
            .into_iter()
            .filter_map(|(k, v)| serde_yaml::to_value(v).ok().map(|v| (k, v)))
            .collect();
        let mut config = FileConfig {
            other,
            ..FileConfig::default()
        };
        if let Some(key) = legacy.api_key {
            config.set_api_key(key);
        }
        if let Some(sub_radius) = legacy.sub_radius {
            config.set_sub_radius(sub_radius);
        }
        if let Some(max_workers) = legacy.max_workers {
            config.set_max_workers(max_workers);
        }
        config
    }
}

/// Load a config file, choosing the legacy JSON reader for `.json` paths.
///
/// An empty file yields the default (all-`None`) config.
///
/// # Errors
///
/// Returns [`ConfigError::FileIo`] if the file cannot be read, or a parse
/// error if its contents do not match the expected layout.
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let legacy: LegacyJsonConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::JsonParse {
                path: path.display().to_string(),
                source: e,
            })?;
        Ok(legacy.into())
    } else {
        serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlParse {
            path: path.display().to_string(),
            source: e,
        })
    }
}

/// Apply `update` to the YAML config at `path` and write it back.
///
/// Missing parent directories are created. Existing keys not touched by
/// `update` are preserved.
///
/// # Errors
///
/// Returns [`ConfigError`] if the existing file cannot be parsed or the new
/// contents cannot be written.
pub fn save_file_config<F>(path: &Path, update: F) -> Result<FileConfig, ConfigError>
where
    F: FnOnce(&mut FileConfig),
{
    let io_err = |e: std::io::Error| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut config = if path.exists() {
        load_file_config(path)?
    } else {
        FileConfig::default()
    };
    update(&mut config);

    let yaml = serde_yaml::to_string(&config).map_err(|e| ConfigError::YamlParse {
        path: path.display().to_string(),
        source: e,
    })?;
    std::fs::write(path, yaml).map_err(io_err)?;

    Ok(config)
}
