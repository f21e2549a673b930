pub mod app_config;
pub mod config;
pub mod file_config;
pub mod types;

pub use app_config::AppConfig;
pub use config::{default_config_dir, load_app_config, load_app_config_from_env};
pub use file_config::{load_file_config, save_file_config, FileConfig};
pub use types::{BusinessRecord, Coordinates};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("failed to read config file {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML config file {path}: {source}")]
    YamlParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse JSON config file {path}: {source}")]
    JsonParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot locate a home directory for the user config file")]
    NoHomeDir,
}
