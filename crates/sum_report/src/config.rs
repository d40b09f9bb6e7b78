use std::path::{
    Path,
    PathBuf,
};

use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_NUM1: i32 = 5;
pub const DEFAULT_NUM2: i32 = 10;
pub const DEFAULT_THRESHOLD: i64 = 10;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Fully resolved inputs for a report run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportConfig {
    pub num1: i32,
    pub num2: i32,
    pub threshold: i64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            num1: DEFAULT_NUM1,
            num2: DEFAULT_NUM2,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// A partial config, as read from a TOML file or collected from CLI flags. Unset fields fall
/// through to the next layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub num1: Option<i32>,
    pub num2: Option<i32>,
    pub threshold: Option<i64>,
}

impl ConfigLayer {
    pub fn from_toml_str(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let layer = Self::from_toml_str(path, &content)?;
        debug!(?path, ?layer, "loaded config file");
        Ok(layer)
    }

    /// Applies this layer on top of `base`.
    pub fn apply(&self, base: ReportConfig) -> ReportConfig {
        ReportConfig {
            num1: self.num1.unwrap_or(base.num1),
            num2: self.num2.unwrap_or(base.num2),
            threshold: self.threshold.unwrap_or(base.threshold),
        }
    }
}

/// Resolves defaults, then the optional config file, then `overrides`.
pub fn resolve(path: Option<&Path>, overrides: ConfigLayer) -> Result<ReportConfig, ConfigError> {
    let mut config = ReportConfig::default();
    if let Some(path) = path {
        config = ConfigLayer::load(path)?.apply(config);
    }
    let config = overrides.apply(config);
    debug!(?config, "resolved config");
    Ok(config)
}
