use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::categories::ModificationPolicy;
use crate::error::AnnotatorError;
use crate::uniprot::{ClientSettings, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

pub const CONFIG_FILE_NAME: &str = "residue-annotator.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub other_modification: Option<ModificationPolicy>,
}

#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub source: Option<PathBuf>,
    pub client: ClientSettings,
    pub policy: ModificationPolicy,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            source: None,
            client: ClientSettings::default(),
            policy: ModificationPolicy::default(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(
        path: Option<&str>,
        overrides: Overrides,
    ) -> Result<ResolvedConfig, AnnotatorError> {
        let (config, source) = match path {
            Some(path) => {
                let path = PathBuf::from(path);
                (Self::read(&path)?, Some(path))
            }
            None => match Self::discover() {
                Some(path) => (Self::read(&path)?, Some(path)),
                None => (Config::default(), None),
            },
        };
        if let Some(source) = &source {
            tracing::debug!(path = %source.display(), "config loaded");
        }

        let mut resolved = Self::resolve_config(config, overrides)?;
        resolved.source = source;
        Ok(resolved)
    }

    pub fn resolve_config(
        config: Config,
        overrides: Overrides,
    ) -> Result<ResolvedConfig, AnnotatorError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let base_url = overrides
            .base_url
            .or(config.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AnnotatorError::ConfigParse(
                "base_url must not be empty".to_string(),
            ));
        }

        let timeout = match overrides.timeout_secs.or(config.timeout_secs) {
            Some(0) => {
                return Err(AnnotatorError::ConfigParse(
                    "timeout_secs must be greater than zero".to_string(),
                ));
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TIMEOUT,
        };

        Ok(ResolvedConfig {
            schema_version,
            source: None,
            client: ClientSettings { base_url, timeout },
            policy: config.other_modification.unwrap_or_default(),
        })
    }

    fn read(path: &Path) -> Result<Config, AnnotatorError> {
        let content =
            fs::read_to_string(path).map_err(|_| AnnotatorError::ConfigRead(path.to_path_buf()))?;
        serde_json::from_str(&content).map_err(|err| AnnotatorError::ConfigParse(err.to_string()))
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.is_file() {
            return Some(local);
        }
        ProjectDirs::from("", "", "residue-annotator")
            .map(|dirs| dirs.config_dir().join("config.json"))
            .filter(|path| path.is_file())
    }
}
