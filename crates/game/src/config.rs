use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use zoo_engine::{EnvParams, ParamsError, PhysicsParams};

use crate::env::HorizonTable;

pub const CONFIG_ENV_VAR: &str = "ZOO_CONFIG";
pub const SEED_ENV_VAR: &str = "ZOO_SEED";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse config json at {path}: {message}")]
    Parse { path: String, message: String },
    #[error("validation failed at {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
    #[error(transparent)]
    Params(#[from] ParamsError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZooConfig {
    pub nb_objects: usize,
    /// Sample goals from the train split; `false` uses the test split.
    pub train: bool,
    pub seed: Option<u64>,
    pub inventory_capacity: usize,
    pub color_in_names: bool,
    pub horizon: HorizonTable,
    pub physics: PhysicsParams,
    pub taxonomy_overrides: Vec<PathBuf>,
    pub held_out_types: Vec<String>,
}

impl Default for ZooConfig {
    fn default() -> Self {
        Self {
            nb_objects: 4,
            train: true,
            seed: None,
            inventory_capacity: 2,
            color_in_names: true,
            horizon: HorizonTable::default(),
            physics: PhysicsParams::default(),
            taxonomy_overrides: Vec::new(),
            held_out_types: Vec::new(),
        }
    }
}

impl ZooConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config = match serde_path_to_error::deserialize::<_, Self>(&mut deserializer) {
            Ok(config) => config,
            Err(error) => {
                let path = error.path().to_string();
                let source = error.into_inner();
                return Err(ConfigError::Parse {
                    path: if path.is_empty() { ".".to_string() } else { path },
                    message: source.to_string(),
                });
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json_str(&raw)?;
        config.resolve_relative_paths(path.parent().unwrap_or_else(|| Path::new(".")));
        Ok(config)
    }

    /// Reads `ZOO_CONFIG` when set, then applies `ZOO_SEED`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => {
                let path = PathBuf::from(path);
                info!(path = %path.display(), "config_loading");
                Self::load(&path)?
            }
            Err(_) => Self::default(),
        };
        if let Some(seed) = parse_seed(std::env::var(SEED_ENV_VAR).ok().as_deref()) {
            config.seed = Some(seed);
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nb_objects == 0 {
            return Err(ConfigError::Invalid {
                field: "nb_objects",
                message: "must be at least 1".to_string(),
            });
        }
        if self.inventory_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "inventory_capacity",
                message: "must be at least 1".to_string(),
            });
        }
        for (field, budget) in self.horizon.entries() {
            if budget == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    message: "step budget must be at least 1".to_string(),
                });
            }
        }
        self.physics.validate()?;
        Ok(())
    }

    pub fn env_params(&self) -> Result<EnvParams, ConfigError> {
        if self.taxonomy_overrides.is_empty() {
            let mut params = EnvParams::builtin();
            params.physics = self.physics.clone();
            return Ok(params);
        }
        Ok(EnvParams::with_overrides(
            self.physics.clone(),
            &self.taxonomy_overrides,
        )?)
    }

    fn resolve_relative_paths(&mut self, base: &Path) {
        for dir in &mut self.taxonomy_overrides {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }
}

fn parse_seed(raw: Option<&str>) -> Option<u64> {
    let value = raw?.trim();
    match value.parse::<u64>() {
        Ok(seed) => Some(seed),
        Err(_) => {
            warn!(value, "invalid_seed_using_entropy");
            None
        }
    }
}
