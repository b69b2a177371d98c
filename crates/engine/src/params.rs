use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::{compile_taxonomy, ContentCompileError, Taxonomy};
use crate::world::{AttributeRegistry, Category};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsParams {
    pub agent_size: f32,
    pub initial_size: f32,
    pub min_size: f32,
    pub max_size: f32,
    pub size_update: f32,
    pub min_initial_separation: f32,
    pub max_placement_attempts: u32,
    pub admissible_attributes: Vec<String>,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            agent_size: 0.05,
            initial_size: 0.2,
            min_size: 0.2,
            max_size: 0.3,
            size_update: 0.04,
            min_initial_separation: 0.3,
            max_placement_attempts: 10_000,
            admissible_attributes: vec![
                "relative_positions".to_string(),
                "relative_sizes".to_string(),
                "relative_shades".to_string(),
            ],
        }
    }
}

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("parse physics params at {path}: {message}")]
    Parse { path: String, message: String },
    #[error("invalid physics params: {field} {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
    #[error(transparent)]
    Taxonomy(#[from] ContentCompileError),
}

impl PhysicsParams {
    pub fn from_json_str(raw: &str) -> Result<Self, ParamsError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let params = serde_path_to_error::deserialize::<_, Self>(&mut deserializer).map_err(
            |error| {
                let path = error.path().to_string();
                ParamsError::Parse {
                    path: if path.is_empty() { ".".to_string() } else { path },
                    message: error.into_inner().to_string(),
                }
            },
        )?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        let positive = [
            ("agent_size", self.agent_size),
            ("initial_size", self.initial_size),
            ("min_size", self.min_size),
            ("max_size", self.max_size),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ParamsError::Invalid {
                    field,
                    message: format!("must be finite and > 0, got {value}"),
                });
            }
        }
        if !self.size_update.is_finite() || self.size_update < 0.0 {
            return Err(ParamsError::Invalid {
                field: "size_update",
                message: format!("must be finite and >= 0, got {}", self.size_update),
            });
        }
        if self.min_size > self.max_size {
            return Err(ParamsError::Invalid {
                field: "min_size",
                message: format!(
                    "must not exceed max_size ({} > {})",
                    self.min_size, self.max_size
                ),
            });
        }
        if !self.min_initial_separation.is_finite() || self.min_initial_separation < 0.0 {
            return Err(ParamsError::Invalid {
                field: "min_initial_separation",
                message: format!("must be finite and >= 0, got {}", self.min_initial_separation),
            });
        }
        if self.max_placement_attempts == 0 {
            return Err(ParamsError::Invalid {
                field: "max_placement_attempts",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn max_grown_size(&self) -> f32 {
        self.max_size + self.size_update
    }

    pub fn clamp_size(&self, size: f32) -> f32 {
        if !size.is_finite() {
            return self.min_size;
        }
        size.clamp(self.min_size, self.max_grown_size())
    }

    pub fn grown_size(&self, size: f32) -> f32 {
        self.clamp_size((size + self.size_update).min(self.max_grown_size()))
    }

    pub fn is_admissible(&self, attribute: &str) -> bool {
        self.admissible_attributes
            .iter()
            .any(|candidate| candidate == attribute)
    }
}

/// Everything the simulation needs to build and advance a scene.
#[derive(Debug, Clone)]
pub struct EnvParams {
    pub physics: PhysicsParams,
    pub taxonomy: Taxonomy,
    pub attributes: AttributeRegistry,
}

impl EnvParams {
    pub fn builtin() -> Self {
        Self {
            physics: PhysicsParams::default(),
            taxonomy: Taxonomy::builtin(),
            attributes: AttributeRegistry::with_defaults(),
        }
    }

    pub fn with_overrides(
        physics: PhysicsParams,
        taxonomy_overrides: &[PathBuf],
    ) -> Result<Self, ParamsError> {
        physics.validate()?;
        Ok(Self {
            physics,
            taxonomy: compile_taxonomy(taxonomy_overrides)?,
            attributes: AttributeRegistry::with_defaults(),
        })
    }

    pub fn categories(&self) -> BTreeMap<Category, BTreeSet<String>> {
        self.taxonomy.categories()
    }

    pub fn nb_types(&self) -> usize {
        self.taxonomy.len()
    }
}
