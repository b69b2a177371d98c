//! LittleZoo: a text-command playground where an agent moves, grasps and
//! releases objects, and plants and animals grow by consuming each other.

pub mod config;
pub mod env;
pub mod oracle;

pub use config::{ConfigError, ZooConfig, CONFIG_ENV_VAR, SEED_ENV_VAR};
pub use env::{
    EnvError, EpisodeDescriptor, HorizonTable, LittleZoo, StepInfo, StepOutcome,
};
pub use oracle::{GoalOracle, GoalVocabulary, ReferenceOracle};
