use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use zoo_engine::{EnvParams, PhysicalAction, SceneError, SceneObservation, SceneWorld};

use crate::config::{ConfigError, ZooConfig};
use crate::oracle::{GoalOracle, ReferenceOracle};

mod episode;
mod hindsight;
mod horizon;
mod interpreter;
mod perception;

pub use episode::EpisodeDescriptor;
pub use hindsight::HindsightTracker;
pub use horizon::HorizonTable;
pub use interpreter::{Command, ReleaseTarget};
pub use perception::{
    display_name, render, strip_trailing_digits, Directory, DirectoryEntry, Perception,
};

/// Goals whose last word is one of these groups are too general to sample.
const GENERAL_GROUPS: [&str; 5] = ["animal", "thing", "living_thing", "carnivore", "herbivore"];

#[derive(Debug, Error)]
pub enum EnvError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no visible object matches '{descriptor}'")]
    TargetNotFound { descriptor: String },
    #[error("invalid action '{action}': {reason}")]
    InvalidAction { action: String, reason: String },
    #[error("episode descriptor needs a goal")]
    MissingGoal,
    #[error("environment has not been reset")]
    NotReset,
    #[error("episode already finished after {steps} steps; reset first")]
    EpisodeFinished { steps: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepInfo {
    pub goal: String,
    pub possible_actions: Vec<String>,
    pub inventory: Vec<String>,
    pub hindsight: Vec<String>,
    pub newly_grown: Vec<String>,
    pub step: u32,
    pub max_steps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub observation: String,
    pub reward: f32,
    pub done: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

struct Episode {
    descriptor: EpisodeDescriptor,
    seed: u64,
    scene: SceneWorld,
    step: u32,
    max_steps: u32,
    finished: bool,
    directory: Directory,
    inventory: Vec<String>,
    hindsight: HindsightTracker,
}

/// Text playground: one goal per episode, one command per step.
pub struct LittleZoo<O: GoalOracle = ReferenceOracle> {
    config: ZooConfig,
    params: EnvParams,
    oracle: O,
    train_goals: Vec<String>,
    test_goals: Vec<String>,
    vocabulary: HashSet<String>,
    rng: ChaCha8Rng,
    episode: Option<Episode>,
}

impl LittleZoo<ReferenceOracle> {
    pub fn new(config: ZooConfig) -> Result<Self, EnvError> {
        let oracle = ReferenceOracle::new(config.held_out_types.iter().cloned());
        Self::with_oracle(config, oracle)
    }
}

impl<O: GoalOracle> LittleZoo<O> {
    pub fn with_oracle(config: ZooConfig, oracle: O) -> Result<Self, EnvError> {
        config.validate()?;
        let params = config.env_params()?;
        let vocabulary = oracle.generate_all_descriptions(&params);
        let train_goals = sampleable_goals(vocabulary.train);
        let test_goals = sampleable_goals(vocabulary.test);
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        info!(
            train_goals = train_goals.len(),
            test_goals = test_goals.len(),
            nb_types = params.nb_types(),
            seeded = config.seed.is_some(),
            "environment_ready"
        );
        Ok(Self {
            vocabulary: train_goals.iter().cloned().collect(),
            config,
            params,
            oracle,
            train_goals,
            test_goals,
            rng,
            episode: None,
        })
    }

    pub fn config(&self) -> &ZooConfig {
        &self.config
    }

    pub fn params(&self) -> &EnvParams {
        &self.params
    }

    pub fn train_goals(&self) -> &[String] {
        &self.train_goals
    }

    pub fn test_goals(&self) -> &[String] {
        &self.test_goals
    }

    pub fn goal(&self) -> Option<&str> {
        self.episode
            .as_ref()
            .map(|episode| episode.descriptor.goal.as_str())
    }

    pub fn episode_descriptor(&self) -> Option<&EpisodeDescriptor> {
        self.episode.as_ref().map(|episode| &episode.descriptor)
    }

    pub fn episode_seed(&self) -> Option<u64> {
        self.episode.as_ref().map(|episode| episode.seed)
    }

    pub fn scene(&self) -> Option<&SceneWorld> {
        self.episode.as_ref().map(|episode| &episode.scene)
    }

    pub fn observation(&self) -> Option<SceneObservation> {
        self.scene().map(SceneWorld::observation)
    }

    /// Starts an episode from `[goal, object, ...]`, or samples a goal and a
    /// solvable scene when none is given.
    pub fn reset<S: AsRef<str>>(
        &mut self,
        goal_descriptor: Option<&[S]>,
    ) -> Result<(String, StepInfo), EnvError> {
        let seed = self.rng.gen::<u64>();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let descriptor = match goal_descriptor {
            Some(entries) => EpisodeDescriptor::parse(entries)?,
            None => {
                let goals = if self.config.train {
                    &self.train_goals
                } else {
                    &self.test_goals
                };
                let goal = goals.choose(&mut rng).ok_or(EnvError::MissingGoal)?;
                EpisodeDescriptor::generate(
                    goal,
                    &self.params.taxonomy,
                    self.config.nb_objects,
                    &mut rng,
                )
            }
        };

        let mut scene = SceneWorld::generate(&descriptor.objects, &self.params, &mut rng)?;
        scene.apply_action(PhysicalAction::IDLE);
        let directory = Directory::build(&scene, self.config.color_in_names);
        scene.reset_growth_marks();
        let perception = render(&directory, self.config.inventory_capacity);
        let max_steps = self
            .config
            .horizon
            .max_steps(&descriptor.goal, &self.params.taxonomy);

        info!(
            goal = %descriptor.goal,
            seed,
            entity_count = scene.entity_count(),
            max_steps,
            "episode_reset"
        );

        let info = StepInfo {
            goal: descriptor.goal.clone(),
            possible_actions: perception.possible_actions,
            inventory: perception.inventory.clone(),
            hindsight: Vec::new(),
            newly_grown: Vec::new(),
            step: 0,
            max_steps,
        };
        self.episode = Some(Episode {
            descriptor,
            seed,
            scene,
            step: 0,
            max_steps,
            finished: false,
            directory,
            inventory: perception.inventory,
            hindsight: HindsightTracker::new(),
        });
        Ok((perception.text, info))
    }

    pub fn step(&mut self, command: &str) -> Result<StepOutcome, EnvError> {
        let episode = self.episode.as_mut().ok_or(EnvError::NotReset)?;
        if episode.finished {
            return Err(EnvError::EpisodeFinished {
                steps: episode.step,
            });
        }

        let parsed = Command::parse(command)?;
        let action = parsed.to_action(
            &episode.directory,
            &episode.inventory,
            episode.scene.agent().position,
        )?;
        let report = episode.scene.apply_action(action);
        episode.step += 1;

        let observation = episode.scene.observation();
        let goal = episode.descriptor.goal.as_str();
        let goal_reached = self
            .oracle
            .reward_from_state(&observation, goal, &self.params);
        let truncated = !goal_reached && episode.step >= episode.max_steps;
        let done = goal_reached || truncated;

        let sampled = self
            .oracle
            .sample_descriptions_from_state(&observation, &self.params);
        let hindsight =
            episode
                .hindsight
                .filter(sampled, goal, parsed.is_grasp(), &self.vocabulary);

        episode.directory = Directory::build(&episode.scene, self.config.color_in_names);
        let newly_grown = episode.directory.newly_grown();
        episode.scene.reset_growth_marks();
        let perception = render(&episode.directory, self.config.inventory_capacity);
        episode.inventory = perception.inventory.clone();
        episode.finished = done;

        debug!(
            step = episode.step,
            command,
            gripper = action.gripper.code(),
            grown = report.grown.len(),
            consumed = report.consumed.len(),
            reward = goal_reached,
            "episode_step"
        );
        if done {
            info!(
                goal,
                steps = episode.step,
                success = goal_reached,
                truncated,
                "episode_finished"
            );
        }

        Ok(StepOutcome {
            observation: perception.text,
            reward: if goal_reached { 1.0 } else { 0.0 },
            done,
            truncated,
            info: StepInfo {
                goal: goal.to_string(),
                possible_actions: perception.possible_actions,
                inventory: perception.inventory,
                hindsight,
                newly_grown,
                step: episode.step,
                max_steps: episode.max_steps,
            },
        })
    }
}

fn sampleable_goals(goals: Vec<String>) -> Vec<String> {
    goals
        .into_iter()
        .filter(|goal| {
            !goal.starts_with("Go")
                && goal
                    .split(' ')
                    .last()
                    .map_or(true, |word| !GENERAL_GROUPS.contains(&word))
        })
        .collect()
}
