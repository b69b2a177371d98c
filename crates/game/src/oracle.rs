use std::collections::BTreeSet;

use zoo_engine::{Category, EnvParams, ObservedObject, SceneObservation};

/// Groups a goal may target with `any <group>`.
pub const GOAL_GROUPS: [&str; 8] = [
    "thing",
    "living_thing",
    "animal",
    "herbivore",
    "carnivore",
    "plant",
    "furniture",
    "supply",
];

const GOAL_VERBS: [&str; 3] = ["Go to", "Grasp", "Grow"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalVocabulary {
    pub train: Vec<String>,
    pub test: Vec<String>,
    pub all: Vec<String>,
}

/// Goal generation, reward and hindsight sampling over raw scene state.
pub trait GoalOracle {
    fn generate_all_descriptions(&self, params: &EnvParams) -> GoalVocabulary;

    fn reward_from_state(
        &self,
        observation: &SceneObservation,
        goal: &str,
        params: &EnvParams,
    ) -> bool;

    /// Every goal the state satisfies, grouped by goal verb.
    fn sample_descriptions_from_state(
        &self,
        observation: &SceneObservation,
        params: &EnvParams,
    ) -> Vec<Vec<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GoalVerb {
    GoTo,
    Grasp,
    Grow,
}

impl GoalVerb {
    fn parse(goal: &str) -> Option<(Self, &str)> {
        if let Some(rest) = goal.strip_prefix("Go to ") {
            return Some((Self::GoTo, rest));
        }
        if let Some(rest) = goal.strip_prefix("Grasp ") {
            return Some((Self::Grasp, rest));
        }
        goal.strip_prefix("Grow ").map(|rest| (Self::Grow, rest))
    }

    /// Objects for which the verb currently holds.
    fn satisfied_by(self, observation: &SceneObservation) -> Vec<&ObservedObject> {
        match self {
            Self::GoTo => observation
                .objects
                .iter()
                .filter(|object| observation.is_standing_on(object))
                .collect(),
            Self::Grasp => observation.held().collect(),
            Self::Grow => observation
                .objects
                .iter()
                .filter(|object| object.grown_once)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum GoalTarget<'a> {
    Type(&'a str),
    Group(&'a str),
}

impl<'a> GoalTarget<'a> {
    fn parse(target: &'a str) -> Self {
        match target.strip_prefix("any ") {
            Some(group) => Self::Group(group),
            None => Self::Type(target),
        }
    }

    fn matches(&self, object: &ObservedObject) -> bool {
        match self {
            Self::Type(type_name) => object.type_name == *type_name,
            Self::Group(group) => group_contains(group, object.category),
        }
    }
}

pub fn group_contains(group: &str, category: Category) -> bool {
    match group {
        "thing" => true,
        "living_thing" => category.is_living(),
        "animal" => category.is_animal(),
        "herbivore" => category.is_herbivore(),
        "carnivore" => category.is_carnivore(),
        other => Category::from_token(other) == Some(category),
    }
}

/// Goals over every registered type plus `any <group>` goals. Goals naming a
/// held-out type form the test split.
#[derive(Debug, Clone, Default)]
pub struct ReferenceOracle {
    held_out_types: BTreeSet<String>,
}

impl ReferenceOracle {
    pub fn new<I, S>(held_out_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            held_out_types: held_out_types.into_iter().map(Into::into).collect(),
        }
    }
}

impl GoalOracle for ReferenceOracle {
    fn generate_all_descriptions(&self, params: &EnvParams) -> GoalVocabulary {
        let mut vocabulary = GoalVocabulary::default();
        for verb in GOAL_VERBS {
            for type_def in params.taxonomy.type_defs() {
                let goal = format!("{verb} {}", type_def.type_name);
                if self.held_out_types.contains(&type_def.type_name) {
                    vocabulary.test.push(goal.clone());
                } else {
                    vocabulary.train.push(goal.clone());
                }
                vocabulary.all.push(goal);
            }
            for group in GOAL_GROUPS {
                let goal = format!("{verb} any {group}");
                vocabulary.train.push(goal.clone());
                vocabulary.all.push(goal);
            }
        }
        vocabulary
    }

    fn reward_from_state(
        &self,
        observation: &SceneObservation,
        goal: &str,
        _params: &EnvParams,
    ) -> bool {
        let Some((verb, target)) = GoalVerb::parse(goal) else {
            return false;
        };
        let target = GoalTarget::parse(target);
        verb.satisfied_by(observation)
            .into_iter()
            .any(|object| target.matches(object))
    }

    fn sample_descriptions_from_state(
        &self,
        observation: &SceneObservation,
        _params: &EnvParams,
    ) -> Vec<Vec<String>> {
        [GoalVerb::GoTo, GoalVerb::Grasp, GoalVerb::Grow]
            .into_iter()
            .zip(GOAL_VERBS)
            .map(|(verb, verb_text)| {
                let mut goals = BTreeSet::new();
                for object in verb.satisfied_by(observation) {
                    goals.insert(format!("{verb_text} {}", object.type_name));
                    for group in GOAL_GROUPS {
                        if group_contains(group, object.category) {
                            goals.insert(format!("{verb_text} any {group}"));
                        }
                    }
                }
                goals.into_iter().collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use zoo_engine::{EntityId, GripperSignal, Rgb, Vec2};

    use super::*;

    fn object(type_name: &str, category: Category, position: Vec2) -> ObservedObject {
        ObservedObject {
            id: EntityId(0),
            type_name: type_name.to_string(),
            category,
            color_name: None,
            rgb: Rgb::default(),
            position,
            size: 0.2,
            grasped: false,
            grown_once: false,
            grew_this_step: false,
            relative_attributes: BTreeMap::new(),
        }
    }

    fn observation(objects: Vec<ObservedObject>) -> SceneObservation {
        SceneObservation {
            agent_position: Vec2::ZERO,
            agent_size: 0.05,
            gripper: GripperSignal::Idle,
            objects,
            features: Vec::new(),
        }
    }

    #[test]
    fn vocabulary_splits_on_held_out_types() {
        let params = EnvParams::builtin();
        let oracle = ReferenceOracle::new(["cow"]);
        let vocabulary = oracle.generate_all_descriptions(&params);
        assert!(vocabulary.test.contains(&"Grow cow".to_string()));
        assert!(!vocabulary.train.contains(&"Grow cow".to_string()));
        assert!(vocabulary.train.contains(&"Grasp any animal".to_string()));
        assert_eq!(
            vocabulary.all.len(),
            vocabulary.train.len() + vocabulary.test.len()
        );
        assert_eq!(vocabulary.all.len(), 3 * (176 + GOAL_GROUPS.len()));
    }

    #[test]
    fn rewards_follow_goal_verbs() {
        let params = EnvParams::builtin();
        let oracle = ReferenceOracle::default();
        let mut carrot = object("carrot", Category::Plant, Vec2::new(0.5, 0.5));
        carrot.grown_once = true;
        let mut chair = object("chair", Category::Furniture, Vec2::new(-0.5, 0.5));
        chair.grasped = true;
        let water = object("water", Category::Supply, Vec2::new(0.05, 0.0));
        let state = observation(vec![carrot, chair, water]);

        assert!(oracle.reward_from_state(&state, "Grow carrot", &params));
        assert!(oracle.reward_from_state(&state, "Grow any plant", &params));
        assert!(!oracle.reward_from_state(&state, "Grow cow", &params));
        assert!(oracle.reward_from_state(&state, "Grasp chair", &params));
        assert!(oracle.reward_from_state(&state, "Grasp any furniture", &params));
        assert!(!oracle.reward_from_state(&state, "Grasp carrot", &params));
        assert!(oracle.reward_from_state(&state, "Go to water", &params));
        assert!(!oracle.reward_from_state(&state, "Go to chair", &params));
        assert!(!oracle.reward_from_state(&state, "Dance", &params));
    }

    #[test]
    fn state_sampler_groups_satisfied_goals_by_verb() {
        let params = EnvParams::builtin();
        let oracle = ReferenceOracle::default();
        let mut cow = object("cow", Category::SmallHerbivore, Vec2::ZERO);
        cow.grasped = true;
        let sampled = oracle.sample_descriptions_from_state(&observation(vec![cow]), &params);

        assert_eq!(sampled.len(), 3);
        assert!(sampled[0].is_empty(), "grasped objects are not stood on");
        assert!(sampled[1].contains(&"Grasp cow".to_string()));
        assert!(sampled[1].contains(&"Grasp any herbivore".to_string()));
        assert!(sampled[1].contains(&"Grasp any living_thing".to_string()));
        assert!(!sampled[1].contains(&"Grasp any carnivore".to_string()));
        assert!(sampled[2].is_empty());
    }
}
