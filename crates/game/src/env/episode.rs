use rand::seq::SliceRandom;
use rand::Rng;
use zoo_engine::{is_color_name, Category, EntityDescriptor, Taxonomy, WATER_TYPE};

use super::EnvError;
use crate::oracle::group_contains;

/// `[goal, object, object, ...]` with each object written `[<color>] <type>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeDescriptor {
    pub goal: String,
    pub objects: Vec<EntityDescriptor>,
}

impl EpisodeDescriptor {
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self, EnvError> {
        let (goal, objects) = entries.split_first().ok_or(EnvError::MissingGoal)?;
        let goal = goal.as_ref().trim();
        if goal.is_empty() {
            return Err(EnvError::MissingGoal);
        }
        Ok(Self {
            goal: goal.to_string(),
            objects: objects
                .iter()
                .map(|entry| parse_object(entry.as_ref()))
                .collect(),
        })
    }

    /// Builds a scene in which `goal` is reachable: the target, whatever it
    /// has to eat, then random distractors up to `nb_objects`.
    pub fn generate<R: Rng + ?Sized>(
        goal: &str,
        taxonomy: &Taxonomy,
        nb_objects: usize,
        rng: &mut R,
    ) -> Self {
        let mut type_names = Vec::new();
        if let Some(target) = resolve_target(goal, taxonomy, rng) {
            type_names.push(target.clone());
            if goal.starts_with("Grow") {
                let category = taxonomy.category_of(&target);
                type_names.extend(recipe_for(category, taxonomy, rng));
            }
        }

        let all_types = taxonomy
            .type_defs()
            .iter()
            .map(|def| def.type_name.as_str())
            .collect::<Vec<_>>();
        while type_names.len() < nb_objects {
            match all_types.choose(rng) {
                Some(type_name) => type_names.push((*type_name).to_string()),
                None => break,
            }
        }
        type_names.shuffle(rng);

        Self {
            goal: goal.to_string(),
            objects: type_names.into_iter().map(EntityDescriptor::new).collect(),
        }
    }

    /// The descriptor in its `[goal, object, ...]` text form.
    pub fn to_entries(&self) -> Vec<String> {
        std::iter::once(self.goal.clone())
            .chain(self.objects.iter().map(|object| match &object.color {
                Some(color) => format!("{color} {}", object.type_name),
                None => object.type_name.clone(),
            }))
            .collect()
    }
}

fn parse_object(entry: &str) -> EntityDescriptor {
    let entry = entry.trim();
    match entry.split_once(' ') {
        Some((first, rest)) if is_color_name(first) => {
            EntityDescriptor::new(rest.trim()).with_color(first)
        }
        _ => EntityDescriptor::new(entry),
    }
}

fn resolve_target<R: Rng + ?Sized>(goal: &str, taxonomy: &Taxonomy, rng: &mut R) -> Option<String> {
    let target = goal
        .strip_prefix("Go to ")
        .or_else(|| goal.strip_prefix("Grasp "))
        .or_else(|| goal.strip_prefix("Grow "))?;
    match target.strip_prefix("any ") {
        Some(group) => {
            let members = taxonomy
                .type_defs()
                .iter()
                .filter(|def| group_contains(group, def.category))
                .filter(|def| !goal.starts_with("Grow") || def.category.is_living())
                .map(|def| def.type_name.as_str())
                .collect::<Vec<_>>();
            members.choose(rng).map(|name| (*name).to_string())
        }
        None => taxonomy.contains(target).then(|| target.to_string()),
    }
}

fn recipe_for<R: Rng + ?Sized>(
    category: Option<Category>,
    taxonomy: &Taxonomy,
    rng: &mut R,
) -> Vec<String> {
    let mut pick = |category: Category| -> Option<String> {
        let members = taxonomy.types_in(category).collect::<Vec<_>>();
        members.choose(&mut *rng).map(|name| (*name).to_string())
    };
    let water = || Some(WATER_TYPE.to_string());
    let parts = match category {
        Some(Category::Plant) => vec![water()],
        Some(Category::SmallHerbivore) => vec![pick(Category::Plant), water()],
        Some(Category::SmallCarnivore) => vec![
            pick(Category::SmallHerbivore),
            pick(Category::Plant),
            water(),
        ],
        Some(Category::BigHerbivore) => vec![
            pick(Category::Plant),
            pick(Category::Plant),
            water(),
            water(),
        ],
        Some(Category::BigCarnivore) => vec![
            pick(Category::BigHerbivore),
            pick(Category::Plant),
            pick(Category::Plant),
            water(),
            water(),
        ],
        Some(Category::Furniture) | Some(Category::Supply) | None => Vec::new(),
    };
    parts.into_iter().flatten().collect()
}
