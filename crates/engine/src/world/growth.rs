use super::entity::{Category, Entity, EntityId};
use super::geometry::in_contact;

/// What an entity has to touch to grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meal {
    Water,
    Grown(Category),
}

impl Meal {
    fn accepts(self, candidate: &Entity) -> bool {
        match self {
            Self::Water => candidate.is_water(),
            Self::Grown(category) => candidate.category() == category && candidate.grown_once(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diet {
    Single(Meal),
    Pair(Meal),
    /// Pair rule first; the single rule is the fallback.
    PairOrSingle { pair: Meal, single: Meal },
}

pub fn diet_of(category: Category) -> Option<Diet> {
    match category {
        Category::Plant => Some(Diet::Single(Meal::Water)),
        Category::SmallHerbivore => Some(Diet::Single(Meal::Grown(Category::Plant))),
        Category::SmallCarnivore => Some(Diet::Single(Meal::Grown(Category::SmallHerbivore))),
        Category::BigHerbivore => Some(Diet::Pair(Meal::Grown(Category::Plant))),
        Category::BigCarnivore => Some(Diet::PairOrSingle {
            pair: Meal::Grown(Category::SmallHerbivore),
            single: Meal::Grown(Category::BigHerbivore),
        }),
        Category::Furniture | Category::Supply => None,
    }
}

/// Scene state a growth check reads. Entities marked for removal earlier in
/// the sub-step stay in `slots` and can still feed later eaters.
pub(crate) struct GrowthInputs<'a> {
    pub slots: &'a [Option<Entity>],
    pub release_targets: &'a [EntityId],
}

impl GrowthInputs<'_> {
    /// Grasped entities only take part when they are the single entity being
    /// released this step.
    fn is_free(&self, entity: &Entity) -> bool {
        !entity.is_grasped() || self.release_targets == [entity.id()]
    }

    fn is_edible(&self, meal: Meal, candidate: &Entity, eater: &Entity) -> bool {
        candidate.id() != eater.id()
            && meal.accepts(candidate)
            && self.is_free(candidate)
    }

    fn touches(eater: &Entity, candidate: &Entity) -> bool {
        in_contact(
            eater.position(),
            eater.size(),
            candidate.position(),
            candidate.size(),
        )
    }
}

/// Returns the partners `eater` consumes this sub-step, or `None` when it
/// does not grow.
pub(crate) fn find_meal(inputs: &GrowthInputs<'_>, eater: &Entity) -> Option<Vec<EntityId>> {
    if eater.grown_once() || !inputs.is_free(eater) {
        return None;
    }
    match diet_of(eater.category())? {
        Diet::Single(meal) => find_single(inputs, eater, meal),
        Diet::Pair(meal) => find_pair(inputs, eater, meal).partners,
        Diet::PairOrSingle { pair, single } => {
            let scan = find_pair(inputs, eater, pair);
            if scan.partners.is_some() {
                return scan.partners;
            }
            if scan.last_pair_matched {
                None
            } else {
                find_single(inputs, eater, single)
            }
        }
    }
}

fn find_single(inputs: &GrowthInputs<'_>, eater: &Entity, meal: Meal) -> Option<Vec<EntityId>> {
    inputs
        .slots
        .iter()
        .flatten()
        .find(|candidate| {
            inputs.is_edible(meal, candidate, eater) && GrowthInputs::touches(eater, candidate)
        })
        .map(|candidate| vec![candidate.id()])
}

struct PairScan {
    partners: Option<Vec<EntityId>>,
    /// Eligibility of the last evaluated pair, contact excluded.
    last_pair_matched: bool,
}

fn find_pair(inputs: &GrowthInputs<'_>, eater: &Entity, meal: Meal) -> PairScan {
    let mut last_pair_matched = false;
    let slots = inputs.slots;
    for i in 0..slots.len() {
        for j in (i + 1)..slots.len() {
            let (first, second) = match (&slots[i], &slots[j]) {
                (None, None) => continue,
                (Some(first), Some(second)) => (first, second),
                _ => {
                    last_pair_matched = false;
                    continue;
                }
            };
            last_pair_matched =
                inputs.is_edible(meal, first, eater) && inputs.is_edible(meal, second, eater);
            if last_pair_matched
                && GrowthInputs::touches(eater, first)
                && GrowthInputs::touches(eater, second)
            {
                return PairScan {
                    partners: Some(vec![first.id(), second.id()]),
                    last_pair_matched,
                };
            }
        }
    }
    PairScan {
        partners: None,
        last_pair_matched,
    }
}
