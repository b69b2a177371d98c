use serde::{Deserialize, Serialize};
use zoo_engine::{Category, Taxonomy};

/// Step budgets, roughly 1.5x the optimal trajectory length per goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HorizonTable {
    pub grasp: u32,
    pub grow_plant: u32,
    pub grow_small_herbivore: u32,
    pub grow_small_carnivore: u32,
    pub grow_big_herbivore: u32,
    pub grow_big_carnivore: u32,
}

impl Default for HorizonTable {
    fn default() -> Self {
        Self {
            grasp: 3,
            grow_plant: 6,
            grow_small_herbivore: 10,
            grow_small_carnivore: 15,
            grow_big_herbivore: 22,
            grow_big_carnivore: 30,
        }
    }
}

impl HorizonTable {
    pub fn max_steps(&self, goal: &str, taxonomy: &Taxonomy) -> u32 {
        let mut words = goal.split_whitespace();
        match words.next() {
            Some("Grasp") => self.grasp,
            Some("Grow") => {
                let target = words.last().unwrap_or_default();
                let category = taxonomy
                    .category_of(target)
                    .or_else(|| Category::from_token(target));
                self.grow_budget(category)
            }
            _ => self.grow_small_carnivore,
        }
    }

    pub fn grow_budget(&self, category: Option<Category>) -> u32 {
        match category {
            Some(Category::Plant) => self.grow_plant,
            Some(Category::SmallHerbivore) => self.grow_small_herbivore,
            Some(Category::SmallCarnivore) => self.grow_small_carnivore,
            Some(Category::BigHerbivore) => self.grow_big_herbivore,
            Some(Category::BigCarnivore) => self.grow_big_carnivore,
            Some(Category::Furniture) | Some(Category::Supply) | None => {
                self.grow_small_carnivore
            }
        }
    }

    pub(crate) fn entries(&self) -> [(&'static str, u32); 6] {
        [
            ("grasp", self.grasp),
            ("grow_plant", self.grow_plant),
            ("grow_small_herbivore", self.grow_small_herbivore),
            ("grow_small_carnivore", self.grow_small_carnivore),
            ("grow_big_herbivore", self.grow_big_herbivore),
            ("grow_big_carnivore", self.grow_big_carnivore),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budgets_follow_goal_verb_and_target_category() {
        let table = HorizonTable::default();
        let taxonomy = Taxonomy::builtin();
        assert_eq!(table.max_steps("Grasp chair", &taxonomy), 3);
        assert_eq!(table.max_steps("Grow carrot", &taxonomy), 6);
        assert_eq!(table.max_steps("Grow cow", &taxonomy), 10);
        assert_eq!(table.max_steps("Grow elephant", &taxonomy), 22);
        assert_eq!(table.max_steps("Grow lion", &taxonomy), 30);
        assert_eq!(table.max_steps("Grow any plant", &taxonomy), 6);
    }

    #[test]
    fn impossible_or_unknown_goals_use_the_small_carnivore_budget() {
        let table = HorizonTable::default();
        let taxonomy = Taxonomy::builtin();
        assert_eq!(table.max_steps("Grow chair", &taxonomy), 15);
        assert_eq!(table.max_steps("Grow dragon", &taxonomy), 15);
        assert_eq!(table.max_steps("Go to cow", &taxonomy), 15);
        assert_eq!(table.max_steps("", &taxonomy), 15);
    }

    #[test]
    fn budgets_increase_with_food_chain_rank() {
        let table = HorizonTable::default();
        let ordered = [
            table.grow_plant,
            table.grow_small_herbivore,
            table.grow_small_carnivore,
            table.grow_big_herbivore,
            table.grow_big_carnivore,
        ];
        assert!(ordered.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
