use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::color::Rgb;
use super::geometry::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeDimension {
    Position,
    Color,
    Size,
}

/// Feature rows of every arena slot, consumed slots included as zero rows.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<Vec<f32>>,
    nb_types: usize,
}

impl FeatureMatrix {
    pub fn new(rows: Vec<Vec<f32>>, nb_types: usize) -> Self {
        Self { rows, nb_types }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }

    pub fn nb_types(&self) -> usize {
        self.nb_types
    }

    /// A row is present when its type one-hot is set.
    pub fn is_present(&self, index: usize) -> bool {
        self.rows
            .get(index)
            .is_some_and(|row| row[..self.nb_types].iter().any(|value| *value != 0.0))
    }

    pub fn present_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.rows.len()).filter(|index| self.is_present(*index))
    }

    pub fn position(&self, index: usize) -> Vec2 {
        Vec2::new(self.tail(index, 0), self.tail(index, 1))
    }

    pub fn size(&self, index: usize) -> f32 {
        self.tail(index, 2)
    }

    pub fn rgb(&self, index: usize) -> Rgb {
        Rgb {
            r: self.tail(index, 3),
            g: self.tail(index, 4),
            b: self.tail(index, 5),
        }
    }

    pub fn grasped(&self, index: usize) -> bool {
        self.tail(index, 6) > 0.0
    }

    fn tail(&self, index: usize, offset: usize) -> f32 {
        self.rows
            .get(index)
            .and_then(|row| row.get(self.nb_types + offset))
            .copied()
            .unwrap_or(0.0)
    }
}

pub type RankFn = dyn Fn(&FeatureMatrix, usize) -> String + Send + Sync;

#[derive(Clone)]
pub struct Ranker {
    name: String,
    dimension: AttributeDimension,
    rank: Arc<RankFn>,
}

impl Ranker {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimension(&self) -> AttributeDimension {
        self.dimension
    }

    pub fn rank(&self, features: &FeatureMatrix, index: usize) -> String {
        (self.rank)(features, index)
    }
}

impl fmt::Debug for Ranker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ranker")
            .field("name", &self.name)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

/// Named ranking functions, one per relative attribute.
#[derive(Debug, Clone, Default)]
pub struct AttributeRegistry {
    rankers: Vec<Ranker>,
    lookup_by_name: HashMap<String, usize>,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register(
                "relative_positions",
                AttributeDimension::Position,
                rank_relative_position,
            )
            .expect("built-in ranker registration should not fail");
        registry
            .register("relative_sizes", AttributeDimension::Size, rank_relative_size)
            .expect("built-in ranker registration should not fail");
        registry
            .register(
                "relative_shades",
                AttributeDimension::Color,
                rank_relative_shade,
            )
            .expect("built-in ranker registration should not fail");
        registry
    }

    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        dimension: AttributeDimension,
        rank: F,
    ) -> Result<(), String>
    where
        F: Fn(&FeatureMatrix, usize) -> String + Send + Sync + 'static,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("attribute name cannot be empty".to_string());
        }
        if self.lookup_by_name.contains_key(&name) {
            return Err(format!("duplicate ranker registration: {name}"));
        }
        self.rankers.push(Ranker {
            name: name.clone(),
            dimension,
            rank: Arc::new(rank),
        });
        self.lookup_by_name.insert(name, self.rankers.len() - 1);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Ranker> {
        let index = self.lookup_by_name.get(name)?;
        self.rankers.get(*index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ranker> {
        self.rankers.iter()
    }

    /// Rankers touched by a change along `dimension`; `None` selects all.
    pub(crate) fn affected_by(
        &self,
        dimension: Option<AttributeDimension>,
    ) -> impl Iterator<Item = &Ranker> {
        self.rankers.iter().filter(move |ranker| match dimension {
            Some(dimension) => ranker.dimension == dimension,
            None => true,
        })
    }
}

pub fn rank_relative_position(features: &FeatureMatrix, index: usize) -> String {
    extreme_label(
        features,
        index,
        |row| features.position(row).x,
        ["leftmost", "rightmost", "middle"],
    )
}

pub fn rank_relative_size(features: &FeatureMatrix, index: usize) -> String {
    extreme_label(
        features,
        index,
        |row| features.size(row),
        ["smallest", "biggest", "medium"],
    )
}

pub fn rank_relative_shade(features: &FeatureMatrix, index: usize) -> String {
    extreme_label(
        features,
        index,
        |row| features.rgb(row).lightness(),
        ["darkest", "lightest", "medium"],
    )
}

/// Labels `index` as the minimum, the maximum or neither among present rows.
/// Ties go to the extreme label; a lone row is the minimum.
fn extreme_label<K>(features: &FeatureMatrix, index: usize, key: K, labels: [&str; 3]) -> String
where
    K: Fn(usize) -> f32,
{
    let own = key(index);
    let mut is_min = true;
    let mut is_max = true;
    for other in features.present_indices().filter(|other| *other != index) {
        let value = key(other);
        if value < own {
            is_min = false;
        }
        if value > own {
            is_max = false;
        }
    }
    let [low, high, middle] = labels;
    if is_min {
        low.to_string()
    } else if is_max {
        high.to_string()
    } else {
        middle.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NB_TYPES: usize = 2;

    fn row(type_index: usize, x: f32, size: f32, shade: f32) -> Vec<f32> {
        let mut row = vec![0.0; NB_TYPES + 7];
        row[type_index] = 1.0;
        row[NB_TYPES] = x;
        row[NB_TYPES + 2] = size;
        row[NB_TYPES + 3] = shade;
        row[NB_TYPES + 4] = shade;
        row[NB_TYPES + 5] = shade;
        row[NB_TYPES + 6] = -1.0;
        row
    }

    fn matrix() -> FeatureMatrix {
        FeatureMatrix::new(
            vec![
                row(0, -0.5, 0.2, 0.1),
                vec![0.0; NB_TYPES + 7],
                row(1, 0.7, 0.24, 0.9),
                row(0, 0.1, 0.22, 0.5),
            ],
            NB_TYPES,
        )
    }

    #[test]
    fn zero_rows_are_absent() {
        let features = matrix();
        assert!(features.is_present(0));
        assert!(!features.is_present(1));
        assert_eq!(features.present_indices().collect::<Vec<_>>(), vec![0, 2, 3]);
    }

    #[test]
    fn default_rankers_label_extremes() {
        let features = matrix();
        assert_eq!(rank_relative_position(&features, 0), "leftmost");
        assert_eq!(rank_relative_position(&features, 2), "rightmost");
        assert_eq!(rank_relative_position(&features, 3), "middle");
        assert_eq!(rank_relative_size(&features, 2), "biggest");
        assert_eq!(rank_relative_size(&features, 0), "smallest");
        assert_eq!(rank_relative_shade(&features, 0), "darkest");
        assert_eq!(rank_relative_shade(&features, 2), "lightest");
    }

    #[test]
    fn absent_rows_do_not_affect_ranks() {
        let features = FeatureMatrix::new(
            vec![vec![0.0; NB_TYPES + 7], row(0, 0.3, 0.2, 0.5)],
            NB_TYPES,
        );
        assert_eq!(rank_relative_position(&features, 1), "leftmost");
    }

    #[test]
    fn registry_rejects_duplicates_and_filters_by_dimension() {
        let mut registry = AttributeRegistry::with_defaults();
        let duplicate = registry.register("relative_sizes", AttributeDimension::Size, |_, _| {
            String::new()
        });
        assert!(duplicate.is_err());
        registry
            .register("relative_heights", AttributeDimension::Position, |features, index| {
                format!("{:.1}", features.position(index).y)
            })
            .expect("register");

        let position_rankers = registry
            .affected_by(Some(AttributeDimension::Position))
            .map(Ranker::name)
            .collect::<Vec<_>>();
        assert_eq!(position_rankers, vec!["relative_positions", "relative_heights"]);
        assert_eq!(registry.affected_by(None).count(), 4);
        assert!(registry.lookup("relative_shades").is_some());
    }
}
