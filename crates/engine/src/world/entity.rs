use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::content::{Taxonomy, TypeDefId};
use crate::params::PhysicsParams;

use super::color::{color_by_name, sample_color, Rgb};
use super::geometry::{PositionHint, Vec2};
use super::scene::SceneError;

pub const WATER_TYPE: &str = "water";

/// Values appended after the type one-hot: x, y, size, r, g, b, grasp flag.
pub const FEATURE_TAIL_LEN: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Plant,
    SmallHerbivore,
    BigHerbivore,
    SmallCarnivore,
    BigCarnivore,
    Furniture,
    Supply,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Plant,
        Category::SmallHerbivore,
        Category::BigHerbivore,
        Category::SmallCarnivore,
        Category::BigCarnivore,
        Category::Furniture,
        Category::Supply,
    ];

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Plant => "plant",
            Self::SmallHerbivore => "small_herbivore",
            Self::BigHerbivore => "big_herbivore",
            Self::SmallCarnivore => "small_carnivore",
            Self::BigCarnivore => "big_carnivore",
            Self::Furniture => "furniture",
            Self::Supply => "supply",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.as_token() == token)
    }

    pub fn is_animal(self) -> bool {
        self.is_herbivore() || self.is_carnivore()
    }

    pub fn is_herbivore(self) -> bool {
        matches!(self, Self::SmallHerbivore | Self::BigHerbivore)
    }

    pub fn is_carnivore(self) -> bool {
        matches!(self, Self::SmallCarnivore | Self::BigCarnivore)
    }

    pub fn is_living(self) -> bool {
        self == Self::Plant || self.is_animal()
    }
}

/// Arena slot index. Stable for the whole episode; a consumed entity leaves
/// its slot empty instead of shifting the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub type_name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub position: Option<PositionHint>,
}

impl EntityDescriptor {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            color: None,
            position: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_position(mut self, position: PositionHint) -> Self {
        self.position = Some(position);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    type_id: TypeDefId,
    type_name: String,
    category: Category,
    color_name: Option<String>,
    rgb: Rgb,
    position_hint: Option<PositionHint>,
    position: Vec2,
    size: f32,
    grasped: bool,
    grown_once: bool,
    grew_this_step: bool,
    relative_attributes: BTreeMap<String, String>,
}

impl Entity {
    pub fn create<R: Rng + ?Sized>(
        descriptor: &EntityDescriptor,
        id: EntityId,
        taxonomy: &Taxonomy,
        physics: &PhysicsParams,
        rng: &mut R,
    ) -> Result<Self, SceneError> {
        let type_def = taxonomy
            .type_def_by_name(&descriptor.type_name)
            .ok_or_else(|| SceneError::UnknownType {
                type_name: descriptor.type_name.clone(),
            })?;
        let rgb = match descriptor.color.as_deref() {
            Some(name) => color_by_name(name).ok_or_else(|| SceneError::UnknownColor {
                color: name.to_string(),
            })?,
            None => sample_color(rng),
        };

        Ok(Self {
            id,
            type_id: type_def.id,
            type_name: type_def.type_name.clone(),
            category: type_def.category,
            color_name: descriptor.color.clone(),
            rgb,
            position_hint: descriptor.position,
            position: Vec2::ZERO,
            size: physics.clamp_size(physics.initial_size),
            grasped: false,
            grown_once: false,
            grew_this_step: false,
            relative_attributes: BTreeMap::new(),
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn type_id(&self) -> TypeDefId {
        self.type_id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn color_name(&self) -> Option<&str> {
        self.color_name.as_deref()
    }

    pub fn rgb(&self) -> Rgb {
        self.rgb
    }

    pub fn position_hint(&self) -> Option<PositionHint> {
        self.position_hint
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn is_grasped(&self) -> bool {
        self.grasped
    }

    pub fn grown_once(&self) -> bool {
        self.grown_once
    }

    pub fn grew_this_step(&self) -> bool {
        self.grew_this_step
    }

    pub fn is_water(&self) -> bool {
        self.category == Category::Supply && self.type_name == WATER_TYPE
    }

    pub fn relative_attribute(&self, name: &str) -> Option<&str> {
        self.relative_attributes.get(name).map(String::as_str)
    }

    pub fn relative_attributes(&self) -> &BTreeMap<String, String> {
        &self.relative_attributes
    }

    /// Type one-hot followed by position, size, color and grasp flag (±1).
    pub fn features(&self, nb_types: usize) -> Vec<f32> {
        let mut features = vec![0.0; nb_types + FEATURE_TAIL_LEN];
        if let Some(slot) = features.get_mut(self.type_id.0 as usize) {
            *slot = 1.0;
        }
        let tail = &mut features[nb_types..];
        tail[0] = self.position.x;
        tail[1] = self.position.y;
        tail[2] = self.size;
        tail[3..6].copy_from_slice(&self.rgb.channels());
        tail[6] = if self.grasped { 1.0 } else { -1.0 };
        features
    }

    pub(crate) fn set_position(&mut self, position: Vec2) {
        self.position = position.clamped_to_arena();
    }

    pub(crate) fn set_size(&mut self, size: f32, physics: &PhysicsParams) {
        self.size = physics.clamp_size(size);
    }

    pub(crate) fn set_rgb(&mut self, rgb: Rgb) {
        self.rgb = Rgb {
            r: rgb.r.clamp(0.0, 1.0),
            g: rgb.g.clamp(0.0, 1.0),
            b: rgb.b.clamp(0.0, 1.0),
        };
    }

    pub(crate) fn set_grasped(&mut self, grasped: bool) {
        self.grasped = grasped;
    }

    /// One-way transition; the growth flag never resets.
    pub(crate) fn mark_grown(&mut self) {
        self.grown_once = true;
        self.grew_this_step = true;
    }

    pub(crate) fn clear_growth_mark(&mut self) {
        self.grew_this_step = false;
    }

    pub(crate) fn set_relative_attribute(&mut self, name: &str, label: String) {
        self.relative_attributes.insert(name.to_string(), label);
    }
}

pub fn zero_features(nb_types: usize) -> Vec<f32> {
    vec![0.0; nb_types + FEATURE_TAIL_LEN]
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn create(descriptor: &EntityDescriptor) -> Result<Entity, SceneError> {
        let taxonomy = Taxonomy::builtin();
        let physics = PhysicsParams::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        Entity::create(descriptor, EntityId(0), &taxonomy, &physics, &mut rng)
    }

    #[test]
    fn unknown_type_is_rejected() {
        let error = create(&EntityDescriptor::new("unicorn")).expect_err("unknown");
        assert!(matches!(error, SceneError::UnknownType { type_name } if type_name == "unicorn"));
    }

    #[test]
    fn unknown_color_is_rejected() {
        let error =
            create(&EntityDescriptor::new("cow").with_color("ultraviolet")).expect_err("color");
        assert!(matches!(error, SceneError::UnknownColor { .. }));
    }

    #[test]
    fn features_have_stable_dimension_across_categories() {
        let taxonomy = Taxonomy::builtin();
        let nb_types = taxonomy.len();
        for type_name in ["carrot", "cow", "lion", "chair", "water"] {
            let entity = create(&EntityDescriptor::new(type_name)).expect("entity");
            let features = entity.features(nb_types);
            assert_eq!(features.len(), nb_types + FEATURE_TAIL_LEN);
            assert_eq!(features[..nb_types].iter().sum::<f32>(), 1.0);
            assert_eq!(features[nb_types + 6], -1.0);
        }
        assert_eq!(zero_features(nb_types).len(), nb_types + FEATURE_TAIL_LEN);
    }

    #[test]
    fn requested_color_is_kept() {
        let entity = create(&EntityDescriptor::new("carrot").with_color("red")).expect("carrot");
        assert_eq!(entity.color_name(), Some("red"));
        assert_eq!(entity.rgb(), Rgb { r: 1.0, g: 0.0, b: 0.0 });
        assert_eq!(entity.category(), Category::Plant);
        assert!(!entity.grown_once());
    }

    #[test]
    fn category_tokens_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_token(category.as_token()), Some(category));
        }
        assert!(Category::BigCarnivore.is_animal());
        assert!(!Category::Furniture.is_living());
    }
}
