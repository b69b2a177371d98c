mod action;
mod attributes;
mod color;
mod entity;
mod geometry;
mod growth;
mod observation;
mod scene;

pub use action::{GripperSignal, PhysicalAction};
pub use attributes::{
    rank_relative_position, rank_relative_shade, rank_relative_size, AttributeDimension,
    AttributeRegistry, FeatureMatrix, RankFn, Ranker,
};
pub use color::{color_by_name, color_names, is_color_name, Rgb};
pub use entity::{
    zero_features, Category, Entity, EntityDescriptor, EntityId, FEATURE_TAIL_LEN, WATER_TYPE,
};
pub use geometry::{in_contact, PlacementRegion, PositionHint, Vec2, ARENA_MAX, ARENA_MIN};
pub use growth::{diet_of, Diet, Meal};
pub use observation::{ObservedObject, SceneObservation};
pub use scene::{Agent, SceneError, SceneWorld, StepReport};
