pub mod content;
mod params;
pub mod world;

pub use content::{
    compile_builtin_taxonomy, compile_taxonomy, ContentCompileError, ContentErrorCode,
    SourceLocation, Taxonomy, TypeDef, TypeDefId,
};
pub use params::{EnvParams, ParamsError, PhysicsParams};
pub use world::{
    color_by_name, is_color_name, AttributeRegistry, Category, Entity, EntityDescriptor, EntityId,
    FeatureMatrix, GripperSignal, ObservedObject, PhysicalAction, PositionHint, Rgb,
    SceneError, SceneObservation, SceneWorld, StepReport, Vec2, WATER_TYPE,
};

/// Default environment parameters: built-in taxonomy, default physics and
/// the default relative-attribute rankers.
pub fn get_env_params() -> EnvParams {
    EnvParams::builtin()
}
