use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::action::GripperSignal;
use super::color::Rgb;
use super::entity::{Category, Entity, EntityId};
use super::geometry::{in_contact, Vec2};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedObject {
    pub id: EntityId,
    pub type_name: String,
    pub category: Category,
    pub color_name: Option<String>,
    pub rgb: Rgb,
    pub position: Vec2,
    pub size: f32,
    pub grasped: bool,
    pub grown_once: bool,
    pub grew_this_step: bool,
    pub relative_attributes: BTreeMap<String, String>,
}

impl ObservedObject {
    pub(crate) fn from_entity(entity: &Entity) -> Self {
        Self {
            id: entity.id(),
            type_name: entity.type_name().to_string(),
            category: entity.category(),
            color_name: entity.color_name().map(str::to_string),
            rgb: entity.rgb(),
            position: entity.position(),
            size: entity.size(),
            grasped: entity.is_grasped(),
            grown_once: entity.grown_once(),
            grew_this_step: entity.grew_this_step(),
            relative_attributes: entity.relative_attributes().clone(),
        }
    }
}

/// Raw post-step state handed to reward and hindsight collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObservation {
    pub agent_position: Vec2,
    pub agent_size: f32,
    pub gripper: GripperSignal,
    /// Live objects in slot order.
    pub objects: Vec<ObservedObject>,
    /// One feature row per slot, consumed slots zero-filled.
    pub features: Vec<Vec<f32>>,
}

impl SceneObservation {
    pub fn held(&self) -> impl Iterator<Item = &ObservedObject> {
        self.objects.iter().filter(|object| object.grasped)
    }

    pub fn is_standing_on(&self, object: &ObservedObject) -> bool {
        !object.grasped
            && in_contact(
                self.agent_position,
                self.agent_size,
                object.position,
                object.size,
            )
    }
}
