use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::params::{EnvParams, PhysicsParams};

use super::action::{GripperSignal, PhysicalAction};
use super::attributes::{AttributeDimension, AttributeRegistry, FeatureMatrix};
use super::color::Rgb;
use super::entity::{zero_features, Entity, EntityDescriptor, EntityId};
use super::geometry::{in_contact, PlacementRegion, Vec2};
use super::growth::{find_meal, GrowthInputs};
use super::observation::{ObservedObject, SceneObservation};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    #[error("unknown object type '{type_name}'")]
    UnknownType { type_name: String },
    #[error("unknown color '{color}'")]
    UnknownColor { color: String },
    #[error("could not place '{type_name}' after {attempts} attempts")]
    PlacementExhausted { type_name: String, attempts: u32 },
    #[error("no live entity with id {0:?}")]
    UnknownEntity(EntityId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Agent {
    pub position: Vec2,
    pub size: f32,
    pub gripper: GripperSignal,
}

/// What changed during one `apply_action`, both sub-steps included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    pub grown: Vec<EntityId>,
    pub consumed: Vec<EntityId>,
    pub grasped: Vec<EntityId>,
    pub released: Vec<EntityId>,
}

/// Sole owner of the entities of one episode. Entities live in fixed slots
/// addressed by `EntityId`; consumption empties a slot.
#[derive(Debug, Clone)]
pub struct SceneWorld {
    slots: Vec<Option<Entity>>,
    agent: Agent,
    physics: PhysicsParams,
    attributes: AttributeRegistry,
    nb_types: usize,
    pending_despawns: Vec<EntityId>,
}

impl SceneWorld {
    pub fn generate<R: Rng + ?Sized>(
        descriptors: &[EntityDescriptor],
        params: &EnvParams,
        rng: &mut R,
    ) -> Result<Self, SceneError> {
        let physics = params.physics.clone();
        let mut slots = Vec::with_capacity(descriptors.len());
        for (idx, descriptor) in descriptors.iter().enumerate() {
            let id = EntityId(idx as u32);
            let mut entity = Entity::create(descriptor, id, &params.taxonomy, &physics, rng)?;
            let position = sample_position(&slots, &entity, &physics, rng)?;
            entity.set_position(position);
            slots.push(Some(entity));
        }

        let mut world = Self {
            slots,
            agent: Agent {
                position: Vec2::ZERO,
                size: physics.agent_size,
                gripper: GripperSignal::Idle,
            },
            physics,
            attributes: params.attributes.clone(),
            nb_types: params.nb_types(),
            pending_despawns: Vec::new(),
        };
        world.refresh_attributes(None);
        info!(entity_count = world.slots.len(), "scene_generated");
        Ok(world)
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn physics(&self) -> &PhysicsParams {
        &self.physics
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn entity_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().flatten()
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id.index())?.as_ref()
    }

    /// Grasped entities in slot order.
    pub fn held_ids(&self) -> Vec<EntityId> {
        self.entities()
            .filter(|entity| entity.is_grasped())
            .map(Entity::id)
            .collect()
    }

    pub fn feature_matrix(&self) -> FeatureMatrix {
        let rows = self
            .slots
            .iter()
            .map(|slot| match slot {
                Some(entity) => entity.features(self.nb_types),
                None => zero_features(self.nb_types),
            })
            .collect();
        FeatureMatrix::new(rows, self.nb_types)
    }

    pub fn observation(&self) -> SceneObservation {
        SceneObservation {
            agent_position: self.agent.position,
            agent_size: self.agent.size,
            gripper: self.agent.gripper,
            objects: self.entities().map(ObservedObject::from_entity).collect(),
            features: self.feature_matrix().rows().to_vec(),
        }
    }

    /// Applies one action. A nonzero move is followed by a zero-displacement
    /// sub-step that repeats the gripper signal.
    pub fn apply_action(&mut self, action: PhysicalAction) -> StepReport {
        let mut report = StepReport::default();
        self.apply_sub_step(action, &mut report);
        if !action.delta.is_zero() {
            self.apply_sub_step(action.settle(), &mut report);
        }
        report
    }

    fn apply_sub_step(&mut self, action: PhysicalAction, report: &mut StepReport) {
        self.agent.position = self.agent.position.offset_by(action.delta).clamped_to_arena();
        self.agent.gripper = action.gripper;
        let release_targets = self.release_targets(action.gripper);

        for index in 0..self.slots.len() {
            let meal = match &self.slots[index] {
                Some(entity) => find_meal(
                    &GrowthInputs {
                        slots: &self.slots,
                        release_targets: &release_targets,
                    },
                    entity,
                ),
                None => continue,
            };
            let Some(entity) = self.slots[index].as_mut() else {
                continue;
            };

            if let Some(partners) = meal {
                let grown_size = self.physics.grown_size(entity.size());
                entity.set_size(grown_size, &self.physics);
                entity.mark_grown();
                entity.set_grasped(false);
                debug!(
                    entity = entity.id().0,
                    type_name = entity.type_name(),
                    partners = ?partners,
                    "entity_grew"
                );
                report.grown.push(entity.id());
                self.pending_despawns.extend(partners);
            }

            if self.pending_despawns.contains(&entity.id()) {
                continue;
            }
            if action.gripper.is_closed()
                && !entity.is_grasped()
                && in_contact(
                    entity.position(),
                    entity.size(),
                    self.agent.position,
                    self.agent.size,
                )
            {
                entity.set_grasped(true);
                debug!(entity = entity.id().0, type_name = entity.type_name(), "entity_grasped");
                report.grasped.push(entity.id());
            }
            if entity.is_grasped() {
                entity.set_position(self.agent.position);
            }
        }

        for id in release_targets {
            if let Some(Some(entity)) = self.slots.get_mut(id.index()) {
                if entity.is_grasped() {
                    entity.set_grasped(false);
                    debug!(entity = id.0, type_name = entity.type_name(), "entity_released");
                    report.released.push(id);
                }
            }
        }

        let consumed = self.apply_pending();
        if consumed.is_empty() {
            self.refresh_attributes(None);
        }
        report.consumed.extend(consumed);
    }

    fn release_targets(&self, gripper: GripperSignal) -> Vec<EntityId> {
        let held = self.held_ids();
        match gripper {
            GripperSignal::ReleaseFirst => held.into_iter().take(1).collect(),
            GripperSignal::ReleaseOther => held.into_iter().skip(1).take(1).collect(),
            GripperSignal::ReleaseAll => held,
            GripperSignal::Move | GripperSignal::Idle | GripperSignal::Close => Vec::new(),
        }
    }

    /// Marks a live entity for removal at the end of the current sub-step.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        if self.find_entity(id).is_none() {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    /// Empties every pending slot once and returns the removed ids.
    pub fn apply_pending(&mut self) -> Vec<EntityId> {
        if self.pending_despawns.is_empty() {
            return Vec::new();
        }
        self.pending_despawns.sort_by_key(|id| id.0);
        self.pending_despawns.dedup();
        let mut removed = Vec::with_capacity(self.pending_despawns.len());
        for id in self.pending_despawns.drain(..) {
            if let Some(slot) = self.slots.get_mut(id.index()) {
                if slot.take().is_some() {
                    debug!(entity = id.0, "entity_consumed");
                    removed.push(id);
                }
            }
        }
        if !removed.is_empty() {
            self.refresh_attributes(None);
        }
        removed
    }

    /// Clears the "grew this step" marks. Called once per environment step.
    pub fn reset_growth_marks(&mut self) {
        for entity in self.slots.iter_mut().flatten() {
            entity.clear_growth_mark();
        }
    }

    pub fn update_position(&mut self, id: EntityId, position: Vec2) -> Result<(), SceneError> {
        self.entity_mut(id)?.set_position(position);
        self.refresh_attributes(Some(AttributeDimension::Position));
        Ok(())
    }

    pub fn update_size(&mut self, id: EntityId, size: f32) -> Result<(), SceneError> {
        let physics = self.physics.clone();
        self.entity_mut(id)?.set_size(size, &physics);
        self.refresh_attributes(Some(AttributeDimension::Size));
        Ok(())
    }

    pub fn update_color(&mut self, id: EntityId, rgb: Rgb) -> Result<(), SceneError> {
        self.entity_mut(id)?.set_rgb(rgb);
        self.refresh_attributes(Some(AttributeDimension::Color));
        Ok(())
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, SceneError> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(SceneError::UnknownEntity(id))
    }

    fn refresh_attributes(&mut self, dimension: Option<AttributeDimension>) {
        let features = self.feature_matrix();
        let mut labels = Vec::new();
        for ranker in self
            .attributes
            .affected_by(dimension)
            .filter(|ranker| self.physics.is_admissible(ranker.name()))
        {
            for index in features.present_indices() {
                labels.push((index, ranker.name(), ranker.rank(&features, index)));
            }
        }
        let refreshed = labels.len();
        for (index, name, label) in labels {
            if let Some(Some(entity)) = self.slots.get_mut(index) {
                entity.set_relative_attribute(name, label);
            }
        }
        trace!(dimension = ?dimension, refreshed, "attributes_refreshed");
    }
}

fn sample_position<R: Rng + ?Sized>(
    placed: &[Option<Entity>],
    entity: &Entity,
    physics: &PhysicsParams,
    rng: &mut R,
) -> Result<Vec2, SceneError> {
    let region = PlacementRegion::from_hint(entity.position_hint());
    for _ in 0..physics.max_placement_attempts {
        let candidate = Vec2::new(
            rng.gen_range(region.low.x..=region.high.x),
            rng.gen_range(region.low.y..=region.high.y),
        );
        let separated = placed
            .iter()
            .flatten()
            .all(|other| other.position().distance(candidate) >= physics.min_initial_separation);
        if separated {
            return Ok(candidate);
        }
    }
    Err(SceneError::PlacementExhausted {
        type_name: entity.type_name().to_string(),
        attempts: physics.max_placement_attempts,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::world::geometry::PositionHint;

    fn world(types: &[&str]) -> SceneWorld {
        let descriptors = types
            .iter()
            .map(|type_name| EntityDescriptor::new(*type_name))
            .collect::<Vec<_>>();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        SceneWorld::generate(&descriptors, &EnvParams::builtin(), &mut rng).expect("scene")
    }

    fn walk_to(world: &mut SceneWorld, id: EntityId, gripper: GripperSignal) -> StepReport {
        let target = world.find_entity(id).expect("target").position();
        let delta = world.agent().position.delta_to(target);
        world.apply_action(PhysicalAction::new(delta, gripper))
    }

    #[test]
    fn generation_respects_separation_and_is_reproducible() {
        let a = world(&["carrot", "water", "cow", "chair"]);
        let b = world(&["carrot", "water", "cow", "chair"]);
        let positions = a.entities().map(Entity::position).collect::<Vec<_>>();
        assert_eq!(positions, b.entities().map(Entity::position).collect::<Vec<_>>());
        for (i, first) in positions.iter().enumerate() {
            for second in &positions[i + 1..] {
                assert!(first.distance(*second) >= a.physics().min_initial_separation);
            }
        }
    }

    #[test]
    fn unknown_type_aborts_generation() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let error = SceneWorld::generate(
            &[EntityDescriptor::new("carrot"), EntityDescriptor::new("dragon")],
            &EnvParams::builtin(),
            &mut rng,
        )
        .expect_err("unknown type");
        assert_eq!(
            error,
            SceneError::UnknownType {
                type_name: "dragon".to_string()
            }
        );
    }

    #[test]
    fn impossible_separation_exhausts_placement() {
        let mut params = EnvParams::builtin();
        params.physics.min_initial_separation = 5.0;
        params.physics.max_placement_attempts = 20;
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let error = SceneWorld::generate(
            &[EntityDescriptor::new("carrot"), EntityDescriptor::new("water")],
            &params,
            &mut rng,
        )
        .expect_err("placement");
        assert!(matches!(error, SceneError::PlacementExhausted { attempts: 20, .. }));
    }

    #[test]
    fn position_hint_restricts_the_half_plane() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let scene = SceneWorld::generate(
            &[EntityDescriptor::new("chair").with_position(PositionHint::Left)],
            &EnvParams::builtin(),
            &mut rng,
        )
        .expect("scene");
        let chair = scene.find_entity(EntityId(0)).expect("chair");
        assert!(chair.position().x <= 0.0);
    }

    #[test]
    fn grasped_entity_follows_the_agent() {
        let mut scene = world(&["chair", "cow"]);
        walk_to(&mut scene, EntityId(0), GripperSignal::Move);
        let report = scene.apply_action(PhysicalAction::grip(GripperSignal::Close));
        assert_eq!(report.grasped, vec![EntityId(0)]);

        let report = scene.apply_action(PhysicalAction::move_by(Vec2::new(0.1, 0.1)));
        assert!(report.grasped.is_empty());
        let chair = scene.find_entity(EntityId(0)).expect("chair");
        assert!(chair.is_grasped());
        assert_eq!(chair.position(), scene.agent().position);
    }

    #[test]
    fn release_into_contact_grows_the_plant_and_consumes_water() {
        let mut scene = world(&["carrot", "water"]);
        walk_to(&mut scene, EntityId(1), GripperSignal::Move);
        scene.apply_action(PhysicalAction::grip(GripperSignal::Close));
        assert_eq!(scene.held_ids(), vec![EntityId(1)]);

        let report = walk_to(&mut scene, EntityId(0), GripperSignal::Move);
        assert!(report.grown.is_empty(), "held water must not feed the plant");

        let report = scene.apply_action(PhysicalAction::grip(GripperSignal::ReleaseAll));
        assert_eq!(report.grown, vec![EntityId(0)]);
        assert_eq!(report.consumed, vec![EntityId(1)]);
        assert!(scene.find_entity(EntityId(1)).is_none());
        let carrot = scene.find_entity(EntityId(0)).expect("carrot");
        assert!(carrot.grown_once());
        assert!(carrot.grew_this_step());
        assert!((carrot.size() - 0.24).abs() < 1e-6);

        scene.reset_growth_marks();
        let carrot = scene.find_entity(EntityId(0)).expect("carrot");
        assert!(carrot.grown_once());
        assert!(!carrot.grew_this_step());
        assert_eq!(scene.feature_matrix().rows()[1], zero_features(176));
    }

    #[test]
    fn release_other_frees_the_second_held_entity() {
        let mut scene = world(&["chair", "table"]);
        let chair = scene.find_entity(EntityId(0)).expect("chair").position();
        let table = scene.find_entity(EntityId(1)).expect("table").position();
        scene.apply_action(PhysicalAction::move_by(scene.agent().position.delta_to(chair)));
        scene.apply_action(PhysicalAction::grip(GripperSignal::Close));
        scene.apply_action(PhysicalAction::move_by(scene.agent().position.delta_to(table)));
        scene.apply_action(PhysicalAction::grip(GripperSignal::Close));
        assert_eq!(scene.held_ids(), vec![EntityId(0), EntityId(1)]);

        let report = scene.apply_action(PhysicalAction::grip(GripperSignal::ReleaseOther));
        assert_eq!(report.released, vec![EntityId(1)]);
        assert_eq!(scene.held_ids(), vec![EntityId(0)]);

        let report = scene.apply_action(PhysicalAction::grip(GripperSignal::ReleaseOther));
        assert!(report.released.is_empty());
    }

    #[test]
    fn release_all_with_empty_hands_changes_nothing() {
        let mut scene = world(&["carrot", "chair"]);
        let before = scene.observation();
        let report = scene.apply_action(PhysicalAction::grip(GripperSignal::ReleaseAll));
        assert_eq!(report, StepReport::default());
        assert_eq!(scene.observation().objects, before.objects);
    }

    #[test]
    fn one_water_feeds_every_seed_it_touches() {
        let mut scene = world(&["carrot", "potato", "water"]);
        for index in 0..3 {
            scene
                .update_position(EntityId(index), Vec2::new(0.5, 0.5))
                .expect("stack");
        }
        let report = scene.apply_action(PhysicalAction::IDLE);
        assert_eq!(report.grown, vec![EntityId(0), EntityId(1)]);
        assert_eq!(report.consumed, vec![EntityId(2)]);
        assert_eq!(scene.entity_count(), 2);
        assert!(scene.entities().all(Entity::grown_once));
    }

    #[test]
    fn duplicate_pending_despawns_are_applied_once() {
        let mut scene = world(&["carrot", "chair"]);
        assert!(scene.despawn(EntityId(0)));
        assert!(scene.despawn(EntityId(0)));
        assert_eq!(scene.apply_pending(), vec![EntityId(0)]);
        assert!(!scene.despawn(EntityId(0)));
        assert_eq!(scene.entity_count(), 1);
        assert_eq!(scene.slot_count(), 2);
    }

    #[test]
    fn updates_refresh_relative_attributes_of_every_entity() {
        let mut scene = world(&["chair", "table"]);
        scene
            .update_position(EntityId(0), Vec2::new(-0.9, 0.0))
            .expect("move chair");
        scene
            .update_position(EntityId(1), Vec2::new(0.9, 0.0))
            .expect("move table");
        let label = |scene: &SceneWorld, id| {
            scene
                .find_entity(id)
                .expect("entity")
                .relative_attribute("relative_positions")
                .map(str::to_string)
        };
        assert_eq!(label(&scene, EntityId(0)).as_deref(), Some("leftmost"));
        assert_eq!(label(&scene, EntityId(1)).as_deref(), Some("rightmost"));

        scene
            .update_position(EntityId(0), Vec2::new(5.0, 0.0))
            .expect("clipped");
        assert_eq!(scene.find_entity(EntityId(0)).expect("chair").position().x, 1.0);
        assert_eq!(label(&scene, EntityId(1)).as_deref(), Some("leftmost"));

        scene.update_size(EntityId(1), 0.29).expect("size");
        assert_eq!(
            scene
                .find_entity(EntityId(1))
                .expect("table")
                .relative_attribute("relative_sizes"),
            Some("biggest")
        );
        scene
            .update_color(EntityId(0), Rgb { r: 0.0, g: 0.0, b: 0.0 })
            .expect("color");
        assert_eq!(
            scene
                .find_entity(EntityId(0))
                .expect("chair")
                .relative_attribute("relative_shades"),
            Some("darkest")
        );
        assert_eq!(
            scene.update_size(EntityId(9), 0.2),
            Err(SceneError::UnknownEntity(EntityId(9)))
        );
    }
}
