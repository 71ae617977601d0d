use glam::Vec3;
use tracing::debug;

use crate::error::SceneError;
use crate::model::entity::{Behavior, Entity, EntityId, Geometry, Material, RotationOrder, Transform};
use crate::view::RenderBackend;

/// Every entity of a session. Entities are added once and never removed.
#[derive(Debug, Default)]
pub struct Scene {
    entities: Vec<Entity>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        self.entities.push(entity);
        id
    }

    /// Create the entity with the renderer first, then register it.
    pub fn spawn<R: RenderBackend + ?Sized>(
        &mut self,
        renderer: &mut R,
        geometry: Geometry,
        material: Material,
        transform: Transform,
        behavior: Behavior,
    ) -> EntityId {
        let handle = renderer.create_entity(&geometry, &material);
        let id = self.add(Entity::new(handle, geometry, material, transform, behavior));
        debug!(%id, ?geometry, ?behavior, "spawned entity");
        id
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        (id.0 as usize) < self.entities.len()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.0 as usize)
    }

    pub fn check(&self, id: EntityId) -> Result<(), SceneError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(SceneError::UnknownEntity(id))
        }
    }

    /// Panics if `id` was never added.
    pub fn entity(&self, id: EntityId) -> &Entity {
        self.get(id)
            .unwrap_or_else(|| panic!("entity {id} is not part of the scene"))
    }

    /// Panics if `id` was never added.
    pub fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        self.get_mut(id)
            .unwrap_or_else(|| panic!("entity {id} is not part of the scene"))
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityId(i as u32), e))
    }

    /// Run every entity's self-contained update.
    pub fn animate(&mut self) {
        for entity in &mut self.entities {
            entity.animate();
        }
    }
}

/// Ids of the toy scene's entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Playground {
    pub ground: EntityId,
    pub player: EntityId,
    pub cubes: [EntityId; 3],
}

impl Playground {
    /// Ground plane, three spinning cubes and the player cube.
    pub fn build<R: RenderBackend + ?Sized>(scene: &mut Scene, renderer: &mut R) -> Self {
        let ground = scene.spawn(
            renderer,
            Geometry::Plane { width: 100.0, depth: 100.0 },
            Material::from_hex(0xcccccc),
            Transform::default(),
            Behavior::Static,
        );

        let cube_specs = [
            (0x00ff00, Vec3::ZERO),
            (0xffff00, Vec3::new(0.0, 5.0, 0.0)),
            (0xff0000, Vec3::new(0.0, 10.0, 0.0)),
        ];
        let cubes = cube_specs.map(|(color, position)| {
            scene.spawn(
                renderer,
                Geometry::cube(1.0),
                Material::from_hex(color),
                Transform::at(position),
                Behavior::spin(),
            )
        });

        let player = scene.spawn(
            renderer,
            Geometry::cube(10.0),
            Material::from_hex(0xff00ff),
            Transform::at(Vec3::new(0.0, 10.0, 0.0)).with_order(RotationOrder::Yxz),
            Behavior::controlled(),
        );

        Self { ground, player, cubes }
    }

    /// Cube selected by the `1`..`3` keys (1-based).
    pub fn cube(&self, number: usize) -> Option<EntityId> {
        number.checked_sub(1).and_then(|i| self.cubes.get(i).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::RenderHandle;

    fn cube(behavior: Behavior) -> Entity {
        Entity::new(
            RenderHandle(0),
            Geometry::cube(1.0),
            Material::from_hex(0xffffff),
            Transform::default(),
            behavior,
        )
    }

    #[test]
    fn ids_are_sequential() {
        let mut scene = Scene::new();
        let a = scene.add(cube(Behavior::Static));
        let b = scene.add(cube(Behavior::spin()));
        assert_eq!(a, EntityId(0));
        assert_eq!(b, EntityId(1));
        assert_eq!(scene.len(), 2);
        assert!(scene.contains(b));
        assert!(!scene.contains(EntityId(2)));
    }

    #[test]
    fn animate_only_spins_spinners() {
        let mut scene = Scene::new();
        let still = scene.add(cube(Behavior::Static));
        let spinner = scene.add(cube(Behavior::spin()));
        scene.animate();
        assert_eq!(scene.entity(still).transform.rotation, Vec3::ZERO);
        assert!(scene.entity(spinner).transform.rotation.x > 0.0);
    }

    #[test]
    fn check_reports_unknown_entity() {
        let scene = Scene::new();
        assert_eq!(scene.check(EntityId(7)), Err(SceneError::UnknownEntity(EntityId(7))));
    }

    #[test]
    #[should_panic(expected = "not part of the scene")]
    fn entity_lookup_fails_fast() {
        Scene::new().entity(EntityId(0));
    }
}
