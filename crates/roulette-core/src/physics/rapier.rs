//! Physics backend built on `Rapier2D`.

use std::collections::BTreeMap;
use std::fmt;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rapier2d::prelude::*;

use super::{MarblePosition, PhysicsEngine};
use crate::error::PhysicsError;
use crate::marble::MarbleId;
use crate::stage::{BodyKind, EntityShape, MapEntity, MapEntityState, StageDef};

/// Marble radius in world units.
pub const MARBLE_RADIUS: f32 = 0.25;

/// Half thickness of the segments polylines are built from.
const SEGMENT_HALF_THICKNESS: f32 = 0.05;

/// Marbles further away than this are untouched by an impact.
const IMPACT_RANGE: f32 = 10.0;
const IMPACT_POWER: f32 = 5.0;
const SHAKE_POWER: f32 = 5.0;

/// Default gravity vector (downward, in units/s²).
pub fn default_gravity() -> Vector {
    Vector::new(0.0, 10.0)
}

/// A stage entity bound to the body carrying its colliders.
struct StageBody {
    handle: RigidBodyHandle,
    entity: MapEntity,
}

/// `Rapier2D` world holding one stage and its marbles.
pub struct RapierPhysics {
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    gravity: Vector,
    frame: u64,
    initialized: bool,
    stage_bodies: Vec<StageBody>,
    marbles: BTreeMap<MarbleId, RigidBodyHandle>,
    rng: ChaCha8Rng,
}

impl Default for RapierPhysics {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RapierPhysics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RapierPhysics")
            .field("frame", &self.frame)
            .field("rigid_body_count", &self.rigid_body_set.len())
            .field("collider_count", &self.collider_set.len())
            .field("marble_count", &self.marbles.len())
            .finish_non_exhaustive()
    }
}

impl RapierPhysics {
    /// Creates a world whose random impulses come from the thread RNG.
    pub fn new() -> Self {
        Self::with_rng(ChaCha8Rng::from_rng(&mut rand::rng()))
    }

    /// Creates a world with a fixed RNG seed for densities and shakes.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(rng: ChaCha8Rng) -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity: default_gravity(),
            frame: 0,
            initialized: false,
            stage_bodies: Vec::new(),
            marbles: BTreeMap::new(),
            rng,
        }
    }

    /// Number of steps taken since the world was created.
    pub fn current_frame(&self) -> u64 {
        self.frame
    }

    /// Number of live marble bodies.
    pub fn marble_count(&self) -> usize {
        self.marbles.len()
    }

    fn ensure_initialized(&self) -> Result<(), PhysicsError> {
        if self.initialized {
            Ok(())
        } else {
            Err(PhysicsError::NotInitialized)
        }
    }

    fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    fn create_entity(&mut self, entity: &MapEntity) -> Result<(), PhysicsError> {
        let [x, y] = entity.position;
        let builder = match entity.body {
            BodyKind::Static => RigidBodyBuilder::fixed(),
            BodyKind::Kinematic => {
                RigidBodyBuilder::kinematic_velocity_based().angvel(entity.props.angular_velocity)
            }
        };
        let handle = self
            .rigid_body_set
            .insert(builder.translation(Vector::new(x, y)).rotation(entity.angle).build());

        for collider in entity_colliders(entity)? {
            self.collider_set
                .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        }

        self.stage_bodies.push(StageBody {
            handle,
            entity: entity.clone(),
        });
        Ok(())
    }
}

/// Builds colliders in body-local coordinates for a stage entity.
fn entity_colliders(entity: &MapEntity) -> Result<Vec<Collider>, PhysicsError> {
    let props = &entity.props;
    let colliders = match &entity.shape {
        EntityShape::Box {
            width,
            height,
            rotation,
        } => vec![
            ColliderBuilder::cuboid(*width, *height)
                .rotation(*rotation)
                .density(props.density)
                .restitution(props.restitution)
                .build(),
        ],
        EntityShape::Circle { radius } => vec![
            ColliderBuilder::ball(*radius)
                .density(props.density)
                .restitution(props.restitution)
                .build(),
        ],
        EntityShape::Polyline { points } => {
            if points.len() < 2 {
                return Err(PhysicsError::UnsupportedEntity(format!(
                    "polyline with {} point(s)",
                    points.len()
                )));
            }
            points
                .windows(2)
                .map(|pair| {
                    let [start, end] = [pair[0], pair[1]];
                    let mid = [
                        f32::midpoint(start[0], end[0]),
                        f32::midpoint(start[1], end[1]),
                    ];
                    let dx = end[0] - start[0];
                    let dy = end[1] - start[1];
                    let length = (dx * dx + dy * dy).sqrt();

                    ColliderBuilder::cuboid(length / 2.0, SEGMENT_HALF_THICKNESS)
                        .translation(Vector::new(mid[0], mid[1]))
                        .rotation(dy.atan2(dx))
                        .density(props.density)
                        .restitution(props.restitution)
                        .build()
                })
                .collect()
        }
    };
    Ok(colliders)
}

impl PhysicsEngine for RapierPhysics {
    fn init(&mut self) -> Result<(), PhysicsError> {
        self.initialized = true;
        tracing::debug!("[physics] rapier world initialized");
        Ok(())
    }

    fn create_stage(&mut self, stage: &StageDef) -> Result<(), PhysicsError> {
        self.ensure_initialized()?;
        for entity in &stage.entities {
            self.create_entity(entity)?;
        }
        tracing::debug!(
            "[physics] stage '{}' created with {} bodies",
            stage.title,
            self.stage_bodies.len()
        );
        Ok(())
    }

    fn create_marble(&mut self, id: MarbleId, x: f32, y: f32) -> Result<(), PhysicsError> {
        self.ensure_initialized()?;
        if self.marbles.contains_key(&id) {
            return Err(PhysicsError::DuplicateMarble(id));
        }

        let body = RigidBodyBuilder::dynamic()
            .translation(Vector::new(x, y))
            .ccd_enabled(true)
            .enabled(false)
            .build();
        let handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::ball(MARBLE_RADIUS)
            .density(1.0 + self.rng.random::<f32>())
            .restitution(0.2)
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        self.marbles.insert(id, handle);
        Ok(())
    }

    fn step(&mut self, dt: f32) -> Result<(), PhysicsError> {
        self.ensure_initialized()?;
        if !dt.is_finite() || dt <= 0.0 {
            return Err(PhysicsError::Backend(format!("invalid step length {dt}")));
        }

        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &(),
            &(),
        );
        self.frame += 1;
        Ok(())
    }

    fn marble_position(&self, id: MarbleId) -> Option<MarblePosition> {
        let handle = self.marbles.get(&id)?;
        let body = self.rigid_body_set.get(*handle)?;
        let pos = body.translation();
        Some(MarblePosition {
            x: pos.x,
            y: pos.y,
            angle: body.rotation().angle(),
        })
    }

    fn impact(&mut self, id: MarbleId) {
        let Some(src) = self.marble_position(id) else {
            return;
        };

        for (&other_id, &handle) in &self.marbles {
            if other_id == id {
                continue;
            }
            let Some(body) = self.rigid_body_set.get_mut(handle) else {
                continue;
            };

            let pos = body.translation();
            let dx = pos.x - src.x;
            let dy = pos.y - src.y;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist >= IMPACT_RANGE || dist <= f32::EPSILON {
                continue;
            }

            let power = 1.0 - dist / IMPACT_RANGE;
            let scale = power * power * IMPACT_POWER / dist;
            body.apply_impulse(Vector::new(dx * scale, dy * scale), true);
        }
    }

    fn shake_marble(&mut self, id: MarbleId) {
        let Some(&handle) = self.marbles.get(&id) else {
            return;
        };
        let impulse = Vector::new(
            self.rng.random_range(-SHAKE_POWER..SHAKE_POWER),
            self.rng.random_range(-SHAKE_POWER..SHAKE_POWER),
        );
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.apply_impulse(impulse, true);
        }
    }

    fn remove_marble(&mut self, id: MarbleId) {
        if let Some(handle) = self.marbles.remove(&id) {
            self.remove_body(handle);
        }
    }

    fn entities(&self) -> Vec<MapEntityState> {
        self.stage_bodies
            .iter()
            .filter_map(|stage_body| {
                let body = self.rigid_body_set.get(stage_body.handle)?;
                let pos = body.translation();
                Some(MapEntityState {
                    x: pos.x,
                    y: pos.y,
                    angle: body.rotation().angle(),
                    shape: stage_body.entity.shape.clone(),
                    color: stage_body.entity.color,
                    bloom_color: stage_body.entity.bloom_color,
                })
            })
            .collect()
    }

    fn clear(&mut self) {
        self.clear_marbles();
        let handles: Vec<_> = self.stage_bodies.drain(..).map(|b| b.handle).collect();
        for handle in handles {
            self.remove_body(handle);
        }
    }

    fn clear_marbles(&mut self) {
        let handles: Vec<_> = std::mem::take(&mut self.marbles).into_values().collect();
        for handle in handles {
            self.remove_body(handle);
        }
    }

    fn start(&mut self) {
        for handle in self.marbles.values() {
            if let Some(body) = self.rigid_body_set.get_mut(*handle) {
                body.set_enabled(true);
                body.wake_up(true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::EntityProps;

    fn test_stage() -> StageDef {
        StageDef {
            title: "test".to_string(),
            goal_y: 40.0,
            zoom_y: 35.0,
            entities: vec![
                MapEntity {
                    position: [0.0, 0.0],
                    angle: 0.0,
                    body: BodyKind::Static,
                    shape: EntityShape::Polyline {
                        points: vec![[0.0, 60.0], [30.0, 60.0]],
                    },
                    props: EntityProps::default(),
                    color: None,
                    bloom_color: None,
                },
                MapEntity {
                    position: [5.0, 10.0],
                    angle: 0.0,
                    body: BodyKind::Kinematic,
                    shape: EntityShape::Box {
                        width: 1.0,
                        height: 0.1,
                        rotation: 0.0,
                    },
                    props: EntityProps {
                        angular_velocity: 2.0,
                        ..EntityProps::default()
                    },
                    color: None,
                    bloom_color: None,
                },
            ],
        }
    }

    fn ready_world() -> RapierPhysics {
        let mut world = RapierPhysics::with_seed(7);
        world.init().unwrap();
        world.create_stage(&test_stage()).unwrap();
        world
    }

    #[test]
    fn test_requires_init() {
        let mut world = RapierPhysics::with_seed(1);
        assert!(matches!(
            world.create_marble(0, 0.0, 0.0),
            Err(PhysicsError::NotInitialized)
        ));
        assert!(world.step(0.01).is_err());
    }

    #[test]
    fn test_marble_frozen_until_start() {
        let mut world = ready_world();
        world.create_marble(0, 15.0, 0.0).unwrap();

        for _ in 0..50 {
            world.step(0.01).unwrap();
        }
        let before = world.marble_position(0).unwrap();
        assert!((before.y - 0.0).abs() < 1e-4);

        world.start();
        for _ in 0..50 {
            world.step(0.01).unwrap();
        }
        let after = world.marble_position(0).unwrap();
        assert!(after.y > before.y, "marble should fall after start");
    }

    #[test]
    fn test_duplicate_marble_rejected() {
        let mut world = ready_world();
        world.create_marble(3, 15.0, 0.0).unwrap();
        assert!(matches!(
            world.create_marble(3, 16.0, 0.0),
            Err(PhysicsError::DuplicateMarble(3))
        ));
    }

    #[test]
    fn test_impact_pushes_neighbors_away() {
        let mut world = ready_world();
        world.create_marble(0, 15.0, 0.0).unwrap();
        world.create_marble(1, 17.0, 0.0).unwrap();
        world.start();

        world.impact(0);
        world.step(0.01).unwrap();

        let pushed = world.marble_position(1).unwrap();
        assert!(pushed.x > 17.0, "neighbor should be pushed to the right");
    }

    #[test]
    fn test_kinematic_entity_rotates() {
        let mut world = ready_world();
        for _ in 0..10 {
            world.step(0.01).unwrap();
        }

        let spinner = world
            .entities()
            .into_iter()
            .find(|e| matches!(e.shape, EntityShape::Box { .. }))
            .unwrap();
        assert!(spinner.angle > 0.1);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut world = ready_world();
        world.create_marble(0, 15.0, 0.0).unwrap();
        world.create_marble(1, 16.0, 0.0).unwrap();

        world.remove_marble(0);
        assert!(world.marble_position(0).is_none());
        assert_eq!(world.marble_count(), 1);

        world.clear_marbles();
        assert_eq!(world.marble_count(), 0);
        assert_eq!(world.entities().len(), 2);

        world.clear();
        assert!(world.entities().is_empty());
    }
}
