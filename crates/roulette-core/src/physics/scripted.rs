//! Deterministic physics stand-in.
//!
//! Marbles fall along straight lines at scripted velocities and the stage
//! geometry is never collided with. Every call that matters to the race
//! (impacts, shakes, removals) is recorded in a shared [`ScriptedState`] so
//! it can be inspected after the engine has been moved into a `Roulette`.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use super::{MarblePosition, PhysicsEngine};
use crate::error::PhysicsError;
use crate::marble::MarbleId;
use crate::stage::{MapEntityState, StageDef};

/// A scripted marble body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScriptedBody {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

/// Observable state of a [`ScriptedPhysics`] world.
#[derive(Debug, Default)]
pub struct ScriptedState {
    pub initialized: bool,
    pub started: bool,
    pub steps: u64,
    pub bodies: BTreeMap<MarbleId, ScriptedBody>,
    pub entities: Vec<MapEntityState>,
    pub impacts: Vec<MarbleId>,
    pub shakes: Vec<MarbleId>,
    pub removed: Vec<MarbleId>,
}

impl ScriptedState {
    /// Overrides the velocity of a live body.
    pub fn set_velocity(&mut self, id: MarbleId, vx: f32, vy: f32) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.vx = vx;
            body.vy = vy;
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum FallSpeed {
    Constant(f32),
    Random { min: f32, max: f32 },
}

/// Physics engine whose marbles move at scripted velocities.
#[derive(Debug)]
pub struct ScriptedPhysics {
    state: Arc<Mutex<ScriptedState>>,
    fall_speed: FallSpeed,
    fail_init: bool,
    /// Bodies beyond this many fail to be created.
    marble_limit: Option<usize>,
    rng: ChaCha8Rng,
}

impl ScriptedPhysics {
    /// Every marble falls at the same speed (units per second).
    pub fn new(fall_speed: f32) -> Self {
        Self {
            state: Arc::default(),
            fall_speed: FallSpeed::Constant(fall_speed),
            fail_init: false,
            marble_limit: None,
            rng: ChaCha8Rng::seed_from_u64(0),
        }
    }

    /// Each marble draws its fall speed uniformly from `min..max`.
    pub fn with_random_speeds(seed: u64, min: f32, max: f32) -> Self {
        Self {
            fall_speed: FallSpeed::Random { min, max },
            rng: ChaCha8Rng::seed_from_u64(seed),
            ..Self::new(0.0)
        }
    }

    /// An engine whose `init` always fails.
    pub fn failing() -> Self {
        Self {
            fail_init: true,
            ..Self::new(0.0)
        }
    }

    /// An engine that refuses to hold more than `limit` marble bodies.
    pub fn with_marble_limit(limit: usize) -> Self {
        Self {
            marble_limit: Some(limit),
            ..Self::new(0.0)
        }
    }

    /// Shared handle to the recorded state.
    pub fn state(&self) -> Arc<Mutex<ScriptedState>> {
        Arc::clone(&self.state)
    }

    fn next_fall_speed(&mut self) -> f32 {
        match self.fall_speed {
            FallSpeed::Constant(speed) => speed,
            FallSpeed::Random { min, max } if max > min => self.rng.random_range(min..max),
            FallSpeed::Random { min, .. } => min,
        }
    }
}

impl PhysicsEngine for ScriptedPhysics {
    fn init(&mut self) -> Result<(), PhysicsError> {
        if self.fail_init {
            return Err(PhysicsError::Backend("scripted init failure".to_string()));
        }
        self.state.lock().initialized = true;
        Ok(())
    }

    fn create_stage(&mut self, stage: &StageDef) -> Result<(), PhysicsError> {
        let mut state = self.state.lock();
        if !state.initialized {
            return Err(PhysicsError::NotInitialized);
        }
        state.entities = stage
            .entities
            .iter()
            .map(|entity| MapEntityState {
                x: entity.position[0],
                y: entity.position[1],
                angle: entity.angle,
                shape: entity.shape.clone(),
                color: entity.color,
                bloom_color: entity.bloom_color,
            })
            .collect();
        Ok(())
    }

    fn create_marble(&mut self, id: MarbleId, x: f32, y: f32) -> Result<(), PhysicsError> {
        let vy = self.next_fall_speed();
        let mut state = self.state.lock();
        if !state.initialized {
            return Err(PhysicsError::NotInitialized);
        }
        if state.bodies.contains_key(&id) {
            return Err(PhysicsError::DuplicateMarble(id));
        }
        if self.marble_limit.is_some_and(|limit| state.bodies.len() >= limit) {
            return Err(PhysicsError::Backend(format!("marble {id} exceeds the body limit")));
        }
        state.bodies.insert(id, ScriptedBody { x, y, vx: 0.0, vy });
        Ok(())
    }

    fn step(&mut self, dt: f32) -> Result<(), PhysicsError> {
        let mut state = self.state.lock();
        if !state.initialized {
            return Err(PhysicsError::NotInitialized);
        }
        if state.started {
            for body in state.bodies.values_mut() {
                body.x += body.vx * dt;
                body.y += body.vy * dt;
            }
        }
        state.steps += 1;
        Ok(())
    }

    fn marble_position(&self, id: MarbleId) -> Option<MarblePosition> {
        self.state.lock().bodies.get(&id).map(|body| MarblePosition {
            x: body.x,
            y: body.y,
            angle: 0.0,
        })
    }

    fn impact(&mut self, id: MarbleId) {
        self.state.lock().impacts.push(id);
    }

    fn shake_marble(&mut self, id: MarbleId) {
        self.state.lock().shakes.push(id);
    }

    fn remove_marble(&mut self, id: MarbleId) {
        let mut state = self.state.lock();
        if state.bodies.remove(&id).is_some() {
            state.removed.push(id);
        }
    }

    fn entities(&self) -> Vec<MapEntityState> {
        self.state.lock().entities.clone()
    }

    fn clear(&mut self) {
        let mut state = self.state.lock();
        state.bodies.clear();
        state.entities.clear();
        state.started = false;
    }

    fn clear_marbles(&mut self) {
        let mut state = self.state.lock();
        state.bodies.clear();
        state.started = false;
    }

    fn start(&mut self) {
        self.state.lock().started = true;
    }
}
