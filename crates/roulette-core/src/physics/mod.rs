//! Physics abstraction.
//!
//! The orchestrator only talks to a [`PhysicsEngine`]; it never touches the
//! rigid-body backend directly. [`RapierPhysics`] is the production backend,
//! [`ScriptedPhysics`] a deterministic stand-in for tests and tooling.

mod rapier;
mod scripted;

pub use rapier::{MARBLE_RADIUS, RapierPhysics, default_gravity};
pub use scripted::{ScriptedBody, ScriptedPhysics, ScriptedState};

use crate::error::PhysicsError;
use crate::marble::MarbleId;
use crate::stage::{MapEntityState, StageDef};

/// Pose of a marble body after the latest step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarblePosition {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

/// Contract every physics backend must honor.
///
/// Marble bodies are keyed by the marble id. Bodies created before
/// [`start`](PhysicsEngine::start) stay frozen at their lane position.
pub trait PhysicsEngine: Send + Sync {
    /// Prepares the backend. Must be called once before anything else.
    fn init(&mut self) -> Result<(), PhysicsError>;

    /// Builds the static/kinematic geometry of a stage.
    fn create_stage(&mut self, stage: &StageDef) -> Result<(), PhysicsError>;

    /// Creates a marble body at a lane position.
    fn create_marble(&mut self, id: MarbleId, x: f32, y: f32) -> Result<(), PhysicsError>;

    /// Advances the world by `dt` seconds.
    fn step(&mut self, dt: f32) -> Result<(), PhysicsError>;

    /// Pose of a marble, or `None` once removed.
    fn marble_position(&self, id: MarbleId) -> Option<MarblePosition>;

    /// Applies the Impact skill: pushes nearby marbles away from `id`.
    fn impact(&mut self, id: MarbleId);

    /// Nudges a stuck marble with a random impulse.
    fn shake_marble(&mut self, id: MarbleId);

    /// Removes a marble body. Unknown ids are ignored.
    fn remove_marble(&mut self, id: MarbleId);

    /// Current state of the stage geometry for rendering.
    fn entities(&self) -> Vec<MapEntityState>;

    /// Removes everything, stage geometry included.
    fn clear(&mut self);

    /// Removes all marble bodies, keeping the stage.
    fn clear_marbles(&mut self);

    /// Releases the marbles so they start falling.
    fn start(&mut self);
}
