//! Marble Roulette Core Library
//!
//! A marble-race roulette engine: contestants drop marbles down a physics
//! course and the marble finishing at the chosen rank wins. Physics runs on
//! `Rapier2D` behind the [`physics::PhysicsEngine`] seam, drawing goes through
//! the [`render::Canvas`] trait, and the [`bevy`] module hosts the engine in
//! a Bevy app.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod camera;
pub mod config;
pub mod effects;
pub mod entry;
pub mod error;
pub mod events;
pub mod marble;
pub mod physics;
pub mod render;
pub mod roulette;
pub mod stage;
pub mod theme;
pub mod ui;

// Bevy integration
pub mod bevy;

pub use camera::Camera;
pub use config::EngineConfig;
pub use entry::{ContestantEntry, parse_entries, parse_entry, split_entries};
pub use error::{ConfigError, PhysicsError, RouletteError};
pub use events::{EventBus, ListenerId, RouletteEvent};
pub use marble::{MARBLE_SIZE, Marble, MarbleId, Skill};
pub use physics::{MarblePosition, PhysicsEngine, RapierPhysics, ScriptedPhysics};
pub use render::{Canvas, DrawCommand, DrawList, Rect, SkinHandle, SkinLookup};
pub use roulette::{Lifecycle, Roulette};
pub use stage::{BodyKind, EntityShape, MapEntity, MapInfo, StageDef};
pub use theme::{Color, ColorTheme, THEME_NAMES};
pub use ui::PointerKind;
