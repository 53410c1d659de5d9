//! Bevy host for the roulette engine.
//!
//! The engine itself is host-agnostic; this module drives it from Bevy's
//! `Update` schedule, feeds it window input, forwards its events as Bevy
//! messages and draws it with gizmos.

pub mod canvas;
pub mod events;
pub mod plugin;
pub mod resources;
pub mod systems;

#[cfg(test)]
pub(crate) mod test_utils;

pub use canvas::{GizmoCanvas, surface_transform, to_bevy_color};
pub use events::RouletteMessage;
pub use plugin::{RouletteHeadlessPlugin, RoulettePlugin};
pub use resources::{CommandQueue, EventQueue, RouletteCommand, RouletteRes};
