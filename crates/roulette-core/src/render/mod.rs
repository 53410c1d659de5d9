//! Drawing contracts and the race renderer.
//!
//! Everything is drawn through the [`Canvas`] trait so the engine does not
//! depend on a concrete graphics backend. [`DrawList`] records calls for
//! headless runs; the Bevy host draws through gizmos.

mod canvas;
mod draw_list;
mod renderer;

pub use canvas::{Canvas, Rect, SkinHandle, SkinLookup, TextAlign, TextStyle, Transform2};
pub use draw_list::{DrawCommand, DrawList};
pub use renderer::{RenderParams, RouletteRenderer, draw_entity};
