//! Screen-space overlays.
//!
//! Overlays read the frame snapshot when drawing and talk back to the
//! orchestrator only through [`UiAction`]s, which it drains after input
//! and update.

mod fast_forward;
mod minimap;
mod rank;

pub use fast_forward::FastForwarder;
pub use minimap::Minimap;
pub use rank::RankRenderer;

use crate::render::{Canvas, Rect, RenderParams};

/// Pointer input routed to an overlay, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    /// The pointer left the overlay or the surface.
    Leave,
    DoubleClick,
}

/// Request from an overlay to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    /// Lock the camera at a world position, or release it with `None`.
    LockCamera(Option<[f32; 2]>),
    /// Forward a message to event subscribers.
    Message(String),
    /// Set the fast-forward multiplier.
    FastForward(f32),
}

pub trait UiObject: Send + Sync {
    /// Advances animations by `dt` milliseconds.
    fn update(&mut self, _dt: f32) {}

    fn render(&mut self, canvas: &mut dyn Canvas, params: &RenderParams<'_>);

    /// Screen area that receives pointer input; `None` for display-only overlays.
    fn bounding_box(&self) -> Option<Rect>;

    fn on_pointer(&mut self, _kind: PointerKind, _position: Option<[f32; 2]>) {}

    fn on_wheel(&mut self, _delta: f32) {}

    /// Takes the actions queued since the last call.
    fn drain_actions(&mut self) -> Vec<UiAction> {
        Vec::new()
    }
}
