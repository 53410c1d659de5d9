//! Hold-to-fast-forward button at the bottom center.

use super::{PointerKind, UiAction, UiObject};
use crate::render::{Canvas, Rect, RenderParams, TextAlign, TextStyle};

const BUTTON_SIZE: f32 = 64.0;
const BOTTOM_MARGIN: f32 = 24.0;
const FAST_FORWARD_SPEED: f32 = 2.0;

#[derive(Debug, Default)]
pub struct FastForwarder {
    bounds: Option<Rect>,
    pressed: bool,
    actions: Vec<UiAction>,
}

impl FastForwarder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

impl UiObject for FastForwarder {
    fn render(&mut self, canvas: &mut dyn Canvas, params: &RenderParams<'_>) {
        let [width, height] = params.size;
        let bounds = Rect::new(
            (width - BUTTON_SIZE) / 2.0,
            height - BUTTON_SIZE - BOTTOM_MARGIN,
            BUTTON_SIZE,
            BUTTON_SIZE,
        );
        self.bounds = Some(bounds);

        let alpha = if self.pressed { 1.0 } else { 0.5 };
        let color = params.theme.winner_text.with_alpha(alpha);
        let center = [bounds.x + BUTTON_SIZE / 2.0, bounds.y + BUTTON_SIZE / 2.0];
        canvas.stroke_circle(center, BUTTON_SIZE / 2.0, color, 2.0);
        canvas.text(
            "\u{25B6}\u{25B6}",
            [center[0], center[1] + 8.0],
            &TextStyle::new(24.0, color).align(TextAlign::Center),
        );
    }

    fn bounding_box(&self) -> Option<Rect> {
        self.bounds
    }

    fn on_pointer(&mut self, kind: PointerKind, _position: Option<[f32; 2]>) {
        match kind {
            PointerKind::Down => {
                self.pressed = true;
                self.actions.push(UiAction::FastForward(FAST_FORWARD_SPEED));
            }
            PointerKind::Up | PointerKind::Leave if self.pressed => {
                self.pressed = false;
                self.actions.push(UiAction::FastForward(1.0));
            }
            _ => {}
        }
    }

    fn drain_actions(&mut self) -> Vec<UiAction> {
        std::mem::take(&mut self.actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_and_release() {
        let mut button = FastForwarder::new();

        button.on_pointer(PointerKind::Down, Some([0.0, 0.0]));
        assert!(button.is_pressed());
        button.on_pointer(PointerKind::Leave, None);
        button.on_pointer(PointerKind::Up, None);

        assert_eq!(
            button.drain_actions(),
            vec![UiAction::FastForward(2.0), UiAction::FastForward(1.0)]
        );
        assert!(button.drain_actions().is_empty());
    }
}
