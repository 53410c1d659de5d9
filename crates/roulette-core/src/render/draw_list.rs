//! Recording canvas for headless runs and tests.

use super::canvas::{Canvas, Rect, SkinHandle, TextStyle};
use crate::theme::Color;

/// One recorded canvas call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Save,
    Restore,
    Translate(f32, f32),
    Scale(f32, f32),
    Rotate(f32),
    Glow(Option<(Color, f32)>),
    FillRect {
        rect: Rect,
        color: Color,
    },
    StrokeRect {
        rect: Rect,
        color: Color,
        line_width: f32,
    },
    FillCircle {
        center: [f32; 2],
        radius: f32,
        color: Color,
    },
    StrokeCircle {
        center: [f32; 2],
        radius: f32,
        color: Color,
        line_width: f32,
    },
    StrokeArc {
        center: [f32; 2],
        radius: f32,
        angles: (f32, f32),
        color: Color,
        line_width: f32,
    },
    Polyline {
        points: Vec<[f32; 2]>,
        color: Color,
        line_width: f32,
    },
    Text {
        text: String,
        position: [f32; 2],
        style: TextStyle,
    },
    Image {
        image: SkinHandle,
        rect: Rect,
    },
}

/// Canvas that records every call instead of drawing.
#[derive(Debug, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Every text string drawn, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for DrawList {
    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.commands.push(DrawCommand::Translate(x, y));
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.commands.push(DrawCommand::Scale(sx, sy));
    }

    fn rotate(&mut self, angle: f32) {
        self.commands.push(DrawCommand::Rotate(angle));
    }

    fn set_glow(&mut self, glow: Option<(Color, f32)>) {
        self.commands.push(DrawCommand::Glow(glow));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32) {
        self.commands.push(DrawCommand::StrokeRect {
            rect,
            color,
            line_width,
        });
    }

    fn fill_circle(&mut self, center: [f32; 2], radius: f32, color: Color) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            color,
        });
    }

    fn stroke_circle(&mut self, center: [f32; 2], radius: f32, color: Color, line_width: f32) {
        self.commands.push(DrawCommand::StrokeCircle {
            center,
            radius,
            color,
            line_width,
        });
    }

    fn stroke_arc(
        &mut self,
        center: [f32; 2],
        radius: f32,
        angles: (f32, f32),
        color: Color,
        line_width: f32,
    ) {
        self.commands.push(DrawCommand::StrokeArc {
            center,
            radius,
            angles,
            color,
            line_width,
        });
    }

    fn polyline(&mut self, points: &[[f32; 2]], color: Color, line_width: f32) {
        self.commands.push(DrawCommand::Polyline {
            points: points.to_vec(),
            color,
            line_width,
        });
    }

    fn text(&mut self, text: &str, position: [f32; 2], style: &TextStyle) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            position,
            style: *style,
        });
    }

    fn draw_image(&mut self, image: SkinHandle, rect: Rect) {
        self.commands.push(DrawCommand::Image { image, rect });
    }
}
