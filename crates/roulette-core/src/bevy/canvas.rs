//! [`Canvas`] over Bevy gizmos.

use std::f32::consts::TAU;

use bevy::prelude::{Color as BevyColor, Gizmos, Isometry2d, Vec2};

use crate::render::{Canvas, Rect, SkinHandle, TextStyle, Transform2};
use crate::theme::Color;

/// Segments in a full circle when an arc is flattened to a line strip.
const ARC_SEGMENTS: f32 = 48.0;

/// Maps surface pixels (origin top-left, y down) onto the world of a
/// default `Camera2d` (origin at the center, y up).
pub fn surface_transform(width: f32, height: f32) -> Transform2 {
    Transform2 {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: -1.0,
        e: -width / 2.0,
        f: height / 2.0,
    }
}

pub fn to_bevy_color(color: Color) -> BevyColor {
    BevyColor::srgba_u8(color.r, color.g, color.b, color.a)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn arc_points(center: [f32; 2], radius: f32, (start, end): (f32, f32)) -> Vec<[f32; 2]> {
    let segments = ((end - start).abs() / TAU * ARC_SEGMENTS).ceil().max(1.0) as usize;
    (0..=segments)
        .map(|i| {
            let angle = start + (end - start) * i as f32 / segments as f32;
            [center[0] + radius * angle.cos(), center[1] + radius * angle.sin()]
        })
        .collect()
}

fn rect_corners(rect: Rect) -> [[f32; 2]; 4] {
    [
        [rect.x, rect.y],
        [rect.x + rect.width, rect.y],
        [rect.x + rect.width, rect.y + rect.height],
        [rect.x, rect.y + rect.height],
    ]
}

/// Draws through immediate-mode gizmos.
///
/// Gizmos only stroke, so fills come out as outlines. Text, glow and line
/// widths are not supported and are dropped.
pub struct GizmoCanvas<'a, 'w, 's> {
    gizmos: &'a mut Gizmos<'w, 's>,
    transform: Transform2,
    stack: Vec<Transform2>,
}

impl<'a, 'w, 's> GizmoCanvas<'a, 'w, 's> {
    pub fn new(gizmos: &'a mut Gizmos<'w, 's>, width: f32, height: f32) -> Self {
        Self {
            gizmos,
            transform: surface_transform(width, height),
            stack: Vec::new(),
        }
    }

    fn point(&self, point: [f32; 2]) -> Vec2 {
        let [x, y] = self.transform.apply(point);
        Vec2::new(x, y)
    }

    fn strip(&mut self, points: &[[f32; 2]], closed: bool, color: Color) {
        let mut positions: Vec<Vec2> = points.iter().map(|p| self.point(*p)).collect();
        if closed {
            if let Some(first) = positions.first().copied() {
                positions.push(first);
            }
        }
        self.gizmos.linestrip_2d(positions, to_bevy_color(color));
    }

    fn circle(&mut self, center: [f32; 2], radius: f32, color: Color) {
        let center = self.point(center);
        let radius = radius * self.transform.scale_factor();
        self.gizmos
            .circle_2d(Isometry2d::from_translation(center), radius, to_bevy_color(color));
    }
}

impl Canvas for GizmoCanvas<'_, '_, '_> {
    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(transform) = self.stack.pop() {
            self.transform = transform;
        }
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.transform = self.transform.translated(x, y);
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.transform = self.transform.scaled(sx, sy);
    }

    fn rotate(&mut self, angle: f32) {
        self.transform = self.transform.rotated(angle);
    }

    fn set_glow(&mut self, _glow: Option<(Color, f32)>) {}

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.strip(&rect_corners(rect), true, color);
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, _line_width: f32) {
        self.strip(&rect_corners(rect), true, color);
    }

    fn fill_circle(&mut self, center: [f32; 2], radius: f32, color: Color) {
        self.circle(center, radius, color);
    }

    fn stroke_circle(&mut self, center: [f32; 2], radius: f32, color: Color, _line_width: f32) {
        self.circle(center, radius, color);
    }

    fn stroke_arc(&mut self, center: [f32; 2], radius: f32, angles: (f32, f32), color: Color, _line_width: f32) {
        let points = arc_points(center, radius, angles);
        self.strip(&points, false, color);
    }

    fn polyline(&mut self, points: &[[f32; 2]], color: Color, _line_width: f32) {
        self.strip(points, false, color);
    }

    fn text(&mut self, _text: &str, _position: [f32; 2], _style: &TextStyle) {}

    fn draw_image(&mut self, _image: SkinHandle, rect: Rect) {
        self.strip(&rect_corners(rect), true, Color::WHITE);
    }
}
