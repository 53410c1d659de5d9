//! 2D drawing surface abstraction.

use crate::theme::Color;

/// Axis-aligned rectangle, `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    /// Grows the rectangle by `margin` on every side.
    pub fn inflate(&self, margin: f32) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }
}

/// 2D affine transform `[a c e; b d f; 0 0 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Transform2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2 {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// `self * other`: `other` is applied first.
    pub fn then(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn translated(&self, x: f32, y: f32) -> Self {
        self.then(&Self {
            e: x,
            f: y,
            ..Self::IDENTITY
        })
    }

    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        self.then(&Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        })
    }

    pub fn rotated(&self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        self.then(&Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            ..Self::IDENTITY
        })
    }

    pub fn apply(&self, [x, y]: [f32; 2]) -> [f32; 2] {
        [
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        ]
    }

    /// Uniform scale factor, exact for similarity transforms.
    pub fn scale_factor(&self) -> f32 {
        self.a.hypot(self.b)
    }

    /// Rotation angle of the transform.
    pub fn rotation(&self) -> f32 {
        self.b.atan2(self.a)
    }

    pub fn inverse(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() <= f32::EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        Some(Self {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Font and paint settings for [`Canvas::text`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Font size in the current transform's units.
    pub size: f32,
    pub bold: bool,
    pub align: TextAlign,
    pub fill: Color,
    /// Outline color and width drawn beneath the fill.
    pub stroke: Option<(Color, f32)>,
}

impl TextStyle {
    pub fn new(size: f32, fill: Color) -> Self {
        Self {
            size,
            bold: false,
            align: TextAlign::Left,
            fill,
            stroke: None,
        }
    }

    pub fn bold(self) -> Self {
        Self { bold: true, ..self }
    }

    pub fn align(self, align: TextAlign) -> Self {
        Self { align, ..self }
    }

    pub fn stroke(self, color: Color, width: f32) -> Self {
        Self {
            stroke: Some((color, width)),
            ..self
        }
    }
}

/// Opaque reference to an image owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SkinHandle(pub u64);

/// Name to image lookup. A miss is never an error; the marble is drawn
/// as a plain circle instead.
pub trait SkinLookup: Send + Sync {
    fn skin(&self, name: &str) -> Option<SkinHandle>;
}

/// Immediate-mode drawing surface.
///
/// Coordinates are transformed by the current transform, which
/// `save`/`restore` push and pop. Angles are radians, clockwise with y down.
pub trait Canvas {
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f32, y: f32);
    fn scale(&mut self, sx: f32, sy: f32);
    fn rotate(&mut self, angle: f32);

    /// Soft glow applied to subsequent shapes; `None` disables it.
    fn set_glow(&mut self, glow: Option<(Color, f32)>);

    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32);
    fn fill_circle(&mut self, center: [f32; 2], radius: f32, color: Color);
    fn stroke_circle(&mut self, center: [f32; 2], radius: f32, color: Color, line_width: f32);
    /// Arc from `start` to `end`, measured from the positive x axis.
    fn stroke_arc(
        &mut self,
        center: [f32; 2],
        radius: f32,
        angles: (f32, f32),
        color: Color,
        line_width: f32,
    );
    fn polyline(&mut self, points: &[[f32; 2]], color: Color, line_width: f32);
    fn text(&mut self, text: &str, position: [f32; 2], style: &TextStyle);
    fn draw_image(&mut self, image: SkinHandle, rect: Rect);
}
