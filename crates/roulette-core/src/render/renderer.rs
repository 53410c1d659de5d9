//! Frame renderer.

use std::sync::Arc;

use super::canvas::{Canvas, Rect, SkinLookup, TextAlign, TextStyle};
use crate::camera::Camera;
use crate::effects::{Effect, ParticleManager};
use crate::marble::{Marble, MarbleDrawOptions};
use crate::stage::{EntityShape, MapEntityState, StageDef};
use crate::theme::ColorTheme;
use crate::ui::UiObject;

/// Frozen view of the race handed to the renderer and overlays.
pub struct RenderParams<'a> {
    pub camera: &'a Camera,
    pub stage: Option<&'a StageDef>,
    pub entities: &'a [MapEntityState],
    /// Racing marbles in race order.
    pub marbles: &'a [Marble],
    pub winners: &'a [Marble],
    pub winner: Option<&'a Marble>,
    pub winner_rank: usize,
    pub total_marble_count: usize,
    pub effects: &'a [Box<dyn Effect>],
    pub particles: &'a ParticleManager,
    pub theme: &'a ColorTheme,
    /// Surface size in pixels.
    pub size: [f32; 2],
    pub use_skills: bool,
}

impl RenderParams<'_> {
    /// Index into `marbles` of the marble racing for the tracked rank.
    pub fn target_index(&self) -> Option<usize> {
        self.winner_rank
            .checked_sub(self.winners.len())
            .filter(|index| *index < self.marbles.len())
    }
}

/// Draws one stage entity in world coordinates with its theme style.
pub fn draw_entity(canvas: &mut dyn Canvas, entity: &MapEntityState, theme: &ColorTheme, line_width: f32, glow: bool) {
    let style = theme.entity.get(entity.shape.kind());
    let fill = entity.color.unwrap_or(style.fill);
    let outline = entity.color.unwrap_or(style.outline);
    let bloom = entity.bloom_color.unwrap_or(style.bloom);
    let glowing = glow && style.bloom_radius > 0.0;

    canvas.save();
    canvas.translate(entity.x, entity.y);
    canvas.rotate(entity.angle);
    if glowing {
        canvas.set_glow(Some((bloom, style.bloom_radius)));
    }

    match &entity.shape {
        EntityShape::Polyline { points } => canvas.polyline(points, outline, line_width),
        EntityShape::Circle { radius } => {
            canvas.fill_circle([0.0, 0.0], *radius, fill);
            canvas.stroke_circle([0.0, 0.0], *radius, outline, line_width);
        }
        EntityShape::Box {
            width,
            height,
            rotation,
        } => {
            canvas.rotate(*rotation);
            let rect = Rect::new(-width, -height, width * 2.0, height * 2.0);
            canvas.fill_rect(rect, fill);
            canvas.stroke_rect(rect, outline, line_width);
        }
    }

    if glowing {
        canvas.set_glow(None);
    }
    canvas.restore();
}

/// Stateless per-frame renderer.
#[derive(Default)]
pub struct RouletteRenderer {
    skins: Option<Arc<dyn SkinLookup>>,
}

impl std::fmt::Debug for RouletteRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouletteRenderer")
            .field("skins", &self.skins.is_some())
            .finish()
    }
}

impl RouletteRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_skins(&mut self, skins: Option<Arc<dyn SkinLookup>>) {
        self.skins = skins;
    }

    pub fn render(&self, canvas: &mut dyn Canvas, params: &RenderParams<'_>, overlays: &mut [Box<dyn UiObject>]) {
        let [width, height] = params.size;
        let zoom = params.camera.total_zoom();

        canvas.fill_rect(Rect::new(0.0, 0.0, width, height), params.theme.background);

        canvas.save();
        params.camera.apply(canvas, width, height);
        for entity in params.entities {
            draw_entity(canvas, entity, params.theme, 1.0 / zoom, true);
        }
        for effect in params.effects {
            effect.render(canvas, zoom, params.theme);
        }
        self.render_marbles(canvas, params);
        canvas.restore();

        for overlay in overlays.iter_mut() {
            overlay.render(canvas, params);
        }
        params.particles.render(canvas);

        if let Some(winner) = params.winner {
            self.render_winner(canvas, winner, params);
        }
    }

    fn render_marbles(&self, canvas: &mut dyn Canvas, params: &RenderParams<'_>) {
        let [width, height] = params.size;
        let target = params.target_index();
        let options = MarbleDrawOptions {
            zoom: params.camera.total_zoom(),
            outline: false,
            minimap: false,
            viewport: Some(params.camera.viewport(width, height)),
            use_skills: params.use_skills,
        };

        for (index, marble) in params.marbles.iter().enumerate() {
            let skin = self.skins.as_ref().and_then(|skins| skins.skin(&marble.name));
            let options = MarbleDrawOptions {
                outline: Some(index) == target,
                ..options
            };
            marble.render(canvas, params.theme, skin, &options);
        }
    }

    fn render_winner(&self, canvas: &mut dyn Canvas, winner: &Marble, params: &RenderParams<'_>) {
        let [width, height] = params.size;
        let theme = params.theme;
        let marble_center = [width - 70.0, height - 84.0];
        let text_right = marble_center[0] - 50.0 - 20.0;

        canvas.fill_rect(Rect::new(width / 2.0, height - 168.0, width / 2.0, 168.0), theme.winner_background);

        let color = winner.color(theme);
        match self.skins.as_ref().and_then(|skins| skins.skin(&winner.name)) {
            Some(image) => canvas.draw_image(
                image,
                Rect::new(marble_center[0] - 50.0, marble_center[1] - 50.0, 100.0, 100.0),
            ),
            None => canvas.fill_circle(marble_center, 50.0, color),
        }

        let outline = |style: TextStyle| match theme.winner_outline {
            Some(stroke) => style.stroke(stroke, 2.0),
            None => style,
        };
        let label = outline(TextStyle::new(48.0, theme.winner_text).bold().align(TextAlign::Right));
        canvas.text("Winner", [text_right, height - 120.0], &label);

        let name = outline(TextStyle::new(72.0, color).bold().align(TextAlign::Right));
        canvas.text(&winner.name, [text_right, height - 55.0], &name);
    }
}
