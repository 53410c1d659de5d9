//! Marble entity: gameplay and cosmetic state bound to a physics body.
//!
//! The body itself lives in the [`PhysicsEngine`]; a marble only caches the
//! pose read after each step and owns its skill cooldown, stuck timer and
//! color.

use std::f32::consts::PI;

use rand::prelude::*;

use crate::physics::{MarblePosition, PhysicsEngine};
use crate::render::{Canvas, Rect, SkinHandle, TextAlign, TextStyle};
use crate::theme::{Color, ColorTheme};

/// Unique identifier for a marble. Equal to its lane order token.
pub type MarbleId = u32;

/// Marble diameter in world units.
pub const MARBLE_SIZE: f32 = 0.5;

/// How long an Impact keeps the marble glowing, in milliseconds.
pub const IMPACT_GLOW_MS: f32 = 500.0;

/// Squared displacement per tick below which a marble counts as stuck.
const STUCK_DISTANCE_SQ: f32 = 0.00001;

/// Marbles per starting row.
const LANE_WIDTH: u32 = 10;

/// Skill cast by a marble during the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Skill {
    #[default]
    None,
    /// Pushes nearby marbles away.
    Impact,
}

/// Starting position for the marble with lane token `order` in a field of
/// `total` marbles. Rows of ten, later tokens further up the course.
#[allow(clippy::cast_precision_loss)]
pub fn lane_position(order: u32, total: u32) -> (f32, f32) {
    let max_line = total.div_ceil(LANE_WIDTH);
    let line = order / LANE_WIDTH;
    let line_delta = -(max_line.saturating_sub(5) as f32);

    let x = 10.25 + (order % LANE_WIDTH) as f32 * 0.6;
    let y = max_line as f32 - line as f32 + line_delta;
    (x, y)
}

/// Options for [`Marble::render`].
#[derive(Debug, Clone, Copy)]
pub struct MarbleDrawOptions {
    /// Pixels per world unit, camera zoom included.
    pub zoom: f32,
    /// Draw the winning-border outline.
    pub outline: bool,
    /// Draw the simplified minimap dot.
    pub minimap: bool,
    /// Visible world rectangle; marbles outside it are culled.
    pub viewport: Option<Rect>,
    pub use_skills: bool,
}

#[derive(Debug, Clone)]
pub struct Marble {
    pub id: MarbleId,
    pub name: String,
    /// Normalized weight in `[0.1, 1.0]`.
    pub weight: f32,
    pub hue: f32,
    pub skill: Skill,
    pub is_active: bool,
    /// Remaining Impact glow in milliseconds.
    pub impact: f32,
    color_index: usize,
    variation: f32,
    cool_time: f32,
    max_cool_time: f32,
    skill_rate: f32,
    position: MarblePosition,
    last_position: MarblePosition,
    stuck_time: f32,
}

impl Marble {
    /// Creates a marble at its lane position. The physics body is created
    /// separately by the caller.
    pub fn new(
        id: MarbleId,
        name: impl Into<String>,
        weight: f32,
        total: u32,
        rng: &mut impl Rng,
    ) -> Self {
        let max_cool_time = 1000.0 + (1.0 - weight) * 4000.0;
        let (x, y) = lane_position(id, total);
        let position = MarblePosition { x, y, angle: 0.0 };

        Self {
            id,
            name: name.into(),
            weight,
            hue: 0.0,
            skill: Skill::None,
            is_active: false,
            impact: 0.0,
            color_index: rng.random_range(0..usize::MAX),
            variation: rng.random::<f32>() * 10.0 - 5.0,
            cool_time: max_cool_time * rng.random::<f32>(),
            max_cool_time,
            skill_rate: 0.2 * weight,
            position,
            last_position: position,
            stuck_time: 0.0,
        }
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn angle(&self) -> f32 {
        self.position.angle
    }

    pub fn position(&self) -> MarblePosition {
        self.position
    }

    pub fn cool_time(&self) -> f32 {
        self.cool_time
    }

    pub fn max_cool_time(&self) -> f32 {
        self.max_cool_time
    }

    pub fn skill_rate(&self) -> f32 {
        self.skill_rate
    }

    /// Picks the hue from `palette`; an empty palette keeps the current hue.
    pub fn update_palette(&mut self, palette: &[f32]) {
        if palette.is_empty() {
            return;
        }
        let base = palette[self.color_index % palette.len()];
        self.hue = (base + self.variation + 360.0) % 360.0;
    }

    /// Body color, brightened while an Impact is glowing.
    pub fn color(&self, theme: &ColorTheme) -> Color {
        let glow = (self.impact / IMPACT_GLOW_MS).min(1.0);
        Color::hsl(self.hue, 100.0, theme.marble_lightness + 25.0 * glow)
    }

    /// Copies the latest pose from the physics engine.
    pub fn sync_position(&mut self, physics: &dyn PhysicsEngine) {
        if let Some(position) = physics.marble_position(self.id) {
            self.position = position;
        }
    }

    /// Advances stuck detection and the skill cooldown by `dt` milliseconds.
    pub fn update(
        &mut self,
        dt: f32,
        rng: &mut impl Rng,
        physics: &mut dyn PhysicsEngine,
        use_skills: bool,
        stuck_delay_ms: f32,
    ) {
        self.sync_position(physics);

        let dx = self.position.x - self.last_position.x;
        let dy = self.position.y - self.last_position.y;
        if self.is_active && dx * dx + dy * dy < STUCK_DISTANCE_SQ {
            self.stuck_time += dt;
            if self.stuck_time > stuck_delay_ms {
                tracing::debug!("[marble] {} ({}) is stuck, shaking", self.name, self.id);
                physics.shake_marble(self.id);
                self.stuck_time = 0.0;
            }
        } else {
            self.stuck_time = 0.0;
        }
        self.last_position = self.position;

        self.skill = Skill::None;
        if self.impact > 0.0 {
            self.impact = (self.impact - dt).max(0.0);
        }

        if !self.is_active || !use_skills {
            return;
        }

        if self.cool_time > 0.0 {
            self.cool_time -= dt;
        }
        if self.cool_time <= 0.0 {
            if rng.random::<f32>() < self.skill_rate {
                self.skill = Skill::Impact;
                self.impact = IMPACT_GLOW_MS;
            }
            self.cool_time = self.max_cool_time;
        }
    }

    fn is_visible(&self, viewport: Option<Rect>) -> bool {
        viewport.is_none_or(|view| view.inflate(MARBLE_SIZE).contains(self.x(), self.y()))
    }

    /// Draws the marble in world coordinates.
    pub fn render(
        &self,
        canvas: &mut dyn Canvas,
        theme: &ColorTheme,
        skin: Option<SkinHandle>,
        options: &MarbleDrawOptions,
    ) {
        let center = [self.x(), self.y()];

        if options.minimap {
            canvas.fill_circle(center, MARBLE_SIZE, self.color(theme));
            return;
        }
        if !self.is_visible(options.viewport) {
            return;
        }

        let zoom = options.zoom.max(f32::EPSILON);
        let color = self.color(theme);

        canvas.set_glow(theme.marble_glow.map(|glow| (glow, zoom / 2.0)));
        match skin {
            Some(image) => {
                canvas.save();
                canvas.translate(center[0], center[1]);
                canvas.rotate(self.angle());
                let half = MARBLE_SIZE / 2.0;
                canvas.draw_image(image, Rect::new(-half, -half, MARBLE_SIZE, MARBLE_SIZE));
                canvas.restore();
            }
            None => canvas.fill_circle(center, MARBLE_SIZE / 2.0, color),
        }
        canvas.set_glow(None);

        self.render_name(canvas, theme, color, zoom);

        if options.outline {
            canvas.stroke_circle(
                center,
                MARBLE_SIZE / 2.0,
                theme.marble_winning_border,
                2.0 / zoom,
            );
        }

        if options.use_skills {
            let start = 1.5 * PI;
            let progress = (self.cool_time / self.max_cool_time).clamp(0.0, 1.0);
            canvas.stroke_arc(
                center,
                MARBLE_SIZE / 2.0 + 2.0 / zoom,
                (start, start + 2.0 * PI * progress),
                theme.cool_time_indicator,
                1.0 / zoom,
            );
        }
    }

    fn render_name(&self, canvas: &mut dyn Canvas, theme: &ColorTheme, color: Color, zoom: f32) {
        canvas.save();
        canvas.translate(self.x(), self.y() + MARBLE_SIZE / 2.0);
        canvas.scale(1.0 / zoom, 1.0 / zoom);
        let style = TextStyle::new(12.0, color)
            .align(TextAlign::Center)
            .stroke(theme.background, 2.0);
        canvas.text(&self.name, [0.0, 12.0], &style);
        canvas.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::ScriptedPhysics;
    use crate::render::{DrawCommand, DrawList};
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_cooldown_scales_with_weight() {
        let mut rng = rng();
        let heavy = Marble::new(0, "heavy", 1.0, 2, &mut rng);
        let light = Marble::new(1, "light", 0.1, 2, &mut rng);

        assert!((heavy.max_cool_time() - 1000.0).abs() < 1e-3);
        assert!((light.max_cool_time() - 4600.0).abs() < 1e-3);
        assert!((heavy.skill_rate() - 0.2).abs() < 1e-6);
        assert!((light.skill_rate() - 0.02).abs() < 1e-6);
        assert!(heavy.cool_time() >= 0.0 && heavy.cool_time() < heavy.max_cool_time());
    }

    #[test]
    fn test_lane_positions() {
        assert_eq!(lane_position(0, 3), (10.25, 1.0));
        let (x, y) = lane_position(12, 25);
        assert!((x - 11.45).abs() < 1e-5);
        assert!((y - 2.0).abs() < 1e-5);

        // Large fields start above the origin.
        let (_, y) = lane_position(0, 100);
        assert!((y - 5.0).abs() < 1e-5);
        let (_, y) = lane_position(99, 100);
        assert!((y - -4.0).abs() < 1e-5);
    }

    #[test]
    fn test_palette_hue() {
        let mut marble = Marble::new(0, "A", 0.5, 1, &mut rng());
        marble.update_palette(&[200.0]);
        assert!((marble.hue - 200.0).abs() <= 5.0);

        let before = marble.hue;
        marble.update_palette(&[]);
        assert_eq!(marble.hue, before);

        marble.update_palette(&[0.0]);
        assert!((0.0..360.0).contains(&marble.hue));
    }

    #[test]
    fn test_stuck_marble_is_shaken() {
        let mut physics = ScriptedPhysics::new(0.0);
        let state = physics.state();
        physics.init().unwrap();
        physics.create_marble(0, 10.25, 1.0).unwrap();
        physics.start();

        let mut rng = rng();
        let mut marble = Marble::new(0, "A", 0.5, 1, &mut rng);
        marble.is_active = true;

        for _ in 0..500 {
            marble.update(10.0, &mut rng, &mut physics, false, 5000.0);
        }
        assert!(state.lock().shakes.is_empty());

        marble.update(10.0, &mut rng, &mut physics, false, 5000.0);
        assert_eq!(state.lock().shakes, vec![0]);
    }

    #[test]
    fn test_inactive_marble_never_casts() {
        let mut physics = ScriptedPhysics::new(1.0);
        physics.init().unwrap();
        physics.create_marble(0, 10.25, 1.0).unwrap();

        let mut rng = rng();
        let mut marble = Marble::new(0, "A", 1.0, 1, &mut rng);
        let cool_time = marble.cool_time();
        for _ in 0..1000 {
            marble.update(10.0, &mut rng, &mut physics, true, 5000.0);
            assert_eq!(marble.skill, Skill::None);
        }
        assert_eq!(marble.cool_time(), cool_time);
    }

    #[test]
    fn test_active_marble_casts_impact() {
        let mut physics = ScriptedPhysics::new(1.0);
        physics.init().unwrap();
        physics.create_marble(0, 10.25, 1.0).unwrap();
        physics.start();

        let mut rng = rng();
        let mut marble = Marble::new(0, "A", 1.0, 1, &mut rng);
        marble.is_active = true;

        let mut casts = 0;
        for _ in 0..10_000 {
            physics.step(0.01).unwrap();
            marble.update(10.0, &mut rng, &mut physics, true, 5000.0);
            if marble.skill == Skill::Impact {
                casts += 1;
                assert_eq!(marble.impact, IMPACT_GLOW_MS);
                assert_eq!(marble.cool_time(), marble.max_cool_time());
            }
        }
        assert!(casts > 0);
        assert!(marble.y() > 1.0);
    }

    #[test]
    fn test_impact_glow_decays() {
        let mut physics = ScriptedPhysics::new(0.0);
        physics.init().unwrap();
        let mut rng = rng();
        let mut marble = Marble::new(0, "A", 0.5, 1, &mut rng);
        marble.impact = 100.0;

        marble.update(60.0, &mut rng, &mut physics, false, 5000.0);
        assert!((marble.impact - 40.0).abs() < 1e-4);
        marble.update(60.0, &mut rng, &mut physics, false, 5000.0);
        assert_eq!(marble.impact, 0.0);
    }

    #[test]
    fn test_render_culls_outside_viewport() {
        let theme = ColorTheme::dark();
        let marble = Marble::new(0, "A", 0.5, 1, &mut rng());
        let mut options = MarbleDrawOptions {
            zoom: 30.0,
            outline: true,
            minimap: false,
            viewport: Some(Rect::new(100.0, 100.0, 10.0, 10.0)),
            use_skills: true,
        };

        let mut canvas = DrawList::new();
        marble.render(&mut canvas, &theme, None, &options);
        assert!(canvas.is_empty());

        options.viewport = Some(Rect::new(0.0, 0.0, 20.0, 20.0));
        marble.render(&mut canvas, &theme, None, &options);
        assert_eq!(canvas.texts(), vec!["A"]);
        assert!(canvas.commands().iter().any(|c| matches!(c, DrawCommand::StrokeArc { .. })));
        assert!(canvas.commands().iter().any(|c| matches!(c, DrawCommand::StrokeCircle { .. })));
    }

    #[test]
    fn test_render_minimap_and_skin() {
        let theme = ColorTheme::dark();
        let marble = Marble::new(0, "A", 0.5, 1, &mut rng());
        let options = MarbleDrawOptions {
            zoom: 1.0,
            outline: false,
            minimap: true,
            viewport: Some(Rect::new(100.0, 100.0, 10.0, 10.0)),
            use_skills: false,
        };

        let mut canvas = DrawList::new();
        marble.render(&mut canvas, &theme, None, &options);
        assert!(matches!(
            canvas.commands(),
            [DrawCommand::FillCircle { radius, .. }] if (*radius - MARBLE_SIZE).abs() < f32::EPSILON
        ));

        let mut canvas = DrawList::new();
        let options = MarbleDrawOptions {
            minimap: false,
            viewport: None,
            ..options
        };
        marble.render(&mut canvas, &theme, Some(SkinHandle(7)), &options);
        assert!(canvas.commands().iter().any(|c| matches!(c, DrawCommand::Image { image: SkinHandle(7), .. })));
        assert!(!canvas.commands().iter().any(|c| matches!(c, DrawCommand::FillCircle { .. })));
    }
}
