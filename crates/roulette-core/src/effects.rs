//! Purely visual, finite-lifetime effects.

use std::f32::consts::TAU;

use rand::prelude::*;

use crate::render::{Canvas, Rect};
use crate::theme::{Color, ColorTheme};

/// Lifetime of a skill ring in milliseconds.
const SKILL_EFFECT_LIFETIME: f32 = 500.0;

/// Lifetime of a victory particle in milliseconds.
const PARTICLE_LIFETIME: f32 = 3000.0;
const PARTICLE_COUNT: usize = 200;
const PARTICLE_SIZE: f32 = 10.0;
/// Downward acceleration in px per 10 ms, applied every 10 ms.
const PARTICLE_GRAVITY: f32 = 0.1;

/// A world-space effect drawn under the camera transform.
pub trait Effect: Send + Sync {
    /// Advances the effect by `dt` milliseconds.
    fn update(&mut self, dt: f32);
    fn render(&self, canvas: &mut dyn Canvas, zoom: f32, theme: &ColorTheme);
    fn is_destroyed(&self) -> bool;
}

/// Expanding ring drawn where a marble cast Impact.
#[derive(Debug, Clone)]
pub struct SkillEffect {
    position: [f32; 2],
    size: f32,
    elapsed: f32,
}

impl SkillEffect {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            position: [x, y],
            size: 0.0,
            elapsed: 0.0,
        }
    }

    pub fn size(&self) -> f32 {
        self.size
    }
}

impl Effect for SkillEffect {
    fn update(&mut self, dt: f32) {
        self.elapsed += dt;
        self.size += dt / 100.0;
    }

    fn render(&self, canvas: &mut dyn Canvas, zoom: f32, theme: &ColorTheme) {
        let alpha = (1.0 - self.elapsed / SKILL_EFFECT_LIFETIME).clamp(0.0, 1.0);
        let color = theme.skill_color.with_alpha(theme.skill_color.alpha() * alpha);
        canvas.stroke_circle(self.position, self.size, color, 1.0 / zoom.max(f32::EPSILON));
    }

    fn is_destroyed(&self) -> bool {
        self.elapsed > SKILL_EFFECT_LIFETIME
    }
}

#[derive(Debug, Clone)]
struct Particle {
    position: [f32; 2],
    velocity: [f32; 2],
    hue: f32,
    elapsed: f32,
}

impl Particle {
    fn update(&mut self, dt: f32) {
        let ticks = dt / 10.0;
        self.elapsed += dt;
        self.position[0] += self.velocity[0] * ticks;
        self.position[1] += self.velocity[1] * ticks;
        self.velocity[1] += PARTICLE_GRAVITY * ticks;
    }

    fn is_destroyed(&self) -> bool {
        self.elapsed > PARTICLE_LIFETIME
    }
}

/// Screen-space victory burst.
#[derive(Debug, Default)]
pub struct ParticleManager {
    particles: Vec<Particle>,
}

impl ParticleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires a burst from the center of a `width` x `height` surface.
    pub fn shot(&mut self, width: f32, height: f32, rng: &mut impl Rng) {
        let center = [width / 2.0, height / 2.0];
        self.particles.extend((0..PARTICLE_COUNT).map(|_| {
            let angle = rng.random::<f32>() * TAU;
            let speed = rng.random::<f32>() * 4.0 + 2.0;
            Particle {
                position: center,
                velocity: [angle.cos() * speed, angle.sin() * speed],
                hue: rng.random::<f32>() * 360.0,
                elapsed: 0.0,
            }
        }));
    }

    pub fn update(&mut self, dt: f32) {
        for particle in &mut self.particles {
            particle.update(dt);
        }
        self.particles.retain(|p| !p.is_destroyed());
    }

    pub fn render(&self, canvas: &mut dyn Canvas) {
        for particle in &self.particles {
            let alpha = 1.0 - particle.elapsed / PARTICLE_LIFETIME;
            let color = Color::hsl(particle.hue, 50.0, 50.0).with_alpha(alpha);
            let [x, y] = particle.position;
            canvas.fill_rect(
                Rect::new(
                    x - PARTICLE_SIZE / 2.0,
                    y - PARTICLE_SIZE / 2.0,
                    PARTICLE_SIZE,
                    PARTICLE_SIZE,
                ),
                color,
            );
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawCommand, DrawList};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_skill_effect_lifetime() {
        let mut effect = SkillEffect::new(1.0, 2.0);
        for _ in 0..50 {
            effect.update(10.0);
        }
        assert!(!effect.is_destroyed());
        assert!((effect.size() - 5.0).abs() < 1e-4);

        effect.update(10.0);
        assert!(effect.is_destroyed());
    }

    #[test]
    fn test_skill_effect_fades() {
        let theme = ColorTheme::dark();
        let mut effect = SkillEffect::new(1.0, 2.0);
        effect.update(250.0);

        let mut canvas = DrawList::new();
        effect.render(&mut canvas, 30.0, &theme);
        match &canvas.commands()[0] {
            DrawCommand::StrokeCircle { center, color, .. } => {
                assert_eq!(*center, [1.0, 2.0]);
                assert!((i32::from(color.a) - 128).abs() <= 1);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_particles_expire() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut particles = ParticleManager::new();
        particles.shot(1600.0, 900.0, &mut rng);
        assert_eq!(particles.len(), PARTICLE_COUNT);

        let mut canvas = DrawList::new();
        particles.render(&mut canvas);
        assert_eq!(canvas.len(), PARTICLE_COUNT);

        for _ in 0..300 {
            particles.update(10.0);
        }
        assert_eq!(particles.len(), PARTICLE_COUNT);
        particles.update(10.0);
        assert!(particles.is_empty());
    }
}
