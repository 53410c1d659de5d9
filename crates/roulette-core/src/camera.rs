//! Race camera.
//!
//! The camera keeps a target position/zoom that is recomputed every frame
//! from the race and eases its current values towards it. A lock (e.g. the
//! minimap being dragged) freezes automatic tracking until released.

use crate::config::EngineConfig;
use crate::marble::Marble;
use crate::render::{Canvas, Rect, Transform2};

/// Marbles closer than this to the tracked one pull the camera towards them.
const PACK_RADIUS: f32 = 5.0;

/// Share of the tracked marble in the camera target; the rest is the pack centroid.
const TARGET_BIAS: f32 = 0.8;

/// Fraction of the remaining distance covered per frame.
const SMOOTHING: f32 = 0.1;

/// Zoom reached right at the zoom line.
const MAX_ZOOM: f32 = 4.0;

/// Framing before the marbles are released.
const IDLE_POSITION: [f32; 2] = [13.0, 0.0];

#[derive(Debug, Clone)]
pub struct Camera {
    position: [f32; 2],
    target_position: [f32; 2],
    zoom: f32,
    target_zoom: f32,
    locked: bool,
    follow_marbles: bool,
    initial_zoom: f32,
    zoom_threshold: f32,
}

impl Camera {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            position: IDLE_POSITION,
            target_position: IDLE_POSITION,
            zoom: 1.0,
            target_zoom: 1.0,
            locked: false,
            follow_marbles: false,
            initial_zoom: config.initial_zoom,
            zoom_threshold: config.zoom_threshold,
        }
    }

    pub fn x(&self) -> f32 {
        self.position[0]
    }

    pub fn y(&self) -> f32 {
        self.position[1]
    }

    pub fn position(&self) -> [f32; 2] {
        self.position
    }

    pub fn target_position(&self) -> [f32; 2] {
        self.target_position
    }

    /// Camera zoom on top of the initial zoom.
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Pixels per world unit.
    pub fn total_zoom(&self) -> f32 {
        self.initial_zoom * self.zoom
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_following(&self) -> bool {
        self.follow_marbles
    }

    /// Moves the target; `force` also jumps the current position there.
    pub fn set_position(&mut self, position: [f32; 2], force: bool) {
        self.target_position = position;
        if force {
            self.position = position;
        }
    }

    pub fn set_zoom(&mut self, zoom: f32, force: bool) {
        self.target_zoom = zoom;
        if force {
            self.zoom = zoom;
        }
    }

    pub fn lock(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Resets framing to the start of the course.
    pub fn initialize_position(&mut self) {
        self.follow_marbles = false;
        self.locked = false;
        self.set_position(IDLE_POSITION, true);
        self.set_zoom(1.0, true);
    }

    pub fn start_following_marbles(&mut self) {
        self.follow_marbles = true;
    }

    /// Recomputes the target from the race and eases towards it.
    ///
    /// `marbles` must be in race order; `target_index` is the marble racing
    /// for the tracked rank, falling back to the leader when out of range.
    pub fn update(&mut self, marbles: &[Marble], zoom_y: f32, need_to_zoom: bool, target_index: usize) {
        if !self.locked {
            self.compute_target(marbles, zoom_y, need_to_zoom, target_index);
        }

        self.position = [
            self.interpolate(self.position[0], self.target_position[0]),
            self.interpolate(self.position[1], self.target_position[1]),
        ];
        self.zoom = self.interpolate(self.zoom, self.target_zoom);
    }

    fn compute_target(&mut self, marbles: &[Marble], zoom_y: f32, need_to_zoom: bool, target_index: usize) {
        if !self.follow_marbles {
            return;
        }
        let Some(target) = marbles.get(target_index).or_else(|| marbles.first()) else {
            self.target_position = IDLE_POSITION;
            self.target_zoom = 1.0;
            return;
        };

        let (sum, count) = marbles
            .iter()
            .filter(|m| {
                let dx = m.x() - target.x();
                let dy = m.y() - target.y();
                dx * dx + dy * dy <= PACK_RADIUS * PACK_RADIUS
            })
            .fold(([0.0, 0.0], 0.0_f32), |(sum, count), m| {
                ([sum[0] + m.x(), sum[1] + m.y()], count + 1.0)
            });
        let centroid = if count > 0.0 {
            [sum[0] / count, sum[1] / count]
        } else {
            [target.x(), target.y()]
        };

        self.target_position = [
            target.x() * TARGET_BIAS + centroid[0] * (1.0 - TARGET_BIAS),
            target.y() * TARGET_BIAS + centroid[1] * (1.0 - TARGET_BIAS),
        ];

        self.target_zoom = if need_to_zoom {
            let goal_dist = (zoom_y - target.y()).abs();
            ((1.0 - goal_dist / self.zoom_threshold) * MAX_ZOOM).max(1.0)
        } else {
            1.0
        };
    }

    fn interpolate(&self, current: f32, target: f32) -> f32 {
        let d = target - current;
        if d.abs() < 1.0 / self.initial_zoom {
            target
        } else {
            current + d * SMOOTHING
        }
    }

    /// World to screen transform for a `width` x `height` surface.
    pub fn view_transform(&self, width: f32, height: f32) -> Transform2 {
        let zoom = self.total_zoom();
        Transform2::IDENTITY
            .translated(width / 2.0, height / 2.0)
            .scaled(zoom, zoom)
            .translated(-self.position[0], -self.position[1])
    }

    /// Applies [`view_transform`](Self::view_transform) to a canvas.
    pub fn apply(&self, canvas: &mut dyn Canvas, width: f32, height: f32) {
        let zoom = self.total_zoom();
        canvas.translate(width / 2.0, height / 2.0);
        canvas.scale(zoom, zoom);
        canvas.translate(-self.position[0], -self.position[1]);
    }

    /// Visible world rectangle.
    pub fn viewport(&self, width: f32, height: f32) -> Rect {
        let zoom = self.total_zoom();
        let half_w = width / zoom / 2.0;
        let half_h = height / zoom / 2.0;
        Rect::new(
            self.position[0] - half_w,
            self.position[1] - half_h,
            half_w * 2.0,
            half_h * 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::physics::{PhysicsEngine, ScriptedPhysics};

    /// Marbles synced to the given positions.
    fn marbles_at(positions: &[(f32, f32)]) -> Vec<Marble> {
        let mut physics = ScriptedPhysics::new(0.0);
        physics.init().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        positions
            .iter()
            .zip(0u32..)
            .map(|(&(x, y), id)| {
                physics.create_marble(id, x, y).unwrap();
                let mut marble = Marble::new(id, format!("m{id}"), 1.0, 1, &mut rng);
                marble.sync_position(&physics);
                marble
            })
            .collect()
    }

    #[test]
    fn test_eases_and_snaps() {
        let mut camera = Camera::new(&EngineConfig::default());
        camera.set_position([0.0, 0.0], true);
        camera.set_position([10.0, 0.0], false);

        camera.update(&[], 0.0, false, 0);
        assert!((camera.x() - 1.0).abs() < 1e-5);

        for _ in 0..200 {
            camera.update(&[], 0.0, false, 0);
        }
        assert_eq!(camera.position(), [10.0, 0.0]);
    }

    #[test]
    fn test_follows_target_with_pack_bias() {
        let mut camera = Camera::new(&EngineConfig::default());
        camera.start_following_marbles();
        let marbles = marbles_at(&[(10.0, 20.0), (12.0, 20.0), (30.0, 60.0)]);

        camera.update(&marbles, 100.0, false, 0);
        // Centroid of the pack around marble 0 is (11, 20).
        let target = camera.target_position();
        assert!((target[0] - 10.2).abs() < 1e-4);
        assert!((target[1] - 20.0).abs() < 1e-4);

        // Out of range index falls back to the leader.
        camera.update(&marbles, 100.0, false, 9);
        assert!((camera.target_position()[0] - 10.2).abs() < 1e-4);
    }

    #[test]
    fn test_zoom_near_zoom_line() {
        let mut camera = Camera::new(&EngineConfig::default());
        camera.start_following_marbles();
        let marbles = marbles_at(&[(10.0, 99.0)]);

        camera.update(&marbles, 100.0, true, 0);
        // (1 - 1/5) * 4 = 3.2
        assert!((camera.target_position()[1] - 99.0).abs() < 1e-4);
        for _ in 0..200 {
            camera.update(&marbles, 100.0, true, 0);
        }
        assert!((camera.zoom() - 3.2).abs() < 1e-4);

        camera.update(&marbles, 100.0, false, 0);
        assert!(camera.zoom() < 3.2);
    }

    #[test]
    fn test_lock_suppresses_tracking() {
        let mut camera = Camera::new(&EngineConfig::default());
        camera.start_following_marbles();
        camera.lock(true);
        camera.set_position([50.0, 50.0], true);

        let marbles = marbles_at(&[(10.0, 20.0)]);
        camera.update(&marbles, 100.0, false, 0);
        assert_eq!(camera.position(), [50.0, 50.0]);

        camera.lock(false);
        camera.update(&marbles, 100.0, false, 0);
        assert!(camera.x() < 50.0);
    }

    #[test]
    fn test_view_transform_centers_camera() {
        let mut camera = Camera::new(&EngineConfig::default());
        camera.set_position([5.0, 7.0], true);

        let transform = camera.view_transform(1600.0, 900.0);
        assert_eq!(transform.apply([5.0, 7.0]), [800.0, 450.0]);
        assert_eq!(transform.apply([6.0, 7.0]), [830.0, 450.0]);

        let viewport = camera.viewport(1600.0, 900.0);
        assert!(viewport.contains(5.0, 7.0));
        assert!((viewport.width - 1600.0 / 30.0).abs() < 1e-4);
    }
}
