//! Race orchestrator.
//!
//! [`Roulette`] owns the physics world, the marbles and every presentation
//! object. The host calls [`Roulette::frame`] once per display frame; the
//! elapsed wall time is drained in fixed simulation steps.

use std::sync::Arc;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::camera::Camera;
use crate::config::EngineConfig;
use crate::effects::{Effect, ParticleManager, SkillEffect};
use crate::entry::{normalize_weights, parse_entries, split_entries, total_count};
use crate::error::RouletteError;
use crate::events::{EventBus, ListenerId, RouletteEvent};
use crate::marble::{Marble, MarbleId, Skill};
use crate::physics::{PhysicsEngine, RapierPhysics};
use crate::render::{Canvas, RenderParams, RouletteRenderer, SkinLookup};
use crate::stage::{MapInfo, StageDef, map_infos};
use crate::theme::ColorTheme;
use crate::ui::{FastForwarder, Minimap, PointerKind, RankRenderer, UiAction, UiObject};

/// Largest field [`Roulette::set_marbles`] accepts.
pub const MAX_MARBLES: u32 = 10_000;

/// Lifecycle of a [`Roulette`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Uninitialized,
    Ready,
    /// Setup failed; the instance must be recreated.
    Failed,
    Destroyed,
}

pub struct Roulette {
    config: EngineConfig,
    lifecycle: Lifecycle,
    physics: Box<dyn PhysicsEngine>,
    events: EventBus,
    stages: Vec<StageDef>,
    stage_index: Option<usize>,
    /// Racing marbles in race order (largest y first).
    marbles: Vec<Marble>,
    winners: Vec<Marble>,
    winner: Option<Marble>,
    winner_rank: usize,
    total_marble_count: usize,
    is_running: bool,
    goal_fired: bool,
    goal_dist: f32,
    time_scale: f32,
    speed: f32,
    fast_forward: f32,
    elapsed: f32,
    last_time: Option<f64>,
    /// Finished marbles awaiting body removal, with remaining simulated ms.
    pending_removals: Vec<(MarbleId, f32)>,
    camera: Camera,
    theme: ColorTheme,
    renderer: RouletteRenderer,
    effects: Vec<Box<dyn Effect>>,
    particles: ParticleManager,
    overlays: Vec<Box<dyn UiObject>>,
    hovered: Option<usize>,
    last_pointer: Option<[f32; 2]>,
    size: [f32; 2],
    rng: ChaCha8Rng,
}

impl std::fmt::Debug for Roulette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Roulette")
            .field("lifecycle", &self.lifecycle)
            .field("stage_index", &self.stage_index)
            .field("marbles", &self.marbles.len())
            .field("winners", &self.winners.len())
            .field("winner_rank", &self.winner_rank)
            .field("is_running", &self.is_running)
            .field("time_scale", &self.time_scale)
            .finish_non_exhaustive()
    }
}

impl Roulette {
    pub fn new(physics: Box<dyn PhysicsEngine>, config: EngineConfig) -> Self {
        Self::with_rng(physics, config, ChaCha8Rng::from_rng(&mut rand::rng()))
    }

    /// Same as [`new`](Self::new) with a fixed seed for lane shuffles,
    /// colors, skills and particles.
    pub fn with_seed(physics: Box<dyn PhysicsEngine>, config: EngineConfig, seed: u64) -> Self {
        Self::with_rng(physics, config, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Roulette backed by [`RapierPhysics`].
    pub fn with_rapier(config: EngineConfig) -> Self {
        Self::new(Box::new(RapierPhysics::new()), config)
    }

    fn with_rng(physics: Box<dyn PhysicsEngine>, config: EngineConfig, rng: ChaCha8Rng) -> Self {
        Self {
            camera: Camera::new(&config),
            winner_rank: config.winning_rank,
            size: [config.canvas_width, config.canvas_height],
            lifecycle: Lifecycle::Uninitialized,
            physics,
            events: EventBus::new(),
            stages: Vec::new(),
            stage_index: None,
            marbles: Vec::new(),
            winners: Vec::new(),
            winner: None,
            total_marble_count: 0,
            is_running: false,
            goal_fired: false,
            goal_dist: f32::INFINITY,
            time_scale: 1.0,
            speed: 1.0,
            fast_forward: 1.0,
            elapsed: 0.0,
            last_time: None,
            pending_removals: Vec::new(),
            theme: ColorTheme::default(),
            renderer: RouletteRenderer::new(),
            effects: Vec::new(),
            particles: ParticleManager::new(),
            overlays: Vec::new(),
            hovered: None,
            last_pointer: None,
            config,
            rng,
        }
    }

    /// Replaces the built-in stage list. Takes effect at [`initialize`](Self::initialize).
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<StageDef>) -> Self {
        self.stages = stages;
        self
    }

    pub fn set_skins(&mut self, skins: Option<Arc<dyn SkinLookup>>) {
        self.renderer.set_skins(skins);
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&RouletteEvent) + Send + Sync + 'static) -> ListenerId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    fn emit(&mut self, event: &RouletteEvent) {
        if self.lifecycle != Lifecycle::Destroyed {
            self.events.emit(event);
        }
    }

    fn ensure_ready(&self) -> Result<(), RouletteError> {
        match self.lifecycle {
            Lifecycle::Ready => Ok(()),
            Lifecycle::Destroyed => Err(RouletteError::Destroyed),
            Lifecycle::Uninitialized | Lifecycle::Failed => Err(RouletteError::NotInitialized),
        }
    }

    // ---- lifecycle ----

    /// Prepares physics and the first stage for a `width` x `height` surface.
    /// Emits `Ready` on success or `Error` on failure, which is fatal.
    pub fn initialize(&mut self, width: f32, height: f32) -> Result<(), RouletteError> {
        match self.lifecycle {
            Lifecycle::Ready => return Ok(()),
            Lifecycle::Destroyed => return Err(RouletteError::Destroyed),
            Lifecycle::Failed => return Err(RouletteError::NotInitialized),
            Lifecycle::Uninitialized => {}
        }

        self.size = [width, height];
        if let Err(err) = self.setup() {
            tracing::error!("[roulette] initialization failed: {}", err);
            self.lifecycle = Lifecycle::Failed;
            self.emit(&RouletteEvent::Error {
                detail: err.to_string(),
            });
            return Err(err);
        }

        self.overlays = vec![
            Box::new(RankRenderer::new()) as Box<dyn UiObject>,
            Box::new(Minimap::new()),
            Box::new(FastForwarder::new()),
        ];
        self.lifecycle = Lifecycle::Ready;
        tracing::info!(
            "[roulette] ready: {} stage(s), surface {}x{}",
            self.stages.len(),
            width,
            height
        );
        self.emit(&RouletteEvent::Ready);
        Ok(())
    }

    fn setup(&mut self) -> Result<(), RouletteError> {
        self.config.validate()?;
        self.physics.init()?;
        if self.stages.is_empty() {
            self.stages = StageDef::builtin()?;
        }
        let stage = self.stages.first().ok_or(RouletteError::NoStage)?;
        self.physics.create_stage(stage)?;
        self.stage_index = Some(0);
        Ok(())
    }

    /// Stops everything. No physics steps, renders or events happen afterwards.
    pub fn destroy(&mut self) {
        if self.lifecycle == Lifecycle::Destroyed {
            return;
        }
        tracing::info!("[roulette] destroyed");
        self.lifecycle = Lifecycle::Destroyed;
        self.physics.clear();
        self.marbles.clear();
        self.winners.clear();
        self.winner = None;
        self.is_running = false;
        self.events.clear();
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    // ---- race setup ----

    /// Loads stage `index`. Out of range indices are ignored.
    pub fn set_map(&mut self, index: usize) -> Result<(), RouletteError> {
        self.ensure_ready()?;
        if index >= self.stages.len() {
            tracing::debug!("[roulette] set_map({}) out of range, ignored", index);
            return Ok(());
        }

        self.physics.clear();
        self.clear_race();
        let stage = &self.stages[index];
        self.physics.create_stage(stage)?;
        self.stage_index = Some(index);
        self.goal_dist = f32::INFINITY;
        self.time_scale = 1.0;
        self.camera.initialize_position();
        tracing::info!("[roulette] map {} loaded: {}", index, stage.title);
        Ok(())
    }

    /// Replaces the field with the parsed entries. Returns the marble count.
    ///
    /// A field larger than [`MAX_MARBLES`] is rejected before anything changes.
    pub fn set_marbles<S: AsRef<str>>(&mut self, names: &[S]) -> Result<usize, RouletteError> {
        self.ensure_ready()?;

        let mut entries = parse_entries(names);
        let total = total_count(&entries);
        let total_u32 = match u32::try_from(total) {
            Ok(total) if total <= MAX_MARBLES => total,
            _ => {
                tracing::warn!("[roulette] rejected field of {} marble(s), max {}", total, MAX_MARBLES);
                return Err(RouletteError::TooManyMarbles {
                    count: total,
                    max: MAX_MARBLES,
                });
            }
        };
        normalize_weights(&mut entries);

        self.reset()?;

        let mut orders: Vec<MarbleId> = (0..total_u32).collect();
        orders.shuffle(&mut self.rng);
        let mut orders = orders.into_iter();

        for entry in &entries {
            for _ in 0..entry.count {
                let Some(order) = orders.next() else {
                    break;
                };
                let mut marble = Marble::new(order, entry.name.clone(), entry.weight, total_u32, &mut self.rng);
                marble.update_palette(&self.theme.marble_palette);
                if let Err(err) = self.physics.create_marble(order, marble.x(), marble.y()) {
                    self.physics.clear_marbles();
                    self.clear_race();
                    return Err(err.into());
                }
                self.marbles.push(marble);
            }
        }

        self.total_marble_count = self.marbles.len();
        self.sort_marbles();
        tracing::info!(
            "[roulette] {} marble(s) from {} entr(ies)",
            self.total_marble_count,
            entries.len()
        );
        Ok(self.total_marble_count)
    }

    /// Parses free text (comma or newline separated) and calls [`set_marbles`](Self::set_marbles).
    pub fn set_marbles_text(&mut self, text: &str) -> Result<usize, RouletteError> {
        self.set_marbles(&split_entries(text))
    }

    /// Releases the marbles. Returns `false` when there is nothing to race.
    pub fn start(&mut self) -> Result<bool, RouletteError> {
        self.ensure_ready()?;
        if self.marbles.is_empty() {
            tracing::warn!("[roulette] start ignored: no marbles");
            return Ok(false);
        }
        if self.is_running {
            return Ok(true);
        }

        if self.winner_rank >= self.total_marble_count {
            self.winner_rank = self.total_marble_count.saturating_sub(1);
        }
        self.is_running = true;
        self.goal_fired = false;
        self.winner = None;
        self.camera.start_following_marbles();
        self.physics.start();
        for marble in &mut self.marbles {
            marble.is_active = true;
        }
        tracing::info!(
            "[roulette] race started: {} marble(s), tracking rank {}",
            self.marbles.len(),
            self.winner_rank
        );
        Ok(true)
    }

    /// Drops every marble and reloads the current stage.
    pub fn reset(&mut self) -> Result<(), RouletteError> {
        self.ensure_ready()?;
        self.physics.clear();
        self.clear_race();
        if let Some(stage) = self.stage_index.and_then(|i| self.stages.get(i)) {
            self.physics.create_stage(stage)?;
        }
        self.goal_dist = f32::INFINITY;
        self.time_scale = 1.0;
        self.camera.initialize_position();
        Ok(())
    }

    /// Drops every marble, keeping the stage as is.
    pub fn clear_marbles(&mut self) -> Result<(), RouletteError> {
        self.ensure_ready()?;
        self.physics.clear_marbles();
        self.clear_race();
        Ok(())
    }

    fn clear_race(&mut self) {
        self.marbles.clear();
        self.winners.clear();
        self.winner = None;
        self.total_marble_count = 0;
        self.is_running = false;
        self.goal_fired = false;
        self.pending_removals.clear();
        self.effects.clear();
        self.particles.clear();
    }

    // ---- settings ----

    pub fn set_winning_rank(&mut self, rank: usize) {
        self.winner_rank = rank;
    }

    pub fn winning_rank(&self) -> usize {
        self.winner_rank
    }

    pub fn set_speed(&mut self, speed: f32) -> Result<(), RouletteError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(RouletteError::InvalidSpeed(speed));
        }
        self.speed = speed;
        Ok(())
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_use_skills(&mut self, use_skills: bool) {
        self.config.use_skills = use_skills;
    }

    pub fn set_theme(&mut self, name: &str) -> Result<(), RouletteError> {
        let theme = ColorTheme::by_name(name).ok_or_else(|| RouletteError::UnknownTheme(name.to_string()))?;
        self.set_custom_theme(theme);
        Ok(())
    }

    pub fn set_custom_theme(&mut self, theme: ColorTheme) {
        self.theme = theme;
        let palette = &self.theme.marble_palette;
        for marble in self
            .marbles
            .iter_mut()
            .chain(self.winners.iter_mut())
            .chain(self.winner.iter_mut())
        {
            marble.update_palette(palette);
        }
    }

    pub fn theme(&self) -> &ColorTheme {
        &self.theme
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.size = [width, height];
    }

    // ---- queries ----

    pub fn maps(&self) -> Vec<MapInfo> {
        map_infos(&self.stages)
    }

    pub fn stage(&self) -> Option<&StageDef> {
        self.stage_index.and_then(|i| self.stages.get(i))
    }

    /// Number of marbles in the field, finished ones included.
    pub fn count(&self) -> usize {
        self.total_marble_count
    }

    pub fn marbles(&self) -> &[Marble] {
        &self.marbles
    }

    pub fn winners(&self) -> &[Marble] {
        &self.winners
    }

    pub fn winner(&self) -> Option<&Marble> {
        self.winner.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn goal_dist(&self) -> f32 {
        self.goal_dist
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Pixels per world unit.
    pub fn zoom(&self) -> f32 {
        self.camera.total_zoom()
    }

    // ---- input ----

    /// Routes pointer input to the overlay under `position`.
    pub fn pointer(&mut self, kind: PointerKind, position: [f32; 2]) {
        if self.lifecycle != Lifecycle::Ready {
            return;
        }
        self.last_pointer = Some(position);
        let under = self
            .overlays
            .iter()
            .position(|o| o.bounding_box().is_some_and(|b| b.contains(position[0], position[1])));

        match kind {
            PointerKind::Down | PointerKind::DoubleClick => {
                if let Some(index) = under {
                    self.overlays[index].on_pointer(kind, Some(position));
                }
            }
            PointerKind::Move => {
                if let Some(previous) = self.hovered.filter(|prev| Some(*prev) != under) {
                    self.overlays[previous].on_pointer(PointerKind::Leave, None);
                }
                if let Some(index) = under {
                    self.overlays[index].on_pointer(kind, Some(position));
                }
                self.hovered = under;
            }
            PointerKind::Up | PointerKind::Leave => {
                for overlay in &mut self.overlays {
                    overlay.on_pointer(kind, Some(position));
                }
                if kind == PointerKind::Leave {
                    self.hovered = None;
                }
            }
        }
        self.apply_ui_actions();
    }

    /// Routes a wheel delta to the overlay under the last pointer position.
    pub fn wheel(&mut self, delta: f32) {
        if self.lifecycle != Lifecycle::Ready {
            return;
        }
        let Some([x, y]) = self.last_pointer else {
            return;
        };
        if let Some(overlay) = self
            .overlays
            .iter_mut()
            .find(|o| o.bounding_box().is_some_and(|b| b.contains(x, y)))
        {
            overlay.on_wheel(delta);
        }
        self.apply_ui_actions();
    }

    fn apply_ui_actions(&mut self) {
        let actions: Vec<UiAction> = self.overlays.iter_mut().flat_map(|o| o.drain_actions()).collect();
        for action in actions {
            match action {
                UiAction::LockCamera(Some(position)) => {
                    self.camera.set_position(position, false);
                    self.camera.lock(true);
                }
                UiAction::LockCamera(None) => self.camera.lock(false),
                UiAction::Message(detail) => self.emit(&RouletteEvent::Message { detail }),
                UiAction::FastForward(multiplier) => self.fast_forward = multiplier,
            }
        }
    }

    // ---- loop ----

    /// One display frame: simulate up to `now_ms`, then draw. Errors are
    /// logged and the next frame proceeds normally.
    pub fn frame(&mut self, now_ms: f64, canvas: &mut dyn Canvas) {
        if self.lifecycle != Lifecycle::Ready {
            return;
        }
        if let Err(err) = self.advance(now_ms) {
            tracing::error!("[roulette] frame failed: {}", err);
        }
        self.render(canvas);
    }

    /// Simulates up to `now_ms` without drawing.
    pub fn advance(&mut self, now_ms: f64) -> Result<(), RouletteError> {
        self.ensure_ready()?;

        let last = self.last_time.replace(now_ms).unwrap_or(now_ms);
        #[allow(clippy::cast_possible_truncation)]
        let delta = (now_ms - last).max(0.0) as f32;
        self.elapsed += delta * self.speed * self.fast_forward;
        if self.elapsed > self.config.max_elapsed_ms {
            self.elapsed %= self.config.max_elapsed_ms;
        }

        let interval = self.config.update_interval_ms;
        while self.elapsed >= interval {
            self.elapsed -= interval;
            self.tick(interval)?;
        }

        self.update_camera();
        self.apply_ui_actions();
        Ok(())
    }

    fn tick(&mut self, dt: f32) -> Result<(), RouletteError> {
        let Some((goal_y, zoom_y)) = self.stage().map(|s| (s.goal_y, s.zoom_y)) else {
            return Err(RouletteError::NoStage);
        };

        self.physics.step(self.config.step_seconds() * self.time_scale)?;

        let use_skills = self.config.use_skills;
        for marble in &mut self.marbles {
            marble.update(dt, &mut self.rng, self.physics.as_mut(), use_skills, self.config.stuck_delay_ms);
            if marble.skill == Skill::Impact {
                self.effects.push(Box::new(SkillEffect::new(marble.x(), marble.y())));
                self.physics.impact(marble.id);
            }
        }

        self.process_removals(dt);
        self.sort_marbles();
        self.collect_arrivals(goal_y);
        self.update_time_scale(zoom_y);

        self.particles.update(dt);
        for effect in &mut self.effects {
            effect.update(dt);
        }
        self.effects.retain(|e| !e.is_destroyed());
        for overlay in &mut self.overlays {
            overlay.update(dt);
        }
        Ok(())
    }

    fn sort_marbles(&mut self) {
        self.marbles.sort_by(|a, b| b.y().total_cmp(&a.y()));
    }

    fn collect_arrivals(&mut self, goal_y: f32) {
        if !self.marbles.iter().any(|m| m.y() > goal_y) {
            self.check_goal(true);
            return;
        }

        let (arrived, racing): (Vec<_>, Vec<_>) = std::mem::take(&mut self.marbles)
            .into_iter()
            .partition(|m| m.y() > goal_y);
        self.marbles = racing;

        for mut marble in arrived {
            marble.is_active = false;
            tracing::debug!("[roulette] {} finished #{}", marble.name, self.winners.len() + 1);
            self.pending_removals
                .push((marble.id, self.config.goal_removal_delay_ms));
            self.winners.push(marble);
            self.check_goal(false);
        }
        self.check_goal(true);
    }

    /// Fires the goal once the tracked rank is resolved. With `fallback`,
    /// a race whose active field ran out also resolves to the closest rank.
    fn check_goal(&mut self, fallback: bool) {
        if !self.is_running || self.goal_fired || self.winners.is_empty() {
            return;
        }
        let resolved = self.winners.len() > self.winner_rank || (fallback && self.marbles.is_empty());
        if !resolved {
            return;
        }

        let index = self.winner_rank.min(self.winners.len() - 1);
        let winner = self.winners[index].clone();
        tracing::info!("[roulette] goal: {} at rank {}", winner.name, index);

        self.is_running = false;
        self.goal_fired = true;
        self.particles.shot(self.size[0], self.size[1], &mut self.rng);
        let name = winner.name.clone();
        self.winner = Some(winner);
        self.emit(&RouletteEvent::Goal { winner: name });
    }

    fn target_index(&self) -> Option<usize> {
        self.winner_rank.checked_sub(self.winners.len())
    }

    fn update_time_scale(&mut self, zoom_y: f32) {
        let target = self.target_index().and_then(|i| self.marbles.get(i).map(|m| (i, m)));
        let Some((index, marble)) = target else {
            self.goal_dist = f32::INFINITY;
            self.time_scale = 1.0;
            return;
        };

        let threshold = self.config.zoom_threshold;
        self.goal_dist = (zoom_y - marble.y()).abs();

        let has_neighbor = index > 0 || index + 1 < self.marbles.len();
        let near_zoom_line = marble.y() > zoom_y - threshold * 1.2;
        self.time_scale = if self.goal_dist < threshold && near_zoom_line && has_neighbor {
            (self.goal_dist / threshold).max(self.config.min_time_scale)
        } else {
            1.0
        };
    }

    fn process_removals(&mut self, dt: f32) {
        let physics = &mut self.physics;
        self.pending_removals.retain_mut(|(id, remaining)| {
            *remaining -= dt;
            if *remaining <= 0.0 {
                physics.remove_marble(*id);
                false
            } else {
                true
            }
        });
    }

    fn update_camera(&mut self) {
        let zoom_y = self.stage().map_or(0.0, |s| s.zoom_y);
        let need_to_zoom = self.goal_dist < self.config.zoom_threshold;
        let target_index = self.winner_rank.saturating_sub(self.winners.len());
        self.camera.update(&self.marbles, zoom_y, need_to_zoom, target_index);
    }

    /// Draws the current state without simulating.
    pub fn render(&mut self, canvas: &mut dyn Canvas) {
        if self.lifecycle != Lifecycle::Ready {
            return;
        }
        let entities = self.physics.entities();
        let params = RenderParams {
            camera: &self.camera,
            stage: self.stage_index.and_then(|i| self.stages.get(i)),
            entities: &entities,
            marbles: &self.marbles,
            winners: &self.winners,
            winner: self.winner.as_ref(),
            winner_rank: self.winner_rank,
            total_marble_count: self.total_marble_count,
            effects: &self.effects,
            particles: &self.particles,
            theme: &self.theme,
            size: self.size,
            use_skills: self.config.use_skills,
        };
        self.renderer.render(canvas, &params, &mut self.overlays);
    }
}
