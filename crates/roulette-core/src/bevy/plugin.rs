//! Bevy plugins for the roulette engine.
//!
//! - `RouletteHeadlessPlugin`: simulation, commands and events only; runs
//!   under `MinimalPlugins`
//! - `RoulettePlugin`: headless logic plus window input and gizmo drawing

use bevy::prelude::*;
use parking_lot::Mutex;

use super::events::RouletteMessage;
use super::resources::{CommandQueue, EventQueue, RouletteRes};
use super::systems;
use crate::config::EngineConfig;
use crate::physics::{PhysicsEngine, RapierPhysics};
use crate::roulette::Roulette;
use crate::stage::StageDef;

/// Logic-only plugin, usable without a window or renderer.
///
/// The engine is created and initialized while the plugin is built, so the
/// `Ready` (or `Error`) message is available on the first update.
#[derive(Default)]
pub struct RouletteHeadlessPlugin {
    pub config: EngineConfig,
    pub seed: Option<u64>,
    pub stages: Option<Vec<StageDef>>,
    pub command_queue: Option<CommandQueue>,
    /// Taken on build; defaults to [`RapierPhysics`].
    physics: Mutex<Option<Box<dyn PhysicsEngine>>>,
}

impl RouletteHeadlessPlugin {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_stages(mut self, stages: Vec<StageDef>) -> Self {
        self.stages = Some(stages);
        self
    }

    #[must_use]
    pub fn with_command_queue(mut self, queue: CommandQueue) -> Self {
        self.command_queue = Some(queue);
        self
    }

    #[must_use]
    pub fn with_physics(self, physics: Box<dyn PhysicsEngine>) -> Self {
        *self.physics.lock() = Some(physics);
        self
    }

    fn create_roulette(&self) -> Roulette {
        let physics: Box<dyn PhysicsEngine> = match self.physics.lock().take() {
            Some(physics) => physics,
            None => match self.seed {
                Some(seed) => Box::new(RapierPhysics::with_seed(seed)),
                None => Box::new(RapierPhysics::new()),
            },
        };
        let roulette = match self.seed {
            Some(seed) => Roulette::with_seed(physics, self.config.clone(), seed),
            None => Roulette::new(physics, self.config.clone()),
        };
        match &self.stages {
            Some(stages) => roulette.with_stages(stages.clone()),
            None => roulette,
        }
    }
}

impl Plugin for RouletteHeadlessPlugin {
    fn build(&self, app: &mut App) {
        let mut roulette = self.create_roulette();

        let events = EventQueue::default();
        let sink = events.clone();
        roulette.subscribe(move |event| sink.push(event.clone()));

        if let Err(err) = roulette.initialize(self.config.canvas_width, self.config.canvas_height) {
            tracing::error!("[roulette] initialization failed: {}", err);
        }

        app.insert_resource(RouletteRes(roulette))
            .insert_resource(events)
            .insert_resource(self.command_queue.clone().unwrap_or_default());

        app.add_message::<RouletteMessage>();

        app.add_systems(
            Update,
            (
                systems::process_commands,
                systems::advance_roulette,
                systems::forward_events,
            )
                .chain(),
        );
    }
}

/// Full plugin: headless logic plus window input and gizmo rendering.
#[derive(Default)]
pub struct RoulettePlugin {
    pub headless: RouletteHeadlessPlugin,
}

impl RoulettePlugin {
    pub fn new(headless: RouletteHeadlessPlugin) -> Self {
        Self { headless }
    }
}

impl Plugin for RoulettePlugin {
    fn build(&self, app: &mut App) {
        self.headless.build(app);

        app.add_systems(Startup, systems::setup_camera);
        app.add_systems(
            Update,
            (systems::sync_window_size, systems::route_pointer_input)
                .chain()
                .before(systems::process_commands),
        );
        app.add_systems(
            Update,
            systems::render_roulette.after(systems::forward_events),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::super::resources::RouletteCommand;
    use super::super::test_utils::TestApp;
    use crate::events::RouletteEvent;
    use crate::roulette::Lifecycle;

    fn goals(events: &[RouletteEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|event| match event {
                RouletteEvent::Goal { winner } => Some(winner.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_ready_message_on_first_update() {
        let app = TestApp::new();

        assert_eq!(app.received(), vec![RouletteEvent::Ready]);
        assert_eq!(app.roulette().lifecycle(), Lifecycle::Ready);
        assert_eq!(app.roulette().stage().map(|s| s.title.as_str()), Some("drop"));
    }

    #[test]
    fn test_commands_drive_a_race_to_goal() {
        let mut app = TestApp::new();
        app.push(RouletteCommand::SetMarbles {
            text: "Alice, Bob, Carol*2".to_string(),
        });
        app.push(RouletteCommand::SetWinningRank { rank: 1 });
        app.push(RouletteCommand::Start);
        app.update();

        assert_eq!(app.roulette().count(), 4);
        assert!(app.roulette().is_running());

        for _ in 0..400 {
            app.advance_ms(50);
            if !app.roulette().is_running() {
                break;
            }
        }

        let goals = goals(&app.received());
        assert_eq!(goals.len(), 1);
        let winner = app.roulette().winner().expect("goal sets a winner");
        assert_eq!(winner.name, goals[0]);
        assert_eq!(app.roulette().winners()[1].name, winner.name);
    }

    #[test]
    fn test_paused_time_does_not_simulate() {
        let mut app = TestApp::new();
        app.push(RouletteCommand::SetMarbles {
            text: "A, B".to_string(),
        });
        app.push(RouletteCommand::Start);
        app.update();

        let before: Vec<f32> = app.roulette().marbles().iter().map(|m| m.y()).collect();
        for _ in 0..5 {
            app.update();
        }
        let after: Vec<f32> = app.roulette().marbles().iter().map(|m| m.y()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_failed_command_is_logged_not_fatal() {
        let mut app = TestApp::new();
        app.push(RouletteCommand::SetSpeed { speed: -1.0 });
        app.push(RouletteCommand::SetTheme {
            name: "sepia".to_string(),
        });
        app.push(RouletteCommand::SetSpeed { speed: 2.0 });
        app.update();

        assert!((app.roulette().speed() - 2.0).abs() < f32::EPSILON);
        assert_eq!(app.roulette().lifecycle(), Lifecycle::Ready);
    }

    #[test]
    fn test_destroy_stops_the_loop() {
        let mut app = TestApp::new();
        app.push(RouletteCommand::SetMarbles {
            text: "A, B".to_string(),
        });
        app.push(RouletteCommand::Start);
        app.push(RouletteCommand::Destroy);
        app.update();
        app.advance_ms(50);

        assert_eq!(app.roulette().lifecycle(), Lifecycle::Destroyed);
        assert_eq!(app.received(), vec![RouletteEvent::Ready]);
    }
}
