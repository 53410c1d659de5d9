//! Test utilities for headless Bevy integration tests.
//!
//! `TestApp` runs `MinimalPlugins` + `RouletteHeadlessPlugin` on scripted
//! physics with virtual time paused, so only explicit `advance_ms` calls
//! move the simulation.

use std::time::Duration;

use bevy::prelude::*;

use super::events::RouletteMessage;
use super::plugin::RouletteHeadlessPlugin;
use super::resources::{CommandQueue, RouletteCommand, RouletteRes};
use super::systems;
use crate::config::EngineConfig;
use crate::events::RouletteEvent;
use crate::physics::ScriptedPhysics;
use crate::roulette::Roulette;
use crate::stage::{BodyKind, EntityProps, EntityShape, MapEntity, StageDef};

/// Messages seen so far, in arrival order.
#[derive(Resource, Default)]
pub(crate) struct Received(pub Vec<RouletteEvent>);

fn collect_messages(mut reader: MessageReader<RouletteMessage>, mut received: ResMut<Received>) {
    received.0.extend(reader.read().map(|message| message.0.clone()));
}

/// Straight drop with the goal line at `goal_y`.
pub(crate) fn drop_stage(goal_y: f32) -> StageDef {
    StageDef {
        title: "drop".to_string(),
        goal_y,
        zoom_y: goal_y - 4.0,
        entities: vec![MapEntity {
            position: [0.0, 0.0],
            angle: 0.0,
            body: BodyKind::Static,
            shape: EntityShape::Polyline {
                points: vec![[5.0, -5.0], [5.0, goal_y + 5.0]],
            },
            props: EntityProps::default(),
            color: None,
            bloom_color: None,
        }],
    }
}

pub(crate) struct TestApp {
    pub app: App,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_physics(ScriptedPhysics::with_random_speeds(7, 10.0, 20.0))
    }

    pub fn with_physics(physics: ScriptedPhysics) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(
            RouletteHeadlessPlugin::new(EngineConfig::default())
                .with_seed(12345)
                .with_stages(vec![drop_stage(20.0)])
                .with_physics(Box::new(physics)),
        );
        app.init_resource::<Received>();
        app.add_systems(Update, collect_messages.after(systems::forward_events));

        app.world_mut().resource_mut::<Time<Virtual>>().pause();
        app.update();
        Self { app }
    }

    pub fn update(&mut self) {
        self.app.update();
    }

    /// Moves virtual time forward by `ms` and runs one frame.
    pub fn advance_ms(&mut self, ms: u64) {
        self.app
            .world_mut()
            .resource_mut::<Time<Virtual>>()
            .advance_by(Duration::from_millis(ms));
        self.app.update();
    }

    /// Queues a command; it is applied on the next update.
    pub fn push(&mut self, command: RouletteCommand) {
        self.app.world().resource::<CommandQueue>().push(command);
    }

    pub fn roulette(&self) -> &Roulette {
        &self.app.world().resource::<RouletteRes>().0
    }

    pub fn received(&self) -> Vec<RouletteEvent> {
        self.app.world().resource::<Received>().0.clone()
    }
}
