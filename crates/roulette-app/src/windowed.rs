//! Bevy window hosting the engine.
//!
//! Space starts a race, R resets it, 1-9 switch stages.

use anyhow::{Result, bail};
use bevy::prelude::*;
use roulette_core::RouletteEvent;
use roulette_core::bevy::{CommandQueue, RouletteCommand, RouletteHeadlessPlugin, RouletteMessage, RoulettePlugin};

use crate::headless::RaceOptions;

/// Entry text re-sent after a stage switch, which drops the field.
#[derive(Resource, Debug, Clone)]
struct Entries(String);

const MAP_KEYS: [KeyCode; 9] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

pub fn run(options: &RaceOptions) -> Result<()> {
    let queue = CommandQueue::new();
    queue.push(RouletteCommand::SetMap { index: options.map });
    queue.push(RouletteCommand::SetTheme {
        name: options.theme.clone(),
    });
    queue.push(RouletteCommand::SetSpeed { speed: options.speed });
    queue.push(RouletteCommand::SetWinningRank { rank: options.rank });
    queue.push(RouletteCommand::SetMarbles {
        text: options.entries.clone(),
    });

    let mut headless = RouletteHeadlessPlugin::new(options.config.clone()).with_command_queue(queue);
    if let Some(seed) = options.seed {
        headless = headless.with_seed(seed);
    }

    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Marble Roulette".to_string(),
                    ..default()
                }),
                ..default()
            })
            .disable::<bevy::log::LogPlugin>(),
    );
    app.add_plugins(RoulettePlugin::new(headless));
    app.insert_resource(Entries(options.entries.clone()));
    app.add_systems(Update, (keyboard_controls, log_messages));

    tracing::info!("[app] window opened; space starts, R resets, 1-9 pick a stage");
    if let AppExit::Error(code) = app.run() {
        bail!("app exited with code {code}");
    }
    Ok(())
}

fn keyboard_controls(keys: Res<ButtonInput<KeyCode>>, queue: Res<CommandQueue>, entries: Res<Entries>) {
    if keys.just_pressed(KeyCode::Space) {
        queue.push(RouletteCommand::Start);
    }
    if keys.just_pressed(KeyCode::KeyR) {
        queue.push(RouletteCommand::Reset);
        queue.push(RouletteCommand::SetMarbles {
            text: entries.0.clone(),
        });
    }
    if let Some(index) = MAP_KEYS.iter().position(|key| keys.just_pressed(*key)) {
        queue.push(RouletteCommand::SetMap { index });
        queue.push(RouletteCommand::SetMarbles {
            text: entries.0.clone(),
        });
    }
}

fn log_messages(mut reader: MessageReader<RouletteMessage>) {
    for RouletteMessage(event) in reader.read() {
        match event {
            RouletteEvent::Goal { winner } => tracing::info!("[app] winner: {}", winner),
            RouletteEvent::Message { detail } => tracing::info!("[app] {}", detail),
            RouletteEvent::Error { detail } => tracing::error!("[app] {}", detail),
            RouletteEvent::Ready => tracing::info!("[app] engine ready"),
        }
    }
}
