//! Systems driving the engine from the Bevy schedule.

use bevy::input::mouse::MouseWheel;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::canvas::GizmoCanvas;
use super::events::RouletteMessage;
use super::resources::{CommandQueue, EventQueue, RouletteCommand, RouletteRes};
use crate::roulette::Lifecycle;
use crate::ui::PointerKind;

/// Two presses closer than this count as a double click.
const DOUBLE_CLICK_SECS: f64 = 0.3;

/// Applies queued host commands. Failures are logged; the engine reports
/// fatal ones through its own `Error` event.
pub fn process_commands(queue: Res<CommandQueue>, mut roulette: ResMut<RouletteRes>) {
    let roulette = &mut roulette.0;
    for command in queue.drain() {
        tracing::debug!("[command] {:?}", command);
        let result = match command {
            RouletteCommand::SetMap { index } => roulette.set_map(index),
            RouletteCommand::SetMarbles { text } => roulette.set_marbles_text(&text).map(|count| {
                tracing::info!("[command] {} marbles on the course", count);
            }),
            RouletteCommand::Start => roulette.start().map(|started| {
                if !started {
                    tracing::warn!("[command] start ignored, no marbles");
                }
            }),
            RouletteCommand::Reset => roulette.reset(),
            RouletteCommand::ClearMarbles => roulette.clear_marbles(),
            RouletteCommand::SetWinningRank { rank } => {
                roulette.set_winning_rank(rank);
                Ok(())
            }
            RouletteCommand::SetSpeed { speed } => roulette.set_speed(speed),
            RouletteCommand::SetUseSkills { enabled } => {
                roulette.set_use_skills(enabled);
                Ok(())
            }
            RouletteCommand::SetTheme { name } => roulette.set_theme(&name),
            RouletteCommand::Pointer { kind, position } => {
                roulette.pointer(kind, position);
                Ok(())
            }
            RouletteCommand::Wheel { delta } => {
                roulette.wheel(delta);
                Ok(())
            }
            RouletteCommand::Destroy => {
                roulette.destroy();
                Ok(())
            }
        };
        if let Err(err) = result {
            tracing::warn!("[command] failed: {}", err);
        }
    }
}

/// Runs the fixed-step simulation up to the current virtual time.
pub fn advance_roulette(time: Res<Time>, mut roulette: ResMut<RouletteRes>) {
    if roulette.0.lifecycle() != Lifecycle::Ready {
        return;
    }
    if let Err(err) = roulette.0.advance(time.elapsed_secs_f64() * 1000.0) {
        tracing::error!("[roulette] advance failed: {}", err);
    }
}

/// Turns events captured by the engine's listener into messages.
pub fn forward_events(queue: Res<EventQueue>, mut writer: MessageWriter<RouletteMessage>) {
    for event in queue.drain() {
        writer.write(RouletteMessage(event));
    }
}

/// Keeps the engine surface in sync with the primary window.
pub fn sync_window_size(windows: Query<&Window, With<PrimaryWindow>>, mut roulette: ResMut<RouletteRes>, mut last: Local<[f32; 2]>) {
    let Ok(window) = windows.single() else {
        return;
    };
    let size = [window.width(), window.height()];
    if size != *last {
        *last = size;
        roulette.0.resize(size[0], size[1]);
    }
}

/// Feeds cursor, button and wheel input to the engine overlays.
pub fn route_pointer_input(
    windows: Query<&Window, With<PrimaryWindow>>,
    buttons: Res<ButtonInput<MouseButton>>,
    mut wheel: MessageReader<MouseWheel>,
    time: Res<Time<Real>>,
    mut roulette: ResMut<RouletteRes>,
    mut inside: Local<bool>,
    mut last_press: Local<Option<f64>>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let roulette = &mut roulette.0;

    let Some(cursor) = window.cursor_position() else {
        if std::mem::take(&mut *inside) {
            roulette.pointer(PointerKind::Leave, [0.0, 0.0]);
        }
        wheel.clear();
        return;
    };
    let position = [cursor.x, cursor.y];
    *inside = true;

    roulette.pointer(PointerKind::Move, position);
    if buttons.just_pressed(MouseButton::Left) {
        let now = time.elapsed_secs_f64();
        roulette.pointer(PointerKind::Down, position);
        if last_press.is_some_and(|last| now - last < DOUBLE_CLICK_SECS) {
            roulette.pointer(PointerKind::DoubleClick, position);
            *last_press = None;
        } else {
            *last_press = Some(now);
        }
    }
    if buttons.just_released(MouseButton::Left) {
        roulette.pointer(PointerKind::Up, position);
    }
    for event in wheel.read() {
        roulette.wheel(event.y);
    }
}

/// Draws the current frame with gizmos.
pub fn render_roulette(windows: Query<&Window, With<PrimaryWindow>>, mut gizmos: Gizmos, mut roulette: ResMut<RouletteRes>) {
    let Ok(window) = windows.single() else {
        return;
    };
    let mut canvas = GizmoCanvas::new(&mut gizmos, window.width(), window.height());
    roulette.0.render(&mut canvas);
}

/// Spawns the 2D camera the gizmos are drawn through.
pub fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
    tracing::info!("[roulette] camera spawned");
}
