//! ECS resources wrapping the engine.

use std::collections::VecDeque;
use std::sync::Arc;

use bevy::prelude::*;
use parking_lot::Mutex;

use crate::events::RouletteEvent;
use crate::roulette::Roulette;
use crate::ui::PointerKind;

/// The engine instance owned by the app.
#[derive(Resource, Debug)]
pub struct RouletteRes(pub Roulette);

/// Operations a host pushes from outside the schedule.
#[derive(Debug, Clone, PartialEq)]
pub enum RouletteCommand {
    SetMap { index: usize },
    /// Entry text in `name[/weight][*count]` form, comma or newline separated.
    SetMarbles { text: String },
    Start,
    Reset,
    ClearMarbles,
    SetWinningRank { rank: usize },
    SetSpeed { speed: f32 },
    SetUseSkills { enabled: bool },
    SetTheme { name: String },
    Pointer { kind: PointerKind, position: [f32; 2] },
    Wheel { delta: f32 },
    Destroy,
}

/// Thread-safe command queue, drained once per frame before the simulation.
#[derive(Resource, Clone, Default, Debug)]
pub struct CommandQueue {
    inner: Arc<Mutex<VecDeque<RouletteCommand>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, command: RouletteCommand) {
        self.inner.lock().push_back(command);
    }

    pub fn drain(&self) -> Vec<RouletteCommand> {
        self.inner.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Events raised by the engine's listeners, waiting to become messages.
#[derive(Resource, Clone, Default, Debug)]
pub struct EventQueue {
    inner: Arc<Mutex<Vec<RouletteEvent>>>,
}

impl EventQueue {
    pub fn push(&self, event: RouletteEvent) {
        self.inner.lock().push(event);
    }

    pub fn drain(&self) -> Vec<RouletteEvent> {
        std::mem::take(&mut *self.inner.lock())
    }
}
