//! Engine events as Bevy messages.

use bevy::prelude::*;

use crate::events::RouletteEvent;

/// An engine event, re-emitted on the frame after it was raised.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct RouletteMessage(pub RouletteEvent);
