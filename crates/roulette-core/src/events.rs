//! Domain events and their synchronous delivery.

use serde::Serialize;

/// Event emitted by a [`Roulette`](crate::roulette::Roulette).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouletteEvent {
    /// Physics and surface are prepared; the loop may run.
    Ready,
    /// Setup failed. The instance is unusable afterwards.
    Error { detail: String },
    /// The tracked rank was resolved.
    Goal { winner: String },
    /// Message forwarded from an overlay.
    Message { detail: String },
}

/// Identifies a subscription for [`EventBus::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&RouletteEvent) + Send + Sync>;

/// Observer list delivering events in emission order on the caller's thread.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&RouletteEvent) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` when the listener was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: &RouletteEvent) {
        tracing::debug!("[roulette] event {:?}", event);
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_delivery_order_and_unsubscribe() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();

        let first = {
            let log = Arc::clone(&log);
            bus.subscribe(move |event| log.lock().push(format!("first {event:?}")))
        };
        {
            let log = Arc::clone(&log);
            bus.subscribe(move |event| log.lock().push(format!("second {event:?}")));
        }

        bus.emit(&RouletteEvent::Ready);
        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        bus.emit(&RouletteEvent::Goal {
            winner: "A".to_string(),
        });

        assert_eq!(
            *log.lock(),
            vec![
                "first Ready".to_string(),
                "second Ready".to_string(),
                "second Goal { winner: \"A\" }".to_string(),
            ]
        );
    }

    #[test]
    fn test_event_json() {
        let json = serde_json::to_string(&RouletteEvent::Goal {
            winner: "B".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"goal","winner":"B"}"#);
    }
}
