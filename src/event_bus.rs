use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use parking_lot::RwLock;

use crate::traits::command::CommandMetadata;

/// Notification channels published by the command history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Executed,
    Undone,
    Redone,
    StackChanged,
}

impl Topic {
    pub const ALL: [Self; 4] = [
        Self::Executed,
        Self::Undone,
        Self::Redone,
        Self::StackChanged,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Executed => "command:executed",
            Self::Undone => "command:undone",
            Self::Redone => "command:redone",
            Self::StackChanged => "command:stackChanged",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What Undo/Redo controls need to render themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackState {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_description: Option<String>,
    pub redo_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    Executed { command: CommandMetadata },
    Undone { command: CommandMetadata },
    Redone { command: CommandMetadata },
    StackChanged(StackState),
}

impl HistoryEvent {
    #[must_use]
    pub const fn topic(&self) -> Topic {
        match self {
            Self::Executed { .. } => Topic::Executed,
            Self::Undone { .. } => Topic::Undone,
            Self::Redone { .. } => Topic::Redone,
            Self::StackChanged(_) => Topic::StackChanged,
        }
    }
}

/// Handle returned by [`EventBus::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Handler = Arc<dyn Fn(&HistoryEvent) + Send + Sync>;

/// Publish/subscribe bus shared between the history and the UI that reflects it.
///
/// Handlers run on the emitting thread, after the subscriber table lock is released, so a
/// handler may subscribe or unsubscribe while it is being notified.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use scene_history::prelude::{EventBus, HistoryEvent, StackState, Topic};
///
/// let bus = EventBus::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// let id = bus.on(Topic::StackChanged, move |event| sink.lock().push(event.clone()));
///
/// bus.emit(&HistoryEvent::StackChanged(StackState::default()));
/// assert_eq!(seen.lock().len(), 1);
///
/// assert!(bus.off(Topic::StackChanged, id));
/// bus.emit(&HistoryEvent::StackChanged(StackState::default()));
/// assert_eq!(seen.lock().len(), 1);
/// ```
pub struct EventBus {
    handlers: RwLock<HashMap<Topic, Vec<(SubscriptionId, Handler)>>>,
    next_id: AtomicU64,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            handlers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        })
    }

    pub fn on<F>(&self, topic: Topic, handler: F) -> SubscriptionId
    where
        F: Fn(&HistoryEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .write()
            .entry(topic)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Removes a subscription. Returns `false` if it was not registered on `topic`.
    pub fn off(&self, topic: Topic, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        let Some(subscribers) = handlers.get_mut(&topic) else {
            return false;
        };

        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        before != subscribers.len()
    }

    pub fn emit(&self, event: &HistoryEvent) {
        let subscribers: Vec<Handler> = self
            .handlers
            .read()
            .get(&event.topic())
            .map(|subscribers| {
                subscribers
                    .iter()
                    .map(|(_, handler)| Arc::clone(handler))
                    .collect()
            })
            .unwrap_or_default();

        for handler in subscribers {
            handler(event);
        }
    }

    #[must_use]
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.handlers.read().get(&topic).map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read();
        let mut map = f.debug_map();
        for topic in Topic::ALL {
            map.entry(&topic.as_str(), &handlers.get(&topic).map_or(0, Vec::len));
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn undone(description: &str) -> HistoryEvent {
        HistoryEvent::Undone {
            command: CommandMetadata::at("test", description, 0),
        }
    }

    #[test]
    fn test_topic_names() {
        assert_eq!(Topic::Executed.as_str(), "command:executed");
        assert_eq!(Topic::Undone.as_str(), "command:undone");
        assert_eq!(Topic::Redone.as_str(), "command:redone");
        assert_eq!(Topic::StackChanged.to_string(), "command:stackChanged");
    }

    #[test]
    fn test_emit_only_reaches_matching_topic() {
        let bus = EventBus::new();
        let hits = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&hits);
        bus.on(Topic::Undone, move |event| sink.lock().push(event.topic()));
        let sink = Arc::clone(&hits);
        bus.on(Topic::Redone, move |event| sink.lock().push(event.topic()));

        bus.emit(&undone("Move"));
        assert_eq!(*hits.lock(), [Topic::Undone]);
    }

    #[test]
    fn test_off_removes_only_that_handler() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicU64::new(0));

        let first = Arc::clone(&count);
        let id = bus.on(Topic::Undone, move |_| {
            first.fetch_add(1, Ordering::Relaxed);
        });
        let second = Arc::clone(&count);
        bus.on(Topic::Undone, move |_| {
            second.fetch_add(10, Ordering::Relaxed);
        });
        assert_eq!(bus.subscriber_count(Topic::Undone), 2);

        assert!(bus.off(Topic::Undone, id));
        assert!(!bus.off(Topic::Undone, id));
        assert!(!bus.off(Topic::Redone, id));

        bus.emit(&undone("Move"));
        assert_eq!(count.load(Ordering::Relaxed), 10);
        assert_eq!(bus.subscriber_count(Topic::Undone), 1);
    }

    #[test]
    fn test_handler_can_subscribe_reentrantly() {
        let bus = EventBus::new();
        let inner_bus = Arc::clone(&bus);

        bus.on(Topic::Undone, move |_| {
            inner_bus.on(Topic::Redone, |_| {});
        });

        bus.emit(&undone("Move"));
        assert_eq!(bus.subscriber_count(Topic::Redone), 1);
    }

    #[test]
    fn test_debug() {
        let bus = EventBus::new();
        bus.on(Topic::StackChanged, |_| {});
        let rendered = format!("{bus:?}");
        assert!(rendered.contains("\"command:stackChanged\": 1"));
        assert!(rendered.contains("\"command:undone\": 0"));
    }
}
