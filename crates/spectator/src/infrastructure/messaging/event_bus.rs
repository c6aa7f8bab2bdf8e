//! Event Bus for push channel events.
//!
//! Handlers subscribe per event kind and every handler registered for a kind
//! receives each event of that kind. Registration returns a
//! [`SubscriptionId`] that removes exactly that handler again.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arena_shared::{PushEvent, PushEventKind};

pub type EventHandler = Arc<dyn Fn(&PushEvent) + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<PushEventKind, Vec<(SubscriptionId, EventHandler)>>,
}

/// Multi-subscriber registry keyed by event kind.
///
/// Cloning shares the registry.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a handler for one event kind.
    pub fn on(
        &self,
        kind: PushEventKind,
        handler: impl Fn(&PushEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let mut registry = self.registry();
        registry.next_id += 1;
        let id = SubscriptionId(registry.next_id);
        registry
            .handlers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove every handler for `kind`. Returns how many were removed.
    pub fn off(&self, kind: PushEventKind) -> usize {
        self.registry()
            .handlers
            .remove(&kind)
            .map_or(0, |handlers| handlers.len())
    }

    /// Remove a single handler. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry();
        for handlers in registry.handlers.values_mut() {
            if let Some(pos) = handlers.iter().position(|(sid, _)| *sid == id) {
                handlers.remove(pos);
                return true;
            }
        }
        false
    }

    /// Invoke every handler registered for the event's kind.
    ///
    /// Handlers run outside the registry lock and may subscribe or
    /// unsubscribe themselves. Returns the number of handlers invoked.
    pub fn dispatch(&self, event: &PushEvent) -> usize {
        let handlers: Vec<EventHandler> = self
            .registry()
            .handlers
            .get(&event.kind())
            .map(|hs| hs.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    pub fn subscriber_count(&self, kind: PushEventKind) -> usize {
        self.registry().handlers.get(&kind).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter(bus: &EventBus, kind: PushEventKind) -> (SubscriptionId, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let id = bus.on(kind, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (id, count)
    }

    #[test]
    fn every_subscriber_receives_the_event() {
        let bus = EventBus::new();
        let (_, first) = counter(&bus, PushEventKind::GameUpdate);
        let (_, second) = counter(&bus, PushEventKind::GameUpdate);
        let (_, other) = counter(&bus, PushEventKind::Error);

        let invoked = bus.dispatch(&PushEvent::GameUpdate(serde_json::Value::Null));

        assert_eq!(invoked, 2);
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(other.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribe_removes_one_handler() {
        let bus = EventBus::new();
        let (id, first) = counter(&bus, PushEventKind::Connect);
        let (_, second) = counter(&bus, PushEventKind::Connect);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.dispatch(&PushEvent::Connect);

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn off_clears_the_kind() {
        let bus = EventBus::new();
        counter(&bus, PushEventKind::Disconnect);
        counter(&bus, PushEventKind::Disconnect);

        assert_eq!(bus.off(PushEventKind::Disconnect), 2);
        assert_eq!(bus.subscriber_count(PushEventKind::Disconnect), 0);
        assert_eq!(
            bus.dispatch(&PushEvent::Disconnect {
                reason: "bye".into()
            }),
            0
        );
    }

    #[test]
    fn handlers_may_subscribe_during_dispatch() {
        let bus = EventBus::new();
        let inner = bus.clone();
        bus.on(PushEventKind::Connect, move |_| {
            inner.on(PushEventKind::Connect, |_| {});
        });

        bus.dispatch(&PushEvent::Connect);
        assert_eq!(bus.subscriber_count(PushEventKind::Connect), 2);
    }
}
