//! FIFO gameplay event bus.
//!
//! Events are appended to a shared [`EventQueue`] and drained one at a time.
//! Handlers registered for an event's kind run sequentially, in registration
//! order, and may enqueue follow-up events which are processed after every
//! event already waiting. A failing handler is logged and does not stop the
//! remaining handlers or the drain.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{error, trace};

use super::types::{EventKind, GameEvent};

/// Error reported by an [`EventHandler`]; logged by the bus and then dropped.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Reaction to one kind of gameplay event.
///
/// `C` is the mutable game context handed to every handler in turn.
#[async_trait]
pub trait EventHandler<C: Send>: Send + Sync {
    /// Handler name for logging.
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &GameEvent, ctx: &mut C) -> Result<(), HandlerError>;
}

/// Shared FIFO of pending events.
///
/// Cloning is cheap; every clone appends to the same queue, which is how
/// handlers and the game world enqueue follow-ups while a drain is running.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    inner: Arc<Mutex<VecDeque<GameEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: GameEvent) {
        self.lock().push_back(event);
    }

    pub fn pop(&self) -> Option<GameEvent> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<GameEvent>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Opaque token returned by [`EventBus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Registered<C> = (SubscriptionId, Arc<dyn EventHandler<C>>);

pub struct EventBus<C: Send> {
    queue: EventQueue,
    handlers: HashMap<EventKind, Vec<Registered<C>>>,
    next_id: u64,
    running: bool,
    observers: broadcast::Sender<GameEvent>,
}

impl<C: Send> EventBus<C> {
    /// Creates a stopped bus with default observer capacity.
    pub fn new(queue: EventQueue) -> Self {
        Self::with_capacity(queue, 100)
    }

    /// Creates a stopped bus whose observer channel buffers `capacity` events.
    pub fn with_capacity(queue: EventQueue, capacity: usize) -> Self {
        Self {
            queue,
            handlers: HashMap::new(),
            next_id: 0,
            running: false,
            observers: broadcast::channel(capacity.max(1)).0,
        }
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn emit(&self, event: GameEvent) {
        self.queue.push(event);
    }

    /// Registers `handler` for `kind`; handlers run in registration order.
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        handler: Arc<dyn EventHandler<C>>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.entry(kind).or_default().push((id, handler));
        id
    }

    /// Removes one registration. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, kind: &EventKind, id: SubscriptionId) {
        let Some(bucket) = self.handlers.get_mut(kind) else {
            return;
        };
        bucket.retain(|(existing, _)| *existing != id);
        if bucket.is_empty() {
            self.handlers.remove(kind);
        }
    }

    pub fn handler_count(&self, kind: &EventKind) -> usize {
        self.handlers.get(kind).map_or(0, Vec::len)
    }

    /// Every event dispatched from now on is also broadcast to this receiver.
    ///
    /// Observers are best-effort; a lagging receiver misses events.
    pub fn observe(&self) -> broadcast::Receiver<GameEvent> {
        self.observers.subscribe()
    }

    pub(crate) fn observer_sender(&self) -> broadcast::Sender<GameEvent> {
        self.observers.clone()
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stops dispatch. The current handler finishes; queued events stay queued.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Dispatches queued events until the queue is empty or the bus stops.
    ///
    /// Returns the number of events dispatched.
    pub async fn drain(&mut self, ctx: &mut C) -> usize {
        let mut dispatched = 0;
        while self.running {
            let Some(event) = self.queue.pop() else {
                break;
            };
            self.dispatch(&event, ctx).await;
            dispatched += 1;
        }
        dispatched
    }

    async fn dispatch(&self, event: &GameEvent, ctx: &mut C) {
        let kind = event.kind();
        let handlers: Vec<_> = self
            .handlers
            .get(&kind)
            .map(|bucket| bucket.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        trace!(event = %kind, handlers = handlers.len(), "dispatching");

        for handler in handlers {
            if let Err(err) = handler.handle(event, ctx).await {
                error!(event = %kind, handler = handler.name(), error = %err, "event handler failed");
            }
        }

        // No observers is the normal case.
        let _ = self.observers.send(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::Trigger;
    use serde_json::json;

    #[derive(Default)]
    struct Log {
        seen: Vec<String>,
    }

    struct Recorder {
        label: &'static str,
        follow_up: Option<&'static str>,
        queue: EventQueue,
    }

    #[async_trait]
    impl EventHandler<Log> for Recorder {
        fn name(&self) -> &'static str {
            self.label
        }

        async fn handle(&self, event: &GameEvent, ctx: &mut Log) -> Result<(), HandlerError> {
            ctx.seen.push(format!("{}:{}", self.label, event.kind()));
            if let Some(name) = self.follow_up {
                self.queue
                    .push(GameEvent::custom(Trigger::System, name, json!({})));
            }
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl EventHandler<Log> for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn handle(&self, _: &GameEvent, _: &mut Log) -> Result<(), HandlerError> {
            Err(HandlerError::new("boom"))
        }
    }

    fn custom(name: &str) -> GameEvent {
        GameEvent::custom(Trigger::System, name, json!({}))
    }

    fn recorder(label: &'static str, follow_up: Option<&'static str>, bus: &EventBus<Log>) -> Arc<Recorder> {
        Arc::new(Recorder {
            label,
            follow_up,
            queue: bus.queue().clone(),
        })
    }

    #[tokio::test]
    async fn follow_ups_run_after_already_queued_events() {
        let mut bus = EventBus::new(EventQueue::new());
        let a = recorder("a", Some("c"), &bus);
        let b = recorder("b", None, &bus);
        let c = recorder("c", None, &bus);
        bus.subscribe(EventKind::custom("a"), a);
        bus.subscribe(EventKind::custom("b"), b);
        bus.subscribe(EventKind::custom("c"), c);
        bus.start();

        bus.emit(custom("a"));
        bus.emit(custom("b"));
        let mut log = Log::default();
        assert_eq!(bus.drain(&mut log).await, 3);

        assert_eq!(log.seen, vec!["a:a", "b:b", "c:c"]);
    }

    #[tokio::test]
    async fn handlers_run_in_registration_order_and_survive_failures() {
        let mut bus = EventBus::new(EventQueue::new());
        let first = recorder("first", None, &bus);
        let second = recorder("second", None, &bus);
        bus.subscribe(EventKind::custom("x"), first);
        bus.subscribe(EventKind::custom("x"), Arc::new(Failing));
        bus.subscribe(EventKind::custom("x"), second);
        bus.start();

        bus.emit(custom("x"));
        bus.emit(custom("x"));
        let mut log = Log::default();
        bus.drain(&mut log).await;

        assert_eq!(log.seen, vec!["first:x", "second:x", "first:x", "second:x"]);
    }

    #[tokio::test]
    async fn unsubscribe_drops_empty_buckets() {
        let mut bus = EventBus::new(EventQueue::new());
        let kind = EventKind::custom("x");
        let handler = recorder("only", None, &bus);
        let id = bus.subscribe(kind.clone(), handler);
        assert_eq!(bus.handler_count(&kind), 1);

        bus.unsubscribe(&kind, id);
        assert_eq!(bus.handler_count(&kind), 0);
        assert!(!bus.handlers.contains_key(&kind));

        // Events without handlers are consumed silently.
        bus.start();
        bus.emit(custom("x"));
        let mut log = Log::default();
        assert_eq!(bus.drain(&mut log).await, 1);
        assert!(log.seen.is_empty());
    }

    #[tokio::test]
    async fn stopped_bus_keeps_events_queued() {
        let mut bus = EventBus::new(EventQueue::new());
        let handler = recorder("h", None, &bus);
        bus.subscribe(EventKind::custom("x"), handler);

        bus.emit(custom("x"));
        let mut log = Log::default();
        assert_eq!(bus.drain(&mut log).await, 0);
        assert_eq!(bus.queue().len(), 1);

        bus.start();
        bus.start();
        assert_eq!(bus.drain(&mut log).await, 1);
        assert_eq!(log.seen, vec!["h:x"]);
    }

    #[tokio::test]
    async fn observers_see_dispatched_events() {
        let mut bus: EventBus<Log> = EventBus::new(EventQueue::new());
        let mut rx = bus.observe();
        bus.start();
        bus.emit(custom("seen"));
        bus.drain(&mut Log::default()).await;

        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind(), EventKind::custom("seen"));
    }
}
