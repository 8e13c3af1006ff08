//! Gameplay events and the FIFO bus that dispatches them.

mod bus;
mod types;

pub use bus::{EventBus, EventHandler, EventQueue, HandlerError, SubscriptionId};
pub use types::{EventKind, EventPayload, GameEvent, MoveBlockReason, Trigger};
