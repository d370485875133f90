//! Bot identity for the Colloquy framework.

use std::sync::Arc;

/// A bot instance participating in dispatch.
///
/// The dispatcher needs nothing from a bot beyond a stable numeric
/// identity: conversation state is addressed per bot, so multiple bot
/// instances can share one storage backend without their conversations
/// bleeding into each other. Everything else an application needs from
/// its client (sending messages, calling platform APIs) stays on the
/// concrete type.
pub trait Bot: Send + Sync + 'static {
    /// A stable numeric id for this bot instance.
    fn id(&self) -> i64;
}

/// A shared, type-erased bot handle.
pub type BoxedBot = Arc<dyn Bot>;
