//! Expiry notification: keyspace subscription and hooks.

pub mod hook;
pub mod notifier;

pub use hook::{ExpiryHook, LoggingHook};
pub use notifier::{ExpiryNotifier, LoopExit, NotifierHandle};
