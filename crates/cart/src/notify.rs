//! User-facing notifications raised by cart operations.
//!
//! Every failed operation emits exactly one notification; successful
//! operations emit none. The presentation layer decides how to show them.

use tokio::sync::broadcast;
use tracing::warn;

/// Sink for user-facing error messages.
pub trait Notifier: Send + Sync {
    /// Show an error message to the user.
    fn error(&self, message: &str);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        warn!(notification = %message, "Cart notification");
    }
}

/// Fans notifications out to any number of subscribers.
///
/// Messages sent while nobody is subscribed are dropped; lagging subscribers
/// lose the oldest messages first.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: broadcast::Sender<String>,
}

impl ChannelNotifier {
    /// Create a notifier buffering up to `capacity` messages per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive every notification emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }
}

impl Notifier for ChannelNotifier {
    fn error(&self, message: &str) {
        // No subscribers is not an error for a toast.
        let _ = self.sender.send(message.to_string());
    }
}
