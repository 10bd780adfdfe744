//! Change notification for store mutations.

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Marker event: the set of stored records or their labels changed.
///
/// Carries no payload on purpose; subscribers re-query the store for
/// whatever view they need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordsUpdated;

/// Fan-out sender for [`RecordsUpdated`] events.
///
/// Sending never blocks and never fails from the mutator's point of
/// view: with no live subscribers the event is dropped, and a subscriber
/// that stops draining its receiver sees a lag error on its own side.
#[derive(Debug)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<RecordsUpdated>,
}

impl ChangeNotifier {
    /// Creates a notifier with no subscribers yet.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Opens a subscription; the receiver sees every event sent after
    /// this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RecordsUpdated> {
        self.tx.subscribe()
    }

    /// Announces a change. The send error (no live receivers) is
    /// deliberately ignored.
    pub fn notify(&self) {
        let _ = self.tx.send(RecordsUpdated);
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}
