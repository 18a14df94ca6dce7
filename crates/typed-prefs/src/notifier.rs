//! Change notification for a single preference.
//!
//! The broadcast channel only exists while somebody listens: the first [`Subscription`] creates
//! it and dropping the last one tears it down again.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::broadcast;

/// Errors returned when waiting on a [`Subscription`].
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ReceiveError {
    /// The preference was disposed or dropped; no further values will arrive.
    #[error("The preference notifier was closed")]
    Closed,

    /// The subscriber fell behind and the oldest values were discarded.
    #[error("Subscriber lagged behind and missed {0} values")]
    Lagged(u64),
}

impl From<broadcast::error::RecvError> for ReceiveError {
    fn from(value: broadcast::error::RecvError) -> Self {
        match value {
            broadcast::error::RecvError::Closed => ReceiveError::Closed,
            broadcast::error::RecvError::Lagged(n) => ReceiveError::Lagged(n),
        }
    }
}

type Slot<T> = Mutex<Option<broadcast::Sender<T>>>;

fn lock<T>(slot: &Slot<T>) -> MutexGuard<'_, Option<broadcast::Sender<T>>> {
    slot.lock().expect("Notifier lock should not be poisoned")
}

pub(crate) struct Notifier<T> {
    slot: Arc<Slot<T>>,
    capacity: usize,
}

impl<T: Clone + Send + 'static> Notifier<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            // broadcast::channel panics on a zero capacity
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn subscribe(&self) -> Subscription<T> {
        let mut slot = lock(&self.slot);
        let receiver = match slot.as_ref() {
            Some(sender) => sender.subscribe(),
            None => {
                let (sender, receiver) = broadcast::channel(self.capacity);
                *slot = Some(sender);
                receiver
            }
        };

        Subscription {
            receiver: Some(receiver),
            slot: Arc::downgrade(&self.slot),
        }
    }

    /// Pushes `value` to every current subscriber. A no-op when nobody listens.
    pub(crate) fn notify(&self, value: T) {
        if let Some(sender) = lock(&self.slot).as_ref() {
            // Only fails when there are no receivers, which the teardown in `Subscription::drop`
            // rules out while the sender exists.
            let _ = sender.send(value);
        }
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        lock(&self.slot)
            .as_ref()
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Drops the sender, which ends every open subscription.
    pub(crate) fn close(&self) {
        lock(&self.slot).take();
    }
}

/// A live subscription to a preference's changes.
///
/// Receives every value written (or the default value, on removal) after the subscription was
/// created. Values emitted before it was created are not replayed.
pub struct Subscription<T> {
    receiver: Option<broadcast::Receiver<T>>,
    slot: Weak<Slot<T>>,
}

impl<T: Clone> Subscription<T> {
    /// Waits for the next value.
    ///
    /// Returns [`ReceiveError::Closed`] once the preference has been disposed and every buffered
    /// value has been received.
    pub async fn recv(&mut self) -> Result<T, ReceiveError> {
        let receiver = self.receiver.as_mut().ok_or(ReceiveError::Closed)?;
        Ok(receiver.recv().await?)
    }

    /// Returns the next buffered value without waiting, or `None` if nothing is pending.
    pub fn try_recv(&mut self) -> Result<Option<T>, ReceiveError> {
        let receiver = self.receiver.as_mut().ok_or(ReceiveError::Closed)?;
        match receiver.try_recv() {
            Ok(value) => Ok(Some(value)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Closed) => Err(ReceiveError::Closed),
            Err(broadcast::error::TryRecvError::Lagged(n)) => Err(ReceiveError::Lagged(n)),
        }
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        let Some(slot) = self.slot.upgrade() else {
            return;
        };

        // Hold the lock while releasing the receiver so a concurrent subscribe either sees the
        // sender before teardown or creates a fresh one after it.
        let mut slot = slot.lock().expect("Notifier lock should not be poisoned");
        drop(self.receiver.take());

        if slot
            .as_ref()
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            *slot = None;
        }
    }
}
