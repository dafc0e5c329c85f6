use std::sync::Arc;

use parking_lot::Mutex;

use super::subscription::{IntoSubscription, Subscription};

#[derive(Debug, Default)]
struct SingleUseSubscriptionState {
    closed: bool,
    underlying: Option<Subscription>,
}

/// A placeholder subscription for work whose real subscription does not exist yet.
///
/// Holds at most one underlying [`Subscription`]. Cancelling the handle releases whatever it
/// currently holds and whatever is [`set`](SingleUseSubscription::set) afterwards, so the
/// underlying subscription is released exactly once no matter whether it arrives before or
/// after the cancellation.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct SingleUseSubscription {
    state: Arc<Mutex<SingleUseSubscriptionState>>,
}

impl SingleUseSubscription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closes the handle and releases the current underlying subscription. Idempotent.
    pub fn cancel(&self) {
        let underlying = {
            let mut state = self.state.lock();

            if state.closed {
                return;
            }

            state.closed = true;
            state.underlying.take()
        };

        if let Some(mut underlying) = underlying {
            underlying.unsubscribe();
        }
    }

    /// Replaces the underlying subscription.
    ///
    /// The previous underlying subscription is always released. If the handle is already
    /// closed, the new one is released immediately and not kept.
    pub fn set<S>(&self, subscription: S)
    where
        S: IntoSubscription,
    {
        let subscription = subscription.into_subscription();

        let (previous, rejected) = {
            let mut state = self.state.lock();

            let previous = state.underlying.take();

            if state.closed {
                (previous, Some(subscription))
            } else {
                state.underlying = Some(subscription);
                (previous, None)
            }
        };

        if let Some(mut previous) = previous {
            previous.unsubscribe();
        }

        if let Some(mut rejected) = rejected {
            rejected.unsubscribe();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl IntoSubscription for SingleUseSubscription {
    fn into_subscription(self) -> Subscription {
        Subscription::new(move || self.cancel())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_subscription(counter: &Arc<AtomicUsize>) -> Subscription {
        let counter = counter.clone();

        Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn set_releases_previous_underlying() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let handle = SingleUseSubscription::new();

        handle.set(counting_subscription(&first));
        assert_eq!(first.load(Ordering::SeqCst), 0);

        handle.set(counting_subscription(&second));
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);

        handle.cancel();
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn set_after_cancel_releases_immediately() {
        let counter = Arc::new(AtomicUsize::new(0));

        let handle = SingleUseSubscription::new();
        handle.cancel();

        assert!(handle.is_closed());

        handle.set(counting_subscription(&counter));
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        handle.cancel();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_is_idempotent() {
        let counter = Arc::new(AtomicUsize::new(0));

        let handle = SingleUseSubscription::new();
        handle.set(counting_subscription(&counter));

        handle.cancel();
        handle.cancel();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn accepts_bare_callbacks() {
        let counter = Arc::new(AtomicUsize::new(0));

        let handle = SingleUseSubscription::new();

        {
            let counter = counter.clone();
            handle.set(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        handle.cancel();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reentrant_cancel_does_not_deadlock() {
        let handle = SingleUseSubscription::new();

        {
            let inner = handle.clone();
            handle.set(move || inner.cancel());
        }

        handle.cancel();
        assert!(handle.is_closed());
    }
}
