use std::{fmt, sync::Arc};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::subscription::Subscription;

/// Receives the notifications of a result stream.
pub trait Observer<T, E>: Send + Sync {
    fn next(&self, value: T);

    fn error(&self, error: E);

    fn complete(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<T, E> {
    Next(T),
    Error(E),
    Complete,
}

impl<T, E> Observer<T, E> for mpsc::UnboundedSender<Notification<T, E>>
where
    T: Send,
    E: Send,
{
    fn next(&self, value: T) {
        let _ = self.send(Notification::Next(value));
    }

    fn error(&self, error: E) {
        let _ = self.send(Notification::Error(error));
    }

    fn complete(&self) {
        let _ = self.send(Notification::Complete);
    }
}

struct ObserverState<T, E> {
    closed: bool,
    observer: Option<Arc<dyn Observer<T, E>>>,
    teardown: Option<Subscription>,
}

/// The observer handed to a producer for one subscription.
///
/// Notifications are dropped once the subscription terminated or was cancelled. The
/// producer's teardown runs exactly once, on the first of those two events.
pub struct SubscriptionObserver<T, E> {
    state: Arc<Mutex<ObserverState<T, E>>>,
}

impl<T, E> SubscriptionObserver<T, E> {
    pub(crate) fn new(observer: Arc<dyn Observer<T, E>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ObserverState {
                closed: false,
                observer: Some(observer),
                teardown: None,
            })),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Stores the producer's teardown, or runs it right away if the producer already
    /// terminated.
    pub(crate) fn attach(&self, teardown: Subscription) {
        let rejected = {
            let mut state = self.state.lock();

            if state.closed {
                Some(teardown)
            } else {
                state.teardown = Some(teardown);
                None
            }
        };

        if let Some(mut teardown) = rejected {
            teardown.unsubscribe();
        }
    }

    pub(crate) fn close(&self) {
        if let Some((_, Some(mut teardown))) = self.terminate() {
            teardown.unsubscribe();
        }
    }

    #[allow(clippy::type_complexity)]
    fn terminate(&self) -> Option<(Option<Arc<dyn Observer<T, E>>>, Option<Subscription>)> {
        let mut state = self.state.lock();

        if state.closed {
            return None;
        }

        state.closed = true;

        Some((state.observer.take(), state.teardown.take()))
    }
}

impl<T, E> Clone for SubscriptionObserver<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T, E> fmt::Debug for SubscriptionObserver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionObserver")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl<T, E> Observer<T, E> for SubscriptionObserver<T, E>
where
    T: Send,
    E: Send,
{
    fn next(&self, value: T) {
        let observer = self.state.lock().observer.clone();

        if let Some(observer) = observer {
            observer.next(value);
        }
    }

    fn error(&self, error: E) {
        if let Some((observer, teardown)) = self.terminate() {
            if let Some(observer) = observer {
                observer.error(error);
            }

            if let Some(mut teardown) = teardown {
                teardown.unsubscribe();
            }
        }
    }

    fn complete(&self) {
        if let Some((observer, teardown)) = self.terminate() {
            if let Some(observer) = observer {
                observer.complete();
            }

            if let Some(mut teardown) = teardown {
                teardown.unsubscribe();
            }
        }
    }
}
