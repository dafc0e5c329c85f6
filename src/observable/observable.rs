use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures::Stream;
use tokio::{runtime::Handle, sync::mpsc};

use super::{
    observer::{Notification, Observer, SubscriptionObserver},
    subscription::{IntoSubscription, Subscription},
};

type Subscriber<T, E> = dyn Fn(SubscriptionObserver<T, E>) -> Subscription + Send + Sync;

/// A cold, push-based result stream.
///
/// Every call to [`Observable::subscribe`] runs the producer again for the new observer.
pub struct Observable<T, E> {
    subscriber: Arc<Subscriber<T, E>>,
}

impl<T, E> Observable<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Creates an observable from a producer. The producer returns whatever releases its
    /// resources, either a [`Subscription`] or a bare callback.
    pub fn new<F, S>(subscriber: F) -> Self
    where
        F: Fn(SubscriptionObserver<T, E>) -> S + Send + Sync + 'static,
        S: IntoSubscription,
    {
        Self {
            subscriber: Arc::new(move |observer: SubscriptionObserver<T, E>| {
                subscriber(observer).into_subscription()
            }),
        }
    }

    /// Emits every value, then completes.
    pub fn of<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Clone + Sync,
    {
        let values: Vec<T> = values.into_iter().collect();

        Self::new(move |observer| {
            for value in values.iter().cloned() {
                if observer.is_closed() {
                    break;
                }

                observer.next(value);
            }

            observer.complete();

            Subscription::empty()
        })
    }

    /// Terminates with `error` and emits nothing.
    pub fn error(error: E) -> Self
    where
        E: Clone + Sync,
    {
        Self::new(move |observer| {
            observer.error(error.clone());

            Subscription::empty()
        })
    }

    /// Completes without emitting.
    pub fn empty() -> Self {
        Self::new(|observer| {
            observer.complete();

            Subscription::empty()
        })
    }

    /// Runs the future created by `make` on a Tokio task for every subscription and emits its
    /// single outcome. Cancelling the subscription aborts the task. Without a runtime the
    /// subscription never emits.
    pub fn from_future<F, Fut>(make: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::new(move |observer: SubscriptionObserver<T, E>| {
            let Ok(runtime) = Handle::try_current() else {
                tracing::warn!("No runtime available, subscription stays pending");

                return Subscription::empty();
            };

            let future = make();

            let task = runtime.spawn(async move {
                match future.await {
                    Ok(value) => {
                        observer.next(value);
                        observer.complete();
                    }
                    Err(error) => observer.error(error),
                }
            });

            Subscription::new(move || task.abort())
        })
    }

    pub fn subscribe<O>(&self, observer: O) -> Subscription
    where
        O: Observer<T, E> + 'static,
    {
        let observer = SubscriptionObserver::new(Arc::new(observer));

        let teardown = (self.subscriber)(observer.clone());

        observer.attach(teardown);

        Subscription::new(move || observer.close())
    }

    /// Subscribes and adapts the notifications into a [`Stream`].
    ///
    /// The stream ends after the first error or on completion. Dropping it cancels the
    /// subscription.
    pub fn into_stream(self) -> ObservableStream<T, E> {
        let (sender, receiver) = mpsc::unbounded_channel();

        let subscription = self.subscribe(sender);

        ObservableStream {
            receiver,
            subscription,
            done: false,
        }
    }
}

impl<T, E> Clone for Observable<T, E> {
    fn clone(&self) -> Self {
        Self {
            subscriber: self.subscriber.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Observable<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable").finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct ObservableStream<T, E> {
    receiver: mpsc::UnboundedReceiver<Notification<T, E>>,
    subscription: Subscription,
    done: bool,
}

impl<T, E> Stream for ObservableStream<T, E> {
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.done {
            return Poll::Ready(None);
        }

        match this.receiver.poll_recv(cx) {
            Poll::Ready(Some(Notification::Next(value))) => Poll::Ready(Some(Ok(value))),
            Poll::Ready(Some(Notification::Error(error))) => {
                this.done = true;
                Poll::Ready(Some(Err(error)))
            }
            Poll::Ready(Some(Notification::Complete)) | Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T, E> Drop for ObservableStream<T, E> {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::StreamExt;
    use parking_lot::Mutex;

    use crate::test::{init_tracing, Recorder, TestError};

    use super::*;

    #[tokio::test]
    async fn of_emits_values_then_completes() {
        init_tracing();

        let values = Observable::<u32, TestError>::of([1, 2, 3])
            .into_stream()
            .collect::<Vec<_>>()
            .await;

        assert_eq!(values, vec![Ok(1), Ok(2), Ok(3)]);
    }

    #[tokio::test]
    async fn error_terminates_the_stream() {
        init_tracing();

        let error = TestError::new("Oh");

        let values = Observable::<u32, TestError>::error(error.clone())
            .into_stream()
            .collect::<Vec<_>>()
            .await;

        assert_eq!(values, vec![Err(error)]);
    }

    #[test]
    fn notifications_after_unsubscribe_are_dropped() {
        init_tracing();

        let captured = Arc::new(Mutex::new(None));

        let observable = {
            let captured = captured.clone();

            Observable::<u32, TestError>::new(move |observer| {
                *captured.lock() = Some(observer);

                Subscription::empty()
            })
        };

        let recorder = Recorder::default();
        let mut subscription = observable.subscribe(recorder.clone());

        let observer = captured.lock().take().expect("Producer was not called");

        observer.next(1);
        subscription.unsubscribe();
        observer.next(2);
        observer.complete();

        assert!(observer.is_closed());
        assert_eq!(recorder.notifications(), vec![Notification::Next(1)]);
    }

    #[test]
    fn teardown_runs_once_after_completion() {
        init_tracing();

        let teardowns = Arc::new(AtomicUsize::new(0));

        let observable = {
            let teardowns = teardowns.clone();

            Observable::<u32, TestError>::new(move |observer| {
                observer.next(7);
                observer.complete();

                let teardowns = teardowns.clone();
                move || {
                    teardowns.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        let recorder = Recorder::default();
        let mut subscription = observable.subscribe(recorder.clone());

        assert_eq!(teardowns.load(Ordering::SeqCst), 1);

        subscription.unsubscribe();

        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
        assert_eq!(
            recorder.notifications(),
            vec![Notification::Next(7), Notification::Complete]
        );
    }

    #[tokio::test]
    async fn dropping_the_stream_unsubscribes() {
        init_tracing();

        let teardowns = Arc::new(AtomicUsize::new(0));

        let observable = {
            let teardowns = teardowns.clone();

            Observable::<u32, TestError>::new(move |observer| {
                observer.next(1);

                let teardowns = teardowns.clone();
                move || {
                    teardowns.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        let mut stream = observable.into_stream();

        assert_eq!(stream.next().await, Some(Ok(1)));

        drop(stream);

        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn from_future_emits_single_outcome() {
        init_tracing();

        let values = Observable::<u32, TestError>::from_future(|| async { Ok(5) })
            .into_stream()
            .collect::<Vec<_>>()
            .await;

        assert_eq!(values, vec![Ok(5)]);

        let error = TestError::new("Nope");

        let values = {
            let error = error.clone();

            Observable::<u32, TestError>::from_future(move || {
                let error = error.clone();
                async move { Err(error) }
            })
            .into_stream()
            .collect::<Vec<_>>()
            .await
        };

        assert_eq!(values, vec![Err(error)]);
    }

    #[test]
    fn from_future_stays_pending_without_a_runtime() {
        init_tracing();

        let recorder = Recorder::default();

        let mut subscription = Observable::<u32, TestError>::from_future(|| async { Ok(5) })
            .subscribe(recorder.clone());

        subscription.unsubscribe();

        assert!(recorder.notifications().is_empty());
    }
}
