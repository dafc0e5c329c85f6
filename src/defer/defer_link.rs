use std::{
    fmt,
    ops::Deref,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, OnceLock,
    },
};

use futures::{
    future::{AbortHandle, Abortable, Shared},
    FutureExt,
};
use tokio::runtime::Handle;

use crate::{
    link::{FetchResult, Link, NextLink, Operation},
    observable::{Observable, Observer, SingleUseSubscription, SubscriptionObserver},
};

use super::future_link::{FutureLink, LinkFuture};

type SharedLink<L> = Shared<LinkFuture<L>>;

pub struct DeferLinkInner<L>
where
    L: Link,
{
    resolved: OnceLock<L>,
    pending: SharedLink<L>,
    triggered: AtomicBool,
    lazy: bool,
}

/// A link that holds requests until its underlying link resolves, then forwards to it directly.
///
/// The resolution is started at most once: on construction for pending and stream inputs, on
/// the first request for lazy ones. Its outcome is replayed to every request that attaches
/// later, so a failed resolution fails every request issued before a link was cached.
///
/// Clones share the same resolution.
pub struct DeferLink<L>
where
    L: Link,
{
    inner: Arc<DeferLinkInner<L>>,
}

impl<L> DeferLink<L>
where
    L: Link + Clone + Send + Sync + 'static,
    L::Error: Clone + Send + Sync + 'static,
{
    pub fn new(future_link: FutureLink<L>) -> Self {
        let lazy = future_link.is_lazy();

        let link = Self {
            inner: Arc::new(DeferLinkInner {
                resolved: OnceLock::new(),
                pending: future_link.into_future().shared(),
                triggered: AtomicBool::new(false),
                lazy,
            }),
        };

        if !lazy {
            link.trigger();
        }

        link
    }

    /// The underlying link, once resolved.
    pub fn resolved(&self) -> Option<&L> {
        self.resolved.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// Spawns the background resolution unless it is already running.
    ///
    /// Without a Tokio runtime nothing is spawned and the first subscribed request drives the
    /// resolution instead.
    fn trigger(&self) {
        if self.triggered.load(Ordering::Acquire) {
            return;
        }

        let Ok(runtime) = Handle::try_current() else {
            tracing::debug!("No runtime available, deferring link resolution");

            return;
        };

        if self.triggered.swap(true, Ordering::AcqRel) {
            return;
        }

        tracing::debug!("Resolving link");

        runtime.spawn(Self::resolve(self.inner.clone()));
    }

    #[tracing::instrument(skip_all)]
    async fn resolve(inner: Arc<DeferLinkInner<L>>) {
        match inner.pending.clone().await {
            Ok(link) => {
                let _ = inner.resolved.set(link);

                tracing::debug!("Link resolved");
            }
            Err(_) => {
                // Surfaced to every request that attaches to the pending resolution.
                tracing::debug!("Link resolution failed");
            }
        }
    }

    #[tracing::instrument(skip_all)]
    async fn attach(
        pending: SharedLink<L>,
        handle: SingleUseSubscription,
        observer: SubscriptionObserver<FetchResult, L::Error>,
        operation: Operation,
        forward: Option<NextLink<L::Error>>,
    ) {
        let outcome = pending.await;

        Self::deliver(outcome, &handle, observer, operation, forward);
    }

    /// Hands a held request to the settled resolution.
    fn deliver(
        outcome: Result<L, L::Error>,
        handle: &SingleUseSubscription,
        observer: SubscriptionObserver<FetchResult, L::Error>,
        operation: Operation,
        forward: Option<NextLink<L::Error>>,
    ) {
        match outcome {
            Ok(link) => {
                if handle.is_closed() {
                    tracing::debug!("Request cancelled before the link resolved");

                    return;
                }

                match link.request(operation, forward) {
                    Some(observable) => handle.set(observable.subscribe(observer)),
                    None => observer.complete(),
                }
            }
            Err(err) => observer.error(err),
        }
    }
}

impl<L> Link for DeferLink<L>
where
    L: Link + Clone + Send + Sync + 'static,
    L::Error: Clone + Send + Sync + 'static,
{
    type Error = L::Error;

    fn request(
        &self,
        operation: Operation,
        forward: Option<NextLink<Self::Error>>,
    ) -> Option<Observable<FetchResult, Self::Error>> {
        if let Some(link) = self.resolved.get() {
            return link.request(operation, forward);
        }

        self.trigger();

        tracing::debug!("Link not resolved yet, holding request");

        let link = self.clone();

        Some(Observable::new(move |observer| {
            link.trigger();

            let handle = SingleUseSubscription::new();
            let operation = operation.clone();
            let forward = forward.clone();

            let Ok(runtime) = Handle::try_current() else {
                match link.pending.clone().now_or_never() {
                    Some(outcome) => Self::deliver(outcome, &handle, observer, operation, forward),
                    None => {
                        tracing::warn!("No runtime available, request stays pending");
                    }
                }

                return handle;
            };

            // Replaced by the downstream subscription once the request attaches.
            let (abort, registration) = AbortHandle::new_pair();
            handle.set(move || abort.abort());

            runtime.spawn(Abortable::new(
                Self::attach(
                    link.pending.clone(),
                    handle.clone(),
                    observer,
                    operation,
                    forward,
                ),
                registration,
            ));

            handle
        }))
    }
}

impl<L> Clone for DeferLink<L>
where
    L: Link,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<L> Deref for DeferLink<L>
where
    L: Link,
{
    type Target = DeferLinkInner<L>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<L> fmt::Debug for DeferLinkInner<L>
where
    L: Link,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferLinkInner")
            .field("lazy", &self.lazy)
            .field("triggered", &self.triggered.load(Ordering::Relaxed))
            .field("resolved", &self.resolved.get().is_some())
            .finish_non_exhaustive()
    }
}

impl<L> fmt::Debug for DeferLink<L>
where
    L: Link,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DeferLink").field(&self.inner).finish()
    }
}

impl<L> From<FutureLink<L>> for DeferLink<L>
where
    L: Link + Clone + Send + Sync + 'static,
    L::Error: Clone + Send + Sync + 'static,
{
    fn from(future_link: FutureLink<L>) -> Self {
        Self::new(future_link)
    }
}

/// Wraps a [`FutureLink`] into a link usable right away.
pub fn defer_link<L>(future_link: FutureLink<L>) -> DeferLink<L>
where
    L: Link + Clone + Send + Sync + 'static,
    L::Error: Clone + Send + Sync + 'static,
{
    DeferLink::new(future_link)
}
