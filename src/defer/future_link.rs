use std::{fmt, future::Future};

use futures::{
    future::BoxFuture,
    stream::{BoxStream, Stream},
    FutureExt, StreamExt,
};

use crate::link::Link;

/// The pending computation a [`FutureLink`] settles into.
pub type LinkFuture<L> = BoxFuture<'static, Result<L, <L as Link>::Error>>;

/// A link that will exist at some point in the future.
pub enum FutureLink<L>
where
    L: Link,
{
    /// A computation that is already running or ready to be polled.
    Pending(LinkFuture<L>),
    /// A factory that is only invoked once the first request arrives.
    Lazy(Box<dyn FnOnce() -> LinkFuture<L> + Send>),
    /// A stream expected to yield exactly one link.
    Stream(BoxStream<'static, Result<L, L::Error>>),
}

impl<L> FutureLink<L>
where
    L: Link + Send + 'static,
    L::Error: Send + 'static,
{
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<L, L::Error>> + Send + 'static,
    {
        Self::Pending(future.boxed())
    }

    pub fn lazy<F, Fut>(factory: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<L, L::Error>> + Send + 'static,
    {
        Self::Lazy(Box::new(move || factory().boxed()))
    }

    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<L, L::Error>> + Send + 'static,
    {
        Self::Stream(stream.boxed())
    }

    pub fn ready(link: L) -> Self {
        Self::pending(futures::future::ready(Ok(link)))
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self, Self::Lazy(_))
    }

    /// Collapses every variant into one pending computation.
    ///
    /// A lazy factory is only invoked when the returned future is first polled.
    pub fn into_future(self) -> LinkFuture<L> {
        match self {
            Self::Pending(future) => future,
            Self::Lazy(factory) => async move { factory().await }.boxed(),
            Self::Stream(stream) => first_link(stream).boxed(),
        }
    }
}

/// Settles with the first item of the stream.
///
/// A stream that ends without yielding anything leaves the computation pending forever.
#[tracing::instrument(skip_all)]
async fn first_link<L>(mut stream: BoxStream<'static, Result<L, L::Error>>) -> Result<L, L::Error>
where
    L: Link,
{
    match stream.next().await {
        Some(link) => link,
        None => {
            tracing::warn!("Link stream completed without yielding a link");

            futures::future::pending().await
        }
    }
}

impl<L> fmt::Debug for FutureLink<L>
where
    L: Link,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            Self::Pending(_) => "Pending",
            Self::Lazy(_) => "Lazy",
            Self::Stream(_) => "Stream",
        };

        f.debug_tuple("FutureLink").field(&variant).finish()
    }
}

impl<L> From<L> for FutureLink<L>
where
    L: Link + Send + 'static,
    L::Error: Send + 'static,
{
    fn from(link: L) -> Self {
        Self::ready(link)
    }
}
