use std::sync::Arc;

use crate::observable::Observable;

use super::{impls::concat::Concat, operation::FetchResult, operation::Operation};

/// The forward function a link uses to pass an operation to the rest of the chain.
pub type NextLink<E> = Arc<dyn Fn(Operation) -> Observable<FetchResult, E> + Send + Sync>;

/// A link in a request-processing chain.
///
/// Returns `None` when the link produces no result stream for the operation.
#[cfg_attr(test, mockall::automock(type Error = crate::test::TestError;))]
pub trait Link {
    type Error;

    fn request(
        &self,
        operation: Operation,
        forward: Option<NextLink<Self::Error>>,
    ) -> Option<Observable<FetchResult, Self::Error>>;
}

impl<L> Link for Arc<L>
where
    L: Link + ?Sized,
{
    type Error = L::Error;

    fn request(
        &self,
        operation: Operation,
        forward: Option<NextLink<Self::Error>>,
    ) -> Option<Observable<FetchResult, Self::Error>> {
        (**self).request(operation, forward)
    }
}

impl<L> Link for Box<L>
where
    L: Link + ?Sized,
{
    type Error = L::Error;

    fn request(
        &self,
        operation: Operation,
        forward: Option<NextLink<Self::Error>>,
    ) -> Option<Observable<FetchResult, Self::Error>> {
        (**self).request(operation, forward)
    }
}

/// A type-erased, shareable link.
pub type BoxLink<E> = Arc<dyn Link<Error = E> + Send + Sync>;

pub trait LinkExt: Sized + Link {
    /// Chains `next` behind this link: this link's `forward` reaches `next`.
    fn concat<N>(self, next: N) -> Concat<Self, N>;

    fn boxed(self) -> BoxLink<Self::Error>
    where
        Self: Send + Sync + 'static;
}

impl<T> LinkExt for T
where
    T: Sized + Link,
{
    fn concat<N>(self, next: N) -> Concat<Self, N> {
        Concat::new(self, next)
    }

    fn boxed(self) -> BoxLink<Self::Error>
    where
        Self: Send + Sync + 'static,
    {
        Arc::new(self)
    }
}
