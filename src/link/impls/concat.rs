use std::sync::Arc;

use crate::{
    link::{
        link::{Link, NextLink},
        operation::{FetchResult, Operation},
    },
    observable::Observable,
};

/// Two links run one after the other: the first link's `forward` calls the second.
#[derive(Debug)]
pub struct Concat<A, B> {
    first: A,
    second: Arc<B>,
}

impl<A, B> Concat<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self {
            first,
            second: Arc::new(second),
        }
    }
}

impl<A, B> Clone for Concat<A, B>
where
    A: Clone,
{
    fn clone(&self) -> Self {
        Self {
            first: self.first.clone(),
            second: self.second.clone(),
        }
    }
}

impl<A, B> Link for Concat<A, B>
where
    A: Link,
    A::Error: Send + 'static,
    B: Link<Error = A::Error> + Send + Sync + 'static,
{
    type Error = A::Error;

    #[tracing::instrument(skip_all)]
    fn request(
        &self,
        operation: Operation,
        forward: Option<NextLink<Self::Error>>,
    ) -> Option<Observable<FetchResult, Self::Error>> {
        let second = self.second.clone();

        let next: NextLink<Self::Error> = Arc::new(move |operation| {
            second
                .request(operation, forward.clone())
                .unwrap_or_else(Observable::empty)
        });

        self.first.request(operation, Some(next))
    }
}
