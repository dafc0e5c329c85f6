use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use futures::StreamExt;
use tower::Service;

use crate::{error::ExecuteError, observable::Observable};

use super::{
    link::Link,
    operation::{FetchResult, Operation},
};

/// Runs `operation` through `link` and resolves to the first result.
///
/// The result stream is cancelled once the first result arrives.
pub fn execute<L>(
    link: &L,
    operation: Operation,
) -> impl Future<Output = Result<FetchResult, ExecuteError<L::Error>>> + Send
where
    L: Link + ?Sized,
    L::Error: Send + 'static,
{
    first_result(link.request(operation, None))
}

#[tracing::instrument(skip_all)]
async fn first_result<E>(
    observable: Option<Observable<FetchResult, E>>,
) -> Result<FetchResult, ExecuteError<E>>
where
    E: Send + 'static,
{
    let mut results = observable.ok_or(ExecuteError::NoResult)?.into_stream();

    match results.next().await {
        Some(Ok(result)) => Ok(result),
        Some(Err(err)) => Err(ExecuteError::Link(err)),
        None => Err(ExecuteError::Empty),
    }
}

/// Exposes a [`Link`] as a [`tower::Service`] resolving to the first result of each operation.
#[derive(Debug, Clone)]
pub struct LinkService<L> {
    link: L,
}

impl<L> LinkService<L> {
    pub const fn new(link: L) -> Self {
        Self { link }
    }
}

impl<L> Service<Operation> for LinkService<L>
where
    L: Link,
    L::Error: Send + 'static,
{
    type Response = FetchResult;
    type Error = ExecuteError<L::Error>;
    type Future = Pin<Box<dyn Future<Output = Result<FetchResult, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, operation: Operation) -> Self::Future {
        Box::pin(first_result(self.link.request(operation, None)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tower::ServiceExt;

    use crate::{
        link::{from_fn, NextLink},
        test::{init_tracing, TestError},
    };

    use super::*;

    #[tokio::test]
    async fn execute_resolves_to_the_first_result() {
        init_tracing();

        let link = from_fn(|_: Operation, _: Option<NextLink<TestError>>| {
            Some(Observable::of([
                FetchResult::data(json!({ "count": 1 })),
                FetchResult::data(json!({ "count": 2 })),
            ]))
        });

        let result = execute(&link, Operation::new("{ count }"))
            .await
            .expect("Execution failed");

        assert_eq!(result, FetchResult::data(json!({ "count": 1 })));
    }

    #[tokio::test]
    async fn execute_reports_missing_results() {
        init_tracing();

        let none = from_fn(|_: Operation, _: Option<NextLink<TestError>>| None);

        assert_eq!(
            execute(&none, Operation::new("{ count }")).await,
            Err(ExecuteError::NoResult)
        );

        let empty = from_fn(|_: Operation, _: Option<NextLink<TestError>>| {
            Some(Observable::empty())
        });

        assert_eq!(
            execute(&empty, Operation::new("{ count }")).await,
            Err(ExecuteError::Empty)
        );
    }

    #[tokio::test]
    async fn link_service_forwards_link_errors() {
        init_tracing();

        let link = from_fn(|_: Operation, _: Option<NextLink<TestError>>| {
            Some(Observable::error(TestError::new("Oh")))
        });

        let result = LinkService::new(link)
            .oneshot(Operation::new("{ count }"))
            .await;

        assert_eq!(result, Err(ExecuteError::Link(TestError::new("Oh"))));
    }
}
