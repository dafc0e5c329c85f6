use parking_lot::Mutex;
use tower::{Service, ServiceExt};

use crate::{
    link::{
        link::{Link, NextLink},
        operation::{FetchResult, Operation},
    },
    observable::Observable,
};

/// A terminating link backed by a [`tower::Service`].
///
/// Every subscription calls a clone of the service once and emits its response.
#[derive(Debug, Clone)]
pub struct ServiceLink<S> {
    service: S,
}

impl<S> ServiceLink<S> {
    pub const fn new(service: S) -> Self {
        Self { service }
    }
}

impl<S> Link for ServiceLink<S>
where
    S: Service<Operation, Response = FetchResult> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Send + 'static,
{
    type Error = S::Error;

    fn request(
        &self,
        operation: Operation,
        _forward: Option<NextLink<Self::Error>>,
    ) -> Option<Observable<FetchResult, Self::Error>> {
        let service = Mutex::new(self.service.clone());

        Some(Observable::from_future(move || {
            let service = service.lock().clone();

            service.oneshot(operation.clone())
        }))
    }
}
