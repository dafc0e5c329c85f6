use std::{fmt, marker::PhantomData};

use crate::{
    link::{
        link::{Link, NextLink},
        operation::{FetchResult, Operation},
    },
    observable::Observable,
};

/// A link built from a request handler.
pub struct FnLink<F, E> {
    request: F,
    _error: PhantomData<fn() -> E>,
}

impl<F, E> FnLink<F, E>
where
    F: Fn(Operation, Option<NextLink<E>>) -> Option<Observable<FetchResult, E>>,
{
    pub const fn new(request: F) -> Self {
        Self {
            request,
            _error: PhantomData,
        }
    }
}

impl<F, E> Link for FnLink<F, E>
where
    F: Fn(Operation, Option<NextLink<E>>) -> Option<Observable<FetchResult, E>>,
{
    type Error = E;

    fn request(
        &self,
        operation: Operation,
        forward: Option<NextLink<Self::Error>>,
    ) -> Option<Observable<FetchResult, Self::Error>> {
        (self.request)(operation, forward)
    }
}

impl<F, E> Clone for FnLink<F, E>
where
    F: Clone,
{
    fn clone(&self) -> Self {
        Self {
            request: self.request.clone(),
            _error: PhantomData,
        }
    }
}

impl<F, E> fmt::Debug for FnLink<F, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnLink").finish_non_exhaustive()
    }
}

pub fn from_fn<F, E>(request: F) -> FnLink<F, E>
where
    F: Fn(Operation, Option<NextLink<E>>) -> Option<Observable<FetchResult, E>>,
{
    FnLink::new(request)
}
