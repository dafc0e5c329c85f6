//! The chain-link capability and the links built on it.

pub mod impls;
#[allow(clippy::module_inception)]
mod link;
mod operation;
mod service;

pub use impls::{
    concat::Concat,
    fn_link::{from_fn, FnLink},
    service_link::ServiceLink,
};
pub use link::{BoxLink, Link, LinkExt, NextLink};
pub use operation::{FetchResult, Operation};
pub use service::{execute, LinkService};

#[cfg(test)]
pub use link::MockLink;
