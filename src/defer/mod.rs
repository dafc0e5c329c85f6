//! Links whose underlying link is resolved asynchronously.

mod defer_link;
mod future_link;

pub use defer_link::{defer_link, DeferLink, DeferLinkInner};
pub use future_link::{FutureLink, LinkFuture};
