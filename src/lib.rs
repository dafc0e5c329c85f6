#![deny(unsafe_code, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A request link whose underlying link is supplied asynchronously.
//!
//! [`DeferLink`](defer::DeferLink) is usable as soon as it is constructed. Requests issued
//! before the underlying link resolves are held and attached to the pending resolution; once
//! the link is known every request is forwarded to it directly.

pub mod defer;
pub mod error;
pub mod link;
pub mod observable;
