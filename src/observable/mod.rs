//! Push-based result streams and the subscriptions that cancel them.

#[allow(clippy::module_inception)]
mod observable;
mod observer;
mod single_use_subscription;
mod subscription;

pub use observable::{Observable, ObservableStream};
pub use observer::{Notification, Observer, SubscriptionObserver};
pub use single_use_subscription::SingleUseSubscription;
pub use subscription::{IntoSubscription, Subscription};
