use std::fmt;

/// A cancellable handle to an active subscription.
///
/// Dropping a [`Subscription`] does not cancel it. Call [`Subscription::unsubscribe`].
#[must_use = "dropping a subscription does not cancel it"]
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new<F>(teardown: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A subscription with nothing to release.
    pub const fn empty() -> Self {
        Self { teardown: None }
    }

    /// Runs the teardown at most once.
    pub fn unsubscribe(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.teardown.is_none()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Anything that can be normalized into a [`Subscription`]: a subscription itself or a bare
/// cancellation callback.
pub trait IntoSubscription {
    fn into_subscription(self) -> Subscription;
}

impl IntoSubscription for Subscription {
    fn into_subscription(self) -> Subscription {
        self
    }
}

impl<F> IntoSubscription for F
where
    F: FnOnce() + Send + 'static,
{
    fn into_subscription(self) -> Subscription {
        Subscription::new(self)
    }
}
