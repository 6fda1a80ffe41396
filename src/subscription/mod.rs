//! Observer ref-counting.
//!
//! - [`SubscribedCounter`] counts active observers and publishes a debounced [`Subscription`].
//! - [`RefCounted`] / [`RefCountExt::ref_counted`] tie a stream observation to the counter.
//! - [`ObserverGuard`] is the scoped registration both use.

mod counter;
mod refcount;

pub use counter::{SubscribedCounter, Subscription};
pub use refcount::{ObserverGuard, RefCountExt, RefCounted};
