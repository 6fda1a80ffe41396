//! # Ref-counted stream wrapper.
//!
//! [`RefCounted`] wraps any stream so that one observation maps to exactly one
//! [`SubscribedCounter::increment`] and exactly one [`SubscribedCounter::decrement`].
//!
//! ```text
//! first poll ──► ObserverGuard::new()  (increment)
//!    ...items pass through unchanged...
//! upstream ends ─┐
//! stream dropped ├──► guard dropped    (decrement, once)
//! observer panics┘
//! ```
//!
//! Observation starts at the first poll: creating the wrapper and never polling
//! it does not touch the counter.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;

use super::counter::SubscribedCounter;

/// Scoped registration of one observer on a [`SubscribedCounter`].
///
/// Increments on creation and decrements on drop.
#[must_use = "dropping the guard unregisters the observer"]
pub struct ObserverGuard {
    counter: SubscribedCounter,
}

impl ObserverGuard {
    /// Registers an observer on `counter` until the guard is dropped.
    pub fn new(counter: SubscribedCounter) -> Self {
        counter.increment();
        Self { counter }
    }
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        self.counter.decrement();
    }
}

/// Stream adaptor that participates in a [`SubscribedCounter`].
#[must_use = "streams do nothing unless polled"]
pub struct RefCounted<S> {
    upstream: Pin<Box<S>>,
    counter: SubscribedCounter,
    guard: Option<ObserverGuard>,
    started: bool,
}

impl<S: Stream> RefCounted<S> {
    /// Wraps `upstream`; see the module docs for the counting rules.
    pub fn new(upstream: S, counter: SubscribedCounter) -> Self {
        Self {
            upstream: Box::pin(upstream),
            counter,
            guard: None,
            started: false,
        }
    }

    /// True while this observation holds a registration on the counter.
    pub fn is_observing(&self) -> bool {
        self.guard.is_some()
    }
}

impl<S: Stream> Stream for RefCounted<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if !this.started {
            this.started = true;
            this.guard = Some(ObserverGuard::new(this.counter.clone()));
        }
        if this.guard.is_none() {
            // upstream already completed
            return Poll::Ready(None);
        }
        match this.upstream.as_mut().poll_next(cx) {
            Poll::Ready(None) => {
                this.guard = None;
                Poll::Ready(None)
            }
            other => other,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.started && self.guard.is_none() {
            (0, Some(0))
        } else {
            self.upstream.size_hint()
        }
    }
}

/// Extension adding [`RefCounted`] wrapping to every stream.
pub trait RefCountExt: Stream + Sized {
    /// Wraps the stream so its observation is counted by `counter`.
    fn ref_counted(self, counter: SubscribedCounter) -> RefCounted<Self> {
        RefCounted::new(self, counter)
    }
}

impl<S: Stream> RefCountExt for S {}
