//! # Pipeline builder.
//!
//! A [`Pipeline`] is an ordered chain of stages built once, before submission.
//! Each stage receives the value produced by the previous one; the chain starts
//! with `()`.
//!
//! ```text
//! Pipeline::new("load")           value: ()
//!     .transform(|ctx, ()| ..)    value: U   (async, background context)
//!     .side_effect(|u| effect)    value: U   (posts, passes through)
//!     .reduce(|state, u| next)    value: ()  (serialized)
//! ```
//!
//! The first failing stage ends the intent; later stages never run.
//!
//! ## Example
//! ```rust
//! use statevisor::{Pipeline, StageError};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Profile { id: u32 }
//!
//! let load: Pipeline<Profile, String> = Pipeline::new("load-profile")
//!     .transform(|_ctx, ()| async { Ok::<_, StageError>(7 + 5) })
//!     .side_effect(|id| format!("loaded {id}"))
//!     .reduce(|_state, id| Profile { id });
//!
//! assert_eq!(load.name(), "load-profile");
//! ```

use std::borrow::Cow;
use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;

use super::stage::{IntentScope, StageContext, StageKind};
use super::{SideEffect, State};
use crate::error::StageError;

pub(crate) type Chain<S, E, T = ()> =
    Box<dyn FnOnce(IntentScope<S, E>) -> BoxFuture<'static, Result<T, StageError>> + Send>;

/// Ordered chain of stages producing a `T`.
pub struct Pipeline<S, E, T = ()> {
    name: Cow<'static, str>,
    idling: Option<bool>,
    chain: Chain<S, E, T>,
}

impl<S: State, E: SideEffect> Pipeline<S, E, ()> {
    /// Empty pipeline named `name`.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            idling: None,
            chain: Box::new(|_scope| async { Ok(()) }.boxed()),
        }
    }
}

impl<S: State, E: SideEffect, T: Send + 'static> Pipeline<S, E, T> {
    fn then<U, F>(self, next: F) -> Pipeline<S, E, U>
    where
        F: FnOnce(IntentScope<S, E>, T) -> BoxFuture<'static, Result<U, StageError>>
            + Send
            + 'static,
    {
        let prev = self.chain;
        Pipeline {
            name: self.name,
            idling: self.idling,
            chain: Box::new(move |scope| {
                async move {
                    let value = prev(scope.clone()).await?;
                    next(scope, value).await
                }
                .boxed()
            }),
        }
    }

    /// Appends an asynchronous transform.
    ///
    /// Runs on the background context; never holds the serialization point.
    pub fn transform<U, F, Fut>(self, f: F) -> Pipeline<S, E, U>
    where
        U: Send + 'static,
        F: FnOnce(StageContext<S, E>, T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<U, StageError>> + Send + 'static,
    {
        self.then(move |scope, value| {
            async move {
                scope
                    .stage(StageKind::Transform, move |ctx| f(ctx, value))
                    .await
            }
            .boxed()
        })
    }

    /// Appends a side effect built from the current value; the value passes through.
    pub fn side_effect<F>(self, make: F) -> Pipeline<S, E, T>
    where
        T: Sync,
        F: FnOnce(&T) -> E + Send + 'static,
    {
        self.then(move |scope, value| {
            async move {
                scope.side_effect(|| make(&value)).await?;
                Ok(value)
            }
            .boxed()
        })
    }

    /// Appends a serialized reduce consuming the current value.
    pub fn reduce<F>(self, f: F) -> Pipeline<S, E, ()>
    where
        F: FnOnce(&S, T) -> S + Send + 'static,
    {
        self.then(move |scope, value| {
            async move {
                let token = scope.token.clone();
                scope.reduce(&token, move |state| f(state, value)).await
            }
            .boxed()
        })
    }

    /// Forces idling participation for every stage of this pipeline.
    ///
    /// A per-call [`IntentOptions::idling`](super::IntentOptions::idling) wins over this.
    pub fn with_idling(mut self, tracked: bool) -> Self {
        self.idling = Some(tracked);
        self
    }

    /// Pipeline name (used as the intent name).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_parts(self) -> (Cow<'static, str>, Option<bool>, Chain<S, E>) {
        let chain = self.chain;
        let erased: Chain<S, E> =
            Box::new(move |scope| chain(scope).map(|res| res.map(|_| ())).boxed());
        (self.name, self.idling, erased)
    }
}

impl<S, E, T> std::fmt::Debug for Pipeline<S, E, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("idling", &self.idling)
            .finish_non_exhaustive()
    }
}
