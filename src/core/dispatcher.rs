//! # Dispatcher: admits intents and owns their runners.
//!
//! One dispatcher task per container, the serialization context. It pulls
//! jobs from the intent queue and either spawns a runner on the background
//! handle or, for blocking intents, runs it inline while holding the
//! serialization lock.
//!
//! ## Architecture
//! ```text
//! mpsc<Job> ──► Dispatcher::run()
//!                 ├─► blocking     → lock serial → run_intent(job) inline
//!                 ├─► non-blocking → JoinSet::spawn_on(run_intent(job), background)
//!                 └─► join_next()  → reap finished runners
//!
//! root token cancelled ──► teardown()
//!                           ├─ close queue, queued jobs → Cancelled
//!                           ├─ SubscribedCounter::release_all()
//!                           ├─ drain JoinSet (runners observe their child tokens)
//!                           └─ publish ContainerClosed
//! ```
//!
//! ## Rules
//! - The dispatcher owns every runner (`JoinSet`); aborting it aborts them all
//! - Later intents are not admitted while a blocking intent runs
//! - Runner panics are reported, never propagated

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::container::{Job, Shared};
use super::runner::run_intent;
use crate::events::{ContainerEvent, EventKind};
use crate::intent::{SideEffect, State};
use crate::subscription::Subscription;

pub(crate) struct Dispatcher<S, E> {
    shared: Arc<Shared<S, E>>,
    intents: mpsc::UnboundedReceiver<Job<S, E>>,
    background: Handle,
    runners: JoinSet<()>,
}

impl<S: State, E: SideEffect> Dispatcher<S, E> {
    pub(crate) fn new(
        shared: Arc<Shared<S, E>>,
        intents: mpsc::UnboundedReceiver<Job<S, E>>,
        background: Handle,
    ) -> Self {
        Self {
            shared,
            intents,
            background,
            runners: JoinSet::new(),
        }
    }

    /// Runs until the root token is cancelled, then tears down.
    pub(crate) async fn run(mut self) {
        let token = self.shared.token.clone();
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                Some(res) = self.runners.join_next(), if !self.runners.is_empty() => {
                    if let Err(e) = res {
                        warn!(error = %e, "intent runner died");
                    }
                }
                job = self.intents.recv() => match job {
                    Some(job) => self.dispatch(job).await,
                    None => break,
                },
            }
        }
        self.teardown().await;
    }

    async fn dispatch(&mut self, job: Job<S, E>) {
        debug!(intent = %job.name, id = %job.id, blocking = job.blocking, "intent scheduled");
        self.shared.bus.publish(
            ContainerEvent::new(EventKind::IntentScheduled)
                .with_intent(job.id.get(), Arc::clone(&job.name)),
        );

        if job.blocking {
            let _serial = self.shared.serial.lock().await;
            run_intent(Arc::clone(&self.shared), job, true).await;
        } else {
            self.runners.spawn_on(
                run_intent(Arc::clone(&self.shared), job, false),
                &self.background,
            );
        }
    }

    async fn teardown(mut self) {
        self.intents.close();
        while let Ok(job) = self.intents.try_recv() {
            debug!(intent = %job.name, id = %job.id, "queued intent cancelled by teardown");
            self.shared.bus.publish(
                ContainerEvent::new(EventKind::IntentCancelled)
                    .with_intent(job.id.get(), Arc::clone(&job.name)),
            );
            job.refuse();
        }

        let was_subscribed = self.shared.subscribed.status().is_subscribed();
        self.shared.subscribed.release_all();
        if was_subscribed {
            self.shared.bus.publish(
                ContainerEvent::new(EventKind::SubscriptionChanged)
                    .with_subscription(Subscription::Unsubscribed),
            );
        }

        while let Some(res) = self.runners.join_next().await {
            if let Err(e) = res {
                warn!(error = %e, "intent runner died during teardown");
            }
        }

        debug!("container closed");
        self.shared
            .bus
            .publish(ContainerEvent::new(EventKind::ContainerClosed));
    }
}
