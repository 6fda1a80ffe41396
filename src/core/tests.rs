//! Container scenarios: ordering, concurrency, subscription gating, idling, teardown.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::{sleep, timeout};

use crate::error::{ContainerError, StageError};
use crate::events::{ContainerEvent, EventKind};
use crate::idling::{CountingIdlingTracker, IdlingTracker};
use crate::intent::{IntentOptions, IntentStatus, Pipeline};
use crate::observers::Observe;
use crate::subscription::Subscription;
use crate::{Container, ContainerConfig, SideEffectBuffering};

const WAIT: Duration = Duration::from_secs(2);

fn add(name: &'static str, by: u64) -> Pipeline<u64, String> {
    Pipeline::new(name)
        .transform(move |_ctx, ()| async move { Ok::<_, StageError>(by) })
        .reduce(|state, by| state + by)
}

fn set(value: u64) -> Pipeline<u64, String> {
    Pipeline::new("set").reduce(move |_state, ()| value)
}

/// Counts live block executions.
struct Live(Arc<AtomicUsize>);

impl Live {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for Live {
    fn drop(&mut self) {
        self.0.fetch_sub(1, SeqCst);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reduces_never_lose_updates() {
    let container: Container<u64, String> = Container::builder(0).build();

    let handles: Vec<_> = (0..100)
        .map(|_| {
            container.intent(
                Pipeline::new("inc")
                    .transform(|_ctx, ()| async {
                        tokio::task::yield_now().await;
                        Ok::<u64, StageError>(1)
                    })
                    .reduce(|state, by| state + by),
            )
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().await, IntentStatus::Completed);
    }
    assert_eq!(*container.state(), 100);
    container.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_transform_does_not_block_other_reduces() {
    let container: Container<u64, String> = Container::builder(0).build();
    let (release, gate) = oneshot::channel::<()>();

    let slow = container.intent(
        Pipeline::new("slow")
            .transform(move |_ctx, ()| async move {
                let _ = gate.await;
                Ok::<u64, StageError>(10)
            })
            .reduce(|state, by| state + by),
    );
    let fast = container.intent(add("fast", 1));

    assert_eq!(
        timeout(WAIT, fast.join()).await.unwrap(),
        IntentStatus::Completed
    );
    assert_eq!(*container.state(), 1);
    assert!(!slow.is_finished());

    release.send(()).unwrap();
    assert_eq!(slow.join().await, IntentStatus::Completed);
    assert_eq!(*container.state(), 11);
    container.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocking_intent_holds_back_later_intents() {
    let container: Container<u64, String> = Container::builder(0).build();
    let (release, gate) = oneshot::channel::<()>();

    let exclusive = container.intent_with(
        Pipeline::new("exclusive")
            .transform(move |_ctx, ()| async move {
                let _ = gate.await;
                Ok::<u64, StageError>(10)
            })
            .reduce(|state, by| state + by),
        IntentOptions::new().blocking(),
    );
    let later = container.intent(add("later", 1));

    assert!(timeout(Duration::from_millis(100), later.join()).await.is_err());
    assert_eq!(later.status(), IntentStatus::Scheduled);
    assert_eq!(*container.state(), 0);

    release.send(()).unwrap();
    assert_eq!(exclusive.join().await, IntentStatus::Completed);
    assert_eq!(later.join().await, IntentStatus::Completed);
    assert_eq!(*container.state(), 11);
    container.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stage_context_reads_snapshot_and_volatile_state() {
    let container: Container<u64, String> = Container::builder(5).build();
    let seen = Arc::new(Mutex::new(None));
    let out = Arc::clone(&seen);
    let (release, gate) = oneshot::channel::<()>();

    let reader = container.intent(Pipeline::new("reader").transform(move |ctx, ()| async move {
        let before = *ctx.state();
        let _ = gate.await;
        *out.lock() = Some((before, *ctx.state(), *ctx.volatile_state()));
        Ok::<_, StageError>(())
    }));
    sleep(Duration::from_millis(20)).await;
    assert_eq!(container.intent(set(9)).join().await, IntentStatus::Completed);
    release.send(()).unwrap();
    assert_eq!(reader.join().await, IntentStatus::Completed);

    assert_eq!(*seen.lock(), Some((5, 5, 9)));
    container.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_ref_counted_stream_drives_debounced_subscription() {
    let container: Container<u64, String> = Container::builder(0).build();
    let counter = container.subscribed_counter();

    let mut states = container.ref_counted_state_stream();
    assert_eq!(counter.count(), 0);
    assert_eq!(*states.next().await.unwrap(), 0);
    assert_eq!(counter.count(), 1);
    assert_eq!(counter.status(), Subscription::Subscribed);

    drop(states);
    assert_eq!(counter.count(), 0);
    sleep(Duration::from_millis(50)).await;
    assert_eq!(counter.status(), Subscription::Subscribed);

    // back inside the debounce window: no Unsubscribed in between
    let mut again = container.ref_counted_state_stream();
    again.next().await.unwrap();
    sleep(Duration::from_millis(200)).await;
    assert_eq!(counter.status(), Subscription::Subscribed);

    drop(again);
    sleep(Duration::from_millis(150)).await;
    assert_eq!(counter.status(), Subscription::Unsubscribed);
    container.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_repeat_on_subscription_follows_counter() {
    let container: Container<u64, String> = Container::builder(0).build();
    let starts = Arc::new(AtomicUsize::new(0));
    let live = Arc::new(AtomicUsize::new(0));

    let (s, l) = (Arc::clone(&starts), Arc::clone(&live));
    let collector = container.intent(Pipeline::new("collector").transform(move |ctx, ()| async move {
        ctx.repeat_on_subscription(move |_ctx| {
            let (starts, live) = (Arc::clone(&s), Arc::clone(&l));
            async move {
                starts.fetch_add(1, SeqCst);
                let _live = Live::enter(&live);
                futures::future::pending::<()>().await;
                Ok(())
            }
        })
        .await
    }));

    sleep(Duration::from_millis(10)).await;
    assert_eq!(starts.load(SeqCst), 0);
    assert!(container.is_idle());

    let mut first = container.ref_counted_state_stream();
    first.next().await.unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(starts.load(SeqCst), 1);
    assert_eq!(live.load(SeqCst), 1);
    assert!(container.is_idle());

    // resubscribed inside the debounce window: never stopped, never restarted
    drop(first);
    sleep(Duration::from_millis(50)).await;
    let mut second = container.ref_counted_state_stream();
    second.next().await.unwrap();
    sleep(Duration::from_millis(200)).await;
    assert_eq!(starts.load(SeqCst), 1);
    assert_eq!(live.load(SeqCst), 1);

    drop(second);
    sleep(Duration::from_millis(150)).await;
    assert_eq!(live.load(SeqCst), 0);

    let mut third = container.ref_counted_state_stream();
    third.next().await.unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(starts.load(SeqCst), 2);

    collector.cancel();
    assert_eq!(collector.join().await, IntentStatus::Cancelled);
    assert_eq!(live.load(SeqCst), 0);
    drop(third);
    container.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_on_latest_matching_state_wins() {
    let container: Container<u64, String> = Container::builder(0).build();
    let starts = Arc::new(Mutex::new(Vec::new()));
    let live = Arc::new(AtomicUsize::new(0));

    let (s, l) = (Arc::clone(&starts), Arc::clone(&live));
    let scoped = container.intent(
        Pipeline::new("odd-only")
            .transform(move |ctx, ()| async move {
                ctx.run_on(
                    |state: &u64| (state % 2 == 1).then_some(*state),
                    move |_ctx, value| {
                        let (starts, live) = (Arc::clone(&s), Arc::clone(&l));
                        async move {
                            starts.lock().push(value);
                            let _live = Live::enter(&live);
                            if value < 9 {
                                futures::future::pending::<()>().await;
                            }
                            Ok::<_, StageError>(value)
                        }
                    },
                )
                .await
            })
            .reduce(|_state, value| value * 100),
    );

    let settle = || sleep(Duration::from_millis(30));
    settle().await;
    assert!(starts.lock().is_empty());

    for (value, expected_live) in [(1, 1), (3, 1), (4, 0)] {
        container.intent(set(value)).join().await;
        settle().await;
        assert_eq!(live.load(SeqCst), expected_live, "after state {value}");
    }
    assert_eq!(*starts.lock(), vec![1, 3]);

    container.intent(set(5)).join().await;
    settle().await;
    assert_eq!(*starts.lock(), vec![1, 3, 5]);
    assert_eq!(live.load(SeqCst), 1);

    container.intent(set(9)).join().await;
    assert_eq!(
        timeout(WAIT, scoped.join()).await.unwrap(),
        IntentStatus::Completed
    );
    assert_eq!(*starts.lock(), vec![1, 3, 5, 9]);
    assert_eq!(*container.state(), 900);
    container.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_idle_after_all_units_finish_including_failed_one() {
    let tracker = Arc::new(CountingIdlingTracker::new());
    let fired = Arc::new(AtomicUsize::new(0));
    let f = Arc::clone(&fired);
    assert!(tracker.register_idle_callback(Arc::new(move || {
        f.fetch_add(1, SeqCst);
    })));

    let container: Container<u64, String> = Container::builder(0)
        .idling_tracker(tracker.clone())
        .build();

    let mut gates = Vec::new();
    let mut handles = Vec::new();
    for i in 0..4u64 {
        let (release, gate) = oneshot::channel::<()>();
        gates.push(release);
        handles.push(
            container.intent(
                Pipeline::new("unit")
                    .transform(move |_ctx, ()| async move {
                        let _ = gate.await;
                        if i == 2 {
                            Err(StageError::fail("unit 2 failed"))
                        } else {
                            Ok(1u64)
                        }
                    })
                    .reduce(|state, by| state + by),
            ),
        );
    }

    timeout(WAIT, async {
        while tracker.count() < 4 {
            sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(fired.load(SeqCst), 0);

    for release in gates {
        assert!(!container.is_idle());
        release.send(()).unwrap();
    }

    let mut statuses = Vec::new();
    for h in handles {
        statuses.push(h.join().await);
    }
    assert_eq!(
        statuses[2],
        IntentStatus::Failed(StageError::fail("unit 2 failed"))
    );
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == IntentStatus::Completed)
            .count(),
        3
    );

    timeout(WAIT, tracker.wait_idle()).await.unwrap();
    assert!(container.is_idle());
    assert_eq!(tracker.count(), 0);
    assert!(fired.load(SeqCst) >= 1);
    assert_eq!(*container.state(), 3);
    container.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_untracked_intent_leaves_tracker_idle() {
    let container: Container<u64, String> = Container::builder(0).build();
    let (release, gate) = oneshot::channel::<()>();

    let quiet = container.intent_with(
        Pipeline::new("quiet").transform(move |_ctx, ()| async move {
            let _ = gate.await;
            Ok::<_, StageError>(())
        }),
        IntentOptions::new().idling(false),
    );
    sleep(Duration::from_millis(20)).await;
    assert!(container.is_idle());

    release.send(()).unwrap();
    assert_eq!(quiet.join().await, IntentStatus::Completed);
    container.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_end_to_end_profile_load() {
    #[derive(Debug, Clone, PartialEq)]
    struct Profile {
        id: u32,
    }

    let container: Container<Profile, String> = Container::builder(Profile { id: 42 }).build();
    let mut states = container.ref_counted_state_stream();
    let mut effects = container.side_effects();

    let handle = container.intent(
        Pipeline::new("load-profile")
            .transform(|_ctx, ()| async { Ok::<_, StageError>(7 + 5) })
            .side_effect(|id| format!("loaded {id}"))
            .reduce(|_state, id| Profile { id }),
    );

    assert_eq!(handle.join().await, IntentStatus::Completed);
    assert_eq!(*states.next().await.unwrap(), Profile { id: 42 });
    assert_eq!(*states.next().await.unwrap(), Profile { id: 12 });
    assert_eq!(effects.next().await.as_deref(), Some("loaded 12"));
    assert_eq!(*container.state(), Profile { id: 12 });

    container.close().await.unwrap();
    assert!(states.next().await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stage_failure_leaves_container_usable() {
    let container: Container<u64, String> = Container::builder(0).build();

    let failed = container.intent(
        Pipeline::new("broken")
            .transform(|_ctx, ()| async { Err::<u64, _>(StageError::fail("backend down")) })
            .side_effect(|_| "never".to_string())
            .reduce(|_state, by| by),
    );
    let panicked = container.intent(
        Pipeline::new("buggy")
            .transform(|_ctx, ()| async { Ok::<_, StageError>(1) })
            .reduce(|_state: &u64, _by: u64| -> u64 { panic!("reducer bug") }),
    );

    assert_eq!(
        failed.join().await,
        IntentStatus::Failed(StageError::fail("backend down"))
    );
    assert_eq!(
        panicked.join().await,
        IntentStatus::Failed(StageError::Panicked {
            info: "reducer bug".into()
        })
    );
    assert_eq!(*container.state(), 0);

    assert_eq!(container.intent(add("ok", 2)).join().await, IntentStatus::Completed);
    assert_eq!(*container.state(), 2);
    container.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_intent_commits_nothing() {
    let container: Container<u64, String> = Container::builder(0).build();

    let handle = container.intent(
        Pipeline::new("endless")
            .transform(|_ctx, ()| async {
                futures::future::pending::<()>().await;
                Ok::<u64, StageError>(5)
            })
            .reduce(|state, by| state + by),
    );
    sleep(Duration::from_millis(20)).await;
    assert_eq!(handle.status(), IntentStatus::Transforming);
    handle.cancel();

    assert_eq!(handle.join().await, IntentStatus::Cancelled);
    assert_eq!(*container.state(), 0);
    assert!(container.running_intents().is_empty());
    container.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_close_releases_counter_and_refuses_intents() {
    let container: Container<u64, String> = Container::builder(0).build();
    let counter = container.subscribed_counter();
    let mut states = container.ref_counted_state_stream();
    states.next().await.unwrap();
    assert_eq!(counter.status(), Subscription::Subscribed);

    let pending = container.intent(Pipeline::new("endless").transform(|_ctx, ()| async {
        futures::future::pending::<()>().await;
        Ok::<_, StageError>(())
    }));
    sleep(Duration::from_millis(20)).await;

    container.close().await.unwrap();
    assert_eq!(pending.join().await, IntentStatus::Cancelled);
    assert_eq!(counter.count(), 0);
    assert_eq!(counter.status(), Subscription::Unsubscribed);
    assert!(states.next().await.is_none());
    assert!(container.is_idle());

    assert_eq!(
        container.try_intent(add("late", 1)).unwrap_err(),
        ContainerError::Closed
    );
    let refused = container.intent(add("late", 1));
    assert!(refused.is_finished());
    assert_eq!(refused.join().await, IntentStatus::Cancelled);
    assert!(container.close().await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_close_reports_stuck_intents_after_grace() {
    let cfg = ContainerConfig {
        grace: Duration::from_millis(50),
        ..ContainerConfig::default()
    };
    let container: Container<u64, String> = Container::builder(0).config(cfg).build();

    let _stuck = container.intent(Pipeline::new("stuck").transform(|_ctx, ()| async {
        std::thread::sleep(Duration::from_millis(400));
        Ok::<_, StageError>(())
    }));
    timeout(WAIT, async {
        while container.running_intents().is_empty() {
            sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();

    match container.close().await {
        Err(ContainerError::GraceExceeded { grace, stuck }) => {
            assert_eq!(grace, Duration::from_millis(50));
            assert_eq!(stuck, vec!["stuck#1".to_string()]);
        }
        other => panic!("unexpected close result: {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unobserved_side_effects_follow_buffering_policy() {
    let buffered: Container<u64, String> = Container::builder(0).build();
    let post = |n: u64| -> Pipeline<u64, String> {
        Pipeline::new("post").transform(move |ctx, ()| async move {
            ctx.post(format!("effect {n}"));
            Ok::<_, StageError>(())
        })
    };

    buffered.intent(post(1)).join().await;
    buffered.intent(post(2)).join().await;
    let mut effects = buffered.side_effects();
    assert_eq!(effects.next().await.as_deref(), Some("effect 1"));
    assert_eq!(effects.next().await.as_deref(), Some("effect 2"));
    buffered.close().await.unwrap();

    let cfg = ContainerConfig {
        side_effect_buffering: SideEffectBuffering::DropUnobserved,
        ..ContainerConfig::default()
    };
    let dropping: Container<u64, String> = Container::builder(0).config(cfg).build();
    let mut events = dropping.events();
    dropping.intent(post(3)).join().await;
    let mut effects = dropping.side_effects();
    dropping.intent(post(4)).join().await;
    assert_eq!(effects.next().await.as_deref(), Some("effect 4"));

    let dropped = timeout(WAIT, async {
        while let Some(ev) = events.next().await {
            if ev.kind == EventKind::SideEffectDropped {
                return ev;
            }
        }
        panic!("event stream ended");
    })
    .await
    .unwrap();
    assert_eq!(dropped.intent.as_deref(), Some("post"));
    dropping.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_observer_that_is_not_reading_loses_no_side_effects() {
    let container: Container<u64, String> = Container::builder(0).build();
    let capacity = container.config().side_effect_capacity;
    let total = capacity + 36;
    let mut effects = container.side_effects();

    let status = container
        .intent(Pipeline::new("burst").transform(move |ctx, ()| async move {
            for n in 0..total {
                ctx.post(format!("e{n}"));
            }
            Ok::<_, StageError>(())
        }))
        .join()
        .await;
    assert_eq!(status, IntentStatus::Completed);

    let seen: Vec<String> = timeout(WAIT, effects.by_ref().take(total).collect())
        .await
        .unwrap();
    let expected: Vec<String> = (0..total).map(|n| format!("e{n}")).collect();
    assert_eq!(seen, expected);
    container.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_ref_counted_side_effects_drive_debounced_subscription() {
    let container: Container<u64, String> = Container::builder(0).build();
    let counter = container.subscribed_counter();

    let mut effects = container.ref_counted_side_effects();
    assert_eq!(counter.count(), 0);
    container.intent(Pipeline::new("greet").transform(|ctx, ()| async move {
        ctx.post("hello".to_string());
        Ok::<_, StageError>(())
    }));
    assert_eq!(effects.next().await.as_deref(), Some("hello"));
    assert_eq!(counter.count(), 1);
    assert_eq!(counter.status(), Subscription::Subscribed);

    drop(effects);
    assert_eq!(counter.count(), 0);
    sleep(Duration::from_millis(50)).await;
    assert_eq!(counter.status(), Subscription::Subscribed);
    sleep(Duration::from_millis(100)).await;
    assert_eq!(counter.status(), Subscription::Unsubscribed);
    container.close().await.unwrap();
}

#[test]
fn test_background_handle_runs_transforms_on_that_runtime() {
    let background = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("statevisor-bg")
        .enable_all()
        .build()
        .unwrap();
    let caller = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let ran_on = Arc::new(Mutex::new(None::<String>));
    let record = Arc::clone(&ran_on);
    caller.block_on(async {
        let container: Container<u64, String> = Container::builder(0)
            .background(background.handle().clone())
            .build();
        let status = container
            .intent(
                Pipeline::new("where")
                    .transform(move |_ctx, ()| async move {
                        *record.lock() = std::thread::current().name().map(str::to_owned);
                        Ok::<_, StageError>(1)
                    })
                    .reduce(|state, by| state + by),
            )
            .join()
            .await;
        assert_eq!(status, IntentStatus::Completed);
        assert_eq!(*container.state(), 1);
        container.close().await.unwrap();
    });

    assert_eq!(ran_on.lock().as_deref(), Some("statevisor-bg"));
    background.shutdown_background();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_restore_hook_and_on_create() {
    let container: Container<u64, String> = Container::builder(0)
        .restore(|| Some(7))
        .on_create(add("warm-up", 1))
        .build();
    let mut states = container.state_stream();

    let mut last = 0;
    timeout(WAIT, async {
        while last != 8 {
            last = *states.next().await.unwrap();
        }
    })
    .await
    .unwrap();
    assert_eq!(*container.state(), 8);
    container.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stage_can_submit_follow_up_intent() {
    let container: Container<u64, String> = Container::builder(0).build();
    let follow_up = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&follow_up);

    let first = container.intent(
        Pipeline::new("first")
            .transform(move |ctx, ()| async move {
                *slot.lock() = Some(ctx.submit(add("second", 10)));
                Ok::<u64, StageError>(1)
            })
            .reduce(|state, by| state + by),
    );
    assert_eq!(first.join().await, IntentStatus::Completed);

    let second = follow_up.lock().take().unwrap();
    assert_eq!(second.name(), "second");
    assert_eq!(second.join().await, IntentStatus::Completed);
    assert_eq!(*container.state(), 11);
    container.close().await.unwrap();
}

struct Recorder(Mutex<Vec<EventKind>>);

#[async_trait]
impl Observe for Recorder {
    async fn on_event(&self, ev: &ContainerEvent) {
        self.0.lock().push(ev.kind);
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_observers_see_lifecycle_in_order() {
    let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
    let observers: Vec<Arc<dyn Observe>> = vec![recorder.clone()];
    let container: Container<u64, String> = Container::builder(0).observers(observers).build();

    assert_eq!(container.intent(add("inc", 1)).join().await, IntentStatus::Completed);
    container.close().await.unwrap();

    timeout(WAIT, async {
        while !recorder.0.lock().contains(&EventKind::ContainerClosed) {
            sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(
        *recorder.0.lock(),
        vec![
            EventKind::IntentScheduled,
            EventKind::StateCommitted,
            EventKind::IntentCompleted,
            EventKind::ContainerClosed,
        ]
    );
}
