//! Shared-breaker behavior under concurrent callers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use breakwater::{Breaker, BreakerConfig, BreakerError, BreakerRegistry, Phase};

mod common;
use common::{scenario_config, DependencyError};

async fn trip(breaker: &Breaker) {
    for _ in 0..breaker.config().minimum_throughput {
        let _ = breaker
            .execute(|| async { Err::<(), _>(DependencyError("boom")) })
            .await;
    }
    assert_eq!(breaker.phase(), Phase::Open);
}

/// Spawn a call that blocks until `gate` is notified.
fn spawn_gated_call(
    breaker: Arc<Breaker>,
    gate: Arc<Notify>,
) -> tokio::task::JoinHandle<Result<(), BreakerError<DependencyError>>> {
    tokio::spawn(async move {
        breaker
            .execute(|| {
                let gate = gate.clone();
                async move {
                    gate.notified().await;
                    Ok(())
                }
            })
            .await
    })
}

async fn wait_for_in_flight(breaker: &Breaker, expected: u32) {
    while breaker.snapshot().half_open_in_flight != expected {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_half_open_admits_at_most_max_in_flight() {
    let config = scenario_config("probes").with_call_timeout(Duration::from_secs(600));
    let breaker = Arc::new(Breaker::new(config).unwrap());
    trip(&breaker).await;
    tokio::time::advance(Duration::from_secs(30)).await;

    let gate = Arc::new(Notify::new());
    let probe = spawn_gated_call(breaker.clone(), gate.clone());
    wait_for_in_flight(&breaker, 1).await;
    assert_eq!(breaker.phase(), Phase::HalfOpen);

    let err = breaker
        .execute(|| async { Ok::<_, DependencyError>(()) })
        .await
        .unwrap_err();
    match err {
        BreakerError::Open(fault) => {
            assert_eq!(fault.phase, Phase::HalfOpen);
            assert_eq!(fault.retry_after, None);
        }
        other => panic!("expected rejection, got {other:?}"),
    }

    gate.notify_one();
    assert!(probe.await.unwrap().is_ok());
    assert_eq!(breaker.phase(), Phase::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_two_probe_slots_admit_two_calls() {
    let config = scenario_config("wide")
        .with_half_open_max_in_flight(2)
        .with_half_open_min_probes(2)
        .with_call_timeout(Duration::from_secs(600));
    let breaker = Arc::new(Breaker::new(config).unwrap());
    trip(&breaker).await;
    tokio::time::advance(Duration::from_secs(30)).await;

    let gate = Arc::new(Notify::new());
    let first = spawn_gated_call(breaker.clone(), gate.clone());
    wait_for_in_flight(&breaker, 1).await;
    let second = spawn_gated_call(breaker.clone(), gate.clone());
    wait_for_in_flight(&breaker, 2).await;

    let third = breaker.execute(|| async { Ok::<_, DependencyError>(()) }).await;
    assert!(third.unwrap_err().is_open());

    gate.notify_waiters();
    assert!(first.await.unwrap().is_ok());
    assert!(second.await.unwrap().is_ok());
    assert_eq!(breaker.phase(), Phase::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_probe_frees_its_slot() {
    let breaker = Breaker::new(scenario_config("cancel")).unwrap();
    trip(&breaker).await;
    tokio::time::advance(Duration::from_secs(30)).await;

    let abandoned = tokio::time::timeout(
        Duration::from_millis(10),
        breaker.execute(|| std::future::pending::<Result<(), DependencyError>>()),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(breaker.snapshot().half_open_in_flight, 0);
    assert_eq!(breaker.phase(), Phase::HalfOpen);

    assert!(breaker.execute(|| async { Ok::<_, DependencyError>(()) }).await.is_ok());
    assert_eq!(breaker.phase(), Phase::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_call_started_before_outage_cannot_reopen_recovered_breaker() {
    let config = scenario_config("stale")
        .with_minimum_throughput(1)
        .with_call_timeout(Duration::from_secs(600));
    let breaker = Arc::new(Breaker::new(config).unwrap());

    let gate = Arc::new(Notify::new());
    let slow = {
        let breaker = breaker.clone();
        let gate = gate.clone();
        tokio::spawn(async move {
            breaker
                .execute(|| {
                    let gate = gate.clone();
                    async move {
                        gate.notified().await;
                        Err::<(), _>(DependencyError("late"))
                    }
                })
                .await
        })
    };
    while breaker.snapshot().total_calls != 1 {
        tokio::task::yield_now().await;
    }

    trip(&breaker).await;
    tokio::time::advance(Duration::from_secs(30)).await;
    assert!(breaker.execute(|| async { Ok::<_, DependencyError>(()) }).await.is_ok());
    assert_eq!(breaker.phase(), Phase::Closed);

    gate.notify_one();
    assert!(matches!(slow.await.unwrap(), Err(BreakerError::Call(_))));

    let snapshot = breaker.snapshot();
    assert_eq!(snapshot.phase, Phase::Closed);
    assert_eq!(snapshot.sample_count, 0);
    assert_eq!(snapshot.times_opened, 1);
    assert_eq!(snapshot.stale_outcomes, 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_call_does_not_block_other_callers() {
    let config = BreakerConfig::new("slow").with_call_timeout(Duration::from_secs(600));
    let breaker = Arc::new(Breaker::new(config).unwrap());

    let gate = Arc::new(Notify::new());
    let slow = spawn_gated_call(breaker.clone(), gate.clone());
    tokio::task::yield_now().await;

    for _ in 0..10 {
        assert!(breaker.execute(|| async { Ok::<_, DependencyError>(()) }).await.is_ok());
    }
    assert!(!slow.is_finished());

    gate.notify_one();
    assert!(slow.await.unwrap().is_ok());
    assert_eq!(breaker.snapshot().sample_count, 11);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_tasks_share_one_breaker() {
    let breaker = Arc::new(Breaker::new(BreakerConfig::new("shared")).unwrap());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let breaker = breaker.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..50 {
                breaker
                    .execute(|| async { Ok::<_, DependencyError>(()) })
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let snapshot = breaker.snapshot();
    assert_eq!(snapshot.phase, Phase::Closed);
    assert_eq!(snapshot.total_calls, 800);
    assert_eq!(snapshot.sample_count, 800);
    assert_eq!(snapshot.rejected_calls, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_registry_creates_each_name_once() {
    let registry = Arc::new(BreakerRegistry::new(BreakerConfig::default()).unwrap());

    let mut handles = Vec::new();
    for _ in 0..32 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move { registry.get_or_create("inventory") }));
    }

    let mut breakers = Vec::new();
    for handle in handles {
        breakers.push(handle.await.unwrap());
    }

    assert_eq!(registry.len(), 1);
    assert!(breakers.iter().all(|b| Arc::ptr_eq(b, &breakers[0])));
}
