//! Lease expiry, with and without the reaper.

use std::time::{Duration, Instant};

use rdlm::{DeleteOutcome, LockManager};

use crate::support::{hold, manager_with_reaper, request};

#[tokio::test]
async fn expired_lock_is_gone_and_resource_reusable() {
    let manager = LockManager::default();
    let short = hold(&manager, "r", "short", 200).await;
    assert!(manager.get("r", short.id()).unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(manager.get("r", short.id()).unwrap().is_none());

    let long = hold(&manager, "r", "long", 60_000).await;
    let info = manager.get("r", long.id()).unwrap().unwrap();
    assert_eq!(info.title, "long");
}

#[tokio::test]
async fn reaper_promotes_waiter_when_lease_expires() {
    let (manager, reaper) = manager_with_reaper(Duration::from_millis(20));
    let holder = hold(&manager, "r", "holder", 300).await;

    let started = Instant::now();
    let lock = manager
        .acquire("r", request("waiter", 5_000, 60_000))
        .await
        .unwrap()
        .granted()
        .expect("waiter should be promoted once the holder expires");
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(250), "promoted after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "promoted after {elapsed:?}");
    assert!(manager.get("r", holder.id()).unwrap().is_none());
    assert!(manager.get("r", lock.id()).unwrap().is_some());

    let stats = reaper.stop();
    assert_eq!(stats.locks_expired, 1);
}

#[tokio::test]
async fn delete_all_after_expiry_invalidates_every_handle() {
    let manager = LockManager::default();
    let a = hold(&manager, "a", "a", 60_000).await;
    let b = hold(&manager, "b", "b", 200).await;

    assert_eq!(
        manager.delete_all().unwrap(),
        DeleteOutcome::Conflict(vec!["a".to_string(), "b".to_string()])
    );

    manager.release("a", a.id()).unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(manager.delete_all().unwrap(), DeleteOutcome::Deleted);

    assert!(manager.get("a", a.id()).unwrap().is_none());
    assert!(manager.get("b", b.id()).unwrap().is_none());
    assert!(manager.resources().unwrap().is_empty());
}
