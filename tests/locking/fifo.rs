//! Promotion order and mutual exclusion.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rdlm::LockManager;

use crate::support::{hold, request};

/// Poll until `resource` has `count` queued waiters.
async fn wait_for_waiters(manager: &LockManager, resource: &str, count: usize) {
    for _ in 0..200 {
        if manager.resource(resource).unwrap().waiters.len() == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("{resource} never reached {count} waiters");
}

#[tokio::test]
async fn waiters_are_granted_in_arrival_order() {
    let manager = LockManager::default();
    let holder = hold(&manager, "r", "holder", 60_000).await;
    let order = Arc::new(Mutex::new(Vec::new()));

    let mut tasks = Vec::new();
    for i in 0..8usize {
        let task_manager = manager.clone();
        let order = order.clone();
        tasks.push(tokio::spawn(async move {
            let lock = task_manager
                .acquire("r", request(&format!("w{i}"), 10_000, 60_000))
                .await
                .unwrap()
                .granted()
                .expect("waiter should be granted");
            order.lock().unwrap().push(i);
            tokio::time::sleep(Duration::from_millis(5)).await;
            task_manager.release("r", lock.id()).unwrap();
        }));
        wait_for_waiters(&manager, "r", i + 1).await;
    }

    let titles: Vec<String> = manager
        .resource("r")
        .unwrap()
        .waiters
        .into_iter()
        .map(|w| w.title)
        .collect();
    assert_eq!(titles, (0..8).map(|i| format!("w{i}")).collect::<Vec<_>>());

    manager.release("r", holder.id()).unwrap();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(*order.lock().unwrap(), (0..8).collect::<Vec<_>>());
    assert!(manager.table().is_empty().unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_acquirers_never_overlap() {
    const TASKS: usize = 32;

    let manager = LockManager::default();
    let inside = Arc::new(AtomicUsize::new(0));
    let most_inside = Arc::new(AtomicUsize::new(0));
    let ids = Arc::new(Mutex::new(HashSet::new()));

    let mut tasks = Vec::new();
    for i in 0..TASKS {
        let manager = manager.clone();
        let inside = inside.clone();
        let most_inside = most_inside.clone();
        let ids = ids.clone();
        tasks.push(tokio::spawn(async move {
            let lock = manager
                .acquire("shared", request(&format!("t{i}"), 30_000, 60_000))
                .await
                .unwrap()
                .granted()
                .expect("every caller should eventually be granted");
            let now_inside = inside.fetch_add(1, Ordering::SeqCst) + 1;
            most_inside.fetch_max(now_inside, Ordering::SeqCst);
            assert!(ids.lock().unwrap().insert(lock.id().clone()));

            tokio::time::sleep(Duration::from_millis(2)).await;

            inside.fetch_sub(1, Ordering::SeqCst);
            manager.release("shared", lock.id()).unwrap();
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(most_inside.load(Ordering::SeqCst), 1);
    assert_eq!(ids.lock().unwrap().len(), TASKS);
    assert!(manager.table().is_empty().unwrap());
}

#[tokio::test]
async fn resources_are_independent() {
    let manager = LockManager::default();
    let a = hold(&manager, "a", "a", 60_000).await;
    let b = hold(&manager, "b", "b", 60_000).await;
    assert_ne!(a.id(), b.id());

    let names: Vec<String> = manager
        .resources()
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, ["a", "b"]);
}
