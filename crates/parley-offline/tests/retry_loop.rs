mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{pending_channel, pending_message, MemoryPending, ScriptedRemote};
use parley_offline::{
    DefaultErrorClassifier, PendingStore, RetryConfig, RetryLoop, Submitter, Syncable,
};
use parley_shared::{ChatError, SyncStatus};
use parley_store::{Channel, Message};

fn retry_loop<E: Syncable>(
    store: &Arc<MemoryPending<E>>,
    remote: &Arc<ScriptedRemote>,
    page_size: usize,
) -> RetryLoop<E>
where
    ScriptedRemote: Submitter<E>,
{
    RetryLoop::new(
        "test",
        store.clone() as Arc<dyn PendingStore<E>>,
        remote.clone() as Arc<dyn Submitter<E>>,
        Arc::new(DefaultErrorClassifier),
        RetryConfig {
            page_size,
            max_pages: None,
        },
    )
}

fn channels(n: usize) -> Vec<Channel> {
    (0..n).map(|i| pending_channel(&format!("c{i:03}"))).collect()
}

fn rejected() -> ChatError {
    ChatError::network(4, 400, "bad request")
}

fn rate_limited() -> ChatError {
    ChatError::network(9, 429, "slow down")
}

#[tokio::test]
async fn single_page_converges() {
    let store = Arc::new(MemoryPending::new(channels(10)));
    let remote = Arc::new(ScriptedRemote::always_ok());

    let report = retry_loop(&store, &remote, 50).run().await.unwrap();

    assert_eq!(report.pages, 1);
    assert_eq!(report.completed, 10);
    assert_eq!(store.count(SyncStatus::Completed), 10);
    assert_eq!(store.count(SyncStatus::SyncNeeded), 0);
    assert_eq!(store.writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn drains_multiple_pages() {
    let store = Arc::new(MemoryPending::new(channels(25)));
    let remote = Arc::new(ScriptedRemote::always_ok());

    let report = retry_loop(&store, &remote, 10).run().await.unwrap();

    assert_eq!(report.pages, 3);
    assert_eq!(report.submitted, 25);
    assert_eq!(store.count(SyncStatus::Completed), 25);
    assert_eq!(remote.call_count(), 25);
}

#[tokio::test]
async fn exact_multiple_ends_on_empty_page() {
    let store = Arc::new(MemoryPending::new(channels(20)));
    let remote = Arc::new(ScriptedRemote::always_ok());

    let report = retry_loop(&store, &remote, 10).run().await.unwrap();

    assert_eq!(report.pages, 2);
    assert_eq!(store.selects.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn nothing_pending_is_a_noop() {
    let store = Arc::new(MemoryPending::<Channel>::new(Vec::new()));
    let remote = Arc::new(ScriptedRemote::always_ok());

    let report = retry_loop(&store, &remote, 10).run().await.unwrap();

    assert_eq!(report.pages, 0);
    assert_eq!(remote.call_count(), 0);
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn page_is_submitted_concurrently_but_bounded() {
    let store = Arc::new(MemoryPending::new(channels(12)));
    let remote = Arc::new(ScriptedRemote::always_ok());

    retry_loop(&store, &remote, 4).run().await.unwrap();

    let max = remote.max_in_flight.load(Ordering::SeqCst);
    assert!(max > 1, "page should overlap, saw {max}");
    assert!(max <= 4, "never more than one page in flight, saw {max}");
}

#[tokio::test]
async fn permanent_failure_is_terminal() {
    let store = Arc::new(MemoryPending::new(vec![
        pending_message("m1", "messaging:general"),
        pending_message("m2", "messaging:general"),
    ]));
    let remote = Arc::new(ScriptedRemote::new(|key| {
        if key == "m1" {
            Err(ChatError::network(73, 400, "blocked words"))
        } else {
            Ok(())
        }
    }));

    let report = retry_loop(&store, &remote, 10).run().await.unwrap();
    assert_eq!(report.failed_permanently, 1);
    assert_eq!(report.completed, 1);

    let failed: Message = store.get("m1").unwrap();
    assert_eq!(failed.sync_status, SyncStatus::FailedPermanently);
    assert_eq!(
        failed.sync_description.as_deref(),
        Some("message failed moderation: blocked words")
    );
    assert!(failed.updated_locally_at.is_some());

    // Later passes never resubmit it.
    retry_loop(&store, &remote, 10).run().await.unwrap();
    assert_eq!(remote.calls_for("m1"), 1);
}

#[tokio::test]
async fn local_edit_reenters_after_permanent_failure() {
    let store = Arc::new(MemoryPending::new(vec![pending_message(
        "m1",
        "messaging:general",
    )]));
    let reject = Arc::new(ScriptedRemote::new(|_| Err(rejected())));
    retry_loop(&store, &reject, 10).run().await.unwrap();
    assert_eq!(store.status_of("m1"), Some(SyncStatus::FailedPermanently));

    let edited = store.get("m1").unwrap().mark_sync_needed();
    assert_eq!(edited.sync_description, None);
    store.upsert(edited);

    let accept = Arc::new(ScriptedRemote::always_ok());
    let report = retry_loop(&store, &accept, 10).run().await.unwrap();

    assert_eq!(report.completed, 1);
    assert_eq!(store.status_of("m1"), Some(SyncStatus::Completed));
}

#[tokio::test]
async fn transient_failure_stays_pending() {
    let store = Arc::new(MemoryPending::new(channels(3)));
    let remote = Arc::new(ScriptedRemote::new(|key| {
        if key == "messaging:c001" {
            Err(ChatError::Timeout)
        } else {
            Ok(())
        }
    }));

    let report = retry_loop(&store, &remote, 10).run().await.unwrap();

    assert_eq!(report.still_pending, 1);
    assert_eq!(store.status_of("messaging:c001"), Some(SyncStatus::SyncNeeded));
    assert_eq!(store.count(SyncStatus::Completed), 2);
}

#[tokio::test]
async fn rate_limit_is_retried_next_pass() {
    let store = Arc::new(MemoryPending::new(channels(1)));
    let limited = Arc::new(ScriptedRemote::new(|_| Err(rate_limited())));
    retry_loop(&store, &limited, 10).run().await.unwrap();
    assert_eq!(store.status_of("messaging:c000"), Some(SyncStatus::SyncNeeded));

    let accept = Arc::new(ScriptedRemote::always_ok());
    retry_loop(&store, &accept, 10).run().await.unwrap();
    assert_eq!(store.status_of("messaging:c000"), Some(SyncStatus::Completed));
}

#[tokio::test]
async fn stalled_first_page_does_not_hide_later_keys() {
    let store = Arc::new(MemoryPending::new(channels(30)));
    let remote = Arc::new(ScriptedRemote::new(|key| {
        if key < "messaging:c010" {
            Err(ChatError::Timeout)
        } else {
            Ok(())
        }
    }));

    let report = retry_loop(&store, &remote, 10).run().await.unwrap();

    assert_eq!(report.pages, 3);
    assert_eq!(report.completed, 20);
    assert_eq!(report.still_pending, 10);
    assert_eq!(remote.calls_for("messaging:c015"), 1);
    assert_eq!(store.status_of("messaging:c029"), Some(SyncStatus::Completed));
    assert_eq!(store.count(SyncStatus::SyncNeeded), 10);
}

#[tokio::test]
async fn each_entity_is_submitted_once_per_pass() {
    let store = Arc::new(MemoryPending::new(channels(30)));
    let remote = Arc::new(ScriptedRemote::new(|_| Err(ChatError::Timeout)));

    let report = retry_loop(&store, &remote, 10).run().await.unwrap();

    assert_eq!(report.pages, 3);
    assert_eq!(report.still_pending, 30);
    assert_eq!(remote.call_count(), 30);
    assert_eq!(remote.calls_for("messaging:c000"), 1);
    assert_eq!(store.count(SyncStatus::SyncNeeded), 30);

    // The next pass starts from the first key again.
    retry_loop(&store, &remote, 10).run().await.unwrap();
    assert_eq!(remote.calls_for("messaging:c000"), 2);
}

#[tokio::test]
async fn page_budget_limits_a_pass() {
    let store = Arc::new(MemoryPending::new(channels(30)));
    let remote = Arc::new(ScriptedRemote::always_ok());
    let retry = RetryLoop::new(
        "budgeted",
        store.clone() as Arc<dyn PendingStore<Channel>>,
        remote.clone() as Arc<dyn Submitter<Channel>>,
        Arc::new(DefaultErrorClassifier),
        RetryConfig {
            page_size: 10,
            max_pages: Some(2),
        },
    );

    let report = retry.run().await.unwrap();

    assert_eq!(report.pages, 2);
    assert_eq!(store.count(SyncStatus::SyncNeeded), 10);
}

#[tokio::test]
async fn duplicate_rows_are_submitted_once() {
    let store = Arc::new(MemoryPending::new(channels(3)));
    store.duplicate_rows.store(true, Ordering::SeqCst);
    let remote = Arc::new(ScriptedRemote::always_ok());

    let report = retry_loop(&store, &remote, 10).run().await.unwrap();

    assert_eq!(report.submitted, 3);
    assert_eq!(remote.calls_for("messaging:c000"), 1);
}

#[tokio::test]
async fn write_failure_aborts_pass() {
    let store = Arc::new(MemoryPending::new(channels(3)));
    store.fail_writes.store(true, Ordering::SeqCst);
    let remote = Arc::new(ScriptedRemote::always_ok());

    assert!(retry_loop(&store, &remote, 10).run().await.is_err());
    assert_eq!(store.count(SyncStatus::SyncNeeded), 3);
}

#[tokio::test]
async fn zero_page_size_is_clamped() {
    let store = Arc::new(MemoryPending::new(channels(2)));
    let remote = Arc::new(ScriptedRemote::always_ok());

    let report = retry_loop(&store, &remote, 0).run().await.unwrap();

    assert_eq!(report.completed, 2);
    assert_eq!(report.pages, 2);
}
