// Engine error handling, dry runs and key mapping

use tempfile::TempDir;

use s3pull::error::SyncError;
use s3pull::fs::StoreError;
use s3pull::sync::{DownloadReason, ObjectOutcome, SyncContext, SyncEngine, SyncOutcome};

use crate::memory_store::{object, MemoryStore};

#[tokio::test]
async fn test_rejected_credentials_are_fatal() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new()
        .with_object(object("a.txt", b"a"), b"a")
        .deny_listing()
        .into_arc();

    let engine = SyncEngine::new(SyncContext::new(store.clone(), "", dir.path()));
    let err = engine.run().await.unwrap_err();

    assert!(err.is_fatal());
    match err {
        SyncError::Credential { store, source } => {
            assert_eq!(store, "memory://test");
            assert!(matches!(source, StoreError::Unauthorized(_)));
        }
        other => panic!("expected credential error, got {other:?}"),
    }
    assert!(store.downloads().is_empty());
}

#[tokio::test]
async fn test_listing_failure_aborts_prefix() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new()
        .with_object(object("logs/1.txt", b"1"), b"1")
        .new_page()
        .with_object(object("logs/2.txt", b"2"), b"2")
        .fail_listing_after(1)
        .into_arc();

    let engine = SyncEngine::new(SyncContext::new(store.clone(), "logs/", dir.path()));
    let err = engine.run().await.unwrap_err();

    assert!(!err.is_fatal());
    match err {
        SyncError::Listing { prefix, .. } => assert_eq!(prefix, "logs/"),
        other => panic!("expected listing error, got {other:?}"),
    }
    // The first page was processed before the failure; the second never arrived.
    assert_eq!(store.downloads(), vec!["logs/1.txt".to_string()]);
    assert!(!dir.path().join("2.txt").exists());
    assert_eq!(store.list_calls(), 1);
}

#[tokio::test]
async fn test_unsafe_key_is_isolated() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("mirror");
    let store = MemoryStore::new()
        .with_object(object("../escape.txt", b"x"), b"x")
        .with_object(object("safe.txt", b"ok"), b"ok")
        .into_arc();

    let report = SyncEngine::new(SyncContext::new(store.clone(), "", &root))
        .run()
        .await
        .unwrap();

    assert_eq!(report.outcome(), SyncOutcome::CompletedWithFailures);
    assert_eq!(report.failures[0].key, "../escape.txt");
    assert!(!dir.path().join("escape.txt").exists());
    assert!(root.join("safe.txt").is_file());
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new()
        .with_object(object("docs/a.txt", b"a"), b"a")
        .with_object(object("docs/sub/b.txt", b"b"), b"b")
        .into_arc();

    let context = SyncContext::new(store.clone(), "docs/", dir.path()).with_dry_run(true);
    let report = SyncEngine::new(context).run().await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.stats.files_pending, 2);
    assert_eq!(report.stats.files_downloaded, 0);
    assert!(store.downloads().is_empty());
    assert!(!dir.path().join("sub").exists());
}

#[tokio::test]
async fn test_process_reports_missing_object() {
    let dir = TempDir::new().unwrap();
    // Listed but gone by the time it is fetched.
    let store = MemoryStore::new()
        .with_listed(object("gone.txt", b"x"))
        .into_arc();

    let engine = SyncEngine::new(SyncContext::new(store.clone(), "", dir.path()));
    let outcome = engine.process(&object("gone.txt", b"x")).await;

    match outcome {
        ObjectOutcome::Failed(message) => assert!(message.contains("gone.txt")),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_process_dry_run_reason() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new().into_arc();

    let context = SyncContext::new(store, "", dir.path()).with_dry_run(true);
    let outcome = SyncEngine::new(context).process(&object("a.txt", b"a")).await;

    assert_eq!(outcome, ObjectOutcome::WouldDownload(DownloadReason::Missing));
}
