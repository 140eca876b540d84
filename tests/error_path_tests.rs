//! Tests for error paths and edge cases
//!
//! These tests verify that nothing destructive happens when a purge should
//! not run:
//! - Unknown metrics
//! - Transport failures during resolution
//! - Operator declines or closes the prompt
//! - Invalid windows

mod common;

use common::*;
use std::io::Cursor;
use std::sync::Arc;
use tspurge::config::SchemaConfig;
use tspurge::confirm::{AssumeYes, ConfirmationGate};
use tspurge::purge::{NoopReporter, PurgeMode, PurgeStatus};
use tspurge::session::{PurgeRequest, PurgeSession};
use tspurge::store::MemoryStore;
use tspurge::Error;

fn request(metrics: &[&str], mode: PurgeMode) -> PurgeRequest {
    PurgeRequest::new(
        metrics.iter().map(|m| m.to_string()).collect(),
        BASE,
        BASE + 3 * HOUR,
        mode,
    )
    .unwrap()
}

#[tokio::test]
async fn test_unknown_metric_never_scans() {
    let store = MemoryStore::new();
    seed_hours(&store, &uid(0x2A), 4);
    let session = PurgeSession::new(Arc::new(store.clone()), SchemaConfig::default());

    let err = session
        .run(
            &request(&["does.not.exist"], PurgeMode::Destructive),
            &mut AssumeYes,
            &NoopReporter,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MetricNotFound { ref name } if name == "does.not.exist"));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(store.stats().scans(), 0);
    assert_eq!(store.row_count(DATA_TABLE), 4);
}

#[tokio::test]
async fn test_one_unknown_metric_blocks_the_whole_request() {
    let store = MemoryStore::new();
    let cpu = uid(0x2A);
    register_metric(&store, "sys.cpu.user", &cpu);
    seed_hours(&store, &cpu, 4);
    let session = PurgeSession::new(Arc::new(store.clone()), SchemaConfig::default());

    let result = session
        .run(
            &request(&["sys.cpu.user", "typo.metric"], PurgeMode::Destructive),
            &mut AssumeYes,
            &NoopReporter,
        )
        .await;

    assert!(matches!(result, Err(Error::MetricNotFound { .. })));
    assert_eq!(store.stats().scans(), 0);
    assert_eq!(store.row_count(DATA_TABLE), 4);
}

#[tokio::test]
async fn test_lookup_transport_error_surfaces_unchanged() {
    let inner = MemoryStore::new();
    register_metric(&inner, "sys.cpu.user", &uid(0x2A));
    let mut faulty = FaultyStore::new(inner.clone());
    faulty.fail_lookup = true;
    let session = PurgeSession::new(Arc::new(faulty), SchemaConfig::default());

    let err = session
        .run(
            &request(&["sys.cpu.user"], PurgeMode::Destructive),
            &mut AssumeYes,
            &NoopReporter,
        )
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert!(session.resolver().cache().is_empty());
    assert_eq!(inner.stats().scans(), 0);
}

#[tokio::test]
async fn test_declining_skips_scan_and_delete() {
    let store = MemoryStore::new();
    let cpu = uid(0x2A);
    register_metric(&store, "sys.cpu.user", &cpu);
    seed_hours(&store, &cpu, 4);
    let session = PurgeSession::new(Arc::new(store.clone()), SchemaConfig::default());
    let mut gate = ConfirmationGate::new(Cursor::new(b"n\n".to_vec()), Vec::new());

    let report = session
        .run(
            &request(&["sys.cpu.user"], PurgeMode::Destructive),
            &mut gate,
            &NoopReporter,
        )
        .await
        .unwrap();

    assert!(report.declined());
    assert!(matches!(report.outcomes[0].status, PurgeStatus::AbortedByUser));
    assert_eq!(store.stats().scans(), 0);
    assert_eq!(store.stats().deletes(), 0);

    let err = report.into_result().unwrap_err();
    assert!(matches!(err, Error::UserAborted));
    assert_eq!(err.exit_code(), 4);
}

#[tokio::test]
async fn test_closed_prompt_is_an_error_not_a_yes() {
    let store = MemoryStore::new();
    let cpu = uid(0x2A);
    register_metric(&store, "sys.cpu.user", &cpu);
    seed_hours(&store, &cpu, 2);
    let session = PurgeSession::new(Arc::new(store.clone()), SchemaConfig::default());
    let mut gate = ConfirmationGate::new(Cursor::new(b"sure\n".to_vec()), Vec::new());

    let err = session
        .run(
            &request(&["sys.cpu.user"], PurgeMode::Destructive),
            &mut gate,
            &NoopReporter,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Io(_)));
    assert_eq!(store.stats().scans(), 0);
    assert_eq!(store.row_count(DATA_TABLE), 2);
}

#[tokio::test]
async fn test_dry_run_does_not_prompt() {
    let store = MemoryStore::new();
    let cpu = uid(0x2A);
    register_metric(&store, "sys.cpu.user", &cpu);
    seed_hours(&store, &cpu, 2);
    let session = PurgeSession::new(Arc::new(store.clone()), SchemaConfig::default());
    // Empty input would fail if the gate were consulted.
    let mut gate = ConfirmationGate::new(Cursor::new(Vec::new()), Vec::new());

    let report = session
        .run(&request(&["sys.cpu.user"], PurgeMode::DryRun), &mut gate, &NoopReporter)
        .await
        .unwrap();

    assert_eq!(report.total_rows(), 2);
    let (_, prompt) = gate.into_inner();
    assert!(prompt.is_empty());
}

#[tokio::test]
async fn test_wrong_width_uid_is_rejected_before_scan() {
    let store = MemoryStore::new();
    store.put(UID_TABLE, b"sys.cpu.user", "id", "metrics", &[0x2A]);
    let session = PurgeSession::new(Arc::new(store.clone()), SchemaConfig::default());

    let err = session
        .run(
            &request(&["sys.cpu.user"], PurgeMode::DryRun),
            &mut AssumeYes,
            &NoopReporter,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidUid { actual: 1, .. }));
    assert_eq!(store.stats().scans(), 0);
}

#[test]
fn test_invalid_windows_are_usage_errors() {
    for (start, end) in [(10, 5), (-3600, 0), (0, -1)] {
        let err = PurgeRequest::new(vec!["m".into()], start, end, PurgeMode::DryRun).unwrap_err();
        assert_eq!(err.exit_code(), 2, "start={start} end={end}");
    }
}

#[tokio::test]
async fn test_empty_range_completes_with_zero_rows() {
    let store = MemoryStore::new();
    let cpu = uid(0x2A);
    register_metric(&store, "sys.cpu.user", &cpu);
    seed_hours(&store, &cpu, 2);
    let session = PurgeSession::new(Arc::new(store.clone()), SchemaConfig::default());

    let request = PurgeRequest::new(
        vec!["sys.cpu.user".into()],
        BASE + 10 * HOUR,
        BASE + 12 * HOUR,
        PurgeMode::Destructive,
    )
    .unwrap();
    let report = session
        .run(&request, &mut AssumeYes, &NoopReporter)
        .await
        .unwrap();

    assert_eq!(report.total_rows(), 0);
    assert!(report.outcomes[0].status.is_completed());
    assert_eq!(store.row_count(DATA_TABLE), 2);
}
