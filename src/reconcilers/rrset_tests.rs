// SPDX-License-Identifier: MIT

//! Unit tests for the rrset backend synchronization and the identity rule.

use super::{rrset_is_identical_to_external, sync_rrset_external};
use crate::crd::{RRsetSpec, SyncStatus, ZoneRef, ZoneRefKind};
use crate::naming::dns_entry_name;
use crate::pdns::mock::MockPdns;
use crate::pdns::{self, PdnsClient, PdnsError, RecordsApi, ZonesApi};
use crate::status_reasons::RRSET_REASON_SYNC_FAILED;
use std::sync::Arc;

fn rrset_spec() -> RRsetSpec {
    RRsetSpec {
        r#type: "A".to_string(),
        name: "test".to_string(),
        ttl: 300,
        records: vec!["127.0.0.1".to_string(), "127.0.0.2".to_string()],
        comment: None,
        zone_ref: ZoneRef {
            name: "example2.org".to_string(),
            kind: ZoneRefKind::Zone,
        },
    }
}

fn client(mock: &Arc<MockPdns>) -> PdnsClient {
    let zones: Arc<dyn ZonesApi> = mock.clone();
    let records: Arc<dyn RecordsApi> = mock.clone();
    PdnsClient { zones, records }
}

fn seed_zone(mock: &MockPdns, name: &str) {
    let mut state = mock.state.lock().unwrap();
    state.zones.insert(
        name.to_string(),
        pdns::Zone {
            id: Some(name.to_string()),
            name: Some(name.to_string()),
            kind: Some("Native".to_string()),
            serial: Some(2024010101),
            ..pdns::Zone::default()
        },
    );
}

fn external_rrset(name: &str, rtype: &str, ttl: u32, records: &[&str]) -> pdns::Rrset {
    pdns::Rrset {
        name: name.to_string(),
        rtype: rtype.to_string(),
        ttl: Some(ttl),
        changetype: None,
        records: records
            .iter()
            .map(|content| pdns::Record {
                content: (*content).to_string(),
                disabled: false,
            })
            .collect(),
        comments: Vec::new(),
    }
}

#[tokio::test]
async fn test_sync_creates_missing_rrset_and_bumps_serial() {
    let mock = Arc::new(MockPdns::new());
    seed_zone(&mock, "example2.org.");
    let pdns = client(&mock);

    let spec = rrset_spec();
    let entry_name = dns_entry_name(&spec);
    assert_eq!(entry_name, "test.example2.org.");

    let serial_before = mock.zone_serial("example2.org.").unwrap();
    let outcome = sync_rrset_external(&spec, &entry_name, "example2.org.", &pdns)
        .await
        .unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.sync_status, SyncStatus::Succeeded);
    assert_eq!(mock.call_count("records.change"), 1);
    assert_eq!(
        mock.zone_serial("example2.org.").unwrap(),
        serial_before + 1,
        "a record change must move the zone serial"
    );

    let state = mock.state.lock().unwrap();
    let written = state
        .rrsets
        .get(&(
            "example2.org.".to_string(),
            "test.example2.org.".to_string(),
            "A".to_string(),
        ))
        .unwrap();
    assert_eq!(written.ttl, Some(300));
    let contents: Vec<&str> = written.records.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(contents, vec!["127.0.0.1", "127.0.0.2"]);
}

#[tokio::test]
async fn test_sync_is_noop_when_backend_matches() {
    let mock = Arc::new(MockPdns::new());
    seed_zone(&mock, "example2.org.");
    let pdns = client(&mock);

    let spec = rrset_spec();
    let entry_name = dns_entry_name(&spec);
    sync_rrset_external(&spec, &entry_name, "example2.org.", &pdns)
        .await
        .unwrap();
    let serial_before = mock.zone_serial("example2.org.").unwrap();

    let outcome = sync_rrset_external(&spec, &entry_name, "example2.org.", &pdns)
        .await
        .unwrap();

    assert!(!outcome.changed);
    assert_eq!(outcome.sync_status, SyncStatus::Succeeded);
    assert_eq!(mock.call_count("records.change"), 1, "no second change issued");
    assert_eq!(mock.zone_serial("example2.org.").unwrap(), serial_before);
}

#[tokio::test]
async fn test_sync_replaces_on_comment_drift() {
    let mock = Arc::new(MockPdns::new());
    seed_zone(&mock, "example2.org.");
    let pdns = client(&mock);

    let spec = rrset_spec();
    let entry_name = dns_entry_name(&spec);
    sync_rrset_external(&spec, &entry_name, "example2.org.", &pdns)
        .await
        .unwrap();

    let mut commented = rrset_spec();
    commented.comment = Some("managed by team-a".to_string());
    let outcome = sync_rrset_external(&commented, &entry_name, "example2.org.", &pdns)
        .await
        .unwrap();

    assert!(outcome.changed);
    assert_eq!(mock.call_count("records.change"), 2);

    let state = mock.state.lock().unwrap();
    let written = state
        .rrsets
        .get(&(
            "example2.org.".to_string(),
            "test.example2.org.".to_string(),
            "A".to_string(),
        ))
        .unwrap();
    assert_eq!(written.comments[0].content, "managed by team-a");
    assert_eq!(
        written.comments[0].account.as_deref(),
        Some("powerdns-operator")
    );
}

#[tokio::test]
async fn test_sync_surfaces_validation_error_verbatim() {
    let mock = Arc::new(MockPdns::new());
    seed_zone(&mock, "example2.org.");
    mock.state.lock().unwrap().records_change_error = Some(PdnsError::Validation(
        "Record 127.0.0.1/AA: unknown type".to_string(),
    ));
    let pdns = client(&mock);

    let mut spec = rrset_spec();
    spec.r#type = "AA".to_string();
    let entry_name = dns_entry_name(&spec);

    let outcome = sync_rrset_external(&spec, &entry_name, "example2.org.", &pdns)
        .await
        .unwrap();

    assert!(!outcome.changed);
    assert_eq!(outcome.sync_status, SyncStatus::Failed);
    assert!(!outcome.available);
    assert_eq!(outcome.reason, RRSET_REASON_SYNC_FAILED);
    assert_eq!(outcome.message, "Record 127.0.0.1/AA: unknown type");

    let state = mock.state.lock().unwrap();
    assert!(
        state.rrsets.is_empty(),
        "no record may be written on validation failure"
    );
}

#[tokio::test]
async fn test_sync_propagates_transport_errors() {
    let mock = Arc::new(MockPdns::new());
    seed_zone(&mock, "example2.org.");
    mock.state.lock().unwrap().records_change_error =
        Some(PdnsError::Transport("connection refused".to_string()));
    let pdns = client(&mock);

    let spec = rrset_spec();
    let entry_name = dns_entry_name(&spec);
    let err = sync_rrset_external(&spec, &entry_name, "example2.org.", &pdns)
        .await
        .unwrap_err();
    assert!(matches!(err, PdnsError::Transport(_)));
}

#[test]
fn test_identity_accepts_matching_rrset_without_comments() {
    let spec = rrset_spec();
    let external = external_rrset("test.example2.org.", "A", 300, &["127.0.0.1", "127.0.0.2"]);
    assert!(rrset_is_identical_to_external(
        &spec,
        "test.example2.org.",
        &external
    ));
}

#[test]
fn test_identity_accepts_matching_comment_content() {
    let mut spec = rrset_spec();
    spec.comment = Some("hello".to_string());
    let mut external = external_rrset("test.example2.org.", "A", 300, &["127.0.0.1", "127.0.0.2"]);
    external.comments = vec![pdns::Comment {
        content: "hello".to_string(),
        account: Some("powerdns-operator".to_string()),
        modified_at: None,
    }];
    assert!(rrset_is_identical_to_external(
        &spec,
        "test.example2.org.",
        &external
    ));
}

#[test]
fn test_identity_rejects_comment_presence_mismatch() {
    let spec = rrset_spec();
    let mut external = external_rrset("test.example2.org.", "A", 300, &["127.0.0.1", "127.0.0.2"]);
    external.comments = vec![pdns::Comment {
        content: "left over".to_string(),
        account: None,
        modified_at: None,
    }];
    assert!(!rrset_is_identical_to_external(
        &spec,
        "test.example2.org.",
        &external
    ));

    let mut commented = rrset_spec();
    commented.comment = Some("wanted".to_string());
    let bare = external_rrset("test.example2.org.", "A", 300, &["127.0.0.1", "127.0.0.2"]);
    assert!(!rrset_is_identical_to_external(
        &commented,
        "test.example2.org.",
        &bare
    ));
}

#[test]
fn test_identity_is_order_sensitive_on_records() {
    let spec = rrset_spec();
    let external = external_rrset("test.example2.org.", "A", 300, &["127.0.0.2", "127.0.0.1"]);
    assert!(!rrset_is_identical_to_external(
        &spec,
        "test.example2.org.",
        &external
    ));
}

#[test]
fn test_identity_rejects_ttl_drift() {
    let spec = rrset_spec();
    let external = external_rrset("test.example2.org.", "A", 600, &["127.0.0.1", "127.0.0.2"]);
    assert!(!rrset_is_identical_to_external(
        &spec,
        "test.example2.org.",
        &external
    ));
}

#[test]
fn test_identity_rejects_adjacent_entry_names() {
    // The backend over-reports adjacent RRsets on GET; an entry with another
    // canonical name must never count as "ours", whatever else matches.
    let spec = rrset_spec();
    let external = external_rrset("other.example2.org.", "A", 300, &["127.0.0.1", "127.0.0.2"]);
    assert!(!rrset_is_identical_to_external(
        &spec,
        "test.example2.org.",
        &external
    ));
}
