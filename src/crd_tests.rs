// SPDX-License-Identifier: MIT

//! Unit tests for the CRD types: persisted field names, enum wire forms,
//! shared schemas between the namespaced and cluster-scoped variants.

use super::*;
use kube::CustomResourceExt;

fn zone_spec() -> ZoneSpec {
    ZoneSpec {
        kind: ZoneKind::Native,
        nameservers: vec!["ns1.example.org".to_string(), "ns2.example.org".to_string()],
        catalog: Some("catalog.example.org.".to_string()),
        soa_edit_api: Some(SoaEditApi::Epoch),
    }
}

fn rrset_spec() -> RRsetSpec {
    RRsetSpec {
        r#type: "A".to_string(),
        name: "test".to_string(),
        ttl: 300,
        records: vec!["192.0.2.1".to_string(), "192.0.2.2".to_string()],
        comment: Some("owned by team-a".to_string()),
        zone_ref: ZoneRef {
            name: "example.org".to_string(),
            kind: ZoneRefKind::Zone,
        },
    }
}

#[test]
fn test_zone_spec_persisted_field_names() {
    let json = serde_json::to_value(zone_spec()).unwrap();
    assert_eq!(json["kind"], "Native");
    assert_eq!(json["nameservers"][0], "ns1.example.org");
    assert_eq!(json["catalog"], "catalog.example.org.");
    // The SOA-EDIT-API item keeps its snake_case name and SCREAMING value.
    assert_eq!(json["soa_edit_api"], "EPOCH");
}

#[test]
fn test_soa_edit_api_defaults_to_default_policy() {
    let json = serde_json::json!({
        "kind": "Master",
        "nameservers": ["ns1.example.org"]
    });
    let spec: ZoneSpec = serde_json::from_value(json).unwrap();
    assert_eq!(spec.soa_edit_api, None);
    assert_eq!(spec.soa_edit_api.unwrap_or_default(), SoaEditApi::Default);
    assert_eq!(spec.soa_edit_api.unwrap_or_default().to_string(), "DEFAULT");
}

#[test]
fn test_zone_kind_round_trip() {
    for (kind, wire) in [
        (ZoneKind::Native, "\"Native\""),
        (ZoneKind::Master, "\"Master\""),
        (ZoneKind::Slave, "\"Slave\""),
        (ZoneKind::Producer, "\"Producer\""),
        (ZoneKind::Consumer, "\"Consumer\""),
    ] {
        assert_eq!(serde_json::to_string(&kind).unwrap(), wire);
        let parsed: ZoneKind = serde_json::from_str(wire).unwrap();
        assert_eq!(parsed, kind);
    }
}

#[test]
fn test_rrset_spec_persisted_field_names() {
    let json = serde_json::to_value(rrset_spec()).unwrap();
    assert_eq!(json["type"], "A");
    assert_eq!(json["name"], "test");
    assert_eq!(json["ttl"], 300);
    assert_eq!(json["records"][1], "192.0.2.2");
    assert_eq!(json["comment"], "owned by team-a");
    assert_eq!(json["zoneRef"]["name"], "example.org");
    assert_eq!(json["zoneRef"]["kind"], "Zone");
}

#[test]
fn test_rrset_status_persisted_field_names() {
    let status = RRsetStatus {
        last_update_time: Some("2025-06-01T12:00:00Z".to_string()),
        dns_entry_name: Some("test.example.org.".to_string()),
        sync_status: Some(SyncStatus::Succeeded),
        conditions: vec![],
        observed_generation: Some(2),
    };
    let json = serde_json::to_value(status).unwrap();
    assert_eq!(json["lastUpdateTime"], "2025-06-01T12:00:00Z");
    assert_eq!(json["dnsEntryName"], "test.example.org.");
    assert_eq!(json["syncStatus"], "Succeeded");
    assert_eq!(json["observedGeneration"], 2);
}

#[test]
fn test_zone_status_mirrors_backend_fields() {
    let status = ZoneStatus {
        id: Some("example.org.".to_string()),
        name: Some("example.org.".to_string()),
        kind: Some("Native".to_string()),
        serial: Some(2024010101),
        notified_serial: Some(2024010101),
        edited_serial: Some(2024010101),
        masters: vec![],
        dnssec: Some(false),
        catalog: Some("catalog.example.org.".to_string()),
        sync_status: Some(SyncStatus::Succeeded),
        conditions: vec![],
        observed_generation: Some(1),
    };
    let json = serde_json::to_value(status).unwrap();
    assert_eq!(json["serial"], 2024010101u32);
    assert_eq!(json["notified_serial"], 2024010101u32);
    assert_eq!(json["edited_serial"], 2024010101u32);
    assert_eq!(json["dnssec"], false);
    assert_eq!(json["syncStatus"], "Succeeded");
}

#[test]
fn test_cluster_variants_share_spec_schema() {
    // The cluster-scoped specs are transparent newtypes: same wire form.
    let namespaced = serde_json::to_value(zone_spec()).unwrap();
    let cluster = serde_json::to_value(ClusterZoneSpec(zone_spec())).unwrap();
    assert_eq!(namespaced, cluster);

    let namespaced = serde_json::to_value(rrset_spec()).unwrap();
    let cluster = serde_json::to_value(ClusterRRsetSpec(rrset_spec())).unwrap();
    assert_eq!(namespaced, cluster);
}

#[test]
fn test_crd_scopes_and_names() {
    let zone_crd = Zone::crd();
    assert_eq!(zone_crd.spec.group, "dns.cav.enablers.ob");
    assert_eq!(zone_crd.spec.scope, "Namespaced");
    assert_eq!(zone_crd.spec.names.kind, "Zone");
    assert_eq!(zone_crd.spec.versions[0].name, "v1alpha2");

    let cluster_zone_crd = ClusterZone::crd();
    assert_eq!(cluster_zone_crd.spec.scope, "Cluster");

    let rrset_crd = RRset::crd();
    assert_eq!(rrset_crd.spec.scope, "Namespaced");
    assert_eq!(rrset_crd.spec.names.kind, "RRset");

    let cluster_rrset_crd = ClusterRRset::crd();
    assert_eq!(cluster_rrset_crd.spec.scope, "Cluster");
}

#[test]
fn test_zone_printer_columns() {
    let columns = Zone::crd().spec.versions[0]
        .additional_printer_columns
        .clone()
        .unwrap_or_default();
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Serial", "ID", "Status"]);
}

#[test]
fn test_rrset_printer_columns() {
    let columns = RRset::crd().spec.versions[0]
        .additional_printer_columns
        .clone()
        .unwrap_or_default();
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Zone", "Name", "Type", "TTL", "Status", "Records"]);
}

#[test]
fn test_status_subresource_is_enabled() {
    for crd in [Zone::crd(), ClusterZone::crd(), RRset::crd(), ClusterRRset::crd()] {
        assert!(
            crd.spec.versions[0]
                .subresources
                .as_ref()
                .is_some_and(|s| s.status.is_some()),
            "{} must expose a status subresource",
            crd.spec.names.kind
        );
    }
}
