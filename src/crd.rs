// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for PowerDNS management.
//!
//! This module defines the four resource shapes reconciled by the operator:
//!
//! - [`Zone`] - namespace-scoped DNS zone
//! - [`ClusterZone`] - cluster-scoped DNS zone
//! - [`RRset`] - namespace-scoped resource record set
//! - [`ClusterRRset`] - cluster-scoped resource record set
//!
//! The namespaced and cluster-scoped variants of each pair share their spec
//! and status schemas; the cluster-scoped spec is a transparent newtype so a
//! single [`ZoneSpec`]/[`RRsetSpec`] definition serves both kinds.
//!
//! # Example: Creating a Zone
//!
//! ```yaml
//! apiVersion: dns.cav.enablers.ob/v1alpha2
//! kind: Zone
//! metadata:
//!   name: example.org
//!   namespace: default
//! spec:
//!   kind: Native
//!   nameservers:
//!     - ns1.example.org
//!     - ns2.example.org
//!   catalog: catalog.example.org.
//! ```
//!
//! # Example: Creating an RRset
//!
//! ```yaml
//! apiVersion: dns.cav.enablers.ob/v1alpha2
//! kind: RRset
//! metadata:
//!   name: test.example.org
//!   namespace: default
//! spec:
//!   type: A
//!   name: test
//!   ttl: 300
//!   records:
//!     - "192.0.2.1"
//!   zoneRef:
//!     name: example.org
//!     kind: Zone
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// Kind of a zone as understood by the PowerDNS backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ZoneKind {
    /// Zone served from the backend's own database, replicated natively.
    Native,
    /// Primary zone, notifying secondaries on change.
    Master,
    /// Secondary zone, transferred from configured masters.
    Slave,
    /// Catalog zone producer.
    Producer,
    /// Catalog zone consumer.
    Consumer,
}

impl fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ZoneKind::Native => "Native",
            ZoneKind::Master => "Master",
            ZoneKind::Slave => "Slave",
            ZoneKind::Producer => "Producer",
            ZoneKind::Consumer => "Consumer",
        };
        f.write_str(s)
    }
}

/// SOA-EDIT-API policy controlling how the backend recomputes the zone's SOA
/// serial after an API-driven change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SoaEditApi {
    /// YYYYMMDDnn serials.
    #[default]
    Default,
    /// Bump the serial by one.
    Increase,
    /// UNIX seconds.
    Epoch,
}

impl fmt::Display for SoaEditApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SoaEditApi::Default => "DEFAULT",
            SoaEditApi::Increase => "INCREASE",
            SoaEditApi::Epoch => "EPOCH",
        };
        f.write_str(s)
    }
}

/// Summary verdict of the reconciler for one resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum SyncStatus {
    /// The backend reflects the declared state.
    Succeeded,
    /// The resource is quiesced with a terminal condition.
    Failed,
    /// The resource waits on a dependency (e.g. its parent zone).
    Pending,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncStatus::Succeeded => "Succeeded",
            SyncStatus::Failed => "Failed",
            SyncStatus::Pending => "Pending",
        };
        f.write_str(s)
    }
}

/// Condition represents an observation of a resource's current state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition. The operator only writes `Available`.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another
    /// (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// `Zone` defines a DNS zone registered with the PowerDNS backend.
///
/// The zone's fully qualified name on the backend is derived from the
/// resource's own metadata name; the spec carries the backend-facing
/// attributes (kind, nameservers, catalog membership, serial policy).
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dns.cav.enablers.ob",
    version = "v1alpha2",
    kind = "Zone",
    namespaced,
    status = "ZoneStatus",
    printcolumn = r#"{"name":"Serial","type":"integer","jsonPath":".status.serial"}"#,
    printcolumn = r#"{"name":"ID","type":"string","jsonPath":".status.id"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.syncStatus"}"#
)]
pub struct ZoneSpec {
    /// Kind of the zone, one of "Native", "Master", "Slave", "Producer",
    /// "Consumer".
    pub kind: ZoneKind,

    /// List of the nameservers of the zone.
    #[schemars(length(min = 1))]
    pub nameservers: Vec<String>,

    /// The catalog this zone is a member of.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,

    /// The SOA-EDIT-API metadata item, one of "DEFAULT", "INCREASE",
    /// "EPOCH"; defaults to "DEFAULT".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soa_edit_api: Option<SoaEditApi>,
}

/// `ClusterZone` is the cluster-scoped flavor of [`Zone`], sharing its spec
/// and status schemas.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dns.cav.enablers.ob",
    version = "v1alpha2",
    kind = "ClusterZone",
    status = "ZoneStatus",
    printcolumn = r#"{"name":"Serial","type":"integer","jsonPath":".status.serial"}"#,
    printcolumn = r#"{"name":"ID","type":"string","jsonPath":".status.id"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.syncStatus"}"#
)]
#[serde(transparent)]
pub struct ClusterZoneSpec(pub ZoneSpec);

impl Deref for ClusterZoneSpec {
    type Target = ZoneSpec;

    fn deref(&self) -> &ZoneSpec {
        &self.0
    }
}

/// `ZoneStatus` mirrors the authoritative view the backend reports for the
/// zone, plus the reconciler's own bookkeeping.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ZoneStatus {
    /// Opaque zone id assigned by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Canonical name of the zone (e.g. "example.org.").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Kind of the zone as reported by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// The SOA serial number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<u32>,

    /// The SOA serial notifications have been sent out for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notified_serial: Option<u32>,

    /// The SOA serial as seen in query responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_serial: Option<u32>,

    /// IP addresses configured as masters for this zone ("Slave" kind only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub masters: Vec<String>,

    /// Whether or not this zone is DNSSEC signed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnssec: Option<bool>,

    /// The catalog this zone is a member of.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,

    /// The reconciler's summary verdict.
    #[serde(rename = "syncStatus", skip_serializing_if = "Option::is_none")]
    pub sync_status: Option<SyncStatus>,

    /// Standard conditions; the operator maintains `Available`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// The generation the reconciler last acted upon.
    #[serde(rename = "observedGeneration", skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

/// Typed reference from an RRset to its parent zone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ZoneRef {
    /// Name of the zone resource.
    pub name: String,

    /// Kind of the zone resource (Zone or ClusterZone).
    pub kind: ZoneRefKind,
}

/// Kind discriminator for [`ZoneRef`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ZoneRefKind {
    /// Namespace-scoped zone in the RRset's own namespace.
    Zone,
    /// Cluster-scoped zone.
    ClusterZone,
}

/// `RRset` defines one resource record set of one type within a parent zone.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dns.cav.enablers.ob",
    version = "v1alpha2",
    kind = "RRset",
    namespaced,
    status = "RRsetStatus",
    printcolumn = r#"{"name":"Zone","type":"string","jsonPath":".spec.zoneRef.name"}"#,
    printcolumn = r#"{"name":"Name","type":"string","jsonPath":".status.dnsEntryName"}"#,
    printcolumn = r#"{"name":"Type","type":"string","jsonPath":".spec.type"}"#,
    printcolumn = r#"{"name":"TTL","type":"integer","jsonPath":".spec.ttl"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.syncStatus"}"#,
    printcolumn = r#"{"name":"Records","type":"string","jsonPath":".spec.records"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct RRsetSpec {
    /// Type of the record (e.g. "A", "PTR", "MX").
    pub r#type: String,

    /// Name of the record. Bare labels are completed with the parent zone's
    /// name; `@` denotes the zone apex; a trailing dot makes the name
    /// authoritative as written. Immutable after creation.
    pub name: String,

    /// DNS TTL of the records, in seconds.
    pub ttl: u32,

    /// All records in this Resource Record Set.
    pub records: Vec<String>,

    /// Comment on RRSet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// ZoneRef reference the zone the RRSet depends on.
    pub zone_ref: ZoneRef,
}

/// `ClusterRRset` is the cluster-scoped flavor of [`RRset`]. It can only
/// reference a [`ClusterZone`] parent since it carries no namespace.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dns.cav.enablers.ob",
    version = "v1alpha2",
    kind = "ClusterRRset",
    status = "RRsetStatus",
    printcolumn = r#"{"name":"Zone","type":"string","jsonPath":".spec.zoneRef.name"}"#,
    printcolumn = r#"{"name":"Name","type":"string","jsonPath":".status.dnsEntryName"}"#,
    printcolumn = r#"{"name":"Type","type":"string","jsonPath":".spec.type"}"#,
    printcolumn = r#"{"name":"TTL","type":"integer","jsonPath":".spec.ttl"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.syncStatus"}"#,
    printcolumn = r#"{"name":"Records","type":"string","jsonPath":".spec.records"}"#
)]
#[serde(transparent)]
pub struct ClusterRRsetSpec(pub RRsetSpec);

impl Deref for ClusterRRsetSpec {
    type Target = RRsetSpec;

    fn deref(&self) -> &RRsetSpec {
        &self.0
    }
}

/// `RRsetStatus` carries the reconciler's bookkeeping for an RRset.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RRsetStatus {
    /// Timestamp of the last applied backend change (RFC3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<String>,

    /// The computed canonical DNS entry name of this RRset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_entry_name: Option<String>,

    /// The reconciler's summary verdict.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_status: Option<SyncStatus>,

    /// Standard conditions; the operator maintains `Available`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// The generation the reconciler last acted upon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
