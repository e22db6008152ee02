// SPDX-License-Identifier: MIT

//! Standard Kubernetes status condition reasons for operator resources.
//!
//! Reasons are programmatic identifiers in CamelCase that explain why the
//! `Available` condition has a particular status. Every user-visible failure
//! manifests as one of these reasons together with a `SyncStatus` of `Failed`
//! or `Pending` and a matching metrics series.

// ============================================================================
// Condition Types
// ============================================================================

/// The single condition type carried by every resource.
pub const CONDITION_TYPE_AVAILABLE: &str = "Available";

// ============================================================================
// Zone Reasons
// ============================================================================

/// The zone is synchronized with the backend.
pub const ZONE_REASON_SYNCED: &str = "ZoneSynced";

/// Another Zone or ClusterZone already claims the same canonical name.
pub const ZONE_REASON_DUPLICATED: &str = "ZoneDuplicated";

/// The backend rejected a zone create or metadata change.
pub const ZONE_REASON_SYNC_FAILED: &str = "SynchronizationFailed";

/// The backend rejected the apex NS RRset update.
pub const ZONE_REASON_NS_SYNC_FAILED: &str = "NSSynchronizationFailed";

// ============================================================================
// RRset Reasons
// ============================================================================

/// The RRset is synchronized with the backend.
pub const RRSET_REASON_SYNCED: &str = "RrsetSynced";

/// Another RRset or ClusterRRset already claims the same FQDN and type.
pub const RRSET_REASON_DUPLICATED: &str = "RrsetDuplicated";

/// The backend rejected the RRset change.
pub const RRSET_REASON_SYNC_FAILED: &str = "SynchronizationFailed";

/// The referenced parent zone is absent or itself in failed status.
pub const RRSET_REASON_ZONE_NOT_AVAILABLE: &str = "ZoneNotAvailable";

// ============================================================================
// Condition Messages
// ============================================================================

/// Message for a successfully synchronized zone.
pub const ZONE_MESSAGE_SYNC_SUCCEEDED: &str = "Zone synchronized with PowerDNS";

/// Message for a zone quiesced because of a duplicate canonical name.
pub const ZONE_MESSAGE_DUPLICATED: &str = "Already existing Zone with the same FQDN";

/// Message for a successfully synchronized RRset.
pub const RRSET_MESSAGE_SYNC_SUCCEEDED: &str = "RRset synchronized with PowerDNS";

/// Message for an RRset quiesced because of a duplicate FQDN and type.
pub const RRSET_MESSAGE_DUPLICATED: &str = "Already existing RRset with the same FQDN and Type";

/// Message prefix when the referenced zone does not exist yet.
pub const RRSET_MESSAGE_NONEXISTENT_ZONE: &str = "Zone not yet available: ";

/// Message prefix when the referenced zone is in failed status.
pub const RRSET_MESSAGE_UNAVAILABLE_ZONE: &str = "Zone in failed status: ";
