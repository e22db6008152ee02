// SPDX-License-Identifier: MIT

//! Secondary indexes for cross-resource duplicate detection.
//!
//! The reflector stores are indexed by the backend-facing identity of each
//! resource: zones by their canonical name, rrsets by `DnsEntryName/type`.
//! A resource is indexed while its sync status is unset or `Succeeded`;
//! resources quiesced in `Failed` (or waiting in `Pending`) do not claim
//! their identity, which is what lets a duplicate be repaired by deleting
//! either contender.
//!
//! Reconciles list both sibling indexes for a key and decide on cardinality
//! alone. The brief window in which two resources both appear non-Failed is
//! tolerated; the next event for either drives convergence.

use crate::generic::{RRsetVariant, ZoneVariant};
use crate::naming::{dns_entry_name, make_canonical};
use std::sync::Arc;

/// Index key of a zone, `None` while the zone does not claim its name.
#[must_use]
pub fn zone_entry_key<Z: ZoneVariant>(zone: &Z) -> Option<String> {
    use crate::crd::SyncStatus;
    let claimed = zone
        .status()
        .and_then(|s| s.sync_status)
        .is_none_or(|s| s == SyncStatus::Succeeded);
    claimed.then(|| make_canonical(&zone.name_any()))
}

/// Index key of an rrset, `None` while the rrset does not claim its entry.
#[must_use]
pub fn rrset_entry_key<R: RRsetVariant>(rrset: &R) -> Option<String> {
    use crate::crd::SyncStatus;
    let claimed = rrset
        .status()
        .and_then(|s| s.sync_status)
        .is_none_or(|s| s == SyncStatus::Succeeded);
    claimed.then(|| format!("{}/{}", dns_entry_name(rrset.spec()), rrset.spec().r#type))
}

/// Count the zones in a store snapshot claiming the given canonical name.
#[must_use]
pub fn count_zone_entries<Z: ZoneVariant>(items: &[Arc<Z>], canonical_name: &str) -> usize {
    items
        .iter()
        .filter(|z| zone_entry_key(z.as_ref()).as_deref() == Some(canonical_name))
        .count()
}

/// Count the rrsets in a store snapshot claiming the given entry key.
#[must_use]
pub fn count_rrset_entries<R: RRsetVariant>(items: &[Arc<R>], entry_key: &str) -> usize {
    items
        .iter()
        .filter(|r| rrset_entry_key(r.as_ref()).as_deref() == Some(entry_key))
        .count()
}

/// Cardinality rule shared by zones and rrsets: an identity is duplicated
/// when more than one resource of the reconciled kind claims it, or when at
/// least one resource of each kind claims it.
#[must_use]
pub fn entry_is_duplicated(same_kind: usize, other_kind: usize) -> bool {
    same_kind > 1 || (same_kind >= 1 && other_kind >= 1)
}

#[cfg(test)]
#[path = "indexes_tests.rs"]
mod indexes_tests;
