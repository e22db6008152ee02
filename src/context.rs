// SPDX-License-Identifier: MIT

//! Shared context for all controllers with reflector stores.
//!
//! All controllers receive an `Arc<Context>` that contains:
//! - Kubernetes client
//! - Reflector stores for the four CRD types
//! - The PowerDNS backend client
//!
//! The stores back the secondary indexes of [`crate::indexes`]: duplicate
//! detection reads a store snapshot instead of issuing API queries from
//! inside a reconcile.

use crate::crd::{ClusterRRset, ClusterZone, RRset, Zone};
use crate::indexes::{count_rrset_entries, count_zone_entries};
use crate::pdns::PdnsClient;
use kube::runtime::reflector::Store;
use kube::Client;

/// Shared context passed to all controllers.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,

    /// Reflector stores for all CRD types
    pub stores: Stores,

    /// PowerDNS backend client
    pub pdns: PdnsClient,
}

/// Collection of all reflector stores for cross-controller queries.
///
/// Each store is populated by its controller's own watcher and provides
/// in-memory access to resources without API calls.
#[derive(Clone)]
pub struct Stores {
    pub zones: Store<Zone>,
    pub cluster_zones: Store<ClusterZone>,
    pub rrsets: Store<RRset>,
    pub cluster_rrsets: Store<ClusterRRset>,
}

impl Stores {
    /// Count the entries of both zone indexes claiming a canonical name.
    ///
    /// Returns `(zones, cluster_zones)` cardinalities.
    #[must_use]
    pub fn zone_entries(&self, canonical_name: &str) -> (usize, usize) {
        (
            count_zone_entries(&self.zones.state(), canonical_name),
            count_zone_entries(&self.cluster_zones.state(), canonical_name),
        )
    }

    /// Count the entries of both rrset indexes claiming an entry key
    /// ("DnsEntryName/type").
    ///
    /// Returns `(rrsets, cluster_rrsets)` cardinalities.
    #[must_use]
    pub fn rrset_entries(&self, entry_key: &str) -> (usize, usize) {
        (
            count_rrset_entries(&self.rrsets.state(), entry_key),
            count_rrset_entries(&self.cluster_rrsets.state(), entry_key),
        )
    }
}
