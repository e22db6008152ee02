// SPDX-License-Identifier: MIT

//! Uniform access to the namespaced and cluster-scoped resource variants.
//!
//! The four concrete shapes reduce to two behavioral variants: anything
//! zone-shaped implements [`ZoneVariant`], anything rrset-shaped implements
//! [`RRsetVariant`]. The reconcile cores are written once against these
//! traits; each concrete type contributes a small adaptor (spec/status
//! access, a correctly scoped [`Api`], and its own metrics family).

use crate::crd::{
    ClusterRRset, ClusterZone, RRset, RRsetSpec, RRsetStatus, SyncStatus, Zone, ZoneRef,
    ZoneRefKind, ZoneSpec, ZoneStatus,
};
use crate::metrics;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Common bounds every reconciled resource satisfies.
pub trait ReconciledResource:
    Resource<DynamicType = ()>
    + ResourceExt
    + Clone
    + std::fmt::Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// An [`Api`] handle scoped like the resource itself.
    fn api(&self, client: Client) -> Api<Self>;
}

/// Zone-shaped resources: [`Zone`] and [`ClusterZone`].
pub trait ZoneVariant: ReconciledResource {
    /// The shared zone spec.
    fn spec(&self) -> &ZoneSpec;

    /// The shared zone status, if any was written yet.
    fn status(&self) -> Option<&ZoneStatus>;

    /// Cardinality of both zone indexes for a canonical name, the reconciled
    /// kind first.
    fn duplicate_counts(stores: &crate::context::Stores, canonical_name: &str) -> (usize, usize);

    /// Write this resource's series in its own gauge family.
    fn update_status_metric(&self, status: SyncStatus);

    /// Tear this resource's series down.
    fn remove_status_metric(&self);
}

/// RRset-shaped resources: [`RRset`] and [`ClusterRRset`].
pub trait RRsetVariant: ReconciledResource {
    /// The shared rrset spec.
    fn spec(&self) -> &RRsetSpec;

    /// The shared rrset status, if any was written yet.
    fn status(&self) -> Option<&RRsetStatus>;

    /// Cardinality of both rrset indexes for an entry key, the reconciled
    /// kind first.
    fn duplicate_counts(stores: &crate::context::Stores, entry_key: &str) -> (usize, usize);

    /// Write this resource's series in its own gauge family.
    fn update_status_metric(&self, fqdn: &str, status: SyncStatus);

    /// Tear this resource's series down.
    fn remove_status_metric(&self);
}

impl ReconciledResource for Zone {
    fn api(&self, client: Client) -> Api<Self> {
        Api::namespaced(client, &self.namespace().unwrap_or_default())
    }
}

impl ZoneVariant for Zone {
    fn spec(&self) -> &ZoneSpec {
        &self.spec
    }

    fn status(&self) -> Option<&ZoneStatus> {
        self.status.as_ref()
    }

    fn duplicate_counts(stores: &crate::context::Stores, canonical_name: &str) -> (usize, usize) {
        stores.zone_entries(canonical_name)
    }

    fn update_status_metric(&self, status: SyncStatus) {
        metrics::update_zone_status(
            &self.name_any(),
            &self.namespace().unwrap_or_default(),
            status,
        );
    }

    fn remove_status_metric(&self) {
        metrics::remove_zone_status(&self.name_any(), &self.namespace().unwrap_or_default());
    }
}

impl ReconciledResource for ClusterZone {
    fn api(&self, client: Client) -> Api<Self> {
        Api::all(client)
    }
}

impl ZoneVariant for ClusterZone {
    fn spec(&self) -> &ZoneSpec {
        &self.spec.0
    }

    fn status(&self) -> Option<&ZoneStatus> {
        self.status.as_ref()
    }

    fn duplicate_counts(stores: &crate::context::Stores, canonical_name: &str) -> (usize, usize) {
        let (zones, cluster_zones) = stores.zone_entries(canonical_name);
        (cluster_zones, zones)
    }

    fn update_status_metric(&self, status: SyncStatus) {
        metrics::update_cluster_zone_status(&self.name_any(), status);
    }

    fn remove_status_metric(&self) {
        metrics::remove_cluster_zone_status(&self.name_any());
    }
}

impl ReconciledResource for RRset {
    fn api(&self, client: Client) -> Api<Self> {
        Api::namespaced(client, &self.namespace().unwrap_or_default())
    }
}

impl RRsetVariant for RRset {
    fn spec(&self) -> &RRsetSpec {
        &self.spec
    }

    fn status(&self) -> Option<&RRsetStatus> {
        self.status.as_ref()
    }

    fn duplicate_counts(stores: &crate::context::Stores, entry_key: &str) -> (usize, usize) {
        stores.rrset_entries(entry_key)
    }

    fn update_status_metric(&self, fqdn: &str, status: SyncStatus) {
        metrics::update_rrset_status(
            fqdn,
            &self.spec.r#type,
            status,
            &self.name_any(),
            &self.namespace().unwrap_or_default(),
        );
    }

    fn remove_status_metric(&self) {
        metrics::remove_rrset_status(&self.name_any(), &self.namespace().unwrap_or_default());
    }
}

impl ReconciledResource for ClusterRRset {
    fn api(&self, client: Client) -> Api<Self> {
        Api::all(client)
    }
}

impl RRsetVariant for ClusterRRset {
    fn spec(&self) -> &RRsetSpec {
        &self.spec.0
    }

    fn status(&self) -> Option<&RRsetStatus> {
        self.status.as_ref()
    }

    fn duplicate_counts(stores: &crate::context::Stores, entry_key: &str) -> (usize, usize) {
        let (rrsets, cluster_rrsets) = stores.rrset_entries(entry_key);
        (cluster_rrsets, rrsets)
    }

    fn update_status_metric(&self, fqdn: &str, status: SyncStatus) {
        metrics::update_cluster_rrset_status(fqdn, &self.spec.r#type, status, &self.name_any());
    }

    fn remove_status_metric(&self) {
        metrics::remove_cluster_rrset_status(&self.name_any());
    }
}

/// A resolved parent zone of an RRset, either variant.
pub enum ParentZone {
    Zone(Zone),
    ClusterZone(ClusterZone),
}

impl ParentZone {
    /// Resolve the referenced parent.
    ///
    /// A `Zone` reference resolves in the RRset's own namespace; a resource
    /// without a namespace (a `ClusterRRset`) therefore can never resolve a
    /// namespaced `Zone` and only `ClusterZone` references are meaningful for
    /// it. `Ok(None)` means the parent does not exist.
    ///
    /// # Errors
    ///
    /// Returns the underlying API error for anything but a missing parent.
    pub async fn resolve(
        client: &Client,
        zone_ref: &ZoneRef,
        namespace: Option<&str>,
    ) -> Result<Option<ParentZone>, kube::Error> {
        match zone_ref.kind {
            ZoneRefKind::Zone => {
                let Some(ns) = namespace else {
                    return Ok(None);
                };
                let api: Api<Zone> = Api::namespaced(client.clone(), ns);
                Ok(api.get_opt(&zone_ref.name).await?.map(ParentZone::Zone))
            }
            ZoneRefKind::ClusterZone => {
                let api: Api<ClusterZone> = Api::all(client.clone());
                Ok(api
                    .get_opt(&zone_ref.name)
                    .await?
                    .map(ParentZone::ClusterZone))
            }
        }
    }

    /// Resource name of the parent (also its backend zone name).
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            ParentZone::Zone(z) => z.name_any(),
            ParentZone::ClusterZone(z) => z.name_any(),
        }
    }

    /// Sync status last recorded on the parent.
    #[must_use]
    pub fn sync_status(&self) -> Option<SyncStatus> {
        match self {
            ParentZone::Zone(z) => z.status.as_ref().and_then(|s| s.sync_status),
            ParentZone::ClusterZone(z) => z.status.as_ref().and_then(|s| s.sync_status),
        }
    }

    /// True when the parent is quiesced in failed status.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.sync_status() == Some(SyncStatus::Failed)
    }

    /// Controller owner reference pointing at the parent.
    #[must_use]
    pub fn controller_owner_ref(&self) -> Option<OwnerReference> {
        match self {
            ParentZone::Zone(z) => z.controller_owner_ref(&()),
            ParentZone::ClusterZone(z) => z.controller_owner_ref(&()),
        }
    }
}

/// True when the resource's spec changed since the reconciler last acted:
/// an observed generation exists and differs from the current generation.
#[must_use]
pub fn is_modified(observed_generation: Option<i64>, generation: Option<i64>) -> bool {
    observed_generation.is_some_and(|observed| observed != generation.unwrap_or(0))
}
