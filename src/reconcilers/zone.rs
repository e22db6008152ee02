// SPDX-License-Identifier: MIT

//! Zone reconciliation core, shared by `Zone` and `ClusterZone`.
//!
//! One pass through the state machine: finalizer lifecycle, duplicate
//! detection against both zone indexes, diff against the backend with a
//! split update path (apex NS RRset vs zone metadata), re-read for
//! authoritative serials, status patch, metrics.

use crate::constants::{
    CONFLICT_REQUEUE_SECS, DEFAULT_TTL_FOR_NS_RECORDS, LEGACY_FINALIZER, METRICS_FINALIZER,
    RESOURCES_FINALIZER,
};
use crate::context::Context;
use crate::crd::{ClusterZone, SyncStatus, Zone, ZoneSpec, ZoneStatus};
use crate::generic::{is_modified, ZoneVariant};
use crate::indexes::entry_is_duplicated;
use crate::naming::{make_canonical, make_canonical_all};
use crate::pdns::{self, PdnsClient, PdnsError, RrsetChange};
use crate::reconcilers::finalizers::{
    add_finalizer, contains_any, has_finalizer, persist_finalizers, without,
};
use crate::reconcilers::status::{available_condition, remove_condition, set_condition};
use crate::reconcilers::{is_conflict, patch_status, Error};
use crate::status_reasons::{
    CONDITION_TYPE_AVAILABLE, ZONE_MESSAGE_DUPLICATED, ZONE_MESSAGE_SYNC_SUCCEEDED,
    ZONE_REASON_DUPLICATED, ZONE_REASON_NS_SYNC_FAILED, ZONE_REASON_SYNCED,
    ZONE_REASON_SYNC_FAILED,
};
use kube::runtime::controller::Action;
use kube::ResourceExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Reconcile a namespaced `Zone`.
///
/// # Errors
///
/// Returns an error for transient store or backend failures; the runtime
/// retries them.
pub async fn reconcile_zone(zone: Arc<Zone>, ctx: Arc<Context>) -> Result<Action, Error> {
    info!(zone = %zone.name_any(), "reconcile Zone");
    reconcile(zone.as_ref(), &ctx).await.map_err(Error::from)
}

/// Reconcile a `ClusterZone`.
///
/// # Errors
///
/// Returns an error for transient store or backend failures; the runtime
/// retries them.
pub async fn reconcile_cluster_zone(
    zone: Arc<ClusterZone>,
    ctx: Arc<Context>,
) -> Result<Action, Error> {
    info!(zone = %zone.name_any(), "reconcile ClusterZone");
    reconcile(zone.as_ref(), &ctx).await.map_err(Error::from)
}

async fn reconcile<Z: ZoneVariant>(zone: &Z, ctx: &Context) -> anyhow::Result<Action> {
    let name = zone.name_any();
    let canonical_name = make_canonical(&name);
    let api = zone.api(ctx.client.clone());

    let modified = is_modified(
        zone.status().and_then(|s| s.observed_generation),
        zone.meta().generation,
    );
    let deleted = zone.meta().deletion_timestamp.is_some();

    // Position the metrics finalizer as soon as possible.
    if !deleted && !has_finalizer(zone, METRICS_FINALIZER) {
        add_finalizer(&api, zone, METRICS_FINALIZER).await?;
    }

    // A status rewrite after a spec change must move LastTransitionTime even
    // when the outcome is unchanged, so drop the condition first. The pruned
    // list is carried through to the final status patch.
    let mut conditions = zone.status().map(|s| s.conditions.clone()).unwrap_or_default();
    if !deleted && modified && remove_condition(&mut conditions, CONDITION_TYPE_AVAILABLE) {
        let patch = serde_json::json!({ "conditions": conditions });
        if let Err(err) = patch_status(&api, &name, &patch).await {
            if is_conflict(&err) {
                return Ok(Action::requeue(Duration::from_secs(CONFLICT_REQUEUE_SECS)));
            }
            return Err(err.into());
        }
    }

    if deleted {
        let finalizers = zone.meta().finalizers.clone().unwrap_or_default();
        let mut remaining = finalizers;

        if contains_any(&remaining, &[RESOURCES_FINALIZER, LEGACY_FINALIZER]) {
            match ctx.pdns.zones.delete(&canonical_name).await {
                Ok(()) => info!(zone = %canonical_name, "deleted backend zone"),
                Err(PdnsError::NotFound) => {
                    debug!(zone = %canonical_name, "backend zone already absent");
                }
                Err(err) => return Err(err.into()),
            }
            remaining = without(&remaining, &[RESOURCES_FINALIZER, LEGACY_FINALIZER]);
            persist_finalizers(&api, &name, remaining.clone()).await?;
        }

        if contains_any(&remaining, &[METRICS_FINALIZER]) {
            zone.remove_status_metric();
            remaining = without(&remaining, &[METRICS_FINALIZER]);
            persist_finalizers(&api, &name, remaining).await?;
        }

        return Ok(Action::await_change());
    }

    // A quiesced zone stays quiet until its spec changes again.
    let in_failed_status = zone.status().and_then(|s| s.sync_status) == Some(SyncStatus::Failed);
    if in_failed_status && !modified {
        zone.update_status_metric(SyncStatus::Failed);
        return Ok(Action::await_change());
    }

    // At most one Zone or ClusterZone may claim a canonical name.
    let (same_kind, other_kind) = Z::duplicate_counts(&ctx.stores, &canonical_name);
    if entry_is_duplicated(same_kind, other_kind) {
        let mut status = zone.status().cloned().unwrap_or_default();
        status.sync_status = Some(SyncStatus::Failed);
        status.observed_generation = zone.meta().generation;
        status.conditions = conditions;
        set_condition(
            &mut status.conditions,
            available_condition(false, ZONE_REASON_DUPLICATED, ZONE_MESSAGE_DUPLICATED),
        );
        if let Err(err) = patch_status(&api, &name, &status).await {
            if is_conflict(&err) {
                return Ok(Action::requeue(Duration::from_secs(CONFLICT_REQUEUE_SECS)));
            }
            return Err(err.into());
        }
        zone.update_status_metric(SyncStatus::Failed);
        return Ok(Action::await_change());
    }

    // Diff and apply against the backend, then re-read so the status mirrors
    // the authoritative serials rather than our own idea of them.
    let outcome = sync_zone_external(zone.spec(), &canonical_name, &ctx.pdns).await?;

    let backend_zone = match ctx.pdns.zones.get(&canonical_name).await {
        Ok(z) => Some(z),
        Err(PdnsError::NotFound) => None,
        Err(err) => return Err(err.into()),
    };

    if backend_zone.is_some() && !has_finalizer(zone, RESOURCES_FINALIZER) {
        add_finalizer(&api, zone, RESOURCES_FINALIZER).await?;
    }

    let status = build_status(zone, backend_zone.as_ref(), &outcome, conditions);
    if let Err(err) = patch_status(&api, &name, &status).await {
        if is_conflict(&err) {
            info!(zone = %name, "zone modified concurrently, requeuing");
            return Ok(Action::requeue(Duration::from_secs(CONFLICT_REQUEUE_SECS)));
        }
        return Err(err.into());
    }

    zone.update_status_metric(outcome.sync_status);
    Ok(Action::await_change())
}

/// Result of one backend synchronization pass.
pub(crate) struct ZoneSyncOutcome {
    pub sync_status: SyncStatus,
    pub available: bool,
    pub reason: &'static str,
    pub message: String,
}

impl ZoneSyncOutcome {
    fn succeeded() -> Self {
        ZoneSyncOutcome {
            sync_status: SyncStatus::Succeeded,
            available: true,
            reason: ZONE_REASON_SYNCED,
            message: ZONE_MESSAGE_SYNC_SUCCEEDED.to_string(),
        }
    }

    fn failed(reason: &'static str, message: String) -> Self {
        ZoneSyncOutcome {
            sync_status: SyncStatus::Failed,
            available: false,
            reason,
            message,
        }
    }
}

/// Ensure the backend zone matches the declared spec.
///
/// Creates the zone when absent. When present, nameserver drift repairs the
/// apex NS RRset (keeping the TTL the backend reports) while metadata drift
/// patches the zone itself. Backend rejections (conflict, validation) become
/// a failed outcome carrying the backend's message; transport errors
/// propagate for retry.
pub(crate) async fn sync_zone_external(
    spec: &ZoneSpec,
    canonical_name: &str,
    pdns: &PdnsClient,
) -> Result<ZoneSyncOutcome, PdnsError> {
    let existing = match pdns.zones.get(canonical_name).await {
        Ok(zone) => Some(zone),
        Err(PdnsError::NotFound) => None,
        Err(err) => return Err(err),
    };

    let Some(existing) = existing else {
        let zone = pdns::Zone {
            id: Some(canonical_name.to_string()),
            name: Some(canonical_name.to_string()),
            kind: Some(spec.kind.to_string()),
            // DNSSEC is out of the operator's hands; zones register unsigned.
            dnssec: Some(false),
            nameservers: make_canonical_all(&spec.nameservers),
            catalog: spec.catalog.as_deref().map(make_canonical),
            soa_edit_api: Some(spec.soa_edit_api.unwrap_or_default().to_string()),
            ..Default::default()
        };
        return match pdns.zones.add(&zone).await {
            Ok(_) => Ok(ZoneSyncOutcome::succeeded()),
            Err(err @ (PdnsError::Conflict | PdnsError::Validation(_))) => Ok(
                ZoneSyncOutcome::failed(ZONE_REASON_SYNC_FAILED, err.to_string()),
            ),
            Err(err) => Err(err),
        };
    };

    let rrsets = pdns
        .records
        .get(canonical_name, canonical_name, "NS")
        .await?;
    // The backend over-reports adjacent entries on GET; only the exact apex
    // NS RRset counts.
    let apex = rrsets
        .iter()
        .find(|rr| rr.name == canonical_name && rr.rtype == "NS");
    let backend_nameservers: Vec<String> = apex
        .map(|rr| rr.records.iter().map(|r| make_canonical(&r.content)).collect())
        .unwrap_or_default();

    let (zone_identical, ns_identical) =
        zone_is_identical_to_external(spec, &existing, &backend_nameservers);

    let mut outcome = ZoneSyncOutcome::succeeded();

    if !ns_identical {
        let ttl = apex
            .and_then(|rr| rr.ttl)
            .unwrap_or(DEFAULT_TTL_FOR_NS_RECORDS);
        let change = RrsetChange {
            name: canonical_name.to_string(),
            rtype: "NS".to_string(),
            ttl,
            records: make_canonical_all(&spec.nameservers),
            comment: None,
        };
        match pdns.records.change(canonical_name, change).await {
            Ok(()) => debug!(zone = %canonical_name, "updated apex NS RRset"),
            Err(err @ (PdnsError::Conflict | PdnsError::Validation(_) | PdnsError::NotFound)) => {
                outcome = ZoneSyncOutcome::failed(ZONE_REASON_NS_SYNC_FAILED, err.to_string());
            }
            Err(err) => return Err(err),
        }
    }

    if !zone_identical {
        let change = pdns::Zone {
            name: Some(canonical_name.to_string()),
            kind: Some(spec.kind.to_string()),
            catalog: spec.catalog.as_deref().map(make_canonical),
            soa_edit_api: Some(spec.soa_edit_api.unwrap_or_default().to_string()),
            ..Default::default()
        };
        match pdns.zones.change(canonical_name, &change).await {
            Ok(()) => debug!(zone = %canonical_name, "updated zone metadata"),
            Err(err @ (PdnsError::Conflict | PdnsError::Validation(_) | PdnsError::NotFound)) => {
                outcome = ZoneSyncOutcome::failed(ZONE_REASON_SYNC_FAILED, err.to_string());
            }
            Err(err) => return Err(err),
        }
    }

    Ok(outcome)
}

/// Compare the declared zone against the backend's view.
///
/// Returns `(zone_identical, ns_identical)`: the first covers kind, catalog
/// (canonicalized) and SOA-EDIT-API, the second the nameserver list in
/// canonical form.
pub(crate) fn zone_is_identical_to_external(
    spec: &ZoneSpec,
    external: &pdns::Zone,
    external_nameservers: &[String],
) -> (bool, bool) {
    let spec_catalog = spec.catalog.as_deref().map(make_canonical).unwrap_or_default();
    let external_catalog = external.catalog.clone().unwrap_or_default();

    let spec_kind = spec.kind.to_string();
    let spec_soa_edit_api = spec.soa_edit_api.unwrap_or_default().to_string();
    let external_soa_edit_api = external
        .soa_edit_api
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "DEFAULT".to_string());

    let zone_identical = external.kind.as_deref() == Some(spec_kind.as_str())
        && spec_catalog == external_catalog
        && spec_soa_edit_api == external_soa_edit_api;

    let ns_identical = make_canonical_all(&spec.nameservers) == external_nameservers;

    (zone_identical, ns_identical)
}

fn build_status<Z: ZoneVariant>(
    zone: &Z,
    backend: Option<&pdns::Zone>,
    outcome: &ZoneSyncOutcome,
    mut conditions: Vec<crate::crd::Condition>,
) -> ZoneStatus {
    set_condition(
        &mut conditions,
        available_condition(outcome.available, outcome.reason, &outcome.message),
    );

    ZoneStatus {
        id: backend.and_then(|z| z.id.clone()),
        name: backend.and_then(|z| z.name.clone()),
        kind: backend.and_then(|z| z.kind.clone()),
        serial: backend.and_then(|z| z.serial),
        notified_serial: backend.and_then(|z| z.notified_serial),
        edited_serial: backend.and_then(|z| z.edited_serial),
        masters: backend.map(|z| z.masters.clone()).unwrap_or_default(),
        dnssec: backend.and_then(|z| z.dnssec),
        catalog: backend.and_then(|z| z.catalog.clone()),
        sync_status: Some(outcome.sync_status),
        conditions,
        observed_generation: zone.meta().generation,
    }
}

#[cfg(test)]
#[path = "zone_tests.rs"]
mod zone_tests;
