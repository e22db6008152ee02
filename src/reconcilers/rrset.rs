// SPDX-License-Identifier: MIT

//! RRset reconciliation core, shared by `RRset` and `ClusterRRset`.
//!
//! Resolves the parent zone (either variant), detects duplicate FQDN+type
//! claims across both rrset indexes, diffs against the backend records,
//! installs the controller owner reference, and patches status. The status
//! patch carries the LastUpdateTime bump that triggers the parent zone's
//! serial refresh: when a record change lands, the zone reconcile re-reads
//! the serial afterwards.

use crate::constants::{
    CONFLICT_REQUEUE_SECS, LEGACY_FINALIZER, METRICS_FINALIZER, RESOURCES_FINALIZER,
    ZONE_PENDING_REQUEUE_SECS,
};
use crate::context::Context;
use crate::crd::{ClusterRRset, RRset, RRsetSpec, SyncStatus};
use crate::generic::{is_modified, ParentZone, RRsetVariant};
use crate::indexes::entry_is_duplicated;
use crate::naming::{dns_entry_name, make_canonical};
use crate::pdns::{self, PdnsClient, PdnsError, RrsetChange};
use crate::reconcilers::finalizers::{
    add_finalizer, contains_any, has_finalizer, persist_finalizers, without,
};
use crate::reconcilers::status::{available_condition, remove_condition, set_condition};
use crate::reconcilers::{is_conflict, patch_status, Error};
use crate::status_reasons::{
    CONDITION_TYPE_AVAILABLE, RRSET_MESSAGE_DUPLICATED, RRSET_MESSAGE_NONEXISTENT_ZONE,
    RRSET_MESSAGE_SYNC_SUCCEEDED, RRSET_MESSAGE_UNAVAILABLE_ZONE, RRSET_REASON_DUPLICATED,
    RRSET_REASON_SYNCED, RRSET_REASON_SYNC_FAILED, RRSET_REASON_ZONE_NOT_AVAILABLE,
};
use chrono::Utc;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::{Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::{Api, ResourceExt};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Reconcile a namespaced `RRset`.
///
/// # Errors
///
/// Returns an error for transient store or backend failures; the runtime
/// retries them.
pub async fn reconcile_rrset(rrset: Arc<RRset>, ctx: Arc<Context>) -> Result<Action, Error> {
    info!(rrset = %rrset.name_any(), "reconcile RRset");
    reconcile(rrset.as_ref(), &ctx).await.map_err(Error::from)
}

/// Reconcile a `ClusterRRset`.
///
/// # Errors
///
/// Returns an error for transient store or backend failures; the runtime
/// retries them.
pub async fn reconcile_cluster_rrset(
    rrset: Arc<ClusterRRset>,
    ctx: Arc<Context>,
) -> Result<Action, Error> {
    info!(rrset = %rrset.name_any(), "reconcile ClusterRRset");
    reconcile(rrset.as_ref(), &ctx).await.map_err(Error::from)
}

#[allow(clippy::too_many_lines)]
async fn reconcile<R: RRsetVariant>(rrset: &R, ctx: &Context) -> anyhow::Result<Action> {
    let name = rrset.name_any();
    let entry_name = dns_entry_name(rrset.spec());
    let record_type = rrset.spec().r#type.clone();
    let api = rrset.api(ctx.client.clone());

    let modified = is_modified(
        rrset.status().and_then(|s| s.observed_generation),
        rrset.meta().generation,
    );
    let deleted = rrset.meta().deletion_timestamp.is_some();

    // Carry the last update time forward; it only moves when a backend
    // change is applied.
    let mut last_update_time = rrset
        .status()
        .and_then(|s| s.last_update_time.clone())
        .unwrap_or_else(|| Utc::now().to_rfc3339());

    // Position the metrics finalizer as soon as possible.
    if !deleted && !has_finalizer(rrset, METRICS_FINALIZER) {
        add_finalizer(&api, rrset, METRICS_FINALIZER).await?;
        last_update_time = Utc::now().to_rfc3339();
    }

    // Drop the condition on modification so the rewrite moves
    // LastTransitionTime even when the outcome is unchanged. The pruned list
    // is carried through to whichever status patch this pass ends in.
    let mut conditions = rrset
        .status()
        .map(|s| s.conditions.clone())
        .unwrap_or_default();
    if !deleted && modified && remove_condition(&mut conditions, CONDITION_TYPE_AVAILABLE) {
        let patch = json!({ "conditions": conditions });
        if let Err(err) = patch_status(&api, &name, &patch).await {
            if is_conflict(&err) {
                return Ok(Action::requeue(Duration::from_secs(CONFLICT_REQUEUE_SECS)));
            }
            return Err(err.into());
        }
    }

    // Resolve the parent zone; an RRset only exists inside one.
    let parent = ParentZone::resolve(
        &ctx.client,
        &rrset.spec().zone_ref,
        rrset.namespace().as_deref(),
    )
    .await?;

    let Some(parent) = parent else {
        let finalizers = rrset.meta().finalizers.clone().unwrap_or_default();
        let mut remaining = finalizers;
        let mut finalizers_changed = false;

        if contains_any(&remaining, &[RESOURCES_FINALIZER, LEGACY_FINALIZER]) {
            remaining = without(&remaining, &[RESOURCES_FINALIZER, LEGACY_FINALIZER]);
            finalizers_changed = true;
        }
        if deleted && contains_any(&remaining, &[METRICS_FINALIZER]) {
            rrset.remove_status_metric();
            remaining = without(&remaining, &[METRICS_FINALIZER]);
            finalizers_changed = true;
        }
        if finalizers_changed {
            persist_finalizers(&api, &name, remaining).await?;
        }

        if !deleted {
            let mut status = rrset.status().cloned().unwrap_or_default();
            status.sync_status = Some(SyncStatus::Pending);
            status.observed_generation = rrset.meta().generation;
            status.conditions = conditions;
            set_condition(
                &mut status.conditions,
                available_condition(
                    false,
                    RRSET_REASON_ZONE_NOT_AVAILABLE,
                    &format!(
                        "{RRSET_MESSAGE_NONEXISTENT_ZONE}{}",
                        rrset.spec().zone_ref.name
                    ),
                ),
            );
            if let Err(err) = patch_status(&api, &name, &status).await {
                if is_conflict(&err) {
                    return Ok(Action::requeue(Duration::from_secs(CONFLICT_REQUEUE_SECS)));
                }
                return Err(err.into());
            }
            rrset.update_status_metric(&entry_name, SyncStatus::Pending);
        }

        // Zone-then-rrset creation race: the zone may simply not be there
        // yet, so check back shortly instead of waiting for an event.
        return Ok(Action::requeue(Duration::from_secs(
            ZONE_PENDING_REQUEUE_SECS,
        )));
    };

    // A parent quiesced in Failed cannot host records.
    if parent.is_failed() {
        let mut status = rrset.status().cloned().unwrap_or_default();
        status.sync_status = Some(SyncStatus::Failed);
        status.observed_generation = rrset.meta().generation;
        status.conditions = conditions;
        set_condition(
            &mut status.conditions,
            available_condition(
                false,
                RRSET_REASON_ZONE_NOT_AVAILABLE,
                &format!("{RRSET_MESSAGE_UNAVAILABLE_ZONE}{}", parent.name()),
            ),
        );
        if let Err(err) = patch_status(&api, &name, &status).await {
            if is_conflict(&err) {
                return Ok(Action::requeue(Duration::from_secs(CONFLICT_REQUEUE_SECS)));
            }
            return Err(err.into());
        }
        rrset.update_status_metric(&entry_name, SyncStatus::Failed);

        if deleted && has_finalizer(rrset, METRICS_FINALIZER) {
            rrset.remove_status_metric();
            let remaining = without(
                &rrset.meta().finalizers.clone().unwrap_or_default(),
                &[METRICS_FINALIZER],
            );
            persist_finalizers(&api, &name, remaining).await?;
        }
        return Ok(Action::await_change());
    }

    let zone_canonical = make_canonical(&parent.name());

    if deleted {
        let finalizers = rrset.meta().finalizers.clone().unwrap_or_default();
        let mut remaining = finalizers;

        if contains_any(&remaining, &[RESOURCES_FINALIZER, LEGACY_FINALIZER]) {
            match ctx
                .pdns
                .records
                .delete(&zone_canonical, &entry_name, &record_type)
                .await
            {
                Ok(()) => info!(rrset = %entry_name, "deleted backend RRset"),
                Err(PdnsError::NotFound) => {
                    debug!(rrset = %entry_name, "backend RRset already absent");
                }
                Err(err) => return Err(err.into()),
            }
            remaining = without(&remaining, &[RESOURCES_FINALIZER, LEGACY_FINALIZER]);
            persist_finalizers(&api, &name, remaining.clone()).await?;
        }

        if contains_any(&remaining, &[METRICS_FINALIZER]) {
            rrset.remove_status_metric();
            remaining = without(&remaining, &[METRICS_FINALIZER]);
            persist_finalizers(&api, &name, remaining).await?;
        }

        return Ok(Action::await_change());
    }

    // A quiesced rrset stays quiet until its spec changes again.
    let in_failed_status = rrset.status().and_then(|s| s.sync_status) == Some(SyncStatus::Failed);
    if in_failed_status && !modified {
        rrset.update_status_metric(&entry_name, SyncStatus::Failed);
        return Ok(Action::await_change());
    }

    // At most one RRset or ClusterRRset may claim an FQDN+type pair.
    let entry_key = format!("{entry_name}/{record_type}");
    let (same_kind, other_kind) = R::duplicate_counts(&ctx.stores, &entry_key);
    if entry_is_duplicated(same_kind, other_kind) {
        let mut status = rrset.status().cloned().unwrap_or_default();
        status.last_update_time = Some(last_update_time);
        status.dns_entry_name = Some(entry_name.clone());
        status.sync_status = Some(SyncStatus::Failed);
        status.observed_generation = rrset.meta().generation;
        status.conditions = conditions;
        set_condition(
            &mut status.conditions,
            available_condition(false, RRSET_REASON_DUPLICATED, RRSET_MESSAGE_DUPLICATED),
        );
        if let Err(err) = patch_status(&api, &name, &status).await {
            if is_conflict(&err) {
                return Ok(Action::requeue(Duration::from_secs(CONFLICT_REQUEUE_SECS)));
            }
            return Err(err.into());
        }
        rrset.update_status_metric(&entry_name, SyncStatus::Failed);
        return Ok(Action::await_change());
    }

    // Diff and apply against the backend.
    let outcome = sync_rrset_external(rrset.spec(), &entry_name, &zone_canonical, &ctx.pdns).await?;
    if outcome.changed {
        last_update_time = Utc::now().to_rfc3339();
    }

    if outcome.sync_status == SyncStatus::Succeeded
        && !has_finalizer(rrset, RESOURCES_FINALIZER)
    {
        add_finalizer(&api, rrset, RESOURCES_FINALIZER).await?;
    }

    // Deleting the zone must cascade to its records.
    if let Err(err) = install_owner_reference(&api, rrset, &parent).await {
        if is_conflict(&err) {
            info!(rrset = %name, "conflict on owner reference, retrying");
            return Ok(Action::requeue(Duration::from_secs(CONFLICT_REQUEUE_SECS)));
        }
        return Err(err.into());
    }

    // This patch matters beyond bookkeeping: the zone watches its owned
    // rrsets, and the LastUpdateTime bump retriggers the zone reconcile
    // after the backend has recomputed the serial.
    let mut status = rrset.status().cloned().unwrap_or_default();
    status.last_update_time = Some(last_update_time);
    status.dns_entry_name = Some(entry_name.clone());
    status.sync_status = Some(outcome.sync_status);
    status.observed_generation = rrset.meta().generation;
    status.conditions = conditions;
    set_condition(
        &mut status.conditions,
        available_condition(outcome.available, outcome.reason, &outcome.message),
    );
    if let Err(err) = patch_status(&api, &name, &status).await {
        if is_conflict(&err) {
            return Ok(Action::requeue(Duration::from_secs(CONFLICT_REQUEUE_SECS)));
        }
        return Err(err.into());
    }

    rrset.update_status_metric(&entry_name, outcome.sync_status);
    Ok(Action::await_change())
}

/// Result of one backend synchronization pass.
#[derive(Debug)]
pub(crate) struct RrsetSyncOutcome {
    pub changed: bool,
    pub sync_status: SyncStatus,
    pub available: bool,
    pub reason: &'static str,
    pub message: String,
}

impl RrsetSyncOutcome {
    fn succeeded(changed: bool) -> Self {
        RrsetSyncOutcome {
            changed,
            sync_status: SyncStatus::Succeeded,
            available: true,
            reason: RRSET_REASON_SYNCED,
            message: RRSET_MESSAGE_SYNC_SUCCEEDED.to_string(),
        }
    }

    fn failed(message: String) -> Self {
        RrsetSyncOutcome {
            changed: false,
            sync_status: SyncStatus::Failed,
            available: false,
            reason: RRSET_REASON_SYNC_FAILED,
            message,
        }
    }
}

/// Ensure the backend RRset matches the declared spec.
///
/// A backend RRset identical on canonical name, type, TTL, ordered records
/// and comment is left alone; anything else is replaced in place. Backend
/// rejections become a failed outcome with the backend's message verbatim;
/// transport errors propagate for retry.
pub(crate) async fn sync_rrset_external(
    spec: &RRsetSpec,
    entry_name: &str,
    zone_canonical: &str,
    pdns: &PdnsClient,
) -> Result<RrsetSyncOutcome, PdnsError> {
    let rrsets = match pdns
        .records
        .get(zone_canonical, entry_name, &spec.r#type)
        .await
    {
        Ok(rrsets) => rrsets,
        Err(PdnsError::NotFound) => Vec::new(),
        Err(err) => return Err(err),
    };

    // The backend over-reports adjacent entries on GET; compare only the
    // exact canonical name. Not filtering shows up as permanent "drift".
    let existing = rrsets
        .iter()
        .find(|rr| rr.name == entry_name && rr.rtype == spec.r#type);
    if let Some(existing) = existing {
        if rrset_is_identical_to_external(spec, entry_name, existing) {
            return Ok(RrsetSyncOutcome::succeeded(false));
        }
    }

    let change = RrsetChange {
        name: entry_name.to_string(),
        rtype: spec.r#type.clone(),
        ttl: spec.ttl,
        records: spec.records.clone(),
        comment: spec.comment.clone(),
    };
    match pdns.records.change(zone_canonical, change).await {
        Ok(()) => Ok(RrsetSyncOutcome::succeeded(true)),
        Err(err @ (PdnsError::Conflict | PdnsError::Validation(_) | PdnsError::NotFound)) => {
            Ok(RrsetSyncOutcome::failed(err.to_string()))
        }
        Err(err) => Err(err),
    }
}

/// Compare the declared RRset against one backend RRset.
///
/// Identity covers the canonical name, type, TTL, comment (absent on both
/// sides or equal in content) and record contents in declared order.
pub(crate) fn rrset_is_identical_to_external(
    spec: &RRsetSpec,
    entry_name: &str,
    external: &pdns::Rrset,
) -> bool {
    let comments_identical = match (&spec.comment, external.comments.first()) {
        (None, None) => true,
        (Some(declared), Some(reported)) => *declared == reported.content,
        _ => false,
    };

    let external_records: Vec<&str> = external
        .records
        .iter()
        .map(|r| r.content.as_str())
        .collect();
    let declared_records: Vec<&str> = spec.records.iter().map(String::as_str).collect();

    external.name == entry_name
        && external.rtype == spec.r#type
        && external.ttl == Some(spec.ttl)
        && comments_identical
        && external_records == declared_records
}

/// Install the parent zone as controller owner, keeping any non-controller
/// owner references the resource already carries.
async fn install_owner_reference<R: RRsetVariant>(
    api: &Api<R>,
    rrset: &R,
    parent: &ParentZone,
) -> Result<(), kube::Error> {
    let Some(owner_ref) = parent.controller_owner_ref() else {
        return Ok(());
    };

    let current = rrset.owner_references();
    if current
        .iter()
        .any(|or| or.controller == Some(true) && or.uid == owner_ref.uid)
    {
        return Ok(());
    }

    let mut references: Vec<OwnerReference> = current
        .iter()
        .filter(|or| or.controller != Some(true))
        .cloned()
        .collect();
    references.push(owner_ref);

    let patch = json!({ "metadata": { "ownerReferences": references } });
    api.patch(
        &rrset.name_any(),
        &PatchParams::default(),
        &Patch::Merge(&patch),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
#[path = "rrset_tests.rs"]
mod rrset_tests;
