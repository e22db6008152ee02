// SPDX-License-Identifier: MIT

//! Reconciliation logic for each resource type.
//!
//! The per-kind entry points ([`reconcile_zone`], [`reconcile_cluster_zone`],
//! [`reconcile_rrset`], [`reconcile_cluster_rrset`]) are thin drivers: they
//! compute the resource's situation (modified/deleted, last update time) and
//! dispatch into the shared variant core in [`zone`] or [`rrset`].
//!
//! Within one reconcile, status patches always happen after backend sync, so
//! observable status is never ahead of the backend. Store conflicts requeue;
//! transient backend errors bubble up into [`error_policy`] for retry.

pub mod finalizers;
pub mod rrset;
pub mod status;
pub mod zone;

pub use rrset::{reconcile_cluster_rrset, reconcile_rrset};
pub use zone::{reconcile_cluster_zone, reconcile_zone};

use crate::constants::ERROR_REQUEUE_DURATION_SECS;
use crate::context::Context;
use crate::generic::ReconciledResource;
use kube::api::{Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::{Api, ResourceExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Error type surfaced to the controller runtime.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct Error(#[from] anyhow::Error);

/// Requeue policy for reconcile errors: transient failures are retried on a
/// fixed schedule; everything user-visible is already on the status.
pub fn error_policy<K: ReconciledResource>(
    resource: Arc<K>,
    error: &Error,
    _ctx: Arc<Context>,
) -> Action {
    warn!(
        resource = %resource.name_any(),
        error = %error,
        "reconcile failed"
    );
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}

/// True for a store conflict: another reconcile observed a concurrent change
/// and this one should requeue without surfacing a failure.
#[must_use]
pub fn is_conflict(error: &kube::Error) -> bool {
    matches!(error, kube::Error::Api(response) if response.code == 409)
}

/// Patch the status subresource with a full replacement of the given status.
pub(crate) async fn patch_status<T, S>(
    api: &Api<T>,
    name: &str,
    status: &S,
) -> Result<(), kube::Error>
where
    T: ReconciledResource,
    S: Serialize,
{
    let patch = serde_json::json!({ "status": status });
    api.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}
