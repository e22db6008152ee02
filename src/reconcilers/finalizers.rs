// SPDX-License-Identifier: MIT

//! Finalizer management for the reconciled resources.
//!
//! Two finalizers gate deletion: the external-resources finalizer (owned by
//! the backend-sync flow) and the metrics finalizer (owned by the metrics
//! subsystem). On deletion the resources finalizer is removed strictly
//! before the metrics one, and the metrics series teardown happens in the
//! same persistence step as the metrics finalizer removal so no series can
//! outlive its resource.
//!
//! Deletion paths therefore work on an explicit finalizer list: they compute
//! the remaining list once, subtract per step with [`without`], and persist
//! each step with [`persist_finalizers`]. Recomputing from the (by then
//! stale) resource between steps would silently re-add what the previous
//! patch removed.

use crate::generic::ReconciledResource;
use kube::api::{Patch, PatchParams};
use kube::{Api, ResourceExt};
use serde_json::json;
use tracing::info;

/// True when the resource carries the finalizer.
#[must_use]
pub fn has_finalizer<T: ResourceExt>(resource: &T, finalizer: &str) -> bool {
    resource
        .meta()
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|existing| existing == finalizer))
}

/// True when the list contains any of the given finalizers.
#[must_use]
pub fn contains_any(finalizers: &[String], candidates: &[&str]) -> bool {
    finalizers
        .iter()
        .any(|f| candidates.contains(&f.as_str()))
}

/// The list with the given finalizers removed.
#[must_use]
pub fn without(finalizers: &[String], removed: &[&str]) -> Vec<String> {
    finalizers
        .iter()
        .filter(|f| !removed.contains(&f.as_str()))
        .cloned()
        .collect()
}

/// Add a finalizer if not already present and persist the change.
///
/// # Errors
///
/// Returns the underlying API error when the metadata patch fails.
pub async fn add_finalizer<T>(api: &Api<T>, resource: &T, finalizer: &str) -> Result<(), kube::Error>
where
    T: ReconciledResource,
{
    if has_finalizer(resource, finalizer) {
        return Ok(());
    }

    let name = resource.name_any();
    info!(resource = %name, finalizer, "adding finalizer");

    let mut finalizers = resource.meta().finalizers.clone().unwrap_or_default();
    finalizers.push(finalizer.to_string());
    persist_finalizers(api, &name, finalizers).await
}

/// Persist a full finalizer list through a metadata merge patch.
///
/// # Errors
///
/// Returns the underlying API error when the metadata patch fails.
pub async fn persist_finalizers<T>(
    api: &Api<T>,
    name: &str,
    finalizers: Vec<String>,
) -> Result<(), kube::Error>
where
    T: ReconciledResource,
{
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

#[cfg(test)]
#[path = "finalizers_tests.rs"]
mod finalizers_tests;
