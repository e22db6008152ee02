// SPDX-License-Identifier: MIT

//! Global constants for the PowerDNS operator.
//!
//! This module contains all numeric and string constants used throughout the
//! codebase. Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for all operator CRDs
pub const API_GROUP: &str = "dns.cav.enablers.ob";

/// Storage API version for all operator CRDs
pub const API_VERSION: &str = "v1alpha2";

/// Kind name for the `Zone` resource
pub const KIND_ZONE: &str = "Zone";

/// Kind name for the `ClusterZone` resource
pub const KIND_CLUSTER_ZONE: &str = "ClusterZone";

/// Kind name for the `RRset` resource
pub const KIND_RRSET: &str = "RRset";

/// Kind name for the `ClusterRRset` resource
pub const KIND_CLUSTER_RRSET: &str = "ClusterRRset";

// ============================================================================
// Finalizers
// ============================================================================

/// Finalizer guarding external PowerDNS resources.
///
/// Present on every resource that has successfully registered with the
/// backend; removed only after the backend-side zone or RRset is deleted.
pub const RESOURCES_FINALIZER: &str = "dns.cav.enablers.ob/external-resources";

/// Finalizer guarding the resource's metrics series.
///
/// Installed as soon as a resource is observed; removed together with the
/// teardown of the resource's gauge series so that no series outlives its
/// resource.
pub const METRICS_FINALIZER: &str = "dns.cav.enablers.ob/metrics";

/// Single finalizer used by the v1alpha1 controller generation.
///
/// Still encountered on resources created before the storage version moved to
/// v1alpha2; removed alongside [`RESOURCES_FINALIZER`] during deletion.
pub const LEGACY_FINALIZER: &str = "dns.cav.enablers.ob/finalizer";

// ============================================================================
// DNS Protocol Constants
// ============================================================================

/// TTL applied to a zone's apex NS RRset when the backend does not report one
pub const DEFAULT_TTL_FOR_NS_RECORDS: u32 = 1500;

/// Account string attached to RRset comments written by the operator
pub const OPERATOR_ACCOUNT: &str = "powerdns-operator";

// ============================================================================
// Controller Requeue Constants
// ============================================================================

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Requeue duration while an RRset waits for its parent zone (2 seconds)
pub const ZONE_PENDING_REQUEUE_SECS: u64 = 2;

/// Requeue duration after a store conflict (another reconcile observed a
/// concurrent change)
pub const CONFLICT_REQUEUE_SECS: u64 = 1;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for the Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Default port for the Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for the Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Default bind address for the metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
