// SPDX-License-Identifier: MIT

//! # PowerDNS Operator - declarative DNS management for Kubernetes
//!
//! A Kubernetes controller that projects custom resources describing DNS
//! zones and resource record sets onto an external authoritative PowerDNS
//! server through its HTTP management API.
//!
//! ## Overview
//!
//! Four resource shapes are reconciled: namespace-scoped [`crd::Zone`] and
//! [`crd::RRset`], and their cluster-scoped twins [`crd::ClusterZone`] and
//! [`crd::ClusterRRset`]. The reconcilers converge the backend's view of
//! zones, nameservers and records to the declared state, and mirror the
//! outcome (including precise failure causes) on each resource's status and
//! in Prometheus metrics.
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definition types
//! - [`generic`] - uniform access to the namespaced/cluster-scoped variants
//! - [`reconcilers`] - reconciliation logic for each resource type
//! - [`pdns`] - typed client for the PowerDNS management API
//! - [`indexes`] - secondary indexes for duplicate detection
//! - [`metrics`] - per-resource status gauges
//!
//! ## Example
//!
//! ```rust
//! use powerdns_operator::crd::{ZoneKind, ZoneSpec};
//!
//! let spec = ZoneSpec {
//!     kind: ZoneKind::Native,
//!     nameservers: vec!["ns1.example.org".to_string(), "ns2.example.org".to_string()],
//!     catalog: Some("catalog.example.org.".to_string()),
//!     soa_edit_api: None,
//! };
//! ```

pub mod config;
pub mod constants;
pub mod context;
pub mod crd;
pub mod generic;
pub mod indexes;
pub mod metrics;
pub mod naming;
pub mod pdns;
pub mod reconcilers;
pub mod status_reasons;
