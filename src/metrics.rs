// SPDX-License-Identifier: MIT

//! Prometheus metrics for the PowerDNS operator.
//!
//! Four gauges expose the sync status of every reconciled resource:
//!
//! - `zones_status{status,name,namespace}`
//! - `clusterzones_status{status,name}`
//! - `rrsets_status{fqdn,type,status,name,namespace}`
//! - `clusterrrsets_status{fqdn,type,status,name}`
//!
//! Each resource contributes at most one series. Writing a new status
//! replaces the resource's previous series; teardown driven by the metrics
//! finalizer removes it entirely. Because the gauge label set includes the
//! status (and for rrsets the fqdn), the module keeps a shadow map of the
//! label values last written per resource identity so the stale series can be
//! dropped on replacement.

use crate::crd::SyncStatus;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

/// Global Prometheus metrics registry, exposed via the `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Statuses of Zones processed
static ZONES_STATUS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new("zones_status", "Statuses of Zones processed");
    let gauge = GaugeVec::new(opts, &["status", "name", "namespace"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Statuses of ClusterZones processed
static CLUSTER_ZONES_STATUS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new("clusterzones_status", "Statuses of ClusterZones processed");
    let gauge = GaugeVec::new(opts, &["status", "name"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Statuses of RRsets processed
static RRSETS_STATUS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new("rrsets_status", "Statuses of RRsets processed");
    let gauge = GaugeVec::new(opts, &["fqdn", "type", "status", "name", "namespace"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Statuses of ClusterRRsets processed
static CLUSTER_RRSETS_STATUS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new("clusterrrsets_status", "Statuses of ClusterRRsets processed");
    let gauge = GaugeVec::new(opts, &["fqdn", "type", "status", "name"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Label values last written per (family, resource identity). The prometheus
/// crate can only drop a series by its full label vector, so replacement
/// needs the previous values.
static SERIES: LazyLock<Mutex<HashMap<(&'static str, String), Vec<String>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn replace_series(gauge: &GaugeVec, family: &'static str, identity: String, labels: Vec<String>) {
    let mut series = SERIES.lock().unwrap();
    if let Some(previous) = series.get(&(family, identity.clone())) {
        if *previous != labels {
            let refs: Vec<&str> = previous.iter().map(String::as_str).collect();
            let _ = gauge.remove_label_values(&refs);
        }
    }
    let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
    gauge.with_label_values(&refs).set(1.0);
    series.insert((family, identity), labels);
}

fn drop_series(gauge: &GaugeVec, family: &'static str, identity: &str) {
    let mut series = SERIES.lock().unwrap();
    if let Some(previous) = series.remove(&(family, identity.to_string())) {
        let refs: Vec<&str> = previous.iter().map(String::as_str).collect();
        let _ = gauge.remove_label_values(&refs);
    }
}

/// Write the status series for a namespaced Zone.
pub fn update_zone_status(name: &str, namespace: &str, status: SyncStatus) {
    replace_series(
        &ZONES_STATUS,
        "zones",
        format!("{namespace}/{name}"),
        vec![status.to_string(), name.to_string(), namespace.to_string()],
    );
}

/// Remove the status series of a namespaced Zone.
pub fn remove_zone_status(name: &str, namespace: &str) {
    drop_series(&ZONES_STATUS, "zones", &format!("{namespace}/{name}"));
}

/// Write the status series for a ClusterZone.
pub fn update_cluster_zone_status(name: &str, status: SyncStatus) {
    replace_series(
        &CLUSTER_ZONES_STATUS,
        "clusterzones",
        name.to_string(),
        vec![status.to_string(), name.to_string()],
    );
}

/// Remove the status series of a ClusterZone.
pub fn remove_cluster_zone_status(name: &str) {
    drop_series(&CLUSTER_ZONES_STATUS, "clusterzones", name);
}

/// Write the status series for a namespaced RRset.
pub fn update_rrset_status(fqdn: &str, rtype: &str, status: SyncStatus, name: &str, namespace: &str) {
    replace_series(
        &RRSETS_STATUS,
        "rrsets",
        format!("{namespace}/{name}"),
        vec![
            fqdn.to_string(),
            rtype.to_string(),
            status.to_string(),
            name.to_string(),
            namespace.to_string(),
        ],
    );
}

/// Remove the status series of a namespaced RRset.
pub fn remove_rrset_status(name: &str, namespace: &str) {
    drop_series(&RRSETS_STATUS, "rrsets", &format!("{namespace}/{name}"));
}

/// Write the status series for a ClusterRRset.
pub fn update_cluster_rrset_status(fqdn: &str, rtype: &str, status: SyncStatus, name: &str) {
    replace_series(
        &CLUSTER_RRSETS_STATUS,
        "clusterrrsets",
        name.to_string(),
        vec![
            fqdn.to_string(),
            rtype.to_string(),
            status.to_string(),
            name.to_string(),
        ],
    );
}

/// Remove the status series of a ClusterRRset.
pub fn remove_cluster_rrset_status(name: &str) {
    drop_series(&CLUSTER_RRSETS_STATUS, "clusterrrsets", name);
}

/// Gather and encode all metrics in Prometheus text format.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::Collector;

    fn zone_series_count() -> usize {
        ZONES_STATUS.collect()[0].get_metric().len()
    }

    #[test]
    fn test_status_replacement_keeps_single_series() {
        update_zone_status("replace-test", "default", SyncStatus::Pending);
        update_zone_status("replace-test", "default", SyncStatus::Succeeded);
        update_zone_status("replace-test", "default", SyncStatus::Succeeded);

        let text = gather_metrics().unwrap();
        let matching = text
            .lines()
            .filter(|l| l.contains("zones_status") && l.contains("replace-test"))
            .count();
        assert_eq!(matching, 1, "old status series must be replaced");
        assert!(text.contains(r#"status="Succeeded""#));

        remove_zone_status("replace-test", "default");
    }

    #[test]
    fn test_removal_drops_the_series() {
        let before = zone_series_count();
        update_zone_status("remove-test", "default", SyncStatus::Failed);
        assert_eq!(zone_series_count(), before + 1);

        remove_zone_status("remove-test", "default");
        assert_eq!(zone_series_count(), before);
    }

    #[test]
    fn test_rrset_series_carries_fqdn_and_type() {
        update_rrset_status(
            "test.example.org.",
            "A",
            SyncStatus::Succeeded,
            "fqdn-test",
            "default",
        );

        let text = gather_metrics().unwrap();
        assert!(text.contains(r#"fqdn="test.example.org.""#));
        assert!(text.contains(r#"type="A""#));

        remove_rrset_status("fqdn-test", "default");
    }

    #[test]
    fn test_cluster_variants_have_no_namespace_label() {
        update_cluster_zone_status("cluster-test", SyncStatus::Succeeded);
        update_cluster_rrset_status("apex.example.org.", "NS", SyncStatus::Succeeded, "cluster-rr");

        let text = gather_metrics().unwrap();
        let line = text
            .lines()
            .find(|l| l.starts_with("clusterzones_status") && l.contains("cluster-test"))
            .expect("clusterzones series present");
        assert!(!line.contains("namespace="));

        remove_cluster_zone_status("cluster-test");
        remove_cluster_rrset_status("cluster-rr");
    }
}
