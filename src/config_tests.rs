// SPDX-License-Identifier: MIT

//! Unit tests for environment configuration loading.

use super::from_lookup;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |name: &str| map.get(name).cloned()
}

#[test]
fn test_minimal_configuration_applies_defaults() {
    let config = from_lookup(lookup_from(&[
        ("PDNS_API_URL", "http://pdns.dns.svc:8081"),
        ("PDNS_API_KEY", "secret"),
    ]))
    .unwrap();

    assert_eq!(config.pdns.api_url, "http://pdns.dns.svc:8081");
    assert_eq!(config.pdns.api_key, "secret");
    assert_eq!(config.pdns.vhost, "localhost");
    assert_eq!(config.metrics_bind_address, "0.0.0.0:8080");
}

#[test]
fn test_overrides_are_honored() {
    let config = from_lookup(lookup_from(&[
        ("PDNS_API_URL", "https://pdns.example.org"),
        ("PDNS_API_KEY", "secret"),
        ("PDNS_API_VHOST", "tenant-a"),
        ("PDNS_OPERATOR_METRICS_BIND_ADDRESS", "127.0.0.1:9102"),
    ]))
    .unwrap();

    assert_eq!(config.pdns.vhost, "tenant-a");
    assert_eq!(config.metrics_bind_address, "127.0.0.1:9102");
}

#[test]
fn test_missing_api_url_is_rejected() {
    let err = from_lookup(lookup_from(&[("PDNS_API_KEY", "secret")])).unwrap_err();
    assert!(err.to_string().contains("PDNS_API_URL"));
}

#[test]
fn test_missing_api_key_is_rejected() {
    let err = from_lookup(lookup_from(&[("PDNS_API_URL", "http://pdns:8081")])).unwrap_err();
    assert!(err.to_string().contains("PDNS_API_KEY"));
}

#[test]
fn test_malformed_api_url_is_rejected() {
    let err = from_lookup(lookup_from(&[
        ("PDNS_API_URL", "not a url"),
        ("PDNS_API_KEY", "secret"),
    ]))
    .unwrap_err();
    assert!(err.to_string().contains("PDNS_API_URL"));
}

#[test]
fn test_empty_values_count_as_missing() {
    let err = from_lookup(lookup_from(&[
        ("PDNS_API_URL", ""),
        ("PDNS_API_KEY", "secret"),
    ]))
    .unwrap_err();
    assert!(err.to_string().contains("PDNS_API_URL"));
}
