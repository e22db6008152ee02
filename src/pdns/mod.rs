// SPDX-License-Identifier: MIT

//! PowerDNS backend abstraction.
//!
//! The reconcile cores consume two capability sets, [`ZonesApi`] and
//! [`RecordsApi`], bundled in a [`PdnsClient`]. The production implementation
//! is [`PdnsHttpClient`], a thin typed layer over the authoritative server's
//! HTTP management API (v1); tests substitute an in-memory double.
//!
//! All names passed to these operations are expected in canonical form (see
//! [`crate::naming`]); the client performs no name manipulation of its own.

pub mod error;
pub mod types;

#[cfg(test)]
pub mod mock;

pub use error::PdnsError;
pub use types::{Comment, Record, Rrset, RrsetChange, Zone};

use crate::constants::OPERATOR_ACCOUNT;
use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use std::sync::Arc;

/// Zone-level operations against the backend.
#[async_trait]
pub trait ZonesApi: Send + Sync {
    /// Fetch a zone snapshot (metadata only, no rrsets).
    async fn get(&self, zone: &str) -> Result<Zone, PdnsError>;

    /// Create a zone; fails with [`PdnsError::Conflict`] if the canonical
    /// name is taken. Returns the created snapshot with the backend-assigned
    /// serial.
    async fn add(&self, zone: &Zone) -> Result<Zone, PdnsError>;

    /// Apply a metadata mutation (kind, catalog, SOA-EDIT-API).
    async fn change(&self, zone_name: &str, zone: &Zone) -> Result<(), PdnsError>;

    /// Remove the zone. Callers treat [`PdnsError::NotFound`] as success.
    async fn delete(&self, zone_name: &str) -> Result<(), PdnsError>;
}

/// RRset-level operations against the backend.
#[async_trait]
pub trait RecordsApi: Send + Sync {
    /// List RRsets matching the queried name and type.
    ///
    /// The server is known to over-report comments of adjacent RRsets in the
    /// same response; callers must filter by exact canonical name and type
    /// before any equality check.
    async fn get(&self, zone: &str, name: &str, rtype: &str) -> Result<Vec<Rrset>, PdnsError>;

    /// Replace the RRset in place, including its optional comment.
    async fn change(&self, zone: &str, change: RrsetChange) -> Result<(), PdnsError>;

    /// Remove the RRset.
    async fn delete(&self, zone: &str, name: &str, rtype: &str) -> Result<(), PdnsError>;
}

/// The two backend capability sets consumed by the reconcile cores.
#[derive(Clone)]
pub struct PdnsClient {
    /// Zone-level operations.
    pub zones: Arc<dyn ZonesApi>,
    /// RRset-level operations.
    pub records: Arc<dyn RecordsApi>,
}

impl PdnsClient {
    /// Bundle one implementation serving both capability sets.
    pub fn new<C>(client: C) -> Self
    where
        C: ZonesApi + RecordsApi + 'static,
    {
        let shared = Arc::new(client);
        PdnsClient {
            zones: shared.clone(),
            records: shared,
        }
    }
}

/// HTTP implementation of both capability sets.
pub struct PdnsHttpClient {
    http: reqwest::Client,
    base_url: String,
    vhost: String,
}

impl PdnsHttpClient {
    /// Build a client for the given API endpoint.
    ///
    /// The API key is installed as a default `X-API-Key` header so it never
    /// appears at call sites.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not a valid header value or the
    /// underlying HTTP client cannot be constructed.
    pub fn new(api_url: &str, api_key: &str, vhost: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key).context("PDNS API key is not a valid header value")?;
        key.set_sensitive(true);
        headers.insert("X-API-Key", key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("failed to build PowerDNS HTTP client")?;

        Ok(PdnsHttpClient {
            http,
            base_url: api_url.trim_end_matches('/').to_string(),
            vhost: vhost.to_string(),
        })
    }

    fn zones_url(&self) -> String {
        format!("{}/api/v1/servers/{}/zones", self.base_url, self.vhost)
    }

    fn zone_url(&self, zone: &str) -> String {
        format!("{}/{}", self.zones_url(), zone)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, PdnsError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(PdnsError::from_response(status, &body))
    }
}

#[async_trait]
impl ZonesApi for PdnsHttpClient {
    async fn get(&self, zone: &str) -> Result<Zone, PdnsError> {
        let resp = self
            .http
            .get(self.zone_url(zone))
            .query(&[("rrsets", "false")])
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        Ok(resp.json::<Zone>().await?)
    }

    async fn add(&self, zone: &Zone) -> Result<Zone, PdnsError> {
        let resp = self.http.post(self.zones_url()).json(zone).send().await?;
        let resp = Self::check(resp).await?;
        Ok(resp.json::<Zone>().await?)
    }

    async fn change(&self, zone_name: &str, zone: &Zone) -> Result<(), PdnsError> {
        let resp = self
            .http
            .put(self.zone_url(zone_name))
            .json(zone)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn delete(&self, zone_name: &str) -> Result<(), PdnsError> {
        let resp = self.http.delete(self.zone_url(zone_name)).send().await?;
        Self::check(resp).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordsApi for PdnsHttpClient {
    async fn get(&self, zone: &str, name: &str, rtype: &str) -> Result<Vec<Rrset>, PdnsError> {
        let resp = self
            .http
            .get(self.zone_url(zone))
            .query(&[("rrset_name", name), ("rrset_type", rtype)])
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        let zone = resp.json::<Zone>().await?;
        Ok(zone.rrsets)
    }

    async fn change(&self, zone: &str, change: RrsetChange) -> Result<(), PdnsError> {
        let comments = change
            .comment
            .map(|content| {
                vec![Comment {
                    content,
                    account: Some(OPERATOR_ACCOUNT.to_string()),
                    modified_at: None,
                }]
            })
            .unwrap_or_default();

        let rrset = Rrset {
            name: change.name,
            rtype: change.rtype,
            ttl: Some(change.ttl),
            changetype: Some("REPLACE".to_string()),
            records: change
                .records
                .into_iter()
                .map(|content| Record {
                    content,
                    disabled: false,
                })
                .collect(),
            comments,
        };

        let resp = self
            .http
            .patch(self.zone_url(zone))
            .json(&serde_json::json!({ "rrsets": [rrset] }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn delete(&self, zone: &str, name: &str, rtype: &str) -> Result<(), PdnsError> {
        let rrset = Rrset {
            name: name.to_string(),
            rtype: rtype.to_string(),
            ttl: None,
            changetype: Some("DELETE".to_string()),
            records: Vec::new(),
            comments: Vec::new(),
        };

        let resp = self
            .http
            .patch(self.zone_url(zone))
            .json(&serde_json::json!({ "rrsets": [rrset] }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}
