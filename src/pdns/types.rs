// SPDX-License-Identifier: MIT

//! Wire model of the PowerDNS authoritative API (v1).
//!
//! Field names follow the JSON the server emits; everything the operator does
//! not set stays `None` and is omitted on serialization so partial updates
//! (zone metadata PUT, rrsets PATCH) only carry the intended mutation.

use serde::{Deserialize, Serialize};

/// A zone as represented by the backend.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Zone {
    /// Opaque zone id, in practice the canonical name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Canonical zone name ("example.org.").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Kind of the zone ("Native", "Master", ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// The SOA serial number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<u32>,

    /// The SOA serial notifications have been sent out for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notified_serial: Option<u32>,

    /// The SOA serial as seen in query responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_serial: Option<u32>,

    /// Masters for "Slave" kind zones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub masters: Vec<String>,

    /// Whether the zone is DNSSEC signed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnssec: Option<bool>,

    /// Nameservers, only honored by the backend on zone creation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nameservers: Vec<String>,

    /// The catalog this zone is a member of.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,

    /// SOA-EDIT-API metadata item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soa_edit_api: Option<String>,

    /// RRsets of the zone, present on GET responses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rrsets: Vec<Rrset>,
}

/// One resource record set inside a zone.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Rrset {
    /// Canonical name of the RRset.
    pub name: String,

    /// Record type ("A", "NS", ...).
    #[serde(rename = "type")]
    pub rtype: String,

    /// TTL in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,

    /// "REPLACE" or "DELETE" when patching; absent on reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changetype: Option<String>,

    /// Record contents in zone order.
    #[serde(default)]
    pub records: Vec<Record>,

    /// Comments attached to the RRset.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}

/// A single record inside an RRset.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Record {
    /// Record content ("192.0.2.1", "ns1.example.org.", ...).
    pub content: String,

    /// Whether the record is disabled.
    #[serde(default)]
    pub disabled: bool,
}

/// A comment attached to an RRset.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Comment {
    /// Comment text.
    pub content: String,

    /// Account that wrote the comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    /// Modification timestamp (UNIX seconds), set by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<u64>,
}

/// Declared shape of an RRset replacement, as issued by the reconcilers.
#[derive(Clone, Debug)]
pub struct RrsetChange {
    /// Canonical name of the RRset.
    pub name: String,

    /// Record type.
    pub rtype: String,

    /// TTL in seconds.
    pub ttl: u32,

    /// Record contents in declared order.
    pub records: Vec<String>,

    /// Optional comment, attributed to the operator account.
    pub comment: Option<String>,
}
