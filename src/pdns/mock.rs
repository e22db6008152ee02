// SPDX-License-Identifier: MIT

//! In-memory PowerDNS double for unit tests.
//!
//! Implements both capability sets over a mutex-guarded state, records every
//! call so tests can assert on idempotence (no `change` issued when nothing
//! drifted), and supports error injection for the failure paths.

use super::{PdnsError, Record, RecordsApi, Rrset, RrsetChange, Zone, ZonesApi};
use crate::constants::OPERATOR_ACCOUNT;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Serial assigned to newly created zones, YYYYMMDDnn shaped.
pub const INITIAL_SERIAL: u32 = 2024010101;

#[derive(Default)]
pub struct MockState {
    pub zones: HashMap<String, Zone>,
    pub rrsets: HashMap<(String, String, String), Rrset>,
    pub calls: Vec<String>,
    pub zones_add_error: Option<PdnsError>,
    pub records_change_error: Option<PdnsError>,
}

/// The mock backend. Clone-free; share via `Arc` through [`super::PdnsClient`].
#[derive(Default)]
pub struct MockPdns {
    pub state: Mutex<MockState>,
}

impl MockPdns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded so far, formatted as "op target".
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Count of calls whose formatted form starts with the given prefix.
    pub fn call_count(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Current serial of a zone, if present.
    pub fn zone_serial(&self, zone: &str) -> Option<u32> {
        self.state
            .lock()
            .unwrap()
            .zones
            .get(zone)
            .and_then(|z| z.serial)
    }
}

fn bump_serial(zone: &mut Zone) {
    zone.serial = Some(zone.serial.unwrap_or(INITIAL_SERIAL) + 1);
    zone.edited_serial = zone.serial;
}

#[async_trait]
impl ZonesApi for MockPdns {
    async fn get(&self, zone: &str) -> Result<Zone, PdnsError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("zones.get {zone}"));
        state.zones.get(zone).cloned().ok_or(PdnsError::NotFound)
    }

    async fn add(&self, zone: &Zone) -> Result<Zone, PdnsError> {
        let mut state = self.state.lock().unwrap();
        let name = zone.name.clone().unwrap_or_default();
        state.calls.push(format!("zones.add {name}"));
        if let Some(err) = state.zones_add_error.clone() {
            return Err(err);
        }
        if state.zones.contains_key(&name) {
            return Err(PdnsError::Conflict);
        }

        let mut created = zone.clone();
        created.id = Some(name.clone());
        created.serial = Some(INITIAL_SERIAL);
        created.edited_serial = Some(INITIAL_SERIAL);
        created.soa_edit_api = zone
            .soa_edit_api
            .clone()
            .or_else(|| Some("DEFAULT".to_string()));

        // The backend materializes the apex NS RRset from the nameservers.
        if !created.nameservers.is_empty() {
            let apex = Rrset {
                name: name.clone(),
                rtype: "NS".to_string(),
                ttl: Some(crate::constants::DEFAULT_TTL_FOR_NS_RECORDS),
                changetype: None,
                records: created
                    .nameservers
                    .iter()
                    .map(|ns| Record {
                        content: ns.clone(),
                        disabled: false,
                    })
                    .collect(),
                comments: Vec::new(),
            };
            state
                .rrsets
                .insert((name.clone(), name.clone(), "NS".to_string()), apex);
        }

        state.zones.insert(name, created.clone());
        Ok(created)
    }

    async fn change(&self, zone_name: &str, zone: &Zone) -> Result<(), PdnsError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("zones.change {zone_name}"));
        let Some(existing) = state.zones.get_mut(zone_name) else {
            return Err(PdnsError::NotFound);
        };
        if zone.kind.is_some() {
            existing.kind = zone.kind.clone();
        }
        existing.catalog = zone.catalog.clone();
        if zone.soa_edit_api.is_some() {
            existing.soa_edit_api = zone.soa_edit_api.clone();
        }
        bump_serial(existing);
        Ok(())
    }

    async fn delete(&self, zone_name: &str) -> Result<(), PdnsError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("zones.delete {zone_name}"));
        if state.zones.remove(zone_name).is_none() {
            return Err(PdnsError::NotFound);
        }
        state.rrsets.retain(|(zone, _, _), _| zone != zone_name);
        Ok(())
    }
}

#[async_trait]
impl RecordsApi for MockPdns {
    async fn get(&self, zone: &str, name: &str, rtype: &str) -> Result<Vec<Rrset>, PdnsError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("records.get {name} {rtype}"));
        if !state.zones.contains_key(zone) {
            return Err(PdnsError::NotFound);
        }
        Ok(state
            .rrsets
            .get(&(zone.to_string(), name.to_string(), rtype.to_string()))
            .cloned()
            .into_iter()
            .collect())
    }

    async fn change(&self, zone: &str, change: RrsetChange) -> Result<(), PdnsError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(format!("records.change {} {}", change.name, change.rtype));
        if let Some(err) = state.records_change_error.clone() {
            return Err(err);
        }
        if !state.zones.contains_key(zone) {
            return Err(PdnsError::NotFound);
        }

        let rrset = Rrset {
            name: change.name.clone(),
            rtype: change.rtype.clone(),
            ttl: Some(change.ttl),
            changetype: None,
            records: change
                .records
                .iter()
                .map(|content| Record {
                    content: content.clone(),
                    disabled: false,
                })
                .collect(),
            comments: change
                .comment
                .map(|content| {
                    vec![super::Comment {
                        content,
                        account: Some(OPERATOR_ACCOUNT.to_string()),
                        modified_at: None,
                    }]
                })
                .unwrap_or_default(),
        };
        state
            .rrsets
            .insert((zone.to_string(), change.name, change.rtype), rrset);
        if let Some(existing) = state.zones.get_mut(zone) {
            bump_serial(existing);
        }
        Ok(())
    }

    async fn delete(&self, zone: &str, name: &str, rtype: &str) -> Result<(), PdnsError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("records.delete {name} {rtype}"));
        if !state.zones.contains_key(zone) {
            return Err(PdnsError::NotFound);
        }
        let removed = state
            .rrsets
            .remove(&(zone.to_string(), name.to_string(), rtype.to_string()));
        if removed.is_some() {
            if let Some(existing) = state.zones.get_mut(zone) {
                bump_serial(existing);
            }
        }
        Ok(())
    }
}
