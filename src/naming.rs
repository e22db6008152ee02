// SPDX-License-Identifier: MIT

//! DNS name canonicalization and RRset entry-name assembly.
//!
//! Every name sent to or compared against the PowerDNS backend is canonical:
//! terminated by exactly one trailing dot. The entry name of an RRset is its
//! backend-facing identity, derived from the record label and the parent
//! zone's name.

use crate::crd::RRsetSpec;

/// Canonicalize a DNS name: the empty string stays empty, anything else ends
/// with exactly one trailing dot.
#[must_use]
pub fn make_canonical(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    format!("{}.", name.trim_end_matches('.'))
}

/// Compute the canonical fully qualified name of an RRset.
///
/// A record label already ending with a dot is used verbatim (canonicalized);
/// the conventional apex label `@` resolves to the parent zone itself;
/// anything else is concatenated with the parent zone's name.
#[must_use]
pub fn dns_entry_name(spec: &RRsetSpec) -> String {
    if spec.name == "@" {
        return make_canonical(&spec.zone_ref.name);
    }
    if spec.name.ends_with('.') {
        return make_canonical(&spec.name);
    }
    make_canonical(&format!("{}.{}", spec.name, spec.zone_ref.name))
}

/// Canonicalize a list of names, preserving order.
#[must_use]
pub fn make_canonical_all(names: &[String]) -> Vec<String> {
    names.iter().map(|n| make_canonical(n)).collect()
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod naming_tests;
