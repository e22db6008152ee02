// SPDX-License-Identifier: MIT

//! Status condition helpers for Kubernetes resources.
//!
//! The operator maintains a single `Available` condition per resource. The
//! helpers implement the standard condition semantics: the transition time
//! only moves when the condition's status actually flips, which is also why
//! reconciles of a modified resource first drop the condition entirely (a
//! rewrite after a spec change must be observable through a fresh
//! `lastTransitionTime` even when the outcome is unchanged).

use crate::crd::Condition;
use crate::status_reasons::CONDITION_TYPE_AVAILABLE;
use chrono::Utc;

/// Create an `Available` condition carrying the given outcome.
#[must_use]
pub fn available_condition(available: bool, reason: &str, message: &str) -> Condition {
    Condition {
        r#type: CONDITION_TYPE_AVAILABLE.to_string(),
        status: if available { "True" } else { "False" }.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Merge a condition into the list following the standard semantics: a new
/// type is appended; an existing one is replaced, keeping its transition
/// time when the status value did not change.
pub fn set_condition(conditions: &mut Vec<Condition>, condition: Condition) {
    match conditions.iter_mut().find(|c| c.r#type == condition.r#type) {
        Some(existing) => {
            let transition_time = if existing.status == condition.status {
                existing.last_transition_time.clone()
            } else {
                condition.last_transition_time.clone()
            };
            *existing = Condition {
                last_transition_time: transition_time,
                ..condition
            };
        }
        None => conditions.push(condition),
    }
}

/// Remove a condition by type. Returns true when one was present.
pub fn remove_condition(conditions: &mut Vec<Condition>, condition_type: &str) -> bool {
    let before = conditions.len();
    conditions.retain(|c| c.r#type != condition_type);
    conditions.len() != before
}

/// Find a condition by type.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
