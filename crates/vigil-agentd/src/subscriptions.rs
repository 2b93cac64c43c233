//! Subscription list helpers.
//!
//! Reconciliation compares the session's current subscription list against
//! the stored entity configuration. [`diff`] is a linear two-pointer merge
//! and therefore requires sorted inputs; [`sort_subscriptions`] establishes
//! that precondition and drops empty names.

use uuid::Uuid;

/// Drop empty subscription names and sort the rest. Idempotent.
pub fn sort_subscriptions(subscriptions: Vec<String>) -> Vec<String> {
    let mut subscriptions: Vec<String> = subscriptions
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    subscriptions.sort();
    subscriptions
}

/// Compare two sorted subscription lists, returning the names added and
/// removed in `new` relative to `old`.
pub fn diff(old: &[String], new: &[String]) -> (Vec<String>, Vec<String>) {
    let mut added = Vec::new();
    let mut removed = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < old.len() && j < new.len() {
        match old[i].cmp(&new[j]) {
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => {
                removed.push(old[i].clone());
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                added.push(new[j].clone());
                j += 1;
            }
        }
    }

    removed.extend_from_slice(&old[i..]);
    added.extend_from_slice(&new[j..]);
    (added, removed)
}

/// The bus consumer identifier for one agent session.
///
/// Includes a fresh UUID so an agent reconnecting before its previous
/// session finishes tearing down cannot collide with its own earlier
/// subscriptions.
pub fn agent_consumer_id(namespace: &str, name: &str) -> String {
    format!("{namespace}:{name}-{}", Uuid::new_v4())
}
