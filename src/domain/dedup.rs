//! Candidate deduplication
//!
//! Merges the candidate lists into unique `(chain, address)` identities,
//! keeping the first occurrence of each key.

use std::collections::HashSet;

use super::token::{CandidateRecord, TokenIdentity};

/// Deduplicate candidate lists, given in boosts-latest, boosts-top,
/// profiles-latest order. Output is in first-seen order.
pub fn dedupe_candidates<'a, I>(lists: I) -> Vec<TokenIdentity>
where
    I: IntoIterator<Item = &'a [CandidateRecord]>,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for record in lists.into_iter().flatten() {
        let identity = record.identity();
        if seen.insert(identity.key()) {
            unique.push(identity);
        }
    }

    unique
}
