//! Fuzzy scoring of stored credentials against a `(label, user)` query.
//!
//! A candidate's score blends four signals:
//!
//! | signal    | weight | value                                   |
//! |-----------|--------|-----------------------------------------|
//! | label     | 0.60   | string score of query label vs. label   |
//! | user      | 0.20   | string score of query user vs. user     |
//! | recency   | 0.12   | `1 / (1 + hours_since_access / 12)`     |
//! | frequency | 0.05   | `ln(access_count + 1) / 5`              |
//!
//! The string score is normalized Levenshtein similarity plus a boost for
//! prefix or substring matches, capped at `MAX_STRING_SCORE`; an exact
//! match scores the cap directly.

use std::cmp::Ordering;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::distance::levenshtein;
use crate::vault::CredentialRecord;

pub const LABEL_WEIGHT: f64 = 0.60;
pub const USER_WEIGHT: f64 = 0.20;
pub const RECENCY_WEIGHT: f64 = 0.12;
pub const FREQUENCY_WEIGHT: f64 = 0.05;

pub const PREFIX_BOOST: f64 = 1.0;
pub const SUBSTRING_BOOST: f64 = 0.5;

pub const MAX_STRING_SCORE: f64 = 5.0;

/// Default minimum score for a candidate to be returned.
pub const DEFAULT_MIN_SCORE: f64 = 0.2;

/// Hours after which the recency signal has halved.
const RECENCY_HALF_LIFE_HOURS: f64 = 12.0;

/// A credential together with the score it earned for one query.
#[derive(Debug, Clone, Copy)]
pub struct RankedCredential<'a> {
    pub record: &'a CredentialRecord,
    pub score: f64,
}

/// Score one candidate.
///
/// Query and target strings are compared case-insensitively.  An empty
/// query field contributes nothing.
pub fn score(
    query_label: &str,
    query_user: &str,
    label: &str,
    user: &str,
    access_count: i64,
    last_access: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    let query_label = query_label.to_lowercase();
    let query_user = query_user.to_lowercase();

    let label_score = if query_label.is_empty() {
        0.0
    } else {
        string_score(&query_label, &label.to_lowercase()) * LABEL_WEIGHT
    };

    let user_score = if query_user.is_empty() {
        0.0
    } else {
        string_score(&query_user, &user.to_lowercase()) * USER_WEIGHT
    };

    label_score
        + user_score
        + recency_score(last_access, now) * RECENCY_WEIGHT
        + frequency_score(access_count) * FREQUENCY_WEIGHT
}

/// Score every record, keep those at or above `threshold`, and order them
/// best first.
///
/// Ties on score go to the more frequently accessed record, then to the
/// alphabetically smaller label, then user.
pub fn rank<'a>(
    query_label: &str,
    query_user: &str,
    records: &'a [CredentialRecord],
    threshold: f64,
    now: DateTime<Utc>,
) -> Vec<RankedCredential<'a>> {
    let started = Instant::now();

    let mut ranked: Vec<RankedCredential<'a>> = records
        .iter()
        .map(|record| RankedCredential {
            record,
            score: score(
                query_label,
                query_user,
                &record.label,
                &record.user,
                record.access_count,
                record.accessed_at,
                now,
            ),
        })
        .filter(|candidate| candidate.score >= threshold)
        .collect();

    ranked.sort_by(compare);

    debug!(
        query_label,
        query_user,
        candidates = records.len(),
        matches = ranked.len(),
        best_score = ranked.first().map(|r| r.score),
        elapsed = ?started.elapsed(),
        "ranked credentials"
    );

    ranked
}

/// The top-ranked record, if any clears `threshold`.
pub fn best_match<'a>(
    query_label: &str,
    query_user: &str,
    records: &'a [CredentialRecord],
    threshold: f64,
    now: DateTime<Utc>,
) -> Option<RankedCredential<'a>> {
    rank(query_label, query_user, records, threshold, now)
        .into_iter()
        .next()
}

fn compare(a: &RankedCredential<'_>, b: &RankedCredential<'_>) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.record.access_count.cmp(&a.record.access_count))
        .then_with(|| a.record.label.cmp(&b.record.label))
        .then_with(|| a.record.user.cmp(&b.record.user))
}

fn string_score(query: &str, target: &str) -> f64 {
    if query == target {
        return MAX_STRING_SCORE;
    }

    let mut sim = similarity(query, target);
    if target.starts_with(query) {
        sim += PREFIX_BOOST;
    } else if target.contains(query) {
        sim += SUBSTRING_BOOST;
    }

    sim.min(MAX_STRING_SCORE)
}

/// `1 - distance / longest`, in characters.
fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

fn recency_score(last_access: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(last) = last_access else {
        return 0.0;
    };
    let now = now.max(last);
    let hours = (now - last).num_milliseconds() as f64 / 3_600_000.0;
    1.0 / (1.0 + hours / RECENCY_HALF_LIFE_HOURS)
}

fn frequency_score(count: i64) -> f64 {
    if count <= 0 {
        return 0.0;
    }
    (count as f64 + 1.0).ln() / 5.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn exact_match_is_capped() {
        assert!(approx(string_score("github", "github"), MAX_STRING_SCORE));
    }

    #[test]
    fn prefix_beats_substring() {
        let prefix = string_score("git", "github");
        let substring = string_score("hub", "github");
        assert!(approx(prefix, 0.5 + PREFIX_BOOST));
        assert!(approx(substring, 0.5 + SUBSTRING_BOOST));
        assert!(prefix > substring);
    }

    #[test]
    fn empty_query_contributes_nothing() {
        let now = Utc::now();
        let s = score("", "", "github", "alice", 0, None, now);
        assert!(approx(s, 0.0));
    }

    #[test]
    fn comparison_ignores_case() {
        let now = Utc::now();
        let upper = score("GitHub", "ALICE", "github", "alice", 0, None, now);
        let lower = score("github", "alice", "GITHUB", "Alice", 0, None, now);
        assert!(approx(upper, lower));
        assert!(approx(upper, MAX_STRING_SCORE * (LABEL_WEIGHT + USER_WEIGHT)));
    }

    #[test]
    fn recency_decays_with_time() {
        let now = Utc::now();
        assert!(approx(recency_score(None, now), 0.0));
        assert!(approx(recency_score(Some(now), now), 1.0));
        assert!(approx(
            recency_score(Some(now - Duration::hours(12)), now),
            0.5
        ));
    }

    #[test]
    fn future_access_is_treated_as_now() {
        let now = Utc::now();
        let future = now + Duration::hours(5);
        assert!(approx(recency_score(Some(future), now), 1.0));
    }

    fn credential(label: &str, access_count: i64) -> CredentialRecord {
        let at = Utc::now();
        CredentialRecord {
            id: access_count,
            label: label.to_string(),
            user: "alice".to_string(),
            sealed: crate::vault::SealedSecret {
                ephemeral_public_key: crate::vault::SecretBytes::new(vec![0u8; 32]),
                ciphertext: crate::vault::SecretBytes::new(vec![0u8; 32]),
                nonce: crate::vault::SecretBytes::new(vec![0u8; 24]),
            },
            access_count,
            accessed_at: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn equal_scores_prefer_the_more_used_credential() {
        let busy = credential("zulip", 5);
        let idle = credential("asana", 1);
        let a = RankedCredential { record: &busy, score: 0.75 };
        let b = RankedCredential { record: &idle, score: 0.75 };

        assert_eq!(compare(&a, &b), Ordering::Less);
        assert_eq!(compare(&b, &a), Ordering::Greater);

        let mut ranked = vec![b, a];
        ranked.sort_by(compare);
        assert_eq!(ranked[0].record.label, "zulip");
    }

    #[test]
    fn frequency_is_logarithmic() {
        assert!(approx(frequency_score(0), 0.0));
        assert!(approx(frequency_score(-3), 0.0));
        assert!(approx(frequency_score(1), 2f64.ln() / 5.0));
        assert!(frequency_score(100) > frequency_score(10));
    }
}
