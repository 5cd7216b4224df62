//! Integration tests for fuzzy credential ranking.

use chrono::{DateTime, Duration, TimeZone, Utc};
use kosh::search::{
    best_match, levenshtein, rank, score, DEFAULT_MIN_SCORE, LABEL_WEIGHT, MAX_STRING_SCORE,
    PREFIX_BOOST, USER_WEIGHT,
};
use kosh::vault::{CredentialRecord, SealedSecret, SecretBytes};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn record(
    id: i64,
    label: &str,
    user: &str,
    count: i64,
    accessed: Option<DateTime<Utc>>,
) -> CredentialRecord {
    CredentialRecord {
        id,
        label: label.to_string(),
        user: user.to_string(),
        sealed: SealedSecret {
            ephemeral_public_key: SecretBytes::from([0u8; 32]),
            ciphertext: SecretBytes::new(vec![0u8; 32]),
            nonce: SecretBytes::from([0u8; 24]),
        },
        access_count: count,
        accessed_at: accessed,
        created_at: now(),
        updated_at: now(),
    }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn prefix_query_prefers_github_over_gitlab_when_more_used() {
    let records = vec![
        record(1, "gitlab", "bob", 0, None),
        record(2, "github", "alice", 3, Some(now() - Duration::hours(1))),
    ];

    let ranked = rank("git", "", &records, DEFAULT_MIN_SCORE, now());
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].record.label, "github");
    assert_eq!(ranked[1].record.label, "gitlab");
}

#[test]
fn exact_label_and_user_score() {
    let s = score("github", "alice", "github", "alice", 0, None, now());
    assert!(approx(s, MAX_STRING_SCORE * (LABEL_WEIGHT + USER_WEIGHT)));
}

#[test]
fn prefix_score_matches_formula() {
    // levenshtein("git", "github") = 3, longest = 6 -> similarity 0.5
    let s = score("git", "", "github", "alice", 0, None, now());
    assert!(approx(s, (0.5 + PREFIX_BOOST) * LABEL_WEIGHT));
}

#[test]
fn unrelated_records_fall_below_threshold() {
    let records = vec![
        record(1, "github", "alice", 0, None),
        record(2, "bank", "zed", 0, None),
    ];
    let ranked = rank("github", "", &records, DEFAULT_MIN_SCORE, now());
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].record.label, "github");
}

#[test]
fn ranking_is_deterministic() {
    let records = vec![
        record(1, "mail", "a", 2, Some(now() - Duration::hours(30))),
        record(2, "gmail", "b", 9, Some(now() - Duration::hours(2))),
        record(3, "hotmail", "c", 0, None),
        record(4, "mailbox", "d", 1, None),
    ];

    let first: Vec<i64> = rank("mail", "", &records, 0.0, now())
        .iter()
        .map(|r| r.record.id)
        .collect();
    for _ in 0..5 {
        let again: Vec<i64> = rank("mail", "", &records, 0.0, now())
            .iter()
            .map(|r| r.record.id)
            .collect();
        assert_eq!(first, again);
    }
}

#[test]
fn ties_break_on_label_then_user() {
    // Empty query and no history: every score is zero.
    let records = vec![
        record(1, "b", "y", 0, None),
        record(2, "a", "z", 0, None),
        record(3, "a", "x", 0, None),
    ];
    let ranked = rank("", "", &records, 0.0, now());
    let ids: Vec<i64> = ranked.iter().map(|r| r.record.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
}

#[test]
fn equal_scores_fall_back_to_label_order() {
    let at = Some(now());
    let records = vec![record(1, "aab", "u", 1, at), record(2, "aaa", "u", 1, at)];
    let ranked = rank("aa", "", &records, 0.0, now());
    assert!(approx(ranked[0].score, ranked[1].score));
    assert_eq!(ranked[0].record.label, "aaa");
}

#[test]
fn best_match_is_none_when_nothing_clears_threshold() {
    let records = vec![record(1, "github", "alice", 0, None)];
    assert!(best_match("zzzzzz", "", &records, DEFAULT_MIN_SCORE, now()).is_none());
    assert!(best_match("", "", &[], DEFAULT_MIN_SCORE, now()).is_none());
}

#[test]
fn higher_threshold_keeps_fewer_records() {
    let records = vec![
        record(1, "github", "alice", 0, None),
        record(2, "gitlab", "bob", 0, None),
        record(3, "gist", "carol", 0, None),
    ];
    let loose = rank("github", "", &records, 0.2, now()).len();
    let strict = rank("github", "", &records, 2.0, now()).len();
    assert!(strict < loose);
    assert_eq!(strict, 1);
}

#[test]
fn recent_access_outranks_stale_access() {
    let records = vec![
        record(1, "github", "old", 0, Some(now() - Duration::days(30))),
        record(2, "github", "new", 0, Some(now() - Duration::minutes(5))),
    ];
    let ranked = rank("github", "", &records, 0.0, now());
    assert_eq!(ranked[0].record.user, "new");
}

#[test]
fn levenshtein_is_exported() {
    assert_eq!(levenshtein("kitten", "sitting"), 3);
}
