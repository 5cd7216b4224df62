//! Fuzzy credential search.

mod distance;
mod rank;

pub use distance::levenshtein;
pub use rank::{
    best_match, rank, score, RankedCredential, DEFAULT_MIN_SCORE, FREQUENCY_WEIGHT, LABEL_WEIGHT,
    MAX_STRING_SCORE, PREFIX_BOOST, RECENCY_WEIGHT, SUBSTRING_BOOST, USER_WEIGHT,
};
