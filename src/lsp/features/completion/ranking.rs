//! Filtering and ranking of native completion candidates
//!
//! The search token is the last whitespace-delimited word of the line up to
//! the cursor, upper-cased. Filtering depends on how many words precede it:
//!
//! - Prefix mode (the token is the only word): the native name must start
//!   with the token.
//! - Sub-word mode (other words precede it): some `_`-separated sub-word of
//!   the name must start with the token.
//!
//! Score (higher is better):
//! 1. +100 for every sub-word that starts with the token
//! 2. Greedy left-to-right subsequence scan of the token's characters: a hit
//!    directly after the previous hit extends the run and adds `run * 10`; a
//!    hit further away resets the run and adds 1; a miss adds nothing
//!
//! Sorting is stable, so equal scores keep the candidate order.

use std::sync::Arc;

use crate::natives::NativeDescriptor;

/// How the token is matched against candidate names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Prefix,
    SubWord,
}

/// Normalized search input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub token: String,
    pub mode: MatchMode,
}

impl SearchQuery {
    pub fn new(token: impl Into<String>, mode: MatchMode) -> Self {
        Self {
            token: token.into().to_uppercase(),
            mode,
        }
    }

    /// Build the query from the text between line start and cursor.
    pub fn from_line_prefix(prefix: &str) -> Self {
        let words: Vec<&str> = prefix.split_whitespace().collect();
        let token = words.last().copied().unwrap_or("");
        let mode = if words.len() <= 1 {
            MatchMode::Prefix
        } else {
            MatchMode::SubWord
        };
        Self::new(token, mode)
    }

    /// Filter predicate on an upper-cased name.
    pub fn matches(&self, name: &str) -> bool {
        match self.mode {
            MatchMode::Prefix => name.starts_with(&self.token),
            MatchMode::SubWord => name.split('_').any(|word| word.starts_with(&self.token)),
        }
    }
}

/// A candidate that passed the filter, with its score.
#[derive(Debug, Clone)]
pub struct ScoredMatch {
    pub native: Arc<NativeDescriptor>,
    pub score: u32,
}

/// Score an upper-cased `name` against an upper-cased `token`.
pub fn match_score(name: &str, token: &str) -> u32 {
    let sub_words = name.split('_').filter(|word| word.starts_with(token)).count() as u32;
    let mut score = sub_words * 100;

    let name: Vec<char> = name.chars().collect();
    let mut run = 0;
    let mut next = 0;
    for wanted in token.chars() {
        let Some(offset) = name.get(next..).and_then(|rest| rest.iter().position(|c| *c == wanted))
        else {
            continue;
        };
        if offset == 0 {
            run += 1;
            score += run * 10;
        } else {
            run = 0;
            score += 1;
        }
        next += offset + 1;
    }

    score
}

/// Filter `candidates` by `query` and order them best first.
///
/// # Arguments
/// * `candidates` - Natives visible to the document
/// * `query` - Token and match mode
/// * `max_results` - Optional cap applied after sorting
///
/// # Returns
/// Matches sorted by descending score
pub fn rank(
    candidates: &[Arc<NativeDescriptor>],
    query: &SearchQuery,
    max_results: Option<usize>,
) -> Vec<ScoredMatch> {
    let mut matches: Vec<ScoredMatch> = candidates
        .iter()
        .filter_map(|native| {
            let name = native.name.to_uppercase();
            query.matches(&name).then(|| ScoredMatch {
                native: Arc::clone(native),
                score: match_score(&name, &query.token),
            })
        })
        .collect();

    matches.sort_by(|a, b| b.score.cmp(&a.score));
    if let Some(max) = max_results {
        matches.truncate(max);
    }
    matches
}
