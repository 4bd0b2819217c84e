//! Edit-distance quote matcher
//!
//! Finds exact occurrences of the quote first and falls back to approximate
//! occurrences (Levenshtein distance, semi-global alignment) only when there
//! are none. Candidates are then ranked by how well the quote, its context
//! and the expected position agree.

use super::{Match, MatchContext, QuoteMatcher};

const QUOTE_WEIGHT: f64 = 50.0;
const PREFIX_WEIGHT: f64 = 20.0;
const SUFFIX_WEIGHT: f64 = 20.0;
const POSITION_WEIGHT: f64 = 2.0;

/// Upper bound on the edit errors allowed for a quote match
const MAX_QUOTE_ERRORS: usize = 256;

/// Default [`QuoteMatcher`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxMatcher;

impl ApproxMatcher {
    pub fn new() -> Self {
        Self
    }
}

/// A candidate occurrence with its edit distance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    start: usize,
    end: usize,
    errors: usize,
}

impl QuoteMatcher for ApproxMatcher {
    fn match_quote(&self, text: &str, quote: &str, context: &MatchContext<'_>) -> Option<Match> {
        let text: Vec<char> = text.chars().collect();
        let quote: Vec<char> = quote.chars().collect();
        if quote.is_empty() {
            return None;
        }

        let max_errors = (quote.len() / 2).min(MAX_QUOTE_ERRORS);
        let candidates = search(&text, &quote, max_errors);

        // Empty context carries no information
        let prefix: Option<Vec<char>> = context
            .prefix
            .filter(|p| !p.is_empty())
            .map(|p| p.chars().collect());
        let suffix: Option<Vec<char>> = context
            .suffix
            .filter(|s| !s.is_empty())
            .map(|s| s.chars().collect());

        let score = |candidate: &Candidate| {
            let quote_score = 1.0 - candidate.errors as f64 / quote.len() as f64;

            let prefix_score = match &prefix {
                Some(prefix) => {
                    let from = candidate.start.saturating_sub(prefix.len());
                    context_score(&text[from..candidate.start], prefix)
                }
                None => 1.0,
            };

            let suffix_score = match &suffix {
                Some(suffix) => {
                    let to = (candidate.end + suffix.len()).min(text.len());
                    context_score(&text[candidate.end..to], suffix)
                }
                None => 1.0,
            };

            let position_score = match context.hint {
                Some(hint) => {
                    let distance = candidate.start.abs_diff(hint) as f64;
                    1.0 - distance / text.len() as f64
                }
                None => 1.0,
            };

            let raw = QUOTE_WEIGHT * quote_score
                + PREFIX_WEIGHT * prefix_score
                + SUFFIX_WEIGHT * suffix_score
                + POSITION_WEIGHT * position_score;
            raw / (QUOTE_WEIGHT + PREFIX_WEIGHT + SUFFIX_WEIGHT + POSITION_WEIGHT)
        };

        // First candidate wins ties
        let mut best: Option<Match> = None;
        for candidate in &candidates {
            let scored = Match {
                start: candidate.start,
                end: candidate.end,
                score: score(candidate),
            };
            if best.map_or(true, |b| scored.score > b.score) {
                best = Some(scored);
            }
        }
        best
    }
}

/// How closely `text` matches `expected`, in `[0, 1]`
fn context_score(text: &[char], expected: &[char]) -> f64 {
    if text.is_empty() || expected.is_empty() {
        return 0.0;
    }
    let text: String = text.iter().collect();
    let expected_str: String = expected.iter().collect();
    let errors = strsim::levenshtein(&text, &expected_str).min(expected.len());
    1.0 - errors as f64 / expected.len() as f64
}

/// All exact occurrences, or approximate ones when there are none
fn search(text: &[char], pattern: &[char], max_errors: usize) -> Vec<Candidate> {
    let exact = exact_matches(text, pattern);
    if !exact.is_empty() {
        return exact;
    }
    approx_matches(text, pattern, max_errors)
}

fn exact_matches(text: &[char], pattern: &[char]) -> Vec<Candidate> {
    if pattern.is_empty() || pattern.len() > text.len() {
        return Vec::new();
    }
    text.windows(pattern.len())
        .enumerate()
        .filter(|(_, window)| *window == pattern)
        .map(|(start, _)| Candidate {
            start,
            end: start + pattern.len(),
            errors: 0,
        })
        .collect()
}

/// Approximate occurrences with at most `max_errors` edits
///
/// Runs the semi-global edit distance DP one text column at a time, tracking
/// where each alignment started. One candidate is reported per local minimum
/// of the end-position cost, which avoids reporting every shifted variant of
/// the same occurrence.
fn approx_matches(text: &[char], pattern: &[char], max_errors: usize) -> Vec<Candidate> {
    let m = pattern.len();
    if m == 0 || text.is_empty() {
        return Vec::new();
    }

    // cost[i] / start[i]: best alignment of pattern[..i] ending at the current column
    let mut cost: Vec<usize> = (0..=m).collect();
    let mut start: Vec<usize> = vec![0; m + 1];
    let mut next_cost = vec![0; m + 1];
    let mut next_start = vec![0; m + 1];

    // (start, errors) of the full pattern for each end column
    let mut ends: Vec<(usize, usize)> = Vec::with_capacity(text.len());

    for (j, &ch) in text.iter().enumerate() {
        next_cost[0] = 0;
        next_start[0] = j + 1;

        for i in 1..=m {
            let substitute = cost[i - 1] + usize::from(pattern[i - 1] != ch);
            let skip_text = cost[i] + 1;
            let skip_pattern = next_cost[i - 1] + 1;

            if substitute <= skip_text && substitute <= skip_pattern {
                next_cost[i] = substitute;
                next_start[i] = start[i - 1];
            } else if skip_text <= skip_pattern {
                next_cost[i] = skip_text;
                next_start[i] = start[i];
            } else {
                next_cost[i] = skip_pattern;
                next_start[i] = next_start[i - 1];
            }
        }

        std::mem::swap(&mut cost, &mut next_cost);
        std::mem::swap(&mut start, &mut next_start);
        ends.push((start[m], cost[m]));
    }

    let mut candidates = Vec::new();
    for (j, &(match_start, errors)) in ends.iter().enumerate() {
        let end = j + 1;
        if errors > max_errors || match_start >= end {
            continue;
        }
        let falls_from_left = j == 0 || ends[j - 1].1 >= errors;
        let rises_to_right = j + 1 == ends.len() || ends[j + 1].1 > errors;
        if falls_from_left && rises_to_right {
            candidates.push(Candidate {
                start: match_start,
                end,
                errors,
            });
        }
    }
    candidates
}
