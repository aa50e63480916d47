//! String similarity cascade.
//!
//! Strategies run in order and the first one reaching the threshold wins.
//! Cheap, strict metrics come first; the permissive subsequence check last
//! ("RUE ALBERT" vs "RUE MARCEL ALBERT").

use std::collections::HashMap;
use std::fmt;

/// One `(a, b) -> [0, 1]` similarity measure.
pub trait SimilarityStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn similarity(&self, a: &str, b: &str) -> f64;
}

pub struct JaroWinkler;

impl SimilarityStrategy for JaroWinkler {
    fn name(&self) -> &'static str {
        "jaro_winkler"
    }

    fn similarity(&self, a: &str, b: &str) -> f64 {
        strsim::jaro_winkler(a, b)
    }
}

/// Sørensen–Dice over character multisets.
pub struct SorensenDice;

impl SimilarityStrategy for SorensenDice {
    fn name(&self) -> &'static str {
        "sorensen_dice"
    }

    fn similarity(&self, a: &str, b: &str) -> f64 {
        let total = a.chars().count() + b.chars().count();
        if total == 0 {
            return 1.0;
        }

        let mut counts: HashMap<char, usize> = HashMap::new();
        for c in a.chars() {
            *counts.entry(c).or_default() += 1;
        }
        let mut common = 0usize;
        for c in b.chars() {
            if let Some(n) = counts.get_mut(&c) {
                if *n > 0 {
                    *n -= 1;
                    common += 1;
                }
            }
        }

        2.0 * common as f64 / total as f64
    }
}

/// `1 - levenshtein / max_len`.
pub struct Levenshtein;

impl SimilarityStrategy for Levenshtein {
    fn name(&self) -> &'static str {
        "levenshtein"
    }

    fn similarity(&self, a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(a, b)
    }
}

/// 1.0 when the shorter string (dots and spaces removed) can be obtained by
/// deleting characters from the longer one, 0.0 otherwise.
pub struct Subsequence;

impl SimilarityStrategy for Subsequence {
    fn name(&self) -> &'static str {
        "subsequence"
    }

    fn similarity(&self, a: &str, b: &str) -> f64 {
        if is_subsequence(a, b) {
            1.0
        } else {
            0.0
        }
    }
}

/// Greedy subsequence test, ignoring `.` and ` `.
pub fn is_subsequence(a: &str, b: &str) -> bool {
    let strip = |s: &str| -> Vec<char> { s.chars().filter(|c| *c != '.' && *c != ' ').collect() };
    let (mut short, mut long) = (strip(a), strip(b));
    if short.len() > long.len() {
        std::mem::swap(&mut short, &mut long);
    }

    let mut pending = short.iter().peekable();
    for c in &long {
        match pending.peek() {
            Some(&&expected) if expected == *c => {
                pending.next();
            }
            Some(_) => {}
            None => break,
        }
    }
    pending.peek().is_none()
}

/// Ordered list of strategies with a shared threshold.
pub struct SimilarityEvaluator {
    strategies: Vec<Box<dyn SimilarityStrategy>>,
    threshold: f64,
}

impl SimilarityEvaluator {
    /// Default cascade: Jaro-Winkler, Sørensen–Dice, Levenshtein, subsequence.
    pub fn new(threshold: f64) -> Self {
        Self::with_strategies(
            vec![
                Box::new(JaroWinkler),
                Box::new(SorensenDice),
                Box::new(Levenshtein),
                Box::new(Subsequence),
            ],
            threshold,
        )
    }

    pub fn with_strategies(strategies: Vec<Box<dyn SimilarityStrategy>>, threshold: f64) -> Self {
        Self {
            strategies,
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// First score reaching the threshold, or `None`.
    pub fn evaluate(&self, a: &str, b: &str) -> Option<f64> {
        self.evaluate_at(a, b, self.threshold)
    }

    pub fn evaluate_at(&self, a: &str, b: &str, threshold: f64) -> Option<f64> {
        self.strategies
            .iter()
            .map(|s| s.similarity(a, b))
            .find(|score| *score >= threshold)
    }
}

impl fmt::Debug for SimilarityEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimilarityEvaluator")
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("threshold", &self.threshold)
            .finish()
    }
}
