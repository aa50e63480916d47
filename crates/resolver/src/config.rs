//! Resolver configuration.
//!
//! Everything the engine tunes on lives here and is handed to the
//! [`Resolver`](crate::Resolver) constructor. Nothing is read from globals.

use std::time::Duration;

use crate::transformer::{TransformerSequence, TransformerStep};

/// Text substitutions applied by the `clean` transformer, in order.
pub const DEFAULT_CLEAN_PATTERNS: &[(&str, &str)] = &[
    (r"\(.+\)$", ""),
    (r"[, ]*(SN|ZN)$", ""),
    (r"' ", "'"),
    (r" [a-zA-Z][. ]", " "),
    (r"[.]", " "),
    (r",[a-zA-Z .'-]*$", " "),
    (r"[ ]+$", ""),
    (r"^[ ]+", ""),
];

/// Weights of the fallback scoring used when no attempt reached building
/// precision. Empirical values; treat them as a tuning surface.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreWeights {
    /// Candidate postal code equals the input one
    pub postalcode: f64,
    /// Base for a matching locality (the similarity is added)
    pub locality: f64,
    /// Base for a candidate with a street (the similarity is added)
    pub street: f64,
    /// Candidate has a house number
    pub housenumber: f64,
    /// House number equals the input one
    pub housenumber_exact: f64,
    /// House numbers share their leading digits
    pub housenumber_partial: f64,
    /// Coordinates are not (0, 0)
    pub coordinates: f64,
    /// Candidate carries reference metadata
    pub reference_metadata: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            postalcode: 1.5,
            locality: 1.0,
            street: 1.0,
            housenumber: 0.5,
            housenumber_exact: 1.0,
            housenumber_partial: 0.8,
            coordinates: 1.5,
            reference_metadata: 1.0,
        }
    }
}

/// Attempt budget for upstream HTTP calls. The delay grows linearly.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub delay_step: Duration,
}

impl RetryPolicy {
    /// Delay to wait after the given (zero-based) failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay + self.delay_step * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            initial_delay: Duration::from_secs(1),
            delay_step: Duration::from_millis(500),
        }
    }
}

/// Configuration of the resolution engine.
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// Number of leading postal code characters that must agree
    pub postcode_match_length: usize,

    /// Minimal similarity for two names to be considered equal
    pub similarity_threshold: f64,

    /// Transformers tried by the structured cascade
    pub transformer_sequence: Vec<TransformerSequence>,

    /// Transformers tried for each postal code guessed from free text
    pub unstructured_transformer_sequence: Vec<TransformerSequence>,

    /// `(pattern, replacement)` pairs for the `clean` transformer
    pub clean_patterns: Vec<(String, String)>,

    /// Accept a street-level hit on a numeric house number when street and
    /// postal code both match exactly
    pub street_match_shortcut: bool,

    /// Above this many postal codes for a city, narrow them with a street search
    pub max_postcode_candidates: usize,

    pub scoring: ScoreWeights,
}

impl ResolverConfig {
    pub fn with_postcode_match_length(mut self, length: usize) -> Self {
        self.postcode_match_length = length;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_street_match_shortcut(mut self, enabled: bool) -> Self {
        self.street_match_shortcut = enabled;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoreWeights) -> Self {
        self.scoring = scoring;
        self
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        use TransformerStep::*;

        Self {
            postcode_match_length: 2,
            similarity_threshold: 0.8,
            transformer_sequence: vec![
                vec![],
                vec![Clean],
                vec![Clean, NoCity],
                vec![NoCity],
                vec![CleanHn],
                vec![NoCity, CleanHn],
                vec![Clean, NoCity, CleanHn],
                vec![NoHn],
                vec![NoCity, NoHn],
                vec![NoStreet],
            ],
            unstructured_transformer_sequence: vec![
                vec![NoCity],
                vec![Clean, NoCity],
                vec![CleanHn, NoCity],
                vec![Clean, CleanHn, NoCity],
                vec![],
                vec![Clean],
                vec![CleanHn],
                vec![NoHn],
                vec![NoCity, NoHn],
                vec![NoStreet],
            ],
            clean_patterns: DEFAULT_CLEAN_PATTERNS
                .iter()
                .map(|(p, r)| (p.to_string(), r.to_string()))
                .collect(),
            street_match_shortcut: true,
            max_postcode_candidates: 4,
            scoring: ScoreWeights::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_grows_linearly() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1500));
        assert_eq!(policy.delay_for(4), Duration::from_millis(3000));
    }

    #[test]
    fn test_default_sequences() {
        let config = ResolverConfig::default();
        assert_eq!(config.transformer_sequence.len(), 10);
        assert!(config.transformer_sequence[0].is_empty());
        assert_eq!(
            config.unstructured_transformer_sequence[0],
            vec![TransformerStep::NoCity]
        );
        assert_eq!(config.clean_patterns.len(), 8);
    }
}
