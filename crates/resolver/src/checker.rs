//! Fuzzy checks of candidates against the caller's input.
//!
//! Missing reference data never disqualifies a candidate: a feature without
//! street names passes the street check, a feature without a postal code
//! passes the postcode filter.

use tracing::debug;

use crate::config::ResolverConfig;
use crate::errors::GeocodeError;
use crate::models::{Candidate, ResultSet};
use crate::similarity::SimilarityEvaluator;
use crate::text::{fold_ascii, remove_street_types, CleanPatterns};

/// Filters and scores candidates by postal code, street name and locality.
#[derive(Debug)]
pub struct ResultChecker {
    postcode_match_length: usize,
    clean: CleanPatterns,
    similarity: SimilarityEvaluator,
}

impl ResultChecker {
    pub fn new(
        postcode_match_length: usize,
        clean: CleanPatterns,
        similarity: SimilarityEvaluator,
    ) -> Self {
        Self {
            postcode_match_length,
            clean,
            similarity,
        }
    }

    /// Build a checker with the default similarity cascade.
    pub fn from_config(config: &ResolverConfig) -> Result<Self, GeocodeError> {
        Ok(Self::new(
            config.postcode_match_length,
            CleanPatterns::compile(&config.clean_patterns)?,
            SimilarityEvaluator::new(config.similarity_threshold),
        ))
    }

    // --------------------
    // Filters
    // --------------------

    /// Drop candidates whose postal code does not share the first
    /// `postcode_match_length` characters with `postcode`.
    pub fn filter_postcode(&self, result: &mut ResultSet, postcode: &str) {
        let before = result.len();
        let expected = prefix(postcode, self.postcode_match_length);
        result.candidates.retain(|c| match c.postalcode() {
            Some(pc) => prefix(pc, self.postcode_match_length) == expected,
            None => true,
        });
        debug!(
            "Check postcode ({}) : {} --> {}",
            self.postcode_match_length,
            before,
            result.len()
        );
    }

    /// Keep candidates whose street name is close to `street_name`.
    pub fn filter_streetname(&self, result: &mut ResultSet, street_name: Option<&str>) {
        let before = result.len();
        result
            .candidates
            .retain(|c| self.check_streetname(c, street_name).is_some());
        debug!("Check street : {} --> {}", before, result.len());
    }

    // --------------------
    // Checks
    // --------------------

    /// Similarity between `locality_name` and any locality name of the
    /// candidate, `Some(1.0)` when no locality was given.
    pub fn check_locality(&self, candidate: &Candidate, locality_name: Option<&str>) -> Option<f64> {
        let Some(locality_name) = locality_name else {
            return Some(1.0);
        };
        let needle = fold_ascii(locality_name).to_lowercase();

        let props = candidate.properties.as_ref()?;
        if let Some(locality) = props.locality.as_deref() {
            if let Some(sim) = self.similarity.evaluate(&needle, &locality.to_lowercase()) {
                return Some(sim);
            }
        }

        let best = props.best()?;
        best.locality_names().find_map(|name| {
            let name = fold_ascii(&name.to_lowercase());
            let sim = self.similarity.evaluate(&needle, &name);
            debug!("locality ('{}' vs '{}'): {:?}", locality_name, name, sim);
            sim
        })
    }

    /// Similarity between `street_name` and the candidate's street names.
    ///
    /// Every query variant is compared with every candidate name, first
    /// bare, then prefixed with the candidate's locality names
    /// ("BRUXELLES, LOI"). Returns `Some(1.0)` when no street name was given
    /// or when the candidate has no street name at all.
    pub fn check_streetname(&self, candidate: &Candidate, street_name: Option<&str>) -> Option<f64> {
        let Some(street_name) = street_name else {
            return Some(1.0);
        };

        let variants = self.streetname_variants(street_name);
        let feature_names: Vec<String> = self
            .feature_street_names(candidate)
            .iter()
            .map(|n| remove_street_types(&fold_ascii(n)))
            .collect();
        if feature_names.is_empty() {
            return Some(1.0);
        }
        let cities = feature_city_names(candidate);

        for with_city in [false, true] {
            for variant in &variants {
                for name in &feature_names {
                    let candidates: Vec<String> = if with_city {
                        cities.iter().map(|c| format!("{}, {}", c, name)).collect()
                    } else {
                        vec![name.clone()]
                    };
                    for feature_name in &candidates {
                        let sim = self.similarity.evaluate(feature_name, variant);
                        debug!("'{}' vs '{}': {:?}", variant, feature_name, sim);
                        if sim.is_some() {
                            return sim;
                        }
                    }
                }
            }
        }
        None
    }

    /// Upper-cased street names of a candidate (own `street` first, then the
    /// localized reference names), without duplicates.
    pub fn feature_street_names(&self, candidate: &Candidate) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let own = candidate.street().into_iter();
        let reference = candidate.best().into_iter().flat_map(|b| b.street_names());
        for name in own.chain(reference) {
            let name = name.to_uppercase();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Variants of an input street name: the whole name and each comma
    /// separated part longer than 5 characters, each without street types,
    /// then cleaned.
    pub fn streetname_variants(&self, street_name: &str) -> Vec<String> {
        let street_name = fold_ascii(&street_name.to_uppercase());

        let mut parts = vec![street_name.clone()];
        if street_name.contains(',') {
            parts.extend(
                street_name
                    .split(',')
                    .map(str::trim)
                    .filter(|p| p.chars().count() > 5)
                    .map(str::to_string),
            );
        }

        let mut variants: Vec<String> = Vec::new();
        for part in parts {
            let part = remove_street_types(&part);
            let cleaned = self.clean.apply(&part);
            for v in [part, cleaned] {
                if !variants.contains(&v) {
                    variants.push(v);
                }
            }
        }
        variants
    }
}

/// Folded, upper-cased postal and municipality names, without duplicates.
fn feature_city_names(candidate: &Candidate) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    if let Some(best) = candidate.best() {
        for name in best.city_names() {
            let name = fold_ascii(&name.to_uppercase());
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

fn prefix(value: &str, length: usize) -> String {
    value.chars().take(length).collect()
}
