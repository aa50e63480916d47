//! Resolution orchestrator.
//!
//! Drives the transformer cascade across the query strategy and picks the
//! final answer:
//!
//! ```text
//!   AddressQuery
//!       │
//!       ▼
//!   AttemptPlan ── (check_postcode, transformers) ──► QueryCoordinator
//!       │                                                  │
//!       │            building? ◄───────────────────────────┘
//!       │               │ yes: Found
//!       ▼               ▼
//!   Exhausted ──► ScoreVector ranking ──► best attempt (or empty)
//! ```

mod attempts;
mod scoring;
mod unstructured;

pub use attempts::{Attempt, AttemptPlan, SearchState};
pub use scoring::ScoreVector;

use std::collections::HashSet;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use crate::backfill::CoordinateBackfill;
use crate::checker::ResultChecker;
use crate::config::ResolverConfig;
use crate::errors::GeocodeError;
use crate::models::{AddressQuery, PrecisionLabel, ResultSet};
use crate::precision::{add_precision, is_building};
use crate::provider::{CityIndex, Geocoder};
use crate::strategy::{QueryCoordinator, QueryStrategy};
use crate::text::CleanPatterns;
use crate::transformer::{AddressTransformer, TransformerSequence};

lazy_static! {
    static ref ONLY_DIGITS: Regex = Regex::new(r"^[0-9]+$").expect("valid digits pattern");
}

/// Resolution engine. Holds no per-session state: memoization and call
/// counts live in each `resolve*` call.
pub struct Resolver {
    config: ResolverConfig,
    geocoder: Arc<dyn Geocoder>,
    city_index: Arc<dyn CityIndex>,
    checker: Arc<ResultChecker>,
    transformer: AddressTransformer,
    coordinator: Arc<dyn QueryCoordinator>,
    backfill: CoordinateBackfill,
}

/// Bookkeeping of one structured resolution.
struct Session<'q> {
    input: &'q AddressQuery,
    tried: HashSet<(bool, AddressQuery)>,
    attempts: Vec<ResultSet>,
    call_count: usize,
}

impl Session<'_> {
    fn has_candidates(&self) -> bool {
        self.attempts.iter().any(|r| !r.is_empty())
    }
}

impl Resolver {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        city_index: Arc<dyn CityIndex>,
        config: ResolverConfig,
    ) -> Result<Self, GeocodeError> {
        if !(config.similarity_threshold > 0.0 && config.similarity_threshold <= 1.0) {
            return Err(GeocodeError::InvalidConfig(format!(
                "similarity threshold must be in ]0, 1], got {}",
                config.similarity_threshold
            )));
        }

        let checker = Arc::new(ResultChecker::from_config(&config)?);
        let transformer = AddressTransformer::new(CleanPatterns::compile(&config.clean_patterns)?);
        let coordinator: Arc<dyn QueryCoordinator> =
            Arc::new(QueryStrategy::new(geocoder.clone(), checker.clone()));

        Ok(Self {
            backfill: CoordinateBackfill::new(geocoder.clone()),
            config,
            geocoder,
            city_index,
            checker,
            transformer,
            coordinator,
        })
    }

    /// Replace the query strategy (e.g., with a scripted one).
    pub fn with_coordinator(mut self, coordinator: Arc<dyn QueryCoordinator>) -> Self {
        self.coordinator = coordinator;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &dyn QueryCoordinator {
        self.coordinator.as_ref()
    }

    /// Resolve a structured address with the default transformer sequence.
    pub async fn resolve(&self, query: &AddressQuery) -> Result<ResultSet, GeocodeError> {
        self.advanced_mode(query, &self.config.transformer_sequence).await
    }

    /// Run the transformer cascade over `query`.
    ///
    /// Returns the first attempt whose top candidate is a building. Without
    /// one, every attempt is scored and the best is returned; when all
    /// attempts are empty, an empty set carrying the call count.
    pub async fn advanced_mode(
        &self,
        query: &AddressQuery,
        sequences: &[TransformerSequence],
    ) -> Result<ResultSet, GeocodeError> {
        let mut session = Session {
            input: query,
            tried: HashSet::new(),
            attempts: Vec::new(),
            call_count: 0,
        };
        let mut plan = AttemptPlan::new(sequences);
        let mut state = SearchState::Trying;

        while state.is_trying() {
            state = match plan.next() {
                None => SearchState::Exhausted,
                Some(attempt) if attempt.starts_relaxed_pass() && session.has_candidates() => {
                    debug!("Some result found with check_postcode=true");
                    SearchState::Exhausted
                }
                Some(attempt) => self.run_attempt(&mut session, attempt).await?,
            };
        }

        match state {
            SearchState::Found(result) => {
                info!(
                    "Resolved with transformers '{}' after {} calls",
                    result.meta.transformers.as_deref().unwrap_or_default(),
                    result.meta.call_count
                );
                Ok(result)
            }
            _ => Ok(self.select_best(session)),
        }
    }

    async fn run_attempt(
        &self,
        session: &mut Session<'_>,
        attempt: Attempt<'_>,
    ) -> Result<SearchState, GeocodeError> {
        let transformed = self.transformer.apply_sequence(session.input, attempt.steps);
        debug!("Transformed address ({}): {:?}", attempt.label(), transformed);

        if !session
            .tried
            .insert((attempt.check_postcode, transformed.clone()))
        {
            debug!("Already tried, skip call");
            return Ok(SearchState::Trying);
        }
        if transformed.is_empty() {
            debug!("No value to send, skip call");
            return Ok(SearchState::Trying);
        }

        let mut result = self
            .coordinator
            .struct_or_unstruct(&transformed, attempt.check_postcode)
            .await?;
        result.meta.transformers = Some(attempt.label());
        session.call_count += result.meta.call_count;

        if result.first().is_some_and(is_building) {
            result.meta.call_count = session.call_count;
            add_precision(&mut result);
            return Ok(SearchState::Found(result));
        }

        if self.accept_street_match(session.input, &transformed, &mut result) {
            debug!("Found a result matching street name and postcode, with numeric house number");
            result.meta.call_count = session.call_count;
            return Ok(SearchState::Found(result));
        }

        session.attempts.push(result);
        Ok(SearchState::Trying)
    }

    /// Street-level shortcut: without a locality in the attempt, accept a
    /// street whose name and postal code equal the input ones when the input
    /// house number is purely numeric.
    fn accept_street_match(
        &self,
        input: &AddressQuery,
        transformed: &AddressQuery,
        result: &mut ResultSet,
    ) -> bool {
        if !self.config.street_match_shortcut
            || transformed.post_name.as_deref().is_some_and(|n| !n.is_empty())
        {
            return false;
        }
        let (Some(street), Some(post_code)) = (input.street_name(), input.post_code()) else {
            return false;
        };
        let Some(first) = result.first() else {
            return false;
        };

        let street = street.to_uppercase();
        let same_street = self
            .checker
            .feature_street_names(first)
            .iter()
            .any(|name| *name == street);
        let same_postcode = first.postalcode() == Some(post_code);
        let numeric_hn = ONLY_DIGITS.is_match(input.house_number.as_deref().unwrap_or_default());
        if !(same_street && same_postcode && numeric_hn) {
            return false;
        }

        add_precision(result);
        result.first().and_then(|c| c.annotations.precision) == Some(PrecisionLabel::Street)
    }

    /// Highest scoring attempt; the earliest wins ties.
    fn select_best(&self, session: Session<'_>) -> ResultSet {
        debug!("No building result, keep the best match");
        let call_count = session.call_count;

        let mut best: Option<(f64, ResultSet)> = None;
        for result in session.attempts {
            let score = match result.first() {
                Some(first) => {
                    let vector = ScoreVector::compute(
                        first,
                        session.input,
                        &self.checker,
                        &self.config.scoring,
                    );
                    debug!(
                        "{:>40} | {}",
                        result.meta.transformers.as_deref().unwrap_or_default(),
                        vector
                    );
                    vector.total()
                }
                None => 0.0,
            };
            if best.as_ref().map_or(true, |(top, _)| score > *top) {
                best = Some((score, result));
            }
        }

        match best {
            Some((_, mut result)) if !result.is_empty() => {
                result.meta.call_count = call_count;
                add_precision(&mut result);
                result
            }
            _ => ResultSet::empty(call_count),
        }
    }
}
