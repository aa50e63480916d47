//! Structured-then-unstructured query strategy.
//!
//! One run issues a structured call, and a free-text call only when the
//! structured one did not yield a building. The reported call count is
//! therefore 1 or 2.

use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::backfill::CoordinateBackfill;
use crate::checker::ResultChecker;
use crate::errors::GeocodeError;
use crate::models::{AddressQuery, CallType, LayerFilter, ResultSet, SentQuery, StructuredQuery};
use crate::precision::is_building;
use crate::provider::Geocoder;

lazy_static! {
    static ref ONLY_DIGITS: Regex = Regex::new(r"^[0-9]+$").expect("valid digits pattern");
}

/// One structured/unstructured round for a (transformed) query.
#[async_trait]
pub trait QueryCoordinator: Send + Sync {
    async fn struct_or_unstruct(
        &self,
        query: &AddressQuery,
        check_postcode: bool,
    ) -> Result<ResultSet, GeocodeError>;
}

pub struct QueryStrategy {
    geocoder: Arc<dyn Geocoder>,
    checker: Arc<ResultChecker>,
    backfill: CoordinateBackfill,
}

impl QueryStrategy {
    pub fn new(geocoder: Arc<dyn Geocoder>, checker: Arc<ResultChecker>) -> Self {
        Self {
            backfill: CoordinateBackfill::new(geocoder.clone()),
            geocoder,
            checker,
        }
    }

    /// Backfill the first building candidate when it sits at (0, 0).
    /// Returns false when the set holds no building.
    async fn settle_building(&self, result: &mut ResultSet) -> Result<bool, GeocodeError> {
        let Some(building) = result.candidates.iter_mut().find(|c| is_building(c)) else {
            return Ok(false);
        };
        if building.has_zero_coordinates() {
            self.backfill.backfill(building).await?;
        }
        Ok(true)
    }
}

/// Layers to request for a query: localities only without a street, streets
/// and localities when the address line holds no digit.
pub fn layers_for(street_name: Option<&str>, address: &str) -> Option<LayerFilter> {
    if street_name.map_or(true, str::is_empty) {
        Some(LayerFilter::Locality)
    } else if !address.chars().any(|c| c.is_ascii_digit()) {
        Some(LayerFilter::StreetLocality)
    } else {
        None
    }
}

/// Free-text rendition of a query, without leading or trailing commas.
pub fn unstructured_text(query: &AddressQuery) -> String {
    let text = format!("{}, {}", query.address_line(), query.city_line());
    let text = text.trim();
    let text = text.strip_prefix(',').unwrap_or(text).trim();
    let text = text.strip_suffix(',').unwrap_or(text).trim();
    text.to_string()
}

#[async_trait]
impl QueryCoordinator for QueryStrategy {
    async fn struct_or_unstruct(
        &self,
        query: &AddressQuery,
        check_postcode: bool,
    ) -> Result<ResultSet, GeocodeError> {
        let structured = StructuredQuery::from_address(query);
        let layers = layers_for(query.street_name.as_deref(), &structured.address);
        let postcode = query.post_code().filter(|_| check_postcode);

        debug!("Call struct: {:?}", structured);
        let response = self.geocoder.geocode_structured(&structured, layers).await?;
        let mut struct_res =
            ResultSet::from_response(response, CallType::Struct, SentQuery::Structured(structured));

        if let Some(postcode) = postcode {
            self.checker.filter_postcode(&mut struct_res, postcode);
        }
        if self.settle_building(&mut struct_res).await? {
            return Ok(struct_res);
        }

        let text = unstructured_text(query);
        debug!("Call unstruct: '{}'", text);
        let mut unstruct_res = if text.is_empty() || ONLY_DIGITS.is_match(&text) {
            debug!("Unstructured: empty inputs or only numbers, skip call");
            let mut skipped = ResultSet::empty(1);
            skipped.meta.call_type = Some(CallType::Unstruct);
            skipped.meta.sent_query = Some(SentQuery::Text(text));
            skipped
        } else {
            let response = self.geocoder.geocode_text(&text, layers).await?;
            let mut res = ResultSet::from_response(response, CallType::Unstruct, SentQuery::Text(text));
            res.meta.call_count = 2;
            res
        };
        struct_res.meta.call_count = unstruct_res.meta.call_count;

        if let Some(postcode) = postcode {
            self.checker.filter_postcode(&mut unstruct_res, postcode);
        }
        self.checker
            .filter_streetname(&mut unstruct_res, query.street_name());

        if self.settle_building(&mut unstruct_res).await? {
            return Ok(unstruct_res);
        }

        Ok(pick_best(struct_res, unstruct_res))
    }
}

/// Choose between two sets without building candidates, judging by their
/// first candidate.
fn pick_best(struct_res: ResultSet, unstruct_res: ResultSet) -> ResultSet {
    if let Some(s0) = struct_res.first() {
        let more_confident = match (s0.confidence(), unstruct_res.first()) {
            (Some(sc), Some(u0)) => u0.confidence().map_or(true, |uc| sc > uc),
            _ => false,
        };
        if more_confident || s0.street().is_some() {
            return struct_res;
        }
    }

    if unstruct_res.first().is_some_and(|u0| u0.street().is_some()) {
        return unstruct_res;
    }

    if !struct_res.is_empty() {
        return struct_res;
    }
    unstruct_res
}
