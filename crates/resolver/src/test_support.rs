//! Scripted collaborators and feature fixtures shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::GeocodeError;
use crate::models::{
    AddressQuery, BestId, Candidate, CityRecord, GeocodeResponse, GeocodingMeta, InterpolationRequest,
    InterpolationResponse, LayerFilter, ParsedText, Point, Properties, QueryEcho, ReverseRequest,
    ResultSet, StructuredQuery,
};
use crate::provider::{CityIndex, Geocoder};
use crate::strategy::QueryCoordinator;

type StructuredHandler =
    Box<dyn Fn(&StructuredQuery, Option<LayerFilter>) -> GeocodeResponse + Send + Sync>;
type TextHandler = Box<dyn Fn(&str, Option<LayerFilter>) -> GeocodeResponse + Send + Sync>;

/// Geocoder answering from closures, counting every call.
pub(crate) struct MockGeocoder {
    structured: StructuredHandler,
    text: TextHandler,
    interpolation: InterpolationResponse,
    down: bool,
    pub structured_calls: AtomicUsize,
    pub text_calls: AtomicUsize,
    pub interpolate_calls: AtomicUsize,
    pub structured_sent: Mutex<Vec<StructuredQuery>>,
    pub text_sent: Mutex<Vec<String>>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self {
            structured: Box::new(|_, _| GeocodeResponse::default()),
            text: Box::new(|_, _| GeocodeResponse::default()),
            interpolation: InterpolationResponse::default(),
            down: false,
            structured_calls: AtomicUsize::new(0),
            text_calls: AtomicUsize::new(0),
            interpolate_calls: AtomicUsize::new(0),
            structured_sent: Mutex::new(Vec::new()),
            text_sent: Mutex::new(Vec::new()),
        }
    }

    pub fn on_structured<F>(mut self, handler: F) -> Self
    where
        F: Fn(&StructuredQuery, Option<LayerFilter>) -> GeocodeResponse + Send + Sync + 'static,
    {
        self.structured = Box::new(handler);
        self
    }

    pub fn on_text<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, Option<LayerFilter>) -> GeocodeResponse + Send + Sync + 'static,
    {
        self.text = Box::new(handler);
        self
    }

    pub fn with_interpolation(mut self, response: InterpolationResponse) -> Self {
        self.interpolation = response;
        self
    }

    /// Every call fails as if the service were unreachable.
    pub fn down(mut self) -> Self {
        self.down = true;
        self
    }

    pub fn total_calls(&self) -> usize {
        self.structured_calls.load(Ordering::SeqCst) + self.text_calls.load(Ordering::SeqCst)
    }

    fn check_up(&self) -> Result<(), GeocodeError> {
        if self.down {
            return Err(GeocodeError::Connection {
                service: "pelias".to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    fn id(&self) -> &'static str {
        "MOCK"
    }

    async fn geocode_structured(
        &self,
        query: &StructuredQuery,
        layers: Option<LayerFilter>,
    ) -> Result<GeocodeResponse, GeocodeError> {
        self.structured_calls.fetch_add(1, Ordering::SeqCst);
        self.check_up()?;
        if let Ok(mut sent) = self.structured_sent.lock() {
            sent.push(query.clone());
        }
        Ok((self.structured)(query, layers))
    }

    async fn geocode_text(
        &self,
        text: &str,
        layers: Option<LayerFilter>,
    ) -> Result<GeocodeResponse, GeocodeError> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        self.check_up()?;
        if let Ok(mut sent) = self.text_sent.lock() {
            sent.push(text.to_string());
        }
        Ok((self.text)(text, layers))
    }

    async fn reverse(&self, _request: &ReverseRequest) -> Result<GeocodeResponse, GeocodeError> {
        self.check_up()?;
        Ok((self.structured)(&StructuredQuery::default(), Some(LayerFilter::Address)))
    }

    async fn interpolate(
        &self,
        _request: &InterpolationRequest,
    ) -> Result<InterpolationResponse, GeocodeError> {
        self.interpolate_calls.fetch_add(1, Ordering::SeqCst);
        self.check_up()?;
        Ok(self.interpolation.clone())
    }
}

/// City index returning fixed postal codes for any city name.
pub(crate) struct MockCityIndex {
    postcodes: Vec<&'static str>,
    pub calls: AtomicUsize,
}

impl MockCityIndex {
    pub fn new(postcodes: Vec<&'static str>) -> Self {
        Self {
            postcodes,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl CityIndex for MockCityIndex {
    async fn search_city(
        &self,
        _post_code: Option<&str>,
        _city_name: Option<&str>,
    ) -> Result<Vec<CityRecord>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .postcodes
            .iter()
            .map(|pc| CityRecord {
                best: serde_json::from_value(serde_json::json!({
                    "postal_info": {"postal_code": pc}
                }))
                .unwrap_or_default(),
                ..CityRecord::default()
            })
            .collect())
    }

    async fn get_by_id(&self, _id: &BestId) -> Result<Vec<CityRecord>, GeocodeError> {
        Ok(Vec::new())
    }
}

type CoordinatorHandler = Box<dyn Fn(&AddressQuery, bool) -> ResultSet + Send + Sync>;

/// Coordinator answering from a closure, recording every query it receives.
pub(crate) struct MockCoordinator {
    handler: CoordinatorHandler,
    pub calls: AtomicUsize,
    pub received: Mutex<Vec<(AddressQuery, bool)>>,
}

impl MockCoordinator {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&AddressQuery, bool) -> ResultSet + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl QueryCoordinator for MockCoordinator {
    async fn struct_or_unstruct(
        &self,
        query: &AddressQuery,
        check_postcode: bool,
    ) -> Result<ResultSet, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut received) = self.received.lock() {
            received.push((query.clone(), check_postcode));
        }
        Ok((self.handler)(query, check_postcode))
    }
}

/// Result set of a single call holding `candidates`.
pub(crate) fn result_of(candidates: Vec<Candidate>) -> ResultSet {
    let mut result = ResultSet::empty(1);
    result.candidates = candidates;
    result
}

// ============================================================================
// Fixtures
// ============================================================================

/// A candidate at `point` with the given JSON properties.
pub(crate) fn feature_at(point: Point, props: Value) -> Candidate {
    let props: Properties = serde_json::from_value(props).unwrap_or_default();
    Candidate::new(point, props)
}

pub(crate) const FONSNY: Point = Point {
    lon: 4.33844,
    lat: 50.83582,
};

/// Building-precision hit for "Avenue Fonsny 20, 1060 Saint-Gilles".
pub(crate) fn fonsny_building() -> Candidate {
    feature_at(
        FONSNY,
        serde_json::json!({
            "id": "https://databrussels.be/id/address/219307/7",
            "layer": "address",
            "match_type": "exact",
            "accuracy": "point",
            "housenumber": "20",
            "street": "Avenue Fonsny",
            "postalcode": "1060",
            "locality": "Saint-Gilles",
            "confidence": 1.0,
            "addendum": {"best": {
                "streetname_fr": "Avenue Fonsny",
                "streetname_nl": "Fonsnylaan",
                "postname_fr": "Saint-Gilles",
                "postname_nl": "Sint-Gillis"
            }}
        }),
    )
}

/// Street-level hit for Avenue Fonsny.
pub(crate) fn fonsny_street() -> Candidate {
    feature_at(
        Point::new(4.3376, 50.8362),
        serde_json::json!({
            "layer": "street",
            "match_type": "fallback",
            "accuracy": "centroid",
            "street": "Avenue Fonsny",
            "postalcode": "1060",
            "locality": "Saint-Gilles",
            "confidence": 0.8,
            "addendum": {"best": {
                "streetname_fr": "Avenue Fonsny",
                "streetname_nl": "Fonsnylaan",
                "postname_fr": "Saint-Gilles"
            }}
        }),
    )
}

pub(crate) fn response(features: Vec<Candidate>) -> GeocodeResponse {
    GeocodeResponse::with_features(features)
}

/// Free-text response carrying the geocoder's parse of the input.
pub(crate) fn parsed_response(
    text: &str,
    parsed: ParsedText,
    features: Vec<Candidate>,
) -> GeocodeResponse {
    GeocodeResponse {
        geocoding: Some(GeocodingMeta {
            query: Some(QueryEcho {
                text: Some(text.to_string()),
                parsed_text: Some(parsed),
                ..QueryEcho::default()
            }),
            ..GeocodingMeta::default()
        }),
        features,
    }
}
