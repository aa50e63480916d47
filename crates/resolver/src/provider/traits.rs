//! Collaborator traits for the external geocoder and search index.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::errors::GeocodeError;
use crate::models::{
    BestId, CityRecord, GeocodeResponse, InterpolationRequest, InterpolationResponse,
    LayerFilter, ReverseRequest, StructuredQuery,
};

/// Operations the engine needs from a Pelias-like geocoder.
///
/// Implementations own retries and HTTP error mapping. A rejected
/// interpolation request comes back as an empty
/// [`InterpolationResponse`], not as an error.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use geolocate_resolver::provider::Geocoder;
///
/// struct FixtureGeocoder;
///
/// #[async_trait]
/// impl Geocoder for FixtureGeocoder {
///     fn id(&self) -> &'static str {
///         "FIXTURE"
///     }
///
///     // ... implement the four calls
/// }
/// ```
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Identifier used in logs (e.g., "PELIAS").
    fn id(&self) -> &'static str;

    /// Structured search on discrete fields.
    async fn geocode_structured(
        &self,
        query: &StructuredQuery,
        layers: Option<LayerFilter>,
    ) -> Result<GeocodeResponse, GeocodeError>;

    /// Free-text search. The response carries the geocoder's parse of `text`.
    async fn geocode_text(
        &self,
        text: &str,
        layers: Option<LayerFilter>,
    ) -> Result<GeocodeResponse, GeocodeError>;

    /// Addresses around a point.
    async fn reverse(&self, request: &ReverseRequest) -> Result<GeocodeResponse, GeocodeError>;

    /// Position of a house number along a street.
    async fn interpolate(
        &self,
        request: &InterpolationRequest,
    ) -> Result<InterpolationResponse, GeocodeError>;
}

/// Lookups in the search index backing the geocoder.
#[async_trait]
pub trait CityIndex: Send + Sync {
    /// Localities by postal code and/or name. At least one must be given.
    async fn search_city(
        &self,
        post_code: Option<&str>,
        city_name: Option<&str>,
    ) -> Result<Vec<CityRecord>, GeocodeError>;

    /// Records whose source id starts with the given BeSt id.
    async fn get_by_id(&self, id: &BestId) -> Result<Vec<CityRecord>, GeocodeError>;

    /// Postal codes of every locality matching `city`, sorted.
    async fn postcodes_for_city(&self, city: &str) -> Result<BTreeSet<String>, GeocodeError> {
        let records = self.search_city(None, Some(city)).await?;
        Ok(records.iter().filter_map(CityRecord::postal_code).collect())
    }
}
