//! Caller-facing façade: one method per operation, each returning an output
//! document.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ResolverConfig;
use crate::errors::GeocodeError;
use crate::health::{HealthCheck, HealthReport};
use crate::models::{
    AddressQuery, BestId, CallType, GeocodeOutput, Mode, ResultSet, ReverseRequest, SentQuery,
    StructuredQuery,
};
use crate::orchestrator::Resolver;
use crate::precision::add_precision;
use crate::provider::{CityIndex, Geocoder};

pub struct GeocodeService {
    resolver: Resolver,
    geocoder: Arc<dyn Geocoder>,
    city_index: Arc<dyn CityIndex>,
    health: HealthCheck,
}

impl GeocodeService {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        city_index: Arc<dyn CityIndex>,
        config: ResolverConfig,
    ) -> Result<Self, GeocodeError> {
        Ok(Self {
            resolver: Resolver::new(geocoder.clone(), city_index.clone(), config)?,
            health: HealthCheck::new(geocoder.clone()),
            geocoder,
            city_index,
        })
    }

    pub fn with_health_check(mut self, health: HealthCheck) -> Self {
        self.health = health;
        self
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Geocode a structured address.
    pub async fn geocode(
        &self,
        query: &AddressQuery,
        mode: Mode,
        with_raw: bool,
    ) -> Result<GeocodeOutput, GeocodeError> {
        let query = query.trimmed();
        info!("Geocode ({:?}): {:?}", mode, query);

        let result = match mode {
            Mode::Basic => {
                let structured = StructuredQuery::from_address(&query);
                let response = self.geocoder.geocode_structured(&structured, None).await?;
                let mut result = ResultSet::from_response(
                    response,
                    CallType::Struct,
                    SentQuery::Structured(structured),
                );
                add_precision(&mut result);
                result
            }
            Mode::Simple => {
                let mut result = self
                    .resolver
                    .coordinator()
                    .struct_or_unstruct(&query, true)
                    .await?;
                add_precision(&mut result);
                result
            }
            Mode::Advanced => self.resolver.resolve(&query).await?,
        };

        Ok(self.output(&result, with_raw))
    }

    /// Geocode a free-text address.
    pub async fn geocode_unstructured(
        &self,
        address: &str,
        mode: Mode,
        with_raw: bool,
    ) -> Result<GeocodeOutput, GeocodeError> {
        let address = address.trim();
        info!("Geocode unstructured ({:?}): '{}'", mode, address);

        let result = match mode {
            Mode::Basic => {
                let response = self.geocoder.geocode_text(address, None).await?;
                let mut result = ResultSet::from_response(
                    response,
                    CallType::Unstruct,
                    SentQuery::Text(address.to_string()),
                );
                add_precision(&mut result);
                result
            }
            Mode::Simple | Mode::Advanced => self.resolver.resolve_unstructured(address).await?,
        };

        Ok(self.output(&result, with_raw))
    }

    /// Addresses around a point. Twice `size` results are requested since
    /// duplicates are dropped from the output.
    pub async fn reverse(
        &self,
        lat: f64,
        lon: f64,
        radius: f64,
        size: usize,
        with_raw: bool,
    ) -> Result<GeocodeOutput, GeocodeError> {
        let request = ReverseRequest {
            lat,
            lon,
            radius,
            size: size * 2,
        };
        debug!("Reverse: {:?}", request);

        let response = self.geocoder.reverse(&request).await?;
        let mut result = ResultSet {
            candidates: response.features,
            ..ResultSet::empty(1)
        };
        add_precision(&mut result);

        let mut output = GeocodeOutput::from_result(&result, with_raw);
        output.truncate(size);
        Ok(output)
    }

    /// Localities by postal code and/or name.
    pub async fn search_city(
        &self,
        post_code: Option<&str>,
        city_name: Option<&str>,
    ) -> Result<GeocodeOutput, GeocodeError> {
        let post_code = post_code.map(str::trim).filter(|s| !s.is_empty());
        let city_name = city_name.map(str::trim).filter(|s| !s.is_empty());
        let records = self.city_index.search_city(post_code, city_name).await?;
        Ok(GeocodeOutput::from_records(&records))
    }

    /// Records of a BeSt identifier (address, street or municipality).
    pub async fn get_by_id(&self, best_id: &str) -> Result<GeocodeOutput, GeocodeError> {
        let id = BestId::from_str(best_id)?;
        let records = self.city_index.get_by_id(&id).await?;
        Ok(GeocodeOutput::from_records(&records))
    }

    pub async fn health(&self) -> HealthReport {
        self.health.check().await
    }

    pub async fn wait_until_ready(&self) -> bool {
        self.health.wait_until_ready().await
    }

    fn output(&self, result: &ResultSet, with_raw: bool) -> GeocodeOutput {
        let output = GeocodeOutput::from_result(result, with_raw);
        info!(
            "Result: {} item(s), {} call(s), transformers: {:?}",
            output.total, output.call_count, output.transformers
        );
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, Point};
    use crate::test_support::{
        feature_at, fonsny_building, fonsny_street, response, MockCityIndex, MockGeocoder,
    };
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn service(geocoder: Arc<MockGeocoder>, city_index: MockCityIndex) -> GeocodeService {
        GeocodeService::new(geocoder, Arc::new(city_index), ResolverConfig::default()).unwrap()
    }

    fn fonsny() -> AddressQuery {
        AddressQuery::new(
            Some(" Avenue Fonsny "),
            Some("20"),
            Some("1060 "),
            Some("Saint-Gilles"),
        )
    }

    fn reverse_hit(i: usize) -> Candidate {
        feature_at(
            Point::new(4.33 + i as f64 / 1000.0, 50.83),
            json!({"layer": "address", "name": format!("Address {}", i)}),
        )
    }

    #[tokio::test]
    async fn test_basic_mode_single_trimmed_call() {
        let geocoder = Arc::new(MockGeocoder::new().on_structured(|_, _| response(vec![fonsny_street()])));
        let output = service(geocoder.clone(), MockCityIndex::empty())
            .geocode(&fonsny(), Mode::Basic, false)
            .await
            .unwrap();

        assert_eq!(geocoder.total_calls(), 1);
        let sent = geocoder.structured_sent.lock().unwrap();
        assert_eq!(sent[0].address, "Avenue Fonsny, 20");
        assert_eq!(sent[0].postalcode.as_deref(), Some("1060"));
        assert_eq!(output.total, 1);
        assert_eq!(output.items[0]["precision"], json!("street"));
        assert_eq!(output.call_type, Some(CallType::Struct));
    }

    #[tokio::test]
    async fn test_simple_mode_runs_one_round() {
        let geocoder = Arc::new(
            MockGeocoder::new()
                .on_structured(|_, _| response(Vec::new()))
                .on_text(|_, _| response(vec![fonsny_building()])),
        );
        let output = service(geocoder.clone(), MockCityIndex::empty())
            .geocode(&fonsny(), Mode::Simple, false)
            .await
            .unwrap();

        assert_eq!(output.call_count, 2);
        assert_eq!(output.call_type, Some(CallType::Unstruct));
        assert_eq!(output.items[0]["precision"], json!("address"));
    }

    #[tokio::test]
    async fn test_advanced_mode_reports_transformers() {
        let geocoder =
            Arc::new(MockGeocoder::new().on_structured(|_, _| response(vec![fonsny_building()])));
        let output = service(geocoder, MockCityIndex::empty())
            .geocode(&fonsny(), Mode::Advanced, true)
            .await
            .unwrap();

        assert_eq!(output.call_count, 1);
        assert_eq!(output.transformers.as_deref(), Some(""));
        assert!(output.pelias_raw.is_some());
        assert_eq!(output.items[0]["streetnameFr"], json!("Avenue Fonsny"));
    }

    #[tokio::test]
    async fn test_unstructured_basic_mode() {
        let geocoder = Arc::new(MockGeocoder::new().on_text(|_, _| response(vec![fonsny_street()])));
        let output = service(geocoder.clone(), MockCityIndex::empty())
            .geocode_unstructured("  Avenue Fonsny, Saint-Gilles ", Mode::Basic, false)
            .await
            .unwrap();

        assert_eq!(geocoder.text_sent.lock().unwrap()[0], "Avenue Fonsny, Saint-Gilles");
        assert_eq!(output.total, 1);
        assert_eq!(output.call_count, 1);
    }

    #[tokio::test]
    async fn test_reverse_doubles_then_truncates() {
        let geocoder = Arc::new(
            MockGeocoder::new().on_structured(|_, _| response((0..6).map(reverse_hit).collect())),
        );
        let output = service(geocoder, MockCityIndex::empty())
            .reverse(50.83, 4.33, 1.0, 3, false)
            .await
            .unwrap();

        assert_eq!(output.total, 3);
        assert_eq!(output.items.len(), 3);
        assert_eq!(output.items[0]["name"], json!("Address 0"));
    }

    #[tokio::test]
    async fn test_search_city_converts_records() {
        let city_index = MockCityIndex::new(vec!["1060", "1060"]);
        let service = service(Arc::new(MockGeocoder::new()), city_index);
        let output = service.search_city(Some("1060"), Some(" ")).await.unwrap();

        assert_eq!(output.total, 1);
        assert_eq!(output.call_count, 0);
    }

    #[tokio::test]
    async fn test_get_by_id_rejects_malformed_id() {
        let service = service(Arc::new(MockGeocoder::new()), MockCityIndex::empty());
        let err = service.get_by_id("not an id").await.unwrap_err();
        assert!(matches!(err, GeocodeError::InvalidInput(_)));

        let output = service
            .get_by_id("https://databrussels.be/id/address/219307/7")
            .await
            .unwrap();
        assert_eq!(output.total, 0);
    }

    #[tokio::test]
    async fn test_health_is_exposed() {
        let geocoder = Arc::new(MockGeocoder::new().down());
        let service = service(geocoder.clone(), MockCityIndex::empty());
        let report = service.health().await;

        assert!(!report.is_up());
        assert_eq!(geocoder.text_calls.load(Ordering::SeqCst), 1);
    }
}
