//! Pelias HTTP client.
//!
//! Endpoints:
//! - Free-text search via /v1/search
//! - Structured search via /v1/search/structured
//! - Reverse geocoding via /v1/reverse
//! - Address interpolation via /search/geojson (separate host)
//!
//! Failed calls are retried with a linearly growing delay. A connection
//! failure is not retried: the service is most likely down.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::RetryPolicy;
use crate::errors::{GeocodeError, RetryClass};
use crate::models::{
    GeocodeResponse, InterpolationRequest, InterpolationResponse, LayerFilter, ReverseRequest,
    StructuredQuery,
};
use crate::provider::Geocoder;

const PROVIDER_ID: &str = "PELIAS";

const SEARCH_PATH: &str = "/v1/search";
const STRUCTURED_PATH: &str = "/v1/search/structured";
const REVERSE_PATH: &str = "/v1/reverse";
const INTERPOLATE_PATH: &str = "/search/geojson";

/// Upstream service behind a URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Service {
    Api,
    Interpolation,
}

impl Service {
    fn name(&self) -> &'static str {
        match self {
            Self::Api => "pelias",
            Self::Interpolation => "interpolation",
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Where and how to reach Pelias.
#[derive(Clone, Debug)]
pub struct PeliasConfig {
    /// Host (and port) of the Pelias API, e.g. "localhost:4000"
    pub api_host: String,
    /// Host (and port) of the interpolation service
    pub interpolation_host: String,
    pub scheme: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl PeliasConfig {
    pub fn new(api_host: impl Into<String>, interpolation_host: impl Into<String>) -> Self {
        Self {
            api_host: api_host.into(),
            interpolation_host: interpolation_host.into(),
            scheme: "http".to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, service: Service, path: &str) -> String {
        let host = match service {
            Service::Api => &self.api_host,
            Service::Interpolation => &self.interpolation_host,
        };
        format!("{}://{}{}", self.scheme, host.trim_matches('/'), path)
    }
}

// ============================================================================
// PeliasClient
// ============================================================================

pub struct PeliasClient {
    client: Client,
    config: PeliasConfig,
}

impl PeliasClient {
    pub fn new(config: PeliasConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    pub fn config(&self) -> &PeliasConfig {
        &self.config
    }

    /// GET with retries. Transient failures are retried until the attempt
    /// budget is spent.
    async fn fetch(
        &self,
        service: Service,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<String, GeocodeError> {
        let url = self.config.url(service, path);
        let policy = &self.config.retry;
        let mut attempt = 0u32;

        loop {
            let err = match self.fetch_once(service, &url, params).await {
                Ok(body) => return Ok(body),
                Err(err) => err,
            };

            if err.retry_class() != RetryClass::WithBackoff {
                return Err(err);
            }

            attempt += 1;
            if attempt >= policy.max_attempts {
                warn!(
                    "Cannot get {} results after several attempts ({}): {}",
                    service.name(),
                    url,
                    err
                );
                return Err(GeocodeError::RetriesExhausted {
                    service: service.name().to_string(),
                    attempts: attempt,
                    message: err.to_string(),
                });
            }

            let delay = policy.delay_for(attempt - 1);
            warn!(
                "Cannot get {} results ({}): {}. Try again in {:?}...",
                service.name(),
                url,
                err,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn fetch_once(
        &self,
        service: Service,
        url: &str,
        params: &[(&'static str, String)],
    ) -> Result<String, GeocodeError> {
        debug!("Call to {}: {} {:?}", service.name(), url, params);

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeocodeError::Timeout {
                        service: service.name().to_string(),
                    }
                } else if e.is_connect() {
                    GeocodeError::Connection {
                        service: service.name().to_string(),
                        message: e.to_string(),
                    }
                } else {
                    GeocodeError::Network(e)
                }
            })?;

        let status = response.status();

        // Bad house number format, typically
        if status == reqwest::StatusCode::BAD_REQUEST && service == Service::Interpolation {
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodeError::BadRequest {
                service: service.name().to_string(),
                message: body,
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Upstream {
                service: service.name().to_string(),
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.text().await?)
    }

    async fn search(
        &self,
        path: &str,
        params: Vec<(&'static str, String)>,
    ) -> Result<GeocodeResponse, GeocodeError> {
        let body = self.fetch(Service::Api, path, &params).await?;
        Ok(decode(Service::Api, &body))
    }
}

#[async_trait]
impl Geocoder for PeliasClient {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn geocode_structured(
        &self,
        query: &StructuredQuery,
        layers: Option<LayerFilter>,
    ) -> Result<GeocodeResponse, GeocodeError> {
        self.search(STRUCTURED_PATH, structured_params(query, layers))
            .await
    }

    async fn geocode_text(
        &self,
        text: &str,
        layers: Option<LayerFilter>,
    ) -> Result<GeocodeResponse, GeocodeError> {
        let mut params = vec![("text", text.to_string())];
        if let Some(layers) = layers {
            params.push(("layers", layers.as_str().to_string()));
        }
        self.search(SEARCH_PATH, params).await
    }

    async fn reverse(&self, request: &ReverseRequest) -> Result<GeocodeResponse, GeocodeError> {
        self.search(REVERSE_PATH, reverse_params(request)).await
    }

    async fn interpolate(
        &self,
        request: &InterpolationRequest,
    ) -> Result<InterpolationResponse, GeocodeError> {
        let params = vec![
            ("lat", request.lat.to_string()),
            ("lon", request.lon.to_string()),
            ("number", request.number.clone()),
            ("street", request.street.clone()),
        ];

        match self
            .fetch(Service::Interpolation, INTERPOLATE_PATH, &params)
            .await
        {
            Ok(body) => Ok(decode(Service::Interpolation, &body)),
            Err(err) if err.retry_class() == RetryClass::NoResult => {
                debug!("Interpolation rejected the request: {}", err);
                Ok(InterpolationResponse::default())
            }
            Err(err) => Err(err),
        }
    }
}

fn structured_params(
    query: &StructuredQuery,
    layers: Option<LayerFilter>,
) -> Vec<(&'static str, String)> {
    let mut params = vec![("address", query.address.clone())];
    if let Some(locality) = &query.locality {
        params.push(("locality", locality.clone()));
    }
    if let Some(postalcode) = &query.postalcode {
        params.push(("postalcode", postalcode.clone()));
    }
    if let Some(layers) = layers {
        params.push(("layers", layers.as_str().to_string()));
    }
    params
}

fn reverse_params(request: &ReverseRequest) -> Vec<(&'static str, String)> {
    vec![
        ("point.lat", request.lat.to_string()),
        ("point.lon", request.lon.to_string()),
        ("boundary.circle.radius", request.radius.to_string()),
        ("size", request.size.to_string()),
        ("layers", LayerFilter::Address.as_str().to_string()),
    ]
}

/// Decode a body, falling back to an empty value when it is malformed.
fn decode<T: DeserializeOwned + Default>(service: Service, body: &str) -> T {
    serde_json::from_str(body).unwrap_or_else(|e| {
        let err = GeocodeError::MalformedPayload {
            service: service.name().to_string(),
            message: e.to_string(),
        };
        warn!("{}", err);
        T::default()
    })
}
