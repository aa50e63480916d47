//! Search index client (the Elasticsearch instance embedded in Pelias).
//!
//! Used for city lookups and BeSt id lookups. Records only count when they
//! carry reference metadata; that metadata is stored as a JSON string in
//! `addendum.best` and decoded here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::GeocodeError;
use crate::models::{BestId, BestMetadata, CityRecord, LatLon};
use crate::provider::CityIndex;

const SERVICE: &str = "elastic";
const INDEX: &str = "pelias";
const CITY_SEARCH_SIZE: usize = 100;

// ============================================================================
// API Response Structures
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Hits,
}

#[derive(Debug, Default, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source", default)]
    source: HitSource,
}

#[derive(Debug, Default, Deserialize)]
struct HitSource {
    #[serde(default)]
    addendum: Option<HitAddendum>,

    #[serde(default)]
    center_point: Option<LatLon>,

    #[serde(default)]
    name: Value,
}

#[derive(Debug, Default, Deserialize)]
struct HitAddendum {
    /// JSON encoded [`BestMetadata`]
    #[serde(default)]
    best: Option<String>,
}

// ============================================================================
// ElasticCityIndex
// ============================================================================

pub struct ElasticCityIndex {
    client: Client,
    base_url: String,
}

impl ElasticCityIndex {
    /// `host` is "host:port", with or without a scheme.
    pub fn new(host: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        let host = host.trim_matches('/');
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };

        Self { client, base_url }
    }

    async fn search(&self, body: Value) -> Result<Vec<CityRecord>, GeocodeError> {
        let url = format!("{}/{}/_search", self.base_url, INDEX);
        debug!("Call to {}: {} {}", SERVICE, url, body);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeocodeError::Timeout {
                        service: SERVICE.to_string(),
                    }
                } else if e.is_connect() {
                    GeocodeError::Connection {
                        service: SERVICE.to_string(),
                        message: e.to_string(),
                    }
                } else {
                    GeocodeError::Network(e)
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Upstream {
                service: SERVICE.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(
                "{}",
                GeocodeError::MalformedPayload {
                    service: SERVICE.to_string(),
                    message: e.to_string(),
                }
            );
            SearchResponse::default()
        });

        Ok(records_from_hits(parsed.hits.hits))
    }
}

#[async_trait]
impl CityIndex for ElasticCityIndex {
    async fn search_city(
        &self,
        post_code: Option<&str>,
        city_name: Option<&str>,
    ) -> Result<Vec<CityRecord>, GeocodeError> {
        let body = city_query(post_code, city_name)?;
        let records = self.search(body).await?;
        Ok(dedup(records))
    }

    async fn get_by_id(&self, id: &BestId) -> Result<Vec<CityRecord>, GeocodeError> {
        self.search(id_query(id)).await
    }
}

fn city_query(post_code: Option<&str>, city_name: Option<&str>) -> Result<Value, GeocodeError> {
    let post_code = post_code.filter(|p| !p.is_empty());
    let city_name = city_name.filter(|c| !c.is_empty());
    if post_code.is_none() && city_name.is_none() {
        return Err(GeocodeError::InvalidInput(
            "Either 'postCode' or 'cityName' should be provided".to_string(),
        ));
    }

    let mut must = vec![json!({"term": {"layer": "locality"}})];
    if let Some(post_code) = post_code {
        must.push(json!({"term": {"address_parts.zip": post_code}}));
    }
    if let Some(city) = city_name {
        let should: Vec<Value> = ["default", "fr", "nl", "de"]
            .iter()
            .map(|lang| json!({"query_string": {"query": format!("name.{}:\"{}\"", lang, city)}}))
            .collect();
        must.push(json!({"bool": {"should": should}}));
    }

    Ok(json!({
        "size": CITY_SEARCH_SIZE,
        "query": {"bool": {"must": must}}
    }))
}

fn id_query(id: &BestId) -> Value {
    json!({
        "query": {
            "bool": {
                "must": [
                    {"term": {"layer": id.object_type().layer()}},
                    {"prefix": {"source_id": {"value": id.as_str().to_lowercase()}}}
                ]
            }
        }
    })
}

fn records_from_hits(hits: Vec<Hit>) -> Vec<CityRecord> {
    hits.into_iter()
        .filter_map(|hit| {
            let raw = hit.source.addendum?.best?;
            let best: BestMetadata = match serde_json::from_str(&raw) {
                Ok(best) => best,
                Err(e) => {
                    warn!("Skipping index record with unreadable metadata: {}", e);
                    return None;
                }
            };
            Some(CityRecord {
                best,
                center_point: hit.source.center_point,
                name: hit.source.name,
            })
        })
        .collect()
}

fn dedup(records: Vec<CityRecord>) -> Vec<CityRecord> {
    let mut unique: Vec<CityRecord> = Vec::with_capacity(records.len());
    for record in records {
        if !unique.contains(&record) {
            unique.push(record);
        }
    }
    unique
}
