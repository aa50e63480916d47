use std::sync::Arc;

use anyhow::{bail, Context};
use geolocate_resolver::{
    AddressQuery, ElasticCityIndex, GeocodeService, PeliasClient, PeliasConfig, ResolverConfig,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::Commands;
use crate::config::Config;

pub fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

pub fn build_service(config: &Config) -> anyhow::Result<GeocodeService> {
    let pelias_config = PeliasConfig::new(&config.pelias_host, &config.interpolation_host)
        .with_timeout(config.request_timeout);
    let geocoder = Arc::new(PeliasClient::new(pelias_config));
    let city_index = Arc::new(ElasticCityIndex::new(&config.es_host, config.request_timeout));

    let resolver_config = ResolverConfig::default()
        .with_postcode_match_length(config.postcode_match_length)
        .with_similarity_threshold(config.similarity_threshold);

    GeocodeService::new(geocoder, city_index, resolver_config)
        .context("Invalid resolver configuration")
}

/// Run one command and return the JSON document to print.
pub async fn run(service: &GeocodeService, command: Commands) -> anyhow::Result<serde_json::Value> {
    let output = match command {
        Commands::Geocode {
            street,
            housenumber,
            postcode,
            city,
            mode,
            raw,
        } => {
            let query = AddressQuery::new(
                street.as_deref(),
                housenumber.as_deref(),
                postcode.as_deref(),
                city.as_deref(),
            );
            if query.is_empty() {
                bail!("At least one of --street, --housenumber, --postcode or --city is required");
            }
            service.geocode(&query, mode.into(), raw).await?
        }
        Commands::Unstructured { address, mode, raw } => {
            service.geocode_unstructured(&address, mode.into(), raw).await?
        }
        Commands::Reverse {
            lat,
            lon,
            radius,
            size,
            raw,
        } => service.reverse(lat, lon, radius, size, raw).await?,
        Commands::SearchCity { postcode, city } => {
            service
                .search_city(postcode.as_deref(), city.as_deref())
                .await?
        }
        Commands::GetById { best_id } => service.get_by_id(&best_id).await?,
        Commands::Health => return Ok(serde_json::to_value(service.health().await)?),
    };
    Ok(serde_json::to_value(output)?)
}
