//! Geolocate Resolver Crate
//!
//! Address resolution on top of a Pelias geocoder: a structured or free-text
//! Belgian address goes in, the best geocoded candidate comes out, annotated
//! with a precision label and the trace of the query rewrites that found it.
//!
//! # Overview
//!
//! The resolver supports:
//! - Structured and free-text input, in three modes (basic, simple, advanced)
//! - Cascades of query rewrites (transformers) with memoization
//! - Postal code and multilingual street name checks on every answer
//! - Coordinate backfill for buildings the geocoder placed at (0, 0)
//! - Reverse geocoding, city search and BeSt id lookups
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |  GeocodeService  |  (modes, output documents)
//! +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! |     Resolver     | --> | AddressTransformer|  (rewrites, memoized)
//! +------------------+     +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! |  QueryStrategy   | --> |  ResultChecker   |  (postcode, street name)
//! +------------------+     +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! |    Geocoder      | <-- |CoordinateBackfill|  (box, street, interpolation)
//! +------------------+     +------------------+
//!    (PeliasClient)
//! ```
//!
//! # Core Types
//!
//! - [`AddressQuery`] - Caller input, four optional fields
//! - [`Candidate`] - One geocoded feature plus engine [`Annotations`]
//! - [`ResultSet`] - Candidates of one call with session metadata
//! - [`PrecisionLabel`] - How reliable a candidate's geometry is
//! - [`GeocodeOutput`] - Document handed back to callers

pub mod backfill;
pub mod checker;
pub mod config;
pub mod errors;
pub mod health;
pub mod models;
pub mod orchestrator;
pub mod precision;
pub mod provider;
pub mod service;
pub mod similarity;
pub mod strategy;
pub mod text;
pub mod transformer;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the data model
pub use models::{
    AddressQuery, Annotations, Candidate, CityRecord, GeocodeOutput, Interpolated, Mode, Point,
    PrecisionLabel, ResultSet,
};

// Re-export engine types
pub use checker::ResultChecker;
pub use config::{ResolverConfig, RetryPolicy, ScoreWeights};
pub use errors::{GeocodeError, RetryClass};
pub use health::{HealthCheck, HealthReport, HealthStatus};
pub use orchestrator::Resolver;
pub use service::GeocodeService;
pub use strategy::{QueryCoordinator, QueryStrategy};
pub use transformer::{TransformerSequence, TransformerStep};

// Re-export provider types
pub use provider::{CityIndex, ElasticCityIndex, Geocoder, PeliasClient, PeliasConfig};
