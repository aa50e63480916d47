//! Resolver models
//!
//! This module contains the core data types of the resolution engine:
//! - `query` - Caller input (AddressQuery) and the requests sent upstream
//! - `candidate` - Geocoded features (Candidate) and engine annotations
//! - `result` - Geocoder responses and result sets with session metadata
//! - `types` - Small enums (PrecisionLabel, CallType, Mode)
//! - `city` - Search index records and BeSt identifiers
//! - `output` - Documents returned to callers

mod candidate;
mod city;
mod output;
mod query;
mod result;
mod types;

pub use candidate::{
    Addendum, Annotations, BestMetadata, BoxInfo, Candidate, Geometry, Interpolated, LatLon,
    Point, Properties,
};
pub use city::{BestId, BestObjectType, CityRecord};
pub use output::{to_camel_case, GeocodeOutput};
pub use query::{
    build_address, build_city, AddressQuery, InterpolationRequest, LayerFilter, ReverseRequest,
    StructuredQuery,
};
pub use result::{
    GeocodeResponse, GeocodingMeta, InterpolatedGeometry, InterpolationResponse, ParsedText,
    QueryEcho, ResultMeta, ResultSet, SentQuery,
};
pub use types::{CallType, Mode, PrecisionLabel};
