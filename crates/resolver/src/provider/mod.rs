//! Clients for the services the engine orchestrates.
//!
//! - [`Geocoder`] / [`PeliasClient`]: search, reverse and interpolation
//! - [`CityIndex`] / [`ElasticCityIndex`]: city search and BeSt id lookup

pub mod elastic;
pub mod pelias;
mod traits;

pub use elastic::ElasticCityIndex;
pub use pelias::{PeliasClient, PeliasConfig};
pub use traits::{CityIndex, Geocoder};
