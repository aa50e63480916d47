//! Address query models.

use serde::{Deserialize, Serialize};

/// A structured postal address as submitted by the caller.
///
/// Every field is optional. Transformers never mutate a query; they return
/// a new one, so two attempts can be compared with `==` for memoization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressQuery {
    /// Street name (e.g., "Avenue Fonsny")
    pub street_name: Option<String>,

    /// House number, possibly with a box or range suffix (e.g., "20", "20-22", "12A")
    pub house_number: Option<String>,

    /// Postal code (e.g., "1060")
    pub post_code: Option<String>,

    /// Locality / postal name (e.g., "Saint-Gilles")
    pub post_name: Option<String>,
}

impl AddressQuery {
    /// Create a query from its four components.
    pub fn new(
        street_name: Option<&str>,
        house_number: Option<&str>,
        post_code: Option<&str>,
        post_name: Option<&str>,
    ) -> Self {
        Self {
            street_name: street_name.map(str::to_string),
            house_number: house_number.map(str::to_string),
            post_code: post_code.map(str::to_string),
            post_name: post_name.map(str::to_string),
        }
    }

    /// Copy of the query with surrounding whitespace removed from every field.
    pub fn trimmed(&self) -> Self {
        let trim = |v: &Option<String>| v.as_ref().map(|s| s.trim().to_string());
        Self {
            street_name: trim(&self.street_name),
            house_number: trim(&self.house_number),
            post_code: trim(&self.post_code),
            post_name: trim(&self.post_name),
        }
    }

    /// True when no field carries a value worth sending upstream.
    pub fn is_empty(&self) -> bool {
        [
            &self.street_name,
            &self.house_number,
            &self.post_code,
            &self.post_name,
        ]
        .iter()
        .all(|v| v.as_deref().map_or(true, str::is_empty))
    }

    /// "street, number", or the street alone, or "" without a street.
    pub fn address_line(&self) -> String {
        build_address(self.street_name.as_deref(), self.house_number.as_deref())
    }

    /// "postcode name", or whichever half is present.
    pub fn city_line(&self) -> String {
        build_city(self.post_code.as_deref(), self.post_name.as_deref())
    }

    /// Postal code, ignoring an empty string.
    pub fn post_code(&self) -> Option<&str> {
        non_empty(self.post_code.as_deref())
    }

    /// Street name, ignoring an empty string.
    pub fn street_name(&self) -> Option<&str> {
        non_empty(self.street_name.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Join a street name and a house number the way the geocoder expects them.
///
/// - empty street name: `""`
/// - empty house number: the street name alone
/// - otherwise: `"street_name, house_number"`
pub fn build_address(street_name: Option<&str>, house_number: Option<&str>) -> String {
    let street = match street_name {
        Some(s) if !s.trim().is_empty() => s,
        _ => return String::new(),
    };

    match house_number {
        Some(hn) if !hn.trim().is_empty() => format!("{}, {}", street, hn),
        _ => street.to_string(),
    }
}

/// Join a postal code and a locality name, both possibly missing.
pub fn build_city(post_code: Option<&str>, post_name: Option<&str>) -> String {
    match (non_empty(post_code), non_empty(post_name)) {
        (None, name) => name.unwrap_or_default().to_string(),
        (Some(code), None) => code.to_string(),
        (Some(code), Some(name)) => format!("{} {}", code, name),
    }
}

/// Structured query as sent to the geocoder's structured endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredQuery {
    pub address: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub postalcode: Option<String>,
}

impl StructuredQuery {
    /// Street-only lookup (no locality, no postal code).
    pub fn street(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            locality: None,
            postalcode: None,
        }
    }

    /// Build the structured query for an [`AddressQuery`].
    pub fn from_address(query: &AddressQuery) -> Self {
        Self {
            address: query.address_line(),
            locality: query.post_name.clone(),
            postalcode: query.post_code.clone(),
        }
    }
}

/// Layers restriction passed along with a geocoder call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerFilter {
    /// Only localities (no street name in the input)
    Locality,
    /// Streets and localities (no digit in the address line)
    StreetLocality,
    /// Addresses only (reverse geocoding)
    Address,
}

impl LayerFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locality => "locality",
            Self::StreetLocality => "street,locality",
            Self::Address => "address",
        }
    }
}

/// Reverse geocoding request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReverseRequest {
    pub lat: f64,
    pub lon: f64,
    /// Search radius in kilometers
    pub radius: f64,
    /// Maximum number of results
    pub size: usize,
}

/// Interpolation request along a street.
#[derive(Clone, Debug, PartialEq)]
pub struct InterpolationRequest {
    pub lat: f64,
    pub lon: f64,
    pub number: String,
    pub street: String,
}
