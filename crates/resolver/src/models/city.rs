//! Records from the search index (cities and BeSt objects).

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{BestMetadata, LatLon};
use crate::errors::GeocodeError;

lazy_static! {
    static ref BEST_ID: Regex =
        Regex::new(r"(?i)^(https://)?([a-z.]+)/id/([a-zA-Z]+)/(\d{1,8})/(\d{1,3}|[0-9\-T:+]+)$")
            .expect("valid BeSt id pattern");
}

/// One record of the search index with reference metadata attached.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    pub best: BestMetadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_point: Option<LatLon>,

    /// Localized names, as stored in the index (`{"default": .., "fr": ..}`)
    #[serde(default)]
    pub name: Value,
}

impl CityRecord {
    pub fn postal_code(&self) -> Option<String> {
        self.best.postal_code()
    }

    /// Free-form view of the record used to build output items.
    pub fn to_item(&self) -> Map<String, Value> {
        let mut item = match serde_json::to_value(&self.best) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        if let Some(center) = self.center_point {
            item.insert(
                "coordinates".to_string(),
                serde_json::json!({"lat": center.lat, "lon": center.lon}),
            );
        }
        item.insert("name".to_string(), self.name.clone());
        item
    }
}

/// Kind of object a BeSt identifier points to, mapped to an index layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BestObjectType {
    Address,
    Street,
    Locality,
}

impl BestObjectType {
    pub fn layer(&self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Street => "street",
            Self::Locality => "locality",
        }
    }
}

/// A validated BeSt identifier, e.g.
/// `https://databrussels.be/id/address/219307/7`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BestId {
    raw: String,
    object_type: BestObjectType,
}

impl BestId {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn object_type(&self) -> BestObjectType {
        self.object_type
    }
}

impl fmt::Display for BestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for BestId {
    type Err = GeocodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let captures = BEST_ID
            .captures(raw)
            .ok_or_else(|| GeocodeError::InvalidInput(format!("Cannot parse best id '{}'", raw)))?;

        let kind = captures.get(3).map(|m| m.as_str()).unwrap_or_default();
        let object_type = match kind.to_lowercase().as_str() {
            "address" | "adres" => BestObjectType::Address,
            "streetname" | "straatnaam" => BestObjectType::Street,
            "municipality" | "gemeente" | "partofmunicipality" => BestObjectType::Locality,
            _ => {
                return Err(GeocodeError::InvalidInput(format!(
                    "Object type '{}' not supported so far in '{}'",
                    kind, raw
                )))
            }
        };

        Ok(Self {
            raw: raw.to_string(),
            object_type,
        })
    }
}
