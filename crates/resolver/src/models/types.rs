use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Reliability of a candidate's geometry, as judged by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecisionLabel {
    /// Exact building position
    Address,
    /// Building found, but without coordinates
    #[serde(rename = "address_00")]
    Address00,
    /// Building position interpolated along the street
    AddressInterpol,
    /// Interpolated by the geocoder without a street-level source (unexpected)
    AddressInterpol2,
    /// Building known, position is the street center
    AddressStreetcenter,
    /// Interpolated by the geocoder from a street-level source
    StreetInterpol,
    Street,
    #[serde(rename = "street_00")]
    Street00,
    City,
    #[serde(rename = "city_00")]
    City00,
    Country,
    Unknown,
}

impl PrecisionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Address00 => "address_00",
            Self::AddressInterpol => "address_interpol",
            Self::AddressInterpol2 => "address_interpol2",
            Self::AddressStreetcenter => "address_streetcenter",
            Self::StreetInterpol => "street_interpol",
            Self::Street => "street",
            Self::Street00 => "street_00",
            Self::City => "city",
            Self::City00 => "city_00",
            Self::Country => "country",
            Self::Unknown => "unknown",
        }
    }

    /// Rank used to pick the best unstructured attempt (lower is better).
    pub fn rank(&self) -> f64 {
        match self {
            Self::Address => 0.0,
            Self::AddressInterpol => 1.0,
            Self::AddressStreetcenter => 2.0,
            Self::StreetInterpol => 3.0,
            Self::Street => 4.0,
            Self::Address00 => 5.0,
            Self::Street00 => 6.0,
            Self::City => 7.0,
            _ => 10.0,
        }
    }
}

impl fmt::Display for PrecisionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which geocoder endpoint produced a result set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Struct,
    Unstruct,
}

/// Resolution strategy requested by the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// A single geocoder call, no transformation
    Basic,
    /// One structured/unstructured round
    Simple,
    /// Full transformer cascade
    #[default]
    Advanced,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "simple" => Ok(Self::Simple),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!("Unknown mode '{}'", other)),
        }
    }
}
