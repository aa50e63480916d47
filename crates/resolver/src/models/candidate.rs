//! Geocoded candidate (a GeoJSON feature) and the engine's annotations.
//!
//! What the geocoder returned lives in [`Geometry`] and [`Properties`].
//! What this crate computed lives in [`Annotations`] and is never read from
//! the upstream payload.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::PrecisionLabel;

// ============================================================================
// Geometry
// ============================================================================

/// A WGS84 position, serialized GeoJSON-style as `[lon, lat]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
}

impl Point {
    pub const ZERO: Point = Point { lon: 0.0, lat: 0.0 };

    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// `(0, 0)` means "no usable location" in the upstream data.
    pub fn is_zero(&self) -> bool {
        self.lon == 0.0 && self.lat == 0.0
    }

    pub fn to_lat_lon(self) -> LatLon {
        LatLon {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

impl From<[f64; 2]> for Point {
    fn from(value: [f64; 2]) -> Self {
        Self {
            lon: value[0],
            lat: value[1],
        }
    }
}

impl From<Point> for [f64; 2] {
    fn from(value: Point) -> Self {
        [value.lon, value.lat]
    }
}

/// A position as an object (`{"lat": .., "lon": ..}`), used by box records,
/// the search index and the output documents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl From<LatLon> for Point {
    fn from(value: LatLon) -> Self {
        Point::new(value.lon, value.lat)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(default)]
    pub coordinates: Point,

    /// Degenerate coordinates replaced by the backfill step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates_orig: Option<Point>,
}

impl Geometry {
    pub fn at(point: Point) -> Self {
        Self {
            coordinates: point,
            coordinates_orig: None,
        }
    }
}

// ============================================================================
// Properties
// ============================================================================

/// Feature properties as returned by the geocoder.
///
/// Only the fields the engine reads are typed; everything else is kept in
/// `extra` so the raw answer can be echoed back to the caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// address, street, locality, postalcode, region...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub housenumber: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,

    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub postalcode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// exact, interpolated, fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,

    /// point, centroid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addendum: Option<Addendum>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Properties {
    /// Reference metadata attached by the address data source, if any.
    pub fn best(&self) -> Option<&BestMetadata> {
        self.addendum.as_ref().and_then(|a| a.best.as_ref())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Addendum {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best: Option<BestMetadata>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Authoritative multilingual names attached to a feature.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BestMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streetname_fr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streetname_nl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streetname_de: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postname_fr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postname_nl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postname_de: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality_name_fr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality_name_nl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality_name_de: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_municipality_name_fr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_municipality_name_nl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_municipality_name_de: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub box_info: Vec<BoxInfo>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BestMetadata {
    /// Localized street names (fr, nl, de).
    pub fn street_names(&self) -> impl Iterator<Item = &str> {
        [&self.streetname_fr, &self.streetname_nl, &self.streetname_de]
            .into_iter()
            .filter_map(|n| n.as_deref())
    }

    /// Postal names then municipality names, each in fr, nl, de.
    pub fn city_names(&self) -> impl Iterator<Item = &str> {
        [
            &self.postname_fr,
            &self.postname_nl,
            &self.postname_de,
            &self.municipality_name_fr,
            &self.municipality_name_nl,
            &self.municipality_name_de,
        ]
        .into_iter()
        .filter_map(|n| n.as_deref())
    }

    /// City names followed by the part-of-municipality names.
    pub fn locality_names(&self) -> impl Iterator<Item = &str> {
        self.city_names().chain(
            [
                &self.part_of_municipality_name_fr,
                &self.part_of_municipality_name_nl,
                &self.part_of_municipality_name_de,
            ]
            .into_iter()
            .filter_map(|n| n.as_deref()),
        )
    }

    /// Postal code from the nested `postal_info` block, when present.
    pub fn postal_code(&self) -> Option<String> {
        let info = self
            .extra
            .get("postal_info")
            .or_else(|| self.extra.get("postalInfo"))?;
        let code = info.get("postal_code").or_else(|| info.get("postalCode"))?;
        match code {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Sub-address (box / apartment) record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<LatLon>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Annotations
// ============================================================================

/// How the coordinates of a candidate were obtained, when not from the
/// geocoder directly. Serialized as `false`, `true`, `"from_boxnumber"` or
/// `"street_center"`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolated {
    #[default]
    No,
    /// Interpolated along the street by the interpolation service
    Yes,
    /// Copied from the first box record
    FromBoxNumber,
    /// Street center point, interpolation gave nothing
    StreetCenter,
}

impl Interpolated {
    pub fn is_no(&self) -> bool {
        matches!(self, Self::No)
    }
}

impl Serialize for Interpolated {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::No => serializer.serialize_bool(false),
            Self::Yes => serializer.serialize_bool(true),
            Self::FromBoxNumber => serializer.serialize_str("from_boxnumber"),
            Self::StreetCenter => serializer.serialize_str("street_center"),
        }
    }
}

/// Fields computed by the engine for one candidate.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Annotations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<PrecisionLabel>,

    #[serde(skip_serializing_if = "Interpolated::is_no")]
    pub interpolated: Interpolated,
}

// ============================================================================
// Candidate
// ============================================================================

/// One geocoded result.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub geometry: Geometry,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,

    #[serde(skip)]
    pub annotations: Annotations,
}

impl Candidate {
    pub fn new(point: Point, properties: Properties) -> Self {
        Self {
            geometry: Geometry::at(point),
            properties: Some(properties),
            annotations: Annotations::default(),
        }
    }

    pub fn coordinates(&self) -> Point {
        self.geometry.coordinates
    }

    pub fn has_zero_coordinates(&self) -> bool {
        self.geometry.coordinates.is_zero()
    }

    pub fn street(&self) -> Option<&str> {
        self.properties.as_ref().and_then(|p| p.street.as_deref())
    }

    pub fn postalcode(&self) -> Option<&str> {
        self.properties.as_ref().and_then(|p| p.postalcode.as_deref())
    }

    pub fn housenumber(&self) -> Option<&str> {
        self.properties.as_ref().and_then(|p| p.housenumber.as_deref())
    }

    pub fn confidence(&self) -> Option<f64> {
        self.properties.as_ref().and_then(|p| p.confidence)
    }

    pub fn best(&self) -> Option<&BestMetadata> {
        self.properties.as_ref().and_then(Properties::best)
    }

    /// Replace the coordinates, remembering the previous ones.
    pub fn relocate(&mut self, point: Point, interpolated: Interpolated) {
        self.geometry.coordinates_orig = Some(self.geometry.coordinates);
        self.geometry.coordinates = point;
        self.annotations.interpolated = interpolated;
    }
}

/// Accept `"1060"`, `1060` or `null` for a string field.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_feature() {
        let feature: Candidate = serde_json::from_value(json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [4.33844, 50.83582]},
            "properties": {
                "id": "https://databrussels.be/id/address/12345/2",
                "layer": "address",
                "housenumber": "20",
                "street": "Avenue Fonsny",
                "postalcode": 1060,
                "confidence": 1,
                "match_type": "exact",
                "accuracy": "point",
                "country": "Belgium",
                "addendum": {"best": {
                    "streetname_fr": "Avenue Fonsny",
                    "streetname_nl": "Fonsnylaan",
                    "postname_fr": "Saint-Gilles",
                    "box_info": [{"coordinates": {"lat": 50.8, "lon": 4.3}, "box_number": "A"}]
                }}
            }
        }))
        .unwrap();

        assert_eq!(feature.coordinates(), Point::new(4.33844, 50.83582));
        assert_eq!(feature.postalcode(), Some("1060"));
        assert_eq!(feature.confidence(), Some(1.0));
        let best = feature.best().unwrap();
        assert_eq!(
            best.street_names().collect::<Vec<_>>(),
            vec!["Avenue Fonsny", "Fonsnylaan"]
        );
        assert_eq!(best.box_info.len(), 1);
        assert_eq!(
            best.box_info[0].extra.get("box_number"),
            Some(&json!("A"))
        );
        let props = feature.properties.as_ref().unwrap();
        assert_eq!(props.extra.get("country"), Some(&json!("Belgium")));
        assert_eq!(feature.annotations, Annotations::default());
    }

    #[test]
    fn test_missing_geometry_defaults_to_zero() {
        let feature: Candidate =
            serde_json::from_value(json!({"properties": {"layer": "street"}})).unwrap();
        assert!(feature.has_zero_coordinates());
    }

    #[test]
    fn test_relocate_keeps_original() {
        let mut feature = Candidate::new(Point::ZERO, Properties::default());
        feature.relocate(Point::new(4.35, 50.85), Interpolated::FromBoxNumber);

        assert_eq!(feature.coordinates(), Point::new(4.35, 50.85));
        assert_eq!(feature.geometry.coordinates_orig, Some(Point::ZERO));
        assert_eq!(feature.annotations.interpolated, Interpolated::FromBoxNumber);

        let geometry = serde_json::to_value(&feature.geometry).unwrap();
        assert_eq!(
            geometry,
            json!({"coordinates": [4.35, 50.85], "coordinates_orig": [0.0, 0.0]})
        );
    }

    #[test]
    fn test_interpolated_serialization() {
        assert_eq!(serde_json::to_value(Interpolated::Yes).unwrap(), json!(true));
        assert_eq!(
            serde_json::to_value(Interpolated::StreetCenter).unwrap(),
            json!("street_center")
        );
    }

    #[test]
    fn test_postal_code_from_postal_info() {
        let best: BestMetadata = serde_json::from_value(json!({
            "postal_info": {"postal_code": "1060", "name": {"fr": "Saint-Gilles"}}
        }))
        .unwrap();
        assert_eq!(best.postal_code().as_deref(), Some("1060"));
    }
}
