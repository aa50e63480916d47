//! Geocoder responses and the result sets built from them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{CallType, Candidate, Point, StructuredQuery};

// ============================================================================
// Upstream payloads
// ============================================================================

/// Body of a geocoder search / reverse response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocoding: Option<GeocodingMeta>,

    #[serde(default)]
    pub features: Vec<Candidate>,
}

impl GeocodeResponse {
    pub fn with_features(features: Vec<Candidate>) -> Self {
        Self {
            geocoding: None,
            features,
        }
    }

    /// Text echoed back by the geocoder (`geocoding.query.text`).
    pub fn query_text(&self) -> Option<&str> {
        self.geocoding
            .as_ref()
            .and_then(|g| g.query.as_ref())
            .and_then(|q| q.text.as_deref())
    }

    /// Components recognized by the geocoder's own address parser.
    pub fn parsed_text(&self) -> Option<&ParsedText> {
        self.geocoding
            .as_ref()
            .and_then(|g| g.query.as_ref())
            .and_then(|q| q.parsed_text.as_ref())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocodingMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<QueryEcho>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryEcho {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_text: Option<ParsedText>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Address components extracted from free text by the geocoder.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedText {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub housenumber: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postalcode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// Body of an interpolation response; `{}` when nothing could be computed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InterpolationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<InterpolatedGeometry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterpolatedGeometry {
    pub coordinates: Point,
}

impl InterpolationResponse {
    pub fn at(point: Point) -> Self {
        Self {
            geometry: Some(InterpolatedGeometry { coordinates: point }),
            extra: Map::new(),
        }
    }

    pub fn point(&self) -> Option<Point> {
        self.geometry.as_ref().map(|g| g.coordinates)
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.is_none() && self.extra.is_empty()
    }
}

// ============================================================================
// Result sets
// ============================================================================

/// The query actually sent upstream for a result set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SentQuery {
    Structured(StructuredQuery),
    Text(String),
}

/// Bookkeeping attached to a result set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_type: Option<CallType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_query: Option<SentQuery>,

    /// Geocoder calls made during the whole resolution session so far
    pub call_count: usize,

    /// Transformer trace of the attempt that produced this set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformers: Option<String>,
}

/// Candidates returned by one geocoder call, plus engine metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    pub candidates: Vec<Candidate>,
    pub meta: ResultMeta,
    /// Parser output of an unstructured call
    pub parsed: Option<ParsedText>,
}

impl ResultSet {
    /// Wrap a geocoder response.
    pub fn from_response(response: GeocodeResponse, call_type: CallType, sent: SentQuery) -> Self {
        let parsed = response.parsed_text().cloned();
        Self {
            candidates: response.features,
            meta: ResultMeta {
                call_type: Some(call_type),
                sent_query: Some(sent),
                call_count: 1,
                transformers: None,
            },
            parsed,
        }
    }

    /// A set with no candidates, carrying only a call count.
    pub fn empty(call_count: usize) -> Self {
        Self {
            meta: ResultMeta {
                call_count,
                ..ResultMeta::default()
            },
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn first(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    pub fn first_mut(&mut self) -> Option<&mut Candidate> {
        self.candidates.first_mut()
    }
}
