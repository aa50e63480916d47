//! Fallback scoring of attempts that produced no building.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::checker::ResultChecker;
use crate::config::ScoreWeights;
use crate::models::{AddressQuery, Candidate};

lazy_static! {
    static ref LEADING_DIGITS: Regex = Regex::new(r"^[0-9]+").expect("valid digits pattern");
}

/// Independent contributions to the score of one candidate. Absent
/// contributions count as zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoreVector {
    pub postalcode: Option<f64>,
    pub locality: Option<f64>,
    pub street: Option<f64>,
    pub housenumber: Option<f64>,
    pub coordinates: Option<f64>,
    pub reference_metadata: Option<f64>,
}

impl ScoreVector {
    /// Score `candidate` against the caller's original input.
    pub fn compute(
        candidate: &Candidate,
        input: &AddressQuery,
        checker: &ResultChecker,
        weights: &ScoreWeights,
    ) -> Self {
        let mut score = Self::default();
        let Some(props) = candidate.properties.as_ref() else {
            return score;
        };

        if props.postalcode.is_some() && props.postalcode == input.post_code {
            score.postalcode = Some(weights.postalcode);
        }

        score.locality = checker
            .check_locality(candidate, non_empty(input.post_name.as_deref()))
            .filter(|sim| *sim > 0.0)
            .map(|sim| weights.locality + sim);

        if props.street.is_some() {
            let sim = checker
                .check_streetname(candidate, non_empty(input.street_name.as_deref()))
                .unwrap_or(0.0);
            score.street = Some(weights.street + sim);
        }

        if let Some(hn) = props.housenumber.as_deref() {
            let mut value = weights.housenumber;
            let input_hn = input.house_number.as_deref().unwrap_or_default();
            if hn == input_hn {
                value += weights.housenumber_exact;
            } else if let (Some(a), Some(b)) = (LEADING_DIGITS.find(hn), LEADING_DIGITS.find(input_hn)) {
                if a.as_str() == b.as_str() {
                    value += weights.housenumber_partial;
                }
            }
            score.housenumber = Some(value);
        }

        if !candidate.has_zero_coordinates() {
            score.coordinates = Some(weights.coordinates);
        }

        if props.best().is_some() {
            score.reference_metadata = Some(weights.reference_metadata);
        }

        score
    }

    pub fn total(&self) -> f64 {
        [
            self.postalcode,
            self.locality,
            self.street,
            self.housenumber,
            self.coordinates,
            self.reference_metadata,
        ]
        .iter()
        .flatten()
        .sum()
    }
}

impl fmt::Display for ScoreVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: Option<f64>| v.map_or("-".to_string(), |v| format!("{:.3}", v));
        write!(
            f,
            "postalcode={} locality={} street={} housenumber={} coordinates={} best={} => {:.3}",
            show(self.postalcode),
            show(self.locality),
            show(self.street),
            show(self.housenumber),
            show(self.coordinates),
            show(self.reference_metadata),
            self.total()
        )
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
