//! Precision classification of candidates.

use tracing::warn;

use crate::models::{Candidate, Interpolated, PrecisionLabel, ResultSet};

const CITY_LAYERS: &[&str] = &["city", "locality", "postalcode", "localadmin", "neighbourhood"];
const COUNTRY_LAYERS: &[&str] = &["region", "macroregion", "county"];

/// Label a candidate from its layer, match type, accuracy, coordinates,
/// interpolation annotation and source id. Total: unhandled shapes give
/// [`PrecisionLabel::Unknown`].
pub fn classify(candidate: &Candidate) -> PrecisionLabel {
    let Some(props) = candidate.properties.as_ref() else {
        warn!("Candidate without properties, precision unknown");
        return PrecisionLabel::Unknown;
    };
    let Some(layer) = props.layer.as_deref() else {
        warn!("Candidate without layer, precision unknown");
        return PrecisionLabel::Unknown;
    };
    let zero = candidate.has_zero_coordinates();

    match layer {
        "address" => {
            if zero {
                return PrecisionLabel::Address00;
            }
            match candidate.annotations.interpolated {
                Interpolated::StreetCenter => return PrecisionLabel::AddressStreetcenter,
                Interpolated::Yes => return PrecisionLabel::AddressInterpol,
                _ => {}
            }
            if props.match_type.as_deref() == Some("interpolated") {
                let Some(id) = props.id.as_deref() else {
                    warn!("Interpolated address without id, precision unknown");
                    return PrecisionLabel::Unknown;
                };
                let id = id.to_lowercase();
                if id.contains("/streetname/") || id.contains("/straatnaam/") {
                    return PrecisionLabel::StreetInterpol;
                }
                warn!("Interpolated address from a non street source: {}", id);
                return PrecisionLabel::AddressInterpol2;
            }
            if props.match_type.as_deref() == Some("exact") || props.accuracy.as_deref() == Some("point")
            {
                return PrecisionLabel::Address;
            }
            warn!(
                "Unhandled address candidate (match_type={:?}, accuracy={:?})",
                props.match_type, props.accuracy
            );
            PrecisionLabel::Unknown
        }
        "street" if zero => PrecisionLabel::Street00,
        "street" => PrecisionLabel::Street,
        l if CITY_LAYERS.contains(&l) && zero => PrecisionLabel::City00,
        l if CITY_LAYERS.contains(&l) => PrecisionLabel::City,
        l if COUNTRY_LAYERS.contains(&l) => PrecisionLabel::Country,
        other => {
            warn!("Unhandled layer '{}', precision unknown", other);
            PrecisionLabel::Unknown
        }
    }
}

/// Building-level candidate: exact or interpolated match (or point accuracy)
/// carrying a house number.
pub fn is_building(candidate: &Candidate) -> bool {
    let Some(props) = candidate.properties.as_ref() else {
        return false;
    };
    let matched = matches!(props.match_type.as_deref(), Some("exact") | Some("interpolated"))
        || props.accuracy.as_deref() == Some("point");
    matched && props.housenumber.is_some()
}

/// (Re)compute the precision annotation of every candidate.
pub fn add_precision(result: &mut ResultSet) {
    for candidate in result.candidates.iter_mut() {
        candidate.annotations.precision = Some(classify(candidate));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Point, Properties};

    fn candidate(layer: &str, match_type: Option<&str>, point: Point) -> Candidate {
        Candidate::new(
            point,
            Properties {
                id: Some("https://databrussels.be/id/address/1/1".to_string()),
                layer: Some(layer.to_string()),
                match_type: match_type.map(str::to_string),
                housenumber: Some("20".to_string()),
                ..Properties::default()
            },
        )
    }

    const HERE: Point = Point {
        lon: 4.33844,
        lat: 50.83582,
    };

    #[test]
    fn test_address_labels() {
        assert_eq!(
            classify(&candidate("address", Some("exact"), HERE)),
            PrecisionLabel::Address
        );
        assert_eq!(
            classify(&candidate("address", Some("exact"), Point::ZERO)),
            PrecisionLabel::Address00
        );

        let mut interpolated = candidate("address", Some("exact"), HERE);
        interpolated.annotations.interpolated = Interpolated::Yes;
        assert_eq!(classify(&interpolated), PrecisionLabel::AddressInterpol);

        interpolated.annotations.interpolated = Interpolated::StreetCenter;
        assert_eq!(classify(&interpolated), PrecisionLabel::AddressStreetcenter);
    }

    #[test]
    fn test_interpolated_match_type() {
        let mut c = candidate("address", Some("interpolated"), HERE);
        c.properties.as_mut().unwrap().id =
            Some("https://databrussels.be/id/streetname/1234/2".to_string());
        assert_eq!(classify(&c), PrecisionLabel::StreetInterpol);

        let c = candidate("address", Some("interpolated"), HERE);
        assert_eq!(classify(&c), PrecisionLabel::AddressInterpol2);
    }

    #[test]
    fn test_point_accuracy_is_address() {
        let mut c = candidate("address", Some("fallback"), HERE);
        c.properties.as_mut().unwrap().accuracy = Some("point".to_string());
        assert_eq!(classify(&c), PrecisionLabel::Address);
    }

    #[test]
    fn test_other_layers() {
        assert_eq!(classify(&candidate("street", None, HERE)), PrecisionLabel::Street);
        assert_eq!(
            classify(&candidate("street", None, Point::ZERO)),
            PrecisionLabel::Street00
        );
        assert_eq!(classify(&candidate("locality", None, HERE)), PrecisionLabel::City);
        assert_eq!(
            classify(&candidate("postalcode", None, Point::ZERO)),
            PrecisionLabel::City00
        );
        assert_eq!(classify(&candidate("region", None, HERE)), PrecisionLabel::Country);
        assert_eq!(classify(&candidate("venue", None, HERE)), PrecisionLabel::Unknown);
    }

    #[test]
    fn test_missing_properties_is_unknown() {
        let c = Candidate::default();
        assert_eq!(classify(&c), PrecisionLabel::Unknown);
        assert!(!is_building(&c));
    }

    #[test]
    fn test_classify_is_idempotent() {
        let mut result = ResultSet {
            candidates: vec![candidate("address", Some("exact"), HERE)],
            ..ResultSet::default()
        };
        add_precision(&mut result);
        let first = result.candidates[0].annotations.clone();
        add_precision(&mut result);
        assert_eq!(result.candidates[0].annotations, first);
        assert_eq!(first.precision, Some(PrecisionLabel::Address));
    }

    #[test]
    fn test_is_building() {
        assert!(is_building(&candidate("address", Some("exact"), HERE)));
        assert!(is_building(&candidate("address", Some("interpolated"), HERE)));
        assert!(!is_building(&candidate("street", Some("fallback"), HERE)));

        let mut no_number = candidate("address", Some("exact"), HERE);
        no_number.properties.as_mut().unwrap().housenumber = None;
        assert!(!is_building(&no_number));
    }
}
