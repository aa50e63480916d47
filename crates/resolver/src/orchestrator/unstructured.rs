//! Free-text entry point.
//!
//! The text is first sent as is, then without parenthesized content. When
//! neither call yields a building, the geocoder's own parse of the text
//! gives (or leads to) candidate postal codes, and the structured cascade
//! runs once per postal code.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use super::Resolver;
use crate::errors::GeocodeError;
use crate::models::{
    AddressQuery, CallType, Candidate, LayerFilter, ParsedText, ResultSet, SentQuery,
    StructuredQuery,
};
use crate::precision::{add_precision, is_building};

lazy_static! {
    static ref PARENTHESES: Regex = Regex::new(r"\(.+?\)").expect("valid parentheses pattern");
}

/// Rank of a result set with no candidate at all.
const EMPTY_RANK: f64 = 20.0;
/// Bonus for a top candidate in the postal code the attempt was run with.
const POSTCODE_BONUS: f64 = 0.5;

impl Resolver {
    /// Resolve a free-text address.
    ///
    /// Without a building among all attempts, the attempt with the lowest
    /// precision rank wins; the earliest wins ties.
    pub async fn resolve_unstructured(&self, text: &str) -> Result<ResultSet, GeocodeError> {
        let mut ranked: Vec<(f64, ResultSet)> = Vec::new();
        let mut tried: Vec<String> = Vec::new();
        let mut call_count = 0;
        let mut parsed: Option<ParsedText> = None;
        let mut address = text.to_string();

        for (label, clean) in [("", false), ("clean", true)] {
            if clean {
                address = PARENTHESES.replace_all(&address, "").into_owned();
            }
            if tried.contains(&address) {
                continue;
            }
            tried.push(address.clone());

            debug!("Unstructured address='{}' (transformer='{}')", address, label);
            let mut result = self.call_unstruct(&address).await?;
            call_count += 1;
            result.meta.call_count = call_count;
            result.meta.transformers = Some(label.to_string());
            parsed = result.parsed.clone();

            if result.first().is_some_and(is_building) {
                if let Some(first) = result.first_mut().filter(|c| c.has_zero_coordinates()) {
                    self.backfill.backfill(first).await?;
                    add_precision(&mut result);
                }
                info!("Resolved free text after {} calls", call_count);
                return Ok(result);
            }

            ranked.push((rank(&result, None), result));
        }

        debug!("Unstructured failed, try to parse...");
        let parsed = parsed.unwrap_or_default();
        let postcodes = self.postcode_candidates(&parsed, &mut call_count).await?;
        debug!("Postcode candidates: {:?}", postcodes);

        for postcode in postcodes {
            let query = AddressQuery {
                street_name: parsed.street.clone(),
                house_number: parsed.housenumber.clone(),
                post_code: Some(postcode.clone()),
                post_name: parsed.city.clone(),
            };
            debug!("Structured attempt: {:?}", query);

            let mut result = self
                .advanced_mode(&query, &self.config.unstructured_transformer_sequence)
                .await?;
            call_count += result.meta.call_count;
            result.meta.call_count = call_count;
            result.meta.transformers = Some(format!(
                "parsed(postcode={});{}",
                postcode,
                result.meta.transformers.as_deref().unwrap_or_default()
            ));

            if result.first().is_some_and(is_building) {
                info!("Resolved parsed free text after {} calls", call_count);
                return Ok(result);
            }

            ranked.push((rank(&result, Some(postcode.as_str())), result));
        }

        debug!("Unstructured mode: no building result, keep the best match");
        let mut best: Option<(f64, ResultSet)> = None;
        for (score, result) in ranked {
            debug!("{:?} -> {}", result.meta.sent_query, score);
            if best.as_ref().map_or(true, |(top, _)| score < *top) {
                best = Some((score, result));
            }
        }

        Ok(match best {
            Some((_, mut result)) => {
                result.meta.call_count = call_count;
                result
            }
            None => ResultSet::empty(call_count),
        })
    }

    /// One free-text call, filtered against the geocoder's own parse.
    async fn call_unstruct(&self, address: &str) -> Result<ResultSet, GeocodeError> {
        let layers = if address.chars().any(|c| c.is_ascii_digit()) {
            None
        } else {
            Some(LayerFilter::StreetLocality)
        };

        let response = self.geocoder.geocode_text(address, layers).await?;
        let mut result = ResultSet::from_response(
            response,
            CallType::Unstruct,
            SentQuery::Text(address.to_string()),
        );

        let parsed = result.parsed.clone().unwrap_or_default();
        debug!("Parsed by geocoder: {:?}", parsed);
        match parsed.postalcode.as_deref() {
            Some(postcode) => self.checker.filter_postcode(&mut result, postcode),
            None => debug!("No postcode in input"),
        }
        if let Some(street) = parsed.street.as_deref() {
            self.checker.filter_streetname(&mut result, Some(street));
        }

        add_precision(&mut result);
        Ok(result)
    }

    /// Postal codes to try: the parsed one, else those of the parsed city
    /// (narrowed by a street search when there are too many).
    async fn postcode_candidates(
        &self,
        parsed: &ParsedText,
        call_count: &mut usize,
    ) -> Result<Vec<String>, GeocodeError> {
        if let Some(postcode) = parsed.postalcode.as_ref() {
            return Ok(vec![postcode.clone()]);
        }
        let Some(city) = parsed.city.as_deref() else {
            return Ok(Vec::new());
        };

        let candidates: Vec<String> = self
            .city_index
            .postcodes_for_city(city)
            .await?
            .into_iter()
            .collect();
        if candidates.len() <= self.config.max_postcode_candidates {
            return Ok(candidates);
        }

        let street = parsed.street.clone().unwrap_or_default();
        let response = self
            .geocoder
            .geocode_structured(&StructuredQuery::street(street), None)
            .await?;
        *call_count += 1;

        let in_street: HashSet<&str> = response
            .features
            .iter()
            .filter_map(Candidate::postalcode)
            .collect();
        debug!("Postcodes in street search: {:?}", in_street);

        let narrowed: Vec<String> = candidates
            .iter()
            .filter(|pc| in_street.contains(pc.as_str()))
            .cloned()
            .collect();
        if narrowed.is_empty() {
            debug!("No intersection between street postcodes and city postcodes, keep original list");
            return Ok(candidates);
        }
        Ok(narrowed)
    }
}

/// Precision rank of the top candidate, lower is better.
fn rank(result: &ResultSet, postcode: Option<&str>) -> f64 {
    let Some(first) = result.first() else {
        return EMPTY_RANK;
    };
    let mut score = first
        .annotations
        .precision
        .map_or(10.0, |precision| precision.rank());
    if postcode.is_some() && first.postalcode() == postcode {
        score -= POSTCODE_BONUS;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use crate::config::ResolverConfig;
    use crate::models::{Point, PrecisionLabel};
    use crate::test_support::{
        feature_at, fonsny_building, fonsny_street, parsed_response, response, MockCityIndex,
        MockGeocoder,
    };
    use serde_json::json;

    fn resolver(geocoder: Arc<MockGeocoder>, city_index: MockCityIndex) -> Resolver {
        Resolver::new(geocoder, Arc::new(city_index), ResolverConfig::default()).unwrap()
    }

    fn fonsny_parse() -> ParsedText {
        ParsedText {
            street: Some("av fonsny".to_string()),
            housenumber: Some("20".to_string()),
            postalcode: Some("1060".to_string()),
            city: Some("saint-gilles".to_string()),
        }
    }

    fn saint_gilles() -> Candidate {
        feature_at(
            Point::new(4.34, 50.83),
            json!({"layer": "locality", "name": "Saint-Gilles", "confidence": 0.6}),
        )
    }

    #[tokio::test]
    async fn test_free_text_building_returns_immediately() {
        let geocoder =
            Arc::new(MockGeocoder::new().on_text(|_, _| response(vec![fonsny_building()])));
        let result = resolver(geocoder.clone(), MockCityIndex::empty())
            .resolve_unstructured("Avenue Fonsny 20, 1060 Saint-Gilles")
            .await
            .unwrap();

        assert_eq!(result.meta.call_count, 1);
        assert_eq!(result.meta.transformers.as_deref(), Some(""));
        assert_eq!(
            result.first().unwrap().annotations.precision,
            Some(PrecisionLabel::Address)
        );
        assert_eq!(geocoder.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_parenthesized_content_is_dropped_on_second_call() {
        let geocoder = Arc::new(MockGeocoder::new().on_text(|text, _| {
            if text.contains('(') {
                response(Vec::new())
            } else {
                response(vec![fonsny_building()])
            }
        }));
        let result = resolver(geocoder.clone(), MockCityIndex::empty())
            .resolve_unstructured("Avenue Fonsny 20 (gare du Midi), 1060 Saint-Gilles")
            .await
            .unwrap();

        assert_eq!(result.meta.call_count, 2);
        assert_eq!(result.meta.transformers.as_deref(), Some("clean"));
        assert_eq!(
            geocoder.text_sent.lock().unwrap()[1],
            "Avenue Fonsny 20 , 1060 Saint-Gilles"
        );
    }

    #[tokio::test]
    async fn test_parsed_postcode_drives_structured_cascade() {
        let geocoder = Arc::new(
            MockGeocoder::new()
                .on_text(|text, _| parsed_response(text, fonsny_parse(), Vec::new()))
                .on_structured(|q, _| {
                    if q.postalcode.as_deref() == Some("1060") {
                        response(vec![fonsny_building()])
                    } else {
                        response(Vec::new())
                    }
                }),
        );
        let result = resolver(geocoder.clone(), MockCityIndex::empty())
            .resolve_unstructured("Av Fonsny 20, 1060 Saint-Gilles")
            .await
            .unwrap();

        assert_eq!(
            result.meta.transformers.as_deref(),
            Some("parsed(postcode=1060);no_city")
        );
        assert_eq!(result.meta.call_count, 2);
        assert_eq!(geocoder.total_calls(), 2);

        let sent = geocoder.structured_sent.lock().unwrap();
        assert_eq!(sent[0].address, "av fonsny, 20");
        assert_eq!(sent[0].locality.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_lowest_rank_wins_with_postcode_bonus() {
        let geocoder = Arc::new(
            MockGeocoder::new()
                .on_text(|text, _| {
                    let parse = ParsedText {
                        street: Some("avenue fonsny".to_string()),
                        ..fonsny_parse()
                    };
                    parsed_response(text, parse, vec![saint_gilles()])
                })
                .on_structured(|_, _| response(vec![fonsny_street()])),
        );
        let result = resolver(geocoder.clone(), MockCityIndex::empty())
            .resolve_unstructured("Avenue Fonsny 20, 1060 Saint-Gilles")
            .await
            .unwrap();

        assert_eq!(
            result.first().unwrap().annotations.precision,
            Some(PrecisionLabel::Street)
        );
        assert!(result
            .meta
            .transformers
            .as_deref()
            .unwrap()
            .starts_with("parsed(postcode=1060);"));
        assert_eq!(result.meta.call_count, geocoder.total_calls());
    }

    #[tokio::test]
    async fn test_city_postcodes_narrowed_by_street_search() {
        let geocoder = Arc::new(
            MockGeocoder::new()
                .on_text(|text, _| {
                    let parse = ParsedText {
                        street: Some("rue haute".to_string()),
                        housenumber: None,
                        postalcode: None,
                        city: Some("bruxelles".to_string()),
                    };
                    parsed_response(text, parse, Vec::new())
                })
                .on_structured(|q, _| {
                    if q.postalcode.is_none() && q.locality.is_none() {
                        response(vec![
                            feature_at(Point::new(4.35, 50.84), json!({"postalcode": "1000"})),
                            feature_at(Point::new(4.0, 51.0), json!({"postalcode": "9999"})),
                        ])
                    } else {
                        response(Vec::new())
                    }
                }),
        );
        let city_index = MockCityIndex::new(vec!["1000", "1020", "1030", "1040", "1050"]);
        let result = resolver(geocoder.clone(), city_index)
            .resolve_unstructured("Rue Haute, Bruxelles")
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(result.meta.call_count, geocoder.total_calls());

        let sent = geocoder.structured_sent.lock().unwrap();
        let postcodes: HashSet<Option<String>> =
            sent.iter().map(|q| q.postalcode.clone()).collect();
        assert!(postcodes.contains(&Some("1000".to_string())));
        assert!(!postcodes.contains(&Some("1020".to_string())));
    }

    #[tokio::test]
    async fn test_nothing_parsed_keeps_free_text_attempt() {
        let geocoder = Arc::new(MockGeocoder::new());
        let city_index = MockCityIndex::empty();
        let result = resolver(geocoder.clone(), city_index)
            .resolve_unstructured("nowhere")
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(result.meta.call_count, 1);
        assert_eq!(result.meta.call_type, Some(CallType::Unstruct));
        assert_eq!(geocoder.structured_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_structured_and_free_text_entries_agree() {
        let geocoder = Arc::new(
            MockGeocoder::new()
                .on_text(|text, _| parsed_response(text, fonsny_parse(), Vec::new()))
                .on_structured(|q, _| {
                    let matches = q.address.to_lowercase().starts_with("av fonsny")
                        && q.postalcode.as_deref() == Some("1060");
                    response(if matches { vec![fonsny_building()] } else { Vec::new() })
                }),
        );
        let resolver = resolver(geocoder, MockCityIndex::empty());

        let structured = resolver
            .resolve(&AddressQuery::new(
                Some("Av Fonsny"),
                Some("20"),
                Some("1060"),
                Some("Saint-Gilles"),
            ))
            .await
            .unwrap();
        let free_text = resolver
            .resolve_unstructured("Av Fonsny 20, 1060 Saint-Gilles")
            .await
            .unwrap();

        let top = |r: &ResultSet| r.first().and_then(|c| c.properties.clone()).and_then(|p| p.id);
        assert!(top(&structured).is_some());
        assert_eq!(top(&structured), top(&free_text));
        assert_eq!(
            structured.first().unwrap().annotations.precision,
            free_text.first().unwrap().annotations.precision
        );
    }
}
