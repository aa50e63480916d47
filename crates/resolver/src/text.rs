//! Name normalization helpers shared by the checker and the transformers.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::errors::GeocodeError;

lazy_static! {
    static ref STREET_TYPES: Vec<Regex> = [
        "^RUE ", "^AVENUE ", "^CHAUSSEE ", "^ALLEE ", "^BOULEVARD ", "^PLACE ", "^CHEMIN ",
        "STRAAT$", "STEENWEG$", "LAAN$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid street type pattern"))
    .collect();

    static ref ARTICLES: Vec<Regex> = ["^DE LA ", "^DE ", "^DU ", "^DES "]
        .iter()
        .map(|p| Regex::new(p).expect("valid article pattern"))
        .collect();
}

/// Strip diacritics: "Chaussée d'Ixelles" -> "Chaussee d'Ixelles".
pub fn fold_ascii(s: &str) -> String {
    s.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Remove the usual French/Dutch street types and leading articles from an
/// upper-cased street name ("RUE DE LA LOI" -> "LOI", "KERKSTRAAT" -> "KERK").
pub fn remove_street_types(street_name: &str) -> String {
    let mut name = street_name.to_string();
    for re in STREET_TYPES.iter().chain(ARTICLES.iter()) {
        name = re.replace_all(&name, "").into_owned();
    }
    name.trim().to_string()
}

/// Ordered regex substitutions (the `clean` transformer).
#[derive(Clone, Debug)]
pub struct CleanPatterns {
    patterns: Vec<(Regex, String)>,
}

impl CleanPatterns {
    pub fn compile(patterns: &[(String, String)]) -> Result<Self, GeocodeError> {
        let patterns = patterns
            .iter()
            .map(|(pattern, replacement)| {
                Regex::new(pattern)
                    .map(|re| (re, replacement.clone()))
                    .map_err(|e| {
                        GeocodeError::InvalidConfig(format!("clean pattern '{}': {}", pattern, e))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Apply every substitution in order.
    pub fn apply(&self, value: &str) -> String {
        self.patterns
            .iter()
            .fold(value.to_string(), |acc, (re, replacement)| {
                re.replace_all(&acc, replacement.as_str()).into_owned()
            })
    }
}
