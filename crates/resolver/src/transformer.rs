//! Address transformers.
//!
//! Each step is a pure `AddressQuery -> AddressQuery` rewrite producing a
//! less specific or cleaner variant to send again to the geocoder.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::AddressQuery;
use crate::text::CleanPatterns;

lazy_static! {
    static ref LEADING_DIGITS: Regex = Regex::new("^[0-9]+").expect("valid digits pattern");
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransformerStep {
    /// Blank the locality name
    NoCity,
    /// Blank the house number
    NoHn,
    /// Keep the leading digits of the house number ("20-22" -> "20", "12A" -> "12")
    CleanHn,
    /// Apply the clean patterns to street and locality names
    Clean,
    /// Blank street name and house number
    NoStreet,
}

/// Steps applied left to right.
pub type TransformerSequence = Vec<TransformerStep>;

impl TransformerStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoCity => "no_city",
            Self::NoHn => "no_hn",
            Self::CleanHn => "clean_hn",
            Self::Clean => "clean",
            Self::NoStreet => "no_street",
        }
    }
}

impl fmt::Display for TransformerStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformerStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no_city" => Ok(Self::NoCity),
            "no_hn" => Ok(Self::NoHn),
            "clean_hn" => Ok(Self::CleanHn),
            "clean" => Ok(Self::Clean),
            "no_street" => Ok(Self::NoStreet),
            other => Err(format!("Unknown transformer '{}'", other)),
        }
    }
}

/// `;`-joined step names, as reported in the `transformers` trace.
pub fn sequence_label(sequence: &[TransformerStep]) -> String {
    sequence
        .iter()
        .map(TransformerStep::as_str)
        .collect::<Vec<_>>()
        .join(";")
}

/// Applies transformer steps with a given set of clean patterns.
#[derive(Clone, Debug)]
pub struct AddressTransformer {
    clean: CleanPatterns,
}

impl AddressTransformer {
    pub fn new(clean: CleanPatterns) -> Self {
        Self { clean }
    }

    pub fn apply(&self, query: &AddressQuery, step: TransformerStep) -> AddressQuery {
        let mut out = query.clone();
        match step {
            TransformerStep::NoCity => out.post_name = Some(String::new()),
            TransformerStep::NoHn => out.house_number = Some(String::new()),
            TransformerStep::NoStreet => {
                out.street_name = Some(String::new());
                out.house_number = Some(String::new());
            }
            TransformerStep::CleanHn => {
                out.house_number = query.house_number.as_deref().map(clean_house_number);
            }
            TransformerStep::Clean => {
                out.street_name = query.street_name.as_deref().map(|s| self.clean.apply(s));
                out.post_name = query.post_name.as_deref().map(|s| self.clean.apply(s));
            }
        }
        out
    }

    pub fn apply_sequence(&self, query: &AddressQuery, sequence: &[TransformerStep]) -> AddressQuery {
        sequence
            .iter()
            .fold(query.clone(), |acc, step| self.apply(&acc, *step))
    }
}

fn clean_house_number(house_number: &str) -> String {
    let first = match house_number.split_once('-') {
        Some((head, _)) => head.trim(),
        None => house_number,
    };
    match LEADING_DIGITS.find(first) {
        Some(m) => m.as_str().to_string(),
        None => first.to_string(),
    }
}
