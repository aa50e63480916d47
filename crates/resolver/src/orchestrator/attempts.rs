//! Attempt plan of the structured cascade.
//!
//! The cascade walks every transformer sequence twice: first with the
//! postcode check on, then off. The relaxed pass only runs when the strict
//! one found nothing at all; the driver decides that through
//! [`Attempt::starts_relaxed_pass`].

use crate::models::ResultSet;
use crate::transformer::{sequence_label, TransformerStep};

const NO_POSTCODE_CHECK: &str = "(no postcode check)";

/// One planned attempt: a transformer sequence and the postcode check flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attempt<'a> {
    pub check_postcode: bool,
    pub steps: &'a [TransformerStep],
    index: usize,
}

impl Attempt<'_> {
    /// First attempt of the pass without postcode check.
    pub fn starts_relaxed_pass(&self) -> bool {
        !self.check_postcode && self.index == 0
    }

    /// Trace of the attempt, e.g. `clean;no_city(no postcode check)`.
    pub fn label(&self) -> String {
        let mut label = sequence_label(self.steps);
        if !self.check_postcode {
            label.push_str(NO_POSTCODE_CHECK);
        }
        label
    }
}

/// Iterator over `(check_postcode, sequence)` pairs, strict pass first.
#[derive(Clone, Debug)]
pub struct AttemptPlan<'a> {
    sequences: &'a [Vec<TransformerStep>],
    passes: [bool; 2],
    pass: usize,
    index: usize,
}

impl<'a> AttemptPlan<'a> {
    pub fn new(sequences: &'a [Vec<TransformerStep>]) -> Self {
        Self {
            sequences,
            passes: [true, false],
            pass: 0,
            index: 0,
        }
    }
}

impl<'a> Iterator for AttemptPlan<'a> {
    type Item = Attempt<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.sequences.is_empty() {
            return None;
        }
        if self.index == self.sequences.len() {
            self.pass += 1;
            self.index = 0;
        }
        let check_postcode = *self.passes.get(self.pass)?;
        let attempt = Attempt {
            check_postcode,
            steps: &self.sequences[self.index],
            index: self.index,
        };
        self.index += 1;
        Some(attempt)
    }
}

/// Progress of a resolution session.
#[derive(Debug)]
pub enum SearchState {
    /// Attempts remain
    Trying,
    /// A result was accepted; no further attempt is made
    Found(ResultSet),
    /// The plan ran out (or the relaxed pass was not needed)
    Exhausted,
}

impl SearchState {
    pub fn is_trying(&self) -> bool {
        matches!(self, Self::Trying)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TransformerStep::*;

    #[test]
    fn test_plan_walks_both_passes() {
        let sequences = vec![vec![], vec![Clean, NoCity]];
        let attempts: Vec<_> = AttemptPlan::new(&sequences).collect();

        assert_eq!(attempts.len(), 4);
        assert!(attempts[0].check_postcode && attempts[1].check_postcode);
        assert!(!attempts[2].check_postcode && !attempts[3].check_postcode);
        assert_eq!(attempts[3].steps, &[Clean, NoCity][..]);
    }

    #[test]
    fn test_relaxed_pass_start() {
        let sequences = vec![vec![], vec![NoHn]];
        let starts: Vec<bool> = AttemptPlan::new(&sequences)
            .map(|a| a.starts_relaxed_pass())
            .collect();
        assert_eq!(starts, vec![false, false, true, false]);
    }

    #[test]
    fn test_labels() {
        let sequences = vec![vec![], vec![Clean, NoCity]];
        let labels: Vec<String> = AttemptPlan::new(&sequences).map(|a| a.label()).collect();
        assert_eq!(
            labels,
            vec![
                "".to_string(),
                "clean;no_city".to_string(),
                "(no postcode check)".to_string(),
                "clean;no_city(no postcode check)".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_plan() {
        let sequences: Vec<Vec<TransformerStep>> = Vec::new();
        assert_eq!(AttemptPlan::new(&sequences).count(), 0);
    }
}
