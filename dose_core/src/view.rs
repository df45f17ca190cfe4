//! View pipeline: orientation → filtering → windowing → final ordering.
//!
//! The pipeline is a pure function of the record list and a [`ViewSpec`].
//! The record list is expected to be sorted oldest-first by timestamp.

use crate::{Dose, Error, RenderOptions, Result};
use regex::Regex;

/// A compiled, case-insensitive text filter
#[derive(Clone, Debug)]
pub struct Filter {
    regex: Regex,
    invert: bool,
}

impl Filter {
    /// Compile a filter pattern; matching is always case-insensitive
    pub fn new(pattern: &str, invert: bool) -> Result<Self> {
        let regex = Regex::new(&format!("(?i){}", pattern))?;
        Ok(Self { regex, invert })
    }

    /// Build an optional filter from user options
    ///
    /// Inverting without a pattern is rejected rather than silently ignored.
    pub fn from_options(pattern: Option<&str>, invert: bool) -> Result<Option<Self>> {
        match pattern.filter(|p| !p.is_empty()) {
            Some(p) => Self::new(p, invert).map(Some),
            None if invert => Err(Error::Config(
                "cannot invert the filter without a filter pattern".into(),
            )),
            None => Ok(None),
        }
    }

    /// Whether a rendered line passes the filter
    pub fn accepts(&self, line: &str) -> bool {
        self.invert != self.regex.is_match(line)
    }
}

/// Everything that decides which records are shown and in what order
#[derive(Clone, Debug, Default)]
pub struct ViewSpec {
    pub filter: Option<Filter>,
    /// Number of records to keep; zero or negative keeps all
    pub window: i64,
    /// Process newest-first (applies before filtering and windowing)
    pub start_at_top: bool,
    /// Reverse the windowed result for display
    pub final_reverse: bool,
    pub render: RenderOptions,
    /// Records that survive filtering regardless of the pattern
    pub bypass: Vec<i64>,
}

impl ViewSpec {
    /// Copy of this spec that keeps the given records visible
    pub fn with_bypass(&self, positions: &[i64]) -> Self {
        Self {
            bypass: positions.to_vec(),
            ..self.clone()
        }
    }
}

/// Orient and filter the records (steps 1 and 2)
pub fn filtered<'a>(doses: &'a [Dose], spec: &ViewSpec) -> Vec<&'a Dose> {
    let mut oriented: Vec<&Dose> = doses.iter().collect();
    if spec.start_at_top {
        oriented.reverse();
    }

    let Some(filter) = &spec.filter else {
        return oriented;
    };

    oriented
        .into_iter()
        .filter(|dose| {
            spec.bypass.contains(&dose.position) || filter.accepts(&dose.render(&spec.render))
        })
        .collect()
}

/// Number of records a window keeps out of `len`
fn window_len(window: i64, len: usize) -> usize {
    match usize::try_from(window) {
        Ok(k) if k > 0 && k <= len => k,
        _ => len,
    }
}

/// Run the full pipeline and return the records to display, in display order
pub fn apply<'a>(doses: &'a [Dose], spec: &ViewSpec) -> Vec<&'a Dose> {
    let mut selected = filtered(doses, spec);

    let skip = selected.len() - window_len(spec.window, selected.len());
    selected.drain(..skip);

    if spec.start_at_top != spec.final_reverse {
        selected.reverse();
    }

    tracing::debug!(
        "View selected {} of {} doses (window {})",
        selected.len(),
        doses.len(),
        spec.window
    );

    selected
}

/// Run the pipeline and clone the result
pub fn apply_owned(doses: &[Dose], spec: &ViewSpec) -> Vec<Dose> {
    apply(doses, spec).into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};

    /// Doses one hour apart, oldest first, positions 0..n
    fn log(drugs: &[&str]) -> Vec<Dose> {
        let start = DateTime::parse_from_rfc3339("2024-01-01T08:00:00+00:00").unwrap();
        drugs
            .iter()
            .enumerate()
            .map(|(i, drug)| {
                let mut dose = Dose {
                    position: i as i64,
                    timestamp: start + Duration::hours(i as i64),
                    timezone: "UTC".into(),
                    date: String::new(),
                    time: String::new(),
                    dosage: "10mg".into(),
                    drug: (*drug).into(),
                    route: "Oral".into(),
                    note: String::new(),
                };
                dose.refresh_local_fields();
                dose
            })
            .collect()
    }

    fn positions(doses: &[&Dose]) -> Vec<i64> {
        doses.iter().map(|d| d.position).collect()
    }

    fn spec(window: i64, start_at_top: bool, final_reverse: bool) -> ViewSpec {
        ViewSpec {
            window,
            start_at_top,
            final_reverse,
            ..ViewSpec::default()
        }
    }

    #[test]
    fn test_default_is_oldest_first() {
        let doses = log(&["A", "B", "C", "D"]);
        assert_eq!(positions(&apply(&doses, &spec(0, false, false))), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_window_keeps_most_recent_suffix() {
        let doses = log(&["A", "B", "C", "D", "E"]);
        assert_eq!(positions(&apply(&doses, &spec(2, false, false))), vec![3, 4]);
        assert_eq!(positions(&apply(&doses, &spec(2, false, true))), vec![4, 3]);
    }

    #[test]
    fn test_window_out_of_range_means_all() {
        let doses = log(&["A", "B", "C"]);
        assert_eq!(apply(&doses, &spec(-1, false, false)).len(), 3);
        assert_eq!(apply(&doses, &spec(10, false, false)).len(), 3);
        assert_eq!(apply(&doses, &spec(3, false, false)).len(), 3);
    }

    #[test]
    fn test_start_at_top_windows_after_reversal() {
        let doses = log(&["A", "B", "C", "D", "E"]);
        // Oriented newest-first, the last two processed are the two oldest;
        // the final reversal restores chronological order
        assert_eq!(positions(&apply(&doses, &spec(2, true, false))), vec![0, 1]);
        // Both switches: no final reversal, so processing order is kept
        assert_eq!(positions(&apply(&doses, &spec(2, true, true))), vec![1, 0]);
        assert_eq!(
            positions(&apply(&doses, &spec(0, true, true))),
            vec![4, 3, 2, 1, 0]
        );
    }

    #[test]
    fn test_filter_is_case_insensitive_and_invertible() {
        let doses = log(&["Caffeine", "Nicotine", "Caffeine"]);
        let mut view = spec(0, false, false);

        view.filter = Some(Filter::new("CAFF", false).unwrap());
        assert_eq!(positions(&apply(&doses, &view)), vec![0, 2]);

        view.filter = Some(Filter::new("caff", true).unwrap());
        assert_eq!(positions(&apply(&doses, &view)), vec![1]);
    }

    #[test]
    fn test_filter_matches_rendered_text() {
        let mut doses = log(&["Caffeine", "Caffeine"]);
        doses[1].note = "with milk".into();
        let mut view = spec(0, false, false);
        view.filter = Some(Filter::new("milk", false).unwrap());
        assert_eq!(positions(&apply(&doses, &view)), vec![1]);

        // Notes are hidden before filtering
        view.render.ignore_notes = true;
        assert!(apply(&doses, &view).is_empty());
    }

    #[test]
    fn test_bypass_survives_filter() {
        let doses = log(&["Caffeine", "Nicotine", "Caffeine"]);
        let mut view = spec(0, false, false);
        view.filter = Some(Filter::new("caffeine", false).unwrap());
        view.bypass = vec![1];
        assert_eq!(positions(&apply(&doses, &view)), vec![0, 1, 2]);

        // Even when inverted
        view.filter = Some(Filter::new("nicotine", true).unwrap());
        assert_eq!(positions(&apply(&doses, &view)), vec![0, 1, 2]);
    }

    #[test]
    fn test_filter_before_window() {
        let doses = log(&["A", "Caffeine", "B", "Caffeine", "C"]);
        let mut view = spec(1, false, false);
        view.filter = Some(Filter::new("caffeine", false).unwrap());
        assert_eq!(positions(&apply(&doses, &view)), vec![3]);
    }

    #[test]
    fn test_invert_requires_pattern() {
        assert!(matches!(
            Filter::from_options(None, true),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Filter::from_options(Some(""), true),
            Err(Error::Config(_))
        ));
        assert!(Filter::from_options(None, false).unwrap().is_none());
    }

    #[test]
    fn test_bad_pattern_is_error() {
        assert!(matches!(
            Filter::from_options(Some("(unclosed"), false),
            Err(Error::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_empty_log() {
        let doses: Vec<Dose> = Vec::new();
        assert!(apply(&doses, &spec(5, true, false)).is_empty());
    }
}
