//! Validation utilities for the Planting Recommendation Platform
//!
//! Invariant checks over generated recommendations. Used by the builder as
//! debug assertions and by tests as the single source of truth for the
//! output contract.

use crate::models::{Alternative, RecommendationWindow};

/// Validate the ordering invariant of a recommendation window:
/// `start <= optimal_date <= end` and confidence within [0, 1].
pub fn validate_window(window: &RecommendationWindow) -> Result<(), &'static str> {
    if window.start > window.optimal_date || window.optimal_date > window.end {
        return Err("window must satisfy start <= optimal_date <= end");
    }
    validate_confidence(window.confidence)
}

/// Validate a confidence value is a finite number in [0, 1]
pub fn validate_confidence(confidence: f64) -> Result<(), &'static str> {
    if !confidence.is_finite() {
        return Err("confidence must be a finite number");
    }
    if !(0.0..=1.0).contains(&confidence) {
        return Err("confidence must be within [0, 1]");
    }
    Ok(())
}

/// Validate an alternatives list against the principal window:
/// bounded length, strictly lower confidence than the principal, sorted by
/// descending confidence, and no alternative repeating the principal date.
pub fn validate_alternatives(
    principal: &RecommendationWindow,
    alternatives: &[Alternative],
    max_alternatives: usize,
) -> Result<(), &'static str> {
    if alternatives.len() > max_alternatives {
        return Err("too many alternatives");
    }
    let mut previous = f64::INFINITY;
    for alt in alternatives {
        validate_confidence(alt.confidence)?;
        if alt.start > alt.date || alt.date > alt.end {
            return Err("alternative window must satisfy start <= date <= end");
        }
        if alt.confidence >= principal.confidence && principal.confidence > 0.0 {
            return Err("alternative confidence must be below the principal's");
        }
        if alt.date == principal.optimal_date {
            return Err("alternative must not duplicate the principal date");
        }
        if alt.confidence > previous {
            return Err("alternatives must be sorted by descending confidence");
        }
        previous = alt.confidence;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window(start: NaiveDate, optimal: NaiveDate, end: NaiveDate) -> RecommendationWindow {
        RecommendationWindow {
            optimal_date: optimal,
            start,
            end,
            confidence: 0.8,
            justification: String::new(),
            risks: vec![],
            indicators: BTreeMap::new(),
        }
    }

    fn alternative(d: NaiveDate, confidence: f64) -> Alternative {
        Alternative {
            date: d,
            start: d,
            end: d,
            confidence,
            pros: vec![],
            contras: vec![],
            scenario: None,
        }
    }

    #[test]
    fn window_requires_ordered_dates() {
        let ok = window(date(2026, 10, 1), date(2026, 10, 5), date(2026, 10, 10));
        assert!(validate_window(&ok).is_ok());

        let bad = window(date(2026, 10, 6), date(2026, 10, 5), date(2026, 10, 10));
        assert!(validate_window(&bad).is_err());
    }

    #[test]
    fn confidence_bounds_are_enforced() {
        assert!(validate_confidence(0.0).is_ok());
        assert!(validate_confidence(1.0).is_ok());
        assert!(validate_confidence(-0.01).is_err());
        assert!(validate_confidence(1.01).is_err());
        assert!(validate_confidence(f64::NAN).is_err());
    }

    #[test]
    fn alternatives_must_rank_below_principal() {
        let principal = window(date(2026, 10, 1), date(2026, 10, 5), date(2026, 10, 10));
        let alts = vec![
            alternative(date(2026, 10, 12), 0.6),
            alternative(date(2026, 10, 15), 0.5),
        ];
        assert!(validate_alternatives(&principal, &alts, 3).is_ok());

        let too_confident = vec![alternative(date(2026, 10, 12), 0.9)];
        assert!(validate_alternatives(&principal, &too_confident, 3).is_err());

        let duplicate = vec![alternative(date(2026, 10, 5), 0.5)];
        assert!(validate_alternatives(&principal, &duplicate, 3).is_err());

        let unsorted = vec![
            alternative(date(2026, 10, 12), 0.4),
            alternative(date(2026, 10, 15), 0.6),
        ];
        assert!(validate_alternatives(&principal, &unsorted, 3).is_err());
    }
}
