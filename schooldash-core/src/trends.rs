//! Trend semantics - year-over-year change rates
//!
//! Derives percentage change between numerically adjacent years of a year
//! series:
//!
//! `rate = (curr - prev) / prev * 100`
//!
//! Global invariants enforced:
//! - N years yield exactly N-1 points, paired (year[i-1], year[i])
//! - A zero previous value yields `ChangeRate::Undefined`, never NaN or Infinity
//! - Trends are derived, not stored

use crate::aggregates::YearTotals;
use serde::{Deserialize, Serialize};

/// Percentage change between two values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChangeRate {
    /// Finite percentage
    Value(f64),
    /// The previous value was zero; serialized as `null`
    Undefined,
}

impl ChangeRate {
    /// Rate from `prev` to `curr`
    pub fn between(prev: f64, curr: f64) -> Self {
        if prev == 0.0 {
            return ChangeRate::Undefined;
        }
        let rate = (curr - prev) / prev * 100.0;
        if rate.is_finite() {
            ChangeRate::Value(rate)
        } else {
            ChangeRate::Undefined
        }
    }

    /// The percentage, if defined
    pub fn value(self) -> Option<f64> {
        match self {
            ChangeRate::Value(v) => Some(v),
            ChangeRate::Undefined => None,
        }
    }

    /// One-decimal display form (`"50.0%"`), or `"-"` when undefined
    pub fn display(self) -> String {
        match self {
            ChangeRate::Value(v) => format!("{:.1}%", v),
            ChangeRate::Undefined => "-".to_string(),
        }
    }
}

/// Change rates between one pair of adjacent years
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeRatePoint {
    /// `"<prev>→<curr>"`
    pub label: String,
    pub prev_year: i64,
    pub curr_year: i64,
    pub male: ChangeRate,
    pub female: ChangeRate,
    pub total: ChangeRate,
}

/// Compute change rates over a year series sorted ascending by year
pub fn compute_change_rates(series: &[YearTotals]) -> Vec<ChangeRatePoint> {
    series
        .windows(2)
        .map(|pair| {
            let (prev, curr) = (&pair[0], &pair[1]);
            ChangeRatePoint {
                label: format!("{}→{}", prev.year, curr.year),
                prev_year: prev.year,
                curr_year: curr.year,
                male: ChangeRate::between(prev.male, curr.male),
                female: ChangeRate::between(prev.female, curr.female),
                total: ChangeRate::between(prev.total, curr.total),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year(year: i64, male: f64, female: f64) -> YearTotals {
        YearTotals {
            year,
            male,
            female,
            total: male + female,
        }
    }

    #[test]
    fn test_fifty_percent_increase() {
        let series = vec![year(1, 60.0, 40.0), year(2, 90.0, 60.0)];
        let rates = compute_change_rates(&series);
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].label, "1→2");
        assert_eq!(rates[0].total, ChangeRate::Value(50.0));
        assert_eq!(rates[0].male, ChangeRate::Value(50.0));
        assert_eq!(rates[0].female, ChangeRate::Value(50.0));
    }

    #[test]
    fn test_points_are_adjacent_pairs() {
        let series = vec![
            year(2018, 10.0, 10.0),
            year(2019, 20.0, 10.0),
            year(2021, 10.0, 10.0),
        ];
        let rates = compute_change_rates(&series);
        assert_eq!(rates.len(), 2);
        assert_eq!((rates[0].prev_year, rates[0].curr_year), (2018, 2019));
        assert_eq!((rates[1].prev_year, rates[1].curr_year), (2019, 2021));
        assert_eq!(rates[0].male, ChangeRate::Value(100.0));
        assert_eq!(rates[1].male, ChangeRate::Value(-50.0));
        assert_eq!(rates[0].female, ChangeRate::Value(0.0));
    }

    #[test]
    fn test_zero_previous_is_undefined() {
        let series = vec![year(2020, 0.0, 10.0), year(2021, 5.0, 10.0)];
        let rates = compute_change_rates(&series);
        assert_eq!(rates[0].male, ChangeRate::Undefined);
        assert_eq!(rates[0].female, ChangeRate::Value(0.0));
        assert_eq!(ChangeRate::between(0.0, 0.0), ChangeRate::Undefined);
    }

    #[test]
    fn test_fewer_than_two_years() {
        assert!(compute_change_rates(&[]).is_empty());
        assert!(compute_change_rates(&[year(2020, 1.0, 1.0)]).is_empty());
    }

    #[test]
    fn test_undefined_serializes_as_null() {
        let json = serde_json::to_string(&vec![ChangeRate::Value(12.5), ChangeRate::Undefined])
            .unwrap();
        assert_eq!(json, "[12.5,null]");
    }

    #[test]
    fn test_display() {
        assert_eq!(ChangeRate::Value(50.0).display(), "50.0%");
        assert_eq!(ChangeRate::Value(-3.333).display(), "-3.3%");
        assert_eq!(ChangeRate::Undefined.display(), "-");
        assert_eq!(ChangeRate::Undefined.value(), None);
    }
}
