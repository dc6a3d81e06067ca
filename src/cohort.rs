/*!
 * Cohort classification for tenure and age
 *
 * Both classifiers are step functions over the real line. Steps are half-open
 * with an inclusive lower bound, so a value sitting exactly on a threshold
 * lands in the upper bucket. Undefined input maps to an explicit `Undefined`
 * bucket instead of failing.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::DAYS_PER_YEAR;

/// Tenure cohort, declared in severity order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TenureBucket {
    UnderOneYear,
    OneToTwoYears,
    TwoToFiveYears,
    FiveToTenYears,
    OverTenYears,
    Undefined,
}

impl TenureBucket {
    /// The five defined buckets in canonical order
    pub const DEFINED: [TenureBucket; 5] = [
        TenureBucket::UnderOneYear,
        TenureBucket::OneToTwoYears,
        TenureBucket::TwoToFiveYears,
        TenureBucket::FiveToTenYears,
        TenureBucket::OverTenYears,
    ];

    /// Classify a tenure expressed in years
    pub fn from_years(years: Option<f64>) -> Self {
        match years {
            Some(y) if !y.is_nan() => {
                if y < 1.0 {
                    TenureBucket::UnderOneYear
                } else if y < 2.0 {
                    TenureBucket::OneToTwoYears
                } else if y < 5.0 {
                    TenureBucket::TwoToFiveYears
                } else if y < 10.0 {
                    TenureBucket::FiveToTenYears
                } else {
                    TenureBucket::OverTenYears
                }
            }
            _ => TenureBucket::Undefined,
        }
    }

    /// Classify a tenure expressed in whole days
    pub fn from_days(days: Option<i64>) -> Self {
        Self::from_years(days.map(|d| d as f64 / DAYS_PER_YEAR))
    }

    pub fn label(&self) -> &'static str {
        match self {
            TenureBucket::UnderOneYear => "<1y",
            TenureBucket::OneToTwoYears => "1-2y",
            TenureBucket::TwoToFiveYears => "2-5y",
            TenureBucket::FiveToTenYears => "5-10y",
            TenureBucket::OverTenYears => ">10y",
            TenureBucket::Undefined => "undefined",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::DEFINED
            .iter()
            .chain(std::iter::once(&TenureBucket::Undefined))
            .copied()
            .find(|b| b.label() == label)
    }

    pub fn is_defined(&self) -> bool {
        *self != TenureBucket::Undefined
    }
}

impl fmt::Display for TenureBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Age cohort, declared in ascending age order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeBucket {
    Under25,
    From25To34,
    From35To44,
    From45To54,
    From55,
    Undefined,
}

impl AgeBucket {
    /// The five defined buckets in canonical order
    pub const DEFINED: [AgeBucket; 5] = [
        AgeBucket::Under25,
        AgeBucket::From25To34,
        AgeBucket::From35To44,
        AgeBucket::From45To54,
        AgeBucket::From55,
    ];

    /// Classify an age expressed in years
    pub fn from_years(age: Option<f64>) -> Self {
        match age {
            Some(a) if !a.is_nan() => {
                if a < 25.0 {
                    AgeBucket::Under25
                } else if a < 35.0 {
                    AgeBucket::From25To34
                } else if a < 45.0 {
                    AgeBucket::From35To44
                } else if a < 55.0 {
                    AgeBucket::From45To54
                } else {
                    AgeBucket::From55
                }
            }
            _ => AgeBucket::Undefined,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeBucket::Under25 => "0-25",
            AgeBucket::From25To34 => "25-34",
            AgeBucket::From35To44 => "35-44",
            AgeBucket::From45To54 => "45-54",
            AgeBucket::From55 => "≥55",
            AgeBucket::Undefined => "undefined",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::DEFINED
            .iter()
            .chain(std::iter::once(&AgeBucket::Undefined))
            .copied()
            .find(|b| b.label() == label)
    }

    pub fn is_defined(&self) -> bool {
        *self != AgeBucket::Undefined
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenure_boundaries_go_up() {
        assert_eq!(TenureBucket::from_years(Some(0.0)), TenureBucket::UnderOneYear);
        assert_eq!(TenureBucket::from_years(Some(0.999)), TenureBucket::UnderOneYear);
        assert_eq!(TenureBucket::from_years(Some(1.0)), TenureBucket::OneToTwoYears);
        assert_eq!(TenureBucket::from_years(Some(2.0)), TenureBucket::TwoToFiveYears);
        assert_eq!(TenureBucket::from_years(Some(5.0)), TenureBucket::FiveToTenYears);
        assert_eq!(TenureBucket::from_years(Some(10.0)), TenureBucket::OverTenYears);
        assert_eq!(TenureBucket::from_years(Some(42.0)), TenureBucket::OverTenYears);
    }

    #[test]
    fn test_age_boundaries_go_up() {
        assert_eq!(AgeBucket::from_years(Some(24.0)), AgeBucket::Under25);
        assert_eq!(AgeBucket::from_years(Some(25.0)), AgeBucket::From25To34);
        assert_eq!(AgeBucket::from_years(Some(35.0)), AgeBucket::From35To44);
        assert_eq!(AgeBucket::from_years(Some(45.0)), AgeBucket::From45To54);
        assert_eq!(AgeBucket::from_years(Some(55.0)), AgeBucket::From55);
        assert_eq!(AgeBucket::from_years(Some(90.0)), AgeBucket::From55);
    }

    #[test]
    fn test_undefined_inputs() {
        assert_eq!(TenureBucket::from_years(None), TenureBucket::Undefined);
        assert_eq!(TenureBucket::from_years(Some(f64::NAN)), TenureBucket::Undefined);
        assert_eq!(TenureBucket::from_days(None), TenureBucket::Undefined);
        assert_eq!(AgeBucket::from_years(None), AgeBucket::Undefined);
        assert_eq!(AgeBucket::from_years(Some(f64::NAN)), AgeBucket::Undefined);
    }

    #[test]
    fn test_negative_values_take_lowest_step() {
        assert_eq!(TenureBucket::from_years(Some(-3.0)), TenureBucket::UnderOneYear);
        assert_eq!(AgeBucket::from_years(Some(-1.0)), AgeBucket::Under25);
    }

    #[test]
    fn test_one_year_of_days() {
        // 366 days clears 365.25, 365 does not
        assert_eq!(TenureBucket::from_days(Some(365)), TenureBucket::UnderOneYear);
        assert_eq!(TenureBucket::from_days(Some(366)), TenureBucket::OneToTwoYears);
    }

    #[test]
    fn test_canonical_order_and_labels() {
        let mut shuffled = vec![
            TenureBucket::OverTenYears,
            TenureBucket::Undefined,
            TenureBucket::UnderOneYear,
            TenureBucket::TwoToFiveYears,
        ];
        shuffled.sort();
        let labels: Vec<_> = shuffled.iter().map(|b| b.label()).collect();
        assert_eq!(labels, vec!["<1y", "2-5y", ">10y", "undefined"]);
        assert_eq!(AgeBucket::from_label("≥55"), Some(AgeBucket::From55));
        assert_eq!(TenureBucket::from_label("5-10y"), Some(TenureBucket::FiveToTenYears));
        assert_eq!(TenureBucket::from_label("nope"), None);
    }
}
