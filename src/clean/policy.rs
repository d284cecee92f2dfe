// src/clean/policy.rs

use serde::{Deserialize, Serialize};

use crate::stats;

/// What to do with a numeric cell that is missing or does not parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// Exclude the row.
    #[default]
    Drop,
    /// Fill with the mean of the parseable values in the same table.
    Mean,
    /// Fill with the median of the parseable values in the same table.
    Median,
}

impl MissingPolicy {
    /// Fill value for this table, `None` under `Drop` or when nothing parsed.
    pub fn fill_value(self, present: &[f64]) -> Option<f64> {
        match self {
            MissingPolicy::Drop => None,
            MissingPolicy::Mean => stats::mean(present),
            MissingPolicy::Median => stats::median(present),
        }
    }
}

/// Parse a numeric cell. Non-finite results count as unparsable.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_values() {
        let v = [1.0, 2.0, 9.0];
        assert_eq!(MissingPolicy::Drop.fill_value(&v), None);
        assert_eq!(MissingPolicy::Mean.fill_value(&v), Some(4.0));
        assert_eq!(MissingPolicy::Median.fill_value(&v), Some(2.0));
        assert_eq!(MissingPolicy::Mean.fill_value(&[]), None);
    }

    #[test]
    fn parse_number_rejects_junk() {
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
    }
}
