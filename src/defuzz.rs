//! Defuzzification methods
//!
//! All methods operate on the aggregate sampled over the output variable's
//! universe. A zero-mass aggregate (no rule fired) yields `None`; the engine
//! turns that into a `NoRuleFired` error instead of dividing by zero.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::membership::Degree;

/// How to reduce an aggregated fuzzy set to one crisp value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefuzzMethod {
    /// Center of gravity of the sampled aggregate
    #[default]
    Centroid,
    /// Point that splits the aggregate area in half
    Bisector,
    /// Mean of the points at maximum membership
    MeanOfMaximum,
    /// Smallest point at maximum membership
    SmallestOfMaximum,
    /// Largest point at maximum membership
    LargestOfMaximum,
}

impl DefuzzMethod {
    /// Defuzzify a sampled aggregate; `None` when the aggregate has no mass
    pub fn apply(&self, samples: &[(f64, Degree)]) -> Option<f64> {
        let total: f64 = samples.iter().map(|(_, m)| m.value()).sum();
        if total <= 0.0 {
            return None;
        }

        match self {
            DefuzzMethod::Centroid => {
                let weighted: f64 = samples.iter().map(|(x, m)| x * m.value()).sum();
                Some(weighted / total)
            }
            DefuzzMethod::Bisector => {
                let half = total / 2.0;
                let mut cumulative = 0.0;
                for (x, m) in samples {
                    cumulative += m.value();
                    if cumulative >= half {
                        return Some(*x);
                    }
                }
                samples.last().map(|p| p.0)
            }
            DefuzzMethod::MeanOfMaximum => {
                let max_value = samples.iter().map(|(_, m)| m.value()).fold(0.0, f64::max);
                let maxima: Vec<f64> = samples
                    .iter()
                    .filter(|(_, m)| (m.value() - max_value).abs() < f64::EPSILON)
                    .map(|(x, _)| *x)
                    .collect();
                Some(maxima.iter().sum::<f64>() / maxima.len() as f64)
            }
            DefuzzMethod::SmallestOfMaximum => {
                let max_value = samples.iter().map(|(_, m)| m.value()).fold(0.0, f64::max);
                samples
                    .iter()
                    .find(|(_, m)| (m.value() - max_value).abs() < f64::EPSILON)
                    .map(|(x, _)| *x)
            }
            DefuzzMethod::LargestOfMaximum => {
                let max_value = samples.iter().map(|(_, m)| m.value()).fold(0.0, f64::max);
                samples
                    .iter()
                    .rev()
                    .find(|(_, m)| (m.value() - max_value).abs() < f64::EPSILON)
                    .map(|(x, _)| *x)
            }
        }
    }
}

impl fmt::Display for DefuzzMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DefuzzMethod::Centroid => "centroid",
            DefuzzMethod::Bisector => "bisector",
            DefuzzMethod::MeanOfMaximum => "mean_of_maximum",
            DefuzzMethod::SmallestOfMaximum => "smallest_of_maximum",
            DefuzzMethod::LargestOfMaximum => "largest_of_maximum",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for DefuzzMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "centroid" => Ok(DefuzzMethod::Centroid),
            "bisector" => Ok(DefuzzMethod::Bisector),
            "mean_of_maximum" | "mom" => Ok(DefuzzMethod::MeanOfMaximum),
            "smallest_of_maximum" | "som" => Ok(DefuzzMethod::SmallestOfMaximum),
            "largest_of_maximum" | "lom" => Ok(DefuzzMethod::LargestOfMaximum),
            other => Err(format!(
                "Unknown defuzzification method '{}' (expected centroid, bisector, \
                 mean_of_maximum, smallest_of_maximum, or largest_of_maximum)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::Triangle;

    fn sampled(tri: &Triangle, cap: f64, lo: f64, hi: f64) -> Vec<(f64, Degree)> {
        let mut samples = Vec::new();
        let mut x = lo;
        while x <= hi {
            let m = tri.evaluate(x).value().min(cap);
            samples.push((x, Degree::new(m)));
            x += 1.0;
        }
        samples
    }

    #[test]
    fn test_centroid_of_symmetric_triangle() {
        let tri = Triangle::new(20.0, 30.0, 40.0).unwrap();
        let samples = sampled(&tri, 1.0, 0.0, 60.0);
        let crisp = DefuzzMethod::Centroid.apply(&samples).unwrap();
        assert!((crisp - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_centroid_matches_analytic_mean() {
        // Centroid of an unclipped triangle approximates (a + b + c) / 3
        let tri = Triangle::new(0.0, 10.0, 50.0).unwrap();
        let samples = sampled(&tri, 1.0, 0.0, 60.0);
        let crisp = DefuzzMethod::Centroid.apply(&samples).unwrap();
        assert!((crisp - 20.0).abs() < 0.5);
    }

    #[test]
    fn test_zero_mass_yields_none() {
        let tri = Triangle::new(20.0, 30.0, 40.0).unwrap();
        let samples = sampled(&tri, 0.0, 0.0, 60.0);
        for method in [
            DefuzzMethod::Centroid,
            DefuzzMethod::Bisector,
            DefuzzMethod::MeanOfMaximum,
            DefuzzMethod::SmallestOfMaximum,
            DefuzzMethod::LargestOfMaximum,
        ] {
            assert_eq!(method.apply(&samples), None);
        }
    }

    #[test]
    fn test_bisector_of_symmetric_triangle() {
        let tri = Triangle::new(20.0, 30.0, 40.0).unwrap();
        let samples = sampled(&tri, 1.0, 0.0, 60.0);
        let crisp = DefuzzMethod::Bisector.apply(&samples).unwrap();
        assert!((crisp - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_maximum_methods_on_clipped_plateau() {
        let tri = Triangle::new(20.0, 30.0, 40.0).unwrap();
        let samples = sampled(&tri, 0.5, 0.0, 60.0);

        let mom = DefuzzMethod::MeanOfMaximum.apply(&samples).unwrap();
        let som = DefuzzMethod::SmallestOfMaximum.apply(&samples).unwrap();
        let lom = DefuzzMethod::LargestOfMaximum.apply(&samples).unwrap();

        assert!((som - 25.0).abs() < 1e-9);
        assert!((lom - 35.0).abs() < 1e-9);
        assert!((mom - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("centroid".parse::<DefuzzMethod>().unwrap(), DefuzzMethod::Centroid);
        assert_eq!("mom".parse::<DefuzzMethod>().unwrap(), DefuzzMethod::MeanOfMaximum);
        assert!("median".parse::<DefuzzMethod>().is_err());
        assert_eq!(DefuzzMethod::Bisector.to_string(), "bisector");
    }
}
