//! Linguistic variables
//!
//! A linguistic variable couples a named universe of discourse with a set of
//! named terms, each backed by a triangular membership function. Variables are
//! tagged as inputs (fuzzified from crisp values) or outputs (aggregated and
//! defuzzified). Term order is definition order and is preserved through
//! fuzzification.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{MamdaniError, MamdaniResult};
use crate::membership::{Degree, Triangle};

/// Whether a variable is fuzzified from inputs or defuzzified to outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableRole {
    Input,
    Output,
}

impl std::fmt::Display for VariableRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableRole::Input => write!(f, "input"),
            VariableRole::Output => write!(f, "output"),
        }
    }
}

/// A linguistic variable with its universe and named terms
#[derive(Debug, Clone)]
pub struct LinguisticVariable {
    name: String,
    lo: f64,
    hi: f64,
    role: VariableRole,
    terms: IndexMap<String, Triangle>,
}

impl LinguisticVariable {
    /// Create a variable over the closed universe [lo, hi]
    pub fn new(
        name: impl Into<String>,
        role: VariableRole,
        lo: f64,
        hi: f64,
    ) -> MamdaniResult<Self> {
        let name = name.into();
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(MamdaniError::universe(&name, lo, hi));
        }
        Ok(Self {
            name,
            lo,
            hi,
            role,
            terms: IndexMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> VariableRole {
        self.role
    }

    /// Universe bounds as (lo, hi)
    pub fn universe(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    /// Register a term; its triangle must lie inside the universe
    pub fn add_term(&mut self, term: impl Into<String>, tri: Triangle) -> MamdaniResult<()> {
        let term = term.into();
        if self.terms.contains_key(&term) {
            return Err(MamdaniError::duplicate_term(&self.name, &term));
        }
        if tri.a() < self.lo || tri.c() > self.hi {
            return Err(MamdaniError::membership(format!(
                "Term '{}' spans [{}, {}] which leaves the universe [{}, {}] of variable '{}'",
                term,
                tri.a(),
                tri.c(),
                self.lo,
                self.hi,
                self.name
            )));
        }
        self.terms.insert(term, tri);
        Ok(())
    }

    /// Look up a term's membership function
    pub fn term(&self, name: &str) -> Option<&Triangle> {
        self.terms.get(name)
    }

    /// Terms in definition order
    pub fn terms(&self) -> impl Iterator<Item = (&str, &Triangle)> {
        self.terms.iter().map(|(name, tri)| (name.as_str(), tri))
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Reject values outside the universe; no silent clamping
    pub fn check_value(&self, x: f64) -> MamdaniResult<()> {
        if !x.is_finite() || x < self.lo || x > self.hi {
            return Err(MamdaniError::out_of_range(&self.name, x, self.lo, self.hi));
        }
        Ok(())
    }

    /// Fuzzify a crisp value: membership degree for every term, zeros included
    pub fn fuzzify(&self, x: f64) -> MamdaniResult<IndexMap<String, Degree>> {
        self.check_value(x)?;
        Ok(self
            .terms
            .iter()
            .map(|(name, tri)| (name.clone(), tri.evaluate(x)))
            .collect())
    }

    /// The term with highest membership for a value
    pub fn dominant_term(&self, x: f64) -> Option<(&str, Degree)> {
        self.terms
            .iter()
            .map(|(name, tri)| (name.as_str(), tri.evaluate(x)))
            .max_by(|a, b| a.1.value().total_cmp(&b.1.value()))
    }

    /// Sample points across the universe at a fixed step, endpoint included
    pub fn grid(&self, step: f64) -> Vec<f64> {
        let count = (((self.hi - self.lo) / step) + 1e-9).floor() as usize + 1;
        let mut points = Vec::with_capacity(count + 1);
        for i in 0..count {
            points.push(self.lo + i as f64 * step);
        }
        if let Some(&last) = points.last() {
            if self.hi - last > step * 1e-6 {
                points.push(self.hi);
            }
        }
        points
    }
}
