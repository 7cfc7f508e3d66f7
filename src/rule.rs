//! Fuzzy rules and antecedent expressions
//!
//! An antecedent is a tree of `is` leaves combined with n-ary AND/OR and
//! unary NOT, evaluated against fuzzified inputs with the Zadeh operators
//! (AND as minimum, OR as maximum, NOT as complement). Consequents name an
//! output term and carry an optional weight in (0, 1] that scales the
//! implication cap.

use fnv::FnvHashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MamdaniError, MamdaniResult};
use crate::membership::Degree;

/// Fuzzified inputs: variable name to (term name to membership degree)
pub type FuzzifiedInputs = FnvHashMap<String, IndexMap<String, Degree>>;

// ============================================================================
// Antecedent expressions
// ============================================================================

/// A condition tree over fuzzified input variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Antecedent {
    /// Leaf: membership of one input variable in one term
    Is { variable: String, term: String },
    /// Minimum over two or more operands
    And { operands: Vec<Antecedent> },
    /// Maximum over two or more operands
    Or { operands: Vec<Antecedent> },
    /// Complement of the operand
    Not { operand: Box<Antecedent> },
}

impl Antecedent {
    /// Leaf condition: `variable is term`
    pub fn is(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Antecedent::Is {
            variable: variable.into(),
            term: term.into(),
        }
    }

    /// Conjoin with another condition; chained calls flatten into one AND
    pub fn and(self, other: Antecedent) -> Self {
        match self {
            Antecedent::And { mut operands } => {
                operands.push(other);
                Antecedent::And { operands }
            }
            first => Antecedent::And {
                operands: vec![first, other],
            },
        }
    }

    /// Disjoin with another condition; chained calls flatten into one OR
    pub fn or(self, other: Antecedent) -> Self {
        match self {
            Antecedent::Or { mut operands } => {
                operands.push(other);
                Antecedent::Or { operands }
            }
            first => Antecedent::Or {
                operands: vec![first, other],
            },
        }
    }

    /// Complement this condition
    pub fn not(self) -> Self {
        Antecedent::Not {
            operand: Box::new(self),
        }
    }

    /// N-ary conjunction
    pub fn all(operands: Vec<Antecedent>) -> Self {
        Antecedent::And { operands }
    }

    /// N-ary disjunction
    pub fn any(operands: Vec<Antecedent>) -> Self {
        Antecedent::Or { operands }
    }

    /// Evaluate to a firing degree against fuzzified inputs
    ///
    /// Name resolution is guaranteed by rule base validation; an absent
    /// entry evaluates to degree zero.
    pub fn evaluate(&self, inputs: &FuzzifiedInputs) -> Degree {
        match self {
            Antecedent::Is { variable, term } => inputs
                .get(variable)
                .and_then(|terms| terms.get(term))
                .copied()
                .unwrap_or_default(),
            Antecedent::And { operands } => operands
                .iter()
                .fold(Degree::new(1.0), |acc, a| acc.and(&a.evaluate(inputs))),
            Antecedent::Or { operands } => operands
                .iter()
                .fold(Degree::new(0.0), |acc, a| acc.or(&a.evaluate(inputs))),
            Antecedent::Not { operand } => operand.evaluate(inputs).not(),
        }
    }

    /// Visit every `is` leaf as (variable, term)
    pub fn visit_leaves<'a>(&'a self, f: &mut dyn FnMut(&'a str, &'a str)) {
        match self {
            Antecedent::Is { variable, term } => f(variable, term),
            Antecedent::And { operands } | Antecedent::Or { operands } => {
                for operand in operands {
                    operand.visit_leaves(f);
                }
            }
            Antecedent::Not { operand } => operand.visit_leaves(f),
        }
    }

    /// Reject empty AND/OR branches anywhere in the tree
    pub fn check_structure(&self) -> MamdaniResult<()> {
        match self {
            Antecedent::Is { .. } => Ok(()),
            Antecedent::And { operands } | Antecedent::Or { operands } => {
                if operands.is_empty() {
                    return Err(MamdaniError::invalid_rule(
                        "Antecedent has an AND/OR branch with no operands",
                    ));
                }
                for operand in operands {
                    operand.check_structure()?;
                }
                Ok(())
            }
            Antecedent::Not { operand } => operand.check_structure(),
        }
    }
}

impl fmt::Display for Antecedent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Antecedent::Is { variable, term } => write!(f, "{} is {}", variable, term),
            Antecedent::And { operands } => {
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, " and ")?;
                    }
                    if matches!(operand, Antecedent::Or { .. }) {
                        write!(f, "({})", operand)?;
                    } else {
                        write!(f, "{}", operand)?;
                    }
                }
                Ok(())
            }
            Antecedent::Or { operands } => {
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, " or ")?;
                    }
                    write!(f, "{}", operand)?;
                }
                Ok(())
            }
            Antecedent::Not { operand } => {
                if matches!(**operand, Antecedent::Is { .. }) {
                    write!(f, "not {}", operand)
                } else {
                    write!(f, "not ({})", operand)
                }
            }
        }
    }
}

// ============================================================================
// Consequents and rules
// ============================================================================

fn default_weight() -> f64 {
    1.0
}

/// One output assignment of a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consequent {
    pub variable: String,
    pub term: String,
    /// Scales the implication cap; must lie in (0, 1]
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl Consequent {
    pub fn new(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            term: term.into(),
            weight: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// A fuzzy rule: antecedent expression plus one or more consequents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Optional label for diagnostics and listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub antecedent: Antecedent,
    pub consequents: Vec<Consequent>,
}

impl Rule {
    /// Start a rule from its antecedent
    pub fn when(antecedent: Antecedent) -> Self {
        Self {
            label: None,
            antecedent,
            consequents: Vec::new(),
        }
    }

    /// Start a labeled rule
    pub fn named(label: impl Into<String>, antecedent: Antecedent) -> Self {
        Self {
            label: Some(label.into()),
            antecedent,
            consequents: Vec::new(),
        }
    }

    /// Add a consequent with the default weight
    pub fn then(mut self, variable: impl Into<String>, term: impl Into<String>) -> Self {
        self.consequents.push(Consequent::new(variable, term));
        self
    }

    /// Add a consequent with an explicit weight
    pub fn then_weighted(
        mut self,
        variable: impl Into<String>,
        term: impl Into<String>,
        weight: f64,
    ) -> Self {
        self.consequents
            .push(Consequent::new(variable, term).with_weight(weight));
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Firing strength of this rule's antecedent
    pub fn firing_strength(&self, inputs: &FuzzifiedInputs) -> Degree {
        self.antecedent.evaluate(inputs)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "if {} then ", self.antecedent)?;
        for (i, con) in self.consequents.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} is {}", con.variable, con.term)?;
            if con.weight != 1.0 {
                write!(f, " with {}", con.weight)?;
            }
        }
        Ok(())
    }
}
