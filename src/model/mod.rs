//! Model documents
//!
//! A [`ModelDoc`] is the serialized form of a rule base: variables with
//! their universes and triangular terms, plus rules written either as text
//! (`"if water_level is low then cooking_time is short"`) or as structured
//! antecedent trees. Documents load from TOML or JSON and compile into a
//! validated [`RuleBase`]; variable and term order survives round-trips.
//!
//! ```toml
//! name = "rice-cooker"
//! rules = [
//!     "if water_level is low and rice_quantity is low then cooking_time is short",
//! ]
//!
//! [[variables]]
//! name = "water_level"
//! role = "input"
//! range = [0.0, 10.0]
//!
//! [variables.terms]
//! low = [0.0, 0.0, 5.0]
//! medium = [0.0, 5.0, 10.0]
//! high = [5.0, 10.0, 10.0]
//! ```

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{MamdaniError, MamdaniResult};
use crate::rule::{Antecedent, Consequent, Rule};
use crate::rulebase::{RuleBase, RuleBaseBuilder};
use crate::variable::VariableRole;

// ============================================================================
// Document types
// ============================================================================

/// A serializable rule base description
///
/// `rules` precedes `variables` so the TOML form keeps its top-level value
/// array ahead of the `[[variables]]` sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDoc {
    /// Model name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Rules in definition order
    pub rules: Vec<RuleDoc>,
    /// Linguistic variables in definition order
    pub variables: Vec<VariableDoc>,
}

/// One linguistic variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDoc {
    pub name: String,
    pub role: VariableRole,
    /// Universe bounds as [lo, hi]
    pub range: [f64; 2],
    /// Term name to triangle vertices [a, b, c]
    pub terms: IndexMap<String, [f64; 3]>,
}

/// One rule, textual or structured
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleDoc {
    /// `"if <expr> then <var> is <term> [with W]"`
    Text(String),
    /// Explicit antecedent tree and consequent list
    Structured {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        when: Antecedent,
        then: Vec<Consequent>,
    },
}

// ============================================================================
// Loading and saving
// ============================================================================

impl ModelDoc {
    pub fn from_toml_str(content: &str) -> MamdaniResult<Self> {
        toml::from_str(content)
            .map_err(|e| MamdaniError::document(format!("Invalid TOML model: {}", e)))
    }

    pub fn from_json_str(content: &str) -> MamdaniResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| MamdaniError::document(format!("Invalid JSON model: {}", e)))
    }

    pub fn to_toml(&self) -> MamdaniResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| MamdaniError::document(format!("Cannot serialize model to TOML: {}", e)))
    }

    pub fn to_json(&self) -> MamdaniResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MamdaniError::document(format!("Cannot serialize model to JSON: {}", e)))
    }

    /// Load a model file, picking the format from the extension
    ///
    /// `.json` is parsed as JSON, anything else as TOML.
    pub fn load_path(path: &Path) -> MamdaniResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MamdaniError::document(format!("Cannot read model file: {}", e))
                .with_context("path", path.display().to_string())
        })?;
        let doc = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        };
        doc.map_err(|e| e.with_context("path", path.display().to_string()))
    }

    /// Write the model to a file, picking the format from the extension
    pub fn save_path(&self, path: &Path) -> MamdaniResult<()> {
        let content = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => self.to_json()?,
            _ => self.to_toml()?,
        };
        fs::write(path, content).map_err(|e| {
            MamdaniError::document(format!("Cannot write model file: {}", e))
                .with_context("path", path.display().to_string())
        })
    }

    // ========================================================================
    // Compilation
    // ========================================================================

    /// Validate the document and build a rule base from it
    pub fn compile(&self) -> MamdaniResult<RuleBase> {
        let mut builder = RuleBaseBuilder::new();
        for var in &self.variables {
            builder.define_variable(&var.name, var.role, var.range[0], var.range[1])?;
            for (term, points) in &var.terms {
                builder.add_term(&var.name, term, points[0], points[1], points[2])?;
            }
        }
        for rule in &self.rules {
            match rule {
                RuleDoc::Text(text) => {
                    builder.add_rule_text(text)?;
                }
                RuleDoc::Structured { label, when, then } => {
                    builder.add_rule(Rule {
                        label: label.clone(),
                        antecedent: when.clone(),
                        consequents: then.clone(),
                    })?;
                }
            }
        }
        Ok(builder.build())
    }
}

// ============================================================================
// Tests
// ============================================================================
