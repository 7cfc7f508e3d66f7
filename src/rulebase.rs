//! Rule base construction and validation
//!
//! Models are assembled in two phases. `RuleBaseBuilder` accepts variable,
//! term, and rule registrations and validates every reference immediately, so
//! a broken model fails at definition time with a precise error. `build`
//! freezes the result into an immutable `RuleBase` that any number of
//! simulation sessions can share behind an `Arc`.

use std::sync::Arc;

use fnv::FnvHashSet;
use indexmap::IndexMap;

use crate::error::{MamdaniError, MamdaniResult};
use crate::membership::Triangle;
use crate::rule::Rule;
use crate::variable::{LinguisticVariable, VariableRole};

// ============================================================================
// Builder
// ============================================================================

/// Mutable registration phase of a fuzzy model
#[derive(Debug, Default)]
pub struct RuleBaseBuilder {
    variables: IndexMap<String, LinguisticVariable>,
    rules: Vec<Rule>,
}

impl RuleBaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a linguistic variable over the universe [lo, hi]
    pub fn define_variable(
        &mut self,
        name: impl Into<String>,
        role: VariableRole,
        lo: f64,
        hi: f64,
    ) -> MamdaniResult<&mut Self> {
        let name = name.into();
        if self.variables.contains_key(&name) {
            return Err(MamdaniError::duplicate_variable(&name));
        }
        let var = LinguisticVariable::new(name.clone(), role, lo, hi)?;
        self.variables.insert(name, var);
        Ok(self)
    }

    /// Register a term with a triangular membership function
    pub fn add_term(
        &mut self,
        variable: &str,
        term: impl Into<String>,
        a: f64,
        b: f64,
        c: f64,
    ) -> MamdaniResult<&mut Self> {
        let var = self
            .variables
            .get_mut(variable)
            .ok_or_else(|| MamdaniError::unknown_variable(variable))?;
        var.add_term(term, Triangle::new(a, b, c)?)?;
        Ok(self)
    }

    /// Register a rule, validating every variable and term reference
    pub fn add_rule(&mut self, rule: Rule) -> MamdaniResult<&mut Self> {
        self.validate_rule(&rule)?;
        self.rules.push(rule);
        Ok(self)
    }

    /// Parse and register a rule given as text
    pub fn add_rule_text(&mut self, text: &str) -> MamdaniResult<&mut Self> {
        let rule = crate::parser::parse_rule(text)
            .map_err(|e| MamdaniError::rule_syntax(e.to_string()).with_context("rule", text))?;
        self.add_rule(rule)
    }

    fn validate_rule(&self, rule: &Rule) -> MamdaniResult<()> {
        rule.antecedent.check_structure()?;

        let mut leaf_error = None;
        rule.antecedent.visit_leaves(&mut |variable, term| {
            if leaf_error.is_some() {
                return;
            }
            leaf_error = self.check_reference(variable, term, VariableRole::Input).err();
        });
        if let Some(err) = leaf_error {
            return Err(err);
        }

        if rule.consequents.is_empty() {
            return Err(MamdaniError::invalid_rule("Rule has no consequents"));
        }
        for con in &rule.consequents {
            self.check_reference(&con.variable, &con.term, VariableRole::Output)?;
            if !con.weight.is_finite() || con.weight <= 0.0 || con.weight > 1.0 {
                return Err(MamdaniError::invalid_weight(con.weight));
            }
        }
        Ok(())
    }

    fn check_reference(
        &self,
        variable: &str,
        term: &str,
        expected_role: VariableRole,
    ) -> MamdaniResult<()> {
        let var = self
            .variables
            .get(variable)
            .ok_or_else(|| MamdaniError::unknown_variable(variable))?;
        if var.role() != expected_role {
            return Err(MamdaniError::role_mismatch(format!(
                "Variable '{}' is an {} and cannot be used as an {}",
                variable,
                var.role(),
                expected_role
            )));
        }
        if var.term(term).is_none() {
            return Err(MamdaniError::unknown_term(variable, term));
        }
        Ok(())
    }

    /// Freeze into an immutable rule base
    pub fn build(self) -> RuleBase {
        let mut referenced_inputs = FnvHashSet::default();
        for rule in &self.rules {
            rule.antecedent.visit_leaves(&mut |variable, _| {
                referenced_inputs.insert(variable.to_string());
            });
        }
        RuleBase {
            variables: self.variables,
            rules: self.rules,
            referenced_inputs,
        }
    }
}

// ============================================================================
// Frozen rule base
// ============================================================================

/// An immutable, validated fuzzy model shared by simulation sessions
#[derive(Debug)]
pub struct RuleBase {
    variables: IndexMap<String, LinguisticVariable>,
    rules: Vec<Rule>,
    referenced_inputs: FnvHashSet<String>,
}

impl RuleBase {
    /// Wrap in an `Arc` for sharing across sessions and threads
    pub fn into_shared(self) -> Arc<RuleBase> {
        Arc::new(self)
    }

    pub fn variable(&self, name: &str) -> Option<&LinguisticVariable> {
        self.variables.get(name)
    }

    /// All variables in definition order
    pub fn variables(&self) -> impl Iterator<Item = &LinguisticVariable> {
        self.variables.values()
    }

    /// Output variables in definition order
    pub fn output_variables(&self) -> impl Iterator<Item = &LinguisticVariable> {
        self.variables
            .values()
            .filter(|v| v.role() == VariableRole::Output)
    }

    /// Input variables actually referenced by rule antecedents, in
    /// definition order. These are the inputs compute requires.
    pub fn required_inputs(&self) -> impl Iterator<Item = &LinguisticVariable> {
        self.variables
            .values()
            .filter(|v| self.referenced_inputs.contains(v.name()))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::rule::Antecedent;

    fn cooker_builder() -> RuleBaseBuilder {
        let mut b = RuleBaseBuilder::new();
        b.define_variable("water_level", VariableRole::Input, 0.0, 10.0).unwrap();
        b.add_term("water_level", "low", 0.0, 0.0, 5.0).unwrap();
        b.add_term("water_level", "medium", 0.0, 5.0, 10.0).unwrap();
        b.add_term("water_level", "high", 5.0, 10.0, 10.0).unwrap();
        b.define_variable("rice_quantity", VariableRole::Input, 0.0, 10.0).unwrap();
        b.add_term("rice_quantity", "low", 0.0, 0.0, 5.0).unwrap();
        b.add_term("rice_quantity", "medium", 0.0, 5.0, 10.0).unwrap();
        b.add_term("rice_quantity", "high", 5.0, 10.0, 10.0).unwrap();
        b.define_variable("cooking_time", VariableRole::Output, 0.0, 60.0).unwrap();
        b.add_term("cooking_time", "short", 0.0, 0.0, 30.0).unwrap();
        b.add_term("cooking_time", "medium", 20.0, 30.0, 40.0).unwrap();
        b.add_term("cooking_time", "long", 30.0, 60.0, 60.0).unwrap();
        b
    }

    #[test]
    fn test_builds_valid_base() {
        let mut b = cooker_builder();
        for (water, rice, time) in [
            ("low", "low", "short"),
            ("medium", "medium", "medium"),
            ("high", "high", "long"),
        ] {
            b.add_rule(
                Rule::when(
                    Antecedent::is("water_level", water).and(Antecedent::is("rice_quantity", rice)),
                )
                .then("cooking_time", time),
            )
            .unwrap();
        }
        let base = b.build();

        assert_eq!(base.rule_count(), 3);
        assert_eq!(base.variable_count(), 3);
        assert_eq!(base.output_variables().count(), 1);
        let names: Vec<&str> = base.variables().map(|v| v.name()).collect();
        assert_eq!(names, vec!["water_level", "rice_quantity", "cooking_time"]);
    }

    #[test]
    fn test_duplicate_variable_rejected() {
        let mut b = cooker_builder();
        let err = b
            .define_variable("water_level", VariableRole::Input, 0.0, 1.0)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateVariable);
    }

    #[test]
    fn test_add_term_unknown_variable() {
        let mut b = RuleBaseBuilder::new();
        let err = b.add_term("pressure", "high", 0.0, 1.0, 2.0).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownVariable);
    }

    #[test]
    fn test_rule_unknown_variable() {
        let mut b = cooker_builder();
        let err = b
            .add_rule(Rule::when(Antecedent::is("steam", "high")).then("cooking_time", "short"))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownVariable);
    }

    #[test]
    fn test_rule_unknown_term() {
        let mut b = cooker_builder();
        let err = b
            .add_rule(
                Rule::when(Antecedent::is("water_level", "tepid")).then("cooking_time", "short"),
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownTerm);

        let err = b
            .add_rule(
                Rule::when(Antecedent::is("water_level", "low")).then("cooking_time", "forever"),
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownTerm);
    }

    #[test]
    fn test_rule_role_mismatch() {
        let mut b = cooker_builder();

        // Output variable in an antecedent
        let err = b
            .add_rule(
                Rule::when(Antecedent::is("cooking_time", "short")).then("cooking_time", "short"),
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleMismatch);

        // Input variable as a consequent
        let err = b
            .add_rule(Rule::when(Antecedent::is("water_level", "low")).then("water_level", "low"))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleMismatch);
    }

    #[test]
    fn test_rule_without_consequents_rejected() {
        let mut b = cooker_builder();
        let err = b
            .add_rule(Rule::when(Antecedent::is("water_level", "low")))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRule);
    }

    #[test]
    fn test_rule_invalid_weight_rejected() {
        let mut b = cooker_builder();
        for weight in [0.0, -0.5, 1.5, f64::NAN] {
            let err = b
                .add_rule(
                    Rule::when(Antecedent::is("water_level", "low")).then_weighted(
                        "cooking_time",
                        "short",
                        weight,
                    ),
                )
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidWeight);
        }
    }

    #[test]
    fn test_required_inputs_follow_references() {
        let mut b = cooker_builder();
        b.add_rule(Rule::when(Antecedent::is("water_level", "low")).then("cooking_time", "short"))
            .unwrap();
        let base = b.build();

        let required: Vec<&str> = base.required_inputs().map(|v| v.name()).collect();
        assert_eq!(required, vec!["water_level"]);
    }

    #[test]
    fn test_required_inputs_include_negated_leaves() {
        let mut b = cooker_builder();
        b.add_rule(
            Rule::when(
                Antecedent::is("water_level", "low")
                    .and(Antecedent::is("rice_quantity", "high").not()),
            )
            .then("cooking_time", "short"),
        )
        .unwrap();
        let base = b.build();

        let required: Vec<&str> = base.required_inputs().map(|v| v.name()).collect();
        assert_eq!(required, vec!["water_level", "rice_quantity"]);
    }
}
