//! Single-use inference sessions
//!
//! A `Simulation` wraps a shared rule base with the mutable state of one
//! inference run: crisp inputs, the computed outcome, and a position in the
//! session lifecycle:
//!
//! ```text
//!   Created --set_input--> InputsSet --compute--> Computed
//!      ^                        |                     |
//!      |                        +--(compute error)----+ stays InputsSet
//!      +-------------------- reset -------------------+
//! ```
//!
//! Sessions are single-use: once computed, inputs are frozen and further
//! `set_input` / `compute` calls fail with `AlreadyComputed`. `reset` returns
//! the session to `Created` for reuse against the same rule base.

use std::sync::Arc;

use fnv::FnvHashMap;
use serde::Serialize;

use crate::engine::{run_inference, EngineConfig, InferenceOutcome, InferenceStats};
use crate::error::{MamdaniError, MamdaniResult};
use crate::rulebase::RuleBase;
use crate::variable::VariableRole;

// ============================================================================
// Session state
// ============================================================================

/// Lifecycle position of a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationState {
    /// No inputs set yet
    Created,
    /// At least one input set, not yet computed
    InputsSet,
    /// Inference ran successfully; inputs are frozen
    Computed,
}

impl std::fmt::Display for SimulationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationState::Created => write!(f, "created"),
            SimulationState::InputsSet => write!(f, "inputs_set"),
            SimulationState::Computed => write!(f, "computed"),
        }
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// One inference session over a shared rule base
#[derive(Debug, Clone)]
pub struct Simulation {
    base: Arc<RuleBase>,
    config: EngineConfig,
    inputs: FnvHashMap<String, f64>,
    state: SimulationState,
    outcome: Option<InferenceOutcome>,
}

impl Simulation {
    /// Create a fresh session with default engine settings
    pub fn new(base: Arc<RuleBase>) -> Self {
        Self::with_config(base, EngineConfig::default())
    }

    pub fn with_config(base: Arc<RuleBase>, config: EngineConfig) -> Self {
        Self {
            base,
            config,
            inputs: FnvHashMap::default(),
            state: SimulationState::Created,
            outcome: None,
        }
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn base(&self) -> &Arc<RuleBase> {
        &self.base
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Crisp value currently set for an input, if any
    pub fn input(&self, variable: &str) -> Option<f64> {
        self.inputs.get(variable).copied()
    }

    /// Set one crisp input value
    ///
    /// The variable must be a defined input and the value must lie inside its
    /// universe; the check is eager so a bad value fails here rather than at
    /// compute time. Re-setting an input before compute overwrites the
    /// previous value.
    pub fn set_input(&mut self, variable: &str, value: f64) -> MamdaniResult<&mut Self> {
        if self.state == SimulationState::Computed {
            return Err(MamdaniError::already_computed());
        }
        let var = match self.base.variable(variable) {
            Some(v) if v.role() == VariableRole::Input => v,
            Some(v) => {
                return Err(MamdaniError::unknown_variable(variable)
                    .with_context("role", v.role().to_string())
                    .with_hint(format!(
                        "'{}' is an output variable and cannot take input values",
                        variable
                    )))
            }
            None => return Err(MamdaniError::unknown_variable(variable)),
        };
        var.check_value(value)?;
        self.inputs.insert(variable.to_string(), value);
        self.state = SimulationState::InputsSet;
        Ok(self)
    }

    /// Run inference over the current inputs
    ///
    /// On success the session moves to `Computed` and freezes. On failure
    /// (missing input, nothing fired for an output) the session keeps its
    /// inputs and stays settable, so the caller can correct and retry.
    pub fn compute(&mut self) -> MamdaniResult<&InferenceOutcome> {
        if self.state == SimulationState::Computed {
            return Err(MamdaniError::already_computed());
        }
        let outcome = run_inference(&self.base, &self.inputs, &self.config)?;
        self.state = SimulationState::Computed;
        Ok(self.outcome.insert(outcome))
    }

    /// Crisp result for one output variable of a computed session
    pub fn output(&self, variable: &str) -> MamdaniResult<f64> {
        let outcome = self.computed_outcome()?;
        outcome
            .outputs
            .get(variable)
            .map(|r| r.crisp)
            .ok_or_else(|| MamdaniError::unknown_variable(variable))
    }

    /// Sample the aggregated output fuzzy set at `resolution` points
    ///
    /// Only valid once computed; the curve reflects the clipped and
    /// aggregated contributions behind the crisp result.
    pub fn sample_output_curve(
        &self,
        variable: &str,
        resolution: usize,
    ) -> MamdaniResult<Vec<(f64, f64)>> {
        let outcome = self.computed_outcome()?;
        let result = outcome
            .outputs
            .get(variable)
            .ok_or_else(|| MamdaniError::unknown_variable(variable))?;
        result.aggregate.sample(resolution)
    }

    /// Statistics from the last compute, if any
    pub fn stats(&self) -> Option<&InferenceStats> {
        self.outcome.as_ref().map(|o| &o.stats)
    }

    /// Full outcome of the last compute, if any
    pub fn outcome(&self) -> Option<&InferenceOutcome> {
        self.outcome.as_ref()
    }

    /// Clear inputs and results, returning the session to `Created`
    pub fn reset(&mut self) -> &mut Self {
        self.inputs.clear();
        self.outcome = None;
        self.state = SimulationState::Created;
        self
    }

    fn computed_outcome(&self) -> MamdaniResult<&InferenceOutcome> {
        match self.outcome.as_ref() {
            Some(outcome) if self.state == SimulationState::Computed => Ok(outcome),
            _ => Err(MamdaniError::not_computed()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
