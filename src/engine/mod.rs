//! Mamdani inference engine
//!
//! Implements the core pipeline over a frozen rule base:
//! - Fuzzification of crisp inputs through every referenced input variable
//! - Firing strength per rule (Zadeh operators over the antecedent tree)
//! - Min-implication: each consequent term clipped at strength times weight
//! - Max-aggregation of all clipped contributions per output variable
//! - Defuzzification over the sampled universe
//!
//! The engine is a pure function of (rule base, inputs, config): no I/O, no
//! interior state, identical inputs give identical outputs. Session state
//! lives in `simulation`; thread fan-out lives in `parallel`.

pub mod parallel;

pub use parallel::ParallelConfig;

use fnv::FnvHashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::defuzz::DefuzzMethod;
use crate::error::{MamdaniError, MamdaniResult};
use crate::membership::{Degree, Triangle};
use crate::rule::FuzzifiedInputs;
use crate::rulebase::RuleBase;

use parallel::evaluate_firings;

// ============================================================================
// Configuration
// ============================================================================

/// Tunable parameters of one inference run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sampling step for output universes; 1.0 matches a unit integer grid
    pub grid_step: f64,
    /// Defuzzification method
    pub defuzz: DefuzzMethod,
    /// Parallel rule evaluation settings
    pub parallel: ParallelConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            grid_step: 1.0,
            defuzz: DefuzzMethod::default(),
            parallel: ParallelConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_grid_step(mut self, step: f64) -> Self {
        self.grid_step = step;
        self
    }

    pub fn with_defuzz(mut self, method: DefuzzMethod) -> Self {
        self.defuzz = method;
        self
    }

    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> MamdaniResult<()> {
        if !self.grid_step.is_finite() || self.grid_step <= 0.0 {
            return Err(MamdaniError::config(format!(
                "grid_step must be a positive finite number, got {}",
                self.grid_step
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Statistics about one inference run
#[derive(Debug, Clone, Default, Serialize)]
pub struct InferenceStats {
    /// Rules whose antecedent was evaluated
    pub rules_evaluated: usize,
    /// Rules with nonzero firing strength
    pub rules_fired: usize,
    /// Clipped consequent contributions added to aggregates
    pub contributions: usize,
    /// Strongest firing strength seen
    pub max_firing_strength: f64,
    /// Worker threads used for firing evaluation
    pub workers: usize,
    /// Whether the parallel path ran
    pub used_parallel: bool,
}

// ============================================================================
// Aggregated output sets
// ============================================================================

/// One clipped consequent contribution
#[derive(Debug, Clone, Copy)]
struct Contribution {
    triangle: Triangle,
    cap: f64,
}

/// The aggregated fuzzy set of one output variable after implication
///
/// Keeps the clipped contributions rather than a fixed sample vector, so the
/// curve can be evaluated at any x and re-sampled at any resolution after
/// compute.
#[derive(Debug, Clone)]
pub struct AggregatedSet {
    variable: String,
    lo: f64,
    hi: f64,
    contributions: Vec<Contribution>,
}

impl AggregatedSet {
    fn new(variable: &str, lo: f64, hi: f64) -> Self {
        Self {
            variable: variable.to_string(),
            lo,
            hi,
            contributions: Vec::new(),
        }
    }

    fn push(&mut self, triangle: Triangle, cap: f64) {
        self.contributions.push(Contribution { triangle, cap });
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Universe bounds as (lo, hi)
    pub fn universe(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    pub fn contribution_count(&self) -> usize {
        self.contributions.len()
    }

    /// Aggregate membership at x: max over min(term(x), cap)
    pub fn membership(&self, x: f64) -> Degree {
        let mut best = Degree::new(0.0);
        for c in &self.contributions {
            let clipped = Degree::new(c.triangle.evaluate(x).value().min(c.cap));
            best = best.or(&clipped);
        }
        best
    }

    /// Sample the aggregate at `resolution` evenly spaced points, endpoints
    /// included. This is the hook an external renderer plots from.
    pub fn sample(&self, resolution: usize) -> MamdaniResult<Vec<(f64, f64)>> {
        if resolution < 2 {
            return Err(MamdaniError::invalid_resolution(resolution));
        }
        let step = (self.hi - self.lo) / (resolution - 1) as f64;
        Ok((0..resolution)
            .map(|i| {
                let x = if i == resolution - 1 {
                    self.hi
                } else {
                    self.lo + i as f64 * step
                };
                (x, self.membership(x).value())
            })
            .collect())
    }
}

// ============================================================================
// Inference
// ============================================================================

/// Crisp result for one output variable
#[derive(Debug, Clone)]
pub struct OutputResult {
    pub crisp: f64,
    pub aggregate: AggregatedSet,
}

/// Everything one compute produces
#[derive(Debug, Clone)]
pub struct InferenceOutcome {
    /// Output results in variable definition order
    pub outputs: IndexMap<String, OutputResult>,
    pub stats: InferenceStats,
}

/// Run the full Mamdani pipeline for one set of crisp inputs
pub fn run_inference(
    base: &RuleBase,
    inputs: &FnvHashMap<String, f64>,
    config: &EngineConfig,
) -> MamdaniResult<InferenceOutcome> {
    config.validate()?;

    // Fuzzify every input the rules reference
    let mut fuzzified = FuzzifiedInputs::default();
    for var in base.required_inputs() {
        let value = inputs
            .get(var.name())
            .copied()
            .ok_or_else(|| MamdaniError::missing_input(var.name()))?;
        fuzzified.insert(var.name().to_string(), var.fuzzify(value)?);
    }

    // Firing strength per rule
    let (firings, used_parallel, workers) =
        evaluate_firings(base.rules(), &fuzzified, &config.parallel);

    let mut stats = InferenceStats {
        rules_evaluated: base.rule_count(),
        workers,
        used_parallel,
        ..Default::default()
    };

    // Min-implication: clip each consequent term at strength * weight
    let mut aggregates: IndexMap<String, AggregatedSet> = base
        .output_variables()
        .map(|v| {
            let (lo, hi) = v.universe();
            (v.name().to_string(), AggregatedSet::new(v.name(), lo, hi))
        })
        .collect();

    for firing in &firings {
        if firing.strength.is_zero() {
            continue;
        }
        stats.rules_fired += 1;
        stats.max_firing_strength = stats.max_firing_strength.max(firing.strength.value());

        let rule = &base.rules()[firing.rule_index];
        for con in &rule.consequents {
            let cap = firing.strength.value() * con.weight;
            if cap <= 0.0 {
                continue;
            }
            let triangle = base.variable(&con.variable).and_then(|v| v.term(&con.term));
            if let (Some(tri), Some(agg)) = (triangle, aggregates.get_mut(&con.variable)) {
                agg.push(*tri, cap);
                stats.contributions += 1;
            }
        }
    }

    // Max-aggregation is folded into AggregatedSet::membership; defuzzify
    // each output over its sampled universe
    let mut outputs = IndexMap::new();
    for (name, aggregate) in aggregates {
        let var = match base.variable(&name) {
            Some(v) => v,
            None => continue,
        };
        let samples: Vec<(f64, Degree)> = var
            .grid(config.grid_step)
            .into_iter()
            .map(|x| (x, aggregate.membership(x)))
            .collect();
        let crisp = config
            .defuzz
            .apply(&samples)
            .ok_or_else(|| MamdaniError::no_rule_fired(&name))?;
        outputs.insert(name, OutputResult { crisp, aggregate });
    }

    Ok(InferenceOutcome { outputs, stats })
}

// ============================================================================
// Tests
// ============================================================================
