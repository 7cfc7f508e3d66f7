//! Parallel rule firing evaluation
//!
//! Firing strengths are independent per rule, so the rule list can be
//! partitioned across worker threads and the per-rule results merged back in
//! rule order. The merge sorts by rule index, which keeps outputs and stats
//! bit-identical to a sequential run; clipping and aggregation stay
//! sequential.
//!
//! ```text
//!             ┌─────────────────────────────────┐
//!             │         evaluate_firings        │
//!             ├─────────────────────────────────┤
//!             │  partition rules into N chunks  │
//!             │  ┌────────┬────────┬─────────┐  │
//!             │  │worker 1│worker 2│ worker N│  │
//!             │  └────────┴────────┴─────────┘  │
//!             │   merge + sort by rule index    │
//!             └─────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex};
use std::thread;

use serde::{Deserialize, Serialize};

use crate::membership::Degree;
use crate::rule::{FuzzifiedInputs, Rule};

/// Configuration for parallel execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Number of worker threads (0 = auto-detect based on CPU count)
    pub workers: usize,
    /// Minimum rules per worker before parallelizing
    pub min_rules_per_worker: usize,
    /// Whether to enable parallel execution
    pub enabled: bool,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        ParallelConfig {
            workers: 0, // Auto-detect
            min_rules_per_worker: 4,
            enabled: true,
        }
    }
}

impl ParallelConfig {
    /// Set number of worker threads
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }

    /// Set the minimum rules per worker before threads are worthwhile
    pub fn with_min_rules_per_worker(mut self, n: usize) -> Self {
        self.min_rules_per_worker = n;
        self
    }

    /// Disable parallel execution
    pub fn sequential(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Get effective worker count
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus()
        } else {
            self.workers
        }
    }
}

/// Get number of CPUs (fallback to 1 if detection fails)
fn num_cpus() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Firing strength of one rule, tagged with its position in the rule list
#[derive(Debug, Clone, Copy)]
pub(crate) struct Firing {
    pub rule_index: usize,
    pub strength: Degree,
}

/// Evaluate firing strengths for every rule
///
/// Returns the firings in rule order plus (used_parallel, workers) for stats.
/// Falls back to the sequential path when the rule count does not justify
/// spawning threads.
pub(crate) fn evaluate_firings(
    rules: &[Rule],
    inputs: &FuzzifiedInputs,
    config: &ParallelConfig,
) -> (Vec<Firing>, bool, usize) {
    let workers = config.effective_workers();
    let use_parallel = config.enabled
        && rules.len() >= workers * config.min_rules_per_worker
        && workers > 1;

    if use_parallel {
        (parallel_firings(rules, inputs, workers), true, workers)
    } else {
        (sequential_firings(rules, inputs), false, 1)
    }
}

fn sequential_firings(rules: &[Rule], inputs: &FuzzifiedInputs) -> Vec<Firing> {
    rules
        .iter()
        .enumerate()
        .map(|(rule_index, rule)| Firing {
            rule_index,
            strength: rule.firing_strength(inputs),
        })
        .collect()
}

fn parallel_firings(rules: &[Rule], inputs: &FuzzifiedInputs, workers: usize) -> Vec<Firing> {
    let chunks = partition_rules(rules, workers);
    let inputs = Arc::new(inputs.clone());
    let results: Arc<Mutex<Vec<Firing>>> = Arc::new(Mutex::new(Vec::with_capacity(rules.len())));

    let handles: Vec<_> = chunks
        .into_iter()
        .map(|chunk| {
            let inputs = Arc::clone(&inputs);
            let results = Arc::clone(&results);

            thread::spawn(move || {
                let mut local = Vec::with_capacity(chunk.len());
                for (rule_index, rule) in chunk {
                    local.push(Firing {
                        rule_index,
                        strength: rule.firing_strength(&inputs),
                    });
                }
                if !local.is_empty() {
                    let mut results = results.lock().unwrap();
                    results.extend(local);
                }
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join();
    }

    let mut firings = Arc::try_unwrap(results)
        .map(|mutex| mutex.into_inner().unwrap())
        .unwrap_or_else(|arc| arc.lock().unwrap().clone());
    firings.sort_by_key(|f| f.rule_index);
    firings
}

/// Partition rules across workers, keeping their original indexes
fn partition_rules(rules: &[Rule], workers: usize) -> Vec<Vec<(usize, Rule)>> {
    let chunk_size = (rules.len() + workers - 1) / workers;
    rules
        .iter()
        .cloned()
        .enumerate()
        .collect::<Vec<_>>()
        .chunks(chunk_size.max(1))
        .map(|c| c.to_vec())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Antecedent;
    use indexmap::IndexMap;

    fn synthetic_inputs(vars: usize) -> FuzzifiedInputs {
        let mut inputs = FuzzifiedInputs::default();
        for i in 0..vars {
            let mut terms: IndexMap<String, Degree> = IndexMap::new();
            terms.insert("low".to_string(), Degree::new(0.1 * (i as f64 + 1.0)));
            terms.insert("high".to_string(), Degree::new(1.0 - 0.1 * (i as f64)));
            inputs.insert(format!("v{}", i), terms);
        }
        inputs
    }

    fn synthetic_rules(count: usize) -> Vec<Rule> {
        (0..count)
            .map(|i| {
                let var = format!("v{}", i % 4);
                let term = if i % 2 == 0 { "low" } else { "high" };
                Rule::named(format!("rule{}", i), Antecedent::is(var, term))
                    .then("out", "x")
            })
            .collect()
    }

    #[test]
    fn test_config_defaults() {
        let config = ParallelConfig::default();
        assert_eq!(config.workers, 0); // Auto-detect
        assert!(config.enabled);
    }

    #[test]
    fn test_config_builder() {
        let config = ParallelConfig::default()
            .with_workers(8)
            .with_min_rules_per_worker(2);

        assert_eq!(config.workers, 8);
        assert_eq!(config.min_rules_per_worker, 2);
        assert_eq!(config.effective_workers(), 8);
    }

    #[test]
    fn test_sequential_mode() {
        let config = ParallelConfig::default().sequential();
        assert!(!config.enabled);
    }

    #[test]
    fn test_partition_rules() {
        let rules = synthetic_rules(10);
        let partitions = partition_rules(&rules, 3);
        assert_eq!(partitions.len(), 3);

        // All rules should be present with their indexes intact
        let total: usize = partitions.iter().map(|p| p.len()).sum();
        assert_eq!(total, 10);
        assert_eq!(partitions[0][0].0, 0);
        assert_eq!(partitions[2].last().unwrap().0, 9);
    }

    #[test]
    fn test_small_rule_sets_stay_sequential() {
        let rules = synthetic_rules(3);
        let inputs = synthetic_inputs(4);
        let config = ParallelConfig::default().with_workers(4);

        let (_, used_parallel, workers) = evaluate_firings(&rules, &inputs, &config);
        assert!(!used_parallel);
        assert_eq!(workers, 1);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let rules = synthetic_rules(24);
        let inputs = synthetic_inputs(4);

        let sequential = sequential_firings(&rules, &inputs);
        let parallel = parallel_firings(&rules, &inputs, 3);

        assert_eq!(sequential.len(), parallel.len());
        for (s, p) in sequential.iter().zip(parallel.iter()) {
            assert_eq!(s.rule_index, p.rule_index);
            assert_eq!(s.strength.value(), p.strength.value());
        }
    }

    #[test]
    fn test_parallel_gate_engages() {
        let rules = synthetic_rules(24);
        let inputs = synthetic_inputs(4);
        let config = ParallelConfig::default()
            .with_workers(2)
            .with_min_rules_per_worker(1);

        let (firings, used_parallel, workers) = evaluate_firings(&rules, &inputs, &config);
        assert!(used_parallel);
        assert_eq!(workers, 2);
        assert_eq!(firings.len(), 24);
        for (i, firing) in firings.iter().enumerate() {
            assert_eq!(firing.rule_index, i);
        }
    }

    #[test]
    fn test_num_cpus() {
        let n = num_cpus();
        assert!(n >= 1);
    }
}
