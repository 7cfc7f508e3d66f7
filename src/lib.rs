//! Mamdani fuzzy inference engine
//!
//! A general-purpose implementation of the Mamdani pipeline over triangular
//! membership functions.
//!
//! # Architecture
//!
//! - [`membership`] - Truth degrees and triangular membership functions
//! - [`variable`] - Linguistic variables over closed real universes
//! - [`rule`] - Antecedent trees (Zadeh AND/OR/NOT) and weighted consequents
//! - [`rulebase`] - Validating builder producing an immutable rule base
//! - [`engine`] - Fuzzify, fire, clip, aggregate, defuzzify; optional
//!   thread fan-out for large rule bases
//! - [`simulation`] - Single-use sessions with a Created/InputsSet/Computed
//!   lifecycle
//! - [`parser`] - Textual rule form (`if water_level is low then ...`)
//! - [`model`] - TOML/JSON rule base documents
//! - [`config`] - Config files, env overrides, engine profiles
//!
//! # Example
//!
//! ```rust,ignore
//! use mamdani::{RuleBaseBuilder, Simulation, VariableRole};
//!
//! let mut builder = RuleBaseBuilder::new();
//! builder.define_variable("water_level", VariableRole::Input, 0.0, 10.0)?;
//! builder.add_term("water_level", "low", 0.0, 0.0, 5.0)?;
//! builder.add_term("water_level", "high", 5.0, 10.0, 10.0)?;
//! builder.define_variable("cooking_time", VariableRole::Output, 0.0, 60.0)?;
//! builder.add_term("cooking_time", "short", 0.0, 0.0, 30.0)?;
//! builder.add_term("cooking_time", "long", 30.0, 60.0, 60.0)?;
//! builder.add_rule_text("if water_level is low then cooking_time is long")?;
//! builder.add_rule_text("if water_level is high then cooking_time is short")?;
//!
//! let mut sim = Simulation::new(builder.build().into_shared());
//! sim.set_input("water_level", 3.0)?;
//! sim.compute()?;
//! println!("Cooking time: {:.2} minutes", sim.output("cooking_time")?);
//! ```

pub mod config;
pub mod defuzz;
pub mod engine;
pub mod error;
pub mod membership;
pub mod model;
pub mod parser;
pub mod rule;
pub mod rulebase;
pub mod simulation;
pub mod variable;

// Re-export membership types
pub use membership::{Degree, Triangle};

// Re-export variable types
pub use variable::{LinguisticVariable, VariableRole};

// Re-export rule types
pub use rule::{Antecedent, Consequent, FuzzifiedInputs, Rule};

// Re-export rule base types
pub use rulebase::{RuleBase, RuleBaseBuilder};

// Re-export engine types
pub use engine::{
    run_inference, AggregatedSet, EngineConfig, InferenceOutcome, InferenceStats, OutputResult,
    ParallelConfig,
};

// Re-export defuzzification types
pub use defuzz::DefuzzMethod;

// Re-export simulation types
pub use simulation::{Simulation, SimulationState};

// Re-export parser types
pub use parser::{parse_antecedent, parse_rule, ParseError};

// Re-export model types
pub use model::{ModelDoc, RuleDoc, VariableDoc};

// Re-export configuration types
pub use config::{
    ConfigError, EngineProfile, GeneralConfig, LogLevel, MamdaniConfig, ProfileConfig,
};

// Re-export error types
pub use error::{ErrorCode, ErrorContext, MamdaniError, MamdaniResult};
