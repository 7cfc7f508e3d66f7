//! Mamdani fuzzy inference CLI
//!
//! Loads a rule base from a model file (or a built-in demo), runs one
//! simulation over it, and prints crisp outputs, statistics, and sampled
//! aggregate curves.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use indexmap::IndexMap;

use mamdani::{
    DefuzzMethod, EngineProfile, LogLevel, MamdaniConfig, ModelDoc, RuleBase, RuleBaseBuilder,
    Simulation, VariableRole,
};

#[derive(Parser)]
#[command(name = "mamdani")]
#[command(version = option_env!("MAMDANI_VERSION").unwrap_or("0.1.0"))]
#[command(about = "Mamdani fuzzy inference engine", long_about = None)]
struct Cli {
    /// Model file (TOML, or JSON with a .json extension)
    #[arg(value_name = "MODEL")]
    model: Option<PathBuf>,

    /// Set a crisp input as name=value (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,

    /// Defuzzification method (centroid, bisector, mom, som, lom)
    #[arg(long, value_name = "METHOD")]
    defuzz: Option<String>,

    /// Output universe sampling step
    #[arg(long = "grid-step", value_name = "STEP")]
    grid_step: Option<f64>,

    /// Engine profile: default, fine, fast, or a [profiles.*] name
    #[arg(long, value_name = "NAME")]
    profile: Option<String>,

    /// Use a specific config file instead of the search path
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Sample an output's aggregated fuzzy set: VAR or VAR:RESOLUTION
    #[arg(long, value_name = "VAR[:RES]")]
    curve: Option<String>,

    /// Emit results as JSON
    #[arg(long)]
    json: bool,

    /// Print inference statistics
    #[arg(long)]
    stats: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (suppress info messages)
    #[arg(short, long)]
    quiet: bool,

    /// Print a commented default configuration and exit
    #[arg(long = "print-default-config")]
    print_default_config: bool,

    /// Run a built-in demo rule base
    #[arg(long, value_enum, value_name = "MODEL", conflicts_with = "model")]
    demo: Option<DemoModel>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum DemoModel {
    /// Two-input rice cooker (water level, rice quantity)
    Simple,
    /// Three-input rice cooker adding a rice type
    Typed,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_default_config {
        print!("{}", MamdaniConfig::default_config_content());
        return Ok(());
    }

    // Layered settings: config file, environment, then command line
    let mut config = match &cli.config {
        Some(path) => {
            let mut loaded = MamdaniConfig::load_from_file(path)?;
            loaded.apply_env_overrides();
            loaded
        }
        None => MamdaniConfig::load()?,
    };

    if let Some(name) = &cli.profile {
        config.apply_profile(name)?;
    } else if config.general.profile != EngineProfile::Default {
        let name = config.general.profile.as_str().to_string();
        config.apply_profile(&name)?;
    }

    if let Some(step) = cli.grid_step {
        config.engine.grid_step = step;
    }
    if let Some(spec) = &cli.defuzz {
        config.engine.defuzz = spec
            .parse::<DefuzzMethod>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }

    let verbose = !cli.quiet
        && (cli.verbose || matches!(config.general.log_level, LogLevel::Verbose | LogLevel::Debug));

    // Build the rule base
    let base = match (cli.demo, &cli.model) {
        (Some(DemoModel::Simple), _) => demo_simple()?,
        (Some(DemoModel::Typed), _) => demo_typed()?,
        (None, Some(path)) => ModelDoc::load_path(path)
            .with_context(|| format!("Failed to load model {}", path.display()))?
            .compile()
            .with_context(|| format!("Model {} does not validate", path.display()))?,
        (None, None) => bail!("no model given; pass a MODEL file or --demo simple|typed"),
    };

    if verbose {
        eprintln!(
            "mamdani {} ({})",
            option_env!("MAMDANI_VERSION").unwrap_or("dev"),
            option_env!("MAMDANI_TARGET").unwrap_or("unknown target"),
        );
        eprintln!(
            "Loaded {} variables, {} rules",
            base.variable_count(),
            base.rule_count()
        );
    }

    // Demo bases run the original script inputs unless overridden
    let mut inputs: Vec<(String, f64)> = match cli.demo {
        Some(DemoModel::Simple) => vec![
            ("water_level".to_string(), 5.0),
            ("rice_quantity".to_string(), 8.0),
        ],
        Some(DemoModel::Typed) => vec![
            ("water_level".to_string(), 6.0),
            ("rice_quantity".to_string(), 4.0),
            ("rice_type".to_string(), 3.0),
        ],
        None => Vec::new(),
    };
    for spec in &cli.set {
        let (name, value) = parse_input_spec(spec)?;
        if let Some(slot) = inputs.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            inputs.push((name, value));
        }
    }

    let mut sim = Simulation::with_config(base.into_shared(), config.engine.clone());
    for (name, value) in &inputs {
        sim.set_input(name, *value)
            .with_context(|| format!("Cannot set input '{}'", name))?;
    }

    let (outputs, stats) = {
        let outcome = sim.compute().context("Inference failed")?;
        let outputs: IndexMap<String, f64> = outcome
            .outputs
            .iter()
            .map(|(name, result)| (name.clone(), result.crisp))
            .collect();
        (outputs, outcome.stats.clone())
    };

    if verbose {
        eprintln!(
            "Inference: {} rules evaluated, {} fired, {} contributions",
            stats.rules_evaluated, stats.rules_fired, stats.contributions
        );
    }

    let curve = match &cli.curve {
        Some(spec) => {
            let (variable, resolution) = parse_curve_spec(spec)?;
            let points = sim
                .sample_output_curve(&variable, resolution)
                .with_context(|| format!("Cannot sample curve for '{}'", variable))?;
            Some((variable, points))
        }
        None => None,
    };

    if cli.json {
        let input_map: IndexMap<String, f64> = inputs.into_iter().collect();
        let mut doc = serde_json::json!({
            "inputs": serde_json::to_value(input_map)?,
            "outputs": serde_json::to_value(&outputs)?,
        });
        if cli.stats {
            doc["stats"] = serde_json::to_value(&stats)?;
        }
        if let Some((variable, points)) = &curve {
            doc["curve"] = serde_json::json!({
                "variable": variable,
                "points": points,
            });
        }
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        for (name, value) in &outputs {
            println!("{}: {:.2}", name, value);
        }
        if cli.stats {
            println!();
            println!("rules evaluated:     {}", stats.rules_evaluated);
            println!("rules fired:         {}", stats.rules_fired);
            println!("contributions:       {}", stats.contributions);
            println!("max firing strength: {:.4}", stats.max_firing_strength);
            println!(
                "workers:             {}{}",
                stats.workers,
                if stats.used_parallel { " (parallel)" } else { "" }
            );
        }
        if let Some((variable, points)) = &curve {
            println!();
            println!("# {} aggregate", variable);
            println!("x,membership");
            for (x, m) in points {
                println!("{},{}", x, m);
            }
        }
    }

    Ok(())
}

// ============================================================================
// Argument parsing helpers
// ============================================================================

fn parse_input_spec(spec: &str) -> Result<(String, f64)> {
    let (name, value) = spec
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("invalid --set '{}', expected name=value", spec))?;
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("invalid numeric value in --set '{}'", spec))?;
    Ok((name.trim().to_string(), value))
}

/// `VAR` or `VAR:RESOLUTION`; resolution defaults to 101 points
fn parse_curve_spec(spec: &str) -> Result<(String, usize)> {
    match spec.split_once(':') {
        Some((variable, resolution)) => {
            let resolution: usize = resolution
                .parse()
                .with_context(|| format!("invalid curve resolution in '{}'", spec))?;
            Ok((variable.trim().to_string(), resolution))
        }
        None => Ok((spec.trim().to_string(), 101)),
    }
}

// ============================================================================
// Demo rule bases
// ============================================================================

/// Two-input rice cooker: a 3x3 rule grid over water level and quantity
fn demo_simple() -> Result<RuleBase> {
    let mut b = RuleBaseBuilder::new();
    b.define_variable("water_level", VariableRole::Input, 0.0, 10.0)?;
    b.add_term("water_level", "low", 0.0, 0.0, 5.0)?;
    b.add_term("water_level", "medium", 0.0, 5.0, 10.0)?;
    b.add_term("water_level", "high", 5.0, 10.0, 10.0)?;
    b.define_variable("rice_quantity", VariableRole::Input, 0.0, 10.0)?;
    b.add_term("rice_quantity", "low", 0.0, 0.0, 5.0)?;
    b.add_term("rice_quantity", "medium", 0.0, 5.0, 10.0)?;
    b.add_term("rice_quantity", "high", 5.0, 10.0, 10.0)?;
    b.define_variable("cooking_time", VariableRole::Output, 0.0, 60.0)?;
    b.add_term("cooking_time", "short", 0.0, 0.0, 30.0)?;
    b.add_term("cooking_time", "medium", 20.0, 30.0, 40.0)?;
    b.add_term("cooking_time", "long", 30.0, 60.0, 60.0)?;

    for rule in [
        "if water_level is low and rice_quantity is low then cooking_time is short",
        "if water_level is low and rice_quantity is medium then cooking_time is medium",
        "if water_level is low and rice_quantity is high then cooking_time is long",
        "if water_level is medium and rice_quantity is low then cooking_time is short",
        "if water_level is medium and rice_quantity is medium then cooking_time is medium",
        "if water_level is medium and rice_quantity is high then cooking_time is long",
        "if water_level is high and rice_quantity is low then cooking_time is medium",
        "if water_level is high and rice_quantity is medium then cooking_time is long",
        "if water_level is high and rice_quantity is high then cooking_time is long",
    ] {
        b.add_rule_text(rule)?;
    }
    Ok(b.build())
}

/// Three-input variant: each row of the grid is gated on a rice type
fn demo_typed() -> Result<RuleBase> {
    let mut b = RuleBaseBuilder::new();
    b.define_variable("water_level", VariableRole::Input, 0.0, 10.0)?;
    b.add_term("water_level", "low", 0.0, 0.0, 5.0)?;
    b.add_term("water_level", "medium", 0.0, 5.0, 10.0)?;
    b.add_term("water_level", "high", 5.0, 10.0, 10.0)?;
    b.define_variable("rice_quantity", VariableRole::Input, 0.0, 10.0)?;
    b.add_term("rice_quantity", "low", 0.0, 0.0, 5.0)?;
    b.add_term("rice_quantity", "medium", 0.0, 5.0, 10.0)?;
    b.add_term("rice_quantity", "high", 5.0, 10.0, 10.0)?;
    b.define_variable("rice_type", VariableRole::Input, 1.0, 3.0)?;
    b.add_term("rice_type", "short", 1.0, 1.0, 1.0)?;
    b.add_term("rice_type", "long", 2.0, 2.0, 2.0)?;
    b.add_term("rice_type", "sticky", 3.0, 3.0, 3.0)?;
    b.define_variable("cooking_time", VariableRole::Output, 0.0, 60.0)?;
    b.add_term("cooking_time", "short", 0.0, 0.0, 30.0)?;
    b.add_term("cooking_time", "medium", 20.0, 30.0, 40.0)?;
    b.add_term("cooking_time", "long", 30.0, 60.0, 60.0)?;

    for rule in [
        "if water_level is low and rice_quantity is low and rice_type is short then cooking_time is short",
        "if water_level is low and rice_quantity is medium and rice_type is short then cooking_time is medium",
        "if water_level is low and rice_quantity is high and rice_type is short then cooking_time is long",
        "if water_level is medium and rice_quantity is low and rice_type is long then cooking_time is short",
        "if water_level is medium and rice_quantity is medium and rice_type is long then cooking_time is medium",
        "if water_level is medium and rice_quantity is high and rice_type is long then cooking_time is long",
        "if water_level is high and rice_quantity is low and rice_type is sticky then cooking_time is medium",
        "if water_level is high and rice_quantity is medium and rice_type is sticky then cooking_time is long",
        "if water_level is high and rice_quantity is high and rice_type is sticky then cooking_time is long",
    ] {
        b.add_rule_text(rule)?;
    }
    Ok(b.build())
}
