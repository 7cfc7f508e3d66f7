//! Structured Error Handling for mamdani
//!
//! Provides a unified error type hierarchy with:
//! - Error codes for programmatic handling
//! - Structured error payloads (JSON-friendly)
//! - Context preservation through error chains
//! - Definition-time vs runtime classification
//!
//! # Error Categories
//!
//! - Model definition errors (1xxx) - invalid membership functions, duplicate
//!   or unknown variables and terms, malformed rules. These indicate a broken
//!   model and are raised fail-fast during registration.
//! - Runtime errors (2xxx) - out-of-range inputs, missing inputs, session
//!   state misuse, empty aggregates. These are recoverable: the caller can fix
//!   the inputs and retry.
//!
//! # Example
//!
//! ```rust,ignore
//! use mamdani::error::{MamdaniError, MamdaniResult};
//!
//! fn check_weight(w: f64) -> MamdaniResult<()> {
//!     if !(w > 0.0 && w <= 1.0) {
//!         return Err(MamdaniError::invalid_weight(w)
//!             .with_hint("Rule weights must lie in (0, 1]"));
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Model definition errors (1xxx)
    /// Membership function parameters are not ordered or lie outside the universe
    InvalidMembershipFunction = 1000,
    /// A variable with this name is already registered
    DuplicateVariable = 1001,
    /// A term with this name already exists on the variable
    DuplicateTerm = 1002,
    /// No variable with this name is registered
    UnknownVariable = 1003,
    /// The variable has no term with this name
    UnknownTerm = 1004,
    /// An input variable used as a consequent, or an output used in an antecedent
    RoleMismatch = 1005,
    /// Structurally invalid rule (empty antecedent branch or no consequents)
    InvalidRule = 1006,
    /// Rule weight outside (0, 1]
    InvalidWeight = 1007,
    /// Rule text that does not parse
    RuleSyntax = 1008,
    /// Malformed model document
    InvalidDocument = 1009,
    /// Invalid engine configuration value
    InvalidConfig = 1010,
    /// Universe bounds empty, inverted, or not finite
    InvalidUniverse = 1011,

    // Runtime errors (2xxx)
    /// Crisp input outside the variable's universe
    InputOutOfRange = 2000,
    /// Compute called before all referenced inputs were set
    MissingInput = 2001,
    /// Output requested before compute succeeded
    NotComputed = 2002,
    /// Input mutation attempted after compute
    AlreadyComputed = 2003,
    /// Every rule fired at zero strength for an output variable
    NoRuleFired = 2004,
    /// Curve sampling resolution below the minimum
    InvalidResolution = 2005,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            // Model definition errors
            ErrorCode::InvalidMembershipFunction => "Invalid membership function",
            ErrorCode::DuplicateVariable => "Duplicate variable",
            ErrorCode::DuplicateTerm => "Duplicate term",
            ErrorCode::UnknownVariable => "Unknown variable",
            ErrorCode::UnknownTerm => "Unknown term",
            ErrorCode::RoleMismatch => "Variable role mismatch",
            ErrorCode::InvalidRule => "Invalid rule",
            ErrorCode::InvalidWeight => "Invalid rule weight",
            ErrorCode::RuleSyntax => "Invalid rule syntax",
            ErrorCode::InvalidDocument => "Invalid model document",
            ErrorCode::InvalidConfig => "Invalid engine configuration",
            ErrorCode::InvalidUniverse => "Invalid universe bounds",

            // Runtime errors
            ErrorCode::InputOutOfRange => "Input out of range",
            ErrorCode::MissingInput => "Missing input",
            ErrorCode::NotComputed => "Outputs not computed",
            ErrorCode::AlreadyComputed => "Simulation already computed",
            ErrorCode::NoRuleFired => "No rule fired",
            ErrorCode::InvalidResolution => "Invalid sampling resolution",
        }
    }

    /// True for fail-fast model definition errors (1xxx)
    pub fn is_definition_error(&self) -> bool {
        let code = self.code();
        (1000..2000).contains(&code)
    }

    /// True for recoverable runtime errors (2xxx)
    pub fn is_runtime_error(&self) -> bool {
        let code = self.code();
        (2000..3000).contains(&code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Error Context
// ============================================================================

/// Additional context information for an error
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Key-value pairs of context information
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, String>,
    /// Stack of error causes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field to the context
    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a cause to the error chain
    pub fn cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for mamdani
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MamdaniError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
    /// Hint for resolving the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl MamdaniError {
    /// Create a new error with a code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    // ========================================================================
    // Factory methods for common error types
    // ========================================================================

    /// Create an invalid membership function error
    pub fn membership(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidMembershipFunction, message)
    }

    /// Create a duplicate variable error
    pub fn duplicate_variable(name: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateVariable,
            format!("Variable '{}' is already defined", name),
        )
        .with_context("variable", name)
    }

    /// Create a duplicate term error
    pub fn duplicate_term(variable: &str, term: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateTerm,
            format!("Term '{}' is already defined on variable '{}'", term, variable),
        )
        .with_context("variable", variable)
        .with_context("term", term)
    }

    /// Create an unknown variable error
    pub fn unknown_variable(name: &str) -> Self {
        Self::new(
            ErrorCode::UnknownVariable,
            format!("Unknown variable '{}'", name),
        )
        .with_context("variable", name)
    }

    /// Create an unknown term error
    pub fn unknown_term(variable: &str, term: &str) -> Self {
        Self::new(
            ErrorCode::UnknownTerm,
            format!("Variable '{}' has no term '{}'", variable, term),
        )
        .with_context("variable", variable)
        .with_context("term", term)
    }

    /// Create a role mismatch error
    pub fn role_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RoleMismatch, message)
    }

    /// Create an invalid rule error
    pub fn invalid_rule(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRule, message)
    }

    /// Create an invalid weight error
    pub fn invalid_weight(weight: f64) -> Self {
        Self::new(
            ErrorCode::InvalidWeight,
            format!("Rule weight {} is outside (0, 1]", weight),
        )
    }

    /// Create a rule syntax error
    pub fn rule_syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RuleSyntax, message)
    }

    /// Create a model document error
    pub fn document(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidDocument, message)
    }

    /// Create an engine configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfig, message)
    }

    /// Create a universe bounds error
    pub fn universe(variable: &str, lo: f64, hi: f64) -> Self {
        Self::new(
            ErrorCode::InvalidUniverse,
            format!(
                "Universe [{}, {}] for variable '{}' must be finite with lo < hi",
                lo, hi, variable
            ),
        )
        .with_context("variable", variable)
    }

    /// Create an input out of range error
    pub fn out_of_range(variable: &str, value: f64, lo: f64, hi: f64) -> Self {
        Self::new(
            ErrorCode::InputOutOfRange,
            format!(
                "Input {} for variable '{}' is outside its universe [{}, {}]",
                value, variable, lo, hi
            ),
        )
        .with_context("variable", variable)
    }

    /// Create a missing input error
    pub fn missing_input(variable: &str) -> Self {
        Self::new(
            ErrorCode::MissingInput,
            format!("No input set for variable '{}'", variable),
        )
        .with_context("variable", variable)
        .with_hint("Call set_input for every variable the rules reference before compute")
    }

    /// Create a not computed error
    pub fn not_computed() -> Self {
        Self::new(
            ErrorCode::NotComputed,
            "Outputs are not available before compute succeeds",
        )
    }

    /// Create an already computed error
    pub fn already_computed() -> Self {
        Self::new(
            ErrorCode::AlreadyComputed,
            "Inputs cannot change after compute; call reset to start over",
        )
    }

    /// Create a no rule fired error
    pub fn no_rule_fired(variable: &str) -> Self {
        Self::new(
            ErrorCode::NoRuleFired,
            format!(
                "No rule fired with nonzero strength for output variable '{}'",
                variable
            ),
        )
        .with_context("variable", variable)
        .with_hint("Check rule coverage of the input space")
    }

    /// Create an invalid resolution error
    pub fn invalid_resolution(resolution: usize) -> Self {
        Self::new(
            ErrorCode::InvalidResolution,
            format!("Curve resolution {} is below the minimum of 2", resolution),
        )
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.fields.insert(key.into(), value.into());
        self
    }

    /// Add a cause to the error chain
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.causes.push(cause.into());
        self
    }

    /// Add a hint for resolving the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Check if this is a fail-fast model definition error
    pub fn is_definition_error(&self) -> bool {
        self.code.is_definition_error()
    }

    /// Check if this is a recoverable runtime error
    pub fn is_runtime_error(&self) -> bool {
        self.code.is_runtime_error()
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"INVALID_DOCUMENT","message":"{}"}}"#, self.message)
        })
    }

    /// Convert to pretty JSON string
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

impl fmt::Display for MamdaniError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;

        if let Some(ref ctx) = self.context {
            if !ctx.causes.is_empty() {
                write!(f, "\nCaused by:")?;
                for cause in &ctx.causes {
                    write!(f, "\n  - {}", cause)?;
                }
            }
        }

        if let Some(ref hint) = self.hint {
            write!(f, "\nHint: {}", hint)?;
        }

        Ok(())
    }
}

impl std::error::Error for MamdaniError {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<std::io::Error> for MamdaniError {
    fn from(err: std::io::Error) -> Self {
        MamdaniError::document(format!("Model file could not be read: {}", err))
    }
}

impl From<serde_json::Error> for MamdaniError {
    fn from(err: serde_json::Error) -> Self {
        MamdaniError::document(err.to_string()).with_context("format", "JSON")
    }
}

impl From<toml::de::Error> for MamdaniError {
    fn from(err: toml::de::Error) -> Self {
        MamdaniError::document(err.to_string()).with_context("format", "TOML")
    }
}

// ============================================================================
// Result type alias
// ============================================================================

/// A Result type using MamdaniError
pub type MamdaniResult<T> = Result<T, MamdaniError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = MamdaniError::unknown_variable("pressure");
        assert_eq!(err.code, ErrorCode::UnknownVariable);
        assert!(err.message.contains("pressure"));
    }

    #[test]
    fn test_error_with_context() {
        let err = MamdaniError::unknown_term("water_level", "tepid");

        assert!(err.context.is_some());
        let ctx = err.context.as_ref().unwrap();
        assert_eq!(ctx.fields.get("variable"), Some(&"water_level".to_string()));
        assert_eq!(ctx.fields.get("term"), Some(&"tepid".to_string()));
    }

    #[test]
    fn test_error_with_cause() {
        let err = MamdaniError::document("failed to load model")
            .with_cause("unexpected key 'variabels'")
            .with_cause("line 12");

        let ctx = err.context.as_ref().unwrap();
        assert_eq!(ctx.causes.len(), 2);
    }

    #[test]
    fn test_error_with_hint() {
        let err = MamdaniError::config("unknown profile")
            .with_hint("Available profiles: default, fine, fast");

        assert_eq!(
            err.hint,
            Some("Available profiles: default, fine, fast".to_string())
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(MamdaniError::duplicate_variable("x").is_definition_error());
        assert!(MamdaniError::invalid_weight(1.5).is_definition_error());
        assert!(!MamdaniError::missing_input("x").is_definition_error());

        assert!(MamdaniError::no_rule_fired("y").is_runtime_error());
        assert!(MamdaniError::not_computed().is_runtime_error());
        assert!(!MamdaniError::membership("bad").is_runtime_error());
    }

    #[test]
    fn test_error_code_ranges() {
        assert_eq!(ErrorCode::InvalidMembershipFunction.code(), 1000);
        assert_eq!(ErrorCode::InputOutOfRange.code(), 2000);
        assert!(ErrorCode::RuleSyntax.is_definition_error());
        assert!(ErrorCode::AlreadyComputed.is_runtime_error());
    }

    #[test]
    fn test_error_to_json() {
        let err = MamdaniError::no_rule_fired("cooking_time");
        let json = err.to_json();
        assert!(json.contains("NO_RULE_FIRED"));
        assert!(json.contains("cooking_time"));
    }

    #[test]
    fn test_error_serde_round_trip() {
        let err = MamdaniError::out_of_range("water_level", 12.0, 0.0, 10.0)
            .with_hint("Inputs must lie inside the declared universe");
        let json = err.to_json();
        let back: MamdaniError = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code, ErrorCode::InputOutOfRange);
        assert_eq!(back.hint, err.hint);
    }

    #[test]
    fn test_error_display() {
        let err = MamdaniError::document("model rejected")
            .with_cause("rule 3 references 'stickyness'")
            .with_hint("Did you mean 'sticky'?");

        let display = err.to_string();
        assert!(display.contains("[1009]"));
        assert!(display.contains("model rejected"));
        assert!(display.contains("rule 3 references 'stickyness'"));
        assert!(display.contains("Did you mean 'sticky'?"));
    }

    #[test]
    fn test_out_of_range_message() {
        let err = MamdaniError::out_of_range("water_level", -3.0, 0.0, 10.0);
        assert_eq!(err.code, ErrorCode::InputOutOfRange);
        assert!(err.message.contains("-3"));
        assert!(err.message.contains("[0, 10]"));
    }

    #[test]
    fn test_invalid_weight_message() {
        let err = MamdaniError::invalid_weight(0.0);
        assert_eq!(err.code, ErrorCode::InvalidWeight);
        assert!(err.message.contains("(0, 1]"));
    }

    #[test]
    fn test_code_description() {
        assert_eq!(ErrorCode::NoRuleFired.description(), "No rule fired");
        assert_eq!(ErrorCode::MissingInput.description(), "Missing input");
    }
}
