//! Membership degrees and triangular membership functions
//!
//! The two value types at the bottom of the inference pipeline:
//! - `Degree` - a fuzzy truth value in [0, 1] with the Zadeh operators
//! - `Triangle` - a validated triangular membership function

use crate::error::{MamdaniError, MamdaniResult};

/// A membership degree in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Degree(f64);

impl Degree {
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Fuzzy NOT (complement)
    pub fn not(&self) -> Self {
        Self::new(1.0 - self.0)
    }

    /// Fuzzy AND - minimum
    pub fn and(&self, other: &Self) -> Self {
        Self::new(self.0.min(other.0))
    }

    /// Fuzzy OR - maximum
    pub fn or(&self, other: &Self) -> Self {
        Self::new(self.0.max(other.0))
    }

    /// Scale by a rule weight in (0, 1]
    pub fn weighted(&self, weight: f64) -> Self {
        Self::new(self.0 * weight)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl Default for Degree {
    fn default() -> Self {
        Self(0.0)
    }
}

impl From<f64> for Degree {
    fn from(v: f64) -> Self {
        Self::new(v)
    }
}

/// A triangular membership function with feet at `a` and `c` and peak at `b`
///
/// Parameters are validated once at construction (`a <= b <= c`, all finite)
/// and the triangle is immutable afterwards. Degenerate spans are legal:
/// `a == b` gives a step up at the left foot, `b == c` a step down at the
/// right foot, and `a == b == c` a singleton spike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    a: f64,
    b: f64,
    c: f64,
}

impl Triangle {
    pub fn new(a: f64, b: f64, c: f64) -> MamdaniResult<Self> {
        if !(a.is_finite() && b.is_finite() && c.is_finite()) {
            return Err(MamdaniError::membership(format!(
                "Triangle parameters must be finite, got ({}, {}, {})",
                a, b, c
            )));
        }
        if !(a <= b && b <= c) {
            return Err(MamdaniError::membership(format!(
                "Triangle parameters must satisfy a <= b <= c, got ({}, {}, {})",
                a, b, c
            )));
        }
        Ok(Self { a, b, c })
    }

    /// Left foot
    pub fn a(&self) -> f64 {
        self.a
    }

    /// Peak
    pub fn b(&self) -> f64 {
        self.b
    }

    /// Right foot
    pub fn c(&self) -> f64 {
        self.c
    }

    /// Evaluate membership for a crisp value
    ///
    /// Zero outside [a, c], exactly 1 at the peak, linear on both edges.
    /// The peak check comes first so degenerate edges never divide by zero.
    pub fn evaluate(&self, x: f64) -> Degree {
        let result = if x < self.a || x > self.c {
            0.0
        } else if x == self.b {
            1.0
        } else if x < self.b {
            (x - self.a) / (self.b - self.a)
        } else {
            (self.c - x) / (self.c - self.b)
        };
        Degree::new(result)
    }
}
