use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

use serde::Deserialize;

use crate::errors::BenchError;
use crate::ulp::{is_ordinary_f32, is_ordinary_f64, ulp_distance_f32, ulp_distance_f64};

/// A floating-point width the harness can generate, evaluate and score.
///
/// `f32` is the narrow domain and `f64` the wide one. The ULP distance is
/// widened to `u64` so both domains share one aggregator.
pub trait Precision:
    Copy
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    /// Width of the bit pattern.
    const BITS: u32;
    /// Distance reported when exactly one side is NaN.
    const MAX_ERROR: u64;
    const ONE: Self;

    /// Reinterpret the low `BITS` bits of `bits` as a value.
    fn from_bits_u64(bits: u64) -> Self;
    /// Round a wide reference result into this domain.
    fn from_f64(x: f64) -> Self;
    fn to_f64(self) -> f64;

    fn ulp_distance(self, other: Self) -> u64;
    fn is_ordinary(self) -> bool;

    fn sqrt(self) -> Self;
    fn hypot(self, other: Self) -> Self;
    fn mul_add(self, a: Self, b: Self) -> Self;
}

impl Precision for f32 {
    const BITS: u32 = 32;
    const MAX_ERROR: u64 = u32::MAX as u64;
    const ONE: Self = 1.0;

    fn from_bits_u64(bits: u64) -> Self {
        f32::from_bits(bits as u32)
    }

    fn from_f64(x: f64) -> Self {
        x as f32
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn ulp_distance(self, other: Self) -> u64 {
        u64::from(ulp_distance_f32(self, other))
    }

    fn is_ordinary(self) -> bool {
        is_ordinary_f32(self)
    }

    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }

    fn hypot(self, other: Self) -> Self {
        f32::hypot(self, other)
    }

    fn mul_add(self, a: Self, b: Self) -> Self {
        f32::mul_add(self, a, b)
    }
}

impl Precision for f64 {
    const BITS: u32 = 64;
    const MAX_ERROR: u64 = u64::MAX;
    const ONE: Self = 1.0;

    fn from_bits_u64(bits: u64) -> Self {
        f64::from_bits(bits)
    }

    fn from_f64(x: f64) -> Self {
        x
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn ulp_distance(self, other: Self) -> u64 {
        ulp_distance_f64(self, other)
    }

    fn is_ordinary(self) -> bool {
        is_ordinary_f64(self)
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn hypot(self, other: Self) -> Self {
        f64::hypot(self, other)
    }

    fn mul_add(self, a: Self, b: Self) -> Self {
        f64::mul_add(self, a, b)
    }
}

/// Built-in function under test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubjectName {
    #[default]
    SqrtDiff,
    Hypot,
    Fma,
}

impl SubjectName {
    pub fn as_str(self) -> &'static str {
        match self {
            SubjectName::SqrtDiff => "sqrt-diff",
            SubjectName::Hypot => "hypot",
            SubjectName::Fma => "fma",
        }
    }
}

impl fmt::Display for SubjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectName {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "sqrt-diff" => Ok(SubjectName::SqrtDiff),
            "hypot" => Ok(SubjectName::Hypot),
            "fma" => Ok(SubjectName::Fma),
            other => Err(BenchError::UnknownSubject {
                name: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(BenchError::InvalidSetting {
                key: "format",
                value: other.to_string(),
            }),
        }
    }
}
