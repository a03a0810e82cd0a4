// ABOUTME: Unit tags and tagged quantities - every number carries its scale.
// ABOUTME: Values are never rescaled implicitly; mismatches surface as errors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Scale or dimension tag attached to a numeric value.
///
/// Two quantities are only interchangeable when their units are equal.
/// Nothing in this crate converts between scales.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Unit {
    /// Plain currency or count units, no scale prefix.
    Absolute,
    Thousands,
    Millions,
    Billions,
    Percent,
    /// Dimensionless factor (rates, years, ratios, coefficients).
    Scalar,
    /// Any other tag, e.g. "gw" or "usd_per_kwh". Stored lowercase.
    Other(String),
}

impl Unit {
    /// Canonical lowercase tag.
    pub fn as_str(&self) -> &str {
        match self {
            Unit::Absolute => "absolute",
            Unit::Thousands => "thousands",
            Unit::Millions => "millions",
            Unit::Billions => "billions",
            Unit::Percent => "percent",
            Unit::Scalar => "scalar",
            Unit::Other(tag) => tag,
        }
    }

    /// Whether values in this unit are pure factors rather than amounts.
    pub fn is_dimensionless(&self) -> bool {
        matches!(self, Unit::Scalar | Unit::Percent)
    }

    /// Multiplier relative to absolute units, for the scaled amount tags.
    pub fn scale(&self) -> Option<f64> {
        match self {
            Unit::Absolute => Some(1.0),
            Unit::Thousands => Some(1e3),
            Unit::Millions => Some(1e6),
            Unit::Billions => Some(1e9),
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Unit {
    fn from(tag: &str) -> Self {
        let tag = tag.trim().to_lowercase();
        match tag.as_str() {
            "absolute" | "units" | "" => Unit::Absolute,
            "thousands" => Unit::Thousands,
            "millions" => Unit::Millions,
            "billions" => Unit::Billions,
            "percent" | "%" => Unit::Percent,
            "scalar" | "ratio" => Unit::Scalar,
            _ => Unit::Other(tag),
        }
    }
}

impl From<String> for Unit {
    fn from(tag: String) -> Self {
        Unit::from(tag.as_str())
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.as_str().to_string()
    }
}

impl FromStr for Unit {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Unit::from(s))
    }
}

/// A numeric value with its unit tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: impl Into<Unit>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }

    pub fn scalar(value: f64) -> Self {
        Self::new(value, Unit::Scalar)
    }

    pub fn millions(value: f64) -> Self {
        Self::new(value, Unit::Millions)
    }

    /// Exact equality of value and unit, used when tracing literal values.
    pub fn is_literal(&self, other: &Quantity) -> bool {
        self.unit == other.unit && self.value.to_bits() == other.value.to_bits()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Return the shared unit of a set of quantities, or the first pair that disagrees.
pub fn common_unit<'a>(
    quantities: impl IntoIterator<Item = &'a Quantity>,
) -> Result<Option<Unit>, (Unit, Unit)> {
    let mut shared: Option<Unit> = None;
    for q in quantities {
        match &shared {
            None => shared = Some(q.unit.clone()),
            Some(unit) if *unit != q.unit => return Err((unit.clone(), q.unit.clone())),
            Some(_) => {}
        }
    }
    Ok(shared)
}
