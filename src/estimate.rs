//! Cost estimate from measured totals.
//!
//! Mowing is priced per square unit of area, edging per linear unit of
//! perimeter. Their sum is scaled by a site-complexity multiplier and a flat
//! service fee is added on top.

#[cfg(test)]
#[path = "estimate_test.rs"]
mod estimate_test;

use serde::{Deserialize, Serialize};

use crate::metrics::Totals;

/// Pricing rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rates {
    /// Mowing price per square unit.
    pub price_per_sq_ft: f64,
    /// Edging price per linear unit.
    pub price_per_lin_ft: f64,
    /// Flat fee added to every bid.
    pub service_fee: f64,
}

impl Default for Rates {
    fn default() -> Self {
        Self { price_per_sq_ft: 0.025, price_per_lin_ft: 0.05, service_fee: 25.0 }
    }
}

/// How hard the site is to work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    #[default]
    Simple,
    Moderate,
    Complex,
}

impl Complexity {
    /// Labor multiplier.
    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Simple => 1.0,
            Self::Moderate => 1.15,
            Self::Complex => 1.3,
        }
    }
}

impl std::str::FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "moderate" => Ok(Self::Moderate),
            "complex" => Ok(Self::Complex),
            other => Err(format!("unknown complexity '{other}' (expected simple, moderate or complex)")),
        }
    }
}

/// A priced bid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    /// Area and perimeter cost after the complexity multiplier.
    pub labor_cost: f64,
    pub service_fee: f64,
    /// `labor_cost + service_fee`.
    pub total: f64,
}

impl Estimate {
    #[must_use]
    pub fn compute(totals: Totals, rates: Rates, complexity: Complexity) -> Self {
        let labor_cost = (totals.area * rates.price_per_sq_ft + totals.perimeter * rates.price_per_lin_ft)
            * complexity.multiplier();
        Self { labor_cost, service_fee: rates.service_fee, total: labor_cost + rates.service_fee }
    }
}
