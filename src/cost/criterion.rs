//! Optimization criteria and their weight vectors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::CostError;

/// What an optimized route should minimize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Criterion {
    Distance,
    Time,
    Cost,
    Emissions,
    #[default]
    Balanced,
}

impl Criterion {
    pub fn as_str(self) -> &'static str {
        match self {
            Criterion::Distance => "distance",
            Criterion::Time => "time",
            Criterion::Cost => "cost",
            Criterion::Emissions => "emissions",
            Criterion::Balanced => "balanced",
        }
    }

    /// Parse a criterion name; anything unrecognised means `Balanced`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "distance" => Criterion::Distance,
            "time" => Criterion::Time,
            "cost" => Criterion::Cost,
            "emissions" => Criterion::Emissions,
            _ => Criterion::Balanced,
        }
    }

    pub fn weights(self) -> CriterionWeights {
        CriterionWeights::for_criterion(self)
    }
}

impl From<String> for Criterion {
    fn from(raw: String) -> Self {
        Criterion::parse_lenient(&raw)
    }
}

impl FromStr for Criterion {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Criterion::parse_lenient(s))
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relative importance of each cost component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionWeights {
    pub distance: f64,
    pub time: f64,
    pub cost: f64,
    pub emissions: f64,
}

impl CriterionWeights {
    pub const fn new(distance: f64, time: f64, cost: f64, emissions: f64) -> Self {
        Self {
            distance,
            time,
            cost,
            emissions,
        }
    }

    pub fn for_criterion(criterion: Criterion) -> Self {
        match criterion {
            Criterion::Distance => Self::new(1.0, 0.0, 0.0, 0.0),
            Criterion::Time => Self::new(0.2, 0.8, 0.0, 0.0),
            Criterion::Cost => Self::new(0.2, 0.2, 0.6, 0.0),
            Criterion::Emissions => Self::new(0.2, 0.2, 0.0, 0.6),
            Criterion::Balanced => Self::new(0.3, 0.4, 0.2, 0.1),
        }
    }

    /// Rescale the time component by `1 / factor`.
    ///
    /// A factor below 1 strengthens the time preference, above 1 weakens it.
    pub fn with_time_factor(self, factor: f64) -> Result<Self, CostError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(CostError::InvalidFactor(factor));
        }
        Ok(Self {
            time: self.time / factor,
            ..self
        })
    }

    /// Stable fingerprint for cache keys.
    pub fn fingerprint(&self) -> [u64; 4] {
        [self.distance, self.time, self.cost, self.emissions].map(f64::to_bits)
    }
}

impl Default for CriterionWeights {
    fn default() -> Self {
        Self::for_criterion(Criterion::Balanced)
    }
}
