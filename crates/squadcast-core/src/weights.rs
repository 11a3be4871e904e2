// Sub-score keys and the weight vector that combines them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One component of a player's utility score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubScore {
    #[serde(alias = "base")]
    Historical,
    Form,
    Fixtures,
    Value,
    Ownership,
    Expected,
    Consistency,
    Elite,
    SetPieces,
    TeamQuality,
}

impl SubScore {
    pub const ALL: [SubScore; 10] = [
        SubScore::Historical,
        SubScore::Form,
        SubScore::Fixtures,
        SubScore::Value,
        SubScore::Ownership,
        SubScore::Expected,
        SubScore::Consistency,
        SubScore::Elite,
        SubScore::SetPieces,
        SubScore::TeamQuality,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SubScore::Historical => "historical",
            SubScore::Form => "form",
            SubScore::Fixtures => "fixtures",
            SubScore::Value => "value",
            SubScore::Ownership => "ownership",
            SubScore::Expected => "expected",
            SubScore::Consistency => "consistency",
            SubScore::Elite => "elite",
            SubScore::SetPieces => "set_pieces",
            SubScore::TeamQuality => "team_quality",
        }
    }

    /// Parse a configuration key. `base` is accepted for `historical`.
    pub fn from_key(key: &str) -> Option<SubScore> {
        match key {
            "base" => Some(SubScore::Historical),
            other => SubScore::ALL.into_iter().find(|k| k.key() == other),
        }
    }
}

impl fmt::Display for SubScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// WeightVector
// ---------------------------------------------------------------------------

/// Non-negative weights per sub-score. Keys that are absent weigh nothing.
/// Weights need not sum to one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct WeightVector(BTreeMap<SubScore, f64>);

impl TryFrom<BTreeMap<String, f64>> for WeightVector {
    type Error = String;

    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut weights = BTreeMap::new();
        for (key, weight) in raw {
            let sub = SubScore::from_key(&key).ok_or_else(|| format!("unknown sub-score `{key}`"))?;
            weights.insert(sub, weight);
        }
        Ok(WeightVector(weights))
    }
}

impl From<WeightVector> for BTreeMap<String, f64> {
    fn from(weights: WeightVector) -> Self {
        weights.0.into_iter().map(|(k, w)| (k.key().to_string(), w)).collect()
    }
}

impl WeightVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: SubScore, weight: f64) -> Self {
        self.0.insert(key, weight);
        self
    }

    /// A vector that weighs a single sub-score at 1.0.
    pub fn single(key: SubScore) -> Self {
        Self::new().with(key, 1.0)
    }

    pub fn get(&self, key: SubScore) -> f64 {
        self.0.get(&key).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SubScore, f64)> + '_ {
        self.0.iter().map(|(&k, &w)| (k, w))
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|&w| w == 0.0)
    }

    /// First key whose weight is negative or not finite.
    pub fn first_invalid(&self) -> Option<(SubScore, f64)> {
        self.iter().find(|&(_, w)| !w.is_finite() || w < 0.0)
    }
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPreset {
    /// In-season selection anchored on past seasons.
    #[default]
    Historical,
    /// Heavier reliance on the historical base, little on short-term signals.
    Advanced,
    /// Before the season starts: history, consistency and set pieces.
    Preseason,
    /// Weights supplied in configuration.
    Custom,
}

impl ScoringPreset {
    /// Weights for the preset. `Custom` has none of its own.
    pub fn weights(self) -> WeightVector {
        match self {
            ScoringPreset::Historical => WeightVector::new()
                .with(SubScore::Historical, 0.40)
                .with(SubScore::Form, 0.15)
                .with(SubScore::Fixtures, 0.20)
                .with(SubScore::Value, 0.15)
                .with(SubScore::Ownership, 0.02)
                .with(SubScore::Expected, 0.08),
            ScoringPreset::Advanced => WeightVector::new()
                .with(SubScore::Historical, 0.70)
                .with(SubScore::Form, 0.05)
                .with(SubScore::Fixtures, 0.10)
                .with(SubScore::Value, 0.10)
                .with(SubScore::Ownership, 0.03)
                .with(SubScore::Expected, 0.02),
            ScoringPreset::Preseason => WeightVector::new()
                .with(SubScore::Historical, 0.50)
                .with(SubScore::Consistency, 0.15)
                .with(SubScore::Elite, 0.10)
                .with(SubScore::Fixtures, 0.10)
                .with(SubScore::SetPieces, 0.10)
                .with(SubScore::TeamQuality, 0.05),
            ScoringPreset::Custom => WeightVector::new(),
        }
    }
}
