//! Solver, search, table and sampler parameters.
//!
//! Every struct deserializes with defaults for missing fields, so a JSON
//! config file only needs the keys it overrides. CLI flags are applied on
//! top of a loaded file.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::dealer::DealerRule;
use crate::error::{BjError, BjResult};

/// How a value-iteration sweep applies its updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SweepMode {
    /// Gauss-Seidel: states updated in sweep order, later states read the
    /// values written earlier in the same sweep.
    #[default]
    InPlace,
    /// Jacobi: every state reads the previous sweep's values. Computed in
    /// parallel into a second buffer.
    Synchronous,
}

impl SweepMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SweepMode::InPlace => "in-place",
            SweepMode::Synchronous => "synchronous",
        }
    }
}

// ---------------------------------------------------------------------------
// Value iteration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Add the temperature axis and draw cards from the composition table.
    pub counting_enabled: bool,
    /// A winning natural pays 3:2.
    pub natural_bonus: bool,
    /// Dealer counts an ace as 11 when it fits and stands on soft 17.
    /// Off means the hard-total approximation (aces always 1).
    pub dealer_soft_stand_17: bool,
    pub theta: f64,
    pub max_sweeps: usize,
    pub sweep: SweepMode,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            counting_enabled: false,
            natural_bonus: false,
            dealer_soft_stand_17: false,
            theta: 1e-4,
            max_sweeps: 1000,
            sweep: SweepMode::InPlace,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> BjResult<()> {
        if !(self.theta > 0.0 && self.theta.is_finite()) {
            return Err(BjError::InvalidValue(format!(
                "theta must be positive, got {}",
                self.theta
            )));
        }
        if self.max_sweeps == 0 {
            return Err(BjError::InvalidValue(
                "max_sweeps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn dealer_rule(&self) -> DealerRule {
        if self.dealer_soft_stand_17 {
            DealerRule::StandSoft17
        } else {
            DealerRule::HardTotals
        }
    }

    /// Payout multiplier applied to a winning natural.
    pub fn natural_multiplier(&self) -> f64 {
        if self.natural_bonus {
            1.5
        } else {
            1.0
        }
    }

    pub fn load(path: &Path) -> BjResult<Self> {
        let config: SolverConfig = load_json(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> BjResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tree search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Playouts per decision.
    pub iterations: usize,
    /// UCT exploration constant C.
    pub exploration: f64,
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            iterations: 1000,
            exploration: 1.41,
            seed: 0,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> BjResult<()> {
        if self.iterations == 0 {
            return Err(BjError::InvalidValue(
                "search needs at least one iteration".to_string(),
            ));
        }
        if !(self.exploration >= 0.0 && self.exploration.is_finite()) {
            return Err(BjError::InvalidValue(format!(
                "exploration constant must be non-negative, got {}",
                self.exploration
            )));
        }
        Ok(())
    }

    pub fn load(path: &Path) -> BjResult<Self> {
        let config: SearchConfig = load_json(path)?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Table environment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub decks: u32,
    /// Fraction of the shoe dealt before a reshuffle between rounds.
    pub penetration: f64,
    pub natural_bonus: bool,
    /// Report the shoe temperature in observations.
    pub counting: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            decks: 6,
            penetration: 0.7,
            natural_bonus: false,
            counting: true,
        }
    }
}

impl TableConfig {
    pub fn validate(&self) -> BjResult<()> {
        validate_shoe(self.decks, self.penetration)
    }
}

// ---------------------------------------------------------------------------
// Composition sampler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub decks: u32,
    pub penetration: f64,
    /// Total cards drawn across all chunks.
    pub draws: u64,
    pub seed: u64,
    /// Independently seeded shoes sampled in parallel.
    pub chunks: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            decks: 6,
            penetration: 0.7,
            draws: 1_000_000,
            seed: 0,
            chunks: 16,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> BjResult<()> {
        validate_shoe(self.decks, self.penetration)?;
        if self.chunks == 0 {
            return Err(BjError::InvalidValue(
                "chunks must be at least 1".to_string(),
            ));
        }
        if self.draws < self.chunks as u64 {
            return Err(BjError::InvalidValue(format!(
                "need at least one draw per chunk ({} draws, {} chunks)",
                self.draws, self.chunks
            )));
        }
        Ok(())
    }

    /// Cards dealt from one shoe before it is replaced: the shoe is
    /// swapped once the count passes the penetration cut, so one card past
    /// the cut is dealt, never more than the shoe holds.
    pub fn draws_per_shoe(&self) -> usize {
        let size = self.decks as usize * 52;
        let cut = (self.decks as f64 * 52.0 * self.penetration).floor() as usize;
        (cut + 1).min(size)
    }
}

fn validate_shoe(decks: u32, penetration: f64) -> BjResult<()> {
    if decks == 0 {
        return Err(BjError::InvalidValue(
            "shoe needs at least one deck".to_string(),
        ));
    }
    if !(penetration > 0.0 && penetration <= 1.0) {
        return Err(BjError::InvalidValue(format!(
            "penetration must be in (0, 1], got {}",
            penetration
        )));
    }
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> BjResult<T> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
