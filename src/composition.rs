//! Card-draw probabilities per temperature bucket.
//!
//! The table is estimated offline by dealing many shoes and recording which
//! rank comes out at each temperature, then persisted as a flat
//! `[10 buckets][10 ranks]` f64 array. Rows are validated on every load.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::artifact::{read_f64s, write_f64s};
use crate::config::SamplerConfig;
use crate::deck::{rank_index, Shoe, NUM_RANKS};
use crate::error::{BjError, BjResult};
use crate::state::NUM_TEMPERATURES;

/// Allowed deviation of a row sum from 1.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

pub const TABLE_LEN: usize = NUM_TEMPERATURES * NUM_RANKS;

// ---------------------------------------------------------------------------
// Card distribution
// ---------------------------------------------------------------------------

/// Probability of drawing each rank 1..=10.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardDistribution([f64; NUM_RANKS]);

impl CardDistribution {
    /// Infinite-deck odds: 1/13 per rank, 4/13 for the ten-valued cards.
    pub fn uniform() -> Self {
        let mut p = [1.0 / 13.0; NUM_RANKS];
        p[NUM_RANKS - 1] = 4.0 / 13.0;
        CardDistribution(p)
    }

    pub fn new(probabilities: [f64; NUM_RANKS]) -> BjResult<Self> {
        validate_row(0, &probabilities)?;
        Ok(CardDistribution(probabilities))
    }

    #[inline]
    pub fn probability(&self, rank: u8) -> f64 {
        self.0[rank as usize - 1]
    }

    /// `(rank, probability)` for ranks 1..=10.
    pub fn iter(&self) -> impl Iterator<Item = (u8, f64)> + Clone + '_ {
        self.0.iter().enumerate().map(|(i, &p)| (i as u8 + 1, p))
    }

    pub fn as_array(&self) -> &[f64; NUM_RANKS] {
        &self.0
    }
}

fn validate_row(row: usize, probabilities: &[f64]) -> BjResult<()> {
    if let Some((rank, p)) = probabilities
        .iter()
        .enumerate()
        .find(|(_, p)| !p.is_finite() || **p < 0.0)
    {
        return Err(BjError::InvalidTable {
            row,
            reason: format!("rank {} has probability {}", rank + 1, p),
        });
    }
    let sum: f64 = probabilities.iter().sum();
    if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(BjError::InvalidTable {
            row,
            reason: format!("row sums to {:.9}", sum),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DeckCompositionTable {
    rows: [CardDistribution; NUM_TEMPERATURES],
}

impl DeckCompositionTable {
    /// Every bucket draws with infinite-deck odds.
    pub fn uniform() -> Self {
        DeckCompositionTable {
            rows: [CardDistribution::uniform(); NUM_TEMPERATURES],
        }
    }

    pub fn from_rows(rows: [[f64; NUM_RANKS]; NUM_TEMPERATURES]) -> BjResult<Self> {
        for (t, row) in rows.iter().enumerate() {
            validate_row(t, row)?;
        }
        Ok(DeckCompositionTable {
            rows: rows.map(CardDistribution),
        })
    }

    /// Row-major `[temperature][rank]` values.
    pub fn from_flat(values: &[f64]) -> BjResult<Self> {
        if values.len() != TABLE_LEN {
            return Err(BjError::TableShape {
                expected: TABLE_LEN,
                got: values.len(),
            });
        }
        let mut rows = [[0.0; NUM_RANKS]; NUM_TEMPERATURES];
        for (t, chunk) in values.chunks_exact(NUM_RANKS).enumerate() {
            rows[t].copy_from_slice(chunk);
        }
        Self::from_rows(rows)
    }

    pub fn to_flat(&self) -> Vec<f64> {
        self.rows.iter().flat_map(|r| r.0.iter().copied()).collect()
    }

    #[inline]
    pub fn row(&self, temperature: u8) -> &CardDistribution {
        &self.rows[temperature as usize]
    }

    pub fn load(path: &Path) -> BjResult<Self> {
        Self::from_flat(&read_f64s(path)?)
    }

    pub fn save(&self, path: &Path) -> BjResult<()> {
        write_f64s(path, &self.to_flat())
    }

    /// Monte-Carlo estimate of the table from repeated shoe draws.
    ///
    /// Sampling is split into `chunks` shoes seeded from `seed`, dealt in
    /// parallel, and merged. Counts are integers, so the result does not
    /// depend on thread scheduling.
    pub fn estimate(config: &SamplerConfig) -> BjResult<CompositionEstimate> {
        config.validate()?;

        let chunks = config.chunks as u64;
        let per_chunk = config.draws / chunks;
        let extra = config.draws % chunks;
        let per_shoe = config.draws_per_shoe();

        let mut seeder = StdRng::seed_from_u64(config.seed);
        let seeds: Vec<u64> = (0..chunks).map(|_| seeder.gen()).collect();

        let partials: Vec<[[u64; NUM_RANKS]; NUM_TEMPERATURES]> = seeds
            .into_par_iter()
            .enumerate()
            .map(|(i, seed)| {
                let draws = per_chunk + u64::from((i as u64) < extra);
                sample_chunk(config.decks, per_shoe, draws, seed)
            })
            .collect();

        let mut counts = [[0u64; NUM_RANKS]; NUM_TEMPERATURES];
        for partial in &partials {
            for (t, row) in partial.iter().enumerate() {
                for (r, &c) in row.iter().enumerate() {
                    counts[t][r] += c;
                }
            }
        }

        let mut rows = [[0.0; NUM_RANKS]; NUM_TEMPERATURES];
        let mut bucket_draws = [0u64; NUM_TEMPERATURES];
        for (t, row) in counts.iter().enumerate() {
            let total: u64 = row.iter().sum();
            if total == 0 {
                return Err(BjError::EmptyBucket(t));
            }
            bucket_draws[t] = total;
            for (r, &c) in row.iter().enumerate() {
                rows[t][r] = c as f64 / total as f64;
            }
        }

        Ok(CompositionEstimate {
            table: Self::from_rows(rows)?,
            bucket_draws,
        })
    }
}

/// Sampler output: the table plus how many draws landed in each bucket.
#[derive(Debug, Clone)]
pub struct CompositionEstimate {
    pub table: DeckCompositionTable,
    pub bucket_draws: [u64; NUM_TEMPERATURES],
}

fn sample_chunk(
    decks: u32,
    per_shoe: usize,
    draws: u64,
    seed: u64,
) -> [[u64; NUM_RANKS]; NUM_TEMPERATURES] {
    let mut counts = [[0u64; NUM_RANKS]; NUM_TEMPERATURES];
    let mut shoe = Shoe::new(decks, seed);
    let mut dealt = 0usize;

    for _ in 0..draws {
        let t = shoe.temperature() as usize;
        let card = shoe.draw();
        // Shoe only yields ranks 1..=10.
        if let Ok(r) = rank_index(card) {
            counts[t][r] += 1;
        }
        dealt += 1;
        if dealt >= per_shoe {
            shoe.reset();
            dealt = 0;
        }
    }
    counts
}
