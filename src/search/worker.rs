//! A single search worker: anneal globally, then refine locally

use super::anneal::{anneal, AnnealParams};
use super::hill_climb::{hill_climb, RefineParams};
use super::objective::{RecoveryCache, SignatureObjective};
use super::SearchResult;
use crate::signature::Signature;
use num_bigint::BigInt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerParams {
    pub anneal: AnnealParams,
    pub refine: RefineParams,
    pub cache_capacity: usize,
}

impl Default for WorkerParams {
    fn default() -> Self {
        Self {
            anneal: AnnealParams::default(),
            refine: RefineParams::default(),
            cache_capacity: 4096,
        }
    }
}

/// Runs one complete search from `start`. Owns its objective and RNG, so any
/// number of workers may run side by side.
pub fn run_worker(
    signatures: Arc<[Signature]>,
    start: BigInt,
    params: &WorkerParams,
    seed: u64,
) -> SearchResult {
    let mut objective =
        SignatureObjective::new(signatures, RecoveryCache::new(params.cache_capacity));
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let annealed = anneal(&mut objective, &start, &params.anneal, &mut rng);
    debug!(k = %annealed.k, error = %annealed.error, "annealing stage done");

    let refined = hill_climb(&mut objective, &annealed.k, &params.refine);
    debug!(
        k = %refined.k,
        error = %refined.error,
        cache_hits = objective.cache().hits(),
        cache_misses = objective.cache().misses(),
        "worker finished"
    );
    refined
}
