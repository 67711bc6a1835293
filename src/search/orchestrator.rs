//! Fans a search cycle out over a fresh worker pool and keeps the best result

use super::worker::{run_worker, WorkerParams};
use super::SearchResult;
use crate::error::SearchError;
use crate::signature::Signature;
use num_bigint::{BigInt, BigUint, RandBigInt};
use num_traits::Zero;
use rand::Rng;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::sync::Arc;
use tracing::debug;

pub struct Orchestrator {
    signatures: Arc<[Signature]>,
    params: WorkerParams,
    workers: usize,
    perturbation: BigUint,
}

impl Orchestrator {
    pub fn new(
        signatures: Arc<[Signature]>,
        params: WorkerParams,
        workers: usize,
        perturbation: BigUint,
    ) -> Self {
        Self {
            signatures,
            params,
            workers,
            perturbation,
        }
    }

    /// Runs every worker to completion and returns the lowest-error result.
    ///
    /// Each worker starts at `base` shifted by a uniform offset in
    /// `[-perturbation, perturbation]` and gets its own RNG seed; both are
    /// drawn from `rng` up front so a seeded cycle is reproducible.
    pub fn run_cycle<R: Rng + ?Sized>(
        &self,
        base: &BigInt,
        rng: &mut R,
    ) -> Result<SearchResult, SearchError> {
        if self.workers == 0 {
            return Err(SearchError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }

        let assignments: Vec<(BigInt, u64)> = (0..self.workers)
            .map(|_| (base + self.offset(rng), rng.gen::<u64>()))
            .collect();

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("search-worker-{i}"))
            .build()?;

        let results: Vec<SearchResult> = pool.install(|| {
            assignments
                .into_par_iter()
                .enumerate()
                .map(|(worker, (start, seed))| {
                    debug!(worker, start = %start, "worker dispatched");
                    run_worker(Arc::clone(&self.signatures), start, &self.params, seed)
                })
                .collect()
        });

        results
            .into_iter()
            .min_by(|a, b| a.error.cmp(&b.error))
            .ok_or_else(|| SearchError::InvalidConfig("no worker produced a result".to_string()))
    }

    fn offset<R: Rng + ?Sized>(&self, rng: &mut R) -> BigInt {
        if self.perturbation.is_zero() {
            return BigInt::zero();
        }
        let bound = BigInt::from(self.perturbation.clone());
        rng.gen_bigint_range(&-&bound, &(&bound + 1))
    }
}
