//! Outer convergence loop: orchestrate, record, re-seed, repeat

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::search::{History, Orchestrator, Predictor, SearchResult};
use crate::signature::Signature;
use crate::synthetic::public_key_hex;
use num_bigint::{BigInt, BigUint};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// A one-signature set is trivially consistent, so at least two are needed.
pub const MIN_SIGNATURES: usize = 2;

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: u64,
    pub result: SearchResult,
    pub elapsed: Duration,
}

/// Outcome of a converged campaign.
#[derive(Debug, Clone)]
pub struct Recovery {
    pub k: BigInt,
    pub private_key: BigUint,
    pub public_key: Option<String>,
    pub cycles: u64,
    pub elapsed: Duration,
}

pub struct Campaign {
    orchestrator: Orchestrator,
    predictor: Predictor,
    history: History,
    rng: ChaCha8Rng,
    base: BigInt,
    best: Option<SearchResult>,
    cycles: u64,
    max_cycles: Option<u64>,
    started: Instant,
}

impl Campaign {
    pub fn new(signatures: Vec<Signature>, config: &SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        if signatures.len() < MIN_SIGNATURES {
            return Err(SearchError::TooFewSignatures {
                required: MIN_SIGNATURES,
                actual: signatures.len(),
            });
        }

        let signatures: Arc<[Signature]> = signatures.into();
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(Self {
            orchestrator: Orchestrator::new(
                signatures,
                config.worker_params(),
                config.workers,
                config.perturbation.clone(),
            ),
            predictor: Predictor::new(config.radius.clone(), config.samples),
            history: History::new(),
            rng,
            base: config.initial_k.clone(),
            best: None,
            cycles: 0,
            max_cycles: config.max_cycles,
            started: Instant::now(),
        })
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Candidate the next cycle will start from.
    pub fn base(&self) -> &BigInt {
        &self.base
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Runs one orchestration cycle, records it, and re-seeds the next base
    /// candidate unless the cycle converged.
    pub fn run_cycle(&mut self) -> Result<CycleReport, SearchError> {
        let result = self.orchestrator.run_cycle(&self.base, &mut self.rng)?;
        self.cycles += 1;
        self.history.record(result.k.clone(), result.error.clone());

        let elapsed = self.started.elapsed();
        info!(
            cycle = self.cycles,
            k = %result.k,
            error = %result.error,
            elapsed_secs = elapsed.as_secs_f64(),
            "cycle finished"
        );

        if self.best.as_ref().map_or(true, |b| result.error < b.error) {
            self.best = Some(result.clone());
        }
        if !result.is_converged() {
            self.base = self.predictor.propose(&result.k, &self.history);
        }

        Ok(CycleReport {
            cycle: self.cycles,
            result,
            elapsed,
        })
    }

    /// Cycles until a zero-error candidate turns up. Without `max_cycles` this
    /// only returns on success or on a worker pool failure.
    pub fn run(&mut self) -> Result<Recovery, SearchError> {
        loop {
            let report = self.run_cycle()?;
            let converged_key = if report.result.is_converged() {
                report.result.private_key().cloned()
            } else {
                None
            };
            if let Some(private_key) = converged_key {
                info!(
                    cycles = self.cycles,
                    private_key = %private_key,
                    "zero-error candidate found"
                );
                return Ok(Recovery {
                    public_key: public_key_hex(&private_key),
                    k: report.result.k,
                    private_key,
                    cycles: self.cycles,
                    elapsed: report.elapsed,
                });
            }

            if self.max_cycles.is_some_and(|max| self.cycles >= max) {
                let best = self.best.clone().unwrap_or(report.result);
                return Err(SearchError::Exhausted {
                    cycles: self.cycles,
                    best: Box::new(best),
                });
            }
        }
    }
}
