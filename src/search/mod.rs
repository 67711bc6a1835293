//! Search engine: objective, local and global search, worker fan-out and restarts

use num_bigint::{BigInt, BigUint};
use num_traits::Zero;

pub mod anneal;
pub mod hill_climb;
pub mod objective;
pub mod orchestrator;
pub mod predictor;
pub mod worker;

pub use anneal::{anneal, AnnealParams};
pub use hill_climb::{hill_climb, RefineParams};
pub use objective::{RecoveryCache, SignatureObjective};
pub use orchestrator::Orchestrator;
pub use predictor::{History, HistoryEntry, Predictor};
pub use worker::{run_worker, WorkerParams};

/// Maps a candidate nonce to an error score; both search procedures drive one.
pub trait Objective {
    fn evaluate(&mut self, k: &BigInt) -> Evaluation;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub error: BigUint,
    pub recovered: Vec<BigUint>,
}

/// Candidate together with its score, as returned by every search stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub k: BigInt,
    pub error: BigUint,
    pub recovered: Vec<BigUint>,
}

impl SearchResult {
    pub fn new(k: BigInt, evaluation: Evaluation) -> Self {
        Self {
            k,
            error: evaluation.error,
            recovered: evaluation.recovered,
        }
    }

    pub fn is_converged(&self) -> bool {
        self.error.is_zero()
    }

    /// First recovered value; meaningful once the result has converged.
    pub fn private_key(&self) -> Option<&BigUint> {
        self.recovered.first()
    }
}
