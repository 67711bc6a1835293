//! Global search by simulated annealing
//!
//! Each step draws `δ ~ N(0, T)`, moves to `k + δ` and applies the Metropolis
//! rule `exp(-(e_new - e_cur) / T)` directly to the raw integer errors. The
//! temperature cools geometrically, `T ← α·T`, once per iteration.

use super::{Objective, SearchResult};
use num_bigint::{BigInt, BigUint};
use num_traits::{FromPrimitive, ToPrimitive, Zero};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use tracing::{debug, trace};

const PROGRESS_INTERVAL: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealParams {
    pub t_init: f64,
    pub t_min: f64,
    pub alpha: f64,
    pub max_iter: u64,
}

impl Default for AnnealParams {
    fn default() -> Self {
        Self {
            t_init: 1e60,
            t_min: 1.0,
            alpha: 0.995,
            max_iter: 10_000,
        }
    }
}

pub fn anneal<O, R>(
    objective: &mut O,
    start: &BigInt,
    params: &AnnealParams,
    rng: &mut R,
) -> SearchResult
where
    O: Objective + ?Sized,
    R: Rng + ?Sized,
{
    let evaluation = objective.evaluate(start);
    let mut current = SearchResult::new(start.clone(), evaluation);
    let mut temperature = params.t_init;
    let mut iteration: u64 = 0;

    while temperature > params.t_min && iteration < params.max_iter && !current.is_converged() {
        let delta = perturbation(rng, temperature);
        let trial_k = &current.k + delta;
        let trial = objective.evaluate(&trial_k);

        if metropolis_accepts(&current.error, &trial.error, temperature, rng) {
            current = SearchResult::new(trial_k, trial);
        }

        if iteration % PROGRESS_INTERVAL == 0 {
            debug!(
                iteration,
                k = %current.k,
                error = %current.error,
                temperature,
                "annealing"
            );
        }
        if current.is_converged() {
            debug!(iteration, k = %current.k, "annealing reached zero error");
            break;
        }

        temperature *= params.alpha;
        iteration += 1;
    }

    trace!(iterations = iteration, error = %current.error, "annealing finished");
    current
}

/// Always takes an improvement; takes a worse trial with probability
/// `exp(-(trial - current) / T)`.
fn metropolis_accepts<R: Rng + ?Sized>(
    current: &BigUint,
    trial: &BigUint,
    temperature: f64,
    rng: &mut R,
) -> bool {
    if trial < current {
        return true;
    }
    let worsening = (trial - current).to_f64().unwrap_or(f64::INFINITY);
    rng.gen::<f64>() < (-worsening / temperature).exp()
}

/// Integer offset drawn from a normal distribution with standard deviation `temperature`.
fn perturbation<R: Rng + ?Sized>(rng: &mut R, temperature: f64) -> BigInt {
    let z: f64 = StandardNormal.sample(rng);
    BigInt::from_f64((z * temperature).trunc()).unwrap_or_else(BigInt::zero)
}
