//! Local refinement by hill-climbing with a shrinking step

use super::{Objective, SearchResult};
use num_bigint::BigInt;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefineParams {
    pub step_init: u64,
    pub min_step: u64,
}

impl Default for RefineParams {
    fn default() -> Self {
        Self {
            step_init: 1_000_000,
            min_step: 1,
        }
    }
}

/// Walks `k ± step` while either side strictly improves, dividing the step by
/// ten whenever neither does. Stops once the step drops below `min_step` or the
/// error reaches zero.
pub fn hill_climb<O: Objective + ?Sized>(
    objective: &mut O,
    start: &BigInt,
    params: &RefineParams,
) -> SearchResult {
    let evaluation = objective.evaluate(start);
    let mut best = SearchResult::new(start.clone(), evaluation);
    let min_step = params.min_step.max(1);
    let mut step = params.step_init;
    let mut iteration: u64 = 0;

    while step >= min_step && !best.is_converged() {
        let mut improved = false;
        for delta in [BigInt::from(step), -BigInt::from(step)] {
            let trial_k = &best.k + delta;
            let trial = objective.evaluate(&trial_k);
            if trial.error < best.error {
                best = SearchResult::new(trial_k, trial);
                improved = true;
                trace!(iteration, k = %best.k, error = %best.error, step, "hill climb improved");
                break;
            }
        }
        if !improved {
            step /= 10;
        }
        iteration += 1;
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::objective::{RecoveryCache, SignatureObjective};
    use crate::search::testing::DistanceObjective;
    use crate::search::Objective;
    use crate::synthetic::forge_signature;
    use num_bigint::BigUint;
    use std::sync::Arc;

    #[test]
    fn test_converges_on_smooth_landscape() {
        let mut objective = DistanceObjective::new(123_456_789);
        let result = hill_climb(&mut objective, &BigInt::from(0), &RefineParams::default());
        assert!(result.is_converged());
        assert_eq!(result.k, BigInt::from(123_456_789));
    }

    #[test]
    fn test_handles_negative_direction() {
        let mut objective = DistanceObjective::new(-4_321);
        let params = RefineParams {
            step_init: 1_000,
            min_step: 1,
        };
        let result = hill_climb(&mut objective, &BigInt::from(10_000), &params);
        assert_eq!(result.k, BigInt::from(-4_321));
    }

    #[test]
    fn test_min_step_limits_resolution() {
        let mut objective = DistanceObjective::new(1_234);
        let params = RefineParams {
            step_init: 1_000,
            min_step: 100,
        };
        let result = hill_climb(&mut objective, &BigInt::from(0), &params);
        assert_eq!(result.k, BigInt::from(1_200));
        assert_eq!(result.error, BigUint::from(34u32));
    }

    #[test]
    fn test_starting_at_zero_error_does_not_move() {
        let mut objective = DistanceObjective::new(50);
        let result = hill_climb(&mut objective, &BigInt::from(50), &RefineParams::default());
        assert_eq!(result.k, BigInt::from(50));
        assert_eq!(objective.calls, 1);
    }

    #[test]
    fn test_correct_nonce_converges_immediately() {
        let secret = BigUint::from(0xC0FFEEu32);
        let nonce = BigUint::from(987_654_321u64);
        let sigs: Arc<[_]> = (0..3u32)
            .map(|i| forge_signature(&secret, &nonce, &BigUint::from(500 + i)).unwrap())
            .collect::<Vec<_>>()
            .into();
        let mut objective = SignatureObjective::new(sigs, RecoveryCache::new(32));

        let result = hill_climb(
            &mut objective,
            &BigInt::from(nonce.clone()),
            &RefineParams::default(),
        );
        assert!(result.is_converged());
        assert_eq!(result.k, BigInt::from(nonce));
        assert_eq!(result.private_key(), Some(&secret));
    }

    #[test]
    fn test_never_worse_than_start() {
        let secret = BigUint::from(31_337u32);
        let nonce = BigUint::from(271_828u32);
        let sigs: Arc<[_]> = (0..4u32)
            .map(|i| forge_signature(&secret, &nonce, &BigUint::from(9_000 + 13 * i)).unwrap())
            .collect::<Vec<_>>()
            .into();
        let mut objective = SignatureObjective::new(sigs, RecoveryCache::new(256));
        let params = RefineParams {
            step_init: 1_000,
            min_step: 1,
        };

        for start in [271_000i64, 5, -77_777] {
            let start = BigInt::from(start);
            let initial = objective.evaluate(&start).error;
            let result = hill_climb(&mut objective, &start, &params);
            assert!(result.error <= initial);
        }
    }
}
