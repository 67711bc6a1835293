//! Objective evaluation over a fixed signature set

use super::{Evaluation, Objective};
use crate::math::{curve_order, mod_inverse, recover_with_inverse, reduce_mod};
use crate::signature::Signature;
use lru::LruCache;
use num_bigint::{BigInt, BigUint};
use num_traits::Zero;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Memo of private-key recoveries, keyed by signature index and reduced nonce.
///
/// The signature set behind an objective never changes, so the index stands in
/// for the `(r, s, z)` triple. A capacity of zero disables caching.
pub struct RecoveryCache {
    entries: Option<LruCache<(usize, BigUint), Option<BigUint>>>,
    hits: u64,
    misses: u64,
}

impl RecoveryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
            hits: 0,
            misses: 0,
        }
    }

    pub fn disabled() -> Self {
        Self::new(0)
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    fn get_or_compute(
        &mut self,
        index: usize,
        k: &BigUint,
        compute: impl FnOnce() -> Option<BigUint>,
    ) -> Option<BigUint> {
        let Some(entries) = self.entries.as_mut() else {
            self.misses += 1;
            return compute();
        };

        let key = (index, k.clone());
        if let Some(found) = entries.get(&key) {
            self.hits += 1;
            return found.clone();
        }

        self.misses += 1;
        let value = compute();
        entries.put(key, value.clone());
        value
    }
}

/// Scores a candidate nonce by how far apart the per-signature private keys land.
pub struct SignatureObjective {
    signatures: Arc<[Signature]>,
    // r⁻¹ per signature; `None` marks an r that shares a factor with n
    r_inverses: Vec<Option<BigUint>>,
    order: BigUint,
    cache: RecoveryCache,
}

impl SignatureObjective {
    pub fn new(signatures: Arc<[Signature]>, cache: RecoveryCache) -> Self {
        let order = curve_order();
        let r_inverses = signatures
            .iter()
            .map(|sig| mod_inverse(&sig.r, &order))
            .collect();
        Self {
            signatures,
            r_inverses,
            order,
            cache,
        }
    }

    pub fn cache(&self) -> &RecoveryCache {
        &self.cache
    }

    /// Private key implied by signature `index` under nonce `k` (already reduced).
    fn recover(&mut self, index: usize, k: &BigUint) -> Option<BigUint> {
        let sig = &self.signatures[index];
        let r_inv = self.r_inverses[index].as_ref()?;
        let order = &self.order;
        self.cache.get_or_compute(index, k, || {
            recover_with_inverse(r_inv, &sig.s, &sig.z, k, order)
        })
    }
}

impl Objective for SignatureObjective {
    fn evaluate(&mut self, k: &BigInt) -> Evaluation {
        let k_mod = reduce_mod(k, &self.order);
        let mut recovered = Vec::with_capacity(self.signatures.len());
        for i in 0..self.signatures.len() {
            let d = self.recover(i, &k_mod);
            recovered.push(d.unwrap_or_else(|| self.order.clone()));
        }

        let mut error = pairwise_error(&recovered);
        if error.is_zero() && !is_consistent(&recovered, &self.order) {
            // every recovery failed; agreement on the sentinel is not a solution
            error = self.order.clone();
        }
        Evaluation { error, recovered }
    }
}

/// Sum of `|a_i - a_j|` over all unordered pairs.
pub fn pairwise_error(values: &[BigUint]) -> BigUint {
    let mut total = BigUint::zero();
    for (i, a) in values.iter().enumerate() {
        for b in &values[i + 1..] {
            if a >= b {
                total += a - b;
            } else {
                total += b - a;
            }
        }
    }
    total
}

/// True when every value agrees and none is the invalid-recovery sentinel.
pub fn is_consistent(values: &[BigUint], sentinel: &BigUint) -> bool {
    match values.first() {
        Some(first) => first != sentinel && values.iter().all(|v| v == first),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::forge_signature;

    fn big(v: u64) -> BigUint {
        BigUint::from(v)
    }

    fn shared_nonce_set(secret: u64, nonce: u64, count: u64) -> Arc<[Signature]> {
        (0..count)
            .map(|i| forge_signature(&big(secret), &big(nonce), &big(1_000 + 77 * i)).unwrap())
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_correct_nonce_recovers_secret() {
        let sigs = shared_nonce_set(424242, 9_999_991, 3);
        let mut objective = SignatureObjective::new(sigs, RecoveryCache::new(64));
        let eval = objective.evaluate(&BigInt::from(9_999_991u64));
        assert!(eval.error.is_zero());
        assert_eq!(eval.recovered, vec![big(424242); 3]);
        assert!(is_consistent(&eval.recovered, &curve_order()));
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let sigs = shared_nonce_set(5, 31337, 4);
        let k = BigInt::from(123_456_789u64);
        let mut cached = SignatureObjective::new(sigs.clone(), RecoveryCache::new(64));
        let mut uncached = SignatureObjective::new(sigs, RecoveryCache::disabled());

        let first = cached.evaluate(&k);
        let second = cached.evaluate(&k);
        let third = uncached.evaluate(&k);
        assert_eq!(first, second);
        assert_eq!(first, third);
    }

    #[test]
    fn test_cache_serves_repeated_queries() {
        let sigs = shared_nonce_set(77, 1001, 3);
        let mut objective = SignatureObjective::new(sigs, RecoveryCache::new(64));
        let k = BigInt::from(4242u32);

        objective.evaluate(&k);
        assert_eq!(objective.cache().misses(), 3);
        assert_eq!(objective.cache().hits(), 0);

        objective.evaluate(&k);
        assert_eq!(objective.cache().misses(), 3);
        assert_eq!(objective.cache().hits(), 3);
    }

    #[test]
    fn test_candidate_reduced_modulo_order() {
        let sigs = shared_nonce_set(99, 1234, 3);
        let mut objective = SignatureObjective::new(sigs, RecoveryCache::disabled());
        let n = BigInt::from(curve_order());

        let base = objective.evaluate(&BigInt::from(1234));
        let wrapped = objective.evaluate(&(BigInt::from(1234) + &n * 3));
        let negative = objective.evaluate(&(BigInt::from(1234) - &n));
        assert_eq!(base, wrapped);
        assert_eq!(base, negative);
        assert!(base.error.is_zero());
    }

    #[test]
    fn test_invalid_recovery_uses_sentinel() {
        let n = curve_order();
        let sigs: Arc<[Signature]> = vec![
            Signature::new(big(0), big(5), big(7)),
            Signature::new(big(0), big(9), big(11)),
        ]
        .into();
        let mut objective = SignatureObjective::new(sigs, RecoveryCache::disabled());
        let eval = objective.evaluate(&BigInt::from(3));

        assert_eq!(eval.recovered, vec![n.clone(), n.clone()]);
        assert!(!is_consistent(&eval.recovered, &n));
        assert_eq!(eval.error, n);
    }

    #[test]
    fn test_mixed_sentinel_inflates_error() {
        let n = curve_order();
        let mut sigs: Vec<Signature> = shared_nonce_set(8, 555, 2).to_vec();
        sigs.push(Signature::new(big(0), big(1), big(1)));
        let mut objective = SignatureObjective::new(sigs.into(), RecoveryCache::disabled());
        let eval = objective.evaluate(&BigInt::from(555));

        assert_eq!(eval.recovered[2], n);
        assert_eq!(eval.error, (&n - 8u32) * 2u32);
    }

    #[test]
    fn test_precomputed_inverse_matches_direct_recovery() {
        let n = curve_order();
        let sigs = shared_nonce_set(31, 4_000_037, 3);
        let mut objective = SignatureObjective::new(sigs.clone(), RecoveryCache::new(8));

        for k in [1u64, 2, 4_000_037, 99_999_999_999] {
            let k = big(k);
            let eval = objective.evaluate(&BigInt::from(k.clone()));
            let direct: Vec<BigUint> = sigs
                .iter()
                .map(|sig| {
                    crate::math::recover_private_key(&sig.r, &sig.s, &sig.z, &k, &n)
                        .unwrap_or_else(|| n.clone())
                })
                .collect();
            assert_eq!(eval.recovered, direct);
        }
    }

    #[test]
    fn test_pairwise_error_symmetric_and_zero_iff_equal() {
        let forward = vec![big(3), big(10), big(6)];
        let reversed: Vec<BigUint> = forward.iter().rev().cloned().collect();
        assert_eq!(pairwise_error(&forward), big(14));
        assert_eq!(pairwise_error(&forward), pairwise_error(&reversed));

        assert!(pairwise_error(&[big(4), big(4), big(4)]).is_zero());
        assert!(!pairwise_error(&[big(4), big(4), big(5)]).is_zero());
        assert!(pairwise_error(&[]).is_zero());
    }

    #[test]
    fn test_mismatched_secrets_never_reach_zero() {
        let nonce = 700_001u64;
        let sigs: Arc<[Signature]> = vec![
            forge_signature(&big(1111), &big(nonce), &big(42)).unwrap(),
            forge_signature(&big(2222), &big(nonce), &big(43)).unwrap(),
        ]
        .into();
        let mut objective = SignatureObjective::new(sigs, RecoveryCache::disabled());

        for k in (nonce - 1_000)..=(nonce + 1_000) {
            let eval = objective.evaluate(&BigInt::from(k));
            assert!(!eval.error.is_zero(), "false positive at k = {k}");
        }
    }
}
