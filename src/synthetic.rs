//! Genuine secp256k1 signatures built from a chosen secret and nonce

use crate::math::{biguint_to_scalar, curve_order, scalar_to_biguint};
use crate::signature::Signature;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{AffinePoint, ProjectivePoint, Scalar};
use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::Rng;

/// Signs message hash `z` with secret `d` and nonce `k`:
/// `r = x(k·G) mod n`, `s = k⁻¹(z + r·d) mod n`.
///
/// Returns `None` unless `1 < secret < n` and `0 < nonce < n`, or when `r` or
/// `s` come out zero. Recovery rejects keys of 0 and 1, so signatures over
/// them could never be searched back.
pub fn forge_signature(secret: &BigUint, nonce: &BigUint, z: &BigUint) -> Option<Signature> {
    let order = curve_order();
    if secret <= &BigUint::one() || secret >= &order || nonce.is_zero() || nonce >= &order {
        return None;
    }

    let d = biguint_to_scalar(secret)?;
    let k = biguint_to_scalar(nonce)?;
    let z_scalar = biguint_to_scalar(z)?;
    let k_inv = Option::<Scalar>::from(k.invert())?;

    let point: AffinePoint = (ProjectivePoint::GENERATOR * k).into();
    let encoded = point.to_encoded_point(false);
    let x = BigUint::from_bytes_be(encoded.x()?);
    let r = x % &order;
    let r_scalar = biguint_to_scalar(&r)?;
    if bool::from(r_scalar.is_zero()) {
        return None;
    }

    let s = k_inv * (z_scalar + r_scalar * d);
    if bool::from(s.is_zero()) {
        return None;
    }

    Some(Signature::new(r, scalar_to_biguint(&s), z.clone()))
}

/// `count` signatures that all reuse `nonce`, over random message hashes.
pub fn forge_shared_nonce<R: Rng + ?Sized>(
    secret: &BigUint,
    nonce: &BigUint,
    count: usize,
    rng: &mut R,
) -> Option<Vec<Signature>> {
    let order = curve_order();
    (0..count)
        .map(|_| {
            let z = rng.gen_biguint_below(&order);
            forge_signature(secret, nonce, &z)
        })
        .collect()
}

/// Compressed SEC1 public key for `secret`, hex encoded.
pub fn public_key_hex(secret: &BigUint) -> Option<String> {
    let d = biguint_to_scalar(secret)?;
    if bool::from(d.is_zero()) {
        return None;
    }
    let point: AffinePoint = (ProjectivePoint::GENERATOR * d).into();
    Some(hex::encode(point.to_encoded_point(true).as_bytes()))
}
