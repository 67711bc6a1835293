//! Arbitrary-precision modular arithmetic over the secp256k1 scalar field

use anyhow::{anyhow, bail, Result};
use k256::elliptic_curve::ff::PrimeField;
use k256::Scalar;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{Num, One, Signed, ToPrimitive, Zero};

/// secp256k1 curve order n in hexadecimal.
const SECP256K1_ORDER_HEX: &str =
    "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141";

pub fn curve_order() -> BigUint {
    BigUint::from_str_radix(SECP256K1_ORDER_HEX, 16).expect("secp256k1 order constant parses")
}

/// Parses a non-negative integer given either as decimal or as `0x`-prefixed hex.
///
/// Values are not range-checked against the curve order: every consumer
/// reduces modulo n.
pub fn parse_integer(s: &str) -> Result<BigUint> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        bail!("Empty integer string");
    }

    if let Some(hex_digits) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        if hex_digits.is_empty() || !hex_digits.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("Invalid hex string: only 0-9, a-f allowed after 0x");
        }
        return BigUint::from_str_radix(hex_digits, 16)
            .map_err(|e| anyhow!("Failed to parse hex: {}", e));
    }

    if !trimmed.chars().all(|c| c.is_ascii_digit()) {
        bail!("Invalid decimal string: only digits 0-9 allowed");
    }
    if trimmed.len() > 1 && trimmed.starts_with('0') {
        bail!("Invalid decimal string: no leading zeros allowed");
    }

    BigUint::from_str_radix(trimmed, 10).map_err(|e| anyhow!("Failed to parse decimal: {}", e))
}

/// Parses a signed decimal candidate such as `-12345` or `338587714487648360000`.
pub fn parse_candidate(s: &str) -> Result<BigInt> {
    let trimmed = s.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let magnitude = parse_integer(digits)?;
    let sign = if negative { Sign::Minus } else { Sign::Plus };
    Ok(BigInt::from_biguint(sign, magnitude))
}

/// Reduces a (possibly negative) candidate into `[0, n)`.
pub fn reduce_mod(k: &BigInt, n: &BigUint) -> BigUint {
    let n_signed = BigInt::from(n.clone());
    let mut reduced = k % &n_signed;
    if reduced.is_negative() {
        reduced += &n_signed;
    }
    // `reduced` is in [0, n) here
    reduced.magnitude().clone()
}

/// Modular inverse by the extended Euclidean algorithm.
pub fn mod_inverse(a: &BigUint, n: &BigUint) -> Option<BigUint> {
    let mut t = BigInt::zero();
    let mut new_t = BigInt::one();
    let mut r = BigInt::from(n.clone());
    let mut new_r = BigInt::from(a % n);

    while !new_r.is_zero() {
        let quotient = &r / &new_r;
        let temp_t = &t - &quotient * &new_t;
        t = new_t;
        new_t = temp_t;
        let temp_r = &r - &quotient * &new_r;
        r = new_r;
        new_r = temp_r;
    }

    if r != BigInt::one() {
        return None;
    }

    if t.is_negative() {
        t += BigInt::from(n.clone());
    }
    t.to_biguint()
}

/// Inverts `s = k⁻¹(z + r·d)` for `d` given a nonce `k` already reduced mod n.
///
/// Returns `None` when `r` is not invertible or the result falls outside `(1, n)`.
pub fn recover_private_key(
    r: &BigUint,
    s: &BigUint,
    z: &BigUint,
    k: &BigUint,
    n: &BigUint,
) -> Option<BigUint> {
    let r_inv = mod_inverse(r, n)?;
    recover_with_inverse(&r_inv, s, z, k, n)
}

/// [`recover_private_key`] with `r⁻¹ mod n` supplied by the caller.
pub fn recover_with_inverse(
    r_inv: &BigUint,
    s: &BigUint,
    z: &BigUint,
    k: &BigUint,
    n: &BigUint,
) -> Option<BigUint> {
    let sk = (s * k) % n;
    let z_red = z % n;
    let numerator = if sk >= z_red {
        sk - z_red
    } else {
        sk + n - z_red
    };
    let d = (numerator * r_inv) % n;

    if d > BigUint::one() && &d < n {
        Some(d)
    } else {
        None
    }
}

/// Base-10 logarithm of a strictly positive integer of any size.
pub fn log10_positive(value: &BigInt) -> Option<f64> {
    if !value.is_positive() {
        return None;
    }
    let magnitude = value.magnitude();
    let bits = magnitude.bits();
    // Keep 64 significant bits so the conversion stays inside f64 range.
    let shift = bits.saturating_sub(64);
    let head = (magnitude >> shift).to_f64()?;
    let log = head.log10() + (shift as f64) * std::f64::consts::LOG10_2;
    log.is_finite().then_some(log)
}

pub fn biguint_to_scalar(value: &BigUint) -> Option<Scalar> {
    let reduced = value % curve_order();
    let bytes = reduced.to_bytes_be();
    if bytes.len() > 32 {
        return None;
    }
    let mut padded = [0u8; 32];
    let offset = 32 - bytes.len();
    padded[offset..].copy_from_slice(&bytes);
    Option::<Scalar>::from(Scalar::from_repr(padded.into()))
}

pub fn scalar_to_biguint(scalar: &Scalar) -> BigUint {
    BigUint::from_bytes_be(&scalar.to_bytes())
}

/// Zero-padded 64-character lowercase hex rendering of a value below n.
pub fn to_hex_32(value: &BigUint) -> String {
    let bytes = value.to_bytes_be();
    let mut padded = [0u8; 32];
    let len = bytes.len().min(32);
    padded[32 - len..].copy_from_slice(&bytes[bytes.len() - len..]);
    hex::encode(padded)
}
