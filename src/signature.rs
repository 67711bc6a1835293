//! Signature data types

use crate::math::{parse_integer, to_hex_32};
use anyhow::{Context, Result};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Raw `(r, s, z)` strings as they appear in JSON or CSV input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureInput {
    pub r: String,
    pub s: String,
    pub z: String,
}

/// An immutable signature triple.
///
/// Components are only required to be non-negative; values at or above the
/// curve order are reduced wherever they are consumed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub r: BigUint,
    pub s: BigUint,
    pub z: BigUint,
}

impl Signature {
    pub fn new(r: BigUint, s: BigUint, z: BigUint) -> Self {
        Self { r, s, z }
    }
}

impl TryFrom<SignatureInput> for Signature {
    type Error = anyhow::Error;

    fn try_from(input: SignatureInput) -> Result<Self> {
        let r = parse_integer(&input.r).context("field r")?;
        let s = parse_integer(&input.s).context("field s")?;
        let z = parse_integer(&input.z).context("field z")?;
        Ok(Signature { r, s, z })
    }
}

impl From<&Signature> for SignatureInput {
    fn from(sig: &Signature) -> Self {
        SignatureInput {
            r: format!("0x{}", to_hex_32(&sig.r)),
            s: format!("0x{}", to_hex_32(&sig.s)),
            z: format!("0x{}", to_hex_32(&sig.z)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_input_parse_decimal() {
        let input = SignatureInput {
            r: "6819641642398093696120236467967538361543858578256722584730163952555838220871"
                .to_string(),
            s: "5111069398017465712735164463809304352000044522184731945150717785434666956473"
                .to_string(),
            z: "4834837306435966184874350434501389872155834069808640791394730023708942795899"
                .to_string(),
        };
        let sig = Signature::try_from(input).unwrap();
        assert_eq!(
            sig.r.to_string(),
            "6819641642398093696120236467967538361543858578256722584730163952555838220871"
        );
    }

    #[test]
    fn test_signature_input_parse_hex() {
        let input = SignatureInput {
            r: "0x27c90531406bbf08bd6325b06fe0ac32e61a66f3d8b2762a7bf2ac6c13e76ddc".to_string(),
            s: "0x096ddba45472fe9cca48753e7ca89b70ef358badbd458e08ef77fc79a85d7ae8".to_string(),
            z: "0x0af35ac2dfa66a276070a9876c1108a53744b8c1f0d2a339443e93c4f892dd82".to_string(),
        };
        let sig = Signature::try_from(input).unwrap();
        assert_eq!(
            to_hex_32(&sig.s),
            "096ddba45472fe9cca48753e7ca89b70ef358badbd458e08ef77fc79a85d7ae8"
        );
    }

    #[test]
    fn test_signature_input_error_names_field() {
        let input = SignatureInput {
            r: "1".to_string(),
            s: "oops".to_string(),
            z: "3".to_string(),
        };
        let err = Signature::try_from(input).unwrap_err();
        assert!(format!("{err:#}").contains("field s"));
    }

    #[test]
    fn test_zero_r_is_accepted() {
        let input = SignatureInput {
            r: "0".to_string(),
            s: "2".to_string(),
            z: "3".to_string(),
        };
        assert!(Signature::try_from(input).is_ok());
    }

    #[test]
    fn test_signature_to_input_uses_hex() {
        let sig = Signature::new(1u32.into(), 2u32.into(), 3u32.into());
        let input = SignatureInput::from(&sig);
        assert!(input.r.starts_with("0x"));
        assert_eq!(input.r.len(), 66);
        let back = Signature::try_from(input).unwrap();
        assert_eq!(back, sig);
    }
}
