// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The basic two-party OPRF over the `ristretto255-SHA512` ciphersuite.
//!
//! The client blinds its input, the server evaluates the blinded element
//! under its private key, and the client unblinds and finalizes:
//!
//! ```
//! use rand::rngs::OsRng;
//!
//! // Server setup
//! let key = toprf::oprf::keygen(&mut OsRng)?;
//!
//! // Client: blind the input
//! let (blind, blinded_element) = toprf::oprf::blind(b"input", &mut OsRng)?;
//!
//! // Server: evaluate
//! let evaluation_element = toprf::oprf::evaluate(&key, &blinded_element)?;
//!
//! // Client: unblind and finalize
//! let unblinded_element = toprf::oprf::unblind(&blind, &evaluation_element)?;
//! let output = toprf::oprf::finalize(b"input", &unblinded_element)?;
//! # Ok::<(), toprf::Error>(())
//! ```
//!
//! All values crossing the boundary of this module are canonical byte
//! encodings; the wire formats are fixed by the ciphersuite.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use rand_core::{CryptoRng, RngCore};

use crate::group::{self, ELEMENT_BYTES, SCALAR_BYTES};
use crate::hash::{self, OPRF_BYTES};
use crate::{Error, Result};

/// Generates a random OPRF private key: a uniformly distributed non-zero
/// scalar, returned in its canonical 32-byte encoding.
///
/// # Errors
/// [`Error::RandomnessFailure`] if the random number generator fails.
pub fn keygen<R: RngCore + CryptoRng>(rng: &mut R) -> Result<[u8; SCALAR_BYTES]> {
    Ok(group::random_nonzero_scalar(rng)?.to_bytes())
}

/// Computes the first step of the protocol on the client: hashes the input
/// to the group and masks it with a fresh random blinding scalar.
///
/// Returns the blinding scalar (to be kept for [`unblind`]) and the blinded
/// element (to be sent to the server).
///
/// # Errors
/// [`Error::RandomnessFailure`] if the random number generator fails.
pub fn blind<R: RngCore + CryptoRng>(
    input: &[u8],
    rng: &mut R,
) -> Result<([u8; SCALAR_BYTES], [u8; ELEMENT_BYTES])> {
    let blind = group::random_nonzero_scalar(rng)?;
    Ok((blind.to_bytes(), blind_with_scalar(input, &blind)?))
}

/// Variant of [`blind`] that takes the blinding scalar as input instead of
/// sampling it, for deterministic test vectors and callers with their own
/// entropy source.
///
/// # Errors
/// - [`Error::InvalidLength`] if the blind is not 32 bytes.
/// - [`Error::InvalidEncoding`] if the blind is not a canonical scalar.
pub fn blind_with(
    input: &[u8],
    blind: &[u8],
) -> Result<([u8; SCALAR_BYTES], [u8; ELEMENT_BYTES])> {
    let blind = group::deserialize_scalar(blind)?;
    Ok((blind.to_bytes(), blind_with_scalar(input, &blind)?))
}

fn blind_with_scalar(input: &[u8], blind: &Scalar) -> Result<[u8; ELEMENT_BYTES]> {
    let hashed_point = hash::hash_to_group(input)?;
    Ok(raw_evaluate(blind, &hashed_point).compress().to_bytes())
}

/// Computes the second step of the protocol on the server: multiplies the
/// client's blinded element by the private key.
///
/// # Errors
/// - [`Error::InvalidLength`] if either input is not 32 bytes.
/// - [`Error::InvalidEncoding`] if the key or the blinded element is not
///   canonical.
pub fn evaluate(key: &[u8], blinded_element: &[u8]) -> Result<[u8; ELEMENT_BYTES]> {
    let key = group::deserialize_scalar(key)?;
    let alpha = group::deserialize_elem(blinded_element)?;
    Ok(raw_evaluate(&key, &alpha).compress().to_bytes())
}

/// Computes the third step of the protocol on the client: removes the
/// blinding factor from the server's evaluation by constant-time inversion.
///
/// Decoding the evaluation element is the only point at which a malformed
/// server response is detected.
///
/// # Errors
/// - [`Error::InvalidLength`] if either input is not 32 bytes.
/// - [`Error::InvalidEncoding`] if the blind or the evaluation element is
///   not canonical.
pub fn unblind(blind: &[u8], evaluation_element: &[u8]) -> Result<[u8; ELEMENT_BYTES]> {
    let blind = group::deserialize_scalar(blind)?;
    let beta = group::deserialize_elem(evaluation_element)?;
    Ok(raw_evaluate(&blind.invert(), &beta).compress().to_bytes())
}

/// Computes the final OPRF output,
/// `SHA512(I2OSP(len(input), 2) || input || I2OSP(32, 2) || n || "Finalize")`.
///
/// # Errors
/// [`Error::InvalidLength`] if the unblinded element is not 32 bytes or the
/// input exceeds 65535 bytes.
pub fn finalize(input: &[u8], unblinded_element: &[u8]) -> Result<[u8; OPRF_BYTES]> {
    let unblinded_element: &[u8; ELEMENT_BYTES] = unblinded_element
        .try_into()
        .map_err(|_| Error::InvalidLength)?;
    hash::finalize_hash(input, unblinded_element)
}

// The single scalar-multiplication step shared by the basic and the
// threshold evaluation surfaces.
pub(crate) fn raw_evaluate(key: &Scalar, point: &RistrettoPoint) -> RistrettoPoint {
    point * key
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;

    use super::*;

    // CFRG test vectors for ristretto255-SHA512 in OPRF mode, shared with
    // the liboprf test suite.
    const TEST_KEY: &str = "5ebcea5ee37023ccb9fc2d2019f9d7737be85591ae8652ffa9ef0f4d37063b0e";
    const TEST_BLIND: &str = "64d37aed22a27f5191de1c1d69fadb899d8862b58eb4220029e036ec4c1f6706";

    struct TestVector {
        input: &'static str,
        blinded_element: &'static str,
        evaluation_element: &'static str,
        output: &'static str,
    }

    const TEST_VECTORS: [TestVector; 2] = [
        TestVector {
            input: "00",
            blinded_element: "609a0ae68c15a3cf6903766461307e5c8bb2f95e7e6550e1ffa2dc99e412803c",
            evaluation_element: "7ec6578ae5120958eb2db1745758ff379e77cb64fe77b0b2d8cc917ea0869c7e",
            output: "527759c3d9366f277d8c6020418d96bb393ba2afb20ff90df23fb7708264e2f3\
                     ab9135e3bd69955851de4b1f9fe8a0973396719b7912ba9ee8aa7d0b5e24bcf6",
        },
        TestVector {
            input: "5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a",
            blinded_element: "da27ef466870f5f15296299850aa088629945a17d1f5b7f5ff043f76b3c06418",
            evaluation_element: "b4cbf5a4f1eeda5a63ce7b77c7d23f461db3fcab0dd28e4e17cecb5c90d02c25",
            output: "f4a74c9c592497375e796aa837e907b1a045d34306a749db9f34221f7e750cb4\
                     f2a6413a6bf6fa5e19ba6348eb673934a722a7ede2e7621306d18951e7cf2c73",
        },
    ];

    #[test]
    fn blind_matches_vectors() {
        let blind = hex::decode(TEST_BLIND).unwrap();
        for tv in &TEST_VECTORS {
            let input = hex::decode(tv.input).unwrap();
            let (r, alpha) = blind_with(&input, &blind).unwrap();
            assert_eq!(TEST_BLIND, hex::encode(r));
            assert_eq!(tv.blinded_element, hex::encode(alpha));
        }
    }

    #[test]
    fn evaluate_matches_vectors() {
        let key = hex::decode(TEST_KEY).unwrap();
        for tv in &TEST_VECTORS {
            let alpha = hex::decode(tv.blinded_element).unwrap();
            let beta = evaluate(&key, &alpha).unwrap();
            assert_eq!(tv.evaluation_element, hex::encode(beta));
        }
    }

    #[test]
    fn end_to_end_matches_vectors() {
        let key = hex::decode(TEST_KEY).unwrap();
        let blind = hex::decode(TEST_BLIND).unwrap();
        for tv in &TEST_VECTORS {
            let input = hex::decode(tv.input).unwrap();
            let (r, alpha) = blind_with(&input, &blind).unwrap();
            let beta = evaluate(&key, &alpha).unwrap();
            let n = unblind(&r, &beta).unwrap();
            let output = finalize(&input, &n).unwrap();
            assert_eq!(tv.output, hex::encode(output));
        }
    }

    #[test]
    fn output_is_independent_of_blind() {
        let key = hex::decode(TEST_KEY).unwrap();
        let input = b"blind independence";

        let blind_a = hex::decode(TEST_BLIND).unwrap();
        let mut blind_b = [0u8; SCALAR_BYTES];
        blind_b[0] = 7;

        let (r_a, alpha_a) = blind_with(input, &blind_a).unwrap();
        let (r_b, alpha_b) = blind_with(input, &blind_b).unwrap();
        assert_ne!(alpha_a, alpha_b);

        let output_a = {
            let beta = evaluate(&key, &alpha_a).unwrap();
            finalize(input, &unblind(&r_a, &beta).unwrap()).unwrap()
        };
        let output_b = {
            let beta = evaluate(&key, &alpha_b).unwrap();
            finalize(input, &unblind(&r_b, &beta).unwrap()).unwrap()
        };
        assert_eq!(output_a, output_b);
    }

    #[test]
    fn keygen_produces_distinct_canonical_keys() {
        let key_a = keygen(&mut OsRng).unwrap();
        let key_b = keygen(&mut OsRng).unwrap();
        assert_ne!(key_a, key_b);
        assert!(crate::group::deserialize_scalar(&key_a).is_ok());
        assert!(crate::group::deserialize_scalar(&key_b).is_ok());
    }

    #[test]
    fn random_blind_round_trips() {
        let key = keygen(&mut OsRng).unwrap();
        let input = b"round trip";

        let (blind, alpha) = blind(input, &mut OsRng).unwrap();
        let beta = evaluate(&key, &alpha).unwrap();
        let n = unblind(&blind, &beta).unwrap();
        let via_protocol = finalize(input, &n).unwrap();

        // The output must equal a direct evaluation of the unblinded input.
        let hashed = crate::hash::hash_to_group(input).unwrap();
        let key_scalar = crate::group::deserialize_scalar(&key).unwrap();
        let direct = raw_evaluate(&key_scalar, &hashed).compress().to_bytes();
        assert_eq!(via_protocol, finalize(input, &direct).unwrap());
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        let key = hex::decode(TEST_KEY).unwrap();
        let alpha = hex::decode(TEST_VECTORS[0].blinded_element).unwrap();

        assert_eq!(evaluate(&key[..31], &alpha), Err(Error::InvalidLength));
        assert_eq!(evaluate(&key, &alpha[..31]), Err(Error::InvalidLength));
        assert_eq!(evaluate(&[0xff; 32], &alpha), Err(Error::InvalidEncoding));
        assert_eq!(evaluate(&key, &[0xff; 32]), Err(Error::InvalidEncoding));

        assert_eq!(blind_with(b"x", &[0xff; 32]), Err(Error::InvalidEncoding));
        assert_eq!(blind_with(b"x", &[0; 16]), Err(Error::InvalidLength));

        assert_eq!(unblind(&key, &[0xff; 32]), Err(Error::InvalidEncoding));
        assert_eq!(finalize(b"x", &[0; 31]), Err(Error::InvalidLength));
    }
}
