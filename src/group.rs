// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! A thin layer over the ristretto255 group: canonical encodings, random
//! scalars, and the index-to-scalar map used by the threshold math.

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::{Error, Result};

/// The byte length of a canonically encoded ristretto255 scalar.
pub const SCALAR_BYTES: usize = 32;

/// The byte length of a canonically encoded ristretto255 group element.
pub const ELEMENT_BYTES: usize = 32;

/// Deserializes a scalar from its canonical 32-byte little-endian encoding.
///
/// Non-canonical encodings (values not reduced modulo the group order) are
/// rejected. The zero scalar is a valid encoding.
pub(crate) fn deserialize_scalar(bytes: &[u8]) -> Result<Scalar> {
    let bytes: [u8; SCALAR_BYTES] = bytes.try_into().map_err(|_| Error::InvalidLength)?;
    Option::from(Scalar::from_canonical_bytes(bytes)).ok_or(Error::InvalidEncoding)
}

/// Deserializes a group element from its canonical 32-byte encoding.
///
/// Any canonical encoding is accepted, including the identity element.
pub(crate) fn deserialize_elem(bytes: &[u8]) -> Result<RistrettoPoint> {
    let bytes: [u8; ELEMENT_BYTES] = bytes.try_into().map_err(|_| Error::InvalidLength)?;
    CompressedRistretto(bytes)
        .decompress()
        .ok_or(Error::InvalidEncoding)
}

/// Samples a uniformly distributed scalar by wide reduction of 64 random
/// bytes.
pub(crate) fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Scalar> {
    let mut bytes = [0u8; 64];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|_| Error::RandomnessFailure)?;
    let scalar = Scalar::from_bytes_mod_order_wide(&bytes);
    bytes.zeroize();
    Ok(scalar)
}

/// Samples a uniformly distributed non-zero scalar.
pub(crate) fn random_nonzero_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Scalar> {
    loop {
        let scalar = random_scalar(rng)?;
        if scalar != Scalar::ZERO {
            break Ok(scalar);
        }
    }
}

/// Maps a participant index to a scalar.
///
/// This is the integer value of the byte as a field element, i.e. the byte
/// written into position 0 of the canonical little-endian encoding. The
/// Lagrange math assumes exactly this map.
pub(crate) fn scalar_from_index(index: u8) -> Scalar {
    Scalar::from(u64::from(index))
}
