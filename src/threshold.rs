// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The threshold OPRF: Shamir sharing of the server key, per-server partial
//! evaluation, and combination of the parts on the client.
//!
//! The key is split with [`create_shares`] (or produced by the [DKG](crate::dkg))
//! and distributed to `n` servers. Any `threshold` of them evaluate a blinded
//! element with [`evaluate`], and the client merges the results with
//! [`threshold_combine`]; unblinding and finalization are unchanged from the
//! basic protocol:
//!
//! ```
//! use rand::rngs::OsRng;
//! use toprf::threshold;
//!
//! let key = toprf::oprf::keygen(&mut OsRng)?;
//! let shares = threshold::create_shares(&key, 3, 2, &mut OsRng)?;
//!
//! let (blind, blinded_element) = toprf::oprf::blind(b"input", &mut OsRng)?;
//!
//! // Any two of the three servers participate.
//! let peers = [1, 3];
//! let parts = [
//!     threshold::evaluate(&shares[0], &blinded_element, &peers)?.to_bytes(),
//!     threshold::evaluate(&shares[2], &blinded_element, &peers)?.to_bytes(),
//! ];
//!
//! let evaluation_element = threshold::threshold_combine(&parts)?;
//! let unblinded_element = toprf::oprf::unblind(&blind, &evaluation_element)?;
//! let output = toprf::oprf::finalize(b"input", &unblinded_element)?;
//! # Ok::<(), toprf::Error>(())
//! ```
//!
//! [`three_hash_tdh`] is the session-bound evaluation variant; it stays
//! secure even against compromise of every key-share holder.

use alloc::vec::Vec;

use blake2::Blake2b512;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use digest::Digest;
use rand_core::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::group::{self, ELEMENT_BYTES, SCALAR_BYTES};
use crate::oprf::raw_evaluate;
use crate::util::i2osp_2;
use crate::{Error, Result};

/// The wire length of a [`Share`]: one index byte followed by a scalar.
pub const SHARE_BYTES: usize = 1 + SCALAR_BYTES;

/// The wire length of a [`Part`]: one index byte followed by an element.
pub const PART_BYTES: usize = 1 + ELEMENT_BYTES;

/// A Shamir secret share `(i, f(i))` of a scalar-valued polynomial.
///
/// Indices run from 1 to 255; index 0 encodes the secret itself and is never
/// put on the wire. The share value is secret material and is wiped on drop.
#[derive(Clone, Debug, Eq, PartialEq, Zeroize, ZeroizeOnDrop)]
pub struct Share {
    /// The participant index this share was dealt to.
    pub index: u8,
    /// The polynomial evaluated at the index.
    pub value: Scalar,
}

impl Share {
    /// Serializes the share into its 33-byte wire encoding `index || value`.
    pub fn to_bytes(&self) -> [u8; SHARE_BYTES] {
        let mut bytes = [0u8; SHARE_BYTES];
        bytes[0] = self.index;
        bytes[1..].copy_from_slice(&self.value.to_bytes());
        bytes
    }

    /// Deserializes a share from its 33-byte wire encoding.
    ///
    /// # Errors
    /// - [`Error::InvalidLength`] if the input is not exactly 33 bytes.
    /// - [`Error::InvalidPeers`] if the index is zero.
    /// - [`Error::InvalidEncoding`] if the value is not a canonical scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: &[u8; SHARE_BYTES] = bytes.try_into().map_err(|_| Error::InvalidLength)?;
        if bytes[0] == 0 {
            return Err(Error::InvalidPeers);
        }
        let value = group::deserialize_scalar(&bytes[1..])?;
        Ok(Self {
            index: bytes[0],
            value,
        })
    }
}

/// One server's contribution to a threshold evaluation.
///
/// The index tells the combiner which Lagrange coefficient the contribution
/// carries (or, for [`three_hash_tdh`], which server produced it).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Part {
    /// The index of the share used for the evaluation.
    pub index: u8,
    /// The partial evaluation.
    pub element: RistrettoPoint,
}

impl Part {
    /// Serializes the part into its 33-byte wire encoding `index || element`.
    pub fn to_bytes(&self) -> [u8; PART_BYTES] {
        let mut bytes = [0u8; PART_BYTES];
        bytes[0] = self.index;
        bytes[1..].copy_from_slice(&self.element.compress().to_bytes());
        bytes
    }

    /// Deserializes a part from its 33-byte wire encoding.
    ///
    /// # Errors
    /// - [`Error::InvalidLength`] if the input is not exactly 33 bytes.
    /// - [`Error::InvalidPeers`] if the index is zero.
    /// - [`Error::InvalidEncoding`] if the element is not canonical.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: &[u8; PART_BYTES] = bytes.try_into().map_err(|_| Error::InvalidLength)?;
        if bytes[0] == 0 {
            return Err(Error::InvalidPeers);
        }
        let element = group::deserialize_elem(&bytes[1..])?;
        Ok(Self {
            index: bytes[0],
            element,
        })
    }
}

// Peer sets must consist of distinct non-zero indices.
fn validate_peers(peers: &[u8]) -> Result<()> {
    let mut seen = [false; 256];
    for &peer in peers {
        if peer == 0 || seen[usize::from(peer)] {
            return Err(Error::InvalidPeers);
        }
        seen[usize::from(peer)] = true;
    }
    Ok(())
}

// The Lagrange basis polynomial for `index` over `peers`, evaluated at `x`:
// prod_{j != index} (j - x) / (j - index). The caller guarantees distinct
// indices, so the denominator is non-zero and inversion is safe.
fn lagrange_coeff_unchecked(index: u8, x: u8, peers: &[u8]) -> Scalar {
    let x = group::scalar_from_index(x);
    let i = group::scalar_from_index(index);
    let mut dividend = Scalar::ONE;
    let mut divisor = Scalar::ONE;

    for &peer in peers {
        if peer == index {
            continue;
        }
        let peer = group::scalar_from_index(peer);
        dividend *= peer - x;
        divisor *= peer - i;
    }

    dividend * divisor.invert()
}

// The reconstruction coefficient for f(0).
fn coeff(index: u8, peers: &[u8]) -> Result<Scalar> {
    validate_peers(peers)?;
    if !peers.contains(&index) {
        return Err(Error::InvalidPeers);
    }
    Ok(lagrange_coeff_unchecked(index, 0, peers))
}

// Evaluates the polynomial given by `coefficients` (constant term first) at
// the point `x`, with an explicit running power so every step is a
// constant-time field operation.
pub(crate) fn polynomial_eval(coefficients: &[Scalar], x: u8) -> Scalar {
    let x = group::scalar_from_index(x);
    let mut acc = Scalar::ZERO;
    let mut x_pow = Scalar::ONE;
    for coefficient in coefficients {
        acc += coefficient * x_pow;
        x_pow *= x;
    }
    acc
}

/// Performs Lagrange interpolation at the point `x` over the given shares.
///
/// Passing `x = 0` reconstructs the secret (the constant term of the shared
/// polynomial) from any `threshold` shares.
///
/// # Errors
/// - [`Error::InsufficientParts`] if no shares are supplied.
/// - [`Error::InvalidPeers`] if share indices are duplicated or zero.
pub fn interpolate_scalar(x: u8, shares: &[Share]) -> Result<Scalar> {
    if shares.is_empty() {
        return Err(Error::InsufficientParts);
    }

    let indexes: Vec<u8> = shares.iter().map(|share| share.index).collect();
    validate_peers(&indexes)?;

    let mut acc = Scalar::ZERO;
    for share in shares {
        acc += lagrange_coeff_unchecked(share.index, x, &indexes) * share.value;
    }
    Ok(acc)
}

/// Splits a secret into `n` Shamir shares with reconstruction threshold
/// `threshold` (trusted-dealer setup).
///
/// The secret becomes the constant term of a random polynomial of degree
/// `threshold - 1`; share `i` is the polynomial evaluated at `i`. The
/// polynomial coefficients are wiped before returning.
///
/// # Errors
/// - [`Error::InvalidParameters`] unless `2 <= threshold <= n`.
/// - [`Error::InvalidEncoding`] if the secret is not a canonical scalar.
/// - [`Error::RandomnessFailure`] if the random number generator fails.
pub fn create_shares<R: RngCore + CryptoRng>(
    secret: &[u8],
    n: u8,
    threshold: u8,
    rng: &mut R,
) -> Result<Vec<Share>> {
    if threshold < 2 || threshold > n {
        return Err(Error::InvalidParameters);
    }
    let secret = group::deserialize_scalar(secret)?;

    let mut coefficients = Zeroizing::new(Vec::with_capacity(usize::from(threshold)));
    coefficients.push(secret);
    for _ in 1..threshold {
        coefficients.push(group::random_scalar(rng)?);
    }

    Ok((1..=n)
        .map(|index| Share {
            index,
            value: polynomial_eval(&coefficients, index),
        })
        .collect())
}

/// Evaluates a blinded element under a key share, baking the share's
/// Lagrange coefficient for the participating peer set into the result.
///
/// Every participating server must be called with the identical `peers`
/// list naming exactly the indices taking part; [`threshold_combine`] then
/// only needs to sum the parts.
///
/// # Errors
/// - [`Error::InvalidLength`] / [`Error::InvalidEncoding`] for a malformed
///   blinded element.
/// - [`Error::InvalidPeers`] if the peer set contains duplicates or zeros,
///   or does not contain the share's own index.
pub fn evaluate(share: &Share, blinded_element: &[u8], peers: &[u8]) -> Result<Part> {
    let alpha = group::deserialize_elem(blinded_element)?;
    let coefficient = coeff(share.index, peers)?;
    let masked_key = Zeroizing::new(coefficient * share.value);
    Ok(Part {
        index: share.index,
        element: raw_evaluate(&masked_key, &alpha),
    })
}

/// Combines wire-encoded partial evaluations into the evaluation element of
/// the basic protocol.
///
/// Assumes the Lagrange coefficients were applied during evaluation, so
/// combining is a plain sum. Parts are sorted by index first; the sum is
/// commutative, but sorting keeps the operation independent of arrival
/// order.
///
/// # Errors
/// - [`Error::InsufficientParts`] if no parts are supplied.
/// - [`Error::InvalidParameters`] if more than 255 parts are supplied.
/// - [`Error::InvalidLength`] / [`Error::InvalidPeers`] /
///   [`Error::InvalidEncoding`] if a part fails to decode.
pub fn threshold_combine<P: AsRef<[u8]>>(parts: &[P]) -> Result<[u8; ELEMENT_BYTES]> {
    if parts.is_empty() {
        return Err(Error::InsufficientParts);
    }
    if parts.len() > 255 {
        return Err(Error::InvalidParameters);
    }

    let mut parts = parts
        .iter()
        .map(|part| Part::from_bytes(part.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    parts.sort_unstable_by_key(|part| part.index);

    let sum: RistrettoPoint = parts.iter().map(|part| part.element).sum();
    Ok(sum.compress().to_bytes())
}

/// Evaluates a blinded element under the 3HashTDH construction, binding the
/// result to a session identifier:
/// `beta = alpha * k + H'(I2OSP(len(ssid), 2) || ssid || alpha) * z`,
/// where `H'` is BLAKE2b-512 followed by the uniform map to the group and
/// `z` is this server's share of a Shamir sharing of zero.
///
/// Every participating server must receive the identical `ssid`. Unlike
/// [`evaluate`], no Lagrange coefficient is applied: the combined result is
/// only meaningful when the peer subset is fixed for the whole session and
/// matches the one the key and zero sharings were prepared for.
///
/// # Errors
/// - [`Error::InvalidLength`] if the blinded element is not 32 bytes or the
///   session identifier exceeds 65535 bytes.
/// - [`Error::InvalidEncoding`] if the blinded element is not canonical.
pub fn three_hash_tdh(
    key_share: &Share,
    zero_share: &Share,
    blinded_element: &[u8],
    ssid: &[u8],
) -> Result<Part> {
    let alpha_bytes: &[u8; ELEMENT_BYTES] = blinded_element
        .try_into()
        .map_err(|_| Error::InvalidLength)?;
    let alpha = group::deserialize_elem(alpha_bytes)?;

    let beta = raw_evaluate(&key_share.value, &alpha);

    let digest = Blake2b512::new()
        .chain_update(i2osp_2(ssid.len())?)
        .chain_update(ssid)
        .chain_update(alpha_bytes)
        .finalize();
    let mut uniform_bytes = [0u8; 64];
    uniform_bytes.copy_from_slice(&digest);
    let session_point = RistrettoPoint::from_uniform_bytes(&uniform_bytes);

    Ok(Part {
        index: key_share.index,
        element: beta + raw_evaluate(&zero_share.value, &session_point),
    })
}
