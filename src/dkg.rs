// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Verifiable distributed key generation.
//!
//! Each of `n` participants runs [`start`], broadcasts its commitments, and
//! sends share `j` privately to participant `j`. Every participant checks
//! the received shares against the senders' commitments with
//! [`verify_commitments`] and, if nothing failed, sums them with [`finish`]
//! into its long-term share of a jointly random secret. The secret itself
//! never exists in one place; [`reconstruct`] exists for tests and
//! authorized ceremonies only.
//!
//! ```
//! use rand::rngs::OsRng;
//! use toprf::dkg;
//!
//! let (n, threshold) = (3, 2);
//!
//! // Every participant runs start and distributes its output.
//! let runs: Vec<_> = (0..n)
//!     .map(|_| dkg::start(n as u8, threshold, &mut OsRng))
//!     .collect::<Result<_, _>>()?;
//!
//! // Participant 1 gathers the shares addressed to it, verifies them
//! // against the broadcast commitments, and derives its final share.
//! let commitments: Vec<_> = runs.iter().map(|(c, _)| c.clone()).collect();
//! let received: Vec<_> = runs.iter().map(|(_, s)| s[0].clone()).collect();
//!
//! let failed = dkg::verify_commitments(1, &commitments, &received)?;
//! assert!(failed.is_empty());
//! let final_share = dkg::finish(&received, 1)?;
//! # Ok::<(), toprf::Error>(())
//! ```
//!
//! A participant whose share fails verification is reported by index, not
//! raised as an error: excluding the peer and restarting, or aborting the
//! ceremony, is the caller's policy decision.

use alloc::vec::Vec;

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;
use rand_core::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::group::{self, ELEMENT_BYTES};
use crate::threshold::{polynomial_eval, Share};
use crate::{Error, Result};

/// Runs the first phase of the ceremony for one participant: samples a
/// random polynomial of degree `threshold - 1`, commits to each coefficient
/// against the base point, and deals one share of the polynomial to every
/// participant.
///
/// The commitments are broadcast to everyone; share `j` is sent privately
/// to participant `j`. The polynomial itself is wiped before returning.
///
/// # Errors
/// - [`Error::InvalidParameters`] unless `2 <= threshold <= n`.
/// - [`Error::RandomnessFailure`] if the random number generator fails.
pub fn start<R: RngCore + CryptoRng>(
    n: u8,
    threshold: u8,
    rng: &mut R,
) -> Result<(Vec<RistrettoPoint>, Vec<Share>)> {
    if threshold < 2 || threshold > n {
        return Err(Error::InvalidParameters);
    }

    let mut coefficients = Zeroizing::new(Vec::with_capacity(usize::from(threshold)));
    for _ in 0..threshold {
        coefficients.push(group::random_scalar(rng)?);
    }

    let commitments = coefficients.iter().map(RistrettoPoint::mul_base).collect();

    let shares = (1..=n)
        .map(|index| Share {
            index,
            value: polynomial_eval(&coefficients, index),
        })
        .collect();

    Ok((commitments, shares))
}

/// Verifies that the share received from `peer` is consistent with the
/// commitments `peer` broadcast: `g * share.value` must equal
/// `sum_k self^k * commitments[k]`.
///
/// The comparison runs in constant time over the canonical encodings, since
/// the recipient's share is secret material. Verifying one's own share is a
/// no-op success.
///
/// # Errors
/// - [`Error::InvalidPeers`] if either index is zero.
/// - [`Error::InvalidParameters`] if no commitments are supplied.
/// - [`Error::CommitmentMismatch`] if the check fails.
pub fn verify_commitment(
    self_index: u8,
    peer: u8,
    commitments: &[RistrettoPoint],
    share: &Share,
) -> Result<()> {
    if self_index == 0 || peer == 0 {
        return Err(Error::InvalidPeers);
    }
    if peer == self_index {
        return Ok(());
    }
    if commitments.is_empty() {
        return Err(Error::InvalidParameters);
    }

    let expected = RistrettoPoint::mul_base(&share.value);

    let index = group::scalar_from_index(self_index);
    let mut acc = RistrettoPoint::identity();
    let mut index_pow = Scalar::ONE;
    for commitment in commitments {
        acc += commitment * index_pow;
        index_pow *= index;
    }

    let expected = expected.compress();
    let acc = acc.compress();
    if bool::from(expected.as_bytes()[..].ct_eq(&acc.as_bytes()[..])) {
        Ok(())
    } else {
        Err(Error::CommitmentMismatch)
    }
}

/// Verifies the shares received from all peers against their broadcast
/// commitments and returns the indices of the peers whose shares failed.
/// An empty list means acceptance; handling a reported peer is left to the
/// caller.
///
/// `commitments[i - 1]` and `received_shares[i - 1]` must belong to
/// participant `i`.
///
/// # Errors
/// - [`Error::InvalidParameters`] if the inputs are empty, differ in length,
///   or name more than 255 participants.
/// - [`Error::InvalidPeers`] if `self_index` is zero or out of range.
pub fn verify_commitments(
    self_index: u8,
    commitments: &[Vec<RistrettoPoint>],
    received_shares: &[Share],
) -> Result<Vec<u8>> {
    if commitments.is_empty() || commitments.len() != received_shares.len() {
        return Err(Error::InvalidParameters);
    }
    let n = u8::try_from(commitments.len()).map_err(|_| Error::InvalidParameters)?;
    if self_index == 0 || self_index > n {
        return Err(Error::InvalidPeers);
    }

    let mut failed = Vec::new();
    for peer in 1..=n {
        if peer == self_index {
            continue;
        }
        let at = usize::from(peer) - 1;
        match verify_commitment(self_index, peer, &commitments[at], &received_shares[at]) {
            Ok(()) => {}
            Err(Error::CommitmentMismatch) => failed.push(peer),
            Err(err) => return Err(err),
        }
    }
    Ok(failed)
}

/// Combines the shares received from all peers into this participant's
/// long-term share: `Share(self, sum of values)`. This is the only point at
/// which the final share is materialized.
///
/// # Errors
/// - [`Error::InsufficientParts`] if no shares are supplied.
/// - [`Error::InconsistentIndex`] if a share is addressed to a different
///   participant.
pub fn finish(received_shares: &[Share], self_index: u8) -> Result<Share> {
    if received_shares.is_empty() {
        return Err(Error::InsufficientParts);
    }

    let mut value = Scalar::ZERO;
    for share in received_shares {
        if share.index != self_index {
            return Err(Error::InconsistentIndex);
        }
        value += share.value;
    }

    Ok(Share {
        index: self_index,
        value,
    })
}

/// Recovers the group secret from `threshold` or more final shares by
/// interpolation at zero.
///
/// Never called during normal operation: it defeats the purpose of the
/// ceremony. Intended for tests and authorized reconstruction only.
///
/// # Errors
/// Propagates [`crate::threshold::interpolate_scalar`] failures.
pub fn reconstruct(shares: &[Share]) -> Result<Scalar> {
    crate::threshold::interpolate_scalar(0, shares)
}

/// Serializes a commitment vector into the concatenation of its canonical
/// 32-byte element encodings, the form in which commitments are broadcast.
pub fn commitments_to_bytes(commitments: &[RistrettoPoint]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(commitments.len() * ELEMENT_BYTES);
    for commitment in commitments {
        bytes.extend_from_slice(&commitment.compress().to_bytes());
    }
    bytes
}

/// Deserializes a broadcast commitment vector.
///
/// # Errors
/// - [`Error::InvalidLength`] if the input is empty or not a multiple of 32
///   bytes.
/// - [`Error::InvalidEncoding`] if any element is not canonical.
pub fn commitments_from_bytes(bytes: &[u8]) -> Result<Vec<RistrettoPoint>> {
    if bytes.is_empty() || bytes.len() % ELEMENT_BYTES != 0 {
        return Err(Error::InvalidLength);
    }
    bytes
        .chunks_exact(ELEMENT_BYTES)
        .map(group::deserialize_elem)
        .collect()
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use rand::rngs::OsRng;

    use super::*;
    use crate::{oprf, threshold};

    struct Ceremony {
        commitments: Vec<Vec<RistrettoPoint>>,
        final_shares: Vec<Share>,
    }

    // Runs a full n-participant ceremony, verifying every cross-share.
    fn run_ceremony(n: u8, t: u8) -> Ceremony {
        let runs: Vec<_> = (0..n).map(|_| start(n, t, &mut OsRng).unwrap()).collect();
        let commitments: Vec<_> = runs.iter().map(|(c, _)| c.clone()).collect();

        let mut final_shares = Vec::new();
        for me in 1..=n {
            let received: Vec<Share> = runs
                .iter()
                .map(|(_, shares)| shares[usize::from(me) - 1].clone())
                .collect();
            let failed = verify_commitments(me, &commitments, &received).unwrap();
            assert!(failed.is_empty());
            final_shares.push(finish(&received, me).unwrap());
        }

        Ceremony {
            commitments,
            final_shares,
        }
    }

    #[test]
    fn every_subset_reconstructs_the_same_secret() {
        let ceremony = run_ceremony(5, 3);

        let reference = reconstruct(&ceremony.final_shares[..3]).unwrap();
        for subset in [[2usize, 3, 4], [0, 2, 4], [1, 3, 4], [0, 1, 3]] {
            let subset: Vec<Share> = subset
                .iter()
                .map(|&i| ceremony.final_shares[i].clone())
                .collect();
            assert_eq!(reconstruct(&subset).unwrap(), reference);
        }

        // The group public key is the sum of the constant-term commitments.
        let public_key: RistrettoPoint =
            ceremony.commitments.iter().map(|c| c[0]).sum();
        assert_eq!(RistrettoPoint::mul_base(&reference), public_key);
    }

    #[test]
    fn single_share_does_not_reveal_the_secret() {
        let ceremony = run_ceremony(3, 2);
        let secret = reconstruct(&ceremony.final_shares[..2]).unwrap();

        let lone = reconstruct(&ceremony.final_shares[..1]).unwrap();
        assert_ne!(lone, secret);
    }

    #[test]
    fn tampered_share_is_reported() {
        let n = 3;
        let runs: Vec<_> = (0..n).map(|_| start(n, 2, &mut OsRng).unwrap()).collect();
        let commitments: Vec<_> = runs.iter().map(|(c, _)| c.clone()).collect();

        let mut received: Vec<Share> = runs.iter().map(|(_, s)| s[0].clone()).collect();
        received[1].value += Scalar::ONE;

        let failed = verify_commitments(1, &commitments, &received).unwrap();
        assert_eq!(failed, vec![2]);

        assert_eq!(
            verify_commitment(1, 2, &commitments[1], &received[1]),
            Err(Error::CommitmentMismatch)
        );
        // The untampered peer still verifies.
        assert_eq!(verify_commitment(1, 3, &commitments[2], &received[2]), Ok(()));
    }

    #[test]
    fn own_share_is_not_verified() {
        let (commitments, shares) = start(3, 2, &mut OsRng).unwrap();
        let mut own = shares[0].clone();
        own.value += Scalar::ONE;
        assert_eq!(verify_commitment(1, 1, &commitments, &own), Ok(()));
    }

    #[test]
    fn parameter_validation() {
        assert_eq!(
            start(3, 4, &mut OsRng).unwrap_err(),
            Error::InvalidParameters
        );
        assert_eq!(
            start(3, 1, &mut OsRng).unwrap_err(),
            Error::InvalidParameters
        );
        assert!(start(2, 2, &mut OsRng).is_ok());

        let (commitments, shares) = start(2, 2, &mut OsRng).unwrap();
        assert_eq!(commitments.len(), 2);
        assert_eq!(shares.len(), 2);

        assert_eq!(
            verify_commitments(0, &[commitments.clone()], &shares[..1]),
            Err(Error::InvalidPeers)
        );
        assert_eq!(
            verify_commitments(1, &[], &[]),
            Err(Error::InvalidParameters)
        );
    }

    #[test]
    fn finish_rejects_misaddressed_shares() {
        let (_, shares) = start(3, 2, &mut OsRng).unwrap();
        // shares[0] is addressed to participant 1, shares[1] to participant 2.
        assert_eq!(
            finish(&shares[..2], 1).unwrap_err(),
            Error::InconsistentIndex
        );
        assert_eq!(finish(&[], 1).unwrap_err(), Error::InsufficientParts);
        assert!(finish(&shares[..1], 1).is_ok());
    }

    #[test]
    fn commitment_wire_round_trip() {
        let (commitments, _) = start(4, 3, &mut OsRng).unwrap();
        let bytes = commitments_to_bytes(&commitments);
        assert_eq!(bytes.len(), 3 * ELEMENT_BYTES);
        assert_eq!(commitments_from_bytes(&bytes).unwrap(), commitments);

        assert_eq!(commitments_from_bytes(&[]), Err(Error::InvalidLength));
        assert_eq!(
            commitments_from_bytes(&bytes[..40]),
            Err(Error::InvalidLength)
        );
        let mut corrupt = bytes;
        corrupt[..32].copy_from_slice(&[0xff; 32]);
        assert_eq!(
            commitments_from_bytes(&corrupt),
            Err(Error::InvalidEncoding)
        );
    }

    // The composition the ceremony exists for: DKG key shares driving a
    // session-bound threshold evaluation.
    #[test]
    fn dkg_shares_drive_three_hash_tdh() {
        let ceremony = run_ceremony(5, 3);
        let zero_shares = threshold::create_shares(&[0u8; 32], 5, 3, &mut OsRng).unwrap();

        let (blind, alpha) = oprf::blind(b"my-secret-password", &mut OsRng).unwrap();
        let ssid = b"session-12345";

        let parts: Vec<_> = [1usize, 2, 3]
            .iter()
            .map(|&server| {
                threshold::three_hash_tdh(
                    &ceremony.final_shares[server - 1],
                    &zero_shares[server - 1],
                    &alpha,
                    ssid,
                )
                .unwrap()
                .to_bytes()
            })
            .collect();

        let beta = threshold::threshold_combine(&parts).unwrap();
        let unblinded = oprf::unblind(&blind, &beta).unwrap();
        let output = oprf::finalize(b"my-secret-password", &unblinded).unwrap();
        assert_eq!(output.len(), crate::hash::OPRF_BYTES);

        // The same servers and session produce the same output.
        let parts_again: Vec<_> = [1usize, 2, 3]
            .iter()
            .map(|&server| {
                threshold::three_hash_tdh(
                    &ceremony.final_shares[server - 1],
                    &zero_shares[server - 1],
                    &alpha,
                    ssid,
                )
                .unwrap()
                .to_bytes()
            })
            .collect();
        assert_eq!(threshold::threshold_combine(&parts_again).unwrap(), beta);
    }
}
