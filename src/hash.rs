// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The hashing layer: `expand_message_xmd`, hash-to-group for ristretto255,
//! and the protocol's finalization framing.

use alloc::vec::Vec;

use curve25519_dalek::ristretto::RistrettoPoint;
use digest::core_api::{Block, BlockSizeUser};
use digest::{Digest, FixedOutputReset, Output};
use sha2::Sha512;

use crate::group::ELEMENT_BYTES;
use crate::util::i2osp_2;
use crate::{Error, Result};

/// The byte length of the final OPRF output (a SHA-512 digest).
pub const OPRF_BYTES: usize = 64;

/// The domain separation tag for hash-to-group, fixing the
/// `ristretto255-SHA512` ciphersuite in OPRF mode. 43 bytes, with an
/// embedded NUL for the mode octet.
pub const HASH_TO_GROUP_DST: &[u8] = b"HashToGroup-OPRFV1-\x00-ristretto255-SHA512";

/// The trailing domain separation tag of the finalization hash.
const FINALIZE_DST: &[u8] = b"Finalize";

/// Bytes of hash output consumed by the uniform map to the group.
const UNIFORM_BYTES: usize = 64;

fn xor<H: Digest>(a: &Output<H>, b: &Output<H>) -> Output<H> {
    a.iter().zip(b.iter()).map(|(a, b)| a ^ b).collect()
}

/// Corresponds to the expand_message_xmd() function defined in
/// <https://www.rfc-editor.org/rfc/rfc9380#section-5.3.1>.
///
/// The message may be supplied in multiple slices; they are hashed as their
/// concatenation.
///
/// # Errors
/// [`Error::InvalidLength`] if the tag is longer than 255 bytes or
/// `len_in_bytes` is zero or needs more than 255 hash blocks.
pub fn expand_message_xmd<H: BlockSizeUser + Digest + FixedOutputReset>(
    msg: &[&[u8]],
    dst: &[u8],
    len_in_bytes: usize,
) -> Result<Vec<u8>> {
    // DST, a byte string of at most 255 bytes.
    let dst_len = u8::try_from(dst.len()).map_err(|_| Error::InvalidLength)?;

    if len_in_bytes == 0 {
        return Err(Error::InvalidLength);
    }

    // b_in_bytes, b / 8 for b the output size of H in bits.
    let b_in_bytes = <H as Digest>::output_size();

    // s_in_bytes, the input block size of H, must not be smaller than its
    // output size.
    if b_in_bytes > Block::<H>::default().len() {
        return Err(Error::InvalidLength);
    }

    // ell = ceil(len_in_bytes / b_in_bytes); ABORT if ell > 255
    let ell = u8::try_from((len_in_bytes + b_in_bytes - 1) / b_in_bytes)
        .map_err(|_| Error::InvalidLength)?;

    let mut hash = H::new();

    // b_0 = H(msg_prime)
    // msg_prime = Z_pad || msg || l_i_b_str || I2OSP(0, 1) || DST_prime
    // Z_pad = I2OSP(0, s_in_bytes)
    Digest::update(&mut hash, Block::<H>::default());
    for msg in msg {
        Digest::update(&mut hash, msg);
    }
    // l_i_b_str = I2OSP(len_in_bytes, 2)
    Digest::update(&mut hash, i2osp_2(len_in_bytes)?);
    Digest::update(&mut hash, [0u8]);
    // DST_prime = DST || I2OSP(len(DST), 1)
    Digest::update(&mut hash, dst);
    Digest::update(&mut hash, [dst_len]);
    let b_0 = hash.finalize_reset();

    let mut uniform_bytes = Vec::with_capacity(usize::from(ell) * b_in_bytes);
    let mut b_i = Output::<H>::default();

    // b_1 = H(b_0 || I2OSP(1, 1) || DST_prime)
    // b_i = H(strxor(b_0, b_(i - 1)) || I2OSP(i, 1) || DST_prime)
    // The first round xors b_0 against all-zero bytes, yielding b_0 itself.
    for i in 1..=ell {
        Digest::update(&mut hash, xor::<H>(&b_0, &b_i));
        Digest::update(&mut hash, [i]);
        Digest::update(&mut hash, dst);
        Digest::update(&mut hash, [dst_len]);
        b_i = hash.finalize_reset();
        uniform_bytes.extend_from_slice(&b_i);
    }

    // return substr(uniform_bytes, 0, len_in_bytes)
    uniform_bytes.truncate(len_in_bytes);
    Ok(uniform_bytes)
}

/// Hashes a message to a ristretto255 group element.
///
/// Implements `hash_to_ristretto255` from RFC 9380 with SHA-512 under
/// [`HASH_TO_GROUP_DST`]: 64 uniform bytes from [`expand_message_xmd`] are
/// fed to the uniform-bytes map of the group.
pub fn hash_to_group(msg: &[u8]) -> Result<RistrettoPoint> {
    let uniform_bytes = expand_message_xmd::<Sha512>(&[msg], HASH_TO_GROUP_DST, UNIFORM_BYTES)?;
    let uniform_bytes: [u8; UNIFORM_BYTES] = uniform_bytes
        .as_slice()
        .try_into()
        .map_err(|_| Error::InvalidLength)?;
    Ok(RistrettoPoint::from_uniform_bytes(&uniform_bytes))
}

/// Computes the finalization hash
/// `SHA512(I2OSP(len(input), 2) || input || I2OSP(len(n), 2) || n || "Finalize")`.
///
/// # Errors
/// [`Error::InvalidLength`] if the input is longer than 65535 bytes.
pub fn finalize_hash(input: &[u8], unblinded_element: &[u8; ELEMENT_BYTES]) -> Result<[u8; OPRF_BYTES]> {
    let digest = Sha512::new()
        .chain_update(i2osp_2(input.len())?)
        .chain_update(input)
        .chain_update(i2osp_2(unblinded_element.len())?)
        .chain_update(unblinded_element)
        .chain_update(FINALIZE_DST)
        .finalize();

    let mut output = [0u8; OPRF_BYTES];
    output.copy_from_slice(&digest);
    Ok(output)
}
