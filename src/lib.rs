// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! An implementation of a threshold oblivious pseudorandom function (OPRF)
//! over the ristretto255 group, wire-compatible with liboprf.
//!
//! # Overview
//!
//! An oblivious pseudorandom function is a two-party protocol between a
//! client and a server for computing `F(k, x)` where the server holds the
//! key `k` and the client holds the input `x`: the server learns nothing
//! about the input, and the client learns only the function output. This
//! crate implements three cooperating primitives for the
//! `ristretto255-SHA512` ciphersuite of RFC 9497 in OPRF mode:
//!
//! - the basic two-party protocol ([`oprf`]),
//! - a threshold variant in which the key is Shamir-shared across `n`
//!   servers and any `threshold` of them evaluate jointly ([`threshold`]),
//!   including the session-bound 3HashTDH evaluation, and
//! - a verifiable distributed key generation ceremony producing such key
//!   shares without a trusted dealer ([`dkg`]).
//!
//! All values crossing the public API are canonical byte encodings — 32-byte
//! scalars and group elements, 33-byte shares and evaluation parts, 64-byte
//! outputs — so the crate composes directly with the C implementation over
//! any transport. Transport itself, share distribution, and commitment
//! broadcast are out of scope.
//!
//! # Basic protocol
//!
//! ```
//! use rand::rngs::OsRng;
//! use toprf::oprf;
//!
//! // Server: generate a private key.
//! let key = oprf::keygen(&mut OsRng)?;
//!
//! // Client: blind the input and send `blinded_element` to the server.
//! let (blind, blinded_element) = oprf::blind(b"input", &mut OsRng)?;
//!
//! // Server: evaluate and respond.
//! let evaluation_element = oprf::evaluate(&key, &blinded_element)?;
//!
//! // Client: unblind the response and derive the 64-byte output.
//! let unblinded_element = oprf::unblind(&blind, &evaluation_element)?;
//! let output = oprf::finalize(b"input", &unblinded_element)?;
//! # Ok::<(), toprf::Error>(())
//! ```
//!
//! # Threshold evaluation
//!
//! The server key can be split so that no single machine ever holds it:
//!
//! ```
//! use rand::rngs::OsRng;
//! use toprf::{oprf, threshold};
//!
//! let key = oprf::keygen(&mut OsRng)?;
//! let shares = threshold::create_shares(&key, 3, 2, &mut OsRng)?;
//!
//! let (blind, blinded_element) = oprf::blind(b"input", &mut OsRng)?;
//!
//! // Servers 1 and 2 evaluate; each bakes in its Lagrange coefficient.
//! let peers = [1, 2];
//! let parts = [
//!     threshold::evaluate(&shares[0], &blinded_element, &peers)?.to_bytes(),
//!     threshold::evaluate(&shares[1], &blinded_element, &peers)?.to_bytes(),
//! ];
//!
//! // The combined parts equal the whole-key evaluation.
//! let evaluation_element = threshold::threshold_combine(&parts)?;
//! assert_eq!(evaluation_element, oprf::evaluate(&key, &blinded_element)?);
//! # Ok::<(), toprf::Error>(())
//! ```
//!
//! [`threshold::three_hash_tdh`] is the hardened per-session evaluation: it
//! additionally masks each response with a share of zero bound to a session
//! identifier, so that even an adversary holding every key share learns
//! nothing about past outputs. Key shares for either variant are best
//! produced by the [`dkg`] ceremony, which never materializes the key at
//! all.
//!
//! # Security notes
//!
//! - Every scalar and group operation on secret material is delegated to
//!   `curve25519-dalek` and runs in constant time; commitment checks in the
//!   DKG compare canonical encodings with constant-time equality.
//! - Randomness is always drawn from a caller-supplied
//!   [`CryptoRng`](rand_core::CryptoRng); seed it from the operating system.
//! - Zeroization is best-effort: polynomial coefficients, blinding buffers,
//!   and [`threshold::Share`] values are wiped on drop, but scalars are
//!   `Copy` and Rust may leave transient copies on the stack or in
//!   registers. Callers with stronger requirements must provide their own
//!   memory hygiene.
//!
//! # Features
//!
//! - `serde` (default): serialization of [`Share`] and [`Part`] through
//!   their wire encodings.
//! - `std` (default): implements [`std::error::Error`] for [`Error`]. The
//!   crate is `no_std` otherwise and only requires `alloc`.

#![deny(unsafe_code)]
#![no_std]
#![warn(clippy::cargo, missing_docs)]
#![allow(clippy::multiple_crate_versions)]

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

mod error;
mod group;
mod util;

pub mod dkg;
pub mod hash;
pub mod oprf;
#[cfg(feature = "serde")]
mod serialization;
pub mod threshold;

// Exports

pub use curve25519_dalek;

pub use crate::error::{Error, Result};
pub use crate::group::{ELEMENT_BYTES, SCALAR_BYTES};
pub use crate::hash::OPRF_BYTES;
pub use crate::threshold::{Part, Share, PART_BYTES, SHARE_BYTES};
