// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Errors which are produced during an execution of the protocol

use displaydoc::Display;

/// [`Result`](core::result::Result) shorthand that uses [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

/// Represents an error in the manipulation of internal cryptographic data
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Error {
    /// An input byte string has the wrong size or exceeds a 16-bit length field
    InvalidLength,
    /// A scalar or element is not the canonical encoding of a field or group element
    InvalidEncoding,
    /// The parameters must satisfy 2 <= threshold <= n <= 255
    InvalidParameters,
    /// Duplicate, zero, or inconsistent peer indices
    InvalidPeers,
    /// No parts were supplied for combination or interpolation
    InsufficientParts,
    /// A share was addressed to a different participant
    InconsistentIndex,
    /// A share is not consistent with its peer's polynomial commitments
    CommitmentMismatch,
    /// The random number generator failed to produce output
    RandomnessFailure,
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
