// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Helper functions

use crate::{Error, Result};

// Corresponds to I2OSP(input, 2) from RFC 8017. Every length prefix on the
// wire is a 16-bit big-endian integer.
pub(crate) fn i2osp_2(input: usize) -> Result<[u8; 2]> {
    u16::try_from(input)
        .map(u16::to_be_bytes)
        .map_err(|_| Error::InvalidLength)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i2osp_2_bounds() {
        assert_eq!(i2osp_2(0), Ok([0, 0]));
        assert_eq!(i2osp_2(258), Ok([1, 2]));
        assert_eq!(i2osp_2(65535), Ok([0xff, 0xff]));
        assert_eq!(i2osp_2(65536), Err(Error::InvalidLength));
    }
}
