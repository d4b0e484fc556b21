// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Serde support for the wire types, routed through their exact 33-byte
//! encodings: raw bytes in compact formats, hex strings in human-readable
//! ones.

use serde::de::Error as _;

// Implements `Serialize`/`Deserialize` for a wire type in terms of its
// `to_bytes`/`from_bytes` pair.
macro_rules! impl_serde_via_wire {
    ($name:ident) => {
        impl serde::Serialize for crate::threshold::$name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                if serializer.is_human_readable() {
                    serializer.serialize_str(&hex::encode(self.to_bytes()))
                } else {
                    serializer.serialize_bytes(&self.to_bytes())
                }
            }
        }

        impl<'de> serde::Deserialize<'de> for crate::threshold::$name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                if deserializer.is_human_readable() {
                    let encoded = <&str>::deserialize(deserializer)?;
                    let bytes = hex::decode(encoded).map_err(D::Error::custom)?;
                    Self::from_bytes(&bytes).map_err(D::Error::custom)
                } else {
                    struct WireVisitor;

                    impl<'de> serde::de::Visitor<'de> for WireVisitor {
                        type Value = crate::threshold::$name;

                        fn expecting(
                            &self,
                            formatter: &mut core::fmt::Formatter<'_>,
                        ) -> core::fmt::Result {
                            formatter.write_str(core::concat!(
                                "the wire encoding of a ",
                                core::stringify!($name)
                            ))
                        }

                        fn visit_bytes<E>(self, value: &[u8]) -> Result<Self::Value, E>
                        where
                            E: serde::de::Error,
                        {
                            crate::threshold::$name::from_bytes(value).map_err(E::custom)
                        }
                    }

                    deserializer.deserialize_bytes(WireVisitor)
                }
            }
        }
    };
}

impl_serde_via_wire!(Share);
impl_serde_via_wire!(Part);
