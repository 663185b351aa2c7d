//! # Core Identifiers
//!
//! Every identifier in the ledger is a 32-byte binary value. Each role gets
//! its own newtype so that a `UserId` can never be passed where an
//! `AssetGroupId` is expected.
//!
//! ## Clusters
//!
//! - **Hosting**: `DomainId`, `NodeId`
//! - **Parties**: `UserId`
//! - **Ledger content**: `TransactionId`, `AssetGroupId`, `AssetId`

use crate::errors::IdError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length in bytes of every identifier.
pub const ID_LENGTH: usize = 32;

/// Common construction/inspection API shared by all identifier newtypes.
pub trait Identifier: Sized + Copy {
    /// Human-readable type name used in error messages.
    const KIND: &'static str;

    /// Build from a byte slice, rejecting anything that is not exactly
    /// [`ID_LENGTH`] bytes.
    fn from_slice(bytes: &[u8]) -> Result<Self, IdError>;

    /// Raw bytes.
    fn as_bytes(&self) -> &[u8; ID_LENGTH];

    /// Parse from a hex string.
    fn from_hex(s: &str) -> Result<Self, IdError> {
        let bytes = hex::decode(s.trim()).map_err(|_| IdError::InvalidHex { kind: Self::KIND })?;
        Self::from_slice(&bytes)
    }

    /// Full hex encoding.
    fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// First four bytes as hex, for log lines.
    fn short(&self) -> String {
        hex::encode(&self.as_bytes()[..4])
    }
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        pub struct $name(pub [u8; ID_LENGTH]);

        impl $name {
            /// Wrap raw bytes.
            pub const fn new(bytes: [u8; ID_LENGTH]) -> Self {
                Self(bytes)
            }

            /// Copy the bytes into an owned vector (wire representation).
            pub fn to_vec(&self) -> Vec<u8> {
                self.0.to_vec()
            }
        }

        impl Identifier for $name {
            const KIND: &'static str = stringify!($name);

            fn from_slice(bytes: &[u8]) -> Result<Self, IdError> {
                let array: [u8; ID_LENGTH] =
                    bytes.try_into().map_err(|_| IdError::InvalidLength {
                        kind: Self::KIND,
                        expected: ID_LENGTH,
                        actual: bytes.len(),
                    })?;
                Ok(Self(array))
            }

            fn as_bytes(&self) -> &[u8; ID_LENGTH] {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.short())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; ID_LENGTH]> for $name {
            fn from(bytes: [u8; ID_LENGTH]) -> Self {
                Self(bytes)
            }
        }
    };
}

define_id!(
    /// Identifies one hosted ledger instance.
    DomainId
);
define_id!(
    /// Identifies this node inside a domain.
    NodeId
);
define_id!(
    /// Identifies an application user.
    UserId
);
define_id!(
    /// Content-derived transaction digest.
    TransactionId
);
define_id!(
    /// Logical partition key for assets.
    AssetGroupId
);
define_id!(
    /// Content-derived asset digest.
    AssetId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        let err = UserId::from_slice(&[1u8; 8]).unwrap_err();
        assert_eq!(
            err,
            IdError::InvalidLength {
                kind: "UserId",
                expected: 32,
                actual: 8
            }
        );
    }

    #[test]
    fn test_hex_roundtrip_and_short_form() {
        let id = DomainId::new([0xAB; 32]);
        let parsed = DomainId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(parsed, id);
        assert_eq!(id.short(), "abababab");
        assert_eq!(format!("{:?}", id), "DomainId(abababab)");
    }

    #[test]
    fn test_serde_json_roundtrip() {
        let id = TransactionId::new([7; 32]);
        let json = serde_json::to_string(&id).unwrap();
        let back: TransactionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
