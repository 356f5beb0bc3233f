//! Core identifier and amount types for the ARS protocol.
//!
//! Two identifier planes exist and must never collide:
//!
//! - [`Identity`] - an externally controlled party (an agent wallet, the
//!   protocol authority), derived from a public key under its own hash
//!   domain.
//! - [`Address`] - a protocol-derived state-object identifier, produced
//!   only by [`crate::address::derive_address`] under a distinct domain.
//!
//! Both are 256-bit BLAKE3 digests rendered as hex.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Token amount in smallest units (micro-ARU). Widened to `u128` for
/// intermediate products in cap and ratio arithmetic.
pub type Amount = u64;

/// Hash domain for external identities.
const IDENTITY_DOMAIN: &[u8] = b"ars:identity:v1";

/// Identity - an externally controlled party, derived from its public key.
///
/// Serializes as a hex string so identities can key JSON maps in emitted
/// snapshots.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity {
    id: [u8; 32],
}

impl Identity {
    /// Wrap raw identity bytes.
    pub fn new(id: [u8; 32]) -> Self {
        Self { id }
    }

    /// Derive an identity from a public key.
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(IDENTITY_DOMAIN);
        hasher.update(public_key);
        Self {
            id: *hasher.finalize().as_bytes(),
        }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.id
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.id)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..12])
    }
}

/// Address - a protocol-derived identifier for a state object.
///
/// Addresses are only ever produced by deterministic derivation; they are
/// the arena keys through which components reference each other's entities.
/// Serializes as a hex string, like [`Identity`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address {
    hash: [u8; 32],
}

impl Address {
    /// Wrap raw address bytes. Only the derivation path should call this.
    pub(crate) fn new(hash: [u8; 32]) -> Self {
        Self { hash }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.hash
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let mut hash = [0u8; 32];
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        hash.copy_from_slice(&bytes);
        Ok(Self { hash })
    }

    /// Reserved zero address; never produced by derivation.
    pub const ZERO: Self = Self { hash: [0u8; 32] };
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

fn decode_hex_32<E: serde::de::Error>(s: &str) -> Result<[u8; 32], E> {
    let bytes = hex::decode(s).map_err(E::custom)?;
    let mut out = [0u8; 32];
    if bytes.len() != 32 {
        return Err(E::custom("expected 32 hex-encoded bytes"));
    }
    out.copy_from_slice(&bytes);
    Ok(out)
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self {
            id: decode_hex_32::<D::Error>(&s)?,
        })
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self {
            hash: decode_hex_32::<D::Error>(&s)?,
        })
    }
}
