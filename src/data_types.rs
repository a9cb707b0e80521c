//! Data types shared across the different layers of the protocol.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::BitXor;

use rand::Rng;
use serde::de::Error as _;
use serde::{Deserialize, Serialize};

/// Identifies a wire in the circuit graph.
///
/// Wire identifiers come from the circuit description and are stable across
/// garbling and evaluation of the same circuit instance.
pub type WireId = usize;

/// One of the two keys of a wire, standing for a single bit value.
///
/// Observing a label reveals nothing about the bit it stands for without the
/// wire's permutation bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(pub u128);

impl Label {
    /// Draws a fresh random label.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Label(rng.random())
    }
}

impl BitXor for Label {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self::Output {
        Label(self.0 ^ rhs.0)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

// Labels cross serialization boundaries as fixed-width hex strings: JSON
// numbers cannot carry a full 128-bit value.
impl Serialize for Label {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:032x}", self.0))
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        u128::from_str_radix(&hex, 16)
            .map(Label)
            .map_err(|_| D::Error::custom(format!("invalid wire label {hex:?}")))
    }
}

/// The two keys of a wire, indexed by the bit value they stand for.
///
/// Created once per circuit instance by the garbling step and immutable
/// afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair(pub Label, pub Label);

impl KeyPair {
    /// The key standing for the given bit value.
    pub fn select(&self, bit: bool) -> Label {
        if bit { self.1 } else { self.0 }
    }
}

/// A single encoded input bit: the selected key plus the masked bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedBit {
    /// The key standing for the wire's plaintext bit.
    pub label: Label,
    /// The plaintext bit XORed with the wire's permutation bit.
    pub masked: bool,
}

/// A party's full encoded input, one entry per input wire of that party.
///
/// Created fresh per protocol run and discarded after one evaluation.
pub type PartyInput = BTreeMap<WireId, EncodedBit>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_serializes_as_hex() {
        let label = Label(0x00ab_u128 << 64 | 0xcd);
        let json = serde_json::to_string(&label).unwrap();
        assert_eq!(json, "\"00000000000000ab00000000000000cd\"");
        let parsed: Label = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, label);
    }

    #[test]
    fn key_pair_selects_by_bit() {
        let pair = KeyPair(Label(1), Label(2));
        assert_eq!(pair.select(false), Label(1));
        assert_eq!(pair.select(true), Label(2));
    }
}
