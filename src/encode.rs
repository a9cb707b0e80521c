//! Conversion of a party's plaintext sum into masked wire labels.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::data_types::{EncodedBit, KeyPair, PartyInput, WireId};

/// Errors raised while encoding a party's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The value needs more bits than the party has input wires.
    InputOverflow {
        /// Bits required by the binary representation of the value.
        bits_needed: u32,
        /// Input wires assigned to the party.
        wires_available: usize,
    },
    /// No key pair exists for one of the party's input wires.
    MissingKey(WireId),
    /// No permutation bit exists for one of the party's input wires.
    MissingPermutationBit(WireId),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InputOverflow {
                bits_needed,
                wires_available,
            } => write!(
                f,
                "input needs {bits_needed} bits but the party only has {wires_available} input wires"
            ),
            Error::MissingKey(w) => write!(f, "no key pair for input wire {w}"),
            Error::MissingPermutationBit(w) => write!(f, "no permutation bit for input wire {w}"),
        }
    }
}

/// Encodes a plaintext value onto a party's input wires.
///
/// The value's binary representation is zero-extended on the most significant
/// side to the party's wire count; wire order defines bit significance, most
/// significant bit first. Each wire receives the key standing for its
/// plaintext bit together with the bit masked by the wire's permutation bit.
/// Values needing more bits than there are wires are rejected rather than
/// truncated.
///
/// Pure function of its inputs: for fixed keys and permutation bits the same
/// value always yields the same [`PartyInput`].
pub fn encode(
    wires: &[WireId],
    value: u128,
    keys: &HashMap<WireId, KeyPair>,
    pbits: &HashMap<WireId, bool>,
) -> Result<PartyInput, Error> {
    let bits_needed = u128::BITS - value.leading_zeros();
    if bits_needed as usize > wires.len() {
        return Err(Error::InputOverflow {
            bits_needed,
            wires_available: wires.len(),
        });
    }
    let mut input = PartyInput::new();
    for (i, &wire) in wires.iter().enumerate() {
        let shift = wires.len() - 1 - i;
        let bit = shift < u128::BITS as usize && value >> shift & 1 == 1;
        let pair = keys.get(&wire).ok_or(Error::MissingKey(wire))?;
        let pbit = *pbits.get(&wire).ok_or(Error::MissingPermutationBit(wire))?;
        input.insert(
            wire,
            EncodedBit {
                label: pair.select(bit),
                masked: pbit ^ bit,
            },
        );
    }
    debug!(wires = wires.len(), "encoded party input");
    Ok(input)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::data_types::Label;

    /// Key and permutation-bit stores for the given wires, as the garbling
    /// step would produce them.
    fn stores(
        wires: &[WireId],
        seed: u64,
    ) -> (HashMap<WireId, KeyPair>, HashMap<WireId, bool>) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut keys = HashMap::new();
        let mut pbits = HashMap::new();
        for &wire in wires {
            keys.insert(wire, KeyPair(Label::random(&mut rng), Label::random(&mut rng)));
            pbits.insert(wire, rng.random());
        }
        (keys, pbits)
    }

    /// Recovers the encoded integer by unmasking each wire's bit with the
    /// same permutation bits.
    fn unmask(wires: &[WireId], input: &PartyInput, pbits: &HashMap<WireId, bool>) -> u128 {
        let mut value = 0;
        for wire in wires {
            value = value << 1 | (input[wire].masked ^ pbits[wire]) as u128;
        }
        value
    }

    #[test]
    fn zero_extends_short_values() {
        let wires = [4, 7, 9, 12, 3];
        let (keys, pbits) = stores(&wires, 11);
        let input = encode(&wires, 0b101, &keys, &pbits).unwrap();
        assert_eq!(input.len(), wires.len());
        assert_eq!(unmask(&wires, &input, &pbits), 0b101);
        // the two zero-extended high wires carry the bit-0 key
        assert_eq!(input[&4].label, keys[&4].select(false));
        assert_eq!(input[&7].label, keys[&7].select(false));
        assert_eq!(input[&9].label, keys[&9].select(true));
    }

    #[test]
    fn rejects_values_wider_than_the_wire_count() {
        let wires = [1, 2, 3, 4, 5];
        let (keys, pbits) = stores(&wires, 12);
        let err = encode(&wires, 32, &keys, &pbits).unwrap_err();
        assert_eq!(
            err,
            Error::InputOverflow {
                bits_needed: 6,
                wires_available: 5
            }
        );
        assert!(encode(&wires, 31, &keys, &pbits).is_ok());
    }

    #[test]
    fn reports_missing_key_material() {
        let wires = [1, 2];
        let (keys, pbits) = stores(&[1], 13);
        assert_eq!(encode(&wires, 0, &keys, &pbits), Err(Error::MissingKey(2)));
    }

    #[test]
    fn encoding_is_deterministic() {
        let wires = [8, 6, 5];
        let (keys, pbits) = stores(&wires, 14);
        assert_eq!(
            encode(&wires, 5, &keys, &pbits).unwrap(),
            encode(&wires, 5, &keys, &pbits).unwrap()
        );
    }

    fn wires_and_value() -> BoxedStrategy<(Vec<WireId>, u128)> {
        (1usize..64)
            .prop_flat_map(|width| {
                (Just((100..100 + width).collect::<Vec<_>>()), 0u128..1 << width)
            })
            .boxed()
    }

    proptest! {
        #[test]
        fn unmasking_recovers_the_encoded_value((wires, value) in wires_and_value()) {
            let (keys, pbits) = stores(&wires, 15);
            let input = encode(&wires, value, &keys, &pbits).unwrap();
            prop_assert_eq!(unmask(&wires, &input, &pbits), value);
            for (i, wire) in wires.iter().enumerate() {
                let bit = value >> (wires.len() - 1 - i) & 1 == 1;
                prop_assert_eq!(input[wire].label, keys[wire].select(bit));
            }
        }
    }
}
