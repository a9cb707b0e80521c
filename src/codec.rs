//! Bit-string and integer conversions at the protocol boundary.
//!
//! Plaintext input sources are whitespace-separated non-negative integers;
//! revealed outputs are per-wire bits concatenated most significant bit
//! first.

use std::collections::HashMap;

use thiserror::Error;

use crate::data_types::WireId;

/// Errors raised while parsing plaintext inputs or decoding revealed
/// outputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A plaintext input token is not a non-negative integer.
    #[error("input token {token:?} is not a non-negative integer")]
    MalformedInput {
        /// The offending token.
        token: String,
    },
    /// The evaluation yielded no value for a declared output wire.
    #[error("no result bit for output wire {0}")]
    IncompleteResult(WireId),
    /// More output wires are declared than the result integer can represent.
    #[error("{0} output wires exceed the 128-bit result range")]
    OutputTooWide(usize),
}

/// Parses a party's plaintext input source into its integer values.
pub fn parse_values(source: &str) -> Result<Vec<u64>, Error> {
    source
        .split_whitespace()
        .map(|token| {
            token.parse().map_err(|_| Error::MalformedInput {
                token: token.to_string(),
            })
        })
        .collect()
}

/// Decodes the revealed output bits into an unsigned integer, reading the
/// wires most significant bit first.
pub fn decode(result: &HashMap<WireId, bool>, out_wires: &[WireId]) -> Result<u128, Error> {
    if out_wires.len() > u128::BITS as usize {
        return Err(Error::OutputTooWide(out_wires.len()));
    }
    let mut value = 0u128;
    for &wire in out_wires {
        let &bit = result.get(&wire).ok_or(Error::IncompleteResult(wire))?;
        value = value << 1 | bit as u128;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn parses_whitespace_separated_integers() {
        assert_eq!(parse_values("2 3").unwrap(), vec![2, 3]);
        assert_eq!(parse_values("  1\n1\t1 ").unwrap(), vec![1, 1, 1]);
        assert_eq!(parse_values("").unwrap(), Vec::<u64>::new());
    }

    #[test]
    fn rejects_non_integer_tokens() {
        let err = parse_values("1 abc 3").unwrap_err();
        assert_eq!(err, Error::MalformedInput { token: "abc".into() });
        let err = parse_values("-4").unwrap_err();
        assert_eq!(err, Error::MalformedInput { token: "-4".into() });
    }

    #[test]
    fn decodes_bits_most_significant_first() {
        let result = HashMap::from([(30, true), (31, false), (32, false), (33, false)]);
        assert_eq!(decode(&result, &[30, 31, 32, 33]).unwrap(), 8);
        assert_eq!(decode(&result, &[31, 32, 33, 30]).unwrap(), 1);
    }

    #[test]
    fn reports_missing_output_wires() {
        let result = HashMap::from([(1, true), (2, false), (4, true)]);
        let err = decode(&result, &[1, 2, 3, 4]).unwrap_err();
        assert_eq!(err, Error::IncompleteResult(3));
    }

    #[test]
    fn rejects_outputs_wider_than_the_result_range() {
        let wires: Vec<WireId> = (0..129).collect();
        let result: HashMap<WireId, bool> = wires.iter().map(|&w| (w, false)).collect();
        assert_eq!(decode(&result, &wires).unwrap_err(), Error::OutputTooWide(129));
    }

    proptest! {
        #[test]
        fn decoding_inverts_bit_concatenation(bits in proptest::collection::vec(any::<bool>(), 1..100)) {
            let wires: Vec<WireId> = (0..bits.len()).collect();
            let result: HashMap<WireId, bool> =
                wires.iter().copied().zip(bits.iter().copied()).collect();
            let expected = bits.iter().fold(0u128, |acc, &bit| acc << 1 | bit as u128);
            prop_assert_eq!(decode(&result, &wires).unwrap(), expected);
        }
    }
}
