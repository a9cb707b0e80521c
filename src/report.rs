//! Persisted records of a protocol run.
//!
//! Two artifacts survive a run: a transfer record, representing one party's
//! encoded input as it was handed to the evaluator, and a run record with
//! the decimal sum and the verification verdict. Both are JSON files and are
//! only written after the run has succeeded.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data_types::PartyInput;
use crate::protocol::Outcome;

/// One party's encoded input, as handed to the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// The circuit the input was encoded for.
    pub circuit: String,
    /// The contributing party.
    pub party: String,
    /// Wire → (key, masked bit) entries.
    pub entries: PartyInput,
}

/// The reported result of one protocol run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    /// The circuit that was evaluated.
    pub circuit: String,
    /// The decimal sum revealed by the evaluation.
    pub sum: u128,
    /// The verdict of the plaintext re-computation.
    pub verified: bool,
}

impl RunRecord {
    /// Builds the record for one finished run.
    pub fn new(circuit: &str, outcome: Outcome) -> Self {
        RunRecord {
            circuit: circuit.to_string(),
            sum: outcome.sum,
            verified: outcome.verified,
        }
    }
}

/// Writes a record as pretty-printed JSON. Nothing is written if the record
/// cannot be serialized.
pub fn write_json<T: Serialize>(path: impl AsRef<Path>, record: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(record).map_err(io::Error::other)?;
    fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::{EncodedBit, Label};

    #[test]
    fn transfer_records_survive_json() {
        let mut entries = PartyInput::new();
        entries.insert(1, EncodedBit { label: Label(u128::MAX - 5), masked: true });
        entries.insert(4, EncodedBit { label: Label(3), masked: false });
        let record = TransferRecord {
            circuit: "sum".into(),
            party: "alice".into(),
            entries,
        };
        let json = serde_json::to_string_pretty(&record).unwrap();
        let parsed: TransferRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
