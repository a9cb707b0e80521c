//! Circuit descriptions and the JSON catalog they are loaded from.
//!
//! A catalog is a named set of circuits. Each circuit partitions its input
//! wires into the two parties' shares (`alice` and `bob`) and names its
//! output wires; all three lists are ordered most significant bit first, and
//! that order defines bit significance throughout the protocol.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data_types::WireId;

/// Errors raised while loading or validating a circuit catalog.
#[derive(Debug, Error)]
pub enum CircuitError {
    /// The catalog source could not be read.
    #[error("cannot read circuit catalog: {0}")]
    UnreadableSource(#[from] std::io::Error),
    /// The catalog source is not valid JSON or lacks required structure.
    #[error("malformed circuit catalog: {0}")]
    MalformedCatalog(#[from] serde_json::Error),
    /// A wire identifier is introduced more than once.
    #[error("circuit {circuit:?} defines wire {wire} more than once")]
    DuplicateWire {
        /// The circuit containing the duplicate.
        circuit: String,
        /// The duplicated wire identifier.
        wire: WireId,
    },
    /// A gate reads a wire that no input or earlier gate defines.
    #[error("circuit {circuit:?}: gate {gate} reads undefined wire {wire}")]
    UndefinedWire {
        /// The circuit containing the gate.
        circuit: String,
        /// The gate's output wire identifier.
        gate: WireId,
        /// The undefined wire it reads.
        wire: WireId,
    },
    /// A gate has the wrong number of inputs for its operator.
    #[error("circuit {circuit:?}: gate {gate} expects {expected} inputs, found {found}")]
    WrongArity {
        /// The circuit containing the gate.
        circuit: String,
        /// The gate's output wire identifier.
        gate: WireId,
        /// Inputs required by the gate's operator.
        expected: usize,
        /// Inputs present in the description.
        found: usize,
    },
    /// An output wire does not exist in the circuit.
    #[error("circuit {circuit:?} declares unknown output wire {wire}")]
    UnknownOutput {
        /// The circuit declaring the output.
        circuit: String,
        /// The unknown wire identifier.
        wire: WireId,
    },
}

/// The boolean operator computed by a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateOp {
    /// Negation of a single input.
    Not,
    /// Logical conjunction.
    And,
    /// Logical disjunction.
    Or,
    /// Exclusive or.
    Xor,
    /// Negated conjunction.
    Nand,
    /// Negated disjunction.
    Nor,
    /// Negated exclusive or.
    Xnor,
}

impl GateOp {
    /// The number of input wires the operator consumes.
    pub fn arity(self) -> usize {
        match self {
            GateOp::Not => 1,
            _ => 2,
        }
    }

    /// Applies the operator to plaintext bits. Unary operators ignore `y`.
    pub fn apply(self, x: bool, y: bool) -> bool {
        match self {
            GateOp::Not => !x,
            GateOp::And => x & y,
            GateOp::Or => x | y,
            GateOp::Xor => x ^ y,
            GateOp::Nand => !(x & y),
            GateOp::Nor => !(x | y),
            GateOp::Xnor => !(x ^ y),
        }
    }
}

/// A single gate: its output wire, its operator, and its input wires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gate {
    /// The wire carrying this gate's output.
    pub id: WireId,
    /// The boolean operator the gate computes.
    #[serde(rename = "type")]
    pub op: GateOp,
    /// The input wires, in operand order.
    #[serde(rename = "in")]
    pub inputs: Vec<WireId>,
}

/// A two-party boolean circuit with named input partitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circuit {
    /// Human-readable circuit identifier.
    pub id: String,
    /// Party A's input wires, most significant bit first.
    pub alice: Vec<WireId>,
    /// Party B's input wires, most significant bit first.
    pub bob: Vec<WireId>,
    /// Output wires, most significant bit first.
    pub out: Vec<WireId>,
    /// Gates in evaluation order.
    pub gates: Vec<Gate>,
}

impl Circuit {
    /// All wires of the circuit: both parties' inputs, then gate outputs.
    pub fn wires(&self) -> impl Iterator<Item = WireId> + '_ {
        self.alice
            .iter()
            .chain(&self.bob)
            .copied()
            .chain(self.gates.iter().map(|gate| gate.id))
    }

    /// Checks the structural invariants of the circuit description.
    ///
    /// The parties' input wires and the gate output wires must be disjoint
    /// identifier spaces, gates may only read wires defined before them, and
    /// every declared output wire must exist.
    pub fn validate(&self) -> Result<(), CircuitError> {
        let mut known = HashSet::new();
        for &wire in self.alice.iter().chain(&self.bob) {
            if !known.insert(wire) {
                return Err(CircuitError::DuplicateWire {
                    circuit: self.id.clone(),
                    wire,
                });
            }
        }
        for gate in &self.gates {
            if gate.inputs.len() != gate.op.arity() {
                return Err(CircuitError::WrongArity {
                    circuit: self.id.clone(),
                    gate: gate.id,
                    expected: gate.op.arity(),
                    found: gate.inputs.len(),
                });
            }
            for &wire in &gate.inputs {
                if !known.contains(&wire) {
                    return Err(CircuitError::UndefinedWire {
                        circuit: self.id.clone(),
                        gate: gate.id,
                        wire,
                    });
                }
            }
            if !known.insert(gate.id) {
                return Err(CircuitError::DuplicateWire {
                    circuit: self.id.clone(),
                    wire: gate.id,
                });
            }
        }
        for &wire in &self.out {
            if !known.contains(&wire) {
                return Err(CircuitError::UnknownOutput {
                    circuit: self.id.clone(),
                    wire,
                });
            }
        }
        Ok(())
    }
}

/// A named set of circuits loaded from a JSON catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// The catalog name.
    pub name: String,
    /// The circuits, in catalog order.
    pub circuits: Vec<Circuit>,
}

impl Catalog {
    /// Parses and validates a catalog from its JSON source.
    pub fn parse(source: &str) -> Result<Self, CircuitError> {
        let catalog: Catalog = serde_json::from_str(source)?;
        for circuit in &catalog.circuits {
            circuit.validate()?;
        }
        Ok(catalog)
    }

    /// Reads, parses and validates a catalog from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CircuitError> {
        Self::parse(&fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "name": "minimal",
        "circuits": [{
            "id": "and",
            "alice": [1],
            "bob": [2],
            "out": [3],
            "gates": [{"id": 3, "type": "AND", "in": [1, 2]}]
        }]
    }"#;

    #[test]
    fn parses_a_minimal_catalog() {
        let catalog = Catalog::parse(MINIMAL).unwrap();
        assert_eq!(catalog.name, "minimal");
        assert_eq!(catalog.circuits.len(), 1);
        let circuit = &catalog.circuits[0];
        assert_eq!(circuit.alice, vec![1]);
        assert_eq!(circuit.bob, vec![2]);
        assert_eq!(circuit.gates[0].op, GateOp::And);
    }

    #[test]
    fn rejects_missing_structure() {
        let missing_name = r#"{"circuits": []}"#;
        assert!(matches!(
            Catalog::parse(missing_name),
            Err(CircuitError::MalformedCatalog(_))
        ));
        let missing_partition = r#"{
            "name": "bad",
            "circuits": [{"id": "x", "alice": [1], "out": [], "gates": []}]
        }"#;
        assert!(matches!(
            Catalog::parse(missing_partition),
            Err(CircuitError::MalformedCatalog(_))
        ));
    }

    #[test]
    fn rejects_overlapping_input_partitions() {
        let overlapping = r#"{
            "name": "bad",
            "circuits": [{
                "id": "x",
                "alice": [1, 2],
                "bob": [2],
                "out": [3],
                "gates": [{"id": 3, "type": "XOR", "in": [1, 2]}]
            }]
        }"#;
        assert!(matches!(
            Catalog::parse(overlapping),
            Err(CircuitError::DuplicateWire { wire: 2, .. })
        ));
    }

    #[test]
    fn rejects_gates_reading_undefined_wires() {
        let dangling = r#"{
            "name": "bad",
            "circuits": [{
                "id": "x",
                "alice": [1],
                "bob": [2],
                "out": [3],
                "gates": [{"id": 3, "type": "OR", "in": [1, 9]}]
            }]
        }"#;
        assert!(matches!(
            Catalog::parse(dangling),
            Err(CircuitError::UndefinedWire { gate: 3, wire: 9, .. })
        ));
    }

    #[test]
    fn rejects_wrong_gate_arity() {
        let unary_and = r#"{
            "name": "bad",
            "circuits": [{
                "id": "x",
                "alice": [1],
                "bob": [2],
                "out": [3],
                "gates": [{"id": 3, "type": "AND", "in": [1]}]
            }]
        }"#;
        assert!(matches!(
            Catalog::parse(unary_and),
            Err(CircuitError::WrongArity { gate: 3, expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn rejects_unknown_output_wires() {
        let phantom_out = r#"{
            "name": "bad",
            "circuits": [{
                "id": "x",
                "alice": [1],
                "bob": [2],
                "out": [7],
                "gates": [{"id": 3, "type": "XNOR", "in": [1, 2]}]
            }]
        }"#;
        assert!(matches!(
            Catalog::parse(phantom_out),
            Err(CircuitError::UnknownOutput { wire: 7, .. })
        ));
    }

    #[test]
    fn gate_ops_apply_their_truth_tables() {
        for (x, y) in [(false, false), (false, true), (true, false), (true, true)] {
            assert_eq!(GateOp::And.apply(x, y), x & y);
            assert_eq!(GateOp::Or.apply(x, y), x | y);
            assert_eq!(GateOp::Xor.apply(x, y), x ^ y);
            assert_eq!(GateOp::Nand.apply(x, y), !(x & y));
            assert_eq!(GateOp::Nor.apply(x, y), !(x | y));
            assert_eq!(GateOp::Xnor.apply(x, y), x == y);
        }
        assert!(GateOp::Not.apply(false, false));
        assert!(!GateOp::Not.apply(true, true));
    }
}
