//! The circuit-garbling and table-evaluation engine.
//!
//! Garbling draws two keys and one random permutation bit per wire and
//! encrypts one table row per truth-table entry of every gate. Evaluation is
//! table-driven: the masked bit carried alongside each key selects the row
//! to decrypt (point-and-permute), so no trial decryption is needed and no
//! intermediate plaintext value is ever visible to the evaluator.

use std::collections::HashMap;
use std::fmt;

use blake3::Hasher;
use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit},
};
use rand::Rng;
use tracing::debug;

use crate::catalog::{Circuit, Gate};
use crate::data_types::{EncodedBit, KeyPair, Label, PartyInput, WireId};

/// Errors raised while garbling or evaluating a circuit.
#[derive(Debug, Clone)]
pub enum Error {
    /// A table row could not be serialized or deserialized.
    Serde(String),
    /// A table row could not be encrypted.
    EncryptionFailed,
    /// A table row could not be decrypted.
    DecryptionFailed,
    /// No key material or permutation bit exists for the wire.
    MissingWire(WireId),
    /// No garbled table exists for the gate.
    MissingTable(WireId),
    /// A gate's input count does not match its operator.
    InvalidGate(WireId),
    /// No encoded input was provided for the input wire.
    WireWithoutInput(WireId),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Serde(e) => write!(f, "table row (de-)serialization failed: {e}"),
            Error::EncryptionFailed => f.write_str("table row encryption failed"),
            Error::DecryptionFailed => f.write_str("table row decryption failed"),
            Error::MissingWire(w) => write!(f, "no key material for wire {w}"),
            Error::MissingTable(w) => write!(f, "no garbled table for gate {w}"),
            Error::InvalidGate(w) => write!(f, "gate {w} has an invalid input count"),
            Error::WireWithoutInput(w) => write!(f, "no encoded input for wire {w}"),
        }
    }
}

/// The encrypted truth table of one gate, indexed by masked input bits.
pub type GarbledTable = Vec<Vec<u8>>;

/// Everything the garbling step produces for one circuit instance.
///
/// The key and permutation-bit stores are created once per instance and are
/// read-only afterwards; the orchestration layer only ever selects from
/// them.
#[derive(Debug, Clone)]
pub struct GarbledCircuit {
    keys: HashMap<WireId, KeyPair>,
    pbits: HashMap<WireId, bool>,
    tables: HashMap<WireId, GarbledTable>,
}

impl GarbledCircuit {
    /// The two keys of every wire, indexed by bit value.
    pub fn keys(&self) -> &HashMap<WireId, KeyPair> {
        &self.keys
    }

    /// The random permutation bit of every wire.
    pub fn pbits(&self) -> &HashMap<WireId, bool> {
        &self.pbits
    }

    /// The encrypted truth tables, one per gate.
    pub fn tables(&self) -> &HashMap<WireId, GarbledTable> {
        &self.tables
    }

    /// The permutation bits of the circuit's output wires, as needed to
    /// unmask revealed results.
    pub fn output_pbits(&self, circuit: &Circuit) -> HashMap<WireId, bool> {
        circuit
            .out
            .iter()
            .filter_map(|wire| self.pbits.get(wire).map(|&pbit| (*wire, pbit)))
            .collect()
    }
}

/// Garbles a circuit: draws a key pair and a permutation bit for every wire
/// and builds the encrypted table of every gate.
pub fn garble<R: Rng>(circuit: &Circuit, rng: &mut R) -> Result<GarbledCircuit, Error> {
    let mut keys = HashMap::new();
    let mut pbits = HashMap::new();
    for wire in circuit.wires() {
        keys.insert(wire, KeyPair(Label::random(rng), Label::random(rng)));
        pbits.insert(wire, rng.random());
    }
    let mut tables = HashMap::new();
    for gate in &circuit.gates {
        tables.insert(gate.id, garble_gate(gate, &keys, &pbits)?);
    }
    debug!(circuit = %circuit.id, gates = circuit.gates.len(), "garbled circuit");
    Ok(GarbledCircuit { keys, pbits, tables })
}

fn garble_gate(
    gate: &Gate,
    keys: &HashMap<WireId, KeyPair>,
    pbits: &HashMap<WireId, bool>,
) -> Result<GarbledTable, Error> {
    let out_keys = *keys.get(&gate.id).ok_or(Error::MissingWire(gate.id))?;
    let out_pbit = *pbits.get(&gate.id).ok_or(Error::MissingWire(gate.id))?;
    match gate.inputs[..] {
        [x] => {
            let keys_x = *keys.get(&x).ok_or(Error::MissingWire(x))?;
            let pbit_x = *pbits.get(&x).ok_or(Error::MissingWire(x))?;
            let mut rows = vec![Vec::new(); 2];
            for bit in [false, true] {
                let out_bit = gate.op.apply(bit, bit);
                let row = (bit ^ pbit_x) as usize;
                let label = keys_x.select(bit);
                let garbling_key = GarblingKey::new(label, label, gate.id, row as u8);
                rows[row] =
                    encrypt(&garbling_key, (out_keys.select(out_bit), out_pbit ^ out_bit))?;
            }
            Ok(rows)
        }
        [x, y] => {
            let keys_x = *keys.get(&x).ok_or(Error::MissingWire(x))?;
            let keys_y = *keys.get(&y).ok_or(Error::MissingWire(y))?;
            let pbit_x = *pbits.get(&x).ok_or(Error::MissingWire(x))?;
            let pbit_y = *pbits.get(&y).ok_or(Error::MissingWire(y))?;
            let mut rows = vec![Vec::new(); 4];
            for bit_x in [false, true] {
                for bit_y in [false, true] {
                    let out_bit = gate.op.apply(bit_x, bit_y);
                    let row = 2 * ((bit_x ^ pbit_x) as usize) + ((bit_y ^ pbit_y) as usize);
                    let garbling_key = GarblingKey::new(
                        keys_x.select(bit_x),
                        keys_y.select(bit_y),
                        gate.id,
                        row as u8,
                    );
                    rows[row] =
                        encrypt(&garbling_key, (out_keys.select(out_bit), out_pbit ^ out_bit))?;
                }
            }
            Ok(rows)
        }
        _ => Err(Error::InvalidGate(gate.id)),
    }
}

/// Evaluates a garbled circuit on both parties' encoded inputs and returns
/// the unmasked plaintext bit of every output wire.
///
/// The evaluator only ever sees keys and masked bits; plaintext bits appear
/// exclusively for the output wires, after XORing with their permutation
/// bits.
pub fn evaluate(
    circuit: &Circuit,
    tables: &HashMap<WireId, GarbledTable>,
    output_pbits: &HashMap<WireId, bool>,
    alice: &PartyInput,
    bob: &PartyInput,
) -> Result<HashMap<WireId, bool>, Error> {
    let mut values: HashMap<WireId, EncodedBit> = HashMap::new();
    for (&wire, &encoded) in alice.iter().chain(bob) {
        values.insert(wire, encoded);
    }
    for &wire in circuit.alice.iter().chain(&circuit.bob) {
        if !values.contains_key(&wire) {
            return Err(Error::WireWithoutInput(wire));
        }
    }
    for gate in &circuit.gates {
        let rows = tables.get(&gate.id).ok_or(Error::MissingTable(gate.id))?;
        let (label, masked) = match gate.inputs[..] {
            [x] => {
                let input = *values.get(&x).ok_or(Error::WireWithoutInput(x))?;
                let row = input.masked as usize;
                let garbling_key = GarblingKey::new(input.label, input.label, gate.id, row as u8);
                let row = rows.get(row).ok_or(Error::MissingTable(gate.id))?;
                decrypt(&garbling_key, row)?
            }
            [x, y] => {
                let input_x = *values.get(&x).ok_or(Error::WireWithoutInput(x))?;
                let input_y = *values.get(&y).ok_or(Error::WireWithoutInput(y))?;
                let row = 2 * (input_x.masked as usize) + (input_y.masked as usize);
                let garbling_key =
                    GarblingKey::new(input_x.label, input_y.label, gate.id, row as u8);
                let row = rows.get(row).ok_or(Error::MissingTable(gate.id))?;
                decrypt(&garbling_key, row)?
            }
            _ => return Err(Error::InvalidGate(gate.id)),
        };
        values.insert(gate.id, EncodedBit { label, masked });
    }
    let mut outputs = HashMap::new();
    for &wire in &circuit.out {
        let encoded = values.get(&wire).ok_or(Error::WireWithoutInput(wire))?;
        let pbit = *output_pbits.get(&wire).ok_or(Error::MissingWire(wire))?;
        outputs.insert(wire, encoded.masked ^ pbit);
    }
    Ok(outputs)
}

#[derive(Debug)]
struct GarblingKey {
    label_x: Label,
    label_y: Label,
    wire: WireId,
    row: u8,
}

impl GarblingKey {
    fn new(label_x: Label, label_y: Label, wire: WireId, row: u8) -> Self {
        Self {
            label_x,
            label_y,
            wire,
            row,
        }
    }
}

/// Derive a key from the garbling key components using BLAKE3 for key commitment.
fn derive_commitment_key(key: &Key, nonce: &Nonce) -> Key {
    let mut hasher = Hasher::new();
    hasher.update(key);
    hasher.update(nonce);
    let derived_key = hasher.finalize();
    Key::from_slice(&derived_key.as_bytes()[..32]).to_owned()
}

/// Add a commitment to the plaintext using BLAKE3.
fn add_commitment(plaintext: &[u8], nonce: &Nonce) -> [u8; 16] {
    let mut hasher = Hasher::new();
    hasher.update(plaintext);
    hasher.update(nonce);
    let hash = hasher.finalize();
    let mut commitment = [0u8; 16];
    commitment.copy_from_slice(&hash.as_bytes()[..16]);
    commitment
}

/// Encrypt one table row using ChaCha20Poly1305.
fn encrypt(garbling_key: &GarblingKey, row: (Label, bool)) -> Result<Vec<u8>, Error> {
    let (key, nonce) = key_and_nonce(garbling_key);
    let commitment_key = derive_commitment_key(&key, &nonce);
    let cipher = ChaCha20Poly1305::new(&commitment_key);

    let mut bytes = bincode::serialize(&row).map_err(|e| Error::Serde(format!("{e:?}")))?;
    let commitment = add_commitment(&bytes, &nonce);
    bytes.extend_from_slice(&commitment);

    let ciphertext = cipher
        .encrypt(&nonce, bytes.as_ref())
        .map_err(|_| Error::EncryptionFailed)?;
    Ok(ciphertext)
}

/// Decrypt one table row using ChaCha20Poly1305.
fn decrypt(garbling_key: &GarblingKey, bytes: &[u8]) -> Result<(Label, bool), Error> {
    let (key, nonce) = key_and_nonce(garbling_key);
    let commitment_key = derive_commitment_key(&key, &nonce);
    let cipher = ChaCha20Poly1305::new(&commitment_key);

    let plaintext = cipher
        .decrypt(&nonce, bytes)
        .map_err(|_| Error::DecryptionFailed)?;

    // Ensure commitment is intact
    if plaintext.len() < 16 {
        return Err(Error::DecryptionFailed);
    }
    let (original_plaintext, commitment) = plaintext.split_at(plaintext.len() - 16);
    let expected_commitment = add_commitment(original_plaintext, &nonce);

    if commitment != expected_commitment {
        return Err(Error::DecryptionFailed);
    }

    bincode::deserialize(original_plaintext).map_err(|e| Error::Serde(format!("{e:?}")))
}

/// Extract key and nonce from a garbling key.
fn key_and_nonce(
    GarblingKey {
        label_x,
        label_y,
        wire,
        row,
    }: &GarblingKey,
) -> (Key, Nonce) {
    let mut key = [0; 32];
    key[..16].copy_from_slice(&label_x.0.to_be_bytes());
    key[16..].copy_from_slice(&label_y.0.to_be_bytes());
    let mut nonce = [0; 12];
    nonce[..8].copy_from_slice(&(*wire as u64).to_be_bytes());
    nonce[8] = *row;
    (key.into(), nonce.into())
}

#[test]
fn encrypt_decrypt() {
    use rand::random;

    let key = GarblingKey {
        label_x: Label(random()),
        label_y: Label(random()),
        wire: random::<u64>() as usize,
        row: random(),
    };
    let row = (Label(random()), random());
    let encrypted = encrypt(&key, row).unwrap();
    let decrypted = decrypt(&key, &encrypted).unwrap();
    assert_eq!(row, decrypted);
}
