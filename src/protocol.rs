//! The end-to-end secure-sum protocol run.
//!
//! One run takes a circuit, its garbled-circuit artifact and both parties'
//! plaintext integer lists, encodes each party's sum onto that party's input
//! wires, hands the encoded inputs to the evaluator over channels, evaluates
//! the garbled circuit and decodes the revealed output. The decoded sum is
//! cross-checked against an independent plaintext re-computation; a mismatch
//! is a reportable outcome, not an error.

use std::fmt;

use futures::future::try_join;
use tracing::{debug, info};

use crate::catalog::{Circuit, CircuitError};
use crate::channel::{self, MsgChannel, SimpleChannel};
use crate::codec;
use crate::encode::{self, encode};
use crate::garble::{self, GarbledCircuit};
use crate::ot::{DeliveryKind, DirectDelivery, InputDelivery};

/// A custom error type for the secure-sum protocol.
#[derive(Debug)]
pub enum Error {
    /// The circuit description is invalid.
    Circuit(CircuitError),
    /// A message could not be sent or received.
    Channel(channel::Error),
    /// A garbled table could not be built or evaluated.
    Garbling(garble::Error),
    /// A party's input could not be encoded onto its wires.
    Encoding(encode::Error),
    /// A plaintext input could not be parsed or the revealed output could
    /// not be decoded.
    Codec(codec::Error),
    /// The configured delivery kind is not available in the local
    /// simulation.
    UnsupportedDelivery(DeliveryKind),
    /// The async runtime backing the simulation could not be started.
    Runtime(std::io::Error),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Circuit(e) => write!(f, "Circuit error: {e}"),
            Error::Channel(e) => write!(f, "Channel error: {e:?}"),
            Error::Garbling(e) => write!(f, "Garbling error: {e}"),
            Error::Encoding(e) => write!(f, "Encoding error: {e}"),
            Error::Codec(e) => write!(f, "Codec error: {e}"),
            Error::UnsupportedDelivery(kind) => {
                write!(f, "Delivery kind {kind:?} is not available locally")
            }
            Error::Runtime(e) => write!(f, "Could not start async runtime: {e}"),
        }
    }
}

impl From<CircuitError> for Error {
    fn from(e: CircuitError) -> Self {
        Self::Circuit(e)
    }
}

impl From<channel::Error> for Error {
    fn from(e: channel::Error) -> Self {
        Self::Channel(e)
    }
}

impl From<garble::Error> for Error {
    fn from(e: garble::Error) -> Self {
        Self::Garbling(e)
    }
}

impl From<encode::Error> for Error {
    fn from(e: encode::Error) -> Self {
        Self::Encoding(e)
    }
}

impl From<codec::Error> for Error {
    fn from(e: codec::Error) -> Self {
        Self::Codec(e)
    }
}

/// The reported outcome of one protocol run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// The decimal sum revealed by the garbled evaluation.
    pub sum: u128,
    /// Whether the revealed sum matches an independent plaintext
    /// re-computation. `false` distinguishes "executed but gave a wrong
    /// answer" from "could not execute" and is not an error.
    pub verified: bool,
}

/// Configuration of a protocol run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
    /// How encoded inputs reach the evaluator.
    pub delivery: DeliveryKind,
}

/// Runs the secure-sum protocol for both parties in a local simulation.
pub fn simulate(
    circuit: &Circuit,
    garbled: &GarbledCircuit,
    alice_values: &[u64],
    bob_values: &[u64],
) -> Result<Outcome, Error> {
    simulate_with(Config::default(), circuit, garbled, alice_values, bob_values)
}

/// Runs the secure-sum protocol with an explicit configuration.
pub fn simulate_with(
    config: Config,
    circuit: &Circuit,
    garbled: &GarbledCircuit,
    alice_values: &[u64],
    bob_values: &[u64],
) -> Result<Outcome, Error> {
    if let DeliveryKind::ObliviousTransfer = config.delivery {
        return Err(Error::UnsupportedDelivery(config.delivery));
    }
    circuit.validate()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(Error::Runtime)?;
    runtime.block_on(run(circuit, garbled, alice_values, bob_values))
}

/// The async protocol body: both parties' sums are encoded concurrently and
/// delivered to the evaluator, which evaluates the garbled circuit, decodes
/// the revealed bits and cross-checks the plaintext sum.
async fn run(
    circuit: &Circuit,
    garbled: &GarbledCircuit,
    alice_values: &[u64],
    bob_values: &[u64],
) -> Result<Outcome, Error> {
    let sum_a: u128 = alice_values.iter().map(|&v| u128::from(v)).sum();
    let sum_b: u128 = bob_values.iter().map(|&v| u128::from(v)).sum();

    let (alice_end, eval_from_alice) = SimpleChannel::pair();
    let (bob_end, eval_from_bob) = SimpleChannel::pair();
    let mut alice_chan = MsgChannel(alice_end);
    let mut bob_chan = MsgChannel(bob_end);
    let mut eval_from_alice = MsgChannel(eval_from_alice);
    let mut eval_from_bob = MsgChannel(eval_from_bob);
    let delivery = DirectDelivery;

    // The two encode steps touch disjoint wire ranges and only read the
    // shared key/pbit stores, so they may run concurrently.
    let alice_task = async {
        let input = encode(&circuit.alice, sum_a, garbled.keys(), garbled.pbits())?;
        debug!(wires = circuit.alice.len(), "party A input encoded");
        delivery.deliver(&mut alice_chan, "alice input", &input).await?;
        Ok::<_, Error>(())
    };
    let bob_task = async {
        let input = encode(&circuit.bob, sum_b, garbled.keys(), garbled.pbits())?;
        debug!(wires = circuit.bob.len(), "party B input encoded");
        delivery.deliver(&mut bob_chan, "bob input", &input).await?;
        Ok::<_, Error>(())
    };
    try_join(alice_task, bob_task).await?;

    let alice_input = delivery.receive(&mut eval_from_alice, "alice input").await?;
    let bob_input = delivery.receive(&mut eval_from_bob, "bob input").await?;

    let result = garble::evaluate(
        circuit,
        garbled.tables(),
        &garbled.output_pbits(circuit),
        &alice_input,
        &bob_input,
    )?;
    let sum = codec::decode(&result, &circuit.out)?;
    let verified = sum == sum_a + sum_b;
    info!(circuit = %circuit.id, sum, verified, "secure-sum run finished");
    Ok(Outcome { sum, verified })
}
