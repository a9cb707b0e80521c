//! A two-party secure-sum simulation built on Yao's garbled circuits.
//!
//! Two parties, each holding a private list of integers, jointly compute the
//! sum of all their integers without revealing their individual inputs to
//! each other. Each party's sum is encoded as masked wire labels of a
//! precomputed garbled boolean adder circuit; the evaluator decrypts exactly
//! one table row per gate and learns nothing but the revealed output bits.
//!
//! ## Main Components
//!
//! * [`catalog`]: circuit descriptions and the JSON catalog format.
//! * [`garble`]: the circuit-garbling and table-evaluation engine.
//! * [`encode`]: plaintext sums → masked wire labels.
//! * [`protocol`]: the end-to-end run ([`protocol::simulate`]).
//! * [`codec`]: revealed-output decoding and plaintext input parsing.
//! * [`channel`]: message transport between a party and the evaluator.
//! * [`ot`]: input-delivery strategies (direct for the local simulation).
//! * [`report`]: persisted transfer and run records.
//!
//! ## Basic Usage
//!
//! ```ignore
//! use cosum::{catalog::Catalog, garble, protocol};
//!
//! let catalog = Catalog::load("circuits/sum.json")?;
//! let circuit = &catalog.circuits[0];
//! let garbled = garble::garble(circuit, &mut rand::rng())?;
//! let outcome = protocol::simulate(circuit, &garbled, &[2, 3], &[1, 1, 1])?;
//! assert_eq!(outcome.sum, 8);
//! assert!(outcome.verified);
//! ```
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod catalog;
pub mod channel;
pub mod codec;
pub mod data_types;
pub mod encode;
pub mod garble;
pub mod ot;
pub mod protocol;
pub mod report;
