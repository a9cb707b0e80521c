//! Delivery of a party's encoded input to the evaluator.
//!
//! The reference deployment runs garbler and evaluator inside one trusted
//! process, so an encoded input can be handed over directly. Once the
//! parties are separated by a network, direct delivery is no longer sound:
//! the evaluator must fetch exactly one of the two keys per wire through an
//! oblivious transfer, without learning the other key and without the sender
//! learning which key was fetched. [`DeliveryKind`] keeps that choice a
//! configuration concern; the local simulation implements only
//! [`DeliveryKind::Direct`].

use std::future::Future;

use crate::channel::{Channel, Error, MsgChannel};
use crate::data_types::PartyInput;

/// Selects how encoded inputs reach the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryKind {
    /// Hand the encoded input to the evaluator directly. Sound only while
    /// both parties run inside one trusted process.
    #[default]
    Direct,
    /// Fetch each wire key through an oblivious transfer. Required by a
    /// networked deployment; not implemented by the local simulation.
    ObliviousTransfer,
}

/// Moves one party's encoded input to the evaluator.
pub trait InputDelivery {
    /// Sends the encoded input over the channel.
    fn deliver<C: Channel>(
        &self,
        channel: &mut MsgChannel<C>,
        party: &str,
        input: &PartyInput,
    ) -> impl Future<Output = Result<(), Error>>;

    /// Receives one party's encoded input from the channel.
    fn receive<C: Channel>(
        &self,
        channel: &mut MsgChannel<C>,
        party: &str,
    ) -> impl Future<Output = Result<PartyInput, Error>>;
}

/// Direct input delivery for the local simulation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectDelivery;

impl InputDelivery for DirectDelivery {
    async fn deliver<C: Channel>(
        &self,
        channel: &mut MsgChannel<C>,
        party: &str,
        input: &PartyInput,
    ) -> Result<(), Error> {
        channel.send(party, input).await
    }

    async fn receive<C: Channel>(
        &self,
        channel: &mut MsgChannel<C>,
        party: &str,
    ) -> Result<PartyInput, Error> {
        channel.recv(party).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::SimpleChannel;
    use crate::data_types::{EncodedBit, Label};

    #[tokio::test]
    async fn direct_delivery_moves_the_encoded_input_unchanged() {
        let (party, evaluator) = SimpleChannel::pair();
        let mut party = MsgChannel(party);
        let mut evaluator = MsgChannel(evaluator);
        let mut input = PartyInput::new();
        input.insert(3, EncodedBit { label: Label(42), masked: true });
        input.insert(5, EncodedBit { label: Label(7), masked: false });

        let delivery = DirectDelivery;
        delivery.deliver(&mut party, "alice input", &input).await.unwrap();
        let received = delivery.receive(&mut evaluator, "alice input").await.unwrap();
        assert_eq!(received, input);
    }
}
