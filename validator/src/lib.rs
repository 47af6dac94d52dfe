//! Local validator duties: propose in interval 0, attest in interval 1.

use std::sync::Arc;

use anyhow::Result;
use clock::Tick;
use fork_choice_control::{Controller, Verifier};
use log::{info, warn};
use ssz::ContiguousList;
use types::{
    containers::{
        Attestation, BlockWithAttestation, SignedAttestation, SignedBlockWithAttestation,
    },
    primitives::{Slot, ValidatorIndex},
};

/// The seam to the network layer. Implementations marshal and publish on
/// their own workers; nothing here blocks on the wire.
pub trait Publish {
    fn publish_block(&self, block: &SignedBlockWithAttestation) -> Result<()>;
    fn publish_attestation(&self, attestation: &SignedAttestation) -> Result<()>;
}

/// Drives one validator from the tick stream.
pub struct ValidatorDuties<P, V> {
    controller: Arc<Controller<V>>,
    publisher: P,
    validator_index: ValidatorIndex,
    /// Highest slot a proposal went out for. Guards against proposing twice
    /// when ticks are replayed after a stall.
    last_proposed_slot: Slot,
}

impl<P: Publish, V: Verifier> ValidatorDuties<P, V> {
    pub fn new(controller: Arc<Controller<V>>, publisher: P, validator_index: ValidatorIndex) -> Self {
        Self {
            controller,
            publisher,
            validator_index,
            last_proposed_slot: 0,
        }
    }

    pub fn on_tick(&mut self, tick: Tick) -> Result<()> {
        self.controller.on_tick(tick)?;

        // Slot 0 is genesis; there is nothing to propose or vote on yet.
        if tick.slot == 0 {
            return Ok(());
        }

        let proposer = self.is_assigned_proposer(tick.slot);

        if tick.is_proposal_interval() && proposer && tick.slot > self.last_proposed_slot {
            self.last_proposed_slot = tick.slot;

            if let Err(error) = self.propose(tick.slot) {
                warn!("failed to propose block for slot {}: {error:#}", tick.slot);
            }
        }

        // The proposer already voted through its block envelope.
        if tick.is_attestation_interval() && !proposer {
            if let Err(error) = self.attest(tick.slot) {
                warn!("failed to attest for slot {}: {error:#}", tick.slot);
            }
        }

        Ok(())
    }

    fn is_assigned_proposer(&self, slot: Slot) -> bool {
        let validator_count = self.controller.validator_count();
        validator_count > 0 && slot % validator_count == self.validator_index
    }

    fn propose(&self, slot: Slot) -> Result<()> {
        let block = self.controller.produce_block(slot, self.validator_index)?;

        let proposer_attestation = Attestation {
            validator_id: self.validator_index,
            data: self.controller.produce_attestation_data(slot)?,
        };

        // Signatures are attached by the signer in front of the publisher;
        // the envelope leaves here unsigned.
        let signed = SignedBlockWithAttestation {
            message: BlockWithAttestation {
                block,
                proposer_attestation,
            },
            signatures: ContiguousList::default(),
        };

        // Apply locally first so the node never gossips a block its own
        // store would reject.
        self.controller.on_block(&signed)?;
        self.publisher.publish_block(&signed)?;

        info!(
            "proposed block for slot {slot} with {} attestations",
            signed.message.block.body.attestations.len(),
        );

        Ok(())
    }

    fn attest(&self, slot: Slot) -> Result<()> {
        let data = self.controller.produce_attestation_data(slot)?;

        let signed = SignedAttestation {
            message: Attestation {
                validator_id: self.validator_index,
                data,
            },
            signature: Default::default(),
        };

        self.controller.on_attestation(&signed)?;
        self.publisher.publish_attestation(&signed)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use fork_choice_control::NullVerifier;
    use parking_lot::Mutex;
    use types::config::Config;

    use super::*;

    #[derive(Default)]
    struct RecordingPublisher {
        blocks: Mutex<Vec<SignedBlockWithAttestation>>,
        attestations: Mutex<Vec<SignedAttestation>>,
    }

    impl Publish for &RecordingPublisher {
        fn publish_block(&self, block: &SignedBlockWithAttestation) -> Result<()> {
            self.blocks.lock().push(block.clone());
            Ok(())
        }

        fn publish_attestation(&self, attestation: &SignedAttestation) -> Result<()> {
            self.attestations.lock().push(attestation.clone());
            Ok(())
        }
    }

    fn setup() -> Arc<Controller<NullVerifier>> {
        Arc::new(Controller::new(Config::minimal(4), NullVerifier).expect("genesis store builds"))
    }

    #[test]
    fn assigned_proposer_publishes_one_block_per_slot() {
        let controller = setup();
        let publisher = RecordingPublisher::default();
        let mut duties = ValidatorDuties::new(Arc::clone(&controller), &publisher, 1);

        duties
            .on_tick(Tick::start_of_slot(1))
            .expect("tick applies");
        // A replayed tick must not double-propose.
        duties
            .on_tick(Tick::start_of_slot(1))
            .expect("tick applies");

        assert_eq!(publisher.blocks.lock().len(), 1);
        assert_eq!(controller.head().expect("head is known").slot, 1);
    }

    #[test]
    fn unassigned_validators_do_not_propose() {
        let controller = setup();
        let publisher = RecordingPublisher::default();
        let mut duties = ValidatorDuties::new(controller, &publisher, 2);

        duties
            .on_tick(Tick::start_of_slot(1))
            .expect("tick applies");

        assert!(publisher.blocks.lock().is_empty());
    }

    #[test]
    fn attesters_vote_in_the_attestation_interval() {
        let controller = setup();

        let proposer_publisher = RecordingPublisher::default();
        let mut proposer = ValidatorDuties::new(Arc::clone(&controller), &proposer_publisher, 1);

        let attester_publisher = RecordingPublisher::default();
        let mut attester = ValidatorDuties::new(Arc::clone(&controller), &attester_publisher, 2);

        for tick in [Tick::start_of_slot(1), Tick::new(1, 1)] {
            proposer.on_tick(tick).expect("tick applies");
            attester.on_tick(tick).expect("tick applies");
        }

        // The proposer votes through its envelope, not the gossip topic.
        assert!(proposer_publisher.attestations.lock().is_empty());
        assert_eq!(attester_publisher.attestations.lock().len(), 1);

        // The attester's vote becomes the next proposer's block content.
        let next_block = controller.produce_block(2, 2).expect("block builds");
        let included = next_block
            .body
            .attestations
            .iter()
            .map(|attestation| attestation.validator_id)
            .collect::<Vec<_>>();

        assert!(included.contains(&2));
    }

    #[test]
    fn genesis_slot_has_no_duties() {
        let controller = setup();
        let publisher = RecordingPublisher::default();
        let mut duties = ValidatorDuties::new(controller, &publisher, 0);

        duties
            .on_tick(Tick::start_of_slot(0))
            .expect("tick applies");

        assert!(publisher.blocks.lock().is_empty());
        assert!(publisher.attestations.lock().is_empty());
    }
}
