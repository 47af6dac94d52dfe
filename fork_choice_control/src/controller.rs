use anyhow::{ensure, Result};
use clock::Tick;
use fork_choice_store::Store;
use parking_lot::Mutex;
use ssz::{SszHash as _, H256};
use types::{
    config::Config,
    containers::{
        AttestationData, Block, Checkpoint, SignedAttestation, SignedBlockWithAttestation, Status,
    },
    primitives::{Interval, Slot, UnixSeconds, ValidatorIndex},
    state::State,
};

use crate::{error::Error, verifier::Verifier};

/// Owns the store and serializes all access to it.
pub struct Controller<V> {
    store: Mutex<Store>,
    verifier: V,
}

impl<V: Verifier> Controller<V> {
    pub fn new(config: Config, verifier: V) -> Result<Self> {
        Ok(Self {
            store: Mutex::new(Store::genesis(config)?),
            verifier,
        })
    }

    pub fn with_anchor(
        config: Config,
        anchor_block: Block,
        anchor_state: State,
        verifier: V,
    ) -> Result<Self> {
        Ok(Self {
            store: Mutex::new(Store::new(config, anchor_block, anchor_state)?),
            verifier,
        })
    }

    /// Applies a block from the wire. The proposer's own vote rides the
    /// envelope and is fed through the gossip path once the block is in,
    /// mirroring how it would have arrived on the attestation topic.
    pub fn on_block(&self, signed: &SignedBlockWithAttestation) -> Result<()> {
        let block = &signed.message.block;

        let mut store = self.store.lock();

        if let Some(parent_state) = store.state(block.parent_root) {
            self.verify_block_signatures(parent_state, signed)?;
        }

        store.process_block(block)?;

        let proposer_attestation = SignedAttestation {
            message: signed.message.proposer_attestation,
            signature: signed
                .signatures
                .get(block.body.attestations.len())
                .cloned()
                .unwrap_or_default(),
        };

        store.process_attestation(&proposer_attestation)
    }

    /// Ingests a gossip attestation. Invalid signatures are an error for
    /// the caller; semantically invalid votes are dropped silently inside
    /// the store.
    pub fn on_attestation(&self, signed: &SignedAttestation) -> Result<()> {
        let attestation = &signed.message;

        let mut store = self.store.lock();

        if let Some(state) = store.state(attestation.data.target.root) {
            self.verify_attestation_signature(state, signed)?;
        }

        store.process_attestation(signed)
    }

    pub fn on_tick(&self, tick: Tick) -> Result<()> {
        let mut store = self.store.lock();
        let time = tick.start_time(store.config());

        store.advance_time(time, tick.is_proposal_interval());
        Ok(())
    }

    pub fn advance_time(&self, time: UnixSeconds, has_proposal: bool) {
        self.store.lock().advance_time(time, has_proposal);
    }

    pub fn head(&self) -> Result<Checkpoint> {
        self.store.lock().head()
    }

    #[must_use]
    pub fn latest_justified(&self) -> Checkpoint {
        self.store.lock().latest_justified()
    }

    #[must_use]
    pub fn latest_finalized(&self) -> Checkpoint {
        self.store.lock().latest_finalized()
    }

    pub fn status(&self) -> Result<Status> {
        self.store.lock().status()
    }

    #[must_use]
    pub fn current_slot(&self) -> Slot {
        self.store.lock().current_slot()
    }

    #[must_use]
    pub fn current_interval(&self) -> Interval {
        self.store.lock().current_interval()
    }

    #[must_use]
    pub fn contains_block(&self, root: H256) -> bool {
        self.store.lock().contains_block(root)
    }

    #[must_use]
    pub fn validator_count(&self) -> u64 {
        let store = self.store.lock();

        store
            .state(store.latest_finalized().root)
            .map(|state| state.validators.len() as u64)
            .unwrap_or_default()
    }

    pub fn produce_block(&self, slot: Slot, validator_index: ValidatorIndex) -> Result<Block> {
        self.store.lock().produce_block(slot, validator_index)
    }

    pub fn produce_attestation_data(&self, slot: Slot) -> Result<AttestationData> {
        self.store.lock().produce_attestation_data(slot)
    }

    fn verify_block_signatures(
        &self,
        state: &State,
        signed: &SignedBlockWithAttestation,
    ) -> Result<()> {
        let attestations = &signed.message.block.body.attestations;
        let proposer_attestation = &signed.message.proposer_attestation;

        let votes = attestations
            .iter()
            .chain(core::iter::once(proposer_attestation));

        for (index, attestation) in votes.enumerate() {
            let Some(validator) = state
                .validators
                .get(usize::try_from(attestation.validator_id)?)
            else {
                // Unknown validators are dropped by semantic validation.
                continue;
            };

            let signature = signed
                .signatures
                .get(index)
                .map(|bytes| bytes.as_bytes())
                .unwrap_or_default();

            ensure!(
                self.verifier.verify(
                    validator.pubkey,
                    attestation.data.slot,
                    attestation.data.hash_tree_root(),
                    signature,
                ),
                Error::InvalidSignature {
                    validator_index: attestation.validator_id,
                },
            );
        }

        Ok(())
    }

    fn verify_attestation_signature(
        &self,
        state: &State,
        signed: &SignedAttestation,
    ) -> Result<()> {
        let attestation = &signed.message;

        let Some(validator) = state
            .validators
            .get(usize::try_from(attestation.validator_id)?)
        else {
            return Ok(());
        };

        ensure!(
            self.verifier.verify(
                validator.pubkey,
                attestation.data.slot,
                attestation.data.hash_tree_root(),
                signed.signature.as_bytes(),
            ),
            Error::InvalidSignature {
                validator_index: attestation.validator_id,
            },
        );

        Ok(())
    }
}
