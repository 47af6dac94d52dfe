use std::collections::HashMap;

use anyhow::{ensure, Result};
use hash_hasher::HashedMap;
use itertools::Itertools as _;
use log::debug;
use ssz::{ContiguousList, SszHash as _, H256};
use transition_functions::{genesis_block, genesis_state, state_transition, StateRootPolicy};
use types::{
    config::Config,
    consts::{INTERVALS_PER_SLOT, SECONDS_PER_SLOT},
    containers::{
        Attestation, AttestationData, Block, BlockBody, Checkpoint, SignedAttestation, Status,
    },
    primitives::{Interval, Slot, UnixSeconds, ValidatorIndex},
    state::State,
};

use crate::{error::Error, misc::AttestationOrigin, validations};

/// In-memory store of everything fork choice needs. Blocks and states are
/// immutable once inserted and are never pruned.
pub struct Store {
    config: Config,
    /// Wall clock in interval units since genesis.
    time: u64,
    head: H256,
    latest_justified: Checkpoint,
    latest_finalized: Checkpoint,
    blocks: HashedMap<H256, Block>,
    states: HashedMap<H256, State>,
    /// Newest vote seen in a block per validator, ordered by `data.slot`.
    latest_known_attestations: HashMap<ValidatorIndex, Attestation>,
    /// Newest vote seen only via gossip per validator, ordered by
    /// `data.target.slot`. The comparison keys of the two buffers are
    /// deliberately different; see `apply_attestation`.
    latest_new_attestations: HashMap<ValidatorIndex, Attestation>,
}

impl Store {
    pub fn new(config: Config, anchor_block: Block, anchor_state: State) -> Result<Self> {
        let computed = anchor_state.hash_tree_root();

        ensure!(
            anchor_block.state_root == computed,
            Error::AnchorStateMismatch {
                computed,
                in_block: anchor_block.state_root,
            },
        );

        let anchor_root = anchor_block.hash_tree_root();
        let anchor_checkpoint = Checkpoint {
            root: anchor_root,
            slot: anchor_block.slot,
        };

        let mut blocks = HashedMap::default();
        blocks.insert(anchor_root, anchor_block);

        let mut states = HashedMap::default();
        states.insert(anchor_root, anchor_state);

        Ok(Self {
            config,
            time: 0,
            head: anchor_root,
            latest_justified: anchor_checkpoint,
            latest_finalized: anchor_checkpoint,
            blocks,
            states,
            latest_known_attestations: HashMap::new(),
            latest_new_attestations: HashMap::new(),
        })
    }

    pub fn genesis(config: Config) -> Result<Self> {
        let state = genesis_state(&config)?;
        let block = genesis_block(&state);
        Self::new(config, block, state)
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn contains_block(&self, root: H256) -> bool {
        self.blocks.contains_key(&root)
    }

    #[must_use]
    pub fn block(&self, root: H256) -> Option<&Block> {
        self.blocks.get(&root)
    }

    #[must_use]
    pub fn state(&self, root: H256) -> Option<&State> {
        self.states.get(&root)
    }

    #[must_use]
    pub const fn latest_justified(&self) -> Checkpoint {
        self.latest_justified
    }

    #[must_use]
    pub const fn latest_finalized(&self) -> Checkpoint {
        self.latest_finalized
    }

    pub fn head(&self) -> Result<Checkpoint> {
        let block = self
            .blocks
            .get(&self.head)
            .ok_or(Error::UnknownBlock { root: self.head })?;

        Ok(Checkpoint {
            root: self.head,
            slot: block.slot,
        })
    }

    pub fn status(&self) -> Result<Status> {
        Ok(Status {
            head: self.head()?,
            finalized: self.latest_finalized,
        })
    }

    #[must_use]
    pub const fn current_slot(&self) -> Slot {
        self.time / INTERVALS_PER_SLOT
    }

    #[must_use]
    pub const fn current_interval(&self) -> Interval {
        self.time % INTERVALS_PER_SLOT
    }

    /// Moves the store clock forward to the wall clock. Time never runs
    /// backwards, even if the caller's clock does.
    pub fn advance_time(&mut self, time: UnixSeconds, has_proposal: bool) {
        let Some(elapsed) = time.checked_sub(self.config.genesis_time) else {
            return;
        };

        let intervals = elapsed * INTERVALS_PER_SLOT / SECONDS_PER_SLOT;

        if intervals > self.time {
            debug!(
                "advancing time to slot {} interval {} (has_proposal: {has_proposal})",
                intervals / INTERVALS_PER_SLOT,
                intervals % INTERVALS_PER_SLOT,
            );
            self.time = intervals;
        }
    }

    /// Runs the state transition for `block` and admits it into the store.
    /// Reprocessing an already known block is a no-op. The store is left
    /// untouched when the transition fails.
    pub fn process_block(&mut self, block: &Block) -> Result<()> {
        let block_root = block.hash_tree_root();

        if self.contains_block(block_root) {
            return Ok(());
        }

        ensure!(
            self.contains_block(block.parent_root),
            Error::ParentNotFound {
                parent_root: block.parent_root,
            },
        );

        let parent_state = self
            .states
            .get(&block.parent_root)
            .ok_or(Error::StateUnavailable {
                root: block.parent_root,
            })?;

        let post_state = state_transition(parent_state, block, StateRootPolicy::Verify)?;

        let latest_justified = post_state.latest_justified;
        let latest_finalized = post_state.latest_finalized;

        self.blocks.insert(block_root, block.clone());
        self.states.insert(block_root, post_state);

        // On-chain votes take effect atomically with the block.
        for attestation in &block.body.attestations {
            self.apply_attestation(attestation, AttestationOrigin::Block);
        }

        if latest_justified.slot > self.latest_justified.slot {
            self.latest_justified = latest_justified;
        }

        if latest_finalized.slot > self.latest_finalized.slot {
            self.latest_finalized = latest_finalized;
        }

        self.update_head()?;

        debug!(
            "processed block at slot {} (proposer {}, root {block_root:?})",
            block.slot, block.proposer_index,
        );

        Ok(())
    }

    /// Ingests a gossip attestation. Signature verification happens at the
    /// boundary; validation failures here drop the vote silently.
    pub fn process_attestation(&mut self, attestation: &SignedAttestation) -> Result<()> {
        self.apply_attestation(&attestation.message, AttestationOrigin::Gossip);
        self.update_head()
    }

    fn apply_attestation(&mut self, attestation: &Attestation, origin: AttestationOrigin) {
        if !validations::validate_attestation(self, attestation) {
            debug!(
                "dropping invalid {} attestation from validator {} for slot {}",
                origin.as_str(),
                attestation.validator_id,
                attestation.data.slot,
            );
            return;
        }

        let validator = attestation.validator_id;
        let data = attestation.data;

        if origin.is_from_block() {
            // Confirmed votes are ordered by the slot the vote was cast in.
            let newer = self
                .latest_known_attestations
                .get(&validator)
                .is_none_or(|known| known.data.slot < data.slot);

            if newer {
                self.latest_known_attestations
                    .insert(validator, *attestation);
            }

            // An on-chain vote supersedes the pending gossip vote unless the
            // pending one names a strictly later target.
            let superseded = self
                .latest_new_attestations
                .get(&validator)
                .is_some_and(|pending| pending.data.target.slot <= data.target.slot);

            if superseded {
                self.latest_new_attestations.remove(&validator);
            }
        } else {
            // Gossip from future slots is dropped outright.
            if data.slot > self.current_slot() {
                debug!(
                    "dropping future-slot gossip attestation from validator {validator} \
                     (slot {}, current {})",
                    data.slot,
                    self.current_slot(),
                );
                return;
            }

            // Pending votes are ordered by target: what the next proposer
            // needs is the newest intent, not the newest cast.
            let newer = self
                .latest_new_attestations
                .get(&validator)
                .is_none_or(|pending| pending.data.target.slot < data.target.slot);

            if newer {
                self.latest_new_attestations.insert(validator, *attestation);
            }
        }
    }

    /// Recomputes the canonical head: a weighted walk from the latest
    /// finalized block, descending into the heaviest child, breaking ties by
    /// the larger root.
    fn update_head(&mut self) -> Result<()> {
        let anchor = self.latest_finalized;

        let mut weights = HashedMap::<H256, u64>::default();

        for attestation in self.latest_votes() {
            let mut current = attestation.data.target.root;

            while let Some(block) = self.blocks.get(&current) {
                if block.slot <= anchor.slot {
                    break;
                }

                *weights.entry(current).or_insert(0) += 1;
                current = block.parent_root;
            }
        }

        let mut children = HashedMap::<H256, Vec<H256>>::default();

        for (root, block) in &self.blocks {
            if block.slot >= anchor.slot {
                children.entry(block.parent_root).or_default().push(*root);
            }
        }

        let mut head = anchor.root;

        while let Some(candidates) = children.get(&head) {
            head = candidates
                .iter()
                .copied()
                .max_by_key(|root| (weights.get(root).copied().unwrap_or(0), *root))
                .ok_or(Error::UnknownBlock { root: head })?;
        }

        self.head = head;

        Ok(())
    }

    /// A validator's effective vote is the newer of its two buffer entries,
    /// preferring the pending one on a tie.
    fn latest_votes(&self) -> impl Iterator<Item = &Attestation> {
        let mut votes: HashMap<ValidatorIndex, &Attestation> = self
            .latest_known_attestations
            .iter()
            .map(|(validator, attestation)| (*validator, attestation))
            .collect();

        for (validator, attestation) in &self.latest_new_attestations {
            votes
                .entry(*validator)
                .and_modify(|existing| {
                    if attestation.data.slot >= existing.data.slot {
                        *existing = attestation;
                    }
                })
                .or_insert(attestation);
        }

        votes.into_values()
    }

    /// Packages the pending gossip votes into a block for the local
    /// proposer, runs a trial transition, and fills in the resulting state
    /// root. The block is ready for signing.
    pub fn produce_block(&self, slot: Slot, validator_index: ValidatorIndex) -> Result<Block> {
        let head_root = self.head;

        let head_state = self
            .states
            .get(&head_root)
            .ok_or(Error::StateUnavailable { root: head_root })?;

        let validator_count = u64::try_from(head_state.validators.len())?;

        ensure!(
            transition_functions::is_proposer(validator_index, slot, validator_count),
            Error::NotProposer {
                validator_index,
                slot,
            },
        );

        // Inclusion policy: pending votes in validator order. Votes the
        // transition finds ineligible are counted as zero, not rejected, so
        // including everything is safe.
        let attestations = self
            .latest_new_attestations
            .values()
            .copied()
            .sorted_by_key(|attestation| attestation.validator_id)
            .collect_vec();

        let mut block = Block {
            slot,
            proposer_index: validator_index,
            parent_root: head_root,
            body: BlockBody {
                attestations: ContiguousList::new(attestations)?,
            },
            state_root: H256::zero(),
        };

        // The declared state root is filled from a trial run; eagerly
        // hashing a state that still has a zero header root would commit to
        // the wrong thing.
        let post_state = state_transition(head_state, &block, StateRootPolicy::Trust)?;
        block.state_root = post_state.hash_tree_root();

        Ok(block)
    }

    pub fn produce_attestation_data(&self, slot: Slot) -> Result<AttestationData> {
        Ok(AttestationData {
            slot,
            source: self.latest_justified,
            target: self.head()?,
        })
    }
}
