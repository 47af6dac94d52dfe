//! Chain synchronization.
//!
//! When the status handshake reveals a peer with a higher head slot, or a
//! gossip block arrives whose parent is unknown, the syncer requests the
//! missing blocks by root and feeds them to the store in parent-first
//! order. Requests retry with exponential backoff (1 s, 2 s, 4 s, at most
//! 3 retries) and honor cancellation between attempts.

use core::{fmt::Debug, hash::Hash, time::Duration};
use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicBool, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::Result;
use fork_choice_control::{Controller, Verifier};
use hash_hasher::HashedSet;
use log::{debug, info, warn};
use parking_lot::Mutex;
use ssz::{SszHash as _, H256};
use tokio_util::sync::CancellationToken;
use types::{
    containers::{SignedBlockWithAttestation, Status},
    primitives::UnixSeconds,
};

use crate::error::Error;

const MAX_SYNC_RETRIES: u32 = 3;
const BASE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// What the syncer needs from the fork-choice side.
/// Satisfied by [`Controller`] without modification.
pub trait ChainStore {
    fn has_block(&self, root: H256) -> bool;
    fn process_block(&self, block: &SignedBlockWithAttestation) -> Result<()>;
    fn advance_time(&self, time: UnixSeconds, has_proposal: bool);
}

impl<V: Verifier> ChainStore for Controller<V> {
    fn has_block(&self, root: H256) -> bool {
        self.contains_block(root)
    }

    fn process_block(&self, block: &SignedBlockWithAttestation) -> Result<()> {
        self.on_block(block)
    }

    fn advance_time(&self, time: UnixSeconds, has_proposal: bool) {
        Controller::advance_time(self, time, has_proposal);
    }
}

impl<S: ChainStore + ?Sized> ChainStore for std::sync::Arc<S> {
    fn has_block(&self, root: H256) -> bool {
        S::has_block(self, root)
    }

    fn process_block(&self, block: &SignedBlockWithAttestation) -> Result<()> {
        S::process_block(self, block)
    }

    fn advance_time(&self, time: UnixSeconds, has_proposal: bool) {
        S::advance_time(self, time, has_proposal);
    }
}

/// The `BlocksByRoot` request/response protocol, minus the stream framing.
/// The response carries blocks in request order.
#[allow(async_fn_in_trait)]
pub trait BlockSource<P> {
    async fn request_blocks_by_root(
        &self,
        peer: P,
        roots: Vec<H256>,
    ) -> Result<Vec<SignedBlockWithAttestation>>;
}

/// Rejects peers whose view of finality conflicts with ours. Checkpoints at
/// different slots cannot conflict; one of them is simply ahead.
pub fn validate_peer_status(local: &Status, peer: &Status) -> Result<(), Error> {
    if peer.finalized.slot == local.finalized.slot && peer.finalized.root != local.finalized.root {
        return Err(Error::InvalidStatus {
            slot: peer.finalized.slot,
            local: local.finalized.root,
            peer: peer.finalized.root,
        });
    }

    Ok(())
}

pub struct Syncer<S, B, P: Eq + Hash> {
    store: S,
    source: B,
    peers: Mutex<HashMap<P, Status>>,
    /// Roots with a fetch in flight, to keep concurrent consumers from
    /// requesting the same ancestry twice.
    pending_parents: Mutex<HashedSet<H256>>,
    syncing: AtomicBool,
    shutdown: CancellationToken,
}

impl<S, B, P> Syncer<S, B, P>
where
    S: ChainStore,
    B: BlockSource<P>,
    P: Copy + Eq + Hash + Debug,
{
    pub fn new(store: S, source: B, shutdown: CancellationToken) -> Self {
        Self {
            store,
            source,
            peers: Mutex::new(HashMap::new()),
            pending_parents: Mutex::new(HashSet::default()),
            syncing: AtomicBool::new(false),
            shutdown,
        }
    }

    /// Handles the peer's half of the status handshake. An invalid status
    /// is returned to the caller, which closes the connection.
    pub async fn on_status(&self, peer: P, peer_status: Status, local: Status) -> Result<()> {
        if let Err(error) = validate_peer_status(&local, &peer_status) {
            warn!("rejecting peer {peer:?}: {error}");
            return Err(error.into());
        }

        self.peers.lock().insert(peer, peer_status);

        if peer_status.head.slot > local.head.slot {
            info!(
                "peer {peer:?} is ahead (slot {} > {}), syncing",
                peer_status.head.slot, local.head.slot,
            );
            self.sync_from_peer(peer, peer_status).await?;
        }

        Ok(())
    }

    pub fn remove_peer(&self, peer: &P) {
        self.peers.lock().remove(peer);
    }

    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.peers.lock().len()
    }

    /// Handles a block from the gossip topic. A missing parent chain is
    /// recovered from the sending peer before the block itself is applied.
    pub async fn on_gossip_block(&self, block: &SignedBlockWithAttestation, from: P) -> Result<()> {
        let parent_root = block.message.block.parent_root;

        if !self.store.has_block(parent_root) {
            self.recover_parent_chain(parent_root, from).await?;
        }

        self.store.process_block(block).map_err(|error| {
            match error.downcast_ref::<fork_choice_store::Error>() {
                Some(fork_choice_store::Error::ParentNotFound { parent_root }) => {
                    Error::SyncInProgress {
                        parent_root: *parent_root,
                    }
                    .into()
                }
                _ => error,
            }
        })
    }

    async fn sync_from_peer(&self, peer: P, peer_status: Status) -> Result<()> {
        if self.syncing.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let result = self.sync_inner(peer, peer_status).await;

        self.syncing.store(false, Ordering::Release);

        // Catch the clock up so duties resume at the right slot after a
        // long sync.
        self.store.advance_time(unix_now(), false);

        result
    }

    async fn sync_inner(&self, peer: P, peer_status: Status) -> Result<()> {
        let blocks = self
            .request_blocks_with_retry(peer, vec![peer_status.head.root])
            .await?;

        for block in &blocks {
            self.process_received_block(block, peer).await?;
        }

        Ok(())
    }

    async fn process_received_block(
        &self,
        block: &SignedBlockWithAttestation,
        from: P,
    ) -> Result<()> {
        let block_root = block.message.block.hash_tree_root();

        if self.store.has_block(block_root) {
            return Ok(());
        }

        let parent_root = block.message.block.parent_root;

        if !self.store.has_block(parent_root) {
            self.recover_parent_chain(parent_root, from).await?;
        }

        debug!("synced block at slot {}", block.message.block.slot);

        self.store.process_block(block)
    }

    /// Walks the missing ancestry root by root, then applies the fetched
    /// blocks oldest first.
    async fn recover_parent_chain(&self, parent_root: H256, from: P) -> Result<()> {
        let mut missing = parent_root;
        let mut chain = Vec::new();

        while !self.store.has_block(missing) {
            if !self.pending_parents.lock().insert(missing) {
                // Another consumer is already fetching this ancestry.
                break;
            }

            let result = self.request_blocks_with_retry(from, vec![missing]).await;

            self.pending_parents.lock().remove(&missing);

            let Some(block) = result?.into_iter().next() else {
                return Err(Error::EmptyResponse { root: missing }.into());
            };

            missing = block.message.block.parent_root;
            chain.push(block);
        }

        for block in chain.iter().rev() {
            if self.store.has_block(block.message.block.hash_tree_root()) {
                continue;
            }

            self.store.process_block(block)?;
        }

        Ok(())
    }

    async fn request_blocks_with_retry(
        &self,
        peer: P,
        roots: Vec<H256>,
    ) -> Result<Vec<SignedBlockWithAttestation>> {
        let mut last_error = None;

        for attempt in 0..=MAX_SYNC_RETRIES {
            if attempt > 0 {
                let delay = BASE_RETRY_DELAY * (1 << (attempt - 1));

                debug!(
                    "retrying block request to {peer:?} in {delay:?} \
                     (attempt {} of {MAX_SYNC_RETRIES})",
                    attempt + 1,
                );

                tokio::select! {
                    () = self.shutdown.cancelled() => return Err(Error::Cancelled.into()),
                    () = tokio::time::sleep(delay) => {}
                }
            }

            match self.source.request_blocks_by_root(peer, roots.clone()).await {
                Ok(blocks) => return Ok(blocks),
                Err(error) => {
                    debug!("block request to {peer:?} failed: {error:#}");
                    last_error = Some(error);
                }
            }
        }

        let exhausted = Error::RetriesExhausted {
            attempts: MAX_SYNC_RETRIES,
        };

        match last_error {
            Some(error) => Err(error.context(exhausted)),
            None => Err(exhausted.into()),
        }
    }
}

fn unix_now() -> UnixSeconds {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
