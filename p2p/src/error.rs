use thiserror::Error;
use types::primitives::{Slot, H256};

/// Conditions callers distinguish with `downcast_ref`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    /// The peer's view of finality conflicts with ours; the connection must
    /// be closed.
    #[error(
        "peer finalized checkpoint at slot {slot} conflicts with ours \
         (local: {local:?}, peer: {peer:?})"
    )]
    InvalidStatus { slot: Slot, local: H256, peer: H256 },
    /// The missing ancestry is already being fetched; the block will be
    /// retried once its parents land.
    #[error("sync in progress for parent {parent_root:?}")]
    SyncInProgress { parent_root: H256 },
    #[error("request failed after {attempts} retries")]
    RetriesExhausted { attempts: u32 },
    #[error("peer returned no block for root {root:?}")]
    EmptyResponse { root: H256 },
    #[error("sync cancelled by shutdown")]
    Cancelled,
}
