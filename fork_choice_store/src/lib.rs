//! The fork-choice store: every validated block and its post-state, the two
//! attestation buffers, and the canonical head.
//!
//! The store itself is not thread safe. `fork_choice_control` wraps it in a
//! mutex and is the only thing other crates should talk to at runtime.

pub use crate::{error::Error, misc::AttestationOrigin, store::Store};

mod error;
mod misc;
mod store;
mod validations;
