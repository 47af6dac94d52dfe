//! The thread-safe facade over the fork-choice store.
//!
//! One exclusive mutex guards the whole store. Gossip consumers, the slot
//! ticker, and the local validator all go through [`Controller`]; every
//! public method acquires the mutex, does pure in-memory work, and releases
//! it before returning. Nothing suspends or performs I/O while holding it.

pub use crate::{
    controller::Controller,
    error::Error,
    verifier::{NullVerifier, Verifier},
};

mod controller;
mod error;
mod verifier;
