//! Slot and interval timekeeping.
//!
//! A [`Tick`] names one interval of one slot. The stream produced by
//! [`ticks`] fires once per interval and is what drives proposal and
//! attestation duties. Consumers that only need arithmetic can use
//! [`Tick::at_time`] directly.

use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{ensure, Result};
use futures::stream::{Stream, StreamExt as _};
use thiserror::Error;
use tokio_stream::wrappers::IntervalStream;
use types::{
    config::Config,
    consts::{INTERVALS_PER_SLOT, SECONDS_PER_SLOT},
    primitives::{Interval, Slot, UnixSeconds},
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("time {time} is before genesis ({genesis_time})")]
    BeforeGenesis {
        time: UnixSeconds,
        genesis_time: UnixSeconds,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Tick {
    pub slot: Slot,
    pub interval: Interval,
}

impl Tick {
    #[must_use]
    pub const fn new(slot: Slot, interval: Interval) -> Self {
        Self { slot, interval }
    }

    #[must_use]
    pub const fn start_of_slot(slot: Slot) -> Self {
        Self::new(slot, 0)
    }

    pub fn at_time(config: &Config, time: UnixSeconds) -> Result<Self> {
        ensure!(
            time >= config.genesis_time,
            Error::BeforeGenesis {
                time,
                genesis_time: config.genesis_time,
            },
        );

        let elapsed = time - config.genesis_time;
        let slot = elapsed / SECONDS_PER_SLOT;
        let interval = elapsed % SECONDS_PER_SLOT * INTERVALS_PER_SLOT / SECONDS_PER_SLOT;

        Ok(Self::new(slot, interval))
    }

    pub fn current(config: &Config) -> Result<Self> {
        let time = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        Self::at_time(config, time)
    }

    /// The wall-clock second this tick begins at.
    #[must_use]
    pub const fn start_time(self, config: &Config) -> UnixSeconds {
        config.genesis_time
            + self.slot * SECONDS_PER_SLOT
            + self.interval * SECONDS_PER_SLOT / INTERVALS_PER_SLOT
    }

    /// Proposers act in interval 0.
    #[must_use]
    pub const fn is_proposal_interval(self) -> bool {
        self.interval == 0
    }

    /// Everyone else votes in interval 1.
    #[must_use]
    pub const fn is_attestation_interval(self) -> bool {
        self.interval == 1
    }

    #[must_use]
    pub const fn next(self) -> Self {
        if self.interval + 1 == INTERVALS_PER_SLOT {
            Self::new(self.slot + 1, 0)
        } else {
            Self::new(self.slot, self.interval + 1)
        }
    }
}

/// Fires once per interval, yielding the tick for the current wall-clock
/// time. Ticks before genesis come out as errors the consumer can skip.
pub fn ticks(config: Config) -> impl Stream<Item = Result<Tick>> {
    let period = Duration::from_millis(SECONDS_PER_SLOT * 1000 / INTERVALS_PER_SLOT);

    IntervalStream::new(tokio::time::interval(period)).map(move |_| Tick::current(&config))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    const CONFIG: Config = Config {
        genesis_time: 1_000,
        num_validators: 4,
    };

    #[test_case(1_000, Tick::new(0, 0))]
    #[test_case(1_001, Tick::new(0, 1))]
    #[test_case(1_003, Tick::new(0, 3))]
    #[test_case(1_004, Tick::new(1, 0))]
    #[test_case(1_042, Tick::new(10, 2))]
    fn tick_at_time(time: UnixSeconds, expected: Tick) {
        assert_eq!(
            Tick::at_time(&CONFIG, time).expect("time is after genesis"),
            expected,
        );
    }

    #[test]
    fn tick_before_genesis_is_an_error() {
        let error = Tick::at_time(&CONFIG, 999).expect_err("time is before genesis");

        assert_eq!(
            error.downcast_ref(),
            Some(&Error::BeforeGenesis {
                time: 999,
                genesis_time: 1_000,
            }),
        );
    }

    #[test]
    fn start_time_inverts_at_time() {
        for time in 1_000..1_050 {
            let tick = Tick::at_time(&CONFIG, time).expect("time is after genesis");
            assert_eq!(tick.start_time(&CONFIG), time);
        }
    }

    #[test]
    fn next_wraps_into_the_following_slot() {
        assert_eq!(Tick::new(2, 2).next(), Tick::new(2, 3));
        assert_eq!(Tick::new(2, 3).next(), Tick::new(3, 0));
    }

    #[test]
    fn duty_windows_are_disjoint() {
        let proposal = Tick::new(5, 0);
        let attestation = Tick::new(5, 1);

        assert!(proposal.is_proposal_interval());
        assert!(!proposal.is_attestation_interval());
        assert!(attestation.is_attestation_interval());
        assert!(!attestation.is_proposal_interval());
    }
}
