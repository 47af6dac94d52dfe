use core::time::Duration;

use types::consts::{JUSTIFICATION_LOOKBACK_SLOTS, SECONDS_PER_SLOT};

/// Mesh parameters every interoperating client must run with. The host
/// layer feeds these into its gossipsub implementation verbatim.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GossipsubParams {
    pub mesh_size: usize,
    pub mesh_low: usize,
    pub mesh_high: usize,
    pub gossip_lazy: usize,
    pub heartbeat_interval: Duration,
    pub fanout_ttl: Duration,
    pub history_length: usize,
    pub history_gossip: usize,
    pub seen_ttl: Duration,
    /// Messages are identified by content, not signed by the publisher.
    pub strict_no_sign: bool,
    pub flood_publish: bool,
}

impl Default for GossipsubParams {
    fn default() -> Self {
        Self {
            mesh_size: 8,
            mesh_low: 6,
            mesh_high: 12,
            gossip_lazy: 6,
            heartbeat_interval: Duration::from_millis(700),
            fanout_ttl: Duration::from_secs(60),
            history_length: 6,
            history_gossip: 3,
            seen_ttl: Duration::from_secs(SECONDS_PER_SLOT * JUSTIFICATION_LOOKBACK_SLOTS * 2),
            strict_no_sign: true,
            flood_publish: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seen_ttl_covers_two_justification_lookbacks() {
        assert_eq!(GossipsubParams::default().seen_ttl, Duration::from_secs(24));
    }

    #[test]
    fn mesh_watermarks_bracket_the_target() {
        let params = GossipsubParams::default();

        assert!(params.mesh_low < params.mesh_size);
        assert!(params.mesh_size < params.mesh_high);
    }
}
