/// Stays `devnet0` for interop regardless of client version.
pub const NETWORK_NAME: &str = "devnet0";

pub const BLOCK_TOPIC: &str = "/leanconsensus/devnet0/block/ssz_snappy";
pub const ATTESTATION_TOPIC: &str = "/leanconsensus/devnet0/attestation/ssz_snappy";
