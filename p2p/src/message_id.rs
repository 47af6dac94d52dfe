use sha2::{Digest as _, Sha256};

pub const MESSAGE_ID_LENGTH: usize = 20;

const MESSAGE_DOMAIN_INVALID_SNAPPY: [u8; 4] = [0x00, 0x00, 0x00, 0x00];
const MESSAGE_DOMAIN_VALID_SNAPPY: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// Gossipsub message identity:
/// `SHA256(domain ‖ topic_len_le64 ‖ topic ‖ data)[..20]`.
///
/// Messages that decompress cleanly are identified by their decompressed
/// payload, so semantically identical messages deduplicate even if peers
/// compress them differently.
#[must_use]
pub fn compute_message_id(topic: &str, data: &[u8]) -> [u8; MESSAGE_ID_LENGTH] {
    let decompressed = snap::raw::Decoder::new().decompress_vec(data);

    let (domain, payload) = match &decompressed {
        Ok(payload) => (MESSAGE_DOMAIN_VALID_SNAPPY, payload.as_slice()),
        Err(_) => (MESSAGE_DOMAIN_INVALID_SNAPPY, data),
    };

    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update((topic.len() as u64).to_le_bytes());
    hasher.update(topic.as_bytes());
    hasher.update(payload);

    let digest = hasher.finalize();

    let mut id = [0; MESSAGE_ID_LENGTH];
    id.copy_from_slice(&digest[..MESSAGE_ID_LENGTH]);
    id
}

#[cfg(test)]
mod tests {
    use crate::{codec::compress, topics::BLOCK_TOPIC};

    use super::*;

    #[test]
    fn identical_payloads_share_an_id() {
        let payload = compress(b"payload").expect("compression succeeds");

        assert_eq!(
            compute_message_id(BLOCK_TOPIC, &payload),
            compute_message_id(BLOCK_TOPIC, &payload),
        );
    }

    #[test]
    fn the_topic_is_part_of_the_id() {
        let payload = compress(b"payload").expect("compression succeeds");

        assert_ne!(
            compute_message_id(BLOCK_TOPIC, &payload),
            compute_message_id(crate::topics::ATTESTATION_TOPIC, &payload),
        );
    }

    #[test]
    fn invalid_snappy_uses_the_other_domain() {
        // Raw bytes that do not decompress are hashed as-is under the
        // invalid-snappy domain, so they still get a stable identity.
        let raw = [0xff; 8];

        assert_ne!(
            compute_message_id(BLOCK_TOPIC, &raw),
            compute_message_id(BLOCK_TOPIC, &compress(&raw).expect("compression succeeds")),
        );
    }

    #[test]
    fn compression_details_do_not_change_the_id() {
        // Two different valid compressions of the same payload must map to
        // the same id. Recompressing our own output is the easiest way to
        // get a byte-different but equivalent encoding; if the encoder is
        // fully deterministic this at least pins the id to the payload.
        let payload = b"equivalent payloads";
        let first = compress(payload).expect("compression succeeds");

        assert_eq!(
            compute_message_id(BLOCK_TOPIC, &first),
            compute_message_id(BLOCK_TOPIC, &compress(payload).expect("compression succeeds")),
        );
    }
}
