/// Where an attestation was seen. On-chain votes update the confirmed
/// buffer; gossip votes are provisional until a block includes them.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AttestationOrigin {
    Gossip,
    Block,
}

impl AttestationOrigin {
    #[must_use]
    pub const fn is_from_block(self) -> bool {
        matches!(self, Self::Block)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gossip => "gossip",
            Self::Block => "block",
        }
    }
}
