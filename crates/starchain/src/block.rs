use sha2::{Digest, Sha256};

/// A SHA-256 digest.
pub type BlockHash = [u8; 32];

/// One immutable ledger entry.
///
/// The hash is computed once at construction and stored; [`Block::validate`]
/// recomputes it from the current fields to detect tampering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    timestamp: i64,
    height: u64,
    owner: String,
    previous_hash: Option<BlockHash>,
    /// Hex encoding of the payload; empty when the block carries none.
    data: String,
    hash: BlockHash,
}

impl Block {
    /// Builds a block and seals it with its hash.
    ///
    /// # Panics
    /// Panics if `timestamp` is not positive. Callers inside the crate only
    /// pass clock readings, so this signals a broken clock, not bad input.
    #[must_use]
    pub fn new(
        timestamp: i64,
        height: u64,
        owner: impl Into<String>,
        previous_hash: Option<BlockHash>,
        data: &[u8],
    ) -> Self {
        assert!(timestamp > 0, "block timestamp must be positive, got {timestamp}");

        let mut block = Self {
            timestamp,
            height,
            owner: owner.into(),
            previous_hash,
            data: hex::encode(data),
            hash: [0u8; 32],
        };
        block.hash = block.recompute_hash();
        block
    }

    /// The hash stored at construction time.
    #[must_use]
    pub const fn hash(&self) -> BlockHash {
        self.hash
    }

    /// SHA-256 over the block's fields as they are now.
    #[must_use]
    pub fn recompute_hash(&self) -> BlockHash {
        Sha256::digest(self.hashing_message()).into()
    }

    /// Whether the stored hash still matches the block's fields.
    #[must_use]
    pub fn validate(&self) -> bool {
        self.hash == self.recompute_hash()
    }

    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    #[must_use]
    pub const fn height(&self) -> u64 {
        self.height
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub const fn previous_hash(&self) -> Option<BlockHash> {
        self.previous_hash
    }

    /// The decoded payload.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        // `data` is only ever written by `hex::encode`.
        hex::decode(&self.data).unwrap_or_default()
    }

    /// Builds the message that gets hashed:
    /// `timestamp || height || len(owner) || owner || tag || previous_hash || len(data) || data`
    ///
    /// Variable-length fields carry a length prefix and the optional previous
    /// hash a presence tag, so distinct blocks never serialise alike.
    fn hashing_message(&self) -> Vec<u8> {
        let mut msg =
            Vec::with_capacity(8 + 8 + 8 + self.owner.len() + 1 + 32 + 8 + self.data.len());
        msg.extend_from_slice(&self.timestamp.to_le_bytes());
        msg.extend_from_slice(&self.height.to_le_bytes());
        msg.extend_from_slice(&(self.owner.len() as u64).to_le_bytes());
        msg.extend_from_slice(self.owner.as_bytes());
        match &self.previous_hash {
            Some(previous) => {
                msg.push(1);
                msg.extend_from_slice(previous);
            }
            None => msg.push(0),
        }
        msg.extend_from_slice(&(self.data.len() as u64).to_le_bytes());
        msg.extend_from_slice(self.data.as_bytes());
        msg
    }
}

/// Field access for tamper tests. Nothing outside tests may mutate a block.
#[cfg(test)]
impl Block {
    pub(crate) const fn set_timestamp(&mut self, timestamp: i64) {
        self.timestamp = timestamp;
    }

    pub(crate) const fn set_height(&mut self, height: u64) {
        self.height = height;
    }

    pub(crate) fn set_owner(&mut self, owner: &str) {
        self.owner = owner.to_string();
    }

    pub(crate) const fn set_previous_hash(&mut self, previous_hash: Option<BlockHash>) {
        self.previous_hash = previous_hash;
    }

    pub(crate) fn set_data(&mut self, data: &[u8]) {
        self.data = hex::encode(data);
    }

    pub(crate) const fn set_hash(&mut self, hash: BlockHash) {
        self.hash = hash;
    }
}
