use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::block::{Block, BlockHash};
use crate::clock::Clock;
use crate::error::ChainError;
use crate::verify::{AcceptAll, SignatureVerifier};

/// Payload of the ownerless first block.
pub const GENESIS_DATA: &str = "Genesis Gopher Block";

/// How long a verification message stays valid, in seconds.
pub const SUBMISSION_WINDOW: i64 = 300;

const MESSAGE_SUFFIX: &str = "starRegistry";

/// Shortest timestamp segment accepted in a verification message.
const MIN_TIMESTAMP_DIGITS: usize = 10;

/// An integrity problem found by [`Blockchain::validate_chain`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    /// The block's stored hash no longer matches its fields.
    Tampered { height: u64, hash: BlockHash },
    /// The block's previous hash does not match its predecessor's fields.
    BrokenLink {
        height: u64,
        previous_hash: Option<BlockHash>,
        expected: BlockHash,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tampered { height, hash } => write!(
                f,
                "block {height} ({}) has been tampered with",
                hex::encode(hash)
            ),
            Self::BrokenLink {
                height,
                previous_hash,
                expected,
            } => write!(
                f,
                "block {height} links to {} but its predecessor hashes to {}",
                previous_hash.map_or_else(|| "nothing".to_string(), hex::encode),
                hex::encode(expected)
            ),
        }
    }
}

/// A star registration request.
#[derive(Clone, Debug, Default)]
pub struct StarRequest {
    pub address: String,
    pub message: String,
    pub star: Vec<u8>,
    pub signature: String,
}

/// The star registry: an append-only sequence of blocks guarded by a
/// reader/writer lock.
///
/// Appends take the lock exclusively, so heights are gap-free and each new
/// block links to the block committed just before it.
pub struct Blockchain {
    blocks: RwLock<Vec<Block>>,
    clock: Arc<dyn Clock>,
    verifier: Box<dyn SignatureVerifier>,
}

impl Blockchain {
    /// Creates a chain holding only the genesis block, accepting every signature.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_verifier(clock, Box::new(AcceptAll))
    }

    /// Creates a chain holding only the genesis block.
    #[must_use]
    pub fn with_verifier(clock: Arc<dyn Clock>, verifier: Box<dyn SignatureVerifier>) -> Self {
        let genesis = Block::new(clock.now(), 0, "", None, GENESIS_DATA.as_bytes());
        tracing::debug!(hash = %hex::encode(genesis.hash()), "genesis block created");

        Self {
            blocks: RwLock::new(vec![genesis]),
            clock,
            verifier,
        }
    }

    /// Number of blocks in the chain, genesis included.
    pub async fn height(&self) -> u64 {
        self.blocks.read().await.len() as u64
    }

    /// Message an address must echo back, within the submission window, to
    /// register a star: `<address>:<unix time>:starRegistry`.
    #[tracing::instrument(skip(self))]
    pub async fn request_ownership_verification_message(
        &self,
        address: &str,
    ) -> Result<String, ChainError> {
        if address.is_empty() {
            return Err(ChainError::EmptyAddress);
        }

        let now = {
            let _blocks = self.blocks.read().await;
            self.clock.now()
        };

        Ok(format!("{address}:{now}:{MESSAGE_SUFFIX}"))
    }

    /// Whether `message` has aged out of the submission window.
    ///
    /// Messages that fail to parse, or that are dated in the future, are
    /// errors; callers should treat every error as outdated.
    #[tracing::instrument(skip(self))]
    pub async fn is_message_outdated(&self, address: &str, message: &str) -> Result<bool, ChainError> {
        Ok(self.message_age(address, message).await? >= SUBMISSION_WINDOW)
    }

    /// Seconds elapsed since `message` was issued.
    async fn message_age(&self, address: &str, message: &str) -> Result<i64, ChainError> {
        let issued_at = parse_message_timestamp(address, message)?;

        let now = {
            let _blocks = self.blocks.read().await;
            self.clock.now()
        };

        let age = now.saturating_sub(issued_at);
        if age < 0 {
            return Err(ChainError::FutureTimestamp { seconds: -age });
        }
        Ok(age)
    }

    /// Appends a block owned by `owner` on top of the current head.
    #[tracing::instrument(skip(self, data), fields(data_len = data.len()))]
    pub async fn add_block(&self, owner: &str, data: &[u8]) -> Block {
        let mut blocks = self.blocks.write().await;

        let height = blocks.len() as u64;
        let previous_hash = blocks.last().map(Block::recompute_hash);
        let block = Block::new(self.clock.now(), height, owner, previous_hash, data);

        blocks.push(block.clone());
        drop(blocks);

        tracing::info!(height, hash = %hex::encode(block.hash()), "block appended");
        block
    }

    /// Checks a star request and records it in a new block.
    #[tracing::instrument(skip(self, request), fields(address = %request.address))]
    pub async fn submit_star(&self, request: &StarRequest) -> Result<Block, ChainError> {
        if request.address.is_empty() {
            return Err(ChainError::EmptyAddress);
        }
        if request.message.is_empty() {
            return Err(ChainError::EmptyMessage);
        }
        if request.signature.is_empty() {
            return Err(ChainError::EmptySignature);
        }

        let age = self.message_age(&request.address, &request.message).await?;
        if age >= SUBMISSION_WINDOW {
            tracing::warn!(age, "rejecting outdated verification message");
            return Err(ChainError::OutdatedMessage { age });
        }

        if !self
            .verifier
            .verify(&request.address, &request.message, &request.signature)
        {
            tracing::warn!("rejecting star with invalid signature");
            return Err(ChainError::InvalidSignature);
        }

        Ok(self.add_block(&request.address, &request.star).await)
    }

    /// The block at `height`.
    pub async fn block_by_height(&self, height: u64) -> Result<Block, ChainError> {
        let blocks = self.blocks.read().await;
        usize::try_from(height)
            .ok()
            .and_then(|index| blocks.get(index))
            .cloned()
            .ok_or(ChainError::InvalidHeight {
                requested: height,
                height: blocks.len() as u64,
            })
    }

    /// The first block whose stored hash equals `hash`.
    pub async fn block_by_hash(&self, hash: &[u8]) -> Result<Block, ChainError> {
        let hash: BlockHash = hash
            .try_into()
            .map_err(|_| ChainError::InvalidHashLength(hash.len()))?;

        self.blocks
            .read()
            .await
            .iter()
            .find(|block| block.hash() == hash)
            .cloned()
            .ok_or(ChainError::BlockNotFound)
    }

    /// Payloads of every non-genesis block owned by `address`, in chain order.
    pub async fn stars_by_wallet_address(&self, address: &str) -> Vec<Vec<u8>> {
        self.blocks
            .read()
            .await
            .iter()
            .skip(1)
            .filter(|block| block.owner() == address)
            .map(Block::data)
            .collect()
    }

    /// Scans the whole chain for tampered blocks and broken links.
    ///
    /// An empty result means the chain is sound.
    #[tracing::instrument(skip(self))]
    pub async fn validate_chain(&self) -> Vec<Violation> {
        let blocks = self.blocks.read().await;
        let mut violations = Vec::new();

        for (index, block) in blocks.iter().enumerate() {
            let height = index as u64;

            if !block.validate() {
                violations.push(Violation::Tampered {
                    height,
                    hash: block.hash(),
                });
            }

            if index > 0 {
                let expected = blocks[index - 1].recompute_hash();
                if block.previous_hash() != Some(expected) {
                    violations.push(Violation::BrokenLink {
                        height,
                        previous_hash: block.previous_hash(),
                        expected,
                    });
                }
            }
        }
        drop(blocks);

        if !violations.is_empty() {
            tracing::warn!(count = violations.len(), "chain integrity violations found");
        }
        violations
    }

    #[cfg(test)]
    pub(crate) async fn tamper<F: FnOnce(&mut Block)>(&self, height: usize, f: F) {
        let mut blocks = self.blocks.write().await;
        f(&mut blocks[height]);
    }
}

/// Extracts the timestamp from `<address>:<digits>:starRegistry`.
fn parse_message_timestamp(address: &str, message: &str) -> Result<i64, ChainError> {
    let digits = message
        .strip_prefix(address)
        .and_then(|rest| rest.strip_prefix(':'))
        .and_then(|rest| rest.strip_suffix(MESSAGE_SUFFIX))
        .and_then(|rest| rest.strip_suffix(':'))
        .ok_or_else(|| {
            ChainError::MalformedMessage(format!(
                "expected \"{address}:<timestamp>:{MESSAGE_SUFFIX}\""
            ))
        })?;

    if digits.len() < MIN_TIMESTAMP_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ChainError::MalformedMessage(format!(
            "timestamp segment {digits:?} is not a unix timestamp"
        )));
    }

    digits
        .parse()
        .map_err(|e| ChainError::MalformedMessage(format!("timestamp segment {digits:?}: {e}")))
}
