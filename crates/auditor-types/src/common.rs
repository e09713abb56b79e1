//! Common identifiers used throughout the auditor.

use chrono::{DateTime, Utc};

/// Block number
pub type BlockNumber = u64;

/// 0x-prefixed transaction hash as reported by the node
pub type TxHash = String;

/// A transaction as declared by a block, carrying the block's decoded
/// timestamp so every transaction in the block shares one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRef {
	pub block_number: BlockNumber,
	pub hash: TxHash,
	pub block_timestamp: DateTime<Utc>,
}
