//! Verification outcomes and the records persisted for failures.

use crate::common::{BlockNumber, TxHash};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel transaction id recorded when a block itself cannot be fetched.
pub const BLOCK_UNAVAILABLE: &str = "block-unavailable";

/// Sentinel transaction id recorded when a block lists a transaction
/// object without a hash field.
pub const MISSING_HASH: &str = "missing-hash";

/// Why a fetch did not verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
	/// The client exhausted its retries without receiving any response.
	TransportExhausted,
	/// A response arrived but carried no usable `result`.
	MissingResult,
	/// The result was present but lacked the identifying hash field, or
	/// the body could not be decoded at all.
	MalformedResult,
	/// The enclosing block could not be fetched.
	BlockUnavailable,
}

impl fmt::Display for FailureReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let reason = match self {
			FailureReason::TransportExhausted => "retries exhausted",
			FailureReason::MissingResult => "missing result",
			FailureReason::MalformedResult => "malformed result",
			FailureReason::BlockUnavailable => "block unavailable",
		};
		write!(f, "{}", reason)
	}
}

/// Classification of one transaction fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
	Confirmed,
	Failed { reason: FailureReason },
}

/// One durable failure log entry.
///
/// Rendered as a single CSV line `block,txhash,iso-timestamp`; the reason
/// is kept for reporting but is not part of the persisted line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
	pub block_number: BlockNumber,
	pub tx_hash: TxHash,
	pub timestamp: DateTime<Utc>,
	pub reason: FailureReason,
}

impl FailureRecord {
	pub fn csv_line(&self) -> String {
		format!(
			"{},{},{}",
			self.block_number,
			self.tx_hash,
			self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
		)
	}
}

impl fmt::Display for FailureRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"block {}, tx {}, timestamp {} ({})",
			self.block_number,
			self.tx_hash,
			self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
			self.reason,
		)
	}
}

/// Aggregate result of one range audit.
#[derive(Debug, Clone, Default)]
pub struct AuditReport {
	pub blocks_scanned: u64,
	pub blocks_unavailable: u64,
	pub failures: Vec<FailureRecord>,
}

impl AuditReport {
	pub fn all_retrievable(&self) -> bool {
		self.failures.is_empty()
	}
}
