mod journal;

pub use journal::{JournaledState, StateSnapshot};

use crate::errors::DatabaseError;
use bytes::Bytes;
use oxevm_common::types::Account;
use oxevm_common::{Address, H256};

/// Read-only state backend. [`JournaledState`] layers caching, mutation, and
/// snapshots on top; implementations only answer point lookups.
pub trait Database: Send + Sync {
    /// Account record at `address`. `None` means no record exists at all,
    /// which is not the same as an existing-but-empty account.
    fn get_account(&self, address: Address) -> Result<Option<Account>, DatabaseError>;

    /// Code bytes for a hash previously surfaced in an [`Account`].
    fn get_code(&self, code_hash: H256) -> Result<Bytes, DatabaseError>;

    /// Hash of a historical block, for block-hash lookups during execution.
    fn get_block_hash(&self, block_number: u64) -> Result<H256, DatabaseError>;
}
