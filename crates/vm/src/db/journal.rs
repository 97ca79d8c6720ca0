use super::Database;
use crate::errors::{InternalError, VMError};
use bytes::Bytes;
use oxevm_common::constants::EMPTY_CODE_HASH;
use oxevm_common::types::Account;
use oxevm_common::utils::keccak;
use oxevm_common::{Address, H256, U256};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Opaque checkpoint handle issued by [`JournaledState::snapshot`]. Valid
/// for at most one revert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot(usize);

/// Pre-images of every account first written while this backup was on top
/// of the stack.
#[derive(Debug, Default)]
struct StateBackup {
    accounts: FxHashMap<Address, Option<Account>>,
}

/// Working state for one execution: a write-back account/code cache over a
/// read-only [`Database`], plus a stack of undo logs implementing
/// checkpoint/rollback.
///
/// `None` in the account cache records that the backend has no record for
/// that address, so existence checks hit the backend once.
///
/// Reverting never touches the access set: warm-address marks outlive every
/// rollback. Writes made before the first snapshot are permanent.
pub struct JournaledState {
    store: Arc<dyn Database>,
    accounts: FxHashMap<Address, Option<Account>>,
    code: FxHashMap<H256, Bytes>,
    accessed_addresses: FxHashSet<Address>,
    backups: Vec<StateBackup>,
}

impl JournaledState {
    pub fn new(store: Arc<dyn Database>) -> Self {
        Self {
            store,
            accounts: FxHashMap::default(),
            code: FxHashMap::default(),
            accessed_addresses: FxHashSet::default(),
            backups: Vec::new(),
        }
    }

    /// Issues a checkpoint. Everything mutated afterwards is undone by
    /// [`Self::revert_to_snapshot`] with the returned handle.
    pub fn snapshot(&mut self) -> StateSnapshot {
        let handle = StateSnapshot(self.backups.len());
        self.backups.push(StateBackup::default());
        handle
    }

    /// Restores every account to its state at `snapshot`, newest backups
    /// first, and discards the checkpoints above it.
    pub fn revert_to_snapshot(&mut self, snapshot: StateSnapshot) -> Result<(), VMError> {
        if snapshot.0 >= self.backups.len() {
            return Err(InternalError::InvalidSnapshot.into());
        }
        while self.backups.len() > snapshot.0 {
            let Some(backup) = self.backups.pop() else {
                break;
            };
            for (address, prior) in backup.accounts {
                self.accounts.insert(address, prior);
            }
        }
        Ok(())
    }

    /// Caches the backend's view of `address` on first touch.
    fn ensure_cached(&mut self, address: Address) -> Result<(), VMError> {
        if !self.accounts.contains_key(&address) {
            let fetched = self.store.get_account(address)?;
            self.accounts.insert(address, fetched);
        }
        Ok(())
    }

    /// Records the current state of `address` in the newest backup. First
    /// write per backup wins.
    fn backup_account(&mut self, address: Address) {
        if let Some(backup) = self.backups.last_mut() {
            if !backup.accounts.contains_key(&address) {
                let prior = self.accounts.get(&address).cloned().flatten();
                backup.accounts.insert(address, prior);
            }
        }
    }

    pub fn account_exists(&mut self, address: Address) -> Result<bool, VMError> {
        self.ensure_cached(address)?;
        Ok(self
            .accounts
            .get(&address)
            .is_some_and(|slot| slot.is_some()))
    }

    /// Current view of `address`, `None` when no record exists.
    pub fn get_account(&mut self, address: Address) -> Result<Option<&Account>, VMError> {
        self.ensure_cached(address)?;
        Ok(self.accounts.get(&address).and_then(|slot| slot.as_ref()))
    }

    /// Mutable handle on `address`, materializing an empty record if none
    /// exists. The pre-image goes into the newest backup first.
    fn get_account_mut(&mut self, address: Address) -> Result<&mut Account, VMError> {
        self.ensure_cached(address)?;
        self.backup_account(address);
        let slot = self.accounts.entry(address).or_insert(None);
        Ok(slot.get_or_insert_with(Account::default))
    }

    /// Creates (or re-creates) the record at `address` with a fresh nonce
    /// and no code. Balance carries over so funds sent ahead of a deployment
    /// are not destroyed.
    pub fn create_account(&mut self, address: Address) -> Result<(), VMError> {
        let balance = self.get_balance(address)?;
        self.backup_account(address);
        self.accounts.insert(
            address,
            Some(Account {
                balance,
                ..Default::default()
            }),
        );
        Ok(())
    }

    pub fn get_balance(&mut self, address: Address) -> Result<U256, VMError> {
        Ok(self
            .get_account(address)?
            .map(|account| account.balance)
            .unwrap_or_default())
    }

    /// Credits `address`, materializing the record if needed. A zero amount
    /// still counts as a touch.
    pub fn add_balance(&mut self, address: Address, amount: U256) -> Result<(), VMError> {
        let account = self.get_account_mut(address)?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(InternalError::Overflow)?;
        Ok(())
    }

    pub fn sub_balance(&mut self, address: Address, amount: U256) -> Result<(), VMError> {
        let account = self.get_account_mut(address)?;
        account.balance = account
            .balance
            .checked_sub(amount)
            .ok_or(InternalError::Underflow)?;
        Ok(())
    }

    /// Debit-then-credit in one step.
    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), VMError> {
        self.sub_balance(from, amount)?;
        self.add_balance(to, amount)
    }

    pub fn get_nonce(&mut self, address: Address) -> Result<u64, VMError> {
        Ok(self
            .get_account(address)?
            .map(|account| account.nonce)
            .unwrap_or_default())
    }

    pub fn set_nonce(&mut self, address: Address, nonce: u64) -> Result<(), VMError> {
        self.get_account_mut(address)?.nonce = nonce;
        Ok(())
    }

    /// Code hash at `address`: zero when no record exists, the empty hash
    /// when the account exists without code.
    pub fn get_code_hash(&mut self, address: Address) -> Result<H256, VMError> {
        Ok(self
            .get_account(address)?
            .map(|account| account.code_hash)
            .unwrap_or_default())
    }

    /// Code bytes at `address`; empty when there is no record or no code.
    pub fn get_code(&mut self, address: Address) -> Result<Bytes, VMError> {
        let code_hash = match self.get_account(address)? {
            Some(account) if account.has_code() => account.code_hash,
            _ => return Ok(Bytes::new()),
        };
        self.get_code_by_hash(code_hash)
    }

    /// Code bytes for `code_hash`, from the cache or the backend. The cache
    /// is content-addressed, so entries orphaned by a rollback are simply
    /// unreachable.
    pub fn get_code_by_hash(&mut self, code_hash: H256) -> Result<Bytes, VMError> {
        if code_hash == EMPTY_CODE_HASH || code_hash.is_zero() {
            return Ok(Bytes::new());
        }
        if let Some(code) = self.code.get(&code_hash) {
            return Ok(code.clone());
        }
        let code = self.store.get_code(code_hash)?;
        self.code.insert(code_hash, code.clone());
        Ok(code)
    }

    /// Installs `code` at `address` and records its hash on the account.
    pub fn set_code(&mut self, address: Address, code: Bytes) -> Result<(), VMError> {
        let code_hash = if code.is_empty() {
            EMPTY_CODE_HASH
        } else {
            keccak(&code)
        };
        self.code.insert(code_hash, code);
        self.get_account_mut(address)?.code_hash = code_hash;
        Ok(())
    }

    /// Marks `address` warm for access pricing. Marks are never undone.
    pub fn mark_address_accessed(&mut self, address: Address) {
        self.accessed_addresses.insert(address);
    }

    pub fn is_address_accessed(&self, address: Address) -> bool {
        self.accessed_addresses.contains(&address)
    }

    /// Historical block hash, straight from the backend.
    pub fn get_block_hash(&self, block_number: u64) -> Result<H256, VMError> {
        Ok(self.store.get_block_hash(block_number)?)
    }

    /// In-memory view of `address` without touching the backend. `None`
    /// when the address was never cached or has no record.
    pub fn cached_account(&self, address: Address) -> Option<&Account> {
        self.accounts.get(&address).and_then(|slot| slot.as_ref())
    }
}
