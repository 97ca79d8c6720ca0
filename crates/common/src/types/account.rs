use crate::constants::EMPTY_CODE_HASH;
use ethereum_types::{H256, U256};
use serde::{Deserialize, Serialize};

/// One account as the engine tracks it. Code bytes live in the state store,
/// keyed by `code_hash`, so duplicate code between accounts is held once and
/// only fetched when a frame actually executes it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub balance: U256,
    pub nonce: u64,
    pub code_hash: H256,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            balance: U256::zero(),
            nonce: 0,
            code_hash: EMPTY_CODE_HASH,
        }
    }
}

impl Account {
    pub fn has_nonce(&self) -> bool {
        self.nonce != 0
    }

    /// A zero code hash counts as "no code" so backends that report
    /// never-initialized accounts that way are handled.
    pub fn has_code(&self) -> bool {
        self.code_hash != EMPTY_CODE_HASH && !self.code_hash.is_zero()
    }

    /// Deploying onto this account would clobber live state.
    pub fn create_would_collide(&self) -> bool {
        self.has_code() || self.has_nonce()
    }

    /// EIP-161 emptiness: zero balance, zero nonce, no code.
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.nonce == 0 && !self.has_code()
    }
}
