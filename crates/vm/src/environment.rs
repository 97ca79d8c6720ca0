use crate::db::JournaledState;
use crate::errors::VMError;
use oxevm_common::types::{ChainConfig, ForkRules};
use oxevm_common::{Address, H256, U256};

/// Decides whether `from` can part with `amount` right now. Runs before any
/// state mutation for the frame.
pub type CanTransferFn = fn(&mut JournaledState, Address, U256) -> Result<bool, VMError>;

/// Moves `amount` from the first address to the second. The guard has
/// already approved the amount when this runs.
pub type TransferFn = fn(&mut JournaledState, Address, Address, U256) -> Result<(), VMError>;

/// Baseline guard: sufficient balance.
pub fn default_can_transfer(
    db: &mut JournaledState,
    from: Address,
    amount: U256,
) -> Result<bool, VMError> {
    Ok(db.get_balance(from)? >= amount)
}

/// Baseline transfer: debit `from`, credit `to`.
pub fn default_transfer(
    db: &mut JournaledState,
    from: Address,
    to: Address,
    amount: U256,
) -> Result<(), VMError> {
    db.transfer(from, to, amount)
}

/// Block-scoped facts, fixed for every frame of an execution.
///
/// The transfer callbacks abstract the value model so the engine never
/// hard-codes how balances move; embedders substitute their own pair when
/// fees or accounting differ.
#[derive(Debug, Clone)]
pub struct BlockEnv {
    pub coinbase: Address,
    pub number: u64,
    pub timestamp: u64,
    pub gas_limit: u64,
    pub difficulty: U256,
    /// Post-merge randomness beacon. `Some` signals the merge happened.
    pub prev_randao: Option<H256>,
    pub base_fee_per_gas: U256,
    pub can_transfer: CanTransferFn,
    pub transfer: TransferFn,
}

impl Default for BlockEnv {
    fn default() -> Self {
        Self {
            coinbase: Address::zero(),
            number: 0,
            timestamp: 0,
            gas_limit: 0,
            difficulty: U256::zero(),
            prev_randao: None,
            base_fee_per_gas: U256::zero(),
            can_transfer: default_can_transfer,
            transfer: default_transfer,
        }
    }
}

/// Transaction-scoped facts, replaced as a unit by [`crate::vm::Evm::reset`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TxEnv {
    pub origin: Address,
    pub gas_price: U256,
}

/// Everything a frame can observe besides the state itself.
#[derive(Debug, Clone)]
pub struct Environment {
    pub block: BlockEnv,
    pub tx: TxEnv,
    pub config: ChainConfig,
    /// Derived once from `config` and `block`; frames consult flags, never
    /// block numbers.
    pub rules: ForkRules,
}

impl Environment {
    pub fn new(block: BlockEnv, tx: TxEnv, config: ChainConfig) -> Self {
        let rules = config.rules(block.number, block.prev_randao.is_some());
        Self {
            block,
            tx,
            config,
            rules,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(BlockEnv::default(), TxEnv::default(), ChainConfig::default())
    }
}
