use bytes::Bytes;
use oxevm_common::{Address, H256, U256};

/// Identity one frame presents to the operations it invokes: its own
/// address, who called it, and the value it was entered with. Regular calls
/// only read `address`; delegate calls pass `caller` and `value` through to
/// the child unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerRef {
    pub address: Address,
    pub caller: Address,
    pub value: U256,
}

impl CallerRef {
    /// Ref for a top-level entry point, e.g. an externally owned account.
    pub fn account(address: Address) -> Self {
        Self {
            address,
            caller: address,
            value: U256::zero(),
        }
    }
}

impl From<&CallFrame> for CallerRef {
    fn from(frame: &CallFrame) -> Self {
        Self {
            address: frame.to,
            caller: frame.msg_sender,
            value: frame.msg_value,
        }
    }
}

/// Scoped execution state for one call or create. Built right before
/// dispatch, discarded when the frame returns; `gas_remaining` and `output`
/// are the only fields the interpreter writes.
#[derive(Debug, Clone, Default)]
pub struct CallFrame {
    /// Immediate sender as the frame observes it. For delegate frames this
    /// is the enclosing frame's own caller.
    pub msg_sender: Address,
    /// Account whose identity and storage the code runs against.
    pub to: Address,
    /// Where the executed bytecode was loaded from. Differs from `to` when
    /// foreign code runs in a borrowed context.
    pub code_address: Address,
    pub bytecode: Bytes,
    pub code_hash: H256,
    pub msg_value: U256,
    pub calldata: Bytes,
    /// Budget on entry, drained in place as code runs.
    pub gas_remaining: u64,
    /// Read-only frame: state-changing operations must fail inside it.
    pub is_static: bool,
    /// Deployment frame: `bytecode` is init code and its return value is the
    /// code to store.
    pub is_create: bool,
    /// Return data, or the revert payload when the frame reverted.
    pub output: Bytes,
}

impl CallFrame {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        msg_sender: Address,
        to: Address,
        code_address: Address,
        bytecode: Bytes,
        code_hash: H256,
        msg_value: U256,
        calldata: Bytes,
        gas_remaining: u64,
        is_static: bool,
        is_create: bool,
    ) -> Self {
        Self {
            msg_sender,
            to,
            code_address,
            bytecode,
            code_hash,
            msg_value,
            calldata,
            gas_remaining,
            is_static,
            is_create,
            output: Bytes::new(),
        }
    }
}
