use bytes::Bytes;
use oxevm_common::Address;
use thiserror::Error;

/// Why a frame failed.
///
/// Everything up to [`VMError::ExecutionReverted`] is a frame outcome: it is
/// reported inside an [`ExecutionReport`] or [`CreateReport`] and callers
/// treat every kind the same way, with one exception. An explicit revert is
/// the only error that keeps the frame's leftover gas; every other frame
/// error consumes it all.
///
/// [`VMError::Database`] and [`VMError::Internal`] are not frame outcomes.
/// They travel through the `Err` channel and abort the whole execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VMError {
    #[error("max call depth exceeded")]
    DepthExceeded,
    #[error("insufficient balance for transfer")]
    InsufficientBalance,
    #[error("nonce uint64 overflow")]
    NonceOverflow,
    #[error("contract address collision")]
    AddressCollision,
    #[error("max code size exceeded")]
    MaxCodeSizeExceeded,
    #[error("invalid code: must not begin with 0xef")]
    InvalidCode,
    #[error("contract creation code storage out of gas")]
    CodeStoreOutOfGas,
    #[error("execution reverted")]
    ExecutionReverted,
    #[error("{0}")]
    Fault(#[from] ExecutionFault),
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("internal error: {0}")]
    Internal(#[from] InternalError),
}

impl VMError {
    /// Errors that abort the whole execution instead of failing one frame.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, VMError::Database(_) | VMError::Internal(_))
    }

    /// The one frame error that preserves leftover gas.
    pub fn is_revert(&self) -> bool {
        matches!(self, VMError::ExecutionReverted)
    }
}

/// Interpreter-reported failure. The engine makes no distinction between
/// variants: the frame rolls back and its remaining gas is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionFault {
    #[error("out of gas")]
    OutOfGas,
    #[error("invalid opcode")]
    InvalidOpcode,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("stack overflow")]
    StackOverflow,
    #[error("write protection")]
    WriteProtection,
    #[error("execution aborted")]
    Aborted,
    #[error("{0}")]
    Other(String),
}

/// Failure inside a pluggable state backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabaseError {
    #[error("{0}")]
    Custom(String),
}

/// Broken engine invariant. Reaching one of these is a bug, not a frame
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("arithmetic overflow")]
    Overflow,
    #[error("arithmetic underflow")]
    Underflow,
    #[error("type conversion failure")]
    TypeConversion,
    #[error("unknown state snapshot")]
    InvalidSnapshot,
    #[error("could not pop tracer callframe")]
    CouldNotPopCallframe,
}

/// Outcome of one call-family operation: output bytes, the gas left for the
/// caller, and the frame error if the frame failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub output: Bytes,
    pub gas_left: u64,
    pub error: Option<VMError>,
}

impl ExecutionReport {
    pub fn success(output: Bytes, gas_left: u64) -> Self {
        Self {
            output,
            gas_left,
            error: None,
        }
    }

    pub fn failure(error: VMError, gas_left: u64) -> Self {
        Self {
            output: Bytes::new(),
            gas_left,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a create-family operation. `address` is where the code was (or
/// would have been) deployed; attempts that fail before dispatch report the
/// zero address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateReport {
    pub address: Address,
    pub output: Bytes,
    pub gas_left: u64,
    pub error: Option<VMError>,
}

impl CreateReport {
    pub fn failure(error: VMError, gas_left: u64) -> Self {
        Self {
            address: Address::zero(),
            output: Bytes::new(),
            gas_left,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
