use crate::call_frame::CallFrame;
use crate::errors::VMError;
use crate::vm::Evm;
use bytes::Bytes;

/// Bytecode execution seam. The engine owns everything around a frame
/// (snapshots, transfers, post-run gas rules); implementations own
/// everything inside it (fetch-decode-execute, per-opcode gas, enforcing
/// `frame.is_static`).
///
/// Contract:
/// - `frame.gas_remaining` is drained in place as code runs.
/// - `Ok(bytes)` is the frame's return data.
/// - `Err(VMError::ExecutionReverted)` reports an explicit revert, with the
///   revert payload left in `frame.output`.
/// - Any other error is a fault: output is discarded and the engine consumes
///   the frame's remaining gas.
/// - Long-running loops should poll [`Evm::cancelled`] between steps and
///   fail with [`crate::errors::ExecutionFault::Aborted`] once it is set.
///
/// Nested calls re-enter the engine through `vm`, which is why the engine
/// holds implementations behind `Arc` and clones the handle before each run.
pub trait Interpreter: Send + Sync {
    fn run(&self, vm: &mut Evm<'_>, frame: &mut CallFrame) -> Result<Bytes, VMError>;
}
