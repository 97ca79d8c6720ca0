use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use keccak_hash::keccak;
use oxevm_common::types::ChainConfig;
use oxevm_common::{Address, H256, U256};
use tracing::debug;

use crate::call_frame::{CallFrame, CallerRef};
use crate::constants::{CODE_DEPOSIT_COST, EOF_PREFIX, MAX_CALL_DEPTH, MAX_CODE_SIZE};
use crate::db::JournaledState;
use crate::environment::{Environment, TxEnv};
use crate::errors::{CreateReport, ExecutionReport, InternalError, VMError};
use crate::interpreter::Interpreter;
use crate::precompiles::{PrecompileFn, PrecompileRegistry};
use crate::tracer::{CallTracer, CallType};
use crate::utils::{calculate_create2_address, calculate_create_address};

/// Clone-able flag for stopping an execution from another thread. Once
/// cancelled it stays cancelled for everything the engine runs afterwards,
/// resets included.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Call/create engine: runs message calls and deployments against a
/// [`JournaledState`], delegating bytecode to an [`Interpreter`] and
/// registered precompile handlers.
///
/// One engine value serves one transaction at a time; [`Evm::reset`] rebinds
/// it to the next transaction without rebuilding the per-block parts.
pub struct Evm<'a> {
    pub db: &'a mut JournaledState,
    pub env: Environment,
    /// Frames currently on the stack above the external entry point.
    pub depth: usize,
    pub tracer: CallTracer,
    pub precompiles: PrecompileRegistry,
    interpreter: Arc<dyn Interpreter>,
    abort: Arc<AtomicBool>,
}

impl<'a> Evm<'a> {
    pub fn new(
        db: &'a mut JournaledState,
        env: Environment,
        interpreter: Arc<dyn Interpreter>,
        precompiles: PrecompileRegistry,
    ) -> Self {
        Self {
            db,
            env,
            depth: 0,
            tracer: CallTracer::disabled(),
            precompiles,
            interpreter,
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Rebinds the engine to another transaction. Block context, chain
    /// config and the cancellation flag are kept as they are; a tracer for
    /// the new transaction must be assigned separately.
    pub fn reset(&mut self, tx: TxEnv) {
        self.env.tx = tx;
    }

    pub fn chain_config(&self) -> &ChainConfig {
        &self.env.config
    }

    /// Requests cancellation. The interpreter observes it between steps via
    /// [`Evm::cancelled`] and bails out with an abort fault.
    pub fn cancel(&self) {
        debug!("execution cancel requested");
        self.abort.store(true, Ordering::Relaxed);
    }

    pub fn cancelled(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.abort))
    }

    /// Message call to `address`, transferring `value` from the caller and
    /// running the callee's code with `calldata`.
    ///
    /// Fails without a state change when the stack is already at the depth
    /// limit or, for non-zero `value`, when the transfer guard declines;
    /// both failures hand the full budget back. Calling an address with no
    /// record and no value under the empty-account rules is a traced no-op.
    pub fn call(
        &mut self,
        caller: CallerRef,
        address: Address,
        gas: u64,
        value: U256,
        calldata: Bytes,
    ) -> Result<ExecutionReport, VMError> {
        self.generic_call(CallParams {
            kind: CallType::Call,
            gas,
            msg_sender: caller.address,
            to: address,
            code_address: address,
            value,
            calldata,
            check_transfer: !value.is_zero(),
            should_transfer_value: true,
            is_static: false,
        })
    }

    /// Runs `address`'s code in the caller's own context: storage and
    /// balance are the caller's, and no value moves. The guard still runs
    /// unconditionally so a caller cannot over-charge itself.
    pub fn call_code(
        &mut self,
        caller: CallerRef,
        address: Address,
        gas: u64,
        value: U256,
        calldata: Bytes,
    ) -> Result<ExecutionReport, VMError> {
        self.generic_call(CallParams {
            kind: CallType::CallCode,
            gas,
            msg_sender: caller.address,
            to: caller.address,
            code_address: address,
            value,
            calldata,
            check_transfer: true,
            should_transfer_value: false,
            is_static: false,
        })
    }

    /// Runs `address`'s code in the caller's context while also inheriting
    /// the caller's own sender and value, as if the code were the caller's.
    pub fn delegate_call(
        &mut self,
        caller: CallerRef,
        address: Address,
        gas: u64,
        calldata: Bytes,
    ) -> Result<ExecutionReport, VMError> {
        self.generic_call(CallParams {
            kind: CallType::DelegateCall,
            gas,
            msg_sender: caller.caller,
            to: caller.address,
            code_address: address,
            value: caller.value,
            calldata,
            check_transfer: false,
            should_transfer_value: false,
            is_static: false,
        })
    }

    /// Read-only message call: no value, and the callee frame runs with
    /// state writes forbidden.
    pub fn static_call(
        &mut self,
        caller: CallerRef,
        address: Address,
        gas: u64,
        calldata: Bytes,
    ) -> Result<ExecutionReport, VMError> {
        self.generic_call(CallParams {
            kind: CallType::StaticCall,
            gas,
            msg_sender: caller.address,
            to: address,
            code_address: address,
            value: U256::zero(),
            calldata,
            check_transfer: false,
            should_transfer_value: false,
            is_static: true,
        })
    }

    /// Deploys `code` at the address derived from the caller's account and
    /// current nonce.
    pub fn create(
        &mut self,
        caller: CallerRef,
        code: Bytes,
        gas: u64,
        value: U256,
    ) -> Result<CreateReport, VMError> {
        let nonce = self.db.get_nonce(caller.address)?;
        let address = calculate_create_address(caller.address, nonce);
        let code_hash = keccak(&code);
        self.generic_create(CallType::Create, caller, code, code_hash, gas, value, address)
    }

    /// Deploys `code` at the address derived from the caller's account, the
    /// salt and the init code hash, independent of the caller's nonce.
    pub fn create2(
        &mut self,
        caller: CallerRef,
        code: Bytes,
        gas: u64,
        value: U256,
        salt: U256,
    ) -> Result<CreateReport, VMError> {
        let code_hash = keccak(&code);
        let address = calculate_create2_address(caller.address, salt, code_hash);
        self.generic_create(CallType::Create2, caller, code, code_hash, gas, value, address)
    }

    fn generic_call(&mut self, params: CallParams) -> Result<ExecutionReport, VMError> {
        let CallParams {
            kind,
            gas,
            msg_sender,
            to,
            code_address,
            value,
            calldata,
            check_transfer,
            should_transfer_value,
            is_static,
        } = params;

        if self.depth >= MAX_CALL_DEPTH {
            return Ok(ExecutionReport::failure(VMError::DepthExceeded, gas));
        }
        if check_transfer {
            let can_transfer = self.env.block.can_transfer;
            if !can_transfer(self.db, msg_sender, value)? {
                return Ok(ExecutionReport::failure(VMError::InsufficientBalance, gas));
            }
        }

        let snapshot = self.db.snapshot();
        let precompile = self.precompiles.lookup(code_address, &self.env.rules);

        if should_transfer_value {
            if !self.db.account_exists(to)? {
                if precompile.is_none() && self.env.rules.is_eip158 && value.is_zero() {
                    // Value-less call to an address with no record: no
                    // account comes into existence and the budget is
                    // returned whole, but the call still shows up in the
                    // trace.
                    self.tracer
                        .enter(kind, msg_sender, code_address, value, gas, &calldata);
                    self.tracer.exit(0, &Bytes::new(), None, self.depth == 0)?;
                    return Ok(ExecutionReport::success(Bytes::new(), gas));
                }
                self.db.create_account(to)?;
            }
            let transfer = self.env.block.transfer;
            transfer(self.db, msg_sender, to, value)?;
        }
        if is_static {
            // Zero-value self-credit so the callee counts as touched under
            // the empty-account rules.
            self.db.add_balance(to, U256::zero())?;
        }

        self.tracer
            .enter(kind, msg_sender, code_address, value, gas, &calldata);

        let callee = match precompile {
            Some(handler) => Callee::Precompile(handler),
            None => Callee::Contract {
                bytecode: self.db.get_code(code_address)?,
                code_hash: self.db.get_code_hash(code_address)?,
            },
        };

        let (output, mut gas_left, error) = match callee {
            Callee::Precompile(handler) => {
                let mut gas_remaining = gas;
                match handler(&calldata, &mut gas_remaining) {
                    Ok(output) => (output, gas_remaining, None),
                    Err(err) if err.is_infrastructure() => return Err(err),
                    Err(err) => (Bytes::new(), gas_remaining, Some(err)),
                }
            }
            Callee::Contract {
                bytecode,
                code_hash,
            } => {
                if bytecode.is_empty() {
                    // Nothing to run; the transfer and touches above stand.
                    (Bytes::new(), gas, None)
                } else {
                    let mut frame = CallFrame::new(
                        msg_sender,
                        to,
                        code_address,
                        bytecode,
                        code_hash,
                        value,
                        calldata,
                        gas,
                        is_static,
                        false,
                    );
                    let (output, error) = self.run_frame(&mut frame)?;
                    (output, frame.gas_remaining, error)
                }
            }
        };

        if let Some(ref err) = error {
            self.db.revert_to_snapshot(snapshot)?;
            debug!(%err, depth = self.depth, "call frame failed");
            if !err.is_revert() {
                gas_left = 0;
            }
        }

        self.tracer.exit(
            gas.saturating_sub(gas_left),
            &output,
            error.as_ref(),
            self.depth == 0,
        )?;

        Ok(ExecutionReport {
            output,
            gas_left,
            error,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn generic_create(
        &mut self,
        kind: CallType,
        caller: CallerRef,
        code: Bytes,
        code_hash: H256,
        gas: u64,
        value: U256,
        address: Address,
    ) -> Result<CreateReport, VMError> {
        if self.depth >= MAX_CALL_DEPTH {
            return Ok(CreateReport::failure(VMError::DepthExceeded, gas));
        }
        let can_transfer = self.env.block.can_transfer;
        if !can_transfer(self.db, caller.address, value)? {
            return Ok(CreateReport::failure(VMError::InsufficientBalance, gas));
        }

        let nonce = self.db.get_nonce(caller.address)?;
        let Some(next_nonce) = nonce.checked_add(1) else {
            return Ok(CreateReport::failure(VMError::NonceOverflow, gas));
        };
        self.db.set_nonce(caller.address, next_nonce)?;
        if self.env.rules.is_berlin {
            // The deployment address stays warm even if the create fails.
            self.db.mark_address_accessed(address);
        }

        if self
            .db
            .get_account(address)?
            .is_some_and(|account| account.create_would_collide())
        {
            // The nonce bump above is the only state change so far; the
            // budget goes back to the caller untouched.
            return Ok(CreateReport::failure(VMError::AddressCollision, gas));
        }

        let snapshot = self.db.snapshot();
        self.db.create_account(address)?;
        if self.env.rules.is_eip158 {
            self.db.set_nonce(address, 1)?;
        }
        let transfer = self.env.block.transfer;
        transfer(self.db, caller.address, address, value)?;

        self.tracer
            .enter(kind, caller.address, address, value, gas, &code);

        let mut frame = CallFrame::new(
            caller.address,
            address,
            address,
            code,
            code_hash,
            value,
            Bytes::new(),
            gas,
            false,
            true,
        );
        let (output, mut error) = self.run_frame(&mut frame)?;
        let mut gas_left = frame.gas_remaining;

        if error.is_none() && self.env.rules.is_eip158 && output.len() > MAX_CODE_SIZE {
            error = Some(VMError::MaxCodeSizeExceeded);
        }
        if error.is_none() && self.env.rules.is_london && output.first() == Some(&EOF_PREFIX) {
            error = Some(VMError::InvalidCode);
        }
        if error.is_none() {
            let deposit = u64::try_from(output.len())
                .map_err(|_| InternalError::TypeConversion)?
                .checked_mul(CODE_DEPOSIT_COST)
                .ok_or(InternalError::Overflow)?;
            match gas_left.checked_sub(deposit) {
                Some(remaining) => {
                    gas_left = remaining;
                    self.db.set_code(address, output.clone())?;
                }
                None => error = Some(VMError::CodeStoreOutOfGas),
            }
        }

        if let Some(ref err) = error {
            // Before Homestead a failed code deposit keeps the partial
            // state: the account stands, the deposit is skipped and the
            // remaining gas is not consumed.
            let keep_partial_state =
                !self.env.rules.is_homestead && matches!(err, VMError::CodeStoreOutOfGas);
            if !keep_partial_state {
                self.db.revert_to_snapshot(snapshot)?;
                debug!(%err, depth = self.depth, "create frame failed");
                if !err.is_revert() {
                    gas_left = 0;
                }
            }
        }

        self.tracer.exit(
            gas.saturating_sub(gas_left),
            &output,
            error.as_ref(),
            self.depth == 0,
        )?;

        Ok(CreateReport {
            address,
            output,
            gas_left,
            error,
        })
    }

    /// Hands `frame` to the interpreter one level deeper, then splits the
    /// result into the output and the frame error. Infrastructure errors
    /// pass through; an explicit revert surfaces the frame's revert payload
    /// as the output.
    fn run_frame(&mut self, frame: &mut CallFrame) -> Result<(Bytes, Option<VMError>), VMError> {
        self.depth = self.depth.checked_add(1).ok_or(InternalError::Overflow)?;
        let interpreter = Arc::clone(&self.interpreter);
        let result = interpreter.run(self, frame);
        self.depth = self.depth.saturating_sub(1);

        match result {
            Ok(output) => Ok((output, None)),
            Err(err) if err.is_infrastructure() => Err(err),
            Err(err) if err.is_revert() => Ok((mem::take(&mut frame.output), Some(err))),
            Err(err) => Ok((Bytes::new(), Some(err))),
        }
    }
}

/// Shared shape of the four call-family operations.
struct CallParams {
    kind: CallType,
    gas: u64,
    msg_sender: Address,
    to: Address,
    code_address: Address,
    value: U256,
    calldata: Bytes,
    check_transfer: bool,
    should_transfer_value: bool,
    is_static: bool,
}

/// What a call dispatches to once the address is resolved.
enum Callee {
    Precompile(PrecompileFn),
    Contract { bytecode: Bytes, code_hash: H256 },
}
