//! # oxevm - EVM call and create engine
//!
//! The orchestration layer of an Ethereum-style virtual machine: message
//! calls, deployments, state journaling and call tracing, with bytecode
//! execution delegated to a pluggable interpreter.
//!
//! ## Overview
//!
//! oxevm owns everything that happens *around* bytecode:
//! - **Dispatch**: call, callcode, delegatecall, staticcall, create, create2
//! - **State discipline**: snapshot on entry, rollback on failure
//! - **Gas accounting at the frame boundary**: budgets in, leftovers out
//! - **Fork gating**: per-block feature rules drive every behavioral switch
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                          Evm                             │
//! │  ┌─────────────┐  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  CallFrame  │  │ Environment  │  │   CallTracer    │  │
//! │  └─────────────┘  └──────────────┘  └─────────────────┘  │
//! │                                                          │
//! │  ┌────────────────────┐  ┌────────────────────────────┐  │
//! │  │ PrecompileRegistry │  │  Interpreter (pluggable)   │  │
//! │  └────────────────────┘  └────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//!                             │
//!                             ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                     JournaledState                       │
//! │          (snapshots over a read-only Database)           │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`vm`] | The engine: call/create dispatch and frame lifecycle |
//! | [`call_frame`] | Per-frame execution context |
//! | [`environment`] | Block and transaction context, transfer hooks |
//! | [`interpreter`] | The bytecode execution seam |
//! | [`precompiles`] | Precompile descriptors and handler registry |
//! | [`db`] | Database trait and journaled state on top of it |
//! | [`errors`] | Frame outcomes vs. infrastructure errors |
//! | [`tracer`] | Geth-compatible call tracer |
//! | [`utils`] | Deployment address derivation |
//!
//! ## Quick Start
//!
//! ```ignore
//! use oxevm::db::JournaledState;
//! use oxevm::call_frame::CallerRef;
//! use oxevm::vm::Evm;
//!
//! let mut db = JournaledState::new(store);
//! let mut vm = Evm::new(&mut db, env, interpreter, precompiles);
//!
//! let report = vm.call(CallerRef::account(sender), callee, gas, value, calldata)?;
//! if report.is_success() {
//!     println!("gas left: {}", report.gas_left);
//! }
//! ```

pub mod call_frame;
pub mod constants;
pub mod db;
pub mod environment;
pub mod errors;
pub mod interpreter;
pub mod precompiles;
pub mod tracer;
pub mod utils;
pub mod vm;
pub use environment::*;
