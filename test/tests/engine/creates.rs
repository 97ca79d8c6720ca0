//! Create-family scenarios: address derivation, deployment bookkeeping and
//! the post-run code checks.
//!
//! Key scenarios tested:
//! - Derived addresses follow the nonce (create) or the salt (create2).
//! - The caller's nonce bump and the warm-address mark survive failures.
//! - Collisions hand the budget back untouched.
//! - Code size, EOF prefix and deposit charging gate on the active fork,
//!   including the legacy deposit-shortfall behavior.

use std::sync::Arc;

use bytes::Bytes;
use oxevm::call_frame::CallerRef;
use oxevm::constants::{MAX_CALL_DEPTH, MAX_CODE_SIZE};
use oxevm::db::JournaledState;
use oxevm::errors::{ExecutionFault, VMError};
use oxevm::precompiles::PrecompileRegistry;
use oxevm::utils::{calculate_create2_address, calculate_create_address};
use oxevm::vm::Evm;
use oxevm_common::types::Fork;
use oxevm_common::utils::keccak;
use oxevm_common::{Address, U256};
use oxevm_test::{addr, env_at, ScriptedInterpreter, SeededStore, Step};

fn engine<'a>(
    db: &'a mut JournaledState,
    fork: Fork,
    interpreter: Arc<ScriptedInterpreter>,
) -> Evm<'a> {
    Evm::new(db, env_at(fork), interpreter, PrecompileRegistry::default())
}

#[test]
fn create_deploys_at_the_nonce_derived_address() {
    let runtime = Bytes::from_static(&[0xfe, 0xed, 0xbe, 0xef, 0x00]);
    let store = SeededStore::default().with_account(addr(1), 100, 0);
    let mut db = JournaledState::new(Arc::new(store));
    let interpreter = Arc::new(ScriptedInterpreter::new([Step::Return {
        output: runtime.clone(),
        gas_cost: 1_000,
    }]));
    let mut vm = engine(&mut db, Fork::SpuriousDragon, interpreter.clone());

    let report = vm
        .create(
            CallerRef::account(addr(1)),
            Bytes::from_static(&[0x60]),
            60_000,
            U256::from(9),
        )
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.address, calculate_create_address(addr(1), 0));
    assert_eq!(report.output, runtime);
    // 1_000 for the init run plus 200 per deployed byte.
    assert_eq!(report.gas_left, 58_000);

    let frames = interpreter.frames();
    assert!(frames[0].is_create);
    assert_eq!(frames[0].bytecode, Bytes::from_static(&[0x60]));
    assert_eq!(frames[0].to, report.address);

    assert_eq!(db.get_nonce(addr(1)).unwrap(), 1);
    assert_eq!(db.get_nonce(report.address).unwrap(), 1);
    assert_eq!(db.get_balance(report.address).unwrap(), U256::from(9));
    assert_eq!(db.get_balance(addr(1)).unwrap(), U256::from(91));
    assert_eq!(db.get_code(report.address).unwrap(), runtime);
}

#[test]
fn deployed_code_is_callable_afterwards() {
    let runtime = Bytes::from_static(&[0xaa, 0xbb]);
    let store = SeededStore::default().with_account(addr(1), 100, 0);
    let mut db = JournaledState::new(Arc::new(store));
    let interpreter = Arc::new(ScriptedInterpreter::new([
        Step::Return {
            output: runtime.clone(),
            gas_cost: 0,
        },
        Step::Return {
            output: Bytes::from_static(&[0xcc]),
            gas_cost: 500,
        },
    ]));
    let mut vm = engine(&mut db, Fork::SpuriousDragon, interpreter.clone());

    let deployed = vm
        .create(
            CallerRef::account(addr(1)),
            Bytes::from_static(&[0x60]),
            50_000,
            U256::zero(),
        )
        .unwrap();
    assert!(deployed.is_success());

    let report = vm
        .call(
            CallerRef::account(addr(1)),
            deployed.address,
            10_000,
            U256::zero(),
            Bytes::new(),
        )
        .unwrap();

    assert_eq!(report.output, Bytes::from_static(&[0xcc]));
    let frames = interpreter.frames();
    assert_eq!(frames[1].bytecode, runtime);
    assert_eq!(frames[1].code_address, deployed.address);
    assert!(!frames[1].is_create);
}

#[test]
fn create_at_depth_limit_fails_without_state_change() {
    let store = SeededStore::default().with_account(addr(1), 100, 0);
    let mut db = JournaledState::new(Arc::new(store));
    let interpreter = Arc::new(ScriptedInterpreter::halting());
    let mut vm = engine(&mut db, Fork::SpuriousDragon, interpreter.clone());
    vm.depth = MAX_CALL_DEPTH;

    let report = vm
        .create(
            CallerRef::account(addr(1)),
            Bytes::new(),
            50_000,
            U256::zero(),
        )
        .unwrap();

    assert_eq!(report.error, Some(VMError::DepthExceeded));
    assert_eq!(report.gas_left, 50_000);
    assert_eq!(report.address, Address::zero());
    assert!(interpreter.frames().is_empty());
    assert_eq!(db.get_nonce(addr(1)).unwrap(), 0);
}

#[test]
fn underfunded_create_skips_the_nonce_bump() {
    let store = SeededStore::default().with_account(addr(1), 5, 0);
    let mut db = JournaledState::new(Arc::new(store));
    let mut vm = engine(
        &mut db,
        Fork::SpuriousDragon,
        Arc::new(ScriptedInterpreter::halting()),
    );

    let report = vm
        .create(
            CallerRef::account(addr(1)),
            Bytes::new(),
            50_000,
            U256::from(10),
        )
        .unwrap();

    assert_eq!(report.error, Some(VMError::InsufficientBalance));
    assert_eq!(report.gas_left, 50_000);
    assert_eq!(db.get_nonce(addr(1)).unwrap(), 0);
}

#[test]
fn collision_returns_the_budget_and_keeps_the_nonce_bump() {
    let target = calculate_create_address(addr(1), 0);
    let store = SeededStore::default()
        .with_account(addr(1), 100, 0)
        .with_account(target, 0, 1);
    let mut db = JournaledState::new(Arc::new(store));
    let interpreter = Arc::new(ScriptedInterpreter::halting());
    let mut vm = engine(&mut db, Fork::SpuriousDragon, interpreter.clone());

    let report = vm
        .create(
            CallerRef::account(addr(1)),
            Bytes::new(),
            50_000,
            U256::zero(),
        )
        .unwrap();

    assert_eq!(report.error, Some(VMError::AddressCollision));
    assert_eq!(report.gas_left, 50_000);
    assert_eq!(report.address, Address::zero());
    assert!(interpreter.frames().is_empty());
    assert_eq!(db.get_nonce(addr(1)).unwrap(), 1);
    assert_eq!(db.get_nonce(target).unwrap(), 1);
}

#[test]
fn create2_addresses_follow_the_salt() {
    let init = Bytes::from_static(&[0x11]);
    let store = SeededStore::default().with_account(addr(1), 10, 0);
    let mut db = JournaledState::new(Arc::new(store));
    let interpreter = Arc::new(ScriptedInterpreter::new([
        Step::Return {
            output: Bytes::new(),
            gas_cost: 0,
        },
        Step::Return {
            output: Bytes::new(),
            gas_cost: 0,
        },
    ]));
    let mut vm = engine(&mut db, Fork::SpuriousDragon, interpreter);

    let first = vm
        .create2(
            CallerRef::account(addr(1)),
            init.clone(),
            50_000,
            U256::zero(),
            U256::from(1),
        )
        .unwrap();
    let second = vm
        .create2(
            CallerRef::account(addr(1)),
            init.clone(),
            50_000,
            U256::zero(),
            U256::from(2),
        )
        .unwrap();

    assert!(first.is_success());
    assert!(second.is_success());
    assert_eq!(
        first.address,
        calculate_create2_address(addr(1), U256::from(1), keccak(&init))
    );
    assert_eq!(
        second.address,
        calculate_create2_address(addr(1), U256::from(2), keccak(&init))
    );
    assert_ne!(first.address, second.address);

    // Same salt again lands on the first address, which now has a nonce.
    // Retrying keeps failing the same way and never touches the occupant.
    for _ in 0..2 {
        let retry = vm
            .create2(
                CallerRef::account(addr(1)),
                init.clone(),
                50_000,
                U256::zero(),
                U256::from(1),
            )
            .unwrap();
        assert_eq!(retry.error, Some(VMError::AddressCollision));
    }

    assert_eq!(db.get_nonce(addr(1)).unwrap(), 4);
    assert_eq!(db.get_nonce(first.address).unwrap(), 1);
}

#[test]
fn pre_eip158_contract_starts_with_nonce_zero() {
    let store = SeededStore::default().with_account(addr(1), 100, 0);
    let mut db = JournaledState::new(Arc::new(store));
    let mut vm = engine(
        &mut db,
        Fork::Homestead,
        Arc::new(ScriptedInterpreter::new([Step::Return {
            output: Bytes::new(),
            gas_cost: 0,
        }])),
    );

    let report = vm
        .create(
            CallerRef::account(addr(1)),
            Bytes::new(),
            50_000,
            U256::zero(),
        )
        .unwrap();

    assert!(report.is_success());
    assert!(db.account_exists(report.address).unwrap());
    assert_eq!(db.get_nonce(report.address).unwrap(), 0);
}

#[test]
fn oversized_code_is_rejected_after_eip158() {
    let big = Bytes::from(vec![0u8; MAX_CODE_SIZE + 1]);
    let store = SeededStore::default().with_account(addr(1), 100, 0);
    let mut db = JournaledState::new(Arc::new(store));
    let mut vm = engine(
        &mut db,
        Fork::SpuriousDragon,
        Arc::new(ScriptedInterpreter::new([Step::Return {
            output: big.clone(),
            gas_cost: 0,
        }])),
    );

    let report = vm
        .create(
            CallerRef::account(addr(1)),
            Bytes::new(),
            10_000_000,
            U256::zero(),
        )
        .unwrap();

    assert_eq!(report.error, Some(VMError::MaxCodeSizeExceeded));
    assert_eq!(report.gas_left, 0);
    assert_eq!(report.output, big);
    assert!(!db.account_exists(report.address).unwrap());
}

#[test]
fn oversized_code_is_allowed_before_eip158() {
    let big = Bytes::from(vec![0u8; MAX_CODE_SIZE + 1]);
    let store = SeededStore::default().with_account(addr(1), 100, 0);
    let mut db = JournaledState::new(Arc::new(store));
    let mut vm = engine(
        &mut db,
        Fork::Homestead,
        Arc::new(ScriptedInterpreter::new([Step::Return {
            output: big.clone(),
            gas_cost: 0,
        }])),
    );

    let report = vm
        .create(
            CallerRef::account(addr(1)),
            Bytes::new(),
            6_000_000,
            U256::zero(),
        )
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.gas_left, 6_000_000 - 200 * (MAX_CODE_SIZE as u64 + 1));
    assert_eq!(db.get_code(report.address).unwrap(), big);
}

#[test]
fn london_rejects_eof_prefixed_code() {
    let store = SeededStore::default().with_account(addr(1), 100, 0);
    let mut db = JournaledState::new(Arc::new(store));
    let mut vm = engine(
        &mut db,
        Fork::London,
        Arc::new(ScriptedInterpreter::new([Step::Return {
            output: Bytes::from_static(&[0xef, 0x00]),
            gas_cost: 0,
        }])),
    );

    let report = vm
        .create(
            CallerRef::account(addr(1)),
            Bytes::new(),
            50_000,
            U256::zero(),
        )
        .unwrap();

    assert_eq!(report.error, Some(VMError::InvalidCode));
    assert_eq!(report.gas_left, 0);
    assert!(!db.account_exists(report.address).unwrap());
}

#[test]
fn pre_london_stores_eof_prefixed_code() {
    let store = SeededStore::default().with_account(addr(1), 100, 0);
    let mut db = JournaledState::new(Arc::new(store));
    let mut vm = engine(
        &mut db,
        Fork::Berlin,
        Arc::new(ScriptedInterpreter::new([Step::Return {
            output: Bytes::from_static(&[0xef, 0x00]),
            gas_cost: 0,
        }])),
    );

    let report = vm
        .create(
            CallerRef::account(addr(1)),
            Bytes::new(),
            50_000,
            U256::zero(),
        )
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.gas_left, 49_600);
    assert_eq!(
        db.get_code(report.address).unwrap(),
        Bytes::from_static(&[0xef, 0x00])
    );
}

#[test]
fn deposit_shortfall_fails_the_create_after_homestead() {
    let store = SeededStore::default().with_account(addr(1), 100, 0);
    let mut db = JournaledState::new(Arc::new(store));
    let mut vm = engine(
        &mut db,
        Fork::Homestead,
        Arc::new(ScriptedInterpreter::new([Step::Return {
            output: Bytes::from(vec![0xcd; 100]),
            gas_cost: 0,
        }])),
    );

    let report = vm
        .create(
            CallerRef::account(addr(1)),
            Bytes::new(),
            10_000,
            U256::zero(),
        )
        .unwrap();

    assert_eq!(report.error, Some(VMError::CodeStoreOutOfGas));
    assert_eq!(report.gas_left, 0);
    assert!(!db.account_exists(report.address).unwrap());
}

#[test]
fn deposit_shortfall_keeps_partial_state_on_frontier() {
    let store = SeededStore::default().with_account(addr(1), 100, 0);
    let mut db = JournaledState::new(Arc::new(store));
    let mut vm = engine(
        &mut db,
        Fork::Frontier,
        Arc::new(ScriptedInterpreter::new([Step::Return {
            output: Bytes::from(vec![0xcd; 100]),
            gas_cost: 0,
        }])),
    );

    let report = vm
        .create(
            CallerRef::account(addr(1)),
            Bytes::new(),
            10_000,
            U256::from(3),
        )
        .unwrap();

    // The deposit failed but nothing is rolled back and no gas is taken.
    assert_eq!(report.error, Some(VMError::CodeStoreOutOfGas));
    assert_eq!(report.gas_left, 10_000);
    assert!(db.account_exists(report.address).unwrap());
    assert!(db.get_code(report.address).unwrap().is_empty());
    assert_eq!(db.get_balance(report.address).unwrap(), U256::from(3));
    assert_eq!(db.get_balance(addr(1)).unwrap(), U256::from(97));
}

#[test]
fn nonce_overflow_fails_before_any_state_change() {
    let store = SeededStore::default().with_account(addr(1), 10, u64::MAX);
    let mut db = JournaledState::new(Arc::new(store));
    let interpreter = Arc::new(ScriptedInterpreter::halting());
    let mut vm = engine(&mut db, Fork::SpuriousDragon, interpreter.clone());

    let report = vm
        .create(
            CallerRef::account(addr(1)),
            Bytes::new(),
            50_000,
            U256::zero(),
        )
        .unwrap();

    assert_eq!(report.error, Some(VMError::NonceOverflow));
    assert_eq!(report.gas_left, 50_000);
    assert!(interpreter.frames().is_empty());
    assert_eq!(db.get_nonce(addr(1)).unwrap(), u64::MAX);
}

#[test]
fn berlin_marks_the_deployment_address_warm_even_on_failure() {
    let target = calculate_create_address(addr(1), 0);
    let store = SeededStore::default()
        .with_account(addr(1), 100, 0)
        .with_account(target, 0, 1);
    let mut db = JournaledState::new(Arc::new(store));
    let mut vm = engine(
        &mut db,
        Fork::Berlin,
        Arc::new(ScriptedInterpreter::halting()),
    );

    let report = vm
        .create(
            CallerRef::account(addr(1)),
            Bytes::new(),
            50_000,
            U256::zero(),
        )
        .unwrap();

    assert_eq!(report.error, Some(VMError::AddressCollision));
    assert!(db.is_address_accessed(target));
}

#[test]
fn pre_berlin_leaves_the_deployment_address_cold() {
    let store = SeededStore::default().with_account(addr(1), 100, 0);
    let mut db = JournaledState::new(Arc::new(store));
    let mut vm = engine(
        &mut db,
        Fork::Homestead,
        Arc::new(ScriptedInterpreter::halting()),
    );

    let report = vm
        .create(
            CallerRef::account(addr(1)),
            Bytes::new(),
            50_000,
            U256::zero(),
        )
        .unwrap();

    assert!(report.is_success());
    assert!(!db.is_address_accessed(report.address));
}

#[test]
fn reverted_init_keeps_leftover_gas_but_rolls_back() {
    let store = SeededStore::default().with_account(addr(1), 100, 0);
    let mut db = JournaledState::new(Arc::new(store));
    let mut vm = engine(
        &mut db,
        Fork::SpuriousDragon,
        Arc::new(ScriptedInterpreter::new([Step::Revert {
            payload: Bytes::from_static(&[0x08]),
            gas_cost: 10_000,
        }])),
    );

    let report = vm
        .create(
            CallerRef::account(addr(1)),
            Bytes::from_static(&[0x60]),
            50_000,
            U256::zero(),
        )
        .unwrap();

    assert_eq!(report.error, Some(VMError::ExecutionReverted));
    assert_eq!(report.gas_left, 40_000);
    assert_eq!(report.output, Bytes::from_static(&[0x08]));
    assert!(!db.account_exists(report.address).unwrap());
    assert_eq!(db.get_nonce(addr(1)).unwrap(), 1);
}

#[test]
fn faulted_init_rolls_back_the_endowment() {
    let store = SeededStore::default().with_account(addr(1), 100, 0);
    let mut db = JournaledState::new(Arc::new(store));
    let mut vm = engine(
        &mut db,
        Fork::SpuriousDragon,
        Arc::new(ScriptedInterpreter::new([Step::Fault(
            ExecutionFault::OutOfGas,
        )])),
    );

    let report = vm
        .create(
            CallerRef::account(addr(1)),
            Bytes::from_static(&[0x60]),
            50_000,
            U256::from(9),
        )
        .unwrap();

    assert_eq!(report.error, Some(VMError::Fault(ExecutionFault::OutOfGas)));
    assert_eq!(report.gas_left, 0);
    assert!(!db.account_exists(report.address).unwrap());
    assert_eq!(db.get_balance(addr(1)).unwrap(), U256::from(100));
    assert_eq!(db.get_nonce(addr(1)).unwrap(), 1);
}

#[test]
fn funds_sent_ahead_of_deployment_are_kept() {
    let target = calculate_create_address(addr(1), 0);
    let store = SeededStore::default()
        .with_account(addr(1), 100, 0)
        .with_account(target, 33, 0);
    let mut db = JournaledState::new(Arc::new(store));
    let mut vm = engine(
        &mut db,
        Fork::SpuriousDragon,
        Arc::new(ScriptedInterpreter::new([Step::Return {
            output: Bytes::new(),
            gas_cost: 0,
        }])),
    );

    let report = vm
        .create(
            CallerRef::account(addr(1)),
            Bytes::new(),
            50_000,
            U256::from(7),
        )
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.address, target);
    assert_eq!(db.get_balance(target).unwrap(), U256::from(40));
}
