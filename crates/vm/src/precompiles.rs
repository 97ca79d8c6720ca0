use crate::errors::VMError;
use bytes::Bytes;
use oxevm_common::types::{Fork, ForkRules};
use oxevm_common::{Address, H160};
use rustc_hash::FxHashMap;

/// Handler for one precompiled contract. Deducts its own gas from the
/// budget in place; when the budget does not cover the cost it returns
/// `ExecutionFault::OutOfGas` and the engine consumes what is left.
pub type PrecompileFn = fn(calldata: &Bytes, gas_remaining: &mut u64) -> Result<Bytes, VMError>;

/// Identity of a precompiled contract: where it lives and since when.
pub struct Precompile {
    pub address: H160,
    pub name: &'static str,
    pub active_since_fork: Fork,
}

pub const ECRECOVER: Precompile = Precompile {
    address: H160([
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x01,
    ]),
    name: "ECREC",
    active_since_fork: Fork::Frontier,
};

pub const SHA2_256: Precompile = Precompile {
    address: H160([
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x02,
    ]),
    name: "SHA256",
    active_since_fork: Fork::Frontier,
};

pub const RIPEMD_160: Precompile = Precompile {
    address: H160([
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x03,
    ]),
    name: "RIPEMD160",
    active_since_fork: Fork::Frontier,
};

pub const IDENTITY: Precompile = Precompile {
    address: H160([
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x04,
    ]),
    name: "ID",
    active_since_fork: Fork::Frontier,
};

pub const MODEXP: Precompile = Precompile {
    address: H160([
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x05,
    ]),
    name: "MODEXP",
    active_since_fork: Fork::Byzantium,
};

pub const ECADD: Precompile = Precompile {
    address: H160([
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x06,
    ]),
    name: "BN254_ADD",
    active_since_fork: Fork::Byzantium,
};

pub const ECMUL: Precompile = Precompile {
    address: H160([
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x07,
    ]),
    name: "BN254_MUL",
    active_since_fork: Fork::Byzantium,
};

pub const ECPAIRING: Precompile = Precompile {
    address: H160([
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x08,
    ]),
    name: "BN254_PAIRING",
    active_since_fork: Fork::Byzantium,
};

pub const BLAKE2F: Precompile = Precompile {
    address: H160([
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x09,
    ]),
    name: "BLAKE2F",
    active_since_fork: Fork::Istanbul,
};

pub const PRECOMPILES: [Precompile; 9] = [
    ECRECOVER, SHA2_256, RIPEMD_160, IDENTITY, MODEXP, ECADD, ECMUL, ECPAIRING, BLAKE2F,
];

/// Descriptors of the precompiles live at `fork`, in address order.
pub fn precompiles_for_fork(fork: Fork) -> impl Iterator<Item = Precompile> {
    PRECOMPILES
        .into_iter()
        .filter(move |precompile| precompile.active_since_fork <= fork)
}

pub fn is_precompile(address: &Address, fork: Fork) -> bool {
    precompiles_for_fork(fork).any(|precompile| precompile.address == *address)
}

/// The newest activation tier enabled by `rules`. Precompiles whose
/// `active_since_fork` is at or below this tier are live.
pub fn active_tier(rules: &ForkRules) -> Fork {
    if rules.is_berlin {
        Fork::Berlin
    } else if rules.is_istanbul {
        Fork::Istanbul
    } else if rules.is_byzantium {
        Fork::Byzantium
    } else if rules.is_homestead {
        Fork::Homestead
    } else {
        Fork::Frontier
    }
}

/// Handlers keyed by address, each gated on its activation fork. The engine
/// consults the registry before loading account code, so a registered
/// address shadows whatever is stored there.
#[derive(Debug, Default, Clone)]
pub struct PrecompileRegistry {
    handlers: FxHashMap<Address, (Fork, PrecompileFn)>,
}

impl PrecompileRegistry {
    /// Binds `handler` to the descriptor's address and activation fork.
    /// Re-registering an address replaces the previous handler.
    pub fn register(&mut self, descriptor: &Precompile, handler: PrecompileFn) {
        self.handlers
            .insert(descriptor.address, (descriptor.active_since_fork, handler));
    }

    /// The handler for `address` if one is registered and live under
    /// `rules`.
    pub fn lookup(&self, address: Address, rules: &ForkRules) -> Option<PrecompileFn> {
        let (active_since, handler) = self.handlers.get(&address)?;
        (*active_since <= active_tier(rules)).then_some(*handler)
    }

    pub fn is_precompile(&self, address: Address, rules: &ForkRules) -> bool {
        self.lookup(address, rules).is_some()
    }
}
