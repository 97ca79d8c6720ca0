use serde::{Deserialize, Serialize};

/// Named protocol upgrades, oldest first, so activation checks read as
/// `fork >= Fork::Byzantium`.
///
/// Paris carries no activation block of its own; it is signaled per block by
/// the presence of a post-merge randomness value.
#[derive(
    Debug, PartialEq, Eq, PartialOrd, Ord, Default, Hash, Clone, Copy, Serialize, Deserialize,
)]
pub enum Fork {
    #[default]
    Frontier,
    Homestead,
    SpuriousDragon,
    Byzantium,
    Istanbul,
    Berlin,
    London,
    Paris,
}

/// Per-chain activation schedule, one optional activation block per fork
/// (`None` = never activates, `Some(0)` = active from genesis).
///
/// Field names follow the JSON chain-config convention, so a config can be
/// read straight out of a genesis file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// Current chain identifier.
    #[serde(default)]
    pub chain_id: u64,

    #[serde(default)]
    pub homestead_block: Option<u64>,
    /// EIP-158/161 empty-account rules, part of Spurious Dragon.
    #[serde(default)]
    pub eip158_block: Option<u64>,
    #[serde(default)]
    pub byzantium_block: Option<u64>,
    #[serde(default)]
    pub istanbul_block: Option<u64>,
    #[serde(default)]
    pub berlin_block: Option<u64>,
    #[serde(default)]
    pub london_block: Option<u64>,
}

impl ChainConfig {
    pub fn is_homestead_activated(&self, block_number: u64) -> bool {
        self.homestead_block.is_some_and(|block| block <= block_number)
    }

    pub fn is_eip158_activated(&self, block_number: u64) -> bool {
        self.eip158_block.is_some_and(|block| block <= block_number)
    }

    pub fn is_byzantium_activated(&self, block_number: u64) -> bool {
        self.byzantium_block.is_some_and(|block| block <= block_number)
    }

    pub fn is_istanbul_activated(&self, block_number: u64) -> bool {
        self.istanbul_block.is_some_and(|block| block <= block_number)
    }

    pub fn is_berlin_activated(&self, block_number: u64) -> bool {
        self.berlin_block.is_some_and(|block| block <= block_number)
    }

    pub fn is_london_activated(&self, block_number: u64) -> bool {
        self.london_block.is_some_and(|block| block <= block_number)
    }

    /// Highest block-scheduled fork active at `block_number`.
    pub fn fork(&self, block_number: u64) -> Fork {
        if self.is_london_activated(block_number) {
            Fork::London
        } else if self.is_berlin_activated(block_number) {
            Fork::Berlin
        } else if self.is_istanbul_activated(block_number) {
            Fork::Istanbul
        } else if self.is_byzantium_activated(block_number) {
            Fork::Byzantium
        } else if self.is_eip158_activated(block_number) {
            Fork::SpuriousDragon
        } else if self.is_homestead_activated(block_number) {
            Fork::Homestead
        } else {
            Fork::Frontier
        }
    }

    /// Feature-flag snapshot for one block, derived once per execution and
    /// consulted by every frame instead of re-checking block numbers.
    pub fn rules(&self, block_number: u64, is_merge: bool) -> ForkRules {
        ForkRules {
            is_homestead: self.is_homestead_activated(block_number),
            is_eip158: self.is_eip158_activated(block_number),
            is_byzantium: self.is_byzantium_activated(block_number),
            is_istanbul: self.is_istanbul_activated(block_number),
            is_berlin: self.is_berlin_activated(block_number),
            is_london: self.is_london_activated(block_number),
            is_merge,
        }
    }

    /// Ethereum mainnet activation heights.
    pub fn mainnet() -> Self {
        Self {
            chain_id: 1,
            homestead_block: Some(1_150_000),
            eip158_block: Some(2_675_000),
            byzantium_block: Some(4_370_000),
            istanbul_block: Some(9_069_000),
            berlin_block: Some(12_244_000),
            london_block: Some(12_965_000),
        }
    }
}

/// The fork flags a single execution runs under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForkRules {
    pub is_homestead: bool,
    pub is_eip158: bool,
    pub is_byzantium: bool,
    pub is_istanbul: bool,
    pub is_berlin: bool,
    pub is_london: bool,
    pub is_merge: bool,
}
