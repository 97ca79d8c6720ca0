mod account;
mod chain_config;

pub use account::Account;
pub use chain_config::{ChainConfig, Fork, ForkRules};
