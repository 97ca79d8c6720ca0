/// Frames nested deeper than this fail before touching state.
pub const MAX_CALL_DEPTH: usize = 1024;

/// EIP-170 ceiling on deployed code, in bytes.
pub const MAX_CODE_SIZE: usize = 0x6000;

/// Gas charged per byte of code stored at deployment.
pub const CODE_DEPOSIT_COST: u64 = 200;

/// EIP-3541 reserved first byte; deployed code may not start with it.
pub const EOF_PREFIX: u8 = 0xef;

/// Leading byte of the CREATE2 address preimage.
pub const CREATE2_PREFIX: u8 = 0xff;
