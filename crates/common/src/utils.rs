pub use keccak_hash::keccak;
