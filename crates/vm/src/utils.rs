use crate::constants::CREATE2_PREFIX;
use keccak_hash::keccak;
use oxevm_common::{Address, H256, U256};
use rlp::RlpStream;

/// Deployment address for a plain create: low 20 bytes of
/// `keccak(rlp([sender, nonce]))`, with the sender's nonce as it was
/// before the deployment bumped it.
pub fn calculate_create_address(sender: Address, nonce: u64) -> Address {
    let mut stream = RlpStream::new_list(2);
    stream.append(&sender);
    stream.append(&nonce);
    Address::from(keccak(stream.out()))
}

/// Deployment address for a salted create: low 20 bytes of
/// `keccak(0xff || sender || salt || keccak(init_code))`.
pub fn calculate_create2_address(sender: Address, salt: U256, init_code_hash: H256) -> Address {
    let mut preimage = Vec::with_capacity(85);
    preimage.push(CREATE2_PREFIX);
    preimage.extend_from_slice(sender.as_bytes());
    preimage.extend_from_slice(&salt.to_big_endian());
    preimage.extend_from_slice(init_code_hash.as_bytes());
    Address::from(keccak(&preimage))
}
