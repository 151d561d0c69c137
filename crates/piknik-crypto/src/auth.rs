//! Keyed BLAKE2b authentication stages
//!
//! Each stage tag is `BLAKE2b-256(key=PSK, salt=[stage, 0 x 15], personal="PK")`
//! over a fixed concatenation of protocol fields:
//! ```text
//! stage 0  h0 = H(version || r)
//! stage 1  h1 = H(version || r2 || h0)
//! stage 2  h2 = H(h1 || opcode)                        get / move
//!          h2 = H(h1 || opcode || ts || signature)     store
//! stage 3  h3 = H(h2 || ts || signature)               get / move
//!          h3 = H(h2)                                  store
//! ```

use blake2::digest::core_api::{Buffer, UpdateCore, VariableOutputCore};
use blake2::digest::Output;
use blake2::Blake2bVarCore;
use piknik_core::{
    Opcode, CHALLENGE_SIZE, HASH_SIZE, KEY_ID_SIZE, KEY_SIZE, PERSONALIZATION, SIGNATURE_SIZE,
    U64_SIZE,
};
use zeroize::Zeroize;

use crate::keys::Psk;

/// A 32-byte authentication tag (h0..h3)
pub type AuthTag = [u8; HASH_SIZE];

const SALT_SIZE: usize = 16;
const BLAKE2B_BLOCK_SIZE: usize = 128;

/// BLAKE2b in sequential mode with the full parameter block.
///
/// A non-empty `key` is absorbed as a zero-padded first block, as the BLAKE2
/// keyed mode requires; an empty key hashes unkeyed.
fn blake2b_with_params(
    key: &[u8],
    salt: &[u8; SALT_SIZE],
    persona: &[u8; SALT_SIZE],
    parts: &[&[u8]],
    out: &mut [u8],
) {
    let mut core = Blake2bVarCore::new_with_params(salt, persona, key.len(), out.len());
    let mut buffer = Buffer::<Blake2bVarCore>::default();

    if !key.is_empty() {
        let mut key_block = [0u8; BLAKE2B_BLOCK_SIZE];
        key_block[..key.len()].copy_from_slice(key);
        buffer.digest_blocks(&key_block, |blocks| core.update_blocks(blocks));
        key_block.zeroize();
    }
    for part in parts {
        buffer.digest_blocks(part, |blocks| core.update_blocks(blocks));
    }

    let mut full = Output::<Blake2bVarCore>::default();
    core.finalize_variable_core(&mut buffer, &mut full);
    out.copy_from_slice(&full[..out.len()]);
    full.as_mut_slice().zeroize();
}

fn stage_salt(stage: u8) -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    salt[0] = stage;
    salt
}

fn keyed_stage(psk: &Psk, stage: u8, parts: &[&[u8]]) -> AuthTag {
    let mut tag = [0u8; HASH_SIZE];
    blake2b_with_params(
        psk.as_bytes(),
        &stage_salt(stage),
        &PERSONALIZATION,
        parts,
        &mut tag,
    );
    tag
}

/// Client hello tag: `H0(version || r)`
pub fn auth0(psk: &Psk, version: u8, r: &[u8; CHALLENGE_SIZE]) -> AuthTag {
    keyed_stage(psk, 0, &[&[version], r])
}

/// Server hello tag: `H1(version || r2 || h0)`
pub fn auth1(psk: &Psk, version: u8, h0: &AuthTag, r2: &[u8; CHALLENGE_SIZE]) -> AuthTag {
    keyed_stage(psk, 1, &[&[version], r2, h0])
}

/// Get/move request tag: `H2(h1 || opcode)`
pub fn auth2_get(psk: &Psk, h1: &AuthTag, opcode: Opcode) -> AuthTag {
    keyed_stage(psk, 2, &[h1, &[opcode.as_byte()]])
}

/// Store request tag: `H2(h1 || opcode || ts || signature)`
pub fn auth2_store(
    psk: &Psk,
    h1: &AuthTag,
    opcode: Opcode,
    ts: &[u8; U64_SIZE],
    signature: &[u8; SIGNATURE_SIZE],
) -> AuthTag {
    keyed_stage(psk, 2, &[h1, &[opcode.as_byte()], ts, signature])
}

/// Get/move response tag: `H3(h2 || ts || signature)`
pub fn auth3_get(
    psk: &Psk,
    h2: &AuthTag,
    ts: &[u8; U64_SIZE],
    signature: &[u8; SIGNATURE_SIZE],
) -> AuthTag {
    keyed_stage(psk, 3, &[h2, ts, signature])
}

/// Store confirmation tag: `H3(h2)`
pub fn auth3_store(psk: &Psk, h2: &AuthTag) -> AuthTag {
    keyed_stage(psk, 3, &[h2])
}

/// Derive the public 8-byte identifier of an encryption key.
///
/// Unkeyed BLAKE2b-64 with the "PK" personalization; the top bit of the last
/// byte is cleared.
pub fn derive_key_id(encrypt_sk: &[u8; KEY_SIZE]) -> [u8; KEY_ID_SIZE] {
    let mut id = [0u8; KEY_ID_SIZE];
    blake2b_with_params(
        &[],
        &[0u8; SALT_SIZE],
        &PERSONALIZATION,
        &[encrypt_sk],
        &mut id,
    );
    id[KEY_ID_SIZE - 1] &= 0x7f;
    id
}
