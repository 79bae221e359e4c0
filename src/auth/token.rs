//! Opaque bearer tokens.
//!
//! A token is nothing but random bytes from the OS generator, hex encoded.
//! It carries no claims and no expiry; it is valid exactly as long as it is
//! the value stored on some user.

use rand::{rngs::OsRng, RngCore};

use crate::config::MIN_TOKEN_BYTES;

/// Issues a token of `bytes` random bytes (never fewer than 26).
pub fn issue_token(bytes: usize) -> String {
    let mut buffer = vec![0u8; bytes.max(MIN_TOKEN_BYTES)];
    OsRng.fill_bytes(&mut buffer);
    hex::encode(buffer)
}
