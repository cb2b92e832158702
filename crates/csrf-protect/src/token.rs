//! Real tokens and their per-request masked form
//!
//! The real token is 32 random bytes kept in the signed cookie. Pages embed
//! a masked copy instead: a fresh one-time pad followed by `pad XOR token`,
//! standard base64 encoded. The masked string changes on every request while
//! always unmasking to the same real token.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use subtle::ConstantTimeEq;

/// Length of a real token in bytes
pub(crate) const TOKEN_LENGTH: usize = 32;

pub(crate) fn generate_random_bytes(length: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; length];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

pub(crate) fn mask(real: &[u8]) -> String {
    let otp = generate_random_bytes(real.len());
    let mut combined = otp.clone();
    combined.extend(xor(&otp, real));
    STANDARD.encode(combined)
}

/// `None` when `issued` is not a well-formed masked token
pub(crate) fn unmask(issued: &str) -> Option<Vec<u8>> {
    let decoded = STANDARD.decode(issued.trim()).ok()?;
    if decoded.len() != TOKEN_LENGTH * 2 {
        return None;
    }

    let (otp, masked) = decoded.split_at(TOKEN_LENGTH);
    Some(xor(otp, masked))
}

/// Constant-time comparison
pub(crate) fn compare(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b).map(|(x, y)| x ^ y).collect()
}
