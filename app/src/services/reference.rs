// src/services/reference.rs

use rand_core::{OsRng, RngCore};

pub const REFERENCE_PREFIX: &str = "PLG-";

/// 32 symbols; no 0/O or 1/I.
const ALPHABET: &[u8; 32] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
const BODY_LEN: usize = 8;

/// `PLG-` plus 8 random symbols (40 bits). Uniqueness is enforced by the
/// store; callers retry on a collision.
pub fn generate_reference() -> String {
  let mut bytes = [0u8; BODY_LEN];
  OsRng.fill_bytes(&mut bytes);
  let body: String = bytes.iter().map(|b| ALPHABET[(*b & 0x1f) as usize] as char).collect();
  format!("{}{}", REFERENCE_PREFIX, body)
}
