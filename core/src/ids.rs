//! Record identifier generation.
//!
//! Identifiers are `ID-` followed by nine upper-case base-36 characters.
//! Uniqueness is best-effort: 36^9 draws per slot, no collision check.
//!
//! Production stores seed from OS entropy. Tests seed explicitly so the
//! identifiers they see are reproducible run to run.

use crate::types::RecordId;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub const ID_PREFIX: &str = "ID-";
pub const ID_BODY_LEN: usize = 9;

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Source of fresh record identifiers for one store.
pub struct IdGenerator {
    inner: Pcg64Mcg,
}

impl IdGenerator {
    pub fn from_entropy() -> Self {
        Self {
            inner: Pcg64Mcg::from_entropy(),
        }
    }

    /// Deterministic stream. Same seed = same identifiers.
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    pub fn next_id(&mut self) -> RecordId {
        let mut id = String::with_capacity(ID_PREFIX.len() + ID_BODY_LEN);
        id.push_str(ID_PREFIX);
        for _ in 0..ID_BODY_LEN {
            let index = (self.inner.next_u64() % ALPHABET.len() as u64) as usize;
            id.push(ALPHABET[index] as char);
        }
        id
    }
}

/// True if `id` has the shape this generator produces.
pub fn is_generated_id(id: &str) -> bool {
    match id.strip_prefix(ID_PREFIX) {
        Some(body) => {
            body.len() == ID_BODY_LEN
                && body
                    .bytes()
                    .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
        }
        None => false,
    }
}
