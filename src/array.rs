//! The prehash array and its invalid-index side list.
//!
//! `hash` has exactly `N` entries and is never resized.  `invalid` also has
//! `N` slots; its first `pending_len()` entries form the current invalid
//! list.  Entries are 1-based indices into `hash`, with `0` meaning "valid".
//! Compaction moves the non-zero entries of the list to the front, zeroes the
//! rest and shrinks the list length.

use blake2::digest::{consts::U32, Digest};
use blake2::Blake2b;

use crate::engine::Digest256;
use crate::error::PrehashError;
use crate::modular::{to_digest, U256};

const ARRAY_DIGEST_DOMAIN: &[u8] = b"PREHASH_ARRAY";

/// Hash array plus its invalid-index list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrehashArray {
    hash: Vec<U256>,
    invalid: Vec<u32>,
    len: usize,
}

impl PrehashArray {
    /// Wraps the output of an Init pass: `invalid` is uncompacted and spans all `N` slots.
    pub(crate) fn from_init(hash: Vec<U256>, invalid: Vec<u32>) -> Self {
        debug_assert_eq!(hash.len(), invalid.len());
        let len = invalid.len();
        PrehashArray { hash, invalid, len }
    }

    /// Assembles an array from externally held state.
    ///
    /// `invalid` may be shorter than `hash`; it is padded with zeros and its
    /// original length becomes the list length.  Every non-zero entry must be
    /// a distinct index in `1..=N`.
    pub fn from_parts(hash: Vec<U256>, mut invalid: Vec<u32>) -> Result<Self, PrehashError> {
        let n = hash.len();
        if invalid.len() > n {
            return Err(PrehashError::Configuration(format!(
                "invalid list has {} entries for {n} hashes",
                invalid.len()
            )));
        }
        let mut seen = vec![false; n];
        for &index in invalid.iter().filter(|&&index| index != 0) {
            let slot = index as usize - 1;
            if slot >= n {
                return Err(PrehashError::InvalidIndex { index, n });
            }
            if seen[slot] {
                return Err(PrehashError::Configuration(format!(
                    "duplicate invalid index {index}"
                )));
            }
            seen[slot] = true;
        }
        let len = invalid.len();
        invalid.resize(n, 0);
        Ok(PrehashArray { hash, invalid, len })
    }

    /// Array size `N`.
    pub fn n(&self) -> usize {
        self.hash.len()
    }

    /// Current hash values.
    pub fn hashes(&self) -> &[U256] {
        &self.hash
    }

    /// All `N` invalid-list slots.
    pub fn invalid(&self) -> &[u32] {
        &self.invalid
    }

    /// The current invalid list, `invalid[..pending_len()]`.
    pub fn pending(&self) -> &[u32] {
        &self.invalid[..self.len]
    }

    /// Length of the current invalid list.
    pub fn pending_len(&self) -> usize {
        self.len
    }

    /// `true` once no entry of the invalid list names an index.
    pub fn is_converged(&self) -> bool {
        self.pending().iter().all(|&index| index == 0)
    }

    /// Number of non-zero entries in the invalid list.
    pub fn unresolved(&self) -> usize {
        self.pending().iter().filter(|&&index| index != 0).count()
    }

    /// Drops zero entries from the invalid list and records its new length.
    pub fn compact(&mut self) -> usize {
        let mut write = 0;
        for read in 0..self.len {
            let index = self.invalid[read];
            if index != 0 {
                self.invalid[write] = index;
                write += 1;
            }
        }
        self.invalid[write..self.len].fill(0);
        self.len = write;
        write
    }

    pub(crate) fn hash_mut(&mut self) -> &mut [U256] {
        &mut self.hash
    }

    /// Hash array and the current invalid list, mutably.
    pub(crate) fn split_pending_mut(&mut self) -> (&mut [U256], &mut [u32]) {
        (&mut self.hash, &mut self.invalid[..self.len])
    }

    /// BLAKE2b-256 over the big-endian hash values.
    pub fn digest(&self) -> Digest256 {
        let mut hasher = Blake2b::<U32>::new();
        hasher.update(ARRAY_DIGEST_DOMAIN);
        hasher.update((self.hash.len() as u64).to_be_bytes());
        for value in &self.hash {
            hasher.update(to_digest(value));
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        out
    }
}
