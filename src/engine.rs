//! Keyed hash engine with context save and resume.
//!
//! A [`HashEngine`] hashes a message given as a list of byte fields, and can
//! also absorb a fixed prefix into a reusable context that is later finished
//! with a variable suffix.  Finishing a context is bit-exact with hashing the
//! concatenation in one call:
//!
//! ```
//! use prehash::{Blake2bEngine, HashEngine};
//!
//! let engine = Blake2bEngine;
//! let ctx = engine.begin(&[b"index".as_slice(), b"prefix".as_slice()]);
//! assert_eq!(
//!     engine.finish(&ctx, &[b"suffix".as_slice()]),
//!     engine.hash(&[b"index".as_slice(), b"prefix".as_slice(), b"suffix".as_slice()]),
//! );
//! ```

use blake2::digest::{consts::U32, Digest};

type Blake2b256 = blake2::Blake2b<U32>;

/// A 256-bit digest as raw bytes.
pub type Digest256 = [u8; 32];

/// Hash primitive shared read-only by every worker.
pub trait HashEngine: Send + Sync {
    /// Saved internal state after absorbing a prefix.
    type Context: Clone + Send + Sync;

    /// Absorbs `prefix` into a fresh context.
    fn begin(&self, prefix: &[&[u8]]) -> Self::Context;

    /// Finishes a copy of `ctx` with `suffix`; `ctx` itself is left untouched.
    fn finish(&self, ctx: &Self::Context, suffix: &[&[u8]]) -> Digest256;

    /// One-shot hash of the concatenation of `parts`.
    fn hash(&self, parts: &[&[u8]]) -> Digest256 {
        self.finish(&self.begin(parts), &[])
    }
}

/// BLAKE2b with a 32-byte output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake2bEngine;

impl HashEngine for Blake2bEngine {
    type Context = Blake2b256;

    fn begin(&self, prefix: &[&[u8]]) -> Self::Context {
        let mut hasher = Blake2b256::new();
        for part in prefix {
            hasher.update(part);
        }
        hasher
    }

    fn finish(&self, ctx: &Self::Context, suffix: &[&[u8]]) -> Digest256 {
        let mut hasher = ctx.clone();
        for part in suffix {
            hasher.update(part);
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        out
    }

    fn hash(&self, parts: &[&[u8]]) -> Digest256 {
        let mut hasher = Blake2b256::new();
        for part in parts {
            hasher.update(part);
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        out
    }
}
