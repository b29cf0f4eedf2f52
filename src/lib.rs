#![deny(missing_docs)]

//! # prehash
//!
//! **prehash** computes the per-index hash array of a proof-of-work puzzle
//! instance.  Every slot `j` starts as `BLAKE2b-256(j || M || pk || mes || w)`
//! and is resampled by re-hashing until it falls below `k·Q`, so that the
//! final reduction modulo the group order `Q` is unbiased.  The finished
//! array is either reduced modulo `Q` or additionally scaled by a secret
//! scalar `x`.
//!
//! ## Features
//!
//! * **Fixed-width arithmetic** on [`ruint`] 256-bit integers via the
//!   [`GroupOrder`] type: threshold comparison, reduction and multiplication
//!   modulo `Q` through the full 512-bit product.
//! * **Resumable hashing**: the [`HashEngine`] trait saves a context after a
//!   fixed prefix; [`Blake2bEngine`] is the production engine.
//! * **The pipeline**: [`Prehasher`] exposes the Init, Unfinalized-Init,
//!   Update and Final phases plus a driver with a round bound.  Phases are
//!   dispatched across the rayon pool.
//! * **Amortised attempts**: [`UnfinalizedContexts`] holds one saved context
//!   per index for a public key, so repeated attempts only absorb `mes || w`.
//! * **Configuration** through [`PrehashConfig`] (JSON via serde), validated
//!   into immutable [`PrehashParams`].
//!
//! ## Usage
//!
//! ```rust
//! use prehash::{FinalVariant, PackedInput, PrehashConfig, Prehasher};
//!
//! let mut config = PrehashConfig::default();
//! config.n = 256;
//! let params = config.validate()?;
//! let buffer = vec![9u8; params.layout().total_len()];
//! let input = PackedInput::new(&buffer, *params.layout())?;
//!
//! let run = Prehasher::new(params).prehash(&input, FinalVariant::MultSecKey)?;
//! assert_eq!(run.array.hashes().len(), 256);
//! assert!(run.array.invalid().iter().all(|&i| i == 0));
//! # Ok::<(), prehash::PrehashError>(())
//! ```

mod array;
mod buffer;
pub mod config;
mod context;
mod dispatch;
mod engine;
mod error;
mod io;
pub mod modular;
pub mod pipeline;

pub use array::PrehashArray;
pub use buffer::{pack_input, BufferLayout, PackedInput};
pub use config::{counter_message, MessageSpec, PrehashConfig, PrehashParams};
pub use context::UnfinalizedContexts;
pub use engine::{Blake2bEngine, Digest256, HashEngine};
pub use error::PrehashError;
pub use io::write_hash_series;
pub use modular::{less_than, GroupOrder, ThresholdPolicy, CURVE25519_ORDER, U256};
pub use pipeline::{FinalVariant, PrehashRun, PrehashStats, Prehasher};
