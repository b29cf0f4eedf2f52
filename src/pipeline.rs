//! Prehash pipeline: Init, Unfinalized-Init, Update and Final.
//!
//! The driver runs
//!
//! ```text
//! Init -> compact -> while len > 0 { Update -> compact } -> Final
//! ```
//!
//! Init hashes `j || M || pk || mes || w` for every index and marks each slot
//! whose value is not below the threshold `k·Q`.  Update re-hashes the
//! rejected values themselves (rejection sampling), and the driver compacts
//! the invalid list between rounds.  Once the list is empty every value is
//! uniform on `[0, k·Q)` and Final reduces it modulo `Q`, optionally scaling
//! by the secret scalar `x`.  Each phase is a data-parallel dispatch that
//! finishes before the next one starts.
//!
//! ```
//! use prehash::{
//!     pack_input, BufferLayout, FinalVariant, GroupOrder, Prehasher, PrehashParams,
//! };
//!
//! let layout = BufferLayout::default();
//! let params = PrehashParams::new(64, GroupOrder::curve25519(), 64, b"M".to_vec(), layout)?;
//! let buffer = pack_input(&layout, &[2; 33], &[3; 32], &[4; 33], &[5; 32], &[6; 32])?;
//! let input = prehash::PackedInput::new(&buffer, layout)?;
//!
//! let run = Prehasher::new(params).prehash(&input, FinalVariant::Reduce)?;
//! assert!(run.array.is_converged());
//! assert!(run
//!     .array
//!     .hashes()
//!     .iter()
//!     .all(|h| h < GroupOrder::curve25519().modulus()));
//! # Ok::<(), prehash::PrehashError>(())
//! ```

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::array::PrehashArray;
use crate::buffer::PackedInput;
use crate::config::PrehashParams;
use crate::context::UnfinalizedContexts;
use crate::dispatch;
use crate::engine::{Blake2bEngine, HashEngine};
use crate::error::PrehashError;
use crate::modular::{from_digest, to_digest, U256};

/// Which Final phase closes a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalVariant {
    /// `hash[j] = hash[j] mod Q`.
    Reduce,
    /// `hash[j] = (hash[j] mod Q) · x mod Q`.
    MultSecKey,
}

/// Timing and round statistics for a driver run.
#[derive(Debug, Clone, Default)]
pub struct PrehashStats {
    /// Update rounds executed.
    pub rounds: u32,
    /// Invalid-list length entering each Update round.
    pub round_sizes: Vec<usize>,
    /// Wall-clock time of the Init (or context-finishing) phase.
    pub init_duration: Duration,
    /// Wall-clock time of each Update round including compaction.
    pub round_durations: Vec<Duration>,
    /// Wall-clock time of the Final phase.
    pub final_duration: Duration,
    /// End-to-end wall-clock time.
    pub total_duration: Duration,
}

/// Array and statistics of a driver run.
#[derive(Debug, Clone)]
pub struct PrehashRun {
    /// Hash array; finalised with an empty invalid list on success.
    pub array: PrehashArray,
    /// Timing and round statistics.
    pub stats: PrehashStats,
}

/// Runs prehash phases with fixed parameters and a hash engine.
#[derive(Debug, Clone)]
pub struct Prehasher<E = Blake2bEngine> {
    params: PrehashParams,
    engine: E,
}

impl Prehasher<Blake2bEngine> {
    /// Creates a pipeline backed by BLAKE2b-256.
    pub fn new(params: PrehashParams) -> Self {
        Self::with_engine(params, Blake2bEngine)
    }
}

impl<E: HashEngine> Prehasher<E> {
    /// Creates a pipeline backed by `engine`.
    pub fn with_engine(params: PrehashParams, engine: E) -> Self {
        Prehasher { params, engine }
    }

    /// The parameters this pipeline was built with.
    pub fn params(&self) -> &PrehashParams {
        &self.params
    }

    /// The hash engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn check_input(&self, input: &PackedInput<'_>) -> Result<(), PrehashError> {
        if input.layout() != self.params.layout() {
            return Err(PrehashError::Configuration(
                "packed input layout differs from configured layout".into(),
            ));
        }
        Ok(())
    }

    fn verdict(&self, j: usize, value: &U256) -> u32 {
        if self.params.order().is_accepted(value) {
            0
        } else {
            j as u32 + 1
        }
    }

    fn from_digests(&self, pairs: Vec<(U256, u32)>) -> PrehashArray {
        let (hash, invalid): (Vec<U256>, Vec<u32>) = pairs.into_iter().unzip();
        PrehashArray::from_init(hash, invalid)
    }

    /// Init phase: `hash[j] = H(j || M || pk || mes || w)` and
    /// `invalid[j] = 0` if `hash[j] < k·Q`, else `j + 1`.
    pub fn init(&self, input: &PackedInput<'_>) -> Result<PrehashArray, PrehashError> {
        self.check_input(input)?;
        let start = Instant::now();
        let (message, pk, mes, w) = (self.params.message(), input.pk(), input.mes(), input.w());
        let pairs = dispatch::map_indexed(self.params.n(), |j| {
            let index = (j as u32).to_be_bytes();
            let value = from_digest(self.engine.hash(&[&index[..], message, pk, mes, w]));
            (value, self.verdict(j, &value))
        });
        let array = self.from_digests(pairs);
        debug!(
            phase = "init",
            n = array.n(),
            rejected = array.unresolved(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "prehash phase complete"
        );
        Ok(array)
    }

    /// Unfinalized-Init phase: `uctx[j] = begin(j || M || pk)`.
    pub fn unfinal_init(
        &self,
        input: &PackedInput<'_>,
    ) -> Result<UnfinalizedContexts<E::Context>, PrehashError> {
        self.check_input(input)?;
        let start = Instant::now();
        let (message, pk) = (self.params.message(), input.pk());
        let contexts = dispatch::map_indexed(self.params.n(), |j| {
            let index = (j as u32).to_be_bytes();
            self.engine.begin(&[&index[..], message, pk])
        });
        debug!(
            phase = "unfinal_init",
            n = contexts.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "prehash phase complete"
        );
        Ok(UnfinalizedContexts::new(pk, contexts))
    }

    /// Init phase computed from saved contexts: finishes `uctx[j]` with
    /// `mes || w`.  Produces the same array as [`Prehasher::init`].
    pub fn init_from_contexts(
        &self,
        uctx: &UnfinalizedContexts<E::Context>,
        input: &PackedInput<'_>,
    ) -> Result<PrehashArray, PrehashError> {
        self.check_input(input)?;
        uctx.ensure_public_key(input.pk())?;
        if uctx.len() != self.params.n() {
            return Err(PrehashError::Configuration(format!(
                "{} unfinalized contexts for N = {}",
                uctx.len(),
                self.params.n()
            )));
        }
        let start = Instant::now();
        let (mes, w) = (input.mes(), input.w());
        let contexts = uctx.as_slice();
        let pairs = dispatch::map_indexed(contexts.len(), |j| {
            let value = from_digest(self.engine.finish(&contexts[j], &[mes, w]));
            (value, self.verdict(j, &value))
        });
        let array = self.from_digests(pairs);
        debug!(
            phase = "init_from_contexts",
            n = array.n(),
            rejected = array.unresolved(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "prehash phase complete"
        );
        Ok(array)
    }

    /// Update phase over the current invalid list.
    ///
    /// For each list entry `i` naming slot `idx = i - 1`, re-hashes
    /// `hash[idx]` and sets the entry to `0` if the new value is accepted,
    /// otherwise leaves `idx + 1`.  Zero entries are left untouched, as are
    /// hash slots not named by the list.  Returns the number of entries that
    /// are still invalid; the caller compacts the list before the next round.
    pub fn update(&self, array: &mut PrehashArray) -> usize {
        let order = self.params.order();
        let (hash, pending) = array.split_pending_mut();
        let resampled = {
            let current: &[U256] = hash;
            dispatch::map_slice(pending, |&index| {
                if index == 0 {
                    return None;
                }
                let slot = index as usize - 1;
                let digest = self.engine.hash(&[&to_digest(&current[slot])[..]]);
                Some((slot, from_digest(digest)))
            })
        };
        let mut still_invalid = 0;
        for (entry, outcome) in pending.iter_mut().zip(resampled) {
            if let Some((slot, value)) = outcome {
                hash[slot] = value;
                if order.is_accepted(&value) {
                    *entry = 0;
                } else {
                    still_invalid += 1;
                }
            }
        }
        still_invalid
    }

    fn ensure_converged(array: &PrehashArray) -> Result<(), PrehashError> {
        if array.is_converged() {
            Ok(())
        } else {
            Err(PrehashError::PreconditionViolation {
                pending: array.unresolved(),
            })
        }
    }

    /// Final phase: `hash[j] = hash[j] mod Q`.
    pub fn final_prehash(&self, array: &mut PrehashArray) -> Result<(), PrehashError> {
        Self::ensure_converged(array)?;
        let order = *self.params.order();
        dispatch::for_each_mut(array.hash_mut(), |_, value| {
            *value = order.reduce_mod(value);
        });
        Ok(())
    }

    /// Final phase with secret scaling: `hash[j] = (hash[j] mod Q) · x mod Q`.
    pub fn final_prehash_mult_sec_key(
        &self,
        input: &PackedInput<'_>,
        array: &mut PrehashArray,
    ) -> Result<(), PrehashError> {
        self.check_input(input)?;
        Self::ensure_converged(array)?;
        let order = *self.params.order();
        let x = input.x();
        dispatch::for_each_mut(array.hash_mut(), |_, value| {
            *value = order.mul_mod(&order.reduce_mod(value), &x);
        });
        Ok(())
    }

    /// Runs the selected Final variant.
    pub fn finalize(
        &self,
        input: &PackedInput<'_>,
        array: &mut PrehashArray,
        variant: FinalVariant,
    ) -> Result<(), PrehashError> {
        match variant {
            FinalVariant::Reduce => self.final_prehash(array),
            FinalVariant::MultSecKey => self.final_prehash_mult_sec_key(input, array),
        }
    }

    /// Compacts, then alternates Update and compaction until the invalid
    /// list is empty or the round bound is reached.
    pub fn converge(
        &self,
        array: &mut PrehashArray,
        stats: &mut PrehashStats,
    ) -> Result<(), PrehashError> {
        let max_rounds = self.params.max_rounds();
        let mut remaining = array.compact();
        let mut rounds = 0u32;
        while remaining > 0 {
            if rounds >= max_rounds {
                stats.rounds = rounds;
                warn!(rounds, remaining, "prehash update did not converge");
                return Err(PrehashError::ConvergenceExceeded {
                    rounds,
                    remaining,
                    partial: None,
                });
            }
            let start = Instant::now();
            stats.round_sizes.push(remaining);
            self.update(array);
            remaining = array.compact();
            rounds += 1;
            stats.round_durations.push(start.elapsed());
            debug!(phase = "update", round = rounds, remaining, "prehash round complete");
        }
        stats.rounds = rounds;
        Ok(())
    }

    fn drive(
        &self,
        input: &PackedInput<'_>,
        variant: FinalVariant,
        mut array: PrehashArray,
        mut stats: PrehashStats,
        total_start: Instant,
    ) -> Result<PrehashRun, PrehashError> {
        if let Err(err) = self.converge(&mut array, &mut stats) {
            return Err(match err {
                PrehashError::ConvergenceExceeded { rounds, remaining, .. } => {
                    stats.total_duration = total_start.elapsed();
                    PrehashError::ConvergenceExceeded {
                        rounds,
                        remaining,
                        partial: Some(Box::new(PrehashRun { array, stats })),
                    }
                }
                other => other,
            });
        }
        let final_start = Instant::now();
        self.finalize(input, &mut array, variant)?;
        stats.final_duration = final_start.elapsed();
        stats.total_duration = total_start.elapsed();
        info!(
            n = array.n(),
            rounds = stats.rounds,
            variant = ?variant,
            total_ms = stats.total_duration.as_secs_f64() * 1_000.0,
            "prehash complete"
        );
        Ok(PrehashRun { array, stats })
    }

    /// Full driver: Init, Update to a fixed point, then Final.
    ///
    /// When the round bound is hit the error carries the unfinalised array,
    /// with its compacted invalid list, and the statistics so far.
    pub fn prehash(
        &self,
        input: &PackedInput<'_>,
        variant: FinalVariant,
    ) -> Result<PrehashRun, PrehashError> {
        let total_start = Instant::now();
        let array = self.init(input)?;
        let stats = PrehashStats {
            init_duration: total_start.elapsed(),
            ..PrehashStats::default()
        };
        self.drive(input, variant, array, stats, total_start)
    }

    /// Full driver starting from saved contexts instead of Init.
    pub fn prehash_from_contexts(
        &self,
        uctx: &UnfinalizedContexts<E::Context>,
        input: &PackedInput<'_>,
        variant: FinalVariant,
    ) -> Result<PrehashRun, PrehashError> {
        let total_start = Instant::now();
        let array = self.init_from_contexts(uctx, input)?;
        let stats = PrehashStats {
            init_duration: total_start.elapsed(),
            ..PrehashStats::default()
        };
        self.drive(input, variant, array, stats, total_start)
    }
}
