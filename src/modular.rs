//! Arithmetic modulo the group order.
//!
//! Values are 256-bit [`ruint`] integers read big-endian from digests.  The
//! [`GroupOrder`] type stores the prime modulus `Q` together with the
//! rejection-sampling threshold `k·Q` and exposes comparison, reduction and
//! multiplication.  All results lie in `[0, Q)`; multiplication reduces the
//! full 512-bit product.
//!
//! The default order is the Curve25519 subgroup order, for which `15·Q` is
//! the widest multiple below `2^256`.  Orders just under `2^256`, such as the
//! secp256k1 group order, admit only `k = 1`: configure them with
//! [`ThresholdPolicy::Widest`] (`"threshold": "widest"`), since the default
//! multiplier of 15 overflows.

use ruint::Uint;
use serde::{Deserialize, Serialize};

use crate::engine::Digest256;
use crate::error::PrehashError;

/// A 256-bit unsigned integer.
pub type U256 = Uint<256, 4>;

/// Order of the prime subgroup of Curve25519, `2^252 + 27742317777372353535851937790883648493`.
pub const CURVE25519_ORDER: U256 = U256::from_limbs([
    0x5812_631a_5cf5_d3ed,
    0x14de_f9de_a2f7_9cd6,
    0x0000_0000_0000_0000,
    0x1000_0000_0000_0000,
]);

/// `15 · CURVE25519_ORDER`, the widest multiple of the order below `2^256`.
const CURVE25519_THRESHOLD: U256 = U256::from_limbs([
    0x2913_ce8b_7267_6ae3,
    0x3910_a40b_8c82_308f,
    0x0000_0000_0000_0001,
    0xf000_0000_0000_0000,
]);

/// Multiplier applied to `Q` by the protocol's acceptance threshold.
pub const DEFAULT_THRESHOLD_MULTIPLIER: u64 = 15;

/// How the acceptance threshold is derived from `Q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// Threshold is `k · Q` for a fixed `k`.
    Multiplier(u64),
    /// Threshold is the largest multiple of `Q` that fits in 256 bits.
    Widest,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        ThresholdPolicy::Multiplier(DEFAULT_THRESHOLD_MULTIPLIER)
    }
}

/// Returns `true` if `a < b`.
#[inline]
pub fn less_than(a: &U256, b: &U256) -> bool {
    a < b
}

/// Interprets a digest as a big-endian integer.
#[inline]
pub fn from_digest(digest: Digest256) -> U256 {
    U256::from_be_bytes(digest)
}

/// Big-endian bytes of `value`.
#[inline]
pub fn to_digest(value: &U256) -> Digest256 {
    value.to_be_bytes::<32>()
}

/// Lowercase, zero-padded, 64-character hex encoding.
pub fn to_hex(value: &U256) -> String {
    hex::encode(to_digest(value))
}

/// Parses a hexadecimal string, with or without a `0x` prefix.
pub fn parse_hex(input: &str) -> Result<U256, PrehashError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
        .trim_start_matches('0');
    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    let bytes = hex::decode(&padded)?;
    U256::try_from_be_slice(&bytes).ok_or_else(|| {
        PrehashError::Configuration(format!("hex value wider than 256 bits: {input}"))
    })
}

/// A prime group order with its rejection-sampling threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupOrder {
    q: U256,
    multiplier: U256,
    threshold: U256,
}

impl GroupOrder {
    /// Creates a group order from `q` and a threshold policy.
    ///
    /// `q` must be odd and at least 3; primality is not checked.  The
    /// threshold `k · q` must fit in 256 bits.
    pub fn new(q: U256, policy: ThresholdPolicy) -> Result<Self, PrehashError> {
        if q < U256::from(3u64) || !q.bit(0) {
            return Err(PrehashError::Configuration(format!(
                "group order must be an odd prime >= 3, got {}",
                to_hex(&q)
            )));
        }
        let multiplier = match policy {
            ThresholdPolicy::Multiplier(0) => {
                return Err(PrehashError::Configuration(
                    "threshold multiplier must be non-zero".into(),
                ))
            }
            ThresholdPolicy::Multiplier(k) => U256::from(k),
            // q is odd, so it never divides 2^256 and floor((2^256 - 1) / q)
            // equals floor(2^256 / q).
            ThresholdPolicy::Widest => U256::MAX / q,
        };
        let threshold = q.checked_mul(multiplier).ok_or_else(|| {
            PrehashError::Configuration(format!(
                "threshold {multiplier} * 0x{} does not fit in 256 bits; use the widest policy",
                to_hex(&q)
            ))
        })?;
        Ok(GroupOrder {
            q,
            multiplier,
            threshold,
        })
    }

    /// The Curve25519 subgroup order with the protocol threshold `15 · Q`.
    pub fn curve25519() -> Self {
        GroupOrder {
            q: CURVE25519_ORDER,
            multiplier: U256::from(DEFAULT_THRESHOLD_MULTIPLIER),
            threshold: CURVE25519_THRESHOLD,
        }
    }

    /// Returns the modulus `Q`.
    #[inline]
    pub fn modulus(&self) -> &U256 {
        &self.q
    }

    /// Returns the acceptance threshold `k · Q`.
    #[inline]
    pub fn threshold(&self) -> &U256 {
        &self.threshold
    }

    /// Returns the multiplier `k`.
    #[inline]
    pub fn multiplier(&self) -> &U256 {
        &self.multiplier
    }

    /// Validity predicate: `a < k · Q`.
    #[inline]
    pub fn is_accepted(&self, a: &U256) -> bool {
        less_than(a, &self.threshold)
    }

    /// Reduces `a` modulo `Q`.
    #[inline]
    pub fn reduce_mod(&self, a: &U256) -> U256 {
        a.reduce_mod(self.q)
    }

    /// Computes `a · b mod Q` through the full 512-bit product.
    #[inline]
    pub fn mul_mod(&self, a: &U256, b: &U256) -> U256 {
        a.mul_mod(*b, self.q)
    }
}

impl Default for GroupOrder {
    fn default() -> Self {
        Self::curve25519()
    }
}
