//! Process-wide prehash configuration.
//!
//! [`PrehashConfig`] is the serialisable form loaded once at startup (JSON,
//! every field optional).  [`PrehashConfig::validate`] turns it into
//! [`PrehashParams`], the immutable constants shared by every phase.

use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::buffer::BufferLayout;
use crate::error::PrehashError;
use crate::modular::{self, GroupOrder, ThresholdPolicy, CURVE25519_ORDER};

/// Default array size, `2^26`.
pub const DEFAULT_N: u32 = 1 << 26;
/// Default bound on Update rounds.
pub const DEFAULT_MAX_ROUNDS: u32 = 64;
/// Default number of counter words in the message-format constant.
pub const DEFAULT_MESSAGE_WORDS: usize = 1024;

const ENV_N: &str = "PREHASH_N";
const ENV_MAX_ROUNDS: &str = "PREHASH_MAX_ROUNDS";

/// Source of the message-format constant `M`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSpec {
    /// Big-endian `u64` encodings of `0..words`, concatenated.
    Counter {
        /// Number of counter words.
        words: usize,
    },
    /// Explicit bytes, hex encoded.
    Hex(String),
}

impl Default for MessageSpec {
    fn default() -> Self {
        MessageSpec::Counter {
            words: DEFAULT_MESSAGE_WORDS,
        }
    }
}

impl MessageSpec {
    /// Materialises the constant.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PrehashError> {
        match self {
            MessageSpec::Counter { words } => Ok(counter_message(*words)),
            MessageSpec::Hex(encoded) => Ok(hex::decode(encoded.trim())?),
        }
    }
}

/// Concatenated big-endian encodings of `0..words` as `u64`.
pub fn counter_message(words: usize) -> Vec<u8> {
    (0..words as u64).flat_map(u64::to_be_bytes).collect()
}

/// Serialisable prehash configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrehashConfig {
    /// Number of array elements `N`.
    pub n: u32,
    /// Group order `Q` as hex.
    pub group_order: String,
    /// Acceptance threshold policy.
    pub threshold: ThresholdPolicy,
    /// Maximum Update rounds before the driver gives up.
    pub max_rounds: u32,
    /// Message-format constant `M`.
    pub message: MessageSpec,
    /// Packed input field widths.
    pub layout: BufferLayout,
}

impl Default for PrehashConfig {
    fn default() -> Self {
        PrehashConfig {
            n: DEFAULT_N,
            group_order: modular::to_hex(&CURVE25519_ORDER),
            threshold: ThresholdPolicy::default(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            message: MessageSpec::default(),
            layout: BufferLayout::default(),
        }
    }
}

impl PrehashConfig {
    /// Parses a JSON document; absent fields take their defaults.
    pub fn from_json_str(input: &str) -> Result<Self, PrehashError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Reads and parses a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PrehashError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialises to pretty JSON.
    pub fn to_json_string(&self) -> Result<String, PrehashError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Applies `PREHASH_N` and `PREHASH_MAX_ROUNDS` from the environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), PrehashError> {
        if let Ok(value) = env::var(ENV_N) {
            self.n = value
                .trim()
                .parse()
                .map_err(|_| PrehashError::Configuration(format!("invalid {ENV_N}: {value}")))?;
        }
        if let Ok(value) = env::var(ENV_MAX_ROUNDS) {
            self.max_rounds = value.trim().parse().map_err(|_| {
                PrehashError::Configuration(format!("invalid {ENV_MAX_ROUNDS}: {value}"))
            })?;
        }
        Ok(())
    }

    /// Validates the configuration and resolves it into runtime parameters.
    pub fn validate(&self) -> Result<PrehashParams, PrehashError> {
        let q = modular::parse_hex(&self.group_order)?;
        let order = GroupOrder::new(q, self.threshold)?;
        let message = self.message.to_bytes()?;
        PrehashParams::new(
            self.n as usize,
            order,
            self.max_rounds,
            message,
            self.layout,
        )
    }
}

/// Validated, immutable prehash constants.
#[derive(Debug, Clone)]
pub struct PrehashParams {
    n: usize,
    order: GroupOrder,
    max_rounds: u32,
    message: Arc<[u8]>,
    layout: BufferLayout,
}

impl PrehashParams {
    /// Builds parameters directly, applying the same checks as
    /// [`PrehashConfig::validate`].
    pub fn new(
        n: usize,
        order: GroupOrder,
        max_rounds: u32,
        message: impl Into<Vec<u8>>,
        layout: BufferLayout,
    ) -> Result<Self, PrehashError> {
        // Invalid-list entries store `j + 1` as a `u32`.
        if n == 0 || n >= u32::MAX as usize {
            return Err(PrehashError::Configuration(format!(
                "N must be in 1..{}, got {n}",
                u32::MAX
            )));
        }
        if max_rounds == 0 {
            return Err(PrehashError::Configuration(
                "max_rounds must be non-zero".into(),
            ));
        }
        layout.validate()?;
        let message: Vec<u8> = message.into();
        Ok(PrehashParams {
            n,
            order,
            max_rounds,
            message: Arc::from(message),
            layout,
        })
    }

    /// Array size `N`.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Group order and threshold.
    pub fn order(&self) -> &GroupOrder {
        &self.order
    }

    /// Update round bound.
    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Message-format constant `M`.
    pub fn message(&self) -> &[u8] {
        &self.message
    }

    /// Packed input layout.
    pub fn layout(&self) -> &BufferLayout {
        &self.layout
    }
}

impl Default for PrehashParams {
    fn default() -> Self {
        PrehashParams {
            n: DEFAULT_N as usize,
            order: GroupOrder::curve25519(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            message: Arc::from(counter_message(DEFAULT_MESSAGE_WORDS)),
            layout: BufferLayout::default(),
        }
    }
}
