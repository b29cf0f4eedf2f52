//! Packed input buffer: `pk || mes || w || padding || x || sk`.
//!
//! Field order and presence are fixed; widths come from a [`BufferLayout`].
//! The buffer is owned by the caller and only ever read here.

use serde::{Deserialize, Serialize};

use crate::error::PrehashError;
use crate::modular::U256;

/// Byte widths of the packed input fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferLayout {
    /// Public key width.
    pub pk: usize,
    /// Message width.
    pub mes: usize,
    /// Per-attempt weight/nonce width.
    pub w: usize,
    /// Alignment padding width (may be zero).
    pub padding: usize,
    /// Secret scalar width, at most 32.
    pub x: usize,
    /// Secret key width.
    pub sk: usize,
}

impl Default for BufferLayout {
    fn default() -> Self {
        // Compressed curve points are 33 bytes; padding aligns `x` to 4 bytes.
        BufferLayout {
            pk: 33,
            mes: 32,
            w: 33,
            padding: 2,
            x: 32,
            sk: 32,
        }
    }
}

impl BufferLayout {
    /// Total byte length of a packed buffer.
    pub fn total_len(&self) -> usize {
        self.pk + self.mes + self.w + self.padding + self.x + self.sk
    }

    /// Checks that every data-carrying field is non-empty and `x` fits in 256 bits.
    pub fn validate(&self) -> Result<(), PrehashError> {
        for (name, width) in [
            ("pk", self.pk),
            ("mes", self.mes),
            ("w", self.w),
            ("x", self.x),
            ("sk", self.sk),
        ] {
            if width == 0 {
                return Err(PrehashError::Configuration(format!(
                    "buffer field {name} has zero width"
                )));
            }
        }
        if self.x > 32 {
            return Err(PrehashError::Configuration(format!(
                "secret scalar width {} exceeds 32 bytes",
                self.x
            )));
        }
        Ok(())
    }

    fn mes_offset(&self) -> usize {
        self.pk
    }

    fn w_offset(&self) -> usize {
        self.mes_offset() + self.mes
    }

    fn x_offset(&self) -> usize {
        self.w_offset() + self.w + self.padding
    }

    fn sk_offset(&self) -> usize {
        self.x_offset() + self.x
    }
}

/// Borrowed view over a packed input buffer.
#[derive(Debug, Clone, Copy)]
pub struct PackedInput<'a> {
    bytes: &'a [u8],
    layout: BufferLayout,
}

impl<'a> PackedInput<'a> {
    /// Wraps `bytes`, which must be exactly `layout.total_len()` long.
    pub fn new(bytes: &'a [u8], layout: BufferLayout) -> Result<Self, PrehashError> {
        layout.validate()?;
        if bytes.len() != layout.total_len() {
            return Err(PrehashError::BufferLength {
                expected: layout.total_len(),
                actual: bytes.len(),
            });
        }
        Ok(PackedInput { bytes, layout })
    }

    /// The layout this view was built with.
    pub fn layout(&self) -> &BufferLayout {
        &self.layout
    }

    /// Raw buffer bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Public key field.
    pub fn pk(&self) -> &'a [u8] {
        &self.bytes[..self.layout.pk]
    }

    /// Message field.
    pub fn mes(&self) -> &'a [u8] {
        let start = self.layout.mes_offset();
        &self.bytes[start..start + self.layout.mes]
    }

    /// Weight/nonce field.
    pub fn w(&self) -> &'a [u8] {
        let start = self.layout.w_offset();
        &self.bytes[start..start + self.layout.w]
    }

    /// Raw secret scalar bytes.
    pub fn x_bytes(&self) -> &'a [u8] {
        let start = self.layout.x_offset();
        &self.bytes[start..start + self.layout.x]
    }

    /// Secret scalar as a big-endian integer.
    pub fn x(&self) -> U256 {
        // Width is validated to be at most 32 bytes in `new`.
        U256::try_from_be_slice(self.x_bytes()).unwrap_or_default()
    }

    /// Secret key field; not read by any prehash phase.
    pub fn sk(&self) -> &'a [u8] {
        let start = self.layout.sk_offset();
        &self.bytes[start..start + self.layout.sk]
    }
}

/// Assembles a packed buffer from its fields, zero-filling the padding.
pub fn pack_input(
    layout: &BufferLayout,
    pk: &[u8],
    mes: &[u8],
    w: &[u8],
    x: &[u8],
    sk: &[u8],
) -> Result<Vec<u8>, PrehashError> {
    layout.validate()?;
    for (name, expected, actual) in [
        ("pk", layout.pk, pk.len()),
        ("mes", layout.mes, mes.len()),
        ("w", layout.w, w.len()),
        ("x", layout.x, x.len()),
        ("sk", layout.sk, sk.len()),
    ] {
        if expected != actual {
            return Err(PrehashError::Configuration(format!(
                "field {name} is {actual} bytes, layout expects {expected}"
            )));
        }
    }
    let mut out = Vec::with_capacity(layout.total_len());
    out.extend_from_slice(pk);
    out.extend_from_slice(mes);
    out.extend_from_slice(w);
    out.resize(out.len() + layout.padding, 0);
    out.extend_from_slice(x);
    out.extend_from_slice(sk);
    Ok(out)
}
