// Regulator - Register Dump Decoder
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::interval::{Interval, IntervalError};
use std::fmt;

mod view;

pub use view::MemoryView;

/// Largest offset from `base` a single store may hold.
pub const MAX_SPAN: u64 = 1024 * 1024;

const ACCESS_WIDTHS: [u64; 4] = [1, 2, 4, 8];

fn describe_extent(extent: &Option<Interval>) -> String {
    match extent {
        Some(extent) => format!("{:x}", extent),
        None => "nothing".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    #[error("{requested:x} does not overlap the populated data ({})", describe_extent(.available))]
    NoOverlap {
        requested: Interval,
        available: Option<Interval>,
    },
    #[error("access to {0:x} is out of range")]
    Range(Interval),
    /// Range error for a slice length that is not a supported access width.
    #[error("unsupported access width of {0} bytes")]
    Width(u64),
    #[error("address {addr:#x} is not aligned to the {word_size}-byte word size")]
    Unaligned { addr: u64, word_size: u64 },
    #[error("view of {len} bytes is not a single {word_size}-byte word")]
    NotAWord { len: u64, word_size: u64 },
    #[error("invalid hex data '{0}'")]
    Hex(String),
    #[error("{data} bytes of data do not fit {range:x}")]
    LengthMismatch { range: Interval, data: u64 },
    #[error(transparent)]
    Interval(#[from] IntervalError),
}

/// Anything a [`MemoryView`] can be laid over: a [`ByteStore`] or another view.
pub trait ByteSource {
    /// Indices accepted by [`ByteSource::byte`], `None` if there are none.
    fn extent(&self) -> Option<Interval>;

    /// The byte exactly as stored (no word swapping).
    fn byte(&self, index: u64) -> Result<u8, MemoryError>;

    /// Absolute address of `index`.
    fn map(&self, index: u64) -> u64;

    fn word_size(&self) -> u64;

    /// Whether words are stored little-endian.
    fn swapped(&self) -> bool;
}

/// Bytes captured from one dump fragment.
///
/// Indices are absolute addresses; byte 0 of the backing buffer lives at
/// `base`. Hex text is written and read in its natural left-to-right order
/// and reversed on the way in and out when the store is `swapped`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteStore {
    base: u64,
    data: Vec<u8>,
    word_size: u64,
    swapped: bool,
}

impl ByteStore {
    pub fn new(base: u64) -> Self {
        Self {
            base,
            data: Vec::new(),
            word_size: 1,
            swapped: true,
        }
    }

    pub fn with_word_size(mut self, word_size: u64) -> Self {
        self.word_size = word_size;
        self
    }

    pub fn with_swapped(mut self, swapped: bool) -> Self {
        self.swapped = swapped;
        self
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Converts an absolute range into buffer offsets.
    fn relative(&self, range: Interval) -> Result<Interval, MemoryError> {
        let rel = range.rebase(self.base).map_err(|_| MemoryError::Range(range))?;
        if rel.stop() > MAX_SPAN {
            return Err(MemoryError::Range(range));
        }
        Ok(rel)
    }

    fn grow(&mut self, size: u64) {
        let size = size as usize;
        if self.data.len() < size {
            self.data.resize(size, 0);
        }
    }

    pub fn write_hex(&mut self, range: Interval, hex: &str) -> Result<(), MemoryError> {
        let rel = self.relative(range)?;
        let mut value = decode_hex(hex)?;
        if value.len() as u64 != range.len() {
            return Err(MemoryError::LengthMismatch {
                range,
                data: value.len() as u64,
            });
        }
        if !ACCESS_WIDTHS.contains(&range.len()) {
            return Err(MemoryError::Width(range.len()));
        }
        if self.swapped {
            value.reverse();
        }
        self.grow(rel.stop());
        self.data[rel.start() as usize..rel.stop() as usize].copy_from_slice(&value);
        Ok(())
    }

    pub fn write_byte(&mut self, addr: u64, value: u8) -> Result<(), MemoryError> {
        let rel = self.relative(Interval::unit(addr))?;
        self.grow(rel.stop());
        self.data[rel.start() as usize] = value;
        Ok(())
    }

    pub fn read_hex(&self, range: Interval) -> Result<String, MemoryError> {
        let rel = self.relative(range)?;
        if !ACCESS_WIDTHS.contains(&range.len()) {
            return Err(MemoryError::Width(range.len()));
        }
        let mut bytes = self
            .data
            .get(rel.start() as usize..rel.stop() as usize)
            .ok_or(MemoryError::Range(range))?
            .to_vec();
        if self.swapped {
            bytes.reverse();
        }
        Ok(encode_hex(&bytes))
    }
}

impl ByteSource for ByteStore {
    fn extent(&self) -> Option<Interval> {
        Interval::with_len(self.base, self.data.len() as u64).ok()
    }

    fn byte(&self, index: u64) -> Result<u8, MemoryError> {
        let rel = self.relative(Interval::unit(index))?;
        self.data
            .get(rel.start() as usize)
            .copied()
            .ok_or(MemoryError::Range(Interval::unit(index)))
    }

    fn map(&self, index: u64) -> u64 {
        index
    }

    fn word_size(&self) -> u64 {
        self.word_size
    }

    fn swapped(&self) -> bool {
        self.swapped
    }
}

impl fmt::Display for ByteStore {
    /// One line per 16 bytes, `word_size` bytes per word.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word_size = self.word_size.max(1) as usize;
        for (n, line) in self.data.chunks(16).enumerate() {
            if n > 0 {
                writeln!(f)?;
            }
            write!(f, "{:08x}:", self.base + (n as u64) * 16)?;
            for word in line.chunks(word_size) {
                let mut word = word.to_vec();
                if self.swapped {
                    word.reverse();
                }
                write!(f, " {}", encode_hex(&word))?;
            }
        }
        Ok(())
    }
}

fn decode_hex(hex: &str) -> Result<Vec<u8>, MemoryError> {
    let invalid = || MemoryError::Hex(hex.to_string());
    if !hex.is_ascii() || hex.len() % 2 != 0 {
        return Err(invalid());
    }
    hex.as_bytes()
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|digits| u8::from_str_radix(digits, 16).ok())
                .ok_or_else(invalid)
        })
        .collect()
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(start: u64, stop: u64) -> Interval {
        Interval::new(start, stop).unwrap()
    }

    #[test]
    fn test_store_write_read() {
        let mut ms = ByteStore::new(0);
        assert_eq!(ms.len(), 0);
        ms.write_hex(iv(0, 4), "00112233").unwrap();
        assert_eq!(ms.len(), 4);
        ms.write_hex(iv(4, 8), "44556677").unwrap();
        assert_eq!(ms.byte(0).unwrap(), 0x33);

        ms.write_byte(0x10, 0xff).unwrap();
        assert_eq!(ms.byte(0x0f).unwrap(), 0x00);
        assert_eq!(ms.byte(0x10).unwrap(), 0xff);

        assert_eq!(ms.read_hex(iv(0, 4)).unwrap(), "00112233");
    }

    #[test]
    fn test_store_base() {
        let mut ms = ByteStore::new(0x1000);
        ms.write_hex(iv(0x1000, 0x1002), "ffff").unwrap();
        assert_eq!(ms.len(), 2);
        assert_eq!(ms.byte(0x1000).unwrap(), 0xff);
        assert_eq!(ms.to_string(), "00001000: ff ff");
        assert_eq!(ms.extent(), Some(iv(0x1000, 0x1002)));
    }

    #[test]
    fn test_store_unswapped() {
        let mut ms = ByteStore::new(0).with_swapped(false);
        ms.write_hex(iv(0, 4), "deadbeef").unwrap();
        assert_eq!(ms.byte(0).unwrap(), 0xde);
        assert_eq!(ms.read_hex(iv(0, 4)).unwrap(), "deadbeef");
    }

    #[test]
    fn test_store_display_lines() {
        let mut ms = ByteStore::new(0xf1022100).with_word_size(4);
        for (n, word) in ["00000000", "00000011", "00000001", "03330007", "00000400"]
            .iter()
            .enumerate()
        {
            let addr = 0xf1022100 + 4 * n as u64;
            ms.write_hex(iv(addr, addr + 4), word).unwrap();
        }
        assert_eq!(
            ms.to_string(),
            "f1022100: 00000000 00000011 00000001 03330007\nf1022110: 00000400"
        );
    }

    #[test]
    fn test_store_errors() {
        let mut ms = ByteStore::new(0x1000);
        assert_eq!(
            ms.write_hex(iv(0x1000, 0x1003), "aabbcc"),
            Err(MemoryError::Width(3))
        );
        assert!(matches!(
            ms.write_hex(iv(0x1000, 0x1004), "aabb"),
            Err(MemoryError::LengthMismatch { .. })
        ));
        assert!(matches!(
            ms.write_hex(iv(0x1000, 0x1002), "zzzz"),
            Err(MemoryError::Hex(_))
        ));
        assert_eq!(
            ms.write_byte(0xfff, 1),
            Err(MemoryError::Range(Interval::unit(0xfff)))
        );
        assert!(ms.write_byte(0x1000 + MAX_SPAN, 1).is_err());
        assert!(ms.byte(0x1000).is_err());
        assert!(ms.extent().is_none());
    }
}
