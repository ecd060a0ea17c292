// Regulator - Register Dump Decoder
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{ByteSource, MemoryError};
use crate::interval::Interval;

/// A relative window into a [`ByteStore`](super::ByteStore) or another view.
///
/// Index 0 of the view is `start` in the parent's frame. Views never own
/// data; nesting them builds a chain of translations that
/// [`ByteSource::map`] walks back to an absolute address.
pub struct MemoryView<'a> {
    parent: &'a dyn ByteSource,
    start: u64,
    stop: u64,
}

impl<'a> MemoryView<'a> {
    /// Clips `loc` (in the parent's frame) to what the parent actually holds.
    pub fn new(parent: &'a dyn ByteSource, loc: Interval) -> Result<Self, MemoryError> {
        let available = parent.extent();
        let overlap = available
            .and_then(|extent| extent.intersect(&loc))
            .ok_or(MemoryError::NoOverlap {
                requested: loc,
                available,
            })?;
        Ok(Self {
            parent,
            start: overlap.start(),
            stop: overlap.stop(),
        })
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.stop - self.start
    }

    /// The window in the parent's frame.
    pub fn outer_loc(&self) -> Interval {
        Interval::from_raw(self.start, self.stop)
    }

    /// The window in its own frame, `[0, len)`.
    pub fn inner_loc(&self) -> Interval {
        Interval::from_raw(0, self.len())
    }

    /// The window in absolute addresses.
    pub fn mapped_loc(&self) -> Interval {
        Interval::from_raw(self.map(0), self.map(0) + self.len())
    }

    /// Reads one word in display order (most significant byte first).
    pub fn get_word(&self, addr: u64) -> Result<Vec<u8>, MemoryError> {
        let word_size = self.word_size();
        if word_size == 0 || addr % word_size != 0 {
            return Err(MemoryError::Unaligned { addr, word_size });
        }
        let mut indices: Vec<u64> = (addr..addr + word_size).collect();
        if self.swapped() {
            indices.reverse();
        }
        indices.into_iter().map(|i| self.byte(i)).collect()
    }

    /// [`MemoryView::get_word`] as a string of `0`/`1`, MSB first.
    pub fn get_word_bits(&self, addr: u64) -> Result<String, MemoryError> {
        Ok(self
            .get_word(addr)?
            .iter()
            .map(|b| format!("{:08b}", b))
            .collect())
    }

    /// Hex listing of the window.
    ///
    /// Lines cover 16 bytes from a 16-aligned address; bytes of a line
    /// outside the window render as `--`.
    pub fn dump(&self) -> Result<String, MemoryError> {
        let offset = self.map(0);
        let loc = self.mapped_loc();
        let word_size = self.word_size().max(1);
        let mut lines = Vec::new();
        for line_loc in loc.range(16, true) {
            let mut words = Vec::new();
            for word_loc in line_loc.range(word_size, false) {
                let mut bytes: Vec<Interval> = word_loc.range(1, false).collect();
                if self.swapped() {
                    bytes.reverse();
                }
                let mut word = String::new();
                for byte_loc in bytes {
                    if loc.contains(byte_loc.start()) {
                        word.push_str(&format!("{:02x}", self.byte(byte_loc.start() - offset)?));
                    } else {
                        word.push_str("--");
                    }
                }
                words.push(word);
            }
            lines.push(format!("{:08x}: {}", line_loc.start(), words.join(" ")));
        }
        Ok(lines.join("\n"))
    }

    /// Shows where `field_bits` (LSB-first, within the word) sits in the word.
    ///
    /// Bytes that carry no bit of the field are blanked and bits outside the
    /// field are printed as `.`.
    pub fn dump_bits(&self, field_bits: Interval) -> Result<String, MemoryError> {
        let word_size = self.word_size();
        if self.len() != word_size {
            return Err(MemoryError::NotAWord {
                len: self.len(),
                word_size,
            });
        }
        let width = word_size * 8;
        // MSB-first, matching the order of get_word_bits
        let bit_loc = field_bits.reverse(width)?;

        let byte_mask = if self.swapped() {
            bit_loc.scale_down(8).reverse(word_size)?
        } else {
            bit_loc.scale_down(8)
        };
        let mut indices: Vec<u64> = (0..word_size).collect();
        if self.swapped() {
            indices.reverse();
        }

        let mut line = format!("{:08x}: ", self.map(0));
        for index in indices {
            if byte_mask.contains(index) {
                line.push_str(&format!("{:02x}", self.byte(index)?));
            } else {
                line.push_str("  ");
            }
        }
        line.push_str(" = ");

        let bits: Vec<char> = self
            .get_word_bits(0)?
            .chars()
            .enumerate()
            .map(|(i, bit)| if bit_loc.contains(i as u64) { bit } else { '.' })
            .collect();
        let groups: Vec<String> = bits.chunks(4).map(|g| g.iter().collect()).collect();
        line.push_str(&groups.join("_"));
        Ok(line)
    }
}

impl ByteSource for MemoryView<'_> {
    fn extent(&self) -> Option<Interval> {
        Some(self.inner_loc())
    }

    fn byte(&self, index: u64) -> Result<u8, MemoryError> {
        if index >= self.len() {
            return Err(MemoryError::Range(Interval::unit(self.map(0) + index)));
        }
        self.parent.byte(self.start + index)
    }

    fn map(&self, index: u64) -> u64 {
        self.parent.map(self.start + index)
    }

    fn word_size(&self) -> u64 {
        self.parent.word_size()
    }

    fn swapped(&self) -> bool {
        self.parent.swapped()
    }
}

impl std::fmt::Debug for MemoryView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MemoryView({:x})", self.mapped_loc())
    }
}
