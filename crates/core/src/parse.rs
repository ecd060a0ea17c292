// Regulator - Register Dump Decoder
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Reader for hex dumps as printed by `memtool md` and similar tools.
//!
//! ```text
//! mapping offset 0x02600000 (size 0x200000)
//! 00030000: 04008b00 01df02ef 01df02ef 00000000 ................
//! ```
//!
//! Each hex line becomes one [`ByteStore`]. A `mapping offset` line shifts
//! the addresses of every hex line after it.

use crate::interval::Interval;
use crate::memory::ByteStore;
use regex::Regex;
use std::sync::LazyLock;

static MAP_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^mapping offset (\S+) \(size (\S+)\)$").expect("mapping pattern is valid")
});

/// Width of the ASCII column closing every hex line.
const ASCII_COLUMN: usize = 16;

fn parse_hex(text: &str) -> Option<u64> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(digits, 16).ok()
}

/// Strips the trailing ASCII column, `None` if the line is too short.
fn drop_ascii_column(data: &str) -> Option<&str> {
    let (cut, _) = data.char_indices().rev().nth(ASCII_COLUMN - 1)?;
    Some(&data[..cut])
}

#[derive(Debug, Clone, Default)]
pub struct DumpParser {
    map_base: u64,
}

impl DumpParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset added to every hex line address.
    pub fn map_base(&self) -> u64 {
        self.map_base
    }

    /// Picks up a `mapping offset <hex> (size <hex>)` line.
    ///
    /// Returns whether the line was such a directive.
    pub fn parse_map(&mut self, line: &str) -> bool {
        let Some(caps) = MAP_MESSAGE.captures(line.trim()) else {
            return false;
        };
        match parse_hex(&caps[1]) {
            Some(base) => {
                self.map_base = base;
                tracing::debug!("Parser base set to {:#x}", base);
                true
            }
            None => {
                tracing::debug!("Ignoring mapping with bad offset: {}", line.trim());
                false
            }
        }
    }

    /// Parses `<hexaddr>: <word> <word> ... <16-char ascii>`.
    ///
    /// The word size is taken from the first word. Anything malformed
    /// yields `None`.
    pub fn parse_hex_line(&self, line: &str) -> Option<ByteStore> {
        let line = line.trim();
        let (addr, data) = line.split_once(':')?;
        let addr = match parse_hex(addr.trim()).and_then(|a| a.checked_add(self.map_base)) {
            Some(addr) => addr,
            None => {
                tracing::debug!("Skipping line with bad address: {}", line);
                return None;
            }
        };
        let words: Vec<&str> = drop_ascii_column(data)?.split_whitespace().collect();
        let first = *words.first()?;
        if first.len() % 2 != 0 {
            tracing::debug!("Skipping line with odd word width: {}", line);
            return None;
        }
        let word_size = (first.len() / 2) as u64;

        let mut store = ByteStore::new(addr).with_word_size(word_size);
        let mut at = addr;
        for word in words {
            if word.len() != first.len() {
                tracing::debug!("Skipping line with mixed word widths: {}", line);
                return None;
            }
            let written = Interval::with_len(at, word_size)
                .map_err(Into::into)
                .and_then(|range| store.write_hex(range, word));
            if let Err(e) = written {
                tracing::debug!("Skipping line: {} ({})", line, e);
                return None;
            }
            at += word_size;
        }
        Some(store)
    }

    /// Parses every line of `text`.
    pub fn parse(&mut self, text: &str) -> Vec<ByteStore> {
        self.parse_lines(text.split('\n'))
    }

    /// Parses a capture whose first and last line are likely cut off, as
    /// with a mouse selection. Fewer than three lines yield nothing.
    pub fn parse_dirty(&mut self, text: &str) -> Vec<ByteStore> {
        let lines: Vec<&str> = text.split('\n').collect();
        if lines.len() < 3 {
            return Vec::new();
        }
        self.parse_lines(lines[1..lines.len() - 1].iter().copied())
    }

    fn parse_lines<'t>(&mut self, lines: impl Iterator<Item = &'t str>) -> Vec<ByteStore> {
        let mut stores = Vec::new();
        for line in lines {
            if self.parse_map(line) {
                continue;
            }
            if let Some(store) = self.parse_hex_line(line) {
                stores.push(store);
            }
        }
        stores
    }
}
