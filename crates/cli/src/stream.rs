// Regulator - Register Dump Decoder
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::{decode_capture, EXIT_PASS, EXIT_RUNTIME_ERROR};
use regulator_core::{Decoder, DumpParser};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::SystemTime;
use tracing::{error, info, warn};

/// Splits a line stream into blank-line separated blocks.
pub struct Blocks<R> {
    lines: io::Lines<R>,
}

impl<R: BufRead> Blocks<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl<R: BufRead> Iterator for Blocks<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut block: Vec<String> = Vec::new();
        loop {
            match self.lines.next() {
                Some(Ok(line)) if line.trim().is_empty() => {
                    if !block.is_empty() {
                        return Some(Ok(block.join("\n")));
                    }
                }
                Some(Ok(line)) => block.push(line),
                Some(Err(e)) => return Some(Err(e)),
                None if block.is_empty() => return None,
                None => return Some(Ok(block.join("\n"))),
            }
        }
    }
}

/// Tracks the schema file's modification time.
pub struct SchemaWatch {
    path: PathBuf,
    modified: Option<SystemTime>,
}

impl SchemaWatch {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            modified: modified_at(path),
        }
    }

    /// True once per change of the file's modification time.
    pub fn changed(&mut self) -> bool {
        let now = modified_at(&self.path);
        if now != self.modified {
            self.modified = now;
            return true;
        }
        false
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Decodes each block from stdin, as a dirty capture when `dirty` is set.
///
/// The parser persists across blocks, so a `mapping offset` line applies
/// to every later block.
pub fn run_stream(decoder: &Decoder, dirty: bool) -> ExitCode {
    let mut watch = decoder.source().map(SchemaWatch::new);
    let mut parser = DumpParser::new();
    let stdout = io::stdout();
    let mut failed = 0;

    info!("Waiting for captures on stdin");
    for block in Blocks::new(io::stdin().lock()) {
        let block = match block {
            Ok(block) => block,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                return ExitCode::from(EXIT_RUNTIME_ERROR);
            }
        };

        if watch.as_mut().is_some_and(SchemaWatch::changed) {
            if let Err(e) = decoder.reload() {
                warn!("Keeping previous schema: {:#}", e);
            }
        }

        match decode_capture(decoder, &mut parser, &block, dirty, &mut stdout.lock()) {
            Ok(n) => failed += n,
            Err(e) => {
                error!("{:#}", e);
                return ExitCode::from(EXIT_RUNTIME_ERROR);
            }
        }
    }

    if failed > 0 {
        error!("{} fragment(s) failed to decode", failed);
        return ExitCode::from(EXIT_RUNTIME_ERROR);
    }
    ExitCode::from(EXIT_PASS)
}
