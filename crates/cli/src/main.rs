// Regulator - Register Dump Decoder
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::Context;
use clap::{Parser, Subcommand};
use regulator_core::{Decoder, DumpParser};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

mod stream;

const EXIT_PASS: u8 = 0;
const EXIT_NOT_FOUND: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

fn parse_addr(s: &str) -> Result<u64, String> {
    regulator_config::parse_int(s).map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Register dump decoder", long_about = None)]
struct Cli {
    /// Path to the register schema (YAML)
    #[arg(short, long)]
    schema: PathBuf,

    /// Enable debug logging (skipped lines, parser directives)
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load the schema and print a summary of what it declares.
    Check,

    /// Show which instance, register and type cover an address.
    Lookup(LookupArgs),

    /// Decode a captured dump from a file or stdin.
    Decode(DecodeArgs),

    /// Decode blank-line separated captures from stdin as they arrive,
    /// reloading the schema whenever its file changes.
    Stream(StreamArgs),
}

#[derive(Parser, Debug)]
struct LookupArgs {
    /// Absolute address, decimal or 0x-prefixed hex
    #[arg(value_parser = parse_addr)]
    address: u64,
}

#[derive(Parser, Debug)]
struct DecodeArgs {
    /// Dump file; stdin when omitted
    input: Option<PathBuf>,

    /// Treat the first and last line as cut off (mouse selections)
    #[arg(long)]
    dirty: bool,
}

#[derive(Parser, Debug)]
struct StreamArgs {
    /// Treat the first and last line of every block as cut off
    #[arg(long)]
    dirty: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(io::stderr)
            .init();
    }

    let decoder = match Decoder::from_file(&cli.schema) {
        Ok(decoder) => decoder,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    match cli.command {
        Commands::Check => run_check(&decoder),
        Commands::Lookup(args) => run_lookup(&decoder, args),
        Commands::Decode(args) => run_decode(&decoder, args),
        Commands::Stream(args) => stream::run_stream(&decoder, args.dirty),
    }
}

fn run_check(decoder: &Decoder) -> ExitCode {
    let schema = decoder.snapshot();
    let types: usize = schema.clusters().map(|c| c.types().count()).sum();
    let registers: usize = schema.clusters().map(|c| c.registers().len()).sum();
    println!("clusters:  {}", schema.clusters().count());
    println!("types:     {}", types);
    println!("registers: {}", registers);
    println!("instances: {}", schema.instances().len());
    ExitCode::from(EXIT_PASS)
}

fn run_lookup(decoder: &Decoder, args: LookupArgs) -> ExitCode {
    let schema = decoder.snapshot();
    let Some((instance, cluster)) = schema.find_cluster(args.address) else {
        println!("{:#x}: no instance found", args.address);
        return ExitCode::from(EXIT_NOT_FOUND);
    };
    let offset = args.address - instance.location().start();
    println!(
        "{:#x}: {} ({} + {:#x})",
        args.address,
        instance.name(),
        cluster.name(),
        offset
    );
    match cluster.find_type(offset) {
        Some((register, ty)) => {
            println!(
                "register {} at {:#x}, type {} {}",
                register.name(),
                instance.location().start() + register.location().start(),
                ty.kind(),
                ty.name()
            );
            for field in ty.fields() {
                println!("  {} {}: {}", field.kind(), field.location(), field.name());
            }
        }
        None => println!("no register at offset {:#x}", offset),
    }
    ExitCode::from(EXIT_PASS)
}

fn run_decode(decoder: &Decoder, args: DecodeArgs) -> ExitCode {
    let text = match read_input(args.input.as_ref()) {
        Ok(text) => text,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    };

    let mut parser = DumpParser::new();
    let stdout = io::stdout();
    match decode_capture(decoder, &mut parser, &text, args.dirty, &mut stdout.lock()) {
        Ok(0) => ExitCode::from(EXIT_PASS),
        Ok(failed) => {
            error!("{} fragment(s) failed to decode", failed);
            ExitCode::from(EXIT_RUNTIME_ERROR)
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_RUNTIME_ERROR)
        }
    }
}

fn read_input(input: Option<&PathBuf>) -> anyhow::Result<String> {
    match input {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read dump {:?}", path))
        }
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read dump from stdin")?;
            Ok(text)
        }
    }
}

/// Decodes every fragment of one capture and writes the reports to `out`.
///
/// Returns how many fragments failed to decode.
pub(crate) fn decode_capture(
    decoder: &Decoder,
    parser: &mut DumpParser,
    text: &str,
    dirty: bool,
    out: &mut impl Write,
) -> anyhow::Result<usize> {
    let stores = if dirty {
        parser.parse_dirty(text)
    } else {
        parser.parse(text)
    };
    if stores.is_empty() {
        warn!("No dump lines found");
        return Ok(0);
    }
    info!("Decoding {} fragment(s)", stores.len());

    // one snapshot for the whole capture
    let schema = decoder.snapshot();
    let mut failed = 0;
    for store in &stores {
        match schema.decode(store) {
            Ok(Some(report)) => {
                if !report.registers.is_empty() {
                    writeln!(out, "{}", report).context("Failed to write report")?;
                }
            }
            Ok(None) => warn!("{:#010x}: no instance found", store.base()),
            Err(e) => {
                error!("{:#010x}: {}", store.base(), e);
                failed += 1;
            }
        }
    }
    Ok(failed)
}
