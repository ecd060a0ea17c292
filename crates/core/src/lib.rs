// Regulator - Register Dump Decoder
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Decodes memory-mapped register dumps against a YAML register schema.
//!
//! A dump is parsed into [`ByteStore`] fragments by [`DumpParser`]. Each
//! fragment is matched to an [`Instance`] of a [`Cluster`] by address and
//! the registers it covers are split into named fields.

pub mod decode;
pub mod interval;
pub mod kind;
pub mod memory;
pub mod parse;
pub mod schema;

pub use decode::{decode_fields, DecodeError, DecodeReport, Decoder, FieldValue, RegisterReport, Symbol};
pub use interval::{Interval, IntervalError};
pub use kind::Kind;
pub use memory::{ByteSource, ByteStore, MemoryError, MemoryView};
pub use parse::DumpParser;
pub use schema::{Cluster, Field, Instance, Register, RegisterType, Schema, SchemaError, Scope};
