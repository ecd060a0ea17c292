// Regulator - Register Dump Decoder
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Turning captured bytes into named register and field values.

use crate::interval::{Interval, IntervalError};
use crate::kind::Kind;
use crate::memory::{ByteSource, ByteStore, MemoryError, MemoryView};
use crate::schema::{RegisterType, Schema};
use anyhow::{Context, Result};
use regulator_config::SchemaDocument;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error(transparent)]
    Interval(#[from] IntervalError),
    #[error("view {view:x} does not hold one {kind} word of type {type_name}")]
    WidthMismatch {
        view: Interval,
        type_name: String,
        kind: Kind,
    },
    #[error("value {value} of field {field} is not in its enumeration")]
    UnknownEnumValue { field: String, value: u64 },
}

/// Label attached to a field value by its enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Label(String),
    /// The enumeration has no entry for the value.
    Unknown,
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Label(label) => f.write_str(label),
            Symbol::Unknown => f.write_str("<unknown>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    pub location: Interval,
    pub name: String,
    pub kind: Kind,
    pub value: u64,
    /// `None` when the field has no enumeration.
    pub symbol: Option<Symbol>,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.kind.format_value(self.value))?;
        if let Some(symbol) = &self.symbol {
            write!(f, " = {}", symbol)?;
        }
        Ok(())
    }
}

/// Reads `len` bits starting `offset` bits below the MSB of `word`.
fn extract_bits(word: &[u8], offset: u64, len: u64) -> u64 {
    (offset..offset + len).fold(0, |acc, i| {
        let byte = word[(i / 8) as usize];
        let bit = (byte >> (7 - i % 8)) & 1;
        (acc << 1) | u64::from(bit)
    })
}

/// Decodes every field of `ty` from the single word `view` holds.
///
/// The view must be exactly one word of the type's width, in the word
/// size the bytes were captured with.
///
/// Values come back in ascending bit order. An enumerated field whose
/// value has no label is logged and kept with [`Symbol::Unknown`].
pub fn decode_fields(view: &MemoryView<'_>, ty: &RegisterType) -> Result<Vec<FieldValue>, DecodeError> {
    let bits = u64::from(ty.kind().bits());
    if view.len() * 8 != bits || view.word_size() != view.len() {
        return Err(DecodeError::WidthMismatch {
            view: view.mapped_loc(),
            type_name: ty.name().to_string(),
            kind: ty.kind(),
        });
    }
    let word = view.get_word(0)?;

    let mut values = Vec::with_capacity(ty.fields().len());
    for field in ty.fields() {
        let location = field.location();
        let value = extract_bits(&word, bits - location.stop(), location.len());
        let symbol = match field.decode(value) {
            Ok(label) => label.map(|l| Symbol::Label(l.to_string())),
            Err(e) => {
                tracing::warn!("{} at {:x} ({})", e, view.mapped_loc(), ty.name());
                Some(Symbol::Unknown)
            }
        };
        values.push(FieldValue {
            location,
            name: field.name().to_string(),
            kind: field.kind(),
            value,
            symbol,
        });
    }
    Ok(values)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReport {
    /// [`MemoryView::dump_bits`] of the field.
    pub bits: String,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterReport {
    pub instance: String,
    pub register: String,
    /// Absolute addresses of the register.
    pub location: Interval,
    /// [`MemoryView::dump`] of the register.
    pub dump: String,
    pub fields: Vec<FieldReport>,
}

impl RegisterReport {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().map(|f| &f.value).find(|v| v.name == name)
    }
}

impl fmt::Display for RegisterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} # {} {}", self.dump, self.instance, self.register)?;
        for field in &self.fields {
            write!(f, "\n{} # {}", field.bits, field.value)?;
        }
        Ok(())
    }
}

/// Everything decoded from one captured fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeReport {
    pub instance: String,
    pub cluster: String,
    pub registers: Vec<RegisterReport>,
}

impl DecodeReport {
    pub fn register(&self, name: &str) -> Option<&RegisterReport> {
        self.registers.iter().find(|r| r.register == name)
    }
}

impl fmt::Display for DecodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, register) in self.registers.iter().enumerate() {
            if n > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", register)?;
        }
        Ok(())
    }
}

impl Schema {
    /// Decodes the registers a fragment covers.
    ///
    /// Returns `Ok(None)` when no instance contains the fragment's base
    /// address. Registers the fragment holds only part of are skipped with a
    /// warning.
    pub fn decode(&self, store: &ByteStore) -> Result<Option<DecodeReport>, DecodeError> {
        let Some((instance, cluster)) = self.find_cluster(store.base()) else {
            return Ok(None);
        };
        let view = MemoryView::new(store, instance.location())?;
        // cluster-relative offsets actually captured
        let loc = view.outer_loc().rebase(instance.location().start())?;

        let mut registers = Vec::new();
        for (register, ty) in cluster.iterate(loc) {
            let reg_view = MemoryView::new(&view, register.location().rebase(loc.start())?)?;
            if reg_view.len() != register.location().len() {
                tracing::warn!(
                    "{} {} is only partly captured at {:x}",
                    instance.name(),
                    register.name(),
                    reg_view.mapped_loc()
                );
                continue;
            }
            let fields = decode_fields(&reg_view, ty)?
                .into_iter()
                .map(|value| {
                    Ok(FieldReport {
                        bits: reg_view.dump_bits(value.location)?,
                        value,
                    })
                })
                .collect::<Result<Vec<_>, MemoryError>>()?;
            registers.push(RegisterReport {
                instance: instance.name().to_string(),
                register: register.name().to_string(),
                location: reg_view.mapped_loc(),
                dump: reg_view.dump()?,
                fields,
            });
        }

        Ok(Some(DecodeReport {
            instance: instance.name().to_string(),
            cluster: cluster.name().to_string(),
            registers,
        }))
    }
}

/// Holds the current schema and swaps in a new one on reload.
///
/// Decoding takes a snapshot first, so a reload never changes the schema
/// under a decode that is already running.
#[derive(Debug)]
pub struct Decoder {
    schema: RwLock<Arc<Schema>>,
    source: Option<PathBuf>,
}

impl Decoder {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema: RwLock::new(Arc::new(schema)),
            source: None,
        }
    }

    pub fn from_document(doc: &SchemaDocument) -> Result<Self> {
        let schema = Schema::from_document(doc).context("Failed to build schema")?;
        Ok(Self::new(schema))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::from_document(&SchemaDocument::from_yaml(yaml)?)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        Self::from_document(&SchemaDocument::from_reader(reader)?)
    }

    /// Loads a schema file and remembers it for [`Decoder::reload`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let doc = SchemaDocument::from_file(path)?;
        let mut decoder = Self::from_document(&doc)
            .with_context(|| format!("in schema file {:?}", path))?;
        decoder.source = Some(path.to_path_buf());
        tracing::info!("Loaded schema from {:?}", path);
        Ok(decoder)
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The schema decodes currently run against.
    pub fn snapshot(&self) -> Arc<Schema> {
        self.schema
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Builds a schema from `doc` and installs it. On error the current
    /// schema stays in place.
    pub fn load(&self, doc: &SchemaDocument) -> Result<()> {
        let schema = Schema::from_document(doc).context("Failed to build schema")?;
        *self.schema.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(schema);
        Ok(())
    }

    /// Re-reads the file given to [`Decoder::from_file`].
    pub fn reload(&self) -> Result<()> {
        let path = self
            .source
            .as_deref()
            .context("Decoder was not loaded from a file")?;
        let doc = SchemaDocument::from_file(path)?;
        self.load(&doc)
            .with_context(|| format!("in schema file {:?}", path))?;
        tracing::info!("Reloaded schema from {:?}", path);
        Ok(())
    }

    pub fn decode(&self, store: &ByteStore) -> Result<Option<DecodeReport>, DecodeError> {
        self.snapshot().decode(store)
    }
}
