// Regulator - Register Dump Decoder
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::SchemaError;
use crate::interval::{Interval, IntervalError};
use crate::kind::Kind;

/// Splits `"r32 IPUx_CONF"` into `("r32", "IPUx_CONF")`.
pub(crate) fn split_key(key: &str) -> Result<(&str, &str), SchemaError> {
    let malformed = || SchemaError::MalformedKey(key.to_string());
    let (head, tail) = key.trim().split_once(char::is_whitespace).ok_or_else(malformed)?;
    let tail = tail.trim();
    if head.is_empty() || tail.is_empty() {
        return Err(malformed());
    }
    Ok((head, tail))
}

/// What a placed key's location counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Unit {
    /// Bit positions inside a register word.
    Bit,
    /// Byte offsets inside a cluster.
    Byte,
}

/// Parses `"<kind> <location>"`, sizing the location by the kind.
pub(crate) fn parse_placed(key: &str, unit: Unit) -> Result<(Kind, Interval), SchemaError> {
    let (kind_text, location_text) = split_key(key)?;
    let kind: Kind = kind_text.parse()?;
    let size = match unit {
        Unit::Bit => u64::from(kind.bits()),
        Unit::Byte => kind.bytes()?,
    };
    match Interval::parse_sized(location_text, size) {
        Ok(location) => Ok((kind, location)),
        Err(IntervalError::LengthMismatch {
            text,
            expected,
            actual,
        }) => Err(SchemaError::FieldWidthMismatch {
            kind,
            location: text,
            expected,
            actual,
        }),
        Err(e) => Err(e.into()),
    }
}
