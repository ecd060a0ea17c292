// Regulator - Register Dump Decoder
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::schema::SchemaError;
use std::fmt;
use std::str::FromStr;

/// Storage class and width of a field, type or register (`u1`, `r32`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Opaque bits, rendered as hex.
    Raw(u32),
    /// Unsigned integer, rendered as decimal.
    Unsigned(u32),
}

impl Kind {
    pub fn bits(&self) -> u32 {
        match self {
            Kind::Raw(bits) | Kind::Unsigned(bits) => *bits,
        }
    }

    pub fn hint(&self) -> char {
        match self {
            Kind::Raw(_) => 'r',
            Kind::Unsigned(_) => 'u',
        }
    }

    /// Width in bytes; only defined for byte-multiple kinds.
    pub fn bytes(&self) -> Result<u64, SchemaError> {
        let bits = self.bits();
        if bits % 8 != 0 {
            return Err(SchemaError::UnalignedKind(*self));
        }
        Ok(u64::from(bits / 8))
    }

    /// Renders a value extracted for a field of this kind.
    pub fn format_value(&self, value: u64) -> String {
        match self {
            Kind::Raw(bits) => format!("{:#0width$x}", value, width = (*bits as usize).div_ceil(4) + 2),
            Kind::Unsigned(_) => value.to_string(),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.hint(), self.bits())
    }
}

impl FromStr for Kind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || SchemaError::UnknownKind(s.to_string());
        let mut chars = s.chars();
        let hint = chars.next().ok_or_else(unknown)?;
        let bits: u32 = chars.as_str().parse().map_err(|_| unknown())?;
        if bits == 0 || bits > 64 {
            return Err(unknown());
        }
        match hint {
            'r' => Ok(Kind::Raw(bits)),
            'u' => Ok(Kind::Unsigned(bits)),
            _ => Err(unknown()),
        }
    }
}
