// Regulator - Register Dump Decoder
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::key::{parse_placed, Unit};
use super::SchemaError;
use crate::interval::Interval;
use crate::kind::Kind;
use regulator_config::RegisterSpec;

/// A register placed at a byte offset inside a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    name: String,
    kind: Kind,
    location: Interval,
    type_name: String,
}

impl Register {
    pub(crate) fn from_spec(key: &str, spec: &RegisterSpec) -> Result<Self, SchemaError> {
        let (kind, location) = parse_placed(key, Unit::Byte)?;
        Ok(Self {
            name: spec.name().to_string(),
            kind,
            location,
            type_name: spec.type_name().to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Byte offsets relative to the cluster start.
    pub fn location(&self) -> Interval {
        self.location
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}
