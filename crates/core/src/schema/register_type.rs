// Regulator - Register Dump Decoder
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::field::{Enumeration, Field};
use super::key::split_key;
use super::{insert_sorted, Scope, SchemaError, Within};
use crate::kind::Kind;
use regulator_config::TypeDescriptor;
use std::collections::HashMap;
use std::sync::Arc;

/// Field layout of one register word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterType {
    name: String,
    kind: Kind,
    /// Sorted by bit position, non-overlapping.
    fields: Vec<Field>,
}

impl RegisterType {
    pub(crate) fn from_descriptor(
        key: &str,
        desc: &TypeDescriptor,
        word_size: u64,
    ) -> Result<Self, SchemaError> {
        let (kind_text, name) = split_key(key)?;
        let kind: Kind = kind_text.parse()?;
        match kind {
            Kind::Raw(bits) if u64::from(bits) == word_size * 8 => {}
            _ => return Err(SchemaError::UnsupportedTypeKind { kind, word_size }),
        }

        let mut enums = HashMap::new();
        for (enum_name, table) in desc.enums.iter() {
            let enumeration = Enumeration::from_table(Some(enum_name), table).within(Scope::Enum, enum_name)?;
            enums.insert(enum_name.clone(), Arc::new(enumeration));
        }

        let bits = u64::from(kind.bits());
        let mut fields = Vec::with_capacity(desc.fields.len());
        for (field_key, spec) in desc.fields.iter() {
            let field = Field::from_spec(field_key, spec, &enums)
                .and_then(|field| fits(field, bits))
                .within(Scope::Field, field_key)?;
            insert_sorted(&mut fields, field, |f| f.location(), |f| f.name()).within(Scope::Field, field_key)?;
        }

        Ok(Self {
            name: name.to_string(),
            kind,
            fields,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Fields in ascending bit order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The field covering `bit`, if any.
    pub fn find_field(&self, bit: u64) -> Option<&Field> {
        let idx = self.fields.partition_point(|f| f.location().stop() <= bit);
        self.fields.get(idx).filter(|f| f.location().contains(bit))
    }
}

fn fits(field: Field, bits: u64) -> Result<Field, SchemaError> {
    if field.location().stop() > bits {
        return Err(SchemaError::OutOfBounds {
            location: field.location(),
            limit: bits,
        });
    }
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(yaml: &str) -> TypeDescriptor {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_fields_sorted() {
        let desc = descriptor(
            r#"
fields:
  u1 05: DP_EN
  u1 00: CSI0_EN
  u3 01: MODE
"#,
        );
        let ty = RegisterType::from_descriptor("r32 IPUx_CONF", &desc, 4).unwrap();
        assert_eq!(ty.name(), "IPUx_CONF");
        let names: Vec<&str> = ty.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["CSI0_EN", "MODE", "DP_EN"]);
        assert_eq!(ty.find_field(3).unwrap().name(), "MODE");
        assert_eq!(ty.find_field(5).unwrap().name(), "DP_EN");
        assert!(ty.find_field(4).is_none());
        assert!(ty.find_field(31).is_none());
    }

    #[test]
    fn test_kind_must_match_word() {
        let desc = TypeDescriptor::default();
        assert!(matches!(
            RegisterType::from_descriptor("r16 HALF", &desc, 4),
            Err(SchemaError::UnsupportedTypeKind { .. })
        ));
        assert!(matches!(
            RegisterType::from_descriptor("u32 NUM", &desc, 4),
            Err(SchemaError::UnsupportedTypeKind { .. })
        ));
        assert!(RegisterType::from_descriptor("r16 HALF", &desc, 2).is_ok());
    }

    #[test]
    fn test_overlapping_fields() {
        let desc = descriptor(
            r#"
fields:
  u2 00: A
  u1 01: B
"#,
        );
        let err = RegisterType::from_descriptor("r32 T", &desc, 4).unwrap_err();
        assert_eq!(err.trail(), "in field 'u1 01': 1 overlaps A");
    }

    #[test]
    fn test_field_beyond_word() {
        let desc = descriptor(
            r#"
fields:
  u4 30: TOP
"#,
        );
        let err = RegisterType::from_descriptor("r32 T", &desc, 4).unwrap_err();
        assert!(matches!(err.root(), SchemaError::OutOfBounds { limit: 32, .. }));
    }

    #[test]
    fn test_named_enum_shared() {
        let desc = descriptor(
            r#"
enums:
  onoff:
    0: off
    1: on
fields:
  u1 00:
    name: A
    enum: onoff
  u1 01:
    name: B
    enum: onoff
  u1 02:
    name: C
    enum: missing
"#,
        );
        let err = RegisterType::from_descriptor("r32 T", &desc, 4).unwrap_err();
        assert_eq!(err.trail(), "in field 'u1 02': unknown enum missing");
    }
}
