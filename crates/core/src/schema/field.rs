// Regulator - Register Dump Decoder
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::key::{parse_placed, Unit};
use super::SchemaError;
use crate::decode::DecodeError;
use crate::interval::Interval;
use crate::kind::Kind;
use regulator_config::{EnumRef, EnumTable, FieldSpec};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Value-to-label table, shared by every field that names it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumeration {
    name: Option<String>,
    labels: BTreeMap<u64, String>,
}

impl Enumeration {
    pub(crate) fn from_table(name: Option<&str>, table: &EnumTable) -> Result<Self, SchemaError> {
        let mut labels = BTreeMap::new();
        for (value, label) in table.iter() {
            let value = value.value()?;
            if labels.insert(value, label.clone()).is_some() {
                return Err(SchemaError::Duplicate {
                    what: "enum value",
                    name: value.to_string(),
                });
            }
        }
        Ok(Self {
            name: name.map(str::to_string),
            labels,
        })
    }

    /// `None` for tables written inline under a field.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn label(&self, value: u64) -> Option<&str> {
        self.labels.get(&value).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A named bit range inside a register type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    kind: Kind,
    location: Interval,
    enumeration: Option<Arc<Enumeration>>,
}

impl Field {
    /// Builds the field for `"<kind> <bit-range>": spec`, resolving a named
    /// enum against the owning type's `enums`.
    pub(crate) fn from_spec(
        key: &str,
        spec: &FieldSpec,
        enums: &HashMap<String, Arc<Enumeration>>,
    ) -> Result<Self, SchemaError> {
        let (kind, location) = parse_placed(key, Unit::Bit)?;
        let enumeration = match spec.enumeration() {
            None => None,
            Some(EnumRef::Named(name)) => Some(
                enums
                    .get(name)
                    .cloned()
                    .ok_or_else(|| SchemaError::UnknownEnumReference(name.clone()))?,
            ),
            Some(EnumRef::Inline(table)) => Some(Arc::new(Enumeration::from_table(None, table)?)),
        };
        Ok(Self {
            name: spec.name().to_string(),
            kind,
            location,
            enumeration,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Bit positions, LSB = 0.
    pub fn location(&self) -> Interval {
        self.location
    }

    pub fn enumeration(&self) -> Option<&Enumeration> {
        self.enumeration.as_deref()
    }

    /// Looks up the label for an extracted value.
    ///
    /// Fields without an enumeration have no label. A value the enumeration
    /// does not list is an error.
    pub fn decode(&self, value: u64) -> Result<Option<&str>, DecodeError> {
        match &self.enumeration {
            None => Ok(None),
            Some(enumeration) => enumeration
                .label(value)
                .map(Some)
                .ok_or_else(|| DecodeError::UnknownEnumValue {
                    field: self.name.clone(),
                    value,
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regulator_config::Number;

    fn table(entries: &[(u64, &str)]) -> EnumTable {
        entries
            .iter()
            .map(|(v, l)| (Number::Int(*v), l.to_string()))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_inline_enum() {
        let spec: FieldSpec = serde_yaml::from_str(
            r#"
name: CSI0_DATA_SOURCE
enum:
  0: Parallel interface is connected to CSI0
  1: MCT (MIPI) is connected to CSI0
"#,
        )
        .unwrap();
        let field = Field::from_spec("u1 28", &spec, &HashMap::new()).unwrap();
        assert_eq!(field.location(), Interval::unit(28));
        assert_eq!(
            field.decode(0).unwrap(),
            Some("Parallel interface is connected to CSI0")
        );
        assert!(matches!(
            field.decode(2),
            Err(DecodeError::UnknownEnumValue { value: 2, .. })
        ));
        assert!(field.enumeration().unwrap().name().is_none());
    }

    #[test]
    fn test_named_enum() {
        let mode = Enumeration::from_table(Some("mode"), &table(&[(0, "off"), (3, "on")])).unwrap();
        let enums = HashMap::from([("mode".to_string(), Arc::new(mode))]);

        let spec = FieldSpec::Detailed(regulator_config::FieldDetail {
            name: "MODE".to_string(),
            enumeration: Some(EnumRef::Named("mode".to_string())),
        });
        let field = Field::from_spec("u2 4..5", &spec, &enums).unwrap();
        assert_eq!(field.decode(3).unwrap(), Some("on"));
        assert_eq!(field.enumeration().unwrap().name(), Some("mode"));

        let missing = FieldSpec::Detailed(regulator_config::FieldDetail {
            name: "MODE".to_string(),
            enumeration: Some(EnumRef::Named("nope".to_string())),
        });
        assert!(matches!(
            Field::from_spec("u2 4..5", &missing, &enums),
            Err(SchemaError::UnknownEnumReference(n)) if n == "nope"
        ));
    }

    #[test]
    fn test_plain_field_has_no_label() {
        let field = Field::from_spec("u3 01", &FieldSpec::Name("MODE".into()), &HashMap::new()).unwrap();
        assert_eq!(field.location(), Interval::new(1, 4).unwrap());
        assert_eq!(field.decode(7).unwrap(), None);
    }

    #[test]
    fn test_duplicate_enum_value() {
        let dup: EnumTable = vec![
            (Number::Int(1), "a".to_string()),
            (Number::Str("0x1".to_string()), "b".to_string()),
        ]
        .into();
        assert!(matches!(
            Enumeration::from_table(None, &dup),
            Err(SchemaError::Duplicate { .. })
        ));
    }
}
