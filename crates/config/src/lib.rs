// Regulator - Register Dump Decoder
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Serde model of a register schema document.
//!
//! The document is deliberately loose: keys such as `"r32 IPUx_CONF"` or
//! `"u3 01…03"` are kept as plain strings here and are split and validated
//! by the schema builder in `regulator-core`.

use anyhow::{Context, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

fn default_word_size() -> Number {
    Number::Int(4)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumberError {
    #[error("invalid integer '{0}'")]
    Invalid(String),
}

/// Parses an unsigned integer written in decimal, `0x` hex or `0b` binary.
pub fn parse_int(s: &str) -> std::result::Result<u64, NumberError> {
    let trimmed = s.trim();
    let parsed = if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)
    } else if let Some(bin) = trimmed
        .strip_prefix("0b")
        .or_else(|| trimmed.strip_prefix("0B"))
    {
        u64::from_str_radix(bin, 2)
    } else {
        trimmed.parse::<u64>()
    };
    parsed.map_err(|_| NumberError::Invalid(s.to_string()))
}

/// An integer that may be spelled as a YAML number or as a string
/// (`size: 0xe8` and `size: "0xe8"` are both accepted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(u64),
    Str(String),
}

impl Number {
    pub fn value(&self) -> std::result::Result<u64, NumberError> {
        match self {
            Number::Int(v) => Ok(*v),
            Number::Str(s) => parse_int(s),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{}", v),
            Number::Str(s) => f.write_str(s),
        }
    }
}

/// A YAML mapping that remembers document order.
///
/// Instance resolution is first-match in document order, so the order of
/// `instances:` (and, for stable output, every other keyed section) has to
/// survive deserialization. Duplicate keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<K, V>(Vec<(K, V)>);

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<K: PartialEq, V> OrderedMap<K, V> {
    pub fn get(&self, key: &K) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl<K, V> OrderedMap<K, V> {
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.0.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> From<Vec<(K, V)>> for OrderedMap<K, V> {
    fn from(entries: Vec<(K, V)>) -> Self {
        Self(entries)
    }
}

impl<K, V> IntoIterator for OrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: Serialize, V: Serialize> Serialize for OrderedMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<K, V>(PhantomData<(K, V)>);

impl<'de, K, V> Visitor<'de> for OrderedMapVisitor<K, V>
where
    K: Deserialize<'de> + PartialEq + fmt::Debug,
    V: Deserialize<'de>,
{
    type Value = OrderedMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a mapping")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        // `fields:` with nothing under it
        Ok(OrderedMap::default())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut entries: Vec<(K, V)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<K, V>()? {
            if entries.iter().any(|(k, _)| *k == key) {
                return Err(de::Error::custom(format!("duplicate key {:?}", key)));
            }
            entries.push((key, value));
        }
        Ok(OrderedMap(entries))
    }
}

impl<'de, K, V> Deserialize<'de> for OrderedMap<K, V>
where
    K: Deserialize<'de> + PartialEq + fmt::Debug,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(OrderedMapVisitor(PhantomData))
    }
}

/// Value-to-label table of an enumeration.
pub type EnumTable = OrderedMap<Number, String>;

/// A field's `enum:` entry: either the name of a table declared under the
/// type's `enums:` or an inline table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumRef {
    Named(String),
    Inline(EnumTable),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDetail {
    pub name: String,
    #[serde(default, rename = "enum")]
    pub enumeration: Option<EnumRef>,
}

/// Right-hand side of `"<kind> <bit-range>": ...`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    Name(String),
    Detailed(FieldDetail),
}

impl FieldSpec {
    pub fn name(&self) -> &str {
        match self {
            FieldSpec::Name(name) => name,
            FieldSpec::Detailed(detail) => &detail.name,
        }
    }

    pub fn enumeration(&self) -> Option<&EnumRef> {
        match self {
            FieldSpec::Name(_) => None,
            FieldSpec::Detailed(detail) => detail.enumeration.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterDetail {
    pub name: String,
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
}

/// Right-hand side of `"<kind> <byte-range>": ...`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegisterSpec {
    Name(String),
    Detailed(RegisterDetail),
}

impl RegisterSpec {
    pub fn name(&self) -> &str {
        match self {
            RegisterSpec::Name(name) => name,
            RegisterSpec::Detailed(detail) => &detail.name,
        }
    }

    /// The referenced type, which defaults to the register's own name.
    pub fn type_name(&self) -> &str {
        match self {
            RegisterSpec::Name(name) => name,
            RegisterSpec::Detailed(detail) => detail.type_name.as_deref().unwrap_or(&detail.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDescriptor {
    #[serde(default)]
    pub enums: OrderedMap<String, EnumTable>,
    #[serde(default)]
    pub fields: OrderedMap<String, FieldSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterDescriptor {
    pub size: Number,
    #[serde(default = "default_word_size")]
    pub word_size: Number,
    #[serde(default)]
    pub types: OrderedMap<String, TypeDescriptor>,
    #[serde(default)]
    pub registers: OrderedMap<String, RegisterSpec>,
}

/// Root of a schema file.
///
/// ```yaml
/// clusters:
///   IPU_Base:
///     size: 0xe8
///     types:
///       r32 IPUx_CONF:
///         fields:
///           u1 00: CSI0_EN
///     registers:
///       r32 00: IPUx_CONF
/// instances:
///   IPU_Base 0x2600000: IPU1_Base
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    #[serde(default)]
    pub clusters: OrderedMap<String, ClusterDescriptor>,
    /// `"<ClusterName> <address>": <InstanceName>`
    #[serde(default)]
    pub instances: OrderedMap<String, String>,
}

impl SchemaDocument {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse schema YAML")
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        serde_yaml::from_reader(reader).context("Failed to parse schema YAML")
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open schema at {:?}", path.as_ref()))?;
        Self::from_reader(f).with_context(|| format!("in schema file {:?}", path.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("28"), Ok(28));
        assert_eq!(parse_int("0x2600000"), Ok(0x2600000));
        assert_eq!(parse_int("0b101"), Ok(5));
        assert_eq!(parse_int(" 07 "), Ok(7));
        assert!(parse_int("0xzz").is_err());
        assert!(parse_int("").is_err());
    }

    #[test]
    fn test_number_forms() {
        let n: Number = serde_yaml::from_str("232").unwrap();
        assert_eq!(n.value(), Ok(232));
        let n: Number = serde_yaml::from_str("\"0xe8\"").unwrap();
        assert_eq!(n.value(), Ok(0xe8));
    }

    #[test]
    fn test_ordered_map_keeps_order() {
        let yaml = r#"
zeta: 1
alpha: 2
mid: 3
"#;
        let map: OrderedMap<String, u32> = serde_yaml::from_str(yaml).unwrap();
        let keys: Vec<&str> = map.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(map.get(&"alpha".to_string()), Some(&2));
    }

    #[test]
    fn test_empty_section_is_empty_map() {
        let yaml = r#"
fields:
"#;
        let ty: TypeDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert!(ty.fields.is_empty());
        assert!(ty.enums.is_empty());
    }

    #[test]
    fn test_field_spec_forms() {
        let yaml = r#"
u1 00: CSI0_EN
u1 28:
  name: CSI0_DATA_SOURCE
  enum:
    0: Parallel interface is connected to CSI0
    1: MCT (MIPI) is connected to CSI0
u2 1..2:
  name: MODE
  enum: my_enum
"#;
        let fields: OrderedMap<String, FieldSpec> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(fields.len(), 3);

        let simple = fields.get(&"u1 00".to_string()).unwrap();
        assert_eq!(simple.name(), "CSI0_EN");
        assert!(simple.enumeration().is_none());

        let inline = fields.get(&"u1 28".to_string()).unwrap();
        assert_eq!(inline.name(), "CSI0_DATA_SOURCE");
        match inline.enumeration() {
            Some(EnumRef::Inline(table)) => assert_eq!(table.len(), 2),
            other => panic!("expected inline enum, got {:?}", other),
        }

        let named = fields.get(&"u2 1..2".to_string()).unwrap();
        assert_eq!(named.enumeration(), Some(&EnumRef::Named("my_enum".to_string())));
    }

    #[test]
    fn test_register_type_defaults_to_name() {
        let yaml = r#"
r32 00: IPUx_CONF
r32 04:
  name: IPUx_DISP_GEN
r32 08:
  name: IPUx_MEM_RST
  type: IPUx_CONF
"#;
        let regs: OrderedMap<String, RegisterSpec> = serde_yaml::from_str(yaml).unwrap();
        let types: Vec<&str> = regs.iter().map(|(_, r)| r.type_name()).collect();
        assert_eq!(types, vec!["IPUx_CONF", "IPUx_DISP_GEN", "IPUx_CONF"]);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let yaml = r#"
instances:
  IPU_Base 0x2600000: IPU1_Base
  IPU_Base 0x2600000: IPU2_Base
"#;
        assert!(SchemaDocument::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_unknown_cluster_key_rejected() {
        let yaml = r#"
clusters:
  IPU_Base:
    size: 0xe8
    wordsize: 4
"#;
        assert!(SchemaDocument::from_yaml(yaml).is_err());
    }
}
