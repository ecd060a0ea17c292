// Regulator - Register Dump Decoder
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::register::Register;
use super::register_type::RegisterType;
use super::{insert_sorted, Scope, SchemaError, Within};
use crate::interval::Interval;
use regulator_config::{ClusterDescriptor, RegisterSpec};
use std::collections::HashMap;

const WORD_SIZES: [u64; 4] = [1, 2, 4, 8];

/// A reusable block of registers, placed in memory by instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    name: String,
    size: u64,
    word_size: u64,
    types: HashMap<String, RegisterType>,
    /// Sorted by offset, non-overlapping.
    registers: Vec<Register>,
}

impl Cluster {
    pub(crate) fn from_descriptor(name: &str, desc: &ClusterDescriptor) -> Result<Self, SchemaError> {
        let size = desc.size.value()?;
        let frame = Interval::from_size(size)?;
        let word_size = desc.word_size.value()?;
        if !WORD_SIZES.contains(&word_size) {
            return Err(SchemaError::InvalidWordSize(word_size));
        }

        let mut types = HashMap::new();
        for (key, type_desc) in desc.types.iter() {
            let ty = RegisterType::from_descriptor(key, type_desc, word_size)
                .and_then(|ty| match types.contains_key(ty.name()) {
                    true => Err(SchemaError::Duplicate {
                        what: "type",
                        name: ty.name().to_string(),
                    }),
                    false => Ok(ty),
                })
                .within(Scope::Type, key)?;
            types.insert(ty.name().to_string(), ty);
        }

        let mut registers = Vec::with_capacity(desc.registers.len());
        for (key, spec) in desc.registers.iter() {
            let register = place_register(key, spec, &types, frame).within(Scope::Register, key)?;
            insert_sorted(&mut registers, register, |r| r.location(), |r| r.name())
                .within(Scope::Register, key)?;
        }

        Ok(Self {
            name: name.to_string(),
            size,
            word_size,
            types,
            registers,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn word_size(&self) -> u64 {
        self.word_size
    }

    /// `[0, size)`.
    pub fn inner_loc(&self) -> Interval {
        Interval::from_raw(0, self.size)
    }

    pub fn register_type(&self, name: &str) -> Option<&RegisterType> {
        self.types.get(name)
    }

    pub fn types(&self) -> impl Iterator<Item = &RegisterType> {
        self.types.values()
    }

    /// Registers in ascending offset order.
    pub fn registers(&self) -> &[Register] {
        &self.registers
    }

    /// The register covering byte `offset` of the cluster.
    pub fn find_register(&self, offset: u64) -> Option<&Register> {
        let idx = self.registers.partition_point(|r| r.location().stop() <= offset);
        self.registers.get(idx).filter(|r| r.location().contains(offset))
    }

    pub fn find_type(&self, offset: u64) -> Option<(&Register, &RegisterType)> {
        let register = self.find_register(offset)?;
        let ty = self.types.get(register.type_name())?;
        Some((register, ty))
    }

    /// Registers whose first byte lies in `range`, in offset order.
    pub fn iterate(&self, range: Interval) -> impl Iterator<Item = (&Register, &RegisterType)> + '_ {
        let first = self.registers.partition_point(|r| r.location().start() < range.start());
        self.registers[first..]
            .iter()
            .take_while(move |r| r.location().start() < range.stop())
            .filter_map(|r| self.types.get(r.type_name()).map(|ty| (r, ty)))
    }
}

fn place_register(
    key: &str,
    spec: &RegisterSpec,
    types: &HashMap<String, RegisterType>,
    frame: Interval,
) -> Result<Register, SchemaError> {
    let register = Register::from_spec(key, spec)?;
    let ty = types
        .get(register.type_name())
        .ok_or_else(|| SchemaError::UnknownType(register.type_name().to_string()))?;
    if ty.kind() != register.kind() {
        return Err(SchemaError::TypeWidthMismatch {
            register: register.kind(),
            type_kind: ty.kind(),
        });
    }
    if register.location().stop() > frame.stop() {
        return Err(SchemaError::OutOfBounds {
            location: register.location(),
            limit: frame.stop(),
        });
    }
    Ok(register)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(yaml: &str) -> Result<Cluster, SchemaError> {
        let desc: ClusterDescriptor = serde_yaml::from_str(yaml).unwrap();
        Cluster::from_descriptor("TEST", &desc)
    }

    const CLUSTER: &str = r#"
size: 0x20
types:
  r32 CTRL:
    fields:
      u1 0: EN
  r32 STAT:
    fields:
      u4 0: STATE
registers:
  r32 0x08: STAT
  r32 0x00: CTRL
  r32 0x04:
    name: CTRL2
    type: CTRL
"#;

    #[test]
    fn test_registers_sorted() {
        let cluster = build(CLUSTER).unwrap();
        assert_eq!(cluster.word_size(), 4);
        let names: Vec<&str> = cluster.registers().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["CTRL", "CTRL2", "STAT"]);
        assert_eq!(cluster.find_register(0x06).unwrap().name(), "CTRL2");
        assert!(cluster.find_register(0x0c).is_none());

        let (reg, ty) = cluster.find_type(0x04).unwrap();
        assert_eq!(reg.name(), "CTRL2");
        assert_eq!(ty.name(), "CTRL");
    }

    #[test]
    fn test_iterate() {
        let cluster = build(CLUSTER).unwrap();
        let all: Vec<&str> = cluster
            .iterate(cluster.inner_loc())
            .map(|(r, _)| r.name())
            .collect();
        assert_eq!(all, vec!["CTRL", "CTRL2", "STAT"]);

        let tail: Vec<&str> = cluster
            .iterate(Interval::new(0x04, 0x08).unwrap())
            .map(|(r, _)| r.name())
            .collect();
        assert_eq!(tail, vec!["CTRL2"]);
    }

    #[test]
    fn test_register_errors() {
        let err = build(
            r#"
size: 0x08
registers:
  r32 0x00: MISSING
"#,
        )
        .unwrap_err();
        assert_eq!(err.trail(), "in register 'r32 0x00': unknown type MISSING");

        let err = build(
            r#"
size: 0x08
types:
  r32 CTRL: {}
registers:
  r32 0x08: CTRL
"#,
        )
        .unwrap_err();
        assert!(matches!(err.root(), SchemaError::OutOfBounds { limit: 8, .. }));

        let err = build(
            r#"
size: 0x08
types:
  r32 CTRL: {}
registers:
  r32 0x00: CTRL
  r32 0x02:
    name: OTHER
    type: CTRL
"#,
        )
        .unwrap_err();
        assert!(matches!(err.root(), SchemaError::Overlap { other, .. } if other == "CTRL"));

        let err = build(
            r#"
size: 0x08
types:
  r32 CTRL: {}
registers:
  r16 0x00: CTRL
"#,
        )
        .unwrap_err();
        assert!(matches!(err.root(), SchemaError::TypeWidthMismatch { .. }));
    }

    #[test]
    fn test_word_size_checked() {
        let err = build(
            r#"
size: 0x08
word_size: 3
"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidWordSize(3)));
    }

    #[test]
    fn test_duplicate_type_name() {
        let err = build(
            r#"
size: 0x08
word_size: 4
types:
  r32 CTRL: {}
  r32  CTRL: {}
"#,
        )
        .unwrap_err();
        assert!(matches!(err.root(), SchemaError::Duplicate { what: "type", .. }));
    }
}
