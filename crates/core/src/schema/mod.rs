// Regulator - Register Dump Decoder
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! The register layout graph built from a [`SchemaDocument`].
//!
//! A [`Schema`] is immutable once built. Reloading a schema file builds a
//! new one from scratch (see [`crate::Decoder::reload`]).

use crate::interval::{Interval, IntervalError};
use crate::kind::Kind;
use regulator_config::{NumberError, SchemaDocument};
use std::collections::HashMap;
use std::fmt;

mod cluster;
mod field;
mod instance;
mod key;
mod register;
mod register_type;

pub use cluster::Cluster;
pub use field::{Enumeration, Field};
pub use instance::Instance;
pub use register::Register;
pub use register_type::RegisterType;

/// The kind of schema entry a [`SchemaError::Within`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Cluster,
    Type,
    Enum,
    Field,
    Register,
    Instance,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Cluster => "cluster",
            Scope::Type => "type",
            Scope::Enum => "enum",
            Scope::Field => "field",
            Scope::Register => "register",
            Scope::Instance => "instance",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("unknown kind {0}")]
    UnknownKind(String),
    #[error("kind {0} is not a whole number of bytes")]
    UnalignedKind(Kind),
    #[error("malformed key '{0}', expected two words")]
    MalformedKey(String),
    #[error(transparent)]
    Location(#[from] IntervalError),
    #[error("location '{location}' spans {actual} units but kind {kind} needs {expected}")]
    FieldWidthMismatch {
        kind: Kind,
        location: String,
        expected: u64,
        actual: u64,
    },
    #[error("unknown enum {0}")]
    UnknownEnumReference(String),
    #[error("unknown type {0}")]
    UnknownType(String),
    #[error("unknown cluster {0}")]
    UnknownCluster(String),
    #[error("type kind {kind} does not fit the {word_size}-byte word size (expected r{})", .word_size * 8)]
    UnsupportedTypeKind { kind: Kind, word_size: u64 },
    #[error("register kind {register} does not match type kind {type_kind}")]
    TypeWidthMismatch { register: Kind, type_kind: Kind },
    #[error("unsupported word size {0} (expected 1, 2, 4 or 8)")]
    InvalidWordSize(u64),
    #[error("{location} overlaps {other}")]
    Overlap { location: Interval, other: String },
    #[error("{location} does not fit in {limit}")]
    OutOfBounds { location: Interval, limit: u64 },
    #[error("duplicate {what} {name}")]
    Duplicate { what: &'static str, name: String },
    #[error(transparent)]
    Number(#[from] NumberError),
    #[error("in {scope} '{key}'")]
    Within {
        scope: Scope,
        key: String,
        #[source]
        source: Box<SchemaError>,
    },
}

impl SchemaError {
    /// The failing condition with all breadcrumbs peeled off.
    pub fn root(&self) -> &SchemaError {
        match self {
            SchemaError::Within { source, .. } => source.root(),
            other => other,
        }
    }

    /// Breadcrumbs from the outermost entry inwards, then the condition:
    /// `in cluster 'IPU_Base': in type 'r32 IPUx_CONF': unknown kind g1`.
    pub fn trail(&self) -> String {
        match self {
            SchemaError::Within {
                scope, key, source, ..
            } => format!("in {} '{}': {}", scope, key, source.trail()),
            other => other.to_string(),
        }
    }
}

pub(crate) trait Within<T> {
    fn within(self, scope: Scope, key: &str) -> Result<T, SchemaError>;
}

impl<T, E: Into<SchemaError>> Within<T> for Result<T, E> {
    fn within(self, scope: Scope, key: &str) -> Result<T, SchemaError> {
        self.map_err(|e| SchemaError::Within {
            scope,
            key: key.to_string(),
            source: Box::new(e.into()),
        })
    }
}

/// Inserts `item` into a list kept sorted by location, rejecting overlaps.
pub(crate) fn insert_sorted<T>(
    items: &mut Vec<T>,
    item: T,
    location: impl Fn(&T) -> Interval,
    name: impl Fn(&T) -> &str,
) -> Result<(), SchemaError> {
    let loc = location(&item);
    let idx = items.partition_point(|x| location(x) < loc);
    let neighbours = idx.checked_sub(1).into_iter().chain(Some(idx));
    for n in neighbours {
        if let Some(other) = items.get(n) {
            if location(other).intersect(&loc).is_some() {
                return Err(SchemaError::Overlap {
                    location: loc,
                    other: name(other).to_string(),
                });
            }
        }
    }
    items.insert(idx, item);
    Ok(())
}

/// Clusters and their placements, as loaded from one document.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    clusters: HashMap<String, Cluster>,
    instances: Vec<Instance>,
}

impl Schema {
    pub fn from_document(doc: &SchemaDocument) -> Result<Self, SchemaError> {
        let mut clusters = HashMap::new();
        for (name, desc) in doc.clusters.iter() {
            let cluster = Cluster::from_descriptor(name, desc).within(Scope::Cluster, name)?;
            clusters.insert(name.clone(), cluster);
        }

        let mut instances = Vec::with_capacity(doc.instances.len());
        for (key, name) in doc.instances.iter() {
            let instance = Instance::from_entry(key, name, &clusters).within(Scope::Instance, key)?;
            instances.push(instance);
        }

        Ok(Self {
            clusters,
            instances,
        })
    }

    pub fn cluster(&self, name: &str) -> Option<&Cluster> {
        self.clusters.get(name)
    }

    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.values()
    }

    /// Instances in document order.
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// First instance, in document order, whose range covers `address`.
    ///
    /// Overlapping placements are not rejected at load time; the earlier
    /// one shadows the later.
    pub fn find_instance(&self, address: u64) -> Option<&Instance> {
        self.instances
            .iter()
            .find(|instance| instance.location().contains(address))
    }

    pub fn find_cluster(&self, address: u64) -> Option<(&Instance, &Cluster)> {
        let instance = self.find_instance(address)?;
        let cluster = self.clusters.get(instance.cluster())?;
        Some((instance, cluster))
    }
}
