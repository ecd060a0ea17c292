// Regulator - Register Dump Decoder
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::cluster::Cluster;
use super::key::split_key;
use super::SchemaError;
use crate::interval::Interval;
use regulator_config::parse_int;
use std::collections::HashMap;

/// A cluster placed at an absolute address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    name: String,
    cluster: String,
    location: Interval,
}

impl Instance {
    /// Builds the instance for `"<ClusterName> <address>": name`.
    pub(crate) fn from_entry(
        key: &str,
        name: &str,
        clusters: &HashMap<String, Cluster>,
    ) -> Result<Self, SchemaError> {
        let (cluster_name, address) = split_key(key)?;
        let address = parse_int(address)?;
        let cluster = clusters
            .get(cluster_name)
            .ok_or_else(|| SchemaError::UnknownCluster(cluster_name.to_string()))?;
        let location = Interval::with_len(address, cluster.size())?;
        Ok(Self {
            name: name.to_string(),
            cluster: cluster_name.to_string(),
            location,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the cluster this instance places.
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// Absolute addresses covered.
    pub fn location(&self) -> Interval {
        self.location
    }
}
