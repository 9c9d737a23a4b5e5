//! Dense group numbering for earthquakes and stations.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::config::GroupOrdering;
use crate::error::{Error, Result};

/// Mapping between records and the groups (earthquakes or stations) they belong to.
///
/// `keys[g]` is the raw key of group `g` and `inverse[i]` is the 0-based group
/// of record `i`. Group numbers are dense in `[0, n_groups)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupIndex<K> {
    keys: Vec<K>,
    inverse: Vec<usize>,
}

impl<K: Copy + Eq + Hash + Ord> GroupIndex<K> {
    /// Number the distinct keys of a per-record key column.
    ///
    /// With [`GroupOrdering::FirstAppearance`] groups are numbered in the order
    /// their key first occurs; with [`GroupOrdering::Sorted`] in ascending key
    /// order. Empty input yields zero groups.
    pub fn build(record_keys: &[K], ordering: GroupOrdering) -> Self {
        let keys: Vec<K> = match ordering {
            GroupOrdering::FirstAppearance => {
                let mut seen = HashSet::with_capacity(record_keys.len());
                let mut keys = Vec::new();
                for &k in record_keys {
                    if seen.insert(k) {
                        keys.push(k);
                    }
                }
                keys
            }
            GroupOrdering::Sorted => {
                let mut keys = record_keys.to_vec();
                keys.sort_unstable();
                keys.dedup();
                keys
            }
        };

        let positions: HashMap<K, usize> = keys.iter().enumerate().map(|(g, &k)| (k, g)).collect();
        // Every record key was inserted above, so the lookup always succeeds.
        let inverse = record_keys.iter().map(|k| positions[k]).collect();

        Self { keys, inverse }
    }
}

impl<K> GroupIndex<K> {
    /// Number of distinct groups.
    pub fn n_groups(&self) -> usize {
        self.keys.len()
    }

    /// Number of records indexed.
    pub fn n_records(&self) -> usize {
        self.inverse.len()
    }

    /// Group keys ordered by group number.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// 0-based group of every record.
    pub fn inverse(&self) -> &[usize] {
        &self.inverse
    }

    /// 1-based group of every record, as the sampler expects.
    pub fn one_based(&self) -> Vec<usize> {
        self.inverse.iter().map(|g| g + 1).collect()
    }

    /// Copy a per-group value to every record of the group, in record order.
    ///
    /// Fails unless there is exactly one value per group.
    pub fn broadcast<T: Clone>(&self, per_group: &[T]) -> Result<Vec<T>> {
        if per_group.len() != self.keys.len() {
            return Err(Error::ShapeMismatch {
                what: "per-group values vs groups".to_string(),
                expected: self.keys.len(),
                actual: per_group.len(),
            });
        }
        Ok(self.inverse.iter().map(|&g| per_group[g].clone()).collect())
    }
}
