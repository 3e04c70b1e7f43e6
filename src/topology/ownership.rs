//! Ownership metadata for global mesh nodes.
//!
//! The [`NodeOwnership`] map records, for every node present on this rank, the
//! owning rank and whether the node is a ghost here. Owned and ghost nodes together
//! form the *local* node set the importer restricts foreign entities to; the owners
//! decide which rank owns each cell and facet (see [`LocalMesh`]). The assignment
//! itself comes from an external partitioner.
//!
//! [`LocalMesh`]: crate::topology::local_mesh::LocalMesh

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct OwnershipEntry {
    pub owner: usize,
    pub is_ghost: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeOwnership {
    rank: usize,
    entries: Vec<Option<OwnershipEntry>>,
}

impl NodeOwnership {
    /// Empty map for `rank`, sized for `num_nodes` global nodes.
    pub fn with_capacity(rank: usize, num_nodes: usize) -> Self {
        Self {
            rank,
            entries: vec![None; num_nodes],
        }
    }

    /// Every one of `num_nodes` nodes owned by rank 0.
    pub fn serial(num_nodes: usize) -> Self {
        Self {
            rank: 0,
            entries: vec![
                Some(OwnershipEntry {
                    owner: 0,
                    is_ghost: false,
                });
                num_nodes
            ],
        }
    }

    /// Rank this map describes.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Insert or update an ownership entry for `node`.
    pub fn set(&mut self, node: usize, owner: usize, is_ghost: bool) {
        if node >= self.entries.len() {
            self.entries.resize(node + 1, None);
        }
        self.entries[node] = Some(OwnershipEntry { owner, is_ghost });
    }

    /// Insert or update an entry; the node is a ghost unless `owner` is this rank.
    pub fn set_from_owner(&mut self, node: usize, owner: usize) {
        let is_ghost = owner != self.rank;
        self.set(node, owner, is_ghost);
    }

    pub fn entry(&self, node: usize) -> Option<OwnershipEntry> {
        self.entries.get(node).copied().flatten()
    }

    /// Retrieve the owning rank or return an error if missing.
    pub fn owner_or_err(&self, node: usize) -> Result<usize, MeshError> {
        self.entry(node)
            .map(|entry| entry.owner)
            .ok_or(MeshError::MissingOwnership(node))
    }

    /// Whether `node` is present on this rank (owned or ghost).
    pub fn is_local(&self, node: usize) -> bool {
        self.entry(node).is_some()
    }

    /// Build an ownership map from a local node set and per-node owners.
    pub fn from_local_set<I>(local_set: I, owners: &[usize], my_rank: usize) -> Result<Self, MeshError>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut ownership = Self::with_capacity(my_rank, owners.len());
        for node in local_set {
            let owner = owners
                .get(node)
                .copied()
                .ok_or(MeshError::PartitionIndexOutOfBounds(node))?;
            ownership.set_from_owner(node, owner);
        }
        Ok(ownership)
    }

    /// Every node in `nodes` owned by `rank` itself.
    pub fn owned_by_rank<I>(rank: usize, nodes: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut ownership = Self::with_capacity(rank, 0);
        for node in nodes {
            ownership.set(node, rank, false);
        }
        ownership
    }
}
