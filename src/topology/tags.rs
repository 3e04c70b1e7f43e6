//! Marker tags on local mesh entities.
//!
//! [`MeshTags`] associates local entity indices of one topological dimension with
//! integer markers (boundary ids, material ids). Indices are kept sorted and
//! unique, and only entities owned by this rank are tagged.

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshError;
use crate::topology::local_mesh::LocalMesh;

/// Named marker assignment keyed by local entity index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshTags {
    name: String,
    dim: u8,
    indices: Vec<usize>,
    values: Vec<i32>,
}

impl MeshTags {
    /// Builds tags from `(index, marker)` pairs.
    ///
    /// Pairs are sorted by index; when an index repeats, the first pair wins.
    pub fn new(name: impl Into<String>, dim: u8, mut pairs: Vec<(usize, i32)>) -> Self {
        let name = name.into();
        pairs.sort_by_key(|&(idx, _)| idx);
        let mut indices = Vec::with_capacity(pairs.len());
        let mut values = Vec::with_capacity(pairs.len());
        for (idx, value) in pairs {
            if indices.last() == Some(&idx) {
                let kept = values[values.len() - 1];
                if kept != value {
                    log::warn!("{name}: entity {idx} tagged {kept} and {value}; keeping {kept}");
                }
                continue;
            }
            indices.push(idx);
            values.push(value);
        }
        Self {
            name,
            dim,
            indices,
            values,
        }
    }

    /// Tags the local entities matching foreign `entities`.
    ///
    /// `entities` holds `vertices_per_entity` **global** vertex indices per entity,
    /// in any order, and `markers` one value per entity. Entities with a vertex
    /// outside the local mesh, whose vertex set is not a local entity, or that this
    /// rank holds without owning, belong to another rank and are skipped.
    pub fn from_entities(
        mesh: &LocalMesh,
        dim: u8,
        name: impl Into<String>,
        entities: &[usize],
        vertices_per_entity: usize,
        markers: &[i32],
    ) -> Result<Self, MeshError> {
        if vertices_per_entity == 0 || entities.len() != markers.len() * vertices_per_entity {
            return Err(MeshError::InvalidConnectivity(format!(
                "{} entity vertices do not match {} markers of {vertices_per_entity} vertices",
                entities.len(),
                markers.len()
            )));
        }
        let lookup = |(vertices, &marker): (&[usize], &i32)| {
            mesh.find_entity(dim, vertices)
                .filter(|&idx| mesh.is_owned(dim, idx))
                .map(|idx| (idx, marker))
        };
        #[cfg(feature = "rayon")]
        let pairs: Vec<(usize, i32)> = entities
            .par_chunks(vertices_per_entity)
            .zip(markers.par_iter())
            .filter_map(lookup)
            .collect();
        #[cfg(not(feature = "rayon"))]
        let pairs: Vec<(usize, i32)> = entities
            .chunks(vertices_per_entity)
            .zip(markers.iter())
            .filter_map(lookup)
            .collect();

        let dropped = markers.len() - pairs.len();
        if dropped > 0 {
            log::debug!(
                "dim {dim}: {dropped} of {} tagged entities are not local",
                markers.len()
            );
        }
        Ok(Self::new(name, dim, pairs))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn dim(&self) -> u8 {
        self.dim
    }

    /// Tagged entity indices, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Marker of each entry of [`MeshTags::indices`].
    pub fn values(&self) -> &[i32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Marker of entity `index`, if tagged.
    pub fn get(&self, index: usize) -> Option<i32> {
        self.indices
            .binary_search(&index)
            .ok()
            .map(|pos| self.values[pos])
    }

    /// Entities tagged with `value`, ascending.
    pub fn find(&self, value: i32) -> Vec<usize> {
        self.iter()
            .filter_map(|(idx, v)| (v == value).then_some(idx))
            .collect()
    }

    /// Distinct markers, ascending.
    pub fn stratum_values(&self) -> Vec<i32> {
        let mut values = self.values.clone();
        values.sort_unstable();
        values.dedup();
        values
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, i32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }
}
