//! Foreign cell-type lookup table.
//!
//! Maps a mesh-file format's cell-type identifiers to the cell shape, the number of
//! nodes per cell and the node permutation into the local convention of
//! [`CellType`]. The table is plain data: supporting a new element kind means
//! inserting an entry, the importer's control flow does not change.
//!
//! Permutations are read as `local[i] = foreign[perm[i]]`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshError;
use crate::topology::cell_type::CellType;

/// Resolved descriptor of one foreign cell-type id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellInformation {
    pub type_id: u32,
    pub cell_type: CellType,
    pub dim: u8,
    pub num_nodes: usize,
}

/// One table row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellTypeEntry {
    cell_type: CellType,
    permutation: Vec<usize>,
}

impl CellTypeEntry {
    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn num_nodes(&self) -> usize {
        self.permutation.len()
    }

    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    /// Reorders one cell from the foreign convention into the local one.
    pub fn permute<T: Copy>(&self, foreign: &[T]) -> Vec<T> {
        self.permutation.iter().map(|&j| foreign[j]).collect()
    }

    /// Inverse of [`CellTypeEntry::permute`].
    pub fn inverse_permute<T: Copy + Default>(&self, local: &[T]) -> Vec<T> {
        let mut out = vec![T::default(); self.permutation.len()];
        for (i, &j) in self.permutation.iter().enumerate() {
            out[j] = local[i];
        }
        out
    }

    /// Permutes every cell of a flat connectivity array.
    pub fn permute_block(&self, foreign: &[usize]) -> Result<Vec<usize>, MeshError> {
        let n = self.num_nodes();
        if foreign.len() % n != 0 {
            return Err(MeshError::InvalidConnectivity(format!(
                "connectivity length {} is not a multiple of {n} nodes per cell",
                foreign.len()
            )));
        }
        let mut out = Vec::with_capacity(foreign.len());
        for cell in foreign.chunks_exact(n) {
            out.extend(self.permutation.iter().map(|&j| cell[j]));
        }
        Ok(out)
    }
}

/// Injectable lookup from foreign cell-type id to [`CellTypeEntry`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CellTypeTable {
    entries: BTreeMap<u32, CellTypeEntry>,
}

impl CellTypeTable {
    /// Table with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Gmsh element types, first and second order.
    pub fn gmsh() -> Self {
        let rows: [(u32, CellType, &[usize]); 12] = [
            (15, CellType::Vertex, &[0]),
            (1, CellType::Segment, &[0, 1]),
            (8, CellType::Segment, &[0, 1, 2]),
            (2, CellType::Triangle, &[0, 1, 2]),
            (9, CellType::Triangle, &[0, 1, 2, 4, 5, 3]),
            (3, CellType::Quadrilateral, &[0, 1, 3, 2]),
            (10, CellType::Quadrilateral, &[0, 1, 3, 2, 4, 7, 5, 6, 8]),
            (4, CellType::Tetrahedron, &[0, 1, 2, 3]),
            (11, CellType::Tetrahedron, &[0, 1, 2, 3, 8, 9, 5, 7, 6, 4]),
            (5, CellType::Hexahedron, &[0, 1, 3, 2, 4, 5, 7, 6]),
            (6, CellType::Prism, &[0, 1, 2, 3, 4, 5]),
            (7, CellType::Pyramid, &[0, 1, 3, 2, 4]),
        ];
        let entries = rows
            .into_iter()
            .map(|(id, cell_type, perm)| {
                (
                    id,
                    CellTypeEntry {
                        cell_type,
                        permutation: perm.to_vec(),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Adds or replaces the entry for `type_id`.
    ///
    /// `permutation` must be a bijection on `0..permutation.len()` and cover at
    /// least the corner vertices of `cell_type`.
    pub fn insert(
        &mut self,
        type_id: u32,
        cell_type: CellType,
        permutation: Vec<usize>,
    ) -> Result<(), MeshError> {
        let n = permutation.len();
        if n < cell_type.num_vertices() {
            return Err(MeshError::InvalidPermutation(format!(
                "{cell_type:?} needs at least {} nodes, permutation has {n}",
                cell_type.num_vertices()
            )));
        }
        let mut seen = vec![false; n];
        for &j in &permutation {
            if j >= n || std::mem::replace(&mut seen[j], true) {
                return Err(MeshError::InvalidPermutation(format!(
                    "{permutation:?} is not a bijection on 0..{n}"
                )));
            }
        }
        self.entries.insert(
            type_id,
            CellTypeEntry {
                cell_type,
                permutation,
            },
        );
        Ok(())
    }

    pub fn get(&self, type_id: u32) -> Option<&CellTypeEntry> {
        self.entries.get(&type_id)
    }

    /// Entry for `type_id` or [`MeshError::UnknownCellType`].
    pub fn entry(&self, type_id: u32) -> Result<&CellTypeEntry, MeshError> {
        self.get(type_id).ok_or(MeshError::UnknownCellType(type_id))
    }

    /// Resolves `(dimension, nodes per cell)` for `type_id`.
    pub fn resolve(&self, type_id: u32) -> Result<CellInformation, MeshError> {
        let entry = self.entry(type_id)?;
        Ok(CellInformation {
            type_id,
            cell_type: entry.cell_type,
            dim: entry.cell_type.dimension(),
            num_nodes: entry.num_nodes(),
        })
    }

    pub fn type_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gmsh_quad_becomes_tensor_ordered() {
        let table = CellTypeTable::gmsh();
        let quad = table.entry(3).unwrap();
        assert_eq!(quad.permute(&[10, 11, 12, 13]), vec![10, 11, 13, 12]);
    }

    #[test]
    fn tet10_edge_nodes_follow_opposite_edge_order() {
        // foreign edge nodes: 4:(0,1) 5:(1,2) 6:(0,2) 7:(0,3) 8:(2,3) 9:(1,3)
        let table = CellTypeTable::gmsh();
        let tet = table.entry(11).unwrap();
        let foreign = [0, 1, 2, 3, 401, 412, 402, 403, 423, 413];
        let local = tet.permute(&foreign);
        assert_eq!(&local[4..], &[423, 413, 412, 403, 402, 401]);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let table = CellTypeTable::gmsh();
        assert_eq!(table.resolve(99), Err(MeshError::UnknownCellType(99)));
    }

    #[test]
    fn insert_rejects_non_bijections() {
        let mut table = CellTypeTable::empty();
        assert!(table.insert(1, CellType::Segment, vec![0, 0]).is_err());
        assert!(table.insert(1, CellType::Triangle, vec![0, 1]).is_err());
        assert!(table.insert(1, CellType::Segment, vec![1, 2]).is_err());
        table.insert(1, CellType::Segment, vec![1, 0]).unwrap();
        assert_eq!(table.resolve(1).unwrap().num_nodes, 2);
    }

    #[test]
    fn permute_block_checks_length() {
        let table = CellTypeTable::gmsh();
        let tri = table.entry(2).unwrap();
        assert!(tri.permute_block(&[0, 1, 2, 3]).is_err());
        assert_eq!(tri.permute_block(&[0, 1, 2, 3, 4, 5]).unwrap().len(), 6);
    }
}
