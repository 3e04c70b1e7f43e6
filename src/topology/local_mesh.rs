//! Locally owned mesh built from the primary cell block.
//!
//! A [`LocalMesh`] holds the cells whose nodes are all present on this rank, the
//! coordinates of the nodes those cells use, and the connectivity in the local
//! node-ordering convention of [`CellType`]. Local nodes and cells are numbered in
//! ascending global order, so two ranks with the same input agree on the numbering
//! of any entity they share.
//!
//! Sub-entities are identified by their **unordered** vertex set: facets are
//! enumerated once from the reference facets of every local cell, and lookups take
//! a vertex set in any order.
//!
//! A rank may hold cells it does not own (all of their nodes present, some as
//! ghosts). Every cell and facet is owned by the owner of its lowest global vertex,
//! so ranks holding the same entity agree on its owner without communicating. The
//! owning rank must hold the entity, which holds whenever each rank keeps every
//! cell touching a node it owns.

use std::collections::HashMap;

use crate::geometry::entity::Point3;
use crate::mesh_error::MeshError;
use crate::topology::cell_type::CellType;
use crate::topology::ownership::NodeOwnership;

/// Immutable local mesh: geometry plus primary-cell topology.
#[derive(Clone, Debug)]
pub struct LocalMesh {
    name: String,
    cell_type: CellType,
    rank: usize,
    gdim: usize,
    nodes_per_cell: usize,
    coordinates: Vec<f64>,
    connectivity: Vec<usize>,
    global_nodes: Vec<usize>,
    global_cells: Vec<usize>,
    node_owners: Vec<usize>,
    cell_owners: Vec<usize>,
    cell_lookup: HashMap<Vec<usize>, usize>,
    facets: Vec<Vec<usize>>,
    facet_owners: Vec<usize>,
    facet_lookup: HashMap<Vec<usize>, usize>,
    facet_cells: Vec<u32>,
}

impl LocalMesh {
    /// Builds the local mesh.
    ///
    /// `connectivity` is the primary block already permuted into the local
    /// convention, indexing the global `nodes` array. Cells with any node missing
    /// from `ownership` are left out; nodes no local cell uses are dropped.
    pub fn new(
        name: impl Into<String>,
        cell_type: CellType,
        nodes_per_cell: usize,
        nodes: &[Point3],
        connectivity: &[usize],
        ownership: &NodeOwnership,
        gdim: usize,
    ) -> Result<Self, MeshError> {
        if !(1..=3).contains(&gdim) {
            return Err(MeshError::Configuration(format!(
                "geometric dimension must be 1, 2 or 3, got {gdim}"
            )));
        }
        if nodes_per_cell < cell_type.num_vertices() {
            return Err(MeshError::InvalidConnectivity(format!(
                "{cell_type:?} needs {} nodes per cell, got {nodes_per_cell}",
                cell_type.num_vertices()
            )));
        }
        if connectivity.len() % nodes_per_cell != 0 {
            return Err(MeshError::InvalidConnectivity(format!(
                "connectivity length {} is not a multiple of {nodes_per_cell}",
                connectivity.len()
            )));
        }
        if let Some(&bad) = connectivity.iter().find(|&&n| n >= nodes.len()) {
            return Err(MeshError::InvalidConnectivity(format!(
                "node index {bad} out of range for {} nodes",
                nodes.len()
            )));
        }

        let mut global_cells = Vec::new();
        let mut used = vec![false; nodes.len()];
        for (c, cell) in connectivity.chunks_exact(nodes_per_cell).enumerate() {
            if cell.iter().all(|&n| ownership.is_local(n)) {
                global_cells.push(c);
                for &n in cell {
                    used[n] = true;
                }
            }
        }
        let global_nodes: Vec<usize> = used
            .iter()
            .enumerate()
            .filter_map(|(n, &u)| u.then_some(n))
            .collect();

        let node_owners = global_nodes
            .iter()
            .map(|&n| ownership.owner_or_err(n))
            .collect::<Result<Vec<_>, _>>()?;

        let mut coordinates = Vec::with_capacity(global_nodes.len() * gdim);
        for &n in &global_nodes {
            coordinates.extend_from_slice(&nodes[n][..gdim]);
        }

        let mut mesh = Self {
            name: name.into(),
            cell_type,
            rank: ownership.rank(),
            gdim,
            nodes_per_cell,
            coordinates,
            connectivity: Vec::with_capacity(global_cells.len() * nodes_per_cell),
            global_nodes,
            global_cells,
            node_owners,
            cell_owners: Vec::new(),
            cell_lookup: HashMap::new(),
            facets: Vec::new(),
            facet_owners: Vec::new(),
            facet_lookup: HashMap::new(),
            facet_cells: Vec::new(),
        };
        for &c in &mesh.global_cells {
            let cell = &connectivity[c * nodes_per_cell..(c + 1) * nodes_per_cell];
            for &n in cell {
                // every node of a local cell was marked used above
                let local = mesh.global_nodes.binary_search(&n).map_err(|_| {
                    MeshError::InvalidConnectivity(format!("node {n} missing from local map"))
                })?;
                mesh.connectivity.push(local);
            }
        }
        mesh.build_topology()?;
        Ok(mesh)
    }

    fn build_topology(&mut self) -> Result<(), MeshError> {
        let nv = self.cell_type.num_vertices();
        for c in 0..self.num_cells() {
            let cell = self.cell_nodes(c).to_vec();
            let mut key = cell[..nv].to_vec();
            key.sort_unstable();
            // local order follows global order, so key[0] is the lowest global vertex
            self.cell_owners.push(self.node_owners[key[0]]);
            if let Some(prev) = self.cell_lookup.insert(key, c) {
                return Err(MeshError::InvalidConnectivity(format!(
                    "cells {} and {} share the same vertex set",
                    self.global_cells[prev], self.global_cells[c]
                )));
            }
            for facet in self.cell_type.facets() {
                let mut key: Vec<usize> = facet.iter().map(|&v| cell[v]).collect();
                key.sort_unstable();
                let next = self.facets.len();
                let idx = *self.facet_lookup.entry(key.clone()).or_insert(next);
                if idx == next {
                    self.facet_owners.push(self.node_owners[key[0]]);
                    self.facets.push(key);
                    self.facet_cells.push(0);
                }
                self.facet_cells[idx] += 1;
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    /// Topological dimension.
    pub fn dim(&self) -> u8 {
        self.cell_type.dimension()
    }

    /// Rank this mesh was built for.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Geometric dimension of the stored coordinates.
    pub fn gdim(&self) -> usize {
        self.gdim
    }

    pub fn nodes_per_cell(&self) -> usize {
        self.nodes_per_cell
    }

    pub fn num_nodes(&self) -> usize {
        self.global_nodes.len()
    }

    pub fn num_cells(&self) -> usize {
        self.global_cells.len()
    }

    pub fn num_facets(&self) -> usize {
        self.facets.len()
    }

    /// Flat coordinates, `gdim` values per local node.
    pub fn coordinates(&self) -> &[f64] {
        &self.coordinates
    }

    pub fn node_coordinates(&self, node: usize) -> &[f64] {
        &self.coordinates[node * self.gdim..(node + 1) * self.gdim]
    }

    /// Flat local connectivity, `nodes_per_cell` entries per cell.
    pub fn connectivity(&self) -> &[usize] {
        &self.connectivity
    }

    pub fn cell_nodes(&self, cell: usize) -> &[usize] {
        &self.connectivity[cell * self.nodes_per_cell..(cell + 1) * self.nodes_per_cell]
    }

    /// Global index of each local node.
    pub fn global_nodes(&self) -> &[usize] {
        &self.global_nodes
    }

    /// Index into the foreign primary block of each local cell.
    pub fn global_cells(&self) -> &[usize] {
        &self.global_cells
    }

    pub fn local_node(&self, global: usize) -> Option<usize> {
        self.global_nodes.binary_search(&global).ok()
    }

    pub fn node_owner(&self, node: usize) -> usize {
        self.node_owners[node]
    }

    pub fn is_ghost_node(&self, node: usize) -> bool {
        self.node_owners[node] != self.rank
    }

    pub fn cell_owner(&self, cell: usize) -> usize {
        self.cell_owners[cell]
    }

    pub fn facet_owner(&self, facet: usize) -> usize {
        self.facet_owners[facet]
    }

    /// Whether this rank owns entity `index` of dimension `dim`.
    ///
    /// Only cells and facets have owners; other dimensions are never owned.
    pub fn is_owned(&self, dim: u8, index: usize) -> bool {
        let owners = if dim == self.dim() {
            &self.cell_owners
        } else if dim + 1 == self.dim() {
            &self.facet_owners
        } else {
            return false;
        };
        owners.get(index) == Some(&self.rank)
    }

    /// Cells owned by this rank, ascending.
    pub fn owned_cells(&self) -> Vec<usize> {
        (0..self.num_cells())
            .filter(|&c| self.cell_owners[c] == self.rank)
            .collect()
    }

    /// Sorted local vertices of `facet`.
    pub fn facet_vertices(&self, facet: usize) -> &[usize] {
        &self.facets[facet]
    }

    /// Number of local cells incident to `facet`.
    pub fn facet_cell_count(&self, facet: usize) -> usize {
        self.facet_cells[facet] as usize
    }

    /// Facets with a single incident local cell, ascending.
    ///
    /// On a partitioned mesh this includes facets on the partition interface.
    pub fn exterior_facets(&self) -> Vec<usize> {
        (0..self.num_facets())
            .filter(|&f| self.facet_cells[f] == 1)
            .collect()
    }

    /// Local index of the entity of dimension `dim` with the given local vertices.
    ///
    /// Only cells (`dim == self.dim()`) and facets (`dim == self.dim() - 1`) are
    /// indexed; the vertex order is irrelevant.
    pub fn entity_index(&self, dim: u8, vertices: &[usize]) -> Option<usize> {
        let mut key = vertices.to_vec();
        key.sort_unstable();
        if dim == self.dim() {
            self.cell_lookup.get(&key).copied()
        } else if dim + 1 == self.dim() {
            self.facet_lookup.get(&key).copied()
        } else {
            None
        }
    }

    /// Like [`LocalMesh::entity_index`] but with global node indices; `None` when
    /// any node is not local.
    pub fn find_entity(&self, dim: u8, global_vertices: &[usize]) -> Option<usize> {
        let local: Option<Vec<usize>> = global_vertices
            .iter()
            .map(|&g| self.local_node(g))
            .collect();
        self.entity_index(dim, &local?)
    }
}
