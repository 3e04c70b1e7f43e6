//! Foreign mesh importer.
//!
//! Turns a [`ForeignMesh`](crate::io::ForeignMesh)-style input into a
//! [`LocalMesh`] plus cell and facet [`MeshTags`]:
//!
//! 1. resolve every block's cell-type id through the [`CellTypeTable`];
//! 2. pick the highest-dimensional block as primary, and every block one
//!    dimension lower as facet blocks;
//! 3. permute the primary connectivity into the local convention and build the
//!    local mesh restricted to locally present nodes;
//! 4. match primary cells and foreign facets to local entities by vertex set,
//!    dropping those owned by other ranks.
//!
//! Any error aborts the import; no partially built mesh is returned.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::entity::Point3;
use crate::io::ForeignTopologyBlock;
use crate::mesh_error::MeshError;
use crate::topology::cell_table::{CellInformation, CellTypeEntry, CellTypeTable};
use crate::topology::local_mesh::LocalMesh;
use crate::topology::ownership::NodeOwnership;
use crate::topology::tags::MeshTags;

/// Options controlling an import.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Expected topological dimension of the primary block.
    pub target_dim: Option<u8>,
    /// Number of coordinate components kept per node.
    pub gdim: usize,
    /// Mesh name; tags are named `<name>_cells` and `<name>_facets`.
    pub mesh_name: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            target_dim: None,
            gdim: 3,
            mesh_name: "mesh".to_string(),
        }
    }
}

/// Primary and facet blocks chosen from the resolved cell information.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockSelection {
    pub primary: CellInformation,
    pub facets: Vec<CellInformation>,
}

/// Result of an import: the local mesh and its two tag sets.
#[derive(Clone, Debug)]
pub struct ImportedMesh {
    pub mesh: LocalMesh,
    pub cell_tags: MeshTags,
    pub facet_tags: MeshTags,
}

/// Converts foreign blocks into a locally consistent tagged mesh.
#[derive(Clone, Debug)]
pub struct Importer {
    table: CellTypeTable,
    options: ImportOptions,
}

impl Default for Importer {
    fn default() -> Self {
        Self::new(CellTypeTable::gmsh(), ImportOptions::default())
    }
}

impl Importer {
    pub fn new(table: CellTypeTable, options: ImportOptions) -> Self {
        Self { table, options }
    }

    pub fn table(&self) -> &CellTypeTable {
        &self.table
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Resolves every present block, sorted by ascending dimension then type id.
    pub fn cell_information(
        &self,
        blocks: &BTreeMap<u32, ForeignTopologyBlock>,
    ) -> Result<Vec<CellInformation>, MeshError> {
        let mut infos = blocks
            .keys()
            .map(|&id| self.table.resolve(id))
            .collect::<Result<Vec<_>, _>>()?;
        infos.sort_by_key(|info| (info.dim, info.type_id));
        Ok(infos)
    }

    /// Chooses the primary block (highest dimension) and the facet blocks.
    pub fn select(&self, infos: &[CellInformation]) -> Result<BlockSelection, MeshError> {
        let top = infos.iter().map(|i| i.dim).max().ok_or(MeshError::EmptyMesh)?;
        if let Some(requested) = self.options.target_dim {
            if requested != top {
                return Err(MeshError::DimensionMismatch {
                    requested,
                    found: top,
                });
            }
        }
        let mut primaries = infos.iter().filter(|i| i.dim == top);
        let primary = *primaries.next().ok_or(MeshError::EmptyMesh)?;
        if let Some(other) = primaries.next() {
            return Err(MeshError::Configuration(format!(
                "mixed primary cell types {} and {} in dimension {top}",
                primary.type_id, other.type_id
            )));
        }
        let facets = infos
            .iter()
            .filter(|i| top > 0 && i.dim == top - 1)
            .copied()
            .collect();
        Ok(BlockSelection { primary, facets })
    }

    /// Serial or distributed import on one rank.
    ///
    /// `ownership` lists the global nodes present on this rank; use
    /// [`NodeOwnership::serial`] for a single process.
    pub fn import(
        &self,
        nodes: &[Point3],
        blocks: &BTreeMap<u32, ForeignTopologyBlock>,
        ownership: &NodeOwnership,
    ) -> Result<ImportedMesh, MeshError> {
        let infos = self.cell_information(blocks)?;
        self.import_with_information(&infos, nodes, blocks, ownership)
    }

    /// Import using cell information agreed on beforehand (for example broadcast
    /// from a root rank). Blocks named in `infos` but absent here are empty.
    pub fn import_with_information(
        &self,
        infos: &[CellInformation],
        nodes: &[Point3],
        blocks: &BTreeMap<u32, ForeignTopologyBlock>,
        ownership: &NodeOwnership,
    ) -> Result<ImportedMesh, MeshError> {
        let selection = self.select(infos)?;
        let empty = ForeignTopologyBlock::default();
        let block_of = |type_id: u32| blocks.get(&type_id).unwrap_or(&empty);

        let primary = selection.primary;
        let primary_block = block_of(primary.type_id);
        let entry = self.agreed_entry(&primary)?;
        check_block(&primary, primary_block, nodes.len())?;
        let connectivity = entry.permute_block(&primary_block.connectivity)?;

        let name = &self.options.mesh_name;
        let mesh = LocalMesh::new(
            name.clone(),
            primary.cell_type,
            primary.num_nodes,
            nodes,
            &connectivity,
            ownership,
            self.options.gdim,
        )?;

        let cell_tags = MeshTags::from_entities(
            &mesh,
            primary.dim,
            format!("{name}_cells"),
            &vertex_tuples(&connectivity, primary.num_nodes, primary.cell_type.num_vertices()),
            primary.cell_type.num_vertices(),
            &primary_block.markers,
        )?;

        let facet_dim = primary.dim.saturating_sub(1);
        let mut facet_pairs = Vec::new();
        for info in &selection.facets {
            let block = block_of(info.type_id);
            let entry = self.agreed_entry(info)?;
            check_block(info, block, nodes.len())?;
            let permuted = entry.permute_block(&block.connectivity)?;
            let nv = info.cell_type.num_vertices();
            let tags = MeshTags::from_entities(
                &mesh,
                facet_dim,
                "",
                &vertex_tuples(&permuted, info.num_nodes, nv),
                nv,
                &block.markers,
            )?;
            facet_pairs.extend(tags.iter());
        }
        let facet_tags = MeshTags::new(format!("{name}_facets"), facet_dim, facet_pairs);

        log::info!(
            "imported `{name}`: {} cells, {} nodes, {} cell tags, {} facet tags",
            mesh.num_cells(),
            mesh.num_nodes(),
            cell_tags.len(),
            facet_tags.len()
        );
        Ok(ImportedMesh {
            mesh,
            cell_tags,
            facet_tags,
        })
    }

    /// Local table entry for `info`; received information must describe the
    /// same cell as this rank's table.
    fn agreed_entry(&self, info: &CellInformation) -> Result<&CellTypeEntry, MeshError> {
        let entry = self.table.entry(info.type_id)?;
        if entry.cell_type() != info.cell_type
            || entry.num_nodes() != info.num_nodes
            || info.dim != info.cell_type.dimension()
        {
            return Err(MeshError::Communication(format!(
                "cell type {}: received {:?}/{} nodes/dim {}, local table has {:?}/{} nodes",
                info.type_id,
                info.cell_type,
                info.num_nodes,
                info.dim,
                entry.cell_type(),
                entry.num_nodes()
            )));
        }
        Ok(entry)
    }
}

/// Serial import with the Gmsh cell table; every node is local.
pub fn import(
    nodes: &[Point3],
    blocks: &BTreeMap<u32, ForeignTopologyBlock>,
    target_dim: Option<u8>,
) -> Result<ImportedMesh, MeshError> {
    let importer = Importer::new(
        CellTypeTable::gmsh(),
        ImportOptions {
            target_dim,
            ..ImportOptions::default()
        },
    );
    importer.import(nodes, blocks, &NodeOwnership::serial(nodes.len()))
}

fn check_block(
    info: &CellInformation,
    block: &ForeignTopologyBlock,
    num_nodes: usize,
) -> Result<(), MeshError> {
    if block.connectivity.len() != block.markers.len() * info.num_nodes {
        return Err(MeshError::InvalidConnectivity(format!(
            "cell type {}: {} connectivity entries for {} markers of {} nodes",
            info.type_id,
            block.connectivity.len(),
            block.markers.len(),
            info.num_nodes
        )));
    }
    if let Some(&bad) = block.connectivity.iter().find(|&&n| n >= num_nodes) {
        return Err(MeshError::InvalidConnectivity(format!(
            "cell type {}: node index {bad} out of range for {num_nodes} nodes",
            info.type_id
        )));
    }
    Ok(())
}

/// Corner vertices (the leading `nv` slots) of every cell in local ordering.
fn vertex_tuples(connectivity: &[usize], num_nodes: usize, nv: usize) -> Vec<usize> {
    connectivity
        .chunks_exact(num_nodes)
        .flat_map(|cell| cell[..nv].iter().copied())
        .collect()
}
