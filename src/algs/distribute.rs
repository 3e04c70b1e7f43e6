//! Root-driven agreement on cell information.
//!
//! Rank `root` owns the foreign mesh as generated; it resolves the cell
//! information and broadcasts it, so every rank selects the same primary and
//! facet blocks. A failure on the root is broadcast too and every rank returns the
//! same error: the topology is all-or-nothing across ranks.
//!
//! The local restriction that follows needs no communication: each rank filters
//! the foreign blocks against its own [`NodeOwnership`].

use std::collections::BTreeMap;

use crate::algs::communicator::Communicator;
use crate::algs::wire::{
    self, KIND_CELL_INFO, KIND_ROOT_FAILED, KIND_UNKNOWN_CELL_TYPE, WireCellInfo,
};
use crate::geometry::entity::Point3;
use crate::io::ForeignTopologyBlock;
use crate::io::import::{ImportedMesh, Importer};
use crate::mesh_error::MeshError;
use crate::topology::cell_table::{CellInformation, CellTypeTable};
use crate::topology::ownership::NodeOwnership;

/// Resolves cell information on `root` and broadcasts it.
///
/// `blocks` is only read on the root; other ranks may pass `None`.
pub fn distribute_cell_information<C: Communicator>(
    comm: &C,
    root: usize,
    table: &CellTypeTable,
    blocks: Option<&BTreeMap<u32, ForeignTopologyBlock>>,
) -> Result<Vec<CellInformation>, MeshError> {
    let mut buf = Vec::new();
    if comm.is_root(root) {
        buf = match blocks {
            Some(blocks) => encode_resolution(table, blocks),
            None => {
                log::warn!("root rank {root} has no foreign mesh to distribute");
                wire::encode(KIND_ROOT_FAILED, &[])
            }
        };
    }
    comm.broadcast(root, &mut buf)?;

    let (hdr, records) = wire::decode(&buf)?;
    match hdr.kind() {
        KIND_CELL_INFO => records.iter().map(WireCellInfo::decode).collect(),
        KIND_UNKNOWN_CELL_TYPE => {
            let id = records.first().map(WireCellInfo::type_id).ok_or_else(|| {
                MeshError::Communication("unknown-cell-type message without id".into())
            })?;
            Err(MeshError::UnknownCellType(id))
        }
        KIND_ROOT_FAILED => Err(MeshError::Communication(format!(
            "root rank {root} could not resolve cell information"
        ))),
        other => Err(MeshError::Communication(format!(
            "unexpected message kind {other}"
        ))),
    }
}

fn encode_resolution(table: &CellTypeTable, blocks: &BTreeMap<u32, ForeignTopologyBlock>) -> Vec<u8> {
    let mut infos = Vec::with_capacity(blocks.len());
    for &id in blocks.keys() {
        match table.resolve(id) {
            Ok(info) => infos.push(info),
            Err(_) => {
                let marker = WireCellInfo {
                    type_id_le: id.to_le(),
                    cell_type_le: 0,
                    dim_le: 0,
                    num_nodes_le: 0,
                };
                return wire::encode(KIND_UNKNOWN_CELL_TYPE, &[marker]);
            }
        }
    }
    infos.sort_by_key(|info| (info.dim, info.type_id));
    let records: Vec<WireCellInfo> = infos.iter().map(WireCellInfo::of).collect();
    wire::encode(KIND_CELL_INFO, &records)
}

/// Collective import: agree on cell information from `root`, then restrict
/// `blocks` to this rank's `ownership`.
pub fn import_with_comm<C: Communicator>(
    comm: &C,
    root: usize,
    importer: &Importer,
    nodes: &[Point3],
    blocks: &BTreeMap<u32, ForeignTopologyBlock>,
    ownership: &NodeOwnership,
) -> Result<ImportedMesh, MeshError> {
    let infos = distribute_cell_information(comm, root, importer.table(), Some(blocks))?;
    log::debug!(
        "rank {}/{}: agreed on {} cell blocks",
        comm.rank(),
        comm.size(),
        infos.len()
    );
    importer.import_with_information(&infos, nodes, blocks, ownership)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::NoComm;

    #[test]
    fn serial_distribution_matches_local_resolution() {
        let mut blocks = BTreeMap::new();
        blocks.insert(4, ForeignTopologyBlock::default());
        blocks.insert(2, ForeignTopologyBlock::default());
        let table = CellTypeTable::gmsh();
        let infos = distribute_cell_information(&NoComm, 0, &table, Some(&blocks)).unwrap();
        let local = Importer::default().cell_information(&blocks).unwrap();
        assert_eq!(infos, local);
    }

    #[test]
    fn unknown_type_on_root_is_reported() {
        let mut blocks = BTreeMap::new();
        blocks.insert(4, ForeignTopologyBlock::default());
        blocks.insert(77, ForeignTopologyBlock::default());
        let err = distribute_cell_information(&NoComm, 0, &CellTypeTable::gmsh(), Some(&blocks))
            .unwrap_err();
        assert_eq!(err, MeshError::UnknownCellType(77));
    }
}
