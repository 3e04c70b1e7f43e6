//! Fixed, versioned, little-endian wire types for broadcasting cell information.
//!
//! A message is one [`WireHdr`] followed by `count` [`WireCellInfo`] records.
//! Records are read with `pod_read_unaligned`, so receive buffers need no
//! particular alignment.

use bytemuck::{Pod, Zeroable};
use std::mem::size_of;

use crate::mesh_error::MeshError;
use crate::topology::cell_table::CellInformation;
use crate::topology::cell_type::CellType;

/// Bump when the layout or semantics change in incompatible ways.
pub const WIRE_VERSION: u16 = 1;

/// Payload carries resolved cell information.
pub const KIND_CELL_INFO: u16 = 1;
/// Root hit an unknown cell type; one record carries the offending id.
pub const KIND_UNKNOWN_CELL_TYPE: u16 = 2;
/// Root failed for another reason; no records.
pub const KIND_ROOT_FAILED: u16 = 3;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireHdr {
    pub version_le: u16,
    pub kind_le: u16,
    pub count_le: u32,
}

impl WireHdr {
    pub fn new(kind: u16, count: usize) -> Self {
        Self {
            version_le: WIRE_VERSION.to_le(),
            kind_le: kind.to_le(),
            count_le: (count as u32).to_le(),
        }
    }
    pub fn kind(&self) -> u16 {
        u16::from_le(self.kind_le)
    }
    pub fn version(&self) -> u16 {
        u16::from_le(self.version_le)
    }
    pub fn count(&self) -> usize {
        u32::from_le(self.count_le) as usize
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireCellInfo {
    pub type_id_le: u32,
    pub cell_type_le: u32,
    pub dim_le: u32,
    pub num_nodes_le: u32,
}

const CELL_TYPES: [CellType; 8] = [
    CellType::Vertex,
    CellType::Segment,
    CellType::Triangle,
    CellType::Quadrilateral,
    CellType::Tetrahedron,
    CellType::Hexahedron,
    CellType::Prism,
    CellType::Pyramid,
];

fn cell_type_code(ct: CellType) -> u32 {
    CELL_TYPES.iter().position(|&c| c == ct).unwrap_or(0) as u32
}

impl WireCellInfo {
    pub fn of(info: &CellInformation) -> Self {
        Self {
            type_id_le: info.type_id.to_le(),
            cell_type_le: cell_type_code(info.cell_type).to_le(),
            dim_le: u32::from(info.dim).to_le(),
            num_nodes_le: (info.num_nodes as u32).to_le(),
        }
    }

    pub fn type_id(&self) -> u32 {
        u32::from_le(self.type_id_le)
    }

    pub fn decode(&self) -> Result<CellInformation, MeshError> {
        let code = u32::from_le(self.cell_type_le) as usize;
        let cell_type = *CELL_TYPES
            .get(code)
            .ok_or_else(|| MeshError::Communication(format!("bad cell type code {code}")))?;
        let dim = u32::from_le(self.dim_le);
        let num_nodes = u32::from_le(self.num_nodes_le) as usize;
        if dim != u32::from(cell_type.dimension()) || num_nodes < cell_type.num_vertices() {
            return Err(MeshError::Communication(format!(
                "type {}: {cell_type:?} cannot have dimension {dim} and {num_nodes} nodes",
                self.type_id()
            )));
        }
        Ok(CellInformation {
            type_id: self.type_id(),
            cell_type,
            dim: dim as u8,
            num_nodes,
        })
    }
}

/// Serializes a header plus records.
pub fn encode(kind: u16, records: &[WireCellInfo]) -> Vec<u8> {
    let hdr = WireHdr::new(kind, records.len());
    let mut out = Vec::with_capacity(size_of::<WireHdr>() + size_of_val(records));
    out.extend_from_slice(bytemuck::bytes_of(&hdr));
    out.extend_from_slice(bytemuck::cast_slice(records));
    out
}

/// Parses a header plus records, checking version and exact length.
pub fn decode(buf: &[u8]) -> Result<(WireHdr, Vec<WireCellInfo>), MeshError> {
    let hdr_len = size_of::<WireHdr>();
    if buf.len() < hdr_len {
        return Err(MeshError::Communication(format!(
            "message of {} bytes is shorter than its header",
            buf.len()
        )));
    }
    let hdr: WireHdr = bytemuck::pod_read_unaligned(&buf[..hdr_len]);
    if hdr.version() != WIRE_VERSION {
        return Err(MeshError::Communication(format!(
            "wire version {} (expected {WIRE_VERSION})",
            hdr.version()
        )));
    }
    let rec_len = size_of::<WireCellInfo>();
    let expected = hdr_len + hdr.count() * rec_len;
    if buf.len() != expected {
        return Err(MeshError::Communication(format!(
            "expected {expected} bytes, got {}",
            buf.len()
        )));
    }
    let records = buf[hdr_len..]
        .chunks_exact(rec_len)
        .map(bytemuck::pod_read_unaligned)
        .collect();
    Ok((hdr, records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_records_have_stable_sizes() {
        assert_eq!(size_of::<WireHdr>(), 8);
        assert_eq!(size_of::<WireCellInfo>(), 16);
    }

    #[test]
    fn truncated_messages_are_rejected() {
        let info = CellInformation {
            type_id: 4,
            cell_type: CellType::Tetrahedron,
            dim: 3,
            num_nodes: 4,
        };
        let buf = encode(KIND_CELL_INFO, &[WireCellInfo::of(&info)]);
        assert!(decode(&buf[..buf.len() - 1]).is_err());
        let (hdr, recs) = decode(&buf).unwrap();
        assert_eq!(hdr.kind(), KIND_CELL_INFO);
        assert_eq!(recs[0].decode().unwrap(), info);
    }

    #[test]
    fn inconsistent_records_are_rejected() {
        let tri = CellInformation {
            type_id: 2,
            cell_type: CellType::Triangle,
            dim: 2,
            num_nodes: 3,
        };
        let short = WireCellInfo::of(&CellInformation { num_nodes: 1, ..tri });
        assert!(matches!(short.decode(), Err(MeshError::Communication(_))));
        let flat = WireCellInfo::of(&CellInformation { dim: 3, ..tri });
        assert!(matches!(flat.decode(), Err(MeshError::Communication(_))));
        assert_eq!(WireCellInfo::of(&tri).decode().unwrap(), tri);
    }
}
