//! Cell type metadata in the local (target) node-ordering convention.
//!
//! Reference vertex ordering:
//! - Simplices (segment, triangle, tetrahedron): vertices in increasing order; the
//!   facet `i` is the one opposite vertex `i`.
//! - Tensor-product cells (quadrilateral, hexahedron): lexicographic vertex order,
//!   `x` fastest, i.e. a quad is `[(0,0), (1,0), (0,1), (1,1)]`.
//! - Prism: bottom triangle `[0, 1, 2]`, top triangle `[3, 4, 5]`.
//! - Pyramid: tensor-ordered quad base `[0, 1, 2, 3]`, apex `4`.
//!
//! Higher-order nodes follow the vertices; facets are described by vertices only.

use serde::{Deserialize, Serialize};

/// Cell shapes supported by the importer.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum CellType {
    /// 0D vertex.
    #[default]
    Vertex,
    /// 1D segment/edge.
    Segment,
    /// 2D simplex (triangle).
    Triangle,
    /// 2D tensor-product cell (quad).
    Quadrilateral,
    /// 3D simplex (tet).
    Tetrahedron,
    /// 3D tensor-product cell (hex).
    Hexahedron,
    /// 3D wedge/prism.
    Prism,
    /// 3D pyramid.
    Pyramid,
}

const SEGMENT_FACETS: &[&[usize]] = &[&[1], &[0]];
const TRIANGLE_FACETS: &[&[usize]] = &[&[1, 2], &[0, 2], &[0, 1]];
const QUAD_FACETS: &[&[usize]] = &[&[0, 1], &[0, 2], &[1, 3], &[2, 3]];
const TET_FACETS: &[&[usize]] = &[&[1, 2, 3], &[0, 2, 3], &[0, 1, 3], &[0, 1, 2]];
const HEX_FACETS: &[&[usize]] = &[
    &[0, 1, 2, 3],
    &[0, 1, 4, 5],
    &[0, 2, 4, 6],
    &[1, 3, 5, 7],
    &[2, 3, 6, 7],
    &[4, 5, 6, 7],
];
const PRISM_FACETS: &[&[usize]] = &[
    &[0, 1, 2],
    &[0, 1, 3, 4],
    &[0, 2, 3, 5],
    &[1, 2, 4, 5],
    &[3, 4, 5],
];
const PYRAMID_FACETS: &[&[usize]] = &[
    &[0, 1, 2, 3],
    &[0, 1, 4],
    &[0, 2, 4],
    &[1, 3, 4],
    &[2, 3, 4],
];

impl CellType {
    /// Returns the topological dimension of the cell.
    pub fn dimension(self) -> u8 {
        match self {
            CellType::Vertex => 0,
            CellType::Segment => 1,
            CellType::Triangle | CellType::Quadrilateral => 2,
            CellType::Tetrahedron | CellType::Hexahedron | CellType::Prism | CellType::Pyramid => {
                3
            }
        }
    }

    /// Number of corner vertices.
    pub fn num_vertices(self) -> usize {
        match self {
            CellType::Vertex => 1,
            CellType::Segment => 2,
            CellType::Triangle => 3,
            CellType::Quadrilateral | CellType::Tetrahedron => 4,
            CellType::Pyramid => 5,
            CellType::Prism => 6,
            CellType::Hexahedron => 8,
        }
    }

    /// Local vertex indices of each facet (codimension-1 sub-entity).
    pub fn facets(self) -> &'static [&'static [usize]] {
        match self {
            CellType::Vertex => &[],
            CellType::Segment => SEGMENT_FACETS,
            CellType::Triangle => TRIANGLE_FACETS,
            CellType::Quadrilateral => QUAD_FACETS,
            CellType::Tetrahedron => TET_FACETS,
            CellType::Hexahedron => HEX_FACETS,
            CellType::Prism => PRISM_FACETS,
            CellType::Pyramid => PYRAMID_FACETS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facets_have_codimension_one_vertex_counts() {
        for ct in [
            CellType::Segment,
            CellType::Triangle,
            CellType::Quadrilateral,
            CellType::Tetrahedron,
            CellType::Hexahedron,
            CellType::Prism,
            CellType::Pyramid,
        ] {
            for facet in ct.facets() {
                assert!(facet.len() < ct.num_vertices());
                assert!(facet.iter().all(|&v| v < ct.num_vertices()));
            }
        }
        assert_eq!(CellType::Tetrahedron.facets().len(), 4);
        assert_eq!(CellType::Hexahedron.facets().len(), 6);
    }

    #[test]
    fn every_vertex_is_on_some_facet() {
        for ct in [CellType::Triangle, CellType::Hexahedron, CellType::Pyramid] {
            for v in 0..ct.num_vertices() {
                assert!(ct.facets().iter().any(|f| f.contains(&v)));
            }
        }
    }
}
