//! Foreign mesh data and readers.
//!
//! A mesh generator hands over its result as node coordinates plus, per foreign
//! cell-type id, a block of connectivity and one marker per cell. That data is
//! consumed once by [`import::Importer`] and then dropped.

pub mod gmsh;
pub mod import;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::entity::Point3;

/// Connectivity and markers for one foreign cell type.
///
/// `connectivity` is flat, `num_nodes` node indices per cell in the foreign
/// ordering, and `markers` holds one value per cell.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignTopologyBlock {
    pub connectivity: Vec<usize>,
    pub markers: Vec<i32>,
}

impl ForeignTopologyBlock {
    pub fn new(connectivity: Vec<usize>, markers: Vec<i32>) -> Self {
        Self {
            connectivity,
            markers,
        }
    }

    pub fn num_cells(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// A mesh in the foreign numbering and ordering convention.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForeignMesh {
    pub nodes: Vec<Point3>,
    pub blocks: BTreeMap<u32, ForeignTopologyBlock>,
    /// Physical group names keyed by `(dimension, marker)`, when the source has them.
    pub physical_names: BTreeMap<(u8, i32), String>,
}

impl ForeignMesh {
    pub fn new(nodes: Vec<Point3>, blocks: BTreeMap<u32, ForeignTopologyBlock>) -> Self {
        Self {
            nodes,
            blocks,
            physical_names: BTreeMap::new(),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }
}
