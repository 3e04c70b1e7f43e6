//! MeshError: unified error type for tagged-mesh public APIs
//!
//! Every variant is fatal at the point it is raised: the inputs are malformed or
//! misconfigured, so there is nothing to retry. Off-rank facets that do not map to a
//! local entity are *not* errors and never surface here.

use thiserror::Error;

/// Unified error type for classification, sizing and import.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    /// Invalid sizing-field or pipeline configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A surface matched no predicate and the catch-all category is disabled.
    #[error("surface ({dim}, {tag}) matches no classification target")]
    ClassificationAmbiguity { dim: u8, tag: i32 },
    /// Foreign cell-type id missing from the lookup table.
    #[error("unknown cell type id {0}")]
    UnknownCellType(u32),
    /// Requested target dimension differs from the highest dimension present.
    #[error("dimension mismatch: requested {requested}, highest block has dimension {found}")]
    DimensionMismatch { requested: u8, found: u8 },
    /// No cell blocks were supplied.
    #[error("foreign mesh contains no cell blocks")]
    EmptyMesh,
    /// An entity referenced by a field or group does not exist in the model.
    #[error("entity ({dim}, {tag}) not found in model")]
    MissingEntity { dim: u8, tag: i32 },
    /// An entity was registered in two physical groups of the same dimension.
    #[error("entity ({dim}, {tag}) already belongs to a physical group")]
    DuplicateMembership { dim: u8, tag: i32 },
    /// Geometry parameters do not describe a valid model.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// Connectivity or marker arrays are inconsistent.
    #[error("invalid connectivity: {0}")]
    InvalidConnectivity(String),
    /// A node permutation is not a bijection on its slots.
    #[error("invalid permutation: {0}")]
    InvalidPermutation(String),
    /// Mesh file parse failure.
    #[error("mesh parse error: {0}")]
    MeshIoParse(String),
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(String),
    /// Malformed broadcast payload.
    #[error("communication error: {0}")]
    Communication(String),
    /// Ownership lookup for a node that has no entry.
    #[error("missing ownership entry for node {0}")]
    MissingOwnership(usize),
    /// Owner array too short for a referenced node.
    #[error("partition index {0} out of bounds")]
    PartitionIndexOutOfBounds(usize),
}

impl From<std::io::Error> for MeshError {
    fn from(err: std::io::Error) -> Self {
        MeshError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MeshError {
    fn from(err: serde_json::Error) -> Self {
        MeshError::Configuration(err.to_string())
    }
}
