#![cfg_attr(docsrs, feature(doc_cfg))]
//! # tagged-mesh
//!
//! tagged-mesh prepares a tagged tetrahedral mesh of a flow channel with a
//! cylindrical obstacle and brings it into a locally numbered, per-rank mesh with
//! cell and facet tags.
//!
//! ## Features
//! - Analytic channel geometry with physical groups for fluid, inlet, outlet, walls and obstacle
//! - First-match-wins boundary classification with tolerance-based predicates
//! - Composable distance, threshold and minimum sizing fields
//! - Gmsh `.msh` 2.2 reading and an injectable foreign-to-local cell table
//! - Ownership-aware import with facet remapping, over serial, threaded or MPI ranks
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! tagged-mesh = "0.3"
//! # Optional features:
//! # features = ["mpi-support", "rayon"]
//! ```
//!
//! ```no_run
//! use tagged_mesh::prelude::*;
//!
//! let config = PipelineConfig::default();
//! let out = run_pipeline(&config, &MshFileGenerator::new("channel.msh"), None)?;
//! println!("{} local cells", out.imported.mesh.num_cells());
//! # Ok::<(), MeshError>(())
//! ```

pub mod algs;
pub mod config;
pub mod geometry;
pub mod io;
pub mod mesh_error;
pub mod pipeline;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::classify::{
        CatchAll, Classification, Classifier, Markers, Predicate, Target, Tolerance,
        channel_targets, classify,
    };
    pub use crate::algs::communicator::{Communicator, NoComm, ThreadComm};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::distribute::{distribute_cell_information, import_with_comm};
    pub use crate::algs::sizing::{
        Field, FieldId, FieldSet, Interpolation, MeshSizeBounds, RefinementParams,
    };
    pub use crate::config::PipelineConfig;
    pub use crate::geometry::channel::{ChannelParams, channel_with_obstacle};
    pub use crate::geometry::{Axis, Entity, GeometryKernel, Model, Point3};
    pub use crate::io::gmsh::GmshReader;
    pub use crate::io::import::{ImportOptions, ImportedMesh, Importer, import};
    pub use crate::io::{ForeignMesh, ForeignTopologyBlock};
    pub use crate::mesh_error::MeshError;
    pub use crate::pipeline::{MeshGenerator, MshFileGenerator, PipelineOutput, run_pipeline};
    pub use crate::topology::{
        CellInformation, CellType, CellTypeTable, LocalMesh, MeshTags, NodeOwnership,
    };
}
