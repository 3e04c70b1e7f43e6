//! Local mesh topology and its tags.
//!
//! It includes:
//! - Cell shapes and their local facet conventions
//! - The injectable foreign-to-local cell table
//! - Per-rank node ownership
//! - The restricted local mesh and its entity tags

pub mod cell_table;
pub mod cell_type;
pub mod local_mesh;
pub mod ownership;
pub mod tags;

pub use cell_table::{CellInformation, CellTypeTable};
pub use cell_type::CellType;
pub use local_mesh::LocalMesh;
pub use ownership::NodeOwnership;
pub use tags::MeshTags;
