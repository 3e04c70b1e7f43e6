//! Re-export public algorithms.

pub mod classify;
pub mod communicator;
pub mod distribute;
pub mod sizing;
pub mod wire;

pub use classify::{classify, Classification, Classifier};
pub use distribute::{distribute_cell_information, import_with_comm};
pub use sizing::{FieldId, FieldSet, RefinementParams};
