//! Geometric model of the flow domain.
//!
//! The model is a set of analytic [`shape::Shape`]s keyed by [`entity::Entity`],
//! queried through the [`model::GeometryKernel`] trait by classification and sizing.

pub mod channel;
pub mod entity;
pub mod model;
pub mod shape;

pub use entity::{Axis, Entity, Point3};
pub use model::{GeometryKernel, Model, PhysicalGroup};
