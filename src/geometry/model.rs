//! Explicit geometric model handle.
//!
//! [`Model`] replaces the CAD kernel's process-wide model context: every query and
//! every physical-group registration goes through a handle the caller owns. The
//! classifier and sizing fields only see the [`GeometryKernel`] trait, so another
//! kernel binding can stand in for the analytic model.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::geometry::entity::{Entity, Point3};
use crate::geometry::shape::Shape;
use crate::mesh_error::MeshError;

/// Read-only geometry queries needed by classification and sizing.
pub trait GeometryKernel {
    /// All entities of dimension `dim`, sorted by tag.
    fn entities(&self, dim: u8) -> Vec<Entity>;

    /// Center of mass of `entity`.
    fn centroid(&self, entity: Entity) -> Result<Point3, MeshError>;

    /// Distance from `point` to `entity`.
    fn distance(&self, entity: Entity, point: Point3) -> Result<f64, MeshError>;

    /// Whether `entity` exists.
    fn contains(&self, entity: Entity) -> bool;
}

/// A named, numbered set of entities of one dimension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalGroup {
    pub dim: u8,
    pub marker: i32,
    pub name: String,
    pub tags: Vec<i32>,
}

/// In-memory geometric model.
#[derive(Clone, Debug, Default)]
pub struct Model {
    name: String,
    shapes: BTreeMap<Entity, Shape>,
    groups: Vec<PhysicalGroup>,
    membership: HashMap<Entity, usize>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds `shape` under the next free tag of its dimension.
    pub fn add_shape(&mut self, shape: Shape) -> Entity {
        let dim = shape.dim();
        let tag = self
            .shapes
            .keys()
            .filter(|e| e.dim == dim)
            .map(|e| e.tag)
            .max()
            .unwrap_or(0)
            + 1;
        let entity = Entity::new(dim, tag);
        self.shapes.insert(entity, shape);
        entity
    }

    pub fn shape(&self, entity: Entity) -> Option<&Shape> {
        self.shapes.get(&entity)
    }

    fn shape_or_err(&self, entity: Entity) -> Result<&Shape, MeshError> {
        self.shapes.get(&entity).ok_or(MeshError::MissingEntity {
            dim: entity.dim,
            tag: entity.tag,
        })
    }

    /// Registers a physical group.
    ///
    /// Every tag must name an existing entity of dimension `dim`, and no entity may
    /// belong to two groups of the same dimension. On error the model is unchanged.
    pub fn add_physical_group(
        &mut self,
        dim: u8,
        tags: &[i32],
        marker: i32,
        name: &str,
    ) -> Result<&PhysicalGroup, MeshError> {
        if self.groups.iter().any(|g| g.dim == dim && g.marker == marker) {
            return Err(MeshError::Configuration(format!(
                "physical group marker {marker} already used in dimension {dim}"
            )));
        }
        let mut sorted = tags.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        for &tag in &sorted {
            let entity = Entity::new(dim, tag);
            if !self.shapes.contains_key(&entity) {
                return Err(MeshError::MissingEntity { dim, tag });
            }
            if self.membership.contains_key(&entity) {
                return Err(MeshError::DuplicateMembership { dim, tag });
            }
        }
        let idx = self.groups.len();
        for &tag in &sorted {
            self.membership.insert(Entity::new(dim, tag), idx);
        }
        log::debug!("physical group `{name}` (dim {dim}, marker {marker}): {sorted:?}");
        self.groups.push(PhysicalGroup {
            dim,
            marker,
            name: name.to_string(),
            tags: sorted,
        });
        Ok(&self.groups[idx])
    }

    /// Registered groups, in insertion order.
    pub fn physical_groups(&self) -> &[PhysicalGroup] {
        &self.groups
    }

    /// The group `entity` belongs to, if any.
    pub fn group_of(&self, entity: Entity) -> Option<&PhysicalGroup> {
        self.membership.get(&entity).map(|&idx| &self.groups[idx])
    }

    /// Looks up a group by dimension and name.
    pub fn group_by_name(&self, dim: u8, name: &str) -> Option<&PhysicalGroup> {
        self.groups.iter().find(|g| g.dim == dim && g.name == name)
    }
}

impl GeometryKernel for Model {
    fn entities(&self, dim: u8) -> Vec<Entity> {
        self.shapes.keys().filter(|e| e.dim == dim).copied().collect()
    }

    fn centroid(&self, entity: Entity) -> Result<Point3, MeshError> {
        Ok(self.shape_or_err(entity)?.centroid())
    }

    fn distance(&self, entity: Entity, point: Point3) -> Result<f64, MeshError> {
        Ok(self.shape_or_err(entity)?.distance(point))
    }

    fn contains(&self, entity: Entity) -> bool {
        self.shapes.contains_key(&entity)
    }
}
