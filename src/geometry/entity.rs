//! Geometric entity handles and coordinate axes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in 3D space.
pub type Point3 = [f64; 3];

/// A geometric object produced by the CAD collaborator.
///
/// Identified by its topological dimension and an integer tag unique within that
/// dimension, matching the `(dim, tag)` pairs of the CAD kernel.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    pub dim: u8,
    pub tag: i32,
}

impl Entity {
    #[inline]
    pub const fn new(dim: u8, tag: i32) -> Self {
        Self { dim, tag }
    }

    /// Shorthand for a dimension-2 entity.
    #[inline]
    pub const fn surface(tag: i32) -> Self {
        Self { dim: 2, tag }
    }

    /// Shorthand for a dimension-3 entity.
    #[inline]
    pub const fn volume(tag: i32) -> Self {
        Self { dim: 3, tag }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Entity").field(&self.dim).field(&self.tag).finish()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.dim, self.tag)
    }
}

/// Cartesian coordinate axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Component index into a [`Point3`].
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// The two remaining axes, in cyclic order.
    #[inline]
    pub const fn others(self) -> (Axis, Axis) {
        match self {
            Axis::X => (Axis::Y, Axis::Z),
            Axis::Y => (Axis::Z, Axis::X),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }

    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

#[inline]
pub(crate) fn hypot2(a: f64, b: f64) -> f64 {
    (a * a + b * b).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ordering_is_dim_then_tag() {
        let mut v = vec![Entity::volume(1), Entity::surface(7), Entity::surface(2)];
        v.sort();
        assert_eq!(v, vec![Entity::surface(2), Entity::surface(7), Entity::volume(1)]);
    }

    #[test]
    fn axis_others_cover_remaining_components() {
        for axis in Axis::ALL {
            let (a, b) = axis.others();
            let mut idx = [axis.index(), a.index(), b.index()];
            idx.sort_unstable();
            assert_eq!(idx, [0, 1, 2]);
        }
    }
}
