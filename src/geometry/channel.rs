//! Channel-with-obstacle model builder.
//!
//! Produces the model obtained by cutting a cylinder of radius `radius`, whose axis
//! runs along `y` through `(obstacle_x, ·, obstacle_z)`, out of the box
//! `[0, length] × [0, width] × [0, height]`. The cylinder spans the full width, so
//! the two `y` walls are pierced by circular holes and the obstacle contributes a
//! single lateral surface.
//!
//! Surface tags follow the box face order `x=0, x=L, y=0, y=B, z=0, z=H`, then the
//! obstacle; the fluid volume is tag 1.

use serde::{Deserialize, Serialize};

use crate::geometry::entity::Axis;
use crate::geometry::model::Model;
use crate::geometry::shape::{Cylinder, Disk, Shape};
use crate::mesh_error::MeshError;

/// Dimensions of the channel and its obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelParams {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub obstacle_x: f64,
    pub obstacle_z: f64,
    pub radius: f64,
}

impl Default for ChannelParams {
    fn default() -> Self {
        Self {
            length: 2.5,
            width: 0.41,
            height: 0.41,
            obstacle_x: 0.5,
            obstacle_z: 0.2,
            radius: 0.05,
        }
    }
}

impl ChannelParams {
    /// Checks extents are positive and the obstacle lies strictly inside the channel.
    pub fn validate(&self) -> Result<(), MeshError> {
        for (name, v) in [
            ("length", self.length),
            ("width", self.width),
            ("height", self.height),
            ("radius", self.radius),
        ] {
            if !(v > 0.0) || !v.is_finite() {
                return Err(MeshError::InvalidGeometry(format!(
                    "{name} must be positive and finite, got {v}"
                )));
            }
        }
        let r = self.radius;
        if self.obstacle_x - r <= 0.0 || self.obstacle_x + r >= self.length {
            return Err(MeshError::InvalidGeometry(format!(
                "obstacle at x={} with radius {r} leaves the channel [0, {}]",
                self.obstacle_x, self.length
            )));
        }
        if self.obstacle_z - r <= 0.0 || self.obstacle_z + r >= self.height {
            return Err(MeshError::InvalidGeometry(format!(
                "obstacle at z={} with radius {r} leaves the channel [0, {}]",
                self.obstacle_z, self.height
            )));
        }
        Ok(())
    }

    pub(crate) fn obstacle(&self) -> Cylinder {
        Cylinder {
            axis: Axis::Y,
            base: [self.obstacle_x, 0.0, self.obstacle_z],
            length: self.width,
            radius: self.radius,
        }
    }
}

/// Builds the cut channel model.
pub fn channel_with_obstacle(params: &ChannelParams) -> Result<Model, MeshError> {
    params.validate()?;
    let (l, b, h) = (params.length, params.width, params.height);
    let hole = Disk {
        // normal Y => (u, v) = (Z, X)
        center: [params.obstacle_z, params.obstacle_x],
        radius: params.radius,
    };

    let mut model = Model::new("channel");
    model.add_shape(Shape::Solid {
        min: [0.0; 3],
        max: [l, b, h],
        cutouts: vec![params.obstacle()],
    });

    let faces = [
        (Axis::X, 0.0, [b, h], None),
        (Axis::X, l, [b, h], None),
        (Axis::Y, 0.0, [h, l], Some(hole)),
        (Axis::Y, b, [h, l], Some(hole)),
        (Axis::Z, 0.0, [l, b], None),
        (Axis::Z, h, [l, b], None),
    ];
    for (normal, offset, max, hole) in faces {
        model.add_shape(Shape::Rectangle {
            normal,
            offset,
            min: [0.0, 0.0],
            max,
            holes: hole.into_iter().collect(),
        });
    }
    model.add_shape(Shape::CylinderSide(params.obstacle()));
    log::debug!(
        "built channel {l}x{b}x{h} with obstacle r={} at (x={}, z={})",
        params.radius,
        params.obstacle_x,
        params.obstacle_z
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::entity::Entity;
    use crate::geometry::model::GeometryKernel;

    #[test]
    fn default_channel_has_one_volume_and_seven_surfaces() {
        let model = channel_with_obstacle(&ChannelParams::default()).unwrap();
        assert_eq!(model.entities(3), vec![Entity::volume(1)]);
        assert_eq!(model.entities(2).len(), 7);
    }

    #[test]
    fn inlet_centroid_is_face_center() {
        let p = ChannelParams::default();
        let model = channel_with_obstacle(&p).unwrap();
        let c = model.centroid(Entity::surface(1)).unwrap();
        let expected = [0.0, p.width / 2.0, p.height / 2.0];
        for i in 0..3 {
            assert!((c[i] - expected[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn obstacle_outside_channel_is_rejected() {
        let p = ChannelParams {
            obstacle_z: 0.4,
            ..ChannelParams::default()
        };
        assert!(matches!(
            channel_with_obstacle(&p),
            Err(MeshError::InvalidGeometry(_))
        ));
    }
}
