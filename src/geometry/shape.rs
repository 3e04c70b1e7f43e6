//! Analytic shapes backing model entities.
//!
//! The shapes cover exactly what the channel model needs after its boolean cut:
//! axis-aligned planar rectangles (optionally pierced by circular holes), the side
//! surface of an axis-aligned cylinder, and a box solid with cylindrical cut-outs.
//!
//! In-plane coordinates of a rectangle with normal `n` are `(u, v)` where
//! `(u_axis, v_axis) = n.others()`.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::geometry::entity::{Axis, Point3, hypot2};

/// A circular hole in a planar rectangle, in the rectangle's `(u, v)` frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Disk {
    pub center: [f64; 2],
    pub radius: f64,
}

impl Disk {
    fn area(&self) -> f64 {
        PI * self.radius * self.radius
    }
}

/// Finite cylinder aligned with a coordinate axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    pub axis: Axis,
    /// Center of the bottom cap.
    pub base: Point3,
    pub length: f64,
    pub radius: f64,
}

impl Cylinder {
    /// Radial distance from the axis and axial coordinate relative to `base`.
    fn local(&self, p: Point3) -> (f64, f64) {
        let (a, b) = self.axis.others();
        let rho = hypot2(
            p[a.index()] - self.base[a.index()],
            p[b.index()] - self.base[b.index()],
        );
        let t = p[self.axis.index()] - self.base[self.axis.index()];
        (rho, t)
    }

    fn contains(&self, p: Point3) -> bool {
        let (rho, t) = self.local(p);
        rho < self.radius && (0.0..=self.length).contains(&t)
    }

    fn volume(&self) -> f64 {
        PI * self.radius * self.radius * self.length
    }

    fn axis_midpoint(&self) -> Point3 {
        let mut c = self.base;
        c[self.axis.index()] += 0.5 * self.length;
        c
    }

    /// Distance from `p` to the lateral surface (caps excluded).
    fn side_distance(&self, p: Point3) -> f64 {
        let (rho, t) = self.local(p);
        let dt = t - t.clamp(0.0, self.length);
        hypot2(rho - self.radius, dt)
    }
}

/// Geometry attached to a model entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Axis-aligned planar rectangle at `x[normal] == offset`.
    Rectangle {
        normal: Axis,
        offset: f64,
        min: [f64; 2],
        max: [f64; 2],
        holes: Vec<Disk>,
    },
    /// Lateral surface of a cylinder.
    CylinderSide(Cylinder),
    /// Axis-aligned box with cylindrical cut-outs removed.
    Solid {
        min: Point3,
        max: Point3,
        cutouts: Vec<Cylinder>,
    },
}

impl Shape {
    /// Topological dimension of the shape.
    pub fn dim(&self) -> u8 {
        match self {
            Shape::Rectangle { .. } | Shape::CylinderSide(_) => 2,
            Shape::Solid { .. } => 3,
        }
    }

    /// Area for surfaces, volume for solids.
    pub fn measure(&self) -> f64 {
        match self {
            Shape::Rectangle {
                min, max, holes, ..
            } => {
                (max[0] - min[0]) * (max[1] - min[1]) - holes.iter().map(Disk::area).sum::<f64>()
            }
            Shape::CylinderSide(c) => 2.0 * PI * c.radius * c.length,
            Shape::Solid { min, max, cutouts } => {
                (max[0] - min[0]) * (max[1] - min[1]) * (max[2] - min[2])
                    - cutouts.iter().map(Cylinder::volume).sum::<f64>()
            }
        }
    }

    /// Center of mass, assuming uniform density.
    pub fn centroid(&self) -> Point3 {
        match self {
            Shape::Rectangle {
                normal,
                offset,
                min,
                max,
                holes,
            } => {
                let full = (max[0] - min[0]) * (max[1] - min[1]);
                let mut area = full;
                let mut cu = full * 0.5 * (min[0] + max[0]);
                let mut cv = full * 0.5 * (min[1] + max[1]);
                for hole in holes {
                    let a = hole.area();
                    area -= a;
                    cu -= a * hole.center[0];
                    cv -= a * hole.center[1];
                }
                let (u, v) = normal.others();
                let mut c = [0.0; 3];
                c[normal.index()] = *offset;
                c[u.index()] = cu / area;
                c[v.index()] = cv / area;
                c
            }
            Shape::CylinderSide(c) => c.axis_midpoint(),
            Shape::Solid { min, max, cutouts } => {
                let full = (max[0] - min[0]) * (max[1] - min[1]) * (max[2] - min[2]);
                let mut vol = full;
                let mut c = [0.0; 3];
                for i in 0..3 {
                    c[i] = full * 0.5 * (min[i] + max[i]);
                }
                for cyl in cutouts {
                    let v = cyl.volume();
                    let m = cyl.axis_midpoint();
                    vol -= v;
                    for i in 0..3 {
                        c[i] -= v * m[i];
                    }
                }
                c.map(|x| x / vol)
            }
        }
    }

    /// Euclidean distance from `p` to the shape.
    ///
    /// Points inside a solid's material are at distance zero.
    pub fn distance(&self, p: Point3) -> f64 {
        match self {
            Shape::Rectangle {
                normal,
                offset,
                min,
                max,
                holes,
            } => {
                let (u, v) = normal.others();
                let q = [p[u.index()], p[v.index()]];
                let h = p[normal.index()] - offset;
                let du = q[0] - q[0].clamp(min[0], max[0]);
                let dv = q[1] - q[1].clamp(min[1], max[1]);
                let mut in_plane = hypot2(du, dv);
                if in_plane == 0.0 {
                    for hole in holes {
                        let r = hypot2(q[0] - hole.center[0], q[1] - hole.center[1]);
                        if r < hole.radius {
                            in_plane = hole.radius - r;
                            break;
                        }
                    }
                }
                hypot2(h, in_plane)
            }
            Shape::CylinderSide(c) => c.side_distance(p),
            Shape::Solid { min, max, cutouts } => {
                if let Some(cyl) = cutouts.iter().find(|c| c.contains(p)) {
                    return cyl.side_distance(p);
                }
                let mut acc = 0.0;
                for i in 0..3 {
                    let d = p[i] - p[i].clamp(min[i], max[i]);
                    acc += d * d;
                }
                acc.sqrt()
            }
        }
    }
}
