//! Geometric classification of boundary surfaces.
//!
//! Each surface's centroid is computed once and tested against an ordered list of
//! [`Target`]s. The **first** matching target wins, so targets must be ordered from
//! most to least specific (inlet/outlet points before wall planes). Surfaces
//! matching nothing fall into the catch-all category when one is configured, and
//! raise [`MeshError::ClassificationAmbiguity`] otherwise.
//!
//! The result always partitions the input: every surface lands in exactly one group.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::geometry::channel::ChannelParams;
use crate::geometry::entity::{Axis, Entity, Point3};
use crate::geometry::model::{GeometryKernel, Model};
use crate::mesh_error::MeshError;

/// Default group name for the fluid volume.
pub const FLUID: &str = "fluid";
/// Default group name for inflow surfaces.
pub const INLET: &str = "inlet";
/// Default group name for outflow surfaces.
pub const OUTLET: &str = "outlet";
/// Default group name for no-slip channel walls.
pub const WALL: &str = "wall";
/// Default group name for obstacle surfaces.
pub const OBSTACLE: &str = "obstacle";

/// Marker values attached to the physical groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Markers {
    pub fluid: i32,
    pub inlet: i32,
    pub outlet: i32,
    pub wall: i32,
    pub obstacle: i32,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            fluid: 1,
            inlet: 2,
            outlet: 3,
            wall: 4,
            obstacle: 5,
        }
    }
}

/// Closeness test `|a - b| <= atol + rtol * |b|`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            rtol: 1e-5,
            atol: 1e-8,
        }
    }
}

impl Tolerance {
    #[inline]
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.atol + self.rtol * b.abs()
    }

    pub fn all_close(&self, a: Point3, b: Point3) -> bool {
        a.iter().zip(b.iter()).all(|(&x, &y)| self.is_close(x, y))
    }
}

/// Geometric test applied to a surface centroid.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// Centroid equals `point` within `tol`, component-wise.
    CentroidAt { point: Point3, tol: Tolerance },
    /// Centroid lies on the plane `x[axis] == offset`.
    OnPlane {
        axis: Axis,
        offset: f64,
        tol: Tolerance,
    },
    /// Any of the inner predicates matches.
    AnyOf(Vec<Predicate>),
    /// Matches everything.
    Always,
}

impl Predicate {
    pub fn matches(&self, centroid: Point3) -> bool {
        match self {
            Predicate::CentroidAt { point, tol } => tol.all_close(centroid, *point),
            Predicate::OnPlane { axis, offset, tol } => {
                tol.is_close(centroid[axis.index()], *offset)
            }
            Predicate::AnyOf(inner) => inner.iter().any(|p| p.matches(centroid)),
            Predicate::Always => true,
        }
    }
}

/// A named, marked classification target.
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    pub name: String,
    pub marker: i32,
    pub predicate: Predicate,
}

impl Target {
    pub fn new(name: impl Into<String>, marker: i32, predicate: Predicate) -> Self {
        Self {
            name: name.into(),
            marker,
            predicate,
        }
    }
}

/// Category receiving every surface no target matched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatchAll {
    pub name: String,
    pub marker: i32,
}

impl CatchAll {
    pub fn new(name: impl Into<String>, marker: i32) -> Self {
        Self {
            name: name.into(),
            marker,
        }
    }
}

/// Surfaces assigned to one category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurfaceGroup {
    pub name: String,
    pub marker: i32,
    pub tags: BTreeSet<i32>,
}

/// Output of [`Classifier::classify`]: groups in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    dim: u8,
    groups: Vec<SurfaceGroup>,
}

impl Classification {
    /// Dimension of the classified entities.
    pub fn dim(&self) -> u8 {
        self.dim
    }

    pub fn groups(&self) -> &[SurfaceGroup] {
        &self.groups
    }

    pub fn get(&self, name: &str) -> Option<&SurfaceGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Tags assigned to `name`, ascending; empty when the category is absent.
    pub fn tags(&self, name: &str) -> Vec<i32> {
        self.get(name)
            .map(|g| g.tags.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Category holding `tag`, if any.
    pub fn category_of(&self, tag: i32) -> Option<&SurfaceGroup> {
        self.groups.iter().find(|g| g.tags.contains(&tag))
    }

    /// Total number of classified surfaces.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.tags.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers one physical group per non-empty category.
    pub fn register(&self, model: &mut Model) -> Result<(), MeshError> {
        for group in self.groups.iter().filter(|g| !g.tags.is_empty()) {
            let tags: Vec<i32> = group.tags.iter().copied().collect();
            model.add_physical_group(self.dim, &tags, group.marker, &group.name)?;
        }
        Ok(())
    }

    fn group_index(&mut self, name: &str, marker: i32) -> Result<usize, MeshError> {
        if let Some(idx) = self.groups.iter().position(|g| g.name == name) {
            if self.groups[idx].marker != marker {
                return Err(MeshError::Configuration(format!(
                    "category `{name}` declared with markers {} and {marker}",
                    self.groups[idx].marker
                )));
            }
            return Ok(idx);
        }
        if self.groups.iter().any(|g| g.marker == marker) {
            return Err(MeshError::Configuration(format!(
                "marker {marker} reused by category `{name}`"
            )));
        }
        self.groups.push(SurfaceGroup {
            name: name.to_string(),
            marker,
            tags: BTreeSet::new(),
        });
        Ok(self.groups.len() - 1)
    }
}

/// First-match-wins surface classifier.
#[derive(Clone, Debug, Default)]
pub struct Classifier {
    targets: Vec<Target>,
    catch_all: Option<CatchAll>,
}

impl Classifier {
    /// Classifier without a catch-all category.
    pub fn new(targets: Vec<Target>) -> Self {
        Self {
            targets,
            catch_all: None,
        }
    }

    pub fn with_catch_all(mut self, catch_all: CatchAll) -> Self {
        self.catch_all = Some(catch_all);
        self
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Classifies `surfaces` using their centroids from `kernel`.
    ///
    /// Targets sharing a name are merged into one group. Duplicate input entities
    /// are classified once. Empty targets or empty surfaces yield empty groupings.
    pub fn classify<K: GeometryKernel>(
        &self,
        kernel: &K,
        surfaces: &[Entity],
    ) -> Result<Classification, MeshError> {
        let mut unique: Vec<Entity> = surfaces.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let dim = match unique.first() {
            Some(first) => first.dim,
            None => return Ok(Classification::default()),
        };
        if self.targets.is_empty() {
            log::warn!(
                "no classification targets; {} surfaces left unclassified",
                unique.len()
            );
            return Ok(Classification::default());
        }
        if let Some(other) = unique.iter().find(|e| e.dim != dim) {
            return Err(MeshError::Configuration(format!(
                "cannot classify entities of mixed dimension ({dim} and {})",
                other.dim
            )));
        }

        let mut out = Classification {
            dim,
            groups: Vec::new(),
        };
        let mut slots = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            slots.push(out.group_index(&target.name, target.marker)?);
        }
        let fallback = match &self.catch_all {
            Some(c) => Some(out.group_index(&c.name, c.marker)?),
            None => None,
        };

        for entity in unique {
            let centroid = kernel.centroid(entity)?;
            let mut hits = self
                .targets
                .iter()
                .zip(&slots)
                .filter(|(t, _)| t.predicate.matches(centroid));
            let slot = match hits.next() {
                Some((target, &slot)) => {
                    let shadowed: Vec<&str> = hits.map(|(t, _)| t.name.as_str()).collect();
                    if !shadowed.is_empty() {
                        log::warn!(
                            "surface {entity} matched `{}` and also {shadowed:?}; first match wins",
                            target.name
                        );
                    }
                    slot
                }
                None => fallback.ok_or(MeshError::ClassificationAmbiguity {
                    dim: entity.dim,
                    tag: entity.tag,
                })?,
            };
            log::debug!(
                "surface {entity} at {centroid:?} -> {}",
                out.groups[slot].name
            );
            out.groups[slot].tags.insert(entity.tag);
        }
        Ok(out)
    }
}

/// Convenience wrapper: classify with `obstacle` as the catch-all category.
pub fn classify<K: GeometryKernel>(
    kernel: &K,
    surfaces: &[Entity],
    targets: Vec<Target>,
    catch_all_marker: i32,
) -> Result<Classification, MeshError> {
    Classifier::new(targets)
        .with_catch_all(CatchAll::new(OBSTACLE, catch_all_marker))
        .classify(kernel, surfaces)
}

/// Ordered targets for the channel model: inlet, outlet, then the four walls.
///
/// The obstacle is left to the catch-all category.
pub fn channel_targets(params: &ChannelParams, markers: &Markers, tol: Tolerance) -> Vec<Target> {
    let (l, b, h) = (params.length, params.width, params.height);
    let plane = |axis, offset| Predicate::OnPlane { axis, offset, tol };
    vec![
        Target::new(
            INLET,
            markers.inlet,
            Predicate::CentroidAt {
                point: [0.0, b / 2.0, h / 2.0],
                tol,
            },
        ),
        Target::new(
            OUTLET,
            markers.outlet,
            Predicate::CentroidAt {
                point: [l, b / 2.0, h / 2.0],
                tol,
            },
        ),
        Target::new(
            WALL,
            markers.wall,
            Predicate::AnyOf(vec![
                plane(Axis::Z, 0.0),
                plane(Axis::Y, b),
                plane(Axis::Z, h),
                plane(Axis::Y, 0.0),
            ]),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::channel::channel_with_obstacle;

    #[test]
    fn tolerance_matches_allclose_semantics() {
        let tol = Tolerance::default();
        assert!(tol.is_close(1e-9, 0.0));
        assert!(!tol.is_close(1e-7, 0.0));
        assert!(tol.is_close(1000.005, 1000.0));
    }

    #[test]
    fn channel_surfaces_are_classified() {
        let params = ChannelParams::default();
        let model = channel_with_obstacle(&params).unwrap();
        let markers = Markers::default();
        let out = classify(
            &model,
            &model.entities(2),
            channel_targets(&params, &markers, Tolerance::default()),
            markers.obstacle,
        )
        .unwrap();
        assert_eq!(out.tags(INLET), vec![1]);
        assert_eq!(out.tags(OUTLET), vec![2]);
        assert_eq!(out.tags(WALL), vec![3, 4, 5, 6]);
        assert_eq!(out.tags(OBSTACLE), vec![7]);
        assert_eq!(out.len(), 7);
    }

    #[test]
    fn unmatched_surface_without_catch_all_is_ambiguous() {
        let params = ChannelParams::default();
        let model = channel_with_obstacle(&params).unwrap();
        let classifier = Classifier::new(channel_targets(
            &params,
            &Markers::default(),
            Tolerance::default(),
        ));
        let err = classifier.classify(&model, &model.entities(2)).unwrap_err();
        assert_eq!(err, MeshError::ClassificationAmbiguity { dim: 2, tag: 7 });
    }

    #[test]
    fn empty_inputs_yield_empty_groupings() {
        let params = ChannelParams::default();
        let model = channel_with_obstacle(&params).unwrap();
        let none = classify(&model, &model.entities(2), vec![], 5).unwrap();
        assert!(none.is_empty());
        let nothing = classify(
            &model,
            &[],
            channel_targets(&params, &Markers::default(), Tolerance::default()),
            5,
        )
        .unwrap();
        assert!(nothing.groups().is_empty());
    }

    #[test]
    fn loose_tolerance_lets_earlier_target_swallow_walls() {
        let params = ChannelParams::default();
        let model = channel_with_obstacle(&params).unwrap();
        let loose = Tolerance {
            rtol: 0.0,
            atol: 10.0,
        };
        let out = classify(
            &model,
            &model.entities(2),
            channel_targets(&params, &Markers::default(), loose),
            5,
        )
        .unwrap();
        assert_eq!(out.tags(INLET).len(), 7);
        assert_eq!(out.len(), 7);
    }

    #[test]
    fn conflicting_markers_for_one_name_are_rejected() {
        let model = channel_with_obstacle(&ChannelParams::default()).unwrap();
        let targets = vec![
            Target::new(WALL, 4, Predicate::Always),
            Target::new(WALL, 6, Predicate::Always),
        ];
        let err = Classifier::new(targets)
            .classify(&model, &model.entities(2))
            .unwrap_err();
        assert!(matches!(err, MeshError::Configuration(_)));
    }
}
