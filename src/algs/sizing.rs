//! Graded mesh-sizing fields.
//!
//! Fields are typed descriptors stored in a [`FieldSet`] and referenced by
//! [`FieldId`]. A field may only reference fields added before it, so the set is
//! always acyclic. The usual composition is a [`Field::Distance`] to some source
//! surfaces feeding a [`Field::Threshold`], with several thresholds combined by
//! [`Field::Min`] so the finest requested size wins wherever gradings overlap.

use serde::{Deserialize, Serialize};

use crate::geometry::entity::{Entity, Point3};
use crate::geometry::model::GeometryKernel;
use crate::mesh_error::MeshError;

/// Handle to a field inside a [`FieldSet`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(usize);

impl FieldId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Interpolation between `size_near` and `size_far` inside `(dist_min, dist_max)`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    #[default]
    Linear,
    /// Smooth step centered between `dist_min` and `dist_max`.
    Sigmoid,
}

/// Parameters of a distance-graded size.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefinementParams {
    pub size_near: f64,
    pub size_far: f64,
    pub dist_min: f64,
    pub dist_max: f64,
    #[serde(default)]
    pub interpolation: Interpolation,
    /// Beyond `dist_max` the field stops constraining the size (returns `+inf`).
    #[serde(default)]
    pub stop_at_dist_max: bool,
}

impl RefinementParams {
    pub fn new(size_near: f64, size_far: f64, dist_min: f64, dist_max: f64) -> Self {
        Self {
            size_near,
            size_far,
            dist_min,
            dist_max,
            interpolation: Interpolation::Linear,
            stop_at_dist_max: false,
        }
    }

    /// Refinement around an obstacle of radius `r`: `r/10` at the surface,
    /// `2r` beyond one radius.
    pub fn obstacle(r: f64) -> Self {
        let resolution = r / 10.0;
        Self::new(resolution, 20.0 * resolution, 0.5 * r, r)
    }

    /// Milder refinement near the inflow boundary.
    pub fn inlet(r: f64) -> Self {
        let resolution = r / 10.0;
        Self::new(5.0 * resolution, 10.0 * resolution, 0.1, 0.5)
    }

    pub fn validate(&self) -> Result<(), MeshError> {
        let all = [self.size_near, self.size_far, self.dist_min, self.dist_max];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(MeshError::Configuration(format!(
                "refinement parameters must be finite: {self:?}"
            )));
        }
        if !(self.size_near > 0.0 && self.size_far > 0.0) {
            return Err(MeshError::Configuration(format!(
                "sizes must be positive (size_near={}, size_far={})",
                self.size_near, self.size_far
            )));
        }
        if self.size_near >= self.size_far {
            return Err(MeshError::Configuration(format!(
                "size_near ({}) must be smaller than size_far ({})",
                self.size_near, self.size_far
            )));
        }
        if self.dist_min < 0.0 || self.dist_max <= self.dist_min {
            return Err(MeshError::Configuration(format!(
                "require 0 <= dist_min < dist_max (dist_min={}, dist_max={})",
                self.dist_min, self.dist_max
            )));
        }
        Ok(())
    }

    /// Size for a given distance to the sources.
    pub fn size_at_distance(&self, d: f64) -> f64 {
        if d <= self.dist_min {
            return self.size_near;
        }
        if d >= self.dist_max {
            return if self.stop_at_dist_max {
                f64::INFINITY
            } else {
                self.size_far
            };
        }
        let r = (d - self.dist_min) / (self.dist_max - self.dist_min);
        let s = match self.interpolation {
            Interpolation::Linear => r,
            Interpolation::Sigmoid => {
                let e = (12.0 * r - 6.0).exp();
                e / (1.0 + e)
            }
        };
        self.size_near * (1.0 - s) + self.size_far * s
    }
}

/// Typed field descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Field {
    /// Distance to the closest of `sources`.
    Distance { sources: Vec<Entity> },
    /// Graded size driven by the value of `input` (normally a distance).
    Threshold {
        input: FieldId,
        params: RefinementParams,
    },
    /// Pointwise minimum of the constituents.
    Min { fields: Vec<FieldId> },
}

/// Global clamp applied to the background size.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshSizeBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for MeshSizeBounds {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: f64::INFINITY,
        }
    }
}

/// Registry of sizing fields for one meshing pass.
#[derive(Clone, Debug, Default)]
pub struct FieldSet {
    fields: Vec<Field>,
    background: Option<FieldId>,
    bounds: MeshSizeBounds,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, id: FieldId) -> Option<&Field> {
        self.fields.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &Field)> + '_ {
        self.fields.iter().enumerate().map(|(i, f)| (FieldId(i), f))
    }

    fn check_ref(&self, id: FieldId) -> Result<(), MeshError> {
        if id.0 < self.fields.len() {
            Ok(())
        } else {
            Err(MeshError::Configuration(format!(
                "field {} is not defined",
                id.0
            )))
        }
    }

    /// Adds a field after validating its parameters and references.
    pub fn add(&mut self, field: Field) -> Result<FieldId, MeshError> {
        match &field {
            Field::Distance { sources } => {
                if sources.is_empty() {
                    return Err(MeshError::Configuration(
                        "distance field needs at least one source entity".into(),
                    ));
                }
            }
            Field::Threshold { input, params } => {
                self.check_ref(*input)?;
                params.validate()?;
            }
            Field::Min { fields } => {
                if fields.is_empty() {
                    return Err(MeshError::Configuration(
                        "min field needs at least one constituent".into(),
                    ));
                }
                for &f in fields {
                    self.check_ref(f)?;
                }
            }
        }
        self.fields.push(field);
        Ok(FieldId(self.fields.len() - 1))
    }

    /// Adds a distance field after checking every source exists in `kernel`.
    pub fn add_distance<K: GeometryKernel>(
        &mut self,
        kernel: &K,
        sources: &[Entity],
    ) -> Result<FieldId, MeshError> {
        if let Some(missing) = sources.iter().find(|e| !kernel.contains(**e)) {
            return Err(MeshError::MissingEntity {
                dim: missing.dim,
                tag: missing.tag,
            });
        }
        self.add(Field::Distance {
            sources: sources.to_vec(),
        })
    }

    /// Distance-to-`sources` feeding a threshold with `params`.
    ///
    /// Parameters are validated before anything is added, so a rejected call leaves
    /// the set unchanged. Returns the threshold field.
    pub fn build_graded_field<K: GeometryKernel>(
        &mut self,
        kernel: &K,
        sources: &[Entity],
        params: RefinementParams,
    ) -> Result<FieldId, MeshError> {
        params.validate()?;
        let distance = self.add_distance(kernel, sources)?;
        self.add(Field::Threshold {
            input: distance,
            params,
        })
    }

    /// Pointwise minimum over `fields`.
    pub fn combine_min(&mut self, fields: &[FieldId]) -> Result<FieldId, MeshError> {
        self.add(Field::Min {
            fields: fields.to_vec(),
        })
    }

    pub fn set_background(&mut self, id: FieldId) -> Result<(), MeshError> {
        self.check_ref(id)?;
        self.background = Some(id);
        Ok(())
    }

    pub fn background(&self) -> Option<FieldId> {
        self.background
    }

    pub fn set_bounds(&mut self, bounds: MeshSizeBounds) -> Result<(), MeshError> {
        if !(bounds.min >= 0.0) || !(bounds.max > bounds.min) {
            return Err(MeshError::Configuration(format!(
                "invalid mesh size bounds {bounds:?}"
            )));
        }
        self.bounds = bounds;
        Ok(())
    }

    pub fn bounds(&self) -> MeshSizeBounds {
        self.bounds
    }

    /// Value of field `id` at `point`.
    pub fn evaluate<K: GeometryKernel>(
        &self,
        kernel: &K,
        id: FieldId,
        point: Point3,
    ) -> Result<f64, MeshError> {
        self.check_ref(id)?;
        match &self.fields[id.0] {
            Field::Distance { sources } => {
                let mut best = f64::INFINITY;
                for &entity in sources {
                    best = best.min(kernel.distance(entity, point)?);
                }
                Ok(best)
            }
            Field::Threshold { input, params } => {
                let d = self.evaluate(kernel, *input, point)?;
                Ok(params.size_at_distance(d))
            }
            Field::Min { fields } => {
                let mut best = f64::INFINITY;
                for &f in fields {
                    best = best.min(self.evaluate(kernel, f, point)?);
                }
                Ok(best)
            }
        }
    }

    /// Largest `size_far` among the threshold fields.
    pub fn coarsest_far_size(&self) -> Option<f64> {
        self.fields
            .iter()
            .filter_map(|f| match f {
                Field::Threshold { params, .. } => Some(params.size_far),
                _ => None,
            })
            .reduce(f64::max)
    }

    /// Background size at `point`, clamped to the configured bounds.
    ///
    /// The result is always finite: where every threshold has stopped at its
    /// `dist_max` and no upper bound is set, the coarsest `size_far` is used.
    pub fn mesh_size_at<K: GeometryKernel>(
        &self,
        kernel: &K,
        point: Point3,
    ) -> Result<f64, MeshError> {
        let id = self
            .background
            .ok_or_else(|| MeshError::Configuration("no background field set".into()))?;
        let mut size = self.evaluate(kernel, id, point)?;
        if size.is_infinite() && self.bounds.max.is_infinite() {
            size = self.coarsest_far_size().ok_or_else(|| {
                MeshError::Configuration(format!("unbounded mesh size at {point:?}"))
            })?;
        }
        Ok(size.clamp(self.bounds.min, self.bounds.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_threshold_hits_endpoints_and_midpoint() {
        let p = RefinementParams::new(0.1, 0.5, 1.0, 3.0);
        assert_eq!(p.size_at_distance(0.0), 0.1);
        assert_eq!(p.size_at_distance(1.0), 0.1);
        assert!((p.size_at_distance(2.0) - 0.3).abs() < 1e-12);
        assert_eq!(p.size_at_distance(3.0), 0.5);
        assert_eq!(p.size_at_distance(10.0), 0.5);
    }

    #[test]
    fn sigmoid_threshold_is_monotone_and_symmetric() {
        let p = RefinementParams {
            interpolation: Interpolation::Sigmoid,
            ..RefinementParams::new(0.1, 0.5, 1.0, 3.0)
        };
        assert!((p.size_at_distance(2.0) - 0.3).abs() < 1e-12);
        let mut last = 0.0;
        for i in 0..=40 {
            let s = p.size_at_distance(i as f64 * 0.1);
            assert!(s >= last);
            last = s;
        }
    }

    #[test]
    fn stop_at_dist_max_releases_far_field() {
        let p = RefinementParams {
            stop_at_dist_max: true,
            ..RefinementParams::new(0.1, 0.5, 1.0, 3.0)
        };
        assert_eq!(p.size_at_distance(3.5), f64::INFINITY);
    }

    #[test]
    fn invalid_parameters_are_configuration_errors() {
        for p in [
            RefinementParams::new(0.1, 0.05, 0.0, 1.0),
            RefinementParams::new(0.0, 0.05, 0.0, 1.0),
            RefinementParams::new(0.1, 0.5, 1.0, 1.0),
            RefinementParams::new(0.1, 0.5, -1.0, 1.0),
            RefinementParams::new(0.1, f64::NAN, 0.0, 1.0),
        ] {
            assert!(matches!(p.validate(), Err(MeshError::Configuration(_))));
        }
    }

    #[test]
    fn forward_references_are_rejected() {
        let mut set = FieldSet::new();
        let err = set.combine_min(&[FieldId(0)]).unwrap_err();
        assert!(matches!(err, MeshError::Configuration(_)));
        assert!(set.combine_min(&[]).is_err());
        assert!(set.is_empty());
    }
}
