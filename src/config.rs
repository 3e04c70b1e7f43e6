//! Pipeline configuration.
//!
//! Every section has a `Default` reproducing the reference channel setup, and the
//! whole configuration can be loaded from JSON with missing fields defaulted.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::algs::classify::{Markers, Tolerance};
use crate::algs::sizing::{MeshSizeBounds, RefinementParams};
use crate::geometry::channel::ChannelParams;
use crate::io::import::ImportOptions;
use crate::mesh_error::MeshError;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub channel: ChannelParams,
    pub markers: Markers,
    pub tolerance: Tolerance,
    /// Grading around the obstacle; derived from the radius when absent.
    pub obstacle_refinement: Option<RefinementParams>,
    /// Grading near the inlet; derived from the radius when absent.
    pub inlet_refinement: Option<RefinementParams>,
    /// Global clamp on the background size.
    pub size_bounds: Option<MeshSizeBounds>,
    pub import: ImportOptions,
}

impl PipelineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, MeshError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, MeshError> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn obstacle_refinement(&self) -> RefinementParams {
        self.obstacle_refinement
            .unwrap_or_else(|| RefinementParams::obstacle(self.channel.radius))
    }

    pub fn inlet_refinement(&self) -> RefinementParams {
        self.inlet_refinement
            .unwrap_or_else(|| RefinementParams::inlet(self.channel.radius))
    }

    /// Checks geometry, refinement parameters and marker uniqueness.
    pub fn validate(&self) -> Result<(), MeshError> {
        self.channel.validate()?;
        self.obstacle_refinement().validate()?;
        self.inlet_refinement().validate()?;
        let m = &self.markers;
        let mut surface = [m.inlet, m.outlet, m.wall, m.obstacle];
        surface.sort_unstable();
        if surface.windows(2).any(|w| w[0] == w[1]) {
            return Err(MeshError::Configuration(format!(
                "surface markers must be distinct: {m:?}"
            )));
        }
        Ok(())
    }
}
