//! End-to-end driver: geometry, classification, sizing, meshing, import.
//!
//! Mesh generation itself is delegated to a [`MeshGenerator`]; the crate ships
//! [`MshFileGenerator`], which loads a mesh produced out of process from a Gmsh
//! file. Any closure `Fn(&Model, &FieldSet) -> Result<ForeignMesh, MeshError>` is
//! also a generator.

use std::path::{Path, PathBuf};

use crate::algs::classify::{self, Classification, FLUID};
use crate::algs::sizing::{FieldId, FieldSet};
use crate::config::PipelineConfig;
use crate::geometry::channel::channel_with_obstacle;
use crate::geometry::entity::Entity;
use crate::geometry::model::{GeometryKernel, Model};
use crate::io::ForeignMesh;
use crate::io::gmsh::GmshReader;
use crate::io::import::{ImportedMesh, Importer};
use crate::mesh_error::MeshError;
use crate::topology::cell_table::CellTypeTable;
use crate::topology::ownership::NodeOwnership;

/// Produces a foreign mesh conforming to `model` and graded by `fields`.
pub trait MeshGenerator {
    fn generate(&self, model: &Model, fields: &FieldSet) -> Result<ForeignMesh, MeshError>;
}

impl<F> MeshGenerator for F
where
    F: Fn(&Model, &FieldSet) -> Result<ForeignMesh, MeshError>,
{
    fn generate(&self, model: &Model, fields: &FieldSet) -> Result<ForeignMesh, MeshError> {
        self(model, fields)
    }
}

/// Reads a previously generated `.msh` file instead of meshing.
#[derive(Clone, Debug)]
pub struct MshFileGenerator {
    path: PathBuf,
}

impl MshFileGenerator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MeshGenerator for MshFileGenerator {
    fn generate(&self, model: &Model, _fields: &FieldSet) -> Result<ForeignMesh, MeshError> {
        log::info!("model `{}`: loading mesh from {}", model.name(), self.path.display());
        GmshReader.read_path(&self.path)
    }
}

/// Model with its groups registered and sizing fields attached.
#[derive(Debug)]
pub struct PreparedModel {
    pub model: Model,
    pub classification: Classification,
    pub fields: FieldSet,
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub model: Model,
    pub classification: Classification,
    pub fields: FieldSet,
    pub imported: ImportedMesh,
}

/// Builds the channel, tags its volume and boundary, and sets up grading.
pub fn prepare_model(config: &PipelineConfig) -> Result<PreparedModel, MeshError> {
    config.validate()?;
    let mut model = channel_with_obstacle(&config.channel)?;

    let volumes: Vec<i32> = model.entities(3).iter().map(|e| e.tag).collect();
    model.add_physical_group(3, &volumes, config.markers.fluid, FLUID)?;

    let surfaces = model.entities(2);
    let targets = classify::channel_targets(&config.channel, &config.markers, config.tolerance);
    let classification = classify::classify(&model, &surfaces, targets, config.markers.obstacle)?;
    classification.register(&mut model)?;
    for group in classification.groups() {
        log::info!(
            "{} (marker {}): surfaces {:?}",
            group.name,
            group.marker,
            group.tags
        );
    }

    let fields = build_fields(&model, &classification, config)?;
    Ok(PreparedModel {
        model,
        classification,
        fields,
    })
}

fn build_fields(
    model: &Model,
    classification: &Classification,
    config: &PipelineConfig,
) -> Result<FieldSet, MeshError> {
    let mut fields = FieldSet::new();
    let mut graded: Vec<FieldId> = Vec::new();
    let refinements = [
        (classify::OBSTACLE, config.obstacle_refinement()),
        (classify::INLET, config.inlet_refinement()),
    ];
    for (name, params) in refinements {
        let sources: Vec<Entity> = classification
            .tags(name)
            .into_iter()
            .map(Entity::surface)
            .collect();
        if sources.is_empty() {
            log::warn!("no `{name}` surfaces; skipping its refinement");
            continue;
        }
        graded.push(fields.build_graded_field(model, &sources, params)?);
    }
    if graded.is_empty() {
        return Ok(fields);
    }
    let background = fields.combine_min(&graded)?;
    fields.set_background(background)?;
    if let Some(bounds) = config.size_bounds {
        fields.set_bounds(bounds)?;
    }
    log::debug!("{} sizing fields, background {background:?}", fields.len());
    Ok(fields)
}

/// Runs the whole pipeline on a single rank.
///
/// `ownership` defaults to every generated node being local.
pub fn run_pipeline<G: MeshGenerator>(
    config: &PipelineConfig,
    generator: &G,
    ownership: Option<&NodeOwnership>,
) -> Result<PipelineOutput, MeshError> {
    let PreparedModel {
        model,
        classification,
        fields,
    } = prepare_model(config)?;

    let foreign = generator.generate(&model, &fields)?;
    log::info!(
        "generated {} nodes in {} element blocks",
        foreign.num_nodes(),
        foreign.blocks.len()
    );

    let importer = Importer::new(CellTypeTable::gmsh(), config.import.clone());
    let serial;
    let ownership = match ownership {
        Some(o) => o,
        None => {
            serial = NodeOwnership::serial(foreign.num_nodes());
            &serial
        }
    };
    let imported = importer.import(&foreign.nodes, &foreign.blocks, ownership)?;
    Ok(PipelineOutput {
        model,
        classification,
        fields,
        imported,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::classify::{INLET, OBSTACLE, OUTLET, WALL};

    #[test]
    fn prepared_channel_has_all_groups() {
        let prepared = prepare_model(&PipelineConfig::default()).unwrap();
        let model = &prepared.model;
        assert_eq!(model.group_by_name(3, FLUID).unwrap().marker, 1);
        assert_eq!(model.group_by_name(2, INLET).unwrap().tags, vec![1]);
        assert_eq!(model.group_by_name(2, OUTLET).unwrap().tags, vec![2]);
        assert_eq!(model.group_by_name(2, WALL).unwrap().tags, vec![3, 4, 5, 6]);
        assert_eq!(model.group_by_name(2, OBSTACLE).unwrap().tags, vec![7]);
        assert!(prepared.fields.background().is_some());
    }

    #[test]
    fn background_is_finest_near_the_obstacle() {
        let prepared = prepare_model(&PipelineConfig::default()).unwrap();
        let (model, fields) = (&prepared.model, &prepared.fields);
        let near = fields.mesh_size_at(model, [0.5, 0.2, 0.2 + 0.05]).unwrap();
        let far = fields.mesh_size_at(model, [2.0, 0.2, 0.2]).unwrap();
        assert!((near - 0.005).abs() < 1e-12);
        assert!((far - 0.05).abs() < 1e-12);
    }

    #[test]
    fn missing_msh_file_is_an_io_error() {
        let generator = MshFileGenerator::new("/nonexistent/channel.msh");
        let err = run_pipeline(&PipelineConfig::default(), &generator, None).unwrap_err();
        assert!(matches!(err, MeshError::Io(_)));
    }
}
