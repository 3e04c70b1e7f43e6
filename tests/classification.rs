use std::collections::{BTreeSet, HashMap};

use proptest::prelude::*;
use tagged_mesh::algs::classify::{
    CatchAll, Classifier, Markers, Predicate, Target, Tolerance, channel_targets, classify,
};
use tagged_mesh::geometry::channel::{ChannelParams, channel_with_obstacle};
use tagged_mesh::geometry::{Axis, Entity, GeometryKernel, Point3};
use tagged_mesh::mesh_error::MeshError;

/// Kernel whose entities are bare points.
struct PointKernel(HashMap<Entity, Point3>);

impl GeometryKernel for PointKernel {
    fn entities(&self, dim: u8) -> Vec<Entity> {
        let mut out: Vec<Entity> = self.0.keys().copied().filter(|e| e.dim == dim).collect();
        out.sort_unstable();
        out
    }

    fn centroid(&self, entity: Entity) -> Result<Point3, MeshError> {
        self.0.get(&entity).copied().ok_or(MeshError::MissingEntity {
            dim: entity.dim,
            tag: entity.tag,
        })
    }

    fn distance(&self, entity: Entity, point: Point3) -> Result<f64, MeshError> {
        let c = self.centroid(entity)?;
        Ok(((c[0] - point[0]).powi(2) + (c[1] - point[1]).powi(2) + (c[2] - point[2]).powi(2)).sqrt())
    }

    fn contains(&self, entity: Entity) -> bool {
        self.0.contains_key(&entity)
    }
}

fn channel_params() -> impl Strategy<Value = ChannelParams> {
    (1.0..4.0f64, 0.2..1.0f64, 0.2..1.0f64, 0.2..0.8f64, 0.3..0.7f64, 0.01..0.05f64).prop_map(
        |(length, width, height, fx, fz, radius)| ChannelParams {
            length,
            width,
            height,
            obstacle_x: fx * length,
            obstacle_z: fz * height,
            radius,
        },
    )
}

proptest! {
    #[test]
    fn channel_surfaces_are_partitioned(params in channel_params()) {
        let model = channel_with_obstacle(&params).unwrap();
        let surfaces = model.entities(2);
        let markers = Markers::default();
        let targets = channel_targets(&params, &markers, Tolerance::default());
        let out = classify(&model, &surfaces, targets, markers.obstacle).unwrap();

        let mut seen = BTreeSet::new();
        for group in out.groups() {
            for &tag in &group.tags {
                prop_assert!(seen.insert(tag), "surface {} classified twice", tag);
            }
        }
        let input: BTreeSet<i32> = surfaces.iter().map(|e| e.tag).collect();
        prop_assert_eq!(seen, input);
        prop_assert_eq!(out.tags("inlet"), vec![1]);
        prop_assert_eq!(out.tags("outlet"), vec![2]);
        prop_assert_eq!(out.tags("obstacle"), vec![7]);
    }

    #[test]
    fn arbitrary_points_are_partitioned_with_catch_all(
        coords in proptest::collection::vec((0i8..3, 0i8..3, 0i8..3), 1..40)
    ) {
        let kernel = PointKernel(
            coords
                .iter()
                .enumerate()
                .map(|(i, &(x, y, z))| (Entity::surface(i as i32 + 1), [x as f64, y as f64, z as f64]))
                .collect(),
        );
        let tol = Tolerance::default();
        let targets = vec![
            Target::new("left", 10, Predicate::OnPlane { axis: Axis::X, offset: 0.0, tol }),
            Target::new("bottom", 11, Predicate::OnPlane { axis: Axis::Z, offset: 0.0, tol }),
        ];
        let surfaces = kernel.entities(2);
        let out = Classifier::new(targets)
            .with_catch_all(CatchAll::new("rest", 12))
            .classify(&kernel, &surfaces)
            .unwrap();

        let total: usize = out.groups().iter().map(|g| g.tags.len()).sum();
        prop_assert_eq!(total, surfaces.len());
        for e in &surfaces {
            let c = kernel.centroid(*e).unwrap();
            let expected = if c[0] == 0.0 { "left" } else if c[2] == 0.0 { "bottom" } else { "rest" };
            prop_assert_eq!(&out.category_of(e.tag).unwrap().name, expected);
        }
    }
}

#[test]
fn classification_registers_physical_groups() {
    let params = ChannelParams::default();
    let mut model = channel_with_obstacle(&params).unwrap();
    let markers = Markers::default();
    let surfaces = model.entities(2);
    let out = classify(
        &model,
        &surfaces,
        channel_targets(&params, &markers, Tolerance::default()),
        markers.obstacle,
    )
    .unwrap();
    out.register(&mut model).unwrap();

    let wall = model.group_by_name(2, "wall").unwrap();
    assert_eq!(wall.marker, 4);
    assert_eq!(wall.tags, vec![3, 4, 5, 6]);
    assert_eq!(model.group_of(Entity::surface(7)).unwrap().name, "obstacle");

    // markers are taken after the first registration
    assert!(out.register(&mut model).is_err());
}
