use tagged_mesh::algs::sizing::{Field, FieldSet, MeshSizeBounds, RefinementParams};
use tagged_mesh::geometry::channel::{ChannelParams, channel_with_obstacle};
use tagged_mesh::geometry::{Entity, Model};
use tagged_mesh::mesh_error::MeshError;

const OBSTACLE: Entity = Entity::surface(7);
const INLET: Entity = Entity::surface(1);

fn channel() -> Model {
    channel_with_obstacle(&ChannelParams::default()).unwrap()
}

#[test]
fn combine_min_matches_pointwise_minimum() {
    let model = channel();
    let r = ChannelParams::default().radius;
    let mut fields = FieldSet::new();
    let obstacle = fields
        .build_graded_field(&model, &[OBSTACLE], RefinementParams::obstacle(r))
        .unwrap();
    let inlet = fields
        .build_graded_field(&model, &[INLET], RefinementParams::inlet(r))
        .unwrap();
    let min = fields.combine_min(&[obstacle, inlet]).unwrap();

    // on the obstacle, in its grading band, and far from both sources
    let samples = [
        [0.5, 0.2, 0.25],
        [0.5, 0.2, 0.2 + 0.05 + 0.0375],
        [0.05, 0.2, 0.2],
        [0.3, 0.2, 0.2],
        [2.0, 0.3, 0.3],
    ];
    for p in samples {
        let a = fields.evaluate(&model, obstacle, p).unwrap();
        let b = fields.evaluate(&model, inlet, p).unwrap();
        let m = fields.evaluate(&model, min, p).unwrap();
        assert_eq!(m, a.min(b), "at {p:?}");
    }

    let on_obstacle = fields.evaluate(&model, min, samples[0]).unwrap();
    assert!((on_obstacle - 0.005).abs() < 1e-12);
    let mid = fields.evaluate(&model, obstacle, samples[1]).unwrap();
    assert!((mid - 0.0525).abs() < 1e-9, "{mid}");
    let far = fields.evaluate(&model, min, samples[4]).unwrap();
    assert!((far - 0.05).abs() < 1e-12);
}

#[test]
fn inverted_sizes_are_a_configuration_error() {
    let model = channel();
    let mut fields = FieldSet::new();
    let err = fields
        .build_graded_field(&model, &[OBSTACLE], RefinementParams::new(0.1, 0.05, 0.0, 1.0))
        .unwrap_err();
    assert!(matches!(err, MeshError::Configuration(_)));
    assert!(fields.is_empty());
}

#[test]
fn inverted_distances_are_a_configuration_error() {
    let model = channel();
    let mut fields = FieldSet::new();
    let err = fields
        .build_graded_field(&model, &[OBSTACLE], RefinementParams::new(0.01, 0.05, 1.0, 0.5))
        .unwrap_err();
    assert!(matches!(err, MeshError::Configuration(_)));
}

#[test]
fn unknown_source_entity_is_rejected() {
    let model = channel();
    let mut fields = FieldSet::new();
    let err = fields
        .build_graded_field(&model, &[Entity::surface(42)], RefinementParams::obstacle(0.05))
        .unwrap_err();
    assert_eq!(err, MeshError::MissingEntity { dim: 2, tag: 42 });
}

#[test]
fn background_size_is_clamped_to_bounds() {
    let model = channel();
    let mut fields = FieldSet::new();
    let g = fields
        .build_graded_field(&model, &[OBSTACLE], RefinementParams::obstacle(0.05))
        .unwrap();
    assert!(fields.mesh_size_at(&model, [0.5, 0.2, 0.25]).is_err());
    fields.set_background(g).unwrap();
    fields
        .set_bounds(MeshSizeBounds { min: 0.01, max: 0.08 })
        .unwrap();
    assert_eq!(fields.mesh_size_at(&model, [0.5, 0.2, 0.25]).unwrap(), 0.01);
    assert_eq!(fields.mesh_size_at(&model, [2.0, 0.2, 0.2]).unwrap(), 0.08);
}

#[test]
fn fields_only_reference_defined_fields() {
    let model = channel();
    let mut other = FieldSet::new();
    other.add_distance(&model, &[INLET]).unwrap();
    let foreign = other.add_distance(&model, &[OBSTACLE]).unwrap();

    let mut fields = FieldSet::new();
    let d = fields.add_distance(&model, &[INLET]).unwrap();
    let err = fields.add(Field::Min { fields: vec![d, foreign] }).unwrap_err();
    assert!(matches!(err, MeshError::Configuration(_)));
    assert!(fields.add(Field::Min { fields: vec![] }).is_err());
    assert!(fields.add(Field::Distance { sources: vec![] }).is_err());
    assert_eq!(fields.len(), 1);
}

#[test]
fn released_far_field_falls_back_to_coarsest_far_size() {
    let model = channel();
    let release = |p: RefinementParams| RefinementParams {
        stop_at_dist_max: true,
        ..p
    };
    let mut fields = FieldSet::new();
    let obstacle = fields
        .build_graded_field(&model, &[OBSTACLE], release(RefinementParams::new(0.005, 0.02, 0.0, 0.1)))
        .unwrap();
    let inlet = fields
        .build_graded_field(&model, &[INLET], release(RefinementParams::new(0.01, 0.04, 0.0, 0.1)))
        .unwrap();
    let min = fields.combine_min(&[obstacle, inlet]).unwrap();
    fields.set_background(min).unwrap();

    let far = [2.0, 0.2, 0.2];
    assert_eq!(fields.evaluate(&model, min, far).unwrap(), f64::INFINITY);
    assert_eq!(fields.coarsest_far_size(), Some(0.04));
    assert_eq!(fields.mesh_size_at(&model, far).unwrap(), 0.04);

    fields
        .set_bounds(MeshSizeBounds { min: 0.0, max: 0.03 })
        .unwrap();
    assert_eq!(fields.mesh_size_at(&model, far).unwrap(), 0.03);
}
