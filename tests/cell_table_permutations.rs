use proptest::prelude::*;
use tagged_mesh::mesh_error::MeshError;
use tagged_mesh::topology::{CellType, CellTypeTable};

proptest! {
    #[test]
    fn permutation_then_inverse_is_identity(
        seed in proptest::collection::vec(any::<u64>(), 27)
    ) {
        let table = CellTypeTable::gmsh();
        for id in table.type_ids() {
            let entry = table.entry(id).unwrap();
            let cell = &seed[..entry.num_nodes()];
            let local = entry.permute(cell);
            prop_assert_eq!(entry.inverse_permute(&local), cell.to_vec(), "type {}", id);
            prop_assert_eq!(entry.permute(&entry.inverse_permute(cell)), cell.to_vec());
        }
    }
}

#[test]
fn every_gmsh_entry_resolves_consistently() {
    let table = CellTypeTable::gmsh();
    let ids: Vec<u32> = table.type_ids().collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 15]);
    for id in ids {
        let info = table.resolve(id).unwrap();
        assert_eq!(info.type_id, id);
        assert_eq!(info.dim, info.cell_type.dimension());
        assert!(info.num_nodes >= info.cell_type.num_vertices());
    }
    let tet10 = table.resolve(11).unwrap();
    assert_eq!((tet10.cell_type, tet10.num_nodes), (CellType::Tetrahedron, 10));
}

#[test]
fn gmsh_quad_becomes_tensor_ordered() {
    let table = CellTypeTable::gmsh();
    let quad = table.entry(3).unwrap();
    // counter-clockwise corners in, lexicographic corners out
    assert_eq!(quad.permute(&[10, 11, 12, 13]), vec![10, 11, 13, 12]);
    let block = quad.permute_block(&[0, 1, 2, 3, 4, 5, 6, 7]).unwrap();
    assert_eq!(block, vec![0, 1, 3, 2, 4, 5, 7, 6]);
    assert!(quad.permute_block(&[0, 1, 2]).is_err());
}

#[test]
fn table_is_injectable() {
    let mut table = CellTypeTable::empty();
    assert_eq!(table.resolve(4).unwrap_err(), MeshError::UnknownCellType(4));
    table.insert(1004, CellType::Tetrahedron, vec![0, 2, 1, 3]).unwrap();
    let info = table.resolve(1004).unwrap();
    assert_eq!(info.dim, 3);
    assert_eq!(table.entry(1004).unwrap().permute(&[7, 8, 9, 10]), vec![7, 9, 8, 10]);

    let bad = table.insert(1005, CellType::Triangle, vec![0, 0, 1]);
    assert!(matches!(bad, Err(MeshError::InvalidPermutation(_))));
    let short = table.insert(1006, CellType::Hexahedron, vec![0, 1, 2, 3]);
    assert!(matches!(short, Err(MeshError::InvalidPermutation(_))));
}
