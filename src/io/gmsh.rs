//! Gmsh `.msh` reader producing a [`ForeignMesh`].
//!
//! # Supported format
//! - ASCII `.msh` version **2.2**.
//! - Any element type id; unknown ids are kept as-is and rejected later by the
//!   importer's cell table, so the reader needs no knowledge of node counts
//!   beyond what each element line states.
//! - `$PhysicalNames` are collected into [`ForeignMesh::physical_names`].
//!
//! # Conventions
//! - Node ids are renumbered densely in ascending file-id order.
//! - The element marker is the first tag (the physical group), `0` when the
//!   element carries no tags.
//! - Node ordering inside each element is left in Gmsh order.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::io::{ForeignMesh, ForeignTopologyBlock};
use crate::mesh_error::MeshError;

/// Gmsh `.msh` reader for ASCII v2.2 meshes.
#[derive(Debug, Default, Clone)]
pub struct GmshReader;

fn parse_err(message: impl Into<String>) -> MeshError {
    MeshError::MeshIoParse(message.into())
}

impl GmshReader {
    fn parse_version(line: &str) -> Result<&str, MeshError> {
        let mut parts = line.split_whitespace();
        let version = parts
            .next()
            .ok_or_else(|| parse_err("missing mesh format version"))?;
        let file_type = parts
            .next()
            .ok_or_else(|| parse_err("missing mesh format type"))?;
        if file_type != "0" {
            return Err(parse_err("binary .msh files are not supported"));
        }
        Ok(version)
    }

    fn parse_num<T: std::str::FromStr>(raw: Option<&str>, what: &str) -> Result<T, MeshError> {
        let raw = raw.ok_or_else(|| parse_err(format!("missing {what}")))?;
        raw.parse::<T>()
            .map_err(|_| parse_err(format!("invalid {what}: {raw}")))
    }

    fn expect_end<'a, I>(lines: &mut I, marker: &str) -> Result<(), MeshError>
    where
        I: Iterator<Item = &'a str>,
    {
        match lines.next() {
            Some(end) if end.trim() == marker => Ok(()),
            _ => Err(parse_err(format!("missing {marker}"))),
        }
    }

    /// Reads a mesh file from disk.
    pub fn read_path(&self, path: impl AsRef<Path>) -> Result<ForeignMesh, MeshError> {
        let file = File::open(path.as_ref())?;
        self.read(BufReader::new(file))
    }

    /// Parses a mesh from `reader`.
    pub fn read<R: Read>(&self, mut reader: R) -> Result<ForeignMesh, MeshError> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        let mut lines = contents.lines();

        let mut version: Option<String> = None;
        let mut nodes: Vec<(u64, [f64; 3])> = Vec::new();
        let mut elements: Vec<(u32, i32, Vec<u64>)> = Vec::new();
        let mut physical_names = BTreeMap::new();

        while let Some(line) = lines.next() {
            match line.trim() {
                "$MeshFormat" => {
                    let format_line = lines.next().ok_or_else(|| parse_err("missing MeshFormat"))?;
                    version = Some(Self::parse_version(format_line)?.to_string());
                    Self::expect_end(&mut lines, "$EndMeshFormat")?;
                }
                "$PhysicalNames" => {
                    let count: usize = Self::parse_num(lines.next(), "physical name count")?;
                    for _ in 0..count {
                        let entry = lines
                            .next()
                            .ok_or_else(|| parse_err("unexpected end of physical names"))?;
                        let mut parts = entry.splitn(3, char::is_whitespace);
                        let dim: u8 = Self::parse_num(parts.next(), "physical dimension")?;
                        let tag: i32 = Self::parse_num(parts.next(), "physical tag")?;
                        let name = parts
                            .next()
                            .ok_or_else(|| parse_err("missing physical name"))?
                            .trim()
                            .trim_matches('"')
                            .to_string();
                        physical_names.insert((dim, tag), name);
                    }
                    Self::expect_end(&mut lines, "$EndPhysicalNames")?;
                }
                "$Nodes" => {
                    let count: usize = Self::parse_num(lines.next(), "node count")?;
                    nodes.reserve(count);
                    for _ in 0..count {
                        let node_line = lines
                            .next()
                            .ok_or_else(|| parse_err("unexpected end of node list"))?;
                        let mut parts = node_line.split_whitespace();
                        let id: u64 = Self::parse_num(parts.next(), "node id")?;
                        let x: f64 = Self::parse_num(parts.next(), "x coordinate")?;
                        let y: f64 = Self::parse_num(parts.next(), "y coordinate")?;
                        let z: f64 = Self::parse_num(parts.next(), "z coordinate")?;
                        nodes.push((id, [x, y, z]));
                    }
                    Self::expect_end(&mut lines, "$EndNodes")?;
                }
                "$Elements" => {
                    let count: usize = Self::parse_num(lines.next(), "element count")?;
                    elements.reserve(count);
                    for _ in 0..count {
                        let elem_line = lines
                            .next()
                            .ok_or_else(|| parse_err("unexpected end of element list"))?;
                        let mut parts = elem_line.split_whitespace();
                        let _id: u64 = Self::parse_num(parts.next(), "element id")?;
                        let elem_type: u32 = Self::parse_num(parts.next(), "element type")?;
                        let num_tags: usize = Self::parse_num(parts.next(), "element tag count")?;
                        let mut marker = 0;
                        for i in 0..num_tags {
                            let tag: i32 = Self::parse_num(parts.next(), "element tag")?;
                            if i == 0 {
                                marker = tag;
                            }
                        }
                        let conn = parts
                            .map(|raw| Self::parse_num::<u64>(Some(raw), "element node id"))
                            .collect::<Result<Vec<_>, _>>()?;
                        if conn.is_empty() {
                            return Err(parse_err("element without nodes"));
                        }
                        elements.push((elem_type, marker, conn));
                    }
                    Self::expect_end(&mut lines, "$EndElements")?;
                }
                _ => {
                    // ignore other sections
                }
            }
        }

        let version = version.unwrap_or_else(|| "2.2".to_string());
        if version != "2.2" {
            return Err(parse_err(format!("unsupported gmsh version: {version}")));
        }

        nodes.sort_by_key(|&(id, _)| id);
        if let Some(w) = nodes.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(parse_err(format!("duplicate node id {}", w[0].0)));
        }
        let index_of = |id: u64| {
            nodes
                .binary_search_by_key(&id, |&(nid, _)| nid)
                .map_err(|_| parse_err(format!("element references unknown node {id}")))
        };

        let mut blocks: BTreeMap<u32, ForeignTopologyBlock> = BTreeMap::new();
        let mut widths: BTreeMap<u32, usize> = BTreeMap::new();
        for (elem_type, marker, conn) in elements {
            let width = *widths.entry(elem_type).or_insert(conn.len());
            if width != conn.len() {
                return Err(parse_err(format!(
                    "element type {elem_type} has both {width} and {} nodes",
                    conn.len()
                )));
            }
            let block = blocks.entry(elem_type).or_default();
            for id in conn {
                block.connectivity.push(index_of(id)?);
            }
            block.markers.push(marker);
        }

        log::debug!(
            "read gmsh mesh: {} nodes, {} element blocks",
            nodes.len(),
            blocks.len()
        );
        Ok(ForeignMesh {
            nodes: nodes.into_iter().map(|(_, xyz)| xyz).collect(),
            blocks,
            physical_names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESH: &str = r#"$MeshFormat
2.2 0 8
$EndMeshFormat
$PhysicalNames
2
2 4 "wall"
3 1 "fluid"
$EndPhysicalNames
$Nodes
4
10 0 0 0
20 1 0 0
30 0 1 0
40 0 0 1
$EndNodes
$Elements
2
1 2 2 4 7 10 20 30
2 4 2 1 1 10 20 30 40
$EndElements
"#;

    #[test]
    fn nodes_are_renumbered_densely() {
        let mesh = GmshReader.read(MESH.as_bytes()).unwrap();
        assert_eq!(mesh.num_nodes(), 4);
        assert_eq!(mesh.blocks[&2].connectivity, vec![0, 1, 2]);
        assert_eq!(mesh.blocks[&2].markers, vec![4]);
        assert_eq!(mesh.blocks[&4].connectivity, vec![0, 1, 2, 3]);
        assert_eq!(mesh.nodes[3], [0.0, 0.0, 1.0]);
        assert_eq!(mesh.physical_names[&(2, 4)], "wall");
    }

    #[test]
    fn unknown_node_reference_is_a_parse_error() {
        let bad = MESH.replace("10 20 30 40", "10 20 30 99");
        assert!(matches!(
            GmshReader.read(bad.as_bytes()),
            Err(MeshError::MeshIoParse(_))
        ));
    }

    #[test]
    fn binary_files_are_rejected() {
        let bad = MESH.replace("2.2 0 8", "2.2 1 8");
        assert!(GmshReader.read(bad.as_bytes()).is_err());
    }
}
