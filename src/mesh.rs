//! Mesh Loading Module
//!
//! Parses the node/element mesh description of the car surface (gmsh ASCII
//! layout) into a node table and a triangle table.
//!
//! Only the `$Nodes` and `$Elements` sections are read; any other section
//! (`$MeshFormat`, `$PhysicalNames`, ...) is skipped. Elements of a type other
//! than the 3-node triangle are parsed for validity and then dropped.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use log::{debug, warn};
use nalgebra::Point3;

use crate::error::{FluxError, Result};

// ===================== CONSTANTS =====================

/// Element type code of a 3-node triangle.
pub const TRIANGLE_ELEMENT_TYPE: u32 = 2;

const NODES_START: &str = "$Nodes";
const NODES_END: &str = "$EndNodes";
const ELEMENTS_START: &str = "$Elements";
const ELEMENTS_END: &str = "$EndElements";

// ===================== TYPES =====================

/// A mesh vertex. Position is in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: u64,
    pub position: Point3<f64>,
}

/// A retained 3-node triangle. Corner order is the file's winding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub id: u64,
    pub element_type: u32,
    pub nodes: [u64; 3],
}

/// Node and triangle tables, both addressable by their native identifiers.
///
/// Storage is dense; `node_slots`/`triangle_slots` map an identifier to its
/// position. Retained triangles keep file order, so in a mixed-element mesh the
/// position of a triangle is unrelated to its element id.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    nodes: Vec<Node>,
    node_slots: HashMap<u64, usize>,
    triangles: Vec<Triangle>,
    triangle_slots: HashMap<u64, usize>,
}

impl Mesh {
    /// Look up a node by identifier.
    pub fn node(&self, id: u64) -> Option<&Node> {
        self.node_slots.get(&id).map(|&slot| &self.nodes[slot])
    }

    /// Look up a retained triangle by element identifier.
    pub fn triangle(&self, id: u64) -> Option<&Triangle> {
        self.triangle_slots.get(&id).map(|&slot| &self.triangles[slot])
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Corner positions of a triangle, in winding order.
    ///
    /// Every retained triangle was checked against the node table at load
    /// time, so this only returns `None` for a triangle from another mesh.
    pub fn corner_positions(&self, triangle: &Triangle) -> Option<[Point3<f64>; 3]> {
        let [a, b, c] = triangle.nodes;
        Some([self.node(a)?.position, self.node(b)?.position, self.node(c)?.position])
    }
}

impl FromStr for Mesh {
    type Err = FluxError;

    fn from_str(s: &str) -> Result<Self> {
        parse_mesh(s)
    }
}

// ===================== LOADING =====================

/// Read and parse a mesh file.
///
/// The file handle is scoped to this call and released on every exit path,
/// including parse failures.
///
/// # Errors
/// `ResourceUnavailable` if the file cannot be opened or read,
/// `MalformedMesh` if its content is invalid.
pub fn load_mesh(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(unavailable(path))?;

    let mut parser = MeshParser::default();
    for line in BufReader::new(file).lines() {
        parser.feed(&line.map_err(unavailable(path))?)?;
    }
    let mesh = parser.finish()?;
    debug!("Loaded mesh from {}", path.display());
    Ok(mesh)
}

/// Parse a mesh held in memory.
pub fn parse_mesh(text: &str) -> Result<Mesh> {
    let mut parser = MeshParser::default();
    for line in text.lines() {
        parser.feed(line)?;
    }
    parser.finish()
}

fn unavailable(path: &Path) -> impl Fn(io::Error) -> FluxError + '_ {
    move |source| FluxError::ResourceUnavailable { path: path.to_path_buf(), source }
}

// ===================== PARSER =====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Nodes,
    Elements,
}

impl Section {
    fn end_marker(self) -> &'static str {
        match self {
            Section::Nodes => NODES_END,
            Section::Elements => ELEMENTS_END,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    /// Opening marker seen; the next line is the record count.
    Count(Section),
    Records(Section),
}

struct MeshParser {
    mesh: Mesh,
    state: State,
    line: usize,
    nodes_done: bool,
    elements_done: bool,
    declared: usize,
    records: usize,
    skipped_elements: usize,
}

impl Default for MeshParser {
    fn default() -> Self {
        Self {
            mesh: Mesh::default(),
            state: State::Outside,
            line: 0,
            nodes_done: false,
            elements_done: false,
            declared: 0,
            records: 0,
            skipped_elements: 0,
        }
    }
}

impl MeshParser {
    fn feed(&mut self, raw: &str) -> Result<()> {
        self.line += 1;
        let line = raw.trim();
        if line.is_empty() {
            return Ok(());
        }

        match line {
            NODES_START => return self.open(Section::Nodes),
            ELEMENTS_START => return self.open(Section::Elements),
            NODES_END => return self.close(Section::Nodes),
            ELEMENTS_END => return self.close(Section::Elements),
            _ => {}
        }

        match self.state {
            State::Outside => Ok(()),
            State::Count(section) => {
                if line.starts_with('$') {
                    return Err(self.error(format!("expected record count, found {line}")));
                }
                self.declared = line
                    .parse()
                    .map_err(|_| self.error(format!("invalid record count {line:?}")))?;
                self.records = 0;
                self.state = State::Records(section);
                Ok(())
            }
            State::Records(section) => {
                if line.starts_with('$') {
                    return Err(self.error(format!(
                        "unexpected {line} before {}",
                        section.end_marker()
                    )));
                }
                self.records += 1;
                match section {
                    Section::Nodes => self.node_record(line),
                    Section::Elements => self.element_record(line),
                }
            }
        }
    }

    fn open(&mut self, section: Section) -> Result<()> {
        if let State::Count(open) | State::Records(open) = self.state {
            return Err(self.error(format!("section opened before {}", open.end_marker())));
        }
        match section {
            Section::Nodes if self.nodes_done => {
                return Err(self.error("duplicate $Nodes section"));
            }
            Section::Elements if self.elements_done => {
                return Err(self.error("duplicate $Elements section"));
            }
            Section::Elements if !self.nodes_done => {
                return Err(self.error("$Elements section appears before $Nodes"));
            }
            _ => {}
        }
        self.state = State::Count(section);
        Ok(())
    }

    fn close(&mut self, section: Section) -> Result<()> {
        match self.state {
            State::Records(open) if open == section => {}
            State::Count(open) if open == section => {
                return Err(self.error(format!("record count missing before {}", open.end_marker())));
            }
            _ => {
                return Err(self.error(format!("{} without matching opening marker", section.end_marker())));
            }
        }

        let kind = match section {
            Section::Nodes => {
                self.nodes_done = true;
                "nodes"
            }
            Section::Elements => {
                self.elements_done = true;
                "elements"
            }
        };
        if self.records != self.declared {
            warn!(
                "Mesh declares {} {} but lists {} (line {})",
                self.declared, kind, self.records, self.line
            );
        }
        self.state = State::Outside;
        Ok(())
    }

    fn node_record(&mut self, line: &str) -> Result<()> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(self.error(format!("node record needs 4 fields, got {}", fields.len())));
        }
        let id: u64 = self.field(&fields, 0, "node id")?;
        if id == 0 {
            return Err(self.error("node id must be positive"));
        }
        let x: f64 = self.field(&fields, 1, "x coordinate")?;
        let y: f64 = self.field(&fields, 2, "y coordinate")?;
        let z: f64 = self.field(&fields, 3, "z coordinate")?;

        if self.mesh.node_slots.insert(id, self.mesh.nodes.len()).is_some() {
            return Err(self.error(format!("duplicate node id {id}")));
        }
        self.mesh.nodes.push(Node { id, position: Point3::new(x, y, z) });
        Ok(())
    }

    fn element_record(&mut self, line: &str) -> Result<()> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(self.error(format!("element record needs at least 3 fields, got {}", fields.len())));
        }
        let id: u64 = self.field(&fields, 0, "element id")?;
        let element_type: u32 = self.field(&fields, 1, "element type")?;
        let num_tags: usize = self.field(&fields, 2, "tag count")?;

        if element_type != TRIANGLE_ELEMENT_TYPE {
            self.skipped_elements += 1;
            return Ok(());
        }

        // Corner ids follow the tags: offsets 5, 6, 7 for the usual two tags.
        if num_tags > fields.len() {
            return Err(self.error(format!("triangle {id} declares {num_tags} tags but has {} fields", fields.len())));
        }
        let first = 3 + num_tags;
        if fields.len() < first + 3 {
            return Err(self.error(format!(
                "triangle {id} needs {} fields for {num_tags} tags, got {}",
                first + 3,
                fields.len()
            )));
        }
        let mut nodes = [0u64; 3];
        for (k, slot) in nodes.iter_mut().enumerate() {
            *slot = self.field(&fields, first + k, "triangle node id")?;
            if self.mesh.node(*slot).is_none() {
                return Err(self.error(format!("triangle {id} references unknown node {slot}")));
            }
        }

        if self.mesh.triangle_slots.insert(id, self.mesh.triangles.len()).is_some() {
            return Err(self.error(format!("duplicate element id {id}")));
        }
        self.mesh.triangles.push(Triangle { id, element_type, nodes });
        Ok(())
    }

    fn field<T: FromStr>(&self, fields: &[&str], index: usize, what: &str) -> Result<T> {
        let raw = fields[index];
        raw.parse().map_err(|_| self.error(format!("invalid {what} {raw:?}")))
    }

    fn error(&self, reason: impl Into<String>) -> FluxError {
        FluxError::malformed(self.line, reason)
    }

    fn finish(mut self) -> Result<Mesh> {
        if let State::Count(open) | State::Records(open) = self.state {
            self.line += 1;
            return Err(self.error(format!("missing {} at end of input", open.end_marker())));
        }
        if !self.nodes_done {
            return Err(self.error("missing $Nodes section"));
        }
        if !self.elements_done {
            return Err(self.error("missing $Elements section"));
        }

        debug!(
            "Parsed mesh: {} nodes, {} triangles, {} other elements skipped",
            self.mesh.node_count(),
            self.mesh.triangle_count(),
            self.skipped_elements
        );
        Ok(self.mesh)
    }
}

// ===================== TESTS =====================

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE_TRIANGLE: &str = "\
$MeshFormat
2.2 0 8
$EndMeshFormat
$Nodes
3
1 0 0 0
2 1000 0 0
3 0 1000 0
$EndNodes
$Elements
1
1 2 2 0 1 1 2 3
$EndElements
";

    fn assert_malformed(text: &str, needle: &str) {
        match parse_mesh(text) {
            Err(FluxError::MalformedMesh { reason, .. }) => assert!(
                reason.contains(needle),
                "Expected reason containing {:?}, got {:?}",
                needle,
                reason
            ),
            other => panic!("Expected MalformedMesh, got {:?}", other),
        }
    }

    #[test]
    fn test_single_triangle() {
        let mesh = parse_mesh(SINGLE_TRIANGLE).unwrap();
        assert_eq!(mesh.node_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);

        let tri = mesh.triangle(1).unwrap();
        assert_eq!(tri.nodes, [1, 2, 3]);
        assert_eq!(tri.element_type, TRIANGLE_ELEMENT_TYPE);
        assert_eq!(mesh.node(2).unwrap().position, Point3::new(1000.0, 0.0, 0.0));
    }

    #[test]
    fn test_from_str_matches_parse_mesh() {
        let mesh: Mesh = SINGLE_TRIANGLE.parse().unwrap();
        assert_eq!(mesh.triangles(), parse_mesh(SINGLE_TRIANGLE).unwrap().triangles());
    }

    #[test]
    fn test_sparse_node_ids_lookup_by_identifier() {
        let text = "\
$Nodes
3
10 0 0 0
42 5 0 0
7 0 5 1.5
$EndNodes
$Elements
1
99 2 2 0 1 10 42 7
$EndElements
";
        let mesh = parse_mesh(text).unwrap();
        assert_eq!(mesh.node(7).unwrap().position.z, 1.5);
        assert!(mesh.node(1).is_none());
        assert!(mesh.node(0).is_none());

        let tri = mesh.triangle(99).unwrap();
        let corners = mesh.corner_positions(tri).unwrap();
        assert_eq!(corners[1], Point3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_mixed_elements_only_keep_triangles() {
        let text = "\
$Nodes
4
1 0 0 0
2 1 0 0
3 0 1 0
4 1 1 0
$EndNodes
$Elements
5
1 15 2 0 1 1
2 1 2 0 1 1 2
3 2 2 0 1 1 2 3
4 1 2 0 1 2 4
5 2 2 0 1 2 4 3
$EndElements
";
        let mesh = parse_mesh(text).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        // Retained position differs from element id
        assert_eq!(mesh.triangles()[0].id, 3);
        assert_eq!(mesh.triangles()[1].id, 5);
        assert_eq!(mesh.triangle(5).unwrap().nodes, [2, 4, 3]);
        assert!(mesh.triangle(2).is_none(), "line elements must not be retained");
    }

    #[test]
    fn test_tag_count_moves_corner_offsets() {
        let text = "\
$Nodes
3
1 0 0 0
2 1 0 0
3 0 1 0
$EndNodes
$Elements
2
1 2 3 0 1 7 1 2 3
2 2 0 3 2 1
$EndElements
";
        let mesh = parse_mesh(text).unwrap();
        assert_eq!(mesh.triangle(1).unwrap().nodes, [1, 2, 3]);
        assert_eq!(mesh.triangle(2).unwrap().nodes, [3, 2, 1]);
    }

    #[test]
    fn test_count_mismatch_is_tolerated() {
        let text = SINGLE_TRIANGLE.replace("$Nodes\n3", "$Nodes\n5");
        let mesh = parse_mesh(&text).unwrap();
        assert_eq!(mesh.node_count(), 3);
    }

    #[test]
    fn test_missing_end_elements() {
        let text = SINGLE_TRIANGLE.replace("$EndElements\n", "");
        assert_malformed(&text, "missing $EndElements");
    }

    #[test]
    fn test_unknown_node_reference() {
        let text = SINGLE_TRIANGLE.replace("1 2 2 0 1 1 2 3", "1 2 2 0 1 1 2 4");
        assert_malformed(&text, "unknown node 4");
    }

    #[test]
    fn test_elements_before_nodes() {
        let text = "\
$Elements
0
$EndElements
$Nodes
0
$EndNodes
";
        assert_malformed(text, "before $Nodes");
    }

    #[test]
    fn test_missing_sections() {
        assert_malformed("", "missing $Nodes");
        assert_malformed("$Nodes\n0\n$EndNodes\n", "missing $Elements");
    }

    #[test]
    fn test_nested_marker_is_rejected() {
        let text = SINGLE_TRIANGLE.replace("$EndNodes\n", "");
        assert_malformed(&text, "before $EndNodes");
    }

    #[test]
    fn test_unmatched_end_marker() {
        assert_malformed("$EndNodes\n", "without matching");
    }

    #[test]
    fn test_bad_numeric_fields() {
        assert_malformed(&SINGLE_TRIANGLE.replace("2 1000 0 0", "2 1e3 zero 0"), "y coordinate");
        assert_malformed(&SINGLE_TRIANGLE.replace("$Nodes\n3", "$Nodes\nthree"), "record count");
        assert_malformed(&SINGLE_TRIANGLE.replace("1 2 2 0 1 1 2 3", "1 2 2 0 1 1 2"), "needs 8 fields");
        assert_malformed(&SINGLE_TRIANGLE.replace("3 0 1000 0", "3 0 1000"), "4 fields");
    }

    #[test]
    fn test_oversized_tag_count_is_malformed() {
        let huge = format!("1 2 {} 1 2 3", usize::MAX);
        assert_malformed(&SINGLE_TRIANGLE.replace("1 2 2 0 1 1 2 3", &huge), "declares");

        // Just past the end of the record: the offset exists but the corners do not
        assert_malformed(&SINGLE_TRIANGLE.replace("1 2 2 0 1 1 2 3", "1 2 5 0 1 1 2 3"), "needs 11 fields");
    }

    #[test]
    fn test_duplicate_node_id() {
        let text = SINGLE_TRIANGLE.replace("3 0 1000 0", "2 0 1000 0");
        assert_malformed(&text, "duplicate node id 2");
    }

    #[test]
    fn test_error_reports_line_number() {
        let text = SINGLE_TRIANGLE.replace("1 2 2 0 1 1 2 3", "1 2 2 0 1 1 2 9");
        match parse_mesh(&text) {
            Err(FluxError::MalformedMesh { line, .. }) => assert_eq!(line, 12),
            other => panic!("Expected MalformedMesh, got {:?}", other),
        }
    }

    #[test]
    fn test_load_mesh_missing_file() {
        let err = load_mesh("/nonexistent/dir/car.msh").unwrap_err();
        assert!(matches!(err, FluxError::ResourceUnavailable { .. }), "got {:?}", err);
    }
}
