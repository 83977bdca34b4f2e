//! Surface Geometry Module
//!
//! Derives an upward-biased normal and an area for every triangle of the mesh.

use log::debug;
use nalgebra::{Point3, Vector3};

use crate::flux::FluxConfig;
use crate::mesh::Mesh;

// ===================== TYPES =====================

/// Geometry of one triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleGeometry {
    /// Unnormalised normal in mm²; its length is twice the triangle area.
    /// Always has `z >= 0`.
    pub normal: Vector3<f64>,
    /// Triangle area in m²
    pub area_m2: f64,
}

/// Per-triangle geometry of a whole mesh, in retained-triangle order.
#[derive(Debug, Clone, Default)]
pub struct SurfaceGeometry {
    pub triangles: Vec<TriangleGeometry>,
    pub total_area_m2: f64,
}

impl SurfaceGeometry {
    pub fn normals(&self) -> impl Iterator<Item = Vector3<f64>> + '_ {
        self.triangles.iter().map(|t| t.normal)
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

// ===================== GEOMETRY =====================

/// Normal and area of the triangle `p0, p1, p2`.
///
/// The normal follows the right-hand rule on the winding order and is then
/// flipped if it points below the horizontal plane. The flip is per triangle,
/// so a folded or non-convex surface is not made globally consistent.
/// Degenerate triangles yield a zero normal and zero area.
pub fn triangle_geometry(
    p0: Point3<f64>,
    p1: Point3<f64>,
    p2: Point3<f64>,
    config: &FluxConfig,
) -> TriangleGeometry {
    let edge1 = p1 - p0;
    let edge2 = p2 - p0;
    let mut normal = edge1.cross(&edge2);
    if normal.z < 0.0 {
        normal = -normal;
    }
    let area_m2 = normal.norm() * 0.5 * config.mm2_to_m2;
    TriangleGeometry { normal, area_m2 }
}

/// Geometry of every retained triangle of `mesh`, plus the total area.
pub fn compute_geometry(mesh: &Mesh, config: &FluxConfig) -> SurfaceGeometry {
    let mut triangles = Vec::with_capacity(mesh.triangle_count());
    let mut total_area_m2 = 0.0;

    for triangle in mesh.triangles() {
        // Node references were validated by the loader.
        let Some([p0, p1, p2]) = mesh.corner_positions(triangle) else {
            continue;
        };
        let geometry = triangle_geometry(p0, p1, p2, config);
        total_area_m2 += geometry.area_m2;
        triangles.push(geometry);
    }

    debug!("Surface geometry: {} triangles, {:.4} m²", triangles.len(), total_area_m2);
    SurfaceGeometry { triangles, total_area_m2 }
}

// ===================== TESTS =====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::parse_mesh;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    #[test]
    fn test_right_triangle_area() {
        let g = triangle_geometry(
            p(0.0, 0.0, 0.0),
            p(1000.0, 0.0, 0.0),
            p(0.0, 1000.0, 0.0),
            &FluxConfig::default(),
        );
        assert_relative_eq!(g.area_m2, 0.5, epsilon = 1e-12);
        assert_relative_eq!(g.normal, Vector3::new(0.0, 0.0, 1_000_000.0));
    }

    #[test]
    fn test_winding_does_not_change_normal() {
        let config = FluxConfig::default();
        let a = p(0.0, 0.0, 0.0);
        let b = p(800.0, 100.0, 50.0);
        let c = p(200.0, 900.0, -30.0);

        let ccw = triangle_geometry(a, b, c, &config);
        let cw = triangle_geometry(a, c, b, &config);

        assert!(ccw.normal.z >= 0.0 && cw.normal.z >= 0.0);
        assert_relative_eq!(ccw.normal, cw.normal, epsilon = 1e-9);
        assert_relative_eq!(ccw.area_m2, cw.area_m2, epsilon = 1e-15);
        // |n| is twice the area in mm²
        assert_relative_eq!(ccw.normal.norm(), 2.0 * ccw.area_m2 * 1e6, max_relative = 1e-12);
    }

    #[test]
    fn test_downward_normal_is_flipped() {
        // Clockwise seen from above: raw cross product points to -z
        let g = triangle_geometry(
            p(0.0, 0.0, 0.0),
            p(0.0, 1000.0, 0.0),
            p(1000.0, 0.0, 0.0),
            &FluxConfig::default(),
        );
        assert!(g.normal.z > 0.0, "normal {:?} should point up", g.normal);
    }

    #[test]
    fn test_vertical_triangle_keeps_horizontal_normal() {
        let g = triangle_geometry(
            p(0.0, 0.0, 0.0),
            p(1000.0, 0.0, 0.0),
            p(0.0, 0.0, 1000.0),
            &FluxConfig::default(),
        );
        assert_eq!(g.normal.z, 0.0);
        assert_relative_eq!(g.area_m2, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_triangles_have_zero_area() {
        let config = FluxConfig::default();
        let collinear = triangle_geometry(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0), p(2.0, 2.0, 2.0), &config);
        let coincident = triangle_geometry(p(5.0, 5.0, 5.0), p(5.0, 5.0, 5.0), p(5.0, 5.0, 5.0), &config);

        for g in [collinear, coincident] {
            assert_eq!(g.area_m2, 0.0);
            assert!(g.normal.iter().all(|c| c.is_finite()));
        }
    }

    #[test]
    fn test_total_area_sums_all_triangles() {
        // Unit square (1 m x 1 m) split in two, plus a tilted triangle
        let mesh = parse_mesh(
            "\
$Nodes
5
1 0 0 0
2 1000 0 0
3 1000 1000 0
4 0 1000 0
5 0 0 1000
$EndNodes
$Elements
3
1 2 2 0 1 1 2 3
2 2 2 0 1 1 3 4
3 2 2 0 1 1 2 5
$EndElements
",
        )
        .unwrap();

        let surface = compute_geometry(&mesh, &FluxConfig::default());
        assert_eq!(surface.len(), 3);
        assert_relative_eq!(surface.total_area_m2, 1.5, epsilon = 1e-12);
        assert!(surface.normals().all(|n| n.z >= 0.0));
    }
}
