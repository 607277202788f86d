// SPDX-License-Identifier: MIT OR Apache-2.0
//! CPU-side mesh data and builders for the scene geometry.

use glam::Vec3;

/// Vertex layout shared by every mesh and line in the viewport
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Model-space position
    pub position: [f32; 3],
    /// Model-space normal (zero for lines)
    pub normal: [f32; 3],
    /// Linear RGB color
    pub color: [f32; 3],
}

/// Indexed triangle mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertices
    pub vertices: Vec<MeshVertex>,
    /// Triangle list indices
    pub indices: Vec<u32>,
}

/// Face normals of a box with two in-face axes each, ordered so `u x v = normal`
const BOX_FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::Y, Vec3::Z),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::Z, Vec3::X),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::Y, Vec3::X),
];

impl MeshData {
    /// Create an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Append a quad given its corners in counter-clockwise order.
    pub fn push_quad(&mut self, corners: [Vec3; 4], normal: Vec3, color: [f32; 3]) {
        let base = self.vertices.len() as u32;
        for corner in corners {
            self.vertices.push(MeshVertex {
                position: corner.to_array(),
                normal: normal.to_array(),
                color,
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Append an axis-aligned box
    pub fn push_box(&mut self, center: Vec3, size: Vec3, color: [f32; 3]) {
        let half = size * 0.5;
        for (normal, u, v) in BOX_FACES {
            let corner = |su: f32, sv: f32| center + half * (normal + su * u + sv * v);
            self.push_quad(
                [corner(-1.0, -1.0), corner(1.0, -1.0), corner(1.0, 1.0), corner(-1.0, 1.0)],
                normal,
                color,
            );
        }
    }

    /// Append a horizontal rectangle facing up at height `y`.
    pub fn push_ground_rect(&mut self, min: [f32; 2], max: [f32; 2], y: f32, color: [f32; 3]) {
        let [x0, z0] = min;
        let [x1, z1] = max;
        self.push_quad(
            [
                Vec3::new(x0, y, z1),
                Vec3::new(x1, y, z1),
                Vec3::new(x1, y, z0),
                Vec3::new(x0, y, z0),
            ],
            Vec3::Y,
            color,
        );
    }
}

/// Vertices for a line strip through `points`
pub fn line_strip(points: &[Vec3], color: [f32; 3]) -> Vec<MeshVertex> {
    points
        .iter()
        .map(|p| MeshVertex {
            position: p.to_array(),
            normal: [0.0; 3],
            color,
        })
        .collect()
}

/// Convert an 8-bit sRGB color to linear RGB
pub fn srgb_to_linear(rgb: [u8; 3]) -> [f32; 3] {
    rgb.map(|c| {
        let c = f32::from(c) / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_geometry() {
        let mut mesh = MeshData::new();
        mesh.push_box(Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.0, 2.0, 4.0), [1.0; 3]);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangle_count(), 12);

        for vertex in &mesh.vertices {
            let [x, y, z] = vertex.position;
            assert_eq!(x.abs(), 1.0);
            assert!(y == 0.0 || y == 2.0);
            assert_eq!(z.abs(), 2.0);
        }
    }

    #[test]
    fn test_box_faces_wind_outwards() {
        let mut mesh = MeshData::new();
        mesh.push_box(Vec3::ZERO, Vec3::ONE, [1.0; 3]);
        for triangle in mesh.indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|i| Vec3::from(mesh.vertices[triangle[i] as usize].position));
            let normal = Vec3::from(mesh.vertices[triangle[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(normal) > 0.0);
        }
    }

    #[test]
    fn test_ground_rect_faces_up() {
        let mut mesh = MeshData::new();
        mesh.push_ground_rect([-5.0, -5.0], [5.0, 5.0], 0.0, [0.5; 3]);
        let [a, b, c] = [0, 1, 2].map(|i| Vec3::from(mesh.vertices[i].position));
        assert!((b - a).cross(c - a).y > 0.0);
    }

    #[test]
    fn test_srgb_to_linear() {
        assert_eq!(srgb_to_linear([0, 0, 0]), [0.0, 0.0, 0.0]);
        let [white, _, _] = srgb_to_linear([255, 255, 255]);
        assert!((white - 1.0).abs() < 1e-5);
        let [r, _, _] = srgb_to_linear([0x87, 0, 0]);
        assert!((r - 0.242).abs() < 1e-3);
    }

    #[test]
    fn test_line_strip() {
        let vertices = line_strip(&[Vec3::ZERO, Vec3::X], [1.0, 0.0, 0.0]);
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[1].normal, [0.0; 3]);
    }
}
