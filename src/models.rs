// src/models.rs
use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

// --- Unit quad, used for screen-space label shapes ---
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex2D {
    pub position: [f32; 2],
}

impl Vertex2D {
    pub const QUAD_VERTICES: [Self; 4] = [
        Vertex2D { position: [-1.0, -1.0] }, // 0: Bottom-left
        Vertex2D { position: [ 1.0, -1.0] }, // 1: Bottom-right
        Vertex2D { position: [ 1.0,  1.0] }, // 2: Top-right
        Vertex2D { position: [-1.0,  1.0] }, // 3: Top-left
    ];

    pub const QUAD_INDICES: [u16; 6] = [
        0, 1, 2,
        0, 2, 3,
    ];

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            }],
        }
    }
}

// --- Rounded rectangle in pixel space (label pill, bullet dot) ---
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LabelShapeInstance {
    pub center: [f32; 2],    // pixels, origin top-left
    pub half_size: [f32; 2], // pixels
    pub corner_radius: f32,
    pub border_width: f32,
    pub fill: [f32; 4],      // linear RGBA
    pub border: [f32; 4],    // linear RGBA
}

impl LabelShapeInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        1 => Float32x2,
        2 => Float32x2,
        3 => Float32x2,
        4 => Float32x4,
        5 => Float32x4,
    ];

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

// --- Node mesh vertex ---
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
    ];

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

// --- Per-node instance data ---
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct NodeInstance {
    pub model: [[f32; 4]; 4], // node -> group space
    pub color: [f32; 4],      // linear RGBA
    pub emissive: [f32; 4],   // linear RGB, w = intensity
}

impl NodeInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
    ];

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

// --- Vertex Data for Lines (Connections) ---
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3], // group space
    pub color: [f32; 4],    // linear RGBA
}

impl LineVertex {
    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u16>,
}

impl Mesh {
    /// Flat-shaded twenty-sided solid with circumradius `radius`.
    pub fn icosahedron(radius: f32) -> Self {
        let t = (1.0 + 5.0f32.sqrt()) / 2.0;
        let corners = [
            [-1.0, t, 0.0], [1.0, t, 0.0], [-1.0, -t, 0.0], [1.0, -t, 0.0],
            [0.0, -1.0, t], [0.0, 1.0, t], [0.0, -1.0, -t], [0.0, 1.0, -t],
            [t, 0.0, -1.0], [t, 0.0, 1.0], [-t, 0.0, -1.0], [-t, 0.0, 1.0],
        ]
        .map(|c| Vec3::from_array(c).normalize() * radius);
        const FACES: [[usize; 3]; 20] = [
            [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
            [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
            [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
            [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
        ];

        let mut mesh = Mesh::default();
        for face in FACES {
            let [a, b, c] = face.map(|i| corners[i]);
            let normal = (b - a).cross(c - a).normalize();
            for p in [a, b, c] {
                mesh.indices.push(mesh.vertices.len() as u16);
                mesh.vertices.push(MeshVertex { position: p.to_array(), normal: normal.to_array() });
            }
        }
        mesh
    }

    /// Smooth UV sphere with `segments` around and `rings` from pole to pole.
    pub fn uv_sphere(radius: f32, segments: u16, rings: u16) -> Self {
        let mut mesh = Mesh::default();
        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let polar = v * PI;
            for segment in 0..=segments {
                let u = segment as f32 / segments as f32;
                let azimuth = u * TAU;
                let normal = Vec3::new(
                    -azimuth.cos() * polar.sin(),
                    polar.cos(),
                    azimuth.sin() * polar.sin(),
                );
                mesh.vertices.push(MeshVertex {
                    position: (normal * radius).to_array(),
                    normal: normal.to_array(),
                });
            }
        }

        let stride = segments + 1;
        for ring in 0..rings {
            for segment in 0..segments {
                let a = ring * stride + segment + 1;
                let b = ring * stride + segment;
                let c = (ring + 1) * stride + segment;
                let d = (ring + 1) * stride + segment + 1;
                if ring != 0 {
                    mesh.indices.extend_from_slice(&[a, b, d]);
                }
                if ring != rings - 1 {
                    mesh.indices.extend_from_slice(&[b, c, d]);
                }
            }
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icosahedron_faces_point_outward() {
        let mesh = Mesh::icosahedron(0.4);
        assert_eq!(mesh.vertices.len(), 60);
        assert_eq!(mesh.indices.len(), 60);
        for v in &mesh.vertices {
            let p = Vec3::from_array(v.position);
            assert!((p.length() - 0.4).abs() < 1e-5);
            assert!(p.dot(Vec3::from_array(v.normal)) > 0.0);
        }
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let mesh = Mesh::uv_sphere(0.6, 32, 32);
        assert_eq!(mesh.vertices.len(), 33 * 33);
        assert_eq!(mesh.indices.len() % 3, 0);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        for v in &mesh.vertices {
            assert!((Vec3::from_array(v.position).length() - 0.6).abs() < 1e-5);
        }
    }

    #[test]
    fn gpu_structs_are_tightly_packed() {
        assert_eq!(std::mem::size_of::<NodeInstance>(), 96);
        assert_eq!(std::mem::size_of::<LineVertex>(), 28);
        assert_eq!(std::mem::size_of::<LabelShapeInstance>(), 56);
    }
}
