//! CPU-side mesh data and procedural mesh generators.

use std::f32::consts::PI;
use std::hash::{Hash, Hasher};

// ============================================================================
// Vertex
// ============================================================================

/// Vertex with position, normal and texture coordinates.
///
/// Layout matches the attribute order expected by the forward shaders:
/// location 0 is position, 1 is normal, 2 is uv.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in model space.
    pub position: [f32; 3],
    /// Unit normal in model space.
    pub normal: [f32; 3],
    /// Texture coordinates.
    pub uv: [f32; 2],
}

impl Vertex {
    /// Create a new vertex.
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

// ============================================================================
// CpuMesh
// ============================================================================

/// Indexed triangle mesh waiting to be uploaded to the GPU.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuMesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    label: String,
}

impl CpuMesh {
    /// Create a mesh from vertex and index data.
    ///
    /// Indices must reference valid vertices and come in triples.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        debug_assert!(indices.len() % 3 == 0, "index count must be a multiple of 3");
        debug_assert!(
            indices.iter().all(|&i| (i as usize) < vertices.len()),
            "index out of range"
        );
        Self {
            vertices,
            indices,
            label: String::new(),
        }
    }

    /// Attach a human-readable label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Vertex data.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Index data.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Label attached via [`CpuMesh::with_label`].
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Vertex data as raw bytes for buffer upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index data as raw bytes for buffer upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Number of indices to draw.
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Hash of the geometry, used as the identity of anonymous meshes.
    ///
    /// The label does not participate, so two identically shaped meshes
    /// with different labels share one GPU entry.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.vertex_bytes().hash(&mut hasher);
        self.index_bytes().hash(&mut hasher);
        hasher.finish()
    }
}

// ============================================================================
// Generators
// ============================================================================

/// Generate a quad in the XY plane facing +Z.
///
/// The quad is centered at the origin and spans `[-half_width, half_width]`
/// by `[-half_height, half_height]`.
pub fn generate_quad(half_width: f32, half_height: f32) -> CpuMesh {
    let (w, h) = (half_width, half_height);
    let normal = [0.0, 0.0, 1.0];
    let vertices = vec![
        Vertex::new([-w, -h, 0.0], normal, [0.0, 0.0]),
        Vertex::new([w, -h, 0.0], normal, [1.0, 0.0]),
        Vertex::new([w, h, 0.0], normal, [1.0, 1.0]),
        Vertex::new([-w, h, 0.0], normal, [0.0, 1.0]),
    ];
    let indices = vec![0, 1, 2, 0, 2, 3];
    CpuMesh::new(vertices, indices).with_label("quad")
}

/// Generate an axis-aligned cube with per-face normals.
///
/// The cube is centered at the origin with the given half extent, 24
/// vertices so each face gets flat normals and its own uv square.
pub fn generate_cube(half_extent: f32) -> CpuMesh {
    let e = half_extent;
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    // Each face: normal, then four corners counter-clockwise seen from outside.
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        (
            [0.0, 0.0, 1.0],
            [[-e, -e, e], [e, -e, e], [e, e, e], [-e, e, e]],
        ),
        (
            [0.0, 0.0, -1.0],
            [[e, -e, -e], [-e, -e, -e], [-e, e, -e], [e, e, -e]],
        ),
        (
            [1.0, 0.0, 0.0],
            [[e, -e, e], [e, -e, -e], [e, e, -e], [e, e, e]],
        ),
        (
            [-1.0, 0.0, 0.0],
            [[-e, -e, -e], [-e, -e, e], [-e, e, e], [-e, e, -e]],
        ),
        (
            [0.0, 1.0, 0.0],
            [[-e, e, e], [e, e, e], [e, e, -e], [-e, e, -e]],
        ),
        (
            [0.0, -1.0, 0.0],
            [[-e, -e, -e], [e, -e, -e], [e, -e, e], [-e, -e, e]],
        ),
    ];

    let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    for (normal, corners) in faces {
        let base = vertices.len() as u32;
        for (corner, uv) in corners.iter().zip(uvs.iter()) {
            vertices.push(Vertex::new(*corner, normal, *uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    CpuMesh::new(vertices, indices).with_label("cube")
}

/// Generate a UV sphere.
///
/// `rings` is the number of latitude bands and `segments` the number of
/// longitude slices. Both are clamped to a sane minimum so degenerate
/// requests still produce a closed surface.
pub fn generate_uv_sphere(radius: f32, rings: u32, segments: u32) -> CpuMesh {
    let rings = rings.max(3);
    let segments = segments.max(3);

    let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let theta = v * PI;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for segment in 0..=segments {
            let u = segment as f32 / segments as f32;
            let phi = u * 2.0 * PI;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let normal = [sin_theta * cos_phi, cos_theta, sin_theta * sin_phi];
            let position = [normal[0] * radius, normal[1] * radius, normal[2] * radius];
            vertices.push(Vertex::new(position, normal, [u, v]));
        }
    }

    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * (segments + 1) + segment;
            let b = a + segments + 1;
            indices.extend_from_slice(&[a, b, a + 1, b, b + 1, a + 1]);
        }
    }

    CpuMesh::new(vertices, indices).with_label("uv_sphere")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_geometry() {
        let quad = generate_quad(1.0, 1.0);
        assert_eq!(quad.vertices().len(), 4);
        assert_eq!(quad.index_count(), 6);
    }

    #[test]
    fn test_cube_has_flat_faces() {
        let cube = generate_cube(0.5);
        assert_eq!(cube.vertices().len(), 24);
        assert_eq!(cube.index_count(), 36);
        // Every vertex sits on the surface of the half-extent box.
        for vertex in cube.vertices() {
            let max_axis = vertex
                .position
                .iter()
                .fold(0.0f32, |acc, c| acc.max(c.abs()));
            assert!((max_axis - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sphere_vertices_on_radius() {
        let sphere = generate_uv_sphere(2.0, 8, 12);
        for vertex in sphere.vertices() {
            let [x, y, z] = vertex.position;
            let len = (x * x + y * y + z * z).sqrt();
            assert!((len - 2.0).abs() < 1e-4);
        }
        assert_eq!(sphere.index_count(), 8 * 12 * 6);
    }

    #[test]
    fn test_sphere_clamps_degenerate_resolution() {
        let sphere = generate_uv_sphere(1.0, 0, 0);
        assert!(sphere.index_count() > 0);
    }

    #[test]
    fn test_content_hash_ignores_label() {
        let a = generate_cube(1.0).with_label("one");
        let b = generate_cube(1.0).with_label("two");
        let c = generate_cube(2.0);
        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(a.content_hash(), c.content_hash());
    }
}
