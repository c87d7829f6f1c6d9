// mesh.rs - UV sphere for the globe

use crate::geo::texture_coordinate;
use std::f64::consts::PI;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MeshError {
    #[error("globe resolution too low: {lat_bands} latitude bands x {lon_bands} longitude bands (need at least 2 x 3)")]
    Resolution { lat_bands: usize, lon_bands: usize },
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobeVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl GlobeVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GlobeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Unit sphere, z up. UVs are derived from each vertex position once, here.
#[derive(Debug, Clone)]
pub struct GlobeMesh {
    pub vertices: Vec<GlobeVertex>,
    pub indices: Vec<u32>,
    pub lat_bands: usize,
    pub lon_bands: usize,
}

/// Ring `i` runs from the north pole (0) to the south pole (`lat_bands`);
/// column `j` from 180°W (0) to 180°E (`lon_bands`), so the seam is doubled
/// and gets u = 0 on one side and u = 1 on the other.
pub fn build_globe(lat_bands: usize, lon_bands: usize) -> Result<GlobeMesh, MeshError> {
    if lat_bands < 2 || lon_bands < 3 {
        return Err(MeshError::Resolution { lat_bands, lon_bands });
    }

    let mut vertices = Vec::with_capacity((lat_bands + 1) * (lon_bands + 1));
    let mut indices = Vec::with_capacity(lat_bands * lon_bands * 6);

    for i in 0..=lat_bands {
        let theta = PI * (i as f64) / (lat_bands as f64);
        let z = theta.cos();
        let sin_t = theta.sin();

        for j in 0..=lon_bands {
            let phi = -PI + 2.0 * PI * (j as f64) / (lon_bands as f64);

            let x = phi.cos() * sin_t;
            let y = phi.sin() * sin_t;

            let [u, v] = texture_coordinate(x, y, z);
            let position = [x as f32, y as f32, z as f32];

            vertices.push(GlobeVertex {
                position,
                normal: position,
                uv: [u as f32, v as f32],
            });
        }
    }

    for i in 0..lat_bands {
        for j in 0..lon_bands {
            let a = (i * (lon_bands + 1) + j) as u32;
            let b = a + (lon_bands + 1) as u32;

            indices.extend_from_slice(&[
                a, b, a + 1,
                b, b + 1, a + 1,
            ]);
        }
    }

    Ok(GlobeMesh {
        vertices,
        indices,
        lat_bands,
        lon_bands,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_resolution() {
        assert_eq!(
            build_globe(1, 8).unwrap_err(),
            MeshError::Resolution { lat_bands: 1, lon_bands: 8 }
        );
        assert!(build_globe(4, 2).is_err());
    }

    #[test]
    fn counts_and_index_bounds() {
        let mesh = build_globe(10, 20).unwrap();
        assert_eq!(mesh.vertices.len(), 11 * 21);
        assert_eq!(mesh.indices.len(), 10 * 20 * 6);
        let n = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < n));
    }

    #[test]
    fn vertices_on_unit_sphere_with_valid_uvs() {
        let mesh = build_globe(100, 200).unwrap();
        for v in &mesh.vertices {
            let [x, y, z] = v.position;
            let r = (x * x + y * y + z * z).sqrt();
            assert!((r - 1.0).abs() < 1e-5);
            assert_eq!(v.normal, v.position);
            let [u, w] = v.uv;
            assert!((0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&w));
        }
    }

    #[test]
    fn uv_matches_position_formula() {
        let mesh = build_globe(6, 12).unwrap();
        let ring = 13;
        // equator ring, 90°E
        let v = mesh.vertices[3 * ring + 9];
        assert!((v.uv[0] - 0.75).abs() < 1e-6);
        assert!((v.uv[1] - 0.5).abs() < 1e-6);
        // north pole row has v = 1, south pole row v = 0
        assert!((mesh.vertices[4].uv[1] - 1.0).abs() < 1e-6);
        assert!(mesh.vertices[6 * ring + 4].uv[1].abs() < 1e-6);
    }

    #[test]
    fn seam_columns_span_the_full_texture() {
        let mesh = build_globe(8, 16).unwrap();
        let ring = 17;
        for i in 1..8 {
            assert!(mesh.vertices[i * ring].uv[0].abs() < 1e-6);
            assert!((mesh.vertices[i * ring + 16].uv[0] - 1.0).abs() < 1e-6);
        }
    }
}
