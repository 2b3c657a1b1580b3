//! Shared GPU types and helpers for both passes.

use bytemuck::{Pod, Zeroable};

use crate::coords::TexRect;

// ── quad vertex ───────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct QuadVertex {
    pub pos: [f32; 2], // NDC
    pub uv: [f32; 2],
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x2  // uv
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// NDC corners in the order of [`TexRect::corners`].
const QUAD_POSITIONS: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];

pub(super) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Full-viewport quad sampling `tex`.
pub(super) fn quad_vertices(tex: TexRect) -> [QuadVertex; 4] {
    let uv = tex.corners();
    std::array::from_fn(|i| QuadVertex { pos: QUAD_POSITIONS[i], uv: uv[i] })
}

// ── convert uniform ───────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct ConvertUniform {
    pub line_height: f32,
    pub _pad: [f32; 3], // 16-byte alignment
}

pub(super) fn convert_ubo_min_binding_size() -> Option<std::num::NonZeroU64> {
    std::num::NonZeroU64::new(std::mem::size_of::<ConvertUniform>() as u64)
}

// ── pipeline pieces ───────────────────────────────────────────────────────

pub(super) fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

pub(super) fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

pub(super) fn quad_primitive() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        polygon_mode: wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    }
}

/// Clamped sampler with the same min/mag filter.
pub(super) fn clamped_sampler(
    device: &wgpu::Device,
    label: &str,
    filter: wgpu::FilterMode,
) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_quad_maps_top_edge_to_first_row() {
        let v = quad_vertices(TexRect::UNIT);
        // top-left corner of the viewport samples texel row 0
        assert_eq!(v[3], QuadVertex { pos: [-1.0, 1.0], uv: [0.0, 0.0] });
        assert_eq!(v[0], QuadVertex { pos: [-1.0, -1.0], uv: [0.0, 1.0] });
    }

    #[test]
    fn cropped_quad_keeps_positions() {
        let tex = TexRect { left: 0.25, top: 0.1, right: 0.5, bottom: 0.9 };
        let v = quad_vertices(tex);
        assert_eq!(v[1].pos, [1.0, -1.0]);
        assert_eq!(v[1].uv, [0.5, 0.9]);
        assert_eq!(v[2].uv, [0.5, 0.1]);
    }

    #[test]
    fn convert_uniform_is_16_bytes() {
        assert_eq!(std::mem::size_of::<ConvertUniform>(), 16);
        assert!(convert_ubo_min_binding_size().is_some());
    }
}
