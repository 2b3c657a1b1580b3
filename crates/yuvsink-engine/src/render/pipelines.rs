use anyhow::{bail, Result};
use wgpu::util::DeviceExt;

use crate::coords::TexRect;

use super::common::{
    clamped_sampler, convert_ubo_min_binding_size, quad_primitive, quad_vertices, sampler_entry,
    texture_entry, ConvertUniform, QuadVertex, QUAD_INDICES,
};

/// Format of the offscreen target written by the convert pass.
pub const RGB_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Both compiled render pipelines plus the buffers and samplers they share.
///
/// Frame-size independent; built once per context. Per-size resources live
/// in [`FrameTargets`](super::FrameTargets).
pub struct Pipelines {
    pub(super) convert: wgpu::RenderPipeline,
    pub(super) convert_bgl: wgpu::BindGroupLayout,
    pub(super) convert_ubo: wgpu::Buffer,
    pub(super) plane_sampler: wgpu::Sampler,

    pub(super) composite: wgpu::RenderPipeline,
    pub(super) composite_bgl: wgpu::BindGroupLayout,
    pub(super) composite_vbo: wgpu::Buffer,
    pub(super) rgb_sampler: wgpu::Sampler,

    pub(super) unit_quad_vbo: wgpu::Buffer,
    pub(super) quad_ibo: wgpu::Buffer,
}

impl Pipelines {
    /// Compiles both shaders and builds their pipelines.
    ///
    /// Fails if either shader module reports a compilation error.
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Result<Self> {
        let convert_shader = compile(device, "convert", include_str!("shaders/convert.wgsl"))?;
        let composite_shader =
            compile(device, "composite", include_str!("shaders/composite.wgsl"))?;

        // ── pass 1 ────────────────────────────────────────────────────────

        let convert_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("yuvsink convert bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: convert_ubo_min_binding_size(),
                    },
                    count: None,
                },
                texture_entry(1), // Y
                texture_entry(2), // U
                texture_entry(3), // V
                sampler_entry(4),
            ],
        });

        let convert = build_pipeline(
            device,
            "yuvsink convert",
            &convert_bgl,
            &convert_shader,
            RGB_TARGET_FORMAT,
        );

        let convert_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("yuvsink convert ubo"),
            size: std::mem::size_of::<ConvertUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // ── pass 2 ────────────────────────────────────────────────────────

        let composite_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("yuvsink composite bgl"),
            entries: &[texture_entry(0), sampler_entry(1)],
        });

        let composite = build_pipeline(
            device,
            "yuvsink composite",
            &composite_bgl,
            &composite_shader,
            surface_format,
        );

        let composite_vbo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("yuvsink composite vbo"),
            size: std::mem::size_of::<[QuadVertex; 4]>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // ── shared ────────────────────────────────────────────────────────

        let unit_quad_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("yuvsink unit quad vbo"),
            contents: bytemuck::cast_slice(&quad_vertices(TexRect::UNIT)),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let quad_ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("yuvsink quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        Ok(Self {
            convert,
            convert_bgl,
            convert_ubo,
            plane_sampler: clamped_sampler(device, "yuvsink plane sampler", wgpu::FilterMode::Nearest),
            composite,
            composite_bgl,
            composite_vbo,
            rgb_sampler: clamped_sampler(device, "yuvsink rgb sampler", wgpu::FilterMode::Linear),
            unit_quad_vbo,
            quad_ibo,
        })
    }
}

fn compile(device: &wgpu::Device, name: &str, source: &str) -> Result<wgpu::ShaderModule> {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("yuvsink {name} shader")),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let info = pollster::block_on(module.get_compilation_info());
    let errors: Vec<String> = info
        .messages
        .iter()
        .filter(|m| m.message_type == wgpu::CompilationMessageType::Error)
        .map(|m| m.message.clone())
        .collect();

    if !errors.is_empty() {
        bail!("{name} shader failed to compile: {}", errors.join("; "));
    }

    log::debug!("compiled {name} shader");
    Ok(module)
}

fn build_pipeline(
    device: &wgpu::Device,
    label: &str,
    bgl: &wgpu::BindGroupLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[bgl],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[QuadVertex::layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: quad_primitive(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
