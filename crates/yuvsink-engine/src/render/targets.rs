use anyhow::{ensure, Result};

use crate::format::{PlaneLayout, Planes};

use super::pipelines::{Pipelines, RGB_TARGET_FORMAT};

/// Size-dependent resources: three plane textures and the RGB target.
///
/// Allocated on the first frame and whenever the coded size changes.
pub struct FrameTargets {
    layout: PlaneLayout,

    y: wgpu::Texture,
    u: wgpu::Texture,
    v: wgpu::Texture,
    rgb: wgpu::Texture,
    rgb_view: wgpu::TextureView,

    pub(super) convert_bind_group: wgpu::BindGroup,
    pub(super) composite_bind_group: wgpu::BindGroup,
}

impl FrameTargets {
    /// Allocates targets for a `width` x `height` I420 frame.
    ///
    /// Fails if either dimension exceeds `max_dimension`.
    pub fn new(
        device: &wgpu::Device,
        pipelines: &Pipelines,
        width: u32,
        height: u32,
        max_dimension: u32,
    ) -> Result<Self> {
        ensure!(width > 0 && height > 0, "frame targets need a non-empty size");
        ensure!(
            width <= max_dimension && height <= max_dimension,
            "{width}x{height} exceeds the device texture limit of {max_dimension}"
        );

        let layout = PlaneLayout::i420(width, height);

        let y = plane_texture(device, "yuvsink y plane", width, height);
        let u = plane_texture(device, "yuvsink u plane", layout.chroma_width, layout.chroma_height);
        let v = plane_texture(device, "yuvsink v plane", layout.chroma_width, layout.chroma_height);

        let rgb = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("yuvsink rgb target"),
            size: extent(width, height),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: RGB_TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let rgb_view = rgb.create_view(&wgpu::TextureViewDescriptor::default());

        let y_view = y.create_view(&wgpu::TextureViewDescriptor::default());
        let u_view = u.create_view(&wgpu::TextureViewDescriptor::default());
        let v_view = v.create_view(&wgpu::TextureViewDescriptor::default());

        let convert_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("yuvsink convert bind group"),
            layout: &pipelines.convert_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: pipelines.convert_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&y_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&u_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&v_view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&pipelines.plane_sampler),
                },
            ],
        });

        let composite_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("yuvsink composite bind group"),
            layout: &pipelines.composite_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&rgb_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&pipelines.rgb_sampler),
                },
            ],
        });

        log::debug!("allocated frame targets for {width}x{height}");

        Ok(Self {
            layout,
            y,
            u,
            v,
            rgb,
            rgb_view,
            convert_bind_group,
            composite_bind_group,
        })
    }

    pub(super) fn rgb_view(&self) -> &wgpu::TextureView {
        &self.rgb_view
    }

    /// Copies the three planes into their textures.
    pub(super) fn upload(&self, queue: &wgpu::Queue, planes: &Planes<'_>) {
        let l = self.layout;
        write_plane(queue, &self.y, planes.y, l.width, l.height);
        write_plane(queue, &self.u, planes.u, l.chroma_width, l.chroma_height);
        write_plane(queue, &self.v, planes.v, l.chroma_width, l.chroma_height);
    }
}

impl Drop for FrameTargets {
    fn drop(&mut self) {
        for texture in [&self.y, &self.u, &self.v, &self.rgb] {
            texture.destroy();
        }
    }
}

fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d { width, height, depth_or_array_layers: 1 }
}

fn plane_texture(device: &wgpu::Device, label: &str, width: u32, height: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent(width, height),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::R8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

fn write_plane(queue: &wgpu::Queue, texture: &wgpu::Texture, data: &[u8], width: u32, height: u32) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width),
            rows_per_image: Some(height),
        },
        extent(width, height),
    );
}
