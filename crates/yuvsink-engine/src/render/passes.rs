use anyhow::{bail, Result};

use crate::coords::{CompositePlan, SurfaceSize};
use crate::device::{GpuContext, SurfaceFrame, SurfaceRecovery};
use crate::format::Planes;

use super::common::{quad_vertices, ConvertUniform};
use super::{FrameTargets, Pipelines};

/// Pass 1: uploads `planes` and converts them into the RGB target.
pub fn convert_frame(
    gpu: &GpuContext,
    pipelines: &Pipelines,
    targets: &FrameTargets,
    planes: &Planes<'_>,
    line_height: f32,
) {
    targets.upload(gpu.queue(), planes);

    let u = ConvertUniform { line_height, _pad: [0.0; 3] };
    gpu.queue().write_buffer(&pipelines.convert_ubo, 0, bytemuck::bytes_of(&u));

    let mut encoder = gpu.encoder("yuvsink convert encoder");
    {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("yuvsink convert pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: targets.rgb_view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&pipelines.convert);
        rpass.set_bind_group(0, &targets.convert_bind_group, &[]);
        rpass.set_vertex_buffer(0, pipelines.unit_quad_vbo.slice(..));
        rpass.set_index_buffer(pipelines.quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..6, 0, 0..1);
    }

    gpu.queue().submit(std::iter::once(encoder.finish()));
}

/// Pass 2: clears the surface and draws the RGB target into the letterbox.
///
/// Returns the surface texture to present, or `None` if the surface could
/// not provide one this time.
pub fn composite_frame(
    gpu: &mut GpuContext,
    pipelines: &Pipelines,
    targets: &FrameTargets,
    plan: &CompositePlan,
) -> Result<Option<wgpu::SurfaceTexture>> {
    let Some(mut frame) = acquire(gpu)? else { return Ok(None) };

    let texture_size = SurfaceSize::new(
        frame.surface_texture.texture.width(),
        frame.surface_texture.texture.height(),
    );

    gpu.queue().write_buffer(
        &pipelines.composite_vbo,
        0,
        bytemuck::cast_slice(&quad_vertices(plan.tex)),
    );

    {
        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("yuvsink composite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let vp = plan.viewport;
        if vp.is_empty() || !vp.fits_within(texture_size) {
            // Window geometry and surface disagree until the next resize lands.
            log::debug!("viewport {vp:?} outside surface {texture_size:?}; clearing only");
        } else {
            rpass.set_viewport(vp.x as f32, vp.y as f32, vp.w as f32, vp.h as f32, 0.0, 1.0);
            rpass.set_pipeline(&pipelines.composite);
            rpass.set_bind_group(0, &targets.composite_bind_group, &[]);
            rpass.set_vertex_buffer(0, pipelines.composite_vbo.slice(..));
            rpass.set_index_buffer(pipelines.quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..6, 0, 0..1);
        }
    }

    Ok(Some(gpu.queue_present(frame)))
}

fn acquire(gpu: &mut GpuContext) -> Result<Option<SurfaceFrame>> {
    let err = match gpu.begin_frame() {
        Ok(frame) => return Ok(Some(frame)),
        Err(err) => err,
    };

    log::debug!("surface error: {err}");
    match gpu.recover(err.clone()) {
        SurfaceRecovery::Retry => match gpu.begin_frame() {
            Ok(frame) => Ok(Some(frame)),
            Err(err) => {
                log::warn!("surface still unavailable after reconfigure: {err}");
                Ok(None)
            }
        },
        SurfaceRecovery::Skip => Ok(None),
        SurfaceRecovery::Lost => bail!("surface unusable: {err}"),
    }
}
