// ============================================================================
// GPU FIELD PROGRAM — jump-flood propagation as a wgpu compute pass
// ============================================================================

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::context::GpuContext;
use crate::error::FilterError;
use crate::field::{DISTANCE, FieldImage, FieldInput, FieldProgram, SEEDED};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct FieldGpuParams {
    pub field_size: [u32; 2],
    pub image_size: [u32; 2],
    pub feedback_size: [u32; 2],
    pub jump: u32,
    pub threshold: f32,
}

const TEXEL_BYTES: u64 = 4 * std::mem::size_of::<f32>() as u64;

pub struct GpuFieldProgram {
    ctx: Arc<GpuContext>,
    pipeline: wgpu::ComputePipeline,
    bgl: wgpu::BindGroupLayout,
    cached_image_buf: Option<wgpu::Buffer>,
    cached_feedback_buf: Option<wgpu::Buffer>,
    cached_out_buf: Option<wgpu::Buffer>,
    cached_staging_buf: Option<wgpu::Buffer>,
    cached_params_buf: Option<wgpu::Buffer>,
    cached_w: u32,
    cached_h: u32,
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Grow-only buffer cache: reuse `slot` unless it is smaller than `size`.
fn ensure_buffer(
    device: &wgpu::Device,
    slot: &mut Option<wgpu::Buffer>,
    size: u64,
    usage: wgpu::BufferUsages,
    label: &str,
) {
    let stale = match slot {
        Some(b) => b.size() < size,
        None => true,
    };
    if stale {
        *slot = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        }));
    }
}

impl GpuFieldProgram {
    pub fn new(ctx: Arc<GpuContext>) -> Self {
        let device = &ctx.device;
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("jump_flood_shader"),
            source: wgpu::ShaderSource::Wgsl(super::shaders::JUMP_FLOOD_SHADER.into()),
        });

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("jump_flood_bgl"),
            entries: &[
                storage_entry(0, true),
                storage_entry(1, true),
                storage_entry(2, false),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("jump_flood_pl"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("jump_flood_pipeline"),
            layout: Some(&layout),
            module: &shader,
            entry_point: "cs_propagate",
            compilation_options: Default::default(),
        });

        Self {
            ctx,
            pipeline,
            bgl,
            cached_image_buf: None,
            cached_feedback_buf: None,
            cached_out_buf: None,
            cached_staging_buf: None,
            cached_params_buf: None,
            cached_w: 0,
            cached_h: 0,
        }
    }

    fn ensure_cache(&mut self, w: u32, h: u32, image_bytes: u64, feedback_bytes: u64) {
        let device = &self.ctx.device;
        if self.cached_w != w || self.cached_h != h {
            let out_size = w as u64 * h as u64 * TEXEL_BYTES;
            self.cached_out_buf = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("jf_field_out"),
                size: out_size,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            }));
            self.cached_staging_buf = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("jf_staging"),
                size: out_size,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.cached_w = w;
            self.cached_h = h;
        }
        let upload = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST;
        ensure_buffer(device, &mut self.cached_image_buf, image_bytes, upload, "jf_image");
        ensure_buffer(device, &mut self.cached_feedback_buf, feedback_bytes, upload, "jf_feedback");
    }
}

impl FieldProgram for GpuFieldProgram {
    fn propagate(&mut self, input: &FieldInput<'_>, target: &mut FieldImage) -> Result<(), FilterError> {
        let (fw, fh) = input.size;
        let (iw, ih) = input.image.dimensions();
        if iw == 0 || ih == 0 {
            return Err(FilterError::TextureUnavailable("source"));
        }
        if target.dimensions() != input.size || fw == 0 || fh == 0 {
            return Err(FilterError::MissingTarget);
        }

        let image_bytes = input.image.as_raw().len() as u64;
        let feedback_bytes = input.feedback.as_raw().len() as u64 * std::mem::size_of::<f32>() as u64;
        let out_bytes = fw as u64 * fh as u64 * TEXEL_BYTES;
        for bytes in [image_bytes, feedback_bytes, out_bytes] {
            if !self.ctx.supports_binding(bytes) {
                return Err(FilterError::Gpu(format!(
                    "{} byte buffer exceeds the device binding limit",
                    bytes
                )));
            }
        }

        self.ensure_cache(fw, fh, image_bytes, feedback_bytes);

        let missing = |what: &str| FilterError::Gpu(format!("{} buffer not initialised", what));
        let image_buf = self.cached_image_buf.as_ref().ok_or_else(|| missing("image"))?;
        let feedback_buf = self.cached_feedback_buf.as_ref().ok_or_else(|| missing("feedback"))?;
        let out_buf = self.cached_out_buf.as_ref().ok_or_else(|| missing("field"))?;
        let staging = self.cached_staging_buf.as_ref().ok_or_else(|| missing("staging"))?;

        let device = &self.ctx.device;
        let queue = &self.ctx.queue;

        queue.write_buffer(image_buf, 0, input.image.as_raw());
        queue.write_buffer(feedback_buf, 0, bytemuck::cast_slice(input.feedback.as_raw()));

        let (bw, bh) = input.feedback.dimensions();
        let params = FieldGpuParams {
            field_size: [fw, fh],
            image_size: [iw, ih],
            feedback_size: [bw, bh],
            jump: input.step,
            threshold: input.threshold,
        };
        let params_bytes = bytemuck::bytes_of(&params);
        let params_buf = self.cached_params_buf.get_or_insert_with(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("jf_params"),
                contents: params_bytes,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        });
        queue.write_buffer(params_buf, 0, params_bytes);

        let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("jf_bg"),
            layout: &self.bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: image_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: feedback_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: out_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: params_buf.as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("jf_encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("jf_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bg, &[]);
            pass.dispatch_workgroups(fw.div_ceil(16), fh.div_ceil(16), 1);
        }
        encoder.copy_buffer_to_buffer(out_buf, 0, staging, 0, out_bytes);
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..out_bytes);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);
        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(FilterError::Gpu(format!("field readback map error: {:?}", e))),
            Err(e) => return Err(FilterError::Gpu(format!("field readback channel error: {:?}", e))),
        }

        {
            let mapped = slice.get_mapped_range();
            let src: &[f32] = bytemuck::cast_slice(&mapped);
            let dst: &mut [f32] = target;
            dst.copy_from_slice(&src[..dst.len()]);
        }
        staging.unmap();

        for texel in target.pixels_mut() {
            if texel.0[SEEDED] < 0.5 {
                texel.0[DISTANCE] = if texel.0[DISTANCE] < 0.0 {
                    f32::NEG_INFINITY
                } else {
                    f32::INFINITY
                };
            }
        }
        Ok(())
    }
}
