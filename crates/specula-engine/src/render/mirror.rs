use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::coords::{LogicalSize, PhysicalExtent, Rect};
use crate::mirror::{
    BindState, InvalidSizeError, MirrorState, SharedSurface, SurfaceBindError, SurfaceFormat,
    SurfaceHandle, TextureImporter,
};

use super::{RenderCtx, RenderTarget};

/// wgpu texture bundle created per bind: the imported capture surface plus
/// the view the pipeline samples from.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// Production [`TextureImporter`]: allocates a wgpu texture for a capture
/// surface and seeds it with the surface's current contents.
pub struct WgpuImporter {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl WgpuImporter {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            device: device.clone(),
            queue: queue.clone(),
        }
    }
}

impl TextureImporter for WgpuImporter {
    type Texture = GpuTexture;

    fn supports(&self, format: SurfaceFormat) -> bool {
        matches!(format, SurfaceFormat::Bgra8 | SurfaceFormat::Rgba8)
    }

    fn import(&mut self, surface: &SharedSurface) -> GpuTexture {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("specula mirror texture"),
            size: texture_extent(surface.extent()),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: texture_format(surface.format()),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        write_surface(&self.queue, &texture, surface);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        GpuTexture { texture, view }
    }

    fn release(&mut self, texture: GpuTexture) {
        // Free the GPU allocation now rather than whenever the handle's
        // internal refcount happens to drain.
        texture.texture.destroy();
    }
}

fn texture_format(format: SurfaceFormat) -> wgpu::TextureFormat {
    match format {
        SurfaceFormat::Bgra8 => wgpu::TextureFormat::Bgra8UnormSrgb,
        SurfaceFormat::Rgba8 => wgpu::TextureFormat::Rgba8UnormSrgb,
    }
}

fn texture_extent(extent: PhysicalExtent) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: extent.width,
        height: extent.height,
        depth_or_array_layers: 1,
    }
}

/// Copies the surface's current pixels into `texture` in one write.
///
/// The shared buffer is handed straight to the queue; there is no
/// intermediate CPU-side staging copy.
fn write_surface(queue: &wgpu::Queue, texture: &wgpu::Texture, surface: &SharedSurface) {
    let extent = surface.extent();
    let bytes_per_row = extent.width * surface.format().bytes_per_pixel() as u32;

    surface.with_pixels(|pixels| {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(extent.height),
            },
            texture_extent(extent),
        );
    });
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct BlitUniform {
    dest_origin: [f32; 2],
    dest_size: [f32; 2],
    viewport: [f32; 2],
    _pad: [f32; 2], // 16-byte alignment
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct QuadVertex {
    pos: [f32; 2], // 0..1
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { pos: [0.0, 0.0] },
    QuadVertex { pos: [1.0, 0.0] },
    QuadVertex { pos: [1.0, 1.0] },
    QuadVertex { pos: [0.0, 1.0] },
];

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Returns the `wgpu` minimum binding size for the blit uniform buffer.
///
/// `BlitUniform` is 32 bytes by construction, so the size is never zero.
fn blit_ubo_min_binding_size() -> std::num::NonZeroU64 {
    std::num::NonZeroU64::new(std::mem::size_of::<BlitUniform>() as u64)
        .expect("BlitUniform has non-zero size by construction")
}

/// Paints the bound capture surface letterboxed into the full viewport.
///
/// All fixed GPU resources (pipeline, sampler, quad buffers, uniform buffer)
/// are created in [`new`](Self::new); the per-surface texture and bind group
/// are created in [`bind_surface`](Self::bind_surface). The draw path
/// allocates nothing.
pub struct MirrorRenderer {
    device: wgpu::Device,
    state: MirrorState<WgpuImporter>,

    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_ubo: wgpu::Buffer,

    quad_vbo: wgpu::Buffer,
    quad_ibo: wgpu::Buffer,

    /// Present exactly when a surface is bound.
    bind_group: Option<wgpu::BindGroup>,
}

impl MirrorRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let shader_src = include_str!("shaders/blit.wgsl");
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("specula blit shader"),
            source: wgpu::ShaderSource::Wgsl(shader_src.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("specula blit bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(blit_ubo_min_binding_size()),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("specula blit pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("specula blit pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("specula blit sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("specula blit ubo"),
            size: std::mem::size_of::<BlitUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let quad_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("specula blit quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let quad_ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("specula blit quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            device: device.clone(),
            state: MirrorState::new(WgpuImporter::new(device, queue)),
            pipeline,
            bind_group_layout,
            sampler,
            uniform_ubo,
            quad_vbo,
            quad_ibo,
            bind_group: None,
        }
    }

    /// Binds a capture surface, releasing any previous texture first.
    ///
    /// On failure the prior texture and bind group stay intact, so the last
    /// good frame keeps rendering.
    pub fn bind_surface(
        &mut self,
        handle: &SurfaceHandle,
        physical: PhysicalExtent,
    ) -> Result<(), SurfaceBindError> {
        self.state.bind_surface(handle, physical)?;

        // state.bind_surface succeeded, so a texture is present.
        self.bind_group = self.state.texture().map(|tex| {
            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("specula blit bind group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.uniform_ubo.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&tex.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            })
        });
        Ok(())
    }

    /// Updates the logical size used for letterboxing at the next draw.
    pub fn set_logical_size(&mut self, size: LogicalSize) -> Result<(), InvalidSizeError> {
        self.state.set_logical_size(size)
    }

    /// Releases the bound texture and its bind group. Idempotent.
    pub fn release_texture(&mut self) {
        self.bind_group = None;
        self.state.release_texture();
    }

    pub fn bind_state(&self) -> BindState {
        self.state.bind_state()
    }

    /// Draws one frame into `target`.
    ///
    /// Refreshes the texture contents when the surface generation advanced,
    /// then paints the letterboxed quad. Leaves the (already cleared) target
    /// untouched when nothing is bound or no logical size is set.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        if let Some(surface) = self.state.pending_refresh() {
            // Generation is read before the pixels: a frame landing mid-copy
            // shows up as still-pending and is re-uploaded next draw.
            let generation = surface.generation();
            if let Some(tex) = self.state.texture() {
                write_surface(ctx.queue, &tex.texture, &surface);
            }
            self.state.mark_uploaded(generation);
        }

        let Some(logical) = self.state.logical_size() else {
            return;
        };
        let Some(bind_group) = self.bind_group.as_ref() else {
            return;
        };

        let dest = Rect::letterboxed(logical, ctx.viewport);
        if dest.is_empty() {
            return;
        }

        let u = BlitUniform {
            dest_origin: [dest.origin.x, dest.origin.y],
            dest_size: [dest.size.x, dest.size.y],
            viewport: [ctx.viewport.width, ctx.viewport.height],
            _pad: [0.0; 2],
        };
        ctx.queue.write_buffer(&self.uniform_ubo, 0, bytemuck::bytes_of(&u));

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("specula mirror pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, self.quad_vbo.slice(..));
        rpass.set_index_buffer(self.quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..6, 0, 0..1);
    }
}
