//! The wgpu implementation of [`CubeDevice`].
//!
//! [`CubePass`] owns the window's [`GpuContext`]. [`prepare`](CubeDevice::prepare)
//! builds the pipeline from a linked [`ShaderProgram`], using its reflected
//! locations for the two vertex buffers (positions, texels) and its bind
//! groups for the transform and the texture unit. Textures are nearest-filtered
//! with a full mip chain and clamp to the edge.
//!
//! Each frame clears to white, binds the current texture and draws the cube
//! with depth testing. Culling stays off because the camera sits inside the
//! cube.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Mat4;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::device::{CubeDevice, TextureHandle};
use crate::error::{CubeError, Result};
use crate::geometry::{GeometryBuffer, POSITION_COMPONENTS, TEXEL_COMPONENTS};
use crate::gpu::GpuContext;
use crate::images::ImageData;
use crate::shader::{ShaderProgram, UniformBinding};
use crate::texture::mip_chain;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 1.0,
    g: 1.0,
    b: 1.0,
    a: 0.0,
};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct MvpUniform {
    mvp: [[f32; 4]; 4],
}

/// One uploaded image with all its mip levels.
struct GpuTexture {
    view: wgpu::TextureView,
    size: (u32, u32),
}

/// Everything that depends on the linked program.
struct Prepared {
    pipeline: wgpu::RenderPipeline,
    mvp_group: u32,
    mvp_bind_group: wgpu::BindGroup,
    texture_group: u32,
    texture_binding: u32,
    sampler_binding: u32,
    texture_layout: wgpu::BindGroupLayout,
    position_buffer: wgpu::Buffer,
    texel_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
}

pub struct CubePass {
    gpu: GpuContext,
    mvp_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
    prepared: Option<Prepared>,
    /// Allocated names; `None` until the first upload.
    textures: HashMap<TextureHandle, Option<GpuTexture>>,
    bound: Option<TextureHandle>,
    next_handle: u32,
}

impl CubePass {
    pub fn new(window: Arc<Window>) -> Result<Self> {
        Ok(Self::with_context(GpuContext::new(window)?))
    }

    pub fn with_context(gpu: GpuContext) -> Self {
        let mvp_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Cube MVP Uniform"),
            size: std::mem::size_of::<MvpUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Cube Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let depth_view = Self::create_depth_view(&gpu);
        let depth_size = (gpu.width(), gpu.height());

        Self {
            gpu,
            mvp_buffer,
            sampler,
            depth_view,
            depth_size,
            prepared: None,
            textures: HashMap::new(),
            bound: None,
            next_handle: 0,
        }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Cube Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn ensure_depth_size(&mut self) {
        if self.depth_size != (self.gpu.width(), self.gpu.height()) {
            self.depth_view = Self::create_depth_view(&self.gpu);
            self.depth_size = (self.gpu.width(), self.gpu.height());
        }
    }

    fn mvp_layout(&self, binding: UniformBinding) -> wgpu::BindGroupLayout {
        self.gpu
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Cube MVP Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: binding.binding,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            })
    }

    fn texture_layout(&self, texture: UniformBinding, sampler: UniformBinding) -> wgpu::BindGroupLayout {
        self.gpu
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Cube Texture Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: texture.binding,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: sampler.binding,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            })
    }

    fn create_texture_slot(&self, width: u32, height: u32, mip_level_count: u32) -> (wgpu::Texture, GpuTexture) {
        let texture = self.gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Cube Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (
            texture,
            GpuTexture {
                view,
                size: (width, height),
            },
        )
    }

    fn bound_view(&self) -> Result<&wgpu::TextureView> {
        self.bound
            .and_then(|handle| self.textures.get(&handle))
            .and_then(Option::as_ref)
            .map(|texture| &texture.view)
            .ok_or(CubeError::ResourceNotAllocated)
    }
}

impl CubeDevice for CubePass {
    fn prepare(&mut self, program: &ShaderProgram, geometry: &GeometryBuffer) -> Result<()> {
        let device = &self.gpu.device;

        let vertex_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Cube Vertex Shader"),
            source: wgpu::ShaderSource::Naga(std::borrow::Cow::Owned(program.vertex_module().clone())),
        });
        let fragment_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Cube Fragment Shader"),
            source: wgpu::ShaderSource::Naga(std::borrow::Cow::Owned(program.fragment_module().clone())),
        });

        let mvp_binding = program.mvp_binding();
        let mvp_layout = self.mvp_layout(mvp_binding);
        let texture_layout = self.texture_layout(program.texture_binding(), program.sampler_binding());

        let mvp_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Cube MVP Bind Group"),
            layout: &mvp_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: mvp_binding.binding,
                resource: self.mvp_buffer.as_entire_binding(),
            }],
        });

        // Linking guarantees the two groups are 0 and 1.
        let bind_group_layouts = if mvp_binding.group == 0 {
            [&mvp_layout, &texture_layout]
        } else {
            [&texture_layout, &mvp_layout]
        };
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Cube Pipeline Layout"),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        let position_attributes = [wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: 0,
            shader_location: program.position_location(),
        }];
        let texel_attributes = [wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 0,
            shader_location: program.tex_coord_location(),
        }];
        let buffers = [
            wgpu::VertexBufferLayout {
                array_stride: (POSITION_COMPONENTS * std::mem::size_of::<f32>()) as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &position_attributes,
            },
            wgpu::VertexBufferLayout {
                array_stride: (TEXEL_COMPONENTS * std::mem::size_of::<f32>()) as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &texel_attributes,
            },
        ];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Cube Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_shader,
                entry_point: Some(program.vertex_entry()),
                buffers: &buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_shader,
                entry_point: Some(program.fragment_entry()),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let position_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube Positions"),
            contents: geometry.position_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let texel_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube Texels"),
            contents: geometry.texel_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube Indices"),
            contents: geometry.index_bytes(),
            usage: wgpu::BufferUsages::INDEX,
        });

        self.prepared = Some(Prepared {
            pipeline,
            mvp_group: mvp_binding.group,
            mvp_bind_group,
            texture_group: program.texture_unit(),
            texture_binding: program.texture_binding().binding,
            sampler_binding: program.sampler_binding().binding,
            texture_layout,
            position_buffer,
            texel_buffer,
            index_buffer,
        });
        log::debug!(
            "cube pipeline ready: position @{}, tex_coord @{}, texture unit {}",
            program.position_location(),
            program.tex_coord_location(),
            program.texture_unit()
        );
        Ok(())
    }

    fn create_texture(&mut self) -> Option<TextureHandle> {
        self.next_handle = self.next_handle.checked_add(1)?;
        let handle = TextureHandle::new(self.next_handle)?;
        self.textures.insert(handle, None);
        Some(handle)
    }

    fn upload_texture(&mut self, handle: TextureHandle, image: &ImageData) -> Result<()> {
        if !self.textures.contains_key(&handle) {
            return Err(CubeError::ResourceNotAllocated);
        }

        let levels = mip_chain(image);
        let mip_level_count = levels.len() as u32;

        // The handle keeps its name; the storage behind it is rebuilt to fit.
        let (texture, slot) = self.create_texture_slot(image.width, image.height, mip_level_count);
        for (level, data) in levels.iter().enumerate() {
            self.gpu.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &data.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * data.width),
                    rows_per_image: Some(data.height),
                },
                wgpu::Extent3d {
                    width: data.width,
                    height: data.height,
                    depth_or_array_layers: 1,
                },
            );
        }

        log::trace!(
            "texture {} now {}x{} with {} mip levels",
            handle.get(),
            slot.size.0,
            slot.size.1,
            mip_level_count
        );
        self.textures.insert(handle, Some(slot));
        self.bound = Some(handle);
        Ok(())
    }

    fn delete_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(&handle);
        if self.bound == Some(handle) {
            self.bound = None;
        }
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    fn draw(&mut self, mvp: Mat4, index_count: u32) -> Result<()> {
        self.ensure_depth_size();

        let Some(prepared) = &self.prepared else {
            return Err(CubeError::InvalidState {
                state: "unprepared",
                operation: "draw",
            });
        };
        let texture_view = self.bound_view()?;

        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost, reconfiguring");
                self.gpu.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("timed out waiting for the next frame");
                return Ok(());
            }
            Err(e) => return Err(CubeError::Gpu(e.to_string())),
        };

        self.gpu.queue.write_buffer(
            &self.mvp_buffer,
            0,
            bytemuck::cast_slice(&[MvpUniform {
                mvp: mvp.to_cols_array_2d(),
            }]),
        );

        let texture_bind_group = self.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Cube Texture Bind Group"),
            layout: &prepared.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: prepared.texture_binding,
                    resource: wgpu::BindingResource::TextureView(texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: prepared.sampler_binding,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Cube Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Cube Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&prepared.pipeline);
            render_pass.set_bind_group(prepared.mvp_group, &prepared.mvp_bind_group, &[]);
            render_pass.set_bind_group(prepared.texture_group, &texture_bind_group, &[]);
            render_pass.set_vertex_buffer(0, prepared.position_buffer.slice(..));
            render_pass.set_vertex_buffer(1, prepared.texel_buffer.slice(..));
            render_pass.set_index_buffer(prepared.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            render_pass.draw_indexed(0..index_count, 0, 0..1);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
