//! wgpu renderer for the viewer.
//!
//! [`Renderer`] implements [`RenderDelegate`]: batches are uploaded as they
//! arrive and the whole frame is encoded in [`RenderDelegate::end_frame`].
//! Per-batch GPU buffers are keyed by [`BatchKey`] and survive across frames;
//! they only grow, and colors are re-uploaded when the batch's revision moves.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::camera::Camera;
use crate::error::GpuError;
use crate::foliage::{foliage_shader_wgsl, FoliageUniforms, FoliageVertex};
use crate::render::{BatchKey, FrameView, InstanceBatch, InstanceColor, MeshKind, PointSprite, RenderDelegate};
use crate::shader::{
    mesh_data, MaterialUniform, MeshGlobals, MeshVertex, SpriteUniforms, MESH_SHADER, SPRITE_SHADER,
};
use crate::transition::InstanceTransform;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const LIGHT_DIR: Vec3 = Vec3::new(-0.4, -1.0, -0.6);
const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.02,
    b: 0.01,
    a: 1.0,
};

const MESH_ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
const TRANSFORM_ATTRS: [wgpu::VertexAttribute; 4] =
    wgpu::vertex_attr_array![2 => Float32x4, 3 => Float32x4, 4 => Float32x4, 5 => Float32x4];
const COLOR_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![6 => Float32x3];
const FOLIAGE_ATTRS: [wgpu::VertexAttribute; 5] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32, 2 => Float32x3, 3 => Float32, 4 => Float32x3];
const SPRITE_ATTRS: [wgpu::VertexAttribute; 4] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32, 2 => Float32x3, 3 => Float32];

const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

struct GpuBatch {
    mesh: MeshKind,
    transforms: wgpu::Buffer,
    colors: wgpu::Buffer,
    material: wgpu::Buffer,
    material_bind_group: wgpu::BindGroup,
    capacity: usize,
    count: u32,
    colors_revision: Option<u64>,
}

/// Sprite buffer that grows to the largest frame seen.
struct SpriteBuffer {
    buffer: wgpu::Buffer,
    capacity: usize,
    count: u32,
}

pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    depth_texture: wgpu::TextureView,

    mesh_pipeline: wgpu::RenderPipeline,
    foliage_pipeline: wgpu::RenderPipeline,
    sprite_pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    meshes: HashMap<MeshKind, GpuMesh>,
    batches: HashMap<BatchKey, GpuBatch>,
    draw_list: Vec<BatchKey>,

    foliage_vertices: wgpu::Buffer,
    foliage_count: u32,
    foliage_uniforms: wgpu::Buffer,
    foliage_bind_group: wgpu::BindGroup,
    foliage_visible: bool,

    sprites: SpriteBuffer,
    sprite_uniforms: wgpu::Buffer,
    sprite_bind_group: wgpu::BindGroup,

    pub camera: Camera,
    view_proj: Mat4,
    group_view_proj: Mat4,
    last_error: Option<wgpu::SurfaceError>,
}

impl Renderer {
    /// Create the device and every pipeline. `foliage` is uploaded once.
    pub async fn new(
        window: Arc<Window>,
        camera: Camera,
        foliage: &[FoliageVertex],
        breathe_threshold: f32,
    ) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        info!(adapter = ?adapter.get_info().name, "GPU adapter selected");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        let depth_texture = create_depth_texture(&device, &config);

        let uniform_layout = |label: &str| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            })
        };
        let globals_layout = uniform_layout("Mesh Globals Layout");
        let material_layout = uniform_layout("Material Layout");
        let foliage_layout = uniform_layout("Foliage Uniform Layout");
        let sprite_layout = uniform_layout("Sprite Uniform Layout");

        let globals_buffer = uniform_buffer(&device, "Mesh Globals", std::mem::size_of::<MeshGlobals>());
        let globals_bind_group = bind_uniform(&device, "Mesh Globals Bind Group", &globals_layout, &globals_buffer);
        let foliage_uniforms = uniform_buffer(&device, "Foliage Uniforms", std::mem::size_of::<FoliageUniforms>());
        let foliage_bind_group = bind_uniform(&device, "Foliage Bind Group", &foliage_layout, &foliage_uniforms);
        let sprite_uniforms = uniform_buffer(&device, "Sprite Uniforms", std::mem::size_of::<SpriteUniforms>());
        let sprite_bind_group = bind_uniform(&device, "Sprite Bind Group", &sprite_layout, &sprite_uniforms);

        let mesh_pipeline = create_pipeline(
            &device,
            PipelineSpec {
                label: "Mesh Pipeline",
                source: MESH_SHADER.to_string(),
                layouts: &[&globals_layout, &material_layout],
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &MESH_ATTRS,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceTransform>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &TRANSFORM_ATTRS,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceColor>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &COLOR_ATTRS,
                    },
                ],
                format: config.format,
                blend: wgpu::BlendState::REPLACE,
                depth_write: true,
            },
        );
        let foliage_pipeline = create_pipeline(
            &device,
            PipelineSpec {
                label: "Foliage Pipeline",
                source: foliage_shader_wgsl(breathe_threshold),
                layouts: &[&foliage_layout],
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<FoliageVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &FOLIAGE_ATTRS,
                }],
                format: config.format,
                blend: ADDITIVE,
                depth_write: false,
            },
        );
        let sprite_pipeline = create_pipeline(
            &device,
            PipelineSpec {
                label: "Sprite Pipeline",
                source: SPRITE_SHADER.to_string(),
                layouts: &[&sprite_layout],
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<PointSprite>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &SPRITE_ATTRS,
                }],
                format: config.format,
                blend: ADDITIVE,
                depth_write: false,
            },
        );

        let meshes = [MeshKind::Cube, MeshKind::Sphere, MeshKind::Octahedron, MeshKind::Flake]
            .into_iter()
            .map(|kind| {
                let data = mesh_data(kind);
                let mesh = GpuMesh {
                    vertices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Mesh Vertices"),
                        contents: bytemuck::cast_slice(&data.vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    indices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Mesh Indices"),
                        contents: bytemuck::cast_slice(&data.indices),
                        usage: wgpu::BufferUsages::INDEX,
                    }),
                    index_count: data.indices.len() as u32,
                };
                (kind, mesh)
            })
            .collect();

        let foliage_vertices = if foliage.is_empty() {
            vertex_buffer(&device, "Foliage Vertices", std::mem::size_of::<FoliageVertex>())
        } else {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Foliage Vertices"),
                contents: bytemuck::cast_slice(foliage),
                usage: wgpu::BufferUsages::VERTEX,
            })
        };

        let sprites = SpriteBuffer {
            buffer: vertex_buffer(&device, "Sprites", std::mem::size_of::<PointSprite>()),
            capacity: 1,
            count: 0,
        };

        info!(
            width = config.width,
            height = config.height,
            format = ?config.format,
            foliage = foliage.len(),
            "Renderer ready"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            mesh_pipeline,
            foliage_pipeline,
            sprite_pipeline,
            globals_buffer,
            globals_bind_group,
            material_layout,
            meshes,
            batches: HashMap::new(),
            draw_list: Vec::new(),
            foliage_vertices,
            foliage_count: foliage.len() as u32,
            foliage_uniforms,
            foliage_bind_group,
            foliage_visible: false,
            sprites,
            sprite_uniforms,
            sprite_bind_group,
            camera,
            view_proj: Mat4::IDENTITY,
            group_view_proj: Mat4::IDENTITY,
            last_error: None,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = create_depth_texture(&self.device, &self.config);
        }
    }

    /// Reconfigure with the current size, after a lost or outdated surface.
    pub fn reconfigure(&mut self) {
        self.resize(self.config.width, self.config.height);
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    pub fn viewport(&self) -> glam::Vec2 {
        glam::Vec2::new(self.config.width as f32, self.config.height as f32)
    }

    /// `projection × view` of the last frame.
    pub fn view_proj(&self) -> Mat4 {
        self.view_proj
    }

    /// Surface error of the last `end_frame`, cleared on read.
    pub fn take_error(&mut self) -> Option<wgpu::SurfaceError> {
        self.last_error.take()
    }

    fn pixel_to_ndc(&self) -> [f32; 2] {
        [2.0 / self.config.width.max(1) as f32, 2.0 / self.config.height.max(1) as f32]
    }

    fn encode(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(BACKGROUND),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // Opaque meshes first, then the additive layers over them.
            render_pass.set_pipeline(&self.mesh_pipeline);
            render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
            for key in &self.draw_list {
                let Some(batch) = self.batches.get(key) else { continue };
                let Some(mesh) = self.meshes.get(&batch.mesh) else { continue };
                if batch.count == 0 {
                    continue;
                }
                render_pass.set_bind_group(1, &batch.material_bind_group, &[]);
                render_pass.set_vertex_buffer(0, mesh.vertices.slice(..));
                render_pass.set_vertex_buffer(1, batch.transforms.slice(..));
                render_pass.set_vertex_buffer(2, batch.colors.slice(..));
                render_pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..mesh.index_count, 0, 0..batch.count);
            }

            if self.foliage_visible && self.foliage_count > 0 {
                render_pass.set_pipeline(&self.foliage_pipeline);
                render_pass.set_bind_group(0, &self.foliage_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.foliage_vertices.slice(..));
                render_pass.draw(0..6, 0..self.foliage_count);
            }

            if self.sprites.count > 0 {
                render_pass.set_pipeline(&self.sprite_pipeline);
                render_pass.set_bind_group(0, &self.sprite_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.sprites.buffer.slice(..));
                render_pass.draw(0..6, 0..self.sprites.count);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl RenderDelegate for Renderer {
    fn begin_frame(&mut self, view: &FrameView) {
        self.view_proj = self.camera.view_proj(self.aspect());
        self.group_view_proj = self.view_proj * view.group_transform;
        let globals = MeshGlobals {
            view_proj: self.view_proj.to_cols_array_2d(),
            group_transform: view.group_transform.to_cols_array_2d(),
            camera_pos: self.camera.position().extend(1.0).to_array(),
            light_dir: LIGHT_DIR.normalize().extend(0.0).to_array(),
        };
        self.queue.write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
        self.draw_list.clear();
        self.foliage_visible = false;
        self.sprites.count = 0;
    }

    fn draw_instances(&mut self, batch: &InstanceBatch<'_>) {
        let needed = batch.transforms.len();
        let stale = self
            .batches
            .get(&batch.key)
            .map_or(true, |gpu| gpu.capacity < needed || gpu.mesh != batch.mesh);
        if stale {
            let capacity = needed.max(1).next_power_of_two();
            debug!(key = ?batch.key, capacity, "Allocating instance buffers");
            let material = uniform_buffer(&self.device, "Material", std::mem::size_of::<MaterialUniform>());
            let material_bind_group =
                bind_uniform(&self.device, "Material Bind Group", &self.material_layout, &material);
            self.batches.insert(
                batch.key,
                GpuBatch {
                    mesh: batch.mesh,
                    transforms: vertex_buffer(
                        &self.device,
                        "Instance Transforms",
                        capacity * std::mem::size_of::<InstanceTransform>(),
                    ),
                    colors: vertex_buffer(
                        &self.device,
                        "Instance Colors",
                        capacity * std::mem::size_of::<InstanceColor>(),
                    ),
                    material,
                    material_bind_group,
                    capacity,
                    count: 0,
                    colors_revision: None,
                },
            );
        }
        let Some(gpu) = self.batches.get_mut(&batch.key) else {
            return;
        };

        gpu.count = needed as u32;
        if needed > 0 {
            self.queue
                .write_buffer(&gpu.transforms, 0, bytemuck::cast_slice(batch.transforms));
        }
        let colors_changed = gpu.colors_revision != Some(batch.colors_revision);
        if (colors_changed || stale) && !batch.colors.is_empty() {
            self.queue.write_buffer(&gpu.colors, 0, bytemuck::cast_slice(batch.colors));
            gpu.colors_revision = Some(batch.colors_revision);
        }
        let material = MaterialUniform {
            metalness: batch.material.metalness,
            roughness: batch.material.roughness,
            emissive: batch.material.emissive,
            in_group: if batch.in_group { 1.0 } else { 0.0 },
        };
        self.queue.write_buffer(&gpu.material, 0, bytemuck::bytes_of(&material));
        self.draw_list.push(batch.key);
    }

    fn draw_foliage(&mut self, uniforms: &FoliageUniforms) {
        let uniforms = FoliageUniforms {
            view_proj: self.group_view_proj.to_cols_array_2d(),
            pixel_to_ndc: self.pixel_to_ndc(),
            ..*uniforms
        };
        self.queue.write_buffer(&self.foliage_uniforms, 0, bytemuck::bytes_of(&uniforms));
        self.foliage_visible = true;
    }

    fn draw_points(&mut self, points: &[PointSprite]) {
        if points.is_empty() {
            return;
        }
        if self.sprites.capacity < points.len() {
            let capacity = points.len().next_power_of_two();
            self.sprites.buffer = vertex_buffer(
                &self.device,
                "Sprites",
                capacity * std::mem::size_of::<PointSprite>(),
            );
            self.sprites.capacity = capacity;
        }
        self.queue
            .write_buffer(&self.sprites.buffer, 0, bytemuck::cast_slice(points));
        self.sprites.count = points.len() as u32;

        let uniforms = SpriteUniforms {
            view_proj: self.group_view_proj.to_cols_array_2d(),
            pixel_to_ndc: self.pixel_to_ndc(),
            _pad: [0.0; 2],
        };
        self.queue.write_buffer(&self.sprite_uniforms, 0, bytemuck::bytes_of(&uniforms));
    }

    fn end_frame(&mut self) {
        if let Err(e) = self.encode() {
            warn!(error = ?e, "Frame dropped");
            self.last_error = Some(e);
        }
    }
}

struct PipelineSpec<'a> {
    label: &'a str,
    source: String,
    layouts: &'a [&'a wgpu::BindGroupLayout],
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    format: wgpu::TextureFormat,
    blend: wgpu::BlendState,
    depth_write: bool,
}

fn create_pipeline(device: &wgpu::Device, desc: PipelineSpec<'_>) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(desc.label),
        source: wgpu::ShaderSource::Wgsl(desc.source.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(desc.label),
        bind_group_layouts: desc.layouts,
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: desc.buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.format,
                blend: Some(desc.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
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
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: desc.depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn uniform_buffer(device: &wgpu::Device, label: &str, size: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: size as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn vertex_buffer(device: &wgpu::Device, label: &str, size: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: size as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn bind_uniform(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    })
}

fn create_depth_texture(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
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
