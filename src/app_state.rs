use std::sync::Arc;
use anyhow::Context;
use winit::window::Window;
use glam::Vec2;
use wgpu::util::DeviceExt;

use crate::camera::{Camera, CameraUniform};
use crate::color::{Color, palette};
use crate::config::FieldConfig;
use crate::models::{LabelShapeInstance, LineVertex, Mesh, MeshVertex, NodeInstance, Vertex2D};
use crate::scene::node::{Material, Node, NodeKind};
use crate::scene::{FieldState, FrameInput, FrameReport, Pointer};

const NODES_WGSL: &str = concat!(include_str!("./shaders/common.wgsl"), include_str!("./shaders/nodes.wgsl"));
const LINES_WGSL: &str = concat!(include_str!("./shaders/common.wgsl"), include_str!("./shaders/lines.wgsl"));
const LABELS_WGSL: &str = concat!(include_str!("./shaders/common.wgsl"), include_str!("./shaders/labels.wgsl"));

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const SPHERE_SEGMENTS: u16 = 32;

// Label pill metrics, in logical pixels.
const LABEL_FONT_SIZE: f32 = 12.0;
const LABEL_LINE_HEIGHT: f32 = 16.0;
const LABEL_PAD_X: f32 = 14.0;
const LABEL_PAD_Y: f32 = 6.0;
const LABEL_RADIUS: f32 = 20.0;
const BULLET_SIZE: f32 = 7.0;
const BULLET_GAP: f32 = 5.0;
const BUNDLED_LABEL_FAMILY: &str = "DejaVu Sans";
const BUNDLED_LABEL_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

/// GPU-side mesh with its own vertex and index buffers.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, mesh: &Mesh) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self { vertex_buffer, index_buffer, index_count: mesh.indices.len() as u32 }
    }
}

pub struct State {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub is_surface_configured: bool,
    pub depth_view: wgpu::TextureView,
    pub scale_factor: f32,

    // Glyphon related fields
    pub glyphon_font_system: glyphon::FontSystem,
    pub glyphon_viewport: glyphon::Viewport,
    pub glyphon_swash_cache: glyphon::SwashCache,
    pub glyphon_atlas: glyphon::TextAtlas,
    pub glyphon_renderer: glyphon::TextRenderer,
    pub glyphon_buffers: Vec<glyphon::Buffer>, // one per skill, catalog order

    pub camera: Camera,
    pub camera_buffer: wgpu::Buffer,
    pub camera_bind_group: wgpu::BindGroup,
    pub camera_uniform: CameraUniform,

    pub node_render_pipeline: wgpu::RenderPipeline,
    pub line_render_pipeline: wgpu::RenderPipeline,
    pub label_render_pipeline: wgpu::RenderPipeline,

    pub background_mesh: GpuMesh,
    pub skill_mesh: GpuMesh,
    pub node_instances: Vec<NodeInstance>,
    pub node_instance_buffer: wgpu::Buffer,

    pub line_vertices: Vec<LineVertex>,
    pub line_vertex_buffer: wgpu::Buffer,

    pub quad_vertex_buffer: wgpu::Buffer,
    pub quad_index_buffer: wgpu::Buffer,
    pub label_shapes: Vec<LabelShapeInstance>,
    pub label_shape_buffer: wgpu::Buffer,

    pub field: FieldState,
    pub pointer: Pointer,

    pub last_frame_instant: instant::Instant,
    pub frame_count_in_second: u32,
    pub current_fps: u32,
}

impl State {
    pub async fn new(window_arc: Arc<Window>, field_config: FieldConfig) -> anyhow::Result<State> {
        let size = window_arc.inner_size();
        let scale_factor = window_arc.scale_factor() as f32;

        let gpu = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = gpu.create_surface(window_arc).context("failed to create render surface")?;

        let adapter = gpu
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter compatible with the surface")?;
        let adapter_info = adapter.get_info();

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to open GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let texture_format = surface_caps.formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no texture formats")?;
        let needs_shader_srgb_output_conversion = !texture_format.is_srgb();

        // The field is drawn over page content, keep the canvas see-through.
        let alpha_mode = [wgpu::CompositeAlphaMode::PreMultiplied, wgpu::CompositeAlphaMode::PostMultiplied]
            .into_iter()
            .find(|m| surface_caps.alpha_modes.contains(m))
            .unwrap_or(surface_caps.alpha_modes[0]);

        log::info!(
            "Using {} ({:?}, Target Format: {:?}, Alpha: {:?}), Needs Shader sRGB Output Conversion: {}",
            adapter_info.name,
            adapter_info.backend,
            texture_format,
            alpha_mode,
            needs_shader_srgb_output_conversion
        );

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: texture_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        let depth_view = create_depth_view(&device, config.width, config.height);

        // --- Glyphon Initialization ---
        // Browsers expose no system fonts, so the labels ship their own face.
        let mut glyphon_font_system = glyphon::FontSystem::new_with_fonts([
            glyphon::fontdb::Source::Binary(Arc::new(BUNDLED_LABEL_FONT)),
        ]);
        glyphon_font_system.db_mut().set_sans_serif_family(BUNDLED_LABEL_FAMILY);
        let glyphon_swash_cache = glyphon::SwashCache::new();
        let glyphon_cache = glyphon::Cache::new(&device);
        let glyphon_viewport = glyphon::Viewport::new(&device, &glyphon_cache);
        let mut glyphon_atlas = glyphon::TextAtlas::new(&device, &queue, &glyphon_cache, texture_format);
        let glyphon_renderer = glyphon::TextRenderer::new(&mut glyphon_atlas, &device, wgpu::MultisampleState::default(), None);

        let glyphon_buffers = field_config
            .skills
            .iter()
            .map(|skill| label_buffer(&mut glyphon_font_system, &skill.name, scale_factor))
            .collect();

        let field = FieldState::new(field_config);

        let camera = Camera::new(&field.config, config.width, config.height);
        let camera_uniform = CameraUniform {
            view_proj: camera.build_view_projection_matrix().to_cols_array_2d(),
            group: field.group_matrix().to_cols_array_2d(),
            eye: camera.eye.extend(1.0).to_array(),
            fog: fog_uniform(field.config.fog_density),
            viewport: [config.width as f32, config.height as f32, 0.0, 0.0],
            needs_srgb_output_conversion: needs_shader_srgb_output_conversion as u32,
            _padding: [0; 3],
        };

        let camera_buffer = device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Camera Buffer"),
                contents: bytemuck::cast_slice(&[camera_uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            }
        );

        let camera_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }
            ],
            label: Some("Camera Bind Group Layout"),
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                }
            ],
            label: Some("Camera Bind Group"),
        });

        let nodes_shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Nodes Shader"),
            source: wgpu::ShaderSource::Wgsl(NODES_WGSL.into()),
        });
        let lines_shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Lines Shader"),
            source: wgpu::ShaderSource::Wgsl(LINES_WGSL.into()),
        });
        let labels_shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Labels Shader"),
            source: wgpu::ShaderSource::Wgsl(LABELS_WGSL.into()),
        });

        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[
                &camera_bind_group_layout,
            ],
            immediate_size: 0,
        });

        // --- Node pipeline: instanced meshes, depth tested ---
        let node_render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Node Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &nodes_shader_module,
                entry_point: Some("vs_main"),
                buffers: &[
                    MeshVertex::layout(),
                    NodeInstance::layout(),
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &nodes_shader_module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: texture_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(depth_state(true)),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview_mask: None,
            cache: None,
        });

        // --- Line pipeline: additive, depth tested but not written ---
        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        };
        let line_render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Line Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &lines_shader_module,
                entry_point: Some("vs_main"),
                buffers: &[
                    LineVertex::layout(),
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &lines_shader_module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: texture_format,
                    blend: Some(additive),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(depth_state(false)),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview_mask: None,
            cache: None,
        });

        // --- Label shape pipeline: screen-space rounded rectangles ---
        let label_render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Label Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &labels_shader_module,
                entry_point: Some("vs_main"),
                buffers: &[
                    Vertex2D::layout(),
                    LabelShapeInstance::layout(),
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &labels_shader_module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: texture_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview_mask: None,
            cache: None,
        });

        let background_mesh = GpuMesh::upload(&device, "Background Node", &Mesh::icosahedron(field.config.background_radius));
        let skill_mesh = GpuMesh::upload(
            &device,
            "Skill Node",
            &Mesh::uv_sphere(field.config.skill_radius, SPHERE_SEGMENTS, SPHERE_SEGMENTS),
        );

        let node_instances = Vec::with_capacity(field.nodes.len());
        let node_instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Node Instance Buffer"),
            size: (field.nodes.len().max(1) * std::mem::size_of::<NodeInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Sized once for the worst case, only the draw range is rewritten.
        let line_capacity = field.connections.capacity() * 2;
        let line_vertices = Vec::with_capacity(line_capacity);
        let line_vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Line Vertex Buffer"),
            size: (line_capacity.max(2) * std::mem::size_of::<LineVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let quad_vertex_buffer = device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Quad Vertex Buffer"),
                contents: bytemuck::cast_slice(Vertex2D::QUAD_VERTICES.as_slice()),
                usage: wgpu::BufferUsages::VERTEX,
            }
        );
        let quad_index_buffer = device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Quad Index Buffer"),
                contents: bytemuck::cast_slice(Vertex2D::QUAD_INDICES.as_slice()),
                usage: wgpu::BufferUsages::INDEX,
            }
        );

        // pill + bullet per skill
        let label_capacity = field.config.skills.len() * 2;
        let label_shapes = Vec::with_capacity(label_capacity);
        let label_shape_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Label Shape Buffer"),
            size: (label_capacity.max(1) * std::mem::size_of::<LabelShapeInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok( Self {
            surface, device, queue, config, is_surface_configured: false, depth_view, scale_factor,
            glyphon_font_system, glyphon_swash_cache, glyphon_viewport,
            glyphon_atlas, glyphon_renderer, glyphon_buffers,
            camera, camera_buffer, camera_bind_group, camera_uniform,
            node_render_pipeline, line_render_pipeline, label_render_pipeline,
            background_mesh, skill_mesh, node_instances, node_instance_buffer,
            line_vertices, line_vertex_buffer,
            quad_vertex_buffer, quad_index_buffer, label_shapes, label_shape_buffer,
            field, pointer: Pointer::OFF_SCREEN,
            last_frame_instant: instant::Instant::now(), frame_count_in_second: 0, current_fps: 0,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            log::info!("Resize {}, {}", width, height);
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, width, height);

            self.camera.update_aspect_ratio(width, height);
            self.camera_uniform.viewport = [width as f32, height as f32, 0.0, 0.0];
            self.is_surface_configured = true;
        }
    }

    pub fn set_scale_factor(&mut self, scale_factor: f32) {
        self.scale_factor = scale_factor;
        let names: Vec<String> = self.field.config.skills.iter().map(|s| s.name.clone()).collect();
        self.glyphon_buffers = names
            .iter()
            .map(|name| label_buffer(&mut self.glyphon_font_system, name, scale_factor))
            .collect();
    }

    /// Registers a font and makes it the label face, replacing the bundled one.
    pub fn load_font(&mut self, data: Vec<u8>) {
        let db = self.glyphon_font_system.db_mut();
        let known_faces = db.len();
        db.load_font_data(data);
        let Some(family) = db
            .faces()
            .skip(known_faces)
            .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
        else {
            log::warn!("Font data held no usable face, keeping {}.", BUNDLED_LABEL_FAMILY);
            return;
        };
        log::info!("Label font is now {}.", family);
        db.set_sans_serif_family(family);
        self.set_scale_factor(self.scale_factor);
    }

    /// Advances the field one frame and stages everything the GPU needs.
    pub fn update(&mut self) -> FrameReport {
        let report = self.field.step(&FrameInput { pointer: self.pointer, camera: &self.camera });

        self.camera_uniform.view_proj = self.camera.build_view_projection_matrix().to_cols_array_2d();
        self.camera_uniform.group = self.field.group_matrix().to_cols_array_2d();
        self.camera_uniform.eye = self.camera.eye.extend(1.0).to_array();
        self.queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[self.camera_uniform]));

        self.node_instances.clear();
        self.node_instances.extend(self.field.nodes.iter().map(node_instance));
        self.queue.write_buffer(&self.node_instance_buffer, 0, bytemuck::cast_slice(&self.node_instances));

        let line_color = palette::LINE.into_linear_rgba();
        self.line_vertices.clear();
        self.line_vertices.extend(
            self.field
                .connections
                .segments()
                .iter()
                .flatten()
                .map(|p| LineVertex { position: p.to_array(), color: line_color }),
        );
        if !self.line_vertices.is_empty() {
            self.queue.write_buffer(&self.line_vertex_buffer, 0, bytemuck::cast_slice(&self.line_vertices));
        }

        report
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        if !self.is_surface_configured {
            return Ok(());
        }

        let width = self.config.width;
        let height = self.config.height;
        self.glyphon_viewport.update(&self.queue, glyphon::Resolution { width, height });

        // --- FPS Calculation ---
        self.frame_count_in_second += 1;
        let now = instant::Instant::now();
        let elapsed = (now - self.last_frame_instant).as_secs_f32();
        if elapsed >= 1.0 {
            self.current_fps = self.frame_count_in_second;
            self.frame_count_in_second = 0;
            self.last_frame_instant = now;
            log::trace!("FPS: {}", self.current_fps);
        }

        // --- Label overlay layout ---
        let s = self.scale_factor;
        let placements = self.field.labels(&self.camera, s);
        let mut text_areas = Vec::with_capacity(placements.len());
        self.label_shapes.clear();
        for placement in &placements {
            let Some(buffer) = self.glyphon_buffers.get(placement.skill) else { continue };
            let text_width = buffer.layout_runs().map(|run| run.line_w).fold(0.0, f32::max);
            let half_size = Vec2::new(
                (LABEL_PAD_X * 2.0 + BULLET_SIZE + BULLET_GAP) * s + text_width,
                (LABEL_PAD_Y * 2.0 + LABEL_LINE_HEIGHT) * s,
            ) * 0.5;
            let left = placement.center.x - half_size.x;

            self.label_shapes.push(LabelShapeInstance {
                center: placement.center.to_array(),
                half_size: half_size.to_array(),
                corner_radius: LABEL_RADIUS * s,
                border_width: s,
                fill: palette::LABEL_FILL.into_linear_rgba(),
                border: palette::LABEL_BORDER.into_linear_rgba(),
            });
            let bullet = Vec2::splat(BULLET_SIZE * s * 0.5);
            self.label_shapes.push(LabelShapeInstance {
                center: [left + LABEL_PAD_X * s + bullet.x, placement.center.y],
                half_size: bullet.to_array(),
                corner_radius: bullet.x,
                border_width: 0.0,
                fill: placement.color.into_linear_rgba(),
                border: placement.color.into_linear_rgba(),
            });

            text_areas.push(glyphon::TextArea {
                buffer,
                left: left + (LABEL_PAD_X + BULLET_SIZE + BULLET_GAP) * s,
                top: placement.center.y - LABEL_LINE_HEIGHT * s * 0.5,
                scale: 1.0,
                bounds: glyphon::TextBounds::default(),
                default_color: palette::TEXT.into_glyphon(),
                custom_glyphs: &[],
            });
        }
        if !self.label_shapes.is_empty() {
            self.queue.write_buffer(&self.label_shape_buffer, 0, bytemuck::cast_slice(&self.label_shapes));
        }

        if let Err(e) = self.glyphon_renderer.prepare(
            &self.device,
            &self.queue,
            &mut self.glyphon_font_system,
            &mut self.glyphon_atlas,
            &self.glyphon_viewport,
            text_areas,
            &mut self.glyphon_swash_cache,
        ) {
            log::warn!("Label text preparation failed: {:?}", e);
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let background_count = self.field.background_count() as u32;
        let node_count = self.field.nodes.len() as u32;

        // Pass 1: the 3D field.
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Field Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
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
                multiview_mask: None,
            });

            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            // Opaque skill spheres first, then the translucent background.
            render_pass.set_pipeline(&self.node_render_pipeline);
            render_pass.set_vertex_buffer(1, self.node_instance_buffer.slice(..));
            for (mesh, instances) in [
                (&self.skill_mesh, background_count..node_count),
                (&self.background_mesh, 0..background_count),
            ] {
                if instances.is_empty() {
                    continue;
                }
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..mesh.index_count, 0, instances);
            }

            if !self.line_vertices.is_empty() {
                render_pass.set_pipeline(&self.line_render_pipeline);
                render_pass.set_vertex_buffer(0, self.line_vertex_buffer.slice(..));
                render_pass.draw(0..self.line_vertices.len() as u32, 0..1);
            }
        }

        // Pass 2: the label overlay.
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Label Overlay Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
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

            if !self.label_shapes.is_empty() {
                render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
                render_pass.set_pipeline(&self.label_render_pipeline);
                render_pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, self.label_shape_buffer.slice(..));
                render_pass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(
                    0..Vertex2D::QUAD_INDICES.len() as u32,
                    0,
                    0..self.label_shapes.len() as u32,
                );
            }

            if let Err(e) = self.glyphon_renderer.render(&self.glyphon_atlas, &self.glyphon_viewport, &mut render_pass) {
                log::warn!("Label text render failed: {:?}", e);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.glyphon_atlas.trim();

        Ok(())
    }
}

fn node_instance(node: &Node) -> NodeInstance {
    let model = node.model_matrix().to_cols_array_2d();
    match &node.kind {
        NodeKind::Background => match node.appearance.material {
            Material::Base => NodeInstance {
                model,
                color: palette::NODE_BASE.into_linear_rgba(),
                emissive: [0.0; 4],
            },
            Material::Highlight => {
                let [r, g, b, _] = palette::ACCENT.into_linear_rgba();
                NodeInstance {
                    model,
                    color: [r, g, b, 1.0],
                    emissive: [r, g, b, palette::HIGHLIGHT_EMISSIVE],
                }
            }
        },
        NodeKind::Skill { base_color, .. } => {
            let [r, g, b, _] = Color(*base_color).into_linear_rgba();
            NodeInstance {
                model,
                color: [r, g, b, 1.0],
                emissive: [r, g, b, node.appearance.emissive_intensity],
            }
        }
    }
}

fn label_buffer(font_system: &mut glyphon::FontSystem, text: &str, scale_factor: f32) -> glyphon::Buffer {
    let mut buffer = glyphon::Buffer::new(
        font_system,
        glyphon::Metrics::new(LABEL_FONT_SIZE * scale_factor, LABEL_LINE_HEIGHT * scale_factor),
    );
    buffer.set_size(font_system, None, None);
    let attrs = glyphon::Attrs::new().family(glyphon::Family::SansSerif).weight(glyphon::Weight::MEDIUM);
    buffer.set_text(font_system, text, &attrs, glyphon::Shaping::Advanced, None);
    buffer.shape_until_scroll(font_system, false);
    buffer
}

fn fog_uniform(density: f32) -> [f32; 4] {
    let [r, g, b, _] = palette::BACKGROUND.into_linear_rgba();
    [r, g, b, density]
}

fn depth_state(write: bool) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: wgpu::CompareFunction::LessEqual,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_font_provides_the_label_family() {
        let mut db = glyphon::fontdb::Database::new();
        db.load_font_data(BUNDLED_LABEL_FONT.to_vec());
        assert!(
            db.faces()
                .any(|face| face.families.iter().any(|(name, _)| name == BUNDLED_LABEL_FAMILY))
        );
    }

    #[test]
    fn bundled_font_shapes_label_text() {
        let mut font_system = glyphon::FontSystem::new_with_locale_and_db(
            "en-US".to_string(),
            glyphon::fontdb::Database::new(),
        );
        font_system.db_mut().load_font_data(BUNDLED_LABEL_FONT.to_vec());
        font_system.db_mut().set_sans_serif_family(BUNDLED_LABEL_FAMILY);
        let buffer = label_buffer(&mut font_system, "Machine Learning", 1.0);
        let width = buffer.layout_runs().map(|run| run.line_w).fold(0.0, f32::max);
        assert!(width > 0.0);
    }
}
