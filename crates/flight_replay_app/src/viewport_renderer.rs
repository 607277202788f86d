// SPDX-License-Identifier: MIT OR Apache-2.0
//! Viewport 3D renderer.
//!
//! Renders the replay scene (terrain, aircraft and optional flight path
//! line) into an off-screen texture that the viewport panel shows as an
//! egui image.

use crate::mesh::{line_strip, srgb_to_linear, MeshData, MeshVertex};
use egui_wgpu::wgpu;
use glam::{Mat4, Vec3};
use flight_replay_core::{CameraLens, CameraView, FlightPath, Scenario};
use wgpu::util::DeviceExt as _;

/// Samples used to draw the flight path line
const PATH_LINE_SAMPLES: usize = 200;

/// Height of the runway above the ground plane, to keep it out of the ground's depth
const RUNWAY_HEIGHT: f32 = 1.0;

impl MeshVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];

    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Per-frame scene uniforms
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneUniform {
    view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
    fog_color: [f32; 4],
    fog_range: [f32; 4],
    sun_direction: [f32; 4],
    ambient: [f32; 4],
    sun: [f32; 4],
}

/// Per-object model matrix
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct ModelUniform {
    transform: [[f32; 4]; 4],
}

/// Fixed lighting and fog values taken from the scenario
#[derive(Debug, Clone, Copy)]
struct Atmosphere {
    fog_color: [f32; 3],
    fog_range: [f32; 2],
    sun_direction: Vec3,
    ambient: [f32; 3],
    sun: f32,
}

/// Vertex (and optional index) buffer ready to draw
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    count: u32,
}

impl GpuMesh {
    fn indexed(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer: Some(index_buffer),
            count: mesh.indices.len() as u32,
        }
    }

    fn lines(device: &wgpu::Device, label: &str, vertices: &[MeshVertex]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            vertex_buffer,
            index_buffer: None,
            count: vertices.len() as u32,
        }
    }

    fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        match &self.index_buffer {
            Some(index_buffer) => {
                render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..self.count, 0, 0..1);
            }
            None => render_pass.draw(0..self.count, 0..1),
        }
    }
}

/// Model matrix uniform buffer and its bind group
struct ModelBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl ModelBinding {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str, transform: Mat4) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[ModelUniform {
                transform: transform.to_cols_array_2d(),
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self { buffer, bind_group }
    }

    fn write(&self, queue: &wgpu::Queue, transform: Mat4) {
        let uniform = ModelUniform {
            transform: transform.to_cols_array_2d(),
        };
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniform]));
    }
}

/// Viewport renderer that renders the replay scene to a texture
pub struct ViewportRenderer {
    /// Color target view; keeps its texture alive
    render_view: wgpu::TextureView,
    /// Depth target view
    depth_view: wgpu::TextureView,
    /// Current size
    size: [u32; 2],
    /// Lit triangle pipeline
    mesh_pipeline: wgpu::RenderPipeline,
    /// Unlit line strip pipeline
    line_pipeline: wgpu::RenderPipeline,
    /// Scene uniform buffer
    scene_buffer: wgpu::Buffer,
    /// Scene bind group
    scene_bind_group: wgpu::BindGroup,
    /// Ground and runway
    terrain: GpuMesh,
    /// Identity transform shared by world-space geometry
    world_model: ModelBinding,
    /// Flight path line
    path_line: GpuMesh,
    /// Aircraft, once its model has loaded
    aircraft: Option<GpuMesh>,
    /// Aircraft transform
    aircraft_model: ModelBinding,
    /// Background color (linear)
    clear_color: wgpu::Color,
    /// Lighting and fog
    atmosphere: Atmosphere,
    /// egui texture ID for the render result
    egui_texture_id: Option<egui::TextureId>,
    /// Render texture was recreated since it was registered with egui
    texture_dirty: bool,
}

impl ViewportRenderer {
    /// Create a new viewport renderer for a scenario
    pub fn new(
        device: &wgpu::Device,
        initial_size: [u32; 2],
        scenario: &Scenario,
        path: &FlightPath,
    ) -> Self {
        let size = [initial_size[0].max(1), initial_size[1].max(1)];

        let render_view = Self::create_render_texture(device, size);
        let depth_view = Self::create_depth_texture(device, size);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Viewport Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("viewport.wgsl").into()),
        });

        let scene_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Buffer"),
            contents: bytemuck::cast_slice(&[SceneUniform {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                camera_position: [0.0; 4],
                fog_color: [0.0; 4],
                fog_range: [0.0, 1.0, 0.0, 0.0],
                sun_direction: [0.0, 1.0, 0.0, 0.0],
                ambient: [1.0; 4],
                sun: [0.0; 4],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let scene_bind_group_layout = Self::uniform_layout(
            device,
            "Scene Bind Group Layout",
            wgpu::ShaderStages::VERTEX_FRAGMENT,
        );
        let model_bind_group_layout =
            Self::uniform_layout(device, "Model Bind Group Layout", wgpu::ShaderStages::VERTEX);

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Viewport Pipeline Layout"),
            bind_group_layouts: &[&scene_bind_group_layout, &model_bind_group_layout],
            push_constant_ranges: &[],
        });

        let mesh_pipeline = Self::create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            "Mesh Pipeline",
            "fs_lit",
            wgpu::PrimitiveTopology::TriangleList,
        );
        let line_pipeline = Self::create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            "Path Line Pipeline",
            "fs_unlit",
            wgpu::PrimitiveTopology::LineStrip,
        );

        let environment = &scenario.environment;
        let terrain = GpuMesh::indexed(device, "Terrain", &Self::create_terrain_mesh(scenario));
        let path_line = GpuMesh::lines(
            device,
            "Flight Path",
            &line_strip(
                &path.sample(PATH_LINE_SAMPLES),
                srgb_to_linear(environment.path_color),
            ),
        );

        let world_model =
            ModelBinding::new(device, &model_bind_group_layout, "World Model", Mat4::IDENTITY);
        let aircraft_model =
            ModelBinding::new(device, &model_bind_group_layout, "Aircraft Model", Mat4::IDENTITY);

        let [r, g, b] = srgb_to_linear(environment.sky_color);
        let ambient_color = srgb_to_linear(environment.ambient_color);
        let atmosphere = Atmosphere {
            fog_color: srgb_to_linear(environment.fog_color),
            fog_range: [environment.fog_near, environment.fog_far],
            sun_direction: Vec3::from(environment.sun_position).normalize_or(Vec3::Y),
            ambient: ambient_color.map(|c| c * environment.ambient_intensity),
            sun: environment.sun_intensity,
        };

        Self {
            render_view,
            depth_view,
            size,
            mesh_pipeline,
            line_pipeline,
            scene_buffer,
            scene_bind_group,
            terrain,
            world_model,
            path_line,
            aircraft: None,
            aircraft_model,
            clear_color: wgpu::Color {
                r: f64::from(r),
                g: f64::from(g),
                b: f64::from(b),
                a: 1.0,
            },
            atmosphere,
            egui_texture_id: None,
            texture_dirty: false,
        }
    }

    fn uniform_layout(
        device: &wgpu::Device,
        label: &str,
        visibility: wgpu::ShaderStages,
    ) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        })
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        label: &str,
        fragment_entry: &str,
        topology: wgpu::PrimitiveTopology,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(fragment_entry),
                targets: &[Some(wgpu::ColorTargetState {
                    format: wgpu::TextureFormat::Rgba8UnormSrgb,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_render_texture(device: &wgpu::Device, size: [u32; 2]) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Viewport Render Texture"),
            size: wgpu::Extent3d {
                width: size[0],
                height: size[1],
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn create_depth_texture(device: &wgpu::Device, size: [u32; 2]) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Viewport Depth Texture"),
            size: wgpu::Extent3d {
                width: size[0],
                height: size[1],
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Ground plane with the runway on top
    fn create_terrain_mesh(scenario: &Scenario) -> MeshData {
        let environment = &scenario.environment;
        let mut mesh = MeshData::new();

        let half = environment.ground_size * 0.5;
        mesh.push_ground_rect(
            [-half, -half],
            [half, half],
            0.0,
            srgb_to_linear(environment.ground_color),
        );

        let half_width = environment.runway_width * 0.5;
        mesh.push_ground_rect(
            [-half_width, environment.runway_start_z],
            [half_width, environment.runway_start_z + environment.runway_length],
            RUNWAY_HEIGHT,
            srgb_to_linear(environment.runway_color),
        );

        mesh
    }

    /// Upload the aircraft mesh, replacing any previous one
    pub fn upload_aircraft(&mut self, device: &wgpu::Device, mesh: &MeshData) {
        self.aircraft = Some(GpuMesh::indexed(device, "Aircraft", mesh));
    }

    /// Resize the viewport
    pub fn resize(&mut self, device: &wgpu::Device, new_size: [u32; 2]) {
        let new_size = [new_size[0].max(1), new_size[1].max(1)];
        if new_size != self.size {
            self.size = new_size;
            self.render_view = Self::create_render_texture(device, new_size);
            self.depth_view = Self::create_depth_texture(device, new_size);
            // Point the existing egui texture at the new view on next use
            self.texture_dirty = true;
        }
    }

    /// Update camera and aircraft uniforms for this frame
    pub fn update_frame(
        &self,
        queue: &wgpu::Queue,
        view: &CameraView,
        lens: &CameraLens,
        aspect: f32,
        aircraft_transform: Option<Mat4>,
    ) {
        let view_proj = lens.projection(aspect) * view.view_matrix();
        let atmosphere = &self.atmosphere;
        let [fog_r, fog_g, fog_b] = atmosphere.fog_color;
        let [ambient_r, ambient_g, ambient_b] = atmosphere.ambient;

        let uniform = SceneUniform {
            view_proj: view_proj.to_cols_array_2d(),
            camera_position: view.position.extend(1.0).to_array(),
            fog_color: [fog_r, fog_g, fog_b, 1.0],
            fog_range: [atmosphere.fog_range[0], atmosphere.fog_range[1], 0.0, 0.0],
            sun_direction: atmosphere.sun_direction.extend(0.0).to_array(),
            ambient: [ambient_r, ambient_g, ambient_b, 1.0],
            sun: [atmosphere.sun, atmosphere.sun, atmosphere.sun, 1.0],
        };
        queue.write_buffer(&self.scene_buffer, 0, bytemuck::cast_slice(&[uniform]));

        if let Some(transform) = aircraft_transform {
            self.aircraft_model.write(queue, transform);
        }
    }

    /// Render the viewport scene
    pub fn render(&self, device: &wgpu::Device, queue: &wgpu::Queue, show_path: bool, show_aircraft: bool) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Viewport Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Viewport Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.render_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
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

            render_pass.set_pipeline(&self.mesh_pipeline);
            render_pass.set_bind_group(0, &self.scene_bind_group, &[]);

            render_pass.set_bind_group(1, &self.world_model.bind_group, &[]);
            self.terrain.draw(&mut render_pass);

            if let (true, Some(aircraft)) = (show_aircraft, &self.aircraft) {
                render_pass.set_bind_group(1, &self.aircraft_model.bind_group, &[]);
                aircraft.draw(&mut render_pass);
            }

            if show_path {
                render_pass.set_pipeline(&self.line_pipeline);
                render_pass.set_bind_group(1, &self.world_model.bind_group, &[]);
                self.path_line.draw(&mut render_pass);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Get or create the egui texture ID for this viewport
    pub fn get_egui_texture_id(
        &mut self,
        egui_renderer: &mut egui_wgpu::Renderer,
        device: &wgpu::Device,
    ) -> egui::TextureId {
        match self.egui_texture_id {
            Some(id) if self.texture_dirty => {
                egui_renderer.update_egui_texture_from_wgpu_texture(
                    device,
                    &self.render_view,
                    wgpu::FilterMode::Linear,
                    id,
                );
                self.texture_dirty = false;
                id
            }
            Some(id) => id,
            None => {
                let id = egui_renderer.register_native_texture(
                    device,
                    &self.render_view,
                    wgpu::FilterMode::Linear,
                );
                self.egui_texture_id = Some(id);
                self.texture_dirty = false;
                id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_are_aligned() {
        assert_eq!(size_of::<SceneUniform>() % 16, 0);
        assert_eq!(size_of::<SceneUniform>(), 160);
        assert_eq!(size_of::<ModelUniform>(), 64);
        assert_eq!(size_of::<MeshVertex>(), 36);
    }

    #[test]
    fn test_terrain_mesh() {
        let scenario = Scenario::default();
        let mesh = ViewportRenderer::create_terrain_mesh(&scenario);
        assert_eq!(mesh.triangle_count(), 4);

        let runway_z: Vec<f32> = mesh.vertices[4..].iter().map(|v| v.position[2]).collect();
        assert!(runway_z.iter().all(|&z| (300.0..=2800.0).contains(&z)));
        assert!(mesh.vertices[4..].iter().all(|v| v.position[1] == RUNWAY_HEIGHT));
    }
}
