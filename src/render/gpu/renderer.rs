use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Context;
use wgpu::CommandEncoderDescriptor;
use winit::{event::Event, window::Window};

use crate::assets::{TextureId, TextureSettings};
use crate::render::gpu::imgui_layer::ImguiLayer;
use crate::render::gpu::mesh_cache::MeshCache;
use crate::render::gpu::pipelines::{PipelineCache, PipelineKey};
use crate::render::gpu::texture::{DepthTexture, SamplerKey, TextureCache};
use crate::render::gpu::uniforms::{FrameUniform, FrameUniformState, ObjectUniformState, ObjectUniforms, MAP_SLOTS};
use crate::render::{DrawList, Renderer};
use crate::stage::Stage;

type MaterialKey = [(Option<(TextureId, u64)>, SamplerKey); MAP_SLOTS];

/// A draw list item that made it through upload, in object uniform order.
struct PreparedDraw {
    item: usize,
    pipeline: PipelineKey,
    material: MaterialKey,
}

pub struct GpuRenderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pixel_ratio: f64,
    out_of_memory: bool,

    depth_texture: DepthTexture,
    frame_uniform: FrameUniform,
    objects: ObjectUniforms,
    material_layout: wgpu::BindGroupLayout,
    materials: HashMap<MaterialKey, wgpu::BindGroup>,
    pipelines: PipelineCache,
    meshes: MeshCache,
    textures: TextureCache,
    imgui: ImguiLayer,
}

impl GpuRenderer {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<GpuRenderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapter")?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to create device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .context("Surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = DepthTexture::new(&device, &config, "Depth texture");
        let frame_uniform = FrameUniform::new(&device);
        let objects = ObjectUniforms::new(&device);
        let material_layout = create_material_layout(&device);
        let pipelines = PipelineCache::new(
            &device,
            surface_format,
            &[
                &frame_uniform.bind_group_layout,
                &objects.bind_group_layout,
                &material_layout,
            ],
        );
        let textures = TextureCache::new(&device, &queue);
        let imgui = ImguiLayer::new(&window, &device, &queue, surface_format);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            pixel_ratio: 1.0,
            out_of_memory: false,
            depth_texture,
            frame_uniform,
            objects,
            material_layout,
            materials: HashMap::new(),
            pipelines,
            meshes: MeshCache::default(),
            textures,
            imgui,
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Set once the surface reported it ran out of memory.
    pub fn is_out_of_memory(&self) -> bool {
        self.out_of_memory
    }

    pub fn handle_event(&mut self, event: &Event<()>) {
        self.imgui.handle_event(&self.window, event);
    }

    pub fn wants_pointer(&self) -> bool {
        self.imgui.wants_pointer()
    }

    pub fn wants_keyboard(&self) -> bool {
        self.imgui.wants_keyboard()
    }

    /// Builds the overlay drawn on top of the next rendered frame.
    pub fn ui_frame(&mut self, build: impl FnOnce(&imgui::Ui)) -> anyhow::Result<()> {
        self.imgui.frame(&self.window, build)
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.depth_texture.resize(&self.device, &self.config);
    }

    /// Uploads everything the draw list needs.
    fn prepare(&mut self, stage: &Stage, list: &DrawList) -> Vec<PreparedDraw> {
        let scene = &stage.scene;
        self.meshes.retain(|id| scene.shape(id).is_some());

        let mut draws = Vec::with_capacity(list.items.len());
        let mut states = Vec::with_capacity(list.items.len());
        let default_sampler = self
            .textures
            .prepare_sampler(&self.device, &TextureSettings::default());

        for (index, item) in list.items.iter().enumerate() {
            let (Some(shape), Some(appearance)) =
                (scene.shape(item.shape), scene.appearance(item.appearance))
            else {
                continue;
            };

            self.meshes.prepare(&self.device, item.shape, shape);

            let slots = [
                item.maps.color,
                item.maps.alpha,
                item.maps.ambient_occlusion,
                item.maps.roughness,
                item.maps.metalness,
                item.maps.normal,
                item.maps.displacement,
            ];

            let mut material_key = [(None, default_sampler); MAP_SLOTS];
            for (slot, map) in slots.into_iter().enumerate() {
                let Some((id, texture)) = map.and_then(|id| Some((id, stage.textures.get(id)?))) else {
                    continue;
                };

                self.textures
                    .sync(&self.device, &self.queue, &stage.textures, id);
                let sampler = self.textures.prepare_sampler(&self.device, &texture.settings);
                let revision = self.textures.get(id).map(|gpu| gpu.revision);
                material_key[slot] = (revision.map(|revision| (id, revision)), sampler);
            }

            let pipeline_key = PipelineKey {
                wireframe: appearance.wireframe,
                blended: item.blended,
                side: appearance.side,
            };
            self.pipelines.prepare(&self.device, pipeline_key);

            draws.push(PreparedDraw {
                item: index,
                pipeline: pipeline_key,
                material: material_key,
            });
            states.push(ObjectUniformState::new(item, appearance, &stage.textures));
        }

        let used: HashSet<MaterialKey> = draws.iter().map(|draw| draw.material).collect();
        self.materials.retain(|key, _| used.contains(key));
        for key in used {
            if self.materials.contains_key(&key) {
                continue;
            }
            let bind_group = self.create_material_bind_group(&key);
            self.materials.insert(key, bind_group);
        }

        self.objects.upload(&self.device, &self.queue, &states);
        self.frame_uniform
            .update(&self.queue, &FrameUniformState::from_draw_list(list));

        draws
    }

    fn create_material_bind_group(&self, key: &MaterialKey) -> wgpu::BindGroup {
        let views: Vec<&wgpu::TextureView> = key
            .iter()
            .map(|(texture, _)| {
                texture
                    .and_then(|(id, _)| self.textures.get(id))
                    .map(|gpu| &gpu.view)
                    .unwrap_or(self.textures.fallback_view())
            })
            .collect();

        let mut entries = Vec::with_capacity(MAP_SLOTS * 2);
        for (slot, view) in views.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: slot as u32,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }
        for (slot, (_, sampler_key)) in key.iter().enumerate() {
            if let Some(sampler) = self.textures.sampler(sampler_key) {
                entries.push(wgpu::BindGroupEntry {
                    binding: (MAP_SLOTS + slot) as u32,
                    resource: wgpu::BindingResource::Sampler(sampler),
                });
            }
        }

        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material bind group"),
            layout: &self.material_layout,
            entries: &entries,
        })
    }
}

fn create_material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let textures = (0..MAP_SLOTS).map(|slot| wgpu::BindGroupLayoutEntry {
        binding: slot as u32,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    });
    let samplers = (0..MAP_SLOTS).map(|slot| wgpu::BindGroupLayoutEntry {
        binding: (MAP_SLOTS + slot) as u32,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    });
    let entries: Vec<_> = textures.chain(samplers).collect();

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Material bind group layout"),
        entries: &entries,
    })
}

impl Renderer for GpuRenderer {
    fn set_size(&mut self, width: u32, height: u32, pixel_ratio: f64) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.pixel_ratio = pixel_ratio;
        self.imgui.set_pixel_ratio(pixel_ratio);
        self.reconfigure();
    }

    fn output_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn render(&mut self, stage: &Stage) -> anyhow::Result<()> {
        let list = DrawList::prepare(stage)?;
        let draws = self.prepare(stage, &list);

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.out_of_memory = true;
                anyhow::bail!("Surface out of memory");
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timeout");
                return Ok(());
            }
            Err(other) => return Err(other).context("Failed to acquire surface texture"),
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let clear = stage.clear_color.to_linear();
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear.x as f64,
                            g: clear.y as f64,
                            b: clear.z as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.depth_texture.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.frame_uniform.bind_group, &[]);

            for (index, draw) in draws.iter().enumerate() {
                let item = &list.items[draw.item];
                let (Some(pipeline), Some(mesh), Some(material)) = (
                    self.pipelines.get(&draw.pipeline),
                    self.meshes.get(item.shape),
                    self.materials.get(&draw.material),
                ) else {
                    continue;
                };

                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(1, &self.objects.bind_group, &[self.objects.offset(index)]);
                render_pass.set_bind_group(2, material, &[]);
                render_pass.set_vertex_buffer(0, mesh.vertices.slice(..));

                if draw.pipeline.wireframe {
                    render_pass.set_index_buffer(mesh.edges.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..mesh.edge_index_count, 0, 0..1);
                } else {
                    render_pass.set_index_buffer(mesh.triangles.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..mesh.triangle_index_count, 0, 0..1);
                }
            }
        }

        let imgui_result = self
            .imgui
            .render(&view, &self.device, &self.queue, &mut encoder);

        self.queue.submit([encoder.finish()]);
        output.present();

        imgui_result
    }
}
