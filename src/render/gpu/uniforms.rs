use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Mat3;
use wgpu::util::DeviceExt;

use crate::assets::{Appearance, ShadingModel, Side, TextureStore};
use crate::render::{DrawItem, DrawLight, DrawList};
use crate::scene_graph::LightKind;

pub const MAX_LIGHTS: usize = 16;
pub const MAP_SLOTS: usize = 7;

/// `mat3x3<f32>` as laid out in a uniform buffer.
type GpuMat3 = [[f32; 4]; 3];

fn gpu_mat3(matrix: Mat3) -> GpuMat3 {
    let cols = matrix.to_cols_array_2d();
    cols.map(|[x, y, z]| [x, y, z, 0.0])
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuLight {
    position_range: [f32; 4],
    direction_decay: [f32; 4],
    color: [f32; 4],
    ground: [f32; 4],
    cone: [f32; 4],
    kind: [u32; 4],
}

impl From<&DrawLight> for GpuLight {
    fn from(light: &DrawLight) -> Self {
        let color = (light.color * light.intensity).extend(1.0).to_array();
        let mut gpu = GpuLight {
            position_range: light.position.extend(0.0).to_array(),
            direction_decay: light.direction.extend(0.0).to_array(),
            color,
            ground: [0.0; 4],
            cone: [0.0; 4],
            kind: [0; 4],
        };

        match light.kind {
            LightKind::Ambient => gpu.kind[0] = 0,
            LightKind::Hemisphere { ground_color } => {
                gpu.kind[0] = 1;
                gpu.ground = (ground_color.to_linear() * light.intensity).extend(1.0).to_array();
            }
            LightKind::Directional { .. } => gpu.kind[0] = 2,
            LightKind::Point { distance, decay } => {
                gpu.kind[0] = 3;
                gpu.position_range[3] = distance;
                gpu.direction_decay[3] = decay;
            }
            LightKind::Spot {
                distance,
                angle,
                penumbra,
                decay,
                ..
            } => {
                gpu.kind[0] = 4;
                gpu.position_range[3] = distance;
                gpu.direction_decay[3] = decay;
                gpu.cone = [angle.cos(), (angle * (1.0 - penumbra)).cos(), 0.0, 0.0];
            }
            LightKind::RectArea { width, height, .. } => {
                gpu.kind[0] = 5;
                gpu.direction_decay[3] = 2.0;
                gpu.cone = [width, height, 0.0, 0.0];
            }
        }

        gpu
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FrameUniformState {
    view_proj: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    camera_position: [f32; 4],
    light_count: [u32; 4],
    lights: [GpuLight; MAX_LIGHTS],
}

impl FrameUniformState {
    pub fn from_draw_list(list: &DrawList) -> Self {
        let mut lights = [GpuLight::zeroed(); MAX_LIGHTS];
        if list.lights.len() > MAX_LIGHTS {
            log::warn!(
                "{} lights in the scene, only the first {} are used",
                list.lights.len(),
                MAX_LIGHTS
            );
        }

        let count = list.lights.len().min(MAX_LIGHTS);
        for (slot, light) in lights.iter_mut().zip(&list.lights) {
            *slot = light.into();
        }

        Self {
            view_proj: (list.projection * list.view).to_cols_array_2d(),
            view: list.view.to_cols_array_2d(),
            camera_position: list.camera_position.extend(1.0).to_array(),
            light_count: [count as u32, 0, 0, 0],
            lights,
        }
    }
}

pub struct FrameUniform {
    buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl FrameUniform {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame uniform buffer"),
            contents: bytemuck::cast_slice(&[FrameUniformState::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame uniform bind group layout"),
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
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame uniform bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, state: &FrameUniformState) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[*state]));
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ObjectUniformState {
    model: [[f32; 4]; 4],
    normal_matrix: GpuMat3,
    color: [f32; 4],
    params: [f32; 4],
    flags: [u32; 4],
    uv_transforms: [GpuMat3; MAP_SLOTS],
}

impl ObjectUniformState {
    pub fn new(item: &DrawItem, appearance: &Appearance, textures: &TextureStore) -> Self {
        let maps = [
            item.maps.color,
            item.maps.alpha,
            item.maps.ambient_occlusion,
            item.maps.roughness,
            item.maps.metalness,
            item.maps.normal,
            item.maps.displacement,
        ];

        let mut mask = 0u32;
        let mut uv_transforms = [gpu_mat3(Mat3::IDENTITY); MAP_SLOTS];
        for (slot, map) in maps.iter().enumerate() {
            let Some(texture) = map.and_then(|id| textures.get(id)) else {
                continue;
            };
            mask |= 1 << slot;
            uv_transforms[slot] = gpu_mat3(texture.settings.uv_transform());
        }

        let shading = match appearance.shading {
            ShadingModel::Basic => 0,
            ShadingModel::Lambert => 1,
            ShadingModel::Standard => 2,
            ShadingModel::Normal => 3,
        };

        Self {
            model: item.world.to_cols_array_2d(),
            normal_matrix: gpu_mat3(item.normal_matrix),
            color: appearance
                .color
                .to_linear()
                .extend(if appearance.transparent { appearance.opacity } else { 1.0 })
                .to_array(),
            params: [
                appearance.roughness,
                appearance.metalness,
                appearance.displacement_scale,
                appearance.displacement_bias,
            ],
            flags: [shading, mask, (appearance.side == Side::Double) as u32, 0],
            uv_transforms,
        }
    }
}

/// One slot per draw item, bound with a dynamic offset.
pub struct ObjectUniforms {
    buffer: wgpu::Buffer,
    capacity: usize,
    stride: u64,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl ObjectUniforms {
    const INITIAL_CAPACITY: usize = 64;

    pub fn new(device: &wgpu::Device) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let size = std::mem::size_of::<ObjectUniformState>() as u64;
        let stride = size.div_ceil(alignment) * alignment;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object uniform bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(size),
                },
                count: None,
            }],
        });

        let (buffer, bind_group) =
            Self::allocate(device, &bind_group_layout, Self::INITIAL_CAPACITY, stride);

        Self {
            buffer,
            capacity: Self::INITIAL_CAPACITY,
            stride,
            bind_group,
            bind_group_layout,
        }
    }

    fn allocate(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        capacity: usize,
        stride: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Object uniform buffer"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object uniform bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(std::mem::size_of::<ObjectUniformState>() as u64),
                }),
            }],
        });

        (buffer, bind_group)
    }

    /// Uploads all states, growing the buffer when needed.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, states: &[ObjectUniformState]) {
        if states.len() > self.capacity {
            let capacity = states.len().next_power_of_two();
            log::debug!("Growing object uniform buffer to {} slots", capacity);
            let (buffer, bind_group) =
                Self::allocate(device, &self.bind_group_layout, capacity, self.stride);
            self.buffer = buffer;
            self.bind_group = bind_group;
            self.capacity = capacity;
        }

        let mut bytes = vec![0u8; self.stride as usize * states.len()];
        for (chunk, state) in bytes.chunks_exact_mut(self.stride as usize).zip(states) {
            let state_bytes = bytemuck::bytes_of(state);
            chunk[..state_bytes.len()].copy_from_slice(state_bytes);
        }
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, &bytes);
        }
    }

    pub fn offset(&self, index: usize) -> u32 {
        (self.stride * index as u64) as u32
    }
}

// Sizes the shader-side structs expect.
const _: () = assert!(std::mem::size_of::<GpuLight>() == 96);
const _: () = assert!(std::mem::size_of::<ObjectUniformState>() == 496);
const _: () = assert!(std::mem::size_of::<FrameUniformState>() == 160 + 96 * MAX_LIGHTS);
