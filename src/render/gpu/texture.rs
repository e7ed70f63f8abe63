use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::assets::{ColorSpace, Filter, TextureId, TextureSettings, TextureStore, Wrap};

pub struct DepthTexture {
    view: wgpu::TextureView,
    label: String,
}

impl DepthTexture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration, label: impl Into<String>) -> Self {
        let label: String = label.into();
        let view = Self::create_view(device, config, &label);
        DepthTexture { view, label }
    }

    fn create_view(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration, label: &str) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn resize(&mut self, device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) {
        self.view = Self::create_view(device, config, &self.label);
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

fn address_mode(wrap: Wrap) -> wgpu::AddressMode {
    match wrap {
        Wrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        Wrap::Repeat => wgpu::AddressMode::Repeat,
        Wrap::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

fn filter_mode(filter: Filter) -> wgpu::FilterMode {
    match filter {
        Filter::Linear => wgpu::FilterMode::Linear,
        Filter::Nearest => wgpu::FilterMode::Nearest,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerKey {
    wrap_s: Wrap,
    wrap_t: Wrap,
    mag_filter: Filter,
    min_filter: Filter,
}

impl From<&TextureSettings> for SamplerKey {
    fn from(settings: &TextureSettings) -> Self {
        Self {
            wrap_s: settings.wrap_s,
            wrap_t: settings.wrap_t,
            mag_filter: settings.mag_filter,
            min_filter: settings.min_filter,
        }
    }
}

pub struct GpuTexture {
    pub revision: u64,
    pub color_space: ColorSpace,
    pub view: wgpu::TextureView,
}

/// GPU copies of ready textures, refreshed when a texture's revision moves.
pub struct TextureCache {
    textures: HashMap<TextureId, GpuTexture>,
    samplers: HashMap<SamplerKey, wgpu::Sampler>,
    fallback: wgpu::TextureView,
}

impl TextureCache {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let fallback = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("Fallback texture"),
                size: wgpu::Extent3d {
                    width: 1,
                    height: 1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::wgt::TextureDataOrder::default(),
            &[255, 255, 255, 255],
        );

        Self {
            textures: HashMap::new(),
            samplers: HashMap::new(),
            fallback: fallback.create_view(&wgpu::TextureViewDescriptor::default()),
        }
    }

    pub fn fallback_view(&self) -> &wgpu::TextureView {
        &self.fallback
    }

    /// Uploads `id` if it is ready and the GPU copy is missing or stale.
    pub fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, store: &TextureStore, id: TextureId) {
        let Some(texture) = store.get(id) else {
            return;
        };
        let Some(image) = texture.image() else {
            return;
        };

        let up_to_date = self.textures.get(&id).is_some_and(|gpu| {
            gpu.revision == texture.revision() && gpu.color_space == texture.settings.color_space
        });
        if up_to_date {
            return;
        }

        log::debug!("Uploading texture {} ({}x{})", texture.name, image.width, image.height);
        let format = match texture.settings.color_space {
            ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        };

        let gpu_texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(&texture.name),
                size: wgpu::Extent3d {
                    width: image.width,
                    height: image.height,
                    depth_or_array_layers: 1,
                },
                // TODO: Generate mipmaps, the repeated floor textures shimmer without them
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::wgt::TextureDataOrder::default(),
            &image.pixels,
        );

        self.textures.insert(
            id,
            GpuTexture {
                revision: texture.revision(),
                color_space: texture.settings.color_space,
                view: gpu_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            },
        );
    }

    pub fn get(&self, id: TextureId) -> Option<&GpuTexture> {
        self.textures.get(&id)
    }

    /// Creates the sampler for `texture`'s settings if needed.
    pub fn prepare_sampler(&mut self, device: &wgpu::Device, settings: &TextureSettings) -> SamplerKey {
        let key = SamplerKey::from(settings);
        self.samplers.entry(key).or_insert_with(|| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("Texture sampler"),
                address_mode_u: address_mode(key.wrap_s),
                address_mode_v: address_mode(key.wrap_t),
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: filter_mode(key.mag_filter),
                min_filter: filter_mode(key.min_filter),
                ..Default::default()
            })
        });
        key
    }

    pub fn sampler(&self, key: &SamplerKey) -> Option<&wgpu::Sampler> {
        self.samplers.get(key)
    }
}
