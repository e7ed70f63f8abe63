use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use glam::{Mat3, Vec2};
use id_arena::{Arena, Id};

use crate::assets::color::Color;
use crate::error::{SceneError, SceneResult};

pub type TextureId = Id<Texture>;

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<Vec<u8>>,
}

impl TextureImage {
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> SceneResult<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(SceneError::invalid(format!(
                "{width}x{height} RGBA image needs {expected} bytes, got {}",
                pixels.len()
            )));
        }

        Ok(Self {
            width,
            height,
            pixels: Arc::new(pixels),
        })
    }

    pub fn from_dynamic(image: image::DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        Self {
            width: rgba.width(),
            height: rgba.height(),
            pixels: Arc::new(rgba.into_raw()),
        }
    }

    pub fn solid(color: Color) -> Self {
        let [r, g, b] = color.to_array().map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        Self {
            width: 1,
            height: 1,
            pixels: Arc::new(vec![r, g, b, 255]),
        }
    }

    /// `size`×`size` image of `cells`×`cells` alternating squares.
    pub fn checkerboard(size: u32, cells: u32, a: Color, b: Color) -> SceneResult<Self> {
        if size == 0 || cells == 0 || cells > size {
            return Err(SceneError::invalid(format!(
                "checkerboard of {cells} cells does not fit {size} pixels"
            )));
        }

        let to_bytes = |color: Color| color.to_array().map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        let (a, b) = (to_bytes(a), to_bytes(b));
        let cell = size / cells;

        let mut pixels = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let [r, g, bl] = if ((x / cell) + (y / cell)) % 2 == 0 { a } else { b };
                pixels.extend_from_slice(&[r, g, bl, 255]);
            }
        }

        Self::from_rgba8(size, size, pixels)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextureState {
    Pending,
    Ready(TextureImage),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Wrap {
    #[default]
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    #[default]
    Linear,
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorSpace {
    /// Color data, decoded to linear when sampled.
    Srgb,
    /// Non-color data such as normals or roughness.
    #[default]
    Linear,
}

/// How a texture is placed on the UVs of a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureSettings {
    pub repeat: Vec2,
    pub offset: Vec2,
    /// Radians, around `center`.
    pub rotation: f32,
    pub center: Vec2,
    pub wrap_s: Wrap,
    pub wrap_t: Wrap,
    pub mag_filter: Filter,
    pub min_filter: Filter,
    pub color_space: ColorSpace,
}

impl TextureSettings {
    /// Matrix applied to UVs before sampling.
    pub fn uv_transform(&self) -> Mat3 {
        let (s, c) = self.rotation.sin_cos();
        let (sx, sy) = (self.repeat.x, self.repeat.y);
        let (cx, cy) = (self.center.x, self.center.y);

        Mat3::from_cols_array(&[
            sx * c,
            -sy * s,
            0.0,
            sx * s,
            sy * c,
            0.0,
            -sx * (c * cx + s * cy) + cx + self.offset.x,
            -sy * (-s * cx + c * cy) + cy + self.offset.y,
            1.0,
        ])
    }

    /// Shorthand for repeating in both directions.
    pub fn repeating(mut self, x: f32, y: f32) -> Self {
        self.repeat = Vec2::new(x, y);
        self.wrap_s = Wrap::Repeat;
        self.wrap_t = Wrap::Repeat;
        self
    }
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            repeat: Vec2::ONE,
            offset: Vec2::ZERO,
            rotation: 0.0,
            center: Vec2::ZERO,
            wrap_s: Wrap::default(),
            wrap_t: Wrap::default(),
            mag_filter: Filter::default(),
            min_filter: Filter::default(),
            color_space: ColorSpace::default(),
        }
    }
}

pub struct Texture {
    pub name: String,
    pub source: Option<PathBuf>,
    pub settings: TextureSettings,
    state: TextureState,
    revision: u64,
}

impl Texture {
    pub fn state(&self) -> &TextureState {
        &self.state
    }

    /// Bumped on every state change so GPU copies know when to re-upload.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn image(&self) -> Option<&TextureImage> {
        match &self.state {
            TextureState::Ready(image) => Some(image),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadProgress {
    pub total: usize,
    pub loaded: usize,
    pub failed: usize,
}

impl LoadProgress {
    pub fn is_finished(&self) -> bool {
        self.loaded + self.failed == self.total
    }
}

type LoadResult = (TextureId, Result<TextureImage, String>);

/// Owns every texture and decodes files in the background.
///
/// Textures start out `Pending`; decoding happens on the rayon pool and the
/// result is applied on the owning thread by [`TextureStore::poll`].
pub struct TextureStore {
    textures: Arena<Texture>,
    asset_root: PathBuf,
    sender: Sender<LoadResult>,
    receiver: Receiver<LoadResult>,
    progress: LoadProgress,
}

impl TextureStore {
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        let (sender, receiver) = channel();

        Self {
            textures: Arena::new(),
            asset_root: asset_root.into(),
            sender,
            receiver,
            progress: LoadProgress::default(),
        }
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    pub fn get(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id)
    }

    pub fn settings_mut(&mut self, id: TextureId) -> Option<&mut TextureSettings> {
        self.textures.get_mut(id).map(|texture| &mut texture.settings)
    }

    pub fn progress(&self) -> LoadProgress {
        self.progress
    }

    /// Adds an already decoded texture.
    pub fn insert(&mut self, name: impl Into<String>, image: TextureImage) -> TextureId {
        self.textures.alloc(Texture {
            name: name.into(),
            source: None,
            settings: TextureSettings::default(),
            state: TextureState::Ready(image),
            revision: 1,
        })
    }

    /// Adds a texture whose content will be supplied later through
    /// [`TextureStore::complete`].
    pub fn insert_pending(&mut self, name: impl Into<String>) -> TextureId {
        if self.progress.is_finished() {
            log::info!("Texture loading started");
        }
        self.progress.total += 1;

        self.textures.alloc(Texture {
            name: name.into(),
            source: None,
            settings: TextureSettings::default(),
            state: TextureState::Pending,
            revision: 0,
        })
    }

    /// Starts decoding `path` (relative to the asset root) in the background.
    pub fn load(&mut self, path: impl AsRef<Path>) -> TextureId {
        let path = self.asset_root.join(path);
        let id = self.insert_pending(path.display().to_string());
        if let Some(texture) = self.textures.get_mut(id) {
            texture.source = Some(path.clone());
        }

        let sender = self.sender.clone();
        rayon::spawn(move || {
            let result = image::open(&path)
                .map(TextureImage::from_dynamic)
                .map_err(|e| format!("{}: {e}", path.display()));

            // The store may have been dropped in the meantime.
            let _ = sender.send((id, result));
        });

        id
    }

    /// Resolves a pending texture.
    pub fn complete(&mut self, id: TextureId, result: Result<TextureImage, String>) {
        let Some(texture) = self.textures.get_mut(id) else {
            log::warn!("Texture result for unknown id {:?}", id);
            return;
        };

        let was_pending = texture.state == TextureState::Pending;
        texture.revision += 1;

        match result {
            Ok(image) => {
                log::debug!(
                    "Texture {} ready ({}x{})",
                    texture.name,
                    image.width,
                    image.height
                );
                texture.state = TextureState::Ready(image);
                if was_pending {
                    self.progress.loaded += 1;
                }
            }
            Err(error) => {
                log::warn!("Texture {} failed to load: {}", texture.name, error);
                texture.state = TextureState::Failed(error);
                if was_pending {
                    self.progress.failed += 1;
                }
            }
        }

        if was_pending {
            let progress = self.progress;
            log::debug!(
                "Texture loading progress: {}/{}",
                progress.loaded + progress.failed,
                progress.total
            );
            if progress.is_finished() {
                log::info!(
                    "Texture loading finished ({} loaded, {} failed)",
                    progress.loaded,
                    progress.failed
                );
            }
        }
    }

    /// Applies finished background loads. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok((id, result)) = self.receiver.try_recv() {
            self.complete(id, result);
            applied += 1;
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_default_uv_transform_is_identity() {
        let transform = TextureSettings::default().uv_transform();
        assert!(transform.abs_diff_eq(Mat3::IDENTITY, 1e-6));
    }

    #[test]
    fn test_repeat_and_offset_scale_then_shift() {
        let mut settings = TextureSettings::default().repeating(2.0, 3.0);
        settings.offset = Vec2::new(0.5, 0.25);
        let uv = settings.uv_transform() * Vec3::new(1.0, 1.0, 1.0);
        assert!((uv.x - 2.5).abs() < 1e-6);
        assert!((uv.y - 3.25).abs() < 1e-6);
    }

    #[test]
    fn test_rotation_around_center_keeps_center_fixed() {
        let settings = TextureSettings {
            rotation: std::f32::consts::FRAC_PI_4,
            center: Vec2::new(0.5, 0.5),
            ..Default::default()
        };
        let center = settings.uv_transform() * Vec3::new(0.5, 0.5, 1.0);
        assert!((center.x - 0.5).abs() < 1e-6);
        assert!((center.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_pending_texture_resolves_and_counts_progress() {
        let mut store = TextureStore::new("assets");
        let id = store.insert_pending("door");
        assert_eq!(store.get(id).unwrap().state(), &TextureState::Pending);
        assert!(store.get(id).unwrap().image().is_none());
        assert!(!store.progress().is_finished());

        store.complete(id, Ok(TextureImage::solid(Color::WHITE)));
        let texture = store.get(id).unwrap();
        assert!(texture.image().is_some());
        assert_eq!(texture.revision(), 1);
        assert_eq!(
            store.progress(),
            LoadProgress {
                total: 1,
                loaded: 1,
                failed: 0
            }
        );
    }

    #[test]
    fn test_missing_file_fails_without_panicking() {
        let mut store = TextureStore::new(std::env::temp_dir());
        let id = store.load("definitely-not-here-lessongine.png");

        let mut waited = 0;
        while store.poll() == 0 && waited < 500 {
            std::thread::sleep(std::time::Duration::from_millis(10));
            waited += 1;
        }

        assert!(matches!(
            store.get(id).unwrap().state(),
            TextureState::Failed(_)
        ));
        assert_eq!(store.progress().failed, 1);
    }

    #[test]
    fn test_image_size_is_validated() {
        assert!(TextureImage::from_rgba8(2, 2, vec![0; 15]).is_err());
        let checker = TextureImage::checkerboard(8, 2, Color::WHITE, Color::BLACK).unwrap();
        assert_eq!(checker.pixels.len(), 8 * 8 * 4);
        assert_eq!(&checker.pixels[0..4], &[255, 255, 255, 255]);
        // First pixel of the second cell is black.
        assert_eq!(&checker.pixels[16..20], &[0, 0, 0, 255]);
    }
}
