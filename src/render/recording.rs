use crate::render::{DrawList, Renderer};
use crate::stage::Stage;

/// Renderer without a GPU: prepares the draw list like a real renderer
/// would and keeps it for inspection.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    size: (u32, u32),
    pixel_ratio: f64,
    frames: u64,
    resizes: Vec<(u32, u32)>,
    last_frame: Option<DrawList>,
    /// Camera aspect at the moment of each render.
    rendered_aspects: Vec<f32>,
}

impl RecordingRenderer {
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    pub fn resizes(&self) -> &[(u32, u32)] {
        &self.resizes
    }

    pub fn last_frame(&self) -> Option<&DrawList> {
        self.last_frame.as_ref()
    }

    pub fn rendered_aspects(&self) -> &[f32] {
        &self.rendered_aspects
    }
}

impl Renderer for RecordingRenderer {
    fn set_size(&mut self, width: u32, height: u32, pixel_ratio: f64) {
        self.size = (width, height);
        self.pixel_ratio = pixel_ratio;
        self.resizes.push(self.size);
    }

    fn output_size(&self) -> (u32, u32) {
        self.size
    }

    fn render(&mut self, stage: &Stage) -> anyhow::Result<()> {
        let list = DrawList::prepare(stage)?;
        log::trace!(
            "Frame {}: {} items, {} lights, {} culled",
            self.frames,
            list.items.len(),
            list.lights.len(),
            list.culled
        );

        self.rendered_aspects.push(stage.camera.aspect());
        self.last_frame = Some(list);
        self.frames += 1;
        Ok(())
    }
}
