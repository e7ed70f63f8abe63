use crate::assets::Color;
use crate::stage::Stage;

type Getter<T> = Box<dyn Fn(&Stage) -> T>;
type Setter<T> = Box<dyn FnMut(&mut Stage, T) -> anyhow::Result<()>>;

enum Control {
    Slider {
        label: String,
        min: f32,
        max: f32,
        step: f32,
        get: Getter<f32>,
        set: Setter<f32>,
    },
    Toggle {
        label: String,
        get: Getter<bool>,
        set: Setter<bool>,
    },
    Color {
        label: String,
        get: Getter<Color>,
        set: Setter<Color>,
    },
    Action {
        label: String,
        run: Box<dyn FnMut(&mut Stage) -> anyhow::Result<()>>,
    },
}

impl Control {
    fn label(&self) -> &str {
        match self {
            Control::Slider { label, .. }
            | Control::Toggle { label, .. }
            | Control::Color { label, .. }
            | Control::Action { label, .. } => label,
        }
    }
}

/// Clamps `value` into `min..=max` and snaps it to the nearest multiple of
/// `step` counted from `min`.
pub fn snap(value: f32, min: f32, max: f32, step: f32) -> f32 {
    let clamped = value.clamp(min, max);
    if step <= 0.0 {
        return clamped;
    }

    let snapped = min + ((clamped - min) / step).round() * step;
    snapped.clamp(min, max)
}

fn report(label: &str, result: anyhow::Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            log::warn!("Rejected value for {}: {:#}", label, err);
            false
        }
    }
}

/// Tweakable parameters of a lesson, each bound to getter and setter
/// closures over the stage.
pub struct DebugPanel {
    title: String,
    controls: Vec<Control>,
    visible: bool,
}

impl DebugPanel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            controls: Vec::new(),
            visible: true,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn toggle_visible(&mut self) {
        self.visible = !self.visible;
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.controls.iter().map(Control::label)
    }

    pub fn slider(
        &mut self,
        label: impl Into<String>,
        min: f32,
        max: f32,
        step: f32,
        get: impl Fn(&Stage) -> f32 + 'static,
        set: impl FnMut(&mut Stage, f32) -> anyhow::Result<()> + 'static,
    ) -> &mut Self {
        self.controls.push(Control::Slider {
            label: label.into(),
            min,
            max,
            step,
            get: Box::new(get),
            set: Box::new(set),
        });
        self
    }

    pub fn toggle(
        &mut self,
        label: impl Into<String>,
        get: impl Fn(&Stage) -> bool + 'static,
        set: impl FnMut(&mut Stage, bool) -> anyhow::Result<()> + 'static,
    ) -> &mut Self {
        self.controls.push(Control::Toggle {
            label: label.into(),
            get: Box::new(get),
            set: Box::new(set),
        });
        self
    }

    pub fn color(
        &mut self,
        label: impl Into<String>,
        get: impl Fn(&Stage) -> Color + 'static,
        set: impl FnMut(&mut Stage, Color) -> anyhow::Result<()> + 'static,
    ) -> &mut Self {
        self.controls.push(Control::Color {
            label: label.into(),
            get: Box::new(get),
            set: Box::new(set),
        });
        self
    }

    pub fn action(
        &mut self,
        label: impl Into<String>,
        run: impl FnMut(&mut Stage) -> anyhow::Result<()> + 'static,
    ) -> &mut Self {
        self.controls.push(Control::Action {
            label: label.into(),
            run: Box::new(run),
        });
        self
    }

    fn find(&mut self, label: &str) -> Option<&mut Control> {
        self.controls.iter_mut().find(|control| control.label() == label)
    }

    /// Current value of a slider, toggles read as 0 or 1.
    pub fn value(&self, stage: &Stage, label: &str) -> Option<f32> {
        self.controls
            .iter()
            .find(|control| control.label() == label)
            .and_then(|control| match control {
                Control::Slider { get, .. } => Some(get(stage)),
                Control::Toggle { get, .. } => Some(if get(stage) { 1.0 } else { 0.0 }),
                _ => None,
            })
    }

    /// Writes a slider value the same way dragging it would. Returns true if
    /// the setter accepted the (clamped and snapped) value.
    pub fn set_value(&mut self, stage: &mut Stage, label: &str, value: f32) -> bool {
        match self.find(label) {
            Some(Control::Slider {
                label,
                min,
                max,
                step,
                set,
                ..
            }) => {
                let value = snap(value, *min, *max, *step);
                report(label, set(stage, value))
            }
            _ => {
                log::warn!("No slider named {}", label);
                false
            }
        }
    }

    pub fn set_toggle(&mut self, stage: &mut Stage, label: &str, value: bool) -> bool {
        match self.find(label) {
            Some(Control::Toggle { label, set, .. }) => report(label, set(stage, value)),
            _ => {
                log::warn!("No toggle named {}", label);
                false
            }
        }
    }

    pub fn set_color(&mut self, stage: &mut Stage, label: &str, value: Color) -> bool {
        match self.find(label) {
            Some(Control::Color { label, set, .. }) => report(label, set(stage, value)),
            _ => {
                log::warn!("No color named {}", label);
                false
            }
        }
    }

    pub fn trigger(&mut self, stage: &mut Stage, label: &str) -> bool {
        match self.find(label) {
            Some(Control::Action { label, run }) => report(label, run(stage)),
            _ => {
                log::warn!("No action named {}", label);
                false
            }
        }
    }

    pub fn draw(&mut self, ui: &imgui::Ui, stage: &mut Stage) {
        if !self.visible {
            return;
        }

        let controls = &mut self.controls;
        ui.window(&self.title)
            .position([10.0, 10.0], imgui::Condition::FirstUseEver)
            .size([320.0, 0.0], imgui::Condition::FirstUseEver)
            .build(|| {
                for control in controls.iter_mut() {
                    match control {
                        Control::Slider {
                            label,
                            min,
                            max,
                            step,
                            get,
                            set,
                        } => {
                            let mut value = get(stage);
                            if ui.slider(label.as_str(), *min, *max, &mut value) {
                                report(label, set(stage, snap(value, *min, *max, *step)));
                            }
                        }
                        Control::Toggle { label, get, set } => {
                            let mut value = get(stage);
                            if ui.checkbox(label.as_str(), &mut value) {
                                report(label, set(stage, value));
                            }
                        }
                        Control::Color { label, get, set } => {
                            let mut value = get(stage).to_array();
                            if ui.color_edit3(label.as_str(), &mut value) {
                                report(label, set(stage, Color::from_array(value)));
                            }
                        }
                        Control::Action { label, run } => {
                            if ui.button(label.as_str()) {
                                report(label, run(stage));
                            }
                        }
                    }
                }

                ui.separator();
                ui.text("H: toggle panel, Space: pause");
            });
    }
}
