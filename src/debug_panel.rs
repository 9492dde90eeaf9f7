//! On-screen controls for the galaxy parameters.
//!
//! The panel edits a draft copy of the parameters and only commits it to the
//! visualiser once an edit settles: the pointer is released, or a typed or
//! keyboard edit lands with no color picker open. Dragging the particle count
//! or a color across the picker therefore does not regenerate a million points
//! on every intermediate value.

use crate::params::{
    Color, GalaxyParameters, ParamRange, BRANCHES_RANGE, COUNT_RANGE, RADIUS_RANGE, RANDOMNESS_POWER_RANGE,
    RANDOMNESS_RANGE, ROTATION_SPEED_RANGE, SIZE_RANGE, SPIN_RANGE,
};
use crate::visualiser::VisualiserState;

fn float_slider(ui: &mut egui::Ui, value: &mut f32, range: ParamRange, label: &str) -> bool {
    ui.add(
        egui::Slider::new(value, range.min as f32..=range.max as f32)
            .step_by(range.step)
            .text(label),
    )
    .changed()
}

fn int_slider(ui: &mut egui::Ui, value: &mut u32, range: ParamRange, label: &str) -> bool {
    ui.add(
        egui::Slider::new(value, range.min as u32..=range.max as u32)
            .step_by(range.step)
            .text(label),
    )
    .changed()
}

// Colors are stored as raw hex bytes, so edit them as sRGB bytes and let egui
// show exactly those values.
fn color_row(ui: &mut egui::Ui, color: &mut Color, label: &str) -> bool {
    ui.horizontal(|ui| {
        let mut rgb = color.to_bytes();
        let changed = ui.color_edit_button_srgb(&mut rgb).changed();
        ui.label(label);
        if changed {
            *color = Color::from_bytes(rgb);
        }
        changed
    })
    .inner
}

#[derive(Default)]
pub struct DebugPanel {
    draft: Option<GalaxyParameters>,
    /// The draft holds edits the visualiser has not seen yet.
    pending: bool,
    /// Smoothed frames per second, shown in the panel header.
    pub fps: f32,
}

impl DebugPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a frame time so the panel can show a smoothed FPS.
    pub fn record_frame(&mut self, dt: f32) {
        if dt > 0.0 {
            self.fps = if self.fps == 0.0 { 1.0 / dt } else { 0.9 * self.fps + 0.1 / dt };
        }
    }

    /// Push the draft into the visualiser.
    fn commit(&mut self, state: &mut VisualiserState) {
        self.pending = false;
        if let Some(draft) = &self.draft {
            state.set_params(draft.clone());
        }
    }

    /// Commit pending edits once the pointer is up, and either it was just
    /// released or no color picker is open.
    fn settle(&mut self, ctx: &egui::Context, state: &mut VisualiserState) {
        if !self.pending {
            return;
        }
        let (down, released) = ctx.input(|i| (i.pointer.any_down(), i.pointer.any_released()));
        let picker_open = ctx.memory(|mem| mem.any_popup_open());
        if down || (picker_open && !released) {
            return;
        }
        log::debug!("Committing galaxy parameters from debug panel");
        self.commit(state);
    }

    /// Restore default parameters and camera.
    pub fn reset(&mut self, state: &mut VisualiserState) {
        self.draft = Some(GalaxyParameters::default());
        self.commit(state);
        state.reset();
    }

    /// Regenerate with new randomness; a fixed seed is advanced so the result differs.
    pub fn reroll(&mut self, state: &mut VisualiserState) {
        let draft = self.draft.get_or_insert_with(|| state.params.clone());
        draft.seed = draft.seed.map(|s| s.wrapping_add(1));
        self.commit(state);
        state.request_regenerate();
    }

    pub fn show(&mut self, ctx: &egui::Context, state: &mut VisualiserState, particle_count: u32) {
        if self.draft.is_none() {
            self.draft = Some(state.params.clone());
        }
        let mut edited = false;
        let mut reset = false;
        let mut reroll = false;

        egui::Window::new("Debug")
            .default_pos([12.0, 12.0])
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("{} particles  |  {:.0} fps", particle_count, self.fps));
                ui.separator();

                let Some(draft) = self.draft.as_mut() else {
                    return;
                };

                egui::CollapsingHeader::new("Stars")
                    .default_open(false)
                    .show(ui, |ui| {
                        edited |= int_slider(ui, &mut draft.count, COUNT_RANGE, "count");
                        edited |= float_slider(ui, &mut draft.size, SIZE_RANGE, "size");
                    });

                egui::CollapsingHeader::new("Galaxy")
                    .default_open(false)
                    .show(ui, |ui| {
                        edited |= float_slider(ui, &mut draft.radius, RADIUS_RANGE, "radius");
                        edited |= int_slider(ui, &mut draft.branches, BRANCHES_RANGE, "branches");
                        edited |= float_slider(ui, &mut draft.spin, SPIN_RANGE, "spin");
                        edited |= float_slider(ui, &mut draft.randomness, RANDOMNESS_RANGE, "randomness");
                        edited |= float_slider(
                            ui,
                            &mut draft.randomness_power,
                            RANDOMNESS_POWER_RANGE,
                            "randomness power",
                        );
                        edited |= color_row(ui, &mut draft.inside_color, "inside color");
                        edited |= color_row(ui, &mut draft.outside_color, "outside color");
                        edited |= float_slider(
                            ui,
                            &mut draft.rotation_speed,
                            ROTATION_SPEED_RANGE,
                            "rotation speed",
                        );
                    });

                ui.separator();
                ui.horizontal(|ui| {
                    reroll = ui.button("Regenerate").clicked();
                    reset = ui.button("Reset").clicked();
                });
            });

        if reset {
            self.reset(state);
        } else if reroll {
            self.reroll(state);
        } else {
            self.pending |= edited;
            self.settle(ctx, state);
        }
    }
}
