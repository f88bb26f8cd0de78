use bevy::prelude::*;
use bevy_egui::EguiContexts;
use bevy_egui::egui;

use crate::body::TrailFalloff;
use crate::resources::{ResetSimulation, SimSettings};
use crate::simulation::Simulation;

pub fn ui_controls(
    mut contexts: EguiContexts,
    mut settings: ResMut<SimSettings>,
    sim: Res<Simulation>,
    mut frames_rendered: Local<usize>,
    mut reset: ResMut<ResetSimulation>,
) {
    if *frames_rendered < 5 {
        *frames_rendered += 1;
        return;
    }

    if let Ok(ctx) = contexts.ctx_mut() {
        egui::Window::new("Orbit Toy")
            .default_pos(egui::pos2(10.0, 10.0))
            .max_size([240.0, 260.0])
            .show(ctx, |ui| {
                ui.heading("Simulation");
                ui.label(format!(
                    "Planets: {} / {}",
                    sim.world().bodies().len(),
                    sim.config().max_planets
                ));
                ui.label(format!(
                    "Particles: {}  Ripples: {}",
                    sim.effects().particles().len(),
                    sim.effects().ripples().len()
                ));
                ui.checkbox(&mut settings.show_trails, "Show Trails");
                ui.horizontal(|ui| {
                    ui.label("Trail fade:");
                    let falloff = &mut settings.trail_falloff;
                    ui.radio_value(falloff, TrailFalloff::Quadratic, "Quadratic");
                    ui.radio_value(falloff, TrailFalloff::Linear, "Linear");
                });
                ui.checkbox(&mut settings.paused, "Pause");

                ui.separator();
                ui.heading("Controls");
                ui.label("Drag to launch a planet");

                if ui.button("Clear Planets").clicked() {
                    reset.pending = true;
                }
            });
    }
}
