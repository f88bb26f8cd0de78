mod body;
mod color;
mod effects;
mod resources;
mod simulation;
mod systems;

use bevy::prelude::*;
use bevy::window::WindowResolution;
use bevy_egui::{EguiPlugin, EguiPrimaryContextPass};

use crate::resources::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, FIXED_HZ, PIXEL_SCALE, ResetSimulation, SimConfig, SimSettings,
};
use crate::simulation::SimEvent;
use crate::systems::*;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Orbit Toy".into(),
                resolution: WindowResolution::new(
                    (DISPLAY_WIDTH as f32 * PIXEL_SCALE) as u32,
                    (DISPLAY_HEIGHT as f32 * PIXEL_SCALE) as u32,
                ),
                resizable: false,
                ..default()
            }),
            ..default()
        }))
        .add_plugins(EguiPlugin::default())
        .insert_resource(ClearColor(Color::BLACK))
        .init_resource::<SimConfig>()
        .init_resource::<SimSettings>()
        .init_resource::<ResetSimulation>()
        .init_resource::<DragGesture>()
        .init_resource::<SceneRng>()
        .init_resource::<SunFlicker>()
        .add_message::<SimEvent>()
        .add_message::<ToneRequest>()
        .add_systems(EguiPrimaryContextPass, ui_controls)
        .add_systems(Startup, setup_scene)
        .add_systems(
            Update,
            (
                apply_reset_request,
                (
                    handle_drag_gesture,
                    route_sim_events,
                    play_feedback_tones,
                    advance_effect_frames,
                    flicker_sun,
                    draw_sun,
                    draw_planets,
                    draw_effects,
                    draw_drag_arrow,
                )
                    .chain()
                    .after(apply_reset_request),
            ),
        )
        .add_systems(FixedUpdate, step_simulation)
        .insert_resource(Time::<Fixed>::from_hz(FIXED_HZ))
        .run();
}
