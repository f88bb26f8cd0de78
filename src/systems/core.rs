use std::f32::consts::TAU;

use bevy::audio::{Pitch, Volume};
use bevy::ecs::system::SystemParam;
use bevy::math::DVec2;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::input::EguiWantsInput;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::color::Rgb565;
use crate::resources::*;
use crate::simulation::{SimEvent, Simulation};

/// Request for a short feedback beep.
#[derive(Message, Clone, Copy, Debug)]
pub struct ToneRequest {
    pub frequency: f32,
}

/// Drag gesture in progress, in world coordinates.
#[derive(Resource, Default)]
pub struct DragGesture {
    pub start: Option<Vec2>,
    pub current: Option<Vec2>,
}

/// One frame of pointer input, already mapped to world coordinates.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerFrame {
    pub pressed: bool,
    pub released: bool,
    pub press_point: Option<Vec2>,
    pub release_point: Option<Vec2>,
    pub current: Option<Vec2>,
    /// The UI is consuming the pointer this frame.
    pub captured: bool,
}

/// What a frame of input did to the gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GestureOutcome {
    pub pressed_at: Option<Vec2>,
    /// Start and end points of a finished drag.
    pub launch: Option<(Vec2, Vec2)>,
}

impl DragGesture {
    /// Press starts a gesture, movement tracks it, release finishes it.
    /// A press and release in the same frame finish immediately where they began.
    pub fn update(&mut self, input: PointerFrame) -> GestureOutcome {
        let mut outcome = GestureOutcome::default();

        match self.start {
            None => {
                if !input.pressed || input.captured {
                    return outcome;
                }
                let Some(point) = input.press_point.or(input.current) else {
                    return outcome;
                };
                self.start = Some(point);
                self.current = Some(point);
                outcome.pressed_at = Some(point);
            }
            Some(_) => {
                if let Some(point) = input.current {
                    self.current = Some(point);
                }
            }
        }

        let Some(start) = self.start else {
            return outcome;
        };
        if input.released {
            let end = if outcome.pressed_at.is_some() {
                start
            } else {
                input.release_point.or(self.current).unwrap_or(start)
            };
            outcome.launch = Some((start, end));
            *self = DragGesture::default();
        }
        outcome
    }
}

/// Mouse, touch and camera state read by the gesture handler.
#[derive(SystemParam)]
pub struct PointerInput<'w, 's> {
    pub mouse: Res<'w, ButtonInput<MouseButton>>,
    pub touches: Res<'w, Touches>,
    pub windows: Query<'w, 's, &'static Window, With<PrimaryWindow>>,
    pub cameras: Query<'w, 's, (&'static Camera, &'static GlobalTransform)>,
    pub egui_input: Res<'w, EguiWantsInput>,
}

impl PointerInput<'_, '_> {
    /// Samples this frame's pointer, or `None` without a camera.
    pub fn frame(&self) -> Option<PointerFrame> {
        let (camera, camera_transform) = self.cameras.single().ok()?;
        let to_world = |viewport: Vec2| {
            camera
                .viewport_to_world_2d(camera_transform, viewport)
                .ok()
        };

        let cursor = self
            .windows
            .single()
            .ok()
            .and_then(|window| window.cursor_position())
            .and_then(to_world);
        let touch = self
            .touches
            .iter()
            .next()
            .map(|touch| touch.position())
            .and_then(to_world);

        Some(PointerFrame {
            pressed: self.mouse.just_pressed(MouseButton::Left)
                || self.touches.any_just_pressed(),
            released: self.mouse.just_released(MouseButton::Left)
                || self.touches.any_just_released(),
            press_point: self
                .touches
                .iter_just_pressed()
                .next()
                .map(|touch| touch.position())
                .and_then(to_world)
                .or(cursor),
            release_point: self
                .touches
                .iter_just_released()
                .next()
                .map(|touch| touch.position())
                .and_then(to_world),
            current: touch.or(cursor),
            captured: self.egui_input.wants_any_pointer_input(),
        })
    }
}

/// Randomness for cosmetic effects only.
#[derive(Resource)]
pub struct SceneRng(pub StdRng);

impl Default for SceneRng {
    fn default() -> Self {
        Self(StdRng::from_os_rng())
    }
}

/// A sun ray: direction and length beyond the sun's edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunRay {
    pub direction: Vec2,
    pub extra: f32,
}

/// Current sun tint and rays, re-rolled on a timer.
#[derive(Resource)]
pub struct SunFlicker {
    pub color: Rgb565,
    pub rays: [SunRay; SUN_RAY_COUNT],
    pub timer: Timer,
}

impl Default for SunFlicker {
    fn default() -> Self {
        Self {
            color: Rgb565::ORANGE,
            rays: std::array::from_fn(|i| SunRay {
                direction: Vec2::from_angle(TAU * i as f32 / SUN_RAY_COUNT as f32),
                extra: 0.0,
            }),
            timer: Timer::new(SUN_FLICKER_INTERVAL, TimerMode::Repeating),
        }
    }
}

/// Sets up the zoomed camera and builds the simulation from the startup config.
pub fn setup_scene(mut commands: Commands, config: Res<SimConfig>) {
    commands.spawn((Camera2d, Transform::from_scale(Vec3::splat(1.0 / PIXEL_SCALE))));
    commands.insert_resource(Simulation::from_config(config.clone()));
    info!(
        "simulation ready: {} planets max, playfield +/-{:?}",
        config.max_planets, config.bounds
    );
}

/// Launch position and velocity for a drag from `start` to `end`.
pub fn gesture_spawn(start: Vec2, end: Vec2, speed_factor: f64) -> (DVec2, DVec2) {
    let start = start.as_dvec2();
    (start, (end.as_dvec2() - start) * speed_factor)
}

/// Turns mouse and touch drags into planet launches.
pub fn handle_drag_gesture(
    input: PointerInput,
    mut gesture: ResMut<DragGesture>,
    mut sim: ResMut<Simulation>,
    mut sim_events: MessageWriter<SimEvent>,
    mut tones: MessageWriter<ToneRequest>,
) {
    let Some(frame) = input.frame() else {
        return;
    };
    let outcome = gesture.update(frame);

    if outcome.pressed_at.is_some() {
        tones.write(ToneRequest {
            frequency: TOUCH_TONE_FREQUENCY,
        });
    }
    if let Some((start, end)) = outcome.launch {
        let (position, velocity) = gesture_spawn(start, end, sim.config().speed_factor);
        sim.spawn_body(position, velocity, &mut sim_events);
    }
}

/// Runs the configured number of physics ticks per fixed step.
pub fn step_simulation(
    time: Res<Time>,
    settings: Res<SimSettings>,
    mut sim: ResMut<Simulation>,
    mut events: MessageWriter<SimEvent>,
) {
    if settings.paused {
        return;
    }

    let ticks = sim.config().ticks_per_step.max(1);
    let step_start = time.elapsed().saturating_sub(time.delta());
    for tick in 1..=ticks {
        let now = step_start + time.delta() * tick / ticks;
        sim.tick(now, &mut events);
    }
}

/// Maps simulation events onto audio feedback.
pub fn route_sim_events(
    mut events: MessageReader<SimEvent>,
    mut tones: MessageWriter<ToneRequest>,
) {
    for event in events.read() {
        match event {
            SimEvent::BodySpawned { position, color } => {
                debug!("planet launched at {:?} in {:?}", position, color);
            }
            SimEvent::Collision { position, color } => {
                info!("{:?} planet hit the sun at {:?}", color, position);
                tones.write(ToneRequest {
                    frequency: COLLISION_TONE_FREQUENCY,
                });
            }
        }
    }
}

/// Plays queued tones as short synthesized beeps.
pub fn play_feedback_tones(
    mut commands: Commands,
    mut tones: MessageReader<ToneRequest>,
    mut pitches: ResMut<Assets<Pitch>>,
) {
    for tone in tones.read() {
        commands.spawn((
            AudioPlayer(pitches.add(Pitch::new(tone.frequency, TONE_DURATION))),
            PlaybackSettings::DESPAWN.with_volume(Volume::Linear(TONE_VOLUME)),
        ));
    }
}

/// Steps particles and ripples at the draw cadence.
pub fn advance_effect_frames(
    time: Res<Time>,
    settings: Res<SimSettings>,
    mut sim: ResMut<Simulation>,
) {
    if settings.paused {
        return;
    }
    sim.advance_effects(time.elapsed());
}

pub fn flicker_sun(time: Res<Time>, mut flicker: ResMut<SunFlicker>, mut rng: ResMut<SceneRng>) {
    flicker.timer.tick(time.delta());
    if flicker.timer.just_finished() {
        let brightness = 1.0 + rng.0.random_range(-1.0..=1.0) * SUN_BRIGHTNESS_FLUCTUATION;
        flicker.color = Rgb565::ORANGE.scale_brightness(brightness);
        for ray in &mut flicker.rays {
            ray.direction = Vec2::from_angle(rng.0.random_range(0.0..TAU));
            ray.extra = rng.0.random_range(0..3) as f32;
        }
    }
}

/// Gizmos only stroke outlines, so discs are filled with concentric rings.
fn fill_disc(gizmos: &mut Gizmos, center: Vec2, radius: f32, color: Color) {
    let step = 1.0 / PIXEL_SCALE;
    let mut r = radius;
    while r > 0.0 {
        gizmos.circle_2d(Isometry2d::from_translation(center), r, color);
        r -= step;
    }
}

/// Draws the collision flash, the sun and its rays.
pub fn draw_sun(mut gizmos: Gizmos, sim: Res<Simulation>, flicker: Res<SunFlicker>) {
    if let Some(marker) = sim.world().collision_marker() {
        fill_disc(
            &mut gizmos,
            marker.position.as_vec2(),
            COLLISION_EFFECT_RADIUS,
            Rgb565::YELLOW.to_color(),
        );
    }

    let sun = sim.world().sun();
    let center = sun.position.as_vec2();
    let color = flicker.color.to_color();
    fill_disc(&mut gizmos, center, sun.radius as f32, color);

    for ray in &flicker.rays {
        let length = sun.radius as f32 + ray.extra;
        gizmos.line_2d(center, center + ray.direction * length, color);
    }
}

/// Draws every trail first, then the planets on top.
pub fn draw_planets(mut gizmos: Gizmos, sim: Res<Simulation>, settings: Res<SimSettings>) {
    let bodies = sim.world().bodies();

    if settings.show_trails {
        for body in bodies {
            gizmos.linestrip_gradient_2d(body.trail(settings.trail_falloff).map(|point| {
                (
                    point.position.as_vec2(),
                    body.color.blend_over(Rgb565::BLACK, point.alpha).to_color(),
                )
            }));
        }
    }

    for body in bodies {
        fill_disc(
            &mut gizmos,
            body.position.as_vec2(),
            PLANET_RADIUS,
            body.color.to_color(),
        );
    }
}

pub fn draw_effects(mut gizmos: Gizmos, sim: Res<Simulation>) {
    let effects = sim.effects();

    for ripple in effects.ripples() {
        let center = ripple.position.as_vec2();
        gizmos.circle_2d(
            Isometry2d::from_translation(center),
            ripple.radius as f32,
            ripple.color.to_color_with_alpha(ripple.alpha()),
        );
        if let Some((radius, alpha)) = ripple.inner_ring() {
            gizmos.circle_2d(
                Isometry2d::from_translation(center),
                radius as f32,
                ripple.color.to_color_with_alpha(alpha),
            );
        }
    }

    let base_radius = effects.config().particle_radius;
    for particle in effects.particles() {
        fill_disc(
            &mut gizmos,
            particle.position.as_vec2(),
            particle.radius(base_radius),
            particle.color.to_color_with_alpha(particle.alpha()),
        );
    }
}

/// Shows the launch marker and direction while a drag is held.
pub fn draw_drag_arrow(mut gizmos: Gizmos, gesture: Res<DragGesture>) {
    let (Some(start), Some(current)) = (gesture.start, gesture.current) else {
        return;
    };
    let white = Rgb565::WHITE.to_color();
    gizmos.circle_2d(Isometry2d::from_translation(start), PLANET_RADIUS, white);
    if start.distance(current) >= 1.0 {
        gizmos.arrow_2d(start, current, white);
    }
}

/// Responds to a pending reset: drops all planets and effects.
pub fn apply_reset_request(
    mut reset: ResMut<ResetSimulation>,
    mut sim: ResMut<Simulation>,
    mut gesture: ResMut<DragGesture>,
) {
    if !reset.pending {
        return;
    }
    reset.pending = false;

    sim.reset();
    *gesture = DragGesture::default();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::NullSink;
    use bevy::ecs::message::Messages;
    use bevy::ecs::system::SystemState;
    use std::time::Duration;

    #[test]
    fn gesture_launches_from_press_point_along_the_drag() {
        let (position, velocity) =
            gesture_spawn(vec2(10.0, -20.0), vec2(40.0, 20.0), SPEED_FACTOR);

        assert_eq!(position, DVec2::new(10.0, -20.0));
        assert_eq!(velocity, DVec2::new(30.0, 40.0) * SPEED_FACTOR);
    }

    fn press_at(point: Vec2) -> PointerFrame {
        PointerFrame {
            pressed: true,
            press_point: Some(point),
            current: Some(point),
            ..default()
        }
    }

    #[test]
    fn tap_within_one_frame_launches_at_rest_from_press_point() {
        let mut gesture = DragGesture::default();
        let point = vec2(25.0, -12.0);
        let outcome = gesture.update(PointerFrame {
            released: true,
            ..press_at(point)
        });

        assert_eq!(outcome.pressed_at, Some(point));
        assert_eq!(outcome.launch, Some((point, point)));
        assert!(gesture.start.is_none() && gesture.current.is_none());

        let mut sim = Simulation::new(SimConfig::default(), StdRng::seed_from_u64(3));
        let (start, end) = outcome.launch.unwrap();
        let (position, velocity) = gesture_spawn(start, end, sim.config().speed_factor);
        sim.spawn_body(position, velocity, &mut NullSink);
        assert_eq!(sim.world().bodies().len(), 1);
        assert_eq!(sim.world().bodies()[0].position, DVec2::new(25.0, -12.0));
        assert_eq!(sim.world().bodies()[0].velocity, DVec2::ZERO);

        let idle = gesture.update(PointerFrame {
            current: Some(vec2(40.0, 40.0)),
            ..default()
        });
        assert_eq!(idle, GestureOutcome::default());
        assert!(gesture.start.is_none());

        let next = gesture.update(press_at(vec2(40.0, 40.0)));
        assert_eq!(next.pressed_at, Some(vec2(40.0, 40.0)));
    }

    #[test]
    fn press_over_ui_is_ignored() {
        let mut gesture = DragGesture::default();
        let outcome = gesture.update(PointerFrame {
            captured: true,
            ..press_at(vec2(1.0, 1.0))
        });

        assert_eq!(outcome, GestureOutcome::default());
        assert!(gesture.start.is_none());
    }

    #[test]
    fn drag_tracks_pointer_and_launches_on_release() {
        let mut gesture = DragGesture::default();
        gesture.update(press_at(vec2(0.0, 0.0)));

        let held = gesture.update(PointerFrame {
            current: Some(vec2(5.0, 5.0)),
            ..default()
        });
        assert_eq!(held.launch, None);
        assert_eq!(gesture.current, Some(vec2(5.0, 5.0)));

        let released = gesture.update(PointerFrame {
            released: true,
            ..default()
        });
        assert_eq!(released.pressed_at, None);
        assert_eq!(released.launch, Some((vec2(0.0, 0.0), vec2(5.0, 5.0))));
        assert!(gesture.start.is_none());
    }

    #[test]
    fn sun_rays_change_only_when_flicker_timer_fires() {
        let mut world = World::new();
        world.init_resource::<SunFlicker>();
        world.insert_resource(SceneRng(StdRng::seed_from_u64(9)));
        let initial = world.resource::<SunFlicker>().rays;

        let mut state: SystemState<(Res<Time>, ResMut<SunFlicker>, ResMut<SceneRng>)> =
            SystemState::new(&mut world);
        let mut run_for = |world: &mut World, millis: u64| {
            let mut time = Time::<()>::default();
            time.advance_by(Duration::from_millis(millis));
            world.insert_resource(time);
            let (time, flicker, rng) = state.get_mut(world);
            flicker_sun(time, flicker, rng);
        };

        run_for(&mut world, 60);
        assert_eq!(world.resource::<SunFlicker>().rays, initial);

        run_for(&mut world, 60);
        let rolled = world.resource::<SunFlicker>().rays;
        assert_ne!(rolled, initial);
        assert!(rolled.iter().all(|ray| (0.0..3.0).contains(&ray.extra)));
    }

    #[test]
    fn fixed_step_sweeps_collisions_and_requests_collision_tone() {
        let mut world = World::new();
        let mut sim = Simulation::new(SimConfig::default(), StdRng::seed_from_u64(5));
        sim.spawn_body(DVec2::new(2.0, 0.0), DVec2::ZERO, &mut NullSink);
        sim.spawn_body(DVec2::new(60.0, 0.0), DVec2::ZERO, &mut NullSink);
        world.insert_resource(sim);
        world.insert_resource(SimSettings::default());
        world.init_resource::<Messages<SimEvent>>();
        world.init_resource::<Messages<ToneRequest>>();

        let mut time = Time::<()>::default();
        time.advance_by(Duration::from_secs_f64(1.0 / FIXED_HZ));
        world.insert_resource(time);

        let mut step_state: SystemState<(
            Res<Time>,
            Res<SimSettings>,
            ResMut<Simulation>,
            MessageWriter<SimEvent>,
        )> = SystemState::new(&mut world);
        {
            let (time, settings, sim, events) = step_state.get_mut(&mut world);
            step_simulation(time, settings, sim, events);
        }
        step_state.apply(&mut world);

        let sim = world.resource::<Simulation>();
        assert_eq!(sim.world().bodies().len(), 1);
        assert!(sim.world().collision_marker().is_some());
        assert_eq!(
            sim.effects().particles().len(),
            sim.config().effects.particle_count
        );

        let mut route_state: SystemState<(MessageReader<SimEvent>, MessageWriter<ToneRequest>)> =
            SystemState::new(&mut world);
        {
            let (events, tones) = route_state.get_mut(&mut world);
            route_sim_events(events, tones);
        }
        route_state.apply(&mut world);

        let mut tone_state: SystemState<MessageReader<ToneRequest>> =
            SystemState::new(&mut world);
        let mut tones = tone_state.get_mut(&mut world);
        let frequencies: Vec<f32> = tones.read().map(|tone| tone.frequency).collect();
        assert_eq!(frequencies, vec![COLLISION_TONE_FREQUENCY]);
    }

    #[test]
    fn paused_simulation_does_not_tick() {
        let mut world = World::new();
        let mut sim = Simulation::new(SimConfig::default(), StdRng::seed_from_u64(6));
        sim.spawn_body(DVec2::new(2.0, 0.0), DVec2::ZERO, &mut NullSink);
        world.insert_resource(sim);
        world.insert_resource(SimSettings {
            paused: true,
            ..SimSettings::default()
        });
        world.init_resource::<Messages<SimEvent>>();
        let mut time = Time::<()>::default();
        time.advance_by(Duration::from_millis(16));
        world.insert_resource(time);

        let mut step_state: SystemState<(
            Res<Time>,
            Res<SimSettings>,
            ResMut<Simulation>,
            MessageWriter<SimEvent>,
        )> = SystemState::new(&mut world);
        {
            let (time, settings, sim, events) = step_state.get_mut(&mut world);
            step_simulation(time, settings, sim, events);
        }

        assert_eq!(world.resource::<Simulation>().world().bodies().len(), 1);
    }

    #[test]
    fn reset_request_clears_simulation_once() {
        let mut world = World::new();
        let mut sim = Simulation::new(SimConfig::default(), StdRng::seed_from_u64(8));
        sim.spawn_body(DVec2::new(50.0, 0.0), DVec2::ZERO, &mut NullSink);
        world.insert_resource(sim);
        world.insert_resource(ResetSimulation { pending: true });
        world.insert_resource(DragGesture {
            start: Some(Vec2::ONE),
            current: Some(Vec2::ONE),
        });

        let mut state: SystemState<(
            ResMut<ResetSimulation>,
            ResMut<Simulation>,
            ResMut<DragGesture>,
        )> = SystemState::new(&mut world);
        {
            let (reset, sim, gesture) = state.get_mut(&mut world);
            apply_reset_request(reset, sim, gesture);
        }

        assert!(!world.resource::<ResetSimulation>().pending);
        assert!(world.resource::<Simulation>().world().bodies().is_empty());
        assert!(world.resource::<DragGesture>().start.is_none());
    }
}
