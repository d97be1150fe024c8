use bevy::{input::mouse::MouseWheel, prelude::*};

use digdown::render::systems;
use digdown::world::ViewportConfig;

// Camera pan speed, pixels per second
const CAMERA_SPEED: f32 = 200.0;

// Orthographic scale limits and the change per wheel notch or key press
const ZOOM_MIN: f32 = 0.5;
const ZOOM_MAX: f32 = 3.0;
const ZOOM_SPEED: f32 = 0.1;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(ImagePlugin::default_nearest()))
        .init_resource::<ViewportConfig>()
        .add_systems(PreStartup, systems::load_generation_config)
        .add_systems(Startup, systems::setup_world)
        .add_systems(
            Update,
            (
                move_camera,
                zoom_camera,
                systems::fit_viewport_to_window.after(zoom_camera),
                systems::resize_viewport.after(systems::fit_viewport_to_window),
                systems::update_viewport_from_camera
                    .after(move_camera)
                    .after(systems::resize_viewport),
                systems::flush_tile_changes.after(systems::update_viewport_from_camera),
                systems::apply_slot_visuals.after(systems::flush_tile_changes),
                systems::log_viewport.after(systems::update_viewport_from_camera),
            ),
        )
        .run();
}

/// Camera movement system for scrolling the render window
fn move_camera(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut camera_query: Query<&mut Transform, With<Camera2d>>,
) {
    if let Ok(mut transform) = camera_query.single_mut() {
        let delta = CAMERA_SPEED * time.delta_secs();
        let mut direction = Vec2::ZERO;

        if keyboard.pressed(KeyCode::KeyW) || keyboard.pressed(KeyCode::ArrowUp) {
            direction.y += 1.0;
        }
        if keyboard.pressed(KeyCode::KeyS) || keyboard.pressed(KeyCode::ArrowDown) {
            direction.y -= 1.0;
        }
        if keyboard.pressed(KeyCode::KeyA) || keyboard.pressed(KeyCode::ArrowLeft) {
            direction.x -= 1.0;
        }
        if keyboard.pressed(KeyCode::KeyD) || keyboard.pressed(KeyCode::ArrowRight) {
            direction.x += 1.0;
        }

        // only touch the transform when moving, so Changed<Transform> stays quiet
        if direction != Vec2::ZERO {
            transform.translation += (direction * delta).extend(0.0);
        }
    }
}

/// Zoom with the scroll wheel or `-`/`=`; the render window refits afterwards
fn zoom_camera(
    mut scroll: MessageReader<MouseWheel>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut camera_query: Query<&mut Projection, With<Camera2d>>,
) {
    let Ok(mut projection) = camera_query.single_mut() else {
        return;
    };

    // positive zooms out
    let mut step: f32 = scroll.read().map(|wheel| -wheel.y).sum();
    if keyboard.just_pressed(KeyCode::Minus) {
        step += 1.0;
    }
    if keyboard.just_pressed(KeyCode::Equal) {
        step -= 1.0;
    }
    if step == 0.0 {
        return;
    }

    let Projection::Orthographic(ortho) = projection.as_mut() else {
        return;
    };
    ortho.scale = (ortho.scale + step * ZOOM_SPEED).clamp(ZOOM_MIN, ZOOM_MAX);
}
