//! Solar system demo
//!
//! Builds a sun/planet/moon hierarchy, ticks the scene for a few frames
//! while the bodies orbit, and prints the resolved world positions along
//! with a renderer-style collection of active model nodes.

use nalgebra::UnitQuaternion;
use scene_engine::prelude::*;

const FRAME_DT: f32 = 1.0 / 60.0;

fn world_position(scene: &mut Scene, node: NodeKey) -> Vec3 {
    let world = scene.object_to_world_matrix(node);
    Vec3::new(world[(0, 3)], world[(1, 3)], world[(2, 3)])
}

fn main() {
    env_logger::init();
    log::info!("Building solar system scene...");

    let mut scene = Scene::new();

    let sun = scene.spawn("sun", Payload::Model(Model::new("sphere", "star")));
    let planet = scene.spawn_child(sun, "planet", Payload::Model(Model::new("sphere", "rock")));
    let moon = scene.spawn_child(planet, "moon", Payload::Model(Model::new("sphere", "dust")));
    scene.set_position(planet, Vec3::new(8.0, 0.0, 0.0));
    scene.set_position(moon, Vec3::new(2.0, 0.0, 0.0));

    let camera = scene.spawn("camera", Payload::Camera(Camera::default()));
    scene.set_position(camera, Vec3::new(0.0, 12.0, 24.0));

    let key_light = scene.spawn("key light", Payload::Light(Light::directional()));
    scene.set_rotation(
        key_light,
        UnitQuaternion::from_axis_angle(&Vec3::x_axis(), -0.8),
    );

    // One year of planet orbit per 600 frames, one month of moon orbit per 50
    let planet_step = UnitQuaternion::from_axis_angle(&Vec3::y_axis(), std::f32::consts::TAU / 600.0);
    let moon_step = UnitQuaternion::from_axis_angle(&Vec3::y_axis(), std::f32::consts::TAU / 50.0);

    for frame in 0..120 {
        // Update phase: orbit by rotating each body's parent-relative frame
        let sun_rotation = scene.node(sun).expect("sun").rotation();
        scene.set_rotation(sun, planet_step * sun_rotation);
        let planet_rotation = scene.node(planet).expect("planet").rotation();
        scene.set_rotation(planet, moon_step * planet_rotation);

        // Frame barrier: resolve all dirty transforms, then read
        scene.update(FRAME_DT);

        if frame % 30 == 0 {
            let p = world_position(&mut scene, planet);
            let m = world_position(&mut scene, moon);
            println!(
                "frame {frame:3}: planet ({:6.2}, {:6.2}, {:6.2})  moon ({:6.2}, {:6.2}, {:6.2})",
                p.x, p.y, p.z, m.x, m.y, m.z
            );
        }
    }

    // Renderer-style pass-buffer assembly: collect active model nodes
    let mut draw_list = Vec::new();
    scene.visit_roots(|node| {
        if node.is_active() {
            if let Payload::Model(model) = node.payload() {
                draw_list.push(format!("{} [{} / {}]", node.name(), model.mesh, model.material));
            }
        }
        Flow::Continue
    });

    println!("draw list: {draw_list:?}");
    log::info!("Demo finished with {} nodes", scene.len());
}
