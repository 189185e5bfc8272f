//! # Shadowed Scene
//!
//! A spinning cube over a floor, lit by a shadow-casting sun, with the cube's
//! bounding box drawn as a wireframe through the unlit program.
//!
//! ```bash
//! cargo run --example shadowed_scene
//! ```
//!
//! Press Escape to quit. `UMBRA_SHADOW_DEBUG=1` renders shadow visibility in grayscale.

use std::cell::Cell;
use std::rc::Rc;

use umbra::prelude::*;

fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env()
        .with_title("Umbra - Shadowed Scene")
        .with_clear_color([0.05, 0.06, 0.08, 1.0]);

    let cube: Rc<Cell<Option<MeshHandle>>> = Rc::default();
    let spinning = cube.clone();

    App::new(config)
        .with_setup(move |ctx| {
            let lit = ctx.lit_shader();
            let unlit = ctx.unlit_shader();
            let scene = ctx.scene_mut();

            let camera = scene.create_camera(Camera::new(Viewport::new(1280.0, 720.0)));
            if let Some(camera) = scene.camera_mut(camera) {
                camera.set_orbit(Vector3::zero(), 0.5, 0.8, 8.0);
            }
            scene.bind_camera(camera)?;

            let stone = scene.create_material("Stone");
            scene.assign_shader_to_material(lit, stone)?;
            if let Some(material) = scene.material_mut(stone) {
                material.constants.diffuse = [0.8, 0.55, 0.3, 1.0];
            }

            let floor_material = scene.create_material("Floor");
            scene.assign_shader_to_material(lit, floor_material)?;

            let cube_mesh = scene.create_mesh("Cube");
            let cube_surface = scene.create_surface(generate_cube());
            scene.add_mesh_to_material(stone, cube_mesh)?;
            scene.add_surface_to_mesh(cube_mesh, cube_surface)?;
            if let Some(mesh) = scene.mesh_mut(cube_mesh) {
                mesh.transform.set_position(Vector3::new(0.0, 1.0, 0.0));
            }

            let floor = scene.create_mesh("Floor");
            let floor_surface = scene.create_surface(generate_plane(12.0, 12.0, 4, 4));
            scene.add_mesh_to_material(floor_material, floor)?;
            scene.add_surface_to_mesh(floor, floor_surface)?;

            let outline = scene.create_material("Outline");
            scene.assign_shader_to_material(unlit, outline)?;
            if let Some(material) = scene.material_mut(outline) {
                material.casts_shadows = false;
            }
            if let Some(bounds) = scene.mesh_bounds(cube_mesh) {
                let wire = scene.create_mesh("Cube bounds");
                let surface = scene.create_surface(wire_box(&bounds, [0.2, 1.0, 0.4, 1.0]));
                scene.add_mesh_to_material(outline, wire)?;
                scene.add_surface_to_mesh(wire, surface)?;
            }

            let sun = ctx.lights_mut().create_light(Light::directional([1.0, 0.95, 0.9]));
            if let Some(light) = ctx.lights_mut().light_mut(sun) {
                light.transform.set_position(Vector3::new(-4.0, 8.0, -4.0));
                light.transform.look_at(Vector3::zero());
            }
            ctx.lights_mut().set_shadow_caster(Some(sun))?;

            cube.set(Some(cube_mesh));
            Ok(())
        })
        .with_update(move |ctx, delta| {
            let Some(cube) = spinning.get() else {
                return;
            };
            if let Some(transform) = ctx.transform_mut(cube.into()) {
                transform.rotate(0.0, 0.8 * delta, 0.0, Space::World);
            }
        })
        .run()
}
