//! Full-frame tests driving the pipeline against the recording device.

use cgmath::{SquareMatrix, Vector3};
use umbra::config::EngineConfig;
use umbra::gfx::camera::{convert_matrix4_to_array, Camera};
use umbra::gfx::geometry::{generate_cube, wire_box_from_extents};
use umbra::gfx::lighting::{Light, LightManager};
use umbra::gfx::rendering::{lit_program, unlit_program, RenderPipeline, COLOR_PASS, SHADOW_PASS};
use umbra::gfx::resources::{DecodedImage, LightArrayUniform, TransformUniform};
use umbra::gfx::scene::{MaterialHandle, MeshHandle, ProgramState, SceneGraph, ShaderHandle};
use umbra::gpu::{
    CullMode, GpuCommand, ProgramStages, RecordingDevice, Topology, UniformSlot, Viewport,
};

const EPSILON: f32 = 1e-4;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

struct World {
    device: RecordingDevice,
    scene: SceneGraph,
    lights: LightManager,
    pipeline: RenderPipeline,
    config: EngineConfig,
}

impl World {
    fn new() -> Self {
        let config = EngineConfig::default().with_shadow_map_size(256);
        let mut device = RecordingDevice::new(1280, 720);
        let pipeline = RenderPipeline::new(&mut device, &config).unwrap();
        Self {
            device,
            scene: SceneGraph::new(),
            lights: LightManager::new(config.scene_ambient),
            pipeline,
            config,
        }
    }

    fn bind_camera(&mut self) {
        let camera = self
            .scene
            .create_camera(Camera::new(Viewport::new(1280.0, 720.0)));
        self.scene.bind_camera(camera).unwrap();
    }

    fn add_caster(&mut self) -> umbra::gfx::lighting::LightHandle {
        let light = self.lights.create_light(Light::directional([1.0, 1.0, 1.0]));
        self.lights.set_shadow_caster(Some(light)).unwrap();
        light
    }

    /// Lit shader → material → mesh at `position` → one cube surface.
    fn add_cube(&mut self, position: Vector3<f32>) -> (ShaderHandle, MaterialHandle, MeshHandle) {
        let shader = self.scene.create_shader(lit_program());
        let material = self.scene.create_material("Crate");
        let mesh = self.scene.create_mesh("Cube");
        let surface = self.scene.create_surface(generate_cube());

        self.scene.assign_shader_to_material(shader, material).unwrap();
        self.scene.add_mesh_to_material(material, mesh).unwrap();
        self.scene.add_surface_to_mesh(mesh, surface).unwrap();
        self.scene
            .mesh_mut(mesh)
            .unwrap()
            .transform
            .set_position(position);
        (shader, material, mesh)
    }

    fn frame(&mut self) -> umbra::gfx::rendering::FrameStats {
        self.pipeline
            .render_frame(&mut self.device, &mut self.scene, &mut self.lights)
    }
}

#[test]
fn test_textured_cube_is_shadowed_and_drawn_once() {
    let mut world = World::new();
    world.bind_camera();
    let light = world.add_caster();
    let (_, material, mesh) = world.add_cube(Vector3::new(0.0, 0.0, 10.0));
    world
        .scene
        .material_mut(material)
        .unwrap()
        .set_texture_image(DecodedImage::solid([200, 40, 40, 255]));

    let stats = world.frame();

    assert!(stats.shadow_pass_ran);
    assert_eq!(stats.shadow_draws, 1);
    assert_eq!(stats.color_draws, 1);
    assert_eq!(stats.skipped_surfaces, 0);
    assert_eq!(stats.failed_binds, 0);
    assert_eq!(world.device.draw_count(SHADOW_PASS), 1);
    assert_eq!(world.device.draw_count(COLOR_PASS), 1);

    let buffer = world.scene.mesh(mesh).unwrap().transform_buffer().unwrap();
    let recorded = world.device.buffer(buffer).unwrap();
    assert_eq!(recorded.writes.len(), 2);

    let shadow: TransformUniform = bytemuck::pod_read_unaligned(&recorded.writes[0]);
    let color: TransformUniform = bytemuck::pod_read_unaligned(&recorded.writes[1]);
    assert_eq!(color.world_translation(), [0.0, 0.0, 10.0]);
    assert_eq!(shadow.world_translation(), [0.0, 0.0, 10.0]);

    let light_view_proj = world
        .lights
        .light(light)
        .unwrap()
        .view_projection(world.config.shadow_near, world.config.shadow_far);
    let expected = convert_matrix4_to_array(light_view_proj);
    for (row, expected_row) in shadow.view_proj.iter().zip(expected.iter()) {
        for (a, b) in row.iter().zip(expected_row.iter()) {
            assert!(approx_eq(*a, *b));
        }
    }

    let texture = world.scene.material(material).unwrap().texture().texture().unwrap();
    assert_eq!(world.device.texture(texture).unwrap().width, 1);
    assert!(world.device.pass_commands(COLOR_PASS).iter().any(|command| matches!(
        command,
        GpuCommand::BindTexture { texture: t, .. } if *t == texture
    )));
}

#[test]
fn test_shadow_pass_binds_depth_only_state() {
    let mut world = World::new();
    world.bind_camera();
    world.add_caster();
    world.add_cube(Vector3::new(0.0, 0.0, 5.0));

    world.frame();

    let begin = world
        .device
        .commands()
        .iter()
        .find(|c| matches!(c, GpuCommand::BeginPass { label, .. } if *label == SHADOW_PASS))
        .cloned()
        .unwrap();
    assert_eq!(
        begin,
        GpuCommand::BeginPass {
            label: SHADOW_PASS,
            has_color: false,
            depth: world.pipeline.shadow_map(),
            depth_clear: Some(1.0),
        }
    );

    let commands = world.device.pass_commands(SHADOW_PASS);
    assert!(commands.iter().any(|c| matches!(
        c,
        GpuCommand::SetRasterizer(state) if state.cull == CullMode::Front
            && state.depth_bias == world.config.shadow_depth_bias
    )));
    assert!(commands.iter().any(|c| matches!(
        c,
        GpuCommand::BindProgram { stages: ProgramStages::DepthOnly, .. }
    )));
    assert!(commands.iter().any(|c| matches!(
        c,
        GpuCommand::BindUniform { slot: UniformSlot::Shadow, buffer } if *buffer == world.pipeline.shadow_buffer()
    )));

    let color = world.device.pass_commands(COLOR_PASS);
    assert!(color.iter().any(|c| matches!(
        c,
        GpuCommand::SetRasterizer(state) if state.cull == CullMode::Back
    )));
    assert!(color.iter().any(|c| matches!(
        c,
        GpuCommand::BindProgram { stages: ProgramStages::Full, .. }
    )));
}

#[test]
fn test_non_casting_material_is_skipped_in_shadow_pass() {
    let mut world = World::new();
    world.bind_camera();
    world.add_caster();
    let (_, material, _) = world.add_cube(Vector3::new(0.0, 0.0, 10.0));
    world.scene.material_mut(material).unwrap().casts_shadows = false;

    let stats = world.frame();

    assert!(stats.shadow_pass_ran);
    assert_eq!(stats.shadow_draws, 0);
    assert_eq!(stats.color_draws, 1);
    assert_eq!(world.device.draw_count(SHADOW_PASS), 0);
}

#[test]
fn test_no_shadow_caster_skips_shadow_pass() {
    let mut world = World::new();
    world.bind_camera();
    world.lights.create_light(Light::point([1.0; 3], 20.0));
    world.add_cube(Vector3::new(0.0, 0.0, 10.0));

    let stats = world.frame();

    assert!(!stats.shadow_pass_ran);
    assert_eq!(world.device.pass_count(SHADOW_PASS), 0);
    assert_eq!(stats.color_draws, 1);

    let shadow = world
        .device
        .buffer_contents(world.pipeline.shadow_buffer())
        .unwrap();
    let uniform: umbra::gfx::resources::ShadowUniform = bytemuck::pod_read_unaligned(shadow);
    assert!(!uniform.is_enabled());
}

#[test]
fn test_frame_without_camera_is_a_no_op() {
    let mut world = World::new();
    world.add_caster();
    world.add_cube(Vector3::new(0.0, 0.0, 10.0));

    let stats = world.frame();
    let stats_again = world.frame();

    assert_eq!(stats, Default::default());
    assert_eq!(stats_again, Default::default());
    assert!(world.device.commands().is_empty());

    world.bind_camera();
    assert_eq!(world.frame().color_draws, 1);
}

#[test]
fn test_failed_program_skips_its_surfaces() {
    let mut world = World::new();
    world.device.fail_program("Lit");
    world.bind_camera();
    let (shader, _, _) = world.add_cube(Vector3::new(0.0, 0.0, 10.0));

    let stats = world.frame();

    assert_eq!(world.scene.shader(shader).unwrap().state(), ProgramState::Failed);
    assert_eq!(stats.color_draws, 0);
    assert_eq!(stats.skipped_surfaces, 1);
    assert!(stats.failed_binds >= 1);

    // The failure is not retried every frame
    let stats = world.frame();
    assert_eq!(stats.color_draws, 0);
}

#[test]
fn test_buffer_failures_leave_handles_empty_and_frame_continues() {
    let mut world = World::new();
    world.bind_camera();
    let (_, material, mesh) = world.add_cube(Vector3::new(0.0, 0.0, 10.0));

    world.device.fail_buffer_creation(true);
    let stats = world.frame();
    world.device.fail_buffer_creation(false);

    assert!(stats.failed_binds > 0);
    assert_eq!(stats.color_draws, 0);
    assert!(world.scene.mesh(mesh).unwrap().transform_buffer().is_none());
    assert!(world.scene.material(material).unwrap().uniform_buffer().is_none());
    assert_eq!(world.device.pass_count(COLOR_PASS), 1);
}

#[test]
fn test_deleted_mesh_releases_buffers_next_frame() {
    let mut world = World::new();
    world.bind_camera();
    let (_, _, mesh) = world.add_cube(Vector3::new(0.0, 0.0, 10.0));
    world.frame();
    let live = world.device.live_buffers();

    world.scene.delete_mesh(mesh).unwrap();
    assert_eq!(world.device.live_buffers(), live);

    let stats = world.frame();
    // transform buffer + four attribute streams + index buffer
    assert_eq!(stats.released, 6);
    assert_eq!(world.device.live_buffers(), live - 6);
    assert_eq!(stats.color_draws, 0);
}

#[test]
fn test_edited_surface_is_uploaded_again() {
    let mut world = World::new();
    world.bind_camera();
    let (_, _, mesh) = world.add_cube(Vector3::new(0.0, 0.0, 10.0));
    world.frame();

    let surface = world.scene.mesh(mesh).unwrap().surfaces()[0];
    let before = world.scene.surface(surface).unwrap().buffers().clone();
    world
        .scene
        .surface_mut(surface)
        .unwrap()
        .fill_color([0.0, 1.0, 0.0, 1.0]);
    let live = world.device.live_buffers();

    world.frame();

    let after = world.scene.surface(surface).unwrap().buffers().clone();
    assert_ne!(before.index, after.index);
    assert_eq!(world.device.live_buffers(), live);
    assert!(!world.scene.surface(surface).unwrap().needs_upload());
}

#[test]
fn test_wire_box_draws_non_indexed_lines() {
    let mut world = World::new();
    world.bind_camera();
    let shader = world.scene.create_shader(unlit_program());
    let material = world.scene.create_material("Debug");
    let mesh = world.scene.create_mesh("Bounds");
    let surface = world.scene.create_surface(wire_box_from_extents(
        Vector3::new(-1.0, -1.0, -1.0),
        Vector3::new(1.0, 1.0, 1.0),
        [1.0, 1.0, 0.0, 1.0],
    ));
    world.scene.assign_shader_to_material(shader, material).unwrap();
    world.scene.add_mesh_to_material(material, mesh).unwrap();
    world.scene.add_surface_to_mesh(mesh, surface).unwrap();

    world.frame();

    let commands = world.device.pass_commands(COLOR_PASS);
    assert!(commands.contains(&&GpuCommand::Draw {
        topology: Topology::LineList,
        vertex_count: 24,
    }));
    let streams = commands
        .iter()
        .filter(|c| matches!(c, GpuCommand::BindVertexStream { .. }))
        .count();
    assert_eq!(streams, 2);
}

#[test]
fn test_light_array_is_uploaded_with_ambient_on_first_light() {
    let mut world = World::new();
    world.bind_camera();
    world.lights.set_scene_ambient([0.3, 0.3, 0.3]);
    world.add_caster();
    world.lights.create_light(Light::point([0.5; 3], 8.0));
    world.lights.create_light(Light::point([0.5; 3], 8.0));
    world.add_cube(Vector3::new(0.0, 0.0, 10.0));

    world.frame();

    let buffer = world.lights.buffer().unwrap();
    let packed: LightArrayUniform =
        bytemuck::pod_read_unaligned(world.device.buffer_contents(buffer).unwrap());
    assert_eq!(packed.len(), 3);
    assert_eq!(packed.shadow_caster_index(), Some(0));
    assert_eq!(packed.records[0].ambient_rgb(), [0.3, 0.3, 0.3]);
    assert_eq!(packed.records[1].ambient_rgb(), [0.0; 3]);
    assert_eq!(packed.records[2].ambient_rgb(), [0.0; 3]);
    assert!(world.device.pass_commands(COLOR_PASS).iter().any(|c| matches!(
        c,
        GpuCommand::BindUniform { slot: UniformSlot::Lights, buffer: b } if *b == buffer
    )));
}

#[test]
fn test_resized_surface_recreates_depth_target() {
    let mut world = World::new();
    world.bind_camera();
    world.frame();
    let depth = world.pipeline.depth_target();
    let textures = world.device.live_textures();

    world.device.resize_surface(800, 600);
    world.frame();

    let resized = world.pipeline.depth_target();
    assert_ne!(resized, depth);
    assert_eq!(world.device.texture(resized).unwrap().width, 800);
    assert!(world.device.texture(depth).is_none());
    assert_eq!(world.device.live_textures(), textures);
}

#[test]
fn test_lost_device_does_not_abort_frame() {
    let mut world = World::new();
    world.bind_camera();
    world.add_caster();
    world.add_cube(Vector3::new(0.0, 0.0, 10.0));
    world.device.lose_device("removed");

    let stats = world.frame();
    assert_eq!(stats.color_draws, 1);
    assert_eq!(world.frame().color_draws, 1);
}

#[test]
fn test_camera_transform_reaches_color_pass() {
    let mut world = World::new();
    world.bind_camera();
    let camera = world.scene.bound_camera().unwrap();
    world
        .scene
        .camera_mut(camera)
        .unwrap()
        .transform
        .set_position(Vector3::new(0.0, 0.0, -5.0));
    let (_, _, mesh) = world.add_cube(Vector3::new(0.0, 0.0, 10.0));

    world.frame();

    let buffer = world.scene.mesh(mesh).unwrap().transform_buffer().unwrap();
    let uniform: TransformUniform =
        bytemuck::pod_read_unaligned(world.device.buffer_contents(buffer).unwrap());
    assert_eq!(&uniform.eye[..3], &[0.0, 0.0, -5.0]);
    let view_proj = world.scene.camera(camera).unwrap().view_projection_matrix();
    assert_ne!(view_proj, cgmath::Matrix4::identity());
    assert_eq!(uniform.view_proj, convert_matrix4_to_array(view_proj));
}
