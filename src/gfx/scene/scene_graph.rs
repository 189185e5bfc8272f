use log::{debug, warn};

use super::{
    bounds::Obb,
    material::Material,
    mesh::Mesh,
    ownership::{relink, MATERIAL_MESH, MESH_SURFACE, SHADER_MATERIAL},
    registry::Registry,
    shader::Shader,
    surface::Surface,
    CameraHandle, MaterialHandle, MeshHandle, ShaderHandle, SurfaceHandle,
};
use crate::errors::{SceneError, SceneResult};
use crate::gfx::camera::Camera;
use crate::gpu::{GpuResource, ProgramDesc};

/// Factory and sole owner of shaders, materials, meshes, surfaces and cameras.
///
/// The graph keeps the shader → material → mesh → surface tree consistent: every
/// edge change goes through [`relink`], so a parent's child list and the child's
/// back-reference always agree. GPU handles of destroyed entities are queued and
/// released by the render pipeline at the start of the next frame.
#[derive(Debug, Default)]
pub struct SceneGraph {
    shaders: Registry<ShaderHandle, Shader>,
    materials: Registry<MaterialHandle, Material>,
    meshes: Registry<MeshHandle, Mesh>,
    surfaces: Registry<SurfaceHandle, Surface>,
    cameras: Registry<CameraHandle, Camera>,
    bound_camera: Option<CameraHandle>,
    released: Vec<GpuResource>,
}

fn logged<T>(operation: &str, result: SceneResult<T>) -> SceneResult<T> {
    if let Err(err) = &result {
        warn!("{operation}: {err}");
    }
    result
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // --- creation ---

    pub fn create_shader(&mut self, desc: ProgramDesc) -> ShaderHandle {
        debug!("create shader '{}'", desc.label);
        self.shaders.insert(Shader::new(desc))
    }

    pub fn create_material(&mut self, label: &str) -> MaterialHandle {
        debug!("create material '{label}'");
        self.materials.insert(Material::new(label))
    }

    pub fn create_mesh(&mut self, name: &str) -> MeshHandle {
        debug!("create mesh '{name}'");
        self.meshes.insert(Mesh::new(name))
    }

    /// Registers a surface. It stays detached until added to a mesh.
    pub fn create_surface(&mut self, surface: Surface) -> SurfaceHandle {
        debug!(
            "create surface '{}' ({} vertices)",
            surface.label,
            surface.vertex_count()
        );
        self.surfaces.insert(surface)
    }

    pub fn create_camera(&mut self, camera: Camera) -> CameraHandle {
        self.cameras.insert(camera)
    }

    // --- edges ---

    /// Makes `shader` the owner of `material`, removing it from its previous shader.
    /// Reassigning the current shader is a no-op.
    pub fn assign_shader_to_material(
        &mut self,
        shader: ShaderHandle,
        material: MaterialHandle,
    ) -> SceneResult<()> {
        logged(
            "assign_shader_to_material",
            relink(
                &mut self.shaders,
                &mut self.materials,
                material,
                Some(shader),
                SHADER_MATERIAL,
            ),
        )
        .map(|_| ())
    }

    /// Makes `material` the owner of `mesh`. The mesh appears once in the material's
    /// list no matter how often this is called.
    pub fn add_mesh_to_material(
        &mut self,
        material: MaterialHandle,
        mesh: MeshHandle,
    ) -> SceneResult<()> {
        logged(
            "add_mesh_to_material",
            relink(
                &mut self.materials,
                &mut self.meshes,
                mesh,
                Some(material),
                MATERIAL_MESH,
            ),
        )
        .map(|_| ())
    }

    /// Attaches `surface` to `mesh`, detaching it from any previous mesh.
    pub fn add_surface_to_mesh(
        &mut self,
        mesh: MeshHandle,
        surface: SurfaceHandle,
    ) -> SceneResult<()> {
        logged(
            "add_surface_to_mesh",
            relink(
                &mut self.meshes,
                &mut self.surfaces,
                surface,
                Some(mesh),
                MESH_SURFACE,
            ),
        )
        .map(|_| ())
    }

    // --- deletion ---

    /// Detaches the mesh from its material, deletes every surface it owns and
    /// unregisters it.
    pub fn delete_mesh(&mut self, mesh: MeshHandle) -> SceneResult<()> {
        logged("delete_mesh", self.remove_mesh(mesh))
    }

    fn remove_mesh(&mut self, mesh: MeshHandle) -> SceneResult<()> {
        relink(&mut self.materials, &mut self.meshes, mesh, None, MATERIAL_MESH)?;

        let surfaces = self
            .meshes
            .get(mesh)
            .map(|m| m.surfaces().to_vec())
            .unwrap_or_default();
        for surface in surfaces {
            self.remove_surface(surface)?;
        }

        if let Some(mut removed) = self.meshes.remove(mesh) {
            debug!("delete mesh '{}'", removed.name);
            self.released.extend(removed.take_gpu_resources());
        }
        Ok(())
    }

    /// Detaches the material from its shader and unregisters it. Its meshes are
    /// kept but orphaned: their material back-reference is cleared and they are not
    /// drawn until added to another material.
    pub fn delete_material(&mut self, material: MaterialHandle) -> SceneResult<()> {
        logged("delete_material", self.remove_material(material))
    }

    fn remove_material(&mut self, material: MaterialHandle) -> SceneResult<()> {
        relink(
            &mut self.shaders,
            &mut self.materials,
            material,
            None,
            SHADER_MATERIAL,
        )?;

        let meshes = self
            .materials
            .get(material)
            .map(|m| m.meshes().to_vec())
            .unwrap_or_default();
        if !meshes.is_empty() {
            warn!(
                "delete_material: {} mesh(es) left without a material",
                meshes.len()
            );
        }
        for mesh in meshes {
            relink(&mut self.materials, &mut self.meshes, mesh, None, MATERIAL_MESH)?;
        }

        if let Some(mut removed) = self.materials.remove(material) {
            debug!("delete material '{}'", removed.label);
            self.released.extend(removed.take_gpu_resources());
        }
        Ok(())
    }

    /// Unregisters the shader. Its materials are kept with no shader.
    pub fn delete_shader(&mut self, shader: ShaderHandle) -> SceneResult<()> {
        logged("delete_shader", self.remove_shader(shader))
    }

    fn remove_shader(&mut self, shader: ShaderHandle) -> SceneResult<()> {
        let materials = self
            .shaders
            .get(shader)
            .ok_or(SceneError::UnknownShader)?
            .materials()
            .to_vec();
        for material in materials {
            relink(
                &mut self.shaders,
                &mut self.materials,
                material,
                None,
                SHADER_MATERIAL,
            )?;
        }

        if let Some(mut removed) = self.shaders.remove(shader) {
            debug!("delete shader '{}'", removed.label());
            self.released.extend(removed.take_gpu_resources());
        }
        Ok(())
    }

    /// Detaches the surface from its mesh and unregisters it.
    pub fn delete_surface(&mut self, surface: SurfaceHandle) -> SceneResult<()> {
        logged("delete_surface", self.remove_surface(surface))
    }

    fn remove_surface(&mut self, surface: SurfaceHandle) -> SceneResult<()> {
        relink(&mut self.meshes, &mut self.surfaces, surface, None, MESH_SURFACE)?;
        if let Some(mut removed) = self.surfaces.remove(surface) {
            self.released.extend(removed.take_gpu_resources());
        }
        Ok(())
    }

    /// Unregisters the camera, unbinding it if it was bound.
    pub fn delete_camera(&mut self, camera: CameraHandle) -> SceneResult<()> {
        if self.cameras.remove(camera).is_none() {
            return logged("delete_camera", Err(SceneError::UnknownCamera));
        }
        if self.bound_camera == Some(camera) {
            self.bound_camera = None;
        }
        Ok(())
    }

    /// Deletes every entity, queueing all of their GPU handles for release.
    pub fn clear(&mut self) {
        let meshes: Vec<MeshHandle> = self.meshes.keys().collect();
        for mesh in meshes {
            let _ = self.remove_mesh(mesh);
        }
        let surfaces: Vec<SurfaceHandle> = self.surfaces.keys().collect();
        for surface in surfaces {
            let _ = self.remove_surface(surface);
        }
        let materials: Vec<MaterialHandle> = self.materials.keys().collect();
        for material in materials {
            let _ = self.remove_material(material);
        }
        let shaders: Vec<ShaderHandle> = self.shaders.keys().collect();
        for shader in shaders {
            let _ = self.remove_shader(shader);
        }
        self.cameras = Registry::new();
        self.bound_camera = None;
    }

    // --- camera binding ---

    /// Selects the camera the color pass renders from.
    pub fn bind_camera(&mut self, camera: CameraHandle) -> SceneResult<()> {
        if !self.cameras.contains(camera) {
            return logged("bind_camera", Err(SceneError::UnknownCamera));
        }
        self.bound_camera = Some(camera);
        Ok(())
    }

    pub fn unbind_camera(&mut self) {
        self.bound_camera = None;
    }

    pub fn bound_camera(&self) -> Option<CameraHandle> {
        self.bound_camera
    }

    // --- lookup ---

    pub fn shader(&self, shader: ShaderHandle) -> Option<&Shader> {
        self.shaders.get(shader)
    }

    pub fn material(&self, material: MaterialHandle) -> Option<&Material> {
        self.materials.get(material)
    }

    pub fn material_mut(&mut self, material: MaterialHandle) -> Option<&mut Material> {
        self.materials.get_mut(material)
    }

    pub fn mesh(&self, mesh: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(mesh)
    }

    pub fn mesh_mut(&mut self, mesh: MeshHandle) -> Option<&mut Mesh> {
        self.meshes.get_mut(mesh)
    }

    pub fn surface(&self, surface: SurfaceHandle) -> Option<&Surface> {
        self.surfaces.get(surface)
    }

    pub fn surface_mut(&mut self, surface: SurfaceHandle) -> Option<&mut Surface> {
        self.surfaces.get_mut(surface)
    }

    pub fn camera(&self, camera: CameraHandle) -> Option<&Camera> {
        self.cameras.get(camera)
    }

    pub fn camera_mut(&mut self, camera: CameraHandle) -> Option<&mut Camera> {
        self.cameras.get_mut(camera)
    }

    /// Shaders in creation order; the draw walk starts here.
    pub fn shaders(&self) -> impl Iterator<Item = (ShaderHandle, &Shader)> + '_ {
        self.shaders.iter()
    }

    pub fn materials(&self) -> impl Iterator<Item = (MaterialHandle, &Material)> + '_ {
        self.materials.iter()
    }

    pub fn meshes(&self) -> impl Iterator<Item = (MeshHandle, &Mesh)> + '_ {
        self.meshes.iter()
    }

    pub fn surfaces(&self) -> impl Iterator<Item = (SurfaceHandle, &Surface)> + '_ {
        self.surfaces.iter()
    }

    pub fn cameras(&self) -> impl Iterator<Item = (CameraHandle, &Camera)> + '_ {
        self.cameras.iter()
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    // --- navigation ---

    pub fn previous_shader(&self, shader: ShaderHandle) -> Option<ShaderHandle> {
        self.shaders.previous(shader)
    }

    pub fn next_shader(&self, shader: ShaderHandle) -> Option<ShaderHandle> {
        self.shaders.next(shader)
    }

    pub fn previous_material(&self, material: MaterialHandle) -> Option<MaterialHandle> {
        self.materials.previous(material)
    }

    pub fn next_material(&self, material: MaterialHandle) -> Option<MaterialHandle> {
        self.materials.next(material)
    }

    pub fn previous_mesh(&self, mesh: MeshHandle) -> Option<MeshHandle> {
        self.meshes.previous(mesh)
    }

    pub fn next_mesh(&self, mesh: MeshHandle) -> Option<MeshHandle> {
        self.meshes.next(mesh)
    }

    pub fn previous_surface(&self, surface: SurfaceHandle) -> Option<SurfaceHandle> {
        self.surfaces.previous(surface)
    }

    pub fn next_surface(&self, surface: SurfaceHandle) -> Option<SurfaceHandle> {
        self.surfaces.next(surface)
    }

    pub fn previous_camera(&self, camera: CameraHandle) -> Option<CameraHandle> {
        self.cameras.previous(camera)
    }

    pub fn next_camera(&self, camera: CameraHandle) -> Option<CameraHandle> {
        self.cameras.next(camera)
    }

    // --- bounds ---

    /// World-space box around every surface of the mesh, recomputed from the
    /// current pose. `None` when the mesh has no vertices.
    pub fn mesh_bounds(&self, mesh: MeshHandle) -> Option<Obb> {
        let mesh = self.meshes.get(mesh)?;
        let (min, max) = mesh
            .surfaces()
            .iter()
            .filter_map(|s| self.surfaces.get(*s)?.extents())
            .reduce(|(amin, amax), (bmin, bmax)| {
                (
                    cgmath::Vector3::new(amin.x.min(bmin.x), amin.y.min(bmin.y), amin.z.min(bmin.z)),
                    cgmath::Vector3::new(amax.x.max(bmax.x), amax.y.max(bmax.y), amax.z.max(bmax.z)),
                )
            })?;
        Some(Obb::from_extents(min, max, &mesh.transform))
    }

    /// True when both meshes have collision enabled and their boxes overlap.
    pub fn meshes_collide(&self, a: MeshHandle, b: MeshHandle) -> bool {
        if a == b {
            return false;
        }
        let enabled = |m: MeshHandle| self.meshes.get(m).is_some_and(|m| m.collision_enabled);
        if !enabled(a) || !enabled(b) {
            return false;
        }
        match (self.mesh_bounds(a), self.mesh_bounds(b)) {
            (Some(a), Some(b)) => a.intersects(&b),
            _ => false,
        }
    }

    // --- pipeline access ---

    /// GPU handles of destroyed entities, waiting for release.
    pub fn drain_released(&mut self) -> Vec<GpuResource> {
        std::mem::take(&mut self.released)
    }

    pub(crate) fn shaders_mut(&mut self) -> impl Iterator<Item = &mut Shader> + '_ {
        self.shaders.values_mut()
    }

    pub(crate) fn materials_mut(&mut self) -> impl Iterator<Item = &mut Material> + '_ {
        self.materials.values_mut()
    }

    pub(crate) fn meshes_mut(&mut self) -> impl Iterator<Item = &mut Mesh> + '_ {
        self.meshes.values_mut()
    }

    pub(crate) fn surfaces_mut(&mut self) -> impl Iterator<Item = &mut Surface> + '_ {
        self.surfaces.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::{DrawMode, Vertex};
    use crate::gpu::{AttributeMask, Viewport};
    use cgmath::Vector3;

    fn program(label: &str) -> ProgramDesc {
        ProgramDesc {
            label: label.to_string(),
            source: "".into(),
            vertex_entry: "vs_main".to_string(),
            pixel_entry: "fs_main".to_string(),
            attributes: AttributeMask::LIT,
        }
    }

    fn triangle() -> Surface {
        let mut surface = Surface::new("tri", DrawMode::TriangleList);
        surface.push_vertex(Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 0.0]));
        surface.push_vertex(Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0]));
        surface.push_vertex(Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [1.0, 0.0]));
        surface.push_triangle(0, 1, 2);
        surface.finalize();
        surface
    }

    #[test]
    fn test_add_mesh_to_material_is_idempotent() {
        let mut scene = SceneGraph::new();
        let material = scene.create_material("mat");
        let mesh = scene.create_mesh("mesh");

        scene.add_mesh_to_material(material, mesh).unwrap();
        scene.add_mesh_to_material(material, mesh).unwrap();

        assert_eq!(scene.material(material).unwrap().meshes(), &[mesh]);
        assert_eq!(scene.mesh(mesh).unwrap().material(), Some(material));
    }

    #[test]
    fn test_moving_mesh_between_materials() {
        let mut scene = SceneGraph::new();
        let first = scene.create_material("first");
        let second = scene.create_material("second");
        let mesh = scene.create_mesh("mesh");

        scene.add_mesh_to_material(first, mesh).unwrap();
        scene.add_mesh_to_material(second, mesh).unwrap();

        assert!(scene.material(first).unwrap().meshes().is_empty());
        assert_eq!(scene.material(second).unwrap().meshes(), &[mesh]);
    }

    #[test]
    fn test_reassigning_shader_moves_material() {
        let mut scene = SceneGraph::new();
        let s1 = scene.create_shader(program("s1"));
        let s2 = scene.create_shader(program("s2"));
        let material = scene.create_material("mat");

        scene.assign_shader_to_material(s1, material).unwrap();
        scene.assign_shader_to_material(s2, material).unwrap();
        scene.assign_shader_to_material(s2, material).unwrap();

        assert!(scene.shader(s1).unwrap().materials().is_empty());
        assert_eq!(scene.shader(s2).unwrap().materials(), &[material]);
        assert_eq!(scene.material(material).unwrap().shader(), Some(s2));
    }

    #[test]
    fn test_delete_mesh_cascades_to_surfaces() {
        let mut scene = SceneGraph::new();
        let material = scene.create_material("mat");
        let mesh = scene.create_mesh("mesh");
        let keep = scene.create_mesh("keep");
        let a = scene.create_surface(triangle());
        let b = scene.create_surface(triangle());
        let c = scene.create_surface(triangle());
        scene.add_mesh_to_material(material, mesh).unwrap();
        scene.add_surface_to_mesh(mesh, a).unwrap();
        scene.add_surface_to_mesh(mesh, b).unwrap();
        scene.add_surface_to_mesh(keep, c).unwrap();

        scene.delete_mesh(mesh).unwrap();

        assert!(scene.mesh(mesh).is_none());
        assert!(scene.surface(a).is_none());
        assert!(scene.surface(b).is_none());
        assert!(scene.material(material).unwrap().meshes().is_empty());
        assert_eq!(scene.surface_count(), 1);
        for (_, other) in scene.meshes() {
            assert!(!other.surfaces().contains(&a));
            assert!(!other.surfaces().contains(&b));
        }
    }

    #[test]
    fn test_delete_material_orphans_meshes() {
        let mut scene = SceneGraph::new();
        let shader = scene.create_shader(program("s"));
        let material = scene.create_material("mat");
        let mesh = scene.create_mesh("mesh");
        scene.assign_shader_to_material(shader, material).unwrap();
        scene.add_mesh_to_material(material, mesh).unwrap();

        scene.delete_material(material).unwrap();

        assert!(scene.shader(shader).unwrap().materials().is_empty());
        assert_eq!(scene.mesh(mesh).unwrap().material(), None);
        assert_eq!(scene.mesh_count(), 1);
    }

    #[test]
    fn test_delete_shader_keeps_materials() {
        let mut scene = SceneGraph::new();
        let shader = scene.create_shader(program("s"));
        let material = scene.create_material("mat");
        scene.assign_shader_to_material(shader, material).unwrap();

        scene.delete_shader(shader).unwrap();

        assert_eq!(scene.material(material).unwrap().shader(), None);
        assert_eq!(scene.shader_count(), 0);
        assert_eq!(scene.delete_shader(shader), Err(SceneError::UnknownShader));
    }

    #[test]
    fn test_moving_surface_between_meshes() {
        let mut scene = SceneGraph::new();
        let first = scene.create_mesh("first");
        let second = scene.create_mesh("second");
        let surface = scene.create_surface(triangle());

        scene.add_surface_to_mesh(first, surface).unwrap();
        scene.add_surface_to_mesh(second, surface).unwrap();
        assert!(scene.mesh(first).unwrap().surfaces().is_empty());
        assert_eq!(scene.surface(surface).unwrap().mesh(), Some(second));

        scene.delete_surface(surface).unwrap();
        assert!(scene.mesh(second).unwrap().surfaces().is_empty());
    }

    #[test]
    fn test_stale_handles_are_usage_errors() {
        let mut scene = SceneGraph::new();
        let material = scene.create_material("mat");
        let mesh = scene.create_mesh("mesh");
        scene.delete_mesh(mesh).unwrap();

        assert_eq!(
            scene.add_mesh_to_material(material, mesh),
            Err(SceneError::UnknownMesh)
        );
        assert_eq!(scene.delete_mesh(mesh), Err(SceneError::UnknownMesh));
        assert!(scene.material(material).unwrap().meshes().is_empty());
    }

    #[test]
    fn test_navigation_helpers() {
        let mut scene = SceneGraph::new();
        let a = scene.create_mesh("a");
        let b = scene.create_mesh("b");
        let c = scene.create_mesh("c");

        assert_eq!(scene.previous_mesh(a), None);
        assert_eq!(scene.previous_mesh(c), Some(b));
        assert_eq!(scene.next_mesh(a), Some(b));

        scene.delete_mesh(b).unwrap();
        assert_eq!(scene.previous_mesh(c), Some(a));
        assert_eq!(scene.previous_mesh(b), None);
    }

    #[test]
    fn test_deleting_bound_camera_unbinds_it() {
        let mut scene = SceneGraph::new();
        let camera = scene.create_camera(Camera::new(Viewport::new(640.0, 480.0)));
        scene.bind_camera(camera).unwrap();
        assert_eq!(scene.bound_camera(), Some(camera));

        scene.delete_camera(camera).unwrap();
        assert_eq!(scene.bound_camera(), None);
        assert_eq!(scene.bind_camera(camera), Err(SceneError::UnknownCamera));
    }

    #[test]
    fn test_collision_respects_flag() {
        let mut scene = SceneGraph::new();
        let a = scene.create_mesh("a");
        let b = scene.create_mesh("b");
        let sa = scene.create_surface(triangle());
        let sb = scene.create_surface(triangle());
        scene.add_surface_to_mesh(a, sa).unwrap();
        scene.add_surface_to_mesh(b, sb).unwrap();
        scene
            .mesh_mut(b)
            .unwrap()
            .transform
            .set_position(Vector3::new(0.5, 0.0, 0.0));

        assert!(scene.meshes_collide(a, b));

        scene.mesh_mut(b).unwrap().collision_enabled = false;
        assert!(!scene.meshes_collide(a, b));

        scene.mesh_mut(b).unwrap().collision_enabled = true;
        scene
            .mesh_mut(b)
            .unwrap()
            .transform
            .set_position(Vector3::new(5.0, 0.0, 0.0));
        assert!(!scene.meshes_collide(a, b));
    }
}
