use bytemuck::Zeroable;
use log::{debug, warn};

use super::{light::Light, LightHandle};
use crate::errors::{GpuError, SceneError, SceneResult};
use crate::gfx::resources::{LightArrayUniform, MAX_LIGHTS, NO_SHADOW_CASTER};
use crate::gfx::scene::Registry;
use crate::gpu::{BufferHandle, BufferKind, GpuDevice, GpuResource};

/// Owns every light and the packed light array the pixel stage reads.
///
/// The scene ambient color is stored here rather than on a light. At each repack it
/// is written into the first light in creation order and every other light gets zero
/// ambient, so shaders can sum ambient over all lights without double counting.
#[derive(Debug)]
pub struct LightManager {
    lights: Registry<LightHandle, Light>,
    scene_ambient: [f32; 3],
    shadow_caster: Option<LightHandle>,
    packed: LightArrayUniform,
    buffer: Option<BufferHandle>,
    overflow_warned: bool,
}

impl Default for LightManager {
    fn default() -> Self {
        Self::new([0.1, 0.1, 0.1])
    }
}

impl LightManager {
    pub fn new(scene_ambient: [f32; 3]) -> Self {
        Self {
            lights: Registry::new(),
            scene_ambient,
            shadow_caster: None,
            packed: LightArrayUniform::zeroed(),
            buffer: None,
            overflow_warned: false,
        }
    }

    pub fn create_light(&mut self, light: Light) -> LightHandle {
        debug!("create {:?} light", light.kind);
        self.lights.insert(light)
    }

    /// Removes a light. Deleting the shadow caster leaves no caster assigned.
    pub fn delete_light(&mut self, light: LightHandle) -> SceneResult<()> {
        if self.lights.remove(light).is_none() {
            warn!("delete_light: {}", SceneError::UnknownLight);
            return Err(SceneError::UnknownLight);
        }
        if self.shadow_caster == Some(light) {
            self.shadow_caster = None;
        }
        Ok(())
    }

    pub fn light(&self, light: LightHandle) -> Option<&Light> {
        self.lights.get(light)
    }

    pub fn light_mut(&mut self, light: LightHandle) -> Option<&mut Light> {
        self.lights.get_mut(light)
    }

    pub fn lights(&self) -> impl Iterator<Item = (LightHandle, &Light)> + '_ {
        self.lights.iter()
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn previous_light(&self, light: LightHandle) -> Option<LightHandle> {
        self.lights.previous(light)
    }

    pub fn next_light(&self, light: LightHandle) -> Option<LightHandle> {
        self.lights.next(light)
    }

    pub fn scene_ambient(&self) -> [f32; 3] {
        self.scene_ambient
    }

    pub fn set_scene_ambient(&mut self, ambient: [f32; 3]) {
        self.scene_ambient = ambient;
    }

    /// Selects the light the shadow pass renders from; `None` disables shadows.
    pub fn set_shadow_caster(&mut self, light: Option<LightHandle>) -> SceneResult<()> {
        if let Some(handle) = light {
            if !self.lights.contains(handle) {
                warn!("set_shadow_caster: {}", SceneError::UnknownLight);
                return Err(SceneError::UnknownLight);
            }
        }
        self.shadow_caster = light;
        Ok(())
    }

    pub fn shadow_caster(&self) -> Option<LightHandle> {
        self.shadow_caster
    }

    /// Refreshes every record from its light's live transform and applies the
    /// ambient rule. Lights past [`MAX_LIGHTS`] are left out.
    pub fn repack(&mut self) -> &LightArrayUniform {
        let mut packed = LightArrayUniform::zeroed();
        let mut count = 0;
        let mut caster_index = NO_SHADOW_CASTER;

        let handles: Vec<LightHandle> = self.lights.keys().collect();
        for (index, handle) in handles.into_iter().enumerate() {
            let ambient = if index == 0 {
                self.scene_ambient
            } else {
                [0.0; 3]
            };
            let Some(light) = self.lights.get_mut(handle) else {
                continue;
            };
            let record = light.pack(ambient);
            if index < MAX_LIGHTS {
                packed.records[index] = record;
                count += 1;
                if self.shadow_caster == Some(handle) {
                    caster_index = index as u32;
                }
            }
        }

        if self.lights.len() > MAX_LIGHTS && !self.overflow_warned {
            warn!(
                "{} lights registered, only the first {MAX_LIGHTS} are shaded",
                self.lights.len()
            );
            self.overflow_warned = true;
        }

        packed.count[0] = count as u32;
        packed.count[1] = caster_index;
        self.packed = packed;
        &self.packed
    }

    pub fn packed(&self) -> &LightArrayUniform {
        &self.packed
    }

    /// Buffer holding the packed light array, once uploaded.
    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    /// Writes the packed array, creating the buffer on first use.
    pub fn upload<D: GpuDevice + ?Sized>(&mut self, device: &mut D) -> Result<(), GpuError> {
        let bytes = bytemuck::bytes_of(&self.packed);
        match self.buffer {
            Some(buffer) => device.write_buffer(buffer, bytes),
            None => {
                self.buffer = Some(device.create_buffer("Light Array", BufferKind::Uniform, bytes)?);
                Ok(())
            }
        }
    }

    /// Hands back the light buffer for release.
    pub fn take_gpu_resources(&mut self) -> Vec<GpuResource> {
        self.buffer
            .take()
            .map(GpuResource::Buffer)
            .into_iter()
            .collect()
    }
}
