//! Headless command recorder
//!
//! [`RecordingDevice`] implements [`GpuDevice`] without touching a GPU. Every call is
//! appended to a command log, buffers keep their latest contents plus a write
//! history, and creation failures can be injected. The integration tests drive the
//! full frame pipeline against it.

use slotmap::SlotMap;

use super::{
    BufferHandle, BufferKind, GpuDevice, PassDesc, ProgramDesc, ProgramHandle, ProgramStages,
    RasterizerState, SamplerDesc, SamplerHandle, TextureHandle, TextureSlot, Topology,
    UniformSlot, VertexAttribute, Viewport,
};
use crate::errors::GpuError;

/// One recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    BeginFrame,
    BeginPass {
        label: &'static str,
        has_color: bool,
        depth: TextureHandle,
        depth_clear: Option<f32>,
    },
    EndPass,
    SetRasterizer(RasterizerState),
    SetViewport(Viewport),
    BindProgram {
        program: ProgramHandle,
        stages: ProgramStages,
    },
    BindUniform {
        slot: UniformSlot,
        buffer: BufferHandle,
    },
    BindTexture {
        slot: TextureSlot,
        texture: TextureHandle,
        sampler: SamplerHandle,
    },
    BindVertexStream {
        attribute: VertexAttribute,
        buffer: BufferHandle,
    },
    BindIndexBuffer(BufferHandle),
    WriteBuffer {
        buffer: BufferHandle,
        size: usize,
    },
    DrawIndexed {
        topology: Topology,
        index_count: u32,
    },
    Draw {
        topology: Topology,
        vertex_count: u32,
    },
    Present {
        sync_interval: u32,
    },
}

impl GpuCommand {
    pub fn is_draw(&self) -> bool {
        matches!(self, GpuCommand::DrawIndexed { .. } | GpuCommand::Draw { .. })
    }
}

/// Buffer state kept by the recorder.
#[derive(Debug, Clone)]
pub struct RecordedBuffer {
    pub label: String,
    pub kind: BufferKind,
    pub contents: Vec<u8>,
    /// Every write after creation, oldest first.
    pub writes: Vec<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct RecordedTexture {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub depth: bool,
}

/// [`GpuDevice`] that records instead of rendering.
#[derive(Debug)]
pub struct RecordingDevice {
    commands: Vec<GpuCommand>,
    buffers: SlotMap<BufferHandle, RecordedBuffer>,
    programs: SlotMap<ProgramHandle, ProgramDesc>,
    textures: SlotMap<TextureHandle, RecordedTexture>,
    samplers: SlotMap<SamplerHandle, SamplerDesc>,
    surface_size: (u32, u32),
    in_pass: bool,
    fail_buffers: bool,
    fail_program_labels: Vec<String>,
    lost: Option<String>,
    frames_presented: u32,
}

impl RecordingDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            commands: Vec::new(),
            buffers: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            samplers: SlotMap::with_key(),
            surface_size: (width, height),
            in_pass: false,
            fail_buffers: false,
            fail_program_labels: Vec::new(),
            lost: None,
            frames_presented: 0,
        }
    }

    /// Makes every following buffer creation fail.
    pub fn fail_buffer_creation(&mut self, fail: bool) {
        self.fail_buffers = fail;
    }

    /// Makes compilation of programs with this label fail.
    pub fn fail_program(&mut self, label: &str) {
        self.fail_program_labels.push(label.to_string());
    }

    /// Simulates device removal.
    pub fn lose_device(&mut self, reason: &str) {
        self.lost = Some(reason.to_string());
    }

    pub fn resize_surface(&mut self, width: u32, height: u32) {
        self.surface_size = (width, height);
    }

    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Commands recorded inside the most recent pass with this label, excluding the
    /// begin/end markers.
    pub fn pass_commands(&self, label: &str) -> Vec<&GpuCommand> {
        let Some(start) = self.commands.iter().rposition(
            |command| matches!(command, GpuCommand::BeginPass { label: l, .. } if *l == label),
        ) else {
            return Vec::new();
        };

        self.commands[start + 1..]
            .iter()
            .take_while(|command| !matches!(command, GpuCommand::EndPass))
            .collect()
    }

    /// Number of draw calls in the most recent pass with this label.
    pub fn draw_count(&self, label: &str) -> usize {
        self.pass_commands(label)
            .into_iter()
            .filter(|command| command.is_draw())
            .count()
    }

    /// Number of passes with this label recorded so far.
    pub fn pass_count(&self, label: &str) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, GpuCommand::BeginPass { label: l, .. } if *l == label))
            .count()
    }

    pub fn buffer(&self, handle: BufferHandle) -> Option<&RecordedBuffer> {
        self.buffers.get(handle)
    }

    pub fn buffer_contents(&self, handle: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(handle).map(|buffer| buffer.contents.as_slice())
    }

    pub fn program(&self, handle: ProgramHandle) -> Option<&ProgramDesc> {
        self.programs.get(handle)
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&RecordedTexture> {
        self.textures.get(handle)
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn frames_presented(&self) -> u32 {
        self.frames_presented
    }
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl GpuDevice for RecordingDevice {
    fn create_buffer(
        &mut self,
        label: &str,
        kind: BufferKind,
        contents: &[u8],
    ) -> Result<BufferHandle, GpuError> {
        if self.fail_buffers {
            return Err(GpuError::BufferCreation {
                label: label.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        Ok(self.buffers.insert(RecordedBuffer {
            label: label.to_string(),
            kind,
            contents: contents.to_vec(),
            writes: Vec::new(),
        }))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, contents: &[u8]) -> Result<(), GpuError> {
        let record = self
            .buffers
            .get_mut(buffer)
            .ok_or(GpuError::InvalidHandle("buffer"))?;

        if record.contents.len() != contents.len() {
            return Err(GpuError::BufferWrite {
                buffer,
                size: contents.len(),
                reason: format!("buffer holds {} bytes", record.contents.len()),
            });
        }

        record.contents.copy_from_slice(contents);
        record.writes.push(contents.to_vec());
        self.commands.push(GpuCommand::WriteBuffer {
            buffer,
            size: contents.len(),
        });
        Ok(())
    }

    fn create_program(&mut self, desc: &ProgramDesc) -> Result<ProgramHandle, GpuError> {
        if self.fail_program_labels.iter().any(|label| *label == desc.label) {
            return Err(GpuError::ProgramCompilation {
                label: desc.label.clone(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(self.programs.insert(desc.clone()))
    }

    fn create_texture_rgba8(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<TextureHandle, GpuError> {
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return Err(GpuError::TextureCreation {
                label: label.to_string(),
                reason: format!("{} bytes for {width}x{height}", pixels.len()),
            });
        }

        Ok(self.textures.insert(RecordedTexture {
            label: label.to_string(),
            width,
            height,
            depth: false,
        }))
    }

    fn create_depth_target(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, GpuError> {
        Ok(self.textures.insert(RecordedTexture {
            label: label.to_string(),
            width,
            height,
            depth: true,
        }))
    }

    fn create_sampler(
        &mut self,
        _label: &str,
        desc: SamplerDesc,
    ) -> Result<SamplerHandle, GpuError> {
        Ok(self.samplers.insert(desc))
    }

    fn surface_size(&self) -> (u32, u32) {
        self.surface_size
    }

    fn begin_frame(&mut self) -> Result<(), GpuError> {
        self.commands.push(GpuCommand::BeginFrame);
        Ok(())
    }

    fn begin_pass(&mut self, pass: &PassDesc) {
        if self.in_pass {
            log::warn!("begin_pass('{}') while a pass is open", pass.label);
        }
        self.in_pass = true;
        self.commands.push(GpuCommand::BeginPass {
            label: pass.label,
            has_color: pass.color.is_some(),
            depth: pass.depth,
            depth_clear: pass.depth_clear,
        });
    }

    fn end_pass(&mut self) {
        self.in_pass = false;
        self.commands.push(GpuCommand::EndPass);
    }

    fn set_rasterizer(&mut self, state: RasterizerState) {
        self.commands.push(GpuCommand::SetRasterizer(state));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(GpuCommand::SetViewport(viewport));
    }

    fn bind_program(&mut self, program: ProgramHandle, stages: ProgramStages) {
        self.commands.push(GpuCommand::BindProgram { program, stages });
    }

    fn bind_uniform(&mut self, slot: UniformSlot, buffer: BufferHandle) {
        self.commands.push(GpuCommand::BindUniform { slot, buffer });
    }

    fn bind_texture(&mut self, slot: TextureSlot, texture: TextureHandle, sampler: SamplerHandle) {
        self.commands.push(GpuCommand::BindTexture {
            slot,
            texture,
            sampler,
        });
    }

    fn bind_vertex_stream(&mut self, attribute: VertexAttribute, buffer: BufferHandle) {
        self.commands
            .push(GpuCommand::BindVertexStream { attribute, buffer });
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle) {
        self.commands.push(GpuCommand::BindIndexBuffer(buffer));
    }

    fn draw_indexed(&mut self, topology: Topology, index_count: u32) {
        self.commands.push(GpuCommand::DrawIndexed {
            topology,
            index_count,
        });
    }

    fn draw(&mut self, topology: Topology, vertex_count: u32) {
        self.commands.push(GpuCommand::Draw {
            topology,
            vertex_count,
        });
    }

    fn present(&mut self, sync_interval: u32) -> Result<(), GpuError> {
        self.frames_presented += 1;
        self.commands.push(GpuCommand::Present { sync_interval });
        Ok(())
    }

    fn device_lost(&self) -> Option<String> {
        self.lost.clone()
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(buffer);
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(texture);
    }

    fn release_sampler(&mut self, sampler: SamplerHandle) {
        self.samplers.remove(sampler);
    }

    fn release_program(&mut self, program: ProgramHandle) {
        self.programs.remove(program);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_replaces_contents_and_keeps_history() {
        let mut device = RecordingDevice::default();
        let buffer = device
            .create_buffer("test", BufferKind::Uniform, &[0u8; 4])
            .unwrap();

        device.write_buffer(buffer, &[1, 2, 3, 4]).unwrap();
        device.write_buffer(buffer, &[5, 6, 7, 8]).unwrap();

        assert_eq!(device.buffer_contents(buffer), Some(&[5u8, 6, 7, 8][..]));
        assert_eq!(device.buffer(buffer).unwrap().writes.len(), 2);
    }

    #[test]
    fn test_write_with_wrong_size_is_rejected() {
        let mut device = RecordingDevice::default();
        let buffer = device
            .create_buffer("test", BufferKind::Uniform, &[0u8; 4])
            .unwrap();

        assert!(matches!(
            device.write_buffer(buffer, &[1, 2]),
            Err(GpuError::BufferWrite { size: 2, .. })
        ));
    }

    #[test]
    fn test_pass_commands_are_scoped_to_latest_pass() {
        let mut device = RecordingDevice::default();
        let depth = device.create_depth_target("depth", 4, 4).unwrap();
        let pass = PassDesc {
            label: "color",
            color: None,
            depth,
            depth_clear: Some(1.0),
        };

        device.begin_pass(&pass);
        device.draw(Topology::LineList, 2);
        device.end_pass();
        device.begin_pass(&pass);
        device.draw(Topology::LineList, 2);
        device.draw(Topology::LineList, 2);
        device.end_pass();

        assert_eq!(device.pass_count("color"), 2);
        assert_eq!(device.draw_count("color"), 2);
        assert_eq!(device.draw_count("shadow"), 0);
    }

    #[test]
    fn test_injected_program_failure() {
        let mut device = RecordingDevice::default();
        device.fail_program("broken");

        let desc = ProgramDesc {
            label: "broken".to_string(),
            source: "".into(),
            vertex_entry: "vs_main".to_string(),
            pixel_entry: "fs_main".to_string(),
            attributes: crate::gpu::AttributeMask::POSITION,
        };
        assert!(device.create_program(&desc).is_err());
    }
}
