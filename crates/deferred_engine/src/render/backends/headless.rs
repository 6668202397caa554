//! In-process graphics device
//!
//! [`HeadlessDevice`] implements [`GraphicsDevice`] without a GPU. It keeps
//! every object in a [`ResourceTable`], applies core-profile framebuffer
//! completeness rules, and records the commands it receives so tests and
//! tooling can inspect exactly what a frame did: which passes ran, which
//! targets each draw wrote, and which uniforms were set.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::foundation::collections::ResourceTable;
use crate::render::api::{
    Attachment, BlendMode, BlitRegion, ClearFlags, CullMode, DepthState, FilterMode, FramebufferHandle,
    FramebufferStatus, FramebufferTarget, GraphicsDevice, MeshHandle, ObjectRef, PolygonMode, ProgramHandle,
    RenderbufferDesc, RenderbufferHandle, ShaderSources, ShaderStage, TextureDesc, TextureFormat, TextureHandle,
    TextureKind, UniformValue, Viewport,
};
use crate::render::primitives::Mesh;
use crate::render::{RenderError, RenderResult};

/// Image bound at a framebuffer attachment point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachedImage {
    /// A texture (all faces of a cube map)
    Texture(TextureHandle),
    /// A renderbuffer
    Renderbuffer(RenderbufferHandle),
}

/// Snapshot of the state a draw was issued with
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Geometry drawn
    pub mesh: MeshHandle,
    /// Current program
    pub program: ProgramHandle,
    /// Draw framebuffer, `None` for the output surface
    pub framebuffer: Option<FramebufferHandle>,
    /// Color attachments written
    pub draw_buffers: Vec<u32>,
    /// Viewport at draw time
    pub viewport: Viewport,
    /// Depth state at draw time
    pub depth: DepthState,
    /// Blend mode at draw time
    pub blend: BlendMode,
    /// Cull mode at draw time
    pub cull: CullMode,
    /// Polygon mode at draw time
    pub polygon: PolygonMode,
    /// Texture bound to each sampler unit, ordered by unit
    pub textures: Vec<(u32, TextureHandle)>,
    /// Innermost open debug group
    pub debug_group: Option<String>,
}

/// A command received by the device, in submission order
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// Framebuffer binding change
    BindFramebuffer {
        /// Binding point
        target: FramebufferTarget,
        /// Bound framebuffer, `None` for the output surface
        framebuffer: Option<FramebufferHandle>,
    },
    /// Draw buffer selection on the bound draw framebuffer
    SetDrawBuffers {
        /// Affected framebuffer
        framebuffer: Option<FramebufferHandle>,
        /// Selected color attachments
        attachments: Vec<u32>,
    },
    /// Read buffer selection on the bound read framebuffer
    SetReadBuffer {
        /// Affected framebuffer
        framebuffer: Option<FramebufferHandle>,
        /// Selected color attachment
        attachment: Option<u32>,
    },
    /// Clear of the bound draw framebuffer
    Clear {
        /// Cleared framebuffer
        framebuffer: Option<FramebufferHandle>,
        /// Color attachments cleared when `flags` contains color
        draw_buffers: Vec<u32>,
        /// Buffers cleared
        flags: ClearFlags,
        /// Clear color in effect
        color: [f32; 4],
    },
    /// Rectangle copy between framebuffers
    Blit {
        /// Read framebuffer
        source_framebuffer: Option<FramebufferHandle>,
        /// Read buffer of the source
        read_buffer: Option<u32>,
        /// Draw framebuffer
        destination_framebuffer: Option<FramebufferHandle>,
        /// Draw buffers of the destination
        draw_buffers: Vec<u32>,
        /// Source rectangle
        source: BlitRegion,
        /// Destination rectangle
        destination: BlitRegion,
        /// Scaling filter
        filter: FilterMode,
    },
    /// Viewport change
    SetViewport(Viewport),
    /// Depth state change
    SetDepthState(DepthState),
    /// Blend mode change
    SetBlendMode(BlendMode),
    /// Cull mode change
    SetCullMode(CullMode),
    /// Polygon mode change
    SetPolygonMode(PolygonMode),
    /// Texture bound to a sampler unit
    BindTexture {
        /// Sampler unit
        unit: u32,
        /// Binding kind
        kind: TextureKind,
        /// Texture
        texture: TextureHandle,
    },
    /// Program made current
    UseProgram(ProgramHandle),
    /// Uniform assignment
    SetUniform {
        /// Target program
        program: ProgramHandle,
        /// Uniform name
        name: String,
        /// Assigned value
        value: UniformValue,
    },
    /// Draw call
    Draw(DrawCall),
    /// Debug group opened
    PushDebugGroup(String),
    /// Debug group closed
    PopDebugGroup,
}

/// Create/delete counters for one object kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectCounts {
    /// Successful creations
    pub created: usize,
    /// Successful deletions
    pub deleted: usize,
}

impl ObjectCounts {
    /// Objects created and not yet deleted
    pub const fn live(&self) -> usize {
        self.created - self.deleted
    }
}

/// Lifetime object statistics of a device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Textures
    pub textures: ObjectCounts,
    /// Renderbuffers
    pub renderbuffers: ObjectCounts,
    /// Framebuffers
    pub framebuffers: ObjectCounts,
    /// Programs
    pub programs: ObjectCounts,
    /// Meshes
    pub meshes: ObjectCounts,
    /// Draw calls issued
    pub draw_calls: usize,
}

impl DeviceStats {
    /// Total live objects of every kind
    pub const fn live_objects(&self) -> usize {
        self.textures.live()
            + self.renderbuffers.live()
            + self.framebuffers.live()
            + self.programs.live()
            + self.meshes.live()
    }
}

#[derive(Debug)]
struct TextureRecord {
    desc: TextureDesc,
}

#[derive(Debug)]
struct RenderbufferRecord {
    desc: RenderbufferDesc,
}

#[derive(Debug)]
struct FramebufferRecord {
    attachments: BTreeMap<Attachment, AttachedImage>,
    draw_buffers: Vec<u32>,
    read_buffer: Option<u32>,
}

impl Default for FramebufferRecord {
    fn default() -> Self {
        Self {
            attachments: BTreeMap::new(),
            draw_buffers: vec![0],
            read_buffer: Some(0),
        }
    }
}

#[derive(Debug)]
struct ProgramRecord {
    label: String,
    stages: Vec<ShaderStage>,
    uniforms: HashMap<String, UniformValue>,
}

#[derive(Debug)]
struct MeshRecord {
    vertex_count: usize,
    index_count: usize,
}

/// GPU-less [`GraphicsDevice`] with inspection helpers
#[derive(Debug)]
pub struct HeadlessDevice {
    textures: ResourceTable<TextureRecord>,
    renderbuffers: ResourceTable<RenderbufferRecord>,
    framebuffers: ResourceTable<FramebufferRecord>,
    programs: ResourceTable<ProgramRecord>,
    meshes: ResourceTable<MeshRecord>,
    labels: HashMap<ObjectRef, String>,
    stats: DeviceStats,

    draw_framebuffer: Option<FramebufferHandle>,
    read_framebuffer: Option<FramebufferHandle>,
    output_size: (u32, u32),
    viewport: Viewport,
    clear_color: [f32; 4],
    depth: DepthState,
    blend: BlendMode,
    cull: CullMode,
    polygon: PolygonMode,
    current_program: ProgramHandle,
    texture_units: BTreeMap<u32, TextureHandle>,
    debug_groups: Vec<String>,

    failing_programs: HashSet<String>,
    texture_limit: Option<usize>,
    recording: bool,
    commands: Vec<DeviceCommand>,
}

impl HeadlessDevice {
    /// Create a device whose output surface is `width` x `height`
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            textures: ResourceTable::new(),
            renderbuffers: ResourceTable::new(),
            framebuffers: ResourceTable::new(),
            programs: ResourceTable::new(),
            meshes: ResourceTable::new(),
            labels: HashMap::new(),
            stats: DeviceStats::default(),
            draw_framebuffer: None,
            read_framebuffer: None,
            output_size: (width, height),
            viewport: Viewport::new(width, height),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            depth: DepthState::Disabled,
            blend: BlendMode::Disabled,
            cull: CullMode::Disabled,
            polygon: PolygonMode::Fill,
            current_program: ProgramHandle::INVALID,
            texture_units: BTreeMap::new(),
            debug_groups: Vec::new(),
            failing_programs: HashSet::new(),
            texture_limit: None,
            recording: true,
            commands: Vec::new(),
        }
    }

    // === Fault injection ===

    /// Make every later compilation of the program labelled `label` fail
    pub fn fail_program(&mut self, label: impl Into<String>) {
        self.failing_programs.insert(label.into());
    }

    /// Let every program compile again
    pub fn clear_program_failures(&mut self) {
        self.failing_programs.clear();
    }

    /// Refuse texture allocations once `limit` textures are live
    pub fn set_texture_limit(&mut self, limit: Option<usize>) {
        self.texture_limit = limit;
    }

    // === Command log ===

    /// Turn command recording on or off; off keeps long runs from growing the log
    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }

    /// Commands recorded so far
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Drain the command log
    pub fn take_commands(&mut self) -> Vec<DeviceCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Forget recorded commands
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Recorded draw calls
    pub fn draw_calls(&self) -> impl Iterator<Item = &DrawCall> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DeviceCommand::Draw(draw) => Some(draw),
            _ => None,
        })
    }

    /// Names of the debug groups opened so far, in order
    pub fn debug_group_sequence(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DeviceCommand::PushDebugGroup(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of debug groups currently open
    pub fn debug_group_depth(&self) -> usize {
        self.debug_groups.len()
    }

    // === Object inspection ===

    /// Lifetime object statistics
    pub const fn stats(&self) -> DeviceStats {
        self.stats
    }

    /// Descriptor of a live texture
    pub fn texture_desc(&self, texture: TextureHandle) -> Option<&TextureDesc> {
        self.textures.get(texture.0).map(|record| &record.desc)
    }

    /// Descriptor of a live renderbuffer
    pub fn renderbuffer_desc(&self, renderbuffer: RenderbufferHandle) -> Option<&RenderbufferDesc> {
        self.renderbuffers.get(renderbuffer.0).map(|record| &record.desc)
    }

    /// Whether `texture` names a live texture
    pub fn texture_exists(&self, texture: TextureHandle) -> bool {
        self.textures.contains(texture.0)
    }

    /// Whether `framebuffer` names a live framebuffer
    pub fn framebuffer_exists(&self, framebuffer: FramebufferHandle) -> bool {
        self.framebuffers.contains(framebuffer.0)
    }

    /// Image attached to a framebuffer attachment point
    pub fn attachment(&self, framebuffer: FramebufferHandle, attachment: Attachment) -> Option<AttachedImage> {
        self.framebuffers.get(framebuffer.0)?.attachments.get(&attachment).copied()
    }

    /// Draw buffer selection of a framebuffer
    pub fn draw_buffers(&self, framebuffer: FramebufferHandle) -> Option<&[u32]> {
        self.framebuffers.get(framebuffer.0).map(|record| record.draw_buffers.as_slice())
    }

    /// Read buffer selection of a framebuffer
    pub fn read_buffer(&self, framebuffer: FramebufferHandle) -> Option<Option<u32>> {
        self.framebuffers.get(framebuffer.0).map(|record| record.read_buffer)
    }

    /// Debug label attached to an object
    pub fn object_label(&self, object: ObjectRef) -> Option<&str> {
        self.labels.get(&object).map(String::as_str)
    }

    /// Live framebuffer carrying the given debug label
    pub fn framebuffer_by_label(&self, label: &str) -> Option<FramebufferHandle> {
        self.labels.iter().find_map(|(object, name)| match object {
            ObjectRef::Framebuffer(handle) if name == label && self.framebuffer_exists(*handle) => Some(*handle),
            _ => None,
        })
    }

    /// Label a program was compiled with
    pub fn program_label(&self, program: ProgramHandle) -> Option<&str> {
        self.programs.get(program.0).map(|record| record.label.as_str())
    }

    /// Live program compiled with `label`
    pub fn program_by_label(&self, label: &str) -> Option<ProgramHandle> {
        self.programs
            .iter()
            .find(|(_, record)| record.label == label)
            .map(|(id, _)| ProgramHandle(id))
    }

    /// Stages a live program was built from
    pub fn program_stages(&self, program: ProgramHandle) -> Option<&[ShaderStage]> {
        self.programs.get(program.0).map(|record| record.stages.as_slice())
    }

    /// Last value assigned to a program uniform
    pub fn uniform(&self, program: ProgramHandle, name: &str) -> Option<&UniformValue> {
        self.programs.get(program.0)?.uniforms.get(name)
    }

    /// Vertex and index counts of an uploaded mesh
    pub fn mesh_size(&self, mesh: MeshHandle) -> Option<(usize, usize)> {
        self.meshes.get(mesh.0).map(|record| (record.vertex_count, record.index_count))
    }

    /// Resize the output surface
    pub fn resize_output(&mut self, width: u32, height: u32) {
        self.output_size = (width, height);
    }

    /// Size of the output surface
    pub const fn output_size(&self) -> (u32, u32) {
        self.output_size
    }

    fn record(&mut self, command: DeviceCommand) {
        if self.recording {
            self.commands.push(command);
        }
    }

    fn attached_format(&self, image: AttachedImage) -> Option<(TextureFormat, u32, u32)> {
        match image {
            AttachedImage::Texture(handle) => self
                .textures
                .get(handle.0)
                .map(|record| (record.desc.format, record.desc.width, record.desc.height)),
            AttachedImage::Renderbuffer(handle) => self
                .renderbuffers
                .get(handle.0)
                .map(|record| (record.desc.format, record.desc.width, record.desc.height)),
        }
    }

    fn draw_buffers_of(&self, framebuffer: Option<FramebufferHandle>) -> Vec<u32> {
        match framebuffer {
            Some(handle) => self
                .framebuffers
                .get(handle.0)
                .map(|record| record.draw_buffers.clone())
                .unwrap_or_default(),
            None => vec![0],
        }
    }

    fn read_buffer_of(&self, framebuffer: Option<FramebufferHandle>) -> Option<u32> {
        match framebuffer {
            Some(handle) => self.framebuffers.get(handle.0).and_then(|record| record.read_buffer),
            None => Some(0),
        }
    }

    fn attach(
        &mut self,
        framebuffer: FramebufferHandle,
        attachment: Attachment,
        image: AttachedImage,
    ) -> RenderResult<()> {
        let record = self.framebuffers.get_mut(framebuffer.0).ok_or(RenderError::InvalidHandle {
            kind: "framebuffer",
            id: framebuffer.0,
        })?;
        record.attachments.insert(attachment, image);
        Ok(())
    }
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

fn attachment_accepts(attachment: Attachment, format: TextureFormat) -> bool {
    match attachment {
        Attachment::Color(_) => !format.is_depth(),
        Attachment::Depth => format.is_depth(),
        Attachment::DepthStencil => format.has_stencil(),
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_texture(&mut self, desc: &TextureDesc) -> RenderResult<TextureHandle> {
        if desc.width == 0 || desc.height == 0 {
            return Err(RenderError::ResourceCreationFailed(format!(
                "texture with zero extent {}x{}",
                desc.width, desc.height
            )));
        }
        if desc.kind == TextureKind::CubeMap && desc.width != desc.height {
            return Err(RenderError::ResourceCreationFailed(format!(
                "cube map faces must be square, got {}x{}",
                desc.width, desc.height
            )));
        }
        if let Some(limit) = self.texture_limit {
            if self.textures.len() >= limit {
                return Err(RenderError::ResourceCreationFailed(format!(
                    "texture limit of {limit} reached"
                )));
            }
        }
        let id = self.textures.insert(TextureRecord { desc: desc.clone() });
        self.stats.textures.created += 1;
        Ok(TextureHandle(id))
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if !texture.is_valid() {
            return;
        }
        if self.textures.remove(texture.0).is_some() {
            self.stats.textures.deleted += 1;
            self.labels.remove(&ObjectRef::Texture(texture));
            self.texture_units.retain(|_, bound| *bound != texture);
        } else {
            log::warn!("[DEVICE] delete of unknown {texture}");
        }
    }

    fn create_renderbuffer(&mut self, desc: &RenderbufferDesc) -> RenderResult<RenderbufferHandle> {
        if desc.width == 0 || desc.height == 0 {
            return Err(RenderError::ResourceCreationFailed(format!(
                "renderbuffer with zero extent {}x{}",
                desc.width, desc.height
            )));
        }
        let id = self.renderbuffers.insert(RenderbufferRecord { desc: *desc });
        self.stats.renderbuffers.created += 1;
        Ok(RenderbufferHandle(id))
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle) {
        if !renderbuffer.is_valid() {
            return;
        }
        if self.renderbuffers.remove(renderbuffer.0).is_some() {
            self.stats.renderbuffers.deleted += 1;
            self.labels.remove(&ObjectRef::Renderbuffer(renderbuffer));
        } else {
            log::warn!("[DEVICE] delete of unknown {renderbuffer}");
        }
    }

    fn create_framebuffer(&mut self) -> RenderResult<FramebufferHandle> {
        let id = self.framebuffers.insert(FramebufferRecord::default());
        self.stats.framebuffers.created += 1;
        Ok(FramebufferHandle(id))
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        if !framebuffer.is_valid() {
            return;
        }
        if self.framebuffers.remove(framebuffer.0).is_some() {
            self.stats.framebuffers.deleted += 1;
            self.labels.remove(&ObjectRef::Framebuffer(framebuffer));
            // Deleting a bound framebuffer reverts the binding to the output surface
            if self.draw_framebuffer == Some(framebuffer) {
                self.draw_framebuffer = None;
            }
            if self.read_framebuffer == Some(framebuffer) {
                self.read_framebuffer = None;
            }
        } else {
            log::warn!("[DEVICE] delete of unknown {framebuffer}");
        }
    }

    fn attach_texture(
        &mut self,
        framebuffer: FramebufferHandle,
        attachment: Attachment,
        texture: TextureHandle,
    ) -> RenderResult<()> {
        if !self.textures.contains(texture.0) {
            return Err(RenderError::InvalidHandle { kind: "texture", id: texture.0 });
        }
        self.attach(framebuffer, attachment, AttachedImage::Texture(texture))
    }

    fn attach_renderbuffer(
        &mut self,
        framebuffer: FramebufferHandle,
        attachment: Attachment,
        renderbuffer: RenderbufferHandle,
    ) -> RenderResult<()> {
        if !self.renderbuffers.contains(renderbuffer.0) {
            return Err(RenderError::InvalidHandle { kind: "renderbuffer", id: renderbuffer.0 });
        }
        self.attach(framebuffer, attachment, AttachedImage::Renderbuffer(renderbuffer))
    }

    fn check_framebuffer_status(&self, framebuffer: FramebufferHandle) -> FramebufferStatus {
        let Some(record) = self.framebuffers.get(framebuffer.0) else {
            return FramebufferStatus::Undefined;
        };
        if record.attachments.is_empty() {
            return FramebufferStatus::MissingAttachment;
        }

        let mut extent = None;
        for (attachment, image) in &record.attachments {
            let Some((format, width, height)) = self.attached_format(*image) else {
                return FramebufferStatus::IncompleteAttachment;
            };
            if !attachment_accepts(*attachment, format) {
                return FramebufferStatus::IncompleteAttachment;
            }
            match extent {
                None => extent = Some((width, height)),
                Some(size) if size != (width, height) => return FramebufferStatus::IncompleteDimensions,
                Some(_) => {}
            }
        }

        if record
            .draw_buffers
            .iter()
            .any(|index| !record.attachments.contains_key(&Attachment::Color(*index)))
        {
            return FramebufferStatus::IncompleteDrawBuffer;
        }
        if let Some(index) = record.read_buffer {
            if !record.attachments.contains_key(&Attachment::Color(index)) {
                return FramebufferStatus::IncompleteReadBuffer;
            }
        }
        FramebufferStatus::Complete
    }

    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: Option<FramebufferHandle>) {
        if let Some(handle) = framebuffer {
            if !self.framebuffers.contains(handle.0) {
                log::error!("[DEVICE] bind of unknown {handle}");
                return;
            }
        }
        match target {
            FramebufferTarget::Draw => self.draw_framebuffer = framebuffer,
            FramebufferTarget::Read => self.read_framebuffer = framebuffer,
            FramebufferTarget::Both => {
                self.draw_framebuffer = framebuffer;
                self.read_framebuffer = framebuffer;
            }
        }
        self.record(DeviceCommand::BindFramebuffer { target, framebuffer });
    }

    fn bound_framebuffer(&self, target: FramebufferTarget) -> Option<FramebufferHandle> {
        match target {
            FramebufferTarget::Read => self.read_framebuffer,
            FramebufferTarget::Draw | FramebufferTarget::Both => self.draw_framebuffer,
        }
    }

    fn set_draw_buffers(&mut self, color_attachments: &[u32]) {
        let framebuffer = self.draw_framebuffer;
        if let Some(record) = framebuffer.and_then(|handle| self.framebuffers.get_mut(handle.0)) {
            record.draw_buffers = color_attachments.to_vec();
        }
        self.record(DeviceCommand::SetDrawBuffers {
            framebuffer,
            attachments: color_attachments.to_vec(),
        });
    }

    fn set_read_buffer(&mut self, color_attachment: Option<u32>) {
        let framebuffer = self.read_framebuffer;
        if let Some(record) = framebuffer.and_then(|handle| self.framebuffers.get_mut(handle.0)) {
            record.read_buffer = color_attachment;
        }
        self.record(DeviceCommand::SetReadBuffer {
            framebuffer,
            attachment: color_attachment,
        });
    }

    fn blit(&mut self, source: BlitRegion, destination: BlitRegion, filter: FilterMode) {
        let command = DeviceCommand::Blit {
            source_framebuffer: self.read_framebuffer,
            read_buffer: self.read_buffer_of(self.read_framebuffer),
            destination_framebuffer: self.draw_framebuffer,
            draw_buffers: self.draw_buffers_of(self.draw_framebuffer),
            source,
            destination,
            filter,
        };
        self.record(command);
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
    }

    fn clear(&mut self, flags: ClearFlags) {
        let command = DeviceCommand::Clear {
            framebuffer: self.draw_framebuffer,
            draw_buffers: self.draw_buffers_of(self.draw_framebuffer),
            flags,
            color: self.clear_color,
        };
        self.record(command);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.record(DeviceCommand::SetViewport(viewport));
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_depth_state(&mut self, state: DepthState) {
        self.depth = state;
        self.record(DeviceCommand::SetDepthState(state));
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
        self.record(DeviceCommand::SetBlendMode(mode));
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        self.cull = mode;
        self.record(DeviceCommand::SetCullMode(mode));
    }

    fn cull_mode(&self) -> CullMode {
        self.cull
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.polygon = mode;
        self.record(DeviceCommand::SetPolygonMode(mode));
    }

    fn bind_texture(&mut self, unit: u32, kind: TextureKind, texture: TextureHandle) {
        if texture.is_valid() {
            self.texture_units.insert(unit, texture);
        } else {
            self.texture_units.remove(&unit);
        }
        self.record(DeviceCommand::BindTexture { unit, kind, texture });
    }

    fn compile_program(&mut self, sources: &ShaderSources) -> RenderResult<ProgramHandle> {
        if self.failing_programs.contains(&sources.label) {
            return Err(RenderError::ShaderCompilation {
                label: sources.label.clone(),
                log: "compilation rejected by device".to_string(),
            });
        }
        if !sources.has_stage(ShaderStage::Vertex) || !sources.has_stage(ShaderStage::Fragment) {
            return Err(RenderError::ShaderCompilation {
                label: sources.label.clone(),
                log: "program needs a vertex and a fragment stage".to_string(),
            });
        }
        if sources.has_stage(ShaderStage::TessControl) != sources.has_stage(ShaderStage::TessEvaluation) {
            return Err(RenderError::ShaderCompilation {
                label: sources.label.clone(),
                log: "tessellation control and evaluation stages must be paired".to_string(),
            });
        }
        let id = self.programs.insert(ProgramRecord {
            label: sources.label.clone(),
            stages: sources.stages.iter().map(|(stage, _)| *stage).collect(),
            uniforms: HashMap::new(),
        });
        self.stats.programs.created += 1;
        Ok(ProgramHandle(id))
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if !program.is_valid() {
            return;
        }
        if self.programs.remove(program.0).is_some() {
            self.stats.programs.deleted += 1;
            self.labels.remove(&ObjectRef::Program(program));
            if self.current_program == program {
                self.current_program = ProgramHandle::INVALID;
            }
        } else {
            log::warn!("[DEVICE] delete of unknown {program}");
        }
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.current_program = program;
        self.record(DeviceCommand::UseProgram(program));
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) {
        let Some(record) = self.programs.get_mut(program.0) else {
            log::warn!("[DEVICE] uniform '{name}' set on unknown {program}");
            return;
        };
        record.uniforms.insert(name.to_string(), value.clone());
        self.record(DeviceCommand::SetUniform {
            program,
            name: name.to_string(),
            value,
        });
    }

    fn create_mesh(&mut self, mesh: &Mesh) -> RenderResult<MeshHandle> {
        if mesh.vertices.is_empty() {
            return Err(RenderError::ResourceCreationFailed("mesh without vertices".to_string()));
        }
        if let Some(index) = mesh.indices.iter().find(|&&index| index as usize >= mesh.vertices.len()) {
            return Err(RenderError::ResourceCreationFailed(format!(
                "index {index} past {} vertices",
                mesh.vertices.len()
            )));
        }
        let id = self.meshes.insert(MeshRecord {
            vertex_count: mesh.vertices.len(),
            index_count: mesh.indices.len(),
        });
        self.stats.meshes.created += 1;
        Ok(MeshHandle(id))
    }

    fn delete_mesh(&mut self, mesh: MeshHandle) {
        if !mesh.is_valid() {
            return;
        }
        if self.meshes.remove(mesh.0).is_some() {
            self.stats.meshes.deleted += 1;
            self.labels.remove(&ObjectRef::Mesh(mesh));
        } else {
            log::warn!("[DEVICE] delete of unknown {mesh}");
        }
    }

    fn draw_mesh(&mut self, mesh: MeshHandle) {
        if !self.meshes.contains(mesh.0) {
            log::error!("[DEVICE] draw of unknown {mesh}");
            return;
        }
        self.stats.draw_calls += 1;
        let draw = DrawCall {
            mesh,
            program: self.current_program,
            framebuffer: self.draw_framebuffer,
            draw_buffers: self.draw_buffers_of(self.draw_framebuffer),
            viewport: self.viewport,
            depth: self.depth,
            blend: self.blend,
            cull: self.cull,
            polygon: self.polygon,
            textures: self.texture_units.iter().map(|(unit, texture)| (*unit, *texture)).collect(),
            debug_group: self.debug_groups.last().cloned(),
        };
        self.record(DeviceCommand::Draw(draw));
    }

    fn label_object(&mut self, object: ObjectRef, label: &str) {
        self.labels.insert(object, label.to_string());
    }

    fn push_debug_group(&mut self, name: &str) {
        self.debug_groups.push(name.to_string());
        self.record(DeviceCommand::PushDebugGroup(name.to_string()));
    }

    fn pop_debug_group(&mut self) {
        if self.debug_groups.pop().is_none() {
            log::warn!("[DEVICE] debug group pop without matching push");
            return;
        }
        self.record(DeviceCommand::PopDebugGroup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_target(device: &mut HeadlessDevice, width: u32, height: u32) -> TextureHandle {
        device
            .create_texture(&TextureDesc::color_2d(width, height, TextureFormat::Rgba16F))
            .unwrap()
    }

    #[test]
    fn test_new_framebuffer_is_missing_attachments() {
        let mut device = HeadlessDevice::new(64, 64);
        let framebuffer = device.create_framebuffer().unwrap();
        assert_eq!(device.check_framebuffer_status(framebuffer), FramebufferStatus::MissingAttachment);
    }

    #[test]
    fn test_depth_only_framebuffer_needs_draw_buffer_none() {
        let mut device = HeadlessDevice::new(64, 64);
        let framebuffer = device.create_framebuffer().unwrap();
        let depth = device.create_texture(&TextureDesc::depth_2d(256)).unwrap();
        device.attach_texture(framebuffer, Attachment::Depth, depth).unwrap();
        assert_eq!(device.check_framebuffer_status(framebuffer), FramebufferStatus::IncompleteDrawBuffer);

        device.bind_framebuffer(FramebufferTarget::Both, Some(framebuffer));
        device.set_draw_buffers(&[]);
        device.set_read_buffer(None);
        assert_eq!(device.check_framebuffer_status(framebuffer), FramebufferStatus::Complete);
    }

    #[test]
    fn test_mismatched_dimensions_are_incomplete() {
        let mut device = HeadlessDevice::new(64, 64);
        let framebuffer = device.create_framebuffer().unwrap();
        let a = color_target(&mut device, 64, 64);
        let b = color_target(&mut device, 32, 64);
        device.attach_texture(framebuffer, Attachment::Color(0), a).unwrap();
        device.attach_texture(framebuffer, Attachment::Color(1), b).unwrap();
        assert_eq!(device.check_framebuffer_status(framebuffer), FramebufferStatus::IncompleteDimensions);
    }

    #[test]
    fn test_color_texture_at_depth_attachment_is_incomplete() {
        let mut device = HeadlessDevice::new(64, 64);
        let framebuffer = device.create_framebuffer().unwrap();
        let color = color_target(&mut device, 64, 64);
        device.attach_texture(framebuffer, Attachment::Color(0), color).unwrap();
        device.attach_texture(framebuffer, Attachment::Depth, color).unwrap();
        assert_eq!(device.check_framebuffer_status(framebuffer), FramebufferStatus::IncompleteAttachment);
    }

    #[test]
    fn test_attach_unknown_texture_is_invalid_handle() {
        let mut device = HeadlessDevice::new(64, 64);
        let framebuffer = device.create_framebuffer().unwrap();
        let result = device.attach_texture(framebuffer, Attachment::Color(0), TextureHandle(99));
        assert!(matches!(result, Err(RenderError::InvalidHandle { kind: "texture", id: 99 })));
    }

    #[test]
    fn test_stats_track_create_and_delete() {
        let mut device = HeadlessDevice::new(64, 64);
        let texture = color_target(&mut device, 8, 8);
        device.delete_texture(texture);
        device.delete_texture(texture);
        device.delete_texture(TextureHandle::INVALID);
        let stats = device.stats();
        assert_eq!(stats.textures, ObjectCounts { created: 1, deleted: 1 });
        assert_eq!(stats.live_objects(), 0);
    }

    #[test]
    fn test_injected_program_failure() {
        let mut device = HeadlessDevice::new(64, 64);
        let sources = ShaderSources::vertex_fragment("Blur", "blur.vert", "blur.frag");
        device.fail_program("Blur");
        assert!(matches!(
            device.compile_program(&sources),
            Err(RenderError::ShaderCompilation { .. })
        ));
        device.clear_program_failures();
        assert!(device.compile_program(&sources).is_ok());
    }

    #[test]
    fn test_unpaired_tessellation_is_rejected() {
        let mut device = HeadlessDevice::new(64, 64);
        let sources = ShaderSources::vertex_fragment("Model", "model.vert", "model.frag")
            .with_stage(ShaderStage::TessControl, "model.tesc");
        assert!(device.compile_program(&sources).is_err());
    }

    #[test]
    fn test_draw_records_target_state() {
        let mut device = HeadlessDevice::new(64, 64);
        let mesh = device.create_mesh(&Mesh::fullscreen_quad()).unwrap();
        let framebuffer = device.create_framebuffer().unwrap();
        device.bind_framebuffer(FramebufferTarget::Draw, Some(framebuffer));
        device.set_draw_buffers(&[2]);
        device.push_debug_group("Lighting-Pass");
        device.draw_mesh(mesh);
        device.pop_debug_group();

        let draw = device.draw_calls().next().unwrap();
        assert_eq!(draw.framebuffer, Some(framebuffer));
        assert_eq!(draw.draw_buffers, vec![2]);
        assert_eq!(draw.debug_group.as_deref(), Some("Lighting-Pass"));
        assert_eq!(device.debug_group_depth(), 0);
    }

    #[test]
    fn test_cube_map_must_be_square() {
        let mut device = HeadlessDevice::new(64, 64);
        let mut desc = TextureDesc::depth_cube(64);
        desc.height = 32;
        assert!(device.create_texture(&desc).is_err());
    }
}
