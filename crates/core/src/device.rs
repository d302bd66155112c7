use crate::{Region, Size, TextureFormat, TextureSampling, layout::ElementType};
use thiserror::Error;

/// GPU buffer owned by exactly one provider.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct BufferHandle(pub u64);

/// GPU texture (and its framebuffer, for render targets) owned by exactly one provider.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct TextureHandle(pub u64);

/// Linked GPU program owned by exactly one provider.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct ProgramHandle(pub u64);

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum BufferTarget {
    Vertex,
    Index,
    Uniform,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct TextureDesc {
    pub format: TextureFormat,
    pub size: Size,
    /// Attach a framebuffer so the texture can be drawn into.
    pub render_target: bool,
}

/// One enabled vertex attribute array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttributeBinding {
    pub location: u32,
    pub components: u32,
    pub element: ElementType,
    pub stride: u32,
    pub offset: u32,
    /// 0 = per vertex, 1 = per instance.
    pub divisor: u32,
}

#[derive(Clone, Debug)]
pub struct InstanceBinding {
    pub buffer: BufferHandle,
    pub attributes: Vec<AttributeBinding>,
    pub count: u32,
}

#[derive(Clone, Debug)]
pub struct UniformBlockBinding<'a> {
    pub buffer: BufferHandle,
    pub block: &'a str,
    pub binding: u32,
}

#[derive(Clone, Debug)]
pub struct TextureBinding<'a> {
    pub unit: u32,
    pub texture: TextureHandle,
    pub sampler: &'a str,
    pub sampling: TextureSampling,
}

/// Everything a single indexed triangle draw needs bound.
#[derive(Clone, Debug)]
pub struct DrawCall<'a> {
    pub program: ProgramHandle,
    pub vertex_buffer: BufferHandle,
    pub vertex_attributes: Vec<AttributeBinding>,
    pub index_buffer: BufferHandle,
    pub index_count: u32,
    pub instances: Option<InstanceBinding>,
    pub uniform_block: Option<UniformBlockBinding<'a>>,
    pub textures: Vec<TextureBinding<'a>>,
}

#[derive(Debug, Clone, Error)]
pub enum DeviceError {
    #[error("failed to create {object}: {message}")]
    ObjectCreation { object: &'static str, message: String },
    #[error("{stage:?} shader compilation failed: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },
    #[error("program linking failed: {log}")]
    ProgramLink { log: String },
    #[error("framebuffer is not complete (status {status:#x})")]
    IncompleteFramebuffer { status: u32 },
    #[error("program has no uniform block named `{block}`")]
    MissingUniformBlock { block: String },
    #[error("program has no sampler uniform named `{sampler}`")]
    MissingSampler { sampler: String },
    #[error("invalid {object} handle")]
    InvalidHandle { object: &'static str },
    #[error("write of {len} bytes at offset {offset} overflows a {capacity} byte {object}")]
    OutOfBounds {
        object: &'static str,
        offset: usize,
        len: usize,
        capacity: usize,
    },
    #[error("unsupported context: {0}")]
    Unsupported(String),
}

/// The GPU as seen by the resource graph.
///
/// Every call is synchronous and happens on the thread that owns the graph.
/// Implemented by the OpenGL backend and the headless backend.
pub trait Device {
    /// Version and precision preamble placed at the top of both shader stages.
    fn shader_header(&self) -> &str;

    /// Allocate a zeroed buffer of `size` bytes.
    fn create_buffer(&mut self, target: BufferTarget, size: usize) -> Result<BufferHandle, DeviceError>;

    /// Overwrite `data.len()` bytes starting at `offset`.
    fn write_buffer(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]) -> Result<(), DeviceError>;

    fn delete_buffer(&mut self, buffer: BufferHandle) -> bool;

    fn create_texture(&mut self, desc: TextureDesc) -> Result<TextureHandle, DeviceError>;

    /// Upload tightly packed texels (unpack alignment 1) into `region`.
    fn write_texture(&mut self, texture: TextureHandle, region: Region, data: &[u8]) -> Result<(), DeviceError>;

    /// Read the whole texture back, tightly packed, bottom row first.
    fn read_texture(&mut self, texture: TextureHandle) -> Result<Vec<u8>, DeviceError>;

    fn delete_texture(&mut self, texture: TextureHandle) -> bool;

    /// Compile both stages and link them. Failures carry the backend's info log.
    fn create_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramHandle, DeviceError>;

    fn delete_program(&mut self, program: ProgramHandle) -> bool;

    /// Bind a render target (`None` = the display surface), set the viewport to `size` and clear it.
    fn begin_pass(&mut self, target: Option<TextureHandle>, size: Size, clear: [f32; 4]) -> Result<(), DeviceError>;

    /// Bind everything in `call` and issue the draw.
    fn draw(&mut self, call: &DrawCall<'_>) -> Result<(), DeviceError>;
}
