use crate::buffer::{TexelBuffer, encode, rasterize};
use nectargl_core::{
    AttributeBinding, BufferHandle, BufferTarget, Device, DeviceError, DrawCall, ProgramHandle, Region, ShaderStage,
    Size, TextureDesc, TextureFormat, TextureHandle, layout::ElementType,
};
use slotmap::{DefaultKey, Key, KeyData, SlotMap};

const GLES_HEADER: &str = "#version 300 es\nprecision mediump float;\nprecision mediump int;\n";

/// Something the device was asked to do, in call order.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    BeginPass {
        target: Option<TextureHandle>,
        size: Size,
        clear: [f32; 4],
    },
    Draw {
        target: Option<TextureHandle>,
        program: ProgramHandle,
        index_count: u32,
        instance_count: Option<u32>,
        uniform_block: Option<String>,
        textures: Vec<(String, TextureHandle)>,
    },
}

struct Buffer {
    target: BufferTarget,
    data: Vec<u8>,
}

struct Texture {
    desc: TextureDesc,
    texels: TexelBuffer,
}

struct Program {
    vertex: String,
    fragment: String,
}

/// A device that keeps everything in CPU memory.
///
/// Buffers and textures hold real bytes and clears are applied. Draws rasterize the
/// triangle coverage of the first float vertex attribute with two or more components
/// (taken as a clip space position) with a flat fill color. Shaders are not executed.
/// Programs are checked for the uniform blocks and samplers a draw binds, and samplers
/// the fragment shader never reads count as missing. Every pass and draw is recorded.
pub struct HeadlessDevice {
    header: String,
    fill: [f32; 4],
    buffers: SlotMap<DefaultKey, Buffer>,
    textures: SlotMap<DefaultKey, Texture>,
    programs: SlotMap<DefaultKey, Program>,
    surface: TexelBuffer,
    target: Option<TextureHandle>,
    events: Vec<Event>,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self {
            header: GLES_HEADER.to_string(),
            fill: [1.0; 4],
            buffers: SlotMap::new(),
            textures: SlotMap::new(),
            programs: SlotMap::new(),
            surface: TexelBuffer::new(TextureFormat::Rgba8, Size::default()),
            target: None,
            events: Vec::new(),
        }
    }

    /// Replace the shader preamble reported to the graph.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Color written to texels covered by a draw.
    pub fn with_fill(mut self, fill: [f32; 4]) -> Self {
        self.fill = fill;
        self
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Render targets of every recorded pass, in order.
    pub fn passes(&self) -> Vec<Option<TextureHandle>> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::BeginPass { target, .. } => Some(*target),
                Event::Draw { .. } => None,
            })
            .collect()
    }

    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(key(buffer.0)).map(|x| x.data.as_slice())
    }

    pub fn texture_data(&self, texture: TextureHandle) -> Option<&[u8]> {
        self.textures.get(key(texture.0)).map(|x| x.texels.as_bytes())
    }

    /// Assembled vertex and fragment sources of a program.
    pub fn program_source(&self, program: ProgramHandle) -> Option<(&str, &str)> {
        self.programs
            .get(key(program.0))
            .map(|x| (x.vertex.as_str(), x.fragment.as_str()))
    }

    /// The display surface as left by the last pass without a render target (RGBA8).
    pub fn surface(&self) -> &TexelBuffer {
        &self.surface
    }

    /// Number of live buffers, textures and programs.
    pub fn live_objects(&self) -> (usize, usize, usize) {
        (self.buffers.len(), self.textures.len(), self.programs.len())
    }

    fn buffer(&self, handle: BufferHandle) -> Result<&Buffer, DeviceError> {
        self.buffers
            .get(key(handle.0))
            .ok_or(DeviceError::InvalidHandle { object: "buffer" })
    }

    fn draw_triangles(&mut self, call: &DrawCall<'_>) -> Result<(), DeviceError> {
        let indices = self.buffer(call.index_buffer)?;
        if indices.target != BufferTarget::Index {
            return Err(DeviceError::Unsupported("index buffer bound from a non-index buffer".to_string()));
        }
        let index_bytes = call.index_count as usize * size_of::<u16>();
        if index_bytes > indices.data.len() {
            return Err(DeviceError::OutOfBounds {
                object: "index buffer",
                offset: 0,
                len: index_bytes,
                capacity: indices.data.len(),
            });
        }
        let indices: Vec<u16> = indices.data[..index_bytes]
            .chunks_exact(2)
            .map(|x| u16::from_ne_bytes([x[0], x[1]]))
            .collect();

        let vertices = &self.buffer(call.vertex_buffer)?.data;
        let Some(position) = call.vertex_attributes.iter().find(|x| is_position(x)) else {
            // nothing to take as a position, so nothing is covered
            return Ok(());
        };
        let positions = read_positions(vertices, position)?;

        let mut covered = Vec::new();
        let size = match self.target {
            Some(target) => self.texture(target)?.texels.size(),
            None => self.surface.size(),
        };

        for triangle in indices.chunks_exact(3) {
            let corners = [triangle[0], triangle[1], triangle[2]].map(|i| positions.get(i as usize).copied());
            let [Some(a), Some(b), Some(c)] = corners else {
                return Err(DeviceError::OutOfBounds {
                    object: "vertex buffer",
                    offset: triangle.iter().copied().max().unwrap_or(0) as usize,
                    len: 1,
                    capacity: positions.len(),
                });
            };
            rasterize(size, [a, b, c], |x, y| covered.push((x, y)));
        }

        let fill = self.fill;
        let texels = match self.target {
            Some(target) => &mut self.texture_mut(target)?.texels,
            None => &mut self.surface,
        };
        let texel = encode(texels.format(), fill);
        for (x, y) in covered {
            texels.set(x, y, &texel);
        }

        Ok(())
    }

    fn texture(&self, handle: TextureHandle) -> Result<&Texture, DeviceError> {
        self.textures
            .get(key(handle.0))
            .ok_or(DeviceError::InvalidHandle { object: "texture" })
    }

    fn texture_mut(&mut self, handle: TextureHandle) -> Result<&mut Texture, DeviceError> {
        self.textures
            .get_mut(key(handle.0))
            .ok_or(DeviceError::InvalidHandle { object: "texture" })
    }
}

impl Device for HeadlessDevice {
    fn shader_header(&self) -> &str {
        &self.header
    }

    fn create_buffer(&mut self, target: BufferTarget, size: usize) -> Result<BufferHandle, DeviceError> {
        let id = self.buffers.insert(Buffer {
            target,
            data: vec![0; size],
        });
        Ok(BufferHandle(id.data().as_ffi()))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]) -> Result<(), DeviceError> {
        let buffer = self
            .buffers
            .get_mut(key(buffer.0))
            .ok_or(DeviceError::InvalidHandle { object: "buffer" })?;

        let end = offset + data.len();
        if end > buffer.data.len() {
            return Err(DeviceError::OutOfBounds {
                object: "buffer",
                offset,
                len: data.len(),
                capacity: buffer.data.len(),
            });
        }

        buffer.data[offset..end].copy_from_slice(data);
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) -> bool {
        self.buffers.remove(key(buffer.0)).is_some()
    }

    fn create_texture(&mut self, desc: TextureDesc) -> Result<TextureHandle, DeviceError> {
        if desc.size.width == 0 || desc.size.height == 0 {
            return Err(DeviceError::ObjectCreation {
                object: "texture",
                message: format!("invalid size {}x{}", desc.size.width, desc.size.height),
            });
        }

        let id = self.textures.insert(Texture {
            desc,
            texels: TexelBuffer::new(desc.format, desc.size),
        });
        Ok(TextureHandle(id.data().as_ffi()))
    }

    fn write_texture(&mut self, texture: TextureHandle, region: Region, data: &[u8]) -> Result<(), DeviceError> {
        let texture = self.texture_mut(texture)?;
        let capacity = region.size().area() * texture.desc.format.bytes_per_texel();

        if !region.fits(texture.desc.size) || data.len() != capacity {
            return Err(DeviceError::OutOfBounds {
                object: "texture",
                offset: 0,
                len: data.len(),
                capacity,
            });
        }

        texture.texels.write_region(region, data);
        Ok(())
    }

    fn read_texture(&mut self, texture: TextureHandle) -> Result<Vec<u8>, DeviceError> {
        Ok(self.texture(texture)?.texels.as_bytes().to_vec())
    }

    fn delete_texture(&mut self, texture: TextureHandle) -> bool {
        if self.target == Some(texture) {
            self.target = None;
        }
        self.textures.remove(key(texture.0)).is_some()
    }

    fn create_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramHandle, DeviceError> {
        check_source(ShaderStage::Vertex, vertex)?;
        check_source(ShaderStage::Fragment, fragment)?;

        let id = self.programs.insert(Program {
            vertex: vertex.to_string(),
            fragment: fragment.to_string(),
        });
        Ok(ProgramHandle(id.data().as_ffi()))
    }

    fn delete_program(&mut self, program: ProgramHandle) -> bool {
        self.programs.remove(key(program.0)).is_some()
    }

    fn begin_pass(&mut self, target: Option<TextureHandle>, size: Size, clear: [f32; 4]) -> Result<(), DeviceError> {
        match target {
            Some(handle) => {
                let texture = self.texture_mut(handle)?;
                if !texture.desc.render_target {
                    return Err(DeviceError::IncompleteFramebuffer { status: 0 });
                }
                texture.texels.fill(clear);
            }
            None => {
                self.surface.resize(size);
                self.surface.fill(clear);
            }
        }

        self.target = target;
        self.events.push(Event::BeginPass { target, size, clear });
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<(), DeviceError> {
        let program = self
            .programs
            .get(key(call.program.0))
            .ok_or(DeviceError::InvalidHandle { object: "program" })?;

        if let Some(block) = &call.uniform_block {
            let declaration = format!("uniform {} {{", block.block);
            if !program.vertex.contains(&declaration) && !program.fragment.contains(&declaration) {
                return Err(DeviceError::MissingUniformBlock {
                    block: block.block.to_string(),
                });
            }
            self.buffer(block.buffer)?;
        }

        for binding in &call.textures {
            if !is_active_sampler(&program.fragment, binding.sampler) {
                return Err(DeviceError::MissingSampler {
                    sampler: binding.sampler.to_string(),
                });
            }
            self.texture(binding.texture)?;
            if self.target == Some(binding.texture) {
                return Err(DeviceError::Unsupported(format!(
                    "texture bound to `{}` is the current render target",
                    binding.sampler
                )));
            }
        }

        if let Some(instances) = &call.instances {
            let buffer = self.buffer(instances.buffer)?;
            let stride = instances.attributes.first().map_or(0, |x| x.stride as usize);
            let needed = stride * instances.count as usize;
            if needed > buffer.data.len() {
                return Err(DeviceError::OutOfBounds {
                    object: "instance buffer",
                    offset: 0,
                    len: needed,
                    capacity: buffer.data.len(),
                });
            }
        }

        log::trace!("headless draw: {} indices into {:?}", call.index_count, self.target);

        let instance_count = call.instances.as_ref().map(|x| x.count);
        if instance_count != Some(0) {
            self.draw_triangles(call)?;
        }

        self.events.push(Event::Draw {
            target: self.target,
            program: call.program,
            index_count: call.index_count,
            instance_count,
            uniform_block: call.uniform_block.as_ref().map(|x| x.block.to_string()),
            textures: call
                .textures
                .iter()
                .map(|x| (x.sampler.to_string(), x.texture))
                .collect(),
        });

        Ok(())
    }
}

fn key(handle: u64) -> DefaultKey {
    KeyData::from_ffi(handle).into()
}

/// A stand-in for the GLSL compiler: `#error` directives fail compilation.
fn check_source(stage: ShaderStage, source: &str) -> Result<(), DeviceError> {
    match source.lines().find(|line| line.trim_start().starts_with("#error")) {
        Some(line) => Err(DeviceError::ShaderCompile {
            stage,
            log: format!("ERROR: 0:0: '{}'", line.trim()),
        }),
        None => Ok(()),
    }
}

/// A sampler is active when it is declared and used again after its declaration,
/// as GL drivers drop samplers the shader never reads.
fn is_active_sampler(fragment: &str, sampler: &str) -> bool {
    let declaration = format!("uniform sampler2D {};", sampler);
    match fragment.find(&declaration) {
        Some(start) => fragment[start + declaration.len()..].contains(sampler),
        None => false,
    }
}

/// The first float attribute with at least two components is taken as the clip space position.
fn is_position(attribute: &AttributeBinding) -> bool {
    attribute.element == ElementType::Float && attribute.components >= 2 && attribute.stride > 0
}

/// Clip space xy of every row of a vertex buffer.
fn read_positions(data: &[u8], position: &AttributeBinding) -> Result<Vec<[f32; 2]>, DeviceError> {

    let stride = position.stride as usize;
    let offset = position.offset as usize;
    let rows = data.len() / stride;

    (0..rows)
        .map(|row| {
            let start = row * stride + offset;
            let bytes = data.get(start..start + 8).ok_or(DeviceError::OutOfBounds {
                object: "vertex buffer",
                offset: start,
                len: 8,
                capacity: data.len(),
            })?;
            let x = f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            let y = f32::from_ne_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
            Ok([x, y])
        })
        .collect()
}
