use crate::opengl::{
    GlBuffer, GlFramebufferBinding, GlInfo, GlProgram, GlTexture, GlVertexArray, enable_debug, viewport,
};
use glow::{ARRAY_BUFFER, ELEMENT_ARRAY_BUFFER, FLOAT, HasContext, INT};
use nectargl_core::*;
use nectargl_core::layout::ElementType;
use slotmap::{DefaultKey, Key, KeyData, SlotMap};
use std::ffi::CStr;

pub type GlNativeDevice = GlDevice<glow::Context>;

#[derive(Debug, Clone, Copy)]
pub struct GlDeviceOptions {
    /// Forward `KHR_debug` messages into `log`, when the context supports it.
    pub debug_output: bool,
}

impl Default for GlDeviceOptions {
    fn default() -> Self {
        Self {
            debug_output: cfg!(debug_assertions),
        }
    }
}

/// A [`Device`] on top of a WebGL2, OpenGL ES 3.0 or OpenGL 3.3 context.
pub struct GlDevice<T: HasContext> {
    buffers: SlotMap<DefaultKey, GlBuffer<T>>,
    textures: SlotMap<DefaultKey, GlTexture<T>>,
    programs: SlotMap<DefaultKey, GlProgram<T>>,

    gl_context: T,
    gl_info: GlInfo,
    gl_vertex: GlVertexArray<T>,
    enabled_attributes: Vec<u32>,
}

unsafe impl<T: HasContext> Send for GlDevice<T> {}

impl GlDevice<glow::Context> {
    /// Creates a new device from a given loader function
    /// (a function that takes a GL function name and returns a pointer to that function).
    ///
    /// #### Error Conditions
    /// - If the context is older than OpenGL ES 3.0 / OpenGL 3.3, [`DeviceError::Unsupported`] is returned.
    ///
    /// #### Safety
    /// This function should be called only if the OpenGL context is currently active for the current thread.
    pub unsafe fn new<F>(loader: F, options: GlDeviceOptions) -> Result<Self, DeviceError>
    where
        F: FnMut(&CStr) -> *const std::os::raw::c_void,
    {
        unsafe { Self::from_glow(glow::Context::from_loader_function_cstr(loader), options) }
    }
}

impl<T: HasContext> GlDevice<T> {
    /// Creates a new device from a given `glow` context.
    ///
    /// See [`GlDevice::new`] for more details.
    pub unsafe fn from_glow(mut gl_context: T, options: GlDeviceOptions) -> Result<Self, DeviceError> {
        let gl_info = GlInfo::query(&gl_context);

        if !gl_info.is_supported() {
            return Err(DeviceError::Unsupported(format!(
                "{} {}.{}",
                if gl_info.is_gles { "OpenGL ES" } else { "OpenGL" },
                gl_info.version.0,
                gl_info.version.1
            )));
        }

        log::info!(
            "using {} {}.{} ({})",
            if gl_info.is_gles { "OpenGL ES" } else { "OpenGL" },
            gl_info.version.0,
            gl_info.version.1,
            gl_info.vendor
        );

        if options.debug_output && gl_info.is_debug_supported() {
            enable_debug(&mut gl_context);
        }

        let gl_vertex = GlVertexArray::new(&gl_context)?;

        Ok(Self {
            buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            programs: SlotMap::with_key(),

            gl_context,
            gl_info,
            gl_vertex,
            enabled_attributes: Vec::new(),
        })
    }

    pub fn info(&self) -> &GlInfo {
        &self.gl_info
    }

    pub fn context(&self) -> &T {
        &self.gl_context
    }

    /// Delete every object still owned by the device.
    ///
    /// #### Safety
    /// This function should be called only if the OpenGL context is currently active for the current thread.
    pub unsafe fn delete(self) {
        let gl = &self.gl_context;

        for (_, buffer) in self.buffers.into_iter() {
            buffer.delete(gl);
        }

        for (_, texture) in self.textures.into_iter() {
            texture.delete(gl);
        }

        for (_, program) in self.programs.into_iter() {
            program.delete(gl);
        }

        self.gl_vertex.delete(gl);
    }

    fn buffer(&self, handle: BufferHandle) -> Result<&GlBuffer<T>, DeviceError> {
        self.buffers
            .get(KeyData::from_ffi(handle.0).into())
            .ok_or(DeviceError::InvalidHandle { object: "buffer" })
    }

    fn texture(&self, handle: TextureHandle) -> Result<&GlTexture<T>, DeviceError> {
        self.textures
            .get(KeyData::from_ffi(handle.0).into())
            .ok_or(DeviceError::InvalidHandle { object: "texture" })
    }

    fn program(&self, handle: ProgramHandle) -> Result<&GlProgram<T>, DeviceError> {
        self.programs
            .get(KeyData::from_ffi(handle.0).into())
            .ok_or(DeviceError::InvalidHandle { object: "program" })
    }

    fn bind_attributes(&self, buffer: BufferHandle, attributes: &[AttributeBinding]) -> Result<(), DeviceError> {
        let gl = &self.gl_context;
        let buffer = self.buffer(buffer)?;

        unsafe {
            gl.bind_buffer(ARRAY_BUFFER, Some(buffer.buffer()));

            for attribute in attributes {
                gl.enable_vertex_attrib_array(attribute.location);
                match attribute.element {
                    ElementType::Float => gl.vertex_attrib_pointer_f32(
                        attribute.location,
                        attribute.components as _,
                        FLOAT,
                        false,
                        attribute.stride as _,
                        attribute.offset as _,
                    ),
                    ElementType::Int => gl.vertex_attrib_pointer_i32(
                        attribute.location,
                        attribute.components as _,
                        INT,
                        attribute.stride as _,
                        attribute.offset as _,
                    ),
                }
                gl.vertex_attrib_divisor(attribute.location, attribute.divisor);
            }
        }

        Ok(())
    }
}

impl<T: HasContext> Device for GlDevice<T> {
    fn shader_header(&self) -> &str {
        self.gl_info.shader_header()
    }

    fn create_buffer(&mut self, target: BufferTarget, size: usize) -> Result<BufferHandle, DeviceError> {
        let buffer = GlBuffer::new(&self.gl_context, target, size)?;
        let id = self.buffers.insert(buffer);
        Ok(BufferHandle(id.data().as_ffi()))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]) -> Result<(), DeviceError> {
        self.buffer(buffer)?.write(&self.gl_context, offset, data)
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) -> bool {
        match self.buffers.remove(KeyData::from_ffi(buffer.0).into()) {
            Some(buffer) => {
                buffer.delete(&self.gl_context);
                true
            }
            _ => false,
        }
    }

    fn create_texture(&mut self, desc: TextureDesc) -> Result<TextureHandle, DeviceError> {
        if desc.render_target && desc.format.is_float() && !self.gl_info.is_float_render_supported() {
            return Err(DeviceError::Unsupported(format!(
                "rendering into {:?} needs EXT_color_buffer_float",
                desc.format
            )));
        }

        let texture = GlTexture::new(&self.gl_context, desc)?;
        let id = self.textures.insert(texture);
        Ok(TextureHandle(id.data().as_ffi()))
    }

    fn write_texture(&mut self, texture: TextureHandle, region: Region, data: &[u8]) -> Result<(), DeviceError> {
        self.texture(texture)?.write(&self.gl_context, region, data)
    }

    fn read_texture(&mut self, texture: TextureHandle) -> Result<Vec<u8>, DeviceError> {
        self.texture(texture)?.read(&self.gl_context)
    }

    fn delete_texture(&mut self, texture: TextureHandle) -> bool {
        match self.textures.remove(KeyData::from_ffi(texture.0).into()) {
            Some(texture) => {
                texture.delete(&self.gl_context);
                true
            }
            _ => false,
        }
    }

    fn create_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramHandle, DeviceError> {
        let program = GlProgram::compile(&self.gl_context, vertex, fragment)?;
        let id = self.programs.insert(program);
        Ok(ProgramHandle(id.data().as_ffi()))
    }

    fn delete_program(&mut self, program: ProgramHandle) -> bool {
        match self.programs.remove(KeyData::from_ffi(program.0).into()) {
            Some(program) => {
                program.delete(&self.gl_context);
                true
            }
            _ => false,
        }
    }

    fn begin_pass(&mut self, target: Option<TextureHandle>, size: Size, clear: [f32; 4]) -> Result<(), DeviceError> {
        let gl = &self.gl_context;

        let binding = match target {
            Some(texture) => self.texture(texture)?.bind(gl)?,
            None => GlFramebufferBinding::default(gl),
        };

        viewport(gl, 0, 0, size.width, size.height);
        binding.clear(clear);
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<(), DeviceError> {
        let enabled = {
            let gl = &self.gl_context;
            let program = self.program(call.program)?;
            let index_buffer = self.buffer(call.index_buffer)?;

            let bind_vertex_array = self.gl_vertex.bind(gl);
            let bind_program = program.bind(gl);

            for &location in &self.enabled_attributes {
                unsafe {
                    gl.disable_vertex_attrib_array(location);
                }
            }

            let mut enabled: Vec<u32> = call.vertex_attributes.iter().map(|attribute| attribute.location).collect();
            self.bind_attributes(call.vertex_buffer, &call.vertex_attributes)?;

            if let Some(instances) = &call.instances {
                self.bind_attributes(instances.buffer, &instances.attributes)?;
                enabled.extend(instances.attributes.iter().map(|attribute| attribute.location));
            }

            unsafe {
                gl.bind_buffer(ELEMENT_ARRAY_BUFFER, Some(index_buffer.buffer()));
            }

            if let Some(block) = &call.uniform_block {
                let buffer = self.buffer(block.buffer)?;
                bind_program.set_uniform_block(block.block, block.binding, buffer.buffer())?;
            }

            for binding in &call.textures {
                let texture = self.texture(binding.texture)?;
                bind_program.set_sampler_texture(binding.sampler, binding.unit, texture.texture())?;
                texture.apply_sampling(gl, binding.sampling);
            }

            let instance_count = call.instances.as_ref().map(|instances| instances.count);
            log::trace!("draw: {} indices, {:?} instances", call.index_count, instance_count);
            bind_vertex_array.draw_elements(&bind_program, call.index_count, instance_count);
            enabled
        };

        self.enabled_attributes = enabled;
        Ok(())
    }
}
