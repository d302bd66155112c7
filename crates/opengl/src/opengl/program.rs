use glow::{FRAGMENT_SHADER, HasContext, TEXTURE_2D, TEXTURE0, TRIANGLES, UNIFORM_BUFFER, UNSIGNED_SHORT, VERTEX_SHADER};
use nectargl_core::{DeviceError, ShaderStage};

pub struct GlProgram<T: HasContext> {
    program: T::Program,
}

pub struct GlProgramBinding<'a, T: HasContext> {
    program: &'a GlProgram<T>,
    gl: &'a T,
}

pub struct GlVertexArray<T: HasContext> {
    array: T::VertexArray,
}

pub struct GlVertexArrayBinding<'a, T: HasContext> {
    _array: &'a GlVertexArray<T>,
    gl: &'a T,
}

impl<T: HasContext> GlProgram<T> {
    pub fn compile(gl: &T, vertex_shader: &str, fragment_shader: &str) -> Result<Self, DeviceError> {
        unsafe {
            let program = gl.create_program().map_err(|message| DeviceError::ObjectCreation {
                object: "program",
                message,
            })?;

            let stages = [
                (ShaderStage::Vertex, VERTEX_SHADER, vertex_shader),
                (ShaderStage::Fragment, FRAGMENT_SHADER, fragment_shader),
            ];

            let mut shaders = Vec::with_capacity(stages.len());
            let mut failure = None;

            for (stage, shader_type, source) in stages {
                let shader = match gl.create_shader(shader_type) {
                    Ok(shader) => shader,
                    Err(message) => {
                        failure = Some(DeviceError::ObjectCreation {
                            object: "shader",
                            message,
                        });
                        break;
                    }
                };

                gl.shader_source(shader, source);
                gl.compile_shader(shader);
                shaders.push(shader);

                if !gl.get_shader_compile_status(shader) {
                    failure = Some(DeviceError::ShaderCompile {
                        stage,
                        log: gl.get_shader_info_log(shader),
                    });
                    break;
                }

                gl.attach_shader(program, shader);
            }

            if failure.is_none() {
                gl.link_program(program);
                if !gl.get_program_link_status(program) {
                    failure = Some(DeviceError::ProgramLink {
                        log: gl.get_program_info_log(program),
                    });
                }
            }

            for shader in shaders {
                gl.detach_shader(program, shader);
                gl.delete_shader(shader);
            }

            match failure {
                Some(error) => {
                    gl.delete_program(program);
                    Err(error)
                }
                None => Ok(Self { program }),
            }
        }
    }

    pub fn set_uniform_block_binding(&self, gl: &T, name: &str, binding_index: u32) -> Result<(), DeviceError> {
        unsafe {
            let index = gl
                .get_uniform_block_index(self.program, name)
                .ok_or_else(|| DeviceError::MissingUniformBlock { block: name.to_string() })?;
            gl.uniform_block_binding(self.program, index, binding_index);
        }

        Ok(())
    }

    /// Point a sampler uniform at a texture unit. The program must be bound.
    pub fn set_texture_sampler_binding(&self, gl: &T, name: &str, unit: u32) -> Result<(), DeviceError> {
        unsafe {
            let location = gl
                .get_uniform_location(self.program, name)
                .ok_or_else(|| DeviceError::MissingSampler { sampler: name.to_string() })?;
            gl.uniform_1_i32(Some(&location), unit as i32);
        }

        Ok(())
    }

    pub fn bind<'a>(&'a self, gl: &'a T) -> GlProgramBinding<'a, T> {
        unsafe {
            gl.use_program(Some(self.program));
        }

        GlProgramBinding { program: self, gl }
    }

    pub fn delete(self, gl: &T) {
        unsafe {
            gl.delete_program(self.program);
        }
    }
}

impl<T: HasContext> GlVertexArray<T> {
    pub fn new(gl: &T) -> Result<Self, DeviceError> {
        unsafe {
            let array = gl.create_vertex_array().map_err(|message| DeviceError::ObjectCreation {
                object: "vertex array",
                message,
            })?;
            Ok(Self { array })
        }
    }

    pub fn bind<'a>(&'a self, gl: &'a T) -> GlVertexArrayBinding<'a, T> {
        unsafe {
            gl.bind_vertex_array(Some(self.array));
        }

        GlVertexArrayBinding { _array: self, gl }
    }

    pub fn delete(self, gl: &T) {
        unsafe {
            gl.delete_vertex_array(self.array);
        }
    }
}

impl<'a, T: HasContext> GlProgramBinding<'a, T> {
    pub fn set_uniform_block(&self, name: &str, binding_index: u32, buffer: T::Buffer) -> Result<(), DeviceError> {
        self.program.set_uniform_block_binding(self.gl, name, binding_index)?;

        unsafe {
            self.gl.bind_buffer_base(UNIFORM_BUFFER, binding_index, Some(buffer));
        }

        Ok(())
    }

    pub fn set_sampler_texture(&self, name: &str, unit: u32, texture: T::Texture) -> Result<(), DeviceError> {
        self.program.set_texture_sampler_binding(self.gl, name, unit)?;

        unsafe {
            self.gl.active_texture(TEXTURE0 + unit);
            self.gl.bind_texture(TEXTURE_2D, Some(texture));
        }

        Ok(())
    }
}

impl<'a, T: HasContext> GlVertexArrayBinding<'a, T> {
    /// Indexed triangles with `u16` indices from the bound element buffer.
    pub fn draw_elements(&self, _program: &GlProgramBinding<'a, T>, index_count: u32, instance_count: Option<u32>) {
        unsafe {
            match instance_count {
                Some(instances) => {
                    self.gl
                        .draw_elements_instanced(TRIANGLES, index_count as _, UNSIGNED_SHORT, 0, instances as _)
                }
                None => self.gl.draw_elements(TRIANGLES, index_count as _, UNSIGNED_SHORT, 0),
            }
        }
    }
}
