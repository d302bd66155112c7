use glow::{HasContext, MAX_TEXTURE_IMAGE_UNITS, MAX_TEXTURE_SIZE, MAX_UNIFORM_BLOCK_SIZE, MAX_VERTEX_ATTRIBS};
use std::collections::HashSet;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct GlInfo {
    pub version: (u32, u32),
    pub is_gles: bool,

    pub vendor: String,
    pub extensions: HashSet<String>,

    pub max_texture_size: u32,
    pub max_texture_units: u32,
    pub max_vertex_attributes: u32,
    pub max_uniform_block_size_bytes: u32,
}

impl GlInfo {
    pub fn query(gl: &impl HasContext) -> Self {
        unsafe {
            let version = gl.version();
            let max_texture_size = gl.get_parameter_i32(MAX_TEXTURE_SIZE as _) as u32;
            let max_texture_units = gl.get_parameter_i32(MAX_TEXTURE_IMAGE_UNITS as _) as u32;
            let max_vertex_attributes = gl.get_parameter_i32(MAX_VERTEX_ATTRIBS as _) as u32;
            let max_uniform_block_size = gl.get_parameter_i32(MAX_UNIFORM_BLOCK_SIZE as _) as u32;

            Self {
                version: (version.major, version.minor),
                is_gles: version.is_embedded,

                vendor: version.vendor_info.clone(),
                extensions: gl.supported_extensions().clone(),

                max_texture_size,
                max_texture_units,
                max_vertex_attributes,
                max_uniform_block_size_bytes: max_uniform_block_size,
            }
        }
    }

    /// OpenGL ES 3.0 (and so WebGL2) or desktop OpenGL 3.3.
    pub fn is_supported(&self) -> bool {
        if self.is_gles {
            self.version >= (3, 0)
        } else {
            self.version >= (3, 3)
        }
    }

    /// Float formats can only be rendered into with an extension on GLES.
    pub fn is_float_render_supported(&self) -> bool {
        !self.is_gles
            || self.extensions.contains("GL_EXT_color_buffer_float")
            || self.extensions.contains("EXT_color_buffer_float")
    }

    pub(crate) fn is_debug_supported(&self) -> bool {
        self.extensions.contains("GL_KHR_debug") || (!self.is_gles && self.version >= (4, 3))
    }

    /// Preamble both shader stages start with.
    pub fn shader_header(&self) -> &'static str {
        if self.is_gles {
            "#version 300 es\nprecision mediump float;\nprecision mediump int;\n"
        } else {
            "#version 330 core\n"
        }
    }
}
