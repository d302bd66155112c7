use glow::{
    CLAMP_TO_EDGE, COLOR_ATTACHMENT0, FLOAT, FRAMEBUFFER, FRAMEBUFFER_COMPLETE, HasContext, LINEAR, NEAREST,
    PACK_ALIGNMENT, PixelPackData, PixelUnpackData, R8, R32F, RED, REPEAT, RGBA, RGBA8, RGBA32F, TEXTURE_2D,
    TEXTURE_MAG_FILTER, TEXTURE_MIN_FILTER, TEXTURE_WRAP_S, TEXTURE_WRAP_T, UNPACK_ALIGNMENT, UNSIGNED_BYTE,
};
use nectargl_core::{DeviceError, Region, TextureDesc, TextureFilter, TextureFormat, TextureSampling, TextureWrap};

/// A 2D texture, with a framebuffer attached when it is a render target.
pub struct GlTexture<T: HasContext> {
    pub(super) texture: T::Texture,
    framebuffer: Option<T::Framebuffer>,
    desc: TextureDesc,
}

pub struct GlFramebufferBinding<'a, T: HasContext> {
    gl: &'a T,
}

/// Internal format, pixel format and pixel type.
fn gl_format(format: TextureFormat) -> (u32, u32, u32) {
    match format {
        TextureFormat::Rgba8 => (RGBA8, RGBA, UNSIGNED_BYTE),
        TextureFormat::R8 => (R8, RED, UNSIGNED_BYTE),
        TextureFormat::R32f => (R32F, RED, FLOAT),
        TextureFormat::Rgba32f => (RGBA32F, RGBA, FLOAT),
    }
}

impl<T: HasContext> GlTexture<T> {
    pub fn new(gl: &T, desc: TextureDesc) -> Result<Self, DeviceError> {
        let (internal, format, ty) = gl_format(desc.format);

        unsafe {
            let texture = gl.create_texture().map_err(|message| DeviceError::ObjectCreation {
                object: "texture",
                message,
            })?;

            gl.bind_texture(TEXTURE_2D, Some(texture));
            gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_MIN_FILTER, NEAREST as _);
            gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_MAG_FILTER, NEAREST as _);
            gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_WRAP_T, CLAMP_TO_EDGE as _);
            gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_WRAP_S, CLAMP_TO_EDGE as _);

            gl.tex_image_2d(
                TEXTURE_2D,
                0,
                internal as _,
                desc.size.width as _,
                desc.size.height as _,
                0,
                format,
                ty,
                PixelUnpackData::Slice(None),
            );

            let framebuffer = if desc.render_target {
                let framebuffer = match gl.create_framebuffer() {
                    Ok(framebuffer) => framebuffer,
                    Err(message) => {
                        gl.delete_texture(texture);
                        return Err(DeviceError::ObjectCreation {
                            object: "framebuffer",
                            message,
                        });
                    }
                };

                gl.bind_framebuffer(FRAMEBUFFER, Some(framebuffer));
                gl.framebuffer_texture_2d(FRAMEBUFFER, COLOR_ATTACHMENT0, TEXTURE_2D, Some(texture), 0);

                let status = gl.check_framebuffer_status(FRAMEBUFFER);
                gl.bind_framebuffer(FRAMEBUFFER, None);

                if status != FRAMEBUFFER_COMPLETE {
                    gl.delete_framebuffer(framebuffer);
                    gl.delete_texture(texture);
                    return Err(DeviceError::IncompleteFramebuffer { status });
                }

                Some(framebuffer)
            } else {
                None
            };

            Ok(Self {
                texture,
                framebuffer,
                desc,
            })
        }
    }

    pub fn desc(&self) -> TextureDesc {
        self.desc
    }

    pub fn texture(&self) -> T::Texture {
        self.texture
    }

    pub fn write(&self, gl: &T, region: Region, data: &[u8]) -> Result<(), DeviceError> {
        let expected = region.size().area() * self.desc.format.bytes_per_texel();
        if !region.fits(self.desc.size) || data.len() != expected {
            return Err(DeviceError::OutOfBounds {
                object: "texture",
                offset: 0,
                len: data.len(),
                capacity: expected,
            });
        }

        let (_, format, ty) = gl_format(self.desc.format);
        unsafe {
            gl.bind_texture(TEXTURE_2D, Some(self.texture));
            gl.pixel_store_i32(UNPACK_ALIGNMENT, 1);
            gl.tex_sub_image_2d(
                TEXTURE_2D,
                0,
                region.x as _,
                region.y as _,
                region.width as _,
                region.height as _,
                format,
                ty,
                PixelUnpackData::Slice(Some(data)),
            );
        }

        Ok(())
    }

    /// Read every texel through a framebuffer, bottom row first.
    pub fn read(&self, gl: &T) -> Result<Vec<u8>, DeviceError> {
        let (_, format, ty) = gl_format(self.desc.format);
        let mut data = vec![0; self.desc.size.area() * self.desc.format.bytes_per_texel()];

        unsafe {
            let (framebuffer, temporary) = match self.framebuffer {
                Some(framebuffer) => (framebuffer, false),
                None => {
                    let framebuffer = gl.create_framebuffer().map_err(|message| DeviceError::ObjectCreation {
                        object: "framebuffer",
                        message,
                    })?;
                    gl.bind_framebuffer(FRAMEBUFFER, Some(framebuffer));
                    gl.framebuffer_texture_2d(FRAMEBUFFER, COLOR_ATTACHMENT0, TEXTURE_2D, Some(self.texture), 0);
                    (framebuffer, true)
                }
            };

            gl.bind_framebuffer(FRAMEBUFFER, Some(framebuffer));
            gl.pixel_store_i32(PACK_ALIGNMENT, 1);
            gl.read_pixels(
                0,
                0,
                self.desc.size.width as _,
                self.desc.size.height as _,
                format,
                ty,
                PixelPackData::Slice(Some(&mut data[..])),
            );
            gl.bind_framebuffer(FRAMEBUFFER, None);

            if temporary {
                gl.delete_framebuffer(framebuffer);
            }
        }

        Ok(data)
    }

    /// Apply the filtering a program declared for the sampler this texture is bound to.
    pub fn apply_sampling(&self, gl: &T, sampling: TextureSampling) {
        let filter = match sampling.filter {
            TextureFilter::Nearest => NEAREST,
            TextureFilter::Linear => LINEAR,
        };
        let wrap = match sampling.wrap {
            TextureWrap::Repeat => REPEAT,
            TextureWrap::Clamp => CLAMP_TO_EDGE,
        };

        unsafe {
            gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_MIN_FILTER, filter as _);
            gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_MAG_FILTER, filter as _);
            gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_WRAP_S, wrap as _);
            gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_WRAP_T, wrap as _);
        }
    }

    pub fn bind<'a>(&'a self, gl: &'a T) -> Result<GlFramebufferBinding<'a, T>, DeviceError> {
        let framebuffer = self.framebuffer.ok_or(DeviceError::IncompleteFramebuffer { status: 0 })?;

        unsafe {
            gl.bind_framebuffer(FRAMEBUFFER, Some(framebuffer));
        }

        Ok(GlFramebufferBinding { gl })
    }

    pub fn delete(self, gl: &T) {
        unsafe {
            gl.delete_texture(self.texture);
            if let Some(framebuffer) = self.framebuffer {
                gl.delete_framebuffer(framebuffer);
            }
        }
    }
}

impl<'a, T: HasContext> GlFramebufferBinding<'a, T> {
    pub fn default(gl: &'a T) -> Self {
        unsafe {
            gl.bind_framebuffer(FRAMEBUFFER, None);
        }

        GlFramebufferBinding { gl }
    }

    pub fn clear(&self, color: [f32; 4]) {
        super::clear(self.gl, color);
    }
}
