use glow::{ARRAY_BUFFER, DYNAMIC_DRAW, ELEMENT_ARRAY_BUFFER, HasContext, UNIFORM_BUFFER};
use nectargl_core::{BufferTarget, DeviceError};

/// A fixed size buffer object, rewritten in place.
pub struct GlBuffer<T: HasContext> {
    pub(super) buffer: T::Buffer,
    target: BufferTarget,
    size: usize,
}

fn gl_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Vertex => ARRAY_BUFFER,
        BufferTarget::Index => ELEMENT_ARRAY_BUFFER,
        BufferTarget::Uniform => UNIFORM_BUFFER,
    }
}

impl<T: HasContext> GlBuffer<T> {
    pub fn new(gl: &T, target: BufferTarget, size: usize) -> Result<Self, DeviceError> {
        unsafe {
            let buffer = gl.create_buffer().map_err(|message| DeviceError::ObjectCreation {
                object: "buffer",
                message,
            })?;

            // zero filled, so unwritten rows read as zeros
            let zeros = vec![0u8; size];
            gl.bind_buffer(gl_target(target), Some(buffer));
            gl.buffer_data_u8_slice(gl_target(target), &zeros, DYNAMIC_DRAW);

            Ok(Self { buffer, target, size })
        }
    }

    pub fn buffer(&self) -> T::Buffer {
        self.buffer
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn write(&self, gl: &T, offset: usize, data: &[u8]) -> Result<(), DeviceError> {
        if offset + data.len() > self.size {
            return Err(DeviceError::OutOfBounds {
                object: "buffer",
                offset,
                len: data.len(),
                capacity: self.size,
            });
        }

        unsafe {
            let target = gl_target(self.target);
            gl.bind_buffer(target, Some(self.buffer));
            gl.buffer_sub_data_u8_slice(target, offset as i32, data);
        }

        Ok(())
    }

    pub fn delete(self, gl: &T) {
        unsafe {
            gl.delete_buffer(self.buffer);
        }
    }
}
