use crate::{
    BufferHandle, BufferTarget, DataError, Device, DeviceError, UniformValue,
    layout::{Layout, PrimitiveType},
};

/// Uniform buffer holding one std140 block.
///
/// A CPU copy of the block is kept so a write that names only some fields
/// leaves the others intact.
#[derive(Debug)]
pub struct UniformProvider {
    layout: Layout,
    buffer: BufferHandle,
    shadow: Vec<u8>,
}

impl UniformProvider {
    pub fn new(device: &mut dyn Device, fields: &[(String, PrimitiveType)]) -> Result<Self, DeviceError> {
        let layout = Layout::std140(fields);
        let buffer = device.create_buffer(BufferTarget::Uniform, layout.size as usize)?;

        Ok(Self {
            shadow: vec![0; layout.size as usize],
            layout,
            buffer,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn buffer(&self) -> BufferHandle {
        self.buffer
    }

    /// Current contents of the block, as last uploaded.
    pub fn bytes(&self) -> &[u8] {
        &self.shadow
    }

    pub fn set_uniforms(&mut self, device: &mut dyn Device, values: &[(&str, UniformValue)]) -> Result<(), DataError> {
        let mut block = self.shadow.clone();

        for (name, value) in values {
            let field = self
                .layout
                .field(name)
                .ok_or_else(|| DataError::UnknownField { name: name.to_string() })?;

            if field.ty != value.ty() {
                return Err(DataError::TypeMismatch {
                    name: name.to_string(),
                    expected: field.ty,
                    found: value.ty().glsl_name(),
                });
            }

            let bytes = value.to_std140();
            let start = field.offset as usize;
            block[start..start + bytes.len()].copy_from_slice(&bytes);
        }

        if block != self.shadow {
            device.write_buffer(self.buffer, 0, &block)?;
            self.shadow = block;
        }

        Ok(())
    }

    pub fn delete(self, device: &mut dyn Device) {
        device.delete_buffer(self.buffer);
    }
}
